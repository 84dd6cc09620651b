//! HTML page rendering with Tera

use crate::types::prediction::Prediction;
use tera::{Context, Tera};

const BASE: &str = include_str!("../../templates/base.html");
const HOME: &str = include_str!("../../templates/home.html");
const DETECT: &str = include_str!("../../templates/detect.html");
const ANALYSIS: &str = include_str!("../../templates/analysis.html");

/// Page templates compiled into the binary
pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn new() -> tera::Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("base.html", BASE),
            ("home.html", HOME),
            ("detect.html", DETECT),
            ("analysis.html", ANALYSIS),
        ])?;
        Ok(Self { tera })
    }

    /// Landing page
    pub fn home(&self, model_loaded: bool) -> tera::Result<String> {
        let mut context = Context::new();
        context.insert("model_loaded", &model_loaded);
        self.tera.render("home.html", &context)
    }

    /// Upload form page
    pub fn detect(&self, model_loaded: bool) -> tera::Result<String> {
        let mut context = Context::new();
        context.insert("model_loaded", &model_loaded);
        self.tera.render("detect.html", &context)
    }

    /// Per-image analysis view
    pub fn analysis(&self, filename: &str, prediction: &Prediction) -> tera::Result<String> {
        let mut context = Context::new();
        context.insert("filename", filename);
        context.insert("fire_prob", &prediction.fire_percent_display());
        context.insert("no_fire_prob", &prediction.no_fire_percent_display());
        context.insert("label", &prediction.label);
        context.insert("per_class", &prediction.per_class_probabilities);
        self.tera.render("analysis.html", &context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn prediction() -> Prediction {
        Prediction {
            label: "Fire Detected".to_string(),
            primary_score: 0.2,
            per_class_probabilities: BTreeMap::from([
                ("fire".to_string(), 0.8),
                ("no_fire".to_string(), 0.2),
            ]),
            fire_probability: 80.0,
            no_fire_probability: 20.0,
        }
    }

    #[test]
    fn test_templates_compile_and_render() {
        let templates = Templates::new().unwrap();

        assert!(templates.home(true).unwrap().contains("/detect"));
        assert!(templates.detect(false).unwrap().contains("name=\"file\""));
    }

    #[test]
    fn test_analysis_contains_values() {
        let templates = Templates::new().unwrap();
        let html = templates.analysis("forest.jpg", &prediction()).unwrap();

        assert!(html.contains("forest.jpg"));
        assert!(html.contains("Fire Detected"));
        assert!(html.contains("80"));
        assert!(html.contains("20"));
    }

    #[test]
    fn test_analysis_escapes_filename() {
        let templates = Templates::new().unwrap();
        let html = templates.analysis("<script>.jpg", &prediction()).unwrap();

        assert!(!html.contains("<script>.jpg"));
        assert!(html.contains("&lt;script&gt;.jpg"));
    }
}
