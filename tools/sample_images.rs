//! Sample Image Generator
//!
//! Writes synthetic test images for exercising the detection service by hand:
//! warm "fire-like" gradients, cool "forest-like" gradients and plain noise,
//! at random sizes and in several formats.

use anyhow::{Context, Result};
use image::{ImageFormat, Rgb, RgbImage};
use rand::Rng;
use std::path::{Path, PathBuf};
use tracing::info;

/// Kinds of synthetic scenes
#[derive(Debug, Clone, Copy)]
enum Scene {
    Warm,
    Cool,
    Noise,
}

impl Scene {
    fn name(self) -> &'static str {
        match self {
            Scene::Warm => "warm",
            Scene::Cool => "cool",
            Scene::Noise => "noise",
        }
    }
}

/// Image generator for testing
struct ImageGenerator {
    rng: rand::rngs::ThreadRng,
    image_counter: u64,
}

impl ImageGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            image_counter: 0,
        }
    }

    fn generate(&mut self, scene: Scene) -> RgbImage {
        self.image_counter += 1;
        let width = self.rng.gen_range(64..1024);
        let height = self.rng.gen_range(64..768);

        match scene {
            Scene::Warm => {
                let jitter: u8 = self.rng.gen_range(0..40);
                RgbImage::from_fn(width, height, |_, y| {
                    let t = y as f32 / height as f32;
                    Rgb([
                        255 - jitter,
                        (60.0 + 150.0 * t) as u8,
                        (20.0 * t) as u8 + jitter / 2,
                    ])
                })
            }
            Scene::Cool => {
                let jitter: u8 = self.rng.gen_range(0..40);
                RgbImage::from_fn(width, height, |x, _| {
                    let t = x as f32 / width as f32;
                    Rgb([
                        (30.0 + 40.0 * t) as u8,
                        120 + jitter,
                        (60.0 + 120.0 * (1.0 - t)) as u8,
                    ])
                })
            }
            Scene::Noise => {
                let mut image = RgbImage::new(width, height);
                for pixel in image.pixels_mut() {
                    *pixel = Rgb(self.rng.gen());
                }
                image
            }
        }
    }

    fn random_format(&mut self) -> (ImageFormat, &'static str) {
        let formats = [
            (ImageFormat::Png, "png"),
            (ImageFormat::Jpeg, "jpg"),
            (ImageFormat::Bmp, "bmp"),
        ];
        formats[self.rng.gen_range(0..formats.len())]
    }
}

fn write_image(image: &RgbImage, dir: &Path, name: &str, format: ImageFormat) -> Result<PathBuf> {
    let path = dir.join(name);
    image
        .save_with_format(&path, format)
        .context(format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sample_images=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let out_dir = PathBuf::from(args.get(1).map(|s| s.as_str()).unwrap_or("samples"));
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(12);

    info!(out_dir = %out_dir.display(), count = count, "Generating sample images");

    std::fs::create_dir_all(&out_dir)
        .context(format!("Failed to create {}", out_dir.display()))?;

    let mut generator = ImageGenerator::new();
    let scenes = [Scene::Warm, Scene::Cool, Scene::Noise];

    for i in 0..count {
        let scene = scenes[(i % scenes.len() as u64) as usize];
        let image = generator.generate(scene);
        let (format, ext) = generator.random_format();
        let name = format!("{}_{:04}.{}", scene.name(), generator.image_counter, ext);

        let path = write_image(&image, &out_dir, &name, format)?;
        info!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "Wrote sample image"
        );
    }

    info!(count = count, "Done");
    Ok(())
}
