//! Raw model output

/// Raw score array produced by a forward pass.
///
/// Holds the output shape as reported by the runtime and the values in
/// row-major order. Never modified after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreArray {
    shape: Vec<usize>,
    values: Vec<f32>,
}

/// How a score array should be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreKind {
    /// One sigmoid score per sample
    Binary,
    /// A softmax distribution over two or more classes per sample
    MultiClass,
}

impl ScoreArray {
    /// Create a score array from a shape and its values.
    ///
    /// Returns `None` when the shape does not describe `values.len()` elements.
    pub fn new(shape: Vec<usize>, values: Vec<f32>) -> Option<Self> {
        let expected: usize = shape.iter().product();
        if expected != values.len() {
            return None;
        }
        Some(Self { shape, values })
    }

    /// A single scalar score, as a binary sigmoid head produces
    pub fn scalar(score: f32) -> Self {
        Self {
            shape: vec![1, 1],
            values: vec![score],
        }
    }

    /// One row of per-class scores, as a softmax head produces
    pub fn distribution(scores: Vec<f32>) -> Self {
        Self {
            shape: vec![1, scores.len()],
            values: scores,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of scores for each sample: the trailing dimension, or 1 for a scalar.
    pub fn scores_per_sample(&self) -> usize {
        match self.shape.len() {
            0 => 1,
            1 => self.shape[0],
            _ => self.shape[self.shape.len() - 1],
        }
    }

    /// Binary when each sample has exactly one score, multi-class otherwise
    pub fn kind(&self) -> Option<ScoreKind> {
        if self.is_empty() {
            return None;
        }
        match self.scores_per_sample() {
            1 => Some(ScoreKind::Binary),
            _ => Some(ScoreKind::MultiClass),
        }
    }

    /// Scores of the first sample in the batch
    pub fn first_sample(&self) -> &[f32] {
        let n = self.scores_per_sample().min(self.values.len());
        &self.values[..n]
    }
}
