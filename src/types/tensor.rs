//! Model input tensor

use ndarray::Array4;

/// Normalized image batch in NHWC layout, values in `[0, 1]`.
///
/// Always carries a single image: the leading batch dimension is 1.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    data: Array4<f32>,
}

impl ImageTensor {
    /// Wrap an existing `(batch, height, width, channels)` array
    pub fn new(data: Array4<f32>) -> Self {
        Self { data }
    }

    /// Shape as `[batch, height, width, channels]`
    pub fn shape(&self) -> [usize; 4] {
        let (n, h, w, c) = self.data.dim();
        [n, h, w, c]
    }

    /// Underlying array
    pub fn as_array(&self) -> &Array4<f32> {
        &self.data
    }

    /// Flat row-major copy of the values, in the order ONNX Runtime expects
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }

    /// Iterate over every value
    pub fn values(&self) -> impl Iterator<Item = f32> + '_ {
        self.data.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_and_flatten_order() {
        let data = Array4::from_shape_fn((1, 2, 2, 3), |(_, y, x, c)| (y * 6 + x * 3 + c) as f32);
        let tensor = ImageTensor::new(data);

        assert_eq!(tensor.shape(), [1, 2, 2, 3]);
        let flat = tensor.to_vec();
        assert_eq!(flat.len(), 12);
        assert_eq!(flat[0], 0.0);
        assert_eq!(flat[11], 11.0);
    }
}
