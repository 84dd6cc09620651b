//! Image preprocessing for classifier inference.
//!
//! Turns uploaded image bytes into the tensor layout the wildfire model was
//! trained on: RGB, resized (not cropped) to the model's input size, scaled
//! to `[0, 1]`, with a leading batch dimension of 1.

use crate::types::tensor::ImageTensor;
use image::imageops::FilterType;
use image::ImageFormat;
use ndarray::Array4;
use thiserror::Error;

/// Errors raised while preparing an image for the model
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("cannot identify image file: {0}")]
    Decode(#[from] image::ImageError),

    #[error("image has zero width or height")]
    EmptyImage,
}

/// Converts raw image bytes into normalized model input.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    width: u32,
    height: u32,
    filter: FilterType,
}

impl Preprocessor {
    /// Create a preprocessor for a model with the given spatial input size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            filter: FilterType::CatmullRom,
        }
    }

    /// Decode, resize and normalize an image.
    ///
    /// Output shape is `(1, height, width, 3)`. Identical bytes always
    /// produce identical tensors.
    pub fn preprocess(&self, image_bytes: &[u8]) -> Result<ImageTensor, PreprocessError> {
        // TGA carries no signature, so it is tried only when sniffing fails
        let image = image::load_from_memory(image_bytes).or_else(|e| {
            image::load_from_memory_with_format(image_bytes, ImageFormat::Tga).map_err(|_| e)
        })?;
        if image.width() == 0 || image.height() == 0 {
            return Err(PreprocessError::EmptyImage);
        }

        let rgb = image.to_rgb8();
        let resized = image::imageops::resize(&rgb, self.width, self.height, self.filter);

        let data = Array4::from_shape_fn(
            (1, self.height as usize, self.width as usize, 3),
            |(_, y, x, c)| resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0,
        );

        Ok(ImageTensor::new(data))
    }

    /// Shape of every tensor this preprocessor produces
    pub fn output_shape(&self) -> [usize; 4] {
        [1, self.height as usize, self.width as usize, 3]
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(224, 224)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    pub(crate) fn encode_png(image: DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn gradient(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        });
        encode_png(DynamicImage::ImageRgb8(image))
    }

    #[test]
    fn test_output_shape_for_any_resolution() {
        let preprocessor = Preprocessor::default();

        for (w, h) in [(1, 1), (17, 300), (224, 224), (640, 480), (1000, 12)] {
            let tensor = preprocessor.preprocess(&gradient(w, h)).unwrap();
            assert_eq!(tensor.shape(), [1, 224, 224, 3], "input {w}x{h}");
        }
    }

    #[test]
    fn test_values_in_unit_range() {
        let preprocessor = Preprocessor::default();
        let tensor = preprocessor.preprocess(&gradient(333, 129)).unwrap();

        assert!(tensor.values().all(|v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_deterministic() {
        let preprocessor = Preprocessor::default();
        let bytes = gradient(97, 211);

        let first = preprocessor.preprocess(&bytes).unwrap();
        let second = preprocessor.preprocess(&bytes).unwrap();

        let first_bits: Vec<u32> = first.values().map(f32::to_bits).collect();
        let second_bits: Vec<u32> = second.values().map(f32::to_bits).collect();
        assert_eq!(first_bits, second_bits);
    }

    #[test]
    fn test_alpha_is_dropped_and_scaled() {
        let image = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 51, 0]));
        let bytes = encode_png(DynamicImage::ImageRgba8(image));

        let tensor = Preprocessor::new(4, 4).preprocess(&bytes).unwrap();
        let array = tensor.as_array();

        assert_eq!(tensor.shape(), [1, 4, 4, 3]);
        assert!((array[[0, 0, 0, 0]] - 1.0).abs() < 1e-6);
        assert!(array[[0, 2, 3, 1]].abs() < 1e-6);
        assert!((array[[0, 3, 1, 2]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_grayscale_expands_to_three_channels() {
        let image = image::GrayImage::from_pixel(8, 8, image::Luma([128]));
        let bytes = encode_png(DynamicImage::ImageLuma8(image));

        let tensor = Preprocessor::new(2, 2).preprocess(&bytes).unwrap();
        let array = tensor.as_array();
        let expected = 128.0 / 255.0;
        for c in 0..3 {
            assert!((array[[0, 1, 1, c]] - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_decodes_less_common_formats() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(12, 9, Rgb([200, 40, 10])));

        for format in [ImageFormat::Tiff, ImageFormat::Pnm, ImageFormat::Tga] {
            let mut bytes = Vec::new();
            image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();

            let tensor = Preprocessor::new(3, 3).preprocess(&bytes).unwrap();
            let array = tensor.as_array();
            assert!((array[[0, 1, 1, 0]] - 200.0 / 255.0).abs() < 2.0 / 255.0, "{format:?}");
        }
    }

    #[test]
    fn test_invalid_bytes_fail_to_decode() {
        let result = Preprocessor::default().preprocess(b"definitely not an image");
        assert!(matches!(result, Err(PreprocessError::Decode(_))));
    }

    #[test]
    fn test_custom_input_size() {
        let preprocessor = Preprocessor::new(64, 32);
        let tensor = preprocessor.preprocess(&gradient(50, 50)).unwrap();
        assert_eq!(tensor.shape(), [1, 32, 64, 3]);
        assert_eq!(preprocessor.output_shape(), [1, 32, 64, 3]);
    }
}
