//! Image types flowing through the recognition pipeline.
//!
//! [`GrayscaleImage`] is the validated input of the pipeline and [`Glyph`] the
//! fixed-size output handed to the classifier.

use crate::core::constants::GLYPH_SIZE;
use crate::core::{DigitError, DigitResult};
use ndarray::{Array2, ArrayView2};

/// A 2D array of intensities in [0, 1], stored row-major.
///
/// Construction validates the shape and the values so later stages can rely on
/// a non-empty, finite, in-range array.
#[derive(Debug, Clone, PartialEq)]
pub struct GrayscaleImage {
    pixels: Array2<f32>,
}

impl GrayscaleImage {
    /// Wraps an array of intensities.
    ///
    /// # Errors
    ///
    /// Returns [`DigitError::InvalidInput`] if either dimension is zero or any
    /// value is NaN or infinite. Finite values outside [0, 1] are clamped.
    pub fn from_array(mut pixels: Array2<f32>) -> DigitResult<Self> {
        let (height, width) = pixels.dim();
        if height == 0 || width == 0 {
            return Err(DigitError::invalid_input(format!(
                "grayscale image must be non-empty, got {height}x{width}"
            )));
        }
        if let Some(bad) = pixels.iter().find(|v| !v.is_finite()) {
            return Err(DigitError::invalid_input(format!(
                "grayscale image contains a non-finite intensity: {bad}"
            )));
        }
        pixels.mapv_inplace(|v| v.clamp(0.0, 1.0));
        Ok(Self { pixels })
    }

    /// Builds an image from row-major data.
    ///
    /// # Errors
    ///
    /// Returns [`DigitError::InvalidInput`] when `data.len()` does not equal
    /// `height * width`, plus every error of [`GrayscaleImage::from_array`].
    pub fn from_shape_vec(height: usize, width: usize, data: Vec<f32>) -> DigitResult<Self> {
        let len = data.len();
        let pixels = Array2::from_shape_vec((height, width), data).map_err(|_| {
            DigitError::invalid_input(format!(
                "expected {} intensities for a {height}x{width} image, got {len}",
                height * width
            ))
        })?;
        Self::from_array(pixels)
    }

    /// Converts an 8-bit luma image, scaling values into [0, 1].
    pub fn from_luma8(image: &image::GrayImage) -> DigitResult<Self> {
        let (width, height) = image.dimensions();
        let data = image.as_raw().iter().map(|&v| v as f32 / 255.0).collect();
        Self::from_shape_vec(height as usize, width as usize, data)
    }

    pub fn height(&self) -> usize {
        self.pixels.nrows()
    }

    pub fn width(&self) -> usize {
        self.pixels.ncols()
    }

    /// Borrowed view of the intensities.
    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.pixels.view()
    }

    pub fn as_array(&self) -> &Array2<f32> {
        &self.pixels
    }
}

/// A normalized 28x28 digit image with values in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pixels: Array2<f32>,
}

impl Glyph {
    /// The all-zero glyph produced for blank input.
    pub fn zeros() -> Self {
        Self {
            pixels: Array2::zeros((GLYPH_SIZE, GLYPH_SIZE)),
        }
    }

    /// Wraps a finished canvas. Only the normalizer builds glyphs.
    pub(crate) fn from_canvas(canvas: Array2<f32>) -> Self {
        debug_assert_eq!(canvas.dim(), (GLYPH_SIZE, GLYPH_SIZE));
        Self { pixels: canvas }
    }

    pub fn as_array(&self) -> &Array2<f32> {
        &self.pixels
    }

    /// Row-major copy of the pixels.
    pub fn to_vec(&self) -> Vec<f32> {
        self.pixels.iter().copied().collect()
    }

    /// True when no pixel carries any intensity.
    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|&v| v == 0.0)
    }
}

impl Default for Glyph {
    fn default() -> Self {
        Self::zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_malformed_shapes() {
        assert!(GrayscaleImage::from_shape_vec(2, 3, vec![0.0; 5]).is_err());
        assert!(GrayscaleImage::from_shape_vec(0, 3, vec![]).is_err());
        assert!(GrayscaleImage::from_array(Array2::zeros((4, 0))).is_err());
    }

    #[test]
    fn test_rejects_non_finite_and_clamps() {
        assert!(GrayscaleImage::from_shape_vec(1, 2, vec![0.5, f32::NAN]).is_err());

        let image = GrayscaleImage::from_shape_vec(1, 3, vec![-0.5, 0.25, 2.0]).unwrap();
        let values: Vec<f32> = image.view().iter().copied().collect();
        assert_eq!(values, vec![0.0, 0.25, 1.0]);
    }

    #[test]
    fn test_from_luma8_scales_to_unit_range() {
        let luma = image::GrayImage::from_raw(2, 1, vec![0, 255]).unwrap();
        let image = GrayscaleImage::from_luma8(&luma).unwrap();
        assert_eq!((image.height(), image.width()), (1, 2));
        assert_eq!(image.view()[[0, 1]], 1.0);
    }

    #[test]
    fn test_zero_glyph() {
        let glyph = Glyph::zeros();
        assert_eq!(glyph.as_array().dim(), (28, 28));
        assert!(glyph.is_blank());
        assert_eq!(glyph.to_vec().len(), 784);
    }
}
