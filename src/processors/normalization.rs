//! Glyph normalization.
//!
//! This module turns an arbitrary grayscale drawing into the canonical 28x28
//! representation the digit classifier was trained on:
//!
//! 1. crop to the bounding box of pixels above the foreground threshold,
//! 2. scale uniformly so the longer side becomes 20 pixels,
//! 3. paste into the middle of a 28x28 canvas,
//! 4. roll the canvas so its intensity centroid sits at (14, 14).
//!
//! Blank input yields an all-zero glyph.

use crate::core::config::{ConfigValidator, PreprocessConfig};
use crate::core::constants::{CENTROID_EPSILON, GLYPH_FIT_SIZE, GLYPH_SIZE};
use crate::core::DigitResult;
use crate::processors::geometry::{BoundingBox, intensity_centroid, roll};
use crate::processors::types::{Glyph, GrayscaleImage};
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma};
use ndarray::{Array2, ArrayView2, Axis, s};
use tracing::trace;

/// Normalizes grayscale drawings into [`Glyph`]s.
#[derive(Debug, Clone)]
pub struct GlyphNormalizer {
    foreground_threshold: f32,
}

impl GlyphNormalizer {
    /// Creates a normalizer from a validated preprocessing configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the threshold is outside [0, 1).
    pub fn new(config: &PreprocessConfig) -> DigitResult<Self> {
        config.validate()?;
        Ok(Self {
            foreground_threshold: config.foreground_threshold,
        })
    }

    pub fn foreground_threshold(&self) -> f32 {
        self.foreground_threshold
    }

    /// Normalizes a whole image.
    pub fn normalize(&self, image: &GrayscaleImage) -> Glyph {
        self.normalize_view(image.view())
    }

    /// Normalizes any 2D region, typically a crop of a larger image.
    pub fn normalize_view(&self, view: ArrayView2<'_, f32>) -> Glyph {
        let Some(bbox) = BoundingBox::of_foreground(view, self.foreground_threshold) else {
            return Glyph::zeros();
        };

        let digit = view.slice(s![bbox.row_min..=bbox.row_max, bbox.col_min..=bbox.col_max]);
        let (new_h, new_w) = fitted_size(bbox.height(), bbox.width());
        let resized = resize_bilinear(digit, new_h, new_w);

        let mut canvas = Array2::<f32>::zeros((GLYPH_SIZE, GLYPH_SIZE));
        let y_offset = (GLYPH_SIZE - new_h) / 2;
        let x_offset = (GLYPH_SIZE - new_w) / 2;
        canvas
            .slice_mut(s![y_offset..y_offset + new_h, x_offset..x_offset + new_w])
            .assign(&resized);

        let canvas = recenter_by_mass(canvas);
        trace!(
            crop_h = bbox.height(),
            crop_w = bbox.width(),
            new_h,
            new_w,
            "normalized glyph"
        );
        Glyph::from_canvas(canvas)
    }
}

impl Default for GlyphNormalizer {
    fn default() -> Self {
        Self {
            foreground_threshold: PreprocessConfig::default().foreground_threshold,
        }
    }
}

/// Target `(height, width)` once the longer side is scaled to
/// [`GLYPH_FIT_SIZE`]. The shorter side is rounded half-to-even and never
/// drops below one pixel.
///
/// The scale is computed in `f64` as `short * (20 / long)`; canvas sizes such
/// as 280x175 land on or next to a .5 tie only at that precision.
fn fitted_size(height: usize, width: usize) -> (usize, usize) {
    let fit = GLYPH_FIT_SIZE as f64;
    let scaled = |short: usize, long: usize| {
        ((short as f64 * (fit / long as f64)).round_ties_even() as usize).max(1)
    };
    if height > width {
        (GLYPH_FIT_SIZE, scaled(width, height))
    } else {
        (scaled(height, width), GLYPH_FIT_SIZE)
    }
}

/// Bilinear resampling through `image`'s triangle filter, which widens its
/// support when shrinking so thin strokes are averaged rather than skipped.
fn resize_bilinear(view: ArrayView2<'_, f32>, new_h: usize, new_w: usize) -> Array2<f32> {
    let (height, width) = view.dim();
    let source: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
            Luma([view[[y as usize, x as usize]]])
        });
    let resized = imageops::resize(&source, new_w as u32, new_h as u32, FilterType::Triangle);
    Array2::from_shape_fn((new_h, new_w), |(r, c)| {
        resized.get_pixel(c as u32, r as u32)[0].clamp(0.0, 1.0)
    })
}

/// Rolls the canvas so the intensity centroid lands on the canvas center.
fn recenter_by_mass(canvas: Array2<f32>) -> Array2<f32> {
    let center = (GLYPH_SIZE / 2) as f32;
    let (cy, cx) = intensity_centroid(canvas.view(), CENTROID_EPSILON);
    let shift_y = (center - cy).round_ties_even() as isize;
    let shift_x = (center - cx).round_ties_even() as isize;
    let canvas = roll(&canvas, Axis(0), shift_y);
    roll(&canvas, Axis(1), shift_x)
}
