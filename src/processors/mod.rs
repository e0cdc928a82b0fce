//! Image processors for the digit pipeline.
//!
//! - [`types`]: the validated [`GrayscaleImage`] input and the [`Glyph`] output
//! - [`geometry`]: bounding boxes, column runs, centroids and rolling
//! - [`normalization`]: crop, fit and recenter one digit into a glyph
//! - [`segmentation`]: split a multi-digit drawing into glyphs

pub mod geometry;
pub mod normalization;
pub mod segmentation;
pub mod types;

pub use geometry::{BoundingBox, Segment};
pub use normalization::GlyphNormalizer;
pub use segmentation::DigitSegmenter;
pub use types::{Glyph, GrayscaleImage};
