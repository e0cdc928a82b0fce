//! Interfaces between the recognition pipeline and its collaborators.

use crate::core::DigitResult;
use crate::processors::Glyph;
use ndarray::Array2;
use std::fmt::Debug;

/// A model that maps normalized glyphs to class probabilities.
///
/// Implementations return one row per glyph, in input order, with one
/// column per digit class. Rows are probabilities: non-negative and summing
/// to one.
pub trait DigitClassifier: Send + Sync + Debug {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// Classifies a batch of glyphs. An empty batch yields an empty matrix.
    fn classify(&self, glyphs: &[Glyph]) -> DigitResult<Array2<f32>>;
}
