//! Multi-digit segmentation by vertical gaps.
//!
//! Digits drawn side by side on a canvas are separated by at least one column
//! without ink. The segmenter projects the foreground onto the column axis,
//! splits it into runs, drops runs too narrow to be a digit, and normalizes
//! each remaining run into a [`Glyph`].
//!
//! Every segment is cut with the same row range, the rows spanned by the whole
//! drawing, before it is handed to the normalizer.

use crate::core::config::{ConfigValidator, PreprocessConfig};
use crate::core::DigitResult;
use crate::processors::geometry::{Segment, column_runs, first_and_last, foreground_profiles};
use crate::processors::normalization::GlyphNormalizer;
use crate::processors::types::{Glyph, GrayscaleImage};
use ndarray::s;
use tracing::debug;

/// Splits a drawing into per-digit glyphs, left to right.
#[derive(Debug, Clone)]
pub struct DigitSegmenter {
    normalizer: GlyphNormalizer,
    min_segment_width: usize,
}

impl DigitSegmenter {
    /// Creates a segmenter whose glyphs are normalized with the same threshold.
    pub fn new(config: &PreprocessConfig) -> DigitResult<Self> {
        config.validate()?;
        Ok(Self {
            normalizer: GlyphNormalizer::new(config)?,
            min_segment_width: config.min_segment_width,
        })
    }

    pub fn min_segment_width(&self) -> usize {
        self.min_segment_width
    }

    /// Column ranges of the candidate digits, ordered by start column.
    pub fn find_segments(&self, image: &GrayscaleImage) -> Vec<Segment> {
        let (_, cols) = foreground_profiles(image.view(), self.normalizer.foreground_threshold());
        self.filter_runs(&cols)
    }

    /// One glyph per detected digit, left to right. Blank input yields no
    /// glyphs.
    pub fn segment(&self, image: &GrayscaleImage) -> Vec<Glyph> {
        self.segment_with_spans(image)
            .into_iter()
            .map(|(_, glyph)| glyph)
            .collect()
    }

    /// Like [`DigitSegmenter::segment`] but keeps the column range each glyph
    /// was cut from.
    pub fn segment_with_spans(&self, image: &GrayscaleImage) -> Vec<(Segment, Glyph)> {
        let view = image.view();
        let (rows, cols) = foreground_profiles(view, self.normalizer.foreground_threshold());

        let segments = self.filter_runs(&cols);
        if segments.is_empty() {
            return Vec::new();
        }

        let (row_min, row_max) = first_and_last(&rows).unwrap_or((0, image.height() - 1));

        segments
            .into_iter()
            .map(|segment| {
                let crop = view.slice(s![row_min..=row_max, segment.start..=segment.end]);
                (segment, self.normalizer.normalize_view(crop))
            })
            .collect()
    }

    fn filter_runs(&self, cols: &[bool]) -> Vec<Segment> {
        let runs = column_runs(cols);
        let total = runs.len();
        let kept: Vec<Segment> = runs
            .into_iter()
            .filter(|segment| segment.width() >= self.min_segment_width)
            .collect();
        if kept.len() != total {
            debug!(
                dropped = total - kept.len(),
                min_width = self.min_segment_width,
                "dropped narrow column runs"
            );
        }
        kept
    }
}

impl Default for DigitSegmenter {
    fn default() -> Self {
        Self {
            normalizer: GlyphNormalizer::default(),
            min_segment_width: PreprocessConfig::default().min_segment_width,
        }
    }
}
