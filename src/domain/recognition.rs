//! Single- and multi-digit recognition.
//!
//! [`DigitRecognizer`] decides how to read a drawing. The segmenter always
//! runs first; when it finds two or more digits, or the caller asks for a
//! sequence, every segment is classified on its own and the labels are
//! concatenated left to right. Otherwise the whole drawing is normalized as
//! one glyph and classified once, keeping the full probability vector.

use crate::core::config::PreprocessConfig;
use crate::core::constants::NUM_CLASSES;
use crate::core::{DigitClassifier, DigitError, DigitResult};
use crate::processors::{DigitSegmenter, Glyph, GlyphNormalizer, GrayscaleImage, Segment};
use crate::utils::topk::{argmax, validate_probabilities};
use ndarray::{Array2, ArrayView1};
use tracing::debug;

/// Predicted label and its probability for one glyph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// Digit class, 0 to 9.
    pub label: usize,
    /// Probability of `label`.
    pub confidence: f32,
}

impl Classification {
    pub fn new(label: usize, confidence: f32) -> Self {
        Self { label, confidence }
    }

    /// Picks the most probable class of a probability row.
    pub fn from_probabilities(probs: ArrayView1<'_, f32>) -> Option<Self> {
        argmax(probs).map(|(label, confidence)| Self::new(label, confidence))
    }
}

/// Result for a drawing read as a single digit.
#[derive(Debug, Clone, PartialEq)]
pub struct DigitPrediction {
    pub classification: Classification,
    /// Probability of every class, indexed by digit.
    pub probabilities: Vec<f32>,
}

/// One digit of a sequence together with the columns it was cut from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentClassification {
    pub segment: Segment,
    pub classification: Classification,
}

/// Result for a drawing read as a sequence of digits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DigitSequence {
    /// Digits ordered by segment start column.
    pub digits: Vec<SegmentClassification>,
    /// Concatenated labels, e.g. `"472"`.
    pub text: String,
}

impl DigitSequence {
    fn from_digits(digits: Vec<SegmentClassification>) -> Self {
        let text = digits
            .iter()
            .map(|digit| digit.classification.label.to_string())
            .collect();
        Self { digits, text }
    }

    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }
}

/// Outcome of [`DigitRecognizer::recognize`].
#[derive(Debug, Clone, PartialEq)]
pub enum Recognition {
    Single(DigitPrediction),
    /// May be empty when a sequence was requested for a blank drawing.
    Sequence(DigitSequence),
}

/// Reads digits from grayscale drawings with an injected classifier.
#[derive(Debug)]
pub struct DigitRecognizer {
    classifier: Box<dyn DigitClassifier>,
    normalizer: GlyphNormalizer,
    segmenter: DigitSegmenter,
}

impl DigitRecognizer {
    /// Creates a recognizer that preprocesses drawings with `config`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` is invalid.
    pub fn new(classifier: Box<dyn DigitClassifier>, config: PreprocessConfig) -> DigitResult<Self> {
        Ok(Self {
            classifier,
            normalizer: GlyphNormalizer::new(&config)?,
            segmenter: DigitSegmenter::new(&config)?,
        })
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    pub fn segmenter(&self) -> &DigitSegmenter {
        &self.segmenter
    }

    /// Reads a drawing, choosing between a single digit and a sequence.
    ///
    /// A sequence is returned when `multi` is set or the segmenter finds at
    /// least two digits. With `multi` set and nothing drawn, the sequence is
    /// empty and the classifier is not called.
    pub fn recognize(&self, image: &GrayscaleImage, multi: bool) -> DigitResult<Recognition> {
        let pairs = self.segmenter.segment_with_spans(image);
        debug!(
            segments = pairs.len(),
            multi,
            height = image.height(),
            width = image.width(),
            "segmented drawing"
        );

        if multi || pairs.len() >= 2 {
            return Ok(Recognition::Sequence(self.classify_segments(pairs)?));
        }
        Ok(Recognition::Single(self.recognize_single(image)?))
    }

    /// Normalizes the whole drawing as one glyph and classifies it.
    pub fn recognize_single(&self, image: &GrayscaleImage) -> DigitResult<DigitPrediction> {
        let glyph = self.normalizer.normalize(image);
        let probs = self.classify(std::slice::from_ref(&glyph))?;
        let row = probs.row(0);
        let classification = self.top_class(row)?;
        Ok(DigitPrediction {
            classification,
            probabilities: row.to_vec(),
        })
    }

    /// Segments the drawing and classifies every segment.
    pub fn recognize_sequence(&self, image: &GrayscaleImage) -> DigitResult<DigitSequence> {
        self.classify_segments(self.segmenter.segment_with_spans(image))
    }

    fn classify_segments(&self, pairs: Vec<(Segment, Glyph)>) -> DigitResult<DigitSequence> {
        if pairs.is_empty() {
            return Ok(DigitSequence::default());
        }
        let (segments, glyphs): (Vec<Segment>, Vec<Glyph>) = pairs.into_iter().unzip();
        let probs = self.classify(&glyphs)?;

        let digits = segments
            .into_iter()
            .zip(probs.rows())
            .map(|(segment, row)| {
                Ok(SegmentClassification {
                    segment,
                    classification: self.top_class(row)?,
                })
            })
            .collect::<DigitResult<Vec<_>>>()?;

        Ok(DigitSequence::from_digits(digits))
    }

    fn classify(&self, glyphs: &[Glyph]) -> DigitResult<Array2<f32>> {
        let probs = self.classifier.classify(glyphs)?;
        validate_probabilities(self.classifier.name(), &probs, glyphs.len(), NUM_CLASSES)?;
        Ok(probs)
    }

    fn top_class(&self, row: ArrayView1<'_, f32>) -> DigitResult<Classification> {
        Classification::from_probabilities(row).ok_or_else(|| {
            DigitError::inference(self.classifier.name(), "classifier returned an empty row")
        })
    }
}
