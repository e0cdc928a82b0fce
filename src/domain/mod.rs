//! Recognition logic built on top of the processors and a classifier.

pub mod recognition;

pub use recognition::{
    Classification, DigitPrediction, DigitRecognizer, DigitSequence, Recognition,
    SegmentClassification,
};
