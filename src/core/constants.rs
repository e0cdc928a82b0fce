//! Constants shared across the pipeline.

/// Side length of a normalized glyph, matching the MNIST training data.
pub const GLYPH_SIZE: usize = 28;

/// Length of the longer side of the digit once it is fitted into a glyph.
pub const GLYPH_FIT_SIZE: usize = 20;

/// Number of digit classes the classifier distinguishes.
pub const NUM_CLASSES: usize = 10;

/// Default intensity above which a pixel counts as ink.
pub const DEFAULT_FOREGROUND_THRESHOLD: f32 = 0.08;

/// Default minimum width, in columns, of a segment kept by the segmenter.
pub const DEFAULT_MIN_SEGMENT_WIDTH: usize = 4;

/// Added to the total mass before computing a centroid.
pub const CENTROID_EPSILON: f32 = 1e-8;
