//! Geometric primitives over grayscale arrays.
//!
//! Foreground masks are never materialized; callers work with the row and
//! column projections returned by [`foreground_profiles`].

use ndarray::{Array2, ArrayView2, Axis};

/// Inclusive pixel extents of the foreground of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub row_min: usize,
    pub row_max: usize,
    pub col_min: usize,
    pub col_max: usize,
}

impl BoundingBox {
    /// Tight box around every pixel above `threshold`, or `None` when no pixel
    /// qualifies.
    pub fn of_foreground(view: ArrayView2<'_, f32>, threshold: f32) -> Option<Self> {
        let (rows, cols) = foreground_profiles(view, threshold);
        let (row_min, row_max) = first_and_last(&rows)?;
        let (col_min, col_max) = first_and_last(&cols)?;
        Some(Self {
            row_min,
            row_max,
            col_min,
            col_max,
        })
    }

    pub fn height(&self) -> usize {
        self.row_max - self.row_min + 1
    }

    pub fn width(&self) -> usize {
        self.col_max - self.col_min + 1
    }
}

/// Inclusive column range holding one candidate digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
}

impl Segment {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "segment start {start} after end {end}");
        Self { start, end }
    }

    pub fn width(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Row and column projections of the foreground mask.
///
/// `rows[i]` is true when row `i` holds any pixel strictly above `threshold`,
/// and likewise for `cols`.
pub fn foreground_profiles(view: ArrayView2<'_, f32>, threshold: f32) -> (Vec<bool>, Vec<bool>) {
    let (height, width) = view.dim();
    let mut rows = vec![false; height];
    let mut cols = vec![false; width];
    for ((r, c), &value) in view.indexed_iter() {
        if value > threshold {
            rows[r] = true;
            cols[c] = true;
        }
    }
    (rows, cols)
}

/// Indices of the first and last `true` entries.
pub fn first_and_last(flags: &[bool]) -> Option<(usize, usize)> {
    let first = flags.iter().position(|&f| f)?;
    let last = flags.iter().rposition(|&f| f)?;
    Some((first, last))
}

/// Maximal runs of `true` values, in order.
///
/// A run still open at the end of the slice closes at the last index.
pub fn column_runs(columns: &[bool]) -> Vec<Segment> {
    let mut runs = Vec::new();
    let mut open: Option<usize> = None;

    for (i, &filled) in columns.iter().enumerate() {
        match (filled, open) {
            (true, None) => open = Some(i),
            (false, Some(start)) => {
                runs.push(Segment::new(start, i - 1));
                open = None;
            }
            _ => {}
        }
    }
    if let Some(start) = open {
        runs.push(Segment::new(start, columns.len() - 1));
    }

    runs
}

/// Intensity-weighted center of mass as `(row, col)`.
///
/// `epsilon` is added to the total mass so an empty array yields `(0, 0)`
/// instead of NaN.
pub fn intensity_centroid(view: ArrayView2<'_, f32>, epsilon: f32) -> (f32, f32) {
    let mut total = 0.0f32;
    let mut row_moment = 0.0f32;
    let mut col_moment = 0.0f32;
    for ((r, c), &value) in view.indexed_iter() {
        total += value;
        row_moment += r as f32 * value;
        col_moment += c as f32 * value;
    }
    let total = total + epsilon;
    (row_moment / total, col_moment / total)
}

/// Cyclically shifts an array along `axis`; entries pushed past the end wrap
/// around to the start.
pub fn roll(array: &Array2<f32>, axis: Axis, shift: isize) -> Array2<f32> {
    let len = array.len_of(axis);
    if len == 0 || shift.rem_euclid(len as isize) == 0 {
        return array.clone();
    }

    let mut rolled = Array2::zeros(array.raw_dim());
    for (i, lane) in array.axis_iter(axis).enumerate() {
        let target = (i as isize + shift).rem_euclid(len as isize) as usize;
        rolled.index_axis_mut(axis, target).assign(&lane);
    }
    rolled
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_bounding_box() {
        let image = array![
            [0.0f32, 0.0, 0.0, 0.0],
            [0.0, 0.5, 0.0, 0.0],
            [0.0, 0.0, 0.9, 0.0],
        ];
        let bbox = BoundingBox::of_foreground(image.view(), 0.08).unwrap();
        assert_eq!(
            bbox,
            BoundingBox {
                row_min: 1,
                row_max: 2,
                col_min: 1,
                col_max: 2
            }
        );
        assert_eq!((bbox.height(), bbox.width()), (2, 2));
    }

    #[test]
    fn test_threshold_is_strict() {
        let image = array![[0.08f32, 0.0], [0.0, 0.05]];
        assert!(BoundingBox::of_foreground(image.view(), 0.08).is_none());
    }

    #[test]
    fn test_column_runs() {
        let cols = [false, true, true, false, false, true, false, true, true];
        assert_eq!(
            column_runs(&cols),
            vec![Segment::new(1, 2), Segment::new(5, 5), Segment::new(7, 8)]
        );
        assert_eq!(column_runs(&[true, true]), vec![Segment::new(0, 1)]);
        assert!(column_runs(&[false, false]).is_empty());
        assert!(column_runs(&[]).is_empty());
    }

    #[test]
    fn test_centroid() {
        let image = array![[0.0f32, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0, 1.0]];
        let (cy, cx) = intensity_centroid(image.view(), 1e-8);
        assert!((cy - 1.5).abs() < 1e-5);
        assert!((cx - 2.0).abs() < 1e-5);

        let empty = Array2::<f32>::zeros((3, 3));
        assert_eq!(intensity_centroid(empty.view(), 1e-8), (0.0, 0.0));
    }

    #[test]
    fn test_roll_wraps_around() {
        let image = array![[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]];
        assert_eq!(
            roll(&image, Axis(1), 1),
            array![[3.0f32, 1.0, 2.0], [6.0, 4.0, 5.0]]
        );
        assert_eq!(
            roll(&image, Axis(1), -1),
            array![[2.0f32, 3.0, 1.0], [5.0, 6.0, 4.0]]
        );
        assert_eq!(roll(&image, Axis(0), 3), array![[4.0f32, 5.0, 6.0], [1.0, 2.0, 3.0]]);
        assert_eq!(roll(&image, Axis(0), 0), image);
    }
}
