//! TrackMatrix - frame × point visibility relation.
//!
//! Each frame owns one row of the matrix; bit `p` of a row is set iff the
//! track of point `p` contains an observation in that frame. Rows are packed
//! into 64-bit words and stored contiguously, so the matrix is rectangular by
//! construction. Growing the point dimension goes through [`TrackMatrix::normalize`].
//!
//! Bits past `num_points` in the last word of a row are always zero.

use crate::error::{Result, SelectionError};

use super::types::{FrameIndex, PointId};

const WORD_BITS: usize = 64;

fn words_for(num_points: usize) -> usize {
    num_points.div_ceil(WORD_BITS)
}

/// Dense bitset visibility matrix addressed by `(FrameIndex, PointId)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackMatrix {
    num_frames: usize,
    num_points: usize,
    words_per_row: usize,
    bits: Vec<u64>,
}

impl TrackMatrix {
    /// Create a matrix with no observations.
    pub fn new(num_frames: usize, num_points: usize) -> Self {
        let words_per_row = words_for(num_points);
        Self {
            num_frames,
            num_points,
            words_per_row,
            bits: vec![0; num_frames * words_per_row],
        }
    }

    /// Build a matrix from boolean rows, one per frame.
    ///
    /// Rows may have different lengths (frames registered before later points
    /// existed). The width becomes the longest row; shorter rows are
    /// zero-padded.
    pub fn from_rows<R: AsRef<[bool]>>(rows: &[R]) -> Self {
        let num_points = rows.iter().map(|r| r.as_ref().len()).max().unwrap_or(0);
        let mut matrix = Self::new(rows.len(), num_points);

        for (frame, row) in rows.iter().enumerate() {
            let base = frame * matrix.words_per_row;
            for (point, _) in row.as_ref().iter().enumerate().filter(|&(_, &v)| v) {
                matrix.bits[base + point / WORD_BITS] |= 1u64 << (point % WORD_BITS);
            }
        }

        matrix
    }

    /// Build a matrix of the given shape from `(frame, point)` observations.
    pub fn from_observations<I>(num_frames: usize, num_points: usize, observations: I) -> Result<Self>
    where
        I: IntoIterator<Item = (FrameIndex, PointId)>,
    {
        let mut matrix = Self::new(num_frames, num_points);
        for (frame, point) in observations {
            matrix.set_visible(frame, point)?;
        }
        Ok(matrix)
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    pub fn num_points(&self) -> usize {
        self.num_points
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Shape
    // ─────────────────────────────────────────────────────────────────────────

    /// Resize every row to `point_count` entries, zero-filling new entries.
    ///
    /// Fails if `frame_count` does not match the rows present, or if
    /// `point_count` would drop existing columns. Calling it again with the
    /// same shape is a no-op.
    pub fn normalize(&mut self, frame_count: usize, point_count: usize) -> Result<()> {
        if frame_count != self.num_frames {
            return Err(SelectionError::Shape {
                what: "track matrix frames",
                expected: frame_count,
                found: self.num_frames,
            });
        }
        if point_count < self.num_points {
            return Err(SelectionError::Shape {
                what: "track matrix points",
                expected: point_count,
                found: self.num_points,
            });
        }

        let new_words = words_for(point_count);
        if new_words != self.words_per_row {
            let mut bits = vec![0u64; self.num_frames * new_words];
            for frame in 0..self.num_frames {
                let old = &self.bits[frame * self.words_per_row..(frame + 1) * self.words_per_row];
                bits[frame * new_words..frame * new_words + self.words_per_row].copy_from_slice(old);
            }
            self.bits = bits;
            self.words_per_row = new_words;
        }
        self.num_points = point_count;
        Ok(())
    }

    /// Append a frame with no observations and return its index.
    pub fn add_frame(&mut self) -> FrameIndex {
        self.bits.extend(std::iter::repeat(0).take(self.words_per_row));
        self.num_frames += 1;
        FrameIndex::new(self.num_frames - 1)
    }

    /// Record that `point` is observed in `frame`.
    pub fn set_visible(&mut self, frame: FrameIndex, point: PointId) -> Result<()> {
        self.check_frame(frame)?;
        self.check_point(point)?;
        let word = frame.0 * self.words_per_row + point.0 / WORD_BITS;
        self.bits[word] |= 1u64 << (point.0 % WORD_BITS);
        Ok(())
    }

    pub(crate) fn check_frame(&self, frame: FrameIndex) -> Result<()> {
        if frame.0 >= self.num_frames {
            return Err(SelectionError::FrameOutOfRange {
                frame,
                num_frames: self.num_frames,
            });
        }
        Ok(())
    }

    pub(crate) fn check_point(&self, point: PointId) -> Result<()> {
        if point.0 >= self.num_points {
            return Err(SelectionError::PointOutOfRange {
                point,
                num_points: self.num_points,
            });
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether `point` is observed in `frame`. Out-of-range indices read as
    /// not visible.
    pub fn is_visible(&self, frame: FrameIndex, point: PointId) -> bool {
        if frame.0 >= self.num_frames || point.0 >= self.num_points {
            return false;
        }
        let word = self.bits[frame.0 * self.words_per_row + point.0 / WORD_BITS];
        word & (1u64 << (point.0 % WORD_BITS)) != 0
    }

    /// Packed row of a frame. Panics if `frame` is out of range.
    pub(crate) fn row_words(&self, frame: FrameIndex) -> &[u64] {
        let start = frame.0 * self.words_per_row;
        &self.bits[start..start + self.words_per_row]
    }

    /// Points observed in `frame`, in ascending id order.
    pub fn frame_points(&self, frame: FrameIndex) -> impl Iterator<Item = PointId> + '_ {
        let words: &[u64] = if frame.0 < self.num_frames {
            self.row_words(frame)
        } else {
            &[]
        };
        SetBits::new(words.iter().copied())
    }

    /// Points observed in both `a` and `b`, in ascending id order.
    pub fn covisible_points(&self, a: FrameIndex, b: FrameIndex) -> impl Iterator<Item = PointId> + '_ {
        let (wa, wb): (&[u64], &[u64]) = if a.0 < self.num_frames && b.0 < self.num_frames {
            (self.row_words(a), self.row_words(b))
        } else {
            (&[], &[])
        };
        SetBits::new(wa.iter().zip(wb).map(|(x, y)| x & y))
    }

    /// Number of observations in `frame`.
    pub fn frame_observation_count(&self, frame: FrameIndex) -> usize {
        if frame.0 >= self.num_frames {
            return 0;
        }
        self.row_words(frame).iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Number of frames observing each point (the track length).
    pub fn track_lengths(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.num_points];
        for frame in 0..self.num_frames {
            for point in self.frame_points(FrameIndex::new(frame)) {
                counts[point.0] += 1;
            }
        }
        counts
    }
}

/// Iterator over the set bit positions of a word stream.
struct SetBits<I> {
    words: I,
    current: u64,
    base: usize,
}

impl<I: Iterator<Item = u64>> SetBits<I> {
    fn new(mut words: I) -> Self {
        let current = words.next().unwrap_or(0);
        Self {
            words,
            current,
            base: 0,
        }
    }
}

impl<I: Iterator<Item = u64>> Iterator for SetBits<I> {
    type Item = PointId;

    fn next(&mut self) -> Option<PointId> {
        while self.current == 0 {
            self.current = self.words.next()?;
            self.base += WORD_BITS;
        }
        let bit = self.current.trailing_zeros() as usize;
        // clear lowest set bit
        self.current &= self.current - 1;
        Some(PointId::new(self.base + bit))
    }
}
