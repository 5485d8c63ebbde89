//! FramePairGraph - symmetric pairwise relations between frames.
//!
//! The upstream two-view geometry stage estimates, for every frame pair, an
//! approximate scene-depth-to-baseline ratio (baseline normalized to 1). The
//! graph stores one relation per unordered pair in a packed lower triangle,
//! keyed by [`FramePair`], which always holds two distinct frames ordered
//! `newer > older`.

use nalgebra::DMatrix;

use crate::error::{Result, SelectionError};

use super::types::FrameIndex;

/// An unordered pair of distinct frames, stored as `(newer, older)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FramePair {
    newer: FrameIndex,
    older: FrameIndex,
}

impl FramePair {
    /// Build a pair from two distinct frames in any order.
    pub fn new(a: FrameIndex, b: FrameIndex) -> Result<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Greater => Ok(Self { newer: a, older: b }),
            std::cmp::Ordering::Less => Ok(Self { newer: b, older: a }),
            std::cmp::Ordering::Equal => Err(SelectionError::SelfPair { frame: a }),
        }
    }

    /// Frame with the larger index.
    pub fn newer(&self) -> FrameIndex {
        self.newer
    }

    /// Frame with the smaller index.
    pub fn older(&self) -> FrameIndex {
        self.older
    }

    fn slot(&self) -> usize {
        let i = self.newer.0;
        i * (i - 1) / 2 + self.older.0
    }
}

impl std::fmt::Display for FramePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.newer, self.older)
    }
}

/// Geometry hint for one frame pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairRelation {
    /// Approximate depth / baseline ratio. Large values mean near-degenerate
    /// motion (e.g. pure rotation). Unknown pairs hold `f64::INFINITY`.
    pub appro_depth: f64,
}

impl Default for PairRelation {
    fn default() -> Self {
        Self {
            appro_depth: f64::INFINITY,
        }
    }
}

/// Symmetric relation over all frame pairs of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePairGraph {
    num_frames: usize,
    relations: Vec<PairRelation>,
}

impl FramePairGraph {
    /// Create a graph where every pair is unknown.
    pub fn new(num_frames: usize) -> Self {
        let num_pairs = num_frames * num_frames.saturating_sub(1) / 2;
        Self {
            num_frames,
            relations: vec![PairRelation::default(); num_pairs],
        }
    }

    /// Build the graph from a square matrix of depth ratios.
    ///
    /// Only the strict lower triangle (`row > col`) is read; the matrix is
    /// expected to be symmetric and the diagonal is ignored.
    pub fn from_depth_matrix(depths: &DMatrix<f64>) -> Result<Self> {
        if depths.nrows() != depths.ncols() {
            return Err(SelectionError::Shape {
                what: "frame pair matrix columns",
                expected: depths.nrows(),
                found: depths.ncols(),
            });
        }

        let mut graph = Self::new(depths.nrows());
        for pair in graph.pairs().collect::<Vec<_>>() {
            graph.relations[pair.slot()] = PairRelation {
                appro_depth: depths[(pair.newer.0, pair.older.0)],
            };
        }
        Ok(graph)
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    /// Set the relation of a pair.
    pub fn set_relation(&mut self, pair: FramePair, relation: PairRelation) -> Result<()> {
        if pair.newer.0 >= self.num_frames {
            return Err(SelectionError::FrameOutOfRange {
                frame: pair.newer,
                num_frames: self.num_frames,
            });
        }
        self.relations[pair.slot()] = relation;
        Ok(())
    }

    /// Shorthand for setting only the depth ratio of `(a, b)`.
    pub fn set_depth_ratio(&mut self, a: FrameIndex, b: FrameIndex, appro_depth: f64) -> Result<()> {
        self.set_relation(FramePair::new(a, b)?, PairRelation { appro_depth })
    }

    /// Relation of a pair, or `None` if the pair lies outside the graph.
    pub fn relation(&self, pair: FramePair) -> Option<&PairRelation> {
        if pair.newer.0 >= self.num_frames {
            return None;
        }
        self.relations.get(pair.slot())
    }

    /// Depth ratio of a pair; pairs outside the graph read as infinite.
    pub fn depth_ratio(&self, pair: FramePair) -> f64 {
        self.relation(pair)
            .map_or(f64::INFINITY, |relation| relation.appro_depth)
    }

    /// All pairs in scan order: `newer` ascending in the outer loop, `older`
    /// ascending in the inner loop.
    pub fn pairs(&self) -> impl Iterator<Item = FramePair> {
        (1..self.num_frames).flat_map(|i| {
            (0..i).map(move |j| FramePair {
                newer: FrameIndex::new(i),
                older: FrameIndex::new(j),
            })
        })
    }

    /// Dense symmetric matrix of depth ratios with a zero diagonal.
    pub fn to_depth_matrix(&self) -> DMatrix<f64> {
        let mut depths = DMatrix::zeros(self.num_frames, self.num_frames);
        for pair in self.pairs() {
            let d = self.relations[pair.slot()].appro_depth;
            depths[(pair.newer.0, pair.older.0)] = d;
            depths[(pair.older.0, pair.newer.0)] = d;
        }
        depths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(i: usize) -> FrameIndex {
        FrameIndex::new(i)
    }

    #[test]
    fn test_frame_pair_orders_frames() {
        let pair = FramePair::new(f(1), f(4)).unwrap();
        assert_eq!(pair.newer(), f(4));
        assert_eq!(pair.older(), f(1));
        assert_eq!(pair, FramePair::new(f(4), f(1)).unwrap());
        assert_eq!(format!("{}", pair), "(F4, F1)");
    }

    #[test]
    fn test_frame_pair_rejects_self_pair() {
        assert_eq!(
            FramePair::new(f(2), f(2)),
            Err(SelectionError::SelfPair { frame: f(2) })
        );
    }

    #[test]
    fn test_pairs_scan_order() {
        let graph = FramePairGraph::new(4);
        let order: Vec<(usize, usize)> = graph
            .pairs()
            .map(|p| (p.newer().index(), p.older().index()))
            .collect();
        assert_eq!(order, vec![(1, 0), (2, 0), (2, 1), (3, 0), (3, 1), (3, 2)]);
    }

    #[test]
    fn test_relation_is_symmetric() {
        let mut graph = FramePairGraph::new(3);
        graph.set_depth_ratio(f(0), f(2), 0.7).unwrap();

        let a = FramePair::new(f(2), f(0)).unwrap();
        assert_eq!(graph.depth_ratio(a), 0.7);
        assert_eq!(graph.relation(a).unwrap().appro_depth, 0.7);

        // Unset pairs never pass a depth filter
        let b = FramePair::new(f(1), f(0)).unwrap();
        assert!(graph.depth_ratio(b).is_infinite());
    }

    #[test]
    fn test_out_of_range_pair() {
        let mut graph = FramePairGraph::new(2);
        let pair = FramePair::new(f(5), f(0)).unwrap();
        assert!(graph.relation(pair).is_none());
        assert!(graph.depth_ratio(pair).is_infinite());
        assert!(graph.set_relation(pair, PairRelation::default()).is_err());
    }

    #[test]
    fn test_depth_matrix_roundtrip() {
        let depths = DMatrix::from_row_slice(
            3,
            3,
            &[
                0.0, 1.5, 2.5, //
                1.5, 0.0, 3.5, //
                2.5, 3.5, 0.0,
            ],
        );
        let graph = FramePairGraph::from_depth_matrix(&depths).unwrap();
        assert_eq!(graph.num_frames(), 3);
        assert_eq!(graph.depth_ratio(FramePair::new(f(2), f(1)).unwrap()), 3.5);
        assert_eq!(graph.to_depth_matrix(), depths);
    }

    #[test]
    fn test_depth_matrix_must_be_square() {
        let depths = DMatrix::<f64>::zeros(3, 2);
        assert!(matches!(
            FramePairGraph::from_depth_matrix(&depths),
            Err(SelectionError::Shape { .. })
        ));
    }

    #[test]
    fn test_single_frame_graph_has_no_pairs() {
        assert_eq!(FramePairGraph::new(1).pairs().count(), 0);
        assert_eq!(FramePairGraph::new(0).pairs().count(), 0);
    }
}
