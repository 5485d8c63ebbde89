//! Track structures consumed by view selection.
//!
//! - [`TrackMatrix`] - frame × point visibility, packed as a dense bitset
//! - [`FramePairGraph`] - symmetric per-pair depth/baseline ratios
//! - [`FrameIndex`] / [`PointId`] - index types addressing both
//!
//! Both structures are filled by upstream stages (track merging and two-view
//! geometry). The selectors only read them.
//!
//! # Example
//!
//! ```
//! use rust_sfm::tracks::{FrameIndex, FramePairGraph, PointId, TrackMatrix};
//!
//! let mut tracks = TrackMatrix::new(2, 3);
//! tracks.set_visible(FrameIndex::new(0), PointId::new(1)).unwrap();
//! tracks.set_visible(FrameIndex::new(1), PointId::new(1)).unwrap();
//! assert_eq!(tracks.track_lengths(), vec![0, 2, 0]);
//!
//! let mut graph = FramePairGraph::new(2);
//! graph.set_depth_ratio(FrameIndex::new(1), FrameIndex::new(0), 0.5).unwrap();
//! ```

pub mod pair_graph;
pub mod track_matrix;
pub mod types;

pub use pair_graph::{FramePair, FramePairGraph, PairRelation};
pub use track_matrix::TrackMatrix;
pub use types::{FrameIndex, PointId};
