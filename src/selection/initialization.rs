//! Initialization pair search.
//!
//! Every frame pair `(i, j)`, `i > j`, whose depth/baseline ratio passes the
//! degeneracy filter is scored by
//!
//! ```text
//! score(i, j) = Σ_p [visible(i, p) ∧ visible(j, p)] · track_length(p)
//! ```
//!
//! so pairs whose shared points are also seen by many other frames are
//! preferred. The best pair is kept with `>=`: among equal scores the pair
//! scanned last wins (scan order is [`FramePairGraph::pairs`]).

use std::time::Instant;

use crate::config::InitializationParams;
use crate::error::{Result, SelectionError};
use crate::observe::{InitializationDiagnostics, SelectionEvent, SelectionObserver};
use crate::tracks::{FrameIndex, FramePair, FramePairGraph, TrackMatrix};

use super::result::{InitializationPair, SelectionStatus};

/// Chooses the two frames that bootstrap the reconstruction.
#[derive(Debug, Clone, Default)]
pub struct InitializationSelector {
    params: InitializationParams,
}

impl InitializationSelector {
    pub fn new(params: InitializationParams) -> Self {
        Self { params }
    }

    /// Run the pair search.
    ///
    /// Fails only on structural problems: fewer than two frames, or a pair
    /// graph whose frame count differs from the track matrix. When no pair
    /// scores above `min_track_count`, returns frames `(1, 0)` with their
    /// depth ratio and [`SelectionStatus::Fallback`].
    pub fn select(
        &self,
        tracks: &TrackMatrix,
        graph: &FramePairGraph,
        observer: &dyn SelectionObserver,
    ) -> Result<InitializationPair> {
        let start = Instant::now();

        let num_frames = tracks.num_frames();
        if num_frames < 2 {
            return Err(SelectionError::InsufficientFrames { found: num_frames });
        }
        if graph.num_frames() != num_frames {
            return Err(SelectionError::Shape {
                what: "frame pair graph frames",
                expected: num_frames,
                found: graph.num_frames(),
            });
        }

        let track_lengths = tracks.track_lengths();
        let min_score = self.params.min_track_count;

        let mut best_score = min_score;
        let mut best: Option<(FramePair, f64)> = None;
        let mut pairs_scored = 0;
        let mut pairs_rejected_by_depth = 0;
        let mut candidates = 0;

        for pair in graph.pairs() {
            let depth_ratio = graph.depth_ratio(pair);
            // Baseline too short for reliable triangulation
            if depth_ratio.is_nan() || depth_ratio > self.params.max_depth_ratio {
                pairs_rejected_by_depth += 1;
                continue;
            }

            pairs_scored += 1;
            let score: usize = tracks
                .covisible_points(pair.newer(), pair.older())
                .map(|point| track_lengths[point.index()])
                .sum();

            if score <= min_score {
                continue;
            }
            candidates += 1;

            if score >= best_score {
                best_score = score;
                best = Some((pair, depth_ratio));
            }
        }

        let result = match best {
            Some((pair, depth_ratio)) => InitializationPair {
                pair,
                depth_ratio,
                score: Some(best_score),
                status: SelectionStatus::Selected,
            },
            None => {
                let pair = FramePair::new(FrameIndex::new(1), FrameIndex::new(0))?;
                InitializationPair {
                    pair,
                    depth_ratio: graph.depth_ratio(pair),
                    score: None,
                    status: SelectionStatus::Fallback,
                }
            }
        };

        observer.on_event(&SelectionEvent::InitializationSearched(
            InitializationDiagnostics {
                num_frames,
                num_points: tracks.num_points(),
                pairs_scored,
                pairs_rejected_by_depth,
                candidates,
                pair: result.pair,
                depth_ratio: result.depth_ratio,
                score: result.score,
                elapsed_ms: start.elapsed().as_secs_f64() * 1e3,
            },
        ));

        Ok(result)
    }
}

/// Pick the initialization pair with the given thresholds.
pub fn select_initialization_pair(
    tracks: &TrackMatrix,
    graph: &FramePairGraph,
    params: &InitializationParams,
    observer: &dyn SelectionObserver,
) -> Result<InitializationPair> {
    InitializationSelector::new(params.clone()).select(tracks, graph, observer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::{NoopObserver, RecordingObserver};
    use crate::tracks::PointId;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn f(i: usize) -> FrameIndex {
        FrameIndex::new(i)
    }

    fn params(min_track_count: usize, max_depth_ratio: f64) -> InitializationParams {
        InitializationParams {
            min_track_count,
            max_depth_ratio,
        }
    }

    /// 4 frames, 5 points. Track lengths: P0=3, P1=2, P2=2, P3=1, P4=1.
    /// Scores: (2,0)=7, (3,0)=3, (3,2)=3, everything else 0.
    fn scene() -> (TrackMatrix, FramePairGraph) {
        let tracks = TrackMatrix::from_rows(&[
            vec![true, true, true, false, false],
            vec![false, false, false, true, false],
            vec![true, true, true, false, false],
            vec![true, false, false, false, true],
        ]);

        let mut graph = FramePairGraph::new(4);
        for pair in graph.pairs().collect::<Vec<_>>() {
            graph.set_depth_ratio(pair.newer(), pair.older(), 0.5).unwrap();
        }
        graph.set_depth_ratio(f(1), f(0), 0.9).unwrap();
        graph.set_depth_ratio(f(2), f(0), 0.4).unwrap();
        graph.set_depth_ratio(f(3), f(0), 0.6).unwrap();
        graph.set_depth_ratio(f(3), f(2), 0.7).unwrap();
        (tracks, graph)
    }

    #[test]
    fn test_best_pair_wins() {
        let (tracks, graph) = scene();
        let init = select_initialization_pair(&tracks, &graph, &params(2, 1.0), &NoopObserver).unwrap();

        assert_eq!(init.frames(), (f(2), f(0)));
        assert_eq!(init.depth_ratio, 0.4);
        assert_eq!(init.score, Some(7));
        assert!(init.is_selected());
    }

    #[test]
    fn test_depth_filter_excludes_best_pair() {
        let (tracks, mut graph) = scene();
        graph.set_depth_ratio(f(2), f(0), 5.0).unwrap();

        let init = select_initialization_pair(&tracks, &graph, &params(2, 1.0), &NoopObserver).unwrap();

        // (3,0) and (3,2) tie at 3; (3,2) is scanned later and wins
        assert_eq!(init.frames(), (f(3), f(2)));
        assert_eq!(init.depth_ratio, 0.7);
        assert_eq!(init.score, Some(3));
        assert!(init.is_selected());
    }

    #[test]
    fn test_fallback_when_nothing_clears_threshold() {
        let (tracks, graph) = scene();
        let init = select_initialization_pair(&tracks, &graph, &params(10, 1.0), &NoopObserver).unwrap();

        assert_eq!(init.status, SelectionStatus::Fallback);
        assert_eq!(init.frames(), (f(1), f(0)));
        assert_eq!(init.depth_ratio, 0.9);
        assert_eq!(init.score, None);
    }

    #[test]
    fn test_score_equal_to_threshold_never_wins() {
        let (tracks, graph) = scene();
        // (2,0) scores exactly 7
        let init = select_initialization_pair(&tracks, &graph, &params(7, 1.0), &NoopObserver).unwrap();
        assert_eq!(init.status, SelectionStatus::Fallback);

        let init = select_initialization_pair(&tracks, &graph, &params(6, 1.0), &NoopObserver).unwrap();
        assert_eq!(init.frames(), (f(2), f(0)));
    }

    #[test]
    fn test_nan_depth_is_rejected() {
        let (tracks, mut graph) = scene();
        graph.set_depth_ratio(f(2), f(0), f64::NAN).unwrap();
        let init = select_initialization_pair(&tracks, &graph, &params(2, 1.0), &NoopObserver).unwrap();
        assert_ne!(init.frames(), (f(2), f(0)));
    }

    #[test]
    fn test_insufficient_frames() {
        let tracks = TrackMatrix::new(1, 3);
        let graph = FramePairGraph::new(1);
        let err = select_initialization_pair(&tracks, &graph, &params(0, 1.0), &NoopObserver).unwrap_err();
        assert_eq!(err, SelectionError::InsufficientFrames { found: 1 });
    }

    #[test]
    fn test_graph_shape_mismatch() {
        let (tracks, _) = scene();
        let graph = FramePairGraph::new(3);
        let err = select_initialization_pair(&tracks, &graph, &params(2, 1.0), &NoopObserver).unwrap_err();
        assert!(matches!(err, SelectionError::Shape { expected: 4, found: 3, .. }));
    }

    #[test]
    fn test_diagnostics_reported() {
        let (tracks, mut graph) = scene();
        graph.set_depth_ratio(f(2), f(0), 5.0).unwrap();
        let observer = RecordingObserver::new();

        InitializationSelector::new(params(2, 1.0))
            .select(&tracks, &graph, &observer)
            .unwrap();

        let events = observer.events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            SelectionEvent::InitializationSearched(d) => {
                assert_eq!(d.num_frames, 4);
                assert_eq!(d.pairs_rejected_by_depth, 1);
                assert_eq!(d.pairs_scored, 5);
                assert_eq!(d.candidates, 2);
                assert_eq!(d.score, Some(3));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    /// Straightforward triple loop over the boolean relation.
    fn reference_select(
        tracks: &TrackMatrix,
        graph: &FramePairGraph,
        params: &InitializationParams,
    ) -> Option<(usize, usize)> {
        let n = tracks.num_frames();
        let m = tracks.num_points();
        let visible = |i: usize, p: usize| tracks.is_visible(f(i), PointId::new(p));
        let counts: Vec<usize> = (0..m).map(|p| (0..n).filter(|&i| visible(i, p)).count()).collect();

        let mut best_score = params.min_track_count;
        let mut best = None;
        for i in 0..n {
            for j in 0..i {
                let pair = FramePair::new(f(i), f(j)).unwrap();
                if graph.depth_ratio(pair) > params.max_depth_ratio {
                    continue;
                }
                let score: usize = (0..m)
                    .filter(|&p| visible(i, p) && visible(j, p))
                    .map(|p| counts[p])
                    .sum();
                if score > params.min_track_count && score >= best_score {
                    best_score = score;
                    best = Some((i, j));
                }
            }
        }
        best
    }

    #[test]
    fn test_random_scenes_match_reference() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..50 {
            let n = rng.gen_range(2..9);
            let m = rng.gen_range(1..150);
            let rows: Vec<Vec<bool>> = (0..n)
                .map(|_| (0..m).map(|_| rng.gen_bool(0.3)).collect())
                .collect();
            let tracks = TrackMatrix::from_rows(&rows);

            let mut graph = FramePairGraph::new(n);
            for pair in graph.pairs().collect::<Vec<_>>() {
                let d = rng.gen_range(0.0..2.0);
                graph.set_depth_ratio(pair.newer(), pair.older(), d).unwrap();
            }

            let p = params(rng.gen_range(0..40), 1.0);
            let first = select_initialization_pair(&tracks, &graph, &p, &NoopObserver).unwrap();
            let second = select_initialization_pair(&tracks, &graph, &p, &NoopObserver).unwrap();
            assert_eq!(first, second);

            match reference_select(&tracks, &graph, &p) {
                Some((i, j)) => {
                    assert!(first.is_selected());
                    assert_eq!(first.frames(), (f(i), f(j)));
                    assert!(first.depth_ratio <= p.max_depth_ratio);
                    assert!(first.score.unwrap() > p.min_track_count);
                }
                None => {
                    assert_eq!(first.status, SelectionStatus::Fallback);
                    assert_eq!(first.frames(), (f(1), f(0)));
                }
            }
        }
    }
}
