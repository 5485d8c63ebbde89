//! Next-view search.
//!
//! Among the frames still marked as to-process, pick the one observing the
//! most already-reconstructed points. The best frame is kept with a strict
//! `>` starting from zero, so among equal counts the lowest frame index wins
//! and a frame seeing no reconstructed point is never picked.

use std::borrow::Cow;
use std::time::Instant;

use crate::config::NextViewParams;
use crate::error::{Result, SelectionError};
use crate::observe::{NextViewDiagnostics, SelectionEvent, SelectionObserver};
use crate::tracks::{FrameIndex, PointId, TrackMatrix};

use super::result::NextView;

/// Chooses the next frame to register.
#[derive(Debug, Clone, Default)]
pub struct NextViewSelector {
    params: NextViewParams,
}

impl NextViewSelector {
    pub fn new(params: NextViewParams) -> Self {
        Self { params }
    }

    /// Run the search.
    ///
    /// # Arguments
    /// * `tracks` - Visibility relation
    /// * `frames_to_process` - One flag per frame; `true` marks a candidate
    /// * `registered_points` - Ids of already reconstructed points, duplicates allowed
    ///
    /// Fails if `frames_to_process` does not have one entry per frame or a
    /// registered id lies outside the matrix.
    pub fn select(
        &self,
        tracks: &TrackMatrix,
        frames_to_process: &[bool],
        registered_points: &[PointId],
        observer: &dyn SelectionObserver,
    ) -> Result<NextView> {
        let start = Instant::now();

        if frames_to_process.len() != tracks.num_frames() {
            return Err(SelectionError::Shape {
                what: "frames to process",
                expected: tracks.num_frames(),
                found: frames_to_process.len(),
            });
        }
        for &point in registered_points {
            tracks.check_point(point)?;
        }

        let points: Cow<'_, [PointId]> = if self.params.count_duplicate_points {
            Cow::Borrowed(registered_points)
        } else {
            let mut unique = registered_points.to_vec();
            unique.sort_unstable();
            unique.dedup();
            Cow::Owned(unique)
        };

        let mut best_count = 0;
        let mut best_frame = None;
        let mut frames_considered = 0;

        for (index, _) in frames_to_process.iter().enumerate().filter(|&(_, &pending)| pending) {
            frames_considered += 1;
            let frame = FrameIndex::new(index);
            let count = points
                .iter()
                .filter(|&&point| tracks.is_visible(frame, point))
                .count();

            if count > best_count {
                best_count = count;
                best_frame = Some(frame);
            }
        }

        let result = match best_frame {
            Some(frame) => NextView::Found {
                frame,
                match_count: best_count,
            },
            None => NextView::NoCandidate,
        };

        observer.on_event(&SelectionEvent::NextViewSearched(NextViewDiagnostics {
            frames_considered,
            registered_points: points.len(),
            duplicates_removed: registered_points.len() - points.len(),
            frame: result.frame(),
            match_count: result.match_count(),
            elapsed_ms: start.elapsed().as_secs_f64() * 1e3,
        }));

        Ok(result)
    }
}

/// Pick the next frame to register.
pub fn select_next_frame(
    tracks: &TrackMatrix,
    frames_to_process: &[bool],
    registered_points: &[PointId],
    params: &NextViewParams,
    observer: &dyn SelectionObserver,
) -> Result<NextView> {
    NextViewSelector::new(params.clone()).select(tracks, frames_to_process, registered_points, observer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::{NoopObserver, RecordingObserver};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn f(i: usize) -> FrameIndex {
        FrameIndex::new(i)
    }

    fn p(i: usize) -> PointId {
        PointId::new(i)
    }

    /// 5 frames seeing [0, 3, 3, 1, 0] of the registered points P0..P3.
    fn scene() -> TrackMatrix {
        TrackMatrix::from_observations(
            5,
            6,
            [
                (f(0), p(4)),
                (f(0), p(5)),
                (f(1), p(0)),
                (f(1), p(1)),
                (f(1), p(2)),
                (f(2), p(1)),
                (f(2), p(2)),
                (f(2), p(3)),
                (f(3), p(3)),
                (f(4), p(5)),
            ],
        )
        .unwrap()
    }

    fn registered() -> Vec<PointId> {
        vec![p(0), p(1), p(2), p(3)]
    }

    #[test]
    fn test_tie_goes_to_lowest_index() {
        let tracks = scene();
        let result = select_next_frame(
            &tracks,
            &[true; 5],
            &registered(),
            &NextViewParams::default(),
            &NoopObserver,
        )
        .unwrap();

        assert_eq!(
            result,
            NextView::Found {
                frame: f(1),
                match_count: 3
            }
        );
    }

    #[test]
    fn test_only_pending_frames_are_considered() {
        let tracks = scene();
        let pending = [true, false, true, true, true];
        let result = select_next_frame(&tracks, &pending, &registered(), &NextViewParams::default(), &NoopObserver)
            .unwrap();
        assert_eq!(result.frame(), Some(f(2)));

        let pending = [true, false, false, true, true];
        let result = select_next_frame(&tracks, &pending, &registered(), &NextViewParams::default(), &NoopObserver)
            .unwrap();
        assert_eq!(result.frame(), Some(f(3)));
        assert_eq!(result.match_count(), 1);
    }

    #[test]
    fn test_empty_registered_set_has_no_candidate() {
        let tracks = scene();
        let result = select_next_frame(&tracks, &[true; 5], &[], &NextViewParams::default(), &NoopObserver)
            .unwrap();
        assert_eq!(result, NextView::NoCandidate);
        assert_eq!(result.match_count(), 0);
    }

    #[test]
    fn test_no_pending_frames() {
        let tracks = scene();
        let result = select_next_frame(&tracks, &[false; 5], &registered(), &NextViewParams::default(), &NoopObserver)
            .unwrap();
        assert_eq!(result, NextView::NoCandidate);
    }

    #[test]
    fn test_duplicates_do_not_inflate_by_default() {
        let tracks = scene();
        // P3 repeated: frame 3 would reach 3 and frame 2 would reach 5 if duplicates counted
        let points = vec![p(0), p(1), p(3), p(3), p(3), p(2)];

        let result = select_next_frame(&tracks, &[true; 5], &points, &NextViewParams::default(), &NoopObserver)
            .unwrap();
        assert_eq!(result.frame(), Some(f(1)));
        assert_eq!(result.match_count(), 3);

        let counting = NextViewParams {
            count_duplicate_points: true,
        };
        let result = select_next_frame(&tracks, &[true; 5], &points, &counting, &NoopObserver).unwrap();
        assert_eq!(result.frame(), Some(f(2)));
        assert_eq!(result.match_count(), 5);
    }

    #[test]
    fn test_shape_errors() {
        let tracks = scene();
        let err = select_next_frame(&tracks, &[true; 4], &registered(), &NextViewParams::default(), &NoopObserver)
            .unwrap_err();
        assert_eq!(
            err,
            SelectionError::Shape {
                what: "frames to process",
                expected: 5,
                found: 4
            }
        );

        let err = select_next_frame(&tracks, &[true; 5], &[p(6)], &NextViewParams::default(), &NoopObserver)
            .unwrap_err();
        assert_eq!(
            err,
            SelectionError::PointOutOfRange {
                point: p(6),
                num_points: 6
            }
        );
    }

    #[test]
    fn test_diagnostics_reported() {
        let tracks = scene();
        let observer = RecordingObserver::new();
        let points = vec![p(0), p(0), p(1)];

        NextViewSelector::default()
            .select(&tracks, &[true, true, false, true, true], &points, &observer)
            .unwrap();

        match &observer.events()[..] {
            [SelectionEvent::NextViewSearched(d)] => {
                assert_eq!(d.frames_considered, 4);
                assert_eq!(d.registered_points, 2);
                assert_eq!(d.duplicates_removed, 1);
                assert_eq!(d.frame, Some(f(1)));
                assert_eq!(d.match_count, 2);
            }
            other => panic!("unexpected events {:?}", other),
        }
    }

    #[test]
    fn test_random_selection_is_deterministic_and_maximal() {
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let n = rng.gen_range(1..10);
            let m = rng.gen_range(1..100);
            let rows: Vec<Vec<bool>> = (0..n)
                .map(|_| (0..m).map(|_| rng.gen_bool(0.25)).collect())
                .collect();
            let tracks = TrackMatrix::from_rows(&rows);
            let pending: Vec<bool> = (0..n).map(|_| rng.gen_bool(0.7)).collect();
            let points: Vec<PointId> = (0..rng.gen_range(0..40)).map(|_| p(rng.gen_range(0..m))).collect();

            let params = NextViewParams::default();
            let first = select_next_frame(&tracks, &pending, &points, &params, &NoopObserver).unwrap();
            let second = select_next_frame(&tracks, &pending, &points, &params, &NoopObserver).unwrap();
            assert_eq!(first, second);

            let mut unique = points.clone();
            unique.sort();
            unique.dedup();
            let counts: Vec<usize> = (0..n)
                .map(|i| unique.iter().filter(|&&pt| rows[i][pt.index()]).count())
                .collect();
            let best = (0..n).filter(|&i| pending[i]).map(|i| counts[i]).max().unwrap_or(0);

            match first {
                NextView::Found { frame, match_count } => {
                    assert!(match_count > 0);
                    assert_eq!(match_count, best);
                    assert!(pending[frame.index()]);
                    // earliest frame reaching the maximum
                    let earliest = (0..n).find(|&i| pending[i] && counts[i] == best).unwrap();
                    assert_eq!(frame.index(), earliest);
                }
                NextView::NoCandidate => assert_eq!(best, 0),
            }
        }
    }
}
