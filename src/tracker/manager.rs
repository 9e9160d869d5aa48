//! Track lifecycle management
//!
//! [`TrackManager::update`] runs one frame of the tracking loop:
//!
//! 1. predict every live track one step ahead
//! 2. match predictions to detections with the gated Hungarian solver
//! 3. correct matched tracks and extend their trajectories
//! 4. age unmatched tracks
//! 5. retire stale, diverged or failed tracks
//! 6. start a new track for every unmatched detection
//!
//! Retirement always happens before creation, and ids are never reused.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{debug, trace, warn};

use super::track::{Track, TrackId};
use crate::assignment::AssignmentSolver;
use crate::config::TrackerConfig;
use crate::types::geometry::Point2;
use crate::{Error, Result};

/// Why a track was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetireReason {
    /// Missed more consecutive frames than allowed
    Stale,
    /// Position uncertainty grew past the configured bound
    Diverged,
    /// The filter could not fuse its matched detection
    CorrectionFailed,
    /// Reached the line but no speed could be computed for it
    SpeedFailed,
}

/// What one call to [`TrackManager::update`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSummary {
    /// Tracks paired with a detection this frame
    pub matched: usize,
    /// Tracks left without a detection this frame
    pub unmatched: usize,
    pub created: Vec<TrackId>,
    pub destroyed: Vec<(TrackId, RetireReason)>,
}

/// Owns the live track set.
#[derive(Debug, Clone)]
pub struct TrackManager {
    config: TrackerConfig,
    solver: AssignmentSolver,
    tracks: BTreeMap<TrackId, Track>,
    next_id: TrackId,
}

impl TrackManager {
    /// Creates an empty manager.
    ///
    /// # Errors
    /// [`Error::InvalidConfiguration`] if `config` does not validate.
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            solver: AssignmentSolver::new(config.distance_threshold),
            config,
            tracks: BTreeMap::new(),
            next_id: TrackId::FIRST,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Runs one frame. `now` is the stream timestamp of the frame.
    ///
    /// # Errors
    /// [`Error::AssignmentFailed`] if a detection is not finite. The track
    /// set is left untouched in that case.
    pub fn update(&mut self, detections: &[Point2], now: Duration) -> Result<UpdateSummary> {
        if detections.iter().any(|d| !d.is_finite()) {
            return Err(Error::AssignmentFailed);
        }

        // Predict in id order so assignment ties favour the oldest track
        let ids: Vec<TrackId> = self.tracks.keys().copied().collect();
        let predictions: Vec<Point2> = self.tracks.values_mut().map(Track::predict).collect();

        let matching = self.solver.solve(&predictions, detections)?;

        let mut summary = UpdateSummary {
            matched: matching.pairs.len(),
            unmatched: matching.unassigned_tracks.len(),
            ..UpdateSummary::default()
        };
        let mut failed = Vec::new();

        for &(t, d) in &matching.pairs {
            let id = ids[t];
            if let Some(track) = self.tracks.get_mut(&id) {
                if let Err(err) = track.record_hit(detections[d]) {
                    warn!(track = %id, error = %err, "correction failed");
                    failed.push(id);
                }
            }
        }
        for &t in &matching.unassigned_tracks {
            if let Some(track) = self.tracks.get_mut(&ids[t]) {
                track.record_miss();
            }
        }

        self.retire_invalid(&failed, &mut summary);

        for &d in &matching.unassigned_detections {
            let id = self.spawn(detections[d], now);
            summary.created.push(id);
        }

        trace!(
            live = self.tracks.len(),
            matched = summary.matched,
            created = summary.created.len(),
            destroyed = summary.destroyed.len(),
            "frame updated"
        );

        Ok(summary)
    }

    fn retire_invalid(&mut self, failed: &[TrackId], summary: &mut UpdateSummary) {
        let max_misses = self.config.max_misses;
        let max_variance = self.config.estimator.max_position_variance;

        for (&id, track) in &self.tracks {
            let reason = if failed.contains(&id) {
                RetireReason::CorrectionFailed
            } else if track.consecutive_misses() > max_misses {
                RetireReason::Stale
            } else if track.estimator().is_diverged(max_variance) {
                let err = Error::EstimatorDivergence {
                    id: id.get(),
                    uncertainty: track.estimator().position_uncertainty(),
                };
                warn!(track = %id, "{err}");
                RetireReason::Diverged
            } else {
                continue;
            };
            summary.destroyed.push((id, reason));
        }

        for (id, reason) in &summary.destroyed {
            self.tracks.remove(id);
            debug!(track = %id, ?reason, "track destroyed");
        }
    }

    fn spawn(&mut self, detection: Point2, now: Duration) -> TrackId {
        let id = self.next_id;
        self.next_id = id.next();

        let track = Track::new(
            id,
            detection,
            now,
            self.config.max_trajectory_len,
            &self.config.estimator,
        );
        self.tracks.insert(id, track);
        debug!(track = %id, x = detection.x, y = detection.y, "track created");
        id
    }

    /// Live tracks in ascending id order.
    pub fn tracks(&self) -> impl Iterator<Item = &Track> + '_ {
        self.tracks.values()
    }

    pub fn tracks_mut(&mut self) -> impl Iterator<Item = &mut Track> + '_ {
        self.tracks.values_mut()
    }

    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    pub fn get_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        self.tracks.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Id the next created track will receive.
    pub fn next_id(&self) -> TrackId {
        self.next_id
    }

    /// Drops a track for `reason`, outside the per-frame lifecycle.
    pub fn retire(&mut self, id: TrackId, reason: RetireReason) -> Option<Track> {
        let track = self.tracks.remove(&id)?;
        debug!(track = %id, ?reason, "track destroyed");
        Some(track)
    }

    /// Drops a track. Its id is not handed out again.
    pub fn remove(&mut self, id: TrackId) -> Option<Track> {
        self.tracks.remove(&id)
    }

    /// Drops every track. Id assignment continues where it left off.
    pub fn clear(&mut self) {
        self.tracks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(threshold: f64, max_misses: u32) -> TrackManager {
        TrackManager::new(TrackerConfig {
            distance_threshold: threshold,
            max_misses,
            max_trajectory_len: 4,
            ..TrackerConfig::default()
        })
        .unwrap()
    }

    fn frame(k: u64) -> Duration {
        Duration::from_millis(33 * k)
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = TrackerConfig {
            distance_threshold: 0.0,
            ..TrackerConfig::default()
        };
        assert!(matches!(
            TrackManager::new(config),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_detections_spawn_tracks() {
        let mut mgr = manager(5.0, 3);
        let summary = mgr
            .update(&[Point2::new(0.0, 0.0), Point2::new(50.0, 50.0)], frame(0))
            .unwrap();

        assert_eq!(summary.created, vec![TrackId(1), TrackId(2)]);
        assert_eq!(summary.matched, 0);
        assert_eq!(mgr.len(), 2);
        assert_eq!(mgr.next_id(), TrackId(3));
        assert_eq!(mgr.get(TrackId(2)).unwrap().created_at(), frame(0));
    }

    #[test]
    fn test_matched_track_follows_detection() {
        let mut mgr = manager(5.0, 3);
        mgr.update(&[Point2::new(10.0, 10.0)], frame(0)).unwrap();
        let summary = mgr.update(&[Point2::new(12.0, 10.0)], frame(1)).unwrap();

        assert_eq!(summary.matched, 1);
        assert!(summary.created.is_empty());

        let track = mgr.get(TrackId(1)).unwrap();
        assert_eq!(track.trajectory().len(), 2);
        assert!(track.position().x > 10.0 && track.position().x <= 12.0);
        assert_eq!(track.consecutive_misses(), 0);
    }

    #[test]
    fn test_far_detection_starts_new_track() {
        let mut mgr = manager(5.0, 3);
        mgr.update(&[Point2::new(10.0, 10.0)], frame(0)).unwrap();
        let summary = mgr.update(&[Point2::new(100.0, 10.0)], frame(1)).unwrap();

        assert_eq!(summary.unmatched, 1);
        assert_eq!(summary.created, vec![TrackId(2)]);
        assert_eq!(mgr.get(TrackId(1)).unwrap().consecutive_misses(), 1);
    }

    #[test]
    fn test_stale_track_removed() {
        let mut mgr = manager(5.0, 1);
        mgr.update(&[Point2::new(10.0, 10.0)], frame(0)).unwrap();

        let first = mgr.update(&[], frame(1)).unwrap();
        assert!(first.destroyed.is_empty());
        assert_eq!(mgr.len(), 1);

        let second = mgr.update(&[], frame(2)).unwrap();
        assert_eq!(second.destroyed, vec![(TrackId(1), RetireReason::Stale)]);
        assert!(mgr.is_empty());
    }

    #[test]
    fn test_diverged_track_removed() {
        let config = TrackerConfig {
            max_misses: 100,
            estimator: crate::config::EstimatorConfig {
                max_position_variance: 50.0,
                ..Default::default()
            },
            ..TrackerConfig::default()
        };
        let mut mgr = TrackManager::new(config).unwrap();
        mgr.update(&[Point2::new(0.0, 0.0)], frame(0)).unwrap();

        // Initial velocity variance 25 pushes position variance past 50 on
        // the first unmatched prediction
        let summary = mgr.update(&[], frame(1)).unwrap();
        assert_eq!(summary.destroyed, vec![(TrackId(1), RetireReason::Diverged)]);
    }

    #[test]
    fn test_non_finite_detection_leaves_tracks_untouched() {
        let mut mgr = manager(5.0, 3);
        mgr.update(&[Point2::new(0.0, 0.0)], frame(0)).unwrap();

        let err = mgr
            .update(&[Point2::new(f64::NAN, 0.0)], frame(1))
            .unwrap_err();
        assert!(matches!(err, Error::AssignmentFailed));
        assert_eq!(mgr.get(TrackId(1)).unwrap().age(), 1);
    }

    #[test]
    fn test_ids_not_reused_after_remove_and_clear() {
        let mut mgr = manager(5.0, 3);
        mgr.update(&[Point2::new(0.0, 0.0)], frame(0)).unwrap();
        assert!(mgr.remove(TrackId(1)).is_some());

        mgr.update(&[Point2::new(0.0, 0.0)], frame(1)).unwrap();
        assert!(mgr.get(TrackId(2)).is_some());

        mgr.clear();
        let summary = mgr.update(&[Point2::new(0.0, 0.0)], frame(2)).unwrap();
        assert_eq!(summary.created, vec![TrackId(3)]);
    }

    #[test]
    fn test_retire_drops_track_once() {
        let mut mgr = manager(5.0, 3);
        mgr.update(&[Point2::new(0.0, 0.0), Point2::new(50.0, 0.0)], frame(0))
            .unwrap();

        let retired = mgr.retire(TrackId(1), RetireReason::SpeedFailed);
        assert_eq!(retired.map(|t| t.id()), Some(TrackId(1)));
        assert!(mgr.retire(TrackId(1), RetireReason::SpeedFailed).is_none());
        assert_eq!(mgr.len(), 1);
        assert_eq!(mgr.next_id(), TrackId(3));
    }

    #[test]
    fn test_tracks_iterate_in_id_order() {
        let mut mgr = manager(5.0, 3);
        mgr.update(
            &[
                Point2::new(300.0, 0.0),
                Point2::new(100.0, 0.0),
                Point2::new(200.0, 0.0),
            ],
            frame(0),
        )
        .unwrap();

        let ids: Vec<u64> = mgr.tracks().map(|t| t.id().get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
