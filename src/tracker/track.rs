//! A single tracked vehicle and its bounded trajectory.

use core::fmt;
use std::collections::VecDeque;
use std::time::Duration;

use crate::config::EstimatorConfig;
use crate::filters::StateEstimator;
use crate::speed::units::Speed;
use crate::types::geometry::Point2;

// ============================================================================
// Track identity
// ============================================================================

/// Process-unique track identifier. Assigned in increasing order, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackId(pub u64);

impl TrackId {
    pub const FIRST: TrackId = TrackId(1);

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }

    #[inline]
    pub(crate) fn next(self) -> TrackId {
        TrackId(self.0 + 1)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Trajectory
// ============================================================================

/// Oldest-first ring of corrected positions.
///
/// Holds at least one point and at most `capacity`; pushing past capacity
/// evicts the oldest point.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    points: VecDeque<Point2>,
    capacity: usize,
}

impl Trajectory {
    /// Starts a trajectory at `first`. A zero `capacity` is treated as one.
    pub fn new(first: Point2, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut points = VecDeque::with_capacity(capacity);
        points.push_back(first);
        Self { points, capacity }
    }

    pub fn push(&mut self, point: Point2) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    /// Most recent point.
    pub fn latest(&self) -> Option<&Point2> {
        self.points.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point2> + '_ {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

// ============================================================================
// Track
// ============================================================================

/// Where a track stands in the speed measurement protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpeedStatus {
    /// Not yet inside the reference band
    Tracking,
    /// Crossed the line, speed within the limit (or not computable)
    Crossed,
    /// Crossed the line above the speed limit
    Flagged,
}

/// One tracked vehicle.
#[derive(Debug, Clone)]
pub struct Track {
    id: TrackId,
    estimator: StateEstimator,
    trajectory: Trajectory,
    consecutive_misses: u32,
    hits: u32,
    age: u32,
    created_at: Duration,
    pub(crate) crossed_line: bool,
    pub(crate) speed: Option<Speed>,
    pub(crate) flagged: bool,
}

impl Track {
    /// Creates a track seeded from an unmatched detection.
    pub fn new(
        id: TrackId,
        detection: Point2,
        created_at: Duration,
        max_trajectory_len: usize,
        estimator: &EstimatorConfig,
    ) -> Self {
        Self {
            id,
            estimator: StateEstimator::new(detection, estimator),
            trajectory: Trajectory::new(detection, max_trajectory_len),
            consecutive_misses: 0,
            hits: 1,
            age: 1,
            created_at,
            crossed_line: false,
            speed: None,
            flagged: false,
        }
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    /// Current position estimate.
    pub fn position(&self) -> Point2 {
        self.estimator.position()
    }

    pub fn estimator(&self) -> &StateEstimator {
        &self.estimator
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn consecutive_misses(&self) -> u32 {
        self.consecutive_misses
    }

    /// Frames in which the track was matched, counting its creation.
    pub fn hits(&self) -> u32 {
        self.hits
    }

    /// Frames the track has lived, counting its creation.
    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn created_at(&self) -> Duration {
        self.created_at
    }

    pub fn crossed_line(&self) -> bool {
        self.crossed_line
    }

    pub fn speed(&self) -> Option<Speed> {
        self.speed
    }

    pub fn flagged(&self) -> bool {
        self.flagged
    }

    pub fn status(&self) -> SpeedStatus {
        match (self.crossed_line, self.flagged) {
            (false, _) => SpeedStatus::Tracking,
            (true, false) => SpeedStatus::Crossed,
            (true, true) => SpeedStatus::Flagged,
        }
    }

    pub(crate) fn predict(&mut self) -> Point2 {
        self.age += 1;
        self.estimator.predict()
    }

    /// Fuses a matched detection and records the corrected position.
    pub(crate) fn record_hit(&mut self, detection: Point2) -> crate::Result<Point2> {
        let corrected = self.estimator.correct(detection)?;
        self.trajectory.push(corrected);
        self.consecutive_misses = 0;
        self.hits += 1;
        Ok(corrected)
    }

    pub(crate) fn record_miss(&mut self) {
        self.consecutive_misses += 1;
    }
}
