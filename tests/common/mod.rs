//! Common test helpers for tracking and speed integration tests

#![allow(dead_code)]

use std::time::Duration;

use speedtrap::prelude::*;

/// Frame period used by the synthetic sequences (10 fps)
pub const FRAME_PERIOD: Duration = Duration::from_millis(100);

/// Stream timestamp of frame `k`
pub fn frame_time(k: usize) -> Duration {
    FRAME_PERIOD * k as u32
}

pub fn pt(x: f64, y: f64) -> Point2 {
    Point2::new(x, y)
}

/// Tracker configuration with the given gate and miss ceiling
pub fn tracker_config(distance_threshold: f64, max_misses: u32) -> TrackerConfig {
    TrackerConfig {
        distance_threshold,
        max_misses,
        max_trajectory_len: 5,
        ..TrackerConfig::default()
    }
}

pub fn make_manager(distance_threshold: f64, max_misses: u32) -> TrackManager {
    TrackManager::new(tracker_config(distance_threshold, max_misses)).unwrap()
}

/// Imperial protocol with a horizontal line at `line_y` across a 640 px frame
pub fn speed_config(line_y: f64, tolerance: f64, travel_miles: f64, limit_mph: f64) -> SpeedConfig {
    SpeedConfig {
        line: ReferenceLine::horizontal(line_y, 640.0),
        tolerance,
        travel_distance: travel_miles,
        speed_limit: limit_mph,
        units: UnitSystem::Imperial,
        slanted_band: false,
    }
}

/// Feeds a sequence of detection lists, one per frame, and collects the
/// per-frame summaries.
pub fn run_frames(manager: &mut TrackManager, frames: &[Vec<Point2>]) -> Vec<UpdateSummary> {
    frames
        .iter()
        .enumerate()
        .map(|(k, detections)| manager.update(detections, frame_time(k)).unwrap())
        .collect()
}

/// Straight-line detections starting at `start` and moving `step` per frame
pub fn straight_path(start: Point2, step: Point2, frames: usize) -> Vec<Point2> {
    (0..frames)
        .map(|k| pt(start.x + step.x * k as f64, start.y + step.y * k as f64))
        .collect()
}

/// Expected speed for `miles` covered in `elapsed`, in MPH
pub fn mph(miles: f64, elapsed: Duration) -> f64 {
    miles / (elapsed.as_secs_f64() / 3600.0)
}
