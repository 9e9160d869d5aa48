//! Frame loop glue
//!
//! [`SpeedTrap`] runs the tracker and the speed protocol for each frame of
//! detections. [`FrameClock`] supplies stream timestamps and the per-frame
//! processing delay for live sources; recorded sources can build
//! [`FrameTiming`] values directly.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::Config;
use crate::speed::{FrameTiming, SpeedOutcome, SpeedProtocol};
use crate::tracker::{RetireReason, TrackManager, UpdateSummary};
use crate::types::geometry::Point2;
use crate::Result;

/// Monotonic stream clock.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    origin: Instant,
    frame_start: Instant,
}

impl FrameClock {
    pub fn start() -> Self {
        let now = Instant::now();
        Self {
            origin: now,
            frame_start: now,
        }
    }

    /// Marks a frame as acquired and returns its stream timestamp.
    pub fn begin_frame(&mut self) -> Duration {
        self.frame_start = Instant::now();
        self.frame_start.duration_since(self.origin)
    }

    /// Time since the clock started.
    pub fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    /// Time since the current frame was acquired.
    pub fn processing_delay(&self) -> Duration {
        self.frame_start.elapsed()
    }

    /// Timing for evaluating the current frame.
    pub fn timing(&self) -> FrameTiming {
        FrameTiming::new(self.now(), self.processing_delay())
    }
}

/// Everything that happened in one frame.
#[derive(Debug)]
pub struct FrameReport {
    pub frame: u64,
    pub update: UpdateSummary,
    /// Tracks that crossed the line this frame, and tracks whose evaluation
    /// failed
    pub events: Vec<SpeedOutcome>,
}

impl FrameReport {
    pub fn flagged(&self) -> impl Iterator<Item = &SpeedOutcome> + '_ {
        self.events.iter().filter(|o| o.is_flagged())
    }
}

/// Tracker plus speed protocol, driven one frame at a time.
#[derive(Debug, Clone)]
pub struct SpeedTrap {
    manager: TrackManager,
    protocol: SpeedProtocol,
    frames: u64,
}

impl SpeedTrap {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            manager: TrackManager::new(config.tracker.clone())?,
            protocol: SpeedProtocol::new(config.speed.clone())?,
            frames: 0,
        })
    }

    /// Updates the tracks with this frame's detections, then evaluates the
    /// speed protocol for every live track.
    ///
    /// Speed failures are reported per track in the returned events and do
    /// not fail the frame. A track whose speed could not be computed is
    /// retired with [`RetireReason::SpeedFailed`].
    pub fn process_frame(
        &mut self,
        detections: &[Point2],
        timing: FrameTiming,
    ) -> Result<FrameReport> {
        let mut update = self.manager.update(detections, timing.now)?;
        let events: Vec<SpeedOutcome> = self
            .protocol
            .evaluate_all(self.manager.tracks_mut(), timing)
            .into_iter()
            .filter(|o| o.newly_crossed || o.result.is_err())
            .collect();

        for event in events.iter().filter(|o| o.result.is_err()) {
            if self
                .manager
                .retire(event.id, RetireReason::SpeedFailed)
                .is_some()
            {
                update.destroyed.push((event.id, RetireReason::SpeedFailed));
            }
        }

        let frame = self.frames;
        self.frames += 1;
        debug!(frame, live = self.manager.len(), "frame processed");

        Ok(FrameReport {
            frame,
            update,
            events,
        })
    }

    pub fn manager(&self) -> &TrackManager {
        &self.manager
    }

    pub fn protocol(&self) -> &SpeedProtocol {
        &self.protocol
    }

    /// Frames processed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}
