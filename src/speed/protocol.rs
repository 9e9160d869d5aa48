//! Speed measurement protocol
//!
//! A track starts in [`SpeedStatus::Tracking`]. The first frame its latest
//! trajectory point lies inside the band around the reference line it moves to
//! [`SpeedStatus::Crossed`], and its speed is computed from the time since the
//! track was created. Speeds above the limit move it on to
//! [`SpeedStatus::Flagged`]. Both transitions happen at most once per track.

use std::time::Duration;

use tracing::{info, warn};

use crate::config::SpeedConfig;
use crate::tracker::{SpeedStatus, Track, TrackId};
use crate::types::geometry::Point2;
use crate::{Error, Result};

use super::units::Speed;

/// Timing of the frame being evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameTiming {
    /// Stream timestamp of the frame
    pub now: Duration,
    /// Time the pipeline spent on the frame before evaluation; excluded from
    /// travel time
    pub processing_delay: Duration,
}

impl FrameTiming {
    pub fn new(now: Duration, processing_delay: Duration) -> Self {
        Self {
            now,
            processing_delay,
        }
    }

    /// Timing with no processing delay.
    pub fn at(now: Duration) -> Self {
        Self::new(now, Duration::ZERO)
    }
}

/// Result of evaluating one track.
#[derive(Debug)]
pub struct SpeedOutcome {
    pub id: TrackId,
    /// Latest trajectory point, for placing an overlay or snapshot
    pub position: Option<Point2>,
    /// True only in the frame the track crossed the line
    pub newly_crossed: bool,
    pub speed: Option<Speed>,
    pub result: Result<SpeedStatus>,
}

impl SpeedOutcome {
    pub fn is_flagged(&self) -> bool {
        matches!(self.result, Ok(SpeedStatus::Flagged))
    }
}

/// Line-crossing state machine shared by all tracks.
#[derive(Debug, Clone)]
pub struct SpeedProtocol {
    config: SpeedConfig,
}

impl SpeedProtocol {
    /// # Errors
    /// [`Error::InvalidConfiguration`] if `config` does not validate.
    pub fn new(config: SpeedConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SpeedConfig {
        &self.config
    }

    /// Advances one track's protocol state for this frame.
    ///
    /// Tracks that already crossed keep their status and speed.
    ///
    /// # Errors
    /// [`Error::SpeedComputation`] if the latest trajectory point is unusable
    /// or the adjusted travel time is not positive. The track is left as it
    /// was, so `crossed_line` implies a speed.
    pub fn evaluate(&self, track: &mut Track, timing: FrameTiming) -> Result<SpeedStatus> {
        if track.crossed_line {
            return Ok(track.status());
        }

        let id = track.id();
        let latest = match track.trajectory().latest() {
            Some(p) if p.is_finite() => *p,
            Some(_) => return Err(speed_error(id, "latest trajectory point is not finite")),
            None => return Err(speed_error(id, "trajectory is empty")),
        };

        if !self
            .config
            .band_line()
            .within_band(&latest, self.config.tolerance)
        {
            return Ok(SpeedStatus::Tracking);
        }

        let travel_time = timing
            .now
            .checked_sub(track.created_at())
            .and_then(|since_birth| since_birth.checked_sub(timing.processing_delay))
            .unwrap_or(Duration::ZERO);
        let speed = self
            .config
            .units
            .speed(self.config.travel_distance, travel_time)
            .ok_or_else(|| {
                speed_error(
                    id,
                    format!(
                        "travel time is not positive (now {:?}, created {:?}, delay {:?})",
                        timing.now,
                        track.created_at(),
                        timing.processing_delay
                    ),
                )
            })?;

        track.crossed_line = true;
        track.speed = Some(speed);
        info!(track = %id, %speed, x = latest.x, y = latest.y, "line crossed");

        if speed.exceeds(self.config.speed_limit) {
            track.flagged = true;
            warn!(
                track = %id,
                %speed,
                limit = self.config.speed_limit,
                "speeding"
            );
        }

        Ok(track.status())
    }

    /// Evaluates every track. A failure on one track does not affect the
    /// others.
    pub fn evaluate_all<'a, I>(&self, tracks: I, timing: FrameTiming) -> Vec<SpeedOutcome>
    where
        I: IntoIterator<Item = &'a mut Track>,
    {
        tracks
            .into_iter()
            .map(|track| {
                let was_crossed = track.crossed_line();
                let result = self.evaluate(track, timing);
                if let Err(err) = &result {
                    warn!(track = %track.id(), error = %err, "speed evaluation failed");
                }
                SpeedOutcome {
                    id: track.id(),
                    position: track.trajectory().latest().copied(),
                    newly_crossed: !was_crossed && track.crossed_line(),
                    speed: track.speed(),
                    result,
                }
            })
            .collect()
    }
}

fn speed_error(id: TrackId, reason: impl Into<String>) -> Error {
    Error::SpeedComputation {
        id: id.get(),
        reason: reason.into(),
    }
}
