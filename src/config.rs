//! Configuration for the tracking core and the speed protocol.
//!
//! Every section has defaults, so a YAML file only needs the keys it wants to
//! override:
//!
//! ```yaml
//! tracker:
//!   distance_threshold: 80.0
//!   max_misses: 3
//! speed:
//!   units: metric
//!   travel_distance: 0.02
//!   speed_limit: 50.0
//!   line: { y_left: 180.0, y_right: 220.0, image_width: 640.0 }
//!   slanted_band: true
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::speed::units::UnitSystem;
use crate::types::geometry::ReferenceLine;
use crate::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tracker: TrackerConfig,
    pub speed: SpeedConfig,
    pub stream: StreamConfig,
}

impl Config {
    /// Reads and validates a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config = Self::from_yaml(&contents)?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.tracker.validate()?;
        self.speed.validate()?;
        self.stream.validate()
    }
}

/// Track lifecycle and matching parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Largest prediction-to-detection distance (pixels) accepted as a match
    pub distance_threshold: f64,
    /// A track is destroyed once its consecutive misses exceed this
    pub max_misses: u32,
    /// Trajectory points kept per track
    pub max_trajectory_len: usize,
    pub estimator: EstimatorConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            distance_threshold: 80.0,
            max_misses: 3,
            max_trajectory_len: 2,
            estimator: EstimatorConfig::default(),
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.distance_threshold.is_finite() && self.distance_threshold > 0.0) {
            return Err(invalid(format!(
                "tracker.distance_threshold must be a positive number, got {}",
                self.distance_threshold
            )));
        }
        if self.max_trajectory_len == 0 {
            return Err(invalid("tracker.max_trajectory_len must be at least 1"));
        }
        self.estimator.validate()
    }
}

/// Which motion model drives prediction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionModelKind {
    #[default]
    ConstantVelocity,
    ConstantPosition,
}

/// Per-track Kalman filter parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub motion_model: MotionModelKind,
    /// Prediction step, in frames
    pub dt: f64,
    /// Acceleration (or position diffusion) standard deviation
    pub process_noise: f64,
    /// Detector centroid noise standard deviation, pixels
    pub measurement_noise: f64,
    pub initial_position_variance: f64,
    pub initial_velocity_variance: f64,
    /// Summed x/y variance beyond which a track is considered diverged
    pub max_position_variance: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            motion_model: MotionModelKind::ConstantVelocity,
            dt: 1.0,
            process_noise: 1.0,
            measurement_noise: 1.0,
            initial_position_variance: 3.0,
            initial_velocity_variance: 25.0,
            max_position_variance: 1.0e4,
        }
    }
}

impl EstimatorConfig {
    pub fn validate(&self) -> Result<()> {
        positive("tracker.estimator.dt", self.dt)?;
        non_negative("tracker.estimator.process_noise", self.process_noise)?;
        positive("tracker.estimator.measurement_noise", self.measurement_noise)?;
        positive(
            "tracker.estimator.initial_position_variance",
            self.initial_position_variance,
        )?;
        non_negative(
            "tracker.estimator.initial_velocity_variance",
            self.initial_velocity_variance,
        )?;
        positive(
            "tracker.estimator.max_position_variance",
            self.max_position_variance,
        )?;
        if self.max_position_variance <= 2.0 * self.initial_position_variance {
            return Err(invalid(
                "tracker.estimator.max_position_variance must exceed the initial position variance",
            ));
        }
        Ok(())
    }
}

/// Line-crossing and speed parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedConfig {
    pub line: ReferenceLine,
    /// Half-width of the band around the line, pixels
    pub tolerance: f64,
    /// Road distance covered between track birth and the line, in miles
    /// (imperial) or kilometres (metric)
    pub travel_distance: f64,
    /// Speeds above this, in the configured unit, are flagged
    pub speed_limit: f64,
    pub units: UnitSystem,
    /// Test the band against the slanted line itself. When false the band
    /// sits around the horizontal line through the line's midpoint height.
    pub slanted_band: bool,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            line: ReferenceLine::horizontal(200.0, 640.0),
            tolerance: 5.0,
            travel_distance: 0.01,
            speed_limit: 35.0,
            units: UnitSystem::Imperial,
            slanted_band: false,
        }
    }
}

impl SpeedConfig {
    pub fn validate(&self) -> Result<()> {
        let line = &self.line;
        if !(line.y_left.is_finite() && line.y_right.is_finite()) {
            return Err(invalid("speed.line endpoints must be finite"));
        }
        positive("speed.line.image_width", line.image_width)?;
        non_negative("speed.tolerance", self.tolerance)?;
        positive("speed.travel_distance", self.travel_distance)?;
        positive("speed.speed_limit", self.speed_limit)
    }

    /// Line the crossing band is measured against.
    pub fn band_line(&self) -> ReferenceLine {
        if self.slanted_band {
            self.line
        } else {
            self.line.midline()
        }
    }
}

/// Source pacing. Not used by the tracking math.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub fps: f64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { fps: 30.0 }
    }
}

impl StreamConfig {
    pub fn validate(&self) -> Result<()> {
        positive("stream.fps", self.fps)
    }

    /// Nominal time between frames.
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.fps)
    }
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidConfiguration(msg.into())
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be positive, got {value}")))
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be non-negative, got {value}")))
    }
}
