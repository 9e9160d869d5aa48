//! Simulated speed trap
//!
//! Drives vehicles down a synthetic camera frame, perturbs their centroids
//! with detector noise and dropped detections, and runs the full tracking
//! and speed pipeline on the result.
//!
//! Usage: `speedtrap [config.yaml]`. Log verbosity follows `RUST_LOG`.

use std::time::Duration;

use anyhow::{anyhow, Result};
use rand::distr::Uniform;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use speedtrap::prelude::*;

// ============================================================================
// Simulation Parameters
// ============================================================================

const SEED: u64 = 7;
const NUM_FRAMES: u64 = 600;
const FRAME_HEIGHT: f64 = 480.0;

/// Lane centres, far enough apart that lanes never compete for a detection
const LANES: [f64; 3] = [160.0, 320.0, 480.0];

/// Chance per frame that a new vehicle enters a given lane
const ENTRY_PROB: f64 = 0.02;

/// Vehicle speed range in pixels per frame
const MIN_PIXEL_SPEED: f64 = 3.0;
const MAX_PIXEL_SPEED: f64 = 10.0;

const DETECTION_PROB: f64 = 0.95;
const DETECTION_NOISE_STD: f64 = 1.5;

/// Simulated detector latency subtracted from travel time
const PROCESSING_DELAY: Duration = Duration::from_millis(4);

// ============================================================================
// Ground Truth
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Vehicle {
    x: f64,
    y: f64,
    /// Pixels per frame, downward
    vy: f64,
}

impl Vehicle {
    fn step(&mut self) {
        self.y += self.vy;
    }

    fn in_frame(&self) -> bool {
        self.y <= FRAME_HEIGHT
    }
}

struct Road {
    vehicles: Vec<Vehicle>,
    speed_dist: Uniform<f64>,
    noise: Normal<f64>,
}

impl Road {
    fn new() -> Result<Self> {
        Ok(Self {
            vehicles: Vec::new(),
            speed_dist: Uniform::new(MIN_PIXEL_SPEED, MAX_PIXEL_SPEED)
                .map_err(|e| anyhow!("speed distribution: {e}"))?,
            noise: Normal::new(0.0, DETECTION_NOISE_STD)
                .map_err(|e| anyhow!("noise distribution: {e}"))?,
        })
    }

    fn advance(&mut self, rng: &mut StdRng) {
        for v in &mut self.vehicles {
            v.step();
        }
        self.vehicles.retain(Vehicle::in_frame);

        for &lane in &LANES {
            // Keep a clear gap behind the previous vehicle in the lane
            let lane_clear = self
                .vehicles
                .iter()
                .filter(|v| v.x == lane)
                .all(|v| v.y > 120.0);
            if lane_clear && rng.random::<f64>() < ENTRY_PROB {
                self.vehicles.push(Vehicle {
                    x: lane,
                    y: 0.0,
                    vy: self.speed_dist.sample(rng),
                });
            }
        }
    }

    /// Noisy centroids of the vehicles the detector picked up this frame.
    fn detect(&self, rng: &mut StdRng) -> Vec<Point2> {
        let mut detections = Vec::with_capacity(self.vehicles.len());
        for v in &self.vehicles {
            if rng.random::<f64>() < DETECTION_PROB {
                let dx = self.noise.sample(rng);
                let dy = self.noise.sample(rng);
                detections.push(Point2::new(v.x + dx, v.y + dy));
            }
        }
        detections
    }
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("speedtrap=info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    info!(
        units = %config.speed.units,
        limit = config.speed.speed_limit,
        fps = config.stream.fps,
        "speed trap starting"
    );

    let frame_interval = config.stream.frame_interval();
    let units = config.speed.units;
    let mut trap = SpeedTrap::new(&config)?;
    let mut road = Road::new()?;
    let mut rng = StdRng::seed_from_u64(SEED);

    let mut measured = 0usize;
    let mut speeding = 0usize;
    let mut failures = 0usize;

    for k in 0..NUM_FRAMES {
        road.advance(&mut rng);
        let detections = road.detect(&mut rng);

        let now = frame_interval * k as u32 + PROCESSING_DELAY;
        let report = trap.process_frame(&detections, FrameTiming::new(now, PROCESSING_DELAY))?;

        for event in &report.events {
            match (&event.result, event.speed) {
                (Ok(_), Some(speed)) => {
                    measured += 1;
                    if event.is_flagged() {
                        speeding += 1;
                        warn!(frame = k, track = %event.id, %speed, "snapshot");
                    }
                }
                (Ok(_), None) => {}
                (Err(err), _) => {
                    failures += 1;
                    warn!(frame = k, track = %event.id, error = %err, "no speed");
                }
            }
        }
    }

    info!(
        frames = trap.frames(),
        measured,
        speeding,
        failures,
        live_tracks = trap.manager().len(),
        units = units.label(),
        "simulation complete"
    );

    Ok(())
}
