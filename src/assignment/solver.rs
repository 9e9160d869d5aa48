//! Detection-to-track correspondence
//!
//! Matches this frame's detections against the tracks' predicted positions
//! by minimum total Euclidean distance, refusing any pair farther apart than
//! the distance threshold.

use tracing::trace;

use super::hungarian::{hungarian_gated, CostMatrix};
use crate::types::geometry::Point2;
use crate::{Error, Result};

/// Outcome of one frame's assignment.
///
/// Indices refer to the `predictions` and `detections` slices passed to
/// [`AssignmentSolver::solve`]. All three lists are sorted ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Matching {
    /// `(prediction index, detection index)` pairs
    pub pairs: Vec<(usize, usize)>,
    pub unassigned_tracks: Vec<usize>,
    pub unassigned_detections: Vec<usize>,
}

impl Matching {
    /// Sum of the matched pair distances.
    pub fn total_distance(&self, predictions: &[Point2], detections: &[Point2]) -> f64 {
        self.pairs
            .iter()
            .map(|&(t, d)| predictions[t].distance(&detections[d]))
            .sum()
    }
}

/// Optimal gated assignment between predictions and detections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignmentSolver {
    distance_threshold: f64,
}

impl AssignmentSolver {
    pub fn new(distance_threshold: f64) -> Self {
        Self { distance_threshold }
    }

    pub fn distance_threshold(&self) -> f64 {
        self.distance_threshold
    }

    /// Computes the minimum-cost partial matching.
    ///
    /// Predictions should be ordered by ascending track id so that ties
    /// resolve to the oldest track.
    ///
    /// # Errors
    /// [`Error::AssignmentFailed`] if any coordinate is not finite.
    pub fn solve(&self, predictions: &[Point2], detections: &[Point2]) -> Result<Matching> {
        if predictions.iter().chain(detections).any(|p| !p.is_finite()) {
            return Err(Error::AssignmentFailed);
        }

        let cost = CostMatrix::from_fn(predictions.len(), detections.len(), |i, j| {
            predictions[i].distance(&detections[j])
        });
        let assignment = hungarian_gated(&cost, self.distance_threshold)?;

        let mut matching = Matching::default();
        let mut detection_taken = vec![false; detections.len()];

        for (track, slot) in assignment.mapping.iter().enumerate() {
            match *slot {
                Some(det) => {
                    matching.pairs.push((track, det));
                    detection_taken[det] = true;
                }
                None => matching.unassigned_tracks.push(track),
            }
        }
        matching.unassigned_detections = detection_taken
            .iter()
            .enumerate()
            .filter(|(_, taken)| !**taken)
            .map(|(d, _)| d)
            .collect();

        trace!(
            tracks = predictions.len(),
            detections = detections.len(),
            matched = matching.pairs.len(),
            cost = assignment.cost,
            "assignment solved"
        );

        Ok(matching)
    }
}
