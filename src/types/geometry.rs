//! Image-plane geometry: detection points and the speed reference line.

use serde::{Deserialize, Serialize};

use super::spaces::Measurement;

/// A point in image-plane pixel coordinates.
///
/// Detections arrive as `Point2` centroids; track positions and trajectory
/// entries are reported as `Point2` too.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    #[inline]
    pub fn to_measurement(self) -> Measurement<f64, 2> {
        Measurement::from_array([self.x, self.y])
    }
}

impl From<(f64, f64)> for Point2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// The line vehicles cross to trigger a speed measurement.
///
/// Spans the frame from `(0, y_left)` to `(image_width, y_right)`, so a
/// camera that is not square to the road can still use a slanted line. A
/// horizontal line has `y_left == y_right`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLine {
    pub y_left: f64,
    pub y_right: f64,
    pub image_width: f64,
}

impl ReferenceLine {
    /// Horizontal line at `y` across a frame of `image_width` pixels.
    pub fn horizontal(y: f64, image_width: f64) -> Self {
        Self {
            y_left: y,
            y_right: y,
            image_width,
        }
    }

    /// Horizontal line through the midpoint height of this one.
    pub fn midline(&self) -> Self {
        Self::horizontal((self.y_left + self.y_right) / 2.0, self.image_width)
    }

    /// Line height at column `x`.
    ///
    /// Columns outside the frame extrapolate along the same line.
    pub fn y_at(&self, x: f64) -> f64 {
        if self.image_width <= 0.0 {
            return (self.y_left + self.y_right) / 2.0;
        }
        self.y_left + (self.y_right - self.y_left) * (x / self.image_width)
    }

    /// Signed vertical offset of `p` from the line (positive below it).
    pub fn offset(&self, p: &Point2) -> f64 {
        p.y - self.y_at(p.x)
    }

    /// True when `p` lies within `tolerance` pixels of the line, edges included.
    pub fn within_band(&self, p: &Point2, tolerance: f64) -> bool {
        self.offset(p).abs() <= tolerance
    }
}
