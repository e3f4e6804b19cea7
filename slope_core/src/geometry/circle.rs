//! # Failure Circle
//!
//! Circular slip surface and the pointwise circle operations used by the
//! slice builder.
//!
//! Sign convention: α = asin((x − xc)/r) is negative on the side of the
//! circle left of the center (the toe side when the slope faces left) and
//! positive on the right. A slice with α > 0 drives the mass downhill.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{CalcError, CalcResult};

/// Circular failure surface.
///
/// ## JSON Example
///
/// ```json
/// { "center_x_m": 15.0, "center_y_m": 5.0, "radius_m": 30.0 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FailureCircle {
    /// Center abscissa in m
    pub center_x_m: f64,
    /// Center elevation in m
    pub center_y_m: f64,
    /// Radius in m
    pub radius_m: f64,
}

impl FailureCircle {
    /// Build a validated circle.
    ///
    /// # Example
    ///
    /// ```rust
    /// use slope_core::geometry::FailureCircle;
    ///
    /// let circle = FailureCircle::new(15.0, 5.0, 30.0).unwrap();
    /// assert_eq!(circle.x_span(), (-15.0, 45.0));
    /// assert!(FailureCircle::new(0.0, 0.0, -1.0).is_err());
    /// ```
    pub fn new(center_x_m: f64, center_y_m: f64, radius_m: f64) -> CalcResult<Self> {
        let circle = FailureCircle {
            center_x_m,
            center_y_m,
            radius_m,
        };
        circle.validate()?;
        Ok(circle)
    }

    pub fn validate(&self) -> CalcResult<()> {
        if !self.center_x_m.is_finite() || !self.center_y_m.is_finite() {
            return Err(CalcError::invalid_input(
                "center",
                format!("({}, {})", self.center_x_m, self.center_y_m),
                "Circle center must be finite",
            ));
        }
        if !self.radius_m.is_finite() || self.radius_m <= 0.0 {
            return Err(CalcError::invalid_input(
                "radius_m",
                self.radius_m.to_string(),
                "Radius must be positive and finite",
            ));
        }
        Ok(())
    }

    /// Horizontal extent (xc − r, xc + r)
    pub fn x_span(&self) -> (f64, f64) {
        (self.center_x_m - self.radius_m, self.center_x_m + self.radius_m)
    }

    /// Elevation of the lowest point of the circle
    pub fn lowest_point_y(&self) -> f64 {
        self.center_y_m - self.radius_m
    }

    /// Distance from the center to a point
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        (x - self.center_x_m).hypot(y - self.center_y_m)
    }
}

/// Which half of the circle to evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircleBranch {
    Upper,
    Lower,
}

/// Elevation of the circle at `x` on the requested branch.
///
/// Returns `None` when |x − xc| > r. At tangency the discriminant is clamped
/// to zero so rounding never produces a NaN.
pub fn circle_y(x: f64, circle: &FailureCircle, branch: CircleBranch) -> Option<f64> {
    let dx = x - circle.center_x_m;
    if dx.abs() > circle.radius_m {
        return None;
    }
    let root = (circle.radius_m * circle.radius_m - dx * dx).max(0.0).sqrt();
    Some(match branch {
        CircleBranch::Upper => circle.center_y_m + root,
        CircleBranch::Lower => circle.center_y_m - root,
    })
}

/// Base inclination α at `x` in radians, asin((x − xc)/r) with the argument
/// clamped to [−1, 1].
pub fn base_angle(x: f64, circle: &FailureCircle) -> f64 {
    ((x - circle.center_x_m) / circle.radius_m).clamp(-1.0, 1.0).asin()
}

/// Arc length of the circle between abscissae `x1` and `x2`.
///
/// Falls back to the chord |x2 − x1| when either end lies outside the
/// circle's x-span, where asin is undefined.
pub fn arc_length(x1: f64, x2: f64, circle: &FailureCircle) -> f64 {
    let s1 = (x1 - circle.center_x_m) / circle.radius_m;
    let s2 = (x2 - circle.center_x_m) / circle.radius_m;
    if !(-1.0..=1.0).contains(&s1) || !(-1.0..=1.0).contains(&s2) {
        debug!(x1, x2, "arc end outside circle span, using chord length");
        return (x2 - x1).abs();
    }
    circle.radius_m * (s2.asin() - s1.asin()).abs()
}
