//! # Terrain Profile
//!
//! Piecewise-linear polyline used for the ground surface and for the water
//! table. Serialized as a bare array of `[x, y]` pairs:
//!
//! ```json
//! [[0.0, 10.0], [10.0, 10.0], [20.0, 0.0], [40.0, 0.0]]
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Ordered polyline of `(x, y)` points with strictly increasing x.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TerrainProfile {
    points: Vec<(f64, f64)>,
}

impl TerrainProfile {
    /// Build a validated profile.
    ///
    /// # Example
    ///
    /// ```rust
    /// use slope_core::geometry::TerrainProfile;
    ///
    /// let profile = TerrainProfile::new(vec![(0.0, 10.0), (10.0, 10.0), (20.0, 0.0)]).unwrap();
    /// assert_eq!(profile.x_span(), (0.0, 20.0));
    ///
    /// assert!(TerrainProfile::new(vec![(0.0, 0.0)]).is_err());
    /// ```
    pub fn new(points: Vec<(f64, f64)>) -> CalcResult<Self> {
        let profile = TerrainProfile { points };
        profile.validate()?;
        Ok(profile)
    }

    /// Toe / slope / crest profile.
    ///
    /// The toe platform at elevation 0 runs from x = 0 to `toe_length_m`,
    /// the face rises `height_m` at `angle_deg`, and the crest platform
    /// extends `crest_length_m` beyond the top of the face.
    pub fn simple_slope(height_m: f64, angle_deg: f64, toe_length_m: f64, crest_length_m: f64) -> CalcResult<Self> {
        if !(height_m > 0.0) {
            return Err(CalcError::invalid_input(
                "height_m",
                height_m.to_string(),
                "Slope height must be positive",
            ));
        }
        if !(angle_deg > 0.0 && angle_deg < 90.0) {
            return Err(CalcError::invalid_input(
                "angle_deg",
                angle_deg.to_string(),
                "Slope angle must be between 0 and 90 degrees",
            ));
        }
        if toe_length_m < 0.0 || crest_length_m < 0.0 {
            return Err(CalcError::invalid_input(
                "toe_length_m / crest_length_m",
                format!("{} / {}", toe_length_m, crest_length_m),
                "Platform lengths cannot be negative",
            ));
        }

        let run = height_m / angle_deg.to_radians().tan();
        let mut points = Vec::with_capacity(4);
        if toe_length_m > 0.0 {
            points.push((0.0, 0.0));
        }
        points.push((toe_length_m, 0.0));
        points.push((toe_length_m + run, height_m));
        if crest_length_m > 0.0 {
            points.push((toe_length_m + run + crest_length_m, height_m));
        }
        TerrainProfile::new(points)
    }

    /// Horizontal line, typically a flat water table.
    pub fn horizontal(x_start_m: f64, x_end_m: f64, elevation_m: f64) -> CalcResult<Self> {
        TerrainProfile::new(vec![(x_start_m, elevation_m), (x_end_m, elevation_m)])
    }

    /// Structural check: at least two finite points with strictly increasing x.
    pub fn validate(&self) -> CalcResult<()> {
        if self.points.len() < 2 {
            return Err(CalcError::invalid_input(
                "points",
                self.points.len().to_string(),
                "A profile needs at least 2 points",
            ));
        }
        if let Some(&(x, y)) = self.points.iter().find(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(CalcError::invalid_input(
                "points",
                format!("({}, {})", x, y),
                "Profile coordinates must be finite",
            ));
        }
        if let Some(pair) = self.points.windows(2).find(|w| w[0].0 >= w[1].0) {
            return Err(CalcError::invalid_input(
                "points",
                format!("x = {} then x = {}", pair[0].0, pair[1].0),
                "Profile x coordinates must be strictly increasing",
            ));
        }
        Ok(())
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// (x_min, x_max); (NaN, NaN) for an empty profile
    pub fn x_span(&self) -> (f64, f64) {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (first.0, last.0),
            _ => (f64::NAN, f64::NAN),
        }
    }

    /// (y_min, y_max)
    pub fn y_span(&self) -> (f64, f64) {
        self.points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, y)| (lo.min(y), hi.max(y)))
    }

    /// Elevation at `x`, see [`interpolate_terrain`]
    pub fn elevation_at(&self, x: f64) -> CalcResult<f64> {
        interpolate_terrain(x, self)
    }
}

/// Piecewise-linear interpolation of `profile` at `x`.
///
/// Returns `CalcError::OutOfRange` when x lies outside the profile span.
pub fn interpolate_terrain(x: f64, profile: &TerrainProfile) -> CalcResult<f64> {
    let (min, max) = profile.x_span();
    if !(x >= min && x <= max) {
        return Err(CalcError::OutOfRange { x, min, max });
    }
    for w in profile.points.windows(2) {
        let ((x1, y1), (x2, y2)) = (w[0], w[1]);
        if x >= x1 && x <= x2 {
            return Ok(y1 + (x - x1) / (x2 - x1) * (y2 - y1));
        }
    }
    Err(CalcError::OutOfRange { x, min, max })
}
