//! # Analysis Settings
//!
//! Every tunable of the engine lives in [`AnalysisSettings`], which is passed
//! by reference into each analysis. There is no module-level mutable state.
//!
//! Settings are plain serde data. Every section carries `#[serde(default)]`,
//! so a settings file only needs the fields it wants to override:
//!
//! ```json
//! {
//!   "bishop": { "tolerance": 0.0001, "max_iterations": 100 },
//!   "limits": { "radius_max_m": 500.0 }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::units::GAMMA_WATER_KN_M3;

/// Root settings object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Bishop fixed-point iteration parameters
    pub bishop: BishopSettings,

    /// Slice discretization parameters
    pub geometry: GeometrySettings,

    /// Thresholds used by the validation layer and result checks
    pub limits: ValidationLimits,

    /// Run the complete input check before building slices
    pub validate_input: bool,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        AnalysisSettings {
            bishop: BishopSettings::default(),
            geometry: GeometrySettings::default(),
            limits: ValidationLimits::default(),
            validate_input: true,
        }
    }
}

impl AnalysisSettings {
    /// Reject settings no analysis could run with.
    pub fn validate(&self) -> CalcResult<()> {
        let b = &self.bishop;
        if !(b.initial_fs.is_finite() && b.initial_fs > 0.0) {
            return Err(CalcError::invalid_input(
                "bishop.initial_fs",
                b.initial_fs.to_string(),
                "Initial FS estimate must be positive and finite",
            ));
        }
        if !(b.tolerance.is_finite() && b.tolerance > 0.0) {
            return Err(CalcError::invalid_input(
                "bishop.tolerance",
                b.tolerance.to_string(),
                "Convergence tolerance must be positive",
            ));
        }
        if b.max_iterations == 0 {
            return Err(CalcError::invalid_input(
                "bishop.max_iterations",
                "0",
                "At least one iteration is required",
            ));
        }
        if !(b.divergence_span.is_finite() && b.divergence_span > 0.0) {
            return Err(CalcError::invalid_input(
                "bishop.divergence_span",
                b.divergence_span.to_string(),
                "Divergence span must be positive",
            ));
        }

        let g = &self.geometry;
        if !(g.max_base_angle_deg > 0.0 && g.max_base_angle_deg < 90.0) {
            return Err(CalcError::invalid_input(
                "geometry.max_base_angle_deg",
                g.max_base_angle_deg.to_string(),
                "Maximum base angle must be between 0 and 90 degrees",
            ));
        }
        if !(g.gamma_water_kn_m3.is_finite() && g.gamma_water_kn_m3 > 0.0) {
            return Err(CalcError::invalid_input(
                "geometry.gamma_water_kn_m3",
                g.gamma_water_kn_m3.to_string(),
                "Unit weight of water must be positive",
            ));
        }

        self.limits.validate()
    }
}

/// Bishop Modified iteration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BishopSettings {
    /// Starting FS estimate
    pub initial_fs: f64,

    /// Convergence tolerance on |FS_new - FS_old|
    pub tolerance: f64,

    /// Iteration cap; exceeding it is a NO_CONVERGENCIA error
    pub max_iterations: usize,

    /// Oscillation is only checked once the iteration index exceeds this
    pub divergence_check_after: usize,

    /// Spread of the last three history values that counts as oscillation
    pub divergence_span: f64,
}

impl Default for BishopSettings {
    fn default() -> Self {
        BishopSettings {
            initial_fs: 1.0,
            tolerance: 1e-3,
            max_iterations: 50,
            divergence_check_after: 5,
            divergence_span: 0.5,
        }
    }
}

/// Slice construction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometrySettings {
    /// Slices whose |α| exceeds this are rejected and discarded (degrees)
    pub max_base_angle_deg: f64,

    /// Unit weight of water used for pore pressure (kN/m³)
    pub gamma_water_kn_m3: f64,
}

impl Default for GeometrySettings {
    fn default() -> Self {
        GeometrySettings {
            max_base_angle_deg: 80.0,
            gamma_water_kn_m3: GAMMA_WATER_KN_M3,
        }
    }
}

/// Thresholds of the validation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationLimits {
    pub cohesion_min_kpa: f64,
    pub cohesion_max_kpa: f64,
    pub phi_min_deg: f64,
    pub phi_max_deg: f64,
    pub gamma_min_kn_m3: f64,
    pub gamma_max_kn_m3: f64,

    /// c' above this together with φ' above `unusual_phi_deg` is flagged
    pub unusual_cohesion_kpa: f64,
    pub unusual_phi_deg: f64,

    pub radius_min_m: f64,
    pub radius_max_m: f64,

    /// Minimum overlap between the circle and profile x-spans
    pub min_intersection_m: f64,

    /// Distance from the circle at which a profile sample counts as a crossing
    pub contact_tolerance_m: f64,

    /// Circle rejected when its closest sampled approach exceeds this × r
    pub max_distance_radius_ratio: f64,

    /// Center rejected when it sits more than this × r above the terrain
    pub max_center_height_radius_ratio: f64,

    /// Steepest |dy/dx| accepted on a profile segment
    pub max_profile_slope: f64,

    pub min_slices: usize,
    pub max_slices: usize,

    /// |α| bound of the per-slice predicate (degrees)
    pub max_slice_alpha_deg: f64,

    /// mα below this is reported as low
    pub low_m_alpha: f64,

    /// Fraction of slices in tension above which a result is invalid
    pub max_tension_fraction: f64,

    /// Fraction of slices with low mα above which a Bishop result is invalid
    pub max_low_m_alpha_fraction: f64,

    /// Fraction of slices with mα(FS=1) ≤ 0 above which a slice set is rejected
    pub max_non_positive_m_alpha_fraction: f64,

    /// Largest plausible FS
    pub fs_max: f64,

    /// FS below this is reported as very low and the result marked invalid
    pub fs_very_low: f64,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        ValidationLimits {
            cohesion_min_kpa: 0.0,
            cohesion_max_kpa: 500.0,
            phi_min_deg: 0.0,
            phi_max_deg: 50.0,
            gamma_min_kn_m3: 10.0,
            gamma_max_kn_m3: 30.0,
            unusual_cohesion_kpa: 100.0,
            unusual_phi_deg: 35.0,
            radius_min_m: 1.0,
            radius_max_m: 1000.0,
            min_intersection_m: 0.1,
            contact_tolerance_m: 0.1,
            max_distance_radius_ratio: 0.5,
            max_center_height_radius_ratio: 5.0,
            max_profile_slope: 10.0,
            min_slices: 3,
            max_slices: 100,
            max_slice_alpha_deg: 90.0,
            low_m_alpha: 0.1,
            max_tension_fraction: 0.5,
            max_low_m_alpha_fraction: 1.0 / 3.0,
            max_non_positive_m_alpha_fraction: 0.2,
            fs_max: 10.0,
            fs_very_low: 0.5,
        }
    }
}

impl ValidationLimits {
    fn validate(&self) -> CalcResult<()> {
        let ranges = [
            ("limits.cohesion", self.cohesion_min_kpa, self.cohesion_max_kpa),
            ("limits.phi", self.phi_min_deg, self.phi_max_deg),
            ("limits.gamma", self.gamma_min_kn_m3, self.gamma_max_kn_m3),
            ("limits.radius", self.radius_min_m, self.radius_max_m),
        ];
        for (field, min, max) in ranges {
            if !(min <= max) {
                return Err(CalcError::invalid_input(
                    field,
                    format!("[{}, {}]", min, max),
                    "Range minimum exceeds maximum",
                ));
            }
        }
        if self.min_slices == 0 || self.min_slices > self.max_slices {
            return Err(CalcError::invalid_input(
                "limits.min_slices",
                self.min_slices.to_string(),
                "Slice count range must be non-empty and start above zero",
            ));
        }
        for (field, fraction) in [
            ("limits.max_tension_fraction", self.max_tension_fraction),
            ("limits.max_low_m_alpha_fraction", self.max_low_m_alpha_fraction),
            (
                "limits.max_non_positive_m_alpha_fraction",
                self.max_non_positive_m_alpha_fraction,
            ),
        ] {
            if !(0.0..=1.0).contains(&fraction) {
                return Err(CalcError::invalid_input(
                    field,
                    fraction.to_string(),
                    "Fraction must lie in [0, 1]",
                ));
            }
        }
        if !(self.fs_max > 0.0 && self.fs_very_low < self.fs_max) {
            return Err(CalcError::invalid_input(
                "limits.fs_max",
                self.fs_max.to_string(),
                "FS upper bound must be positive and above the very-low threshold",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = AnalysisSettings::default();
        assert_eq!(s.bishop.max_iterations, 50);
        assert!((s.bishop.tolerance - 1e-3).abs() < 1e-15);
        assert!((s.geometry.max_base_angle_deg - 80.0).abs() < 1e-12);
        assert!((s.limits.max_slice_alpha_deg - 90.0).abs() < 1e-12);
        assert!(s.validate_input);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let json = r#"{ "bishop": { "tolerance": 0.0001 } }"#;
        let s: AnalysisSettings = serde_json::from_str(json).unwrap();
        assert!((s.bishop.tolerance - 1e-4).abs() < 1e-15);
        assert_eq!(s.bishop.max_iterations, 50);
        assert_eq!(s.limits.max_slices, 100);
    }

    #[test]
    fn test_rejects_bad_tolerance() {
        let mut s = AnalysisSettings::default();
        s.bishop.tolerance = 0.0;
        assert_eq!(s.validate().unwrap_err().error_code(), "ENTRADA_INVALIDA");
    }

    #[test]
    fn test_rejects_bad_divergence_span() {
        for span in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let mut s = AnalysisSettings::default();
            s.bishop.divergence_span = span;
            match s.validate().unwrap_err() {
                CalcError::InvalidInput { field, .. } => assert_eq!(field, "bishop.divergence_span"),
                other => panic!("unexpected error {:?}", other),
            }
        }
    }

    #[test]
    fn test_rejects_inverted_range() {
        let mut s = AnalysisSettings::default();
        s.limits.radius_min_m = 2000.0;
        assert!(s.validate().is_err());

        let mut s = AnalysisSettings::default();
        s.limits.max_tension_fraction = 1.5;
        assert!(s.validate().is_err());
    }
}
