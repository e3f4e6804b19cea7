//! # Validation Layer
//!
//! Stand-alone predicates over inputs, slices and results. Each returns a
//! [`ValidationOutcome`]; none of them raise. Callers decide whether an
//! invalid outcome is fatal, usually through [`ValidationOutcome::into_result`]
//! or [`collect`].
//!
//! A *valid* outcome that still carries a code is a warning (a slice in
//! tension, an unusual c'-φ' combination, excessive tension in a slice set).
//!
//! ## Example
//!
//! ```rust
//! use slope_core::materials::Stratum;
//! use slope_core::settings::ValidationLimits;
//! use slope_core::validation::check_geotechnical_parameters;
//!
//! let limits = ValidationLimits::default();
//! let stiff = Stratum::new("Stiff", 600.0, 20.0, 18.0).unwrap();
//!
//! let outcome = check_geotechnical_parameters(&stiff, &limits);
//! assert!(!outcome.valid);
//! assert_eq!(outcome.code.unwrap().as_str(), "COHESION_FUERA_RANGO");
//! ```

use serde::{Deserialize, Serialize};

use crate::calculations::{AnalysisInput, StabilityClass};
use crate::errors::{CalcError, CalcResult, ErrorCategory, ErrorCode};
use crate::geometry::{interpolate_terrain, FailureCircle, Slice, TerrainProfile};
use crate::materials::Stratum;
use crate::settings::ValidationLimits;

/// Result of one validation predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub message: String,
    pub code: Option<ErrorCode>,
    /// Offending value, where one exists
    pub value: Option<f64>,
}

impl ValidationOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        ValidationOutcome {
            valid: true,
            message: message.into(),
            code: None,
            value: None,
        }
    }

    pub fn warning(code: ErrorCode, message: impl Into<String>, value: Option<f64>) -> Self {
        ValidationOutcome {
            valid: true,
            message: message.into(),
            code: Some(code),
            value,
        }
    }

    pub fn invalid(code: ErrorCode, message: impl Into<String>, value: Option<f64>) -> Self {
        ValidationOutcome {
            valid: false,
            message: message.into(),
            code: Some(code),
            value,
        }
    }

    /// Valid, but flagged
    pub fn is_warning(&self) -> bool {
        self.valid && self.code.is_some()
    }

    /// Convert an invalid outcome into the matching `CalcError`.
    ///
    /// Geometric codes become `CalcError::Geometry`, everything else
    /// `CalcError::Validation`. Valid outcomes pass through.
    pub fn into_result(self) -> CalcResult<Self> {
        if self.valid {
            return Ok(self);
        }
        let code = self.code.unwrap_or(ErrorCode::InvalidFs);
        Err(match code.category() {
            ErrorCategory::Geometry => CalcError::Geometry {
                code,
                reason: self.message,
                value: self.value,
            },
            _ => CalcError::Validation {
                code,
                message: self.message,
                value: self.value,
            },
        })
    }

    /// Prefix the message, keeping code and value
    pub fn prefixed(mut self, prefix: &str) -> Self {
        self.message = format!("{}{}", prefix, self.message);
        self
    }
}

/// Raise the first invalid outcome; append the message of every warning.
pub fn collect(outcomes: impl IntoIterator<Item = ValidationOutcome>, warnings: &mut Vec<String>) -> CalcResult<()> {
    for outcome in outcomes {
        let outcome = outcome.into_result()?;
        if outcome.is_warning() {
            warnings.push(outcome.message);
        }
    }
    Ok(())
}

/// mα evaluated at FS = 1: cosα + sinα·tanφ'
pub fn m_alpha_at_unit_fs(slice: &Slice) -> f64 {
    slice.cos_alpha() + slice.sin_alpha() * slice.tan_phi()
}

/// Typical-range check of the soil parameters.
pub fn check_geotechnical_parameters(stratum: &Stratum, limits: &ValidationLimits) -> ValidationOutcome {
    let c = stratum.cohesion_kpa;
    if !(c >= limits.cohesion_min_kpa && c <= limits.cohesion_max_kpa) {
        return ValidationOutcome::invalid(
            ErrorCode::CohesionOutOfRange,
            format!(
                "Cohesion {} kPa outside typical range [{}, {}]",
                c, limits.cohesion_min_kpa, limits.cohesion_max_kpa
            ),
            Some(c),
        );
    }
    let phi = stratum.phi_deg;
    if !(phi >= limits.phi_min_deg && phi <= limits.phi_max_deg) {
        return ValidationOutcome::invalid(
            ErrorCode::PhiOutOfRange,
            format!(
                "Friction angle {} deg outside typical range [{}, {}]",
                phi, limits.phi_min_deg, limits.phi_max_deg
            ),
            Some(phi),
        );
    }
    let gamma = stratum.gamma_kn_m3;
    if !(gamma >= limits.gamma_min_kn_m3 && gamma <= limits.gamma_max_kn_m3) {
        return ValidationOutcome::invalid(
            ErrorCode::GammaOutOfRange,
            format!(
                "Unit weight {} kN/m3 outside typical range [{}, {}]",
                gamma, limits.gamma_min_kn_m3, limits.gamma_max_kn_m3
            ),
            Some(gamma),
        );
    }
    if c > limits.unusual_cohesion_kpa && phi > limits.unusual_phi_deg {
        return ValidationOutcome::warning(
            ErrorCode::UnusualPhiCohesion,
            format!("Unusual combination: high cohesion ({} kPa) with high friction angle ({} deg)", c, phi),
            None,
        );
    }
    ValidationOutcome::ok("Geotechnical parameters valid")
}

/// Point count, ordering and steepness of a profile.
pub fn check_terrain_profile(profile: &TerrainProfile, limits: &ValidationLimits) -> ValidationOutcome {
    let points = profile.points();
    if points.len() < 2 {
        return ValidationOutcome::invalid(
            ErrorCode::ProfileTooShort,
            format!("Profile has {} point(s), at least 2 required", points.len()),
            Some(points.len() as f64),
        );
    }
    for (i, w) in points.windows(2).enumerate() {
        if !(w[0].0 < w[1].0) {
            return ValidationOutcome::invalid(
                ErrorCode::ProfileNotSorted,
                format!("Profile not ordered: x[{}] = {} >= x[{}] = {}", i, w[0].0, i + 1, w[1].0),
                Some(w[1].0),
            );
        }
    }
    for (i, w) in points.windows(2).enumerate() {
        let slope = ((w[1].1 - w[0].1) / (w[1].0 - w[0].0)).abs();
        if slope > limits.max_profile_slope {
            return ValidationOutcome::invalid(
                ErrorCode::ExtremeSlope,
                format!(
                    "Extreme slope between points {} and {}: {:.1} > {:.1}",
                    i,
                    i + 1,
                    slope,
                    limits.max_profile_slope
                ),
                Some(slope),
            );
        }
    }
    ValidationOutcome::ok(format!("Terrain profile valid ({} points)", points.len()))
}

/// Plausibility of a circle relative to the terrain.
///
/// Checks, in order: radius range, overlap of the x-spans, lowest circle
/// point below the highest terrain point, proximity to the terrain (only
/// when no sampled profile point lies on the circle) and center height.
pub fn check_circle_geometry(
    circle: &FailureCircle,
    profile: &TerrainProfile,
    limits: &ValidationLimits,
) -> ValidationOutcome {
    let r = circle.radius_m;
    if r < limits.radius_min_m {
        return ValidationOutcome::invalid(
            ErrorCode::RadiusTooSmall,
            format!("Radius {} m too small (minimum {} m)", r, limits.radius_min_m),
            Some(r),
        );
    }
    if r > limits.radius_max_m {
        return ValidationOutcome::invalid(
            ErrorCode::RadiusTooLarge,
            format!("Radius {} m too large (maximum {} m)", r, limits.radius_max_m),
            Some(r),
        );
    }

    let (terrain_lo, terrain_hi) = profile.x_span();
    let (circle_lo, circle_hi) = circle.x_span();
    let overlap = terrain_hi.min(circle_hi) - terrain_lo.max(circle_lo);
    if !(overlap >= limits.min_intersection_m) {
        return ValidationOutcome::invalid(
            ErrorCode::InsufficientIntersection,
            format!(
                "Circle-terrain overlap {:.2} m below minimum {} m",
                overlap, limits.min_intersection_m
            ),
            Some(overlap),
        );
    }

    let (_, terrain_top) = profile.y_span();
    if circle.lowest_point_y() >= terrain_top {
        return ValidationOutcome::invalid(
            ErrorCode::CircleAboveTerrain,
            format!(
                "Lowest circle point ({:.2} m) is not below the highest terrain point ({:.2} m)",
                circle.lowest_point_y(),
                terrain_top
            ),
            Some(circle.lowest_point_y()),
        );
    }

    if !crosses_profile(circle, profile, limits.contact_tolerance_m) {
        let distance = closest_vertical_approach(circle, profile);
        if distance > limits.max_distance_radius_ratio * r {
            return ValidationOutcome::invalid(
                ErrorCode::CircleTooFar,
                format!("Circle too far from terrain: closest approach {:.2} m", distance),
                Some(distance),
            );
        }
    }

    if let Ok(y_terrain) = interpolate_terrain(circle.center_x_m, profile) {
        let center_height = circle.center_y_m - y_terrain;
        let max_height = limits.max_center_height_radius_ratio * r;
        if center_height > max_height {
            return ValidationOutcome::invalid(
                ErrorCode::CenterTooHigh,
                format!("Center too high: {:.1} m above terrain > {:.1} m", center_height, max_height),
                Some(center_height),
            );
        }
    }

    ValidationOutcome::ok("Circle geometry valid")
}

/// Whether any quarter-point of a profile segment lies within `tolerance`
/// of the circle.
fn crosses_profile(circle: &FailureCircle, profile: &TerrainProfile, tolerance: f64) -> bool {
    const SAMPLES: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];
    profile.points().windows(2).any(|w| {
        let ((x1, y1), (x2, y2)) = (w[0], w[1]);
        SAMPLES.iter().any(|t| {
            let x = x1 + t * (x2 - x1);
            let y = y1 + t * (y2 - y1);
            (circle.distance_to(x, y) - circle.radius_m).abs() < tolerance
        })
    })
}

/// Smallest vertical gap between the terrain and the circle perimeter,
/// sampled every 10 degrees over the terrain's x-span.
fn closest_vertical_approach(circle: &FailureCircle, profile: &TerrainProfile) -> f64 {
    (0..36)
        .map(|k| (k as f64 * 10.0).to_radians())
        .filter_map(|theta| {
            let x = circle.center_x_m + circle.radius_m * theta.cos();
            let y = circle.center_y_m + circle.radius_m * theta.sin();
            interpolate_terrain(x, profile).ok().map(|yt| (y - yt).abs())
        })
        .fold(f64::INFINITY, f64::min)
}

/// Pre-flight check of a single slice.
pub fn check_slice(slice: &Slice, limits: &ValidationLimits) -> ValidationOutcome {
    if !(slice.width_m > 0.0) {
        return ValidationOutcome::invalid(
            ErrorCode::InvalidWidth,
            format!("Invalid slice width: {} m", slice.width_m),
            Some(slice.width_m),
        );
    }
    if !(slice.height_m > 0.0) {
        return ValidationOutcome::invalid(
            ErrorCode::InvalidHeight,
            format!("Invalid slice height: {} m", slice.height_m),
            Some(slice.height_m),
        );
    }
    if !(slice.weight_kn > 0.0) {
        return ValidationOutcome::invalid(
            ErrorCode::InvalidWeight,
            format!("Invalid slice weight: {} kN", slice.weight_kn),
            Some(slice.weight_kn),
        );
    }
    let alpha_deg = slice.alpha_degrees();
    if alpha_deg.abs() > limits.max_slice_alpha_deg {
        return ValidationOutcome::invalid(
            ErrorCode::AlphaOutOfRange,
            format!("Base angle {:.1} deg outside +/-{} deg", alpha_deg, limits.max_slice_alpha_deg),
            Some(alpha_deg),
        );
    }
    let m_alpha = m_alpha_at_unit_fs(slice);
    if m_alpha <= 0.0 {
        return ValidationOutcome::invalid(
            ErrorCode::NonPositiveMAlpha,
            format!("m_alpha <= 0 at FS = 1: {:.4} (cos a + sin a tan phi)", m_alpha),
            Some(m_alpha),
        );
    }
    if slice.in_tension {
        return ValidationOutcome::warning(
            ErrorCode::SliceInTension,
            format!(
                "Slice {} in tension: N' = {:.1} kN < 0",
                slice.index, slice.effective_normal_kn
            ),
            Some(slice.effective_normal_kn),
        );
    }
    ValidationOutcome::ok("Slice valid")
}

/// System-level check of a slice list.
///
/// Excess tension is returned as a warning so that solvers can still report
/// a result, marked invalid.
pub fn check_slice_set(slices: &[Slice], limits: &ValidationLimits) -> ValidationOutcome {
    let n = slices.len();
    if n < limits.min_slices {
        return ValidationOutcome::invalid(
            ErrorCode::TooFewSlices,
            format!("Too few slices: {} < {}", n, limits.min_slices),
            Some(n as f64),
        );
    }
    if n > limits.max_slices {
        return ValidationOutcome::invalid(
            ErrorCode::TooManySlices,
            format!("Too many slices: {} > {}", n, limits.max_slices),
            Some(n as f64),
        );
    }

    let non_positive = slices.iter().filter(|s| m_alpha_at_unit_fs(s) <= 0.0).count();
    let non_positive_fraction = non_positive as f64 / n as f64;
    if non_positive_fraction > limits.max_non_positive_m_alpha_fraction {
        return ValidationOutcome::invalid(
            ErrorCode::MultipleNonPositiveMAlpha,
            format!(
                "Too many slices with m_alpha <= 0: {} ({:.1}%)",
                non_positive,
                non_positive_fraction * 100.0
            ),
            Some(non_positive_fraction * 100.0),
        );
    }

    if let Some(i) = slices.windows(2).position(|w| w[0].x_center_m >= w[1].x_center_m) {
        return ValidationOutcome::invalid(
            ErrorCode::SlicesNotOrdered,
            format!(
                "Slices not ordered: slice {} (x = {}) >= slice {} (x = {})",
                i,
                slices[i].x_center_m,
                i + 1,
                slices[i + 1].x_center_m
            ),
            Some(slices[i + 1].x_center_m),
        );
    }

    let tension = slices.iter().filter(|s| s.in_tension).count();
    let tension_fraction = tension as f64 / n as f64;
    if tension_fraction > limits.max_tension_fraction {
        return ValidationOutcome::warning(
            ErrorCode::ExcessiveTension,
            format!(
                "Too many slices in tension: {} of {} ({:.1}%)",
                tension,
                n,
                tension_fraction * 100.0
            ),
            Some(tension_fraction * 100.0),
        );
    }

    let mut message = format!("Set of {} slices valid", n);
    if tension > 0 {
        message.push_str(&format!(" ({} in tension: {:.1}%)", tension, tension_fraction * 100.0));
    }
    ValidationOutcome::ok(message)
}

/// Low mα values at the converged FS.
///
/// Any value below `low_m_alpha` is a warning. More than
/// `max_low_m_alpha_fraction` of them makes the outcome invalid; the Bishop
/// solver reports that as an invalid result rather than an error.
pub fn check_low_m_alpha(m_alpha: &[f64], limits: &ValidationLimits) -> ValidationOutcome {
    let low: Vec<f64> = m_alpha.iter().copied().filter(|m| *m < limits.low_m_alpha).collect();
    if low.is_empty() {
        return ValidationOutcome::ok(format!("No slice with m_alpha below {}", limits.low_m_alpha));
    }

    let n = m_alpha.len();
    let fraction = low.len() as f64 / n as f64;
    if fraction > limits.max_low_m_alpha_fraction {
        return ValidationOutcome::invalid(
            ErrorCode::LowMAlpha,
            format!("Many slices with low m_alpha ({}/{})", low.len(), n),
            Some(fraction * 100.0),
        );
    }

    let min = low.iter().copied().fold(f64::INFINITY, f64::min);
    ValidationOutcome::warning(
        ErrorCode::LowMAlpha,
        format!("{} of {} slices with low m_alpha (min {:.3})", low.len(), n, min),
        Some(min),
    )
}

/// Convergence state of a Bishop FS history.
///
/// `iteration` is the number of completed iterations.
pub fn check_convergence_history(
    history: &[f64],
    iteration: usize,
    tolerance: f64,
    max_iterations: usize,
) -> ValidationOutcome {
    if history.len() < 2 {
        return ValidationOutcome::ok("Not enough iterations to assess convergence");
    }
    if let Some((i, &fs)) = history
        .iter()
        .enumerate()
        .find(|(_, fs)| !fs.is_finite() || **fs <= 0.0)
    {
        return ValidationOutcome::invalid(
            ErrorCode::InvalidFs,
            format!("Invalid FS at iteration {}: {}", i, fs),
            Some(fs),
        );
    }

    let n = history.len();
    let delta = (history[n - 1] - history[n - 2]).abs();
    if delta < tolerance {
        return ValidationOutcome::ok(format!(
            "Converged at iteration {}: delta = {:.6} < {}",
            iteration, delta, tolerance
        ));
    }
    if iteration >= max_iterations {
        return ValidationOutcome::invalid(
            ErrorCode::NoConvergence,
            format!("Maximum iterations reached ({}): delta = {:.6}", max_iterations, delta),
            Some(delta),
        );
    }
    if n >= 3 {
        let previous = (history[n - 2] - history[n - 3]).abs();
        if delta > 2.0 * previous && delta > 0.1 {
            return ValidationOutcome::invalid(
                ErrorCode::PossibleDivergence,
                format!("Possible divergence: delta = {:.4} > 2 x previous delta = {:.4}", delta, 2.0 * previous),
                Some(delta),
            );
        }
    }
    ValidationOutcome::ok(format!("Iteration {}: delta = {:.6}, continuing", iteration, delta))
}

/// Plausibility of a final FS; the message carries the stability class.
pub fn check_factor_of_safety(fs: f64, limits: &ValidationLimits) -> ValidationOutcome {
    if fs <= 0.0 {
        return ValidationOutcome::invalid(
            ErrorCode::NonPositiveFs,
            format!("Non-positive factor of safety: {}", fs),
            Some(fs),
        );
    }
    if !fs.is_finite() {
        return ValidationOutcome::invalid(ErrorCode::InvalidFs, format!("Invalid factor of safety: {}", fs), Some(fs));
    }
    if fs > limits.fs_max {
        return ValidationOutcome::invalid(
            ErrorCode::FsTooHigh,
            format!("Suspiciously high factor of safety: {:.2} > {}", fs, limits.fs_max),
            Some(fs),
        );
    }
    ValidationOutcome::ok(format!("Factor of safety: {:.3} ({})", fs, StabilityClass::from_fs(fs)))
}

/// Stratum, terrain, water table and circle checks, in that order.
pub fn check_complete_input(input: &AnalysisInput, limits: &ValidationLimits) -> Vec<ValidationOutcome> {
    let mut outcomes = vec![
        check_geotechnical_parameters(&input.stratum, limits),
        check_terrain_profile(&input.terrain, limits),
    ];
    if let Some(water_table) = &input.water_table {
        outcomes.push(check_terrain_profile(water_table, limits).prefixed("Water table: "));
    }
    outcomes.push(check_circle_geometry(&input.circle, &input.terrain, limits));
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{build_slices, SliceGeometry};
    use crate::settings::GeometrySettings;

    fn limits() -> ValidationLimits {
        ValidationLimits::default()
    }

    fn scenario_profile() -> TerrainProfile {
        TerrainProfile::new(vec![(0.0, 10.0), (10.0, 10.0), (20.0, 0.0), (40.0, 0.0)]).unwrap()
    }

    fn test_slice(alpha_deg: f64, phi_deg: f64, x: f64) -> Slice {
        let soil = Stratum::new("s", 10.0, phi_deg, 18.0).unwrap();
        Slice::new(
            SliceGeometry {
                index: 0,
                x_center_m: x,
                width_m: 1.0,
                height_m: 3.0,
                alpha_rad: alpha_deg.to_radians(),
                arc_length_m: 1.2,
                y_surface_m: 3.0,
                y_base_m: 0.0,
            },
            &soil,
            0.0,
            89.0,
        )
        .unwrap()
    }

    #[test]
    fn test_geotechnical_ranges() {
        let ok = Stratum::new("Clay", 20.0, 20.0, 18.0).unwrap();
        assert!(check_geotechnical_parameters(&ok, &limits()).valid);

        let high_c = Stratum::new("Stiff", 600.0, 20.0, 18.0).unwrap();
        let outcome = check_geotechnical_parameters(&high_c, &limits());
        assert!(!outcome.valid);
        assert_eq!(outcome.code, Some(ErrorCode::CohesionOutOfRange));
        assert_eq!(outcome.value, Some(600.0));

        let light = Stratum::new("Peat", 5.0, 20.0, 8.0).unwrap();
        assert_eq!(
            check_geotechnical_parameters(&light, &limits()).code,
            Some(ErrorCode::GammaOutOfRange)
        );
    }

    #[test]
    fn test_unusual_combination_is_warning() {
        let odd = Stratum::new("Odd", 150.0, 40.0, 20.0).unwrap();
        let outcome = check_geotechnical_parameters(&odd, &limits());
        assert!(outcome.valid);
        assert!(outcome.is_warning());
        assert_eq!(outcome.code, Some(ErrorCode::UnusualPhiCohesion));
    }

    #[test]
    fn test_terrain_profile_checks() {
        assert!(check_terrain_profile(&scenario_profile(), &limits()).valid);

        let cliff = TerrainProfile::new(vec![(0.0, 0.0), (1.0, 20.0)]).unwrap();
        let outcome = check_terrain_profile(&cliff, &limits());
        assert_eq!(outcome.code, Some(ErrorCode::ExtremeSlope));
        assert!((outcome.value.unwrap() - 20.0).abs() < 1e-12);

        let unsorted: TerrainProfile = serde_json::from_str("[[0.0, 0.0], [2.0, 1.0], [1.0, 1.0]]").unwrap();
        assert_eq!(
            check_terrain_profile(&unsorted, &limits()).code,
            Some(ErrorCode::ProfileNotSorted)
        );

        let single: TerrainProfile = serde_json::from_str("[[0.0, 0.0]]").unwrap();
        assert_eq!(
            check_terrain_profile(&single, &limits()).code,
            Some(ErrorCode::ProfileTooShort)
        );
    }

    #[test]
    fn test_circle_geometry_valid_scenario() {
        let circle = FailureCircle::new(15.0, 5.0, 30.0).unwrap();
        let outcome = check_circle_geometry(&circle, &scenario_profile(), &limits());
        assert!(outcome.valid, "{}", outcome.message);
    }

    #[test]
    fn test_circle_radius_limits() {
        let tiny = FailureCircle::new(15.0, 5.0, 0.5).unwrap();
        let outcome = check_circle_geometry(&tiny, &scenario_profile(), &limits());
        assert_eq!(outcome.code, Some(ErrorCode::RadiusTooSmall));
        assert_eq!(outcome.into_result().unwrap_err().error_code(), "RADIO_DEMASIADO_PEQUENO");

        let huge = FailureCircle::new(15.0, 5.0, 2000.0).unwrap();
        assert_eq!(
            check_circle_geometry(&huge, &scenario_profile(), &limits()).code,
            Some(ErrorCode::RadiusTooLarge)
        );
    }

    #[test]
    fn test_circle_above_terrain() {
        let high = FailureCircle::new(15.0, 50.0, 10.0).unwrap();
        let outcome = check_circle_geometry(&high, &scenario_profile(), &limits());
        assert_eq!(outcome.code, Some(ErrorCode::CircleAboveTerrain));
        let err = outcome.into_result().unwrap_err();
        assert!(err.is_geometry_error());
    }

    #[test]
    fn test_circle_insufficient_overlap() {
        let far = FailureCircle::new(100.0, 0.0, 10.0).unwrap();
        assert_eq!(
            check_circle_geometry(&far, &scenario_profile(), &limits()).code,
            Some(ErrorCode::InsufficientIntersection)
        );
    }

    #[test]
    fn test_deep_circle_too_far() {
        // Tiny circle buried far below a flat surface
        let flat = TerrainProfile::new(vec![(0.0, 100.0), (40.0, 100.0)]).unwrap();
        let deep = FailureCircle::new(20.0, 0.0, 10.0).unwrap();
        let outcome = check_circle_geometry(&deep, &flat, &limits());
        assert_eq!(outcome.code, Some(ErrorCode::CircleTooFar));
    }

    #[test]
    fn test_check_slice() {
        let ok = test_slice(20.0, 30.0, 0.0);
        assert!(check_slice(&ok, &limits()).valid);

        // tan(30) * sin(-75) + cos(-75) < 0
        let steep = test_slice(-75.0, 30.0, 0.0);
        let outcome = check_slice(&steep, &limits());
        assert_eq!(outcome.code, Some(ErrorCode::NonPositiveMAlpha));
        assert!(outcome.value.unwrap() <= 0.0);
    }

    #[test]
    fn test_check_slice_set_counts_and_order() {
        let few = vec![test_slice(0.0, 20.0, 0.0), test_slice(5.0, 20.0, 1.0)];
        assert_eq!(check_slice_set(&few, &limits()).code, Some(ErrorCode::TooFewSlices));

        let unordered = vec![
            test_slice(0.0, 20.0, 0.0),
            test_slice(5.0, 20.0, 2.0),
            test_slice(10.0, 20.0, 1.0),
        ];
        assert_eq!(
            check_slice_set(&unordered, &limits()).code,
            Some(ErrorCode::SlicesNotOrdered)
        );

        let circle = FailureCircle::new(15.0, 5.0, 30.0).unwrap();
        let soil = Stratum::new("Clay", 20.0, 20.0, 18.0).unwrap();
        let set = build_slices(&circle, &scenario_profile(), &soil, 8, None, &GeometrySettings::default()).unwrap();
        let outcome = check_slice_set(&set.slices, &limits());
        assert!(outcome.valid && !outcome.is_warning());
    }

    #[test]
    fn test_check_slice_set_non_positive_m_alpha() {
        let slices: Vec<Slice> = (0..5)
            .map(|i| {
                let alpha = if i < 2 { -75.0 } else { 10.0 };
                test_slice(alpha, 30.0, i as f64)
            })
            .collect();
        let outcome = check_slice_set(&slices, &limits());
        assert_eq!(outcome.code, Some(ErrorCode::MultipleNonPositiveMAlpha));
        assert!((outcome.value.unwrap() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_excess_tension_is_warning() {
        let circle = FailureCircle::new(15.0, 5.0, 30.0).unwrap();
        let soil = Stratum::new("Clay", 100.0, 20.0, 18.0).unwrap();
        let wt = TerrainProfile::horizontal(0.0, 40.0, 40.0).unwrap();
        let set = build_slices(&circle, &scenario_profile(), &soil, 8, Some(&wt), &GeometrySettings::default()).unwrap();
        let outcome = check_slice_set(&set.slices, &limits());
        assert!(outcome.valid);
        assert_eq!(outcome.code, Some(ErrorCode::ExcessiveTension));
    }

    #[test]
    fn test_low_m_alpha() {
        let limits = limits();
        assert!(check_low_m_alpha(&[0.9, 0.8, 1.0], &limits).code.is_none());

        let one_low = check_low_m_alpha(&[0.05, 0.8, 1.0, 0.95], &limits);
        assert!(one_low.is_warning());
        assert_eq!(one_low.code, Some(ErrorCode::LowMAlpha));
        assert_eq!(one_low.value, Some(0.05));

        let many_low = check_low_m_alpha(&[0.05, 0.08, 1.0, 0.95], &limits);
        assert!(!many_low.valid);
        assert_eq!(many_low.code.unwrap().as_str(), "M_ALPHA_BAJO");
        assert!((many_low.value.unwrap() - 50.0).abs() < 1e-9);
        assert!(many_low.message.contains("(2/4)"));
    }

    #[test]
    fn test_convergence_history() {
        let converged = [1.0, 5.9094, 6.0603, 6.06171, 6.06172];
        assert!(check_convergence_history(&converged, 4, 1e-3, 50).valid);

        let stuck = [1.0, 2.0, 3.0];
        assert_eq!(
            check_convergence_history(&stuck, 50, 1e-3, 50).code,
            Some(ErrorCode::NoConvergence)
        );

        let growing = [1.0, 1.1, 1.5];
        assert_eq!(
            check_convergence_history(&growing, 2, 1e-3, 50).code,
            Some(ErrorCode::PossibleDivergence)
        );

        let broken = [1.0, f64::NAN];
        assert_eq!(check_convergence_history(&broken, 1, 1e-3, 50).code, Some(ErrorCode::InvalidFs));

        assert!(check_convergence_history(&[1.0], 0, 1e-3, 50).valid);
    }

    #[test]
    fn test_factor_of_safety_bounds() {
        let l = limits();
        assert_eq!(check_factor_of_safety(0.0, &l).code, Some(ErrorCode::NonPositiveFs));
        assert_eq!(check_factor_of_safety(f64::INFINITY, &l).code, Some(ErrorCode::InvalidFs));
        assert_eq!(check_factor_of_safety(12.0, &l).code, Some(ErrorCode::FsTooHigh));

        let ok = check_factor_of_safety(1.3, &l);
        assert!(ok.valid);
        assert!(ok.message.contains("Stable"));
    }

    #[test]
    fn test_collect_gathers_warnings() {
        let mut warnings = Vec::new();
        let outcomes = vec![
            ValidationOutcome::ok("fine"),
            ValidationOutcome::warning(ErrorCode::SliceInTension, "tension", Some(-1.0)),
        ];
        collect(outcomes, &mut warnings).unwrap();
        assert_eq!(warnings, vec!["tension".to_string()]);

        let failing = vec![ValidationOutcome::invalid(ErrorCode::PhiOutOfRange, "phi", Some(60.0))];
        let err = collect(failing, &mut warnings).unwrap_err();
        assert_eq!(err.error_code(), "PHI_FUERA_RANGO");
    }
}
