//! # Slice Discretization
//!
//! Splits the sliding mass above a failure circle into vertical slices of
//! equal width and computes the mechanical attributes each solver consumes.
//!
//! ## Procedure
//!
//! 1. Effective x-range = circle span ∩ profile span
//! 2. `n` slices of width Δx = range / n, centered at x_start + (i + ½)Δx
//! 3. Per slice: height h = y_terrain − y_circle(lower), α, arc length ΔL,
//!    weight W = γ·h·Δx, pore pressure u at the base
//! 4. Slices that cannot be built (h ≤ 0, |α| too steep, outside the circle)
//!    are discarded and counted

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{CalcError, CalcResult, ErrorCode};
use crate::geometry::circle::{arc_length, base_angle, circle_y, CircleBranch, FailureCircle};
use crate::geometry::profile::{interpolate_terrain, TerrainProfile};
use crate::materials::Stratum;
use crate::settings::GeometrySettings;
use crate::units::{Degrees, Radians, UNIT_THICKNESS_M};

/// Fewest slices a discretization may request. `limits.min_slices` applies
/// separately to the slices left after discards.
pub const MIN_SLICES: usize = 3;

/// Geometric description of one slice, input to [`Slice::new`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceGeometry {
    pub index: usize,
    pub x_center_m: f64,
    pub width_m: f64,
    pub height_m: f64,
    pub alpha_rad: f64,
    pub arc_length_m: f64,
    pub y_surface_m: f64,
    pub y_base_m: f64,
}

/// One vertical slice of the sliding mass (unit thickness).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slice {
    /// Position in the requested discretization (0-based, counts discarded slices)
    pub index: usize,
    pub x_center_m: f64,
    /// Δx
    pub width_m: f64,
    pub height_m: f64,
    /// Base inclination α, signed
    pub alpha_rad: f64,
    pub cohesion_kpa: f64,
    pub phi_deg: f64,
    pub gamma_kn_m3: f64,
    /// W = γ·h·Δx
    pub weight_kn: f64,
    /// u at the base
    pub pore_pressure_kpa: f64,
    /// ΔL
    pub arc_length_m: f64,
    pub y_surface_m: f64,
    pub y_base_m: f64,
    /// N' = W·cosα − u·ΔL
    pub effective_normal_kn: f64,
    /// N' < 0
    pub in_tension: bool,
}

impl Slice {
    /// Build a validated slice.
    ///
    /// Rejects Δx ≤ 0, h ≤ 0, ΔL ≤ 0, negative pore pressure and
    /// |α| > `max_base_angle_deg`. Soil parameters are copied from `stratum`.
    pub fn new(
        geometry: SliceGeometry,
        stratum: &Stratum,
        pore_pressure_kpa: f64,
        max_base_angle_deg: f64,
    ) -> CalcResult<Self> {
        let g = geometry;
        if !(g.width_m > 0.0) {
            return Err(CalcError::validation(
                ErrorCode::InvalidWidth,
                format!("Slice width must be > 0, got {}", g.width_m),
                Some(g.width_m),
            ));
        }
        if !(g.height_m > 0.0) {
            return Err(CalcError::validation(
                ErrorCode::InvalidHeight,
                format!("Slice height must be > 0, got {}", g.height_m),
                Some(g.height_m),
            ));
        }
        let alpha_deg = g.alpha_rad.to_degrees();
        if !(alpha_deg.abs() <= max_base_angle_deg) {
            return Err(CalcError::validation(
                ErrorCode::AlphaOutOfRange,
                format!("Base angle {:.1} deg exceeds {:.1} deg", alpha_deg, max_base_angle_deg),
                Some(alpha_deg),
            ));
        }
        if !(g.arc_length_m > 0.0) {
            return Err(CalcError::invalid_input(
                "arc_length_m",
                g.arc_length_m.to_string(),
                "Arc length must be positive",
            ));
        }
        if !(pore_pressure_kpa >= 0.0 && pore_pressure_kpa.is_finite()) {
            return Err(CalcError::invalid_input(
                "pore_pressure_kpa",
                pore_pressure_kpa.to_string(),
                "Pore pressure must be finite and non-negative",
            ));
        }
        stratum.validate()?;

        let weight_kn = stratum.gamma_kn_m3 * g.height_m * g.width_m * UNIT_THICKNESS_M;
        let effective_normal_kn = weight_kn * g.alpha_rad.cos() - pore_pressure_kpa * g.arc_length_m;

        Ok(Slice {
            index: g.index,
            x_center_m: g.x_center_m,
            width_m: g.width_m,
            height_m: g.height_m,
            alpha_rad: g.alpha_rad,
            cohesion_kpa: stratum.cohesion_kpa,
            phi_deg: stratum.phi_deg,
            gamma_kn_m3: stratum.gamma_kn_m3,
            weight_kn,
            pore_pressure_kpa,
            arc_length_m: g.arc_length_m,
            y_surface_m: g.y_surface_m,
            y_base_m: g.y_base_m,
            effective_normal_kn,
            in_tension: effective_normal_kn < 0.0,
        })
    }

    pub fn sin_alpha(&self) -> f64 {
        self.alpha_rad.sin()
    }

    pub fn cos_alpha(&self) -> f64 {
        self.alpha_rad.cos()
    }

    pub fn tan_alpha(&self) -> f64 {
        self.alpha_rad.tan()
    }

    pub fn tan_phi(&self) -> f64 {
        Degrees(self.phi_deg).tan()
    }

    pub fn alpha_degrees(&self) -> f64 {
        Degrees::from(Radians(self.alpha_rad)).0
    }

    /// Recompute N' = W·cosα − u·ΔL from the stored attributes
    pub fn effective_normal_force(&self) -> f64 {
        self.weight_kn * self.cos_alpha() - self.pore_pressure_kpa * self.arc_length_m
    }

    /// Fellenius driving component W·sinα
    pub fn driving_force(&self) -> f64 {
        self.weight_kn * self.sin_alpha()
    }
}

/// Output of [`build_slices`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceSet {
    /// Surviving slices, x-centers strictly increasing
    pub slices: Vec<Slice>,
    /// Slices of the requested discretization that could not be built
    pub discarded: usize,
    pub x_start_m: f64,
    pub x_end_m: f64,
    pub slice_width_m: f64,
    /// Number of slices requested
    pub requested: usize,
}

impl SliceSet {
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn total_weight_kn(&self) -> f64 {
        self.slices.iter().map(|s| s.weight_kn).sum()
    }

    /// Indices (into `slices`) of slices with N' < 0
    pub fn tension_indices(&self) -> Vec<usize> {
        self.slices
            .iter()
            .enumerate()
            .filter(|(_, s)| s.in_tension)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Height of the slice centered at `x`: terrain elevation minus the lower
/// circle elevation.
pub fn slice_height(x: f64, profile: &TerrainProfile, circle: &FailureCircle) -> CalcResult<f64> {
    let y_terrain = interpolate_terrain(x, profile)?;
    let y_circle = circle_y(x, circle, CircleBranch::Lower).ok_or_else(|| {
        CalcError::geometry_with_value(
            ErrorCode::OutsideCircle,
            format!("x = {:.3} m lies outside the failure circle", x),
            x,
        )
    })?;
    let height = y_terrain - y_circle;
    if !(height > 0.0) {
        return Err(CalcError::validation(
            ErrorCode::InvalidHeight,
            format!(
                "Non-positive slice height at x = {:.3} m: terrain {:.3}, circle {:.3}",
                x, y_terrain, y_circle
            ),
            Some(height),
        ));
    }
    Ok(height)
}

/// Pore pressure at a slice base, γw·(y_water − y_base) clamped at zero.
///
/// A slice outside the water table's x-span is treated as dry.
pub fn pore_pressure(x: f64, y_base_m: f64, water_table: Option<&TerrainProfile>, gamma_water_kn_m3: f64) -> f64 {
    let Some(water_table) = water_table else {
        return 0.0;
    };
    match interpolate_terrain(x, water_table) {
        Ok(y_water) => (gamma_water_kn_m3 * (y_water - y_base_m)).max(0.0),
        Err(_) => {
            debug!(x, "slice outside water table span, treated as dry");
            0.0
        }
    }
}

/// Discretize the sliding mass into `num_slices` slices.
///
/// # Errors
///
/// - `InvalidInput` when `num_slices` is below [`MIN_SLICES`]
/// - Geometry `SIN_INTERSECCION` when circle and profile spans do not overlap
/// - Geometry `SIN_DOVELAS_VALIDAS` when every slice is discarded
///
/// # Example
///
/// ```rust
/// use slope_core::geometry::{build_slices, FailureCircle, TerrainProfile};
/// use slope_core::materials::Stratum;
/// use slope_core::settings::GeometrySettings;
///
/// let circle = FailureCircle::new(15.0, 5.0, 30.0).unwrap();
/// let terrain = TerrainProfile::new(vec![(0.0, 10.0), (10.0, 10.0), (20.0, 0.0), (40.0, 0.0)]).unwrap();
/// let soil = Stratum::new("Clay", 20.0, 20.0, 18.0).unwrap();
///
/// let set = build_slices(&circle, &terrain, &soil, 8, None, &GeometrySettings::default()).unwrap();
/// assert_eq!(set.len(), 8);
/// assert_eq!(set.discarded, 0);
/// ```
pub fn build_slices(
    circle: &FailureCircle,
    profile: &TerrainProfile,
    stratum: &Stratum,
    num_slices: usize,
    water_table: Option<&TerrainProfile>,
    settings: &GeometrySettings,
) -> CalcResult<SliceSet> {
    if num_slices < MIN_SLICES {
        return Err(CalcError::invalid_input(
            "num_slices",
            num_slices.to_string(),
            format!("At least {} slices are required", MIN_SLICES),
        ));
    }

    let (circle_lo, circle_hi) = circle.x_span();
    let (profile_lo, profile_hi) = profile.x_span();
    let x_start = circle_lo.max(profile_lo);
    let x_end = circle_hi.min(profile_hi);
    if !(x_start < x_end) {
        return Err(CalcError::geometry_with_value(
            ErrorCode::NoIntersection,
            format!(
                "Circle span [{:.2}, {:.2}] does not overlap profile span [{:.2}, {:.2}]",
                circle_lo, circle_hi, profile_lo, profile_hi
            ),
            x_end - x_start,
        ));
    }

    let width = (x_end - x_start) / num_slices as f64;
    let mut slices = Vec::with_capacity(num_slices);
    let mut discarded = 0;

    for index in 0..num_slices {
        let x = x_start + (index as f64 + 0.5) * width;
        match build_one(index, x, width, circle, profile, stratum, water_table, settings) {
            Ok(slice) => slices.push(slice),
            Err(e) => {
                debug!(index, x, code = e.error_code(), "slice discarded: {}", e);
                discarded += 1;
            }
        }
    }

    if slices.is_empty() {
        return Err(CalcError::geometry_with_value(
            ErrorCode::NoValidSlices,
            format!(
                "None of the {} slices between x = {:.2} and x = {:.2} m lies below the terrain",
                num_slices, x_start, x_end
            ),
            num_slices as f64,
        ));
    }

    debug!(built = slices.len(), discarded, width, "slices built");

    Ok(SliceSet {
        slices,
        discarded,
        x_start_m: x_start,
        x_end_m: x_end,
        slice_width_m: width,
        requested: num_slices,
    })
}

#[allow(clippy::too_many_arguments)]
fn build_one(
    index: usize,
    x: f64,
    width: f64,
    circle: &FailureCircle,
    profile: &TerrainProfile,
    stratum: &Stratum,
    water_table: Option<&TerrainProfile>,
    settings: &GeometrySettings,
) -> CalcResult<Slice> {
    let height = slice_height(x, profile, circle)?;
    let y_surface = interpolate_terrain(x, profile)?;
    let y_base = y_surface - height;
    let alpha = base_angle(x, circle);
    let arc = arc_length(x - width / 2.0, x + width / 2.0, circle);
    let u = pore_pressure(x, y_base, water_table, settings.gamma_water_kn_m3);

    Slice::new(
        SliceGeometry {
            index,
            x_center_m: x,
            width_m: width,
            height_m: height,
            alpha_rad: alpha,
            arc_length_m: arc,
            y_surface_m: y_surface,
            y_base_m: y_base,
        },
        stratum,
        u,
        settings.max_base_angle_deg,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> (FailureCircle, TerrainProfile, Stratum) {
        (
            FailureCircle::new(15.0, 5.0, 30.0).unwrap(),
            TerrainProfile::new(vec![(0.0, 10.0), (10.0, 10.0), (20.0, 0.0), (40.0, 0.0)]).unwrap(),
            Stratum::new("Clay", 20.0, 20.0, 18.0).unwrap(),
        )
    }

    #[test]
    fn test_scenario_slices() {
        let (circle, terrain, soil) = scenario();
        let set = build_slices(&circle, &terrain, &soil, 8, None, &GeometrySettings::default()).unwrap();

        assert_eq!(set.len(), 8);
        assert_eq!(set.discarded, 0);
        assert_eq!(set.requested, 8);
        assert!((set.x_start_m).abs() < 1e-12);
        assert!((set.x_end_m - 40.0).abs() < 1e-12);
        assert!((set.slice_width_m - 5.0).abs() < 1e-12);

        let expected_h = [32.27, 34.05, 32.40, 27.40, 24.05, 22.27, 19.37, 14.84];
        let expected_alpha = [-24.6, -14.5, -4.8, 4.8, 14.5, 24.6, 35.7, 48.6];
        for (i, s) in set.slices.iter().enumerate() {
            assert!((s.height_m - expected_h[i]).abs() < 0.01, "h[{}] = {}", i, s.height_m);
            assert!((s.alpha_degrees() - expected_alpha[i]).abs() < 0.05, "a[{}] = {}", i, s.alpha_degrees());
            assert!((s.weight_kn - 18.0 * s.height_m * 5.0).abs() < 1e-9);
            assert!(s.arc_length_m > s.width_m);
            assert_eq!(s.pore_pressure_kpa, 0.0);
            assert!(!s.in_tension);
        }
    }

    #[test]
    fn test_slices_strictly_ordered() {
        let (circle, terrain, soil) = scenario();
        let set = build_slices(&circle, &terrain, &soil, 25, None, &GeometrySettings::default()).unwrap();
        assert!(set.slices.windows(2).all(|w| w[0].x_center_m < w[1].x_center_m));
    }

    #[test]
    fn test_no_intersection() {
        let (_, terrain, soil) = scenario();
        let far = FailureCircle::new(100.0, 5.0, 10.0).unwrap();
        let err = build_slices(&far, &terrain, &soil, 8, None, &GeometrySettings::default()).unwrap_err();
        assert_eq!(err.error_code(), "SIN_INTERSECCION");
        assert!(err.is_geometry_error());
    }

    #[test]
    fn test_circle_above_terrain_has_no_slices() {
        let (_, terrain, soil) = scenario();
        let high = FailureCircle::new(15.0, 50.0, 10.0).unwrap();
        let err = build_slices(&high, &terrain, &soil, 8, None, &GeometrySettings::default()).unwrap_err();
        assert_eq!(err.error_code(), "SIN_DOVELAS_VALIDAS");
    }

    #[test]
    fn test_discarded_slices_counted() {
        let flat = TerrainProfile::new(vec![(0.0, 10.0), (20.0, 10.0)]).unwrap();
        let circle = FailureCircle::new(10.0, 15.0, 10.0).unwrap();
        let soil = Stratum::new("Clay", 20.0, 20.0, 18.0).unwrap();
        let set = build_slices(&circle, &flat, &soil, 10, None, &GeometrySettings::default()).unwrap();
        assert_eq!(set.len(), 8);
        assert_eq!(set.discarded, 2);
        assert_eq!(set.slices[0].index, 1);
    }

    #[test]
    fn test_too_few_slices_rejected() {
        let (circle, terrain, soil) = scenario();
        for n in 0..MIN_SLICES {
            let err = build_slices(&circle, &terrain, &soil, n, None, &GeometrySettings::default()).unwrap_err();
            assert_eq!(err.error_code(), "ENTRADA_INVALIDA");
        }
        let set = build_slices(&circle, &terrain, &soil, MIN_SLICES, None, &GeometrySettings::default()).unwrap();
        assert_eq!(set.len() + set.discarded, MIN_SLICES);
    }

    #[test]
    fn test_pore_pressure() {
        let wt = TerrainProfile::horizontal(0.0, 40.0, 5.0).unwrap();
        assert!((pore_pressure(10.0, 2.0, Some(&wt), 9.81) - 29.43).abs() < 1e-9);
        assert_eq!(pore_pressure(10.0, 6.0, Some(&wt), 9.81), 0.0);
        assert_eq!(pore_pressure(50.0, -10.0, Some(&wt), 9.81), 0.0);
        assert_eq!(pore_pressure(10.0, -10.0, None, 9.81), 0.0);
    }

    #[test]
    fn test_water_table_creates_tension() {
        let (circle, terrain, _) = scenario();
        let soil = Stratum::new("Clay", 100.0, 20.0, 18.0).unwrap();
        let wt = TerrainProfile::horizontal(0.0, 40.0, 40.0).unwrap();
        let set = build_slices(&circle, &terrain, &soil, 8, Some(&wt), &GeometrySettings::default()).unwrap();
        assert_eq!(set.tension_indices().len(), 8);
        for s in &set.slices {
            assert!((s.effective_normal_force() - s.effective_normal_kn).abs() < 1e-9);
        }
    }

    #[test]
    fn test_slice_height_errors() {
        let (circle, terrain, _) = scenario();
        assert!((slice_height(2.5, &terrain, &circle).unwrap() - 32.27).abs() < 0.01);
        assert!(slice_height(-1.0, &terrain, &circle).is_err());

        let small = FailureCircle::new(30.0, 0.0, 2.0).unwrap();
        let err = slice_height(35.0, &terrain, &small).unwrap_err();
        assert_eq!(err.error_code(), "FUERA_DEL_CIRCULO");
    }

    #[test]
    fn test_slice_rejects_steep_base() {
        let soil = Stratum::new("Clay", 20.0, 20.0, 18.0).unwrap();
        let geometry = SliceGeometry {
            index: 0,
            x_center_m: 0.0,
            width_m: 1.0,
            height_m: 2.0,
            alpha_rad: 85.0_f64.to_radians(),
            arc_length_m: 5.0,
            y_surface_m: 2.0,
            y_base_m: 0.0,
        };
        let err = Slice::new(geometry, &soil, 0.0, 80.0).unwrap_err();
        assert_eq!(err.error_code(), "ANGULO_ALPHA_FUERA_RANGO");
        assert!(Slice::new(geometry, &soil, 0.0, 89.0).is_ok());

        let flat = SliceGeometry { height_m: 0.0, alpha_rad: 0.0, ..geometry };
        assert_eq!(Slice::new(flat, &soil, 0.0, 80.0).unwrap_err().error_code(), "ALTURA_INVALIDA");
    }
}
