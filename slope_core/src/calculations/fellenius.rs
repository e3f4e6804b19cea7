//! # Fellenius (Ordinary) Method of Slices
//!
//! Direct, non-iterative limit-equilibrium analysis of a slip circle.
//! Interslice forces are neglected and moments are taken about the circle
//! center, so the radius cancels:
//!
//! ```text
//!        Σ max(0, c'·ΔL + (W·cosα − u·ΔL)·tanφ')
//! FS = ─────────────────────────────────────────
//!                    |Σ W·sinα|
//! ```
//!
//! ## Example
//!
//! ```rust
//! use slope_core::calculations::{fellenius, AnalysisInput};
//! use slope_core::settings::AnalysisSettings;
//!
//! let input = AnalysisInput::demo().unwrap();
//! let result = fellenius::analyze_fellenius(&input, &AnalysisSettings::default()).unwrap();
//! assert!((result.factor_of_safety - 5.18).abs() < 0.01);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::calculations::{discarded_warning, prepare, AnalysisInput, StabilityClass, DEGENERATE_DRIVING_RATIO};
use crate::errors::{CalcError, CalcResult, ErrorCode};
use crate::geometry::{FailureCircle, Slice, SliceSet};
use crate::settings::AnalysisSettings;
use crate::validation::{check_factor_of_safety, check_slice, check_slice_set, collect};

/// Fellenius analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FelleniusResult {
    pub factor_of_safety: f64,
    pub classification: StabilityClass,

    /// ΣR·r in kN·m
    pub resisting_moment_knm: f64,
    /// |ΣD|·r in kN·m
    pub driving_moment_knm: f64,
    pub sum_resisting_kn: f64,
    /// |Σ W·sinα|
    pub sum_driving_kn: f64,

    pub slices: Vec<Slice>,
    pub resisting_forces_kn: Vec<f64>,
    /// Signed W·sinα per slice
    pub driving_forces_kn: Vec<f64>,

    /// Positions in `slices` with N' < 0
    pub tension_slices: Vec<usize>,
    pub discarded_slices: usize,

    pub is_valid: bool,
    pub warnings: Vec<String>,
}

/// Shear resistance of one slice, c'·ΔL + N'·tanφ' floored at zero.
pub fn resisting_force(slice: &Slice) -> f64 {
    let cohesion = slice.cohesion_kpa * slice.arc_length_m;
    let friction = slice.effective_normal_force() * slice.tan_phi();
    (cohesion + friction).max(0.0)
}

/// Driving component W·sinα (signed).
pub fn driving_force(slice: &Slice) -> f64 {
    slice.driving_force()
}

/// Fellenius solver over an already discretized slice set.
///
/// `warnings` carries any findings from earlier stages and is extended.
pub fn solve(
    slice_set: &SliceSet,
    circle: &FailureCircle,
    settings: &AnalysisSettings,
    mut warnings: Vec<String>,
) -> CalcResult<FelleniusResult> {
    let limits = &settings.limits;
    let slices = &slice_set.slices;

    collect([check_slice_set(slices, limits)], &mut warnings)?;
    collect(slices.iter().map(|s| check_slice(s, limits)), &mut warnings)?;
    warnings.extend(discarded_warning(slice_set));

    let resisting_forces_kn: Vec<f64> = slices.iter().map(resisting_force).collect();
    let driving_forces_kn: Vec<f64> = slices.iter().map(driving_force).collect();
    let sum_resisting: f64 = resisting_forces_kn.iter().sum();
    let sum_driving: f64 = driving_forces_kn.iter().sum::<f64>().abs();

    if sum_driving <= DEGENERATE_DRIVING_RATIO * slice_set.total_weight_kn() {
        return Err(CalcError::geometry_with_value(
            ErrorCode::ZeroDrivingForce,
            format!(
                "Net driving force is zero (|sum W sin a| = {:.3e} kN): the circle has no sliding direction",
                sum_driving
            ),
            sum_driving,
        ));
    }

    let fs = sum_resisting / sum_driving;
    check_factor_of_safety(fs, limits).into_result()?;

    let tension_slices = slice_set.tension_indices();
    let mut is_valid = true;
    if fs < limits.fs_very_low {
        warnings.push(format!("Very low factor of safety ({:.3}): check input data", fs));
        is_valid = false;
    }
    if tension_slices.len() as f64 / slices.len() as f64 > limits.max_tension_fraction {
        warn!(tension = tension_slices.len(), slices = slices.len(), "Excessive tension in Fellenius slices");
        is_valid = false;
    }

    Ok(FelleniusResult {
        factor_of_safety: fs,
        classification: StabilityClass::from_fs(fs),
        resisting_moment_knm: sum_resisting * circle.radius_m,
        driving_moment_knm: sum_driving * circle.radius_m,
        sum_resisting_kn: sum_resisting,
        sum_driving_kn: sum_driving,
        slices: slices.clone(),
        resisting_forces_kn,
        driving_forces_kn,
        tension_slices,
        discarded_slices: slice_set.discarded,
        is_valid,
        warnings,
    })
}

/// Full Fellenius analysis: validation, discretization and solution.
pub fn analyze_fellenius(input: &AnalysisInput, settings: &AnalysisSettings) -> CalcResult<FelleniusResult> {
    let (slice_set, warnings) = prepare(input, settings)?;
    let result = solve(&slice_set, &input.circle, settings, warnings)?;
    info!(
        label = %input.label,
        fs = result.factor_of_safety,
        slices = result.slices.len(),
        valid = result.is_valid,
        "Fellenius analysis complete"
    );
    Ok(result)
}
