//! # Bishop Modified Method
//!
//! Iterative limit-equilibrium analysis of a slip circle. Vertical force
//! equilibrium per slice gives the correction factor
//!
//! ```text
//! mα = cosα + sinα·tanφ' / FS
//! ```
//!
//! and FS is the fixed point of
//!
//! ```text
//!        Σ max(0, [c'·ΔL + (W − u·ΔL)·tanφ'] / mα)
//! FS = ─────────────────────────────────────────────
//!                     |Σ W·sinα|
//! ```
//!
//! ## Iteration
//!
//! ```text
//! Init(FS₀) ─► Iterate ─┬─ |ΔFS| < tol ──────► Converged
//!                       ├─ mα ≤ 0 ───────────► M_ALPHA_NO_POSITIVO (raised)
//!                       └─ k = max_iterations ► NO_CONVERGENCIA (raised)
//! ```
//!
//! A non-fatal warning is recorded once when the last three estimates
//! oscillate by more than `divergence_span` after `divergence_check_after`
//! iterations.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::calculations::{discarded_warning, prepare, AnalysisInput, StabilityClass, DEGENERATE_DRIVING_RATIO};
use crate::errors::{CalcError, CalcResult, ErrorCode};
use crate::geometry::{FailureCircle, Slice, SliceSet};
use crate::settings::AnalysisSettings;
use crate::validation::{
    check_convergence_history, check_factor_of_safety, check_low_m_alpha, check_slice_set, collect,
};

/// Bishop Modified analysis result.
///
/// Only converged analyses produce a result; `converged` is always true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BishopResult {
    pub factor_of_safety: f64,
    pub classification: StabilityClass,

    pub resisting_moment_knm: f64,
    pub driving_moment_knm: f64,
    pub sum_resisting_kn: f64,
    pub sum_driving_kn: f64,

    pub slices: Vec<Slice>,
    pub resisting_forces_kn: Vec<f64>,
    pub driving_forces_kn: Vec<f64>,
    /// mα per slice at the last iteration
    pub m_alpha: Vec<f64>,

    pub tension_slices: Vec<usize>,
    /// Positions in `slices` with mα below the low threshold
    pub low_m_alpha_slices: Vec<usize>,
    pub discarded_slices: usize,

    /// Completed iterations
    pub iterations: usize,
    pub converged: bool,
    /// FS estimates, initial value first
    pub fs_history: Vec<f64>,
    pub initial_fs: f64,
    pub tolerance: f64,
    /// |FS_k − FS_k−1| of the last iteration
    pub final_delta: f64,

    pub is_valid: bool,
    pub warnings: Vec<String>,
}

/// State after one fixed-point step.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationState {
    /// Updated FS estimate
    pub factor_of_safety: f64,
    pub resisting_forces_kn: Vec<f64>,
    pub driving_forces_kn: Vec<f64>,
    pub m_alpha: Vec<f64>,
    pub sum_resisting_kn: f64,
    /// |Σ W·sinα|
    pub sum_driving_kn: f64,
}

/// Bishop correction factor mα = cosα + sinα·tanφ'/FS.
///
/// # Errors
///
/// - `FS_NO_POSITIVO` when `fs` is not a positive finite number
/// - `CalcError::NonPositiveMAlpha` when mα ≤ 0
pub fn m_alpha(slice: &Slice, fs: f64) -> CalcResult<f64> {
    if !(fs.is_finite() && fs > 0.0) {
        return Err(CalcError::validation(
            ErrorCode::NonPositiveFs,
            format!("FS estimate must be positive and finite, got {}", fs),
            Some(fs),
        ));
    }
    let m = slice.cos_alpha() + slice.sin_alpha() * slice.tan_phi() / fs;
    if m <= 0.0 {
        return Err(CalcError::NonPositiveMAlpha {
            slice: slice.index,
            x_m: slice.x_center_m,
            alpha_deg: slice.alpha_degrees(),
            fs,
            m_alpha: m,
        });
    }
    Ok(m)
}

/// Resistance of one slice for a given mα, floored at zero.
pub fn resisting_force(slice: &Slice, m_alpha: f64) -> f64 {
    let cohesion = slice.cohesion_kpa * slice.arc_length_m;
    let friction = (slice.weight_kn - slice.pore_pressure_kpa * slice.arc_length_m) * slice.tan_phi();
    ((cohesion + friction) / m_alpha).max(0.0)
}

/// One fixed-point step from estimate `fs`.
pub fn iterate(slices: &[Slice], fs: f64) -> CalcResult<IterationState> {
    let m_alpha: Vec<f64> = slices.iter().map(|s| m_alpha(s, fs)).collect::<CalcResult<_>>()?;
    let resisting_forces_kn: Vec<f64> = slices
        .iter()
        .zip(&m_alpha)
        .map(|(s, m)| resisting_force(s, *m))
        .collect();
    let driving_forces_kn: Vec<f64> = slices.iter().map(Slice::driving_force).collect();

    let sum_resisting_kn: f64 = resisting_forces_kn.iter().sum();
    let sum_driving_kn = driving_forces_kn.iter().sum::<f64>().abs();
    let total_weight: f64 = slices.iter().map(|s| s.weight_kn).sum();
    if sum_driving_kn <= DEGENERATE_DRIVING_RATIO * total_weight {
        return Err(CalcError::geometry_with_value(
            ErrorCode::ZeroDrivingForce,
            format!("Net driving force is zero (|sum W sin a| = {:.3e} kN)", sum_driving_kn),
            sum_driving_kn,
        ));
    }

    Ok(IterationState {
        factor_of_safety: sum_resisting_kn / sum_driving_kn,
        resisting_forces_kn,
        driving_forces_kn,
        m_alpha,
        sum_resisting_kn,
        sum_driving_kn,
    })
}

/// Bishop solver over an already discretized slice set.
pub fn solve(
    slice_set: &SliceSet,
    circle: &FailureCircle,
    settings: &AnalysisSettings,
    mut warnings: Vec<String>,
) -> CalcResult<BishopResult> {
    let params = &settings.bishop;
    let limits = &settings.limits;
    let slices = &slice_set.slices;

    collect([check_slice_set(slices, limits)], &mut warnings)?;
    warnings.extend(discarded_warning(slice_set));

    let mut fs = params.initial_fs;
    let mut history = vec![fs];
    let mut delta = f64::INFINITY;
    let mut divergence_flagged = false;
    let mut converged_state = None;

    for k in 0..params.max_iterations {
        let state = iterate(slices, fs)?;
        delta = (state.factor_of_safety - fs).abs();
        fs = state.factor_of_safety;
        history.push(fs);
        debug!(iteration = k + 1, fs, delta, "Bishop iteration");

        if delta < params.tolerance {
            converged_state = Some(state);
            break;
        }

        if !divergence_flagged && k > params.divergence_check_after {
            let tail = &history[history.len() - 3..];
            let spread = tail.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
                - tail.iter().cloned().fold(f64::INFINITY, f64::min);
            if spread > params.divergence_span {
                warn!(iteration = k, spread, "Bishop estimates oscillating");
                warnings.push(format!(
                    "Possible divergence at iteration {}: last three estimates span {:.3}",
                    k, spread
                ));
                divergence_flagged = true;
            }
        }
    }

    let Some(state) = converged_state else {
        warn!(iterations = params.max_iterations, last_delta = delta, "Bishop did not converge");
        return Err(CalcError::NoConvergence {
            iterations: params.max_iterations,
            last_delta: delta,
        });
    };
    let iterations = history.len() - 1;

    check_convergence_history(&history, iterations, params.tolerance, params.max_iterations).into_result()?;
    check_factor_of_safety(fs, limits).into_result()?;

    let n = slices.len() as f64;
    let tension_slices = slice_set.tension_indices();
    for &i in &tension_slices {
        warnings.push(format!(
            "Slice {} in tension: N' = {:.1} kN",
            slices[i].index, slices[i].effective_normal_kn
        ));
    }
    let low_m_alpha_slices: Vec<usize> = state
        .m_alpha
        .iter()
        .enumerate()
        .filter(|(_, m)| **m < limits.low_m_alpha)
        .map(|(i, _)| i)
        .collect();
    for &i in &low_m_alpha_slices {
        warnings.push(format!("Slice {} with low m_alpha: {:.3}", slices[i].index, state.m_alpha[i]));
    }

    let mut is_valid = true;
    if fs < limits.fs_very_low {
        warnings.push(format!("Very low factor of safety ({:.3}): check input data", fs));
        is_valid = false;
    }
    if tension_slices.len() as f64 / n > limits.max_tension_fraction {
        warn!(tension = tension_slices.len(), slices = slices.len(), "Excessive tension in Bishop slices");
        is_valid = false;
    }
    let m_alpha_check = check_low_m_alpha(&state.m_alpha, limits);
    if !m_alpha_check.valid {
        warn!(low = low_m_alpha_slices.len(), slices = slices.len(), "Many Bishop slices with low m_alpha");
        warnings.push(m_alpha_check.message);
        is_valid = false;
    }

    Ok(BishopResult {
        factor_of_safety: fs,
        classification: StabilityClass::from_fs(fs),
        resisting_moment_knm: state.sum_resisting_kn * circle.radius_m,
        driving_moment_knm: state.sum_driving_kn * circle.radius_m,
        sum_resisting_kn: state.sum_resisting_kn,
        sum_driving_kn: state.sum_driving_kn,
        slices: slices.clone(),
        resisting_forces_kn: state.resisting_forces_kn,
        driving_forces_kn: state.driving_forces_kn,
        m_alpha: state.m_alpha,
        tension_slices,
        low_m_alpha_slices,
        discarded_slices: slice_set.discarded,
        iterations,
        converged: true,
        fs_history: history,
        initial_fs: params.initial_fs,
        tolerance: params.tolerance,
        final_delta: delta,
        is_valid,
        warnings,
    })
}

/// Full Bishop Modified analysis: validation, discretization and iteration.
pub fn analyze_bishop(input: &AnalysisInput, settings: &AnalysisSettings) -> CalcResult<BishopResult> {
    let (slice_set, warnings) = prepare(input, settings)?;
    let result = solve(&slice_set, &input.circle, settings, warnings)?;
    info!(
        label = %input.label,
        fs = result.factor_of_safety,
        iterations = result.iterations,
        valid = result.is_valid,
        "Bishop analysis complete"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{SliceGeometry, TerrainProfile};
    use crate::materials::Stratum;

    fn scenario(c: f64, phi: f64) -> AnalysisInput {
        AnalysisInput::new(
            "test",
            FailureCircle::new(15.0, 5.0, 30.0).unwrap(),
            TerrainProfile::new(vec![(0.0, 10.0), (10.0, 10.0), (20.0, 0.0), (40.0, 0.0)]).unwrap(),
            Stratum::new("soil", c, phi, 18.0).unwrap(),
        )
        .with_num_slices(8)
    }

    fn single_slice(alpha_deg: f64, phi_deg: f64) -> Slice {
        let soil = Stratum::new("s", 10.0, phi_deg, 18.0).unwrap();
        Slice::new(
            SliceGeometry {
                index: 3,
                x_center_m: 2.0,
                width_m: 1.0,
                height_m: 2.0,
                alpha_rad: alpha_deg.to_radians(),
                arc_length_m: 1.5,
                y_surface_m: 2.0,
                y_base_m: 0.0,
            },
            &soil,
            0.0,
            80.0,
        )
        .unwrap()
    }

    #[test]
    fn test_scenario_converges() {
        let result = analyze_bishop(&scenario(20.0, 20.0), &AnalysisSettings::default()).unwrap();
        assert!((result.factor_of_safety - 6.0617).abs() < 0.001);
        assert_eq!(result.iterations, 4);
        assert!(result.converged);
        assert_eq!(result.fs_history.len(), 5);
        assert_eq!(result.fs_history[0], 1.0);
        assert!((result.fs_history[1] - 5.9094).abs() < 0.001);
        assert!(result.final_delta < 1e-3);
        assert!(result.is_valid);
        assert!(result.low_m_alpha_slices.is_empty());
        let min_m = result.m_alpha.iter().cloned().fold(f64::INFINITY, f64::min);
        assert!((min_m - 0.706).abs() < 0.01);
    }

    #[test]
    fn test_scenario_weak_soil() {
        let result = analyze_bishop(&scenario(0.6, 4.0), &AnalysisSettings::default()).unwrap();
        assert!((result.factor_of_safety - 1.0438).abs() < 0.001);
        assert!(result.factor_of_safety > 1.0 && result.factor_of_safety < 1.3);
        assert_eq!(result.iterations, 2);
    }

    #[test]
    fn test_convergence_law() {
        let result = analyze_bishop(&scenario(20.0, 20.0), &AnalysisSettings::default()).unwrap();
        let n = result.fs_history.len();
        assert!((result.fs_history[n - 1] - result.fs_history[n - 2]).abs() < result.tolerance);
        assert_eq!(result.fs_history[n - 1], result.factor_of_safety);
    }

    #[test]
    fn test_iteration_cap_raises() {
        let mut settings = AnalysisSettings::default();
        settings.bishop.max_iterations = 2;
        let err = analyze_bishop(&scenario(20.0, 20.0), &settings).unwrap_err();
        assert_eq!(err.error_code(), "NO_CONVERGENCIA");
        match err {
            CalcError::NoConvergence { iterations, last_delta } => {
                assert_eq!(iterations, 2);
                assert!(last_delta > 1e-3);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_water_table() {
        let input = scenario(20.0, 20.0).with_water_table(TerrainProfile::horizontal(0.0, 40.0, 5.0).unwrap());
        let result = analyze_bishop(&input, &AnalysisSettings::default()).unwrap();
        assert!((result.factor_of_safety - 2.61).abs() < 0.01);
        assert_eq!(result.iterations, 3);
        assert_eq!(result.tension_slices.len(), 2);
        assert!(result.is_valid);
    }

    #[test]
    fn test_excess_tension_marks_invalid() {
        let input = scenario(100.0, 20.0).with_water_table(TerrainProfile::horizontal(0.0, 40.0, 40.0).unwrap());
        let result = analyze_bishop(&input, &AnalysisSettings::default()).unwrap();
        assert!((result.factor_of_safety - 1.3009).abs() < 0.01);
        assert_eq!(result.iterations, 4);
        assert!(!result.is_valid);
    }

    #[test]
    fn test_oscillation_warning_recorded_once() {
        let mut settings = AnalysisSettings::default();
        settings.bishop.divergence_check_after = 0;
        let result = analyze_bishop(&scenario(20.0, 20.0), &settings).unwrap();

        // 1.0 -> 5.909 -> 6.060 spans more than 0.5 at iteration 1
        let flagged: Vec<&String> = result.warnings.iter().filter(|w| w.contains("Possible divergence")).collect();
        assert_eq!(flagged.len(), 1);
        assert!(flagged[0].contains("iteration 1"));
        assert!(result.converged);
        assert_eq!(result.iterations, 4);
        assert!((result.factor_of_safety - 6.0617).abs() < 0.001);
        assert!(result.is_valid);

        settings.bishop.divergence_span = 6.0;
        let result = analyze_bishop(&scenario(20.0, 20.0), &settings).unwrap();
        assert!(!result.warnings.iter().any(|w| w.contains("Possible divergence")));

        let result = analyze_bishop(&scenario(20.0, 20.0), &AnalysisSettings::default()).unwrap();
        assert!(!result.warnings.iter().any(|w| w.contains("Possible divergence")));
    }

    #[test]
    fn test_single_low_m_alpha_is_warning() {
        // Converged mα: 0.884 0.953 0.992 1.002 0.983 0.934 0.847 0.706
        let mut settings = AnalysisSettings::default();
        settings.limits.low_m_alpha = 0.8;
        let result = analyze_bishop(&scenario(20.0, 20.0), &settings).unwrap();

        assert_eq!(result.low_m_alpha_slices, vec![7]);
        let index = result.slices[7].index;
        assert!(result
            .warnings
            .iter()
            .any(|w| w == &format!("Slice {} with low m_alpha: 0.706", index)));
        assert!(!result.warnings.iter().any(|w| w.starts_with("Many slices")));
        assert!(result.is_valid);
    }

    #[test]
    fn test_many_low_m_alpha_marks_invalid() {
        let mut settings = AnalysisSettings::default();
        settings.limits.low_m_alpha = 0.9;
        let result = analyze_bishop(&scenario(20.0, 20.0), &settings).unwrap();

        assert_eq!(result.low_m_alpha_slices, vec![0, 6, 7]);
        for &i in &result.low_m_alpha_slices {
            let prefix = format!("Slice {} with low m_alpha", result.slices[i].index);
            assert!(result.warnings.iter().any(|w| w.starts_with(&prefix)));
        }
        assert!(result.warnings.iter().any(|w| w == "Many slices with low m_alpha (3/8)"));
        assert!(!result.is_valid);
        assert!((result.factor_of_safety - 6.0617).abs() < 0.001);
    }

    #[test]
    fn test_circle_above_terrain_raises() {
        let mut input = scenario(20.0, 20.0);
        input.circle = FailureCircle::new(15.0, 50.0, 10.0).unwrap();
        let err = analyze_bishop(&input, &AnalysisSettings::default()).unwrap_err();
        assert_eq!(err.error_code(), "CIRCULO_SOBRE_TERRENO");
    }

    #[test]
    fn test_m_alpha() {
        let flat = single_slice(0.0, 30.0);
        assert!((m_alpha(&flat, 1.5).unwrap() - 1.0).abs() < 1e-12);

        let s = single_slice(30.0, 30.0);
        let expected = 30.0_f64.to_radians().cos() + 0.5 * 30.0_f64.to_radians().tan() / 1.5;
        assert!((m_alpha(&s, 1.5).unwrap() - expected).abs() < 1e-12);

        assert_eq!(m_alpha(&s, 0.0).unwrap_err().error_code(), "FS_NO_POSITIVO");
        assert_eq!(m_alpha(&s, f64::NAN).unwrap_err().error_code(), "FS_NO_POSITIVO");
    }

    #[test]
    fn test_non_positive_m_alpha() {
        let steep = single_slice(-45.0, 30.0);
        assert!(m_alpha(&steep, 1.0).unwrap() > 0.0);

        let err = m_alpha(&steep, 0.5).unwrap_err();
        assert_eq!(err.error_code(), "M_ALPHA_NO_POSITIVO");
        match err {
            CalcError::NonPositiveMAlpha { slice, fs, m_alpha, .. } => {
                assert_eq!(slice, 3);
                assert_eq!(fs, 0.5);
                assert!(m_alpha <= 0.0);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_iterate_raises_on_non_positive_m_alpha() {
        let slices = vec![single_slice(-45.0, 30.0), single_slice(30.0, 30.0)];
        assert!(matches!(iterate(&slices, 0.5), Err(CalcError::NonPositiveMAlpha { .. })));
        assert!(iterate(&slices, 1.0).is_ok());
    }

    #[test]
    fn test_bishop_resisting_force() {
        let s = single_slice(0.0, 0.0);
        // Purely cohesive, flat base: c'·ΔL
        assert!((resisting_force(&s, 1.0) - 15.0).abs() < 1e-12);
        assert!((resisting_force(&s, 2.0) - 7.5).abs() < 1e-12);
    }

    #[test]
    fn test_bishop_not_below_fellenius_here() {
        let input = scenario(20.0, 20.0);
        let settings = AnalysisSettings::default();
        let b = analyze_bishop(&input, &settings).unwrap();
        let f = crate::calculations::analyze_fellenius(&input, &settings).unwrap();
        assert!(b.factor_of_safety > f.factor_of_safety);
    }
}
