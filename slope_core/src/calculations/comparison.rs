//! # Method Comparison
//!
//! Runs Fellenius and Bishop Modified on the same input and summarizes how
//! far apart they are.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::calculations::bishop::{self, BishopResult};
use crate::calculations::fellenius::{self, FelleniusResult};
use crate::calculations::{prepare, AnalysisInput, Method};
use crate::errors::CalcResult;
use crate::settings::AnalysisSettings;

/// Relative difference below which both methods agree.
const AGREEMENT_PERCENT: f64 = 5.0;
/// Relative difference below which the gap is considered moderate.
const MODERATE_PERCENT: f64 = 15.0;
/// Relative difference up to which Bishop is recommended as the headline value.
const HEADLINE_PERCENT: f64 = 10.0;
/// Bishop iteration count that suggests poorly conditioned input.
const SLOW_CONVERGENCE_ITERATIONS: usize = 20;

/// Side-by-side result of both methods.
///
/// ## JSON Example
///
/// ```json
/// {
///   "fs_fellenius": 5.1845,
///   "fs_bishop": 6.0617,
///   "difference": 0.8772,
///   "difference_percent": 16.92,
///   "more_conservative": "fellenius",
///   "recommendations": ["..."],
///   "fellenius": { ... },
///   "bishop": { ... }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodComparison {
    pub fs_fellenius: f64,
    pub fs_bishop: f64,
    /// Bishop − Fellenius
    pub difference: f64,
    /// Difference relative to Fellenius, in percent
    pub difference_percent: f64,
    /// Method with the lower FS
    pub more_conservative: Method,
    pub recommendations: Vec<String>,
    pub fellenius: FelleniusResult,
    pub bishop: BishopResult,
}

impl MethodComparison {
    fn from_results(fellenius: FelleniusResult, bishop: BishopResult) -> Self {
        let fs_fellenius = fellenius.factor_of_safety;
        let fs_bishop = bishop.factor_of_safety;
        let difference = fs_bishop - fs_fellenius;
        let difference_percent = difference / fs_fellenius * 100.0;
        let more_conservative = if fs_fellenius < fs_bishop {
            Method::Fellenius
        } else {
            Method::Bishop
        };
        let recommendations = recommendations(&fellenius, &bishop, difference_percent);

        MethodComparison {
            fs_fellenius,
            fs_bishop,
            difference,
            difference_percent,
            more_conservative,
            recommendations,
            fellenius,
            bishop,
        }
    }

    /// True when the relative difference is inside the agreement band.
    pub fn methods_agree(&self) -> bool {
        self.difference_percent.abs() < AGREEMENT_PERCENT
    }
}

fn recommendations(fellenius: &FelleniusResult, bishop: &BishopResult, difference_percent: f64) -> Vec<String> {
    let mut out = Vec::new();
    let spread = difference_percent.abs();

    if bishop.iterations > SLOW_CONVERGENCE_ITERATIONS {
        out.push(format!(
            "Bishop needed {} iterations: check input parameters",
            bishop.iterations
        ));
    }

    if spread < AGREEMENT_PERCENT {
        out.push(format!("Difference below {}%: both methods are consistent", AGREEMENT_PERCENT));
    } else if spread < MODERATE_PERCENT {
        out.push("Moderate difference: prefer Bishop for accuracy".to_string());
    } else {
        out.push("Large difference: review geometry and parameters".to_string());
    }

    let tension_bishop = bishop.tension_slices.len();
    let tension_fellenius = fellenius.tension_slices.len();
    if tension_bishop > tension_fellenius {
        out.push("Bishop reports more slices in tension: problematic failure surface".to_string());
    } else if tension_bishop < tension_fellenius {
        out.push("Fellenius reports more slices in tension".to_string());
    }

    let fs_b = bishop.factor_of_safety;
    let fs_f = fellenius.factor_of_safety;
    if fs_b < 1.0 && fs_f >= 1.0 {
        out.push("Only Bishop indicates instability: critical review needed".to_string());
    } else if fs_b >= 1.0 && fs_f < 1.0 {
        out.push("Only Fellenius indicates instability: confirm with Bishop".to_string());
    }

    let headline = match (bishop.is_valid, fellenius.is_valid) {
        (true, true) if spread < HEADLINE_PERCENT => "Use Bishop as the governing result",
        (true, true) => "Investigate the cause of the large difference",
        (true, false) => "Use Bishop only (Fellenius result invalid)",
        (false, true) => "Use Fellenius only (Bishop result invalid)",
        (false, false) => "Review geometry and parameters completely",
    };
    out.push(format!("Recommendation: {}", headline));
    out
}

/// Run both methods on identical slices.
///
/// Validation and discretization run once; both solvers consume the same
/// slice set.
pub fn compare_methods(input: &AnalysisInput, settings: &AnalysisSettings) -> CalcResult<MethodComparison> {
    let (slice_set, warnings) = prepare(input, settings)?;
    let fellenius = fellenius::solve(&slice_set, &input.circle, settings, warnings.clone())?;
    let bishop = bishop::solve(&slice_set, &input.circle, settings, warnings)?;
    let comparison = MethodComparison::from_results(fellenius, bishop);
    info!(
        label = %input.label,
        fs_fellenius = comparison.fs_fellenius,
        fs_bishop = comparison.fs_bishop,
        difference_percent = comparison.difference_percent,
        "Method comparison complete"
    );
    Ok(comparison)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{FailureCircle, TerrainProfile};
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

    #[test]
    fn test_compare_scenario() {
        let cmp = compare_methods(&scenario(20.0, 20.0), &AnalysisSettings::default()).unwrap();
        assert!((cmp.fs_fellenius - 5.1845).abs() < 0.001);
        assert!((cmp.fs_bishop - 6.0617).abs() < 0.001);
        assert!((cmp.difference - (cmp.fs_bishop - cmp.fs_fellenius)).abs() < 1e-12);
        assert!((cmp.difference_percent - 16.92).abs() < 0.1);
        assert_eq!(cmp.more_conservative, Method::Fellenius);
        assert!(!cmp.methods_agree());
        assert!(cmp.recommendations.iter().any(|r| r.contains("Large difference")));
        assert!(cmp.recommendations.iter().any(|r| r.contains("Investigate")));
    }

    #[test]
    fn test_compare_matches_single_runs() {
        let input = scenario(20.0, 20.0);
        let settings = AnalysisSettings::default();
        let cmp = compare_methods(&input, &settings).unwrap();
        let f = fellenius::analyze_fellenius(&input, &settings).unwrap();
        let b = bishop::analyze_bishop(&input, &settings).unwrap();
        assert_eq!(cmp.fs_fellenius.to_bits(), f.factor_of_safety.to_bits());
        assert_eq!(cmp.fs_bishop.to_bits(), b.factor_of_safety.to_bits());
    }

    #[test]
    fn test_stability_disagreement() {
        let cmp = compare_methods(&scenario(0.6, 4.0), &AnalysisSettings::default()).unwrap();
        assert!(cmp.fs_fellenius < 1.0);
        assert!(cmp.fs_bishop > 1.0);
        assert!(cmp
            .recommendations
            .iter()
            .any(|r| r.contains("Only Fellenius indicates instability")));
    }

    #[test]
    fn test_invalid_result_recommendation() {
        let input = scenario(100.0, 20.0).with_water_table(TerrainProfile::horizontal(0.0, 40.0, 40.0).unwrap());
        let cmp = compare_methods(&input, &AnalysisSettings::default()).unwrap();
        assert!(!cmp.fellenius.is_valid);
        assert!(!cmp.bishop.is_valid);
        assert_eq!(
            cmp.recommendations.last().map(String::as_str),
            Some("Recommendation: Review geometry and parameters completely")
        );
    }

    #[test]
    fn test_comparison_json() {
        let cmp = compare_methods(&scenario(20.0, 20.0), &AnalysisSettings::default()).unwrap();
        let json = serde_json::to_value(&cmp).unwrap();
        assert_eq!(json["more_conservative"], "fellenius");
        let back: MethodComparison = serde_json::from_value(json).unwrap();
        assert!((back.fs_bishop - cmp.fs_bishop).abs() < 1e-12);
    }
}
