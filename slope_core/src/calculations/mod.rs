//! # Slope Stability Calculations
//!
//! Each method follows the pattern:
//!
//! - [`AnalysisInput`] - circle, terrain, stratum, water table, slice count
//! - `*Result` - per-method result (JSON-serializable)
//! - `analyze_*(input, settings) -> CalcResult<*Result>` - pure analysis
//! - `solve(slice_set, circle, settings, warnings)` - the solver alone, over
//!   an already discretized slice set
//!
//! ## Available Methods
//!
//! - [`fellenius`] - Ordinary method of slices (direct)
//! - [`bishop`] - Bishop Modified (iterative)
//! - [`comparison`] - Both methods on identical input
//!
//! ## Pipeline
//!
//! ```text
//! input ─► check_complete_input ─► build_slices ─► check_slice_set ─► solver ─► result
//! ```

pub mod bishop;
pub mod comparison;
pub mod fellenius;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{CalcError, CalcResult};
use crate::geometry::{build_slices, FailureCircle, SliceSet, TerrainProfile, MIN_SLICES};
use crate::materials::Stratum;
use crate::settings::AnalysisSettings;
use crate::validation::{check_complete_input, collect};

pub use bishop::{analyze_bishop, BishopResult};
pub use comparison::{compare_methods, MethodComparison};
pub use fellenius::{analyze_fellenius, FelleniusResult};

fn default_num_slices() -> usize {
    10
}

/// Input for one slip-circle analysis.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "Section A-A",
///   "circle": { "center_x_m": 15.0, "center_y_m": 5.0, "radius_m": 30.0 },
///   "terrain": [[0.0, 10.0], [10.0, 10.0], [20.0, 0.0], [40.0, 0.0]],
///   "stratum": { "name": "Clay", "cohesion_kpa": 20.0, "phi_deg": 20.0, "gamma_kn_m3": 18.0 },
///   "water_table": [[0.0, 5.0], [40.0, 5.0]],
///   "num_slices": 8
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisInput {
    /// User label for this case
    #[serde(default)]
    pub label: String,

    pub circle: FailureCircle,

    /// Ground surface
    pub terrain: TerrainProfile,

    pub stratum: Stratum,

    /// Phreatic line; `None` for a dry slope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_table: Option<TerrainProfile>,

    /// Requested number of slices
    #[serde(default = "default_num_slices")]
    pub num_slices: usize,
}

impl AnalysisInput {
    /// Dry-slope input with the default slice count
    pub fn new(label: impl Into<String>, circle: FailureCircle, terrain: TerrainProfile, stratum: Stratum) -> Self {
        AnalysisInput {
            label: label.into(),
            circle,
            terrain,
            stratum,
            water_table: None,
            num_slices: default_num_slices(),
        }
    }

    pub fn with_water_table(mut self, water_table: TerrainProfile) -> Self {
        self.water_table = Some(water_table);
        self
    }

    pub fn with_num_slices(mut self, num_slices: usize) -> Self {
        self.num_slices = num_slices;
        self
    }

    /// Validate the value objects themselves.
    ///
    /// Profile ordering and typical ranges are left to the validation layer,
    /// which reports them with specific codes.
    pub fn validate(&self) -> CalcResult<()> {
        self.circle.validate()?;
        self.stratum.validate()?;
        if self.num_slices < MIN_SLICES {
            return Err(CalcError::invalid_input(
                "num_slices",
                self.num_slices.to_string(),
                format!("At least {} slices are required", MIN_SLICES),
            ));
        }
        Ok(())
    }

    /// Scenario used by the CLI demonstration and documentation: a 10 m cut
    /// at 45° in silty clay.
    pub fn demo() -> CalcResult<Self> {
        Ok(AnalysisInput::new(
            "Demo slope",
            FailureCircle::new(15.0, 5.0, 30.0)?,
            TerrainProfile::new(vec![(0.0, 10.0), (10.0, 10.0), (20.0, 0.0), (40.0, 0.0)])?,
            Stratum::new("Silty clay", 20.0, 20.0, 18.0)?,
        )
        .with_num_slices(8))
    }
}

/// Input checks and discretization shared by both solvers.
pub(crate) fn prepare(input: &AnalysisInput, settings: &AnalysisSettings) -> CalcResult<(SliceSet, Vec<String>)> {
    settings.validate()?;
    input.validate()?;

    let mut warnings = Vec::new();
    if settings.validate_input {
        collect(check_complete_input(input, &settings.limits), &mut warnings).map_err(|e| {
            warn!(label = %input.label, code = e.error_code(), "input rejected: {}", e);
            e
        })?;
    }
    input.terrain.validate()?;
    if let Some(water_table) = &input.water_table {
        water_table.validate()?;
    }

    let slice_set = build_slices(
        &input.circle,
        &input.terrain,
        &input.stratum,
        input.num_slices,
        input.water_table.as_ref(),
        &settings.geometry,
    )?;
    Ok((slice_set, warnings))
}

/// Warning text for discarded slices, if any
pub(crate) fn discarded_warning(slice_set: &SliceSet) -> Option<String> {
    (slice_set.discarded > 0).then(|| {
        format!(
            "{} of {} slices discarded (outside the sliding mass or too steep)",
            slice_set.discarded, slice_set.requested
        )
    })
}

/// Threshold below which the driving sum counts as zero, relative to ΣW.
pub(crate) const DEGENERATE_DRIVING_RATIO: f64 = 1e-9;

/// Limit-equilibrium method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Fellenius,
    Bishop,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Fellenius => write!(f, "Fellenius"),
            Method::Bishop => write!(f, "Bishop Modified"),
        }
    }
}

/// Stability classification of a factor of safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StabilityClass {
    /// FS < 1.0
    Unstable,
    /// 1.0 ≤ FS < 1.2
    Marginal,
    /// 1.2 ≤ FS < 1.5
    Stable,
    /// FS ≥ 1.5
    VeryStable,
}

impl StabilityClass {
    pub fn from_fs(fs: f64) -> Self {
        if fs < 1.0 {
            StabilityClass::Unstable
        } else if fs < 1.2 {
            StabilityClass::Marginal
        } else if fs < 1.5 {
            StabilityClass::Stable
        } else {
            StabilityClass::VeryStable
        }
    }
}

impl fmt::Display for StabilityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StabilityClass::Unstable => "Unstable",
            StabilityClass::Marginal => "Marginally stable",
            StabilityClass::Stable => "Stable",
            StabilityClass::VeryStable => "Very stable",
        };
        f.write_str(label)
    }
}

/// Result of either solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum AnalysisOutcome {
    Fellenius(FelleniusResult),
    Bishop(BishopResult),
}

impl AnalysisOutcome {
    pub fn method(&self) -> Method {
        match self {
            AnalysisOutcome::Fellenius(_) => Method::Fellenius,
            AnalysisOutcome::Bishop(_) => Method::Bishop,
        }
    }

    pub fn factor_of_safety(&self) -> f64 {
        match self {
            AnalysisOutcome::Fellenius(r) => r.factor_of_safety,
            AnalysisOutcome::Bishop(r) => r.factor_of_safety,
        }
    }

    pub fn classification(&self) -> StabilityClass {
        match self {
            AnalysisOutcome::Fellenius(r) => r.classification,
            AnalysisOutcome::Bishop(r) => r.classification,
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            AnalysisOutcome::Fellenius(r) => r.is_valid,
            AnalysisOutcome::Bishop(r) => r.is_valid,
        }
    }

    pub fn warnings(&self) -> &[String] {
        match self {
            AnalysisOutcome::Fellenius(r) => &r.warnings,
            AnalysisOutcome::Bishop(r) => &r.warnings,
        }
    }
}

/// Run one method on `input`.
///
/// # Example
///
/// ```rust
/// use slope_core::calculations::{run, AnalysisInput, Method};
/// use slope_core::settings::AnalysisSettings;
///
/// let input = AnalysisInput::demo().unwrap();
/// let outcome = run(&input, Method::Bishop, &AnalysisSettings::default()).unwrap();
/// assert!(outcome.factor_of_safety() > 1.0);
/// ```
pub fn run(input: &AnalysisInput, method: Method, settings: &AnalysisSettings) -> CalcResult<AnalysisOutcome> {
    match method {
        Method::Fellenius => analyze_fellenius(input, settings).map(AnalysisOutcome::Fellenius),
        Method::Bishop => analyze_bishop(input, settings).map(AnalysisOutcome::Bishop),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stability_classes() {
        assert_eq!(StabilityClass::from_fs(0.9), StabilityClass::Unstable);
        assert_eq!(StabilityClass::from_fs(1.0), StabilityClass::Marginal);
        assert_eq!(StabilityClass::from_fs(1.2), StabilityClass::Stable);
        assert_eq!(StabilityClass::from_fs(1.5), StabilityClass::VeryStable);
        assert_eq!(StabilityClass::Marginal.to_string(), "Marginally stable");
    }

    #[test]
    fn test_input_json_defaults() {
        let json = r#"{
            "circle": { "center_x_m": 15.0, "center_y_m": 5.0, "radius_m": 30.0 },
            "terrain": [[0.0, 10.0], [10.0, 10.0], [20.0, 0.0], [40.0, 0.0]],
            "stratum": { "cohesion_kpa": 20.0, "phi_deg": 20.0, "gamma_kn_m3": 18.0 }
        }"#;
        let input: AnalysisInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.num_slices, 10);
        assert!(input.water_table.is_none());
        assert!(input.label.is_empty());
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_input_rejects_too_few_slices() {
        let input = AnalysisInput::demo().unwrap().with_num_slices(0);
        assert_eq!(input.validate().unwrap_err().error_code(), "ENTRADA_INVALIDA");

        let input = AnalysisInput::demo().unwrap().with_num_slices(2);
        match input.validate().unwrap_err() {
            CalcError::InvalidInput { field, value, .. } => {
                assert_eq!(field, "num_slices");
                assert_eq!(value, "2");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(AnalysisInput::demo().unwrap().with_num_slices(3).validate().is_ok());
    }

    #[test]
    fn test_run_dispatch_and_tagging() {
        let input = AnalysisInput::demo().unwrap();
        let settings = AnalysisSettings::default();

        let fellenius = run(&input, Method::Fellenius, &settings).unwrap();
        assert_eq!(fellenius.method(), Method::Fellenius);
        let json = serde_json::to_string(&fellenius).unwrap();
        assert!(json.contains("\"method\":\"Fellenius\""));

        let bishop = run(&input, Method::Bishop, &settings).unwrap();
        assert_eq!(bishop.method(), Method::Bishop);
        assert!(bishop.factor_of_safety() > fellenius.factor_of_safety());
        assert!(bishop.is_valid());
        assert_eq!(bishop.classification(), StabilityClass::VeryStable);
    }

    #[test]
    fn test_unsorted_terrain_reports_code() {
        let mut input = AnalysisInput::demo().unwrap();
        input.terrain = serde_json::from_str("[[0.0, 10.0], [20.0, 0.0], [10.0, 10.0], [40.0, 0.0]]").unwrap();
        let err = run(&input, Method::Fellenius, &AnalysisSettings::default()).unwrap_err();
        assert_eq!(err.error_code(), "PERFIL_NO_ORDENADO");

        // Without the validation layer the structural check still applies
        let settings = AnalysisSettings {
            validate_input: false,
            ..AnalysisSettings::default()
        };
        let err = run(&input, Method::Fellenius, &settings).unwrap_err();
        assert_eq!(err.error_code(), "ENTRADA_INVALIDA");
    }
}
