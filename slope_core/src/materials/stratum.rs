//! # Soil Stratum
//!
//! Homogeneous soil layer with Mohr-Coulomb effective-stress parameters.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::units::{Degrees, Radians};

/// Largest friction angle a stratum may be built with (degrees)
pub const MAX_STRATUM_PHI_DEG: f64 = 45.0;

/// Homogeneous soil stratum.
///
/// ## JSON Example
///
/// ```json
/// {
///   "name": "Silty clay",
///   "cohesion_kpa": 20.0,
///   "phi_deg": 20.0,
///   "gamma_kn_m3": 18.0,
///   "gamma_sat_kn_m3": 19.5
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stratum {
    /// Descriptive name
    #[serde(default = "default_name")]
    pub name: String,

    /// Effective cohesion c' in kPa
    pub cohesion_kpa: f64,

    /// Effective friction angle φ' in degrees
    pub phi_deg: f64,

    /// Unit weight γ in kN/m³
    pub gamma_kn_m3: f64,

    /// Saturated unit weight γsat in kN/m³
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gamma_sat_kn_m3: Option<f64>,
}

fn default_name() -> String {
    "Stratum".to_string()
}

impl Stratum {
    /// Build a validated stratum.
    ///
    /// # Example
    ///
    /// ```rust
    /// use slope_core::materials::Stratum;
    ///
    /// let clay = Stratum::new("Clay", 20.0, 20.0, 18.0).unwrap();
    /// assert!((clay.tan_phi() - 0.36397).abs() < 1e-4);
    ///
    /// assert!(Stratum::new("Bad", -1.0, 20.0, 18.0).is_err());
    /// ```
    pub fn new(name: impl Into<String>, cohesion_kpa: f64, phi_deg: f64, gamma_kn_m3: f64) -> CalcResult<Self> {
        let stratum = Stratum {
            name: name.into(),
            cohesion_kpa,
            phi_deg,
            gamma_kn_m3,
            gamma_sat_kn_m3: None,
        };
        stratum.validate()?;
        Ok(stratum)
    }

    /// Attach a saturated unit weight, re-validating the stratum.
    pub fn with_saturated_unit_weight(mut self, gamma_sat_kn_m3: f64) -> CalcResult<Self> {
        self.gamma_sat_kn_m3 = Some(gamma_sat_kn_m3);
        self.validate()?;
        Ok(self)
    }

    /// Check the physical admissibility of the parameters.
    ///
    /// This is the construction-time check. The typical-range check with
    /// machine codes is [`crate::validation::check_geotechnical_parameters`].
    pub fn validate(&self) -> CalcResult<()> {
        if !self.cohesion_kpa.is_finite() || self.cohesion_kpa < 0.0 {
            return Err(CalcError::invalid_input(
                "cohesion_kpa",
                self.cohesion_kpa.to_string(),
                "Cohesion must be >= 0",
            ));
        }
        if !self.phi_deg.is_finite() || !(0.0..=MAX_STRATUM_PHI_DEG).contains(&self.phi_deg) {
            return Err(CalcError::invalid_input(
                "phi_deg",
                self.phi_deg.to_string(),
                "Friction angle must be between 0 and 45 degrees",
            ));
        }
        if !self.gamma_kn_m3.is_finite() || self.gamma_kn_m3 <= 0.0 {
            return Err(CalcError::invalid_input(
                "gamma_kn_m3",
                self.gamma_kn_m3.to_string(),
                "Unit weight must be positive",
            ));
        }
        if let Some(gamma_sat) = self.gamma_sat_kn_m3 {
            if !(gamma_sat > self.gamma_kn_m3) {
                return Err(CalcError::invalid_input(
                    "gamma_sat_kn_m3",
                    gamma_sat.to_string(),
                    format!("Saturated unit weight must exceed gamma = {}", self.gamma_kn_m3),
                ));
            }
        }
        Ok(())
    }

    /// φ' in radians
    pub fn phi_radians(&self) -> f64 {
        Radians::from(Degrees(self.phi_deg)).0
    }

    /// tan φ'
    pub fn tan_phi(&self) -> f64 {
        Degrees(self.phi_deg).tan()
    }
}
