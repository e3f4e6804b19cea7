//! # Typical Soil Presets
//!
//! Indicative effective-stress parameters for common soils, for quick
//! studies and demonstrations. Site-specific testing always governs.
//!
//! Values are mid-range textbook figures (c' kPa, φ' deg, γ / γsat kN/m³).

use serde::{Deserialize, Serialize};

use crate::errors::CalcResult;
use crate::materials::Stratum;

/// Common soil types with typical parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoilPreset {
    SoftClay,
    StiffClay,
    SiltyClay,
    Silt,
    LooseSand,
    DenseSand,
    Gravel,
}

/// Typical parameter set of a preset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresetProperties {
    pub cohesion_kpa: f64,
    pub phi_deg: f64,
    pub gamma_kn_m3: f64,
    pub gamma_sat_kn_m3: f64,
}

impl SoilPreset {
    /// All presets in table order
    pub const ALL: [SoilPreset; 7] = [
        SoilPreset::SoftClay,
        SoilPreset::StiffClay,
        SoilPreset::SiltyClay,
        SoilPreset::Silt,
        SoilPreset::LooseSand,
        SoilPreset::DenseSand,
        SoilPreset::Gravel,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            SoilPreset::SoftClay => "Soft clay",
            SoilPreset::StiffClay => "Stiff clay",
            SoilPreset::SiltyClay => "Silty clay",
            SoilPreset::Silt => "Silt",
            SoilPreset::LooseSand => "Loose sand",
            SoilPreset::DenseSand => "Dense sand",
            SoilPreset::Gravel => "Sandy gravel",
        }
    }

    pub fn properties(&self) -> PresetProperties {
        let (c, phi, gamma, gamma_sat) = match self {
            SoilPreset::SoftClay => (15.0, 18.0, 17.0, 18.0),
            SoilPreset::StiffClay => (50.0, 22.0, 19.0, 20.0),
            SoilPreset::SiltyClay => (20.0, 25.0, 18.0, 19.5),
            SoilPreset::Silt => (5.0, 28.0, 18.0, 19.5),
            SoilPreset::LooseSand => (0.0, 30.0, 17.0, 19.0),
            SoilPreset::DenseSand => (0.0, 38.0, 19.0, 21.0),
            SoilPreset::Gravel => (0.0, 40.0, 20.0, 22.0),
        };
        PresetProperties {
            cohesion_kpa: c,
            phi_deg: phi,
            gamma_kn_m3: gamma,
            gamma_sat_kn_m3: gamma_sat,
        }
    }

    /// Build a stratum from this preset.
    pub fn stratum(&self) -> CalcResult<Stratum> {
        let p = self.properties();
        Stratum::new(self.display_name(), p.cohesion_kpa, p.phi_deg, p.gamma_kn_m3)?
            .with_saturated_unit_weight(p.gamma_sat_kn_m3)
    }
}
