//! # Unit Types
//!
//! Lightweight wrappers and constants for the SI units used by the engine.
//!
//! Lengths are metres, forces kN (per metre of slope, plane strain), stresses
//! kPa and unit weights kN/m³. Plain `f64` fields carry their unit in the name
//! (`radius_m`, `cohesion_kpa`, `gamma_kn_m3`); the newtypes below exist only
//! where the same quantity travels in two units, which for this engine means
//! angles.
//!
//! ## Example
//!
//! ```rust
//! use slope_core::units::{Degrees, Radians};
//!
//! let phi = Degrees(30.0);
//! let phi_rad: Radians = phi.into();
//! assert!((phi_rad.0 - std::f64::consts::FRAC_PI_6).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};

/// Unit weight of water γw in kN/m³
pub const GAMMA_WATER_KN_M3: f64 = 9.81;

/// Unit thickness of the plane-strain section in m
pub const UNIT_THICKNESS_M: f64 = 1.0;

/// Angle in degrees
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Degrees(pub f64);

/// Angle in radians
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Radians(pub f64);

impl From<Degrees> for Radians {
    fn from(deg: Degrees) -> Self {
        Radians(deg.0.to_radians())
    }
}

impl From<Radians> for Degrees {
    fn from(rad: Radians) -> Self {
        Degrees(rad.0.to_degrees())
    }
}

impl Degrees {
    /// Tangent of the angle
    pub fn tan(self) -> f64 {
        Radians::from(self).0.tan()
    }
}
