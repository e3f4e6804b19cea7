//! # Soil Materials
//!
//! Soil definitions for slope analysis. The engine models a single
//! homogeneous stratum per analysis.
//!
//! - **Stratum**: effective cohesion c', friction angle φ', unit weights
//! - **SoilPreset**: typical parameters for common soil types
//!
//! ## Example
//!
//! ```rust
//! use slope_core::materials::{SoilPreset, Stratum};
//!
//! let clay = Stratum::new("Site clay", 20.0, 20.0, 18.0).unwrap();
//! let sand = SoilPreset::DenseSand.stratum().unwrap();
//! assert!(sand.phi_deg > clay.phi_deg);
//! ```

pub mod soil_presets;
pub mod stratum;

pub use soil_presets::{PresetProperties, SoilPreset};
pub use stratum::Stratum;
