//! # slope_core - Slope Stability Calculation Engine
//!
//! `slope_core` computes the factor of safety of a circular slip surface in
//! a single homogeneous soil stratum, with an optional water table. All inputs
//! and outputs are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: pure functions from input to result
//! - **JSON-First**: all types implement Serialize/Deserialize
//! - **Rich Errors**: structured error types with short machine codes
//!
//! ## Quick Start
//!
//! ```rust
//! use slope_core::calculations::{analyze_bishop, analyze_fellenius, AnalysisInput};
//! use slope_core::geometry::{FailureCircle, TerrainProfile};
//! use slope_core::materials::Stratum;
//! use slope_core::settings::AnalysisSettings;
//!
//! let input = AnalysisInput::new(
//!     "Cut A",
//!     FailureCircle::new(15.0, 5.0, 30.0)?,
//!     TerrainProfile::new(vec![(0.0, 10.0), (10.0, 10.0), (20.0, 0.0), (40.0, 0.0)])?,
//!     Stratum::new("Silty clay", 20.0, 20.0, 18.0)?,
//! )
//! .with_num_slices(8);
//!
//! let settings = AnalysisSettings::default();
//! let fellenius = analyze_fellenius(&input, &settings)?;
//! let bishop = analyze_bishop(&input, &settings)?;
//! assert!(bishop.factor_of_safety > fellenius.factor_of_safety);
//! # Ok::<(), slope_core::CalcError>(())
//! ```
//!
//! ## Modules
//!
//! - [`geometry`] - failure circle, terrain profile and slice construction
//! - [`calculations`] - Fellenius, Bishop Modified and method comparison
//! - [`validation`] - input, slice and convergence checks
//! - [`materials`] - soil stratum and typical soil presets
//! - [`settings`] - solver parameters and validation limits
//! - [`report`] - plain-text result reports
//! - [`project`] / [`file_io`] - project container and atomic `.slp` files
//! - [`units`] / [`errors`] - unit helpers and structured errors

pub mod calculations;
pub mod errors;
pub mod file_io;
pub mod geometry;
pub mod materials;
pub mod project;
pub mod report;
pub mod settings;
pub mod units;
pub mod validation;

pub use calculations::{AnalysisInput, AnalysisOutcome, Method, StabilityClass};
pub use errors::{CalcError, CalcResult, ErrorCode};
pub use file_io::{load_project, save_project};
pub use project::{ProjectMetadata, SlopeProject};
pub use settings::AnalysisSettings;
