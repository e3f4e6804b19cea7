//! # Error Types
//!
//! Structured error types for slope_core. Every failure carries a short
//! machine code (see [`ErrorCode`] and [`CalcError::error_code`]) so that
//! callers (CLI, batch circle searches, GUIs) branch on the code and never
//! on message text.
//!
//! ## Taxonomy
//!
//! - **Input**: malformed terrain, circle or stratum (always raised)
//! - **Geometry**: degenerate geometry, no meaningful FS exists (raised)
//! - **Numerical**: mα ≤ 0, non-convergence, implausible FS (raised)
//! - **Warning**: soft findings collected into a result's `warnings`
//!
//! ## Example
//!
//! ```rust
//! use slope_core::errors::{CalcError, CalcResult};
//!
//! fn validate_radius(radius_m: f64) -> CalcResult<()> {
//!     if radius_m <= 0.0 {
//!         return Err(CalcError::invalid_input(
//!             "radius_m",
//!             radius_m.to_string(),
//!             "Radius must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! let err = validate_radius(-1.0).unwrap_err();
//! assert_eq!(err.error_code(), "ENTRADA_INVALIDA");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for slope_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Broad bucket an error or validation code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Malformed or out-of-range input data
    Input,
    /// Degenerate geometry (no intersection, no slices, no driving force)
    Geometry,
    /// Numerical infeasibility (mα ≤ 0, non-convergence, implausible FS)
    Numerical,
    /// Soft finding; never raised on its own
    Warning,
    /// File and serialization problems
    Io,
}

/// Machine-readable codes shared by validation outcomes and errors.
///
/// The serialized form is the stable wire code (e.g. `"M_ALPHA_NO_POSITIVO"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "COHESION_FUERA_RANGO")]
    CohesionOutOfRange,
    #[serde(rename = "PHI_FUERA_RANGO")]
    PhiOutOfRange,
    #[serde(rename = "GAMMA_FUERA_RANGO")]
    GammaOutOfRange,
    #[serde(rename = "COMBINACION_PHI_C_INUSUAL")]
    UnusualPhiCohesion,
    #[serde(rename = "RADIO_DEMASIADO_PEQUENO")]
    RadiusTooSmall,
    #[serde(rename = "RADIO_DEMASIADO_GRANDE")]
    RadiusTooLarge,
    #[serde(rename = "PERFIL_INSUFICIENTE")]
    ProfileTooShort,
    #[serde(rename = "PERFIL_NO_ORDENADO")]
    ProfileNotSorted,
    #[serde(rename = "PENDIENTE_EXTREMA")]
    ExtremeSlope,
    #[serde(rename = "ANCHO_INVALIDO")]
    InvalidWidth,
    #[serde(rename = "ALTURA_INVALIDA")]
    InvalidHeight,
    #[serde(rename = "PESO_INVALIDO")]
    InvalidWeight,
    #[serde(rename = "ANGULO_ALPHA_FUERA_RANGO")]
    AlphaOutOfRange,
    #[serde(rename = "POCAS_DOVELAS")]
    TooFewSlices,
    #[serde(rename = "DEMASIADAS_DOVELAS")]
    TooManySlices,
    #[serde(rename = "DOVELAS_NO_ORDENADAS")]
    SlicesNotOrdered,

    #[serde(rename = "SIN_INTERSECCION")]
    NoIntersection,
    #[serde(rename = "INTERSECCION_INSUFICIENTE")]
    InsufficientIntersection,
    #[serde(rename = "CIRCULO_SOBRE_TERRENO")]
    CircleAboveTerrain,
    #[serde(rename = "CIRCULO_DEMASIADO_LEJANO")]
    CircleTooFar,
    #[serde(rename = "CENTRO_DEMASIADO_ALTO")]
    CenterTooHigh,
    #[serde(rename = "FUERA_DEL_CIRCULO")]
    OutsideCircle,
    #[serde(rename = "SIN_DOVELAS_VALIDAS")]
    NoValidSlices,
    #[serde(rename = "FUERZA_ACTUANTE_NULA")]
    ZeroDrivingForce,

    #[serde(rename = "M_ALPHA_NO_POSITIVO")]
    NonPositiveMAlpha,
    #[serde(rename = "M_ALPHA_PROBLEMATICO_MULTIPLE")]
    MultipleNonPositiveMAlpha,
    #[serde(rename = "NO_CONVERGENCIA")]
    NoConvergence,
    #[serde(rename = "POSIBLE_DIVERGENCIA")]
    PossibleDivergence,
    #[serde(rename = "FS_NO_POSITIVO")]
    NonPositiveFs,
    #[serde(rename = "FS_INVALIDO")]
    InvalidFs,
    #[serde(rename = "FS_DEMASIADO_ALTO")]
    FsTooHigh,

    #[serde(rename = "DOVELA_EN_TRACCION")]
    SliceInTension,
    #[serde(rename = "EXCESO_TRACCION")]
    ExcessiveTension,
    #[serde(rename = "M_ALPHA_BAJO")]
    LowMAlpha,
}

impl ErrorCode {
    /// Stable wire code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::CohesionOutOfRange => "COHESION_FUERA_RANGO",
            ErrorCode::PhiOutOfRange => "PHI_FUERA_RANGO",
            ErrorCode::GammaOutOfRange => "GAMMA_FUERA_RANGO",
            ErrorCode::UnusualPhiCohesion => "COMBINACION_PHI_C_INUSUAL",
            ErrorCode::RadiusTooSmall => "RADIO_DEMASIADO_PEQUENO",
            ErrorCode::RadiusTooLarge => "RADIO_DEMASIADO_GRANDE",
            ErrorCode::ProfileTooShort => "PERFIL_INSUFICIENTE",
            ErrorCode::ProfileNotSorted => "PERFIL_NO_ORDENADO",
            ErrorCode::ExtremeSlope => "PENDIENTE_EXTREMA",
            ErrorCode::InvalidWidth => "ANCHO_INVALIDO",
            ErrorCode::InvalidHeight => "ALTURA_INVALIDA",
            ErrorCode::InvalidWeight => "PESO_INVALIDO",
            ErrorCode::AlphaOutOfRange => "ANGULO_ALPHA_FUERA_RANGO",
            ErrorCode::TooFewSlices => "POCAS_DOVELAS",
            ErrorCode::TooManySlices => "DEMASIADAS_DOVELAS",
            ErrorCode::SlicesNotOrdered => "DOVELAS_NO_ORDENADAS",
            ErrorCode::NoIntersection => "SIN_INTERSECCION",
            ErrorCode::InsufficientIntersection => "INTERSECCION_INSUFICIENTE",
            ErrorCode::CircleAboveTerrain => "CIRCULO_SOBRE_TERRENO",
            ErrorCode::CircleTooFar => "CIRCULO_DEMASIADO_LEJANO",
            ErrorCode::CenterTooHigh => "CENTRO_DEMASIADO_ALTO",
            ErrorCode::OutsideCircle => "FUERA_DEL_CIRCULO",
            ErrorCode::NoValidSlices => "SIN_DOVELAS_VALIDAS",
            ErrorCode::ZeroDrivingForce => "FUERZA_ACTUANTE_NULA",
            ErrorCode::NonPositiveMAlpha => "M_ALPHA_NO_POSITIVO",
            ErrorCode::MultipleNonPositiveMAlpha => "M_ALPHA_PROBLEMATICO_MULTIPLE",
            ErrorCode::NoConvergence => "NO_CONVERGENCIA",
            ErrorCode::PossibleDivergence => "POSIBLE_DIVERGENCIA",
            ErrorCode::NonPositiveFs => "FS_NO_POSITIVO",
            ErrorCode::InvalidFs => "FS_INVALIDO",
            ErrorCode::FsTooHigh => "FS_DEMASIADO_ALTO",
            ErrorCode::SliceInTension => "DOVELA_EN_TRACCION",
            ErrorCode::ExcessiveTension => "EXCESO_TRACCION",
            ErrorCode::LowMAlpha => "M_ALPHA_BAJO",
        }
    }

    /// Taxonomy bucket for this code
    pub fn category(&self) -> ErrorCategory {
        use ErrorCode::*;
        match self {
            CohesionOutOfRange | PhiOutOfRange | GammaOutOfRange | RadiusTooSmall
            | RadiusTooLarge | ProfileTooShort | ProfileNotSorted | ExtremeSlope
            | InvalidWidth | InvalidHeight | InvalidWeight | AlphaOutOfRange
            | TooFewSlices | TooManySlices | SlicesNotOrdered => ErrorCategory::Input,
            NoIntersection | InsufficientIntersection | CircleAboveTerrain | CircleTooFar
            | CenterTooHigh | OutsideCircle | NoValidSlices | ZeroDrivingForce => {
                ErrorCategory::Geometry
            }
            NonPositiveMAlpha | MultipleNonPositiveMAlpha | NoConvergence
            | PossibleDivergence | NonPositiveFs | InvalidFs | FsTooHigh => {
                ErrorCategory::Numerical
            }
            UnusualPhiCohesion | SliceInTension | ExcessiveTension | LowMAlpha => {
                ErrorCategory::Warning
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error type for slope stability operations.
///
/// This is the single error kind raised by the geometry engine, the
/// validation layer and both solvers.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is invalid (out of range, non-finite, inconsistent)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// Interpolation requested outside a profile's x-span
    #[error("x = {x} is outside the profile range [{min}, {max}]")]
    OutOfRange { x: f64, min: f64, max: f64 },

    /// Degenerate geometry: no overlap, no valid slices, no driving force
    #[error("Geometry error [{code}]: {reason}")]
    Geometry {
        code: ErrorCode,
        reason: String,
        value: Option<f64>,
    },

    /// A validation predicate rejected the analysis
    #[error("Validation failed [{code}]: {message}")]
    Validation {
        code: ErrorCode,
        message: String,
        value: Option<f64>,
    },

    /// Bishop correction factor mα ≤ 0 for a slice
    #[error(
        "m_alpha = {m_alpha:.4} <= 0 at slice {slice} (x = {x_m:.2} m, alpha = {alpha_deg:.1} deg, FS = {fs:.3}): \
         base too steep or FS estimate too low for the friction angle"
    )]
    NonPositiveMAlpha {
        slice: usize,
        x_m: f64,
        alpha_deg: f64,
        fs: f64,
        m_alpha: f64,
    },

    /// Bishop iteration exhausted max_iterations
    #[error("Bishop iteration did not converge in {iterations} iterations (last delta {last_delta:.6})")]
    NoConvergence { iterations: usize, last_delta: f64 },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a Geometry error without an offending value
    pub fn geometry(code: ErrorCode, reason: impl Into<String>) -> Self {
        CalcError::Geometry {
            code,
            reason: reason.into(),
            value: None,
        }
    }

    /// Create a Geometry error carrying the offending value
    pub fn geometry_with_value(code: ErrorCode, reason: impl Into<String>, value: f64) -> Self {
        CalcError::Geometry {
            code,
            reason: reason.into(),
            value: Some(value),
        }
    }

    /// Create a Validation error
    pub fn validation(code: ErrorCode, message: impl Into<String>, value: Option<f64>) -> Self {
        CalcError::Validation {
            code,
            message: message.into(),
            value,
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "ENTRADA_INVALIDA",
            CalcError::OutOfRange { .. } => "FUERA_DE_RANGO",
            CalcError::Geometry { code, .. } => code.as_str(),
            CalcError::Validation { code, .. } => code.as_str(),
            CalcError::NonPositiveMAlpha { .. } => ErrorCode::NonPositiveMAlpha.as_str(),
            CalcError::NoConvergence { .. } => ErrorCode::NoConvergence.as_str(),
            CalcError::FileError { .. } => "ERROR_ARCHIVO",
            CalcError::SerializationError { .. } => "ERROR_SERIALIZACION",
            CalcError::VersionMismatch { .. } => "VERSION_INCOMPATIBLE",
        }
    }

    /// The numeric value that triggered the error, where one exists
    pub fn offending_value(&self) -> Option<f64> {
        match self {
            CalcError::OutOfRange { x, .. } => Some(*x),
            CalcError::Geometry { value, .. } => *value,
            CalcError::Validation { value, .. } => *value,
            CalcError::NonPositiveMAlpha { m_alpha, .. } => Some(*m_alpha),
            CalcError::NoConvergence { last_delta, .. } => Some(*last_delta),
            CalcError::InvalidInput { value, .. } => value.parse().ok(),
            _ => None,
        }
    }

    /// Taxonomy bucket of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            CalcError::InvalidInput { .. } | CalcError::OutOfRange { .. } => ErrorCategory::Input,
            CalcError::Geometry { .. } => ErrorCategory::Geometry,
            CalcError::Validation { code, .. } => code.category(),
            CalcError::NonPositiveMAlpha { .. } | CalcError::NoConvergence { .. } => {
                ErrorCategory::Numerical
            }
            CalcError::FileError { .. }
            | CalcError::SerializationError { .. }
            | CalcError::VersionMismatch { .. } => ErrorCategory::Io,
        }
    }

    /// Check if this error describes degenerate geometry
    pub fn is_geometry_error(&self) -> bool {
        matches!(self, CalcError::Geometry { .. })
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(e: serde_json::Error) -> Self {
        CalcError::SerializationError {
            reason: e.to_string(),
        }
    }
}
