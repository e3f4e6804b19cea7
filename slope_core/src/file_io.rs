//! # File I/O Module
//!
//! Project and input file operations:
//! - **Atomic saves**: write to `.tmp`, fsync, rename over the target
//! - **Version validation**: reject files from an incompatible schema
//! - **Standalone inputs**: load a single case or a settings file
//!
//! ## File Format
//!
//! Projects are saved as `.slp` files containing JSON. Case and settings
//! files are plain JSON; omitted settings fields take their defaults.
//!
//! ## Example
//!
//! ```rust,no_run
//! use slope_core::file_io::{load_project, save_project};
//! use slope_core::project::SlopeProject;
//! use std::path::Path;
//!
//! let project = SlopeProject::new("Engineer", "25-001", "Client");
//! let path = Path::new("cut_north.slp");
//!
//! save_project(&project, path)?;
//! let loaded = load_project(path)?;
//! assert_eq!(loaded.meta.job_id, "25-001");
//! # Ok::<(), slope_core::errors::CalcError>(())
//! ```

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::calculations::AnalysisInput;
use crate::errors::{CalcError, CalcResult};
use crate::project::{SlopeProject, SCHEMA_VERSION};
use crate::settings::AnalysisSettings;

/// Extension for project files
pub const PROJECT_EXTENSION: &str = "slp";

/// Save a project with atomic write semantics.
///
/// 1. Serialize to JSON
/// 2. Write to `<path>.slp.tmp` and fsync
/// 3. Rename over `path`
///
/// An interrupted save leaves the previous file intact.
pub fn save_project(project: &SlopeProject, path: &Path) -> CalcResult<()> {
    let json = serde_json::to_string_pretty(project).map_err(|e| CalcError::SerializationError {
        reason: e.to_string(),
    })?;

    let tmp_path = path.with_extension(format!("{}.tmp", PROJECT_EXTENSION));

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        CalcError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        CalcError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        CalcError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CalcError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    info!(path = %path.display(), cases = project.case_count(), "Project saved");
    Ok(())
}

/// Load a project and check its schema version.
///
/// # Errors
///
/// * `CalcError::FileError` - I/O error
/// * `CalcError::SerializationError` - invalid JSON
/// * `CalcError::VersionMismatch` - incompatible schema version
pub fn load_project(path: &Path) -> CalcResult<SlopeProject> {
    let project: SlopeProject = read_json(path)?;
    validate_version(&project.meta.version)?;
    project.settings.validate()?;
    info!(path = %path.display(), cases = project.case_count(), "Project loaded");
    Ok(project)
}

/// Load analysis settings; fields missing from the file keep their defaults.
pub fn load_settings(path: &Path) -> CalcResult<AnalysisSettings> {
    let settings: AnalysisSettings = read_json(path)?;
    settings.validate()?;
    debug!(path = %path.display(), "Settings loaded");
    Ok(settings)
}

/// Load a single analysis case.
pub fn load_case(path: &Path) -> CalcResult<AnalysisInput> {
    let case: AnalysisInput = read_json(path)?;
    debug!(path = %path.display(), label = %case.label, "Case loaded");
    Ok(case)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> CalcResult<T> {
    let contents = fs::read_to_string(path)
        .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;

    serde_json::from_str(&contents).map_err(|e| CalcError::SerializationError {
        reason: format!("Invalid JSON in {}: {}", path.display(), e),
    })
}

/// Check that a file version is compatible with the current schema.
///
/// Major versions must match; while the schema is 0.x, a file with a newer
/// minor version is rejected.
pub fn validate_version(file_version: &str) -> CalcResult<()> {
    let mismatch = || CalcError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let parse = |v: &str| -> Option<Vec<u32>> { v.split('.').map(|p| p.parse().ok()).collect() };
    let file_parts = parse(file_version).filter(|p| !p.is_empty()).ok_or_else(mismatch)?;
    let current_parts = parse(SCHEMA_VERSION).ok_or_else(mismatch)?;

    if file_parts[0] != current_parts[0] {
        return Err(mismatch());
    }

    if current_parts[0] == 0 && file_parts.len() > 1 && current_parts.len() > 1 && file_parts[1] > current_parts[1] {
        return Err(mismatch());
    }

    Ok(())
}
