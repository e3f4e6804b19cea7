//! # Project Data Structures
//!
//! `SlopeProject` is the root container for a set of slope analysis cases.
//! Projects serialize to `.slp` files as human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! SlopeProject
//! ├── meta: ProjectMetadata (version, engineer, job info, timestamps)
//! ├── settings: AnalysisSettings (Bishop parameters, validation limits)
//! └── cases: HashMap<Uuid, AnalysisInput> (circle, terrain, stratum, water table)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use slope_core::calculations::AnalysisInput;
//! use slope_core::project::SlopeProject;
//!
//! let mut project = SlopeProject::new("Jane Engineer", "25-042", "ACME Mining");
//! let id = project.add_case(AnalysisInput::demo().unwrap());
//! assert!(project.get_case(&id).is_some());
//!
//! let json = serde_json::to_string_pretty(&project).unwrap();
//! assert!(json.contains("ACME Mining"));
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculations::{compare_methods, run, AnalysisInput, AnalysisOutcome, Method, MethodComparison};
use crate::errors::{CalcError, CalcResult};
use crate::settings::AnalysisSettings;

/// Current schema version for .slp files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root project container.
///
/// Cases are stored in a flat UUID-keyed map; every case is analyzed with the
/// project-wide `settings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlopeProject {
    pub meta: ProjectMetadata,

    #[serde(default)]
    pub settings: AnalysisSettings,

    /// Analysis cases, keyed by UUID
    #[serde(default)]
    pub cases: HashMap<Uuid, AnalysisInput>,
}

impl SlopeProject {
    /// Create a new empty project with default settings.
    ///
    /// ```rust
    /// use slope_core::project::SlopeProject;
    ///
    /// let project = SlopeProject::new("John Doe", "25-001", "Client Corp");
    /// assert_eq!(project.meta.engineer, "John Doe");
    /// assert_eq!(project.case_count(), 0);
    /// ```
    pub fn new(engineer: impl Into<String>, job_id: impl Into<String>, client: impl Into<String>) -> Self {
        let now = Utc::now();
        SlopeProject {
            meta: ProjectMetadata {
                version: SCHEMA_VERSION.to_string(),
                engineer: engineer.into(),
                job_id: job_id.into(),
                client: client.into(),
                created: now,
                modified: now,
            },
            settings: AnalysisSettings::default(),
            cases: HashMap::new(),
        }
    }

    /// Add a case and return its new UUID.
    pub fn add_case(&mut self, case: AnalysisInput) -> Uuid {
        let id = Uuid::new_v4();
        self.cases.insert(id, case);
        self.touch();
        id
    }

    /// Remove a case by UUID.
    pub fn remove_case(&mut self, id: &Uuid) -> Option<AnalysisInput> {
        let case = self.cases.remove(id);
        if case.is_some() {
            self.touch();
        }
        case
    }

    pub fn get_case(&self, id: &Uuid) -> Option<&AnalysisInput> {
        self.cases.get(id)
    }

    /// Mutable access to a case. Marks the project as modified when found.
    pub fn get_case_mut(&mut self, id: &Uuid) -> Option<&mut AnalysisInput> {
        if self.cases.contains_key(id) {
            self.meta.modified = Utc::now();
            self.cases.get_mut(id)
        } else {
            None
        }
    }

    /// First case whose label matches exactly.
    pub fn find_case(&self, label: &str) -> Option<(Uuid, &AnalysisInput)> {
        self.cases
            .iter()
            .find(|(_, case)| case.label == label)
            .map(|(id, case)| (*id, case))
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    pub fn case_count(&self) -> usize {
        self.cases.len()
    }

    /// Analyze one case with the project settings.
    pub fn analyze_case(&self, id: &Uuid, method: Method) -> CalcResult<AnalysisOutcome> {
        run(self.case_or_err(id)?, method, &self.settings)
    }

    /// Run both methods on one case with the project settings.
    pub fn compare_case(&self, id: &Uuid) -> CalcResult<MethodComparison> {
        compare_methods(self.case_or_err(id)?, &self.settings)
    }

    fn case_or_err(&self, id: &Uuid) -> CalcResult<&AnalysisInput> {
        self.get_case(id)
            .ok_or_else(|| CalcError::invalid_input("case_id", id.to_string(), "No case with this id in the project"))
    }
}

impl Default for SlopeProject {
    fn default() -> Self {
        SlopeProject::new("", "", "")
    }
}

/// Project metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Name of the responsible engineer
    pub engineer: String,

    /// Job/project number
    pub job_id: String,

    pub client: String,

    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_creation() {
        let project = SlopeProject::new("John Doe", "25-001", "Acme Corp");
        assert_eq!(project.meta.engineer, "John Doe");
        assert_eq!(project.meta.job_id, "25-001");
        assert_eq!(project.meta.client, "Acme Corp");
        assert_eq!(project.meta.version, SCHEMA_VERSION);
        assert_eq!(project.settings, AnalysisSettings::default());
    }

    #[test]
    fn test_project_serialization() {
        let mut project = SlopeProject::new("Jane Engineer", "25-042", "Test Client");
        project.add_case(AnalysisInput::demo().unwrap());
        let json = serde_json::to_string_pretty(&project).unwrap();

        assert!(json.contains("Jane Engineer"));
        assert!(json.contains("25-042"));
        assert!(json.contains("bishop"));

        let roundtrip: SlopeProject = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip.meta.engineer, "Jane Engineer");
        assert_eq!(roundtrip.case_count(), 1);
    }

    #[test]
    fn test_add_remove_case() {
        let mut project = SlopeProject::new("Engineer", "25-001", "Client");
        let id = project.add_case(AnalysisInput::demo().unwrap());
        assert_eq!(project.case_count(), 1);
        assert!(project.get_case(&id).is_some());

        let removed = project.remove_case(&id);
        assert!(removed.is_some());
        assert_eq!(project.case_count(), 0);
        assert!(project.remove_case(&id).is_none());
    }

    #[test]
    fn test_touch_on_modification() {
        let mut project = SlopeProject::new("Engineer", "25-001", "Client");
        let before = project.meta.modified;
        let id = project.add_case(AnalysisInput::demo().unwrap());
        assert!(project.meta.modified >= before);
        if let Some(case) = project.get_case_mut(&id) {
            case.num_slices = 12;
        }
        assert_eq!(project.get_case(&id).map(|c| c.num_slices), Some(12));
    }

    #[test]
    fn test_find_and_analyze_case() {
        let mut project = SlopeProject::new("Engineer", "25-001", "Client");
        let demo = AnalysisInput::demo().unwrap();
        let label = demo.label.clone();
        let id = project.add_case(demo);

        let (found, _) = project.find_case(&label).unwrap();
        assert_eq!(found, id);

        let outcome = project.analyze_case(&id, Method::Bishop).unwrap();
        assert!((outcome.factor_of_safety() - 6.0617).abs() < 0.001);

        let cmp = project.compare_case(&id).unwrap();
        assert_eq!(cmp.more_conservative, Method::Fellenius);
    }

    #[test]
    fn test_unknown_case() {
        let project = SlopeProject::default();
        let err = project.analyze_case(&Uuid::new_v4(), Method::Fellenius).unwrap_err();
        assert_eq!(err.error_code(), "ENTRADA_INVALIDA");
    }
}
