//! Core logic turning a blood-test panel into prioritized supplement recommendations.
//!
//! The crate is pure computation over tables loaded by the caller: the
//! [`StatusAnalyzer`] classifies readings, the [`RuleEngine`] matches dosage
//! rules and merges their directives, and the [`RecommendationEngine`] ties
//! both together into an ordered [`Recommendation`]. The [`PanelInterpreter`]
//! reads whole panels (thyroid, lipids, liver, hormones, glucose/insulin).

pub mod analyzer;
pub mod interpretation;
pub mod model;
pub mod recommendation;
pub mod rules;

use serde::{Deserialize, Serialize};

pub use analyzer::{StatusAnalyzer, ThresholdType};
pub use interpretation::{
    CriticalIssue, PanelInterpretation, PanelInterpreter, TestCategories, TestCategory,
};
pub use model::{
    Band, Patient, Priority, RecommendedSupplement, Recommendation, ReferenceRange,
    ReferenceTable, SupplementCatalog, SupplementDirective, SupplementInfo, TestReading,
    TestStatus, TimingTable, DEFAULT_TIMING_BUCKET, FALLBACK_PRIORITY_RANK,
};
pub use recommendation::{KnowledgeBase, RecommendationEngine};
pub use rules::{merge_directives, DosageRule, RequiredTest, RuleCondition, RuleEngine, ValueRange};

/// Tunables for a recommendation run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AdvisorConfig {
    /// Which reference band the analyzer compares readings against.
    #[serde(default)]
    pub threshold_type: ThresholdType,
}

/// Errors raised by the adapters around the engine.
///
/// The engine itself never fails; these cover loading, parsing and
/// validating the data handed to it.
#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    #[error("input is missing the minimum required data")]
    MissingData,
    #[error("could not parse data: {0}")]
    Parse(String),
    #[error("invalid value for `{field}`: {message}")]
    Validation { field: String, message: String },
    #[error("could not load {path}: {message}")]
    Load { path: String, message: String },
}

impl AdvisorError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}
