//! Adapters around `advisor-core`: JSON configuration loading, input
//! validation, patient documents, translations and report rendering.

pub mod document;
pub mod i18n;
pub mod loader;
pub mod report;
pub mod validate;

use advisor_core::{
    AdvisorConfig, AdvisorError, PanelInterpretation, Recommendation, RecommendationEngine,
};
use serde_json::Value;

pub use document::{
    parse_document_str, parse_document_value, read_blood_tests, read_document, read_patient,
    PatientDocument, PatientPanel,
};
pub use i18n::Translations;
pub use loader::{knowledge_from_value, DataLoader};
pub use report::{render_report, report_file_name};
pub use validate::{PatientInput, ReadingInput};

/// Runs a whole recommendation from in-memory JSON: a combined knowledge
/// object and a patient document.
pub fn recommend_from_values(
    knowledge: &Value,
    document: &Value,
    config: AdvisorConfig,
) -> Result<Recommendation, AdvisorError> {
    let engine = RecommendationEngine::new(knowledge_from_value(knowledge)?, config);
    let panel = parse_document_value(document)?.into_validated()?;
    Ok(engine.generate(&panel.patient, &panel.readings))
}

/// Panel interpretation of a patient document; the knowledge object may carry
/// custom `categories`.
pub fn interpret_from_values(
    knowledge: &Value,
    document: &Value,
) -> Result<PanelInterpretation, AdvisorError> {
    let engine = RecommendationEngine::new(knowledge_from_value(knowledge)?, AdvisorConfig::default());
    let panel = parse_document_value(document)?.into_validated()?;
    Ok(engine.interpret(&panel.readings))
}
