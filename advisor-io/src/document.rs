//! Patient documents: a combined `{patient, blood_tests}` object or the two
//! parts in separate files.

use std::path::Path;

use advisor_core::{AdvisorError, Patient, TestReading};
use serde::Deserialize;
use serde_json::Value;

use crate::loader::read_json_file;
use crate::validate::{validate_patient, validate_readings, PatientInput, ReadingInput};

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PatientDocument {
    pub patient: PatientInput,
    pub blood_tests: Vec<ReadingInput>,
}

/// A validated patient and readings, ready for the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientPanel {
    pub patient: Patient,
    pub readings: Vec<TestReading>,
}

impl PatientDocument {
    pub fn new(patient: PatientInput, blood_tests: Vec<ReadingInput>) -> Self {
        Self {
            patient,
            blood_tests,
        }
    }

    /// Validates both parts; a document without readings is rejected.
    pub fn into_validated(self) -> Result<PatientPanel, AdvisorError> {
        if self.blood_tests.is_empty() {
            return Err(AdvisorError::MissingData);
        }
        Ok(PatientPanel {
            patient: validate_patient(self.patient)?,
            readings: validate_readings(self.blood_tests)?,
        })
    }
}

pub fn parse_document_str(json: &str) -> Result<PatientDocument, AdvisorError> {
    let value: Value =
        serde_json::from_str(json).map_err(|err| AdvisorError::Parse(err.to_string()))?;
    parse_document_value(&value)
}

pub fn parse_document_value(value: &Value) -> Result<PatientDocument, AdvisorError> {
    let patient = value
        .get("patient")
        .ok_or_else(|| AdvisorError::Parse("missing `patient` key".to_string()))?;
    let blood_tests = value
        .get("blood_tests")
        .ok_or_else(|| AdvisorError::Parse("missing `blood_tests` key".to_string()))?;
    if !blood_tests.is_array() {
        return Err(AdvisorError::Parse("`blood_tests` must be a list".to_string()));
    }

    Ok(PatientDocument {
        patient: parse_patient_value(patient)?,
        blood_tests: parse_blood_tests_value(blood_tests)?,
    })
}

pub fn read_document(path: &Path) -> Result<PatientDocument, AdvisorError> {
    parse_document_value(&read_json_file(path)?)
}

/// Reads a file holding only the patient object.
pub fn read_patient(path: &Path) -> Result<PatientInput, AdvisorError> {
    parse_patient_value(&read_json_file(path)?)
}

/// Reads a file holding only the list of readings.
pub fn read_blood_tests(path: &Path) -> Result<Vec<ReadingInput>, AdvisorError> {
    let value = read_json_file(path)?;
    if !value.is_array() {
        return Err(AdvisorError::Parse("blood tests must be a list".to_string()));
    }
    parse_blood_tests_value(&value)
}

fn parse_patient_value(value: &Value) -> Result<PatientInput, AdvisorError> {
    PatientInput::deserialize(value).map_err(|err| AdvisorError::Parse(format!("patient: {err}")))
}

fn parse_blood_tests_value(value: &Value) -> Result<Vec<ReadingInput>, AdvisorError> {
    Vec::<ReadingInput>::deserialize(value)
        .map_err(|err| AdvisorError::Parse(format!("blood_tests: {err}")))
}
