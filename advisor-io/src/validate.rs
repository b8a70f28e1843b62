//! Input validation and strict configuration checks.

use advisor_core::{
    AdvisorError, DosageRule, Patient, ReferenceRange, SupplementInfo, TestReading, TestStatus,
    TimingTable, DEFAULT_TIMING_BUCKET,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

pub const MAX_PATIENT_AGE: i64 = 150;

/// Patient data as it arrives from a document, before validation.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PatientInput {
    pub name: String,
    pub surname: String,
    pub age: i64,
    #[serde(default)]
    pub conditions: Vec<String>,
}

/// A reading as it arrives from a document, before validation.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ReadingInput {
    pub name: String,
    pub value: f64,
    pub unit: String,
    #[serde(default)]
    pub status: Option<TestStatus>,
}

pub fn validate_patient(input: PatientInput) -> Result<Patient, AdvisorError> {
    if input.name.is_empty() {
        return Err(AdvisorError::validation("patient.name", "must not be empty"));
    }
    if input.surname.is_empty() {
        return Err(AdvisorError::validation("patient.surname", "must not be empty"));
    }
    let age = u8::try_from(input.age)
        .ok()
        .filter(|age| i64::from(*age) <= MAX_PATIENT_AGE)
        .ok_or_else(|| {
            AdvisorError::validation(
                "patient.age",
                format!("{} is outside 0..={MAX_PATIENT_AGE}", input.age),
            )
        })?;

    Ok(Patient {
        name: input.name,
        surname: input.surname,
        age,
        conditions: input.conditions.into_iter().collect(),
    })
}

pub fn validate_readings(inputs: Vec<ReadingInput>) -> Result<Vec<TestReading>, AdvisorError> {
    inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| validate_reading(index, input))
        .collect()
}

fn validate_reading(index: usize, input: ReadingInput) -> Result<TestReading, AdvisorError> {
    let field = |name: &str| format!("blood_tests[{index}].{name}");

    if input.name.is_empty() {
        return Err(AdvisorError::validation(field("name"), "must not be empty"));
    }
    if input.unit.is_empty() {
        return Err(AdvisorError::validation(field("unit"), "must not be empty"));
    }
    if !input.value.is_finite() || input.value < 0.0 {
        return Err(AdvisorError::validation(
            field("value"),
            format!("{} is not a finite non-negative number", input.value),
        ));
    }

    Ok(TestReading {
        name: input.name,
        value: input.value,
        unit: input.unit,
        status: input.status,
    })
}

/// Rejects every reference range the loader would skip, plus inverted bounds.
pub fn validate_reference_ranges(data: &Value) -> Result<(), AdvisorError> {
    for (index, range) in records(data, "reference_ranges")?.iter().enumerate() {
        require_keys(range, &["name", "min", "max", "unit"], "reference_ranges", "Reference range", index)?;

        let range: ReferenceRange = typed_record(range, "reference_ranges", index)?;
        if range.min > range.max {
            return Err(AdvisorError::validation(
                "reference_ranges",
                format!(
                    "Reference range at index {index} has min {} above max {}",
                    range.min, range.max
                ),
            ));
        }
    }
    Ok(())
}

pub fn validate_supplements(data: &Value) -> Result<(), AdvisorError> {
    for (index, supplement) in records(data, "supplements")?.iter().enumerate() {
        require_keys(supplement, &["id", "name", "condition"], "supplements", "Supplement", index)?;
        typed_record::<SupplementInfo>(supplement, "supplements", index)?;
    }
    Ok(())
}

/// Fails on the first rule the loader would drop.
pub fn validate_dosage_rules(data: &Value) -> Result<(), AdvisorError> {
    for (index, rule) in records(data, "dosage_rules")?.iter().enumerate() {
        require_keys(rule, &["condition_type", "supplements"], "dosage_rules", "Rule", index)?;
        typed_record::<DosageRule>(rule, "dosage_rules", index)?;
    }
    Ok(())
}

/// The default timing bucket must have display text.
pub fn validate_timing(data: &Value) -> Result<(), AdvisorError> {
    let display = data
        .get("timing_display")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            AdvisorError::validation("timing_display", "Missing 'timing_display' key in data")
        })?;

    TimingTable::deserialize(data)
        .map_err(|err| AdvisorError::validation("timing_rules", err.to_string()))?;

    if !display.contains_key(DEFAULT_TIMING_BUCKET) {
        return Err(AdvisorError::validation(
            "timing_display",
            format!("No display text for the default bucket '{DEFAULT_TIMING_BUCKET}'"),
        ));
    }
    Ok(())
}

fn records<'a>(data: &'a Value, key: &str) -> Result<&'a Vec<Value>, AdvisorError> {
    data.get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| AdvisorError::validation(key, format!("Missing '{key}' key in data")))
}

fn typed_record<T: DeserializeOwned>(
    record: &Value,
    table: &str,
    index: usize,
) -> Result<T, AdvisorError> {
    T::deserialize(record)
        .map_err(|err| AdvisorError::validation(format!("{table}[{index}]"), err.to_string()))
}

fn require_keys(
    record: &Value,
    keys: &[&str],
    field: &str,
    what: &str,
    index: usize,
) -> Result<(), AdvisorError> {
    if keys.iter().all(|key| record.get(key).is_some()) {
        return Ok(());
    }
    Err(AdvisorError::validation(
        field,
        format!(
            "{what} at index {index} missing required fields ({})",
            keys.join(", ")
        ),
    ))
}
