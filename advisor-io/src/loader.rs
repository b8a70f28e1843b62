//! Loads the configuration tables from a data directory.
//!
//! Each file wraps its records in an envelope key. Records that do not parse
//! are skipped with a warning so that one bad entry never takes the whole
//! table down; `crate::validate` offers the strict checks.

use std::fs;
use std::path::{Path, PathBuf};

use advisor_core::{
    AdvisorError, DosageRule, KnowledgeBase, ReferenceRange, ReferenceTable, SupplementCatalog,
    SupplementInfo, TestCategories, TestCategory, TimingTable,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

pub const REFERENCE_RANGES_FILE: &str = "reference_ranges.json";
pub const SUPPLEMENTS_FILE: &str = "supplements.json";
pub const TIMING_RULES_FILE: &str = "timing_rules.json";
pub const DOSAGE_RULES_FILE: &str = "dosage_rules.json";
pub const TEST_CATEGORIES_FILE: &str = "test_categories.json";

const INLINE_SOURCE: &str = "<inline>";

#[derive(Debug, Clone)]
pub struct DataLoader {
    data_dir: PathBuf,
}

impl DataLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Reads and parses one JSON file from the data directory.
    pub fn load_json(&self, file_name: &str) -> Result<Value, AdvisorError> {
        read_json_file(&self.data_dir.join(file_name))
    }

    pub fn load_reference_ranges(&self) -> Result<ReferenceTable, AdvisorError> {
        reference_ranges_from_value(&self.load_json(REFERENCE_RANGES_FILE)?, REFERENCE_RANGES_FILE)
    }

    pub fn load_supplements(&self) -> Result<SupplementCatalog, AdvisorError> {
        supplements_from_value(&self.load_json(SUPPLEMENTS_FILE)?, SUPPLEMENTS_FILE)
    }

    pub fn load_timing(&self) -> Result<TimingTable, AdvisorError> {
        timing_from_value(&self.load_json(TIMING_RULES_FILE)?, TIMING_RULES_FILE)
    }

    pub fn load_dosage_rules(&self) -> Result<Vec<DosageRule>, AdvisorError> {
        dosage_rules_from_value(&self.load_json(DOSAGE_RULES_FILE)?, DOSAGE_RULES_FILE)
    }

    /// Test categories from `test_categories.json`; the built-in lists when
    /// the file is absent.
    pub fn load_test_categories(&self) -> Result<TestCategories, AdvisorError> {
        let path = self.data_dir.join(TEST_CATEGORIES_FILE);
        if !path.exists() {
            warn!(path = %path.display(), "test categories file missing, using built-in lists");
            return Ok(TestCategories::default());
        }
        test_categories_from_value(&read_json_file(&path)?, TEST_CATEGORIES_FILE)
    }

    /// Loads every table once.
    pub fn load_knowledge(&self) -> Result<KnowledgeBase, AdvisorError> {
        let knowledge = KnowledgeBase {
            reference_ranges: self.load_reference_ranges()?,
            rules: self.load_dosage_rules()?,
            catalog: self.load_supplements()?,
            timing: self.load_timing()?,
            test_categories: self.load_test_categories()?,
        };
        info!(
            data_dir = %self.data_dir.display(),
            reference_ranges = knowledge.reference_ranges.len(),
            rules = knowledge.rules.len(),
            supplements = knowledge.catalog.len(),
            "knowledge base loaded"
        );
        Ok(knowledge)
    }
}

/// Builds the tables from one object holding every envelope key:
/// `reference_ranges`, `supplements`, `dosage_rules`, `timing_rules` and
/// `timing_display`. `categories` is optional.
pub fn knowledge_from_value(value: &Value) -> Result<KnowledgeBase, AdvisorError> {
    let test_categories = if value.get("categories").is_some() {
        test_categories_from_value(value, INLINE_SOURCE)?
    } else {
        TestCategories::default()
    };
    Ok(KnowledgeBase {
        reference_ranges: reference_ranges_from_value(value, INLINE_SOURCE)?,
        rules: dosage_rules_from_value(value, INLINE_SOURCE)?,
        catalog: supplements_from_value(value, INLINE_SOURCE)?,
        timing: timing_from_value(value, INLINE_SOURCE)?,
        test_categories,
    })
}

pub fn reference_ranges_from_value(
    envelope: &Value,
    source: &str,
) -> Result<ReferenceTable, AdvisorError> {
    let ranges: Vec<ReferenceRange> = parse_records(envelope, "reference_ranges", source)?;
    Ok(ReferenceTable::new(ranges))
}

pub fn supplements_from_value(
    envelope: &Value,
    source: &str,
) -> Result<SupplementCatalog, AdvisorError> {
    let entries: Vec<SupplementInfo> = parse_records(envelope, "supplements", source)?;
    Ok(SupplementCatalog::new(entries))
}

/// Records without a usable `condition_type` are dropped here and so never match.
pub fn dosage_rules_from_value(
    envelope: &Value,
    source: &str,
) -> Result<Vec<DosageRule>, AdvisorError> {
    parse_records(envelope, "dosage_rules", source)
}

pub fn timing_from_value(envelope: &Value, source: &str) -> Result<TimingTable, AdvisorError> {
    if envelope.get("timing_rules").is_none() && envelope.get("timing_display").is_none() {
        return Err(load_error(source, "missing `timing_rules` and `timing_display` keys"));
    }
    TimingTable::deserialize(envelope).map_err(|err| load_error(source, err))
}

/// `{"categories": {"<category>": {"tests": [...]}}}`. Unknown categories
/// and entries without a test list are skipped with a warning.
pub fn test_categories_from_value(
    envelope: &Value,
    source: &str,
) -> Result<TestCategories, AdvisorError> {
    let categories = envelope
        .get("categories")
        .and_then(Value::as_object)
        .ok_or_else(|| load_error(source, "missing `categories` object"))?;

    let parsed = categories.iter().filter_map(|(key, entry)| {
        let category = match key.parse::<TestCategory>() {
            Ok(category) => category,
            Err(err) => {
                warn!(source, category = %key, error = %err, "skipping test category");
                return None;
            }
        };
        match entry.get("tests").map(Vec::<String>::deserialize) {
            Some(Ok(tests)) => Some((category, tests)),
            Some(Err(err)) => {
                warn!(source, category = %key, error = %err, "skipping malformed test list");
                None
            }
            None => {
                warn!(source, category = %key, "skipping category without `tests`");
                None
            }
        }
    });
    Ok(TestCategories::new(parsed))
}

fn parse_records<T: DeserializeOwned>(
    envelope: &Value,
    key: &str,
    source: &str,
) -> Result<Vec<T>, AdvisorError> {
    let records = envelope
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| load_error(source, format!("missing `{key}` array")))?;

    Ok(records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| match T::deserialize(record) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                warn!(source, table = key, index, error = %err, "skipping malformed record");
                None
            }
        })
        .collect())
}

pub(crate) fn read_json_file(path: &Path) -> Result<Value, AdvisorError> {
    if !path.exists() {
        return Err(load_error(path.display(), "file not found"));
    }
    if !path.is_file() {
        return Err(load_error(path.display(), "path is not a file"));
    }

    let content = fs::read_to_string(path).map_err(|err| load_error(path.display(), err))?;
    if content.trim().is_empty() {
        return Err(load_error(path.display(), "file is empty"));
    }

    serde_json::from_str(&content)
        .map_err(|err| load_error(path.display(), format!("invalid JSON: {err}")))
}

fn load_error(path: impl ToString, message: impl ToString) -> AdvisorError {
    AdvisorError::Load {
        path: path.to_string(),
        message: message.to_string(),
    }
}
