//! Data shapes shared by the analyzer, the rule engine and the adapters.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rank given to priority labels outside the known set.
pub const FALLBACK_PRIORITY_RANK: u8 = 4;

/// Timing bucket used when a supplement has no timing rule.
pub const DEFAULT_TIMING_BUCKET: &str = "with_meal";

/// Classification of a reading against its reference band.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Low,
    Normal,
    High,
}

impl TestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

impl FromStr for TestStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            other => Err(format!("unknown test status `{other}`")),
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single blood-test reading, optionally already classified.
///
/// The same type carries analyzed tests: the analyzer returns copies with
/// `status` filled in. `None` means the status is unknown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestReading {
    pub name: String,
    pub value: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TestStatus>,
}

impl TestReading {
    pub fn new(name: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            unit: unit.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: TestStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn status_label(&self) -> &'static str {
        self.status.map(TestStatus::as_str).unwrap_or("unknown")
    }

    pub fn is_abnormal(&self) -> bool {
        matches!(self.status, Some(status) if status != TestStatus::Normal)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub name: String,
    pub surname: String,
    pub age: u8,
    #[serde(default)]
    pub conditions: BTreeSet<String>,
}

impl Patient {
    pub fn has_condition(&self, condition: &str) -> bool {
        self.conditions.contains(condition)
    }
}

/// Inclusive `[min, max]` band; values outside it are low or high.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub fn classify(&self, value: f64) -> TestStatus {
        if value < self.min {
            TestStatus::Low
        } else if value > self.max {
            TestStatus::High
        } else {
            TestStatus::Normal
        }
    }
}

/// Reference range for one test. `min`/`max` are the laboratory band.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceRange {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub unit: String,
    /// Narrower band considered optimal, when the configuration provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functional: Option<Band>,
}

impl ReferenceRange {
    pub fn lab_band(&self) -> Band {
        Band {
            min: self.min,
            max: self.max,
        }
    }
}

/// Reference ranges indexed by exact test name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceTable {
    ranges: HashMap<String, ReferenceRange>,
}

impl ReferenceTable {
    pub fn new(ranges: impl IntoIterator<Item = ReferenceRange>) -> Self {
        let mut table = HashMap::new();
        for range in ranges {
            // The first entry for a name shadows later ones.
            table.entry(range.name.clone()).or_insert(range);
        }
        Self { ranges: table }
    }

    pub fn get(&self, name: &str) -> Option<&ReferenceRange> {
        self.ranges.get(name)
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Urgency of a supplement directive.
///
/// Labels outside the known four are kept verbatim and rank below `low`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
    Unrecognized(String),
}

impl Priority {
    /// Lower rank is more urgent.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
            Self::Unrecognized(_) => FALLBACK_PRIORITY_RANK,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Unrecognized(label) => label,
        }
    }
}

impl From<&str> for Priority {
    fn from(label: &str) -> Self {
        match label {
            "critical" => Self::Critical,
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            other => Self::Unrecognized(other.to_string()),
        }
    }
}

impl From<String> for Priority {
    fn from(label: String) -> Self {
        Self::from(label.as_str())
    }
}

impl From<Priority> for String {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Unrecognized(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A supplement suggestion attached to a dosage rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupplementDirective {
    pub supplement_id: String,
    pub dosage: String,
    pub priority: Priority,
    pub reason: String,
}

/// Catalog entry describing a supplement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupplementInfo {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contraindications: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interactions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupplementCatalog {
    entries: HashMap<String, SupplementInfo>,
}

impl SupplementCatalog {
    /// Builds the catalog; a repeated id replaces the earlier entry.
    pub fn new(entries: impl IntoIterator<Item = SupplementInfo>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|info| (info.id.clone(), info))
                .collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&SupplementInfo> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// When to take each supplement, and how to phrase it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TimingTable {
    /// Supplement id to timing bucket.
    #[serde(default)]
    pub timing_rules: HashMap<String, String>,
    /// Timing bucket to display text.
    #[serde(default)]
    pub timing_display: HashMap<String, String>,
}

impl TimingTable {
    pub fn bucket_for(&self, supplement_id: &str) -> &str {
        self.timing_rules
            .get(supplement_id)
            .map(String::as_str)
            .unwrap_or(DEFAULT_TIMING_BUCKET)
    }

    /// Display text for a supplement's bucket.
    ///
    /// Falls back to the default bucket's text, then to the bucket key.
    pub fn display_for(&self, supplement_id: &str) -> String {
        let bucket = self.bucket_for(supplement_id);
        self.timing_display
            .get(bucket)
            .or_else(|| self.timing_display.get(DEFAULT_TIMING_BUCKET))
            .cloned()
            .unwrap_or_else(|| bucket.to_string())
    }
}

/// One line of the final recommendation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendedSupplement {
    pub supplement_id: String,
    pub name: String,
    pub dosage: String,
    pub timing: String,
    pub priority: Priority,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contraindications: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interactions: Vec<String>,
}

impl RecommendedSupplement {
    pub fn priority_rank(&self) -> u8 {
        self.priority.rank()
    }
}

/// Final output handed to the report formatter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub patient_name: String,
    pub patient_surname: String,
    pub date: DateTime<Utc>,
    pub supplements: Vec<RecommendedSupplement>,
}

impl Recommendation {
    pub fn is_empty(&self) -> bool {
        self.supplements.is_empty()
    }

    /// Supplements whose priority is `critical`.
    pub fn critical(&self) -> impl Iterator<Item = &RecommendedSupplement> {
        self.supplements
            .iter()
            .filter(|supplement| supplement.priority == Priority::Critical)
    }
}
