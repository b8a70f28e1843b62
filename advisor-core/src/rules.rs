//! Declarative dosage rules and the engine that evaluates them.

use std::collections::{hash_map::Entry, HashMap};

use serde::{de, Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::model::{
    Patient, RecommendedSupplement, SupplementCatalog, SupplementDirective, TestReading,
    TestStatus, TimingTable,
};

/// A rule: a predicate plus the directives it contributes when it holds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DosageRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub condition: RuleCondition,
    pub supplements: Vec<SupplementDirective>,
}

impl DosageRule {
    pub fn label(&self) -> &str {
        self.id.as_deref().unwrap_or("<unnamed>")
    }
}

/// The three rule shapes, discriminated by `condition_type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "condition_type", rename_all = "snake_case")]
pub enum RuleCondition {
    SingleTest {
        test_name: String,
        #[serde(
            default,
            deserialize_with = "blank_status_as_none",
            skip_serializing_if = "Option::is_none"
        )]
        test_status: Option<TestStatus>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        test_value_range: Option<ValueRange>,
    },
    Combination {
        #[serde(default)]
        tests: Vec<RequiredTest>,
    },
    PatientCondition {
        condition: String,
    },
}

impl RuleCondition {
    pub fn matches(&self, tests: &[TestReading], patient: &Patient) -> bool {
        match self {
            Self::SingleTest {
                test_name,
                test_status,
                test_value_range,
            } => {
                let Some(test) = find_test(tests, test_name) else {
                    return false;
                };
                let Some(status) = test.status else {
                    return false;
                };
                if test_status.is_some_and(|required| required != status) {
                    return false;
                }
                test_value_range
                    .as_ref()
                    .map_or(true, |range| range.contains(test.value))
            }
            Self::Combination { tests: required } => required.iter().all(|needed| {
                find_test(tests, &needed.name).is_some_and(|test| test.status == Some(needed.status))
            }),
            Self::PatientCondition { condition } => patient.has_condition(condition),
        }
    }
}

/// Optional bounds on a reading's raw value, both inclusive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl ValueRange {
    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequiredTest {
    pub name: String,
    pub status: TestStatus,
}

fn blank_status_as_none<'de, D>(deserializer: D) -> Result<Option<TestStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(label) => label.parse().map(Some).map_err(de::Error::custom),
    }
}

fn find_test<'a>(tests: &'a [TestReading], name: &str) -> Option<&'a TestReading> {
    tests.iter().find(|test| test.name == name)
}

#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    rules: Vec<DosageRule>,
    catalog: SupplementCatalog,
    timing: TimingTable,
}

impl RuleEngine {
    pub fn new(rules: Vec<DosageRule>, catalog: SupplementCatalog, timing: TimingTable) -> Self {
        Self {
            rules,
            catalog,
            timing,
        }
    }

    /// Evaluates every rule and returns the merged, enriched directives.
    ///
    /// Output order follows first discovery; callers sort it.
    pub fn apply_rules(&self, tests: &[TestReading], patient: &Patient) -> Vec<RecommendedSupplement> {
        let mut candidates = Vec::new();

        for rule in &self.rules {
            if !rule.condition.matches(tests, patient) {
                continue;
            }
            debug!(rule = rule.label(), directives = rule.supplements.len(), "rule matched");

            for directive in &rule.supplements {
                match self.resolve(directive) {
                    Some(supplement) => candidates.push(supplement),
                    None => debug!(
                        rule = rule.label(),
                        supplement_id = %directive.supplement_id,
                        "dropping directive for supplement missing from catalog"
                    ),
                }
            }
        }

        merge_directives(candidates)
    }

    fn resolve(&self, directive: &SupplementDirective) -> Option<RecommendedSupplement> {
        let info = self.catalog.get(&directive.supplement_id)?;
        Some(RecommendedSupplement {
            supplement_id: directive.supplement_id.clone(),
            name: info.name.clone(),
            dosage: directive.dosage.clone(),
            timing: self.timing.display_for(&directive.supplement_id),
            priority: directive.priority.clone(),
            reason: directive.reason.clone(),
            contraindications: info.contraindications.clone(),
            interactions: info.interactions.clone(),
        })
    }
}

/// Collapses supplements sharing a `(name, dosage)` key.
///
/// A later entry replaces the kept one only when strictly more urgent, and
/// takes over its slot so the order of first discovery is preserved.
pub fn merge_directives<I>(candidates: I) -> Vec<RecommendedSupplement>
where
    I: IntoIterator<Item = RecommendedSupplement>,
{
    let mut merged: Vec<RecommendedSupplement> = Vec::new();
    let mut slots: HashMap<(String, String), usize> = HashMap::new();

    for candidate in candidates {
        match slots.entry((candidate.name.clone(), candidate.dosage.clone())) {
            Entry::Occupied(slot) => {
                let existing = &mut merged[*slot.get()];
                if candidate.priority_rank() < existing.priority_rank() {
                    *existing = candidate;
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(merged.len());
                merged.push(candidate);
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_range_bounds_are_inclusive_and_optional() {
        let range = ValueRange {
            min: Some(10.0),
            max: None,
        };
        assert!(range.contains(10.0));
        assert!(range.contains(1e9));
        assert!(!range.contains(9.99));

        let open = ValueRange::default();
        assert!(open.contains(0.0));
    }

    #[test]
    fn blank_test_status_is_treated_as_absent() {
        let rule: DosageRule = serde_json::from_str(
            r#"{
                "condition_type": "single_test",
                "test_name": "Cynk",
                "test_status": "",
                "supplements": []
            }"#,
        )
        .unwrap();

        assert_eq!(
            rule.condition,
            RuleCondition::SingleTest {
                test_name: "Cynk".to_string(),
                test_status: None,
                test_value_range: None,
            }
        );
    }

    #[test]
    fn unknown_condition_type_does_not_parse() {
        let parsed = serde_json::from_str::<DosageRule>(
            r#"{"condition_type": "age_band", "supplements": []}"#,
        );
        assert!(parsed.is_err());
    }
}
