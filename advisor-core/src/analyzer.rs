//! Classifies readings against configured reference ranges.

use serde::{Deserialize, Serialize};

use crate::model::{Band, ReferenceRange, ReferenceTable, TestReading};

/// Which reference band decides a reading's status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdType {
    /// The optimal band, or the lab band for ranges without one.
    #[default]
    Functional,
    /// The laboratory band.
    Lab,
}

impl ThresholdType {
    fn band_for(self, range: &ReferenceRange) -> Band {
        match self {
            Self::Functional => range.functional.unwrap_or_else(|| range.lab_band()),
            Self::Lab => range.lab_band(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatusAnalyzer {
    ranges: ReferenceTable,
    threshold_type: ThresholdType,
}

impl StatusAnalyzer {
    pub fn new(ranges: ReferenceTable, threshold_type: ThresholdType) -> Self {
        Self {
            ranges,
            threshold_type,
        }
    }

    pub fn threshold_type(&self) -> ThresholdType {
        self.threshold_type
    }

    /// Returns the readings with their status recomputed.
    ///
    /// Readings without a configured range keep whatever status they came with.
    pub fn analyze(&self, tests: &[TestReading]) -> Vec<TestReading> {
        tests
            .iter()
            .map(|test| {
                let mut analyzed = test.clone();
                if let Some(range) = self.ranges.get(&test.name) {
                    analyzed.status = Some(self.threshold_type.band_for(range).classify(test.value));
                }
                analyzed
            })
            .collect()
    }

    /// Readings with a status other than normal, in input order.
    pub fn get_abnormal(&self, tests: &[TestReading]) -> Vec<TestReading> {
        tests.iter().filter(|test| test.is_abnormal()).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TestStatus;

    fn range_with_functional() -> ReferenceRange {
        ReferenceRange {
            name: "Ferrytyna".to_string(),
            min: 15.0,
            max: 150.0,
            unit: "ng/mL".to_string(),
            functional: Some(Band {
                min: 50.0,
                max: 90.0,
            }),
        }
    }

    #[test]
    fn functional_band_is_preferred_when_present() {
        let range = range_with_functional();
        assert_eq!(ThresholdType::Functional.band_for(&range).min, 50.0);
        assert_eq!(ThresholdType::Lab.band_for(&range).min, 15.0);
    }

    #[test]
    fn functional_falls_back_to_lab_band() {
        let mut range = range_with_functional();
        range.functional = None;
        let band = ThresholdType::Functional.band_for(&range);
        assert_eq!(band, range.lab_band());
        assert_eq!(band.classify(15.0), TestStatus::Normal);
    }
}
