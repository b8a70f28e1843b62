//! Orchestration from raw readings to the final [`Recommendation`].

use chrono::{DateTime, Utc};
use tracing::info;

use crate::analyzer::StatusAnalyzer;
use crate::interpretation::{PanelInterpretation, PanelInterpreter, TestCategories};
use crate::model::{
    Patient, Recommendation, ReferenceTable, SupplementCatalog, TestReading, TimingTable,
};
use crate::rules::{DosageRule, RuleEngine};
use crate::AdvisorConfig;

/// The immutable configuration tables an engine is built from.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    pub reference_ranges: ReferenceTable,
    pub rules: Vec<DosageRule>,
    pub catalog: SupplementCatalog,
    pub timing: TimingTable,
    pub test_categories: TestCategories,
}

#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    analyzer: StatusAnalyzer,
    rule_engine: RuleEngine,
    interpreter: PanelInterpreter,
}

impl RecommendationEngine {
    pub fn new(knowledge: KnowledgeBase, config: AdvisorConfig) -> Self {
        Self {
            analyzer: StatusAnalyzer::new(knowledge.reference_ranges, config.threshold_type),
            rule_engine: RuleEngine::new(knowledge.rules, knowledge.catalog, knowledge.timing),
            interpreter: PanelInterpreter::new(knowledge.test_categories),
        }
    }

    pub fn analyzer(&self) -> &StatusAnalyzer {
        &self.analyzer
    }

    /// Classifies readings without running the rules.
    pub fn analyze(&self, tests: &[TestReading]) -> Vec<TestReading> {
        self.analyzer.analyze(tests)
    }

    /// Panel-level reading of the raw values; independent of the rules.
    pub fn interpret(&self, tests: &[TestReading]) -> PanelInterpretation {
        self.interpreter.interpret(tests)
    }

    pub fn generate(&self, patient: &Patient, tests: &[TestReading]) -> Recommendation {
        self.generate_at(patient, tests, Utc::now())
    }

    /// Same as [`generate`](Self::generate) with an explicit timestamp.
    pub fn generate_at(
        &self,
        patient: &Patient,
        tests: &[TestReading],
        date: DateTime<Utc>,
    ) -> Recommendation {
        let analyzed = self.analyzer.analyze(tests);
        let mut supplements = self.rule_engine.apply_rules(&analyzed, patient);
        // Stable: equal ranks keep merge order.
        supplements.sort_by_key(|supplement| supplement.priority_rank());

        info!(
            tests = analyzed.len(),
            abnormal = analyzed.iter().filter(|test| test.is_abnormal()).count(),
            supplements = supplements.len(),
            "recommendation generated"
        );

        Recommendation {
            patient_name: patient.name.clone(),
            patient_surname: patient.surname.clone(),
            date,
            supplements,
        }
    }
}
