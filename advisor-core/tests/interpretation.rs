use advisor_core::interpretation::{
    analyze_glucose_curve, analyze_insulin_curve, homa_ir, interpret_hormone_ratios,
    interpret_lipid_profile, interpret_liver_panel, interpret_thyroid_panel, CardiovascularRisk,
    LipidPanel, LiverPattern, MorphologyPattern, PanelStatus, RatioKind, RatioStatus,
};
use advisor_core::{
    AdvisorConfig, CriticalIssue, KnowledgeBase, PanelInterpreter, RecommendationEngine,
    TestCategories, TestCategory, TestReading, TestStatus,
};

fn reading(name: &str, value: f64) -> TestReading {
    TestReading::new(name, value, "")
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

#[test]
fn readings_are_grouped_case_insensitively() {
    let categories = TestCategories::default();
    assert_eq!(categories.category_of("crp"), Some(TestCategory::Inflammatory));
    assert_eq!(categories.category_of("Żelazo"), Some(TestCategory::MineralsVitamins));
    assert_eq!(categories.category_of("Nieznany"), None);

    let interpretation = PanelInterpreter::default().interpret(&[
        reading("Ferrytyna", 30.0),
        reading("crp", 1.2),
        reading("Magnez", 2.0),
        reading("Nieznany", 1.0),
    ]);

    let grouped: Vec<TestCategory> = interpretation.categories.keys().copied().collect();
    assert_eq!(
        grouped,
        vec![TestCategory::Inflammatory, TestCategory::MineralsVitamins, TestCategory::Electrolytes]
    );
    assert_eq!(interpretation.categories[&TestCategory::Inflammatory][0].name, "crp");
    assert!(interpretation.thyroid.is_none());
    assert!(interpretation.critical_issues.is_empty());
}

#[test]
fn custom_categories_replace_the_builtin_lists() {
    let interpreter =
        PanelInterpreter::new(TestCategories::new([(TestCategory::Thyroid, vec!["TSH-3G"])]));

    let interpretation = interpreter.interpret(&[reading("tsh-3g", 1.0), reading("MCV", 75.0)]);

    assert_eq!(interpretation.categories.len(), 1);
    assert!(interpretation.categories.contains_key(&TestCategory::Thyroid));
    assert!(interpretation.morphology.is_none());
}

#[test]
fn empty_panel_has_nothing_to_say() {
    let interpretation = PanelInterpreter::default().interpret(&[]);
    assert!(interpretation.is_empty());
    assert!(interpretation.critical_issues.is_empty());
    assert!(interpretation.suggested_supplements().is_empty());
}

#[test]
fn homa_ir_divides_by_405() {
    assert_eq!(homa_ir(90.0, 9.0), 2.0);
    assert_eq!(homa_ir(81.0, 7.5), 1.5);
}

#[test]
fn insulin_resistance_needs_homa_ir_above_threshold() {
    let borderline = PanelInterpreter::default()
        .interpret(&[reading("Glukoza", 81.0), reading("Insulina", 7.5)]);
    let panel = borderline.glucose_insulin.expect("glucose panel");
    assert_eq!(panel.homa_ir, Some(1.5));
    assert!(!panel.insulin_resistance);
    assert_eq!(panel.overall_status, PanelStatus::Normal);
    assert!(panel.supplements.is_empty());

    let resistant = PanelInterpreter::default().interpret(&[
        reading("Glukoza", 90.0),
        reading("Glukoza 1h", 150.0),
        reading("Glukoza 2h", 95.0),
        reading("Insulina", 9.0),
        reading("Insulina 1h", 60.0),
        reading("HbA1c", 5.6),
    ]);
    let panel = resistant.glucose_insulin.clone().expect("glucose panel");
    assert_eq!(panel.homa_ir, Some(2.0));
    assert!(panel.insulin_resistance);
    assert_eq!(panel.supplements, strings(&["NAC", "Inozytol", "Berberyna", "Lactibiane CND"]));
    assert_eq!(panel.hba1c_status, Some(advisor_core::interpretation::HbA1cStatus::High));

    let glucose = panel.glucose_curve.expect("glucose curve");
    assert_eq!(glucose.fasting_status, TestStatus::High);
    assert_eq!((glucose.peak_minutes, glucose.peak_value), (60, 150.0));
    let minutes: Vec<u16> = glucose.points.iter().map(|point| point.minutes).collect();
    assert_eq!(minutes, vec![0, 60, 120]);

    let insulin = panel.insulin_curve.expect("insulin curve");
    assert_eq!(insulin.fasting_status, TestStatus::High);
    assert_eq!(insulin.points[1].status, TestStatus::High);

    assert_eq!(resistant.critical_issues, vec![CriticalIssue::InsulinResistance]);
}

#[test]
fn homa_ir_needs_both_fasting_values() {
    let interpretation = PanelInterpreter::default().interpret(&[reading("Glukoza", 95.0)]);
    let panel = interpretation.glucose_insulin.expect("glucose panel");
    assert_eq!(panel.homa_ir, None);
    assert!(panel.insulin_curve.is_none());
    assert!(!panel.insulin_resistance);
}

#[test]
fn curves_are_sorted_and_classified_per_timepoint() {
    let glucose = analyze_glucose_curve(&[(120, 95.0), (0, 80.0), (60, 150.0)]);
    let statuses: Vec<TestStatus> = glucose.points.iter().map(|point| point.status).collect();
    assert_eq!(statuses, vec![TestStatus::Normal, TestStatus::High, TestStatus::Normal]);
    assert_eq!(glucose.fasting_status, TestStatus::Normal);

    let insulin = analyze_insulin_curve(&[(0, 2.0), (60, 30.0), (120, 30.0)]);
    assert_eq!(insulin.fasting_status, TestStatus::Low);
    assert_eq!(insulin.points[0].status, TestStatus::Low);
    assert_eq!((insulin.peak_minutes, insulin.peak_value), (60, 30.0));
}

#[test]
fn high_tsh_and_low_ft3_suggest_thyroid_support() {
    let thyroid = interpret_thyroid_panel(3.1, Some(2.5), None);

    assert_eq!(thyroid.tsh_status, TestStatus::High);
    assert_eq!(thyroid.overall_status, PanelStatus::Abnormal);
    assert!(thyroid.ft3_percentage.is_some_and(|pct| (pct - 25.0).abs() < 1e-9));
    assert_eq!(thyroid.ft4_percentage, None);
    assert_eq!(
        thyroid.supplements,
        strings(&["Selen", "Cynk", "Tyrozyna", "Hepaset", "Maślan sodu"])
    );
}

#[test]
fn missing_ft3_adds_no_ft3_suggestions() {
    let thyroid = interpret_thyroid_panel(1.5, None, None);
    assert_eq!(thyroid.tsh_status, TestStatus::Normal);
    assert_eq!(thyroid.overall_status, PanelStatus::Normal);
    assert!(thyroid.supplements.is_empty());

    let low = interpret_thyroid_panel(0.3, None, Some(1.3));
    assert_eq!(low.tsh_status, TestStatus::Low);
    assert_eq!(low.supplements, strings(&["Koenzym Q10"]));
    assert!(low.ft4_percentage.is_some());
}

#[test]
fn lipid_ratios_and_cardiovascular_risk() {
    let high = interpret_lipid_profile(LipidPanel {
        cholesterol: 250.0,
        hdl: 40.0,
        ldl: 170.0,
        tg: 200.0,
    });
    assert_eq!(high.cardiovascular_risk, CardiovascularRisk::High);
    assert_eq!(high.overall_status, PanelStatus::Abnormal);
    let kinds: Vec<(RatioKind, RatioStatus)> =
        high.ratios.iter().map(|ratio| (ratio.kind, ratio.status)).collect();
    assert_eq!(
        kinds,
        vec![(RatioKind::HdlLdl, RatioStatus::Low), (RatioKind::HdlTg, RatioStatus::Low)]
    );
    assert_eq!(high.supplements, strings(&["Omega 3", "Omega 6", "Cholina"]));

    let moderate = interpret_lipid_profile(LipidPanel {
        cholesterol: 0.0,
        hdl: 70.0,
        ldl: 140.0,
        tg: 90.0,
    });
    assert_eq!(moderate.cardiovascular_risk, CardiovascularRisk::Moderate);
    assert_eq!(moderate.ratios[0].status, RatioStatus::Normal);
    assert!(moderate.supplements.is_empty());

    let optimal = interpret_lipid_profile(LipidPanel {
        cholesterol: 180.0,
        hdl: 80.0,
        ldl: 100.0,
        tg: 70.0,
    });
    assert_eq!(optimal.cardiovascular_risk, CardiovascularRisk::Low);
    assert_eq!(optimal.overall_status, PanelStatus::Normal);
    assert_eq!(optimal.ratios[1].status, RatioStatus::Optimal);
}

#[test]
fn liver_patterns_follow_the_ast_alt_ratio() {
    assert_eq!(interpret_liver_panel(50.0, 20.0, 10.0).pattern, Some(LiverPattern::AlcoholicDamage));
    assert_eq!(
        interpret_liver_panel(15.0, 30.0, 40.0).pattern,
        Some(LiverPattern::FattyLiverOrInsulinResistance)
    );
    assert_eq!(interpret_liver_panel(25.0, 25.0, 10.0).pattern, Some(LiverPattern::Hepatitis));

    let healthy = interpret_liver_panel(15.0, 20.0, 10.0);
    assert_eq!(healthy.pattern, None);
    assert_eq!(healthy.overall_status, PanelStatus::Normal);
    assert!(healthy.supplements.is_empty());

    let without_alt = interpret_liver_panel(30.0, 0.0, 0.0);
    assert_eq!(without_alt.ast_alt_ratio, 0.0);
    assert_eq!(without_alt.pattern, Some(LiverPattern::Hepatitis));
}

#[test]
fn hormone_ratios_flag_imbalances() {
    let imbalanced = interpret_hormone_ratios(12.0, 4.0, 150.0, 0.2);
    assert_eq!(imbalanced.overall_status, PanelStatus::Abnormal);
    assert_eq!(imbalanced.ratios.len(), 2);
    assert_eq!(imbalanced.ratios[0].kind, RatioKind::LhFsh);
    assert_eq!(imbalanced.ratios[0].status, RatioStatus::High);
    assert_eq!(imbalanced.ratios[0].supplements, strings(&["myo-inozytol"]));
    assert_eq!(imbalanced.ratios[1].kind, RatioKind::EstradiolProgesterone);
    assert_eq!(imbalanced.ratios[1].supplements, strings(&["dim", "inozytol", "nac"]));

    let balanced = interpret_hormone_ratios(5.0, 5.0, 0.0, 0.0);
    assert_eq!(balanced.ratios.len(), 1);
    assert_eq!(balanced.overall_status, PanelStatus::Normal);
}

#[test]
fn morphology_patterns_become_critical_deficiencies() {
    let interpretation = PanelInterpreter::default().interpret(&[
        reading("MCV", 75.0),
        reading("MCH", 25.0),
        reading("Neutrofile", 35.0),
        reading("AST", 50.0),
        reading("ALT", 20.0),
    ]);

    let morphology = interpretation.morphology.as_ref().expect("morphology panel");
    assert_eq!(
        morphology.patterns,
        vec![MorphologyPattern::MicrocyticAnemia, MorphologyPattern::Neutropenia]
    );
    assert_eq!(morphology.deficiencies, strings(&["iron", "copper", "B6", "B12", "B9"]));

    let nutrients: Vec<CriticalIssue> = ["iron", "copper", "B6", "B12", "B9"]
        .iter()
        .map(|nutrient| CriticalIssue::Deficiency {
            nutrient: nutrient.to_string(),
        })
        .chain([CriticalIssue::Liver {
            pattern: LiverPattern::AlcoholicDamage,
        }])
        .collect();
    assert_eq!(interpretation.critical_issues, nutrients);

    assert_eq!(
        interpretation.suggested_supplements(),
        strings(&[
            "Żelazo",
            "Miedź",
            "Witaminy z gr. B",
            "L-Glutamina",
            "Hepaset",
            "Ostropest",
            "Liver Complex",
        ])
    );
}

#[test]
fn engine_interprets_with_its_knowledge_categories() {
    let engine = RecommendationEngine::new(KnowledgeBase::default(), AdvisorConfig::default());

    let interpretation = engine.interpret(&[reading("TSH", 4.0), reading("LDL", 180.0)]);

    assert_eq!(
        interpretation.critical_issues,
        vec![CriticalIssue::ThyroidAbnormal, CriticalIssue::CardiovascularRiskHigh]
    );
    assert!(interpretation.categories.contains_key(&TestCategory::Thyroid));
    assert!(interpretation.categories.contains_key(&TestCategory::Lipids));
}
