use advisor_core::{
    Band, ReferenceRange, ReferenceTable, StatusAnalyzer, TestReading, TestStatus, ThresholdType,
};

fn range(name: &str, min: f64, max: f64, unit: &str) -> ReferenceRange {
    ReferenceRange {
        name: name.to_string(),
        min,
        max,
        unit: unit.to_string(),
        functional: None,
    }
}

fn analyzer() -> StatusAnalyzer {
    StatusAnalyzer::new(
        ReferenceTable::new(vec![
            range("Witamina D", 30.0, 100.0, "ng/mL"),
            range("Witamina B12", 197.0, 866.0, "pg/mL"),
            range("Żelazo", 60.0, 170.0, "ug/dL"),
        ]),
        ThresholdType::default(),
    )
}

fn status_of(analyzer: &StatusAnalyzer, name: &str, value: f64) -> Option<TestStatus> {
    analyzer.analyze(&[TestReading::new(name, value, "ng/mL")])[0].status
}

#[test]
fn classifies_low_high_and_normal() {
    let analyzer = analyzer();
    assert_eq!(status_of(&analyzer, "Witamina D", 22.0), Some(TestStatus::Low));
    assert_eq!(status_of(&analyzer, "Witamina D", 110.0), Some(TestStatus::High));
    assert_eq!(status_of(&analyzer, "Witamina D", 50.0), Some(TestStatus::Normal));
}

#[test]
fn range_bounds_are_normal() {
    let analyzer = analyzer();
    assert_eq!(status_of(&analyzer, "Witamina D", 30.0), Some(TestStatus::Normal));
    assert_eq!(status_of(&analyzer, "Witamina D", 100.0), Some(TestStatus::Normal));
}

#[test]
fn name_lookup_is_exact_and_case_sensitive() {
    let analyzer = analyzer();
    assert_eq!(status_of(&analyzer, "witamina d", 22.0), None);
    assert_eq!(status_of(&analyzer, "Witamina D ", 22.0), None);
}

#[test]
fn unconfigured_tests_keep_their_incoming_status() {
    let analyzer = analyzer();
    let tests = vec![
        TestReading::new("Magnez", 1.5, "mg/dL").with_status(TestStatus::High),
        TestReading::new("Cynk", 90.0, "ug/dL"),
    ];

    let analyzed = analyzer.analyze(&tests);

    assert_eq!(analyzed[0].status, Some(TestStatus::High));
    assert_eq!(analyzed[1].status, None);
    assert_eq!(analyzed[1].status_label(), "unknown");
}

#[test]
fn configured_range_overwrites_incoming_status() {
    let analyzer = analyzer();
    let tests = vec![TestReading::new("Witamina D", 50.0, "ng/mL").with_status(TestStatus::Low)];

    assert_eq!(analyzer.analyze(&tests)[0].status, Some(TestStatus::Normal));
}

#[test]
fn analysis_preserves_order_and_values() {
    let analyzer = analyzer();
    let tests = vec![
        TestReading::new("Żelazo", 45.0, "ug/dL"),
        TestReading::new("Magnez", 1.5, "mg/dL"),
        TestReading::new("Witamina B12", 1200.0, "pg/mL"),
    ];

    let analyzed = analyzer.analyze(&tests);

    let names: Vec<&str> = analyzed.iter().map(|test| test.name.as_str()).collect();
    assert_eq!(names, vec!["Żelazo", "Magnez", "Witamina B12"]);
    assert_eq!(analyzed[0].value, 45.0);
    assert_eq!(analyzed[2].unit, "pg/mL");
}

#[test]
fn get_abnormal_is_an_order_preserving_filter() {
    let analyzer = analyzer();
    let tests = vec![
        TestReading::new("A", 1.0, "u").with_status(TestStatus::High),
        TestReading::new("B", 1.0, "u").with_status(TestStatus::Normal),
        TestReading::new("C", 1.0, "u"),
        TestReading::new("D", 1.0, "u").with_status(TestStatus::Low),
    ];

    let abnormal = analyzer.get_abnormal(&tests);

    let names: Vec<&str> = abnormal.iter().map(|test| test.name.as_str()).collect();
    assert_eq!(names, vec!["A", "D"]);
}

#[test]
fn threshold_type_selects_the_band() {
    let mut ferritin = range("Ferrytyna", 15.0, 150.0, "ng/mL");
    ferritin.functional = Some(Band {
        min: 50.0,
        max: 90.0,
    });
    let table = ReferenceTable::new(vec![ferritin]);
    let reading = [TestReading::new("Ferrytyna", 30.0, "ng/mL")];

    let functional = StatusAnalyzer::new(table.clone(), ThresholdType::Functional);
    let lab = StatusAnalyzer::new(table, ThresholdType::Lab);

    assert_eq!(functional.analyze(&reading)[0].status, Some(TestStatus::Low));
    assert_eq!(lab.analyze(&reading)[0].status, Some(TestStatus::Normal));
}

#[test]
fn first_duplicate_reference_range_wins() {
    let table = ReferenceTable::new(vec![
        range("TSH", 0.5, 2.5, "uIU/mL"),
        range("TSH", 0.27, 4.2, "uIU/mL"),
    ]);
    let analyzer = StatusAnalyzer::new(table, ThresholdType::Lab);

    assert_eq!(status_of(&analyzer, "TSH", 3.0), Some(TestStatus::High));
}
