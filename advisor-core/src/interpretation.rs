//! Panel-level interpretation of a blood-test panel.
//!
//! Groups readings into categories and reads the morphology, thyroid, lipid,
//! liver, hormone and glucose/insulin panels as a whole. Unlike the
//! [`StatusAnalyzer`](crate::StatusAnalyzer), test names are matched
//! case-insensitively here and the thresholds are fixed clinical constants.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{TestReading, TestStatus};

/// HOMA-IR = fasting glucose (mg/dL) * fasting insulin (uU/mL) / 405.
pub const HOMA_IR_DIVISOR: f64 = 405.0;

/// HOMA-IR above this value indicates insulin resistance.
pub const HOMA_IR_RESISTANCE_THRESHOLD: f64 = 1.5;

/// FT3 laboratory reference band (pmol/L) used for the percentage position.
pub const FT3_REFERENCE: (f64, f64) = (1.8, 4.6);

/// FT4 laboratory reference band (ng/dL) used for the percentage position.
pub const FT4_REFERENCE: (f64, f64) = (0.93, 1.7);

const TSH_OPTIMAL: (f64, f64) = (0.5, 2.5);
const GLUCOSE_FASTING: (f64, f64) = (70.0, 87.0);
const INSULIN_FASTING: (f64, f64) = (3.0, 6.0);
const HBA1C_OPTIMAL: (f64, f64) = (4.8, 5.2);

/// Optimal glucose (mg/dL) per minutes after the load.
const GLUCOSE_CURVE_OPTIMAL: [(u16, f64, f64); 4] =
    [(0, 70.0, 87.0), (60, 120.0, 140.0), (120, 0.0, 100.0), (180, 70.0, 90.0)];

/// Optimal insulin (uU/mL) per minutes after the load.
const INSULIN_CURVE_OPTIMAL: [(u16, f64, f64); 4] =
    [(0, 5.0, 6.0), (60, 0.0, 45.0), (120, 0.0, 30.0), (180, 0.0, 10.0)];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TestCategory {
    Morphology,
    Inflammatory,
    MineralsVitamins,
    Electrolytes,
    Thyroid,
    Lipids,
    Liver,
    Hormones,
    GlucoseInsulin,
}

impl TestCategory {
    pub const ALL: [TestCategory; 9] = [
        Self::Morphology,
        Self::Inflammatory,
        Self::MineralsVitamins,
        Self::Electrolytes,
        Self::Thyroid,
        Self::Lipids,
        Self::Liver,
        Self::Hormones,
        Self::GlucoseInsulin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Morphology => "morphology",
            Self::Inflammatory => "inflammatory",
            Self::MineralsVitamins => "minerals_vitamins",
            Self::Electrolytes => "electrolytes",
            Self::Thyroid => "thyroid",
            Self::Lipids => "lipids",
            Self::Liver => "liver",
            Self::Hormones => "hormones",
            Self::GlucoseInsulin => "glucose_insulin",
        }
    }

    fn builtin_tests(self) -> &'static [&'static str] {
        match self {
            Self::Morphology => &[
                "EOZYNOFILE", "LEUKOCYTY", "LIMFOCYTY", "NEUTROFILE", "BAZOFILE", "MONOCYTY",
                "WBC", "HEMOGLOBINA", "ERYTROCYTY", "HEMATOKRYT", "MCV", "MCH", "MCHC", "RDW",
                "PDW", "PCT", "MPV",
            ],
            Self::Inflammatory => &["CRP", "OB"],
            Self::MineralsVitamins => &[
                "ŻELAZO", "FERRYTYNA", "TRANSFERYNA", "WITAMINA B12", "MMA", "WITAMINA B9",
                "WITAMINA D3", "HOMOCYSTEINA", "CYNK", "SELEN", "FOSFATAZA ALKALICZNA",
                "CERULOPLAZMINA", "PEROKSYDAZA GLUTATIONOWA", "JOD W MOCZU", "ENZYM DAO",
            ],
            Self::Electrolytes => &["SÓD", "POTAS", "MAGNEZ", "FOSFOR"],
            Self::Thyroid => &["TSH", "FT3", "FT4", "ANTY-TG", "ANTY-TPO", "TRAB"],
            Self::Lipids => &["CHOLESTEROL", "HDL", "LDL", "TG", "TRÓGLICERYDY"],
            Self::Liver => &["AST", "ALT", "GGTP"],
            Self::Hormones => &[
                "TESTOSTERON", "DHT", "DHEAS", "ANDROSTENDION", "SHBG", "PROGESTERON",
                "ESTRADIOL", "LH", "FSH", "PROLAKTYNA", "KORTYZOL",
            ],
            Self::GlucoseInsulin => &["GLUKOZA", "INSULINA", "HBA1C", "HOMA-IR"],
        }
    }
}

impl FromStr for TestCategory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
            .ok_or_else(|| format!("unknown test category `{value}`"))
    }
}

impl fmt::Display for TestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Test names per category, stored upper-cased.
#[derive(Debug, Clone, PartialEq)]
pub struct TestCategories {
    members: BTreeMap<TestCategory, BTreeSet<String>>,
}

impl TestCategories {
    /// Builds the table; names listed for a repeated category are added up.
    pub fn new<I, N>(categories: I) -> Self
    where
        I: IntoIterator<Item = (TestCategory, Vec<N>)>,
        N: AsRef<str>,
    {
        let mut members: BTreeMap<TestCategory, BTreeSet<String>> = BTreeMap::new();
        for (category, names) in categories {
            members
                .entry(category)
                .or_default()
                .extend(names.iter().map(|name| name.as_ref().to_uppercase()));
        }
        Self { members }
    }

    /// First category, in declaration order, listing `name`.
    pub fn category_of(&self, name: &str) -> Option<TestCategory> {
        let key = name.to_uppercase();
        self.members
            .iter()
            .find(|(_, names)| names.contains(&key))
            .map(|(category, _)| *category)
    }

    pub fn contains(&self, category: TestCategory, name: &str) -> bool {
        self.members
            .get(&category)
            .is_some_and(|names| names.contains(&name.to_uppercase()))
    }

    /// Readings belonging to `category`, in input order.
    pub fn select(&self, category: TestCategory, tests: &[TestReading]) -> Vec<TestReading> {
        tests
            .iter()
            .filter(|test| self.contains(category, &test.name))
            .cloned()
            .collect()
    }
}

impl Default for TestCategories {
    fn default() -> Self {
        Self::new(
            TestCategory::ALL
                .into_iter()
                .map(|category| (category, category.builtin_tests().to_vec())),
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PanelStatus {
    Normal,
    Abnormal,
}

impl PanelStatus {
    fn abnormal_if(flag: bool) -> Self {
        if flag {
            Self::Abnormal
        } else {
            Self::Normal
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MorphologyPattern {
    MicrocyticAnemia,
    MegaloblasticAnemia,
    Neutropenia,
}

impl MorphologyPattern {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MicrocyticAnemia => "microcytic_anemia",
            Self::MegaloblasticAnemia => "megaloblastic_anemia",
            Self::Neutropenia => "neutropenia",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MorphologyInterpretation {
    pub overall_status: PanelStatus,
    pub patterns: Vec<MorphologyPattern>,
    pub deficiencies: Vec<String>,
    pub supplements: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RatioKind {
    HdlLdl,
    HdlTg,
    LhFsh,
    EstradiolProgesterone,
}

impl RatioKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::HdlLdl => "HDL:LDL",
            Self::HdlTg => "HDL:TG",
            Self::LhFsh => "LH:FSH",
            Self::EstradiolProgesterone => "Estradiol:Progesteron",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RatioStatus {
    Low,
    Normal,
    Optimal,
    High,
}

impl RatioStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::Optimal => "optimal",
            Self::High => "high",
        }
    }

    fn is_off(self) -> bool {
        matches!(self, Self::Low | Self::High)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatioAnalysis {
    pub kind: RatioKind,
    pub value: f64,
    pub optimal_range: String,
    pub status: RatioStatus,
    pub supplements: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum CardiovascularRisk {
    Low,
    Moderate,
    High,
}

/// Lipid values in mg/dL; zero means "not measured".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LipidPanel {
    pub cholesterol: f64,
    pub hdl: f64,
    pub ldl: f64,
    pub tg: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LipidInterpretation {
    pub overall_status: PanelStatus,
    pub ratios: Vec<RatioAnalysis>,
    pub cardiovascular_risk: CardiovascularRisk,
    pub supplements: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThyroidInterpretation {
    pub overall_status: PanelStatus,
    pub tsh_status: TestStatus,
    /// Position of FT3 inside its reference band, in percent.
    pub ft3_percentage: Option<f64>,
    pub ft4_percentage: Option<f64>,
    pub supplements: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LiverPattern {
    AlcoholicDamage,
    FattyLiverOrInsulinResistance,
    Hepatitis,
}

impl LiverPattern {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AlcoholicDamage => "alcoholic_damage",
            Self::FattyLiverOrInsulinResistance => "fatty_liver_or_insulin_resistance",
            Self::Hepatitis => "hepatitis",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LiverInterpretation {
    pub overall_status: PanelStatus,
    /// AST divided by ALT, zero when ALT is missing.
    pub ast_alt_ratio: f64,
    pub pattern: Option<LiverPattern>,
    pub supplements: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HormoneInterpretation {
    pub overall_status: PanelStatus,
    pub ratios: Vec<RatioAnalysis>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CurvePoint {
    /// Minutes after the glucose load; 0 is fasting.
    pub minutes: u16,
    pub value: f64,
    pub status: TestStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurveAnalysis {
    pub points: Vec<CurvePoint>,
    pub fasting_status: TestStatus,
    pub peak_minutes: u16,
    pub peak_value: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HbA1cStatus {
    Low,
    Optimal,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlucoseInsulinInterpretation {
    pub overall_status: PanelStatus,
    pub insulin_resistance: bool,
    pub glucose_curve: Option<CurveAnalysis>,
    pub insulin_curve: Option<CurveAnalysis>,
    pub homa_ir: Option<f64>,
    pub hba1c_status: Option<HbA1cStatus>,
    pub supplements: Vec<String>,
}

/// A finding serious enough to head the report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CriticalIssue {
    Deficiency { nutrient: String },
    ThyroidAbnormal,
    InsulinResistance,
    CardiovascularRiskHigh,
    Liver { pattern: LiverPattern },
}

/// Everything the panel interpreter found; absent panels are `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PanelInterpretation {
    pub categories: BTreeMap<TestCategory, Vec<TestReading>>,
    pub morphology: Option<MorphologyInterpretation>,
    pub thyroid: Option<ThyroidInterpretation>,
    pub lipids: Option<LipidInterpretation>,
    pub liver: Option<LiverInterpretation>,
    pub hormones: Option<HormoneInterpretation>,
    pub glucose_insulin: Option<GlucoseInsulinInterpretation>,
    pub critical_issues: Vec<CriticalIssue>,
}

impl PanelInterpretation {
    /// Supplements named by any panel, first mention first, without repeats.
    pub fn suggested_supplements(&self) -> Vec<String> {
        let mut names = Vec::new();
        if let Some(morphology) = &self.morphology {
            names.extend(morphology.supplements.iter().cloned());
        }
        if let Some(thyroid) = &self.thyroid {
            names.extend(thyroid.supplements.iter().cloned());
        }
        if let Some(glucose_insulin) = &self.glucose_insulin {
            names.extend(glucose_insulin.supplements.iter().cloned());
        }
        if let Some(lipids) = &self.lipids {
            names.extend(lipids.supplements.iter().cloned());
        }
        if let Some(liver) = &self.liver {
            names.extend(liver.supplements.iter().cloned());
        }
        if let Some(hormones) = &self.hormones {
            names.extend(hormones.ratios.iter().flat_map(|ratio| ratio.supplements.iter().cloned()));
        }
        dedup(names)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
            && self.morphology.is_none()
            && self.thyroid.is_none()
            && self.lipids.is_none()
            && self.liver.is_none()
            && self.hormones.is_none()
            && self.glucose_insulin.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PanelInterpreter {
    categories: TestCategories,
}

impl PanelInterpreter {
    pub fn new(categories: TestCategories) -> Self {
        Self { categories }
    }

    pub fn interpret(&self, tests: &[TestReading]) -> PanelInterpretation {
        let categories: BTreeMap<TestCategory, Vec<TestReading>> = TestCategory::ALL
            .into_iter()
            .map(|category| (category, self.categories.select(category, tests)))
            .filter(|(_, members)| !members.is_empty())
            .collect();

        let by_name = index_by_name(tests);
        let value = |name: &str| by_name.get(name).map_or(0.0, |test| test.value);

        let morphology = categories
            .get(&TestCategory::Morphology)
            .map(|members| interpret_morphology(members));

        let thyroid = by_name.get("TSH").map(|tsh| {
            interpret_thyroid_panel(
                tsh.value,
                by_name.get("FT3").map(|test| test.value),
                by_name.get("FT4").map(|test| test.value),
            )
        });

        let lipid_panel = LipidPanel {
            cholesterol: value("CHOLESTEROL"),
            hdl: value("HDL"),
            ldl: value("LDL"),
            tg: value("TG"),
        };
        let lipids =
            (lipid_panel != LipidPanel::default()).then(|| interpret_lipid_profile(lipid_panel));

        let (ast, alt, ggtp) = (value("AST"), value("ALT"), value("GGTP"));
        let liver =
            (ast != 0.0 || alt != 0.0 || ggtp != 0.0).then(|| interpret_liver_panel(ast, alt, ggtp));

        let (lh, fsh, e2, prog) = (value("LH"), value("FSH"), value("ESTRADIOL"), value("PROGESTERON"));
        let hormones = (lh != 0.0 || fsh != 0.0 || e2 != 0.0 || prog != 0.0)
            .then(|| interpret_hormone_ratios(lh, fsh, e2, prog));

        let glucose_insulin = interpret_glucose_insulin(tests, &by_name);

        let critical_issues = critical_issues(
            morphology.as_ref(),
            thyroid.as_ref(),
            glucose_insulin.as_ref(),
            lipids.as_ref(),
            liver.as_ref(),
        );

        PanelInterpretation {
            categories,
            morphology,
            thyroid,
            lipids,
            liver,
            hormones,
            glucose_insulin,
            critical_issues,
        }
    }
}

/// Upper-cased name to reading; a later reading with the same name wins.
fn index_by_name(tests: &[TestReading]) -> HashMap<String, &TestReading> {
    tests.iter().map(|test| (test.name.to_uppercase(), test)).collect()
}

pub fn interpret_morphology(tests: &[TestReading]) -> MorphologyInterpretation {
    let by_name = index_by_name(tests);
    let mut patterns = Vec::new();
    let mut deficiencies = Vec::new();
    let mut supplements = Vec::new();

    if let (Some(mcv), Some(mch)) = (by_name.get("MCV"), by_name.get("MCH")) {
        if mcv.value < 80.0 && mch.value < 27.0 {
            patterns.push(MorphologyPattern::MicrocyticAnemia);
            deficiencies.extend(["iron", "copper", "B6"]);
            supplements.extend(["Żelazo", "Miedź", "Witaminy z gr. B"]);
        } else if mcv.value > 100.0 && mch.value > 32.0 {
            patterns.push(MorphologyPattern::MegaloblasticAnemia);
            deficiencies.extend(["B12", "B9"]);
            supplements.extend(["B12", "Kwas foliowy"]);
        }
    }

    if by_name.get("NEUTROFILE").is_some_and(|neutrophils| neutrophils.value < 40.0) {
        patterns.push(MorphologyPattern::Neutropenia);
        deficiencies.extend(["B12", "B9"]);
        supplements.extend(["Witaminy z gr. B", "L-Glutamina"]);
    }

    MorphologyInterpretation {
        overall_status: PanelStatus::abnormal_if(!patterns.is_empty()),
        patterns,
        deficiencies: dedup(deficiencies),
        supplements: dedup(supplements),
    }
}

pub fn interpret_lipid_profile(panel: LipidPanel) -> LipidInterpretation {
    let mut ratios = Vec::new();
    let mut supplements = Vec::new();

    if panel.hdl > 0.0 && panel.ldl > 0.0 {
        let value = panel.hdl / panel.ldl;
        let low = value < 0.5;
        let ratio_supplements = if low {
            names(&["Omega 3", "Omega 6", "Cholina"])
        } else {
            Vec::new()
        };
        supplements.extend(ratio_supplements.iter().cloned());
        ratios.push(RatioAnalysis {
            kind: RatioKind::HdlLdl,
            value,
            optimal_range: "1:2".to_string(),
            status: if low { RatioStatus::Low } else { RatioStatus::Normal },
            supplements: ratio_supplements,
        });
    }

    if panel.hdl > 0.0 && panel.tg > 0.0 {
        let value = panel.hdl / panel.tg;
        let optimal = value >= 1.0;
        ratios.push(RatioAnalysis {
            kind: RatioKind::HdlTg,
            value,
            optimal_range: "1:1".to_string(),
            status: if optimal { RatioStatus::Optimal } else { RatioStatus::Low },
            supplements: if optimal { Vec::new() } else { names(&["Omega 3"]) },
        });
    }

    let cardiovascular_risk = if panel.ldl > 160.0 || panel.tg > 150.0 {
        CardiovascularRisk::High
    } else if panel.ldl > 130.0 || panel.tg > 100.0 {
        CardiovascularRisk::Moderate
    } else {
        CardiovascularRisk::Low
    };

    LipidInterpretation {
        overall_status: PanelStatus::abnormal_if(cardiovascular_risk != CardiovascularRisk::Low),
        ratios,
        cardiovascular_risk,
        supplements: dedup(supplements),
    }
}

/// FT3/FT4 are optional; a missing value yields no percentage.
pub fn interpret_thyroid_panel(tsh: f64, ft3: Option<f64>, ft4: Option<f64>) -> ThyroidInterpretation {
    let tsh_status = classify(tsh, TSH_OPTIMAL);
    let ft3_percentage = ft3.and_then(|value| band_percentage(value, FT3_REFERENCE));
    let ft4_percentage = ft4.and_then(|value| band_percentage(value, FT4_REFERENCE));

    let mut supplements = Vec::new();
    match tsh_status {
        TestStatus::High => supplements.extend(["Selen", "Cynk", "Tyrozyna"]),
        TestStatus::Low => supplements.push("Koenzym Q10"),
        TestStatus::Normal => {}
    }
    if ft3_percentage.is_some_and(|percentage| percentage < 50.0) {
        supplements.extend(["Selen", "Cynk", "Hepaset", "Maślan sodu"]);
    }

    ThyroidInterpretation {
        overall_status: PanelStatus::abnormal_if(tsh_status != TestStatus::Normal),
        tsh_status,
        ft3_percentage,
        ft4_percentage,
        supplements: dedup(supplements),
    }
}

pub fn interpret_liver_panel(ast: f64, alt: f64, ggtp: f64) -> LiverInterpretation {
    let ast_alt_ratio = if alt > 0.0 { ast / alt } else { 0.0 };

    let pattern = if ast_alt_ratio > 2.0 {
        Some(LiverPattern::AlcoholicDamage)
    } else if ast_alt_ratio < 1.0 && ggtp > 35.0 {
        Some(LiverPattern::FattyLiverOrInsulinResistance)
    } else if ast > 20.0 || alt > 26.0 {
        Some(LiverPattern::Hepatitis)
    } else {
        None
    };

    LiverInterpretation {
        overall_status: PanelStatus::abnormal_if(pattern.is_some()),
        ast_alt_ratio,
        pattern,
        supplements: if pattern.is_some() {
            names(&["Hepaset", "Ostropest", "Liver Complex"])
        } else {
            Vec::new()
        },
    }
}

pub fn interpret_hormone_ratios(lh: f64, fsh: f64, e2: f64, prog: f64) -> HormoneInterpretation {
    let mut ratios = Vec::new();

    if fsh > 0.0 {
        let value = lh / fsh;
        let (status, supplements) = if value > 2.0 {
            (RatioStatus::High, names(&["myo-inozytol"]))
        } else if value < 0.5 {
            (RatioStatus::Low, names(&["ashwagandha", "nac"]))
        } else {
            (RatioStatus::Normal, Vec::new())
        };
        ratios.push(RatioAnalysis {
            kind: RatioKind::LhFsh,
            value,
            optimal_range: "1:1".to_string(),
            status,
            supplements,
        });
    }

    if prog > 0.0 {
        let value = e2 / prog;
        let (status, supplements) = if value > 500.0 {
            (RatioStatus::High, names(&["dim", "inozytol", "nac"]))
        } else if value < 100.0 {
            (RatioStatus::Low, names(&["ashwagandha"]))
        } else {
            (RatioStatus::Normal, Vec::new())
        };
        ratios.push(RatioAnalysis {
            kind: RatioKind::EstradiolProgesterone,
            value,
            optimal_range: "100-500".to_string(),
            status,
            supplements,
        });
    }

    HormoneInterpretation {
        overall_status: PanelStatus::abnormal_if(ratios.iter().any(|ratio| ratio.status.is_off())),
        ratios,
    }
}

pub fn homa_ir(fasting_glucose: f64, fasting_insulin: f64) -> f64 {
    fasting_glucose * fasting_insulin / HOMA_IR_DIVISOR
}

/// Minutes after the load encoded in a curve test name, e.g. `Glukoza 2h`.
pub fn curve_minutes(name: &str) -> u16 {
    let name = name.to_uppercase();
    if name.contains("CZCO") || name.contains("0H") {
        0
    } else if name.contains("1H") || name.contains("60") {
        60
    } else if name.contains("2H") || name.contains("120") {
        120
    } else if name.contains("3H") || name.contains("180") {
        180
    } else {
        0
    }
}

/// Points are `(minutes, mg/dL)`; the earliest one is taken as fasting.
pub fn analyze_glucose_curve(points: &[(u16, f64)]) -> CurveAnalysis {
    analyze_curve(points, &GLUCOSE_CURVE_OPTIMAL, GLUCOSE_FASTING)
}

/// Points are `(minutes, uU/mL)`; the earliest one is taken as fasting.
pub fn analyze_insulin_curve(points: &[(u16, f64)]) -> CurveAnalysis {
    analyze_curve(points, &INSULIN_CURVE_OPTIMAL, INSULIN_FASTING)
}

fn analyze_curve(points: &[(u16, f64)], optimal: &[(u16, f64, f64)], fasting: (f64, f64)) -> CurveAnalysis {
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|(minutes, _)| *minutes);

    let points: Vec<CurvePoint> = sorted
        .iter()
        .map(|&(minutes, value)| CurvePoint {
            minutes,
            value,
            status: optimal
                .iter()
                .find(|(at, _, _)| *at == minutes)
                .map_or(TestStatus::Normal, |&(_, min, max)| classify(value, (min, max))),
        })
        .collect();

    let fasting_value = points.first().map_or(0.0, |point| point.value);
    // First point reaching the maximum.
    let peak = points
        .iter()
        .fold(None::<&CurvePoint>, |best, point| match best {
            Some(best) if best.value >= point.value => Some(best),
            _ => Some(point),
        });

    CurveAnalysis {
        fasting_status: classify(fasting_value, fasting),
        peak_minutes: peak.map_or(0, |point| point.minutes),
        peak_value: peak.map_or(0.0, |point| point.value),
        points,
    }
}

fn interpret_glucose_insulin(
    tests: &[TestReading],
    by_name: &HashMap<String, &TestReading>,
) -> Option<GlucoseInsulinInterpretation> {
    if !by_name.contains_key("GLUKOZA") && !by_name.contains_key("INSULINA") {
        return None;
    }

    let mut glucose_points = Vec::new();
    let mut insulin_points = Vec::new();
    for test in tests {
        let name = test.name.to_uppercase();
        if name.contains("GLUKOZA") {
            glucose_points.push((curve_minutes(&name), test.value));
        } else if name.contains("INSULINA") {
            insulin_points.push((curve_minutes(&name), test.value));
        }
    }

    let homa_ir = match (by_name.get("GLUKOZA"), by_name.get("INSULINA")) {
        (Some(glucose), Some(insulin)) => Some(homa_ir(glucose.value, insulin.value)),
        _ => None,
    };
    let hba1c_status = by_name.get("HBA1C").map(|test| match classify(test.value, HBA1C_OPTIMAL) {
        TestStatus::Low => HbA1cStatus::Low,
        TestStatus::Normal => HbA1cStatus::Optimal,
        TestStatus::High => HbA1cStatus::High,
    });
    let insulin_resistance = homa_ir.is_some_and(|value| value > HOMA_IR_RESISTANCE_THRESHOLD);

    Some(GlucoseInsulinInterpretation {
        overall_status: PanelStatus::abnormal_if(insulin_resistance),
        insulin_resistance,
        glucose_curve: (!glucose_points.is_empty()).then(|| analyze_glucose_curve(&glucose_points)),
        insulin_curve: (!insulin_points.is_empty()).then(|| analyze_insulin_curve(&insulin_points)),
        homa_ir,
        hba1c_status,
        supplements: if insulin_resistance {
            names(&["NAC", "Inozytol", "Berberyna", "Lactibiane CND"])
        } else {
            Vec::new()
        },
    })
}

fn critical_issues(
    morphology: Option<&MorphologyInterpretation>,
    thyroid: Option<&ThyroidInterpretation>,
    glucose_insulin: Option<&GlucoseInsulinInterpretation>,
    lipids: Option<&LipidInterpretation>,
    liver: Option<&LiverInterpretation>,
) -> Vec<CriticalIssue> {
    let mut issues = Vec::new();

    if let Some(morphology) = morphology {
        issues.extend(
            morphology
                .deficiencies
                .iter()
                .map(|nutrient| CriticalIssue::Deficiency {
                    nutrient: nutrient.clone(),
                }),
        );
    }
    if thyroid.is_some_and(|thyroid| thyroid.tsh_status != TestStatus::Normal) {
        issues.push(CriticalIssue::ThyroidAbnormal);
    }
    if glucose_insulin.is_some_and(|panel| panel.insulin_resistance) {
        issues.push(CriticalIssue::InsulinResistance);
    }
    if lipids.is_some_and(|lipids| lipids.cardiovascular_risk == CardiovascularRisk::High) {
        issues.push(CriticalIssue::CardiovascularRiskHigh);
    }
    if let Some(pattern) = liver.and_then(|liver| liver.pattern) {
        issues.push(CriticalIssue::Liver { pattern });
    }

    issues
}

/// Inclusive band; below is low, above is high.
fn classify(value: f64, (min, max): (f64, f64)) -> TestStatus {
    if value < min {
        TestStatus::Low
    } else if value > max {
        TestStatus::High
    } else {
        TestStatus::Normal
    }
}

fn band_percentage(value: f64, (low, high): (f64, f64)) -> Option<f64> {
    (high > low).then(|| (value - low) / (high - low) * 100.0)
}

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn dedup<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    items
        .into_iter()
        .map(Into::into)
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
