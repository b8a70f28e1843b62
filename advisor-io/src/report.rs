//! Markdown rendering of a [`Recommendation`].

use advisor_core::interpretation::{CardiovascularRisk, RatioAnalysis};
use advisor_core::{
    CriticalIssue, PanelInterpretation, Priority, Recommendation, RecommendedSupplement,
};

use crate::i18n::Translations;

pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Renders the recommendation, followed by the panel interpretation when one
/// is given and has findings.
pub fn render_report(
    recommendation: &Recommendation,
    interpretation: Option<&PanelInterpretation>,
    tr: &Translations,
) -> String {
    let mut lines = vec![
        format!("# {}", tr.t("report.title")),
        String::new(),
        format!(
            "**{}:** {} {}  ",
            tr.t("report.patient"),
            recommendation.patient_name,
            recommendation.patient_surname
        ),
        format!(
            "**{}:** {}",
            tr.t("report.date"),
            recommendation.date.format(DATE_FORMAT)
        ),
        String::new(),
    ];

    if recommendation.is_empty() {
        lines.push(tr.t("report.no_recommendations"));
        lines.push(String::new());
    } else {
        render_supplements(&mut lines, recommendation, tr);
    }

    let interpretation = interpretation.filter(|interpretation| !interpretation.is_empty());
    if let Some(interpretation) = interpretation {
        render_interpretation(&mut lines, interpretation, tr);
    }

    if !recommendation.is_empty() || interpretation.is_some() {
        lines.push(format!(
            "> **{}:** {}",
            tr.t("report.warning"),
            tr.t("report.disclaimer")
        ));
        lines.push(String::new());
    }
    lines.join("\n")
}

fn render_supplements(lines: &mut Vec<String>, recommendation: &Recommendation, tr: &Translations) {
    lines.push(format!("## {}", tr.t("report.supplements_heading")));
    lines.push(String::new());

    let header = [
        "number",
        "supplement",
        "dosage",
        "timing",
        "priority",
        "reason",
    ]
    .map(|column| tr.t(&format!("report.columns.{column}")));
    lines.push(table_row(&header));
    lines.push(table_row(&header.clone().map(|_| "---".to_string())));

    for (index, supplement) in recommendation.supplements.iter().enumerate() {
        lines.push(table_row(&[
            (index + 1).to_string(),
            supplement.name.clone(),
            supplement.dosage.clone(),
            supplement.timing.clone(),
            priority_label(&supplement.priority, tr),
            supplement.reason.clone(),
        ]));
    }
    lines.push(String::new());

    let cautions: Vec<String> = recommendation
        .supplements
        .iter()
        .filter_map(|supplement| caution_line(supplement, tr))
        .collect();
    if !cautions.is_empty() {
        lines.push(format!("### {}", tr.t("report.cautions_heading")));
        lines.push(String::new());
        lines.extend(cautions);
        lines.push(String::new());
    }
}

fn render_interpretation(lines: &mut Vec<String>, interpretation: &PanelInterpretation, tr: &Translations) {
    lines.push(format!("## {}", tr.t("interpretation.heading")));
    lines.push(String::new());

    if !interpretation.critical_issues.is_empty() {
        lines.push(format!("### {}", tr.t("interpretation.critical_heading")));
        lines.push(String::new());
        lines.extend(
            interpretation
                .critical_issues
                .iter()
                .map(|issue| format!("- {}", critical_issue_line(issue, tr))),
        );
        lines.push(String::new());
    }

    if !interpretation.categories.is_empty() {
        lines.push(format!("### {}", tr.t("interpretation.categories_heading")));
        lines.push(String::new());
        for (category, tests) in &interpretation.categories {
            let names: Vec<&str> = tests.iter().map(|test| test.name.as_str()).collect();
            lines.push(format!(
                "- {}: {}",
                tr.t(&format!("interpretation.category.{category}")),
                names.join(", ")
            ));
        }
        lines.push(String::new());
    }

    let findings = panel_lines(interpretation, tr);
    if !findings.is_empty() {
        lines.push(format!("### {}", tr.t("interpretation.panels_heading")));
        lines.push(String::new());
        lines.extend(findings.into_iter().map(|finding| format!("- {finding}")));
        lines.push(String::new());
    }

    let suggested = interpretation.suggested_supplements();
    if !suggested.is_empty() {
        lines.push(format!("### {}", tr.t("interpretation.suggested_heading")));
        lines.push(String::new());
        lines.push(suggested.join(", "));
        lines.push(String::new());
    }
}

fn critical_issue_line(issue: &CriticalIssue, tr: &Translations) -> String {
    match issue {
        CriticalIssue::Deficiency { nutrient } => {
            tr.t_args("interpretation.issue.deficiency", &[nutrient.as_str()])
        }
        CriticalIssue::ThyroidAbnormal => tr.t("interpretation.issue.thyroid_abnormal"),
        CriticalIssue::InsulinResistance => tr.t("interpretation.issue.insulin_resistance"),
        CriticalIssue::CardiovascularRiskHigh => tr.t("interpretation.issue.cardiovascular_risk_high"),
        CriticalIssue::Liver { pattern } => tr.t_args(
            "interpretation.issue.liver",
            &[tr.t(&format!("interpretation.liver_pattern.{}", pattern.as_str())).as_str()],
        ),
    }
}

fn panel_lines(interpretation: &PanelInterpretation, tr: &Translations) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(morphology) = &interpretation.morphology {
        lines.extend(morphology.patterns.iter().map(|pattern| {
            tr.t(&format!("interpretation.morphology_pattern.{}", pattern.as_str()))
        }));
    }
    if let Some(thyroid) = &interpretation.thyroid {
        lines.push(format!(
            "TSH: {}",
            tr.t(&format!("interpretation.status.{}", thyroid.tsh_status))
        ));
        if let Some(percentage) = thyroid.ft3_percentage {
            lines.push(format!("FT3: {percentage:.0}%"));
        }
        if let Some(percentage) = thyroid.ft4_percentage {
            lines.push(format!("FT4: {percentage:.0}%"));
        }
    }
    if let Some(glucose_insulin) = &interpretation.glucose_insulin {
        if let Some(homa_ir) = glucose_insulin.homa_ir {
            lines.push(format!("HOMA-IR: {homa_ir:.2}"));
        }
    }
    if let Some(lipids) = &interpretation.lipids {
        lines.extend(lipids.ratios.iter().map(|ratio| ratio_line(ratio, tr)));
        if lipids.cardiovascular_risk != CardiovascularRisk::Low {
            let risk = match lipids.cardiovascular_risk {
                CardiovascularRisk::High => "interpretation.cardiovascular_risk.high",
                _ => "interpretation.cardiovascular_risk.moderate",
            };
            lines.push(tr.t(risk));
        }
    }
    if let Some(liver) = &interpretation.liver {
        lines.push(format!("AST:ALT: {:.2}", liver.ast_alt_ratio));
    }
    if let Some(hormones) = &interpretation.hormones {
        lines.extend(hormones.ratios.iter().map(|ratio| ratio_line(ratio, tr)));
    }

    lines
}

fn ratio_line(ratio: &RatioAnalysis, tr: &Translations) -> String {
    format!(
        "{}: {:.2} ({}) - {}",
        ratio.kind.label(),
        ratio.value,
        ratio.optimal_range,
        tr.t(&format!("interpretation.status.{}", ratio.status.as_str()))
    )
}

/// `<name>_<surname>_supplements.md`, safe to join onto an output directory.
pub fn report_file_name(recommendation: &Recommendation) -> String {
    format!(
        "{}_{}_supplements.md",
        file_name_part(&recommendation.patient_name),
        file_name_part(&recommendation.patient_surname)
    )
}

/// Replaces path separators and control characters, and strips leading dots.
fn file_name_part(part: &str) -> String {
    let cleaned: String = part
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    cleaned.trim_start_matches('.').to_string()
}

/// Translated label for known priorities; other labels are shown as given.
pub fn priority_label(priority: &Priority, tr: &Translations) -> String {
    match priority {
        Priority::Unrecognized(label) => label.clone(),
        known => tr.t(&format!("priority.{}", known.as_str())),
    }
}

fn caution_line(supplement: &RecommendedSupplement, tr: &Translations) -> Option<String> {
    let mut parts = Vec::new();
    if !supplement.contraindications.is_empty() {
        parts.push(format!(
            "{}: {}",
            tr.t("report.contraindications"),
            supplement.contraindications.join(", ")
        ));
    }
    if !supplement.interactions.is_empty() {
        parts.push(format!(
            "{}: {}",
            tr.t("report.interactions"),
            supplement.interactions.join(", ")
        ));
    }
    if parts.is_empty() {
        return None;
    }
    Some(format!("- **{}**: {}", supplement.name, parts.join("; ")))
}

fn table_row(cells: &[String]) -> String {
    let escaped: Vec<String> = cells.iter().map(|cell| escape_cell(cell)).collect();
    format!("| {} |", escaped.join(" | "))
}

fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|").replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_parts_cannot_leave_the_directory() {
        assert_eq!(file_name_part("../../etc"), "_.._etc");
        assert_eq!(file_name_part("..\\evil"), "_evil");
        assert_eq!(file_name_part("Anna-Maria"), "Anna-Maria");
    }

    #[test]
    fn cells_cannot_break_the_table() {
        assert_eq!(escape_cell("a|b\nc"), "a\\|b c");
    }
}
