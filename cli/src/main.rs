use std::fs;
use std::path::PathBuf;

use advisor_core::{AdvisorConfig, RecommendationEngine, ThresholdType};
use advisor_io::loader::{DOSAGE_RULES_FILE, REFERENCE_RANGES_FILE, SUPPLEMENTS_FILE, TIMING_RULES_FILE};
use advisor_io::report::priority_label;
use advisor_io::{read_blood_tests, read_document, read_patient, render_report, report_file_name};
use advisor_io::{validate, DataLoader, PatientDocument, Translations};
use anyhow::{bail, Context};
use clap::{ArgGroup, Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "advisor-cli",
    about = "Generate supplement recommendations from a blood-test panel."
)]
#[command(group(ArgGroup::new("input").required(true).args(["json", "patient"])))]
struct Args {
    /// JSON file holding both `patient` and `blood_tests`.
    #[arg(long, conflicts_with_all = ["patient", "blood_tests"])]
    json: Option<PathBuf>,

    /// JSON file holding only the patient.
    #[arg(long, requires = "blood_tests")]
    patient: Option<PathBuf>,

    /// JSON file holding only the list of blood tests.
    #[arg(long, requires = "patient")]
    blood_tests: Option<PathBuf>,

    /// Directory with reference ranges, supplements, timing and dosage rules.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Built-in report language.
    #[arg(long, default_value = "pl")]
    lang: String,

    /// Custom translation catalogue; overrides `--lang`.
    #[arg(long)]
    translations: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Threshold::Functional)]
    threshold: Threshold,

    /// Reject configuration files with malformed records instead of skipping them.
    #[arg(long)]
    strict: bool,

    /// Print the report instead of writing it to the output directory.
    #[arg(long)]
    stdout: bool,

    /// Print the recommendation as JSON.
    #[arg(long, conflicts_with = "stdout")]
    print_json: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Threshold {
    Functional,
    Lab,
}

impl From<Threshold> for ThresholdType {
    fn from(threshold: Threshold) -> Self {
        match threshold {
            Threshold::Functional => ThresholdType::Functional,
            Threshold::Lab => ThresholdType::Lab,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let loader = DataLoader::new(&args.data_dir);
    if args.strict {
        validate_configuration(&loader)?;
    }
    let knowledge = loader
        .load_knowledge()
        .with_context(|| format!("Could not load configuration from {:?}", loader.data_dir()))?;

    let panel = read_input(&args)?
        .into_validated()
        .context("Invalid patient data")?;

    let engine = RecommendationEngine::new(
        knowledge,
        AdvisorConfig {
            threshold_type: args.threshold.into(),
        },
    );
    let analyzer = engine.analyzer();
    for test in analyzer.get_abnormal(&engine.analyze(&panel.readings)) {
        info!(
            test = %test.name,
            value = test.value,
            status = test.status_label(),
            threshold = ?analyzer.threshold_type(),
            "abnormal result"
        );
    }
    let recommendation = engine.generate(&panel.patient, &panel.readings);
    let interpretation = engine.interpret(&panel.readings);
    for issue in &interpretation.critical_issues {
        info!(?issue, "critical finding");
    }

    if args.print_json {
        println!("{}", serde_json::to_string_pretty(&recommendation)?);
        return Ok(());
    }

    let tr = load_translations(&args)?;
    let report = render_report(&recommendation, Some(&interpretation), &tr);

    if args.stdout {
        print!("{report}");
    } else {
        fs::create_dir_all(&args.output_dir)
            .with_context(|| format!("Could not create {:?}", args.output_dir))?;
        let path = args.output_dir.join(report_file_name(&recommendation));
        fs::write(&path, report).with_context(|| format!("Could not write {path:?}"))?;
        println!("{}", tr.t_args("cli.report_written", &[path.display().to_string().as_str()]));
    }

    println!(
        "{}",
        tr.t_args("cli.supplements_count", &[recommendation.supplements.len().to_string().as_str()])
    );
    if !interpretation.critical_issues.is_empty() {
        println!(
            "{}",
            tr.t_args(
                "cli.critical_issues",
                &[interpretation.critical_issues.len().to_string().as_str()]
            )
        );
    }
    if !recommendation.is_empty() {
        println!("\n{}", tr.t("cli.supplements_list"));
        for supplement in &recommendation.supplements {
            println!(
                "  - {}: {} ({})",
                supplement.name,
                supplement.dosage,
                priority_label(&supplement.priority, &tr)
            );
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn validate_configuration(loader: &DataLoader) -> anyhow::Result<()> {
    validate::validate_reference_ranges(&loader.load_json(REFERENCE_RANGES_FILE)?)?;
    validate::validate_supplements(&loader.load_json(SUPPLEMENTS_FILE)?)?;
    validate::validate_timing(&loader.load_json(TIMING_RULES_FILE)?)?;
    validate::validate_dosage_rules(&loader.load_json(DOSAGE_RULES_FILE)?)?;
    Ok(())
}

fn read_input(args: &Args) -> anyhow::Result<PatientDocument> {
    if let Some(path) = &args.json {
        return read_document(path).with_context(|| format!("Could not read {path:?}"));
    }

    let (Some(patient_path), Some(tests_path)) = (&args.patient, &args.blood_tests) else {
        bail!("Provide --json or both --patient and --blood-tests");
    };
    let patient =
        read_patient(patient_path).with_context(|| format!("Could not read {patient_path:?}"))?;
    let blood_tests =
        read_blood_tests(tests_path).with_context(|| format!("Could not read {tests_path:?}"))?;
    Ok(PatientDocument::new(patient, blood_tests))
}

fn load_translations(args: &Args) -> anyhow::Result<Translations> {
    if let Some(path) = &args.translations {
        return Translations::from_file(path).with_context(|| format!("Could not read {path:?}"));
    }
    match Translations::builtin(&args.lang) {
        Some(tr) => Ok(tr),
        None => bail!(
            "Unknown language {:?}; available: {}",
            args.lang,
            Translations::available_languages().join(", ")
        ),
    }
}
