//! The `recallkit score` command.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use recallkit_core::engine::{ProgressReporter, SessionEngine};
use recallkit_core::error::ScoringError;
use recallkit_core::model::ExperimentKind;
use recallkit_core::parser;
use recallkit_core::report::ParticipantReport;
use recallkit_core::results::ScoredTrial;
use recallkit_core::traits::ResultStore;
use recallkit_report::html::write_html_report;
use recallkit_report::summary::{pct, render_markdown, render_participant};
use recallkit_report::StudyOverview;
use recallkit_store::config::load_config_from;
use recallkit_store::JsonResultStore;

use super::OutputFormat;

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_trial_scored(&self, trial: &ScoredTrial) {
        let span = trial
            .correct_from_start()
            .map(|s| format!(" span {s}"))
            .unwrap_or_default();
        let chunk = match trial.chunk_intact() {
            Some(true) => " chunk intact",
            Some(false) => " chunk broken",
            None => "",
        };
        eprintln!(
            "  Trial {} [{}] {}{}{}",
            trial.number,
            trial.condition,
            pct(trial.accuracy_rate()),
            span,
            chunk
        );
    }

    fn on_trial_error(&self, trial_number: u32, error: &ScoringError) {
        eprintln!("  SKIP: trial {trial_number}: {error}");
    }

    fn on_session_complete(
        &self,
        participant: &str,
        scored: usize,
        skipped: usize,
        elapsed: Duration,
    ) {
        eprintln!(
            "Complete: {participant}, {scored} scored, {skipped} skipped ({:.1}ms)",
            elapsed.as_secs_f64() * 1000.0
        );
    }
}

pub fn execute(
    session_path: PathBuf,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
    zone_size: Option<usize>,
    strict: bool,
    format: Option<String>,
) -> Result<()> {
    anyhow::ensure!(zone_size != Some(0), "zone size must be at least 1");

    let config = load_config_from(config_path.as_deref())?;
    let format = OutputFormat::parse(format.as_deref().unwrap_or(&config.default_format))?;

    let mut engine_config = config.engine_config();
    engine_config.zone_size_override = zone_size;
    if strict {
        engine_config.skip_invalid_trials = false;
    }
    let engine = SessionEngine::new(engine_config);

    let results_dir = output.unwrap_or_else(|| config.results_dir.clone());
    let store = JsonResultStore::open(&results_dir)?;

    let sessions = parser::load_sessions(&session_path)?;
    anyhow::ensure!(
        !sessions.is_empty(),
        "no session files found in {}",
        session_path.display()
    );

    let reporter = ConsoleReporter;
    let mut reports = Vec::with_capacity(sessions.len());

    for session in &sessions {
        eprintln!(
            "recallkit v{}: {} for {} ({} trials)",
            env!("CARGO_PKG_VERSION"),
            session.experiment.title(),
            session.participant,
            session.trials.len()
        );
        for w in parser::validate_session(session) {
            match w.trial {
                Some(n) => tracing::warn!("{}: trial {n}: {}", session.participant, w.message),
                None => tracing::warn!("{}: {}", session.participant, w.message),
            }
        }

        let report = match engine.score_session(session, &reporter) {
            Ok(report) => report,
            Err(e)
                if engine.config().skip_invalid_trials
                    && matches!(e.downcast_ref::<ScoringError>(), Some(ScoringError::NoTrials)) =>
            {
                tracing::warn!("{e:#}");
                eprintln!("  SKIP: session {}: {e:#}", session.participant);
                continue;
            }
            Err(e) => return Err(e),
        };
        let path = store.save(&report)?;
        eprintln!("Results saved to: {}", path.display());
        reports.push(report);
    }

    anyhow::ensure!(
        !reports.is_empty(),
        "none of the sessions in {} could be scored",
        session_path.display()
    );

    match format {
        OutputFormat::Text => {
            for report in &reports {
                print_trial_table(report);
                println!("{}", render_participant(report));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        OutputFormat::Markdown => {
            println!("{}", render_markdown(&overview_of(reports)));
        }
        OutputFormat::Html => {
            let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
            let path = results_dir.join(format!("report_{timestamp}.html"));
            write_html_report(&overview_of(reports), &path)?;
            eprintln!("HTML report: {}", path.display());
        }
    }

    Ok(())
}

fn overview_of(reports: Vec<ParticipantReport>) -> StudyOverview {
    let mut grouped: BTreeMap<ExperimentKind, Vec<ParticipantReport>> = BTreeMap::new();
    for report in reports {
        grouped.entry(report.experiment).or_default().push(report);
    }
    StudyOverview::build(grouped)
}

fn print_trial_table(report: &ParticipantReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "Trial",
        "Condition",
        "Length",
        "Accuracy",
        "Span",
        "Chunk",
    ]);

    for t in &report.trials {
        table.add_row(vec![
            Cell::new(t.number),
            Cell::new(&t.condition),
            Cell::new(t.sequence_length),
            Cell::new(pct(t.accuracy_rate())),
            Cell::new(
                t.correct_from_start()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".into()),
            ),
            Cell::new(match t.chunk_intact() {
                Some(true) => "intact",
                Some(false) => "broken",
                None => "-",
            }),
        ]);
    }

    println!(
        "\n{} ({}): {} trials, {} overall",
        report.participant,
        report.experiment.title(),
        report.trials.len(),
        pct(report.summary.overall_accuracy)
    );
    println!("{table}");
}
