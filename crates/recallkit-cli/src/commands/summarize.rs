//! The `recallkit summarize` command.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};

use recallkit_core::model::ExperimentKind;
use recallkit_core::traits::ResultStore;
use recallkit_report::html::write_html_report;
use recallkit_report::summary::{pct, render_markdown, render_text, signed_pct};
use recallkit_report::StudyOverview;
use recallkit_store::config::load_config_from;
use recallkit_store::JsonResultStore;

use super::OutputFormat;

pub fn execute(
    results: Option<PathBuf>,
    experiment: Option<String>,
    format: Option<String>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let format = OutputFormat::parse(format.as_deref().unwrap_or(&config.default_format))?;
    let results_dir = results.unwrap_or_else(|| config.results_dir.clone());
    let store = JsonResultStore::open(&results_dir)?;

    let reports = match &experiment {
        Some(name) => {
            let kind: ExperimentKind = name.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            let mut only = BTreeMap::new();
            only.insert(kind, store.load_experiment(kind)?);
            only
        }
        None => store.load_all()?,
    };

    let overview = StudyOverview::build(reports);
    if overview.is_empty() {
        println!("No experiment data found in {}", results_dir.display());
        return Ok(());
    }
    eprintln!(
        "Loaded {} reports for {} experiments from {}",
        overview.report_count(),
        overview.experiments.len(),
        results_dir.display()
    );

    let rendered = match format {
        OutputFormat::Html => {
            let path = output.unwrap_or_else(|| results_dir.join("study_report.html"));
            write_html_report(&overview, &path)?;
            eprintln!("HTML report: {}", path.display());
            return Ok(());
        }
        OutputFormat::Json => serde_json::to_string_pretty(&overview)?,
        OutputFormat::Markdown => render_markdown(&overview),
        OutputFormat::Text => {
            if output.is_none() {
                print_overview_table(&overview);
            }
            render_text(&overview)
        }
    };

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Summary written to: {}", path.display());
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

fn print_overview_table(overview: &StudyOverview) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "Experiment",
        "Participants",
        "Mean accuracy",
        "Conditions",
        "Mean effect",
    ]);

    for exp in overview.experiments.values() {
        let conditions: Vec<String> = exp
            .condition_means
            .iter()
            .map(|(c, m)| format!("{c} {}", pct(*m)))
            .collect();
        table.add_row(vec![
            Cell::new(format!("{}. {}", exp.experiment.number(), exp.title)),
            Cell::new(exp.participants.len()),
            Cell::new(pct(exp.mean_accuracy)),
            Cell::new(conditions.join(", ")),
            Cell::new(
                exp.mean_accuracy_effect
                    .map(signed_pct)
                    .unwrap_or_else(|| "-".into()),
            ),
        ]);
    }

    println!("{table}");
}
