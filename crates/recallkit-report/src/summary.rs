//! Text and markdown summaries.
//!
//! The text view prints one block per participant with the measures that
//! matter for the experiment, followed by a completion matrix. The markdown
//! view carries the same numbers as tables.

use std::fmt::Write as _;

use recallkit_core::model::{ExperimentKind, ScoringMode};
use recallkit_core::report::ParticipantReport;
use recallkit_core::statistics::EffectSummary;

use crate::overview::StudyOverview;

const RULE: usize = 60;
const WIDE_RULE: usize = 80;

/// `0.8` as `80.0%`.
pub fn pct(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

/// `0.2` as `+20.0%`.
pub fn signed_pct(rate: f64) -> String {
    format!("{:+.1}%", rate * 100.0)
}

fn heading(kind: ExperimentKind) -> String {
    let detail = match kind {
        ExperimentKind::PrimacyRecency => "PRIMACY & RECENCY EFFECTS",
        ExperimentKind::PresentationSpeed => "PRESENTATION SPEED EFFECTS",
        ExperimentKind::WorkingMemoryTask => "WORKING MEMORY TASK AFTER LIST",
        ExperimentKind::PauseBeforeRecall => "PAUSE BEFORE RECALL",
        ExperimentKind::WorkingMemoryCapacity => "WORKING MEMORY CAPACITY",
        ExperimentKind::Chunking => "CHUNKING EFFECTS",
        ExperimentKind::ArticulatorySuppression => "ARTICULATORY SUPPRESSION",
        ExperimentKind::FingerTapping => "FINGER TAPPING",
    };
    format!("EXPERIMENT {}: {detail}", kind.number())
}

/// Label for the accuracy difference an experiment reports.
fn effect_label(kind: ExperimentKind) -> &'static str {
    match kind {
        ExperimentKind::PresentationSpeed => "Speed benefit",
        ExperimentKind::WorkingMemoryTask => "Working memory effect",
        ExperimentKind::Chunking => "Chunking benefit",
        ExperimentKind::ArticulatorySuppression => "Suppression effect",
        ExperimentKind::FingerTapping => "Tapping effect",
        _ => "Effect",
    }
}

fn chunk_counts(report: &ParticipantReport) -> (usize, usize) {
    report
        .trials
        .iter()
        .filter_map(|t| t.chunk_intact())
        .fold((0, 0), |(intact, total), ok| (intact + usize::from(ok), total + 1))
}

fn write_condition_line(out: &mut String, report: &ParticipantReport, condition: &str) {
    let label = format!("{}{} condition:", condition[..1].to_uppercase(), &condition[1..]);
    match report.condition_accuracy(condition) {
        Some(acc) => {
            let _ = writeln!(out, "  {label:<24}{}", pct(acc));
        }
        None => {
            let _ = writeln!(out, "  {label:<24}no trials");
        }
    }
}

fn write_condition_zones(out: &mut String, report: &ParticipantReport, condition: &str) {
    let Some(zones) = report
        .summary
        .condition(condition)
        .and_then(|c| c.mean_zones)
    else {
        return;
    };
    let _ = writeln!(
        out,
        "    {condition}: primacy {} | middle {} | recency {}",
        pct(zones.primacy),
        pct(zones.middle),
        pct(zones.recency)
    );
}

fn write_effect(out: &mut String, kind: ExperimentKind, effect: Option<&EffectSummary>) {
    let label = format!("{}:", effect_label(kind));
    match effect {
        Some(e) => {
            let _ = writeln!(out, "  {label:<24}{}", signed_pct(e.accuracy_effect));
            if let Some(span) = e.span_effect {
                let _ = writeln!(out, "  {:<24}{span:+.1} items", "Span effect:");
            }
            if let (Some(primacy), Some(recency)) = (e.primacy_effect, e.recency_effect) {
                let _ = writeln!(out, "  {:<24}{}", "Primacy difference:", signed_pct(primacy));
                let _ = writeln!(out, "  {:<24}{}", "Recency difference:", signed_pct(recency));
            }
        }
        None => {
            let _ = writeln!(out, "  {label:<24}n/a");
        }
    }
}

/// Text block for one participant.
pub fn render_participant(report: &ParticipantReport) -> String {
    let mut out = String::new();
    let kind = report.experiment;
    let summary = &report.summary;
    let _ = writeln!(out, "\nParticipant: {}", report.participant);

    match kind {
        ExperimentKind::PrimacyRecency => {
            let multi = report.trials.len() > 1;
            for trial in &report.trials {
                let Some(free) = trial.analysis.as_free() else {
                    continue;
                };
                if multi {
                    let _ = writeln!(out, "  Trial {}:", trial.number);
                }
                let len = free.original.len();
                let k = free.zones.zone_size;
                let _ = writeln!(out, "  Total recalled: {}/{len}", free.unique_correct);
                let _ = writeln!(out, "  Primacy (pos 1-{k}):  {}", pct(free.zones.primacy));
                if len > 2 * k {
                    let _ = writeln!(
                        out,
                        "  Middle (pos {}-{}):  {}",
                        k + 1,
                        len - k,
                        pct(free.zones.middle)
                    );
                }
                let _ = writeln!(
                    out,
                    "  Recency (pos {}-{len}): {}",
                    len - k + 1,
                    pct(free.zones.recency)
                );
                let positions: Vec<String> = free
                    .recalled_positions()
                    .iter()
                    .map(usize::to_string)
                    .collect();
                let _ = writeln!(out, "  Positions recalled: {}", positions.join(", "));
                if !free.intrusions.is_empty() {
                    let intrusions: String = free.intrusions.iter().collect();
                    let _ = writeln!(out, "  Intrusions: {intrusions}");
                }
            }
        }
        ExperimentKind::PauseBeforeRecall => {
            for trial in &report.trials {
                let Some(serial) = trial.analysis.as_serial() else {
                    continue;
                };
                let _ = writeln!(
                    out,
                    "  Score: {}/{} ({:.1}%)",
                    serial.correct_positions,
                    serial.total_positions,
                    serial.accuracy_rate * 100.0
                );
                let first: Vec<String> = serial
                    .position_correct
                    .iter()
                    .take(5)
                    .enumerate()
                    .filter(|(_, &ok)| ok)
                    .map(|(i, _)| (i + 1).to_string())
                    .collect();
                let first = if first.is_empty() {
                    "None".to_string()
                } else {
                    first.join(", ")
                };
                let _ = writeln!(out, "  First 5 positions correct: {first}");
            }
        }
        ExperimentKind::WorkingMemoryCapacity => match &summary.capacity {
            Some(capacity) => {
                let _ = writeln!(
                    out,
                    "  Estimated capacity: {} items",
                    capacity.estimated_capacity
                );
                let _ = writeln!(
                    out,
                    "  Longest perfect recall: {} items",
                    capacity.max_perfect_length
                );
                let _ = writeln!(out, "  Performance by length:");
                for (length, accuracy) in &capacity.performance_by_length {
                    let _ = writeln!(out, "    {length} items: {}", pct(*accuracy));
                }
            }
            None => {
                let _ = writeln!(out, "  No capacity estimate");
            }
        },
        _ => {
            if let Some((baseline, treatment)) = kind.effect_pair() {
                write_condition_line(&mut out, report, baseline);
                write_condition_line(&mut out, report, treatment);
                if kind.scoring_mode() == ScoringMode::Free {
                    let _ = writeln!(out, "  Serial position zones:");
                    write_condition_zones(&mut out, report, baseline);
                    write_condition_zones(&mut out, report, treatment);
                }
            }
            write_effect(&mut out, kind, summary.effect.as_ref());
            if kind == ExperimentKind::Chunking {
                let (intact, total) = chunk_counts(report);
                let _ = writeln!(out, "  Chunks recalled intact: {intact}/{total}");
            }
        }
    }

    if report.skipped_trials > 0 {
        let _ = writeln!(out, "  Skipped trials: {}", report.skipped_trials);
    }
    out
}

/// Text view of one experiment.
pub fn render_experiment_text(kind: ExperimentKind, reports: &[ParticipantReport]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", "=".repeat(RULE));
    let _ = writeln!(out, "{}", heading(kind));
    let _ = writeln!(out, "{}", "=".repeat(RULE));
    for report in reports {
        out.push_str(&render_participant(report));
    }
    out
}

/// Text view of the whole study: every experiment then the completion matrix.
pub fn render_text(overview: &StudyOverview) -> String {
    let mut out = String::new();
    for kind in overview.experiments.keys() {
        out.push_str(&render_experiment_text(*kind, overview.reports(*kind)));
    }

    let _ = writeln!(out, "\n{}", "=".repeat(WIDE_RULE));
    let _ = writeln!(out, "SUMMARY TABLE - ALL EXPERIMENTS");
    let _ = writeln!(out, "{}", "=".repeat(WIDE_RULE));
    let names: Vec<&str> = overview.participants.iter().map(String::as_str).collect();
    let _ = writeln!(out, "\nTotal unique participants: {}", names.len());
    let _ = writeln!(out, "Participants: {}", names.join(", "));

    let _ = writeln!(out, "\nParticipant completion matrix:");
    let _ = write!(out, "{:<15}", "Participant");
    for kind in overview.experiments.keys() {
        let _ = write!(out, "{:<8}", format!("Exp {}", kind.number()));
    }
    out.push('\n');
    for (name, row) in overview.completion_matrix() {
        let _ = write!(out, "{name:<15}");
        for done in row {
            let _ = write!(out, "{:<8}", if done { "✓" } else { "✗" });
        }
        out.push('\n');
    }
    out
}

fn md_opt_pct(value: Option<f64>) -> String {
    value.map(pct).unwrap_or_else(|| "-".to_string())
}

fn markdown_experiment(out: &mut String, kind: ExperimentKind, reports: &[ParticipantReport]) {
    let _ = writeln!(out, "## Experiment {}: {}\n", kind.number(), kind.title());

    match (kind, kind.effect_pair()) {
        (ExperimentKind::WorkingMemoryCapacity, _) => {
            out.push_str("| Participant | Estimated capacity | Longest perfect | Accuracy |\n");
            out.push_str("|---|---|---|---|\n");
            for r in reports {
                let (capacity, perfect) = r
                    .summary
                    .capacity
                    .as_ref()
                    .map(|c| {
                        (
                            c.estimated_capacity.to_string(),
                            c.max_perfect_length.to_string(),
                        )
                    })
                    .unwrap_or_else(|| ("-".into(), "-".into()));
                let _ = writeln!(
                    out,
                    "| {} | {capacity} | {perfect} | {} |",
                    r.participant,
                    pct(r.summary.overall_accuracy)
                );
            }
        }
        (_, Some((baseline, treatment))) => {
            let _ = writeln!(
                out,
                "| Participant | {baseline} | {treatment} | {} | Span effect |",
                effect_label(kind)
            );
            out.push_str("|---|---|---|---|---|\n");
            for r in reports {
                let effect = r.summary.effect.as_ref();
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} | {} |",
                    r.participant,
                    md_opt_pct(r.condition_accuracy(baseline)),
                    md_opt_pct(r.condition_accuracy(treatment)),
                    effect
                        .map(|e| signed_pct(e.accuracy_effect))
                        .unwrap_or_else(|| "-".into()),
                    effect
                        .and_then(|e| e.span_effect)
                        .map(|s| format!("{s:+.1}"))
                        .unwrap_or_else(|| "-".into()),
                );
            }
        }
        _ => {
            out.push_str("| Participant | Trials | Accuracy | Mean span |\n");
            out.push_str("|---|---|---|---|\n");
            for r in reports {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} |",
                    r.participant,
                    r.summary.trial_count,
                    pct(r.summary.overall_accuracy),
                    r.summary
                        .mean_span
                        .map(|s| format!("{s:.1}"))
                        .unwrap_or_else(|| "-".into())
                );
            }
        }
    }
    out.push('\n');
}

/// Markdown view of the whole study.
pub fn render_markdown(overview: &StudyOverview) -> String {
    let mut out = String::new();
    out.push_str("# recallkit study summary\n\n");
    let _ = writeln!(
        out,
        "{} participants, {} reports, generated {}\n",
        overview.participants.len(),
        overview.report_count(),
        overview.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    for kind in overview.experiments.keys() {
        markdown_experiment(&mut out, *kind, overview.reports(*kind));
    }

    out.push_str("## Completion\n\n| Participant |");
    for kind in overview.experiments.keys() {
        let _ = write!(out, " Exp {} |", kind.number());
    }
    out.push_str("\n|---|");
    for _ in overview.experiments.keys() {
        out.push_str("---|");
    }
    out.push('\n');
    for (name, row) in overview.completion_matrix() {
        let _ = write!(out, "| {name} |");
        for done in row {
            out.push_str(if done { " ✓ |" } else { " ✗ |" });
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overview::tests::{scored, study, trial};

    #[test]
    fn percent_formatting() {
        assert_eq!(pct(0.8), "80.0%");
        assert_eq!(signed_pct(0.2), "+20.0%");
        assert_eq!(signed_pct(-0.05), "-5.0%");
    }

    #[test]
    fn tapping_block_shows_conditions_and_effects() {
        let reports = study();
        let text = render_participant(&reports[&ExperimentKind::FingerTapping][0]);
        assert!(text.contains("Participant: Ada"));
        assert!(text.contains("Control condition:"));
        assert!(text.contains("100.0%"));
        assert!(text.contains("Tapping effect:"));
        assert!(text.contains("+28.6%"));
        assert!(text.contains("+2.0 items"));
    }

    #[test]
    fn chunking_block_counts_intact_chunks() {
        let reports = study();
        let text = render_participant(&reports[&ExperimentKind::Chunking][0]);
        assert!(text.contains("Chunkable condition:"));
        assert!(text.contains("Chunking benefit:"));
        assert!(text.contains("Chunks recalled intact: 1/1"));
    }

    #[test]
    fn primacy_block_lists_zones_and_positions() {
        let reports = study();
        let text = render_participant(&reports[&ExperimentKind::PrimacyRecency][0]);
        assert!(text.contains("Total recalled: 4/12"));
        assert!(text.contains("Primacy (pos 1-3):  100.0%"));
        assert!(text.contains("Middle (pos 4-9):  0.0%"));
        assert!(text.contains("Recency (pos 10-12): 33.3%"));
        assert!(text.contains("Positions recalled: 1, 2, 3, 12"));
        assert!(text.contains("Intrusions: X"));
    }

    #[test]
    fn speed_block_breaks_effect_down_by_zone() {
        let report = scored(
            "Ada",
            ExperimentKind::PresentationSpeed,
            vec![
                trial(1, "slow", "BCDFGHJKLMNP", "BCDP"),
                trial(2, "fast", "BCDFGHJKLMNP", "BP"),
            ],
        );
        let text = render_participant(&report);
        assert!(text.contains("Speed benefit:"));
        assert!(text.contains("Serial position zones:"));
        assert!(text.contains("slow: primacy 100.0% | middle 0.0% | recency 33.3%"));
        assert!(text.contains("fast: primacy 33.3% | middle 0.0% | recency 33.3%"));
        assert!(text.contains("Primacy difference:     +66.7%"));
        assert!(text.contains("Recency difference:     +0.0%"));
    }

    #[test]
    fn pause_block_lists_early_positions() {
        let report = scored(
            "Ada",
            ExperimentKind::PauseBeforeRecall,
            vec![trial(1, "delayed", "BCDFGHJKLM", "B-DF------")],
        );
        let text = render_participant(&report);
        assert!(text.contains("Score: 3/10 (30.0%)"));
        assert!(text.contains("First 5 positions correct: 1, 3, 4"));
    }

    #[test]
    fn capacity_block_lists_lengths() {
        let report = scored(
            "Ada",
            ExperimentKind::WorkingMemoryCapacity,
            vec![
                trial(1, "serial", "BCD", "BCD"),
                trial(2, "serial", "BCDF", "BCDF"),
                trial(3, "serial", "BCDFG", "B----"),
            ],
        );
        let text = render_participant(&report);
        assert!(text.contains("Estimated capacity: 4 items"));
        assert!(text.contains("Longest perfect recall: 4 items"));
        assert!(text.contains("    5 items: 20.0%"));
    }

    #[test]
    fn study_text_ends_with_completion_matrix() {
        let overview = StudyOverview::build(study());
        let text = render_text(&overview);
        assert!(text.contains("EXPERIMENT 8: FINGER TAPPING"));
        assert!(text.contains("Total unique participants: 3"));
        assert!(text.contains("Participants: Ada, Bo, Cy"));
        let matrix_start = text.find("Participant completion matrix").unwrap();
        assert!(text[matrix_start..].contains("Exp 1"));
        assert!(text[matrix_start..].contains('✓'));
    }

    #[test]
    fn markdown_has_tables_per_experiment() {
        let overview = StudyOverview::build(study());
        let md = render_markdown(&overview);
        assert!(md.starts_with("# recallkit study summary"));
        assert!(md.contains("## Experiment 6: Chunking"));
        assert!(md.contains("| Participant | control | tapping | Tapping effect | Span effect |"));
        assert!(md.contains("| Bo | 100.0% | 100.0% | +0.0% | +0.0 |"));
        assert!(md.contains("## Completion"));
        assert!(md.contains("| Cy | ✓ | ✗ | ✗ |"));
    }
}
