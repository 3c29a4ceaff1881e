//! Cross-participant study overview.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use recallkit_core::model::{Condition, ExperimentKind};
use recallkit_core::report::ParticipantReport;

/// Aggregates for one experiment across every participant who ran it.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentOverview {
    pub experiment: ExperimentKind,
    pub title: String,
    /// Distinct participant names, sorted.
    pub participants: Vec<String>,
    pub report_count: usize,
    /// Mean of the participants' overall accuracies.
    pub mean_accuracy: f64,
    /// Mean of the participants' per-condition accuracies.
    pub condition_means: BTreeMap<Condition, f64>,
    /// Mean accuracy effect over participants that have one.
    pub mean_accuracy_effect: Option<f64>,
    pub mean_span_effect: Option<f64>,
    pub mean_capacity: Option<f64>,
}

/// Everything loaded from a results directory, summarised.
#[derive(Debug, Clone, Serialize)]
pub struct StudyOverview {
    pub generated_at: DateTime<Utc>,
    pub experiments: BTreeMap<ExperimentKind, ExperimentOverview>,
    /// Every participant name seen in any experiment, sorted.
    pub participants: BTreeSet<String>,
    #[serde(skip)]
    reports: BTreeMap<ExperimentKind, Vec<ParticipantReport>>,
}

fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0f64, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

impl ExperimentOverview {
    fn build(experiment: ExperimentKind, reports: &[ParticipantReport]) -> Self {
        let participants: BTreeSet<&str> = reports.iter().map(|r| r.participant.as_str()).collect();

        let mut per_condition: BTreeMap<Condition, Vec<f64>> = BTreeMap::new();
        for report in reports {
            for (condition, summary) in &report.summary.conditions {
                per_condition
                    .entry(condition.clone())
                    .or_default()
                    .push(summary.mean_accuracy);
            }
        }
        let condition_means = per_condition
            .into_iter()
            .filter_map(|(c, values)| mean(values).map(|m| (c, m)))
            .collect();

        let effects = || reports.iter().filter_map(|r| r.summary.effect.as_ref());

        Self {
            experiment,
            title: experiment.title().to_string(),
            participants: participants.into_iter().map(str::to_string).collect(),
            report_count: reports.len(),
            mean_accuracy: mean(reports.iter().map(|r| r.summary.overall_accuracy)).unwrap_or(0.0),
            condition_means,
            mean_accuracy_effect: mean(effects().map(|e| e.accuracy_effect)),
            mean_span_effect: mean(effects().filter_map(|e| e.span_effect)),
            mean_capacity: mean(
                reports
                    .iter()
                    .filter_map(|r| r.summary.capacity.as_ref())
                    .map(|c| c.estimated_capacity as f64),
            ),
        }
    }
}

impl StudyOverview {
    /// Summarise reports grouped by experiment. Empty groups are dropped.
    pub fn build(reports: BTreeMap<ExperimentKind, Vec<ParticipantReport>>) -> Self {
        let reports: BTreeMap<_, _> = reports
            .into_iter()
            .filter(|(_, group)| !group.is_empty())
            .collect();

        let experiments = reports
            .iter()
            .map(|(kind, group)| (*kind, ExperimentOverview::build(*kind, group)))
            .collect();
        let participants = reports
            .values()
            .flatten()
            .map(|r| r.participant.clone())
            .collect();

        Self {
            generated_at: Utc::now(),
            experiments,
            participants,
            reports,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Stored reports of one experiment, oldest first.
    pub fn reports(&self, experiment: ExperimentKind) -> &[ParticipantReport] {
        self.reports
            .get(&experiment)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn report_count(&self) -> usize {
        self.reports.values().map(Vec::len).sum()
    }

    /// Whether `participant` has at least one report for `experiment`.
    pub fn completed(&self, participant: &str, experiment: ExperimentKind) -> bool {
        self.reports(experiment)
            .iter()
            .any(|r| r.participant == participant)
    }

    /// One row per participant: completion flags in `experiments` key order.
    pub fn completion_matrix(&self) -> Vec<(&str, Vec<bool>)> {
        self.participants
            .iter()
            .map(|p| {
                let row = self
                    .experiments
                    .keys()
                    .map(|kind| self.completed(p, *kind))
                    .collect();
                (p.as_str(), row)
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use recallkit_core::engine::{NoopReporter, SessionEngine};
    use recallkit_core::model::{ChunkSpec, Session, Trial};

    pub(crate) fn trial(number: u32, condition: &str, original: &str, recalled: &str) -> Trial {
        Trial {
            number,
            condition: Condition::new(condition),
            original: original.chars().collect(),
            recalled: recalled.chars().map(|c| (c != '-').then_some(c)).collect(),
            chunk: None,
        }
    }

    pub(crate) fn scored(
        participant: &str,
        experiment: ExperimentKind,
        trials: Vec<Trial>,
    ) -> ParticipantReport {
        let session = Session {
            participant: participant.into(),
            experiment,
            zone_size: None,
            notes: String::new(),
            trials,
        };
        SessionEngine::default()
            .score_session(&session, &NoopReporter)
            .unwrap()
    }

    /// A small study: two tapping participants, one chunking participant,
    /// one primacy/recency participant.
    pub(crate) fn study() -> BTreeMap<ExperimentKind, Vec<ParticipantReport>> {
        let tapping = |name: &str, tapped: &str| {
            scored(
                name,
                ExperimentKind::FingerTapping,
                vec![
                    trial(1, "control", "BCDFGHJ", "BCDFGHJ"),
                    trial(2, "tapping", "KLMNPQR", tapped),
                ],
            )
        };
        let mut chunk_trial = trial(1, "chunkable", "FBIKRTM", "FBIKR-M");
        chunk_trial.chunk = Some(ChunkSpec {
            start: 0,
            symbols: vec!['F', 'B', 'I'],
        });

        let mut reports = BTreeMap::new();
        reports.insert(
            ExperimentKind::FingerTapping,
            vec![tapping("Ada", "KLMNP--"), tapping("Bo", "KLMNPQR")],
        );
        reports.insert(
            ExperimentKind::Chunking,
            vec![scored(
                "Ada",
                ExperimentKind::Chunking,
                vec![chunk_trial, trial(2, "random", "KRTBCDF", "KRT----")],
            )],
        );
        reports.insert(
            ExperimentKind::PrimacyRecency,
            vec![scored(
                "Cy",
                ExperimentKind::PrimacyRecency,
                vec![trial(1, "free", "ABCDEFGHIJKL", "ABCLX")],
            )],
        );
        reports
    }

    #[test]
    fn collects_unique_participants() {
        let overview = StudyOverview::build(study());
        assert_eq!(overview.report_count(), 4);
        let names: Vec<&str> = overview.participants.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["Ada", "Bo", "Cy"]);
    }

    #[test]
    fn completion_matrix_follows_experiment_order() {
        let overview = StudyOverview::build(study());
        let matrix = overview.completion_matrix();
        // Experiment order: primacy_recency, chunking, finger_tapping
        assert_eq!(matrix[0], ("Ada", vec![false, true, true]));
        assert_eq!(matrix[1], ("Bo", vec![false, false, true]));
        assert_eq!(matrix[2], ("Cy", vec![true, false, false]));
    }

    #[test]
    fn condition_means_average_participants() {
        let overview = StudyOverview::build(study());
        let tapping = &overview.experiments[&ExperimentKind::FingerTapping];
        assert_eq!(tapping.participants, vec!["Ada", "Bo"]);
        assert_eq!(tapping.condition_means["control"], 1.0);
        let expected = (5.0 / 7.0 + 1.0) / 2.0;
        assert!((tapping.condition_means["tapping"] - expected).abs() < 1e-12);
        let effect = tapping.mean_accuracy_effect.unwrap();
        assert!((effect - (1.0 - expected)).abs() < 1e-12);
        assert!(tapping.mean_capacity.is_none());
    }

    #[test]
    fn empty_groups_are_dropped() {
        let mut reports = study();
        reports.insert(ExperimentKind::WorkingMemoryCapacity, Vec::new());
        let overview = StudyOverview::build(reports);
        assert!(!overview
            .experiments
            .contains_key(&ExperimentKind::WorkingMemoryCapacity));
        assert!(overview
            .reports(ExperimentKind::WorkingMemoryCapacity)
            .is_empty());
    }

    #[test]
    fn serializes_without_raw_reports() {
        let overview = StudyOverview::build(study());
        let value = serde_json::to_value(&overview).unwrap();
        assert!(value.get("reports").is_none());
        assert!(value["experiments"]["finger_tapping"]["condition_means"]["control"].is_number());
    }
}
