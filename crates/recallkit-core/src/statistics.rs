//! Aggregate statistics over scored trials.
//!
//! Groups trials by condition, compares two conditions as an effect, and
//! estimates working-memory capacity from trials of varying length.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ScoringError, ScoringResult};
use crate::model::{Condition, ExperimentKind};
use crate::results::{ScoredTrial, ZoneScores};

/// Default mean accuracy a sequence length must reach to count toward capacity.
pub const DEFAULT_CAPACITY_THRESHOLD: f64 = 0.5;

/// Summary of every trial in one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSummary {
    pub trial_count: usize,
    /// Mean of the trials' accuracy rates.
    pub mean_accuracy: f64,
    /// Mean span from the start, over the serial trials of the group.
    #[serde(default)]
    pub mean_span: Option<f64>,
    /// Fraction of chunk trials whose chunk was recalled intact.
    #[serde(default)]
    pub chunk_intact_rate: Option<f64>,
    /// Mean accuracy keyed by sequence length.
    #[serde(default)]
    pub accuracy_by_length: BTreeMap<usize, f64>,
    /// Zone means over the free-recall trials of the group. `zone_size` is
    /// the first such trial's.
    #[serde(default)]
    pub mean_zones: Option<ZoneScores>,
}

/// Difference between two condition means, `baseline - treatment`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSummary {
    pub baseline: Condition,
    pub treatment: Condition,
    pub baseline_accuracy: f64,
    pub treatment_accuracy: f64,
    pub accuracy_effect: f64,
    /// Span difference, when both groups were scored serially.
    #[serde(default)]
    pub span_effect: Option<f64>,
    /// Primacy-zone difference, when both groups were scored as free recall.
    #[serde(default)]
    pub primacy_effect: Option<f64>,
    #[serde(default)]
    pub recency_effect: Option<f64>,
}

/// Working-memory capacity derived from trials of increasing length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityEstimate {
    /// Longest sequence recalled perfectly at least once.
    pub max_perfect_length: usize,
    /// Longest length, walking upward, whose mean accuracy stayed at or above
    /// the threshold.
    pub estimated_capacity: usize,
    pub threshold: f64,
    pub performance_by_length: BTreeMap<usize, f64>,
}

/// Everything computed about one participant's session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantSummary {
    pub trial_count: usize,
    pub overall_accuracy: f64,
    #[serde(default)]
    pub mean_span: Option<f64>,
    pub conditions: BTreeMap<Condition, ConditionSummary>,
    #[serde(default)]
    pub effect: Option<EffectSummary>,
    #[serde(default)]
    pub capacity: Option<CapacityEstimate>,
    #[serde(default)]
    pub chunk_intact_rate: Option<f64>,
}

impl ParticipantSummary {
    pub fn condition(&self, name: &str) -> Option<&ConditionSummary> {
        self.conditions.get(name)
    }
}

fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0f64, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Summarise one group of trials.
pub fn summarize_group(trials: &[&ScoredTrial]) -> ScoringResult<ConditionSummary> {
    if trials.is_empty() {
        return Err(ScoringError::NoTrials);
    }

    let mean_accuracy = mean(trials.iter().map(|t| t.accuracy_rate())).unwrap_or(0.0);
    let mean_span = mean(
        trials
            .iter()
            .filter_map(|t| t.correct_from_start())
            .map(|s| s as f64),
    );
    let chunk_intact_rate = mean(
        trials
            .iter()
            .filter_map(|t| t.chunk_intact())
            .map(|intact| if intact { 1.0 } else { 0.0 }),
    );

    let zones: Vec<&ZoneScores> = trials
        .iter()
        .filter_map(|t| t.analysis.as_free())
        .map(|a| &a.zones)
        .collect();
    let mean_zones = zones.first().map(|first| ZoneScores {
        zone_size: first.zone_size,
        primacy: mean(zones.iter().map(|z| z.primacy)).unwrap_or(0.0),
        middle: mean(zones.iter().map(|z| z.middle)).unwrap_or(0.0),
        recency: mean(zones.iter().map(|z| z.recency)).unwrap_or(0.0),
    });

    let mut by_length: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
    for t in trials {
        by_length
            .entry(t.sequence_length)
            .or_default()
            .push(t.accuracy_rate());
    }
    let accuracy_by_length = by_length
        .into_iter()
        .filter_map(|(len, values)| mean(values).map(|m| (len, m)))
        .collect();

    Ok(ConditionSummary {
        trial_count: trials.len(),
        mean_accuracy,
        mean_span,
        chunk_intact_rate,
        accuracy_by_length,
        mean_zones,
    })
}

/// Group trials by `group_key` and summarise each group.
///
/// Fails when `trials` is empty.
pub fn aggregate<K, F>(
    trials: &[ScoredTrial],
    group_key: F,
) -> ScoringResult<BTreeMap<K, ConditionSummary>>
where
    K: Ord,
    F: Fn(&ScoredTrial) -> K,
{
    if trials.is_empty() {
        return Err(ScoringError::NoTrials);
    }

    let mut groups: BTreeMap<K, Vec<&ScoredTrial>> = BTreeMap::new();
    for t in trials {
        groups.entry(group_key(t)).or_default().push(t);
    }

    groups
        .into_iter()
        .map(|(key, group)| summarize_group(&group).map(|s| (key, s)))
        .collect()
}

/// Compare two groups produced by [`aggregate`]: `baseline - treatment`.
///
/// Fails when either group is missing or empty.
pub fn effect(
    groups: &BTreeMap<Condition, ConditionSummary>,
    baseline: &str,
    treatment: &str,
) -> ScoringResult<EffectSummary> {
    let lookup = |name: &str| {
        groups
            .get(name)
            .filter(|g| g.trial_count > 0)
            .ok_or_else(|| ScoringError::EmptyGroup(name.to_string()))
    };
    let base = lookup(baseline)?;
    let treat = lookup(treatment)?;

    let span_effect = match (base.mean_span, treat.mean_span) {
        (Some(b), Some(t)) => Some(b - t),
        _ => None,
    };
    let (primacy_effect, recency_effect) = match (base.mean_zones, treat.mean_zones) {
        (Some(b), Some(t)) => (Some(b.primacy - t.primacy), Some(b.recency - t.recency)),
        _ => (None, None),
    };

    Ok(EffectSummary {
        baseline: Condition::new(baseline),
        treatment: Condition::new(treatment),
        baseline_accuracy: base.mean_accuracy,
        treatment_accuracy: treat.mean_accuracy,
        accuracy_effect: base.mean_accuracy - treat.mean_accuracy,
        span_effect,
        primacy_effect,
        recency_effect,
    })
}

/// Estimate working-memory capacity.
///
/// Lengths are walked in ascending order; the estimate is the last length
/// whose mean accuracy reaches `threshold` before the first one that does
/// not. When even the shortest length falls short, the longest perfectly
/// recalled length is reported instead.
pub fn estimate_capacity(
    trials: &[ScoredTrial],
    threshold: f64,
) -> ScoringResult<CapacityEstimate> {
    if trials.is_empty() {
        return Err(ScoringError::NoTrials);
    }

    let max_perfect_length = trials
        .iter()
        .filter(|t| t.analysis.is_perfect())
        .map(|t| t.sequence_length)
        .max()
        .unwrap_or(0);

    let mut by_length: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
    for t in trials {
        by_length
            .entry(t.sequence_length)
            .or_default()
            .push(t.accuracy_rate());
    }
    let performance_by_length: BTreeMap<usize, f64> = by_length
        .into_iter()
        .filter_map(|(len, values)| mean(values).map(|m| (len, m)))
        .collect();

    let mut estimated_capacity = max_perfect_length;
    for (&length, &accuracy) in &performance_by_length {
        if accuracy >= threshold {
            estimated_capacity = length;
        } else {
            break;
        }
    }

    Ok(CapacityEstimate {
        max_perfect_length,
        estimated_capacity,
        threshold,
        performance_by_length,
    })
}

/// Build the participant summary for an experiment's scored trials.
pub fn summarize_participant(
    experiment: ExperimentKind,
    trials: &[ScoredTrial],
    capacity_threshold: f64,
) -> ScoringResult<ParticipantSummary> {
    let conditions = aggregate(trials, |t| t.condition.clone())?;
    let all: Vec<&ScoredTrial> = trials.iter().collect();
    let overall = summarize_group(&all)?;

    let effect = match experiment.effect_pair() {
        Some((baseline, treatment))
            if conditions.contains_key(baseline) && conditions.contains_key(treatment) =>
        {
            Some(effect(&conditions, baseline, treatment)?)
        }
        _ => None,
    };

    let capacity = if experiment.estimates_capacity() {
        Some(estimate_capacity(trials, capacity_threshold)?)
    } else {
        None
    };

    Ok(ParticipantSummary {
        trial_count: overall.trial_count,
        overall_accuracy: overall.mean_accuracy,
        mean_span: overall.mean_span,
        conditions,
        effect,
        capacity,
        chunk_intact_rate: overall.chunk_intact_rate,
    })
}
