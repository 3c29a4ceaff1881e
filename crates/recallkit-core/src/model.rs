//! Core data model types for recallkit.
//!
//! These types describe what a Presenter hands to the scoring engine: the
//! experiment being run, the condition of each trial, and the original and
//! recalled symbol sequences.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a trial's recall is compared against its stimulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
    /// Order matters: position `i` of the recall is compared to position `i`.
    Serial,
    /// Order is ignored: any recalled occurrence of a symbol counts.
    Free,
}

impl fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringMode::Serial => write!(f, "serial"),
            ScoringMode::Free => write!(f, "free"),
        }
    }
}

impl FromStr for ScoringMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "serial" => Ok(ScoringMode::Serial),
            "free" | "free_recall" => Ok(ScoringMode::Free),
            other => Err(format!("unknown scoring mode: {other}")),
        }
    }
}

/// The experiments recallkit knows how to score and summarise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentKind {
    PrimacyRecency,
    PresentationSpeed,
    WorkingMemoryTask,
    PauseBeforeRecall,
    WorkingMemoryCapacity,
    Chunking,
    ArticulatorySuppression,
    FingerTapping,
}

impl ExperimentKind {
    /// All experiments, in catalogue order.
    pub const ALL: [ExperimentKind; 8] = [
        ExperimentKind::PrimacyRecency,
        ExperimentKind::PresentationSpeed,
        ExperimentKind::WorkingMemoryTask,
        ExperimentKind::PauseBeforeRecall,
        ExperimentKind::WorkingMemoryCapacity,
        ExperimentKind::Chunking,
        ExperimentKind::ArticulatorySuppression,
        ExperimentKind::FingerTapping,
    ];

    /// One-based catalogue number.
    pub fn number(self) -> usize {
        match self {
            ExperimentKind::PrimacyRecency => 1,
            ExperimentKind::PresentationSpeed => 2,
            ExperimentKind::WorkingMemoryTask => 3,
            ExperimentKind::PauseBeforeRecall => 4,
            ExperimentKind::WorkingMemoryCapacity => 5,
            ExperimentKind::Chunking => 6,
            ExperimentKind::ArticulatorySuppression => 7,
            ExperimentKind::FingerTapping => 8,
        }
    }

    /// Human-readable title.
    pub fn title(self) -> &'static str {
        match self {
            ExperimentKind::PrimacyRecency => "Primacy & Recency",
            ExperimentKind::PresentationSpeed => "Presentation Speed",
            ExperimentKind::WorkingMemoryTask => "Working Memory Task",
            ExperimentKind::PauseBeforeRecall => "Pause Before Recall",
            ExperimentKind::WorkingMemoryCapacity => "Working Memory Capacity",
            ExperimentKind::Chunking => "Chunking",
            ExperimentKind::ArticulatorySuppression => "Articulatory Suppression",
            ExperimentKind::FingerTapping => "Finger Tapping",
        }
    }

    pub fn scoring_mode(self) -> ScoringMode {
        match self {
            ExperimentKind::PrimacyRecency
            | ExperimentKind::PresentationSpeed
            | ExperimentKind::WorkingMemoryTask => ScoringMode::Free,
            _ => ScoringMode::Serial,
        }
    }

    /// Fixed list length, or `None` when the length varies from trial to trial.
    pub fn default_sequence_length(self) -> Option<usize> {
        match self {
            ExperimentKind::PrimacyRecency
            | ExperimentKind::PresentationSpeed
            | ExperimentKind::WorkingMemoryTask
            | ExperimentKind::PauseBeforeRecall => Some(20),
            ExperimentKind::Chunking | ExperimentKind::FingerTapping => Some(7),
            ExperimentKind::WorkingMemoryCapacity | ExperimentKind::ArticulatorySuppression => {
                None
            }
        }
    }

    /// Conditions a session of this experiment is expected to contain.
    /// The first entry is the default for trials that omit a condition.
    pub fn expected_conditions(self) -> &'static [&'static str] {
        match self {
            ExperimentKind::PrimacyRecency => &["free"],
            ExperimentKind::PresentationSpeed => &["slow", "fast"],
            ExperimentKind::WorkingMemoryTask => &["control", "distraction"],
            ExperimentKind::PauseBeforeRecall => &["delayed"],
            ExperimentKind::WorkingMemoryCapacity => &["serial"],
            ExperimentKind::Chunking => &["chunkable", "random"],
            ExperimentKind::ArticulatorySuppression => &["control", "suppression"],
            ExperimentKind::FingerTapping => &["control", "tapping"],
        }
    }

    /// The `(baseline, treatment)` pair whose difference is reported as the
    /// effect. Effects are always `baseline - treatment`.
    pub fn effect_pair(self) -> Option<(&'static str, &'static str)> {
        match self {
            ExperimentKind::PresentationSpeed => Some(("slow", "fast")),
            ExperimentKind::WorkingMemoryTask => Some(("control", "distraction")),
            ExperimentKind::Chunking => Some(("chunkable", "random")),
            ExperimentKind::ArticulatorySuppression => Some(("control", "suppression")),
            ExperimentKind::FingerTapping => Some(("control", "tapping")),
            _ => None,
        }
    }

    /// Whether the participant summary carries a capacity estimate.
    pub fn estimates_capacity(self) -> bool {
        matches!(self, ExperimentKind::WorkingMemoryCapacity)
    }

    /// File-name prefix used by the result store.
    pub fn file_prefix(self) -> &'static str {
        match self {
            ExperimentKind::PrimacyRecency => "primacy_recency_results_",
            ExperimentKind::PresentationSpeed => "experiment2_presentation_speed_",
            ExperimentKind::WorkingMemoryTask => "experiment3_working_memory_task_",
            ExperimentKind::PauseBeforeRecall => "delayed_memory_results_",
            ExperimentKind::WorkingMemoryCapacity => "experiment5_working_memory_capacity_",
            ExperimentKind::Chunking => "experiment6_chunking_",
            ExperimentKind::ArticulatorySuppression => "experiment7_articulatory_suppression_",
            ExperimentKind::FingerTapping => "experiment8_finger_tapping_",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            ExperimentKind::PrimacyRecency => "primacy_recency",
            ExperimentKind::PresentationSpeed => "presentation_speed",
            ExperimentKind::WorkingMemoryTask => "working_memory_task",
            ExperimentKind::PauseBeforeRecall => "pause_before_recall",
            ExperimentKind::WorkingMemoryCapacity => "working_memory_capacity",
            ExperimentKind::Chunking => "chunking",
            ExperimentKind::ArticulatorySuppression => "articulatory_suppression",
            ExperimentKind::FingerTapping => "finger_tapping",
        }
    }
}

impl fmt::Display for ExperimentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ExperimentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace(['-', ' '], "_");
        if let Some(kind) = ExperimentKind::ALL.iter().find(|k| k.slug() == key) {
            return Ok(*kind);
        }
        // Catalogue numbers: "6", "exp6", "experiment6"
        let digits = key
            .trim_start_matches("experiment")
            .trim_start_matches("exp")
            .trim_start_matches('_');
        if let Ok(n) = digits.parse::<usize>() {
            if let Some(kind) = ExperimentKind::ALL.iter().find(|k| k.number() == n) {
                return Ok(*kind);
            }
        }
        match key.as_str() {
            "speed" => Ok(ExperimentKind::PresentationSpeed),
            "delayed" | "delayed_recall" => Ok(ExperimentKind::PauseBeforeRecall),
            "capacity" => Ok(ExperimentKind::WorkingMemoryCapacity),
            "suppression" => Ok(ExperimentKind::ArticulatorySuppression),
            "tapping" => Ok(ExperimentKind::FingerTapping),
            other => Err(format!("unknown experiment: {other}")),
        }
    }
}

/// Categorical trial condition, stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Condition(String);

impl Condition {
    pub fn new(name: impl AsRef<str>) -> Self {
        Condition(name.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Condition {
    fn from(s: &str) -> Self {
        Condition::new(s)
    }
}

impl AsRef<str> for Condition {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Condition {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A contiguous sub-sequence of the stimulus treated as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSpec {
    /// Index of the first chunk symbol within the original sequence.
    pub start: usize,
    /// The chunk's symbols, e.g. `['H', 'A', 'N', 'D']`.
    pub symbols: Vec<char>,
}

/// One completed trial: what was shown and what the participant typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    /// One-based trial number within the session.
    pub number: u32,
    pub condition: Condition,
    /// The stimulus, in presentation order.
    pub original: Vec<char>,
    /// The response. `None` marks a position left unanswered.
    pub recalled: Vec<Option<char>>,
    /// Embedded chunk, for chunking trials.
    #[serde(default)]
    pub chunk: Option<ChunkSpec>,
}

impl Trial {
    /// Recalled symbols with unanswered slots dropped, for free recall.
    pub fn recalled_symbols(&self) -> Vec<char> {
        self.recalled.iter().flatten().copied().collect()
    }
}

/// All trials one participant completed for one experiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub participant: String,
    pub experiment: ExperimentKind,
    /// Primacy/recency zone size override for free-recall scoring.
    #[serde(default)]
    pub zone_size: Option<usize>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub trials: Vec<Trial>,
}

/// Render a recalled sequence for display, with `-` for unanswered slots.
pub fn format_recalled(recalled: &[Option<char>]) -> String {
    recalled.iter().map(|c| c.unwrap_or('-')).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn experiment_parse_variants() {
        assert_eq!(
            "chunking".parse::<ExperimentKind>().unwrap(),
            ExperimentKind::Chunking
        );
        assert_eq!(
            "Finger-Tapping".parse::<ExperimentKind>().unwrap(),
            ExperimentKind::FingerTapping
        );
        assert_eq!(
            "exp5".parse::<ExperimentKind>().unwrap(),
            ExperimentKind::WorkingMemoryCapacity
        );
        assert_eq!(
            "7".parse::<ExperimentKind>().unwrap(),
            ExperimentKind::ArticulatorySuppression
        );
        assert_eq!(
            "speed".parse::<ExperimentKind>().unwrap(),
            ExperimentKind::PresentationSpeed
        );
        assert!("exp9".parse::<ExperimentKind>().is_err());
        assert!("reading".parse::<ExperimentKind>().is_err());
    }

    #[test]
    fn experiment_display_round_trips() {
        for kind in ExperimentKind::ALL {
            assert_eq!(kind.to_string().parse::<ExperimentKind>().unwrap(), kind);
        }
    }

    #[test]
    fn effect_pairs_use_expected_conditions() {
        for kind in ExperimentKind::ALL {
            if let Some((baseline, treatment)) = kind.effect_pair() {
                assert!(kind.expected_conditions().contains(&baseline));
                assert!(kind.expected_conditions().contains(&treatment));
            }
        }
    }

    #[test]
    fn free_recall_experiments() {
        assert_eq!(
            ExperimentKind::PrimacyRecency.scoring_mode(),
            ScoringMode::Free
        );
        assert_eq!(ExperimentKind::Chunking.scoring_mode(), ScoringMode::Serial);
        assert_eq!(ExperimentKind::Chunking.default_sequence_length(), Some(7));
        assert_eq!(
            ExperimentKind::WorkingMemoryCapacity.default_sequence_length(),
            None
        );
    }

    #[test]
    fn condition_is_normalized() {
        assert_eq!(Condition::new("  Control "), Condition::from("control"));
        assert_eq!(Condition::new("TAPPING").as_str(), "tapping");
    }

    #[test]
    fn trial_serde_keeps_missing_slots() {
        let trial = Trial {
            number: 1,
            condition: "control".into(),
            original: vec!['B', 'C', 'D'],
            recalled: vec![Some('B'), None, Some('D')],
            chunk: None,
        };
        let json = serde_json::to_string(&trial).unwrap();
        assert!(json.contains(r#""recalled":["B",null,"D"]"#));
        let back: Trial = serde_json::from_str(&json).unwrap();
        assert_eq!(back, trial);
        assert_eq!(back.recalled_symbols(), vec!['B', 'D']);
    }

    #[test]
    fn format_recalled_marks_gaps() {
        assert_eq!(format_recalled(&[Some('A'), None, Some('C')]), "A-C");
    }
}
