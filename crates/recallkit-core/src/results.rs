//! Scoring result types.
//!
//! Everything here is plain data built from primitives so a result store can
//! serialize it to JSON without any transformation.

use serde::{Deserialize, Serialize};

use crate::model::{Condition, ScoringMode};

/// Position-by-position comparison of an ordered recall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerialAnalysis {
    /// The stimulus, upper-cased.
    pub original: Vec<char>,
    /// The recall, upper-cased and padded to the stimulus length.
    pub recalled: Vec<Option<char>>,
    /// `true` at index `i` when the recall matched the stimulus there.
    pub position_correct: Vec<bool>,
    pub correct_positions: usize,
    pub total_positions: usize,
    /// `correct_positions / total_positions`.
    pub accuracy_rate: f64,
    /// Length of the longest correct prefix.
    pub correct_from_start: usize,
    pub perfect_match: bool,
}

/// Mean recall within the primacy, middle and recency zones of a list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneScores {
    /// Number of positions in each of the primacy and recency zones.
    pub zone_size: usize,
    pub primacy: f64,
    pub middle: f64,
    pub recency: f64,
}

impl ZoneScores {
    pub fn has_primacy_effect(&self) -> bool {
        self.primacy > self.middle
    }

    pub fn has_recency_effect(&self) -> bool {
        self.recency > self.middle
    }
}

/// Order-independent comparison of a recall against a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeRecallAnalysis {
    /// The stimulus, upper-cased.
    pub original: Vec<char>,
    /// Everything the participant typed, upper-cased, in input order.
    pub recalled: Vec<char>,
    /// `true` at index `i` when the stimulus symbol there was recalled anywhere.
    pub position_recalled: Vec<bool>,
    /// Number of entries typed, duplicates and intrusions included.
    pub total_recalled: usize,
    /// Entries that occur in the stimulus, duplicates included.
    pub correct_recalls: usize,
    /// Distinct recalled symbols that occur in the stimulus.
    pub unique_correct: usize,
    /// Number of distinct intrusions.
    pub false_recalls: usize,
    /// Distinct recalled symbols absent from the stimulus, sorted.
    pub intrusions: Vec<char>,
    /// `unique_correct / len(original)`.
    pub recall_rate: f64,
    pub zones: ZoneScores,
}

impl FreeRecallAnalysis {
    /// One-based serial positions that were recalled.
    pub fn recalled_positions(&self) -> Vec<usize> {
        self.position_recalled
            .iter()
            .enumerate()
            .filter(|(_, &r)| r)
            .map(|(i, _)| i + 1)
            .collect()
    }
}

/// Result of scoring one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum TrialAnalysis {
    Serial(SerialAnalysis),
    Free(FreeRecallAnalysis),
}

impl TrialAnalysis {
    pub fn mode(&self) -> ScoringMode {
        match self {
            TrialAnalysis::Serial(_) => ScoringMode::Serial,
            TrialAnalysis::Free(_) => ScoringMode::Free,
        }
    }

    /// Accuracy for serial trials, recall rate for free-recall trials.
    pub fn accuracy_rate(&self) -> f64 {
        match self {
            TrialAnalysis::Serial(a) => a.accuracy_rate,
            TrialAnalysis::Free(a) => a.recall_rate,
        }
    }

    /// Span from the start; only defined for serial recall.
    pub fn correct_from_start(&self) -> Option<usize> {
        match self {
            TrialAnalysis::Serial(a) => Some(a.correct_from_start),
            TrialAnalysis::Free(_) => None,
        }
    }

    pub fn sequence_length(&self) -> usize {
        match self {
            TrialAnalysis::Serial(a) => a.total_positions,
            TrialAnalysis::Free(a) => a.original.len(),
        }
    }

    /// Whether everything was recalled: every position for serial recall,
    /// every symbol and no intrusions for free recall.
    pub fn is_perfect(&self) -> bool {
        match self {
            TrialAnalysis::Serial(a) => a.perfect_match,
            TrialAnalysis::Free(a) => {
                a.false_recalls == 0 && a.position_recalled.iter().all(|&r| r)
            }
        }
    }

    pub fn as_serial(&self) -> Option<&SerialAnalysis> {
        match self {
            TrialAnalysis::Serial(a) => Some(a),
            TrialAnalysis::Free(_) => None,
        }
    }

    pub fn as_free(&self) -> Option<&FreeRecallAnalysis> {
        match self {
            TrialAnalysis::Free(a) => Some(a),
            TrialAnalysis::Serial(_) => None,
        }
    }
}

/// How well an embedded chunk survived recall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkResult {
    pub symbols: Vec<char>,
    pub start: usize,
    /// Every chunk position recalled correctly.
    pub chunk_intact: bool,
    pub chunk_correct: usize,
    /// Fraction of chunk positions recalled correctly.
    pub chunk_accuracy: f64,
    /// Accuracy over the positions outside the chunk; `None` when the chunk
    /// covers the whole sequence.
    pub non_chunk_accuracy: Option<f64>,
}

/// A trial together with its analysis, as stored in a participant report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredTrial {
    pub number: u32,
    pub condition: Condition,
    pub sequence_length: usize,
    pub analysis: TrialAnalysis,
    #[serde(default)]
    pub chunk: Option<ChunkResult>,
}

impl ScoredTrial {
    pub fn accuracy_rate(&self) -> f64 {
        self.analysis.accuracy_rate()
    }

    pub fn correct_from_start(&self) -> Option<usize> {
        self.analysis.correct_from_start()
    }

    pub fn chunk_intact(&self) -> Option<bool> {
        self.chunk.as_ref().map(|c| c.chunk_intact)
    }
}
