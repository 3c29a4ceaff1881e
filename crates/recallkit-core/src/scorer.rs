//! Recall scoring.
//!
//! Pure functions that compare a recall against its stimulus. Nothing here
//! touches the filesystem, a clock or shared state, so every function can be
//! called from anywhere and always returns the same output for the same input.

use std::collections::BTreeSet;

use crate::error::{ScoringError, ScoringResult};
use crate::model::{ExperimentKind, ScoringMode};
use crate::results::{
    ChunkResult, FreeRecallAnalysis, SerialAnalysis, TrialAnalysis, ZoneScores,
};

/// Parameters that used to differ between the individual experiment scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScorerConfig {
    /// Required stimulus length; `None` accepts any non-empty length.
    pub sequence_length: Option<usize>,
    /// Primacy/recency zone size; `None` derives it from the list length.
    pub zone_size: Option<usize>,
    pub scoring_mode: ScoringMode,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            sequence_length: None,
            zone_size: None,
            scoring_mode: ScoringMode::Serial,
        }
    }
}

impl ScorerConfig {
    /// The configuration an experiment was originally run with.
    pub fn for_experiment(kind: ExperimentKind) -> Self {
        Self {
            sequence_length: kind.default_sequence_length(),
            zone_size: None,
            scoring_mode: kind.scoring_mode(),
        }
    }

    pub fn with_zone_size(mut self, zone_size: Option<usize>) -> Self {
        if zone_size.is_some() {
            self.zone_size = zone_size;
        }
        self
    }
}

/// A scorer bound to one configuration.
#[derive(Debug, Clone, Default)]
pub struct RecallScorer {
    config: ScorerConfig,
}

impl RecallScorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Score one trial using the configured mode.
    ///
    /// In free-recall mode the unanswered slots of `recalled` are ignored.
    pub fn score(
        &self,
        original: &[char],
        recalled: &[Option<char>],
    ) -> ScoringResult<TrialAnalysis> {
        if let Some(expected) = self.config.sequence_length {
            if original.len() != expected {
                return Err(ScoringError::UnexpectedLength {
                    expected,
                    actual: original.len(),
                });
            }
        }
        match self.config.scoring_mode {
            ScoringMode::Serial => score_serial(original, recalled).map(TrialAnalysis::Serial),
            ScoringMode::Free => {
                let symbols: Vec<char> = recalled.iter().flatten().copied().collect();
                score_free_recall(original, &symbols, self.config.zone_size)
                    .map(TrialAnalysis::Free)
            }
        }
    }
}

/// Upper-case a single symbol.
pub fn normalize(symbol: char) -> char {
    symbol.to_uppercase().next().unwrap_or(symbol)
}

/// Case-insensitive comparison; an unanswered slot never matches.
pub fn symbols_match(expected: char, recalled: Option<char>) -> bool {
    recalled.is_some_and(|r| normalize(r) == normalize(expected))
}

/// Zone size used when none is configured: a quarter of the list, at least one.
pub fn default_zone_size(len: usize) -> usize {
    (len / 4).max(1)
}

fn rate(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

fn mean_of_flags(flags: &[bool]) -> f64 {
    rate(flags.iter().filter(|&&f| f).count(), flags.len())
}

/// Pad `recalled` with unanswered slots up to `len`.
fn pad_recalled(recalled: &[Option<char>], len: usize) -> ScoringResult<Vec<Option<char>>> {
    if recalled.len() > len {
        return Err(ScoringError::LengthMismatch {
            original: len,
            recalled: recalled.len(),
        });
    }
    let mut padded: Vec<Option<char>> = recalled.iter().map(|r| r.map(normalize)).collect();
    padded.resize(len, None);
    Ok(padded)
}

/// Score an ordered recall position by position.
pub fn score_serial(original: &[char], recalled: &[Option<char>]) -> ScoringResult<SerialAnalysis> {
    if original.is_empty() {
        return Err(ScoringError::EmptyStimulus);
    }
    let recalled = pad_recalled(recalled, original.len())?;
    let original: Vec<char> = original.iter().map(|&c| normalize(c)).collect();

    let position_correct: Vec<bool> = original
        .iter()
        .zip(&recalled)
        .map(|(&o, &r)| symbols_match(o, r))
        .collect();
    let correct_positions = position_correct.iter().filter(|&&c| c).count();
    let correct_from_start = position_correct.iter().take_while(|&&c| c).count();
    let total_positions = original.len();

    Ok(SerialAnalysis {
        perfect_match: correct_positions == total_positions,
        accuracy_rate: rate(correct_positions, total_positions),
        original,
        recalled,
        position_correct,
        correct_positions,
        total_positions,
        correct_from_start,
    })
}

/// Score an unordered recall, including primacy/middle/recency zones.
///
/// `zone_size` defaults to [`default_zone_size`] of the list length.
pub fn score_free_recall(
    original: &[char],
    recalled: &[char],
    zone_size: Option<usize>,
) -> ScoringResult<FreeRecallAnalysis> {
    if original.is_empty() {
        return Err(ScoringError::EmptyStimulus);
    }
    let len = original.len();
    let zone_size = zone_size.unwrap_or_else(|| default_zone_size(len));
    if zone_size == 0 || len < zone_size * 2 {
        return Err(ScoringError::ZoneOverflow { len, zone_size });
    }

    let original: Vec<char> = original.iter().map(|&c| normalize(c)).collect();
    let recalled: Vec<char> = recalled.iter().map(|&c| normalize(c)).collect();

    let in_original: BTreeSet<char> = original.iter().copied().collect();
    let distinct: BTreeSet<char> = recalled.iter().copied().collect();

    let unique_correct = distinct.iter().filter(|c| in_original.contains(c)).count();
    let intrusions: Vec<char> = distinct
        .iter()
        .filter(|c| !in_original.contains(c))
        .copied()
        .collect();
    let correct_recalls = recalled.iter().filter(|c| in_original.contains(c)).count();
    let position_recalled: Vec<bool> = original.iter().map(|c| distinct.contains(c)).collect();

    let zones = ZoneScores {
        zone_size,
        primacy: mean_of_flags(&position_recalled[..zone_size]),
        middle: mean_of_flags(&position_recalled[zone_size..len - zone_size]),
        recency: mean_of_flags(&position_recalled[len - zone_size..]),
    };

    Ok(FreeRecallAnalysis {
        total_recalled: recalled.len(),
        recall_rate: rate(unique_correct, len),
        false_recalls: intrusions.len(),
        original,
        recalled,
        position_recalled,
        correct_recalls,
        unique_correct,
        intrusions,
        zones,
    })
}

/// Check whether a chunk embedded in the stimulus was recalled intact.
///
/// `chunk_symbols` must occur in `original` starting at `chunk_start`.
pub fn score_chunk_intact(
    original: &[char],
    recalled: &[Option<char>],
    chunk_symbols: &[char],
    chunk_start: usize,
) -> ScoringResult<ChunkResult> {
    if chunk_symbols.is_empty() {
        return Err(ScoringError::EmptyChunk);
    }
    if original.is_empty() {
        return Err(ScoringError::EmptyStimulus);
    }
    let chunk_end = chunk_start + chunk_symbols.len();
    if chunk_end > original.len() {
        return Err(ScoringError::ChunkOutOfRange {
            start: chunk_start,
            chunk_len: chunk_symbols.len(),
            len: original.len(),
        });
    }
    for (offset, &symbol) in chunk_symbols.iter().enumerate() {
        if normalize(original[chunk_start + offset]) != normalize(symbol) {
            return Err(ScoringError::ChunkMismatch {
                index: chunk_start + offset,
            });
        }
    }

    let serial = score_serial(original, recalled)?;
    let chunk_flags = &serial.position_correct[chunk_start..chunk_end];
    let chunk_correct = chunk_flags.iter().filter(|&&c| c).count();

    let outside = serial.total_positions - chunk_symbols.len();
    let outside_correct = serial.correct_positions - chunk_correct;
    let non_chunk_accuracy = (outside > 0).then(|| rate(outside_correct, outside));

    Ok(ChunkResult {
        symbols: chunk_symbols.iter().map(|&c| normalize(c)).collect(),
        start: chunk_start,
        chunk_intact: chunk_correct == chunk_symbols.len(),
        chunk_correct,
        chunk_accuracy: rate(chunk_correct, chunk_symbols.len()),
        non_chunk_accuracy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn slots(s: &str) -> Vec<Option<char>> {
        s.chars().map(|c| (c != '-').then_some(c)).collect()
    }

    #[test]
    fn serial_example_stops_span_at_first_mismatch() {
        let a = score_serial(&chars("BCDFG"), &slots("BCXFG")).unwrap();
        assert!((a.accuracy_rate - 0.8).abs() < f64::EPSILON);
        assert_eq!(a.correct_positions, 4);
        assert_eq!(a.correct_from_start, 2);
        assert_eq!(a.position_correct, vec![true, true, false, true, true]);
        assert!(!a.perfect_match);
    }

    #[test]
    fn serial_perfect_recall() {
        let a = score_serial(&chars("KQMRBNF"), &slots("KQMRBNF")).unwrap();
        assert_eq!(a.accuracy_rate, 1.0);
        assert_eq!(a.correct_from_start, 7);
        assert!(a.perfect_match);
    }

    #[test]
    fn serial_is_case_insensitive() {
        let a = score_serial(&chars("BCD"), &slots("bcd")).unwrap();
        assert!(a.perfect_match);
        assert_eq!(a.recalled, vec![Some('B'), Some('C'), Some('D')]);
    }

    #[test]
    fn serial_first_wrong_means_zero_span() {
        let a = score_serial(&chars("BCDFG"), &slots("XCDFG")).unwrap();
        assert_eq!(a.correct_from_start, 0);
        assert_eq!(a.correct_positions, 4);
    }

    #[test]
    fn serial_pads_short_recall() {
        let a = score_serial(&chars("BCDFG"), &slots("BC")).unwrap();
        assert_eq!(a.recalled.len(), 5);
        assert_eq!(a.recalled[4], None);
        assert_eq!(a.correct_positions, 2);
        assert!((a.accuracy_rate - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn serial_missing_never_matches() {
        let a = score_serial(&chars("BCD"), &slots("B-D")).unwrap();
        assert_eq!(a.position_correct, vec![true, false, true]);
        assert_eq!(a.correct_from_start, 1);
    }

    #[test]
    fn serial_rejects_empty_and_overlong() {
        assert_eq!(
            score_serial(&[], &[]).unwrap_err(),
            ScoringError::EmptyStimulus
        );
        assert_eq!(
            score_serial(&chars("BC"), &slots("BCD")).unwrap_err(),
            ScoringError::LengthMismatch {
                original: 2,
                recalled: 3
            }
        );
    }

    #[test]
    fn serial_is_idempotent() {
        let first = score_serial(&chars("HJKLMNP"), &slots("HJ-LMXP")).unwrap();
        let second = score_serial(&chars("HJKLMNP"), &slots("HJ-LMXP")).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.accuracy_rate.to_bits(), second.accuracy_rate.to_bits());
    }

    #[test]
    fn serial_rate_bounds_hold_for_mixed_inputs() {
        let original = chars("QWRTPSDFGH");
        for recalled in ["QWRTPSDFGH", "----------", "QXRXPXDXGX", "Q", "ZZZZZZZZZZ"] {
            let a = score_serial(&original, &slots(recalled)).unwrap();
            assert!((0.0..=1.0).contains(&a.accuracy_rate));
            assert_eq!(
                a.accuracy_rate,
                a.correct_positions as f64 / original.len() as f64
            );
            assert!(a.correct_from_start <= a.correct_positions);
        }
    }

    const TWENTY: &str = "KQMRBNFXPHTLWZDGJVCS";

    #[test]
    fn free_recall_primacy_and_recency_intact() {
        let original = chars(TWENTY);
        // Drop two middle items (positions 8 and 12).
        let recalled: Vec<char> = original
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 7 && *i != 11)
            .map(|(_, &c)| c)
            .rev()
            .collect();
        assert_eq!(recalled.len(), 18);

        let a = score_free_recall(&original, &recalled, None).unwrap();
        assert_eq!(a.zones.zone_size, 5);
        assert_eq!(a.zones.primacy, 1.0);
        assert_eq!(a.zones.recency, 1.0);
        assert!((a.zones.middle - 0.8).abs() < f64::EPSILON);
        assert_eq!(a.unique_correct, 18);
        assert!((a.recall_rate - 0.9).abs() < f64::EPSILON);
        assert!(a.zones.has_primacy_effect());
        assert!(a.zones.has_recency_effect());
    }

    #[test]
    fn free_recall_empty_response_scores_zero() {
        let a = score_free_recall(&chars(TWENTY), &[], None).unwrap();
        assert_eq!(a.recall_rate, 0.0);
        assert_eq!(a.zones.primacy, 0.0);
        assert_eq!(a.zones.middle, 0.0);
        assert_eq!(a.zones.recency, 0.0);
        assert_eq!(a.total_recalled, 0);
    }

    #[test]
    fn free_recall_counts_duplicates_and_intrusions() {
        let a = score_free_recall(&chars("ABCDEFGH"), &chars("aAbZZy"), Some(2)).unwrap();
        assert_eq!(a.total_recalled, 6);
        assert_eq!(a.correct_recalls, 3);
        assert_eq!(a.unique_correct, 2);
        assert_eq!(a.false_recalls, 2);
        assert_eq!(a.intrusions, vec!['Y', 'Z']);
        assert!((a.recall_rate - 0.25).abs() < f64::EPSILON);
        assert_eq!(a.zones.primacy, 1.0);
        assert_eq!(a.recalled_positions(), vec![1, 2]);
    }

    #[test]
    fn free_recall_flags_every_position_of_repeated_symbol() {
        let a = score_free_recall(&chars("ABAB"), &chars("A"), Some(1)).unwrap();
        assert_eq!(a.position_recalled, vec![true, false, true, false]);
        assert_eq!(a.unique_correct, 1);
    }

    #[test]
    fn free_recall_zone_must_fit() {
        assert_eq!(
            score_free_recall(&chars("ABCDEFGH"), &[], Some(5)).unwrap_err(),
            ScoringError::ZoneOverflow {
                len: 8,
                zone_size: 5
            }
        );
        assert!(score_free_recall(&chars("A"), &[], None).is_err());
        assert_eq!(
            score_free_recall(&[], &[], None).unwrap_err(),
            ScoringError::EmptyStimulus
        );
    }

    #[test]
    fn free_recall_empty_middle_zone() {
        let a = score_free_recall(&chars("ABCD"), &chars("ABCD"), Some(2)).unwrap();
        assert_eq!(a.zones.middle, 0.0);
        assert_eq!(a.zones.primacy, 1.0);
        assert_eq!(a.zones.recency, 1.0);
    }

    #[test]
    fn default_zone_size_scales_with_length() {
        assert_eq!(default_zone_size(20), 5);
        assert_eq!(default_zone_size(12), 3);
        assert_eq!(default_zone_size(3), 1);
    }

    #[test]
    fn chunk_intact_with_errors_outside_chunk() {
        let r = score_chunk_intact(&chars("HANDKRT"), &slots("HANDXXX"), &chars("HAND"), 0)
            .unwrap();
        assert!(r.chunk_intact);
        assert_eq!(r.chunk_accuracy, 1.0);
        assert_eq!(r.non_chunk_accuracy, Some(0.0));
    }

    #[test]
    fn chunk_partial_credit_is_independent_of_intactness() {
        let r = score_chunk_intact(&chars("KRTHAND"), &slots("KRTHA-D"), &chars("HAND"), 3)
            .unwrap();
        assert!(!r.chunk_intact);
        assert_eq!(r.chunk_correct, 3);
        assert!((r.chunk_accuracy - 0.75).abs() < f64::EPSILON);
        assert_eq!(r.non_chunk_accuracy, Some(1.0));
    }

    #[test]
    fn chunk_perfect_recall_is_intact_anywhere() {
        let original = chars("KRTHAND");
        let recalled = slots("KRTHAND");
        for start in 0..4 {
            let symbols = &original[start..start + 4];
            let r = score_chunk_intact(&original, &recalled, symbols, start).unwrap();
            assert!(r.chunk_intact);
        }
    }

    #[test]
    fn chunk_spanning_whole_sequence_has_no_outside_accuracy() {
        let r = score_chunk_intact(&chars("HAND"), &slots("HAND"), &chars("HAND"), 0).unwrap();
        assert_eq!(r.non_chunk_accuracy, None);
    }

    #[test]
    fn chunk_rejects_bad_specs() {
        let original = chars("HANDKRT");
        let recalled = slots("HANDKRT");
        assert_eq!(
            score_chunk_intact(&original, &recalled, &[], 0).unwrap_err(),
            ScoringError::EmptyChunk
        );
        assert_eq!(
            score_chunk_intact(&original, &recalled, &chars("HAND"), 5).unwrap_err(),
            ScoringError::ChunkOutOfRange {
                start: 5,
                chunk_len: 4,
                len: 7
            }
        );
        assert_eq!(
            score_chunk_intact(&original, &recalled, &chars("HINT"), 0).unwrap_err(),
            ScoringError::ChunkMismatch { index: 1 }
        );
    }

    #[test]
    fn scorer_dispatches_by_mode() {
        let serial = RecallScorer::new(ScorerConfig::for_experiment(ExperimentKind::FingerTapping));
        let a = serial.score(&chars("BCDFGHJ"), &slots("BCDFGHJ")).unwrap();
        assert_eq!(a.mode(), ScoringMode::Serial);
        assert_eq!(a.correct_from_start(), Some(7));

        let free = RecallScorer::new(ScorerConfig {
            sequence_length: None,
            zone_size: Some(2),
            scoring_mode: ScoringMode::Free,
        });
        let a = free.score(&chars("ABCDEF"), &slots("F-A")).unwrap();
        assert_eq!(a.mode(), ScoringMode::Free);
        assert!((a.accuracy_rate() - 2.0 / 6.0).abs() < f64::EPSILON);
        assert_eq!(a.correct_from_start(), None);
    }

    #[test]
    fn scorer_enforces_configured_length() {
        let scorer = RecallScorer::new(ScorerConfig::for_experiment(ExperimentKind::Chunking));
        assert_eq!(
            scorer.score(&chars("BCDFG"), &[]).unwrap_err(),
            ScoringError::UnexpectedLength {
                expected: 7,
                actual: 5
            }
        );
    }
}
