//! Session scoring engine.
//!
//! Scores every trial of a session with the experiment's scoring mode,
//! decides what to do with trials that cannot be scored, and builds the
//! participant report.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use uuid::Uuid;

use crate::error::ScoringError;
use crate::model::{Session, Trial};
use crate::report::ParticipantReport;
use crate::results::ScoredTrial;
use crate::scorer::{score_chunk_intact, RecallScorer, ScorerConfig};
use crate::statistics::{summarize_participant, DEFAULT_CAPACITY_THRESHOLD};

/// Configuration for the session engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Zone size for free-recall scoring when the session does not set one.
    pub zone_size: Option<usize>,
    /// Zone size that wins over the session file's own `zone_size`.
    pub zone_size_override: Option<usize>,
    /// Mean accuracy a length must reach to count toward capacity.
    pub capacity_threshold: f64,
    /// Skip trials that fail to score instead of aborting the session.
    pub skip_invalid_trials: bool,
    /// Reject stimuli whose length differs from the experiment's list length.
    pub enforce_sequence_length: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            zone_size: None,
            zone_size_override: None,
            capacity_threshold: DEFAULT_CAPACITY_THRESHOLD,
            skip_invalid_trials: true,
            enforce_sequence_length: false,
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_trial_scored(&self, trial: &ScoredTrial);
    fn on_trial_error(&self, trial_number: u32, error: &ScoringError);
    fn on_session_complete(&self, participant: &str, scored: usize, skipped: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_trial_scored(&self, _: &ScoredTrial) {}
    fn on_trial_error(&self, _: u32, _: &ScoringError) {}
    fn on_session_complete(&self, _: &str, _: usize, _: usize, _: Duration) {}
}

/// Scores sessions into participant reports.
#[derive(Debug, Clone, Default)]
pub struct SessionEngine {
    config: EngineConfig,
}

impl SessionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn scorer_for(&self, session: &Session) -> RecallScorer {
        let mut config = ScorerConfig::for_experiment(session.experiment)
            .with_zone_size(self.config.zone_size)
            .with_zone_size(session.zone_size)
            .with_zone_size(self.config.zone_size_override);
        if !self.config.enforce_sequence_length {
            config.sequence_length = None;
        }
        RecallScorer::new(config)
    }

    /// Score one trial, including its chunk when it has one.
    pub fn score_trial(
        &self,
        scorer: &RecallScorer,
        trial: &Trial,
    ) -> Result<ScoredTrial, ScoringError> {
        let analysis = scorer.score(&trial.original, &trial.recalled)?;
        let chunk = match &trial.chunk {
            Some(chunk) => Some(score_chunk_intact(
                &trial.original,
                &trial.recalled,
                &chunk.symbols,
                chunk.start,
            )?),
            None => None,
        };

        Ok(ScoredTrial {
            number: trial.number,
            condition: trial.condition.clone(),
            sequence_length: trial.original.len(),
            analysis,
            chunk,
        })
    }

    /// Score every trial of a session and summarise the participant.
    pub fn score_session(
        &self,
        session: &Session,
        progress: &dyn ProgressReporter,
    ) -> Result<ParticipantReport> {
        let start = Instant::now();
        let scorer = self.scorer_for(session);
        tracing::debug!(
            participant = %session.participant,
            experiment = %session.experiment,
            trials = session.trials.len(),
            "scoring session"
        );

        let mut scored = Vec::with_capacity(session.trials.len());
        let mut skipped = 0usize;

        for trial in &session.trials {
            match self.score_trial(&scorer, trial) {
                Ok(result) => {
                    progress.on_trial_scored(&result);
                    scored.push(result);
                }
                Err(e) if self.config.skip_invalid_trials => {
                    tracing::warn!(
                        "skipping trial {} for {}: {e}",
                        trial.number,
                        session.participant
                    );
                    progress.on_trial_error(trial.number, &e);
                    skipped += 1;
                }
                Err(e) => {
                    progress.on_trial_error(trial.number, &e);
                    return Err(e).with_context(|| {
                        format!(
                            "trial {} of {} could not be scored",
                            trial.number, session.participant
                        )
                    });
                }
            }
        }

        let summary = summarize_participant(
            session.experiment,
            &scored,
            self.config.capacity_threshold,
        )
        .with_context(|| format!("no scorable trials for {}", session.participant))?;

        let elapsed = start.elapsed();
        progress.on_session_complete(&session.participant, scored.len(), skipped, elapsed);
        tracing::info!(
            participant = %session.participant,
            experiment = %session.experiment,
            scored = scored.len(),
            skipped,
            accuracy = summary.overall_accuracy,
            "session scored"
        );

        Ok(ParticipantReport {
            id: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            participant: session.participant.clone(),
            experiment: session.experiment,
            notes: session.notes.clone(),
            trials: scored,
            skipped_trials: skipped,
            summary,
        })
    }
}
