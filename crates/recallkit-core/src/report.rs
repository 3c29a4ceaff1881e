//! Participant report types with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::ExperimentKind;
use crate::results::ScoredTrial;
use crate::statistics::ParticipantSummary;

/// Everything recorded about one participant's session of one experiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the session was scored.
    pub created_at: DateTime<Utc>,
    pub participant: String,
    pub experiment: ExperimentKind,
    #[serde(default)]
    pub notes: String,
    /// Scored trials, in session order.
    pub trials: Vec<ScoredTrial>,
    /// Trials that could not be scored and were left out.
    #[serde(default)]
    pub skipped_trials: usize,
    pub summary: ParticipantSummary,
}

impl ParticipantReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: ParticipantReport = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse report JSON: {}", path.display()))?;
        Ok(report)
    }

    /// Mean accuracy of one condition, if the participant has trials in it.
    pub fn condition_accuracy(&self, condition: &str) -> Option<f64> {
        self.summary
            .condition(condition)
            .map(|c| c.mean_accuracy)
    }
}
