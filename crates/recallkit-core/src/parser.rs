//! TOML session parser.
//!
//! Loads the sessions a Presenter writes after each participant, and
//! validates them before any scoring happens.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{ChunkSpec, Condition, ExperimentKind, ScoringMode, Session, Trial};

/// Intermediate TOML structure for parsing session files.
#[derive(Debug, Deserialize)]
struct TomlSessionFile {
    session: TomlSessionHeader,
    #[serde(default)]
    trials: Vec<TomlTrial>,
}

#[derive(Debug, Deserialize)]
struct TomlSessionHeader {
    participant: String,
    experiment: String,
    #[serde(default)]
    zone_size: Option<usize>,
    #[serde(default)]
    notes: String,
}

#[derive(Debug, Deserialize)]
struct TomlTrial {
    #[serde(default)]
    number: Option<u32>,
    #[serde(default)]
    condition: Option<String>,
    original: String,
    #[serde(default)]
    recalled: String,
    #[serde(default)]
    chunk: Option<String>,
    #[serde(default)]
    chunk_start: Option<usize>,
}

/// Characters that mark an unanswered recall slot.
const MISSING_MARKERS: [char; 4] = ['-', '_', '.', ' '];

/// Parse a stimulus string: one alphabetic symbol per character, upper-cased.
pub fn parse_stimulus(s: &str) -> Result<Vec<char>> {
    s.trim()
        .chars()
        .enumerate()
        .map(|(i, c)| {
            if c.is_alphabetic() {
                Ok(c.to_uppercase().next().unwrap_or(c))
            } else {
                anyhow::bail!("invalid symbol '{c}' at position {} in \"{s}\"", i + 1)
            }
        })
        .collect()
}

/// Parse a recall string. `-`, `_`, `.` and spaces mark unanswered slots.
pub fn parse_recall(s: &str) -> Result<Vec<Option<char>>> {
    s.trim_end()
        .chars()
        .enumerate()
        .map(|(i, c)| {
            if MISSING_MARKERS.contains(&c) {
                Ok(None)
            } else if c.is_alphabetic() {
                Ok(Some(c.to_uppercase().next().unwrap_or(c)))
            } else {
                anyhow::bail!("invalid symbol '{c}' at position {} in \"{s}\"", i + 1)
            }
        })
        .collect()
}

/// Parse a single TOML file into a `Session`.
pub fn parse_session(path: &Path) -> Result<Session> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read session file: {}", path.display()))?;

    parse_session_str(&content, path)
}

/// Parse a TOML string into a `Session` (useful for testing).
pub fn parse_session_str(content: &str, source_path: &Path) -> Result<Session> {
    let parsed: TomlSessionFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let participant = parsed.session.participant.trim().to_string();
    anyhow::ensure!(
        !participant.is_empty(),
        "participant name is empty in {}",
        source_path.display()
    );

    let experiment: ExperimentKind = parsed
        .session
        .experiment
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{}", e))?;
    let default_condition = experiment.expected_conditions()[0];

    let trials = parsed
        .trials
        .into_iter()
        .enumerate()
        .map(|(i, t)| -> Result<Trial> {
            let number = t.number.unwrap_or(i as u32 + 1);
            let original = parse_stimulus(&t.original)
                .with_context(|| format!("trial {number}: bad original sequence"))?;
            let recalled = parse_recall(&t.recalled)
                .with_context(|| format!("trial {number}: bad recalled sequence"))?;

            let chunk = match t.chunk {
                Some(chunk) => {
                    let symbols = parse_stimulus(&chunk)
                        .with_context(|| format!("trial {number}: bad chunk"))?;
                    let start = match t.chunk_start {
                        Some(start) => start,
                        None => find_subsequence(&original, &symbols).with_context(|| {
                            format!("trial {number}: chunk \"{chunk}\" not found in original")
                        })?,
                    };
                    Some(ChunkSpec { start, symbols })
                }
                None => None,
            };

            Ok(Trial {
                number,
                condition: Condition::new(t.condition.as_deref().unwrap_or(default_condition)),
                original,
                recalled,
                chunk,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Session {
        participant,
        experiment,
        zone_size: parsed.session.zone_size,
        notes: parsed.session.notes,
        trials,
    })
}

fn find_subsequence(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Load all `.toml` session files from a directory, in file-name order.
pub fn load_session_directory(dir: &Path) -> Result<Vec<Session>> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("toml"))
        .collect();
    paths.sort();

    paths.iter().map(|p| parse_session(p)).collect()
}

/// Load a session file, or every session file in a directory.
pub fn load_sessions(path: &Path) -> Result<Vec<Session>> {
    if path.is_dir() {
        load_session_directory(path)
    } else {
        Ok(vec![parse_session(path)?])
    }
}

/// A problem found in a session that does not stop it from being scored.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The trial the warning applies to, if any.
    pub trial: Option<u32>,
    pub message: String,
}

impl ValidationWarning {
    fn session(message: impl Into<String>) -> Self {
        Self {
            trial: None,
            message: message.into(),
        }
    }

    fn trial(number: u32, message: impl Into<String>) -> Self {
        Self {
            trial: Some(number),
            message: message.into(),
        }
    }
}

/// Validate a session and return warnings.
pub fn validate_session(session: &Session) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let experiment = session.experiment;

    if session.trials.is_empty() {
        warnings.push(ValidationWarning::session("session has no trials"));
        return warnings;
    }

    let expected = experiment.expected_conditions();
    let expected_len = experiment.default_sequence_length();
    let mut seen_numbers = HashSet::new();

    for trial in &session.trials {
        let n = trial.number;

        if !seen_numbers.insert(n) {
            warnings.push(ValidationWarning::trial(n, "duplicate trial number"));
        }

        if !expected.contains(&trial.condition.as_str()) {
            warnings.push(ValidationWarning::trial(
                n,
                format!(
                    "condition '{}' is not used by {} (expected one of: {})",
                    trial.condition,
                    experiment,
                    expected.join(", ")
                ),
            ));
        }

        if trial.original.is_empty() {
            warnings.push(ValidationWarning::trial(n, "original sequence is empty"));
            continue;
        }

        if let Some(len) = expected_len {
            if trial.original.len() != len {
                warnings.push(ValidationWarning::trial(
                    n,
                    format!(
                        "original has {} symbols, {} uses {}",
                        trial.original.len(),
                        experiment,
                        len
                    ),
                ));
            }
        }

        if experiment.scoring_mode() == ScoringMode::Serial
            && trial.recalled.len() > trial.original.len()
        {
            warnings.push(ValidationWarning::trial(
                n,
                format!(
                    "recalled has {} entries but original only {}",
                    trial.recalled.len(),
                    trial.original.len()
                ),
            ));
        }

        if let Some(chunk) = &trial.chunk {
            if experiment != ExperimentKind::Chunking {
                warnings.push(ValidationWarning::trial(
                    n,
                    format!("chunk given for non-chunking experiment {experiment}"),
                ));
            }
            let end = chunk.start + chunk.symbols.len();
            if chunk.symbols.is_empty() || end > trial.original.len() {
                warnings.push(ValidationWarning::trial(
                    n,
                    "chunk lies outside the original sequence",
                ));
            } else if trial.original[chunk.start..end] != chunk.symbols[..] {
                warnings.push(ValidationWarning::trial(
                    n,
                    format!("chunk does not match original at index {}", chunk.start),
                ));
            }
        }
    }

    if let Some((baseline, treatment)) = experiment.effect_pair() {
        for condition in [baseline, treatment] {
            if !session
                .trials
                .iter()
                .any(|t| t.condition.as_str() == condition)
            {
                warnings.push(ValidationWarning::session(format!(
                    "no '{condition}' trials; the {baseline}/{treatment} effect cannot be computed"
                )));
            }
        }
    }

    if let Some(k) = session.zone_size {
        if experiment.scoring_mode() == ScoringMode::Serial {
            warnings.push(ValidationWarning::session(format!(
                "zone_size = {k} is ignored for serial experiment {experiment}"
            )));
        }
    }

    warnings
}
