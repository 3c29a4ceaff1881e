//! Directory-of-JSON result store.
//!
//! Each participant report is one pretty-printed JSON file named
//! `<experiment prefix><participant slug>_<YYYYmmdd_HHMMSS>.json`. Loading
//! scans the directory by prefix and skips files that cannot be read.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use recallkit_core::model::ExperimentKind;
use recallkit_core::report::ParticipantReport;
use recallkit_core::traits::ResultStore;

use crate::error::StoreError;

/// Stores participant reports as JSON files under a root directory.
#[derive(Debug, Clone)]
pub struct JsonResultStore {
    root: PathBuf,
}

impl JsonResultStore {
    /// Open a store rooted at `root`. The directory is created on first save.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        if root.exists() && !root.is_dir() {
            return Err(StoreError::NotADirectory(root));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File name a report is saved under.
    pub fn file_name_for(report: &ParticipantReport) -> Result<String, StoreError> {
        let slug = participant_slug(&report.participant);
        if slug.is_empty() {
            return Err(StoreError::EmptyParticipant);
        }
        Ok(format!(
            "{}{}_{}.json",
            report.experiment.file_prefix(),
            slug,
            report.created_at.format("%Y%m%d_%H%M%S")
        ))
    }

    /// Next free path for `file_name`, adding `_2`, `_3`, ... on collision.
    fn unused_path(&self, file_name: &str) -> PathBuf {
        let path = self.root.join(file_name);
        if !path.exists() {
            return path;
        }
        let stem = file_name.trim_end_matches(".json");
        (2..)
            .map(|n| self.root.join(format!("{stem}_{n}.json")))
            .find(|p| !p.exists())
            .unwrap_or(path)
    }

    /// Every `.json` file in the root with the experiment it belongs to.
    fn report_files(&self) -> Result<Vec<(ExperimentKind, PathBuf)>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let entries = std::fs::read_dir(&self.root)
            .with_context(|| format!("failed to read directory: {}", self.root.display()))?;
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            match experiment_for_file(name) {
                Ok(kind) => files.push((kind, path)),
                Err(e) => tracing::debug!("ignoring {}: {e}", path.display()),
            }
        }
        files.sort_by(|a, b| a.1.cmp(&b.1));
        Ok(files)
    }

    fn load_files<'a>(
        paths: impl Iterator<Item = &'a PathBuf>,
        kind: ExperimentKind,
    ) -> Vec<ParticipantReport> {
        let mut reports: Vec<ParticipantReport> = paths
            .filter_map(|path| match ParticipantReport::load_json(path) {
                Ok(report) if report.experiment == kind => Some(report),
                Ok(report) => {
                    tracing::warn!(
                        "skipping {}: file name says {kind} but report is {}",
                        path.display(),
                        report.experiment
                    );
                    None
                }
                Err(e) => {
                    tracing::warn!("skipping unreadable report: {e:#}");
                    None
                }
            })
            .collect();
        reports.sort_by_key(|r| r.created_at);
        reports
    }
}

impl ResultStore for JsonResultStore {
    fn save(&self, report: &ParticipantReport) -> Result<PathBuf> {
        let file_name = Self::file_name_for(report)?;
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create {}", self.root.display()))?;
        let path = self.unused_path(&file_name);
        report.save_json(&path)?;
        tracing::info!(
            participant = %report.participant,
            experiment = %report.experiment,
            "saved report to {}",
            path.display()
        );
        Ok(path)
    }

    fn load_experiment(&self, experiment: ExperimentKind) -> Result<Vec<ParticipantReport>> {
        let files = self.report_files()?;
        let paths = files
            .iter()
            .filter(|(kind, _)| *kind == experiment)
            .map(|(_, path)| path);
        Ok(Self::load_files(paths, experiment))
    }

    fn load_all(&self) -> Result<BTreeMap<ExperimentKind, Vec<ParticipantReport>>> {
        let mut by_kind: BTreeMap<ExperimentKind, Vec<PathBuf>> = BTreeMap::new();
        for (kind, path) in self.report_files()? {
            by_kind.entry(kind).or_default().push(path);
        }

        let mut all = BTreeMap::new();
        for (kind, paths) in by_kind {
            let reports = Self::load_files(paths.iter(), kind);
            if !reports.is_empty() {
                all.insert(kind, reports);
            }
        }
        tracing::debug!(
            "loaded {} reports across {} experiments from {}",
            all.values().map(Vec::len).sum::<usize>(),
            all.len(),
            self.root.display()
        );
        Ok(all)
    }
}

/// Lowercase alphanumerics of a participant name, other characters as `_`.
pub fn participant_slug(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// The experiment a result file belongs to, judged by its name prefix.
pub fn experiment_for_file(file_name: &str) -> Result<ExperimentKind, StoreError> {
    ExperimentKind::ALL
        .into_iter()
        .find(|kind| file_name.starts_with(kind.file_prefix()))
        .ok_or_else(|| StoreError::UnknownFileName(file_name.to_string()))
}
