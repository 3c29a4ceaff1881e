//! Collaborator traits.
//!
//! The scoring engine never touches storage itself. Persistence goes through
//! [`ResultStore`], implemented by the `recallkit-store` crate.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::model::ExperimentKind;
use crate::report::ParticipantReport;

/// Persists participant reports and reads them back for reporting.
pub trait ResultStore {
    /// Write one report and return where it was stored.
    fn save(&self, report: &ParticipantReport) -> anyhow::Result<PathBuf>;

    /// All stored reports for one experiment, oldest first.
    fn load_experiment(&self, experiment: ExperimentKind) -> anyhow::Result<Vec<ParticipantReport>>;

    /// All stored reports, grouped by experiment. Experiments without any
    /// reports are left out.
    fn load_all(&self) -> anyhow::Result<BTreeMap<ExperimentKind, Vec<ParticipantReport>>> {
        let mut all = BTreeMap::new();
        for kind in ExperimentKind::ALL {
            let reports = self.load_experiment(kind)?;
            if !reports.is_empty() {
                all.insert(kind, reports);
            }
        }
        Ok(all)
    }
}
