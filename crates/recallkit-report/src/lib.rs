//! recallkit-report: Cross-participant reporting.
//!
//! Builds a [`overview::StudyOverview`] from stored participant reports and
//! renders it as console text, markdown, or a self-contained HTML page.

pub mod html;
pub mod overview;
pub mod summary;

pub use overview::{ExperimentOverview, StudyOverview};
