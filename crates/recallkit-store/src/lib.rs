//! recallkit-store: Result storage and configuration.
//!
//! Implements the `ResultStore` trait on a directory of JSON files and loads
//! the `recallkit.toml` configuration shared by the CLI.

pub mod config;
pub mod error;
pub mod json_store;

pub use config::{load_config, load_config_from, RecallkitConfig};
pub use error::StoreError;
pub use json_store::{participant_slug, JsonResultStore};
