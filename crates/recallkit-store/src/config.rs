//! Configuration loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use recallkit_core::engine::EngineConfig;
use recallkit_core::statistics::DEFAULT_CAPACITY_THRESHOLD;

/// Top-level recallkit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecallkitConfig {
    /// Directory where participant reports are written and read.
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    /// Zone size for free-recall scoring. `None` uses a quarter of the list.
    #[serde(default)]
    pub zone_size: Option<usize>,
    /// Mean accuracy a list length must reach to count toward capacity.
    #[serde(default = "default_capacity_threshold")]
    pub capacity_threshold: f64,
    /// Skip trials that cannot be scored instead of failing the session.
    #[serde(default = "default_skip_invalid")]
    pub skip_invalid_trials: bool,
    /// Output format used when none is given on the command line.
    #[serde(default = "default_format")]
    pub default_format: String,
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("./results")
}
fn default_capacity_threshold() -> f64 {
    DEFAULT_CAPACITY_THRESHOLD
}
fn default_skip_invalid() -> bool {
    true
}
fn default_format() -> String {
    "text".to_string()
}

impl Default for RecallkitConfig {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
            zone_size: None,
            capacity_threshold: default_capacity_threshold(),
            skip_invalid_trials: default_skip_invalid(),
            default_format: default_format(),
        }
    }
}

impl RecallkitConfig {
    /// Engine settings derived from this configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            zone_size: self.zone_size,
            capacity_threshold: self.capacity_threshold,
            skip_invalid_trials: self.skip_invalid_trials,
            ..EngineConfig::default()
        }
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.capacity_threshold),
            "capacity_threshold must be between 0 and 1, got {}",
            self.capacity_threshold
        );
        anyhow::ensure!(self.zone_size != Some(0), "zone_size must be at least 1");
        Ok(())
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `recallkit.toml` in the current directory
/// 2. `~/.config/recallkit/config.toml`
///
/// Environment variable overrides: `RECALLKIT_RESULTS_DIR`, `RECALLKIT_ZONE_SIZE`.
pub fn load_config() -> Result<RecallkitConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<RecallkitConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("recallkit.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match &config_path {
        Some(path) => parse_config_file(path)?,
        None => RecallkitConfig::default(),
    };
    if let Some(path) = &config_path {
        tracing::debug!("loaded config from {}", path.display());
    }

    apply_env_overrides(&mut config)?;
    config.results_dir = PathBuf::from(resolve_env_vars(&config.results_dir.to_string_lossy()));
    config.validate()?;

    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<RecallkitConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<RecallkitConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

fn apply_env_overrides(config: &mut RecallkitConfig) -> Result<()> {
    if let Ok(dir) = std::env::var("RECALLKIT_RESULTS_DIR") {
        if !dir.is_empty() {
            config.results_dir = PathBuf::from(dir);
        }
    }

    if let Ok(size) = std::env::var("RECALLKIT_ZONE_SIZE") {
        let size: usize = size
            .trim()
            .parse()
            .with_context(|| format!("RECALLKIT_ZONE_SIZE is not a number: {size:?}"))?;
        config.zone_size = Some(size);
    }

    Ok(())
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("recallkit"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_RECALLKIT_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_RECALLKIT_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_RECALLKIT_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${unterminated"), "${unterminated");
        std::env::remove_var("_RECALLKIT_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = RecallkitConfig::default();
        assert_eq!(config.results_dir, PathBuf::from("./results"));
        assert_eq!(config.zone_size, None);
        assert_eq!(config.capacity_threshold, 0.5);
        assert!(config.skip_invalid_trials);
        assert_eq!(config.default_format, "text");
    }

    #[test]
    fn parse_partial_config() {
        let config: RecallkitConfig = toml::from_str(
            r#"
results_dir = "data/out"
zone_size = 3
"#,
        )
        .unwrap();
        assert_eq!(config.results_dir, PathBuf::from("data/out"));
        assert_eq!(config.zone_size, Some(3));
        assert!(config.skip_invalid_trials);
    }

    #[test]
    fn load_explicit_file_expands_vars() {
        std::env::set_var("_RECALLKIT_ROOT", "/tmp/study");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recallkit.toml");
        std::fs::write(
            &path,
            "results_dir = \"${_RECALLKIT_ROOT}/results\"\nskip_invalid_trials = false\n",
        )
        .unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        if std::env::var("RECALLKIT_RESULTS_DIR").is_err() {
            assert_eq!(config.results_dir, PathBuf::from("/tmp/study/results"));
        }
        assert!(!config.skip_invalid_trials);
        assert!(!config.engine_config().skip_invalid_trials);
        std::env::remove_var("_RECALLKIT_ROOT");
    }

    #[test]
    fn missing_explicit_file_fails() {
        let err = load_config_from(Some(Path::new("/no/such/recallkit.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "capacity_threshold = 1.5\n").unwrap();
        let err = load_config_from(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("capacity_threshold"));
    }
}
