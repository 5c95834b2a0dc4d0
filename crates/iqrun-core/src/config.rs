//! Runtime configuration for the IQ-TREE facade.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const ENV_IQTREE_BIN: &str = "IQRUN_IQTREE_BIN";
pub const ENV_TIMEOUT_SECS: &str = "IQRUN_TIMEOUT_SECS";
pub const ENV_SCRATCH_DIR: &str = "IQRUN_SCRATCH_DIR";

pub const DEFAULT_EXECUTABLE: &str = "iqtree2";

/// Where the executable lives, how long a run may take, and where
/// implicit-prefix scratch directories are created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IqTreeConfig {
    pub executable: PathBuf,
    /// Per-run timeout in seconds; 0 means unbounded.
    pub timeout_secs: u64,
    /// Root for scoped temporary directories; the system temp dir when `None`.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for IqTreeConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from(DEFAULT_EXECUTABLE),
            timeout_secs: 0,
            scratch_dir: None,
        }
    }
}

impl IqTreeConfig {
    /// Read `IQRUN_IQTREE_BIN`, `IQRUN_TIMEOUT_SECS` and `IQRUN_SCRATCH_DIR`.
    /// Unset or blank variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) but with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(exe) = get(ENV_IQTREE_BIN) {
            config.executable = PathBuf::from(exe);
        }
        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            config.timeout_secs = raw.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    var: ENV_TIMEOUT_SECS.to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        config.scratch_dir = get(ENV_SCRATCH_DIR).map(PathBuf::from);

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = IqTreeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, IqTreeConfig::default());
        assert_eq!(config.executable, PathBuf::from("iqtree2"));
    }

    #[test]
    fn test_reads_all_variables() {
        let config = IqTreeConfig::from_lookup(lookup(&[
            (ENV_IQTREE_BIN, "/opt/iqtree/bin/iqtree3"),
            (ENV_TIMEOUT_SECS, " 600 "),
            (ENV_SCRATCH_DIR, "/scratch"),
        ]))
        .unwrap();
        assert_eq!(config.executable, PathBuf::from("/opt/iqtree/bin/iqtree3"));
        assert_eq!(config.timeout_secs, 600);
        assert_eq!(config.scratch_dir, Some(PathBuf::from("/scratch")));
    }

    #[test]
    fn test_blank_executable_keeps_default() {
        let config = IqTreeConfig::from_lookup(lookup(&[(ENV_IQTREE_BIN, "  ")])).unwrap();
        assert_eq!(config.executable, PathBuf::from(DEFAULT_EXECUTABLE));
    }

    #[test]
    fn test_invalid_timeout() {
        let err = IqTreeConfig::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "-5")])).unwrap_err();
        match err {
            ConfigError::InvalidValue { var, value, .. } => {
                assert_eq!(var, ENV_TIMEOUT_SECS);
                assert_eq!(value, "-5");
            }
        }
    }
}
