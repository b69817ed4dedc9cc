use crate::executors::ExecutorError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::{fs::File, path::Path};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ConfigErrors {
    #[error("Failed to open config file")]
    FileNotFound(#[from] std::io::Error),
    #[error("Failed to parse config file")]
    InvalidConfig(#[from] serde_yaml::Error),
    #[error("Executor not supported")]
    UnsupportedExecutor(String),
    #[error("Executor failed to load")]
    FailedLoadExecutor(#[from] ExecutorError),
    #[error("Config failed preflight checks")]
    FailedPreflight,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    // executor config, only `local` is implemented for now
    #[serde(default)]
    pub executor: ExecutorConfig,
    // host dependent environment selection, see environment.rs
    #[serde(default, alias = "env")]
    pub environment: EnvironmentConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct ExecutorConfig {
    // which executor runs the schedule, resolved in Executors::load
    #[serde(default = "default_executor_name")]
    pub name: String,
    // per-run wall clock limit in seconds, absent means wait indefinitely
    #[serde(default)]
    pub timeout: Option<u64>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentConfig {
    // first rule whose substring occurs in the host name wins
    #[serde(default = "default_rules")]
    pub rules: Vec<EnvironmentRule>,
    // environment for hosts no rule matches
    #[serde(default = "default_environment", alias = "fallback")]
    pub default: String,
    // program used to enter the selected environment, empty disables the prefix
    #[serde(default = "default_activation")]
    pub activation: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentRule {
    pub host_contains: String,
    pub name: String,
}

static DEFAULT_RULES: Lazy<Vec<EnvironmentRule>> = Lazy::new(|| {
    vec![EnvironmentRule {
        host_contains: "tiger".to_string(),
        name: "247-main".to_string(),
    }]
});

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            name: default_executor_name(),
            timeout: None,
        }
    }
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            rules: default_rules(),
            default: default_environment(),
            activation: default_activation(),
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            executor: ExecutorConfig::default(),
            environment: EnvironmentConfig::default(),
        }
    }
}

impl RunnerConfig {
    /// load from a YAML file, built-in defaults apply when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigErrors> {
        let config = match path {
            Some(path) => serde_yaml::from_reader(File::open(path)?)?,
            None => Self::default(),
        };

        if config.preflight_checks() {
            return Err(ConfigErrors::FailedPreflight);
        }

        Ok(config)
    }

    /// returns true when the config contains an error
    pub fn preflight_checks(&self) -> bool {
        // attempt to catch all errors instead of piece-by-piece to make debugging easier for users
        let mut contains_error = false;

        if self.environment.default.is_empty() {
            error!("environment.default cannot be empty, every unmatched host needs an environment");
            contains_error = true;
        }

        for (index, rule) in self.environment.rules.iter().enumerate() {
            if rule.host_contains.is_empty() {
                error!("environment.rules[{index}].host_contains is empty and would match every host");
                contains_error = true;
            }

            if rule.name.is_empty() {
                error!("environment.rules[{index}].name cannot be empty");
                contains_error = true;
            }
        }

        if self.executor.timeout == Some(0) {
            error!("executor.timeout cannot be 0, omit it to wait indefinitely");
            contains_error = true;
        }

        contains_error
    }
}

fn default_executor_name() -> String {
    "local".to_string()
}

fn default_rules() -> Vec<EnvironmentRule> {
    DEFAULT_RULES.clone()
}

fn default_environment() -> String {
    "tfsdec".to_string()
}

fn default_activation() -> String {
    "conda".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_parses() {
        let config: RunnerConfig = serde_yaml::from_str(
            "executor:\n  name: local\n  timeout: 3600\nenvironment:\n  rules:\n    - host_contains: tiger\n      name: 247-main\n  default: tfsdec\n  activation: conda\n",
        )
        .unwrap();

        assert_eq!(config.executor.name, "local");
        assert_eq!(config.executor.timeout, Some(3600));
        assert_eq!(config.environment.rules.len(), 1);
        assert!(!config.preflight_checks());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let parsed = serde_yaml::from_str::<RunnerConfig>("executor:\n  name: local\n  threads: 8\n");

        assert!(parsed.is_err());
    }

    #[test]
    fn defaults_pass_preflight() {
        assert!(!RunnerConfig::default().preflight_checks());
    }

    #[test]
    fn load_without_a_path_uses_defaults() {
        let config = RunnerConfig::load(None).unwrap();

        assert_eq!(config.executor.name, "local");
        assert_eq!(config.executor.timeout, None);
        assert_eq!(config.environment.select("tiger-i19g10"), "247-main");
    }

    #[test]
    fn load_rejects_configs_failing_preflight() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runner.yaml");
        std::fs::write(&path, "executor:\n  timeout: 0\n").unwrap();

        assert!(matches!(
            RunnerConfig::load(Some(&path)),
            Err(ConfigErrors::FailedPreflight)
        ));
    }

    #[test]
    fn zero_timeout_fails_preflight() {
        let mut config = RunnerConfig::default();
        config.executor.timeout = Some(0);

        assert!(config.preflight_checks());
    }

    #[test]
    fn empty_rule_fails_preflight() {
        let mut config = RunnerConfig::default();
        config.environment.rules.push(EnvironmentRule {
            host_contains: String::new(),
            name: "anywhere".to_string(),
        });

        assert!(config.preflight_checks());
    }
}
