use crate::config::EnvironmentConfig;
use nix::unistd::gethostname;
use std::env;
use tracing::warn;

/// requester and host identity, echoed at startup and used for
/// environment selection
#[derive(Debug, Clone)]
pub struct Identity {
    pub requester: String,
    pub host: String,
}

impl Identity {
    /// resolve from the process environment, falling back to gethostname(2)
    /// when the scheduler did not export HOSTNAME
    pub fn detect() -> Self {
        let requester = env::var("USER").unwrap_or_else(|_| "unknown".to_string());
        let host = match env::var("HOSTNAME") {
            Ok(host) if !host.is_empty() => host,
            _ => match gethostname() {
                Ok(host) => host.to_string_lossy().into_owned(),
                Err(errno) => {
                    warn!(errno = ?errno, "Failed to resolve the host name, falling back to the default environment");
                    String::new()
                }
            },
        };

        Self { requester, host }
    }
}

impl EnvironmentConfig {
    /// select the environment for a host: first rule whose substring occurs
    /// in the host name wins, unmatched hosts get the default
    pub fn select(&self, host: &str) -> &str {
        self.rules
            .iter()
            .find(|rule| host.contains(rule.host_contains.as_str()))
            .map(|rule| rule.name.as_str())
            .unwrap_or(self.default.as_str())
    }

    /// argv prefix that runs a command inside the named environment
    ///
    /// Activation has to happen per invocation since a child process cannot
    /// mutate its parent shell. An empty activation program disables the
    /// prefix entirely.
    pub fn activation_prefix(&self, environment: &str) -> Vec<String> {
        if self.activation.is_empty() {
            return Vec::new();
        }

        vec![
            self.activation.clone(),
            "run".to_string(),
            "-n".to_string(),
            environment.to_string(),
            "--no-capture-output".to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvironmentRule;

    fn config_with_rules(rules: Vec<(&str, &str)>) -> EnvironmentConfig {
        EnvironmentConfig {
            rules: rules
                .into_iter()
                .map(|(host_contains, name)| EnvironmentRule {
                    host_contains: host_contains.to_string(),
                    name: name.to_string(),
                })
                .collect(),
            default: "fallback-env".to_string(),
            activation: "conda".to_string(),
        }
    }

    #[test]
    fn matching_substring_selects_rule_environment() {
        let config = config_with_rules(vec![("tiger", "cluster-env")]);

        assert_eq!(config.select("tiger-h26c2n13"), "cluster-env");
        assert_eq!(config.select("login.tiger.example.edu"), "cluster-env");
    }

    #[test]
    fn unmatched_hosts_select_the_default() {
        let config = config_with_rules(vec![("tiger", "cluster-env")]);

        assert_eq!(config.select("laptop"), "fallback-env");
        assert_eq!(config.select(""), "fallback-env");
    }

    #[test]
    fn first_matching_rule_wins() {
        let config = config_with_rules(vec![("tiger-gpu", "gpu-env"), ("tiger", "cpu-env")]);

        assert_eq!(config.select("tiger-gpu-01"), "gpu-env");
        assert_eq!(config.select("tiger-login-02"), "cpu-env");
    }

    #[test]
    fn activation_prefix_wraps_the_environment() {
        let config = config_with_rules(vec![]);

        assert_eq!(
            config.activation_prefix("cluster-env"),
            vec!["conda", "run", "-n", "cluster-env", "--no-capture-output"]
        );
    }

    #[test]
    fn empty_activation_disables_the_prefix() {
        let mut config = config_with_rules(vec![]);
        config.activation = String::new();

        assert!(config.activation_prefix("cluster-env").is_empty());
    }
}
