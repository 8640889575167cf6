//! Configuration for the bind exporter charm.
//!
//! Two layers:
//! - [`ExporterConfig`]: the exporter's runtime settings, driven by the charm
//!   options `exporter-listen-port` and `exporter-stats-groups`.
//! - [`ExporterCharmSettings`]: the operator-side settings file (logging, snap
//!   and resource names).

use std::net::{IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use charm_framework::{CharmError, CharmSettings, ConfigMap, LoggingConfig};

/// Charm option holding the exporter's listen port.
pub const LISTEN_PORT_OPTION: &str = "exporter-listen-port";

/// Charm option holding the comma-separated statistics groups.
pub const STATS_GROUPS_OPTION: &str = "exporter-stats-groups";

pub const DEFAULT_LISTEN_PORT: u16 = 9119;

/// Statistics groups understood by the exporter, in its documented order.
pub const KNOWN_STATS_GROUPS: &[&str] = &["server", "view", "tasks"];

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {option}: {message}")]
    InvalidOption { option: String, message: String },
    #[error("Validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    fn invalid(option: &str, message: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.to_string(),
            message: message.into(),
        }
    }
}

impl From<ConfigError> for CharmError {
    fn from(err: ConfigError) -> Self {
        CharmError::validation(err.to_string())
    }
}

/// Runtime settings of the exporter daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Port the exporter serves metrics on (default: 9119).
    pub listen_port: u16,

    /// Statistics groups to collect, without duplicates.
    pub stats_groups: Vec<String>,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            listen_port: DEFAULT_LISTEN_PORT,
            stats_groups: KNOWN_STATS_GROUPS.iter().map(|g| g.to_string()).collect(),
        }
    }
}

impl ExporterConfig {
    /// Overwrite fields from charm options.
    ///
    /// Options that are absent keep their current value. Nothing is changed
    /// unless every present option is valid.
    pub fn apply_options(&mut self, options: &ConfigMap) -> Result<(), ConfigError> {
        let listen_port = options
            .get(LISTEN_PORT_OPTION)
            .map(parse_port)
            .transpose()?;

        let stats_groups = options
            .get(STATS_GROUPS_OPTION)
            .map(|value| {
                value
                    .as_str()
                    .ok_or_else(|| ConfigError::invalid(STATS_GROUPS_OPTION, "expected a string"))
                    .and_then(parse_stats_groups)
            })
            .transpose()?;

        if let Some(port) = listen_port {
            self.listen_port = port;
        }
        if let Some(groups) = stats_groups {
            self.stats_groups = groups;
        }

        Ok(())
    }

    /// Socket address the exporter should listen on when bound to `address`.
    pub fn listen_address(&self, address: IpAddr) -> SocketAddr {
        SocketAddr::new(address, self.listen_port)
    }

    /// Statistics groups as the comma-separated list the exporter expects.
    pub fn stats_groups_csv(&self) -> String {
        self.stats_groups.join(",")
    }
}

fn parse_port(value: &serde_json::Value) -> Result<u16, ConfigError> {
    let port = match value {
        serde_json::Value::Number(n) => n.as_u64().ok_or_else(|| {
            ConfigError::invalid(LISTEN_PORT_OPTION, format!("{} is not a port", n))
        })?,
        // Operators sometimes set the option as a string
        serde_json::Value::String(s) => s.trim().parse::<u64>().map_err(|_| {
            ConfigError::invalid(LISTEN_PORT_OPTION, format!("'{}' is not a port", s))
        })?,
        other => {
            return Err(ConfigError::invalid(
                LISTEN_PORT_OPTION,
                format!("expected an integer, got {}", other),
            ));
        }
    };

    match u16::try_from(port) {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ConfigError::invalid(
            LISTEN_PORT_OPTION,
            format!("{} is outside 1-65535", port),
        )),
    }
}

/// Parse a comma-separated statistics group list.
///
/// Entries are trimmed, empty entries skipped and duplicates dropped while
/// keeping first-seen order.
pub fn parse_stats_groups(csv: &str) -> Result<Vec<String>, ConfigError> {
    let mut groups: Vec<String> = Vec::new();

    for group in csv.split(',').map(str::trim).filter(|g| !g.is_empty()) {
        if !KNOWN_STATS_GROUPS.contains(&group) {
            return Err(ConfigError::invalid(
                STATS_GROUPS_OPTION,
                format!(
                    "unknown group '{}' (expected one of {})",
                    group,
                    KNOWN_STATS_GROUPS.join(", ")
                ),
            ));
        }
        if !groups.iter().any(|g| g == group) {
            groups.push(group.to_string());
        }
    }

    if groups.is_empty() {
        return Err(ConfigError::invalid(
            STATS_GROUPS_OPTION,
            "at least one group is required",
        ));
    }

    Ok(groups)
}

/// Names the charm uses for the exporter package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExporterSettings {
    /// Snap the exporter is installed as (default: "prometheus-bind-exporter").
    #[serde(default = "default_snap")]
    pub snap: String,

    /// Charm resource carrying the snap (default: "prometheus-bind-exporter").
    #[serde(default = "default_resource")]
    pub resource: String,
}

fn default_snap() -> String {
    "prometheus-bind-exporter".to_string()
}

fn default_resource() -> String {
    "prometheus-bind-exporter".to_string()
}

impl Default for ExporterSettings {
    fn default() -> Self {
        Self {
            snap: default_snap(),
            resource: default_resource(),
        }
    }
}

/// Complete settings file for the charm executable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterCharmSettings {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Exporter package settings.
    #[serde(default)]
    pub exporter: ExporterSettings,
}

impl CharmSettings for ExporterCharmSettings {
    fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    fn validate(&self) -> charm_framework::Result<()> {
        if self.exporter.snap.trim().is_empty() {
            return Err(
                ConfigError::Validation("exporter.snap must not be empty".to_string()).into(),
            );
        }

        if self.exporter.resource.trim().is_empty() {
            return Err(
                ConfigError::Validation("exporter.resource must not be empty".to_string()).into(),
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(pairs: &[(&str, serde_json::Value)]) -> ConfigMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = ExporterConfig::default();

        assert_eq!(config.listen_port, 9119);
        assert_eq!(config.stats_groups_csv(), "server,view,tasks");
    }

    #[test]
    fn test_apply_options() {
        let mut config = ExporterConfig::default();
        config
            .apply_options(&options(&[
                (LISTEN_PORT_OPTION, json!(9120)),
                (STATS_GROUPS_OPTION, json!("view, server")),
            ]))
            .unwrap();

        assert_eq!(config.listen_port, 9120);
        assert_eq!(config.stats_groups, vec!["view", "server"]);
    }

    #[test]
    fn test_absent_options_keep_current_values() {
        let mut config = ExporterConfig {
            listen_port: 9200,
            stats_groups: vec!["tasks".to_string()],
        };
        config
            .apply_options(&options(&[("unrelated", json!(true))]))
            .unwrap();

        assert_eq!(config.listen_port, 9200);
        assert_eq!(config.stats_groups, vec!["tasks"]);
    }

    #[test]
    fn test_port_as_string() {
        let mut config = ExporterConfig::default();
        config
            .apply_options(&options(&[(LISTEN_PORT_OPTION, json!("9121"))]))
            .unwrap();

        assert_eq!(config.listen_port, 9121);
    }

    #[test]
    fn test_port_out_of_range() {
        for bad in [json!(0), json!(70000), json!(-1), json!("http"), json!(true)] {
            let mut config = ExporterConfig::default();
            let result = config.apply_options(&options(&[(LISTEN_PORT_OPTION, bad)]));
            assert!(result.is_err());
            assert_eq!(config, ExporterConfig::default());
        }
    }

    #[test]
    fn test_invalid_groups_leave_port_untouched() {
        let mut config = ExporterConfig::default();
        let result = config.apply_options(&options(&[
            (LISTEN_PORT_OPTION, json!(9300)),
            (STATS_GROUPS_OPTION, json!("server,zones")),
        ]));

        assert!(result.unwrap_err().to_string().contains("unknown group 'zones'"));
        assert_eq!(config.listen_port, 9119);
    }

    #[test]
    fn test_parse_stats_groups_dedupes() {
        let groups = parse_stats_groups("tasks,,server , tasks").unwrap();
        assert_eq!(groups, vec!["tasks", "server"]);
    }

    #[test]
    fn test_parse_stats_groups_empty() {
        assert!(parse_stats_groups(" , ").is_err());
    }

    #[test]
    fn test_listen_address_formats_ipv6() {
        let config = ExporterConfig::default();

        assert_eq!(
            config.listen_address("127.0.0.1".parse().unwrap()).to_string(),
            "127.0.0.1:9119"
        );
        assert_eq!(
            config.listen_address("fd00::1".parse().unwrap()).to_string(),
            "[fd00::1]:9119"
        );
    }

    #[test]
    fn test_settings_defaults() {
        let settings: ExporterCharmSettings = json5::from_str("{}").unwrap();

        assert_eq!(settings.exporter.snap, "prometheus-bind-exporter");
        assert_eq!(settings.exporter.resource, "prometheus-bind-exporter");
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_settings_reject_empty_snap() {
        let settings: ExporterCharmSettings =
            json5::from_str(r#"{ exporter: { snap: "" } }"#).unwrap();
        assert!(settings.validate().is_err());
    }
}
