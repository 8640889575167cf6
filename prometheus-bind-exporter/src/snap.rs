//! The exporter daemon, managed as a snap.

use std::net::IpAddr;
use std::path::Path;

use charm_framework::{CommandRunner, Result};
use tracing::info;

use crate::config::ExporterConfig;

/// Snap key for the exporter's listen address.
pub const LISTEN_ADDRESS_KEY: &str = "web.listen-address";

/// Snap key for the exporter's statistics groups.
pub const STATS_GROUPS_KEY: &str = "web.stats-groups";

/// Installs and configures the exporter snap through a [`CommandRunner`].
#[derive(Debug)]
pub struct SnapDaemon<R: CommandRunner> {
    name: String,
    runner: R,
}

impl<R: CommandRunner> SnapDaemon<R> {
    pub fn new(name: impl Into<String>, runner: R) -> Self {
        Self {
            name: name.into(),
            runner,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Install the snap from a local artifact.
    ///
    /// Locally built artifacts are unsigned, hence `--dangerous`.
    pub fn install(&mut self, artifact: &Path) -> Result<()> {
        info!(snap = %self.name, artifact = %artifact.display(), "Installing exporter snap");

        let argv = vec![
            "snap".to_string(),
            "install".to_string(),
            "--dangerous".to_string(),
            artifact.display().to_string(),
        ];
        self.runner.run(&argv)
    }

    /// Apply `config` to the installed snap in a single `snap set` call.
    pub fn configure(&mut self, config: &ExporterConfig, address: IpAddr) -> Result<()> {
        let settings = settings(config, address);
        info!(snap = %self.name, ?settings, "Configuring exporter snap");

        let mut argv = vec!["snap".to_string(), "set".to_string(), self.name.clone()];
        argv.extend(settings.iter().map(|(k, v)| format!("{}={}", k, v)));
        self.runner.run(&argv)
    }
}

/// Snap settings for `config` bound to `address`, listen address first.
pub fn settings(config: &ExporterConfig, address: IpAddr) -> [(&'static str, String); 2] {
    [
        (
            LISTEN_ADDRESS_KEY,
            config.listen_address(address).to_string(),
        ),
        (STATS_GROUPS_KEY, config.stats_groups_csv()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use charm_framework::testing::RecordingRunner;
    use std::path::PathBuf;

    #[test]
    fn test_install_command() {
        let mut daemon = SnapDaemon::new("prometheus-bind-exporter", RecordingRunner::new());
        daemon.install(&PathBuf::from("/var/lib/juju/resource.snap")).unwrap();

        assert_eq!(
            daemon.runner().calls(),
            vec![vec![
                "snap".to_string(),
                "install".to_string(),
                "--dangerous".to_string(),
                "/var/lib/juju/resource.snap".to_string(),
            ]]
        );
    }

    #[test]
    fn test_configure_command() {
        let mut daemon = SnapDaemon::new("prometheus-bind-exporter", RecordingRunner::new());
        let config = ExporterConfig {
            listen_port: 9200,
            stats_groups: vec!["server".to_string(), "tasks".to_string()],
        };

        daemon.configure(&config, "10.1.2.3".parse().unwrap()).unwrap();

        assert_eq!(
            daemon.runner().calls(),
            vec![vec![
                "snap".to_string(),
                "set".to_string(),
                "prometheus-bind-exporter".to_string(),
                "web.listen-address=10.1.2.3:9200".to_string(),
                "web.stats-groups=server,tasks".to_string(),
            ]]
        );
    }

    #[test]
    fn test_configure_failure_propagates() {
        let mut daemon =
            SnapDaemon::new("prometheus-bind-exporter", RecordingRunner::new().failing("snap"));
        let result = daemon.configure(&ExporterConfig::default(), "127.0.0.1".parse().unwrap());
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_order() {
        let settings = settings(&ExporterConfig::default(), "::1".parse().unwrap());

        assert_eq!(settings[0], (LISTEN_ADDRESS_KEY, "[::1]:9119".to_string()));
        assert_eq!(settings[1], (STATS_GROUPS_KEY, "server,view,tasks".to_string()));
    }
}
