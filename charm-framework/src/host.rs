//! Capabilities the host runtime provides to a charm.
//!
//! The charm never talks to the runtime directly. Everything goes through
//! these traits so the same reconciliation code runs against the real hook
//! tools ([`crate::HookTools`]) and the in-memory [`crate::testing::Harness`].

use std::net::IpAddr;
use std::path::PathBuf;
use std::process::Command;

use charm_common::{ConfigMap, FactMap};

use crate::error::{CharmError, Result};
use crate::relation::{Relation, RelationId};
use crate::status::UnitStatus;

/// Read accessors and the status setter of the host model.
pub trait Model {
    /// Name of the local unit, e.g. `prometheus-bind-exporter/0`.
    fn unit_name(&self) -> &str;

    /// Name of the local application.
    fn app_name(&self) -> &str {
        let unit = self.unit_name();
        unit.split_once('/').map_or(unit, |(app, _)| app)
    }

    /// Whether the local unit is the elected leader.
    fn is_leader(&self) -> Result<bool>;

    /// Current charm option values.
    fn config(&self) -> Result<ConfigMap>;

    /// Address the local unit binds on for the given endpoint.
    fn binding_address(&self, endpoint: &str) -> Result<IpAddr>;

    /// Local path of a charm resource, fetching it if needed.
    fn fetch_resource(&self, name: &str) -> Result<PathBuf>;

    /// Hostname of the machine the unit runs on.
    fn hostname(&self) -> Result<String>;

    /// Publish the unit's workload status.
    fn set_status(&mut self, status: &UnitStatus) -> Result<()>;

    /// Read a value from the unit's persisted state.
    fn stored(&self, key: &str) -> Result<Option<String>>;

    /// Write a value to the unit's persisted state.
    fn store(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Per-relation, per-unit key/value store shared between related units.
pub trait RelationBus {
    /// All relations currently established on `endpoint`.
    fn relations(&self, endpoint: &str) -> Result<Vec<Relation>>;

    /// Read a unit's fact slot.
    fn get(&self, relation: &RelationId, unit: &str) -> Result<FactMap>;

    /// Merge `facts` into a unit's fact slot.
    fn set(&mut self, relation: &RelationId, unit: &str, facts: &FactMap) -> Result<()>;

    /// Remove every key from a unit's fact slot.
    fn clear(&mut self, relation: &RelationId, unit: &str) -> Result<()>;

    /// First relation on `endpoint`, if any.
    fn relation(&self, endpoint: &str) -> Result<Option<Relation>> {
        Ok(self.relations(endpoint)?.into_iter().next())
    }
}

/// Everything a charm needs from its host.
pub trait Host: Model + RelationBus {}

impl<T: Model + RelationBus> Host for T {}

/// Executes external commands (allows mocking in tests).
pub trait CommandRunner {
    /// Run a command to completion; a non-zero exit is an error.
    fn run(&mut self, argv: &[String]) -> Result<()>;

    /// Run a command and return its standard output.
    fn output(&self, argv: &[String]) -> Result<String>;
}

/// Runs commands as child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    fn execute(argv: &[String]) -> Result<std::process::Output> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| CharmError::config("empty command line"))?;

        tracing::debug!(command = %argv.join(" "), "Running command");

        let output = Command::new(program).args(args).output()?;

        if !output.status.success() {
            return Err(CharmError::Command {
                command: argv.join(" "),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output)
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(&mut self, argv: &[String]) -> Result<()> {
        Self::execute(argv).map(|_| ())
    }

    fn output(&self, argv: &[String]) -> Result<String> {
        let output = Self::execute(argv)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_system_runner_output() {
        let out = SystemCommandRunner.output(&argv(&["echo", "hello"])).unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[test]
    fn test_system_runner_failure() {
        let result = SystemCommandRunner.run(&argv(&["false"]));
        assert!(matches!(result, Err(CharmError::Command { .. })));
    }

    #[test]
    fn test_system_runner_empty_command() {
        assert!(SystemCommandRunner.run(&[]).is_err());
    }
}
