//! [`Model`] and [`RelationBus`] backed by the runtime's hook tools.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::PathBuf;

use charm_common::{ConfigMap, FactMap};
use serde::de::DeserializeOwned;

use crate::error::{CharmError, Result};
use crate::host::{CommandRunner, Model, RelationBus, SystemCommandRunner};
use crate::relation::{Relation, RelationId};
use crate::status::UnitStatus;

fn cmd<S: AsRef<str>>(parts: &[S]) -> Vec<String> {
    parts.iter().map(|s| s.as_ref().to_string()).collect()
}

/// Host adapter that shells out to `config-get`, `relation-set` and friends.
///
/// Only valid inside a hook execution context, where the runtime puts the
/// tools on `PATH` and sets `JUJU_UNIT_NAME`.
#[derive(Debug)]
pub struct HookTools<R: CommandRunner = SystemCommandRunner> {
    unit_name: String,
    runner: R,
}

impl HookTools<SystemCommandRunner> {
    /// Create an adapter for the unit named by `JUJU_UNIT_NAME`.
    pub fn from_env() -> Result<Self> {
        let unit_name = std::env::var("JUJU_UNIT_NAME")
            .map_err(|_| CharmError::Environment("JUJU_UNIT_NAME".to_string()))?;
        Ok(Self::new(unit_name, SystemCommandRunner))
    }
}

impl<R: CommandRunner> HookTools<R> {
    pub fn new(unit_name: impl Into<String>, runner: R) -> Self {
        Self {
            unit_name: unit_name.into(),
            runner,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn json<T: DeserializeOwned>(&self, argv: &[String]) -> Result<T> {
        let out = self.runner.output(argv)?;
        serde_json::from_str(out.trim())
            .map_err(|e| CharmError::host_output(&argv[0], e.to_string()))
    }

    fn text(&self, argv: &[String]) -> Result<String> {
        let out = self.runner.output(argv)?;
        let out = out.trim();
        if out.is_empty() {
            return Err(CharmError::host_output(&argv[0], "empty output"));
        }
        Ok(out.to_string())
    }

    fn ensure_local(&self, unit: &str) -> Result<()> {
        if unit != self.unit_name {
            return Err(CharmError::ForeignSlot {
                local: self.unit_name.clone(),
                target: unit.to_string(),
            });
        }
        Ok(())
    }
}

impl<R: CommandRunner> Model for HookTools<R> {
    fn unit_name(&self) -> &str {
        &self.unit_name
    }

    fn is_leader(&self) -> Result<bool> {
        self.json(&cmd(&["is-leader", "--format=json"]))
    }

    fn config(&self) -> Result<ConfigMap> {
        let config: Option<ConfigMap> = self.json(&cmd(&["config-get", "--format=json"]))?;
        Ok(config.unwrap_or_default())
    }

    fn binding_address(&self, endpoint: &str) -> Result<IpAddr> {
        let argv = cmd(&["network-get", endpoint, "--bind-address"]);
        let address = self.text(&argv)?;
        address.parse().map_err(|_| {
            CharmError::host_output("network-get", format!("invalid address '{}'", address))
        })
    }

    fn fetch_resource(&self, name: &str) -> Result<PathBuf> {
        self.text(&cmd(&["resource-get", name])).map(PathBuf::from)
    }

    fn hostname(&self) -> Result<String> {
        hostname::get()?
            .into_string()
            .map_err(|_| CharmError::host_output("hostname", "not valid UTF-8"))
    }

    fn set_status(&mut self, status: &UnitStatus) -> Result<()> {
        self.runner
            .run(&cmd(&["status-set", status.name(), status.message()]))
    }

    fn stored(&self, key: &str) -> Result<Option<String>> {
        let state: Option<BTreeMap<String, String>> =
            self.json(&cmd(&["state-get", "--format=json"]))?;
        Ok(state.and_then(|mut state| state.remove(key)))
    }

    fn store(&mut self, key: &str, value: &str) -> Result<()> {
        self.runner
            .run(&cmd(&["state-set".to_string(), format!("{}={}", key, value)]))
    }
}

impl<R: CommandRunner> RelationBus for HookTools<R> {
    fn relations(&self, endpoint: &str) -> Result<Vec<Relation>> {
        let ids: Option<Vec<String>> =
            self.json(&cmd(&["relation-ids", endpoint, "--format=json"]))?;

        ids.unwrap_or_default()
            .iter()
            .map(|id| {
                let remote_app =
                    self.text(&cmd(&["relation-list", "-r", id.as_str(), "--app"]))?;
                Ok(Relation::new(id.parse()?, remote_app))
            })
            .collect()
    }

    fn get(&self, relation: &RelationId, unit: &str) -> Result<FactMap> {
        let facts: Option<FactMap> = self.json(&cmd(&[
            "relation-get",
            "-r",
            relation.to_string().as_str(),
            "--format=json",
            "-",
            unit,
        ]))?;
        Ok(facts.unwrap_or_default())
    }

    fn set(&mut self, relation: &RelationId, unit: &str, facts: &FactMap) -> Result<()> {
        self.ensure_local(unit)?;
        if facts.is_empty() {
            return Ok(());
        }

        let mut argv = cmd(&["relation-set", "-r", relation.to_string().as_str()]);
        argv.extend(facts.iter().map(|(k, v)| format!("{}={}", k, v)));
        self.runner.run(&argv)
    }

    fn clear(&mut self, relation: &RelationId, unit: &str) -> Result<()> {
        self.ensure_local(unit)?;
        let current = self.get(relation, unit)?;
        if current.is_empty() {
            return Ok(());
        }

        // An empty value removes the key.
        let mut argv = cmd(&["relation-set", "-r", relation.to_string().as_str()]);
        argv.extend(current.keys().map(|k| format!("{}=", k)));
        self.runner.run(&argv)
    }
}
