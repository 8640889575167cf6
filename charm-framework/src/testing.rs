//! In-memory host for exercising charms without a runtime.
//!
//! [`Harness`] implements [`Model`] and [`RelationBus`] on plain maps and
//! [`RecordingRunner`] records every command instead of running it.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use charm_common::{ConfigMap, FactMap};

use crate::error::{CharmError, Result};
use crate::host::{CommandRunner, Model, RelationBus};
use crate::relation::{Relation, RelationId};
use crate::status::UnitStatus;

/// Command runner that records invocations.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: RefCell<Vec<Vec<String>>>,
    outputs: HashMap<String, String>,
    failing: HashSet<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `output` when the exact command line `command` is run.
    pub fn with_output(mut self, command: &str, output: &str) -> Self {
        self.outputs.insert(command.to_string(), output.to_string());
        self
    }

    /// Make every invocation of `program` exit unsuccessfully.
    pub fn failing(mut self, program: &str) -> Self {
        self.failing.insert(program.to_string());
        self
    }

    /// Every command line run so far, in order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    /// Command lines whose program is `program`.
    pub fn calls_to(&self, program: &str) -> Vec<Vec<String>> {
        self.calls
            .borrow()
            .iter()
            .filter(|argv| argv.first().is_some_and(|p| p == program))
            .cloned()
            .collect()
    }

    fn record(&self, argv: &[String]) -> Result<()> {
        self.calls.borrow_mut().push(argv.to_vec());

        if argv.first().is_some_and(|p| self.failing.contains(p)) {
            return Err(CharmError::Command {
                command: argv.join(" "),
                status: "exit status: 1".to_string(),
                stderr: "simulated failure".to_string(),
            });
        }
        Ok(())
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&mut self, argv: &[String]) -> Result<()> {
        self.record(argv)
    }

    fn output(&self, argv: &[String]) -> Result<String> {
        self.record(argv)?;
        Ok(self
            .outputs
            .get(&argv.join(" "))
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Debug)]
struct RelationRecord {
    remote_app: String,
    slots: BTreeMap<String, FactMap>,
}

/// In-memory host model and relation bus.
#[derive(Debug)]
pub struct Harness {
    unit_name: String,
    leader: bool,
    hostname: String,
    config: ConfigMap,
    default_address: IpAddr,
    addresses: HashMap<String, IpAddr>,
    resources: HashMap<String, PathBuf>,
    statuses: Vec<UnitStatus>,
    state: BTreeMap<String, String>,
    relations: BTreeMap<RelationId, RelationRecord>,
    next_relation: u32,
}

impl Harness {
    /// Create a harness for a non-leader unit with no relations.
    pub fn new(unit_name: impl Into<String>) -> Self {
        Self {
            unit_name: unit_name.into(),
            leader: false,
            hostname: "juju-machine-0".to_string(),
            config: ConfigMap::new(),
            default_address: IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10)),
            addresses: HashMap::new(),
            resources: HashMap::new(),
            statuses: Vec::new(),
            state: BTreeMap::new(),
            relations: BTreeMap::new(),
            next_relation: 0,
        }
    }

    pub fn set_leader(&mut self, leader: bool) -> &mut Self {
        self.leader = leader;
        self
    }

    pub fn set_hostname(&mut self, hostname: impl Into<String>) -> &mut Self {
        self.hostname = hostname.into();
        self
    }

    /// Bind address returned for endpoints without an explicit address.
    pub fn set_default_address(&mut self, address: IpAddr) -> &mut Self {
        self.default_address = address;
        self
    }

    pub fn set_address(&mut self, endpoint: impl Into<String>, address: IpAddr) -> &mut Self {
        self.addresses.insert(endpoint.into(), address);
        self
    }

    pub fn add_resource(
        &mut self,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> &mut Self {
        self.resources.insert(name.into(), path.into());
        self
    }

    /// Set a charm option as the operator would.
    pub fn update_config(
        &mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> &mut Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// Establish a new relation on `endpoint` with `remote_app`.
    pub fn add_relation(&mut self, endpoint: &str, remote_app: &str) -> Relation {
        let id = RelationId::new(endpoint, self.next_relation);
        self.next_relation += 1;

        self.relations.insert(
            id.clone(),
            RelationRecord {
                remote_app: remote_app.to_string(),
                slots: BTreeMap::new(),
            },
        );

        Relation::new(id, remote_app)
    }

    /// Tear down a relation. Returns whether it existed.
    pub fn remove_relation(&mut self, id: &RelationId) -> bool {
        self.relations.remove(id).is_some()
    }

    /// Most recent status, if any was set.
    pub fn status(&self) -> Option<&UnitStatus> {
        self.statuses.last()
    }

    /// Every status set so far, in order.
    pub fn statuses(&self) -> &[UnitStatus] {
        &self.statuses
    }

    fn record(&self, id: &RelationId) -> Result<&RelationRecord> {
        self.relations
            .get(id)
            .ok_or_else(|| CharmError::host_output("relation-get", format!("{} not found", id)))
    }
}

impl Model for Harness {
    fn unit_name(&self) -> &str {
        &self.unit_name
    }

    fn is_leader(&self) -> Result<bool> {
        Ok(self.leader)
    }

    fn config(&self) -> Result<ConfigMap> {
        Ok(self.config.clone())
    }

    fn binding_address(&self, endpoint: &str) -> Result<IpAddr> {
        Ok(self
            .addresses
            .get(endpoint)
            .copied()
            .unwrap_or(self.default_address))
    }

    fn fetch_resource(&self, name: &str) -> Result<PathBuf> {
        self.resources.get(name).cloned().ok_or_else(|| {
            CharmError::host_output("resource-get", format!("no resource '{}'", name))
        })
    }

    fn hostname(&self) -> Result<String> {
        Ok(self.hostname.clone())
    }

    fn set_status(&mut self, status: &UnitStatus) -> Result<()> {
        self.statuses.push(status.clone());
        Ok(())
    }

    fn stored(&self, key: &str) -> Result<Option<String>> {
        Ok(self.state.get(key).cloned())
    }

    fn store(&mut self, key: &str, value: &str) -> Result<()> {
        self.state.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl RelationBus for Harness {
    fn relations(&self, endpoint: &str) -> Result<Vec<Relation>> {
        Ok(self
            .relations
            .iter()
            .filter(|(id, _)| id.endpoint() == endpoint)
            .map(|(id, record)| Relation::new(id.clone(), record.remote_app.clone()))
            .collect())
    }

    fn get(&self, relation: &RelationId, unit: &str) -> Result<FactMap> {
        Ok(self
            .record(relation)?
            .slots
            .get(unit)
            .cloned()
            .unwrap_or_default())
    }

    fn set(&mut self, relation: &RelationId, unit: &str, facts: &FactMap) -> Result<()> {
        let record = self.relations.get_mut(relation).ok_or_else(|| {
            CharmError::host_output("relation-set", format!("{} not found", relation))
        })?;

        record
            .slots
            .entry(unit.to_string())
            .or_default()
            .extend(facts.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }

    fn clear(&mut self, relation: &RelationId, unit: &str) -> Result<()> {
        if let Some(record) = self.relations.get_mut(relation) {
            record.slots.remove(unit);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: &str = "bind-exporter/0";

    #[test]
    fn test_relation_lifecycle() {
        let mut harness = Harness::new(UNIT);
        let relation = harness.add_relation("bind-exporter", "prometheus2");

        let facts = FactMap::from([("port".to_string(), "9119".to_string())]);
        harness.set(&relation.id, UNIT, &facts).unwrap();
        assert_eq!(harness.get(&relation.id, UNIT).unwrap(), facts);

        assert!(harness.remove_relation(&relation.id));
        assert!(!harness.remove_relation(&relation.id));
        assert!(harness.relations("bind-exporter").unwrap().is_empty());
        assert!(harness.clear(&relation.id, UNIT).is_ok());
    }

    #[test]
    fn test_set_merges_slot() {
        let mut harness = Harness::new(UNIT);
        let relation = harness.add_relation("dashboards", "grafana");

        harness
            .set(&relation.id, UNIT, &FactMap::from([("a".into(), "1".into())]))
            .unwrap();
        harness
            .set(&relation.id, UNIT, &FactMap::from([("b".into(), "2".into())]))
            .unwrap();

        assert_eq!(harness.get(&relation.id, UNIT).unwrap().len(), 2);
    }

    #[test]
    fn test_relation_ids_are_unique_per_harness() {
        let mut harness = Harness::new(UNIT);
        let first = harness.add_relation("bind-stats", "bind9");
        let second = harness.add_relation("bind-exporter", "prometheus2");

        assert_ne!(first.id.number(), second.id.number());
        assert_eq!(harness.relation("bind-stats").unwrap(), Some(first));
    }

    #[test]
    fn test_recording_runner_failure() {
        let mut runner = RecordingRunner::new().failing("snap");
        let argv = vec!["snap".to_string(), "install".to_string()];

        assert!(runner.run(&argv).is_err());
        assert_eq!(runner.calls_to("snap"), vec![argv]);
    }
}
