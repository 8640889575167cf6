//! Reconciliation of exporter settings and peer-visible facts.
//!
//! Every hook ends up here. Configuration and relation-topology changes are
//! mapped to (a) the exporter daemon's settings and (b) the facts this unit
//! publishes on its relations.

use charm_framework::{
    CommandRunner, Dispatcher, FactMap, HookEvent, HookKind, Host, PeerFact, Relation, Result,
    UnitStatus,
};
use tracing::{debug, info, warn};

use crate::config::{ExporterConfig, ExporterSettings};
use crate::dashboard::{self, DashboardIdentity, DashboardPayload};
use crate::snap::SnapDaemon;

/// Subordinate relation to the BIND server whose statistics are exported.
pub const STATS_ENDPOINT: &str = "bind-stats";

/// Relation to the Prometheus server scraping the exporter.
pub const EXPORTER_ENDPOINT: &str = "bind-exporter";

/// Relation to Grafana, which receives the dashboard.
pub const DASHBOARD_ENDPOINT: &str = "dashboards";

pub const SUBORDINATE_UNAVAILABLE: &str = "Subordinate relation not available.";
pub const PROMETHEUS_UNAVAILABLE: &str = "Prometheus relation not available.";

const READY: &str = "Unit is ready";

/// Key of the applied configuration in the unit's persisted state.
const CONFIG_STATE_KEY: &str = "exporter-config";

/// Drives the exporter from hook events.
///
/// One instance exists per hook invocation; the applied [`ExporterConfig`]
/// is persisted through the host so it survives between invocations.
pub struct ExporterReconciler<H: Host, R: CommandRunner> {
    host: H,
    daemon: SnapDaemon<R>,
    resource: String,
    config: ExporterConfig,
}

impl<H: Host, R: CommandRunner> ExporterReconciler<H, R> {
    /// Create a reconciler, restoring the last applied configuration.
    pub fn new(host: H, runner: R, settings: &ExporterSettings) -> Result<Self> {
        let config = match host.stored(CONFIG_STATE_KEY)? {
            Some(raw) => serde_json::from_str(&raw)?,
            None => ExporterConfig::default(),
        };

        Ok(Self {
            host,
            daemon: SnapDaemon::new(&settings.snap, runner),
            resource: settings.resource.clone(),
            config,
        })
    }

    /// Hook table for this charm.
    pub fn dispatch_table() -> Dispatcher<Self> {
        let mut table = Dispatcher::new();
        table
            .register(HookKind::Install, Self::on_install)
            .register(HookKind::UpgradeCharm, Self::on_install)
            .register(HookKind::ConfigChanged, Self::on_config_changed)
            .register(
                HookKind::RelationJoined(STATS_ENDPOINT.to_string()),
                Self::on_stats_relation_changed,
            )
            .register(
                HookKind::RelationChanged(STATS_ENDPOINT.to_string()),
                Self::on_stats_relation_changed,
            )
            .register(
                HookKind::RelationJoined(EXPORTER_ENDPOINT.to_string()),
                Self::on_exporter_relation_changed,
            )
            .register(
                HookKind::RelationChanged(EXPORTER_ENDPOINT.to_string()),
                Self::on_exporter_relation_changed,
            )
            .register(
                HookKind::RelationDeparted(EXPORTER_ENDPOINT.to_string()),
                Self::on_exporter_relation_departed,
            )
            .register(
                HookKind::RelationJoined(DASHBOARD_ENDPOINT.to_string()),
                Self::on_dashboard_relation_joined,
            );
        table
    }

    /// Configuration currently applied.
    pub fn config(&self) -> &ExporterConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn runner(&self) -> &R {
        self.daemon.runner()
    }

    /// Give the host back, e.g. to hand it to the next invocation.
    pub fn into_host(self) -> H {
        self.host
    }

    fn set_status(&mut self, status: UnitStatus) -> Result<()> {
        debug!(%status, "Setting unit status");
        self.host.set_status(&status)
    }

    /// First relation on `endpoint`, or `None` after blocking with `reason`.
    fn require_relation(&mut self, endpoint: &str, reason: &str) -> Result<Option<Relation>> {
        match self.host.relation(endpoint)? {
            Some(relation) => Ok(Some(relation)),
            None => {
                warn!(endpoint, reason, "Required relation missing");
                self.set_status(UnitStatus::blocked(reason))?;
                Ok(None)
            }
        }
    }

    fn write_local_slot(&mut self, relation: &Relation, facts: &FactMap) -> Result<()> {
        let unit = self.host.unit_name().to_string();
        self.host.set(&relation.id, &unit, facts)
    }

    /// Push the current configuration to the exporter daemon.
    ///
    /// The bind address is resolved on every call.
    pub fn apply_configuration(&mut self) -> Result<()> {
        let address = self.host.binding_address(STATS_ENDPOINT)?;
        self.daemon.configure(&self.config, address)
    }

    /// Advertise the scrape target on `relation`.
    ///
    /// Returns `false` when the subordinate relation is missing; the unit is
    /// then blocked and nothing is written.
    pub fn publish_exporter_facts(&mut self, relation: &Relation) -> Result<bool> {
        if self
            .require_relation(STATS_ENDPOINT, SUBORDINATE_UNAVAILABLE)?
            .is_none()
        {
            return Ok(false);
        }

        let address = self.host.binding_address(STATS_ENDPOINT)?;
        let facts = PeerFact::new(address.to_string(), self.config.listen_port).into_facts();
        self.write_local_slot(relation, &facts)?;

        info!(
            relation = %relation.id,
            %address,
            port = self.config.listen_port,
            "Published scrape target"
        );
        Ok(true)
    }

    fn publish_to_all_consumers(&mut self) -> Result<bool> {
        for relation in self.host.relations(EXPORTER_ENDPOINT)? {
            if !self.publish_exporter_facts(&relation)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Remove everything this unit published on `relation`.
    pub fn retract_exporter_facts(&mut self, relation: &Relation) -> Result<()> {
        let unit = self.host.unit_name().to_string();
        self.host.clear(&relation.id, &unit)?;

        info!(relation = %relation.id, "Retracted scrape target");
        Ok(())
    }

    /// Render the dashboard for the given stats and exporter relations.
    pub fn render_dashboard(
        &self,
        stats: &Relation,
        exporter: &Relation,
    ) -> Result<DashboardPayload> {
        let identity = DashboardIdentity::new(
            self.host.hostname()?,
            self.host.app_name(),
            &stats.remote_app,
            &exporter.remote_app,
        );
        Ok(dashboard::render(&identity)?)
    }

    fn on_install(&mut self, _event: &HookEvent) -> Result<()> {
        self.set_status(UnitStatus::maintenance(
            "Installing prometheus-bind-exporter",
        ))?;

        let artifact = self.host.fetch_resource(&self.resource)?;
        self.daemon.install(&artifact)?;
        self.apply_configuration()?;

        self.set_status(UnitStatus::active(READY))
    }

    fn on_config_changed(&mut self, _event: &HookEvent) -> Result<()> {
        self.set_status(UnitStatus::maintenance(
            "Applying prometheus-bind-exporter configuration",
        ))?;

        let options = self.host.config()?;
        self.config.apply_options(&options)?;
        let raw = serde_json::to_string(&self.config)?;
        self.host.store(CONFIG_STATE_KEY, &raw)?;

        self.apply_configuration()?;

        if self.publish_to_all_consumers()? {
            self.set_status(UnitStatus::active(READY))?;
        }
        Ok(())
    }

    fn on_stats_relation_changed(&mut self, _event: &HookEvent) -> Result<()> {
        self.apply_configuration()?;

        if self.publish_to_all_consumers()? {
            self.set_status(UnitStatus::active(READY))?;
        }
        Ok(())
    }

    // Rewrites the slot on every change, including peer-initiated ones.
    fn on_exporter_relation_changed(&mut self, event: &HookEvent) -> Result<()> {
        let relation = event.relation()?.clone();

        if self.publish_exporter_facts(&relation)? {
            self.set_status(UnitStatus::active(READY))?;
        }
        Ok(())
    }

    fn on_exporter_relation_departed(&mut self, event: &HookEvent) -> Result<()> {
        let relation = event.relation()?.clone();
        self.retract_exporter_facts(&relation)
    }

    fn on_dashboard_relation_joined(&mut self, event: &HookEvent) -> Result<()> {
        if !self.host.is_leader()? {
            debug!("Not the leader, leaving the dashboard to the leader unit");
            return Ok(());
        }

        let Some(stats) = self.require_relation(STATS_ENDPOINT, SUBORDINATE_UNAVAILABLE)? else {
            return Ok(());
        };
        let Some(exporter) = self.require_relation(EXPORTER_ENDPOINT, PROMETHEUS_UNAVAILABLE)?
        else {
            return Ok(());
        };

        let relation = event.relation()?.clone();
        let payload = self.render_dashboard(&stats, &exporter)?;
        let facts = FactMap::from([("dashboard".to_string(), payload.into_string())]);
        self.write_local_slot(&relation, &facts)?;

        info!(relation = %relation.id, "Published dashboard");
        self.set_status(UnitStatus::active(READY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charm_framework::Model;
    use charm_framework::testing::{Harness, RecordingRunner};

    type TestReconciler = ExporterReconciler<Harness, RecordingRunner>;

    fn reconciler(harness: Harness) -> TestReconciler {
        ExporterReconciler::new(harness, RecordingRunner::new(), &ExporterSettings::default())
            .unwrap()
    }

    #[test]
    fn test_restores_persisted_config() {
        let mut harness = Harness::new("prometheus-bind-exporter/0");
        harness
            .store(
                CONFIG_STATE_KEY,
                r#"{"listen_port": 9300, "stats_groups": ["view"]}"#,
            )
            .unwrap();

        let reconciler = reconciler(harness);
        assert_eq!(reconciler.config().listen_port, 9300);
        assert_eq!(reconciler.config().stats_groups, vec!["view"]);
    }

    #[test]
    fn test_corrupt_persisted_config_fails() {
        let mut harness = Harness::new("prometheus-bind-exporter/0");
        harness.store(CONFIG_STATE_KEY, "not json").unwrap();

        let result =
            ExporterReconciler::new(harness, RecordingRunner::new(), &ExporterSettings::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_dispatch_table_covers_hooks() {
        let table = TestReconciler::dispatch_table();

        assert!(table.handles(&HookKind::Install));
        assert!(table.handles(&HookKind::UpgradeCharm));
        assert!(table.handles(&HookKind::ConfigChanged));
        assert!(table.handles(&HookKind::RelationDeparted(EXPORTER_ENDPOINT.to_string())));
        assert!(table.handles(&HookKind::RelationJoined(DASHBOARD_ENDPOINT.to_string())));
        assert!(!table.handles(&HookKind::RelationDeparted(DASHBOARD_ENDPOINT.to_string())));
    }

    #[test]
    fn test_render_dashboard_uses_relation_apps() {
        let mut harness = Harness::new("prometheus-bind-exporter/0");
        harness.set_hostname("ns1");
        let stats = harness.add_relation(STATS_ENDPOINT, "bind9");
        let exporter = harness.add_relation(EXPORTER_ENDPOINT, "prometheus2");

        let reconciler = reconciler(harness);
        let payload = reconciler.render_dashboard(&stats, &exporter).unwrap();

        assert!(payload.as_str().contains("BIND - bind9 (ns1)"));
        assert!(payload.as_str().contains("prometheus2 - Juju generated source"));
    }
}
