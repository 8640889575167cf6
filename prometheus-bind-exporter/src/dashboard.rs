//! Grafana dashboard published to dashboard consumers.
//!
//! The dashboard is a fixed template. Only the identifiers in
//! [`DashboardIdentity`] vary between deployments, so rendering the same
//! identity twice yields the same payload.

use std::fmt;

use serde_json::{Value, json};

/// Identifiers substituted into the dashboard template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardIdentity {
    /// Grafana datasource the panels query.
    pub datasource: String,
    /// Hostname of the machine the exporter runs on.
    pub hostname: String,
    /// Local application name.
    pub app: String,
    /// Application whose statistics are exported (the BIND server).
    pub peer_app: String,
    /// Application scraping the exporter (Prometheus).
    pub consumer_app: String,
}

impl DashboardIdentity {
    /// Build an identity; the datasource is the one the runtime generates
    /// in Grafana for the consumer application.
    pub fn new(
        hostname: impl Into<String>,
        app: impl Into<String>,
        peer_app: impl Into<String>,
        consumer_app: impl Into<String>,
    ) -> Self {
        let consumer_app = consumer_app.into();
        Self {
            datasource: format!("{} - Juju generated source", consumer_app),
            hostname: hostname.into(),
            app: app.into(),
            peer_app: peer_app.into(),
            consumer_app,
        }
    }
}

/// Rendered dashboard document, as written to the relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardPayload(String);

impl DashboardPayload {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DashboardPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn panel(id: u32, title: &str, expr: &str, legend: &str, identity: &DashboardIdentity) -> Value {
    let x = if id % 2 == 0 { 12 } else { 0 };
    let y = (id - 1) / 2 * 8;

    json!({
        "id": id,
        "type": "timeseries",
        "title": title,
        "datasource": identity.datasource,
        "gridPos": { "h": 8, "w": 12, "x": x, "y": y },
        "targets": [{
            "expr": expr,
            "legendFormat": legend,
            "refId": "A",
        }],
    })
}

/// Render the dashboard for `identity`.
pub fn render(identity: &DashboardIdentity) -> serde_json::Result<DashboardPayload> {
    let selector = "instance=~\"$instance\"";

    let panels = vec![
        panel(
            1,
            "Incoming queries",
            &format!("sum by (type) (rate(bind_incoming_queries_total{{{}}}[5m]))", selector),
            "{{type}}",
            identity,
        ),
        panel(
            2,
            "Responses",
            &format!("sum by (result) (rate(bind_responses_total{{{}}}[5m]))", selector),
            "{{result}}",
            identity,
        ),
        panel(
            3,
            "Resolver queries",
            &format!("sum by (view) (rate(bind_resolver_queries_total{{{}}}[5m]))", selector),
            "{{view}}",
            identity,
        ),
        panel(
            4,
            "Resolver response errors",
            &format!(
                "sum by (error) (rate(bind_resolver_response_errors_total{{{}}}[5m]))",
                selector
            ),
            "{{error}}",
            identity,
        ),
        panel(
            5,
            "Running tasks",
            &format!("bind_tasks_running{{{}}}", selector),
            "{{instance}}",
            identity,
        ),
        panel(
            6,
            "Exporter up",
            &format!("bind_up{{{}}}", selector),
            "{{instance}}",
            identity,
        ),
    ];

    let dashboard = json!({
        "title": format!("BIND - {} ({})", identity.peer_app, identity.hostname),
        "description": format!(
            "BIND statistics of {} exported by {} and scraped by {}",
            identity.peer_app, identity.app, identity.consumer_app
        ),
        "tags": ["bind", "dns", identity.app],
        "editable": true,
        "refresh": "30s",
        "schemaVersion": 27,
        "time": { "from": "now-6h", "to": "now" },
        "templating": {
            "list": [{
                "name": "instance",
                "type": "query",
                "datasource": identity.datasource,
                "query": "label_values(bind_up, instance)",
                "includeAll": true,
                "multi": true,
                "refresh": 1,
            }],
        },
        "panels": panels,
    });

    serde_json::to_string(&dashboard).map(DashboardPayload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> DashboardIdentity {
        DashboardIdentity::new("ns1", "prometheus-bind-exporter", "bind9", "prometheus2")
    }

    #[test]
    fn test_datasource_name() {
        assert_eq!(identity().datasource, "prometheus2 - Juju generated source");
    }

    #[test]
    fn test_render_substitutes_identifiers() {
        let payload = render(&identity()).unwrap();
        let doc: Value = serde_json::from_str(payload.as_str()).unwrap();

        assert_eq!(doc["title"], "BIND - bind9 (ns1)");
        assert_eq!(doc["tags"][2], "prometheus-bind-exporter");
        assert_eq!(
            doc["panels"][0]["datasource"],
            "prometheus2 - Juju generated source"
        );
        assert!(
            doc["description"]
                .as_str()
                .unwrap()
                .contains("scraped by prometheus2")
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        assert_eq!(render(&identity()).unwrap(), render(&identity()).unwrap());
    }

    #[test]
    fn test_panel_layout() {
        let payload = render(&identity()).unwrap();
        let doc: Value = serde_json::from_str(payload.as_str()).unwrap();

        assert_eq!(doc["panels"].as_array().unwrap().len(), 6);
        assert_eq!(doc["panels"][1]["gridPos"]["x"], 12);
        assert_eq!(doc["panels"][2]["gridPos"]["y"], 8);
        assert_eq!(
            doc["panels"][0]["targets"][0]["expr"],
            "sum by (type) (rate(bind_incoming_queries_total{instance=~\"$instance\"}[5m]))"
        );
    }
}
