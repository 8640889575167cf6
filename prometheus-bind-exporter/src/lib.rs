//! Charm for the Prometheus BIND exporter.
//!
//! Installs the exporter snap next to a BIND server (as a subordinate),
//! keeps its settings in line with the charm options, and tells Prometheus
//! and Grafana where to find it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │   Hook event    │────>│   Reconciler    │────>│  snap set / ... │
//! │ (install, ...)  │     │ (dispatch table)│     │  relation-set   │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//! ```
//!
//! # Relations
//!
//! - `bind-stats`: subordinate relation to the BIND server
//! - `bind-exporter`: Prometheus scrape target (`hostname`, `port`)
//! - `dashboards`: Grafana dashboard (`dashboard`), leader only
//!
//! # Configuration
//!
//! See [`config::ExporterConfig`] for the charm options and
//! [`config::ExporterCharmSettings`] for the settings file.

pub mod config;
pub mod dashboard;
pub mod reconciler;
pub mod snap;

pub use config::{ExporterCharmSettings, ExporterConfig, ExporterSettings};
pub use dashboard::{DashboardIdentity, DashboardPayload};
pub use reconciler::ExporterReconciler;
pub use snap::SnapDaemon;
