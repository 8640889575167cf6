//! Hook entrypoint for the Prometheus BIND exporter charm.

use tracing::info;

use charm_framework::{
    CharmSettings, HookArgs, HookEvent, HookTools, LoggingConfig, Model, SystemCommandRunner,
    init_tracing,
};
use prometheus_bind_exporter::{ExporterCharmSettings, ExporterReconciler};

type Reconciler = ExporterReconciler<HookTools<SystemCommandRunner>, SystemCommandRunner>;

fn main() -> anyhow::Result<()> {
    let args = HookArgs::parse();

    // Load settings
    let settings = ExporterCharmSettings::load_optional(args.settings_path().as_deref())?;

    // Initialize logging with optional CLI override
    let logging = match &args.log_level {
        Some(level) => LoggingConfig {
            level: level.clone(),
            ..settings.logging.clone()
        },
        None => settings.logging.clone(),
    };
    init_tracing(&logging)?;

    let event = HookEvent::from_env(args.hook.as_deref())?;
    let host = HookTools::from_env()?;

    info!(
        unit = %host.unit_name(),
        hook = %event.kind,
        version = env!("CARGO_PKG_VERSION"),
        "Starting hook"
    );

    let table = Reconciler::dispatch_table();
    let mut reconciler = Reconciler::new(host, SystemCommandRunner, &settings.exporter)?;

    if !table.dispatch(&mut reconciler, &event)? {
        info!(hook = %event.kind, "Nothing to do");
    }

    Ok(())
}
