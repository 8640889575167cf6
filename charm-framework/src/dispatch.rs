//! Hook dispatch table.

use std::collections::HashMap;

use crate::error::Result;
use crate::event::{HookEvent, HookKind};

/// Handler invoked for a hook.
pub type Handler<T> = fn(&mut T, &HookEvent) -> Result<()>;

/// Fixed table mapping hook kinds to handlers on a charm of type `T`.
///
/// Built once at startup. Each hook invocation runs exactly one handler to
/// completion; hooks with no registered handler are ignored.
///
/// # Example
///
/// ```ignore
/// use charm_framework::{Dispatcher, HookEvent, HookKind};
///
/// let mut table = Dispatcher::new();
/// table.register(HookKind::Install, MyCharm::on_install);
///
/// let event = HookEvent::from_env(None)?;
/// table.dispatch(&mut charm, &event)?;
/// ```
pub struct Dispatcher<T> {
    handlers: HashMap<HookKind, Handler<T>>,
}

impl<T> Dispatcher<T> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register `handler` for `kind`, replacing any previous handler.
    pub fn register(&mut self, kind: HookKind, handler: Handler<T>) -> &mut Self {
        self.handlers.insert(kind, handler);
        self
    }

    /// Whether a handler exists for `kind`.
    pub fn handles(&self, kind: &HookKind) -> bool {
        self.handlers.contains_key(kind)
    }

    /// Run the handler registered for the event's kind.
    ///
    /// Returns `false` when no handler is registered. Handler errors are
    /// returned unchanged so the host marks the hook as failed.
    pub fn dispatch(&self, target: &mut T, event: &HookEvent) -> Result<bool> {
        let Some(handler) = self.handlers.get(&event.kind) else {
            tracing::debug!(hook = %event.kind, "No handler registered, ignoring");
            return Ok(false);
        };

        tracing::info!(
            hook = %event.kind,
            relation = ?event.relation.as_ref().map(|r| r.id.to_string()),
            "Handling hook"
        );

        handler(target, event)?;
        Ok(true)
    }
}

impl<T> Default for Dispatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CharmError;

    #[derive(Default)]
    struct Counter {
        installs: u32,
        joined: Vec<String>,
    }

    fn on_install(c: &mut Counter, _: &HookEvent) -> Result<()> {
        c.installs += 1;
        Ok(())
    }

    fn on_joined(c: &mut Counter, event: &HookEvent) -> Result<()> {
        c.joined.push(event.relation()?.remote_app.clone());
        Ok(())
    }

    fn on_fail(_: &mut Counter, _: &HookEvent) -> Result<()> {
        Err(CharmError::config("boom"))
    }

    #[test]
    fn test_dispatch_registered_handler() {
        let mut table = Dispatcher::new();
        table.register(HookKind::Install, on_install);

        let mut counter = Counter::default();
        let handled = table
            .dispatch(&mut counter, &HookEvent::new(HookKind::Install))
            .unwrap();

        assert!(handled);
        assert_eq!(counter.installs, 1);
    }

    #[test]
    fn test_dispatch_unregistered_is_ignored() {
        let table: Dispatcher<Counter> = Dispatcher::new();
        let mut counter = Counter::default();

        let handled = table
            .dispatch(&mut counter, &HookEvent::new(HookKind::Start))
            .unwrap();

        assert!(!handled);
        assert!(!table.handles(&HookKind::Start));
    }

    #[test]
    fn test_dispatch_matches_endpoint() {
        let mut table = Dispatcher::new();
        table.register(HookKind::RelationJoined("dashboards".into()), on_joined);

        let mut counter = Counter::default();
        let other = HookEvent::from_parts(
            "bind-exporter-relation-joined",
            Some("bind-exporter:1"),
            Some("prom"),
        )
        .unwrap();
        let dashboards = HookEvent::from_parts(
            "dashboards-relation-joined",
            Some("dashboards:2"),
            Some("grafana"),
        )
        .unwrap();

        assert!(!table.dispatch(&mut counter, &other).unwrap());
        assert!(table.dispatch(&mut counter, &dashboards).unwrap());
        assert_eq!(counter.joined, vec!["grafana".to_string()]);
    }

    #[test]
    fn test_dispatch_propagates_errors() {
        let mut table = Dispatcher::new();
        table.register(HookKind::ConfigChanged, on_fail);

        let mut counter = Counter::default();
        let result = table.dispatch(&mut counter, &HookEvent::new(HookKind::ConfigChanged));
        assert!(result.is_err());
    }
}
