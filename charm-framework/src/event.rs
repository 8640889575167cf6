//! Hook events delivered by the host runtime.

use std::fmt;
use std::path::Path;

use crate::error::{CharmError, Result};
use crate::relation::{Relation, RelationId};

const JOINED: &str = "-relation-joined";
const CHANGED: &str = "-relation-changed";
const DEPARTED: &str = "-relation-departed";
const BROKEN: &str = "-relation-broken";

/// Kind of hook being run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HookKind {
    Install,
    ConfigChanged,
    Start,
    UpgradeCharm,
    RelationJoined(String),
    RelationChanged(String),
    RelationDeparted(String),
    RelationBroken(String),
    /// Any hook this framework does not model explicitly.
    Other(String),
}

impl HookKind {
    /// Parse a hook name such as `config-changed` or `dashboards-relation-joined`.
    pub fn parse(name: &str) -> Self {
        match name {
            "install" => return HookKind::Install,
            "config-changed" => return HookKind::ConfigChanged,
            "start" => return HookKind::Start,
            "upgrade-charm" => return HookKind::UpgradeCharm,
            _ => {}
        }

        let relation_hook = |suffix: &str| {
            name.strip_suffix(suffix)
                .filter(|endpoint| !endpoint.is_empty())
                .map(str::to_string)
        };

        if let Some(endpoint) = relation_hook(JOINED) {
            HookKind::RelationJoined(endpoint)
        } else if let Some(endpoint) = relation_hook(CHANGED) {
            HookKind::RelationChanged(endpoint)
        } else if let Some(endpoint) = relation_hook(DEPARTED) {
            HookKind::RelationDeparted(endpoint)
        } else if let Some(endpoint) = relation_hook(BROKEN) {
            HookKind::RelationBroken(endpoint)
        } else {
            HookKind::Other(name.to_string())
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookKind::Install => write!(f, "install"),
            HookKind::ConfigChanged => write!(f, "config-changed"),
            HookKind::Start => write!(f, "start"),
            HookKind::UpgradeCharm => write!(f, "upgrade-charm"),
            HookKind::RelationJoined(endpoint) => write!(f, "{}{}", endpoint, JOINED),
            HookKind::RelationChanged(endpoint) => write!(f, "{}{}", endpoint, CHANGED),
            HookKind::RelationDeparted(endpoint) => write!(f, "{}{}", endpoint, DEPARTED),
            HookKind::RelationBroken(endpoint) => write!(f, "{}{}", endpoint, BROKEN),
            HookKind::Other(name) => write!(f, "{}", name),
        }
    }
}

/// A single hook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookEvent {
    pub kind: HookKind,
    /// The relation the hook fired for, if it is a relation hook.
    pub relation: Option<Relation>,
}

impl HookEvent {
    /// Event without relation context.
    pub fn new(kind: HookKind) -> Self {
        Self {
            kind,
            relation: None,
        }
    }

    /// Event fired for `relation`.
    pub fn for_relation(kind: HookKind, relation: Relation) -> Self {
        Self {
            kind,
            relation: Some(relation),
        }
    }

    /// Build an event from a hook name and the relation variables the host sets.
    pub fn from_parts(
        hook: &str,
        relation_id: Option<&str>,
        remote_app: Option<&str>,
    ) -> Result<Self> {
        let kind = HookKind::parse(hook);

        let relation = match relation_id.filter(|id| !id.is_empty()) {
            Some(id) => {
                let id: RelationId = id.parse()?;
                Some(Relation::new(id, remote_app.unwrap_or_default()))
            }
            None => None,
        };

        Ok(Self { kind, relation })
    }

    /// Build the event for the current process from the hook environment.
    ///
    /// The hook name comes from `hook` when given, otherwise from the
    /// basename of `JUJU_DISPATCH_PATH`.
    pub fn from_env(hook: Option<&str>) -> Result<Self> {
        let dispatch_path = std::env::var("JUJU_DISPATCH_PATH").ok();

        let hook = match hook {
            Some(hook) => hook.to_string(),
            None => dispatch_path
                .as_deref()
                .and_then(|path| Path::new(path).file_name())
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| CharmError::Environment("JUJU_DISPATCH_PATH".to_string()))?,
        };

        let relation_id = std::env::var("JUJU_RELATION_ID").ok();
        let remote_app = std::env::var("JUJU_REMOTE_APP").ok();

        Self::from_parts(&hook, relation_id.as_deref(), remote_app.as_deref())
    }

    /// The relation this event fired for.
    pub fn relation(&self) -> Result<&Relation> {
        self.relation
            .as_ref()
            .ok_or_else(|| CharmError::MissingRelation(self.kind.to_string()))
    }
}
