//! Charm Framework
//!
//! Common abstractions for writing charm hook executables.
//!
//! # Overview
//!
//! This framework provides:
//! - [`Model`] and [`RelationBus`] capability traits through which a charm reaches its host
//! - [`HookTools`] implementing both on top of the runtime's hook tools
//! - [`HookEvent`] / [`HookKind`] describing the hook being run
//! - [`Dispatcher`] mapping hook kinds to charm handlers
//! - [`CharmSettings`] trait for settings-file loading and validation
//! - [`HookArgs`] for common CLI argument parsing
//! - [`UnitStatus`] for workload status reporting
//! - [`testing`] with an in-memory host for tests
//!
//! # Example
//!
//! ```ignore
//! use charm_framework::{Dispatcher, HookArgs, HookEvent, HookTools};
//!
//! fn main() -> anyhow::Result<()> {
//!     let args = HookArgs::parse();
//!     let event = HookEvent::from_env(args.hook.as_deref())?;
//!
//!     let mut charm = MyCharm::new(HookTools::from_env()?);
//!     MyCharm::dispatch_table().dispatch(&mut charm, &event)?;
//!     Ok(())
//! }
//! ```

mod args;
mod config;
mod dispatch;
mod error;
mod event;
mod host;
mod hooktools;
mod relation;
mod status;
pub mod testing;

pub use args::{HookArgs, SETTINGS_FILE};
pub use config::CharmSettings;
pub use dispatch::{Dispatcher, Handler};
pub use error::{CharmError, Result};
pub use event::{HookEvent, HookKind};
pub use host::{CommandRunner, Host, Model, RelationBus, SystemCommandRunner};
pub use hooktools::HookTools;
pub use relation::{Relation, RelationId};
pub use status::UnitStatus;

// Re-export commonly used types from charm-common
pub use charm_common::{ConfigMap, FactMap, LogFormat, LoggingConfig, PeerFact, init_tracing};
