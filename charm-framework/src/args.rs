//! CLI argument parsing for hook executables.

use std::path::PathBuf;

use clap::Parser;

/// File name of the settings file shipped in the charm directory.
pub const SETTINGS_FILE: &str = "charm.json5";

/// Common CLI arguments for charm hook executables.
#[derive(Parser, Debug, Clone)]
#[command(about = "Charm hook dispatcher")]
pub struct HookArgs {
    /// Hook to run (defaults to the basename of JUJU_DISPATCH_PATH).
    pub hook: Option<String>,

    /// Path to the settings file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Charm directory holding the default settings file.
    #[arg(long, env = "JUJU_CHARM_DIR")]
    pub charm_dir: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

impl HookArgs {
    /// Parse CLI arguments.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Settings file to load, if any.
    ///
    /// An explicit `--config` is always returned. Otherwise the charm
    /// directory's settings file is used when it exists.
    pub fn settings_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config {
            return Some(path.clone());
        }

        self.charm_dir
            .as_ref()
            .map(|dir| dir.join(SETTINGS_FILE))
            .filter(|path| path.exists())
    }
}
