//! Settings-file traits and utilities.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::LoggingConfig;
use crate::error::{CharmError, Result};

/// Trait for a charm's operator-side settings.
///
/// These are distinct from the charm options the host reports through
/// [`crate::Model::config`]: settings are read from a JSON5 file shipped
/// with the charm and control how the hook executable itself behaves.
///
/// # Example
///
/// ```ignore
/// use serde::Deserialize;
/// use charm_framework::{CharmSettings, LoggingConfig};
///
/// #[derive(Debug, Default, Deserialize)]
/// pub struct MySettings {
///     #[serde(default)]
///     pub logging: LoggingConfig,
/// }
///
/// impl CharmSettings for MySettings {
///     fn logging(&self) -> &LoggingConfig {
///         &self.logging
///     }
/// }
/// ```
pub trait CharmSettings: Sized + DeserializeOwned + Default {
    /// Get the logging configuration.
    fn logging(&self) -> &LoggingConfig;

    /// Validate the settings.
    ///
    /// Called automatically after loading. Override to add custom validation.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Load settings from a file path.
    ///
    /// Supports JSON5 format. Calls [`validate`](Self::validate) after loading.
    fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(CharmError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let settings: Self = charm_common::load_config(path)?;

        settings.validate()?;

        Ok(settings)
    }

    /// Load settings from `path` when given, otherwise use defaults.
    fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    struct TestSettings {
        #[serde(default)]
        logging: LoggingConfig,
    }

    impl CharmSettings for TestSettings {
        fn logging(&self) -> &LoggingConfig {
            &self.logging
        }
    }

    #[test]
    fn test_settings_not_found() {
        let result = TestSettings::load("/nonexistent/path.json5");
        assert!(matches!(result, Err(CharmError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_settings_default_when_absent() {
        let settings = TestSettings::load_optional(None).unwrap();
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_settings_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charm.json5");
        std::fs::write(&path, "{ logging: ").unwrap();

        let result = TestSettings::load(&path);
        assert!(matches!(result, Err(CharmError::ConfigParse(_))));
    }
}
