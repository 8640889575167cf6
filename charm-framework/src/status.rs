//! Unit status reporting.

use std::fmt;

/// Workload status of the local unit, as shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitStatus {
    /// The unit is doing work (installing, applying configuration).
    Maintenance(String),
    /// The unit is ready.
    Active(String),
    /// The unit cannot make progress until the operator acts.
    Blocked(String),
}

impl UnitStatus {
    /// Create a "maintenance" status.
    pub fn maintenance(message: impl Into<String>) -> Self {
        Self::Maintenance(message.into())
    }

    /// Create an "active" status.
    pub fn active(message: impl Into<String>) -> Self {
        Self::Active(message.into())
    }

    /// Create a "blocked" status.
    pub fn blocked(message: impl Into<String>) -> Self {
        Self::Blocked(message.into())
    }

    /// Status name as understood by `status-set`.
    pub fn name(&self) -> &'static str {
        match self {
            UnitStatus::Maintenance(_) => "maintenance",
            UnitStatus::Active(_) => "active",
            UnitStatus::Blocked(_) => "blocked",
        }
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        match self {
            UnitStatus::Maintenance(msg) | UnitStatus::Active(msg) | UnitStatus::Blocked(msg) => {
                msg
            }
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, UnitStatus::Blocked(_))
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name(), self.message())
    }
}
