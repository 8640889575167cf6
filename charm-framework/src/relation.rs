//! Relation identifiers.

use std::fmt;
use std::str::FromStr;

use crate::error::CharmError;

/// Identifies one relation instance, e.g. `bind-exporter:3`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelationId {
    endpoint: String,
    number: u32,
}

impl RelationId {
    /// Create a relation id from an endpoint name and the host-assigned number.
    pub fn new(endpoint: impl Into<String>, number: u32) -> Self {
        Self {
            endpoint: endpoint.into(),
            number,
        }
    }

    /// Endpoint name the relation was established on.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Host-assigned relation number.
    pub fn number(&self) -> u32 {
        self.number
    }
}

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.endpoint, self.number)
    }
}

impl FromStr for RelationId {
    type Err = CharmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (endpoint, number) = s
            .rsplit_once(':')
            .ok_or_else(|| CharmError::RelationId(s.to_string()))?;

        if endpoint.is_empty() {
            return Err(CharmError::RelationId(s.to_string()));
        }

        let number = number
            .parse()
            .map_err(|_| CharmError::RelationId(s.to_string()))?;

        Ok(Self::new(endpoint, number))
    }
}

/// A bound relation as seen from the local unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// Relation instance.
    pub id: RelationId,
    /// Name of the application on the other side.
    pub remote_app: String,
}

impl Relation {
    /// Create a relation handle.
    pub fn new(id: RelationId, remote_app: impl Into<String>) -> Self {
        Self {
            id,
            remote_app: remote_app.into(),
        }
    }

    /// Endpoint name the relation was established on.
    pub fn endpoint(&self) -> &str {
        self.id.endpoint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_id_display_and_parse() {
        let id: RelationId = "bind-exporter:3".parse().unwrap();
        assert_eq!(id.endpoint(), "bind-exporter");
        assert_eq!(id.number(), 3);
        assert_eq!(id.to_string(), "bind-exporter:3");
    }

    #[test]
    fn test_relation_id_rejects_garbage() {
        assert!("bind-exporter".parse::<RelationId>().is_err());
        assert!(":3".parse::<RelationId>().is_err());
        assert!("dashboards:x".parse::<RelationId>().is_err());
    }
}
