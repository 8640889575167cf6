use std::collections::BTreeMap;

/// Contents of one unit's fact slot in a relation.
///
/// Ordered so that the key/value pairs handed to the host tools are stable.
pub type FactMap = BTreeMap<String, String>;

/// Charm option values as reported by the host, keyed by option name.
pub type ConfigMap = BTreeMap<String, serde_json::Value>;

/// Scrape target advertised to a metrics consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerFact {
    /// Address the exporter listens on.
    pub hostname: String,

    /// Listen port, rendered as a string on the wire.
    pub port: String,
}

impl PeerFact {
    /// Create a new fact from an address and a numeric port.
    pub fn new(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            port: port.to_string(),
        }
    }

    /// Convert into the flat key/value form written to a fact slot.
    pub fn into_facts(self) -> FactMap {
        FactMap::from([
            ("hostname".to_string(), self.hostname),
            ("port".to_string(), self.port),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_fact_into_facts() {
        let facts = PeerFact::new("10.0.0.5", 9119).into_facts();

        assert_eq!(facts.len(), 2);
        assert_eq!(facts.get("hostname"), Some(&"10.0.0.5".to_string()));
        assert_eq!(facts.get("port"), Some(&"9119".to_string()));
    }
}
