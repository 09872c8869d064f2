use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error returned when an identifier string cannot be parsed.
#[derive(Debug, thiserror::Error)]
#[error("invalid identifier '{input}': {reason}")]
pub struct ParseIdError {
    pub input: String,
    pub reason: String,
}

/// Unique identifier for an aggregate instance (operation or program).
///
/// Wraps a UUID for type safety. Operation identifiers double as the
/// external reference sent to the payment provider, so parsing from a
/// string is part of the public contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateId(Uuid);

impl AggregateId {
    /// Creates a new random aggregate ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an aggregate ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parses an aggregate ID from its string form.
    ///
    /// Used when resolving webhook external references back to an
    /// operation identifier.
    pub fn parse_str(input: &str) -> Result<Self, ParseIdError> {
        Uuid::parse_str(input).map(Self).map_err(|e| ParseIdError {
            input: input.to_string(),
            reason: e.to_string(),
        })
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AggregateId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AggregateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for AggregateId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<AggregateId> for Uuid {
    fn from(id: AggregateId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_unique_ids() {
        let id1 = AggregateId::new();
        let id2 = AggregateId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn parse_str_roundtrip() {
        let id = AggregateId::new();
        let parsed = AggregateId::parse_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_str_rejects_garbage() {
        let result = AggregateId::parse_str("not-a-uuid");
        assert!(result.is_err());
    }

    #[test]
    fn serialization_is_transparent() {
        let id = AggregateId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: AggregateId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
