use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::{AggregateId, EventEnvelope, EventLogError, EventQuery, Result, Version};

/// Options for appending events to the log.
#[derive(Debug, Clone, Default)]
pub struct AppendOptions {
    /// Expected current version of the aggregate. When set, the append
    /// fails with `ConcurrencyConflict` if the stored version differs.
    /// This is the compare-and-transition guard; `None` skips the check
    /// and is only appropriate for test fixtures.
    pub expected_version: Option<Version>,
}

impl AppendOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the aggregate to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Creates options expecting a brand-new aggregate.
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }
}

/// A stream of log entries in insertion order.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<EventEnvelope>> + Send>>;

/// Core trait for event log backends.
///
/// Entries are append-only and never mutated. All implementations must
/// be thread-safe (Send + Sync).
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Appends events atomically: either all are written or none.
    ///
    /// With `expected_version` set, fails with `ConcurrencyConflict`
    /// when the stored version doesn't match; of two concurrent writers
    /// exactly one succeeds.
    ///
    /// Returns the aggregate version after the append.
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version>;

    /// Returns all events for an aggregate in version order.
    async fn events_for_aggregate(&self, aggregate_id: AggregateId)
    -> Result<Vec<EventEnvelope>>;

    /// Returns events matching a query, ordered by timestamp then version.
    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventEnvelope>>;

    /// Returns all events of one type in timestamp order.
    async fn events_by_type(&self, event_type: &str) -> Result<Vec<EventEnvelope>>;

    /// Streams every event in the log in insertion order, for replaying
    /// read models and audit reconstruction.
    async fn stream_all_events(&self) -> Result<EventStream>;

    /// Returns the current version of an aggregate, or `None` if it has
    /// no events.
    async fn aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>>;
}

/// Validates a batch before appending: non-empty, single aggregate,
/// sequential versions.
pub fn validate_events_for_append(events: &[EventEnvelope]) -> Result<()> {
    let first = events
        .first()
        .ok_or_else(|| EventLogError::InvalidAppend("empty event batch".to_string()))?;

    for event in events.iter().skip(1) {
        if event.aggregate_id != first.aggregate_id {
            return Err(EventLogError::InvalidAppend(
                "all events in a batch must target the same aggregate".to_string(),
            ));
        }
        if event.aggregate_type != first.aggregate_type {
            return Err(EventLogError::InvalidAppend(
                "all events in a batch must share the aggregate type".to_string(),
            ));
        }
    }

    let mut expected = first.version;
    for event in events.iter().skip(1) {
        expected = expected.next();
        if event.version != expected {
            return Err(EventLogError::InvalidAppend(format!(
                "event versions must be sequential: expected {expected}, got {}",
                event.version
            )));
        }
    }

    Ok(())
}
