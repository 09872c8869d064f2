use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    AggregateId, EventEnvelope, EventLogError, EventQuery, Result, Version,
    store::{AppendOptions, EventLog, EventStream, validate_events_for_append},
};

/// In-memory event log for tests and local runs.
///
/// Provides the same CAS semantics as the PostgreSQL backend.
#[derive(Clone, Default)]
pub struct InMemoryEventLog {
    events: Arc<RwLock<Vec<EventEnvelope>>>,
}

impl InMemoryEventLog {
    /// Creates a new empty in-memory log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }

    /// Clears all events.
    pub async fn clear(&self) {
        self.events.write().await.clear();
    }
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        validate_events_for_append(&events)?;

        let first = &events[0];
        let aggregate_id = first.aggregate_id;

        let mut log = self.events.write().await;

        let current_version = log
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .map(|e| e.version)
            .max()
            .unwrap_or(Version::initial());

        if let Some(expected) = options.expected_version
            && current_version != expected
        {
            return Err(EventLogError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual: current_version,
            });
        }

        // Mirror the unique (aggregate_id, version) constraint
        if first.version <= current_version && current_version != Version::initial() {
            return Err(EventLogError::ConcurrencyConflict {
                aggregate_id,
                expected: options.expected_version.unwrap_or(current_version),
                actual: current_version,
            });
        }

        let last_version = events
            .last()
            .map(|e| e.version)
            .unwrap_or(Version::initial());
        log.extend(events);

        Ok(last_version)
    }

    async fn events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope>> {
        let log = self.events.read().await;
        let mut events: Vec<_> = log
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.version);
        Ok(events)
    }

    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventEnvelope>> {
        let log = self.events.read().await;
        let mut events: Vec<_> = log
            .iter()
            .filter(|e| {
                if let Some(id) = query.aggregate_id
                    && e.aggregate_id != id
                {
                    return false;
                }
                if let Some(ref agg_type) = query.aggregate_type
                    && &e.aggregate_type != agg_type
                {
                    return false;
                }
                if let Some(ref types) = query.event_types
                    && !types.contains(&e.event_type)
                {
                    return false;
                }
                if let Some(from) = query.from_version
                    && e.version < from
                {
                    return false;
                }
                if let Some(to) = query.to_version
                    && e.version > to
                {
                    return false;
                }
                if let Some(from) = query.from_timestamp
                    && e.timestamp < from
                {
                    return false;
                }
                if let Some(to) = query.to_timestamp
                    && e.timestamp > to
                {
                    return false;
                }
                true
            })
            .cloned()
            .collect();

        events.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then(a.version.cmp(&b.version))
        });

        let offset = query.offset.unwrap_or(0);
        let events: Vec<_> = events.into_iter().skip(offset).collect();

        let events = if let Some(limit) = query.limit {
            events.into_iter().take(limit).collect()
        } else {
            events
        };

        Ok(events)
    }

    async fn events_by_type(&self, event_type: &str) -> Result<Vec<EventEnvelope>> {
        let log = self.events.read().await;
        let mut events: Vec<_> = log
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect();
        events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(events)
    }

    async fn stream_all_events(&self) -> Result<EventStream> {
        use futures_util::stream;

        let log = self.events.read().await;
        let events = log.clone();

        let stream = stream::iter(events.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }

    async fn aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>> {
        let log = self.events.read().await;
        let version = log
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .map(|e| e.version)
            .max();
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_event(aggregate_id: AggregateId, version: Version, event_type: &str) -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(aggregate_id)
            .aggregate_type("Operation")
            .event_type(event_type)
            .version(version)
            .payload_raw(serde_json::json!({"test": true}))
            .build()
    }

    #[tokio::test]
    async fn append_single_event() {
        let log = InMemoryEventLog::new();
        let aggregate_id = AggregateId::new();
        let event = test_event(aggregate_id, Version::first(), "DepositRequested");

        let version = log
            .append(vec![event], AppendOptions::expect_new())
            .await
            .unwrap();
        assert_eq!(version, Version::first());

        let events = log.events_for_aggregate(aggregate_id).await.unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn append_batch_returns_last_version() {
        let log = InMemoryEventLog::new();
        let aggregate_id = AggregateId::new();

        let events = vec![
            test_event(aggregate_id, Version::new(1), "DepositRequested"),
            test_event(aggregate_id, Version::new(2), "CollectionCreated"),
            test_event(aggregate_id, Version::new(3), "PaymentConfirmed"),
        ];

        let version = log
            .append(events, AppendOptions::expect_new())
            .await
            .unwrap();
        assert_eq!(version, Version::new(3));
    }

    #[tokio::test]
    async fn stale_expected_version_conflicts() {
        let log = InMemoryEventLog::new();
        let aggregate_id = AggregateId::new();

        log.append(
            vec![test_event(aggregate_id, Version::first(), "DepositRequested")],
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();

        // A second writer that still believes the aggregate is new
        let result = log
            .append(
                vec![test_event(aggregate_id, Version::first(), "PaymentConfirmed")],
                AppendOptions::expect_new(),
            )
            .await;

        assert!(matches!(
            result,
            Err(EventLogError::ConcurrencyConflict { .. })
        ));
    }

    #[tokio::test]
    async fn matching_expected_version_succeeds() {
        let log = InMemoryEventLog::new();
        let aggregate_id = AggregateId::new();

        log.append(
            vec![test_event(aggregate_id, Version::first(), "DepositRequested")],
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();

        let result = log
            .append(
                vec![test_event(aggregate_id, Version::new(2), "PaymentConfirmed")],
                AppendOptions::expect_version(Version::first()),
            )
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn exactly_one_of_two_racing_writers_wins() {
        let log = InMemoryEventLog::new();
        let aggregate_id = AggregateId::new();

        log.append(
            vec![test_event(aggregate_id, Version::first(), "DepositRequested")],
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();

        let a = log.append(
            vec![test_event(aggregate_id, Version::new(2), "PaymentConfirmed")],
            AppendOptions::expect_version(Version::first()),
        );
        let b = log.append(
            vec![test_event(aggregate_id, Version::new(2), "PaymentConfirmed")],
            AppendOptions::expect_version(Version::first()),
        );

        let (ra, rb) = tokio::join!(a, b);
        assert_eq!(
            ra.is_ok() as u8 + rb.is_ok() as u8,
            1,
            "exactly one writer must win"
        );
    }

    #[tokio::test]
    async fn events_by_type_across_aggregates() {
        let log = InMemoryEventLog::new();
        let id1 = AggregateId::new();
        let id2 = AggregateId::new();

        log.append(
            vec![test_event(id1, Version::first(), "PayoutInitiated")],
            AppendOptions::new(),
        )
        .await
        .unwrap();
        log.append(
            vec![test_event(id2, Version::first(), "Minted")],
            AppendOptions::new(),
        )
        .await
        .unwrap();

        let payouts = log.events_by_type("PayoutInitiated").await.unwrap();
        assert_eq!(payouts.len(), 1);
        assert_eq!(payouts[0].aggregate_id, id1);
    }

    #[tokio::test]
    async fn query_with_version_range() {
        let log = InMemoryEventLog::new();
        let id = AggregateId::new();

        let events = vec![
            test_event(id, Version::new(1), "DepositRequested"),
            test_event(id, Version::new(2), "PaymentConfirmed"),
            test_event(id, Version::new(3), "MintingStarted"),
        ];
        log.append(events, AppendOptions::new()).await.unwrap();

        let query = EventQuery::new()
            .aggregate_id(id)
            .from_version(Version::new(2))
            .to_version(Version::new(2));

        let results = log.query_events(query).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].version, Version::new(2));
    }

    #[tokio::test]
    async fn stream_preserves_insertion_order() {
        use futures_util::StreamExt;

        let log = InMemoryEventLog::new();
        let id1 = AggregateId::new();
        let id2 = AggregateId::new();

        log.append(
            vec![test_event(id1, Version::first(), "DepositRequested")],
            AppendOptions::new(),
        )
        .await
        .unwrap();
        log.append(
            vec![test_event(id2, Version::first(), "WithdrawRequested")],
            AppendOptions::new(),
        )
        .await
        .unwrap();

        let stream = log.stream_all_events().await.unwrap();
        let events: Vec<_> = stream.collect().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].as_ref().unwrap().aggregate_id, id1);
        assert_eq!(events[1].as_ref().unwrap().aggregate_id, id2);
    }

    #[tokio::test]
    async fn aggregate_version_tracks_max() {
        let log = InMemoryEventLog::new();
        let id = AggregateId::new();

        assert!(log.aggregate_version(id).await.unwrap().is_none());

        log.append(
            vec![
                test_event(id, Version::new(1), "DepositRequested"),
                test_event(id, Version::new(2), "PaymentConfirmed"),
            ],
            AppendOptions::new(),
        )
        .await
        .unwrap();

        assert_eq!(
            log.aggregate_version(id).await.unwrap(),
            Some(Version::new(2))
        );
    }
}
