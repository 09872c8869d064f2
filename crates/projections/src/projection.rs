//! Core projection trait and position tracking.

use async_trait::async_trait;
use event_log::EventEnvelope;

use crate::Result;

/// Tracks how many events a projection has processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionPosition {
    /// Number of events processed by this projection.
    pub events_processed: u64,
}

impl ProjectionPosition {
    /// Creates a new position at zero.
    pub fn zero() -> Self {
        Self {
            events_processed: 0,
        }
    }

    /// Advances the position by one event.
    pub fn advance(&self) -> Self {
        Self {
            events_processed: self.events_processed + 1,
        }
    }
}

impl std::fmt::Display for ProjectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "position({})", self.events_processed)
    }
}

/// A projection that processes events and updates a read model.
///
/// Projections turn the append-only event log into denormalized views
/// optimized for queries; they never feed back into command handling.
#[async_trait]
pub trait Projection: Send + Sync {
    /// Returns the name of this projection.
    fn name(&self) -> &'static str;

    /// Handles a single event, updating the projection's read model.
    async fn handle(&self, event: &EventEnvelope) -> Result<()>;

    /// Returns the current position of this projection.
    async fn position(&self) -> ProjectionPosition;

    /// Resets the projection to its initial state.
    async fn reset(&self) -> Result<()>;
}
