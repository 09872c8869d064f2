//! Projection processor for feeding events to projections.

use event_log::{EventEnvelope, EventLog};
use futures_util::StreamExt;

use crate::Result;
use crate::projection::Projection;

/// Processes events from the event log and delivers them to projections.
///
/// The processor supports:
/// - Catch-up: replays all events from the log to bring projections up to date
/// - Single event delivery: delivers a new event to all projections
/// - Rebuild: resets all projections and replays from scratch
pub struct ProjectionProcessor<S: EventLog> {
    log: S,
    projections: Vec<Box<dyn Projection>>,
}

impl<S: EventLog> ProjectionProcessor<S> {
    /// Creates a new processor with the given event log.
    pub fn new(log: S) -> Self {
        Self {
            log,
            projections: Vec::new(),
        }
    }

    /// Registers a projection with this processor.
    pub fn register(&mut self, projection: Box<dyn Projection>) {
        self.projections.push(projection);
    }

    /// Returns the number of registered projections.
    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    /// Runs catch-up processing: streams all events from the log and delivers
    /// them to each projection that hasn't already seen them.
    #[tracing::instrument(skip(self))]
    pub async fn run_catch_up(&self) -> Result<()> {
        let mut stream = self.log.stream_all_events().await?;
        let mut event_index: u64 = 0;

        while let Some(result) = stream.next().await {
            let event = result?;
            event_index += 1;

            for projection in &self.projections {
                let pos = projection.position().await;
                if pos.events_processed < event_index {
                    projection.handle(&event).await?;
                    metrics::counter!("projections_events_processed").increment(1);
                }
            }
        }

        tracing::info!(events_processed = event_index, "catch-up complete");

        Ok(())
    }

    /// Delivers a single event to all registered projections.
    #[tracing::instrument(skip(self, event), fields(event_type = %event.event_type))]
    pub async fn process_event(&self, event: &EventEnvelope) -> Result<()> {
        for projection in &self.projections {
            projection.handle(event).await?;
        }
        Ok(())
    }

    /// Resets all projections and replays all events from the log.
    #[tracing::instrument(skip(self))]
    pub async fn rebuild_all(&self) -> Result<()> {
        for projection in &self.projections {
            projection.reset().await?;
        }
        self.run_catch_up().await
    }
}
