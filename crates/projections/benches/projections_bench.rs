use common::AggregateId;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Amount, ClientId, DomainEvent, OperationEvent, OperationStatus, TxHash};
use event_log::{AppendOptions, EventEnvelope, EventLog, InMemoryEventLog, Version};
use projections::{OperationsView, Projection, ProjectionProcessor, ReconciliationView};
use rust_decimal_macros::dec;

use std::sync::Arc;

fn amount() -> Amount {
    Amount::new(dec!(100)).unwrap()
}

fn make_envelope(aggregate_id: AggregateId, version: i64, event: &OperationEvent) -> EventEnvelope {
    EventEnvelope::builder()
        .aggregate_id(aggregate_id)
        .aggregate_type("Operation")
        .event_type(DomainEvent::event_type(event))
        .version(Version::new(version))
        .payload(event)
        .unwrap()
        .build()
}

/// Populate a log with N deposits, each having 3 events
/// (requested + confirmed + minting started).
async fn populate_log(log: &InMemoryEventLog, n: usize) {
    for _ in 0..n {
        let agg_id = AggregateId::new();
        let program_id = AggregateId::new();
        let client_id = ClientId::new();

        let requested = OperationEvent::deposit_requested(agg_id, program_id, client_id, amount());
        let confirmed = OperationEvent::payment_confirmed();
        let minting = OperationEvent::minting_started(false);

        let events = vec![
            make_envelope(agg_id, 1, &requested),
            make_envelope(agg_id, 2, &confirmed),
            make_envelope(agg_id, 3, &minting),
        ];
        log.append(events, AppendOptions::new()).await.unwrap();
    }
}

fn bench_catch_up_100_operations(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let log = InMemoryEventLog::new();

    rt.block_on(populate_log(&log, 100));

    c.bench_function("projections/catch_up_300_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                let view = OperationsView::new();
                let mut processor = ProjectionProcessor::new(log.clone());
                processor.register(Box::new(view.clone()) as Box<dyn Projection>);
                processor.run_catch_up().await.unwrap();
            });
        });
    });
}

fn bench_catch_up_1000_operations(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let log = InMemoryEventLog::new();

    rt.block_on(populate_log(&log, 1000));

    c.bench_function("projections/catch_up_3000_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                let view = OperationsView::new();
                let mut processor = ProjectionProcessor::new(log.clone());
                processor.register(Box::new(view.clone()) as Box<dyn Projection>);
                processor.run_catch_up().await.unwrap();
            });
        });
    });
}

fn bench_process_single_event(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let view = Arc::new(OperationsView::new());

    c.bench_function("projections/process_single_event", |b| {
        b.iter(|| {
            rt.block_on(async {
                let agg_id = AggregateId::new();
                let event = OperationEvent::deposit_requested(
                    agg_id,
                    AggregateId::new(),
                    ClientId::new(),
                    amount(),
                );
                let envelope = make_envelope(agg_id, 1, &event);
                view.handle(&envelope).await.unwrap();
            });
        });
    });
}

fn bench_query_by_status(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let log = InMemoryEventLog::new();
    let view = Arc::new(OperationsView::new());

    // Pre-populate with 100 operations
    rt.block_on(async {
        populate_log(&log, 100).await;
        let mut processor = ProjectionProcessor::new(log);
        processor.register(Box::new(view.as_ref().clone()) as Box<dyn Projection>);
        processor.run_catch_up().await.unwrap();
    });

    c.bench_function("projections/query_by_status_100_operations", |b| {
        b.iter(|| {
            rt.block_on(async {
                view.get_operations_by_status(OperationStatus::MintingInProgress)
                    .await;
            });
        });
    });
}

fn bench_reconciliation_catch_up(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let log = InMemoryEventLog::new();

    // 100 withdraws ending in a payout failure
    rt.block_on(async {
        for _ in 0..100 {
            let agg_id = AggregateId::new();
            let requested = OperationEvent::withdraw_requested(
                agg_id,
                AggregateId::new(),
                ClientId::new(),
                amount(),
            );
            let burned = OperationEvent::tokens_burned(TxHash::new("0xburn"));
            let failed = OperationEvent::payout_failed("provider rejected destination");

            let events = vec![
                make_envelope(agg_id, 1, &requested),
                make_envelope(agg_id, 2, &burned),
                make_envelope(agg_id, 3, &failed),
            ];
            log.append(events, AppendOptions::new()).await.unwrap();
        }
    });

    c.bench_function("projections/reconciliation_catch_up_300_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                let view = ReconciliationView::new();
                let mut processor = ProjectionProcessor::new(log.clone());
                processor.register(Box::new(view.clone()) as Box<dyn Projection>);
                processor.run_catch_up().await.unwrap();
            });
        });
    });
}

fn bench_rebuild_100_operations(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let log = InMemoryEventLog::new();
    let view = Arc::new(OperationsView::new());

    rt.block_on(async {
        populate_log(&log, 100).await;
    });

    let mut processor = ProjectionProcessor::new(log);
    processor.register(Box::new(view.as_ref().clone()) as Box<dyn Projection>);
    let processor = Arc::new(processor);

    c.bench_function("projections/rebuild_300_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                processor.rebuild_all().await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_catch_up_100_operations,
    bench_catch_up_1000_operations,
    bench_process_single_event,
    bench_query_by_status,
    bench_reconciliation_catch_up,
    bench_rebuild_100_operations,
);
criterion_main!(benches);
