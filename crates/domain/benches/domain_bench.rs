use common::AggregateId;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::operation::{ConfirmPayment, RecordMinted, RequestDeposit, StartMinting};
use domain::{
    Aggregate, Amount, ClientId, Operation, OperationEvent, OperationService, TxHash,
};
use event_log::{AppendOptions, EventEnvelope, InMemoryEventLog, Version, store::EventLog};
use rust_decimal_macros::dec;

fn make_envelope(aggregate_id: AggregateId, version: i64, event: &OperationEvent) -> EventEnvelope {
    EventEnvelope::builder()
        .aggregate_id(aggregate_id)
        .aggregate_type("Operation")
        .event_type(domain::DomainEvent::event_type(event))
        .version(Version::new(version))
        .payload(event)
        .unwrap()
        .build()
}

fn amount() -> Amount {
    Amount::new(dec!(100)).unwrap()
}

fn bench_request_deposit(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("domain/request_deposit", |b| {
        b.iter(|| {
            rt.block_on(async {
                let log = InMemoryEventLog::new();
                let service = OperationService::new(log);
                let cmd =
                    RequestDeposit::for_program(AggregateId::new(), ClientId::new(), amount());
                service.request_deposit(cmd).await.unwrap();
            });
        });
    });
}

fn bench_full_deposit_cycle(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("domain/full_deposit_to_minted", |b| {
        b.iter(|| {
            rt.block_on(async {
                let log = InMemoryEventLog::new();
                let service = OperationService::new(log);
                let cmd =
                    RequestDeposit::for_program(AggregateId::new(), ClientId::new(), amount());
                let operation_id = cmd.operation_id;
                service.request_deposit(cmd).await.unwrap();

                service
                    .confirm_payment(ConfirmPayment::new(operation_id))
                    .await
                    .unwrap();

                service
                    .start_minting(StartMinting::new(operation_id, false))
                    .await
                    .unwrap();

                service
                    .record_minted(RecordMinted::new(operation_id, TxHash::new("0xbench")))
                    .await
                    .unwrap();
            });
        });
    });
}

fn populate_deposit_history(
    rt: &tokio::runtime::Runtime,
    log: &InMemoryEventLog,
    agg_id: AggregateId,
    confirmations: i64,
) {
    rt.block_on(async {
        let created = OperationEvent::deposit_requested(
            agg_id,
            AggregateId::new(),
            ClientId::new(),
            amount(),
        );
        let mut events = vec![make_envelope(agg_id, 1, &created)];
        // Alternating submission/confirmation pairs simulate retried mints
        for v in 2..=confirmations {
            let event = if v % 2 == 0 {
                OperationEvent::collection_created(format!("col-{v}"), format!("pix-{v}"))
            } else {
                OperationEvent::mint_submitted(TxHash::new(format!("0x{v:04x}")))
            };
            events.push(make_envelope(agg_id, v, &event));
        }
        log.append(events, AppendOptions::new()).await.unwrap();
    });
}

fn bench_aggregate_reconstruction(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let log = InMemoryEventLog::new();
    let agg_id = AggregateId::new();

    populate_deposit_history(&rt, &log, agg_id, 50);

    c.bench_function("domain/reconstruct_50_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                let events = log.events_for_aggregate(agg_id).await.unwrap();
                let mut op = Operation::default();
                for event in &events {
                    let domain_event: OperationEvent =
                        serde_json::from_value(event.payload.clone()).unwrap();
                    op.apply(&domain_event);
                }
            });
        });
    });
}

fn bench_aggregate_reconstruction_100(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let log = InMemoryEventLog::new();
    let agg_id = AggregateId::new();

    populate_deposit_history(&rt, &log, agg_id, 100);

    c.bench_function("domain/reconstruct_100_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                let events = log.events_for_aggregate(agg_id).await.unwrap();
                let mut op = Operation::default();
                for event in &events {
                    let domain_event: OperationEvent =
                        serde_json::from_value(event.payload.clone()).unwrap();
                    op.apply(&domain_event);
                }
            });
        });
    });
}

criterion_group!(
    benches,
    bench_request_deposit,
    bench_full_deposit_cycle,
    bench_aggregate_reconstruction,
    bench_aggregate_reconstruction_100,
);
criterion_main!(benches);
