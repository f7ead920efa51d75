mod common;

use common::{RecordingGateway, Script, complete_recipient};
use payrun::application::engine::{PayoutDraft, PayoutEngine};
use payrun::application::worker::ProcessingWorker;
use payrun::config::EngineConfig;
use payrun::domain::payout::{Currency, Outcome, PayoutRecord, PayoutStatus};
use payrun::domain::ports::PayoutStore;
use payrun::infrastructure::in_memory::InMemoryPayoutStore;
use rust_decimal_macros::dec;
use std::sync::Arc;

#[tokio::test]
async fn simultaneous_processing_of_one_record_completes_exactly_once() {
    let store = Arc::new(InMemoryPayoutStore::new());
    let gateway = RecordingGateway::new(Script::AlwaysOk);
    let worker = Arc::new(ProcessingWorker::new(store.clone(), gateway.clone()));

    let record = PayoutRecord::new(dec!(50.00), Currency::Rub, complete_recipient(), None);
    let id = record.id;
    store.create(record).await.unwrap();

    let (first, second) = tokio::join!(
        {
            let worker = worker.clone();
            async move { worker.process(id).await.unwrap() }
        },
        {
            let worker = worker.clone();
            async move { worker.process(id).await.unwrap() }
        }
    );

    let mut outcomes = [first, second];
    outcomes.sort_by_key(|o| *o == Outcome::Skipped);
    assert_eq!(outcomes, [Outcome::Completed, Outcome::Skipped]);
    assert_eq!(gateway.calls(), 1, "settlement must run exactly once");

    let committed = store.get(id).await.unwrap().unwrap();
    assert_eq!(committed.status, PayoutStatus::Completed);
}

#[tokio::test]
async fn double_enqueue_through_the_controller_is_safe() {
    let store = Arc::new(InMemoryPayoutStore::new());
    let gateway = RecordingGateway::new(Script::AlwaysOk);
    let engine = PayoutEngine::new(store.clone(), gateway.clone(), EngineConfig::default());

    let (record, receiver) = engine
        .submit(PayoutDraft {
            amount: dec!(50.00),
            currency: Currency::Rub,
            recipient: complete_recipient(),
            description: None,
        })
        .await
        .unwrap();

    // A duplicate delivery racing the original.
    let duplicate = engine.enqueue(record.id);

    let first = receiver.await.unwrap();
    let second = duplicate.await.unwrap();

    let mut outcomes = [first, second];
    outcomes.sort_by_key(|o| *o == Outcome::Skipped);
    assert_eq!(outcomes, [Outcome::Completed, Outcome::Skipped]);
    assert_eq!(gateway.calls(), 1);
}

#[tokio::test]
async fn many_distinct_records_process_in_parallel() {
    let store = Arc::new(InMemoryPayoutStore::new());
    let gateway = RecordingGateway::new(Script::AlwaysOk);
    let engine = Arc::new(PayoutEngine::new(
        store.clone(),
        gateway.clone(),
        EngineConfig::default(),
    ));

    let mut receivers = Vec::new();
    for n in 1..=50 {
        let (_, receiver) = engine
            .submit(PayoutDraft {
                amount: dec!(1.00) * rust_decimal::Decimal::from(n),
                currency: Currency::Usd,
                recipient: complete_recipient(),
                description: None,
            })
            .await
            .unwrap();
        receivers.push(receiver);
    }

    for receiver in receivers {
        assert_eq!(receiver.await.unwrap(), Outcome::Completed);
    }
    assert_eq!(gateway.calls(), 50);

    let all = store.all().await.unwrap();
    assert_eq!(all.len(), 50);
    assert!(all.iter().all(|r| r.status == PayoutStatus::Completed));
}
