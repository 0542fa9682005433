//! Integration tests for the queue ledger, payment processor, and query
//! surface, running against the in-memory storage ports.

mod common;

use std::sync::Arc;

use fee_queue_core::domain::EntryStatus;
use fee_queue_core::error::CoreError;
use fee_queue_core::ports::QueueStore;
use fee_queue_core::{PaymentProcessor, QueueLedger, QueueQueries};
use uuid::Uuid;

use common::MemoryStore;

struct Fixture {
    store: Arc<MemoryStore>,
    ledger: QueueLedger,
    processor: PaymentProcessor,
    queries: QueueQueries,
    counter: Uuid,
    fee_type: Uuid,
}

fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let counter = store.seed_counter(1, "Counter One");
    let fee_type = store.seed_fee_type("Tuition");
    Fixture {
        ledger: QueueLedger::new(store.clone(), store.clone()),
        processor: PaymentProcessor::new(store.clone(), store.clone()),
        queries: QueueQueries::new(store.clone(), store.clone()),
        store,
        counter,
        fee_type,
    }
}

#[tokio::test]
async fn enqueue_assigns_token_and_first_position() {
    let fx = fixture();
    let (_, student) = fx.store.seed_student("Asha Rao", "21CS001");

    let entry = fx
        .ledger
        .enqueue(student, fx.counter, fx.fee_type, 500, None)
        .await
        .unwrap();

    assert_eq!(entry.status, EntryStatus::Pending);
    assert_eq!(entry.sequence, 1);
    assert!(entry.token_number.starts_with("TKN"));
    assert_eq!(fx.ledger.effective_rank(&entry).await.unwrap(), 1);
}

#[tokio::test]
async fn enqueue_then_student_queue_round_trip() {
    let fx = fixture();
    let (_, student) = fx.store.seed_student("Asha Rao", "21CS001");

    let entry = fx
        .ledger
        .enqueue(student, fx.counter, fx.fee_type, 500, Some("sem 4".to_string()))
        .await
        .unwrap();

    let items = fx.queries.queue_for_student(student).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].entry.status, EntryStatus::Pending);
    assert_eq!(items[0].entry.token_number, entry.token_number);
    assert_eq!(items[0].rank, Some(1));
    assert_eq!(items[0].counter_name, "Counter One");
}

#[tokio::test]
async fn enqueue_rejects_nonpositive_amount() {
    let fx = fixture();
    let (_, student) = fx.store.seed_student("Asha Rao", "21CS001");

    for amount in [0, -500] {
        let err = fx
            .ledger
            .enqueue(student, fx.counter, fx.fee_type, amount, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}

#[tokio::test]
async fn enqueue_rejects_unknown_counter_and_fee_type() {
    let fx = fixture();
    let (_, student) = fx.store.seed_student("Asha Rao", "21CS001");

    let err = fx
        .ledger
        .enqueue(student, Uuid::new_v4(), fx.fee_type, 500, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));

    let err = fx
        .ledger
        .enqueue(student, fx.counter, Uuid::new_v4(), 500, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn concurrent_enqueues_get_distinct_increasing_sequences() {
    let fx = fixture();
    let (_, student) = fx.store.seed_student("Asha Rao", "21CS001");

    let mut handles = Vec::new();
    for _ in 0..16 {
        let ledger = fx.ledger.clone();
        let (counter, fee_type) = (fx.counter, fx.fee_type);
        handles.push(tokio::spawn(async move {
            ledger
                .enqueue(student, counter, fee_type, 100, None)
                .await
                .unwrap()
                .sequence
        }));
    }

    let mut sequences = Vec::new();
    for handle in handles {
        sequences.push(handle.await.unwrap());
    }
    sequences.sort_unstable();
    let expected: Vec<i64> = (1..=16).collect();
    assert_eq!(sequences, expected, "sequences must be distinct and gapless");
}

#[tokio::test]
async fn current_of_counter_always_has_rank_one() {
    let fx = fixture();
    let (_, a) = fx.store.seed_student("Asha Rao", "21CS001");
    let (_, b) = fx.store.seed_student("Binod Kumar", "21CS002");

    assert!(fx.ledger.current_of_counter(fx.counter).await.unwrap().is_none());

    fx.ledger.enqueue(a, fx.counter, fx.fee_type, 500, None).await.unwrap();
    fx.ledger.enqueue(b, fx.counter, fx.fee_type, 300, None).await.unwrap();

    let current = fx
        .ledger
        .current_of_counter(fx.counter)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.student_id, a);
    assert_eq!(fx.ledger.effective_rank(&current).await.unwrap(), 1);
}

#[tokio::test]
async fn skip_moves_entry_to_back_without_reordering_others() {
    let fx = fixture();
    let (_, a) = fx.store.seed_student("Asha Rao", "21CS001");
    let (_, b) = fx.store.seed_student("Binod Kumar", "21CS002");
    let (_, c) = fx.store.seed_student("Chitra Iyer", "21CS003");

    let entry_a = fx.ledger.enqueue(a, fx.counter, fx.fee_type, 500, None).await.unwrap();
    fx.ledger.enqueue(b, fx.counter, fx.fee_type, 300, None).await.unwrap();
    fx.ledger.enqueue(c, fx.counter, fx.fee_type, 200, None).await.unwrap();

    let new_rank = fx.processor.skip(entry_a.id).await.unwrap();
    assert_eq!(new_rank, 3, "skipped entry must be last among active");

    let queue = fx.queries.queue_for_counter(fx.counter).await.unwrap();
    let order: Vec<Uuid> = queue.iter().map(|i| i.entry.student_id).collect();
    assert_eq!(order, vec![b, c, a]);
    assert_eq!(
        queue.iter().map(|i| i.rank).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
}

#[tokio::test]
async fn skip_of_only_active_entry_keeps_rank_one() {
    let fx = fixture();
    let (_, a) = fx.store.seed_student("Asha Rao", "21CS001");

    let entry = fx.ledger.enqueue(a, fx.counter, fx.fee_type, 500, None).await.unwrap();
    let new_rank = fx.processor.skip(entry.id).await.unwrap();
    assert_eq!(new_rank, 1);
}

#[tokio::test]
async fn remove_hides_entry_and_ranks_close_up() {
    let fx = fixture();
    let (_, a) = fx.store.seed_student("Asha Rao", "21CS001");
    let (_, b) = fx.store.seed_student("Binod Kumar", "21CS002");
    let (_, c) = fx.store.seed_student("Chitra Iyer", "21CS003");

    fx.ledger.enqueue(a, fx.counter, fx.fee_type, 500, None).await.unwrap();
    let entry_b = fx.ledger.enqueue(b, fx.counter, fx.fee_type, 300, None).await.unwrap();
    fx.ledger.enqueue(c, fx.counter, fx.fee_type, 200, None).await.unwrap();

    let before = fx.queries.queue_for_counter(fx.counter).await.unwrap();

    let removed = fx.processor.remove(entry_b.id, "duplicate").await.unwrap();
    assert_eq!(removed.status, EntryStatus::Removed);
    assert_eq!(removed.removal_reason.as_deref(), Some("duplicate"));

    let after = fx.queries.queue_for_counter(fx.counter).await.unwrap();
    assert!(after.iter().all(|i| i.entry.id != entry_b.id));
    assert_eq!(after.len(), before.len() - 1);

    // Every surviving entry's rank drops by at most one.
    for item in &after {
        let old = before
            .iter()
            .find(|i| i.entry.id == item.entry.id)
            .expect("surviving entry was present before");
        assert!(old.rank - item.rank <= 1);
        assert!(item.rank <= old.rank);
    }
}

#[tokio::test]
async fn process_completes_entry_and_builds_receipt() {
    let fx = fixture();
    let (_, student) = fx.store.seed_student("Asha Rao", "21CS001");
    let accountant = fx.store.seed_accountant("Meena Joshi", "ACC01", Some(fx.counter));

    let entry = fx.ledger.enqueue(student, fx.counter, fx.fee_type, 500, None).await.unwrap();
    let receipt = fx.processor.process(entry.id, accountant).await.unwrap();

    assert!(receipt.receipt_number.starts_with("REC"));
    assert_eq!(receipt.payment_id, entry.id);
    assert_eq!(receipt.token_number, entry.token_number);
    assert_eq!(receipt.student_name, "Asha Rao");
    assert_eq!(receipt.counter_name, "Counter One");
    assert_eq!(receipt.accountant_name, "Meena Joshi");
    assert_eq!(receipt.fee_type, "Tuition");
    assert_eq!(receipt.amount, 500);

    let stored = fx.store.entry_by_id(entry.id).await.unwrap().unwrap();
    assert_eq!(stored.status, EntryStatus::Completed);
    assert_eq!(stored.assigned_to, Some(accountant));
}

#[tokio::test]
async fn process_terminal_entry_fails_and_leaves_state_unchanged() {
    let fx = fixture();
    let (_, student) = fx.store.seed_student("Asha Rao", "21CS001");
    let accountant = fx.store.seed_accountant("Meena Joshi", "ACC01", None);

    let entry = fx.ledger.enqueue(student, fx.counter, fx.fee_type, 500, None).await.unwrap();
    fx.processor.process(entry.id, accountant).await.unwrap();

    let err = fx.processor.process(entry.id, accountant).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidState(_)));

    let err = fx.processor.skip(entry.id).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidState(_)));

    let err = fx.processor.remove(entry.id, "absent").await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidState(_)));

    let stored = fx.store.entry_by_id(entry.id).await.unwrap().unwrap();
    assert_eq!(stored.status, EntryStatus::Completed);
    assert_eq!(stored.assigned_to, Some(accountant));
}

#[tokio::test]
async fn process_unknown_entry_is_not_found() {
    let fx = fixture();
    let accountant = fx.store.seed_accountant("Meena Joshi", "ACC01", None);

    let err = fx.processor.process(Uuid::new_v4(), accountant).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn stats_for_unknown_counter_is_not_found() {
    let fx = fixture();
    let err = fx.queries.stats_for_counter(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

/// The full walk: enqueue two students, skip the first, process the second,
/// then check the "now serving" entry and the day's stats.
#[tokio::test]
async fn counter_day_scenario() {
    let fx = fixture();
    let (_, a) = fx.store.seed_student("Asha Rao", "21CS001");
    let (_, b) = fx.store.seed_student("Binod Kumar", "21CS002");
    let accountant = fx.store.seed_accountant("Meena Joshi", "ACC01", Some(fx.counter));

    let entry_a = fx.ledger.enqueue(a, fx.counter, fx.fee_type, 500, None).await.unwrap();
    let entry_b = fx.ledger.enqueue(b, fx.counter, fx.fee_type, 300, None).await.unwrap();
    assert_eq!(entry_a.sequence, 1);
    assert_eq!(entry_b.sequence, 2);

    fx.processor.skip(entry_a.id).await.unwrap();
    let queue = fx.queries.queue_for_counter(fx.counter).await.unwrap();
    assert_eq!(queue[0].entry.id, entry_b.id);
    assert_eq!(queue[0].rank, 1);
    assert_eq!(queue[1].entry.id, entry_a.id);
    assert_eq!(queue[1].rank, 2);

    let receipt = fx.processor.process(entry_b.id, accountant).await.unwrap();
    assert_eq!(receipt.counter_name, "Counter One");
    assert_eq!(receipt.amount, 300);

    let current = fx
        .ledger
        .current_of_counter(fx.counter)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.id, entry_a.id);
    assert_eq!(fx.ledger.effective_rank(&current).await.unwrap(), 1);

    let stats = fx.queries.stats_for_counter(fx.counter).await.unwrap();
    assert_eq!(stats.queue_count, 1);
    assert!(stats.processed_today >= 1);
    assert!(stats.revenue_today >= 300);
}
