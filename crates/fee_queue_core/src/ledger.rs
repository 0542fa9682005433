//! crates/fee_queue_core/src/ledger.rs
//!
//! The Queue Ledger owns admission into a counter's queue and the ranking of
//! its entries. Sequence numbers come from the counter's serialized sequence,
//! so concurrent admissions always receive distinct, strictly increasing
//! values; the displayed position is the effective rank, computed on read.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{NewQueueEntry, QueueEntry};
use crate::error::{CoreError, CoreResult};
use crate::ports::{IdentityStore, QueueStore};
use crate::token;

#[derive(Clone)]
pub struct QueueLedger {
    queue: Arc<dyn QueueStore>,
    directory: Arc<dyn IdentityStore>,
}

impl QueueLedger {
    pub fn new(queue: Arc<dyn QueueStore>, directory: Arc<dyn IdentityStore>) -> Self {
        Self { queue, directory }
    }

    /// Admits a payment request into the counter's queue.
    ///
    /// The amount must be positive and the counter and fee type must exist.
    /// On success the entry is `pending`, carries a fresh token number, and
    /// holds a sequence number greater than every previously assigned one at
    /// this counter.
    pub async fn enqueue(
        &self,
        student_id: Uuid,
        counter_id: Uuid,
        fee_type_id: Uuid,
        amount: i64,
        description: Option<String>,
    ) -> CoreResult<QueueEntry> {
        if amount <= 0 {
            return Err(CoreError::Validation(
                "Payment amount must be positive".to_string(),
            ));
        }

        self.directory
            .counter_by_id(counter_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Counter {} not found", counter_id)))?;
        self.directory
            .fee_type_by_id(fee_type_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Fee type {} not found", fee_type_id)))?;

        let sequence = self.queue.next_sequence(counter_id).await?;

        self.queue
            .insert_entry(NewQueueEntry {
                student_id,
                counter_id,
                fee_type_id,
                amount,
                description,
                token_number: token::token_number(),
                sequence,
            })
            .await
    }

    /// Effective rank of an entry among the active entries at its counter:
    /// one plus the count of active entries with a smaller sequence number.
    /// Meaningful only while the entry itself is active.
    pub async fn effective_rank(&self, entry: &QueueEntry) -> CoreResult<i64> {
        let before = self
            .queue
            .count_active_before(entry.counter_id, entry.sequence)
            .await?;
        Ok(before + 1)
    }

    /// The "now serving" entry: the active entry with the smallest sequence
    /// number at the counter, or `None` when the queue is empty.
    pub async fn current_of_counter(&self, counter_id: Uuid) -> CoreResult<Option<QueueEntry>> {
        let active = self.queue.active_entries(counter_id).await?;
        Ok(active.into_iter().next())
    }
}
