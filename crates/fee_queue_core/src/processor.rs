//! crates/fee_queue_core/src/processor.rs
//!
//! The Payment Processor owns the terminal-state transitions of queue entries.
//! Every mutation is a single conditional transition (only from an active
//! status), so the loser of a race between process, skip, and remove observes
//! `InvalidState` instead of corrupting the entry.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{QueueEntry, Receipt};
use crate::error::{CoreError, CoreResult};
use crate::ports::{IdentityStore, QueueStore};
use crate::token;

#[derive(Clone)]
pub struct PaymentProcessor {
    queue: Arc<dyn QueueStore>,
    directory: Arc<dyn IdentityStore>,
}

impl PaymentProcessor {
    pub fn new(queue: Arc<dyn QueueStore>, directory: Arc<dyn IdentityStore>) -> Self {
        Self { queue, directory }
    }

    /// Completes an entry and assembles its receipt.
    ///
    /// This is the sole completion path: there is no separate "mark as
    /// processing" step, so an entry goes from active to `completed` in one
    /// transition stamped with the accountant and completion time.
    pub async fn process(&self, entry_id: Uuid, accountant_id: Uuid) -> CoreResult<Receipt> {
        let entry = self.require_entry(entry_id).await?;

        let now = Utc::now();
        let completed = self
            .queue
            .complete_entry(entry_id, accountant_id, now)
            .await?
            .ok_or_else(|| already_terminal(&entry))?;

        let student = self
            .directory
            .student_by_id(completed.student_id)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound(format!("Student {} not found", completed.student_id))
            })?;
        let counter = self
            .directory
            .counter_by_id(completed.counter_id)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound(format!("Counter {} not found", completed.counter_id))
            })?;
        let fee_type = self
            .directory
            .fee_type_by_id(completed.fee_type_id)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound(format!("Fee type {} not found", completed.fee_type_id))
            })?;

        // Accountants without a staff profile (e.g. the bootstrap account)
        // fall back to their login email on the receipt.
        let accountant_name = match self.directory.accountant_by_user(accountant_id).await? {
            Some(profile) => profile.full_name,
            None => self
                .directory
                .account_by_id(accountant_id)
                .await?
                .map(|account| account.email)
                .ok_or_else(|| {
                    CoreError::NotFound(format!("Accountant {} not found", accountant_id))
                })?,
        };

        Ok(Receipt {
            receipt_number: token::receipt_number(),
            payment_id: completed.id,
            token_number: completed.token_number,
            student_name: student.full_name,
            student_roll: student.roll_number,
            counter_name: counter.counter_name,
            counter_number: counter.counter_number,
            accountant_name,
            fee_type: fee_type.type_name,
            amount: completed.amount,
            description: completed.description,
            completed_at: now,
        })
    }

    /// Moves an active entry to the back of its counter's queue and returns
    /// its new effective rank (last among active).
    ///
    /// The new sequence number is drawn from the counter's serialized
    /// sequence, so it lands behind every assigned number even when an
    /// admission is racing this skip.
    pub async fn skip(&self, entry_id: Uuid) -> CoreResult<i64> {
        let entry = self.require_entry(entry_id).await?;
        if !entry.status.is_active() {
            return Err(already_terminal(&entry));
        }

        let sequence = self.queue.next_sequence(entry.counter_id).await?;
        let moved = self
            .queue
            .reassign_sequence(entry_id, sequence)
            .await?
            .ok_or_else(|| already_terminal(&entry))?;

        let before = self
            .queue
            .count_active_before(moved.counter_id, moved.sequence)
            .await?;
        Ok(before + 1)
    }

    /// Marks an active entry as removed, recording the reason and removal
    /// time. Other entries keep their sequence numbers; ranks shift on the
    /// next read.
    pub async fn remove(&self, entry_id: Uuid, reason: &str) -> CoreResult<QueueEntry> {
        let entry = self.require_entry(entry_id).await?;
        if !entry.status.is_active() {
            return Err(already_terminal(&entry));
        }

        self.queue
            .remove_entry(entry_id, reason, Utc::now())
            .await?
            .ok_or_else(|| already_terminal(&entry))
    }

    async fn require_entry(&self, entry_id: Uuid) -> CoreResult<QueueEntry> {
        self.queue
            .entry_by_id(entry_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Payment {} not found", entry_id)))
    }
}

// The pre-read status may still be active when the conditional transition
// found nothing to update: the entry was claimed between the read and the
// write. Report that distinctly from a genuinely terminal entry.
fn already_terminal(entry: &QueueEntry) -> CoreError {
    if entry.status.is_active() {
        CoreError::InvalidState(format!("Payment {} was claimed concurrently", entry.id))
    } else {
        CoreError::InvalidState(format!("Payment {} is already {}", entry.id, entry.status))
    }
}
