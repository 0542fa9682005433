//! crates/fee_queue_core/src/ports.rs
//!
//! Defines the storage contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of the concrete database.
//!
//! Lookups return `Option` rather than an error so each caller can decide
//! whether an absent row is `NotFound`, `InvalidCredentials`, or a race it
//! must report as `InvalidState`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Account, AccountantProfile, CompletedTotals, Counter, CounterQueueRow, FeeType, NewQueueEntry,
    NewStudent, QueueEntry, StudentPaymentRow, StudentProfile,
};
use crate::error::CoreResult;

//=========================================================================================
// Queue Storage Port
//=========================================================================================

#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Draws the next value from the counter's serialized sequence. Concurrent
    /// callers must always receive distinct, strictly increasing values.
    async fn next_sequence(&self, counter_id: Uuid) -> CoreResult<i64>;

    async fn insert_entry(&self, new: NewQueueEntry) -> CoreResult<QueueEntry>;

    async fn entry_by_id(&self, id: Uuid) -> CoreResult<Option<QueueEntry>>;

    /// Active entries at a counter, ordered by sequence number ascending.
    async fn active_entries(&self, counter_id: Uuid) -> CoreResult<Vec<QueueEntry>>;

    /// Same ordering as `active_entries`, joined with student and fee type
    /// display fields.
    async fn active_queue_rows(&self, counter_id: Uuid) -> CoreResult<Vec<CounterQueueRow>>;

    /// All of a student's entries (any status), newest first, joined with
    /// counter and fee type display fields.
    async fn student_payment_rows(&self, student_id: Uuid) -> CoreResult<Vec<StudentPaymentRow>>;

    /// Count of active entries at a counter with a sequence number strictly
    /// smaller than `sequence`.
    async fn count_active_before(&self, counter_id: Uuid, sequence: i64) -> CoreResult<i64>;

    async fn count_active(&self, counter_id: Uuid) -> CoreResult<i64>;

    /// Transitions an entry to `completed` iff it is still active. Returns the
    /// updated entry, or `None` when the entry is absent or already terminal.
    async fn complete_entry(
        &self,
        id: Uuid,
        accountant_id: Uuid,
        at: DateTime<Utc>,
    ) -> CoreResult<Option<QueueEntry>>;

    /// Rewrites an entry's sequence number iff it is still active.
    async fn reassign_sequence(&self, id: Uuid, sequence: i64) -> CoreResult<Option<QueueEntry>>;

    /// Transitions an entry to `removed` iff it is still active.
    async fn remove_entry(
        &self,
        id: Uuid,
        reason: &str,
        at: DateTime<Utc>,
    ) -> CoreResult<Option<QueueEntry>>;

    /// Count and amount sum of entries at a counter completed at or after
    /// `since`.
    async fn completed_since(
        &self,
        counter_id: Uuid,
        since: DateTime<Utc>,
    ) -> CoreResult<CompletedTotals>;
}

//=========================================================================================
// Identity Storage Port
//=========================================================================================

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn account_by_id(&self, id: Uuid) -> CoreResult<Option<Account>>;

    async fn account_by_email(&self, email: &str) -> CoreResult<Option<Account>>;

    async fn account_by_roll_number(&self, roll_number: &str) -> CoreResult<Option<Account>>;

    /// Creates the account row and its student profile together. Fails with
    /// `Validation` when the email or roll number is already taken.
    async fn create_student(&self, new: NewStudent) -> CoreResult<Account>;

    async fn student_by_user(&self, user_id: Uuid) -> CoreResult<Option<StudentProfile>>;

    async fn student_by_id(&self, id: Uuid) -> CoreResult<Option<StudentProfile>>;

    async fn accountant_by_user(&self, user_id: Uuid) -> CoreResult<Option<AccountantProfile>>;

    async fn counter_by_id(&self, id: Uuid) -> CoreResult<Option<Counter>>;

    async fn fee_type_by_id(&self, id: Uuid) -> CoreResult<Option<FeeType>>;
}
