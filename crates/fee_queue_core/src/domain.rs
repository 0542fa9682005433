//! crates/fee_queue_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Role of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Admin,
    Accountant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Admin => "admin",
            Role::Accountant => "accountant",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "student" => Some(Role::Student),
            "admin" => Some(Role::Admin),
            "accountant" => Some(Role::Accountant),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a queue entry. `Pending` and `Processing` entries are
/// "active" and participate in ranking; `Completed` and `Removed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Pending,
    Processing,
    Completed,
    Removed,
}

impl EntryStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, EntryStatus::Pending | EntryStatus::Processing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Pending => "pending",
            EntryStatus::Processing => "processing",
            EntryStatus::Completed => "completed",
            EntryStatus::Removed => "removed",
        }
    }

    pub fn parse(s: &str) -> Option<EntryStatus> {
        match s {
            "pending" => Some(EntryStatus::Pending),
            "processing" => Some(EntryStatus::Processing),
            "completed" => Some(EntryStatus::Completed),
            "removed" => Some(EntryStatus::Removed),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Represents a user account - used throughout the app
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub roll_number: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// 1:1 extension record for student accounts. `id` is the student id that
/// queue entries reference, not the account id.
#[derive(Debug, Clone)]
pub struct StudentProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub roll_number: String,
    pub college_email: String,
    pub phone_number: String,
    pub year: i32,
    pub branch: String,
}

/// 1:1 extension record for accountant accounts.
#[derive(Debug, Clone)]
pub struct AccountantProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub staff_id: String,
    pub assigned_counter_id: Option<Uuid>,
}

/// A payment-processing station staffed by one accountant.
///
/// `fee_types` is advisory only and never checked against the fee type of an
/// admitted entry.
#[derive(Debug, Clone)]
pub struct Counter {
    pub id: Uuid,
    pub counter_number: i32,
    pub counter_name: String,
    pub fee_types: Vec<Uuid>,
    pub assigned_accountant_id: Option<Uuid>,
    pub active: bool,
}

/// A fee category students can pay against.
#[derive(Debug, Clone)]
pub struct FeeType {
    pub id: Uuid,
    pub type_name: String,
}

/// One admitted payment request.
///
/// `sequence` is the per-counter sequence number assigned at admission
/// (persisted as `queue_position`). It is rewritten only by a skip, which
/// moves the entry behind every other active entry. The displayed position is
/// the effective rank, computed on read.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub id: Uuid,
    pub student_id: Uuid,
    pub counter_id: Uuid,
    pub fee_type_id: Uuid,
    pub amount: i64,
    pub description: Option<String>,
    pub token_number: String,
    pub sequence: i64,
    pub status: EntryStatus,
    pub assigned_to: Option<Uuid>,
    pub removal_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

/// Insert payload for a new queue entry. Status is always `pending` at
/// admission, so it is not a field here.
#[derive(Debug, Clone)]
pub struct NewQueueEntry {
    pub student_id: Uuid,
    pub counter_id: Uuid,
    pub fee_type_id: Uuid,
    pub amount: i64,
    pub description: Option<String>,
    pub token_number: String,
    pub sequence: i64,
}

/// Registration payload for a new student account plus its profile.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub full_name: String,
    pub roll_number: String,
    pub college_email: String,
    pub phone_number: String,
    pub year: i32,
    pub branch: String,
    pub password_hash: String,
}

/// An active entry in a counter's queue, joined with the display fields the
/// accountant view needs.
#[derive(Debug, Clone)]
pub struct CounterQueueRow {
    pub entry: QueueEntry,
    pub student_name: String,
    pub student_roll: String,
    pub fee_type: String,
}

/// A `CounterQueueRow` annotated with its effective rank.
#[derive(Debug, Clone)]
pub struct CounterQueueItem {
    pub entry: QueueEntry,
    pub student_name: String,
    pub student_roll: String,
    pub fee_type: String,
    pub rank: i64,
}

/// One of a student's payment requests (any status), joined with the display
/// fields the student view needs.
#[derive(Debug, Clone)]
pub struct StudentPaymentRow {
    pub entry: QueueEntry,
    pub counter_name: String,
    pub counter_number: i32,
    pub fee_type: String,
    pub processed_by: Option<String>,
}

/// A `StudentPaymentRow` annotated with an effective rank when the entry is
/// still active.
#[derive(Debug, Clone)]
pub struct StudentPaymentItem {
    pub entry: QueueEntry,
    pub counter_name: String,
    pub counter_number: i32,
    pub fee_type: String,
    pub processed_by: Option<String>,
    pub rank: Option<i64>,
}

/// Read-only summary produced by a successful process. Not a persisted entity
/// distinct from the queue entry.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub receipt_number: String,
    pub payment_id: Uuid,
    pub token_number: String,
    pub student_name: String,
    pub student_roll: String,
    pub counter_name: String,
    pub counter_number: i32,
    pub accountant_name: String,
    pub fee_type: String,
    pub amount: i64,
    pub description: Option<String>,
    pub completed_at: DateTime<Utc>,
}

/// Aggregate view of one counter's day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterStats {
    pub queue_count: i64,
    pub processed_today: i64,
    pub revenue_today: i64,
}

/// Count and amount sum of completed entries since some instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletedTotals {
    pub count: i64,
    pub revenue: i64,
}
