//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete
//! implementation of the `QueueStore` and `IdentityStore` ports from the
//! `core` crate. It handles all interactions with the PostgreSQL database
//! using `sqlx`.
//!
//! The two serialization-sensitive operations are `next_sequence` (a single
//! `UPDATE ... RETURNING` on the counter row, so concurrent admissions always
//! draw distinct, strictly increasing values) and the three status
//! transitions, which are conditional single-row updates guarded on an active
//! prior status.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use fee_queue_core::domain::{
    Account, AccountantProfile, CompletedTotals, Counter, CounterQueueRow, EntryStatus, FeeType,
    NewQueueEntry, NewStudent, QueueEntry, Role, StudentPaymentRow, StudentProfile,
};
use fee_queue_core::error::{CoreError, CoreResult};
use fee_queue_core::ports::{IdentityStore, QueueStore};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements both storage ports.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn storage(e: sqlx::Error) -> CoreError {
    CoreError::Storage(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    roll_number: Option<String>,
    password_hash: String,
    role: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl UserRecord {
    fn to_domain(self) -> CoreResult<Account> {
        let role = Role::parse(&self.role)
            .ok_or_else(|| CoreError::Storage(format!("unknown role '{}'", self.role)))?;
        Ok(Account {
            id: self.id,
            email: self.email,
            roll_number: self.roll_number,
            password_hash: self.password_hash,
            role,
            active: self.is_active,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct StudentRecord {
    id: Uuid,
    user_id: Uuid,
    full_name: String,
    roll_number: String,
    college_email: String,
    phone_number: String,
    year: i32,
    branch: String,
}

impl StudentRecord {
    fn to_domain(self) -> StudentProfile {
        StudentProfile {
            id: self.id,
            user_id: self.user_id,
            full_name: self.full_name,
            roll_number: self.roll_number,
            college_email: self.college_email,
            phone_number: self.phone_number,
            year: self.year,
            branch: self.branch,
        }
    }
}

#[derive(FromRow)]
struct AccountantRecord {
    id: Uuid,
    user_id: Uuid,
    full_name: String,
    staff_id: String,
    assigned_counter_id: Option<Uuid>,
}

impl AccountantRecord {
    fn to_domain(self) -> AccountantProfile {
        AccountantProfile {
            id: self.id,
            user_id: self.user_id,
            full_name: self.full_name,
            staff_id: self.staff_id,
            assigned_counter_id: self.assigned_counter_id,
        }
    }
}

#[derive(FromRow)]
struct CounterRecord {
    id: Uuid,
    counter_number: i32,
    counter_name: String,
    fee_types: Vec<Uuid>,
    assigned_accountant_id: Option<Uuid>,
    is_active: bool,
}

impl CounterRecord {
    fn to_domain(self) -> Counter {
        Counter {
            id: self.id,
            counter_number: self.counter_number,
            counter_name: self.counter_name,
            fee_types: self.fee_types,
            assigned_accountant_id: self.assigned_accountant_id,
            active: self.is_active,
        }
    }
}

#[derive(FromRow)]
struct FeeTypeRecord {
    id: Uuid,
    type_name: String,
}

impl FeeTypeRecord {
    fn to_domain(self) -> FeeType {
        FeeType {
            id: self.id,
            type_name: self.type_name,
        }
    }
}

#[derive(FromRow)]
struct PaymentRecord {
    id: Uuid,
    student_id: Uuid,
    counter_id: Uuid,
    fee_type_id: Uuid,
    amount: i64,
    description: Option<String>,
    token_number: String,
    queue_position: i64,
    status: String,
    assigned_to: Option<Uuid>,
    removal_reason: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    removed_at: Option<DateTime<Utc>>,
}

impl PaymentRecord {
    fn to_domain(self) -> CoreResult<QueueEntry> {
        let status = EntryStatus::parse(&self.status)
            .ok_or_else(|| CoreError::Storage(format!("unknown status '{}'", self.status)))?;
        Ok(QueueEntry {
            id: self.id,
            student_id: self.student_id,
            counter_id: self.counter_id,
            fee_type_id: self.fee_type_id,
            amount: self.amount,
            description: self.description,
            token_number: self.token_number,
            sequence: self.queue_position,
            status,
            assigned_to: self.assigned_to,
            removal_reason: self.removal_reason,
            created_at: self.created_at,
            completed_at: self.completed_at,
            removed_at: self.removed_at,
        })
    }
}

#[derive(FromRow)]
struct CounterQueueRecord {
    #[sqlx(flatten)]
    payment: PaymentRecord,
    student_name: String,
    student_roll: String,
    fee_type: String,
}

impl CounterQueueRecord {
    fn to_domain(self) -> CoreResult<CounterQueueRow> {
        Ok(CounterQueueRow {
            entry: self.payment.to_domain()?,
            student_name: self.student_name,
            student_roll: self.student_roll,
            fee_type: self.fee_type,
        })
    }
}

#[derive(FromRow)]
struct StudentPaymentRecord {
    #[sqlx(flatten)]
    payment: PaymentRecord,
    counter_name: String,
    counter_number: i32,
    fee_type: String,
    processed_by: Option<String>,
}

impl StudentPaymentRecord {
    fn to_domain(self) -> CoreResult<StudentPaymentRow> {
        Ok(StudentPaymentRow {
            entry: self.payment.to_domain()?,
            counter_name: self.counter_name,
            counter_number: self.counter_number,
            fee_type: self.fee_type,
            processed_by: self.processed_by,
        })
    }
}

const PAYMENT_COLUMNS: &str = "id, student_id, counter_id, fee_type_id, amount, description, \
     token_number, queue_position, status, assigned_to, removal_reason, created_at, \
     completed_at, removed_at";

//=========================================================================================
// `QueueStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl QueueStore for PgStore {
    async fn next_sequence(&self, counter_id: Uuid) -> CoreResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "UPDATE counters SET next_seq = next_seq + 1 WHERE id = $1 RETURNING next_seq",
        )
        .bind(counter_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?
        .ok_or_else(|| CoreError::NotFound(format!("Counter {} not found", counter_id)))
    }

    async fn insert_entry(&self, new: NewQueueEntry) -> CoreResult<QueueEntry> {
        let sql = format!(
            "INSERT INTO payments \
             (id, student_id, counter_id, fee_type_id, amount, description, token_number, \
              queue_position, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending') \
             RETURNING {PAYMENT_COLUMNS}"
        );
        sqlx::query_as::<_, PaymentRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(new.student_id)
            .bind(new.counter_id)
            .bind(new.fee_type_id)
            .bind(new.amount)
            .bind(new.description)
            .bind(new.token_number)
            .bind(new.sequence)
            .fetch_one(&self.pool)
            .await
            .map_err(storage)?
            .to_domain()
    }

    async fn entry_by_id(&self, id: Uuid) -> CoreResult<Option<QueueEntry>> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1");
        sqlx::query_as::<_, PaymentRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?
            .map(PaymentRecord::to_domain)
            .transpose()
    }

    async fn active_entries(&self, counter_id: Uuid) -> CoreResult<Vec<QueueEntry>> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments \
             WHERE counter_id = $1 AND status IN ('pending', 'processing') \
             ORDER BY queue_position ASC"
        );
        sqlx::query_as::<_, PaymentRecord>(&sql)
            .bind(counter_id)
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?
            .into_iter()
            .map(PaymentRecord::to_domain)
            .collect()
    }

    async fn active_queue_rows(&self, counter_id: Uuid) -> CoreResult<Vec<CounterQueueRow>> {
        sqlx::query_as::<_, CounterQueueRecord>(
            "SELECT p.*, s.full_name AS student_name, s.roll_number AS student_roll, \
                    ft.type_name AS fee_type \
             FROM payments p \
             JOIN students s ON p.student_id = s.id \
             JOIN fee_types ft ON p.fee_type_id = ft.id \
             WHERE p.counter_id = $1 AND p.status IN ('pending', 'processing') \
             ORDER BY p.queue_position ASC",
        )
        .bind(counter_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?
        .into_iter()
        .map(CounterQueueRecord::to_domain)
        .collect()
    }

    async fn student_payment_rows(&self, student_id: Uuid) -> CoreResult<Vec<StudentPaymentRow>> {
        sqlx::query_as::<_, StudentPaymentRecord>(
            "SELECT p.*, c.counter_name, c.counter_number, ft.type_name AS fee_type, \
                    a.full_name AS processed_by \
             FROM payments p \
             JOIN counters c ON p.counter_id = c.id \
             JOIN fee_types ft ON p.fee_type_id = ft.id \
             LEFT JOIN accountants a ON p.assigned_to = a.user_id \
             WHERE p.student_id = $1 \
             ORDER BY p.created_at DESC, p.queue_position DESC",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?
        .into_iter()
        .map(StudentPaymentRecord::to_domain)
        .collect()
    }

    async fn count_active_before(&self, counter_id: Uuid, sequence: i64) -> CoreResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM payments \
             WHERE counter_id = $1 AND status IN ('pending', 'processing') \
               AND queue_position < $2",
        )
        .bind(counter_id)
        .bind(sequence)
        .fetch_one(&self.pool)
        .await
        .map_err(storage)
    }

    async fn count_active(&self, counter_id: Uuid) -> CoreResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM payments \
             WHERE counter_id = $1 AND status IN ('pending', 'processing')",
        )
        .bind(counter_id)
        .fetch_one(&self.pool)
        .await
        .map_err(storage)
    }

    async fn complete_entry(
        &self,
        id: Uuid,
        accountant_id: Uuid,
        at: DateTime<Utc>,
    ) -> CoreResult<Option<QueueEntry>> {
        let sql = format!(
            "UPDATE payments \
             SET status = 'completed', assigned_to = $2, completed_at = $3 \
             WHERE id = $1 AND status IN ('pending', 'processing') \
             RETURNING {PAYMENT_COLUMNS}"
        );
        sqlx::query_as::<_, PaymentRecord>(&sql)
            .bind(id)
            .bind(accountant_id)
            .bind(at)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?
            .map(PaymentRecord::to_domain)
            .transpose()
    }

    async fn reassign_sequence(&self, id: Uuid, sequence: i64) -> CoreResult<Option<QueueEntry>> {
        let sql = format!(
            "UPDATE payments SET queue_position = $2 \
             WHERE id = $1 AND status IN ('pending', 'processing') \
             RETURNING {PAYMENT_COLUMNS}"
        );
        sqlx::query_as::<_, PaymentRecord>(&sql)
            .bind(id)
            .bind(sequence)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?
            .map(PaymentRecord::to_domain)
            .transpose()
    }

    async fn remove_entry(
        &self,
        id: Uuid,
        reason: &str,
        at: DateTime<Utc>,
    ) -> CoreResult<Option<QueueEntry>> {
        let sql = format!(
            "UPDATE payments \
             SET status = 'removed', removal_reason = $2, removed_at = $3 \
             WHERE id = $1 AND status IN ('pending', 'processing') \
             RETURNING {PAYMENT_COLUMNS}"
        );
        sqlx::query_as::<_, PaymentRecord>(&sql)
            .bind(id)
            .bind(reason)
            .bind(at)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?
            .map(PaymentRecord::to_domain)
            .transpose()
    }

    async fn completed_since(
        &self,
        counter_id: Uuid,
        since: DateTime<Utc>,
    ) -> CoreResult<CompletedTotals> {
        let (count, revenue) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*), COALESCE(SUM(amount), 0)::BIGINT FROM payments \
             WHERE counter_id = $1 AND status = 'completed' AND completed_at >= $2",
        )
        .bind(counter_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(storage)?;
        Ok(CompletedTotals { count, revenue })
    }
}

//=========================================================================================
// `IdentityStore` Trait Implementation
//=========================================================================================

const USER_COLUMNS: &str = "id, email, roll_number, password_hash, role, is_active, created_at";

#[async_trait]
impl IdentityStore for PgStore {
    async fn account_by_id(&self, id: Uuid) -> CoreResult<Option<Account>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?
            .map(UserRecord::to_domain)
            .transpose()
    }

    async fn account_by_email(&self, email: &str) -> CoreResult<Option<Account>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?
            .map(UserRecord::to_domain)
            .transpose()
    }

    async fn account_by_roll_number(&self, roll_number: &str) -> CoreResult<Option<Account>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE roll_number = $1");
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(roll_number)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?
            .map(UserRecord::to_domain)
            .transpose()
    }

    async fn create_student(&self, new: NewStudent) -> CoreResult<Account> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let taken = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE email = $1 OR roll_number = $2",
        )
        .bind(&new.college_email)
        .bind(&new.roll_number)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage)?;
        if taken > 0 {
            return Err(duplicate_registration());
        }

        let sql = format!(
            "INSERT INTO users (id, email, roll_number, password_hash, role) \
             VALUES ($1, $2, $3, $4, 'student') \
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new.college_email)
            .bind(&new.roll_number)
            .bind(&new.password_hash)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_unique_violation)?;

        sqlx::query(
            "INSERT INTO students \
             (id, user_id, full_name, roll_number, college_email, phone_number, year, branch) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(Uuid::new_v4())
        .bind(user.id)
        .bind(&new.full_name)
        .bind(&new.roll_number)
        .bind(&new.college_email)
        .bind(&new.phone_number)
        .bind(new.year)
        .bind(&new.branch)
        .execute(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        tx.commit().await.map_err(storage)?;
        user.to_domain()
    }

    async fn student_by_user(&self, user_id: Uuid) -> CoreResult<Option<StudentProfile>> {
        sqlx::query_as::<_, StudentRecord>(
            "SELECT id, user_id, full_name, roll_number, college_email, phone_number, year, \
                    branch \
             FROM students WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)
        .map(|record| record.map(StudentRecord::to_domain))
    }

    async fn student_by_id(&self, id: Uuid) -> CoreResult<Option<StudentProfile>> {
        sqlx::query_as::<_, StudentRecord>(
            "SELECT id, user_id, full_name, roll_number, college_email, phone_number, year, \
                    branch \
             FROM students WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)
        .map(|record| record.map(StudentRecord::to_domain))
    }

    async fn accountant_by_user(&self, user_id: Uuid) -> CoreResult<Option<AccountantProfile>> {
        sqlx::query_as::<_, AccountantRecord>(
            "SELECT id, user_id, full_name, staff_id, assigned_counter_id \
             FROM accountants WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)
        .map(|record| record.map(AccountantRecord::to_domain))
    }

    async fn counter_by_id(&self, id: Uuid) -> CoreResult<Option<Counter>> {
        sqlx::query_as::<_, CounterRecord>(
            "SELECT id, counter_number, counter_name, fee_types, assigned_accountant_id, \
                    is_active \
             FROM counters WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)
        .map(|record| record.map(CounterRecord::to_domain))
    }

    async fn fee_type_by_id(&self, id: Uuid) -> CoreResult<Option<FeeType>> {
        sqlx::query_as::<_, FeeTypeRecord>("SELECT id, type_name FROM fee_types WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)
            .map(|record| record.map(FeeTypeRecord::to_domain))
    }
}

fn duplicate_registration() -> CoreError {
    CoreError::Validation("Email or Roll Number already exists".to_string())
}

// Two registrations can pass the pre-check together; the unique constraints
// make the loser surface the same validation error instead of a 500.
fn map_unique_violation(e: sqlx::Error) -> CoreError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => duplicate_registration(),
        _ => storage(e),
    }
}
