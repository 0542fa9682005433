//! In-memory implementation of both storage ports, used by the integration
//! tests. Mirrors the relational layout: maps keyed by id plus a per-counter
//! sequence counter, all behind one mutex (never held across an await).

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use fee_queue_core::domain::{
    Account, AccountantProfile, CompletedTotals, Counter, CounterQueueRow, EntryStatus, FeeType,
    NewQueueEntry, NewStudent, QueueEntry, Role, StudentPaymentRow, StudentProfile,
};
use fee_queue_core::error::{CoreError, CoreResult};
use fee_queue_core::ports::{IdentityStore, QueueStore};

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    accounts: HashMap<Uuid, Account>,
    students: HashMap<Uuid, StudentProfile>,
    accountants: HashMap<Uuid, AccountantProfile>,
    counters: HashMap<Uuid, Counter>,
    fee_types: HashMap<Uuid, FeeType>,
    entries: HashMap<Uuid, QueueEntry>,
    sequences: HashMap<Uuid, i64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_counter(&self, counter_number: i32, counter_name: &str) -> Uuid {
        let id = Uuid::new_v4();
        let mut inner = self.inner.lock().unwrap();
        inner.counters.insert(
            id,
            Counter {
                id,
                counter_number,
                counter_name: counter_name.to_string(),
                fee_types: Vec::new(),
                assigned_accountant_id: None,
                active: true,
            },
        );
        id
    }

    pub fn seed_fee_type(&self, type_name: &str) -> Uuid {
        let id = Uuid::new_v4();
        let mut inner = self.inner.lock().unwrap();
        inner.fee_types.insert(
            id,
            FeeType {
                id,
                type_name: type_name.to_string(),
            },
        );
        id
    }

    /// Seeds a student account plus profile; returns (user id, student id).
    pub fn seed_student(&self, full_name: &str, roll_number: &str) -> (Uuid, Uuid) {
        let user_id = Uuid::new_v4();
        let student_id = Uuid::new_v4();
        let mut inner = self.inner.lock().unwrap();
        inner.accounts.insert(
            user_id,
            Account {
                id: user_id,
                email: format!("{}@college.test", roll_number),
                roll_number: Some(roll_number.to_string()),
                password_hash: String::new(),
                role: Role::Student,
                active: true,
                created_at: Utc::now(),
            },
        );
        inner.students.insert(
            student_id,
            StudentProfile {
                id: student_id,
                user_id,
                full_name: full_name.to_string(),
                roll_number: roll_number.to_string(),
                college_email: format!("{}@college.test", roll_number),
                phone_number: "0000000000".to_string(),
                year: 1,
                branch: "CSE".to_string(),
            },
        );
        (user_id, student_id)
    }

    /// Seeds an accountant account plus profile; returns the user id.
    pub fn seed_accountant(&self, full_name: &str, staff_id: &str, counter: Option<Uuid>) -> Uuid {
        let user_id = Uuid::new_v4();
        let mut inner = self.inner.lock().unwrap();
        inner.accounts.insert(
            user_id,
            Account {
                id: user_id,
                email: format!("{}@college.test", staff_id),
                roll_number: None,
                password_hash: String::new(),
                role: Role::Accountant,
                active: true,
                created_at: Utc::now(),
            },
        );
        inner.accountants.insert(
            user_id,
            AccountantProfile {
                id: Uuid::new_v4(),
                user_id,
                full_name: full_name.to_string(),
                staff_id: staff_id.to_string(),
                assigned_counter_id: counter,
            },
        );
        user_id
    }
}

#[async_trait]
impl QueueStore for MemoryStore {
    async fn next_sequence(&self, counter_id: Uuid) -> CoreResult<i64> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.counters.contains_key(&counter_id) {
            return Err(CoreError::NotFound(format!(
                "Counter {} not found",
                counter_id
            )));
        }
        let seq = inner.sequences.entry(counter_id).or_insert(0);
        *seq += 1;
        Ok(*seq)
    }

    async fn insert_entry(&self, new: NewQueueEntry) -> CoreResult<QueueEntry> {
        let entry = QueueEntry {
            id: Uuid::new_v4(),
            student_id: new.student_id,
            counter_id: new.counter_id,
            fee_type_id: new.fee_type_id,
            amount: new.amount,
            description: new.description,
            token_number: new.token_number,
            sequence: new.sequence,
            status: EntryStatus::Pending,
            assigned_to: None,
            removal_reason: None,
            created_at: Utc::now(),
            completed_at: None,
            removed_at: None,
        };
        let mut inner = self.inner.lock().unwrap();
        inner.entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn entry_by_id(&self, id: Uuid) -> CoreResult<Option<QueueEntry>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.entries.get(&id).cloned())
    }

    async fn active_entries(&self, counter_id: Uuid) -> CoreResult<Vec<QueueEntry>> {
        let inner = self.inner.lock().unwrap();
        let mut active: Vec<QueueEntry> = inner
            .entries
            .values()
            .filter(|e| e.counter_id == counter_id && e.status.is_active())
            .cloned()
            .collect();
        active.sort_by_key(|e| e.sequence);
        Ok(active)
    }

    async fn active_queue_rows(&self, counter_id: Uuid) -> CoreResult<Vec<CounterQueueRow>> {
        let entries = self.active_entries(counter_id).await?;
        let inner = self.inner.lock().unwrap();
        entries
            .into_iter()
            .map(|entry| {
                let student = inner
                    .students
                    .get(&entry.student_id)
                    .ok_or_else(|| CoreError::Storage("dangling student id".to_string()))?;
                let fee_type = inner
                    .fee_types
                    .get(&entry.fee_type_id)
                    .ok_or_else(|| CoreError::Storage("dangling fee type id".to_string()))?;
                Ok(CounterQueueRow {
                    student_name: student.full_name.clone(),
                    student_roll: student.roll_number.clone(),
                    fee_type: fee_type.type_name.clone(),
                    entry,
                })
            })
            .collect()
    }

    async fn student_payment_rows(&self, student_id: Uuid) -> CoreResult<Vec<StudentPaymentRow>> {
        let inner = self.inner.lock().unwrap();
        let mut entries: Vec<QueueEntry> = inner
            .entries
            .values()
            .filter(|e| e.student_id == student_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.sequence.cmp(&a.sequence)));

        entries
            .into_iter()
            .map(|entry| {
                let counter = inner
                    .counters
                    .get(&entry.counter_id)
                    .ok_or_else(|| CoreError::Storage("dangling counter id".to_string()))?;
                let fee_type = inner
                    .fee_types
                    .get(&entry.fee_type_id)
                    .ok_or_else(|| CoreError::Storage("dangling fee type id".to_string()))?;
                let processed_by = entry
                    .assigned_to
                    .and_then(|uid| inner.accountants.get(&uid))
                    .map(|p| p.full_name.clone());
                Ok(StudentPaymentRow {
                    counter_name: counter.counter_name.clone(),
                    counter_number: counter.counter_number,
                    fee_type: fee_type.type_name.clone(),
                    processed_by,
                    entry,
                })
            })
            .collect()
    }

    async fn count_active_before(&self, counter_id: Uuid, sequence: i64) -> CoreResult<i64> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .entries
            .values()
            .filter(|e| {
                e.counter_id == counter_id && e.status.is_active() && e.sequence < sequence
            })
            .count() as i64)
    }

    async fn count_active(&self, counter_id: Uuid) -> CoreResult<i64> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .entries
            .values()
            .filter(|e| e.counter_id == counter_id && e.status.is_active())
            .count() as i64)
    }

    async fn complete_entry(
        &self,
        id: Uuid,
        accountant_id: Uuid,
        at: DateTime<Utc>,
    ) -> CoreResult<Option<QueueEntry>> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner.entries.get_mut(&id).and_then(|entry| {
            if !entry.status.is_active() {
                return None;
            }
            entry.status = EntryStatus::Completed;
            entry.assigned_to = Some(accountant_id);
            entry.completed_at = Some(at);
            Some(entry.clone())
        }))
    }

    async fn reassign_sequence(&self, id: Uuid, sequence: i64) -> CoreResult<Option<QueueEntry>> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner.entries.get_mut(&id).and_then(|entry| {
            if !entry.status.is_active() {
                return None;
            }
            entry.sequence = sequence;
            Some(entry.clone())
        }))
    }

    async fn remove_entry(
        &self,
        id: Uuid,
        reason: &str,
        at: DateTime<Utc>,
    ) -> CoreResult<Option<QueueEntry>> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner.entries.get_mut(&id).and_then(|entry| {
            if !entry.status.is_active() {
                return None;
            }
            entry.status = EntryStatus::Removed;
            entry.removal_reason = Some(reason.to_string());
            entry.removed_at = Some(at);
            Some(entry.clone())
        }))
    }

    async fn completed_since(
        &self,
        counter_id: Uuid,
        since: DateTime<Utc>,
    ) -> CoreResult<CompletedTotals> {
        let inner = self.inner.lock().unwrap();
        let mut totals = CompletedTotals::default();
        for entry in inner.entries.values() {
            if entry.counter_id == counter_id
                && entry.status == EntryStatus::Completed
                && entry.completed_at.is_some_and(|t| t >= since)
            {
                totals.count += 1;
                totals.revenue += entry.amount;
            }
        }
        Ok(totals)
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn account_by_id(&self, id: Uuid) -> CoreResult<Option<Account>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.accounts.get(&id).cloned())
    }

    async fn account_by_email(&self, email: &str) -> CoreResult<Option<Account>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.accounts.values().find(|a| a.email == email).cloned())
    }

    async fn account_by_roll_number(&self, roll_number: &str) -> CoreResult<Option<Account>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .accounts
            .values()
            .find(|a| a.roll_number.as_deref() == Some(roll_number))
            .cloned())
    }

    async fn create_student(&self, new: NewStudent) -> CoreResult<Account> {
        let mut inner = self.inner.lock().unwrap();
        let taken = inner.accounts.values().any(|a| {
            a.email == new.college_email || a.roll_number.as_deref() == Some(&new.roll_number)
        });
        if taken {
            return Err(CoreError::Validation(
                "Email or Roll Number already exists".to_string(),
            ));
        }

        let account = Account {
            id: Uuid::new_v4(),
            email: new.college_email.clone(),
            roll_number: Some(new.roll_number.clone()),
            password_hash: new.password_hash,
            role: Role::Student,
            active: true,
            created_at: Utc::now(),
        };
        inner.accounts.insert(account.id, account.clone());
        let student_id = Uuid::new_v4();
        inner.students.insert(
            student_id,
            StudentProfile {
                id: student_id,
                user_id: account.id,
                full_name: new.full_name,
                roll_number: new.roll_number,
                college_email: new.college_email,
                phone_number: new.phone_number,
                year: new.year,
                branch: new.branch,
            },
        );
        Ok(account)
    }

    async fn student_by_user(&self, user_id: Uuid) -> CoreResult<Option<StudentProfile>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .students
            .values()
            .find(|s| s.user_id == user_id)
            .cloned())
    }

    async fn student_by_id(&self, id: Uuid) -> CoreResult<Option<StudentProfile>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.students.get(&id).cloned())
    }

    async fn accountant_by_user(&self, user_id: Uuid) -> CoreResult<Option<AccountantProfile>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.accountants.get(&user_id).cloned())
    }

    async fn counter_by_id(&self, id: Uuid) -> CoreResult<Option<Counter>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.counters.get(&id).cloned())
    }

    async fn fee_type_by_id(&self, id: Uuid) -> CoreResult<Option<FeeType>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.fee_types.get(&id).cloned())
    }
}
