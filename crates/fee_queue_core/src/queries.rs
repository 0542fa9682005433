//! crates/fee_queue_core/src/queries.rs
//!
//! Read-only projections over the queue: the accountant's counter view, the
//! student's own history, and per-counter day stats. No mutation happens here.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveTime, Utc};
use uuid::Uuid;

use crate::domain::{CounterQueueItem, CounterStats, StudentPaymentItem};
use crate::error::{CoreError, CoreResult};
use crate::ports::{IdentityStore, QueueStore};

#[derive(Clone)]
pub struct QueueQueries {
    queue: Arc<dyn QueueStore>,
    directory: Arc<dyn IdentityStore>,
}

impl QueueQueries {
    pub fn new(queue: Arc<dyn QueueStore>, directory: Arc<dyn IdentityStore>) -> Self {
        Self { queue, directory }
    }

    /// All active entries at a counter in serving order, each annotated with
    /// its effective rank. Since the rows arrive ordered by sequence number,
    /// the rank is the 1-based position in the list.
    pub async fn queue_for_counter(&self, counter_id: Uuid) -> CoreResult<Vec<CounterQueueItem>> {
        self.require_counter(counter_id).await?;

        let rows = self.queue.active_queue_rows(counter_id).await?;
        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(idx, row)| CounterQueueItem {
                entry: row.entry,
                student_name: row.student_name,
                student_roll: row.student_roll,
                fee_type: row.fee_type,
                rank: idx as i64 + 1,
            })
            .collect())
    }

    /// All of a student's payment requests, newest first. Active entries are
    /// annotated with their current effective rank at their counter.
    pub async fn queue_for_student(&self, student_id: Uuid) -> CoreResult<Vec<StudentPaymentItem>> {
        let rows = self.queue.student_payment_rows(student_id).await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let rank = if row.entry.status.is_active() {
                let before = self
                    .queue
                    .count_active_before(row.entry.counter_id, row.entry.sequence)
                    .await?;
                Some(before + 1)
            } else {
                None
            };
            items.push(StudentPaymentItem {
                entry: row.entry,
                counter_name: row.counter_name,
                counter_number: row.counter_number,
                fee_type: row.fee_type,
                processed_by: row.processed_by,
                rank,
            });
        }
        Ok(items)
    }

    /// Queue length plus completions and revenue since local midnight. "Today"
    /// is the calendar day in the server's local timezone.
    pub async fn stats_for_counter(&self, counter_id: Uuid) -> CoreResult<CounterStats> {
        self.require_counter(counter_id).await?;

        let queue_count = self.queue.count_active(counter_id).await?;
        let totals = self
            .queue
            .completed_since(counter_id, start_of_local_day())
            .await?;

        Ok(CounterStats {
            queue_count,
            processed_today: totals.count,
            revenue_today: totals.revenue,
        })
    }

    async fn require_counter(&self, counter_id: Uuid) -> CoreResult<()> {
        self.directory
            .counter_by_id(counter_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Counter {} not found", counter_id)))?;
        Ok(())
    }
}

/// Midnight of the current local calendar day, as a UTC instant. When a DST
/// gap swallows local midnight, the same wall-clock time read as UTC is used.
fn start_of_local_day() -> DateTime<Utc> {
    let midnight = Local::now().date_naive().and_time(NaiveTime::MIN);
    midnight
        .and_local_timezone(Local)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| DateTime::from_naive_utc_and_offset(midnight, Utc))
}
