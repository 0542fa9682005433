//! services/api/src/web/queue.rs
//!
//! Accountant-facing endpoints: processing a payment, skipping or removing a
//! queue entry, and the per-counter queue and stats views.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use fee_queue_core::domain::{CounterQueueItem, CounterStats, Receipt, Role};

use crate::error::ApiError;
use crate::web::credential::AuthUser;
use crate::web::middleware::require_role;
use crate::web::rest::Ack;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPaymentRequest {
    pub queue_id: Uuid,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkipRequest {
    pub queue_id: Uuid,
    /// Carried by the client alongside the entry id; the entry already knows
    /// its counter, so this field is informational.
    pub counter_id: Option<Uuid>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoveRequest {
    pub queue_id: Uuid,
    pub counter_id: Option<Uuid>,
    /// Why the entry is removed: absent, incorrect, duplicate, other, or free
    /// text. Recorded verbatim.
    pub reason: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptDto {
    pub receipt_number: String,
    pub payment_id: Uuid,
    pub token_number: String,
    pub student_name: String,
    pub roll_number: String,
    pub counter_name: String,
    pub counter_number: i32,
    pub accountant_name: String,
    pub fee_type: String,
    pub amount: i64,
    pub description: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl From<Receipt> for ReceiptDto {
    fn from(receipt: Receipt) -> Self {
        Self {
            receipt_number: receipt.receipt_number,
            payment_id: receipt.payment_id,
            token_number: receipt.token_number,
            student_name: receipt.student_name,
            roll_number: receipt.student_roll,
            counter_name: receipt.counter_name,
            counter_number: receipt.counter_number,
            accountant_name: receipt.accountant_name,
            fee_type: receipt.fee_type,
            amount: receipt.amount,
            description: receipt.description,
            completed_at: receipt.completed_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CounterQueueDto {
    pub queue_id: Uuid,
    pub token_number: String,
    pub student_name: String,
    pub roll_number: String,
    pub fee_type: String,
    pub amount: i64,
    pub description: Option<String>,
    pub status: String,
    pub rank: i64,
    pub created_at: DateTime<Utc>,
}

impl From<CounterQueueItem> for CounterQueueDto {
    fn from(item: CounterQueueItem) -> Self {
        Self {
            queue_id: item.entry.id,
            token_number: item.entry.token_number,
            student_name: item.student_name,
            roll_number: item.student_roll,
            fee_type: item.fee_type,
            amount: item.entry.amount,
            description: item.entry.description,
            status: item.entry.status.to_string(),
            rank: item.rank,
            created_at: item.entry.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CounterStatsDto {
    pub queue_count: i64,
    pub processed_today: i64,
    pub revenue_today: i64,
}

impl From<CounterStats> for CounterStatsDto {
    fn from(stats: CounterStats) -> Self {
        Self {
            queue_count: stats.queue_count,
            processed_today: stats.processed_today,
            revenue_today: stats.revenue_today,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /payments/process - Complete a payment and get its receipt
#[utoipa::path(
    post,
    path = "/payments/process",
    request_body = ProcessPaymentRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Payment completed", body = ReceiptDto),
        (status = 400, description = "Unknown payment"),
        (status = 403, description = "Caller is not an accountant"),
        (status = 409, description = "Payment is already completed or removed")
    )
)]
pub async fn process_payment_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<ProcessPaymentRequest>,
) -> Result<Json<ReceiptDto>, ApiError> {
    require_role(&auth, Role::Accountant)?;

    let receipt = state.processor.process(req.queue_id, auth.user_id).await?;
    info!(
        receipt = %receipt.receipt_number,
        token = %receipt.token_number,
        "payment processed"
    );
    Ok(Json(ReceiptDto::from(receipt)))
}

/// POST /queue/skip - Move an entry to the back of its counter's queue
#[utoipa::path(
    post,
    path = "/queue/skip",
    request_body = SkipRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Entry moved to the end of the queue", body = Ack),
        (status = 400, description = "Unknown payment"),
        (status = 403, description = "Caller is not an accountant"),
        (status = 409, description = "Payment is already completed or removed")
    )
)]
pub async fn skip_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<SkipRequest>,
) -> Result<Json<Ack>, ApiError> {
    require_role(&auth, Role::Accountant)?;

    let new_rank = state.processor.skip(req.queue_id).await?;
    info!(queue_id = %req.queue_id, new_rank, "queue entry skipped");
    Ok(Json(Ack {
        success: true,
        message: "Student moved to end of queue".to_string(),
    }))
}

/// POST /queue/remove - Remove an entry from its counter's queue
#[utoipa::path(
    post,
    path = "/queue/remove",
    request_body = RemoveRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Entry removed from the queue", body = Ack),
        (status = 400, description = "Unknown payment"),
        (status = 403, description = "Caller is not an accountant"),
        (status = 409, description = "Payment is already completed or removed")
    )
)]
pub async fn remove_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<RemoveRequest>,
) -> Result<Json<Ack>, ApiError> {
    require_role(&auth, Role::Accountant)?;

    state.processor.remove(req.queue_id, &req.reason).await?;
    info!(queue_id = %req.queue_id, reason = %req.reason, "queue entry removed");
    Ok(Json(Ack {
        success: true,
        message: "Student removed from queue".to_string(),
    }))
}

/// GET /queue/counter/{id} - A counter's active queue in serving order
#[utoipa::path(
    get,
    path = "/queue/counter/{id}",
    params(("id" = Uuid, Path, description = "Counter id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Active entries with effective ranks", body = [CounterQueueDto]),
        (status = 400, description = "Unknown counter"),
        (status = 403, description = "Caller is not an accountant")
    )
)]
pub async fn counter_queue_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(counter_id): Path<Uuid>,
) -> Result<Json<Vec<CounterQueueDto>>, ApiError> {
    require_role(&auth, Role::Accountant)?;

    let items = state.queries.queue_for_counter(counter_id).await?;
    Ok(Json(items.into_iter().map(CounterQueueDto::from).collect()))
}

/// GET /queue/stats/{id} - A counter's queue length and today's totals
#[utoipa::path(
    get,
    path = "/queue/stats/{id}",
    params(("id" = Uuid, Path, description = "Counter id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Counter statistics", body = CounterStatsDto),
        (status = 400, description = "Unknown counter"),
        (status = 403, description = "Caller is not an accountant")
    )
)]
pub async fn counter_stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(counter_id): Path<Uuid>,
) -> Result<Json<CounterStatsDto>, ApiError> {
    require_role(&auth, Role::Accountant)?;

    let stats = state.queries.stats_for_counter(counter_id).await?;
    Ok(Json(CounterStatsDto::from(stats)))
}
