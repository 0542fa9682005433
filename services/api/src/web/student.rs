//! services/api/src/web/student.rs
//!
//! Student-facing endpoints: submitting a payment request and polling the
//! student's own queue view.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use fee_queue_core::domain::{Role, StudentPaymentItem};
use fee_queue_core::error::CoreError;

use crate::error::ApiError;
use crate::web::credential::AuthUser;
use crate::web::middleware::require_role;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(serde::Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub counter_id: Uuid,
    pub fee_type_id: Uuid,
    /// Amount in minor units; must be positive.
    pub amount: i64,
    pub description: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCreatedResponse {
    pub payment_id: Uuid,
    pub token_number: String,
    /// The per-counter sequence number; the live position is the rank shown
    /// in the queue views.
    pub queue_position: i64,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentPaymentDto {
    pub payment_id: Uuid,
    pub token_number: String,
    pub counter_name: String,
    pub counter_number: i32,
    pub fee_type: String,
    pub amount: i64,
    pub description: Option<String>,
    pub status: String,
    pub queue_position: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<StudentPaymentItem> for StudentPaymentDto {
    fn from(item: StudentPaymentItem) -> Self {
        Self {
            payment_id: item.entry.id,
            token_number: item.entry.token_number,
            counter_name: item.counter_name,
            counter_number: item.counter_number,
            fee_type: item.fee_type,
            amount: item.entry.amount,
            description: item.entry.description,
            status: item.entry.status.to_string(),
            queue_position: item.entry.sequence,
            rank: item.rank,
            processed_by: item.processed_by,
            created_at: item.entry.created_at,
            completed_at: item.entry.completed_at,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /student/payments - Admit a payment request into a counter's queue
#[utoipa::path(
    post,
    path = "/student/payments",
    request_body = CreatePaymentRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Payment request admitted", body = PaymentCreatedResponse),
        (status = 400, description = "Invalid amount or unknown counter/fee type"),
        (status = 401, description = "Missing or invalid credential"),
        (status = 403, description = "Caller is not a student")
    )
)]
pub async fn create_payment_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&auth, Role::Student)?;

    let student = state
        .identity
        .student_by_user(auth.user_id)
        .await?
        .ok_or_else(|| CoreError::NotFound("Student profile not found".to_string()))?;

    let entry = state
        .ledger
        .enqueue(
            student.id,
            req.counter_id,
            req.fee_type_id,
            req.amount,
            req.description,
        )
        .await?;

    info!(
        token = %entry.token_number,
        counter = %entry.counter_id,
        "payment request admitted"
    );
    Ok((
        StatusCode::CREATED,
        Json(PaymentCreatedResponse {
            payment_id: entry.id,
            token_number: entry.token_number,
            queue_position: entry.sequence,
        }),
    ))
}

/// GET /student/payments/queue - The student's own payment history and ranks
#[utoipa::path(
    get,
    path = "/student/payments/queue",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Payments newest first, active ones ranked", body = [StudentPaymentDto]),
        (status = 401, description = "Missing or invalid credential"),
        (status = 403, description = "Caller is not a student")
    )
)]
pub async fn student_queue_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<StudentPaymentDto>>, ApiError> {
    require_role(&auth, Role::Student)?;

    let student = state
        .identity
        .student_by_user(auth.user_id)
        .await?
        .ok_or_else(|| CoreError::NotFound("Student profile not found".to_string()))?;

    let items = state.queries.queue_for_student(student.id).await?;
    Ok(Json(items.into_iter().map(StudentPaymentDto::from).collect()))
}
