//! services/api/src/web/rest.rs
//!
//! The health endpoint, the shared ack body, and the master definition for
//! the OpenAPI specification.

use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::ToSchema;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        crate::web::auth::register_student_handler,
        crate::web::auth::login_handler,
        crate::web::auth::me_handler,
        crate::web::student::create_payment_handler,
        crate::web::student::student_queue_handler,
        crate::web::queue::process_payment_handler,
        crate::web::queue::skip_handler,
        crate::web::queue::remove_handler,
        crate::web::queue::counter_queue_handler,
        crate::web::queue::counter_stats_handler,
    ),
    components(
        schemas(
            Ack,
            HealthResponse,
            crate::web::auth::RegisterStudentRequest,
            crate::web::auth::LoginRequest,
            crate::web::auth::LoginResponse,
            crate::web::auth::MeResponse,
            crate::web::auth::UserInfo,
            crate::web::auth::StudentDetails,
            crate::web::auth::AccountantDetails,
            crate::web::student::CreatePaymentRequest,
            crate::web::student::PaymentCreatedResponse,
            crate::web::student::StudentPaymentDto,
            crate::web::queue::ProcessPaymentRequest,
            crate::web::queue::SkipRequest,
            crate::web::queue::RemoveRequest,
            crate::web::queue::ReceiptDto,
            crate::web::queue::CounterQueueDto,
            crate::web::queue::CounterStatsDto,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Fee Queue API", description = "Payment queue management for college fee counters.")
    )
)]
pub struct ApiDoc;

/// Registers the bearer scheme the protected paths reference.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .build(),
                ),
            );
        }
    }
}

//=========================================================================================
// Shared Response Types
//=========================================================================================

/// The plain acknowledgement body used by mutating queue endpoints.
#[derive(Serialize, ToSchema)]
pub struct Ack {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /health - Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "Backend server is running".to_string(),
        timestamp: Utc::now(),
    })
}
