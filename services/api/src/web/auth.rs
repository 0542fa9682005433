//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: student registration, login, and the current
//! user lookup. Passwords are argon2-hashed; a successful login issues a
//! signed bearer credential carrying the account id, email, and role.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use fee_queue_core::domain::{Account, NewStudent, Role};
use fee_queue_core::error::CoreError;

use crate::error::ApiError;
use crate::web::credential::AuthUser;
use crate::web::rest::Ack;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterStudentRequest {
    pub full_name: String,
    pub roll_number: String,
    pub college_email: String,
    pub phone_number: Option<String>,
    pub year: Option<i32>,
    pub branch: Option<String>,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Email address or roll number; emails are recognized by the `@`.
    pub identifier: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

#[derive(Serialize, ToSchema)]
pub struct MeResponse {
    pub user: UserInfo,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub roll_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<StudentDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accountant: Option<AccountantDetails>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentDetails {
    pub full_name: String,
    pub college_email: String,
    pub phone_number: String,
    pub year: i32,
    pub branch: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountantDetails {
    pub full_name: String,
    pub staff_id: String,
    pub assigned_counter_id: Option<Uuid>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/register/student - Create a student account with its profile
#[utoipa::path(
    post,
    path = "/auth/register/student",
    request_body = RegisterStudentRequest,
    responses(
        (status = 201, description = "Student registered successfully", body = Ack),
        (status = 400, description = "Missing fields or duplicate email/roll number"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn register_student_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterStudentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let required = [
        &req.full_name,
        &req.roll_number,
        &req.college_email,
        &req.password,
    ];
    if required.iter().any(|field| field.trim().is_empty()) {
        return Err(CoreError::Validation(
            "All required fields must be filled".to_string(),
        )
        .into());
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ApiError::Internal("Failed to hash password".to_string())
        })?
        .to_string();

    let account = state
        .identity
        .create_student(NewStudent {
            full_name: req.full_name,
            roll_number: req.roll_number,
            college_email: req.college_email,
            phone_number: req.phone_number.unwrap_or_default(),
            year: req.year.unwrap_or(1),
            branch: req.branch.unwrap_or_default(),
            password_hash,
        })
        .await?;

    info!("student registered: {}", account.email);
    Ok((
        StatusCode::CREATED,
        Json(Ack {
            success: true,
            message: "Student registered successfully".to_string(),
        }),
    ))
}

/// POST /auth/login - Login with email or roll number
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing identifier or password"),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if req.identifier.trim().is_empty() || req.password.is_empty() {
        return Err(CoreError::Validation(
            "Email/Roll Number and password are required".to_string(),
        )
        .into());
    }

    // An identifier with an '@' is an email; anything else is a roll number.
    let account = if req.identifier.contains('@') {
        state.identity.account_by_email(&req.identifier).await?
    } else {
        state
            .identity
            .account_by_roll_number(&req.identifier)
            .await?
    }
    .ok_or(CoreError::InvalidCredentials)?;

    let parsed_hash = PasswordHash::new(&account.password_hash).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        ApiError::Internal("Authentication error".to_string())
    })?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| CoreError::InvalidCredentials)?;

    let token = state.credentials.sign(&account)?;
    let user = user_info(&state, &account).await?;

    info!("login successful: {}", account.email);
    Ok(Json(LoginResponse { token, user }))
}

/// GET /auth/me - The authenticated account and its role-specific profile
#[utoipa::path(
    get,
    path = "/auth/me",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Missing or invalid credential")
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<MeResponse>, ApiError> {
    let account = state
        .identity
        .account_by_id(auth.user_id)
        .await?
        .ok_or(CoreError::InactiveAccount)?;

    Ok(Json(MeResponse {
        user: user_info(&state, &account).await?,
    }))
}

/// Builds the canonical user payload: account fields plus the role-specific
/// profile, when one exists.
async fn user_info(state: &AppState, account: &Account) -> Result<UserInfo, ApiError> {
    let mut info = UserInfo {
        id: account.id,
        email: account.email.clone(),
        role: account.role.to_string(),
        roll_number: account.roll_number.clone(),
        student: None,
        accountant: None,
    };

    match account.role {
        Role::Student => {
            if let Some(profile) = state.identity.student_by_user(account.id).await? {
                info.student = Some(StudentDetails {
                    full_name: profile.full_name,
                    college_email: profile.college_email,
                    phone_number: profile.phone_number,
                    year: profile.year,
                    branch: profile.branch,
                });
            }
        }
        Role::Accountant => {
            if let Some(profile) = state.identity.accountant_by_user(account.id).await? {
                info.accountant = Some(AccountantDetails {
                    full_name: profile.full_name,
                    staff_id: profile.staff_id,
                    assigned_counter_id: profile.assigned_counter_id,
                });
            }
        }
        Role::Admin => {}
    }

    Ok(info)
}
