//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use fee_queue_core::domain::Role;
use fee_queue_core::error::CoreError;

use crate::error::ApiError;
use crate::web::credential::AuthUser;
use crate::web::state::AppState;

/// Middleware that validates the bearer credential and extracts the caller.
///
/// The credential's signature and expiry are checked first, then the account
/// is re-fetched so a deactivated account is rejected even while its
/// credential is still unexpired. On success an `AuthUser` is inserted into
/// the request extensions for handlers to use.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers()).ok_or(CoreError::InvalidToken)?;
    let user = state.credentials.verify(token)?;

    let account = state
        .identity
        .account_by_id(user.user_id)
        .await?
        .ok_or(CoreError::InactiveAccount)?;
    if !account.active {
        return Err(CoreError::InactiveAccount.into());
    }

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Pulls the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Rejects callers whose account role does not match the route's role.
pub fn require_role(user: &AuthUser, role: Role) -> Result<(), ApiError> {
    if user.role == role {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Access denied".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use uuid::Uuid;

    #[test]
    fn bearer_token_parses_well_formed_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def"),
        );
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    #[test]
    fn bearer_token_rejects_missing_or_malformed_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("abc.def"));
        assert_eq!(bearer_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn require_role_checks_exact_role() {
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            email: "acc@college.test".to_string(),
            role: Role::Accountant,
        };
        assert!(require_role(&user, Role::Accountant).is_ok());
        assert!(require_role(&user, Role::Student).is_err());
    }
}
