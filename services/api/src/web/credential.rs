//! services/api/src/web/credential.rs
//!
//! The signed bearer credential: a base64url JSON payload carrying
//! `{user_id, email, role, exp}`, MAC'd with HMAC-SHA256. Verification checks
//! the MAC in constant time before touching the payload, then the expiry.
//! The account's active flag is re-checked against the identity store by the
//! auth middleware, not here.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use fee_queue_core::domain::{Account, Role};
use fee_queue_core::error::CoreError;

/// How long an issued credential stays valid.
pub const CREDENTIAL_TTL_HOURS: i64 = 24;

/// The authenticated caller, inserted into request extensions by the auth
/// middleware.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

#[derive(Serialize, Deserialize)]
struct Claims {
    user_id: Uuid,
    email: String,
    role: String,
    exp: i64,
}

/// Signs and verifies bearer credentials with a single shared secret.
#[derive(Clone)]
pub struct CredentialSigner {
    mac: Hmac<Sha256>,
}

impl CredentialSigner {
    pub fn new(secret: &str) -> Result<Self, InvalidLength> {
        Ok(Self {
            mac: Hmac::<Sha256>::new_from_slice(secret.as_bytes())?,
        })
    }

    /// Issues a credential for the account, valid for `CREDENTIAL_TTL_HOURS`.
    pub fn sign(&self, account: &Account) -> Result<String, serde_json::Error> {
        let claims = Claims {
            user_id: account.id,
            email: account.email.clone(),
            role: account.role.as_str().to_string(),
            exp: (Utc::now() + Duration::hours(CREDENTIAL_TTL_HOURS)).timestamp(),
        };
        self.sign_claims(&claims)
    }

    fn sign_claims(&self, claims: &Claims) -> Result<String, serde_json::Error> {
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{payload}.{signature}"))
    }

    /// Verifies signature and expiry and returns the embedded caller
    /// identity. Any malformed, tampered, or expired credential yields
    /// `InvalidToken`.
    pub fn verify(&self, credential: &str) -> Result<AuthUser, CoreError> {
        let (payload, signature) = credential
            .split_once('.')
            .ok_or(CoreError::InvalidToken)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| CoreError::InvalidToken)?;

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| CoreError::InvalidToken)?;

        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| CoreError::InvalidToken)?;
        let claims: Claims =
            serde_json::from_slice(&bytes).map_err(|_| CoreError::InvalidToken)?;

        if claims.exp < Utc::now().timestamp() {
            return Err(CoreError::InvalidToken);
        }
        let role = Role::parse(&claims.role).ok_or(CoreError::InvalidToken)?;

        Ok(AuthUser {
            user_id: claims.user_id,
            email: claims.email,
            role,
        })
    }
}
