//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use fee_queue_core::ports::IdentityStore;
use fee_queue_core::{PaymentProcessor, QueueLedger, QueueQueries};

use crate::config::Config;
use crate::web::credential::CredentialSigner;

/// The shared application state, created once at startup and passed to all
/// handlers. The core services and the identity port all point at the same
/// storage adapter; nothing here is process-global.
#[derive(Clone)]
pub struct AppState {
    pub ledger: QueueLedger,
    pub processor: PaymentProcessor,
    pub queries: QueueQueries,
    pub identity: Arc<dyn IdentityStore>,
    pub credentials: CredentialSigner,
    pub config: Arc<Config>,
}
