pub mod auth;
pub mod credential;
pub mod middleware;
pub mod queue;
pub mod rest;
pub mod state;
pub mod student;

// Re-export the pieces the server binary wires together.
pub use credential::CredentialSigner;
pub use middleware::require_auth;
pub use rest::ApiDoc;
pub use state::AppState;
