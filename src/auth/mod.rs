/// Authentication module
///
/// Credential verification, access/refresh token issuance, refresh token
/// storage, audit events and the engine that ties them together.

mod audit;
mod claims;
mod errors;
mod jwt;
mod password;
mod refresh_token;
mod service;

pub use audit::{AuditSink, AuthEvent, AuthEventKind, RecordingAuditSink, TracingAuditSink};
pub use claims::{AccessClaims, RefreshClaims};
pub use errors::{AuthError, StoreError, TokenError};
pub use jwt::TokenIssuer;
pub use password::{hash_password, verify_password};
pub use refresh_token::{
    px_millis, refresh_key, remaining_ttl, InMemoryRefreshTokenStore, RedisRefreshTokenStore,
    RefreshTokenStore,
};
pub use service::{AuthService, Readiness, TokenPair};
