/// Authentication Engine
///
/// Orchestrates login, refresh and logout over the user store, the credential
/// verifier, the token issuer and the refresh token store.
///
/// Session state is implied by the refresh token store: a user has an active
/// session exactly while a refresh entry exists for them. Login overwrites it,
/// logout and TTL expiry remove it. Refresh only reads it and never rotates.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use subtle::ConstantTimeEq;

use crate::auth::audit::{AuditSink, AuthEvent, AuthEventKind};
use crate::auth::errors::{AuthError, StoreError};
use crate::auth::jwt::TokenIssuer;
use crate::auth::password::{verify_password_blocking, verify_placeholder_blocking};
use crate::auth::refresh_token::RefreshTokenStore;
use crate::users::{User, UserStore};

/// Tokens handed out by a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Reachability of the backing stores
#[derive(Debug)]
pub struct Readiness {
    pub users: Result<(), StoreError>,
    pub refresh_tokens: Result<(), StoreError>,
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        self.users.is_ok() && self.refresh_tokens.is_ok()
    }
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    issuer: TokenIssuer,
    audit: Arc<dyn AuditSink>,
    refresh_ttl: Duration,
    deadline: StdDuration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        issuer: TokenIssuer,
        audit: Arc<dyn AuditSink>,
        refresh_ttl: Duration,
        deadline: StdDuration,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            issuer,
            audit,
            refresh_ttl,
            deadline,
        }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Verify credentials and open a session
    ///
    /// # Errors
    /// - `InvalidCredentials` for an unknown email or a wrong password
    /// - `IssuanceFailed` if minting or persisting the tokens fails; nothing is
    ///   stored in that case and any previous session is left as it was
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        client_ip: Option<&str>,
    ) -> Result<TokenPair, AuthError> {
        let user = match self.bounded(self.users.get_by_email(email)).await {
            Ok(user) => user,
            Err(e) => {
                tracing::debug!(error = %e, "User lookup failed during login");
                let _ = tokio::time::timeout(
                    self.deadline,
                    verify_placeholder_blocking(password.to_string()),
                )
                .await;
                self.audit.record(
                    &AuthEvent::new(AuthEventKind::LoginFailed, "invalid credentials")
                        .with_email(email)
                        .with_client_ip(client_ip),
                );
                return Err(AuthError::InvalidCredentials);
            }
        };

        let verification = tokio::time::timeout(
            self.deadline,
            verify_password_blocking(password.to_string(), user.password_hash.clone()),
        )
        .await
        .unwrap_or(Err(AuthError::InvalidCredentials));

        if verification.is_err() {
            self.record_login(AuthEventKind::LoginFailed, "invalid credentials", &user, client_ip);
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self
            .issuer
            .issue_access_token(&user.id, &user.role)
            .map_err(|e| {
                tracing::error!(error = %e, user_id = %user.id, "Access token generation failed");
                self.record_login(AuthEventKind::LoginFailed, "token generation failed", &user, client_ip);
                AuthError::IssuanceFailed
            })?;

        let refresh_token = self.issuer.issue_refresh_token(&user.id).map_err(|e| {
            tracing::error!(error = %e, user_id = %user.id, "Refresh token generation failed");
            self.record_login(
                AuthEventKind::LoginFailed,
                "refresh token generation failed",
                &user,
                client_ip,
            );
            AuthError::IssuanceFailed
        })?;

        let expires_at = Utc::now() + self.refresh_ttl;
        if let Err(e) = self
            .bounded(self.refresh_tokens.save(&user.id, &refresh_token, expires_at))
            .await
        {
            tracing::error!(error = %e, user_id = %user.id, "Saving refresh token failed");
            self.record_login(
                AuthEventKind::LoginFailed,
                "saving refresh token failed",
                &user,
                client_ip,
            );
            return Err(AuthError::IssuanceFailed);
        }

        self.record_login(AuthEventKind::LoginSuccess, "user logged in", &user, client_ip);

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.issuer.access_ttl_seconds(),
        })
    }

    /// Mint a new access token from the user's live refresh token
    ///
    /// The refresh token itself is neither rotated nor re-saved.
    ///
    /// # Errors
    /// - `InvalidOrExpiredRefreshToken` if nothing is stored for the user or the
    ///   stored value differs from `refresh_token`
    /// - `UserNotFound` if the account has disappeared
    /// - `IssuanceFailed` if the user lookup or token minting fails for any other reason
    pub async fn refresh(&self, user_id: &str, refresh_token: &str) -> Result<String, AuthError> {
        let stored = match self.bounded(self.refresh_tokens.get(user_id)).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::debug!(error = %e, user_id, "No usable refresh token stored");
                self.record_refresh_failure(user_id, "refresh token not found or expired");
                return Err(AuthError::InvalidOrExpiredRefreshToken);
            }
        };

        if !bool::from(stored.as_bytes().ct_eq(refresh_token.as_bytes())) {
            self.record_refresh_failure(user_id, "refresh token mismatch");
            return Err(AuthError::InvalidOrExpiredRefreshToken);
        }

        let user = match self.bounded(self.users.get_by_id(user_id)).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                self.record_refresh_failure(user_id, "user not found");
                return Err(AuthError::UserNotFound);
            }
            Err(e) => {
                tracing::error!(error = %e, user_id, "User lookup failed during refresh");
                self.record_refresh_failure(user_id, "user lookup failed");
                return Err(AuthError::IssuanceFailed);
            }
        };

        let access_token = self
            .issuer
            .issue_access_token(&user.id, &user.role)
            .map_err(|e| {
                tracing::error!(error = %e, user_id, "Access token generation failed");
                self.record_refresh_failure(user_id, "token generation failed");
                AuthError::IssuanceFailed
            })?;

        self.audit.record(
            &AuthEvent::new(AuthEventKind::RefreshSuccess, "access token refreshed")
                .with_user_id(&user.id)
                .with_email(&user.email)
                .with_role(&user.role),
        );

        Ok(access_token)
    }

    /// Close the user's session by deleting the refresh token entry
    ///
    /// The user lookup only enriches the audit event; its failure is logged and ignored.
    ///
    /// # Errors
    /// Returns `DeletionFailed` if the refresh token entry could not be removed
    pub async fn logout(&self, user_id: &str, client_ip: Option<&str>) -> Result<(), AuthError> {
        let user = match self.bounded(self.users.get_by_id(user_id)).await {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::error!(error = %e, user_id, "Failed to get user for logout event");
                None
            }
        };

        let deleted = self.bounded(self.refresh_tokens.delete(user_id)).await;

        let (kind, reason) = match &deleted {
            Ok(()) => (AuthEventKind::LogoutSuccess, "user logged out"),
            Err(_) => (AuthEventKind::LogoutFailed, "failed to delete refresh token"),
        };
        let mut event = AuthEvent::new(kind, reason)
            .with_user_id(user_id)
            .with_client_ip(client_ip);
        if let Some(user) = user {
            event = event.with_email(user.email).with_role(user.role);
        }
        self.audit.record(&event);

        deleted.map_err(|e| {
            tracing::error!(error = %e, user_id, "Failed to delete refresh token");
            AuthError::DeletionFailed
        })
    }

    /// Ping both stores concurrently, each bounded by the deadline
    pub async fn readiness(&self) -> Readiness {
        let (users, refresh_tokens) = tokio::join!(
            self.bounded(self.users.ping()),
            self.bounded(self.refresh_tokens.ping()),
        );
        Readiness {
            users,
            refresh_tokens,
        }
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.deadline, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout),
        }
    }

    fn record_login(&self, kind: AuthEventKind, reason: &str, user: &User, client_ip: Option<&str>) {
        self.audit.record(
            &AuthEvent::new(kind, reason)
                .with_user_id(&user.id)
                .with_email(&user.email)
                .with_role(&user.role)
                .with_client_ip(client_ip),
        );
    }

    fn record_refresh_failure(&self, user_id: &str, reason: &str) {
        self.audit
            .record(&AuthEvent::new(AuthEventKind::RefreshFailed, reason).with_user_id(user_id));
    }
}
