/// JWT Token Issuance and Validation
///
/// Mints access and refresh tokens with a single HS256 secret and validates
/// access tokens for the request-authentication middleware.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;

use crate::auth::claims::{AccessClaims, RefreshClaims};
use crate::auth::errors::TokenError;
use crate::configuration::JwtSettings;

/// Signs access and refresh tokens with one shared secret
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    issuer: String,
}

impl TokenIssuer {
    /// Build an issuer from JWT settings
    ///
    /// # Errors
    /// Returns `TokenError::MissingSecret` if the signing secret is empty
    pub fn new(config: &JwtSettings) -> Result<Self, TokenError> {
        if config.secret.trim().is_empty() {
            return Err(TokenError::MissingSecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            access_ttl: Duration::seconds(config.access_token_expiry),
            issuer: config.issuer.clone(),
        })
    }

    /// Lifetime of an access token in seconds
    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    /// Issue an access token for `subject` with `role`, expiring after the access TTL
    pub fn issue_access_token(&self, subject: &str, role: &str) -> Result<String, TokenError> {
        self.issue_access_token_at(subject, role, Utc::now())
    }

    /// Issue an access token as if the current time were `now`
    pub fn issue_access_token_at(
        &self,
        subject: &str,
        role: &str,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = AccessClaims::new(subject, role, now, self.access_ttl, &self.issuer);
        self.sign(&claims)
    }

    /// Issue a refresh token for `subject`
    ///
    /// The token has no `exp` claim; the refresh token store decides how long it lives.
    pub fn issue_refresh_token(&self, subject: &str) -> Result<String, TokenError> {
        self.sign(&RefreshClaims::new(subject))
    }

    /// Validate an access token and return its claims
    ///
    /// # Errors
    /// Returns error if the token is malformed, tampered with, expired or from another issuer
    pub fn validate_access_token(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);

        decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(TokenError::Signing)
    }
}
