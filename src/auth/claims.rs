/// JWT Claims structures
///
/// Access tokens carry the subject, role and a short absolute expiry.
/// Refresh tokens carry only the subject and a unique identifier; their lifetime
/// is owned by the refresh token store, not by an `exp` claim.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims embedded in an access token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    /// Subject (user identifier)
    pub sub: String,
    /// User role
    pub role: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Unique token identifier
    pub jti: String,
    /// Issuer
    pub iss: String,
}

impl AccessClaims {
    /// Build claims issued at `now` and expiring `ttl` later
    pub fn new(
        subject: &str,
        role: &str,
        now: DateTime<Utc>,
        ttl: Duration,
        issuer: &str,
    ) -> Self {
        Self {
            sub: subject.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
            iss: issuer.to_string(),
        }
    }

    /// Check if the token has expired
    pub fn is_expired(&self) -> bool {
        self.exp < Utc::now().timestamp()
    }
}

/// Claims embedded in a refresh token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RefreshClaims {
    /// Subject (user identifier)
    pub sub: String,
    /// Random identifier that keeps two tokens for one subject distinct
    pub jti: String,
}

impl RefreshClaims {
    pub fn new(subject: &str) -> Self {
        Self {
            sub: subject.to_string(),
            jti: Uuid::new_v4().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_access_claims_expiry_is_issue_time_plus_ttl() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let claims = AccessClaims::new("u1", "admin", now, Duration::minutes(3), "test");

        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp - claims.iat, 180);
        assert!(claims.is_expired());
    }

    #[test]
    fn test_fresh_access_claims_are_not_expired() {
        let claims = AccessClaims::new("u1", "user", Utc::now(), Duration::minutes(3), "test");
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_refresh_claims_get_unique_identifiers() {
        let first = RefreshClaims::new("u1");
        let second = RefreshClaims::new("u1");

        assert_eq!(first.sub, second.sub);
        assert_ne!(first.jti, second.jti);
    }
}
