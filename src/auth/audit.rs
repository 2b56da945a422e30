/// Authentication Audit Events
///
/// Security-relevant outcomes of login, refresh and logout are recorded through
/// an `AuditSink` handed to the engine at construction. Events never carry
/// passwords or token values.

use std::sync::Mutex;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEventKind {
    LoginSuccess,
    LoginFailed,
    RefreshSuccess,
    RefreshFailed,
    LogoutSuccess,
    LogoutFailed,
}

impl AuthEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthEventKind::LoginSuccess => "login_success",
            AuthEventKind::LoginFailed => "login_failed",
            AuthEventKind::RefreshSuccess => "refresh_success",
            AuthEventKind::RefreshFailed => "refresh_failed",
            AuthEventKind::LogoutSuccess => "logout_success",
            AuthEventKind::LogoutFailed => "logout_failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            AuthEventKind::LoginFailed | AuthEventKind::RefreshFailed | AuthEventKind::LogoutFailed
        )
    }
}

/// A single audit record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub client_ip: Option<String>,
    pub reason: String,
    pub at: DateTime<Utc>,
}

impl AuthEvent {
    pub fn new(kind: AuthEventKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            user_id: None,
            email: None,
            role: None,
            client_ip: None,
            reason: reason.into(),
            at: Utc::now(),
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_client_ip(mut self, client_ip: Option<&str>) -> Self {
        self.client_ip = client_ip.map(str::to_string);
        self
    }
}

/// Destination for audit events
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuthEvent);
}

/// Writes audit events to the `audit` tracing target
#[derive(Debug, Clone, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &AuthEvent) {
        let user_id = event.user_id.as_deref().unwrap_or("");
        let email = event.email.as_deref().unwrap_or("");
        let role = event.role.as_deref().unwrap_or("");
        let ip = event.client_ip.as_deref().unwrap_or("");
        let time = event.at.to_rfc3339();

        if event.kind.is_failure() {
            tracing::warn!(target: "audit", event = event.kind.as_str(), user_id, email, role, ip, reason = %event.reason, time = %time, "auth_event");
        } else {
            tracing::info!(target: "audit", event = event.kind.as_str(), user_id, email, role, ip, reason = %event.reason, time = %time, "auth_event");
        }
    }
}

/// Keeps every event in memory; used to assert on the audit trail
#[derive(Debug, Default)]
pub struct RecordingAuditSink {
    events: Mutex<Vec<AuthEvent>>,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuthEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    pub fn kinds(&self) -> Vec<AuthEventKind> {
        self.events().iter().map(|event| event.kind).collect()
    }
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: &AuthEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
