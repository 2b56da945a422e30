mod auth;
mod health_check;

pub use auth::{login, logout, refresh, LoginRequest, LoginResponse, RefreshRequest, RefreshResponse};
pub use health_check::{health_check, liveness, readiness, LivenessResponse, ReadinessResponse};
