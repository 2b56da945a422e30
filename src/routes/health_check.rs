/// Health Routes
///
/// `health_check` and `liveness` only prove the process answers. `readiness`
/// pings the user database and the refresh token store and answers 503 while
/// either is unreachable.

use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::auth::{AuthService, StoreError};

#[derive(Serialize)]
pub struct LivenessResponse {
    pub alive: bool,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub database: &'static str,
    pub refresh_store: &'static str,
}

fn status(check: &Result<(), StoreError>) -> &'static str {
    match check {
        Ok(()) => "ok",
        Err(_) => "unreachable",
    }
}

/// GET /health_check
pub async fn health_check() -> HttpResponse {
    tracing::debug!("Health check endpoint called");
    HttpResponse::Ok().body("OK")
}

/// GET /system/liveness
pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(LivenessResponse { alive: true })
}

/// GET /system/readiness
///
/// Each ping is bounded by the service's operation timeout.
pub async fn readiness(auth: web::Data<AuthService>) -> HttpResponse {
    let readiness = auth.readiness().await;

    if let Err(e) = &readiness.users {
        tracing::warn!(error = %e, "User database is not reachable");
    }
    if let Err(e) = &readiness.refresh_tokens {
        tracing::warn!(error = %e, "Refresh token store is not reachable");
    }

    let body = ReadinessResponse {
        ready: readiness.is_ready(),
        database: status(&readiness.users),
        refresh_store: status(&readiness.refresh_tokens),
    };

    if body.ready {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}
