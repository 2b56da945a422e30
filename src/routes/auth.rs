/// Authentication Routes
///
/// Thin HTTP layer over `AuthService`: decode and validate the body, pull the
/// client IP and the authenticated user, call the engine, render the result.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{AccessClaims, AuthService};
use crate::error::AppError;
use crate::validators::{
    is_valid_email, is_valid_password, is_valid_refresh_token, is_valid_user_id,
};

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token refresh request
#[derive(Deserialize)]
pub struct RefreshRequest {
    pub user_id: String,
    pub refresh_token: String,
}

/// Login response with access and refresh tokens
#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Refresh response carrying only the new access token
#[derive(Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

fn client_ip(req: &HttpRequest) -> Option<String> {
    req.connection_info().realip_remote_addr().map(str::to_string)
}

/// POST /auth/login
///
/// # Errors
/// - 400: Malformed email or password
/// - 401: Invalid credentials (unknown email and wrong password look the same)
/// - 500: Tokens could not be issued or stored
pub async fn login(
    req: HttpRequest,
    form: web::Json<LoginRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;
    is_valid_password(&form.password)?;
    let ip = client_ip(&req);

    let pair = auth.login(&email, &form.password, ip.as_deref()).await?;

    tracing::info!("User logged in successfully");

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: pair.expires_in,
    }))
}

/// POST /auth/refresh
///
/// Issues a new access token. The refresh token is not rotated.
///
/// # Errors
/// - 400: Malformed user id or token
/// - 401: Refresh token missing, expired, superseded or forged
/// - 404: The account no longer exists
/// - 500: The access token could not be issued
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let user_id = is_valid_user_id(&form.user_id)?;
    is_valid_refresh_token(&form.refresh_token)?;
    let access_token = auth.refresh(&user_id, &form.refresh_token).await?;

    tracing::info!(user_id = %user_id, "Token refreshed successfully");

    Ok(HttpResponse::Ok().json(RefreshResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: auth.issuer().access_ttl_seconds(),
    }))
}

/// POST /auth/logout
///
/// **Requires valid JWT access token** in the Authorization header; the user id
/// comes from its claims.
///
/// # Errors
/// - 401: Missing or invalid access token (handled by middleware)
/// - 500: The refresh token could not be deleted; the client should retry
pub async fn logout(
    req: HttpRequest,
    claims: web::ReqData<AccessClaims>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let ip = client_ip(&req);

    auth.logout(&claims.sub, ip.as_deref()).await?;

    tracing::info!(user_id = %claims.sub, "User logged out");

    Ok(HttpResponse::NoContent().finish())
}
