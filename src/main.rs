use std::net::TcpListener;
use std::sync::Arc;

use chrono::Duration;
use sqlx::postgres::PgPoolOptions;

use session_auth::auth::{AuthService, RedisRefreshTokenStore, TokenIssuer, TracingAuditSink};
use session_auth::configuration::get_configuration;
use session_auth::startup::run;
use session_auth::telemetry::init_telemetry;
use session_auth::users::PgUserStore;

fn startup_error(kind: std::io::ErrorKind, message: &'static str) -> std::io::Error {
    std::io::Error::new(kind, message)
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // 구조화된 로깅 초기화
    init_telemetry("info");

    tracing::info!("Starting application");

    // 설정 로드 및 검증
    let configuration = get_configuration().map_err(|e| {
        tracing::error!("Failed to read configuration: {}", e);
        startup_error(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;
    configuration.validate().map_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
        startup_error(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;
    tracing::info!("Configuration loaded successfully");

    // 데이터베이스 연결 풀 생성
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(configuration.application.operation_timeout())
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            startup_error(std::io::ErrorKind::ConnectionRefused, "Database connection error")
        })?;
    tracing::info!("Database connection pool created successfully");

    // Redis 연결
    let refresh_tokens = RedisRefreshTokenStore::connect(&configuration.redis)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to Redis: {}", e);
            startup_error(std::io::ErrorKind::ConnectionRefused, "Redis connection error")
        })?;

    let issuer = TokenIssuer::new(&configuration.jwt).map_err(|e| {
        tracing::error!("Failed to build token issuer: {}", e);
        startup_error(std::io::ErrorKind::InvalidInput, "JWT configuration error")
    })?;

    let auth = AuthService::new(
        Arc::new(PgUserStore::new(pool)),
        Arc::new(refresh_tokens),
        issuer,
        Arc::new(TracingAuditSink),
        Duration::seconds(configuration.jwt.refresh_token_expiry),
        configuration.application.operation_timeout(),
    );

    let address = configuration.application.address();
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    // 서버 실행
    run(listener, auth)?.await
}
