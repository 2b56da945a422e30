/// JWT Authentication Middleware
///
/// Validates the access token from the Authorization header and injects its
/// claims into request extensions for use by route handlers.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::TokenIssuer;
use crate::error::AppError;

/// JWT middleware for protecting routes
pub struct JwtMiddleware {
    issuer: TokenIssuer,
}

impl JwtMiddleware {
    pub fn new(issuer: TokenIssuer) -> Self {
        Self { issuer }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            issuer: self.issuer.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    issuer: TokenIssuer,
}

/// Extract the token from a `Bearer <token>` header value
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(bearer_token)
            .map(str::to_string);

        let Some(token) = token else {
            tracing::warn!(path = %req.path(), "Missing or invalid Authorization header");
            return Box::pin(async move { Err(AppError::Token.into()) });
        };

        match self.issuer.validate_access_token(&token) {
            Ok(claims) => {
                tracing::debug!(user_id = %claims.sub, role = %claims.role, "Access token validated");
                req.extensions_mut().insert(claims);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => {
                tracing::warn!(error = %e, "Access token validation failed");
                Box::pin(async move { Err(AppError::Token.into()) })
            }
        }
    }
}
