/// Middleware module
///
/// Access token authentication and request logging.

mod jwt_middleware;
mod request_logger;

pub use jwt_middleware::{bearer_token, JwtMiddleware};
pub use request_logger::{RequestLogger, REQUEST_ID_HEADER};
