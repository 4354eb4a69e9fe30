pub mod auth;
pub mod extract;
pub mod logging;
pub mod metrics;
pub mod response;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use extract::ApiJson;
pub use logging::http_logger;
pub use metrics::request_tracker;
pub use response::{ApiResponse, ApiResult};
