//! HTTP surface: routing, CORS and request/response framing.

pub mod error;
pub mod handlers;
pub mod routes;

pub use error::ApiError;
pub use handlers::AppState;
pub use routes::create_router;
