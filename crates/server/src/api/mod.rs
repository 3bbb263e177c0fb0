pub mod handlers;
pub mod history;
pub mod middleware;
pub mod routes;
pub mod triggers;

use serde::Serialize;

pub use routes::create_router;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
