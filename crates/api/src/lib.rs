pub mod error;
pub mod extract;
pub mod logging;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod validation;

pub use error::{ApiError, ApiErrorResponse};
pub use openapi::ApiDoc;
pub use routes::{create_router, create_router_with_timeout};
pub use state::AppState;
