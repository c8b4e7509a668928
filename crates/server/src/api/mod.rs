pub mod admin;
pub mod books;
pub mod events;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::{ApiError, ErrorResponse};
pub use routes::create_router;
