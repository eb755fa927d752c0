pub mod auth_handlers;
pub mod handlers;
pub mod map_handlers;
pub mod routes;
pub mod user_extractor;

pub use routes::*;
