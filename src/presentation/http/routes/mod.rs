pub mod chat_routes;
pub mod health_routes;

pub use chat_routes::*;
pub use health_routes::*;
