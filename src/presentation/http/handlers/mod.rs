pub mod chat_handler;
pub mod health_handler;

pub use chat_handler::ChatHandler;
pub use health_handler::HealthHandler;
