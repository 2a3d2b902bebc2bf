// Public modules
pub mod chat_request;
pub mod chat_response;
pub mod health_status;
pub mod subject;
pub mod turn;

// Re-exports
pub use chat_request::ChatRequest;
pub use chat_response::ChatResponse;
pub use health_status::HealthStatus;
pub use subject::Subject;
pub use turn::{Sender, Turn};
