// Public modules
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod error;
pub mod fragments;
pub mod observability;
pub mod render;
pub mod transport;
pub mod types;

// Re-exports
pub use client::TutorClient;
pub use client_logger::ClientLogger;
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, Renderer, StreamHandle};
pub use transport::{FragmentStream, Transport};
pub use types::*;
