//! Logging trait for tutoring service client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! and log all interactions passing through the [`TutorClient`](crate::TutorClient).

use crate::error::Error;
use crate::types::{ChatRequest, ChatResponse};

/// A trait for logging client operations.
///
/// Implement this trait to record every request and what came back for it,
/// including each fragment of a streamed reply.
///
/// # Example
///
/// ```rust,ignore
/// use std::io::Write;
/// use std::sync::Mutex;
/// use tutorius::{ChatRequest, ChatResponse, ClientLogger, Error};
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FileLogger {
///     fn log_request(&self, request: &ChatRequest) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Request: {}", serde_json::to_string(request).unwrap()).unwrap();
///     }
///
///     fn log_response(&self, response: &ChatResponse) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Response: {}", response.response).unwrap();
///     }
///
///     fn log_error(&self, error: &Error) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Error: {error}").unwrap();
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log a request before it is sent.
    fn log_request(&self, request: &ChatRequest);

    /// Log a complete reply from the single-response endpoint.
    fn log_response(&self, response: &ChatResponse);

    /// Log one fragment of a streamed reply.
    fn log_fragment(&self, fragment: &str) {
        _ = fragment;
    }

    /// Log the full text of a stream that ended normally.
    fn log_stream_complete(&self, text: &str) {
        _ = text;
    }

    /// Log a failed request or an aborted stream.
    fn log_error(&self, error: &Error);
}
