//! The boundary between the chat session and the tutoring service.
//!
//! [`Transport`] is implemented by [`TutorClient`](crate::TutorClient) for the
//! real HTTP service and by in-memory fakes in tests.

use std::pin::Pin;
use std::sync::Arc;

use futures::Stream;

use crate::error::{Error, Result};
use crate::types::{ChatRequest, ChatResponse, HealthStatus};

/// Text fragments of one streamed reply, in arrival order.
///
/// The stream ends when the reply is complete. An `Err` item is terminal.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Transport for chat requests.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Sends a request and waits for the complete reply.
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse>;

    /// Sends a request and returns the reply as a stream of text fragments.
    ///
    /// Resolves once the response headers arrive with a success status;
    /// non-success statuses are reported as errors before any fragment.
    async fn stream(&self, request: &ChatRequest) -> Result<FragmentStream>;

    /// Asks the service whether it is up.
    async fn health(&self) -> Result<HealthStatus> {
        Err(Error::validation(
            "health checks are not supported by this transport",
            None,
        ))
    }
}

#[async_trait::async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse> {
        (**self).send(request).await
    }

    async fn stream(&self, request: &ChatRequest) -> Result<FragmentStream> {
        (**self).stream(request).await
    }

    async fn health(&self) -> Result<HealthStatus> {
        (**self).health().await
    }
}
