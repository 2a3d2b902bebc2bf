use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::fragments::decode_fragments;
use crate::observability::{
    CLIENT_RATE_LIMITED, CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS,
    STREAM_ERRORS,
};
use crate::transport::{FragmentStream, Transport};
use crate::types::{ChatRequest, ChatResponse, HealthStatus};

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8001/";

/// Environment variable consulted for the base URL.
pub const BASE_URL_ENV: &str = "TUTORIUS_BASE_URL";

/// Timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const CHAT_PATH: &str = "api/chat";
const CHAT_STREAM_PATH: &str = "api/chat/stream";
const HEALTH_PATH: &str = "api/health";

/// Client for the tutoring service.
#[derive(Clone)]
pub struct TutorClient {
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl TutorClient {
    /// Create a new client.
    ///
    /// The base URL is read from the TUTORIUS_BASE_URL environment variable,
    /// falling back to `http://localhost:8001/`.
    pub fn new() -> Result<Self> {
        Self::with_options(None, None)
    }

    /// Create a new client with custom settings.
    ///
    /// The timeout bounds connecting and, for the single-response endpoint,
    /// the whole exchange. A streamed reply may take as long as the service
    /// keeps the connection open.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = match base_url {
            Some(url) => url,
            None => env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        };
        let base_url = parse_base_url(&base_url)?;

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .connect_timeout(timeout)
            .default_headers(default_headers())
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
            logger: None,
        })
    }

    /// Attach a logger that observes every request made through this client.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Sends a request builder, mapping transport failures and non-success
    /// statuses onto [`Error`].
    async fn execute(&self, builder: RequestBuilder) -> Result<Response> {
        CLIENT_REQUESTS.click();
        let response = builder.send().await.map_err(|e| self.map_send_error(e))?;
        if !response.status().is_success() {
            return Err(process_error_response(response).await);
        }
        Ok(response)
    }

    fn map_send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        response.json::<T>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }

    fn note_error(&self, err: &Error) {
        CLIENT_REQUEST_ERRORS.click();
        if err.is_rate_limit() {
            CLIENT_RATE_LIMITED.click();
        }
        if let Some(logger) = &self.logger {
            logger.log_error(err);
        }
    }

    async fn send_inner(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = self.endpoint(CHAT_PATH)?;
        let builder = self.client.post(url).timeout(self.timeout).json(request);
        let response = self.execute(builder).await?;
        Self::parse_json::<ChatResponse>(response).await
    }

    async fn stream_inner(&self, request: &ChatRequest) -> Result<FragmentStream> {
        let url = self.endpoint(CHAT_STREAM_PATH)?;
        let builder = self
            .client
            .post(url)
            .header(header::ACCEPT, HeaderValue::from_static("text/plain"))
            .json(request);
        let response = self.execute(builder).await?;

        // Convert reqwest errors to our error type
        let bytes = response.bytes_stream().map(|result| {
            result.map_err(|e| {
                STREAM_ERRORS.click();
                if e.status().is_some_and(|status| status.as_u16() == 429) {
                    return Error::rate_limit(format!("Rate limited mid-stream: {e}"), None);
                }
                let e = e.without_url();
                Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e)))
            })
        });
        let fragments: FragmentStream = Box::pin(decode_fragments(bytes));

        Ok(match &self.logger {
            Some(logger) => logged(fragments, Arc::clone(logger)),
            None => fragments,
        })
    }
}

impl fmt::Debug for TutorClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TutorClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

#[async_trait::async_trait]
impl Transport for TutorClient {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse> {
        if let Some(logger) = &self.logger {
            logger.log_request(request);
        }
        let start = Instant::now();
        let result = self.send_inner(request).await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        match &result {
            Ok(response) => {
                if let Some(logger) = &self.logger {
                    logger.log_response(response);
                }
            }
            Err(err) => self.note_error(err),
        }
        result
    }

    async fn stream(&self, request: &ChatRequest) -> Result<FragmentStream> {
        if let Some(logger) = &self.logger {
            logger.log_request(request);
        }
        let start = Instant::now();
        let result = self.stream_inner(request).await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        if let Err(err) = &result {
            self.note_error(err);
        }
        result
    }

    async fn health(&self) -> Result<HealthStatus> {
        let url = self.endpoint(HEALTH_PATH)?;
        let builder = self.client.get(url).timeout(self.timeout);
        let result = match self.execute(builder).await {
            Ok(response) => Self::parse_json::<HealthStatus>(response).await,
            Err(err) => Err(err),
        };
        if let Err(err) = &result {
            self.note_error(err);
        }
        result
    }
}

/// Create and return default headers for API requests.
fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

/// Parses a base URL, making sure relative endpoint paths join beneath it.
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim())?;
    if url.cannot_be_a_base() {
        return Err(Error::validation(
            format!("{raw} cannot be used as a base URL"),
            Some("base_url".to_string()),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Process error responses and convert to our Error type.
async fn process_error_response(response: Response) -> Error {
    let status_code = response.status().as_u16();

    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|val| val.to_str().ok())
        .and_then(|val| val.parse::<u64>().ok());

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            return Error::http_client(
                format!("Failed to read error response: {}", e),
                Some(Box::new(e)),
            );
        }
    };
    let message = error_detail(&body).unwrap_or_else(|| {
        if body.trim().is_empty() {
            format!("HTTP error! status: {status_code}")
        } else {
            body
        }
    });

    error_for_status(status_code, message, retry_after)
}

/// Map HTTP status code to the appropriate error type.
fn error_for_status(status_code: u16, message: String, retry_after: Option<u64>) -> Error {
    match status_code {
        400 => Error::bad_request(message),
        408 => Error::timeout(message, None),
        429 => Error::rate_limit(message, retry_after),
        500 => Error::internal_server(message),
        502..=504 => Error::service_unavailable(message, retry_after),
        _ => Error::api(status_code, message),
    }
}

/// Extracts the message from an error body of the form `{"detail": ...}`.
fn error_detail(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: serde_json::Value,
    }

    let parsed = serde_json::from_str::<ErrorBody>(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(detail) => Some(detail),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Wraps a fragment stream so the logger sees every fragment and the outcome.
fn logged(fragments: FragmentStream, logger: Arc<dyn ClientLogger>) -> FragmentStream {
    Box::pin(stream::unfold(
        Some((fragments, logger, String::new())),
        |state| async move {
            let (mut fragments, logger, mut text) = state?;
            match fragments.next().await {
                Some(Ok(fragment)) => {
                    logger.log_fragment(&fragment);
                    text.push_str(&fragment);
                    Some((Ok(fragment), Some((fragments, logger, text))))
                }
                Some(Err(err)) => {
                    logger.log_error(&err);
                    Some((Err(err), None))
                }
                None => {
                    logger.log_stream_complete(&text);
                    None
                }
            }
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn client_creation() {
        let client = TutorClient::with_options(
            Some("http://tutor.example.com:8001".to_string()),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(client.base_url().as_str(), "http://tutor.example.com:8001/");
        assert_eq!(client.timeout(), Duration::from_secs(30));
        assert_eq!(
            client.endpoint(CHAT_STREAM_PATH).unwrap().as_str(),
            "http://tutor.example.com:8001/api/chat/stream"
        );
    }

    #[test]
    fn base_url_keeps_prefix() {
        let url = parse_base_url("https://example.com/tutor").unwrap();
        assert_eq!(
            url.join(CHAT_PATH).unwrap().as_str(),
            "https://example.com/tutor/api/chat"
        );
    }

    #[test]
    fn base_url_rejects_garbage() {
        assert!(parse_base_url("not a url").is_err());
        assert!(parse_base_url("mailto:tutor@example.com").is_err());
    }

    #[test]
    fn status_mapping() {
        assert!(error_for_status(429, "slow".into(), Some(2)).is_rate_limit());
        assert!(error_for_status(500, "boom".into(), None).is_server_error());
        assert!(error_for_status(503, "busy".into(), None).is_server_error());
        assert_eq!(
            error_for_status(418, "teapot".into(), None).status_code(),
            Some(418)
        );
        assert!(!error_for_status(404, "missing".into(), None).is_rate_limit());
    }

    #[test]
    fn error_detail_shapes() {
        assert_eq!(
            error_detail(r#"{"detail":"Message cannot be empty"}"#).as_deref(),
            Some("Message cannot be empty")
        );
        assert_eq!(
            error_detail(r#"{"detail":[{"loc":["body","message"]}]}"#).as_deref(),
            Some(r#"[{"loc":["body","message"]}]"#)
        );
        assert_eq!(error_detail("Internal Server Error"), None);
    }

    #[derive(Default)]
    struct RecordingLogger {
        entries: Mutex<Vec<String>>,
    }

    impl ClientLogger for RecordingLogger {
        fn log_request(&self, request: &ChatRequest) {
            self.entries
                .lock()
                .unwrap()
                .push(format!("request {}", request.message));
        }

        fn log_response(&self, response: &ChatResponse) {
            self.entries
                .lock()
                .unwrap()
                .push(format!("response {}", response.response));
        }

        fn log_fragment(&self, fragment: &str) {
            self.entries
                .lock()
                .unwrap()
                .push(format!("fragment {fragment}"));
        }

        fn log_stream_complete(&self, text: &str) {
            self.entries
                .lock()
                .unwrap()
                .push(format!("complete {text}"));
        }

        fn log_error(&self, error: &Error) {
            self.entries.lock().unwrap().push(format!("error {error}"));
        }
    }

    #[tokio::test]
    async fn logged_stream_reports_fragments_and_completion() {
        let logger = Arc::new(RecordingLogger::default());
        let fragments: FragmentStream = Box::pin(stream::iter(vec![
            Ok("Hello ".to_string()),
            Ok("world".to_string()),
        ]));
        let collected: Vec<Result<String>> =
            logged(fragments, logger.clone()).collect().await;
        assert_eq!(collected.len(), 2);
        assert_eq!(
            *logger.entries.lock().unwrap(),
            vec![
                "fragment Hello ".to_string(),
                "fragment world".to_string(),
                "complete Hello world".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn logged_stream_reports_errors() {
        let logger = Arc::new(RecordingLogger::default());
        let fragments: FragmentStream = Box::pin(stream::iter(vec![
            Ok("Hel".to_string()),
            Err(Error::streaming("reset", None)),
        ]));
        let collected: Vec<Result<String>> =
            logged(fragments, logger.clone()).collect().await;
        assert!(collected[1].is_err());
        let entries = logger.entries.lock().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1], "error Streaming error: reset");
    }

    #[tokio::test]
    async fn unreachable_service_is_a_connection_error() {
        // Port 9 (discard) on localhost is expected to refuse connections.
        let client = TutorClient::with_options(
            Some("http://127.0.0.1:9/".to_string()),
            Some(Duration::from_secs(2)),
        )
        .unwrap();
        let request = ChatRequest::new("hello", crate::types::Subject::Maths);
        let err = client.send(&request).await.unwrap_err();
        assert!(!err.is_rate_limit());
        assert_eq!(err.user_message(), crate::error::CONNECTION_FAILURE_MESSAGE);
    }
}
