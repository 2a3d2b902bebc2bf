//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg`, an optional YAML
//! configuration file, and the resolved [`ChatConfig`]. Settings are layered
//! as defaults, then the file, then `TUTORIUS_BASE_URL`, then flags.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use arrrg_derive::CommandLine;
use serde::{Deserialize, Serialize};

use crate::chat::session::ReplyMode;
use crate::client::{BASE_URL_ENV, DEFAULT_TIMEOUT, TutorClient};
use crate::error::{Error, Result};
use crate::types::Subject;

/// Command-line arguments shared by the tutorius binaries.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Base URL of the tutoring service.
    #[arrrg(optional, "Service URL (default: http://localhost:8001/)", "URL")]
    pub base_url: Option<String>,

    /// Subject tab selected at start.
    #[arrrg(optional, "Subject: physics, chemistry, maths (default: maths)", "SUBJECT")]
    pub subject: Option<String>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: 60)", "SECONDS")]
    pub timeout: Option<u64>,

    /// Path to a YAML configuration file.
    #[arrrg(optional, "YAML configuration file", "PATH")]
    pub config: Option<String>,

    /// Wait for whole replies instead of streaming.
    #[arrrg(flag, "Wait for the whole reply instead of streaming")]
    pub no_stream: bool,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Contents of a YAML configuration file. Every key is optional.
///
/// ```yaml
/// base_url: http://tutor.internal:8001/
/// subject: physics
/// stream: false
/// timeout_secs: 30
/// use_color: true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_color: Option<bool>,
}

impl ConfigFile {
    /// Parses a configuration file from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| {
            Error::serialization(format!("Invalid configuration: {}", e), Some(Box::new(e)))
        })
    }

    /// Reads and parses the configuration file at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).map_err(|err| {
            Error::io(
                format!("failed to read configuration file {}", path.display()),
                err,
            )
        })?;
        Self::from_yaml(&yaml)
    }
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after layering the
/// configuration file, the environment and command-line arguments over the
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Service base URL; `None` defers to the client's default.
    pub base_url: Option<String>,

    /// The subject whose tab is active at start.
    pub subject: Subject,

    /// Whether replies stream.
    pub mode: ReplyMode,

    /// Connect timeout, and whole-request timeout for single replies.
    pub timeout: Duration,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Base URL: client default
    /// - Subject: maths
    /// - Replies: streaming
    /// - Timeout: 60 seconds
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            base_url: None,
            subject: Subject::default(),
            mode: ReplyMode::Streaming,
            timeout: DEFAULT_TIMEOUT,
            use_color: true,
        }
    }

    /// Resolves the configuration for `args`, reading the configuration file
    /// it names and the environment.
    pub fn load(args: ChatArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => Some(ConfigFile::from_path(path)?),
            None => None,
        };
        Self::layered(args, file, env::var(BASE_URL_ENV).ok())
    }

    fn layered(
        args: ChatArgs,
        file: Option<ConfigFile>,
        env_base_url: Option<String>,
    ) -> Result<Self> {
        let mut config = Self::new();
        if let Some(file) = file {
            config.apply_file(file);
        }
        if let Some(base_url) = env_base_url.filter(|url| !url.trim().is_empty()) {
            config.base_url = Some(base_url);
        }
        config.apply_args(args)?;
        Ok(config)
    }

    fn apply_file(&mut self, file: ConfigFile) {
        if let Some(base_url) = file.base_url {
            self.base_url = Some(base_url);
        }
        if let Some(subject) = file.subject {
            self.subject = subject;
        }
        if let Some(stream) = file.stream {
            self.mode = if stream {
                ReplyMode::Streaming
            } else {
                ReplyMode::Single
            };
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(use_color) = file.use_color {
            self.use_color = use_color;
        }
    }

    fn apply_args(&mut self, args: ChatArgs) -> Result<()> {
        if let Some(base_url) = args.base_url {
            self.base_url = Some(base_url);
        }
        if let Some(subject) = args.subject {
            self.subject = subject
                .parse()
                .map_err(|msg: String| Error::validation(msg, Some("subject".to_string())))?;
        }
        if let Some(secs) = args.timeout {
            if secs == 0 {
                return Err(Error::validation(
                    "timeout must be at least one second",
                    Some("timeout".to_string()),
                ));
            }
            self.timeout = Duration::from_secs(secs);
        }
        if args.no_stream {
            self.mode = ReplyMode::Single;
        }
        if args.no_color {
            self.use_color = false;
        }
        Ok(())
    }

    /// Sets the service base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the subject active at start.
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subject = subject;
        self
    }

    /// Sets the reply mode.
    pub fn with_mode(mut self, mode: ReplyMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Builds a client for the configured service.
    pub fn client(&self) -> Result<TutorClient> {
        TutorClient::with_options(self.base_url.clone(), Some(self.timeout))
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert!(config.base_url.is_none());
        assert_eq!(config.subject, Subject::Maths);
        assert_eq!(config.mode, ReplyMode::Streaming);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(config.use_color);
    }

    #[test]
    fn config_from_args_defaults() {
        let config = ChatConfig::layered(ChatArgs::default(), None, None).unwrap();
        assert_eq!(config, ChatConfig::new());
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            base_url: Some("http://tutor:9000".to_string()),
            subject: Some("Chemistry".to_string()),
            timeout: Some(5),
            config: None,
            no_stream: true,
            no_color: true,
        };
        let config = ChatConfig::layered(args, None, None).unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://tutor:9000"));
        assert_eq!(config.subject, Subject::Chemistry);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.mode, ReplyMode::Single);
        assert!(!config.use_color);
    }

    #[test]
    fn layers_apply_in_order() {
        let file = ConfigFile::from_yaml(
            "base_url: http://from-file/\nsubject: physics\nstream: false\ntimeout_secs: 30\nuse_color: false\n",
        )
        .unwrap();

        let config = ChatConfig::layered(ChatArgs::default(), Some(file.clone()), None).unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://from-file/"));
        assert_eq!(config.subject, Subject::Physics);
        assert_eq!(config.mode, ReplyMode::Single);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(!config.use_color);

        let config = ChatConfig::layered(
            ChatArgs::default(),
            Some(file.clone()),
            Some("http://from-env/".to_string()),
        )
        .unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://from-env/"));

        let args = ChatArgs {
            base_url: Some("http://from-flag/".to_string()),
            subject: Some("maths".to_string()),
            ..ChatArgs::default()
        };
        let config =
            ChatConfig::layered(args, Some(file), Some("http://from-env/".to_string())).unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://from-flag/"));
        assert_eq!(config.subject, Subject::Maths);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let args = ChatArgs {
            subject: Some("biology".to_string()),
            ..ChatArgs::default()
        };
        let err = ChatConfig::layered(args, None, None).unwrap_err();
        assert!(err.is_validation());

        let args = ChatArgs {
            timeout: Some(0),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::layered(args, None, None).unwrap_err().is_validation());

        assert!(ConfigFile::from_yaml("colour: true\n").is_err());
        assert!(ConfigFile::from_yaml("subject: biology\n").is_err());
        assert_eq!(ConfigFile::from_yaml("{}").unwrap(), ConfigFile::default());
    }

    #[test]
    fn missing_config_file_is_an_io_error() {
        let err = ConfigFile::from_path("/nonexistent/tutorius.yaml").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new()
            .with_base_url("http://tutor/")
            .with_subject(Subject::Physics)
            .with_mode(ReplyMode::Single)
            .with_timeout(Duration::from_secs(10))
            .without_color();
        assert_eq!(config.base_url.as_deref(), Some("http://tutor/"));
        assert_eq!(config.subject, Subject::Physics);
        assert_eq!(config.mode, ReplyMode::Single);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(!config.use_color);

        let client = config.client().unwrap();
        assert_eq!(client.base_url().as_str(), "http://tutor/");
        assert_eq!(client.timeout(), Duration::from_secs(10));
    }
}
