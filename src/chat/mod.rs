//! Chat front end for the tutoring service.
//!
//! This module turns user actions into requests and replies into rendered
//! messages. It supports:
//!
//! - Streaming replies rendered fragment by fragment
//! - A single-response fallback through the same gate
//! - Subject tabs and per-subject example questions
//! - Slash commands for the terminal REPL
//!
//! # Architecture
//!
//! - [`gate`]: the single-in-flight busy flag and the controls it toggles
//! - [`view`]: a headless chat surface implementing both renderer and controls
//! - [`session`]: the request lifecycle, from gate to rendered reply
//! - [`config`]: CLI argument parsing and configuration
//! - [`commands`]: Slash command parsing

mod commands;
mod config;
pub mod gate;
mod session;
pub mod view;

pub use crate::render::{PlainTextRenderer, Renderer, StreamHandle};
pub use commands::{ChatCommand, TabTarget, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, ConfigFile};
pub use gate::{Controls, InputGate};
pub use session::{ChatSession, ReplyMode, SendOutcome, SessionStats};
pub use view::{Bubble, ChatView, Example, ExampleList, InputBox, Tab, TabBar};
