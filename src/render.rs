//! Output rendering for the chat.
//!
//! This module provides the [`Renderer`] trait the chat session drives, the
//! markup rules applied to bot replies, and a plain-text terminal
//! implementation.

use std::io::{self, Stdout, Write};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{Sender, turn::current_time};

/// ANSI escape code for dim text (used for the typing indicator).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text (used for speaker labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the user's label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for the tutor's label).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI sequence that returns to column 0 and erases the line.
const ANSI_CLEAR_LINE: &str = "\r\x1b[2K";

/// Text of the typing indicator.
pub const TYPING_TEXT: &str = "Thinking...";

/// An angle-bracket-delimited tag anywhere in the text.
static HTML_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<[a-z][\s\S]*>").expect("tag pattern should compile"));

/// Returns true if a reply should be inserted as markup rather than text.
///
/// The test is deliberately loose: any trimmed text containing something
/// shaped like `<tag ...>` qualifies. Replies that pass are inserted verbatim
/// into HTML views, so a service that echoes user input can inject markup.
pub fn looks_like_html(text: &str) -> bool {
    HTML_TAG.is_match(text.trim())
}

/// Converts each newline into a `<br>` line break.
pub fn newlines_to_breaks(text: &str) -> String {
    text.replace('\n', "<br>")
}

/// The markup a complete bot reply is rendered with.
pub fn bot_markup(text: &str) -> String {
    if looks_like_html(text) {
        text.to_string()
    } else {
        newlines_to_breaks(text)
    }
}

/// Identifies the bot message being built by one streamed reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamHandle(pub u64);

/// Trait for rendering the conversation.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling on a terminal
/// - A headless view model ([`ChatView`](crate::chat::ChatView)) that keeps
///   the markup an HTML front end would show
/// - Recording fakes in tests
pub trait Renderer: Send {
    /// Append a complete message bubble and scroll to it.
    ///
    /// Bot messages go through [`bot_markup`]: markup-looking replies are
    /// inserted as-is, anything else has its newlines turned into breaks.
    fn append_message(&mut self, text: &str, sender: Sender);

    /// Show the transient typing placeholder.
    fn show_typing_indicator(&mut self);

    /// Remove the typing placeholder. Does nothing if none is shown.
    fn remove_typing_indicator(&mut self);

    /// Create one empty bot bubble that streamed fragments will fill.
    fn begin_streaming_bot_message(&mut self) -> StreamHandle;

    /// Append a fragment to the bubble and re-render it.
    ///
    /// Streamed text is always treated as plain text: newlines become
    /// breaks and the markup test is never applied.
    fn append_stream_fragment(&mut self, handle: StreamHandle, fragment: &str);

    /// Called once no more fragments will arrive for the bubble.
    fn finish_stream(&mut self, handle: StreamHandle) {
        _ = handle;
    }
}

/// Plain text renderer with optional ANSI styling.
///
/// This renderer writes the conversation to stdout. It cannot redraw a line
/// once written, so streamed fragments are printed as they arrive and the
/// typing indicator is erased in place.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    echo_user: bool,
    typing: bool,
    next_handle: u64,
    open_stream: Option<StreamHandle>,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            echo_user: true,
            typing: false,
            next_handle: 0,
            open_stream: None,
        }
    }

    /// Controls whether user messages are printed.
    ///
    /// An interactive prompt has already shown what the user typed.
    pub fn with_user_echo(mut self, echo_user: bool) -> Self {
        self.echo_user = echo_user;
        self
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn label(&self, sender: Sender) -> String {
        let (name, color) = match sender {
            Sender::User => ("You", ANSI_CYAN),
            Sender::Bot => ("Tutor", ANSI_GREEN),
        };
        let time = current_time();
        if self.use_color {
            format!("{ANSI_BOLD}{color}{name}{ANSI_RESET} {ANSI_DIM}{time}{ANSI_RESET}")
        } else {
            format!("{name} [{time}]")
        }
    }

    fn close_stream(&mut self) {
        if self.open_stream.take().is_some() {
            println!();
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn append_message(&mut self, text: &str, sender: Sender) {
        if sender == Sender::User && !self.echo_user {
            return;
        }
        self.close_stream();
        println!("{}: {}", self.label(sender), text.trim_end());
        self.flush();
    }

    fn show_typing_indicator(&mut self) {
        if self.typing {
            return;
        }
        self.typing = true;
        if self.use_color {
            print!("{ANSI_DIM}{TYPING_TEXT}{ANSI_RESET}");
        } else {
            print!("{TYPING_TEXT}");
        }
        self.flush();
    }

    fn remove_typing_indicator(&mut self) {
        if !self.typing {
            return;
        }
        self.typing = false;
        if self.use_color {
            print!("{ANSI_CLEAR_LINE}");
        } else {
            print!("\r{}\r", " ".repeat(TYPING_TEXT.len()));
        }
        self.flush();
    }

    fn begin_streaming_bot_message(&mut self) -> StreamHandle {
        self.close_stream();
        let handle = StreamHandle(self.next_handle);
        self.next_handle += 1;
        println!("{}:", self.label(Sender::Bot));
        self.open_stream = Some(handle);
        self.flush();
        handle
    }

    fn append_stream_fragment(&mut self, handle: StreamHandle, fragment: &str) {
        if self.open_stream != Some(handle) {
            return;
        }
        print!("{fragment}");
        self.flush();
    }

    fn finish_stream(&mut self, handle: StreamHandle) {
        if self.open_stream == Some(handle) {
            self.close_stream();
            self.flush();
        }
    }
}
