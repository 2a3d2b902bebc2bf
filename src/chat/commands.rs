//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the chat session without sending messages
//! to the service.

/// Which tab a `/tab` command selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabTarget {
    /// One-based position in the tab bar.
    Index(usize),
    /// Case-insensitive fragment of the tab's label.
    Name(String),
}

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Clear the conversation.
    Clear,

    /// List the tabs, marking the active one.
    ListTabs,

    /// Switch the active tab.
    Tab(TabTarget),

    /// List the example questions for the active tab.
    Examples,

    /// Send the example with the given one-based number.
    Example(usize),

    /// Choose streaming (`true`) or single-response (`false`) replies.
    Stream(bool),

    /// Ask the service whether it is up.
    Health,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Display session statistics.
    Stats,

    /// Show the current configuration.
    ShowConfig,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a valid command,
/// or `None` if it should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use tutorius::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/tab physics").is_some());
/// assert!(parse_command("What is a mole?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "clear" => ChatCommand::Clear,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "stats" | "status" => ChatCommand::Stats,
        "config" => ChatCommand::ShowConfig,
        "health" => ChatCommand::Health,
        "tab" | "tabs" | "subject" => match argument {
            None => ChatCommand::ListTabs,
            Some(arg) => match arg.parse::<usize>() {
                Ok(0) => ChatCommand::Invalid("/tab numbers start at 1".to_string()),
                Ok(index) => ChatCommand::Tab(TabTarget::Index(index)),
                Err(_) => ChatCommand::Tab(TabTarget::Name(arg.to_string())),
            },
        },
        "examples" => ChatCommand::Examples,
        "example" | "ex" => match argument {
            Some(arg) => match arg.parse::<usize>() {
                Ok(0) | Err(_) => {
                    ChatCommand::Invalid("/example expects a number from /examples".to_string())
                }
                Ok(index) => ChatCommand::Example(index),
            },
            None => ChatCommand::Examples,
        },
        "stream" => match argument.and_then(parse_on_off) {
            Some(value) => ChatCommand::Stream(value),
            None => ChatCommand::Invalid("/stream expects 'on' or 'off'".to_string()),
        },
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

fn parse_on_off(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" => Some(true),
        "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /clear                 Clear the conversation
  /tab                   List subjects
  /tab <name|n>          Switch subject (e.g., /tab physics or /tab 2)
  /examples              List example questions for the subject
  /example <n>           Ask example question n
  /stream on|off         Stream replies or wait for the whole answer
  /health                Check that the tutoring service is up
  /stats                 Show session statistics
  /config                Show current configuration
  /help                  Show this help message
  /quit                  Exit the chat"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_clear() {
        assert_eq!(parse_command("/clear"), Some(ChatCommand::Clear));
        assert_eq!(parse_command("/CLEAR"), Some(ChatCommand::Clear));
    }

    #[test]
    fn parse_tab() {
        assert_eq!(parse_command("/tab"), Some(ChatCommand::ListTabs));
        assert_eq!(
            parse_command("/tab   Physics "),
            Some(ChatCommand::Tab(TabTarget::Name("Physics".to_string())))
        );
        assert_eq!(
            parse_command("/subject 3"),
            Some(ChatCommand::Tab(TabTarget::Index(3)))
        );
        assert!(matches!(
            parse_command("/tab 0"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("start at 1")
        ));
    }

    #[test]
    fn parse_examples() {
        assert_eq!(parse_command("/examples"), Some(ChatCommand::Examples));
        assert_eq!(parse_command("/example"), Some(ChatCommand::Examples));
        assert_eq!(parse_command("/example 2"), Some(ChatCommand::Example(2)));
        assert_eq!(parse_command("/ex 5"), Some(ChatCommand::Example(5)));
        assert!(matches!(
            parse_command("/example two"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("expects")
        ));
        assert!(matches!(
            parse_command("/example 0"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn parse_stream_toggle() {
        assert_eq!(parse_command("/stream on"), Some(ChatCommand::Stream(true)));
        assert_eq!(
            parse_command("/stream OFF"),
            Some(ChatCommand::Stream(false))
        );
        assert!(matches!(
            parse_command("/stream maybe"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("expects")
        ));
        assert!(matches!(
            parse_command("/stream"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn parse_stats_config_health() {
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/config"), Some(ChatCommand::ShowConfig));
        assert_eq!(parse_command("/health"), Some(ChatCommand::Health));
        assert_eq!(parse_command("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("What is velocity?"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
        assert_eq!(parse_command("1/2 of 10"), None);
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            parse_command("/model x"),
            Some(ChatCommand::Invalid("Unknown command: /model".to_string()))
        );
    }

    #[test]
    fn help_mentions_every_command() {
        let help = help_text();
        for command in [
            "/clear", "/tab", "/examples", "/example", "/stream", "/health", "/stats", "/config",
            "/help", "/quit",
        ] {
            assert!(help.contains(command), "{command} missing from help");
        }
    }
}
