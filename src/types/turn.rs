use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::macros::format_description;

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The person typing.
    User,

    /// The tutoring service.
    Bot,
}

/// One rendered message in the conversation.
///
/// Turns are created when a message is sent or received and never change
/// after they are rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// The message text.
    pub text: String,

    /// Who sent it.
    pub sender: Sender,

    /// Local wall-clock time, `HH:MM`.
    pub timestamp: String,
}

impl Turn {
    /// Create a turn stamped with the current local time.
    pub fn new(text: impl Into<String>, sender: Sender) -> Self {
        Self::with_timestamp(text, sender, current_time())
    }

    /// Create a turn with an explicit timestamp.
    pub fn with_timestamp(
        text: impl Into<String>,
        sender: Sender,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            sender,
            timestamp: timestamp.into(),
        }
    }
}

/// Formats the current time as `HH:MM`, local when the offset is known.
pub fn current_time() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    format_clock(now)
}

fn format_clock(datetime: OffsetDateTime) -> String {
    let format = format_description!("[hour]:[minute]");
    datetime
        .format(&format)
        .unwrap_or_else(|_| format!("{:02}:{:02}", datetime.hour(), datetime.minute()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn clock_is_zero_padded() {
        assert_eq!(format_clock(datetime!(2024-03-01 09:05 UTC)), "09:05");
        assert_eq!(format_clock(datetime!(2024-03-01 23:59:59 UTC)), "23:59");
    }

    #[test]
    fn current_time_shape() {
        let stamp = current_time();
        assert_eq!(stamp.len(), 5);
        assert_eq!(&stamp[2..3], ":");
    }

    #[test]
    fn sender_serialization() {
        assert_eq!(serde_json::to_string(&Sender::Bot).unwrap(), "\"bot\"");
        let turn = Turn::with_timestamp("hi", Sender::User, "10:00");
        assert_eq!(
            serde_json::to_value(&turn).unwrap(),
            serde_json::json!({"text": "hi", "sender": "user", "timestamp": "10:00"})
        );
    }
}
