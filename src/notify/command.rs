//! Operator command parsing.

/// Supported operator commands.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchCommand {
    /// `/status` or `/ping`.
    Status,
    /// `/threshold <apr>`.
    SetThreshold(f64),
    /// `/heartbeat on|off`.
    SetHeartbeat(bool),
}

/// Parse error for command messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    NotACommand,
    UnknownCommand(String),
    MissingArgument(&'static str),
    InvalidValue(String),
}

impl CommandParseError {
    /// A known command with a bad argument, as opposed to noise to ignore.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            CommandParseError::MissingArgument(_) | CommandParseError::InvalidValue(_)
        )
    }
}

impl std::fmt::Display for CommandParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotACommand => write!(f, "message is not a command"),
            Self::UnknownCommand(cmd) => write!(f, "unknown command `{cmd}`"),
            Self::MissingArgument(name) => write!(f, "missing argument `{name}`"),
            Self::InvalidValue(value) => write!(f, "invalid value `{value}`"),
        }
    }
}

impl std::error::Error for CommandParseError {}

/// Parse a message text or button payload.
pub fn parse_command(text: &str) -> Result<WatchCommand, CommandParseError> {
    let lowered = text.trim().to_lowercase();
    let mut parts = lowered.split_whitespace();
    let Some(raw_command) = parts.next() else {
        return Err(CommandParseError::NotACommand);
    };
    if !raw_command.starts_with('/') {
        return Err(CommandParseError::NotACommand);
    }

    // `/status@my_bot` in group chats
    let command = raw_command
        .split_once('@')
        .map_or(raw_command, |(head, _)| head);

    match command {
        "/status" | "/ping" => Ok(WatchCommand::Status),
        "/threshold" => {
            let raw = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("apr"))?;
            let value: f64 = raw
                .trim_end_matches('%')
                .parse()
                .map_err(|_| CommandParseError::InvalidValue(raw.to_string()))?;
            Ok(WatchCommand::SetThreshold(value))
        }
        "/heartbeat" => {
            let raw = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("on|off"))?;
            match raw {
                "on" | "true" | "1" => Ok(WatchCommand::SetHeartbeat(true)),
                "off" | "false" | "0" => Ok(WatchCommand::SetHeartbeat(false)),
                other => Err(CommandParseError::InvalidValue(other.to_string())),
            }
        }
        other => Err(CommandParseError::UnknownCommand(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_aliases() {
        assert_eq!(parse_command("/status"), Ok(WatchCommand::Status));
        assert_eq!(parse_command("  /PING "), Ok(WatchCommand::Status));
        assert_eq!(parse_command("/status@funding_bot"), Ok(WatchCommand::Status));
    }

    #[test]
    fn threshold_values() {
        assert_eq!(parse_command("/threshold 12.5"), Ok(WatchCommand::SetThreshold(12.5)));
        assert_eq!(parse_command("/threshold 8%"), Ok(WatchCommand::SetThreshold(8.0)));
        assert_eq!(
            parse_command("/threshold lots"),
            Err(CommandParseError::InvalidValue("lots".into()))
        );
        assert_eq!(
            parse_command("/threshold"),
            Err(CommandParseError::MissingArgument("apr"))
        );
    }

    #[test]
    fn heartbeat_toggle() {
        assert_eq!(parse_command("/heartbeat on"), Ok(WatchCommand::SetHeartbeat(true)));
        assert_eq!(parse_command("/heartbeat OFF"), Ok(WatchCommand::SetHeartbeat(false)));
        assert!(parse_command("/heartbeat maybe").unwrap_err().is_invalid_argument());
    }

    #[test]
    fn noise_is_not_an_argument_error() {
        let plain = parse_command("hello there").unwrap_err();
        assert_eq!(plain, CommandParseError::NotACommand);
        assert!(!plain.is_invalid_argument());
        let unknown = parse_command("/buy BTC").unwrap_err();
        assert!(!unknown.is_invalid_argument());
        assert_eq!(parse_command(""), Err(CommandParseError::NotACommand));
    }
}
