use std::str::FromStr;

use thiserror::Error;

/// Prefix marking operator commands unless configured otherwise.
pub const DEFAULT_COMMAND_PREFIX: &str = "/";

/// Operator command typed at the kiosk, e.g. `/stop` with the default prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KioskCommand {
    Start,
    Stop,
    Restart,
    /// Code typed by hand, e.g. from a damaged ticket. Submitted when a form
    /// is configured.
    Manual(String),
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command '{0}' (try start, stop, restart, manual <code>, quit)")]
    Unknown(String),
    #[error("manual needs a code")]
    MissingCode,
}

/// Parses a command with its prefix already removed.
impl FromStr for KioskCommand {
    type Err = CommandError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let (name, rest) = raw
            .split_once(char::is_whitespace)
            .map_or((raw, ""), |(name, rest)| (name, rest.trim()));

        match name.to_ascii_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "restart" => Ok(Self::Restart),
            "quit" | "exit" => Ok(Self::Quit),
            "manual" if rest.is_empty() => Err(CommandError::MissingCode),
            "manual" => Ok(Self::Manual(rest.to_string())),
            _ => Err(CommandError::Unknown(name.to_string())),
        }
    }
}

/// One line read from the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Text from the reader, passed to the camera as a decoded frame.
    Scan(String),
    Command(KioskCommand),
}

impl Input {
    /// Lines starting with `prefix` are commands, anything else is a scan.
    /// Blank lines yield `None`.
    pub fn parse(line: &str, prefix: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        match line.strip_prefix(prefix) {
            Some(command) if !prefix.is_empty() => {
                command.parse().map(|command| Some(Self::Command(command)))
            }
            _ => Ok(Some(Self::Scan(line.to_string()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Option<Input>, CommandError> {
        Input::parse(line, DEFAULT_COMMAND_PREFIX)
    }

    #[test]
    fn parses_commands_and_scans() {
        assert_eq!(
            parse("/STOP").unwrap(),
            Some(Input::Command(KioskCommand::Stop))
        );
        assert_eq!(
            parse("  /manual   EVT-12 ").unwrap(),
            Some(Input::Command(KioskCommand::Manual("EVT-12".into())))
        );
        assert_eq!(
            parse("EVT-123\r").unwrap(),
            Some(Input::Scan("EVT-123".into()))
        );
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn reports_bad_commands() {
        assert_eq!(parse("/manual"), Err(CommandError::MissingCode));
        assert_eq!(
            parse("/dance now"),
            Err(CommandError::Unknown("dance".into()))
        );
    }

    #[test]
    fn custom_prefix_lets_slash_codes_through() {
        assert_eq!(
            Input::parse("/stop", "::").unwrap(),
            Some(Input::Scan("/stop".into()))
        );
        assert_eq!(
            Input::parse("::stop", "::").unwrap(),
            Some(Input::Command(KioskCommand::Stop))
        );
        assert_eq!(
            Input::parse("::manual /A1", "::").unwrap(),
            Some(Input::Command(KioskCommand::Manual("/A1".into())))
        );
    }
}
