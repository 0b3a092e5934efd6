//! Parsing of prompt input.
//!
//! Lines starting with `/` are commands, anything else is published to the
//! open room.

use thiserror::Error;

use crate::domain::RoomId;

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// `/rooms`
    Rooms,
    /// `/join <room>`
    Join(RoomId),
    /// `/leave`
    Leave,
    /// `/unsubscribe`
    Unsubscribe,
    /// `/read`
    Read,
    /// `/history`
    History,
    /// `/who`
    Who,
    /// `/help`
    Help,
    /// `/quit`
    Quit,
    Publish(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("/{0} needs an argument")]
    MissingArgument(&'static str),

    #[error("unknown command: /{0} (try /help)")]
    UnknownCommand(String),
}

pub const HELP: &str = "\
Commands:
  /rooms           list subscribed rooms
  /join <room>     open a room (leaves the current one)
  /leave           leave the open room
  /unsubscribe     leave the open room and unsubscribe from it
  /read            mark the open room as read
  /history         load older messages
  /who             show the open room's roster
  /quit            exit
Anything else is sent to the open room.
";

impl UserCommand {
    /// Parse one non-empty, trimmed input line.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(UserCommand::Publish(line.to_string()));
        };

        let (name, argument) = match rest.split_once(char::is_whitespace) {
            Some((name, argument)) => (name, argument.trim()),
            None => (rest, ""),
        };

        match name {
            "rooms" => Ok(UserCommand::Rooms),
            "join" if argument.is_empty() => Err(ParseError::MissingArgument("join")),
            "join" => Ok(UserCommand::Join(RoomId::new(argument))),
            "leave" => Ok(UserCommand::Leave),
            "unsubscribe" => Ok(UserCommand::Unsubscribe),
            "read" => Ok(UserCommand::Read),
            "history" => Ok(UserCommand::History),
            "who" => Ok(UserCommand::Who),
            "help" => Ok(UserCommand::Help),
            "quit" | "exit" => Ok(UserCommand::Quit),
            other => Err(ParseError::UnknownCommand(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_published() {
        // テスト項目: スラッシュで始まらない行はそのまま publish になる
        // given (前提条件):
        let line = "hello everyone";

        // when (操作):
        let command = UserCommand::parse(line);

        // then (期待する結果):
        assert_eq!(command, Ok(UserCommand::Publish("hello everyone".to_string())));
    }

    #[test]
    fn test_join_takes_room_argument() {
        // テスト項目: /join は部屋 ID を引数に取り、前後の空白は除去される
        // given (前提条件):
        let line = "/join   general ";

        // when (操作):
        let command = UserCommand::parse(line);

        // then (期待する結果):
        assert_eq!(command, Ok(UserCommand::Join(RoomId::new("general"))));
    }

    #[test]
    fn test_join_without_argument_fails() {
        // テスト項目: 引数なしの /join はエラーになる
        // given (前提条件):
        let line = "/join";

        // when (操作):
        let command = UserCommand::parse(line);

        // then (期待する結果):
        assert_eq!(command, Err(ParseError::MissingArgument("join")));
    }

    #[test]
    fn test_simple_commands() {
        // テスト項目: 引数なしのコマンドがそれぞれ対応する種類に変換される
        // given (前提条件):
        let cases = [
            ("/rooms", UserCommand::Rooms),
            ("/leave", UserCommand::Leave),
            ("/unsubscribe", UserCommand::Unsubscribe),
            ("/read", UserCommand::Read),
            ("/history", UserCommand::History),
            ("/who", UserCommand::Who),
            ("/help", UserCommand::Help),
            ("/quit", UserCommand::Quit),
            ("/exit", UserCommand::Quit),
        ];

        for (line, expected) in cases {
            // when (操作):
            let command = UserCommand::parse(line);

            // then (期待する結果):
            assert_eq!(command, Ok(expected), "line: {line}");
        }
    }

    #[test]
    fn test_unknown_command_fails() {
        // テスト項目: 未知のコマンドはエラーになる
        // given (前提条件):
        let line = "/dance now";

        // when (操作):
        let command = UserCommand::parse(line);

        // then (期待する結果):
        assert_eq!(command, Err(ParseError::UnknownCommand("dance".to_string())));
    }
}
