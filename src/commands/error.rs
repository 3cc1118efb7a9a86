//! Command Errors
//!
//! The four failure kinds a command invocation can end in. Validation
//! failures are raised before the store is touched; store failures are
//! wrapped as-is.

use crate::storage::StoreError;
use thiserror::Error;

/// Message used when a numeric argument does not parse.
pub const NOT_AN_INTEGER: &str = "value is not an integer or out of range";

/// Why a command produced no reply value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Wrong number or shape of arguments
    #[error("wrong number of arguments for '{command}' command")]
    WrongArity { command: String },

    /// An argument is present but cannot be parsed
    #[error("{0}")]
    InvalidValue(String),

    /// No command registered under this name
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// Failure reported by the store, passed through unchanged
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CommandError {
    pub fn wrong_arity(command: impl Into<String>) -> Self {
        CommandError::WrongArity {
            command: command.into(),
        }
    }

    /// The standard "not an integer" value error.
    pub fn not_an_integer() -> Self {
        CommandError::InvalidValue(NOT_AN_INTEGER.to_string())
    }

    /// Text sent to the client, including the `ERR` prefix.
    pub fn reply_message(&self) -> String {
        format!("ERR {}", self)
    }
}

/// Result of a single command invocation.
pub type CommandResult = Result<crate::commands::Reply, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_messages() {
        assert_eq!(
            CommandError::wrong_arity("get").reply_message(),
            "ERR wrong number of arguments for 'get' command"
        );
        assert_eq!(
            CommandError::not_an_integer().reply_message(),
            "ERR value is not an integer or out of range"
        );
        assert_eq!(
            CommandError::UnknownCommand("foo".into()).reply_message(),
            "ERR unknown command 'foo'"
        );
        assert_eq!(
            CommandError::from(StoreError::Overflow).reply_message(),
            "ERR increment or decrement would overflow"
        );
    }
}
