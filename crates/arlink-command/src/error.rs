use crate::id::CommandId;

/// Errors that can occur while encoding or decoding commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// No decoder is registered for the identifier.
    #[error("unknown command {0}")]
    UnknownCommand(CommandId),

    /// The buffer ended before the identifier or an argument was complete.
    #[error("truncated command: needed {needed} more bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    /// A string argument has no NUL terminator or is not valid UTF-8.
    #[error("invalid string argument: {0}")]
    InvalidString(String),

    /// An enum argument carries a value outside the known set.
    #[error("invalid value {value} for enum {name}")]
    InvalidEnum { name: &'static str, value: i32 },
}

pub type Result<T> = std::result::Result<T, CommandError>;
