use std::fmt;

/// Result codes carried in the size field of a failure frame.
#[repr(i32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CommandResult {
    LinkFailure = -3,
    NeedsConsole = -2,
    NotImplemented = -1,
    Failure = 1,
    WrongUsage = 2,
    NotFound = 3,
}

impl CommandResult {
    /// Success (0) is not a failure code and maps to `None` like any unknown value.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -3 => Some(CommandResult::LinkFailure),
            -2 => Some(CommandResult::NeedsConsole),
            -1 => Some(CommandResult::NotImplemented),
            1 => Some(CommandResult::Failure),
            2 => Some(CommandResult::WrongUsage),
            3 => Some(CommandResult::NotFound),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }

    fn describe(self) -> &'static str {
        match self {
            CommandResult::LinkFailure => "CR_LINK_FAILURE: RPC call failed due to I/O or protocol error",
            CommandResult::NeedsConsole => {
                "CR_NEEDS_CONSOLE: attempt to call interactive command without console"
            }
            CommandResult::NotImplemented => {
                "CR_NOT_IMPLEMENTED: command not implemented, or plugin not loaded"
            }
            CommandResult::Failure => "CR_FAILURE: failure",
            CommandResult::WrongUsage => "CR_WRONG_USAGE: wrong arguments or ui state",
            CommandResult::NotFound => "CR_NOT_FOUND: target object not found",
        }
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Every way a connection or a single call can fail.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid handshake")]
    InvalidHandshake,

    /// Declared payload size outside `0..=MAX_MESSAGE_SIZE`.
    #[error("protocol violation: declared message size {0}")]
    BadSize(i32),

    #[error("message too large: {0} bytes")]
    MessageTooLarge(usize),

    #[error("unexpected frame id {0} in response")]
    UnexpectedFrame(i16),

    #[error("failure frame carried unknown error code {0}")]
    UnknownErrorCode(i32),

    #[error("{0}")]
    Command(CommandResult),

    #[error("RPC method not found: {}::{method}", .plugin.as_deref().unwrap_or(""))]
    MethodNotFound {
        method: String,
        plugin: Option<String>,
    },

    #[error(
        "wrong signature for RPC method {}::{method}: ({input:?} vs {expected_input:?}, {output:?} vs {expected_output:?})",
        .plugin.as_deref().unwrap_or("")
    )]
    SignatureMismatch {
        method: String,
        plugin: Option<String>,
        input: String,
        output: String,
        expected_input: String,
        expected_output: String,
    },

    #[error("bind assigned out-of-range method id {0}")]
    BadMethodId(i32),

    #[error("connection lock poisoned by a panicked call")]
    Poisoned,

    #[error("connection closed after an earlier fatal error")]
    Closed,

    #[error("decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("encode error: {0}")]
    Encode(#[from] prost::EncodeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    /// Whether the stream can no longer be trusted after this error.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::Command(_)
                | Error::MethodNotFound { .. }
                | Error::SignatureMismatch { .. }
                | Error::MessageTooLarge(_)
                | Error::UnknownErrorCode(_)
                | Error::BadMethodId(_)
        )
    }

    /// The wire code this error is relayed as, if it is a per-call failure.
    pub fn command_result(&self) -> Option<CommandResult> {
        match self {
            Error::Command(cr) => Some(*cr),
            _ => None,
        }
    }
}

impl From<CommandResult> for Error {
    fn from(cr: CommandResult) -> Self {
        Error::Command(cr)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
