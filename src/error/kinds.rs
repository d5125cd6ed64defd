use std::{fmt, io};

/// Crate-wide `Result` type using [`ArgcompError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, ArgcompError>;

/// Top-level error type for argcomp operations.
///
/// None of these errors ever reach the invoking shell: the completion path
/// turns every failure into an empty candidate list or a warning.
#[derive(Debug)]
pub enum ArgcompError {
    /// Configuration errors.
    Config(ConfigError),

    /// Argument spec tree errors.
    Spec(SpecError),

    /// A completion source failed.
    Completer(CompleterError),

    /// Shell protocol errors (decode or output channel).
    Protocol(ProtocolError),

    /// I/O errors.
    Io(io::Error),

    /// JSON (de)serialization errors.
    Json(serde_json::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },
}

/// Errors found while loading or validating a spec tree.
#[derive(Debug)]
pub enum SpecError {
    /// Spec file not found.
    FileNotFound(String),

    /// A flag name was declared twice within one command scope.
    DuplicateFlag { command: String, name: String },

    /// A sub-command name or alias was declared twice under one parent.
    DuplicateSubcommand { command: String, name: String },

    /// A flag name does not start with one of the scope's prefix characters.
    InvalidFlagName { command: String, name: String },

    /// A positional name starts with a prefix character.
    InvalidPositionalName { command: String, name: String },

    /// An action was declared without any name.
    MissingName(String),
}

/// Errors raised by completion sources.
#[derive(Debug)]
pub enum CompleterError {
    /// The completer reported a failure.
    Failed { completer: String, message: String },

    /// The completer panicked.
    Panicked { completer: String, message: String },
}

/// Shell protocol errors.
#[derive(Debug)]
pub enum ProtocolError {
    /// The output channel could not be opened.
    ChannelUnavailable(String),

    /// Writing the response failed.
    WriteFailed(String),

    /// Unknown shell identifier.
    UnknownShell(String),
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for ArgcompError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgcompError::Config(e) => write!(f, "Configuration error: {e}"),
            ArgcompError::Spec(e) => write!(f, "Spec error: {e}"),
            ArgcompError::Completer(e) => write!(f, "{e}"),
            ArgcompError::Protocol(e) => write!(f, "Protocol error: {e}"),
            ArgcompError::Io(e) => write!(f, "I/O error: {e}"),
            ArgcompError::Json(e) => write!(f, "JSON error: {e}"),
            ArgcompError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
        }
    }
}

impl fmt::Display for SpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecError::FileNotFound(path) => write!(f, "Spec file not found: {path}"),
            SpecError::DuplicateFlag { command, name } => {
                write!(f, "Flag '{name}' declared twice in '{command}'")
            }
            SpecError::DuplicateSubcommand { command, name } => {
                write!(f, "Sub-command '{name}' declared twice under '{command}'")
            }
            SpecError::InvalidFlagName { command, name } => {
                write!(f, "Flag '{name}' in '{command}' does not start with a prefix character")
            }
            SpecError::InvalidPositionalName { command, name } => {
                write!(f, "Positional '{name}' in '{command}' starts with a prefix character")
            }
            SpecError::MissingName(command) => {
                write!(f, "Action without a name in '{command}'")
            }
        }
    }
}

impl fmt::Display for CompleterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompleterError::Failed { completer, message } => {
                write!(f, "Completer '{completer}' failed: {message}")
            }
            CompleterError::Panicked { completer, message } => {
                write!(f, "Completer '{completer}' panicked: {message}")
            }
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::ChannelUnavailable(msg) => {
                write!(f, "Output channel unavailable: {msg}")
            }
            ProtocolError::WriteFailed(msg) => write!(f, "Failed to write response: {msg}"),
            ProtocolError::UnknownShell(name) => write!(f, "Unknown shell: {name}"),
        }
    }
}

impl std::error::Error for ArgcompError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArgcompError::Io(e) => Some(e),
            ArgcompError::Json(e) => Some(e),
            _ => None,
        }
    }
}
impl std::error::Error for ConfigError {}
impl std::error::Error for SpecError {}
impl std::error::Error for CompleterError {}
impl std::error::Error for ProtocolError {}

impl CompleterError {
    /// Convenience constructor for a failed completer.
    pub fn failed(completer: impl Into<String>, message: impl Into<String>) -> Self {
        CompleterError::Failed {
            completer: completer.into(),
            message: message.into(),
        }
    }
}

/* ========================= Conversions to ArgcompError ========================= */

impl From<io::Error> for ArgcompError {
    fn from(err: io::Error) -> Self {
        ArgcompError::Io(err)
    }
}

impl From<serde_json::Error> for ArgcompError {
    fn from(err: serde_json::Error) -> Self {
        ArgcompError::Json(err)
    }
}

impl From<toml::de::Error> for ArgcompError {
    fn from(err: toml::de::Error) -> Self {
        ArgcompError::Config(ConfigError::InvalidFormat(err.to_string()))
    }
}

impl From<toml::ser::Error> for ArgcompError {
    fn from(err: toml::ser::Error) -> Self {
        ArgcompError::Config(ConfigError::InvalidFormat(err.to_string()))
    }
}

impl From<ConfigError> for ArgcompError {
    fn from(err: ConfigError) -> Self {
        ArgcompError::Config(err)
    }
}

impl From<SpecError> for ArgcompError {
    fn from(err: SpecError) -> Self {
        ArgcompError::Spec(err)
    }
}

impl From<CompleterError> for ArgcompError {
    fn from(err: CompleterError) -> Self {
        ArgcompError::Completer(err)
    }
}

impl From<ProtocolError> for ArgcompError {
    fn from(err: ProtocolError) -> Self {
        ArgcompError::Protocol(err)
    }
}

impl From<String> for ArgcompError {
    fn from(msg: String) -> Self {
        ArgcompError::Generic(msg)
    }
}

impl From<&str> for ArgcompError {
    fn from(msg: &str) -> Self {
        ArgcompError::Generic(msg.to_owned())
    }
}
