//! Error types for the application.

use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Protocol-related errors (IRC line level).
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Line contains carriage return or line feed characters")]
    InvalidCharacters,

    #[error("Line too long: {len} bytes (limit {limit})")]
    MessageTooLong { len: usize, limit: usize },

    #[error("Not connected to an IRC server")]
    ServerNotConnected,

    #[error("Malformed line: {message}")]
    Malformed { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Channel state errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Unsupported mode given: {mode}")]
    InvalidMode { mode: String },

    #[error("No such user on {channel}: {nick}")]
    NoSuchUser { channel: String, nick: String },
}

/// Connection-related errors.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Failed to connect to {host}:{port}: {source}")]
    ConnectFailed {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },
}

/// Errors surfaced by the game console.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("{game} does not support cvar get/set")]
    CvarUnsupported { game: String },

    #[error("Unknown admin command: {name}")]
    UnknownCommand { name: String },

    #[error("Client not found: {handle}")]
    ClientNotFound { handle: String },

    #[error("Console operation failed: {message}")]
    Failed { message: String },
}

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;

/// Result type alias for console operations.
pub type ConsoleResult<T> = std::result::Result<T, ConsoleError>;
