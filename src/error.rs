use std::ffi::NulError;
use std::fmt;
use std::os::raw::c_int;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stream::StreamState;

/// Closed set of failure kinds reported by the native status channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// A read or write did not complete before the timeout expired
    Timeout,
    /// Non-specific stream error
    StreamError,
    /// The driver saw malformed data, e.g. a bad packet
    Corruption,
    /// An internal receive buffer filled up
    Overflow,
    /// The operation or flag is not implemented by the driver
    NotSupported,
    /// A stream time was late or too early to process
    TimeError,
    /// A continuous transmit stream was interrupted
    Underflow,
    /// Any code outside the documented range
    Unknown,
}

impl ErrorKind {
    /// Translate a native status code. `0` means no error.
    ///
    /// Total over every integer: codes outside `-1..=-7` (including positive
    /// values passed by mistake) map to [`ErrorKind::Unknown`].
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => None,
            -1 => Some(Self::Timeout),
            -2 => Some(Self::StreamError),
            -3 => Some(Self::Corruption),
            -4 => Some(Self::Overflow),
            -5 => Some(Self::NotSupported),
            -6 => Some(Self::TimeError),
            -7 => Some(Self::Underflow),
            _ => Some(Self::Unknown),
        }
    }

    /// Native status code for this kind
    pub fn code(self) -> i32 {
        match self {
            Self::Timeout => -1,
            Self::StreamError => -2,
            Self::Corruption => -3,
            Self::Overflow => -4,
            Self::NotSupported => -5,
            Self::TimeError => -6,
            Self::Underflow => -7,
            Self::Unknown => -255,
        }
    }

    /// Conditions a streaming loop should retry or back off from instead of aborting
    pub fn is_recoverable(self) -> bool {
        matches!(self, Self::Timeout | Self::Overflow | Self::Underflow)
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Timeout => "timeout during stream operation",
            Self::StreamError => "non-specific stream error",
            Self::Corruption => "data corruption during read operation",
            Self::Overflow => "overflow during read operation",
            Self::NotSupported => "requested operation or flag setting is not supported",
            Self::TimeError => "device encountered a stream time expired or too early",
            Self::Underflow => "write operation caused an underflow condition",
            Self::Unknown => "unknown error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[derive(Debug, Error)]
pub enum SdrError {
    #[error("{0}")]
    Native(ErrorKind),

    /// Construction failures carry the native diagnostic message instead of a kind
    #[error("device construction failed: {0}")]
    Construction(String),

    #[error("stream setup rejected ({kind}): {message}")]
    Rejected { kind: ErrorKind, message: String },

    #[error("cannot {operation} a stream in state {state}")]
    InvalidState {
        operation: &'static str,
        state: StreamState,
    },

    #[error("expected {expected} buffers (one per channel), got {actual}")]
    BufferCount { expected: usize, actual: usize },

    #[error("buffer {index} holds {capacity} elements but {requested} were requested")]
    BufferTooSmall {
        index: usize,
        capacity: usize,
        requested: usize,
    },

    #[error("stream channel list must not be empty")]
    EmptyChannels,

    #[error("unknown stream format: {0:?}")]
    InvalidFormat(String),

    #[error("string argument contains an interior nul byte: {0}")]
    NulByte(#[from] NulError),

    #[error("a log handler is already registered")]
    LogHandlerAlreadyRegistered,

    #[error("blocking task failed: {0}")]
    Task(String),

    #[error("module {path}: {message}")]
    Module { path: String, message: String },

    #[error("batch operation failed at index {index}: {source}")]
    Batch {
        index: usize,
        #[source]
        source: Box<SdrError>,
    },
}

pub type Result<T> = std::result::Result<T, SdrError>;

impl SdrError {
    /// The taxonomy kind behind this error, if it came from the status channel
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Native(kind) => Some(*kind),
            Self::Rejected { kind, .. } => Some(*kind),
            Self::Batch { source, .. } => source.kind(),
            _ => None,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.kind().is_some_and(ErrorKind::is_recoverable)
    }

    /// True when an optional capability is absent and the caller should fall back
    pub fn is_not_supported(&self) -> bool {
        self.kind() == Some(ErrorKind::NotSupported)
    }
}

impl From<ErrorKind> for SdrError {
    fn from(kind: ErrorKind) -> Self {
        Self::Native(kind)
    }
}

/// Map a status-only return value to a result
pub fn check(code: c_int) -> Result<()> {
    match ErrorKind::from_code(code) {
        None => Ok(()),
        Some(kind) => Err(SdrError::Native(kind)),
    }
}

/// Map a count-or-status return value; non-negative values are element counts
pub fn check_count(code: c_int) -> Result<usize> {
    if code >= 0 {
        return Ok(code as usize);
    }
    Err(SdrError::Native(
        ErrorKind::from_code(code).unwrap_or(ErrorKind::Unknown),
    ))
}
