//! Single-slot bridge from the native logger into host code.
//!
//! The native library holds one process-wide log callback. This module owns
//! that slot: a handler is installed once with [`register_log_handler`] and
//! removed with [`restore_default_log_handler`], which hands logging back to
//! the library's own stderr handler. Installing a second handler without
//! restoring first is rejected.

use std::ffi::CString;
use std::fmt;
use std::os::raw::{c_char, c_int};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::codec::strings::cstr_to_string;
use crate::error::{Result, SdrError};
use crate::native::NativeApi;

/// Native log priorities, highest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum LogLevel {
    Fatal = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    Info = 6,
    Debug = 7,
    Trace = 8,
    /// Streaming status indicators such as "U" (underflow) and "O" (overflow)
    Ssi = 9,
}

impl LogLevel {
    pub fn from_raw(raw: c_int) -> Option<Self> {
        Some(match raw {
            1 => Self::Fatal,
            2 => Self::Critical,
            3 => Self::Error,
            4 => Self::Warning,
            5 => Self::Notice,
            6 => Self::Info,
            7 => Self::Debug,
            8 => Self::Trace,
            9 => Self::Ssi,
            _ => return None,
        })
    }

    pub fn to_log_level(self) -> log::Level {
        match self {
            Self::Fatal | Self::Critical | Self::Error => log::Level::Error,
            Self::Warning => log::Level::Warn,
            Self::Notice | Self::Info => log::Level::Info,
            Self::Debug => log::Level::Debug,
            Self::Trace | Self::Ssi => log::Level::Trace,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fatal => "FATAL",
            Self::Critical => "CRITICAL",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Notice => "NOTICE",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
            Self::Ssi => "SSI",
        };
        f.write_str(name)
    }
}

type Handler = Arc<dyn Fn(LogLevel, &str) + Send + Sync>;

static SINK: RwLock<Option<Handler>> = RwLock::new(None);

unsafe extern "C" fn log_bridge(level: c_int, message: *const c_char) {
    let level = LogLevel::from_raw(level).unwrap_or(LogLevel::Info);
    let message = cstr_to_string(message);
    let handler = match SINK.read() {
        Ok(slot) => slot.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    };
    if let Some(handler) = handler {
        // Unwinding into native code is undefined; drop the panic here.
        let _ = panic::catch_unwind(AssertUnwindSafe(|| handler(level, &message)));
    }
}

/// Install `handler` as the receiver of every native log message
pub fn register_log_handler<F>(api: &dyn NativeApi, handler: F) -> Result<()>
where
    F: Fn(LogLevel, &str) + Send + Sync + 'static,
{
    let mut slot = SINK.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    if slot.is_some() {
        return Err(SdrError::LogHandlerAlreadyRegistered);
    }
    *slot = Some(Arc::new(handler));
    api.register_log_handler(Some(log_bridge));
    Ok(())
}

/// Install a handler that forwards native messages to the `log` facade
pub fn route_to_log_facade(api: &dyn NativeApi) -> Result<()> {
    register_log_handler(api, |level, message| {
        log::log!(target: "soapysdr", level.to_log_level(), "{}", message);
    })
}

/// Remove the installed handler; the native default handler takes over
pub fn restore_default_log_handler(api: &dyn NativeApi) {
    let mut slot = SINK.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    api.register_log_handler(None);
    *slot = None;
}

pub fn has_log_handler() -> bool {
    SINK.read().map(|slot| slot.is_some()).unwrap_or(false)
}

/// Messages below `level` are dropped by the native logger
pub fn set_log_level(api: &dyn NativeApi, level: LogLevel) {
    api.set_log_level(level as c_int);
}

/// Send a message through the native logger
pub fn log_message(api: &dyn NativeApi, level: LogLevel, message: &str) -> Result<()> {
    let message = CString::new(message)?;
    unsafe { api.log(level as c_int, message.as_ptr()) };
    Ok(())
}
