//! `#[repr(C)]` mirrors of the SoapySDR C types that cross the boundary.
//!
//! Field order and widths must match `SoapySDR/Types.h` exactly: `size_t` is
//! `usize`, enums are `c_int`, `long long` is `i64`.

use std::os::raw::{c_char, c_int};
use std::ptr;

/// Opaque native device handle (`SoapySDRDevice`)
#[repr(C)]
pub struct NativeDevice {
    _private: [u8; 0],
}

/// Opaque native stream handle (`SoapySDRStream`)
#[repr(C)]
pub struct NativeStream {
    _private: [u8; 0],
}

/// `SoapySDRKwargs`: parallel key/value arrays without an embedded length header
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Kwargs {
    pub size: usize,
    pub keys: *mut *mut c_char,
    pub vals: *mut *mut c_char,
}

impl Kwargs {
    pub const fn empty() -> Self {
        Self {
            size: 0,
            keys: ptr::null_mut(),
            vals: ptr::null_mut(),
        }
    }
}

impl Default for Kwargs {
    fn default() -> Self {
        Self::empty()
    }
}

/// `SoapySDRRange`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RangeRaw {
    pub minimum: f64,
    pub maximum: f64,
    pub step: f64,
}

/// `SoapySDRArgInfo`; the nested strings and arrays belong to the same allocation
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ArgInfoRaw {
    pub key: *mut c_char,
    pub value: *mut c_char,
    pub name: *mut c_char,
    pub description: *mut c_char,
    pub units: *mut c_char,
    pub type_: c_int,
    pub range: RangeRaw,
    pub num_options: usize,
    pub options: *mut *mut c_char,
    pub option_names: *mut *mut c_char,
}

impl ArgInfoRaw {
    pub const fn empty() -> Self {
        Self {
            key: ptr::null_mut(),
            value: ptr::null_mut(),
            name: ptr::null_mut(),
            description: ptr::null_mut(),
            units: ptr::null_mut(),
            type_: SOAPY_SDR_ARG_INFO_STRING,
            range: RangeRaw {
                minimum: 0.0,
                maximum: 0.0,
                step: 0.0,
            },
            num_options: 0,
            options: ptr::null_mut(),
            option_names: ptr::null_mut(),
        }
    }
}

impl Default for ArgInfoRaw {
    fn default() -> Self {
        Self::empty()
    }
}

/// `SoapySDRLogHandler`
pub type LogHandlerFn = unsafe extern "C" fn(level: c_int, message: *const c_char);

pub const SOAPY_SDR_TX: c_int = 0;
pub const SOAPY_SDR_RX: c_int = 1;

pub const SOAPY_SDR_ARG_INFO_BOOL: c_int = 0;
pub const SOAPY_SDR_ARG_INFO_INT: c_int = 1;
pub const SOAPY_SDR_ARG_INFO_FLOAT: c_int = 2;
pub const SOAPY_SDR_ARG_INFO_STRING: c_int = 3;

pub const SOAPY_SDR_TIMEOUT: c_int = -1;
pub const SOAPY_SDR_STREAM_ERROR: c_int = -2;
pub const SOAPY_SDR_CORRUPTION: c_int = -3;
pub const SOAPY_SDR_OVERFLOW: c_int = -4;
pub const SOAPY_SDR_NOT_SUPPORTED: c_int = -5;
pub const SOAPY_SDR_TIME_ERROR: c_int = -6;
pub const SOAPY_SDR_UNDERFLOW: c_int = -7;
