use std::collections::BTreeMap;
use std::fmt;
use std::os::raw::c_int;

use serde::{Deserialize, Serialize};

use crate::native::ffi;

/// Key/value configuration used for device, channel and tuning parameters
pub type Args = BTreeMap<String, String>;

/// Data-flow orientation of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Tx,
    Rx,
}

impl Direction {
    pub fn as_raw(self) -> c_int {
        match self {
            Direction::Tx => ffi::SOAPY_SDR_TX,
            Direction::Rx => ffi::SOAPY_SDR_RX,
        }
    }

    pub fn from_raw(raw: c_int) -> Option<Self> {
        match raw {
            ffi::SOAPY_SDR_TX => Some(Direction::Tx),
            ffi::SOAPY_SDR_RX => Some(Direction::Rx),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Tx => f.write_str("TX"),
            Direction::Rx => f.write_str("RX"),
        }
    }
}

/// Numeric min/max range with a step; `step == 0.0` denotes a continuous range.
///
/// Values are kept exactly as the driver reported them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Range {
    pub minimum: f64,
    pub maximum: f64,
    pub step: f64,
}

impl Range {
    pub fn new(minimum: f64, maximum: f64, step: f64) -> Self {
        Self { minimum, maximum, step }
    }

    pub fn is_continuous(&self) -> bool {
        self.step == 0.0
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}(/{})", self.minimum, self.maximum, self.step)
    }
}

/// Data type of an argument descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArgType {
    Bool,
    Int,
    Float,
    String,
}

impl ArgType {
    pub fn from_raw(raw: c_int) -> Option<Self> {
        match raw {
            ffi::SOAPY_SDR_ARG_INFO_BOOL => Some(ArgType::Bool),
            ffi::SOAPY_SDR_ARG_INFO_INT => Some(ArgType::Int),
            ffi::SOAPY_SDR_ARG_INFO_FLOAT => Some(ArgType::Float),
            ffi::SOAPY_SDR_ARG_INFO_STRING => Some(ArgType::String),
            _ => None,
        }
    }

    pub fn as_raw(self) -> c_int {
        match self {
            ArgType::Bool => ffi::SOAPY_SDR_ARG_INFO_BOOL,
            ArgType::Int => ffi::SOAPY_SDR_ARG_INFO_INT,
            ArgType::Float => ffi::SOAPY_SDR_ARG_INFO_FLOAT,
            ArgType::String => ffi::SOAPY_SDR_ARG_INFO_STRING,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ArgType::Int | ArgType::Float)
    }

    pub fn name(self) -> &'static str {
        match self {
            ArgType::Bool => "bool",
            ArgType::Int => "int",
            ArgType::Float => "float",
            ArgType::String => "string",
        }
    }
}

/// One enumerated choice of an argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgOption {
    pub value: String,
    pub name: String,
}

/// Description of a configurable argument (settings, stream args, tuning args, sensors)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgInfo {
    /// Identifier used as the args key
    pub key: String,
    /// Default value when the argument is not specified
    pub value: String,
    /// Displayable name; may be empty, in which case the key is used
    pub name: String,
    pub description: String,
    /// Unit such as dB or Hz; may be empty
    pub units: String,
    pub arg_type: ArgType,
    /// Only meaningful for numeric types
    pub range: Option<Range>,
    pub options: Vec<ArgOption>,
}

impl ArgInfo {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.key
        } else {
            &self.name
        }
    }
}

impl fmt::Display for ArgInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let or_dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };

        write!(
            f,
            "key: {:?}, value: {:?}, name: {:?}, description: {:?}, unit: {:?}, type: {}",
            self.key,
            self.value,
            self.display_name(),
            or_dash(&self.description),
            or_dash(&self.units),
            self.arg_type.name(),
        )?;

        match &self.range {
            Some(range) => write!(f, ", range: {}", range)?,
            None => f.write_str(", range: -")?,
        }

        if self.options.is_empty() {
            f.write_str(", options: None")
        } else {
            let options: Vec<String> = self
                .options
                .iter()
                .map(|o| format!("{}->{}", o.name, o.value))
                .collect();
            write!(f, ", options: {{{}}}", options.join(","))
        }
    }
}
