use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SdrError;

/// Sample format tags understood by the native layer.
///
/// `C` prefixes an interleaved complex pair; the digits are the bit width of
/// one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StreamFormat {
    CF64,
    CF32,
    CS32,
    CU32,
    CS16,
    CU16,
    CS12,
    CU12,
    CS8,
    CU8,
    CS4,
    CU4,
    F64,
    F32,
    S32,
    U32,
    S16,
    U16,
    S8,
    U8,
}

impl StreamFormat {
    pub const ALL: [StreamFormat; 20] = [
        StreamFormat::CF64,
        StreamFormat::CF32,
        StreamFormat::CS32,
        StreamFormat::CU32,
        StreamFormat::CS16,
        StreamFormat::CU16,
        StreamFormat::CS12,
        StreamFormat::CU12,
        StreamFormat::CS8,
        StreamFormat::CU8,
        StreamFormat::CS4,
        StreamFormat::CU4,
        StreamFormat::F64,
        StreamFormat::F32,
        StreamFormat::S32,
        StreamFormat::U32,
        StreamFormat::S16,
        StreamFormat::U16,
        StreamFormat::S8,
        StreamFormat::U8,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CF64 => "CF64",
            Self::CF32 => "CF32",
            Self::CS32 => "CS32",
            Self::CU32 => "CU32",
            Self::CS16 => "CS16",
            Self::CU16 => "CU16",
            Self::CS12 => "CS12",
            Self::CU12 => "CU12",
            Self::CS8 => "CS8",
            Self::CU8 => "CU8",
            Self::CS4 => "CS4",
            Self::CU4 => "CU4",
            Self::F64 => "F64",
            Self::F32 => "F32",
            Self::S32 => "S32",
            Self::U32 => "U32",
            Self::S16 => "S16",
            Self::U16 => "U16",
            Self::S8 => "S8",
            Self::U8 => "U8",
        }
    }

    pub fn is_complex(self) -> bool {
        self.as_str().starts_with('C')
    }

    /// Bytes per element, using the native sizing rule: component bits,
    /// doubled for complex formats, divided by eight (so CS12 is 3, CS4 is 1).
    pub fn element_size(self) -> usize {
        let bits: usize = self
            .as_str()
            .bytes()
            .filter(u8::is_ascii_digit)
            .fold(0, |acc, b| acc * 10 + usize::from(b - b'0'));
        let bits = if self.is_complex() { bits * 2 } else { bits };
        bits / 8
    }
}

impl FromStr for StreamFormat {
    type Err = SdrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StreamFormat::ALL
            .iter()
            .copied()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| SdrError::InvalidFormat(s.to_string()))
    }
}

impl TryFrom<String> for StreamFormat {
    type Error = SdrError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StreamFormat> for String {
    fn from(format: StreamFormat) -> Self {
        format.as_str().to_string()
    }
}

impl fmt::Display for StreamFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
