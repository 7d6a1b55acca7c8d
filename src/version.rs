use serde::{Deserialize, Serialize};

use crate::native::NativeApi;

/// Version strings of the native library. The native strings are static and
/// never freed; these are copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    /// `major.minor.increment`
    pub api: String,
    pub abi: String,
    /// `major.minor.patch-buildInfo`
    pub lib: String,
}

impl VersionInfo {
    pub fn query(api: &dyn NativeApi) -> Self {
        Self {
            api: api_version(api),
            abi: abi_version(api),
            lib: lib_version(api),
        }
    }
}

pub fn api_version(api: &dyn NativeApi) -> String {
    api.api_version().to_string_lossy().into_owned()
}

pub fn abi_version(api: &dyn NativeApi) -> String {
    api.abi_version().to_string_lossy().into_owned()
}

pub fn lib_version(api: &dyn NativeApi) -> String {
    api.lib_version().to_string_lossy().into_owned()
}
