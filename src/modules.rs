//! Driver module registry: search paths, explicit loading and per-module
//! load results. Every list and string the library returns is copied and
//! released before these functions return.

use std::ffi::CString;

use log::{debug, warn};

use crate::codec::args::take_kwargs;
use crate::codec::strings::{take_string, take_strings};
use crate::error::{Result, SdrError};
use crate::native::{ModuleList, NativeApi};
use crate::types::Args;

fn list(api: &dyn NativeApi, query: ModuleList<'_>) -> Vec<String> {
    let mut length = 0;
    unsafe {
        let ptr = api.module_list(query, &mut length);
        take_strings(api, ptr, length)
    }
}

/// Directories searched for modules
pub fn list_search_paths(api: &dyn NativeApi) -> Vec<String> {
    list(api, ModuleList::SearchPaths)
}

/// Full paths of every module on the search paths
pub fn list_modules(api: &dyn NativeApi) -> Vec<String> {
    list(api, ModuleList::Modules)
}

pub fn list_modules_in(api: &dyn NativeApi, path: &str) -> Result<Vec<String>> {
    let path = CString::new(path)?;
    Ok(list(api, ModuleList::ModulesIn { path: &path }))
}

/// Load every module on the search paths; failures go to the native log
pub fn load_modules(api: &dyn NativeApi) {
    api.load_modules();
}

fn registry_call(path: &str, message: String) -> Result<()> {
    if message.is_empty() {
        return Ok(());
    }
    Err(SdrError::Module {
        path: path.to_string(),
        message,
    })
}

pub fn load_module(api: &dyn NativeApi, path: &str) -> Result<()> {
    let raw = CString::new(path)?;
    let message = unsafe { take_string(api, api.load_module(raw.as_ptr())) };
    registry_call(path, message)?;
    debug!("loaded module {}", path);
    Ok(())
}

pub fn unload_module(api: &dyn NativeApi, path: &str) -> Result<()> {
    let raw = CString::new(path)?;
    let message = unsafe { take_string(api, api.unload_module(raw.as_ptr())) };
    registry_call(path, message).inspect_err(|e| warn!("{}", e))
}

/// Registration name to error message for each factory the module registered.
/// Empty messages mean the registration succeeded.
pub fn loader_result(api: &dyn NativeApi, path: &str) -> Result<Args> {
    let path = CString::new(path)?;
    Ok(unsafe { take_kwargs(api, api.loader_result(path.as_ptr())) })
}

/// Version string the module reports, empty when it provides none
pub fn module_version(api: &dyn NativeApi, path: &str) -> Result<String> {
    let path = CString::new(path)?;
    Ok(unsafe { take_string(api, api.module_version(path.as_ptr())) })
}
