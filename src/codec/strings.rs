use std::ffi::CStr;
use std::os::raw::c_char;

use super::buffer::{NativeArray, NativeString};
use super::slice_or_empty;
use crate::native::NativeApi;

/// Copy a nul-terminated native string; null reads as empty.
///
/// # Safety
/// `ptr` must be null or point to a valid nul-terminated string.
pub unsafe fn cstr_to_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}

/// Copy every entry of a native string array into host storage.
///
/// # Safety
/// Every element must satisfy [`cstr_to_string`].
pub unsafe fn decode_strings(list: &[*mut c_char]) -> Vec<String> {
    list.iter().map(|&s| cstr_to_string(s)).collect()
}

/// Decode and release a native `char **` array.
///
/// # Safety
/// `ptr`/`len` must come from `api` and not be released elsewhere.
pub(crate) unsafe fn take_strings(api: &dyn NativeApi, ptr: *mut *mut c_char, len: usize) -> Vec<String> {
    let array = NativeArray::strings(api, ptr, len);
    decode_strings(array.as_slice())
}

/// Decode and release one native heap string.
///
/// # Safety
/// `ptr` must come from `api` and not be released elsewhere.
pub(crate) unsafe fn take_string(api: &dyn NativeApi, ptr: *mut c_char) -> String {
    NativeString::new(api, ptr).to_string_lossy()
}

/// Decode `len` strings without taking ownership (sub-arrays of a larger record).
///
/// # Safety
/// See [`slice_or_empty`].
pub(crate) unsafe fn borrow_strings(ptr: *mut *mut c_char, len: usize) -> Vec<String> {
    decode_strings(slice_or_empty(ptr, len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use std::ptr;

    #[test]
    fn test_null_string_reads_empty() {
        assert_eq!(unsafe { cstr_to_string(ptr::null()) }, "");
    }

    #[test]
    fn test_decode_strings_copies() {
        let owned: Vec<CString> = ["RX", "TX/RX"].iter().map(|s| CString::new(*s).unwrap()).collect();
        let ptrs: Vec<*mut c_char> = owned.iter().map(|s| s.as_ptr() as *mut c_char).collect();

        let decoded = unsafe { decode_strings(&ptrs) };
        drop(owned);

        assert_eq!(decoded, vec!["RX".to_string(), "TX/RX".to_string()]);
    }

    #[test]
    fn test_borrow_strings_null_is_empty() {
        assert!(unsafe { borrow_strings(ptr::null_mut(), 4) }.is_empty());
    }
}
