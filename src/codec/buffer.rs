//! Scoped guards for native-owned allocations.
//!
//! A guard is created the moment a native call hands memory back and releases
//! it with the one native routine that matches how it was allocated.

use std::ffi::c_void;
use std::os::raw::c_char;
use std::ptr;

use super::slice_or_empty;
use super::strings::cstr_to_string;
use crate::native::ffi::{ArgInfoRaw, Kwargs, RangeRaw};
use crate::native::NativeApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Release {
    /// Plain `free` of the array itself
    Free,
    /// `Strings_clear`: each string, then the array
    Strings,
    /// `KwargsList_clear`: each element's contents, then the array
    KwargsList,
    /// `ArgInfoList_clear`: each record recursively, then the array
    ArgInfoList,
}

/// Native-owned contiguous array of `T`
pub struct NativeArray<'a, T> {
    api: &'a dyn NativeApi,
    ptr: *mut T,
    len: usize,
    release: Release,
}

impl<'a, T> NativeArray<'a, T> {
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: the constructors require ptr/len to describe a live native array.
        unsafe { slice_or_empty(self.ptr, self.len) }
    }

    pub fn len(&self) -> usize {
        if self.ptr.is_null() {
            0
        } else {
            self.len
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> NativeArray<'a, *mut c_char> {
    /// # Safety
    /// `ptr` must be null or a string array of `len` entries allocated by `api`.
    pub unsafe fn strings(api: &'a dyn NativeApi, ptr: *mut *mut c_char, len: usize) -> Self {
        Self { api, ptr, len, release: Release::Strings }
    }
}

impl<'a> NativeArray<'a, Kwargs> {
    /// # Safety
    /// `ptr` must be null or a kwargs array of `len` entries allocated by `api`.
    pub unsafe fn kwargs_list(api: &'a dyn NativeApi, ptr: *mut Kwargs, len: usize) -> Self {
        Self { api, ptr, len, release: Release::KwargsList }
    }
}

impl<'a> NativeArray<'a, RangeRaw> {
    /// # Safety
    /// `ptr` must be null or a range array of `len` entries allocated by `api`.
    pub unsafe fn ranges(api: &'a dyn NativeApi, ptr: *mut RangeRaw, len: usize) -> Self {
        Self { api, ptr, len, release: Release::Free }
    }
}

impl<'a> NativeArray<'a, ArgInfoRaw> {
    /// # Safety
    /// `ptr` must be null or an arg info array of `len` entries allocated by `api`.
    pub unsafe fn arg_info_list(api: &'a dyn NativeApi, ptr: *mut ArgInfoRaw, len: usize) -> Self {
        Self { api, ptr, len, release: Release::ArgInfoList }
    }
}

impl<T> Drop for NativeArray<'_, T> {
    fn drop(&mut self) {
        if self.ptr.is_null() {
            return;
        }
        let ptr = std::mem::replace(&mut self.ptr, ptr::null_mut());
        unsafe {
            match self.release {
                Release::Free => self.api.free(ptr.cast::<c_void>()),
                Release::Strings => {
                    let mut strings = ptr.cast::<*mut c_char>();
                    self.api.strings_clear(&mut strings, self.len);
                }
                Release::KwargsList => self.api.kwargs_list_clear(ptr.cast::<Kwargs>(), self.len),
                Release::ArgInfoList => self.api.arg_info_list_clear(ptr.cast::<ArgInfoRaw>(), self.len),
            }
        }
    }
}

/// Native kwargs returned by value; its arrays are cleared on drop
pub struct NativeKwargs<'a> {
    api: &'a dyn NativeApi,
    raw: Kwargs,
}

impl<'a> NativeKwargs<'a> {
    /// # Safety
    /// The arrays inside `raw` must have been allocated by `api`.
    pub unsafe fn new(api: &'a dyn NativeApi, raw: Kwargs) -> Self {
        Self { api, raw }
    }

    pub fn raw(&self) -> &Kwargs {
        &self.raw
    }
}

impl Drop for NativeKwargs<'_> {
    fn drop(&mut self) {
        unsafe { self.api.kwargs_clear(&mut self.raw) };
    }
}

/// Native arg info returned by value; cleared recursively on drop
pub struct NativeArgInfo<'a> {
    api: &'a dyn NativeApi,
    raw: ArgInfoRaw,
}

impl<'a> NativeArgInfo<'a> {
    /// # Safety
    /// The strings and arrays inside `raw` must have been allocated by `api`.
    pub unsafe fn new(api: &'a dyn NativeApi, raw: ArgInfoRaw) -> Self {
        Self { api, raw }
    }

    pub fn raw(&self) -> &ArgInfoRaw {
        &self.raw
    }
}

impl Drop for NativeArgInfo<'_> {
    fn drop(&mut self) {
        unsafe { self.api.arg_info_clear(&mut self.raw) };
    }
}

/// Native heap string released with `free`
pub struct NativeString<'a> {
    api: &'a dyn NativeApi,
    ptr: *mut c_char,
}

impl<'a> NativeString<'a> {
    /// # Safety
    /// `ptr` must be null or a string allocated by `api`.
    pub unsafe fn new(api: &'a dyn NativeApi, ptr: *mut c_char) -> Self {
        Self { api, ptr }
    }

    pub fn to_string_lossy(&self) -> String {
        unsafe { cstr_to_string(self.ptr) }
    }
}

impl Drop for NativeString<'_> {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe { self.api.free(self.ptr.cast::<c_void>()) };
        }
    }
}
