//! Marshaling between host collections and the native array representation.
//!
//! Every buffer that crosses the boundary is owned by exactly one side:
//!
//! * host-owned encodings ([`args::HostArgs`], [`args::HostArgsList`]) are built
//!   from Rust allocations and released by their `Drop`; the native side only
//!   reads them for the duration of a call.
//! * native-owned results are wrapped in the guards from [`buffer`] as soon as
//!   they are returned, copied into host storage, and released through the
//!   matching native clear/free exactly once, on every exit path.

pub mod arg_info;
pub mod args;
pub mod buffer;
pub mod range;
pub mod strings;

pub use arg_info::{decode_arg_info, decode_arg_info_list};
pub use args::{decode_kwargs, decode_kwargs_list, parse_markup, to_markup, HostArgs, HostArgsList};
pub use range::decode_ranges;
pub use strings::{cstr_to_string, decode_strings};

use std::slice;

/// Typed view over `len` records starting at `ptr`; null or zero length is empty.
///
/// # Safety
/// When non-null, `ptr` must point to `len` initialized, contiguous `T` that
/// stay valid and unmodified for `'a`.
pub(crate) unsafe fn slice_or_empty<'a, T>(ptr: *const T, len: usize) -> &'a [T] {
    if ptr.is_null() || len == 0 {
        &[]
    } else {
        slice::from_raw_parts(ptr, len)
    }
}
