use log::warn;

use super::buffer::{NativeArgInfo, NativeArray};
use super::strings::{borrow_strings, cstr_to_string};
use crate::native::ffi::ArgInfoRaw;
use crate::native::NativeApi;
use crate::types::{ArgInfo, ArgOption, ArgType, Range};

/// Copy one native descriptor into host storage.
///
/// Options and their display names are zipped pairwise. When either
/// sub-array is null the descriptor simply has no options.
///
/// # Safety
/// Every string pointer in `raw` must be null or valid, and `options` /
/// `option_names` must each be null or hold `num_options` strings.
pub unsafe fn decode_arg_info(raw: &ArgInfoRaw) -> ArgInfo {
    let key = cstr_to_string(raw.key);

    let arg_type = ArgType::from_raw(raw.type_).unwrap_or_else(|| {
        warn!("arg info {:?} has unknown type tag {}, treating as string", key, raw.type_);
        ArgType::String
    });

    let options = if raw.options.is_null() || raw.option_names.is_null() {
        Vec::new()
    } else {
        let values = borrow_strings(raw.options, raw.num_options);
        let names = borrow_strings(raw.option_names, raw.num_options);
        values
            .into_iter()
            .zip(names)
            .map(|(value, name)| ArgOption { value, name })
            .collect()
    };

    ArgInfo {
        key,
        value: cstr_to_string(raw.value),
        name: cstr_to_string(raw.name),
        description: cstr_to_string(raw.description),
        units: cstr_to_string(raw.units),
        arg_type,
        range: arg_type.is_numeric().then(|| Range::from(raw.range)),
        options,
    }
}

/// # Safety
/// Every element must satisfy [`decode_arg_info`].
pub unsafe fn decode_arg_info_list(list: &[ArgInfoRaw]) -> Vec<ArgInfo> {
    list.iter().map(|raw| decode_arg_info(raw)).collect()
}

/// Decode and release a native descriptor array with one recursive clear.
///
/// # Safety
/// `ptr`/`len` must come from `api` and not be released elsewhere.
pub(crate) unsafe fn take_arg_info_list(api: &dyn NativeApi, ptr: *mut ArgInfoRaw, len: usize) -> Vec<ArgInfo> {
    let array = NativeArray::arg_info_list(api, ptr, len);
    decode_arg_info_list(array.as_slice())
}

/// Decode and clear a descriptor returned by value.
///
/// # Safety
/// `raw` must come from `api` and not be released elsewhere.
pub(crate) unsafe fn take_arg_info(api: &dyn NativeApi, raw: ArgInfoRaw) -> ArgInfo {
    let guard = NativeArgInfo::new(api, raw);
    decode_arg_info(guard.raw())
}
