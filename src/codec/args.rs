use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

use super::buffer::{NativeArray, NativeKwargs};
use super::slice_or_empty;
use super::strings::cstr_to_string;
use crate::error::Result;
use crate::native::ffi::Kwargs;
use crate::native::NativeApi;
use crate::types::Args;

/// Host-owned native encoding of one args map.
///
/// The parallel key/value arrays point into `CString`s owned by this value
/// and are released by `Drop`, never by a native free. An absent map and an
/// empty map both reach the native side as null, but the encoding remembers
/// which one it was.
#[derive(Debug)]
pub struct HostArgs {
    present: bool,
    _keys: Vec<CString>,
    _vals: Vec<CString>,
    _key_ptrs: Vec<*mut c_char>,
    _val_ptrs: Vec<*mut c_char>,
    raw: Kwargs,
}

impl HostArgs {
    pub fn encode(args: Option<&Args>) -> Result<Self> {
        let Some(args) = args else {
            return Ok(Self::absent());
        };

        let mut keys = Vec::with_capacity(args.len());
        let mut vals = Vec::with_capacity(args.len());
        for (key, val) in args {
            keys.push(CString::new(key.as_str())?);
            vals.push(CString::new(val.as_str())?);
        }

        let mut key_ptrs: Vec<*mut c_char> = keys.iter().map(|s| s.as_ptr() as *mut c_char).collect();
        let mut val_ptrs: Vec<*mut c_char> = vals.iter().map(|s| s.as_ptr() as *mut c_char).collect();

        let raw = if args.is_empty() {
            Kwargs::empty()
        } else {
            Kwargs {
                size: args.len(),
                keys: key_ptrs.as_mut_ptr(),
                vals: val_ptrs.as_mut_ptr(),
            }
        };

        Ok(Self {
            present: true,
            _keys: keys,
            _vals: vals,
            _key_ptrs: key_ptrs,
            _val_ptrs: val_ptrs,
            raw,
        })
    }

    fn absent() -> Self {
        Self {
            present: false,
            _keys: Vec::new(),
            _vals: Vec::new(),
            _key_ptrs: Vec::new(),
            _val_ptrs: Vec::new(),
            raw: Kwargs::empty(),
        }
    }

    /// Pointer for a native call; null when the map is absent or empty
    pub fn as_ptr(&self) -> *const Kwargs {
        if self.raw.size == 0 {
            ptr::null()
        } else {
            &self.raw
        }
    }

    pub(crate) fn raw(&self) -> Kwargs {
        self.raw
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    pub fn len(&self) -> usize {
        self.raw.size
    }

    pub fn is_empty(&self) -> bool {
        self.raw.size == 0
    }

    /// Read the encoding back; `None` for an absent map
    pub fn decode(&self) -> Option<Args> {
        if !self.present {
            return None;
        }
        // SAFETY: raw points into buffers owned by self.
        Some(unsafe { decode_kwargs(&self.raw) })
    }
}

/// Host-owned contiguous array of args, one native struct per element
#[derive(Debug)]
pub struct HostArgsList {
    _items: Vec<HostArgs>,
    raw: Vec<Kwargs>,
}

impl HostArgsList {
    pub fn encode(list: &[Args]) -> Result<Self> {
        let items = list
            .iter()
            .map(|args| HostArgs::encode(Some(args)))
            .collect::<Result<Vec<_>>>()?;
        let raw = items.iter().map(HostArgs::raw).collect();
        Ok(Self { _items: items, raw })
    }

    /// Pointer to the first element; null for an empty list
    pub fn as_ptr(&self) -> *const Kwargs {
        if self.raw.is_empty() {
            ptr::null()
        } else {
            self.raw.as_ptr()
        }
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn decode(&self) -> Vec<Args> {
        // SAFETY: every element points into buffers owned by self.
        unsafe { decode_kwargs_list(&self.raw) }
    }
}

/// Copy a native kwargs into a host map. Entries are read by index from the
/// parallel arrays; no native pointer survives the call.
///
/// # Safety
/// `raw.keys` and `raw.vals` must be null or hold `raw.size` valid strings.
pub unsafe fn decode_kwargs(raw: &Kwargs) -> Args {
    let keys = slice_or_empty(raw.keys, raw.size);
    let vals = slice_or_empty(raw.vals, raw.size);
    keys.iter()
        .zip(vals)
        .map(|(&k, &v)| (cstr_to_string(k), cstr_to_string(v)))
        .collect()
}

/// # Safety
/// Every element must satisfy [`decode_kwargs`].
pub unsafe fn decode_kwargs_list(list: &[Kwargs]) -> Vec<Args> {
    list.iter().map(|raw| decode_kwargs(raw)).collect()
}

/// Decode and clear a kwargs returned by value.
///
/// # Safety
/// `raw` must come from `api` and not be released elsewhere.
pub(crate) unsafe fn take_kwargs(api: &dyn NativeApi, raw: Kwargs) -> Args {
    let guard = NativeKwargs::new(api, raw);
    decode_kwargs(guard.raw())
}

/// Decode and release a native kwargs array.
///
/// # Safety
/// `ptr`/`len` must come from `api` and not be released elsewhere.
pub(crate) unsafe fn take_kwargs_list(api: &dyn NativeApi, ptr: *mut Kwargs, len: usize) -> Vec<Args> {
    let array = NativeArray::kwargs_list(api, ptr, len);
    decode_kwargs_list(array.as_slice())
}

/// Parse `"key=value, key2=value2"` markup. Entries without `=` get an empty value.
pub fn parse_markup(markup: &str) -> Args {
    markup
        .split(',')
        .filter_map(|entry| {
            let (key, value) = match entry.split_once('=') {
                Some((key, value)) => (key.trim(), value.trim()),
                None => (entry.trim(), ""),
            };
            (!key.is_empty()).then(|| (key.to_string(), value.to_string()))
        })
        .collect()
}

pub fn to_markup(args: &Args) -> String {
    args.iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(pairs: &[(&str, &str)]) -> Args {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_absent_and_empty_are_distinct() {
        let absent = HostArgs::encode(None).unwrap();
        let empty = HostArgs::encode(Some(&Args::new())).unwrap();

        assert!(absent.as_ptr().is_null());
        assert!(empty.as_ptr().is_null());
        assert_eq!(absent.decode(), None);
        assert_eq!(empty.decode(), Some(Args::new()));
    }

    #[test]
    fn test_encode_decode_preserves_entries() {
        let map = args(&[("driver", "rtlsdr"), ("serial", "00000001"), ("label", "")]);
        let encoded = HostArgs::encode(Some(&map)).unwrap();

        assert_eq!(encoded.len(), 3);
        assert!(!encoded.as_ptr().is_null());
        assert_eq!(encoded.decode(), Some(map));
    }

    #[test]
    fn test_interior_nul_is_rejected() {
        let map = args(&[("bad\0key", "x")]);
        assert!(HostArgs::encode(Some(&map)).is_err());
    }

    #[test]
    fn test_list_preserves_order() {
        let list = vec![args(&[("serial", "3")]), Args::new(), args(&[("serial", "1")])];
        let encoded = HostArgsList::encode(&list).unwrap();

        assert_eq!(encoded.len(), 3);
        assert_eq!(encoded.decode(), list);
        assert!(HostArgsList::encode(&[]).unwrap().as_ptr().is_null());
    }

    #[test]
    fn test_markup() {
        let parsed = parse_markup(" driver = sim , serial=42,,flag");
        assert_eq!(parsed, args(&[("driver", "sim"), ("serial", "42"), ("flag", "")]));
        assert_eq!(to_markup(&parsed), "driver=sim, flag=, serial=42");
        assert!(parse_markup("").is_empty());
    }
}
