//! Allocation ledger standing in for the native heap.
//!
//! Every block handed out is recorded by address. Releasing an address that
//! is not in the ledger (a double free, or host memory passed to a native
//! free) is counted instead of touching memory, so tests can assert both
//! "nothing leaked" and "nothing freed twice".

use std::collections::HashMap;
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use log::error;

use crate::native::ffi::{ArgInfoRaw, Kwargs, RangeRaw};
use crate::types::{ArgInfo, Args, Range};

enum Block {
    Str(CString),
    Ptrs(Vec<*mut c_char>),
    Kwargs(Vec<Kwargs>),
    Ranges(Vec<RangeRaw>),
    ArgInfos(Vec<ArgInfoRaw>),
}

impl Block {
    fn addr(&self) -> usize {
        match self {
            Block::Str(s) => s.as_ptr() as usize,
            Block::Ptrs(v) => v.as_ptr() as usize,
            Block::Kwargs(v) => v.as_ptr() as usize,
            Block::Ranges(v) => v.as_ptr() as usize,
            Block::ArgInfos(v) => v.as_ptr() as usize,
        }
    }
}

// Blocks are only reachable through the ledger mutex; the pointers inside
// refer to other blocks of the same ledger.
unsafe impl Send for Block {}

#[derive(Default)]
pub struct SimHeap {
    blocks: Mutex<HashMap<usize, Block>>,
    invalid_frees: AtomicUsize,
}

impl SimHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks allocated and not yet released
    pub fn live_blocks(&self) -> usize {
        self.lock().len()
    }

    /// Releases of addresses the ledger did not own
    pub fn invalid_frees(&self) -> usize {
        self.invalid_frees.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<usize, Block>> {
        self.blocks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn insert(&self, block: Block) -> usize {
        let addr = block.addr();
        self.lock().insert(addr, block);
        addr
    }

    /// Release one block; returns false (and counts it) when the address is unknown
    pub fn release(&self, addr: usize) -> bool {
        if addr == 0 {
            return true;
        }
        if self.lock().remove(&addr).is_some() {
            return true;
        }
        self.invalid_frees.fetch_add(1, Ordering::SeqCst);
        error!("sim heap: release of unowned address {:#x}", addr);
        false
    }

    pub fn alloc_str(&self, value: &str) -> *mut c_char {
        // Interior nul bytes cannot be represented; truncate at the first one.
        let bytes: Vec<u8> = value.bytes().take_while(|&b| b != 0).collect();
        let value = CString::new(bytes).unwrap_or_default();
        self.insert(Block::Str(value)) as *mut c_char
    }

    /// `char **` of `values.len()` entries; null when empty
    pub fn alloc_strings(&self, values: &[String]) -> *mut *mut c_char {
        if values.is_empty() {
            return ptr::null_mut();
        }
        let ptrs: Vec<*mut c_char> = values.iter().map(|v| self.alloc_str(v)).collect();
        self.insert(Block::Ptrs(ptrs)) as *mut *mut c_char
    }

    pub fn alloc_kwargs(&self, args: &Args) -> Kwargs {
        if args.is_empty() {
            return Kwargs::empty();
        }
        let keys: Vec<String> = args.keys().cloned().collect();
        let vals: Vec<String> = args.values().cloned().collect();
        Kwargs {
            size: args.len(),
            keys: self.alloc_strings(&keys),
            vals: self.alloc_strings(&vals),
        }
    }

    pub fn alloc_kwargs_list(&self, list: &[Args]) -> *mut Kwargs {
        if list.is_empty() {
            return ptr::null_mut();
        }
        let items: Vec<Kwargs> = list.iter().map(|args| self.alloc_kwargs(args)).collect();
        self.insert(Block::Kwargs(items)) as *mut Kwargs
    }

    pub fn alloc_ranges(&self, ranges: &[Range]) -> *mut RangeRaw {
        if ranges.is_empty() {
            return ptr::null_mut();
        }
        let items: Vec<RangeRaw> = ranges.iter().copied().map(RangeRaw::from).collect();
        self.insert(Block::Ranges(items)) as *mut RangeRaw
    }

    pub fn alloc_arg_info(&self, info: &ArgInfo) -> ArgInfoRaw {
        let values: Vec<String> = info.options.iter().map(|o| o.value.clone()).collect();
        let names: Vec<String> = info.options.iter().map(|o| o.name.clone()).collect();
        ArgInfoRaw {
            key: self.alloc_str(&info.key),
            value: self.alloc_str(&info.value),
            name: self.alloc_str(&info.name),
            description: self.alloc_str(&info.description),
            units: self.alloc_str(&info.units),
            type_: info.arg_type.as_raw(),
            range: info.range.map(RangeRaw::from).unwrap_or_default(),
            num_options: info.options.len(),
            options: self.alloc_strings(&values),
            option_names: self.alloc_strings(&names),
        }
    }

    pub fn alloc_arg_info_list(&self, infos: &[ArgInfo]) -> *mut ArgInfoRaw {
        if infos.is_empty() {
            return ptr::null_mut();
        }
        let items: Vec<ArgInfoRaw> = infos.iter().map(|info| self.alloc_arg_info(info)).collect();
        self.insert(Block::ArgInfos(items)) as *mut ArgInfoRaw
    }

    /// Release a string array and every string in it.
    ///
    /// # Safety
    /// `ptr` must be null or hold `len` readable pointers.
    pub unsafe fn release_strings(&self, ptr: *mut *mut c_char, len: usize) {
        if ptr.is_null() {
            return;
        }
        // Only walk arrays the ledger owns; an unknown array is an invalid free.
        if !self.lock().contains_key(&(ptr as usize)) {
            self.release(ptr as usize);
            return;
        }
        for i in 0..len {
            self.release(*ptr.add(i) as usize);
        }
        self.release(ptr as usize);
    }

    /// Release the arrays inside one kwargs and reset it to empty.
    ///
    /// # Safety
    /// `args` must point to a readable and writable kwargs.
    pub unsafe fn clear_kwargs(&self, args: *mut Kwargs) {
        let Some(args) = args.as_mut() else { return };
        self.release_strings(args.keys, args.size);
        self.release_strings(args.vals, args.size);
        *args = Kwargs::empty();
    }

    /// # Safety
    /// `info` must point to a readable and writable arg info.
    pub unsafe fn clear_arg_info(&self, info: *mut ArgInfoRaw) {
        let Some(info) = info.as_mut() else { return };
        for s in [info.key, info.value, info.name, info.description, info.units] {
            self.release(s as usize);
        }
        self.release_strings(info.options, info.num_options);
        self.release_strings(info.option_names, info.num_options);
        *info = ArgInfoRaw::empty();
    }

    /// # Safety
    /// `ptr` must be null or hold `len` kwargs.
    pub unsafe fn release_kwargs_list(&self, ptr: *mut Kwargs, len: usize) {
        if ptr.is_null() {
            return;
        }
        if !self.lock().contains_key(&(ptr as usize)) {
            self.release(ptr as usize);
            return;
        }
        for i in 0..len {
            self.clear_kwargs(ptr.add(i));
        }
        self.release(ptr as usize);
    }

    /// # Safety
    /// `ptr` must be null or hold `len` arg infos.
    pub unsafe fn release_arg_info_list(&self, ptr: *mut ArgInfoRaw, len: usize) {
        if ptr.is_null() {
            return;
        }
        if !self.lock().contains_key(&(ptr as usize)) {
            self.release(ptr as usize);
            return;
        }
        for i in 0..len {
            self.clear_arg_info(ptr.add(i));
        }
        self.release(ptr as usize);
    }
}
