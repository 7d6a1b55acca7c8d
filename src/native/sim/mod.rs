//! Pure-Rust stand-in for the native library.
//!
//! Behaves like a SoapySDR build with a catalog of [`SimDeviceSpec`] devices:
//! results are allocated on a tracked [`SimHeap`], devices and streams are
//! boxed behind opaque pointers, and stale or repeated releases are reported
//! with a status code instead of touching freed memory.

mod device;
mod heap;
mod module;
mod stream;

pub use device::SimDeviceSpec;
pub use heap::SimHeap;
pub use module::{SimModule, SEARCH_PATH};
pub use stream::{SimPacket, SimStatus, TxRecord};

use std::cell::RefCell;
use std::collections::HashSet;
use std::ffi::{c_void, CStr};
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::Mutex;

use log::{debug, log, warn};

use self::device::SimDevice;
use self::module::Registry;
use self::stream::SimStream;
use super::ffi::{
    ArgInfoRaw, Kwargs, LogHandlerFn, NativeDevice, NativeStream, RangeRaw, SOAPY_SDR_NOT_SUPPORTED,
};
use super::{
    ArgInfoQuery, Control, KwargsQuery, ModuleList, NativeApi, RangesQuery, StringQuery, StringTarget, StringsQuery,
};
use crate::codec::args::decode_kwargs;
use crate::codec::strings::cstr_to_string;
use crate::logger::LogLevel;
use crate::types::{Args, Direction, Range};

/// Status returned for releases of unknown or already released handles
const INVALID_HANDLE: c_int = -255;

thread_local! {
    static LAST_STATUS: RefCell<(c_int, String)> = const { RefCell::new((0, String::new())) };
}

fn reset_status() {
    LAST_STATUS.with(|last| *last.borrow_mut() = (0, String::new()));
}

fn fail(status: c_int, message: impl Into<String>) {
    LAST_STATUS.with(|last| *last.borrow_mut() = (status, message.into()));
}

pub struct SimulatedLibrary {
    catalog: Vec<SimDeviceSpec>,
    heap: SimHeap,
    devices: Mutex<HashSet<usize>>,
    streams: Mutex<HashSet<usize>>,
    registry: Mutex<Registry>,
    makes: AtomicUsize,
    unmakes: AtomicUsize,
    stream_closes: AtomicUsize,
    invalid_releases: AtomicUsize,
    log_handler: Mutex<Option<LogHandlerFn>>,
    log_level: AtomicI32,
}

impl Default for SimulatedLibrary {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SimulatedLibrary {
    pub fn new() -> Self {
        Self {
            catalog: Vec::new(),
            heap: SimHeap::new(),
            devices: Mutex::new(HashSet::new()),
            streams: Mutex::new(HashSet::new()),
            registry: Mutex::new(Registry::default()),
            makes: AtomicUsize::new(0),
            unmakes: AtomicUsize::new(0),
            stream_closes: AtomicUsize::new(0),
            invalid_releases: AtomicUsize::new(0),
            log_handler: Mutex::new(None),
            log_level: AtomicI32::new(LogLevel::Info as i32),
        }
    }

    pub fn with_device(mut self, spec: SimDeviceSpec) -> Self {
        self.catalog.push(spec);
        self
    }

    pub fn with_module(self, module: SimModule) -> Self {
        lock(&self.registry).modules.push(module);
        self
    }

    pub fn heap(&self) -> &SimHeap {
        &self.heap
    }

    pub fn open_devices(&self) -> usize {
        lock(&self.devices).len()
    }

    pub fn open_streams(&self) -> usize {
        lock(&self.streams).len()
    }

    /// Devices made successfully over the library's lifetime
    pub fn makes(&self) -> usize {
        self.makes.load(Ordering::SeqCst)
    }

    /// Devices unmade successfully over the library's lifetime
    pub fn unmakes(&self) -> usize {
        self.unmakes.load(Ordering::SeqCst)
    }

    /// Streams closed successfully over the library's lifetime
    pub fn stream_closes(&self) -> usize {
        self.stream_closes.load(Ordering::SeqCst)
    }

    /// Releases of devices or streams that were not live
    pub fn invalid_releases(&self) -> usize {
        self.invalid_releases.load(Ordering::SeqCst)
    }

    fn emit(&self, level: LogLevel, message: &str) {
        if level as i32 > self.log_level.load(Ordering::SeqCst) {
            return;
        }
        let handler = *lock(&self.log_handler);
        match handler {
            Some(handler) => {
                let Ok(message) = std::ffi::CString::new(message) else { return };
                unsafe { handler(level as c_int, message.as_ptr()) };
            }
            None => log!(target: "sdrbridge::sim", level.to_log_level(), "{}", message),
        }
    }

    /// # Safety
    /// `device` must be null or a pointer this library returned from `make`.
    unsafe fn device<'a>(&self, device: *const NativeDevice) -> Option<&'a SimDevice> {
        reset_status();
        if !lock(&self.devices).contains(&(device as usize)) {
            fail(INVALID_HANDLE, "invalid device handle");
            return None;
        }
        Some(&*device.cast::<SimDevice>())
    }

    /// # Safety
    /// `stream` must be null or a pointer this library returned from `setup_stream`.
    unsafe fn stream<'a>(&self, stream: *mut NativeStream) -> Option<&'a SimStream> {
        if !lock(&self.streams).contains(&(stream as usize)) {
            return None;
        }
        Some(&*stream.cast::<SimStream>())
    }

    /// Validate a channel and run `f`, recording NotSupported otherwise
    unsafe fn with_channel<T>(
        &self,
        device: *const NativeDevice,
        direction: Direction,
        channel: usize,
        default: T,
        f: impl FnOnce(&SimDevice) -> T,
    ) -> T {
        let Some(dev) = self.device(device) else { return default };
        if !dev.has_channel(direction, channel) {
            fail(
                SOAPY_SDR_NOT_SUPPORTED,
                format!("{} channel {} out of range", direction, channel),
            );
            return default;
        }
        f(dev)
    }

    fn strings_out(&self, values: &[String], length: *mut usize) -> *mut *mut c_char {
        unsafe { write_len(length, values.len()) };
        self.heap.alloc_strings(values)
    }

    fn ranges_out(&self, values: &[Range], length: *mut usize) -> *mut RangeRaw {
        unsafe { write_len(length, values.len()) };
        self.heap.alloc_ranges(values)
    }
}

unsafe fn write_len(length: *mut usize, value: usize) {
    if let Some(length) = length.as_mut() {
        *length = value;
    }
}

fn control_key(control: Control) -> Option<(&'static str, Direction, usize)> {
    match control {
        Control::Gain { direction, channel } => Some(("gain", direction, channel)),
        Control::Frequency { direction, channel } => Some(("frequency", direction, channel)),
        Control::SampleRate { direction, channel } => Some(("rate", direction, channel)),
        Control::Bandwidth { direction, channel } => Some(("bandwidth", direction, channel)),
        Control::MasterClockRate => None,
    }
}

impl NativeApi for SimulatedLibrary {
    fn name(&self) -> &str {
        "sim"
    }

    fn api_version(&self) -> &'static CStr {
        c"0.8.0"
    }

    fn abi_version(&self) -> &'static CStr {
        c"0.8"
    }

    fn lib_version(&self) -> &'static CStr {
        c"0.8.1-sim"
    }

    fn last_error(&self) -> String {
        LAST_STATUS.with(|last| last.borrow().1.clone())
    }

    fn last_status(&self) -> c_int {
        LAST_STATUS.with(|last| last.borrow().0)
    }

    fn register_log_handler(&self, handler: Option<LogHandlerFn>) {
        *lock(&self.log_handler) = handler;
    }

    fn set_log_level(&self, level: c_int) {
        self.log_level.store(level, Ordering::SeqCst);
    }

    unsafe fn log(&self, level: c_int, message: *const c_char) {
        let level = LogLevel::from_raw(level).unwrap_or(LogLevel::Info);
        self.emit(level, &cstr_to_string(message));
    }

    unsafe fn enumerate(&self, args: *const Kwargs, length: *mut usize) -> *mut Kwargs {
        reset_status();
        let filter = args.as_ref().map(|raw| decode_kwargs(raw)).unwrap_or_default();
        let found: Vec<Args> = self
            .catalog
            .iter()
            .filter(|spec| spec.matches(&filter))
            .map(|spec| spec.args.clone())
            .collect();
        write_len(length, found.len());
        self.heap.alloc_kwargs_list(&found)
    }

    unsafe fn make(&self, args: *const Kwargs) -> *mut NativeDevice {
        reset_status();
        let filter = args.as_ref().map(|raw| decode_kwargs(raw)).unwrap_or_default();
        let Some(spec) = self.catalog.iter().find(|spec| spec.matches(&filter)) else {
            fail(INVALID_HANDLE, format!("SoapySDR::Device::make() no match for {:?}", filter));
            return ptr::null_mut();
        };
        if let Some(message) = &spec.fail_make {
            fail(INVALID_HANDLE, message.clone());
            return ptr::null_mut();
        }

        let device = Box::into_raw(Box::new(SimDevice::new(spec.clone())));
        lock(&self.devices).insert(device as usize);
        self.makes.fetch_add(1, Ordering::SeqCst);
        self.emit(LogLevel::Info, &format!("made device {}", spec.args.get("serial").map_or("", String::as_str)));
        device.cast::<NativeDevice>()
    }

    unsafe fn unmake(&self, device: *mut NativeDevice) -> c_int {
        reset_status();
        if !lock(&self.devices).remove(&(device as usize)) {
            self.invalid_releases.fetch_add(1, Ordering::SeqCst);
            fail(INVALID_HANDLE, "unmake of a device that is not live");
            return INVALID_HANDLE;
        }
        drop(Box::from_raw(device.cast::<SimDevice>()));
        self.unmakes.fetch_add(1, Ordering::SeqCst);
        debug!("sim: device unmade");
        0
    }

    unsafe fn module_list(&self, query: ModuleList<'_>, length: *mut usize) -> *mut *mut c_char {
        let registry = lock(&self.registry);
        let values: Vec<String> = match query {
            ModuleList::SearchPaths => vec![SEARCH_PATH.to_string()],
            ModuleList::Modules => registry.modules.iter().map(|m| m.path.clone()).collect(),
            ModuleList::ModulesIn { path } => {
                let dir = path.to_string_lossy();
                registry
                    .modules
                    .iter()
                    .filter(|m| m.is_under(&dir))
                    .map(|m| m.path.clone())
                    .collect()
            }
        };
        self.strings_out(&values, length)
    }

    fn load_modules(&self) {
        let failures = lock(&self.registry).load_all();
        for (path, message) in failures {
            self.emit(LogLevel::Error, &format!("failed to load {}: {}", path, message));
        }
    }

    unsafe fn load_module(&self, path: *const c_char) -> *mut c_char {
        let message = lock(&self.registry).load(&cstr_to_string(path));
        self.heap.alloc_str(&message)
    }

    unsafe fn unload_module(&self, path: *const c_char) -> *mut c_char {
        let message = lock(&self.registry).unload(&cstr_to_string(path));
        self.heap.alloc_str(&message)
    }

    unsafe fn loader_result(&self, path: *const c_char) -> Kwargs {
        let path = cstr_to_string(path);
        let registry = lock(&self.registry);
        if !registry.loaded.contains(&path) {
            return Kwargs::empty();
        }
        let result: Args = registry
            .find(&path)
            .map(|m| m.registrations.iter().map(|name| (name.clone(), String::new())).collect())
            .unwrap_or_default();
        self.heap.alloc_kwargs(&result)
    }

    unsafe fn module_version(&self, path: *const c_char) -> *mut c_char {
        let path = cstr_to_string(path);
        let version = lock(&self.registry).find(&path).map(|m| m.version.clone()).unwrap_or_default();
        self.heap.alloc_str(&version)
    }

    unsafe fn free(&self, ptr: *mut c_void) {
        self.heap.release(ptr as usize);
    }

    unsafe fn strings_clear(&self, elems: *mut *mut *mut c_char, length: usize) {
        let Some(elems) = elems.as_mut() else { return };
        self.heap.release_strings(*elems, length);
        *elems = ptr::null_mut();
    }

    unsafe fn kwargs_clear(&self, args: *mut Kwargs) {
        self.heap.clear_kwargs(args);
    }

    unsafe fn kwargs_list_clear(&self, args: *mut Kwargs, length: usize) {
        self.heap.release_kwargs_list(args, length);
    }

    unsafe fn arg_info_clear(&self, info: *mut ArgInfoRaw) {
        self.heap.clear_arg_info(info);
    }

    unsafe fn arg_info_list_clear(&self, info: *mut ArgInfoRaw, length: usize) {
        self.heap.release_arg_info_list(info, length);
    }

    unsafe fn query_string(&self, device: *const NativeDevice, query: StringQuery<'_>) -> *mut c_char {
        let value = match query {
            StringQuery::DriverKey => self.device(device).map(|_| "sim".to_string()),
            StringQuery::HardwareKey => self.device(device).map(|dev| dev.spec.hardware_key.clone()),
            StringQuery::Antenna { direction, channel } => self.with_channel(device, direction, channel, None, |dev| {
                let tuning = dev.tuning();
                Some(
                    tuning
                        .antennas
                        .get(&(direction, channel))
                        .cloned()
                        .or_else(|| dev.spec.antennas.first().cloned())
                        .unwrap_or_default(),
                )
            }),
            StringQuery::Setting { key } => self.device(device).and_then(|dev| {
                let key = key.to_string_lossy();
                let value = dev.tuning().settings.get(&*key).cloned();
                if value.is_none() {
                    fail(SOAPY_SDR_NOT_SUPPORTED, format!("unknown setting {}", key));
                }
                value
            }),
            StringQuery::Sensor { key } => self.device(device).and_then(|dev| {
                let key = key.to_string_lossy();
                let value = dev
                    .spec
                    .sensors
                    .iter()
                    .find(|(info, _)| info.key == key)
                    .map(|(_, value)| value.clone());
                if value.is_none() {
                    fail(SOAPY_SDR_NOT_SUPPORTED, format!("unknown sensor {}", key));
                }
                value
            }),
            StringQuery::TimeSource => self.device(device).map(|dev| dev.tuning().time_source.clone()),
        };
        value.map_or(ptr::null_mut(), |v| self.heap.alloc_str(&v))
    }

    unsafe fn write_string(&self, device: *mut NativeDevice, target: StringTarget<'_>, value: *const c_char) -> c_int {
        let value = cstr_to_string(value);
        match target {
            StringTarget::Antenna { direction, channel } => {
                self.with_channel(device, direction, channel, SOAPY_SDR_NOT_SUPPORTED, |dev| {
                    if !dev.spec.antennas.contains(&value) {
                        fail(SOAPY_SDR_NOT_SUPPORTED, format!("unknown antenna {}", value));
                        return SOAPY_SDR_NOT_SUPPORTED;
                    }
                    dev.tuning().antennas.insert((direction, channel), value.clone());
                    0
                })
            }
            StringTarget::Setting { key } => {
                let Some(dev) = self.device(device) else { return INVALID_HANDLE };
                let key = key.to_string_lossy().into_owned();
                let mut tuning = dev.tuning();
                match tuning.settings.get_mut(&key) {
                    Some(slot) => {
                        *slot = value;
                        0
                    }
                    None => {
                        fail(SOAPY_SDR_NOT_SUPPORTED, format!("unknown setting {}", key));
                        SOAPY_SDR_NOT_SUPPORTED
                    }
                }
            }
            StringTarget::TimeSource => {
                let Some(dev) = self.device(device) else { return INVALID_HANDLE };
                if !dev.spec.time_sources.contains(&value) {
                    fail(SOAPY_SDR_NOT_SUPPORTED, format!("unknown time source {}", value));
                    return SOAPY_SDR_NOT_SUPPORTED;
                }
                dev.tuning().time_source = value;
                0
            }
        }
    }

    unsafe fn query_strings(&self, device: *const NativeDevice, query: StringsQuery, length: *mut usize) -> *mut *mut c_char {
        write_len(length, 0);
        let values = match query {
            StringsQuery::StreamFormats { direction, channel } => {
                self.with_channel(device, direction, channel, Vec::new(), |dev| {
                    dev.spec.formats.iter().map(|f| f.to_string()).collect()
                })
            }
            StringsQuery::Antennas { direction, channel } => {
                self.with_channel(device, direction, channel, Vec::new(), |dev| dev.spec.antennas.clone())
            }
            StringsQuery::Gains { direction, channel } => {
                self.with_channel(device, direction, channel, Vec::new(), |dev| dev.spec.gains.clone())
            }
            StringsQuery::Frequencies { direction, channel } => {
                self.with_channel(device, direction, channel, Vec::new(), |_| vec!["RF".to_string()])
            }
            StringsQuery::ClockSources => self.device(device).map(|dev| dev.spec.clock_sources.clone()).unwrap_or_default(),
            StringsQuery::TimeSources => self.device(device).map(|dev| dev.spec.time_sources.clone()).unwrap_or_default(),
            StringsQuery::Sensors => self
                .device(device)
                .map(|dev| dev.spec.sensors.iter().map(|(info, _)| info.key.clone()).collect())
                .unwrap_or_default(),
        };
        self.strings_out(&values, length)
    }

    unsafe fn query_kwargs(&self, device: *const NativeDevice, query: KwargsQuery) -> Kwargs {
        let args = match query {
            KwargsQuery::HardwareInfo => self.device(device).map(|dev| dev.spec.hardware_info.clone()),
            KwargsQuery::ChannelInfo { direction, channel } => {
                self.with_channel(device, direction, channel, None, |_| {
                    let mut info = Args::new();
                    info.insert("name".to_string(), format!("{}{}", direction, channel));
                    Some(info)
                })
            }
        };
        args.map_or_else(Kwargs::empty, |args| self.heap.alloc_kwargs(&args))
    }

    unsafe fn query_ranges(&self, device: *const NativeDevice, query: RangesQuery<'_>, length: *mut usize) -> *mut RangeRaw {
        write_len(length, 0);
        let values = match query {
            RangesQuery::Frequency { direction, channel } => {
                self.with_channel(device, direction, channel, Vec::new(), |dev| dev.spec.frequency_range.clone())
            }
            RangesQuery::FrequencyComponent { direction, channel, name } => {
                self.with_channel(device, direction, channel, Vec::new(), |dev| {
                    if name.to_bytes() == b"RF" {
                        dev.spec.frequency_range.clone()
                    } else {
                        fail(SOAPY_SDR_NOT_SUPPORTED, format!("unknown frequency component {:?}", name));
                        Vec::new()
                    }
                })
            }
            RangesQuery::SampleRate { direction, channel } => {
                self.with_channel(device, direction, channel, Vec::new(), |dev| dev.spec.sample_rate_range.clone())
            }
            RangesQuery::Bandwidth { direction, channel } => {
                self.with_channel(device, direction, channel, Vec::new(), |dev| dev.spec.bandwidth_range.clone())
            }
            RangesQuery::MasterClockRates => self
                .device(device)
                .map(|dev| dev.spec.master_clock_rates.clone())
                .unwrap_or_default(),
        };
        self.ranges_out(&values, length)
    }

    unsafe fn query_arg_info(&self, device: *const NativeDevice, query: ArgInfoQuery, length: *mut usize) -> *mut ArgInfoRaw {
        write_len(length, 0);
        let values = match query {
            ArgInfoQuery::Settings => self.device(device).map(|dev| dev.spec.settings.clone()).unwrap_or_default(),
            ArgInfoQuery::ChannelSettings { direction, channel } => {
                self.with_channel(device, direction, channel, Vec::new(), |_| Vec::new())
            }
            ArgInfoQuery::StreamArgs { direction, channel } => {
                self.with_channel(device, direction, channel, Vec::new(), |dev| dev.spec.stream_args.clone())
            }
            ArgInfoQuery::FrequencyArgs { direction, channel } => {
                self.with_channel(device, direction, channel, Vec::new(), |dev| dev.spec.frequency_args.clone())
            }
        };
        write_len(length, values.len());
        self.heap.alloc_arg_info_list(&values)
    }

    unsafe fn sensor_info(&self, device: *const NativeDevice, key: *const c_char) -> ArgInfoRaw {
        let key = cstr_to_string(key);
        let Some(dev) = self.device(device) else { return ArgInfoRaw::empty() };
        match dev.spec.sensors.iter().find(|(info, _)| info.key == key) {
            Some((info, _)) => self.heap.alloc_arg_info(info),
            None => {
                fail(SOAPY_SDR_NOT_SUPPORTED, format!("unknown sensor {}", key));
                ArgInfoRaw::empty()
            }
        }
    }

    unsafe fn num_channels(&self, device: *const NativeDevice, direction: Direction) -> usize {
        self.device(device).map_or(0, |dev| dev.spec.num_channels(direction))
    }

    unsafe fn full_duplex(&self, device: *const NativeDevice, direction: Direction, channel: usize) -> bool {
        self.with_channel(device, direction, channel, false, |dev| dev.spec.tx_channels > 0 && dev.spec.rx_channels > 0)
    }

    unsafe fn has_dc_offset_mode(&self, device: *const NativeDevice, direction: Direction, channel: usize) -> bool {
        self.with_channel(device, direction, channel, false, |dev| dev.spec.dc_offset_mode)
    }

    unsafe fn gain_range(&self, device: *const NativeDevice, direction: Direction, channel: usize) -> RangeRaw {
        self.with_channel(device, direction, channel, RangeRaw::default(), |dev| dev.spec.gain_range.into())
    }

    unsafe fn native_stream_format(
        &self,
        device: *const NativeDevice,
        direction: Direction,
        channel: usize,
        full_scale: *mut f64,
    ) -> *mut c_char {
        let native = self.with_channel(device, direction, channel, None, |dev| {
            Some((dev.spec.native_format, dev.spec.full_scale))
        });
        match native {
            Some((format, scale)) => {
                if let Some(full_scale) = full_scale.as_mut() {
                    *full_scale = scale;
                }
                self.heap.alloc_str(format.as_str())
            }
            None => ptr::null_mut(),
        }
    }

    unsafe fn set_control(&self, device: *mut NativeDevice, control: Control, value: f64) -> c_int {
        match control_key(control) {
            Some((name, direction, channel)) => {
                self.with_channel(device, direction, channel, SOAPY_SDR_NOT_SUPPORTED, |dev| {
                    dev.tuning().controls.insert((name, direction, channel), value);
                    0
                })
            }
            None => match self.device(device) {
                Some(dev) => {
                    dev.tuning().master_clock_rate = value;
                    0
                }
                None => INVALID_HANDLE,
            },
        }
    }

    unsafe fn get_control(&self, device: *const NativeDevice, control: Control) -> f64 {
        match control_key(control) {
            Some((name, direction, channel)) => self.with_channel(device, direction, channel, 0.0, |dev| {
                dev.tuning().controls.get(&(name, direction, channel)).copied().unwrap_or(0.0)
            }),
            None => self.device(device).map_or(0.0, |dev| dev.tuning().master_clock_rate),
        }
    }

    unsafe fn set_frequency(
        &self,
        device: *mut NativeDevice,
        direction: Direction,
        channel: usize,
        frequency: f64,
        args: *const Kwargs,
    ) -> c_int {
        let args = args.as_ref().map(|raw| decode_kwargs(raw)).unwrap_or_default();
        self.with_channel(device, direction, channel, SOAPY_SDR_NOT_SUPPORTED, |dev| {
            let offset: f64 = args.get("OFFSET").and_then(|v| v.parse().ok()).unwrap_or(0.0);
            dev.tuning()
                .controls
                .insert(("frequency", direction, channel), frequency + offset);
            0
        })
    }

    unsafe fn has_hardware_time(&self, device: *const NativeDevice, what: *const c_char) -> bool {
        let what = cstr_to_string(what);
        self.device(device).is_some_and(|dev| dev.spec.has_clock(&what))
    }

    unsafe fn get_hardware_time(&self, device: *const NativeDevice, what: *const c_char) -> i64 {
        let what = cstr_to_string(what);
        let Some(dev) = self.device(device) else { return 0 };
        if !dev.spec.has_clock(&what) {
            fail(SOAPY_SDR_NOT_SUPPORTED, format!("no hardware clock {:?}", what));
            return 0;
        }
        dev.tuning().hardware_time.get(&what).copied().unwrap_or(0)
    }

    unsafe fn set_hardware_time(&self, device: *mut NativeDevice, time_ns: i64, what: *const c_char) -> c_int {
        let what = cstr_to_string(what);
        let Some(dev) = self.device(device) else { return INVALID_HANDLE };
        if !dev.spec.has_clock(&what) {
            fail(SOAPY_SDR_NOT_SUPPORTED, format!("no hardware clock {:?}", what));
            return SOAPY_SDR_NOT_SUPPORTED;
        }
        dev.tuning().hardware_time.insert(what, time_ns);
        0
    }

    unsafe fn setup_stream(
        &self,
        device: *mut NativeDevice,
        direction: Direction,
        format: *const c_char,
        channels: *const usize,
        num_channels: usize,
        _args: *const Kwargs,
    ) -> *mut NativeStream {
        let Some(dev) = self.device(device) else { return ptr::null_mut() };

        let format_tag = cstr_to_string(format);
        let Some(format) = dev.spec.formats.iter().copied().find(|f| f.as_str() == format_tag) else {
            fail(SOAPY_SDR_NOT_SUPPORTED, format!("setupStream: format {} not supported", format_tag));
            return ptr::null_mut();
        };

        let channels = crate::codec::slice_or_empty(channels, num_channels).to_vec();
        if let Some(bad) = channels.iter().find(|&&ch| !dev.has_channel(direction, ch)) {
            fail(SOAPY_SDR_NOT_SUPPORTED, format!("setupStream: invalid {} channel {}", direction, bad));
            return ptr::null_mut();
        }

        let stream = SimStream::new(
            direction,
            channels,
            format,
            dev.spec.mtu,
            dev.spec.status_supported,
            dev.spec.stream_feeds(),
        );
        let stream = Box::into_raw(Box::new(stream));
        lock(&self.streams).insert(stream as usize);
        stream.cast::<NativeStream>()
    }

    unsafe fn close_stream(&self, _device: *mut NativeDevice, stream: *mut NativeStream) -> c_int {
        if !lock(&self.streams).remove(&(stream as usize)) {
            self.invalid_releases.fetch_add(1, Ordering::SeqCst);
            warn!("sim: close of a stream that is not live");
            return INVALID_HANDLE;
        }
        drop(Box::from_raw(stream.cast::<SimStream>()));
        self.stream_closes.fetch_add(1, Ordering::SeqCst);
        0
    }

    unsafe fn stream_mtu(&self, _device: *const NativeDevice, stream: *mut NativeStream) -> usize {
        self.stream(stream).map_or(0, |s| s.mtu)
    }

    unsafe fn activate_stream(
        &self,
        _device: *mut NativeDevice,
        stream: *mut NativeStream,
        _flags: c_int,
        _time_ns: i64,
        _num_elems: usize,
    ) -> c_int {
        self.stream(stream).map_or(INVALID_HANDLE, SimStream::activate)
    }

    unsafe fn deactivate_stream(&self, _device: *mut NativeDevice, stream: *mut NativeStream, _flags: c_int, _time_ns: i64) -> c_int {
        self.stream(stream).map_or(INVALID_HANDLE, SimStream::deactivate)
    }

    unsafe fn read_stream(
        &self,
        _device: *mut NativeDevice,
        stream: *mut NativeStream,
        buffs: *const *mut c_void,
        num_elems: usize,
        flags: *mut c_int,
        time_ns: *mut i64,
        timeout_us: i64,
    ) -> c_int {
        let Some(stream) = self.stream(stream) else { return INVALID_HANDLE };
        let (mut out_flags, mut out_time) = (0, 0);
        let ret = stream.read(buffs, num_elems, &mut out_flags, &mut out_time, timeout_us);
        if let Some(flags) = flags.as_mut() {
            *flags = out_flags;
        }
        if let Some(time_ns) = time_ns.as_mut() {
            *time_ns = out_time;
        }
        ret
    }

    unsafe fn write_stream(
        &self,
        _device: *mut NativeDevice,
        stream: *mut NativeStream,
        buffs: *const *const c_void,
        num_elems: usize,
        flags: *mut c_int,
        time_ns: i64,
        _timeout_us: i64,
    ) -> c_int {
        let Some(stream) = self.stream(stream) else { return INVALID_HANDLE };
        let mut in_out = flags.as_ref().copied().unwrap_or(0);
        let ret = stream.write(buffs, num_elems, &mut in_out, time_ns);
        if let Some(flags) = flags.as_mut() {
            *flags = in_out;
        }
        ret
    }

    unsafe fn read_stream_status(
        &self,
        _device: *mut NativeDevice,
        stream: *mut NativeStream,
        chan_mask: *mut usize,
        flags: *mut c_int,
        time_ns: *mut i64,
        timeout_us: i64,
    ) -> c_int {
        let Some(stream) = self.stream(stream) else { return INVALID_HANDLE };
        let (mut mask, mut out_flags, mut out_time) = (0, 0, 0);
        let ret = stream.read_status(&mut mask, &mut out_flags, &mut out_time, timeout_us);
        if let Some(chan_mask) = chan_mask.as_mut() {
            *chan_mask = mask;
        }
        if let Some(flags) = flags.as_mut() {
            *flags = out_flags;
        }
        if let Some(time_ns) = time_ns.as_mut() {
            *time_ns = out_time;
        }
        ret
    }

    unsafe fn num_direct_access_buffers(&self, _device: *mut NativeDevice, _stream: *mut NativeStream) -> usize {
        // Direct buffer access is not simulated.
        0
    }
}

impl Drop for SimulatedLibrary {
    fn drop(&mut self) {
        let streams: Vec<usize> = lock(&self.streams).drain().collect();
        for stream in streams {
            unsafe { drop(Box::from_raw(stream as *mut SimStream)) };
        }
        let devices: Vec<usize> = lock(&self.devices).drain().collect();
        for device in devices {
            unsafe { drop(Box::from_raw(device as *mut SimDevice)) };
        }
    }
}
