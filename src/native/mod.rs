//! The foreign-function boundary.
//!
//! [`NativeApi`] mirrors the subset of the SoapySDR C API this crate drives.
//! Every method traffics in raw pointers with the exact C semantics, so all
//! the data-carrying methods are `unsafe`: callers must pass pointers that were
//! obtained from the same implementation (or host buffers valid for the call).
//!
//! Memory returned by the `query_*`, `enumerate` and `*_info` methods is
//! allocated by the native side and must go back through the matching
//! release method (`free`, `strings_clear`, `kwargs_clear`, ...). Memory the
//! host passes in stays owned by the host.

pub mod ffi;
pub mod sim;
#[cfg(feature = "soapysdr")]
pub mod soapy;

use std::ffi::{c_void, CStr};
use std::os::raw::{c_char, c_int};
use std::sync::Arc;

use crate::types::Direction;
use ffi::{ArgInfoRaw, Kwargs, LogHandlerFn, NativeDevice, NativeStream, RangeRaw};

pub use sim::{SimDeviceSpec, SimModule, SimPacket, SimStatus, SimulatedLibrary, TxRecord};
#[cfg(feature = "soapysdr")]
pub use soapy::SoapyLibrary;

/// Shared handle to a native library implementation
pub type Api = Arc<dyn NativeApi>;

/// Single heap-allocated string returned by the device
#[derive(Debug, Clone, Copy)]
pub enum StringQuery<'a> {
    DriverKey,
    HardwareKey,
    Antenna { direction: Direction, channel: usize },
    Setting { key: &'a CStr },
    Sensor { key: &'a CStr },
    TimeSource,
}

/// Writable string-valued controls
#[derive(Debug, Clone, Copy)]
pub enum StringTarget<'a> {
    Antenna { direction: Direction, channel: usize },
    Setting { key: &'a CStr },
    TimeSource,
}

/// Native string lists (`char **` plus length)
#[derive(Debug, Clone, Copy)]
pub enum StringsQuery {
    StreamFormats { direction: Direction, channel: usize },
    Antennas { direction: Direction, channel: usize },
    Gains { direction: Direction, channel: usize },
    Frequencies { direction: Direction, channel: usize },
    ClockSources,
    TimeSources,
    Sensors,
}

/// Module registry string lists; these calls take no device
#[derive(Debug, Clone, Copy)]
pub enum ModuleList<'a> {
    SearchPaths,
    Modules,
    ModulesIn { path: &'a CStr },
}

/// Kwargs returned by value
#[derive(Debug, Clone, Copy)]
pub enum KwargsQuery {
    HardwareInfo,
    ChannelInfo { direction: Direction, channel: usize },
}

/// Range arrays
#[derive(Debug, Clone, Copy)]
pub enum RangesQuery<'a> {
    Frequency { direction: Direction, channel: usize },
    FrequencyComponent { direction: Direction, channel: usize, name: &'a CStr },
    SampleRate { direction: Direction, channel: usize },
    Bandwidth { direction: Direction, channel: usize },
    MasterClockRates,
}

/// Argument-descriptor arrays
#[derive(Debug, Clone, Copy)]
pub enum ArgInfoQuery {
    Settings,
    ChannelSettings { direction: Direction, channel: usize },
    StreamArgs { direction: Direction, channel: usize },
    FrequencyArgs { direction: Direction, channel: usize },
}

/// Scalar numeric controls
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    Gain { direction: Direction, channel: usize },
    Frequency { direction: Direction, channel: usize },
    SampleRate { direction: Direction, channel: usize },
    Bandwidth { direction: Direction, channel: usize },
    MasterClockRate,
}

pub trait NativeApi: Send + Sync {
    /// Short name used in log messages
    fn name(&self) -> &str;

    fn api_version(&self) -> &'static CStr;
    fn abi_version(&self) -> &'static CStr;
    fn lib_version(&self) -> &'static CStr;

    /// Message describing why the last call on this thread failed
    fn last_error(&self) -> String;
    /// Status code of the last call; 0 on success
    fn last_status(&self) -> c_int;

    /// Install (`Some`) or remove (`None`) the native log callback
    fn register_log_handler(&self, handler: Option<LogHandlerFn>);
    fn set_log_level(&self, level: c_int);
    unsafe fn log(&self, level: c_int, message: *const c_char);

    // Factory

    unsafe fn enumerate(&self, args: *const Kwargs, length: *mut usize) -> *mut Kwargs;
    /// Returns null on failure; see [`NativeApi::last_error`]
    unsafe fn make(&self, args: *const Kwargs) -> *mut NativeDevice;
    unsafe fn unmake(&self, device: *mut NativeDevice) -> c_int;

    // Module registry

    unsafe fn module_list(&self, query: ModuleList<'_>, length: *mut usize) -> *mut *mut c_char;
    /// Load every module on the search paths
    fn load_modules(&self);
    /// Returns an error message, empty on success
    unsafe fn load_module(&self, path: *const c_char) -> *mut c_char;
    /// Returns an error message, empty on success
    unsafe fn unload_module(&self, path: *const c_char) -> *mut c_char;
    /// Registration name to error message for every factory the module registered
    unsafe fn loader_result(&self, path: *const c_char) -> Kwargs;
    unsafe fn module_version(&self, path: *const c_char) -> *mut c_char;

    // Release of native allocations

    unsafe fn free(&self, ptr: *mut c_void);
    unsafe fn strings_clear(&self, elems: *mut *mut *mut c_char, length: usize);
    /// Frees the contents of one kwargs, not the struct itself
    unsafe fn kwargs_clear(&self, args: *mut Kwargs);
    unsafe fn kwargs_list_clear(&self, args: *mut Kwargs, length: usize);
    /// Frees the contents of one arg info, not the struct itself
    unsafe fn arg_info_clear(&self, info: *mut ArgInfoRaw);
    unsafe fn arg_info_list_clear(&self, info: *mut ArgInfoRaw, length: usize);

    // Control plane

    unsafe fn query_string(&self, device: *const NativeDevice, query: StringQuery<'_>) -> *mut c_char;
    unsafe fn write_string(
        &self,
        device: *mut NativeDevice,
        target: StringTarget<'_>,
        value: *const c_char,
    ) -> c_int;
    unsafe fn query_strings(
        &self,
        device: *const NativeDevice,
        query: StringsQuery,
        length: *mut usize,
    ) -> *mut *mut c_char;
    unsafe fn query_kwargs(&self, device: *const NativeDevice, query: KwargsQuery) -> Kwargs;
    unsafe fn query_ranges(
        &self,
        device: *const NativeDevice,
        query: RangesQuery<'_>,
        length: *mut usize,
    ) -> *mut RangeRaw;
    unsafe fn query_arg_info(
        &self,
        device: *const NativeDevice,
        query: ArgInfoQuery,
        length: *mut usize,
    ) -> *mut ArgInfoRaw;
    /// Returned by value; its contents must be released with `arg_info_clear`
    unsafe fn sensor_info(&self, device: *const NativeDevice, key: *const c_char) -> ArgInfoRaw;
    unsafe fn num_channels(&self, device: *const NativeDevice, direction: Direction) -> usize;
    unsafe fn full_duplex(&self, device: *const NativeDevice, direction: Direction, channel: usize) -> bool;
    unsafe fn has_dc_offset_mode(
        &self,
        device: *const NativeDevice,
        direction: Direction,
        channel: usize,
    ) -> bool;
    unsafe fn gain_range(&self, device: *const NativeDevice, direction: Direction, channel: usize) -> RangeRaw;
    unsafe fn native_stream_format(
        &self,
        device: *const NativeDevice,
        direction: Direction,
        channel: usize,
        full_scale: *mut f64,
    ) -> *mut c_char;
    unsafe fn set_control(&self, device: *mut NativeDevice, control: Control, value: f64) -> c_int;
    unsafe fn get_control(&self, device: *const NativeDevice, control: Control) -> f64;
    unsafe fn set_frequency(
        &self,
        device: *mut NativeDevice,
        direction: Direction,
        channel: usize,
        frequency: f64,
        args: *const Kwargs,
    ) -> c_int;

    // Hardware time

    unsafe fn has_hardware_time(&self, device: *const NativeDevice, what: *const c_char) -> bool;
    unsafe fn get_hardware_time(&self, device: *const NativeDevice, what: *const c_char) -> i64;
    unsafe fn set_hardware_time(&self, device: *mut NativeDevice, time_ns: i64, what: *const c_char) -> c_int;

    // Streaming

    /// Returns null when the channel/format combination is rejected
    unsafe fn setup_stream(
        &self,
        device: *mut NativeDevice,
        direction: Direction,
        format: *const c_char,
        channels: *const usize,
        num_channels: usize,
        args: *const Kwargs,
    ) -> *mut NativeStream;
    unsafe fn close_stream(&self, device: *mut NativeDevice, stream: *mut NativeStream) -> c_int;
    unsafe fn stream_mtu(&self, device: *const NativeDevice, stream: *mut NativeStream) -> usize;
    unsafe fn activate_stream(
        &self,
        device: *mut NativeDevice,
        stream: *mut NativeStream,
        flags: c_int,
        time_ns: i64,
        num_elems: usize,
    ) -> c_int;
    unsafe fn deactivate_stream(
        &self,
        device: *mut NativeDevice,
        stream: *mut NativeStream,
        flags: c_int,
        time_ns: i64,
    ) -> c_int;
    /// Returns the element count, or a negative status code
    unsafe fn read_stream(
        &self,
        device: *mut NativeDevice,
        stream: *mut NativeStream,
        buffs: *const *mut c_void,
        num_elems: usize,
        flags: *mut c_int,
        time_ns: *mut i64,
        timeout_us: i64,
    ) -> c_int;
    /// Returns the element count, or a negative status code
    unsafe fn write_stream(
        &self,
        device: *mut NativeDevice,
        stream: *mut NativeStream,
        buffs: *const *const c_void,
        num_elems: usize,
        flags: *mut c_int,
        time_ns: i64,
        timeout_us: i64,
    ) -> c_int;
    unsafe fn read_stream_status(
        &self,
        device: *mut NativeDevice,
        stream: *mut NativeStream,
        chan_mask: *mut usize,
        flags: *mut c_int,
        time_ns: *mut i64,
        timeout_us: i64,
    ) -> c_int;
    unsafe fn num_direct_access_buffers(&self, device: *mut NativeDevice, stream: *mut NativeStream) -> usize;
}
