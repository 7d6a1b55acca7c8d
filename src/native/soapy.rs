//! [`NativeApi`] over the system `libSoapySDR` (0.8 C API).

use std::ffi::{c_void, CStr};
use std::os::raw::{c_char, c_int, c_long, c_longlong};
use std::ptr;

use super::ffi::{ArgInfoRaw, Kwargs, LogHandlerFn, NativeDevice, NativeStream, RangeRaw};
use super::{
    ArgInfoQuery, Control, KwargsQuery, ModuleList, NativeApi, RangesQuery, StringQuery, StringTarget, StringsQuery,
};
use crate::codec::strings::cstr_to_string;
use crate::types::Direction;

#[link(name = "SoapySDR")]
extern "C" {
    fn SoapySDR_getAPIVersion() -> *const c_char;
    fn SoapySDR_getABIVersion() -> *const c_char;
    fn SoapySDR_getLibVersion() -> *const c_char;

    fn SoapySDR_registerLogHandler(handler: Option<LogHandlerFn>);
    fn SoapySDR_setLogLevel(level: c_int);
    fn SoapySDR_log(level: c_int, message: *const c_char);

    fn SoapySDR_listSearchPaths(length: *mut usize) -> *mut *mut c_char;
    fn SoapySDR_listModules(length: *mut usize) -> *mut *mut c_char;
    fn SoapySDR_listModulesPath(path: *const c_char, length: *mut usize) -> *mut *mut c_char;
    fn SoapySDR_loadModules();
    fn SoapySDR_loadModule(path: *const c_char) -> *mut c_char;
    fn SoapySDR_unloadModule(path: *const c_char) -> *mut c_char;
    fn SoapySDR_getLoaderResult(path: *const c_char) -> Kwargs;
    fn SoapySDR_getModuleVersion(path: *const c_char) -> *mut c_char;

    fn SoapySDRDevice_lastError() -> *const c_char;
    fn SoapySDRDevice_lastStatus() -> c_int;

    fn SoapySDR_free(ptr: *mut c_void);
    fn SoapySDRStrings_clear(elems: *mut *mut *mut c_char, length: usize);
    fn SoapySDRKwargs_clear(args: *mut Kwargs);
    fn SoapySDRKwargsList_clear(args: *mut Kwargs, length: usize);
    fn SoapySDRArgInfo_clear(info: *mut ArgInfoRaw);
    fn SoapySDRArgInfoList_clear(info: *mut ArgInfoRaw, length: usize);

    fn SoapySDRDevice_enumerate(args: *const Kwargs, length: *mut usize) -> *mut Kwargs;
    fn SoapySDRDevice_make(args: *const Kwargs) -> *mut NativeDevice;
    fn SoapySDRDevice_unmake(device: *mut NativeDevice) -> c_int;

    fn SoapySDRDevice_getDriverKey(device: *const NativeDevice) -> *mut c_char;
    fn SoapySDRDevice_getHardwareKey(device: *const NativeDevice) -> *mut c_char;
    fn SoapySDRDevice_getHardwareInfo(device: *const NativeDevice) -> Kwargs;

    fn SoapySDRDevice_getNumChannels(device: *const NativeDevice, direction: c_int) -> usize;
    fn SoapySDRDevice_getChannelInfo(device: *const NativeDevice, direction: c_int, channel: usize) -> Kwargs;
    fn SoapySDRDevice_getFullDuplex(device: *const NativeDevice, direction: c_int, channel: usize) -> bool;

    fn SoapySDRDevice_getStreamFormats(
        device: *const NativeDevice,
        direction: c_int,
        channel: usize,
        length: *mut usize,
    ) -> *mut *mut c_char;
    fn SoapySDRDevice_getNativeStreamFormat(
        device: *const NativeDevice,
        direction: c_int,
        channel: usize,
        full_scale: *mut f64,
    ) -> *mut c_char;
    fn SoapySDRDevice_getStreamArgsInfo(
        device: *const NativeDevice,
        direction: c_int,
        channel: usize,
        length: *mut usize,
    ) -> *mut ArgInfoRaw;

    fn SoapySDRDevice_setupStream(
        device: *mut NativeDevice,
        direction: c_int,
        format: *const c_char,
        channels: *const usize,
        num_chans: usize,
        args: *const Kwargs,
    ) -> *mut NativeStream;
    fn SoapySDRDevice_closeStream(device: *mut NativeDevice, stream: *mut NativeStream) -> c_int;
    fn SoapySDRDevice_getStreamMTU(device: *const NativeDevice, stream: *mut NativeStream) -> usize;
    fn SoapySDRDevice_activateStream(
        device: *mut NativeDevice,
        stream: *mut NativeStream,
        flags: c_int,
        time_ns: c_longlong,
        num_elems: usize,
    ) -> c_int;
    fn SoapySDRDevice_deactivateStream(
        device: *mut NativeDevice,
        stream: *mut NativeStream,
        flags: c_int,
        time_ns: c_longlong,
    ) -> c_int;
    fn SoapySDRDevice_readStream(
        device: *mut NativeDevice,
        stream: *mut NativeStream,
        buffs: *const *mut c_void,
        num_elems: usize,
        flags: *mut c_int,
        time_ns: *mut c_longlong,
        timeout_us: c_long,
    ) -> c_int;
    fn SoapySDRDevice_writeStream(
        device: *mut NativeDevice,
        stream: *mut NativeStream,
        buffs: *const *const c_void,
        num_elems: usize,
        flags: *mut c_int,
        time_ns: c_longlong,
        timeout_us: c_long,
    ) -> c_int;
    fn SoapySDRDevice_readStreamStatus(
        device: *mut NativeDevice,
        stream: *mut NativeStream,
        chan_mask: *mut usize,
        flags: *mut c_int,
        time_ns: *mut c_longlong,
        timeout_us: c_long,
    ) -> c_int;
    fn SoapySDRDevice_getNumDirectAccessBuffers(device: *mut NativeDevice, stream: *mut NativeStream) -> usize;

    fn SoapySDRDevice_listAntennas(
        device: *const NativeDevice,
        direction: c_int,
        channel: usize,
        length: *mut usize,
    ) -> *mut *mut c_char;
    fn SoapySDRDevice_setAntenna(device: *mut NativeDevice, direction: c_int, channel: usize, name: *const c_char)
        -> c_int;
    fn SoapySDRDevice_getAntenna(device: *const NativeDevice, direction: c_int, channel: usize) -> *mut c_char;

    fn SoapySDRDevice_hasDCOffsetMode(device: *const NativeDevice, direction: c_int, channel: usize) -> bool;

    fn SoapySDRDevice_listGains(
        device: *const NativeDevice,
        direction: c_int,
        channel: usize,
        length: *mut usize,
    ) -> *mut *mut c_char;
    fn SoapySDRDevice_setGain(device: *mut NativeDevice, direction: c_int, channel: usize, value: f64) -> c_int;
    fn SoapySDRDevice_getGain(device: *const NativeDevice, direction: c_int, channel: usize) -> f64;
    fn SoapySDRDevice_getGainRange(device: *const NativeDevice, direction: c_int, channel: usize) -> RangeRaw;

    fn SoapySDRDevice_setFrequency(
        device: *mut NativeDevice,
        direction: c_int,
        channel: usize,
        frequency: f64,
        args: *const Kwargs,
    ) -> c_int;
    fn SoapySDRDevice_getFrequency(device: *const NativeDevice, direction: c_int, channel: usize) -> f64;
    fn SoapySDRDevice_listFrequencies(
        device: *const NativeDevice,
        direction: c_int,
        channel: usize,
        length: *mut usize,
    ) -> *mut *mut c_char;
    fn SoapySDRDevice_getFrequencyRange(
        device: *const NativeDevice,
        direction: c_int,
        channel: usize,
        length: *mut usize,
    ) -> *mut RangeRaw;
    fn SoapySDRDevice_getFrequencyRangeComponent(
        device: *const NativeDevice,
        direction: c_int,
        channel: usize,
        name: *const c_char,
        length: *mut usize,
    ) -> *mut RangeRaw;
    fn SoapySDRDevice_getFrequencyArgsInfo(
        device: *const NativeDevice,
        direction: c_int,
        channel: usize,
        length: *mut usize,
    ) -> *mut ArgInfoRaw;

    fn SoapySDRDevice_setSampleRate(device: *mut NativeDevice, direction: c_int, channel: usize, rate: f64) -> c_int;
    fn SoapySDRDevice_getSampleRate(device: *const NativeDevice, direction: c_int, channel: usize) -> f64;
    fn SoapySDRDevice_getSampleRateRange(
        device: *const NativeDevice,
        direction: c_int,
        channel: usize,
        length: *mut usize,
    ) -> *mut RangeRaw;

    fn SoapySDRDevice_setBandwidth(device: *mut NativeDevice, direction: c_int, channel: usize, bw: f64) -> c_int;
    fn SoapySDRDevice_getBandwidth(device: *const NativeDevice, direction: c_int, channel: usize) -> f64;
    fn SoapySDRDevice_getBandwidthRange(
        device: *const NativeDevice,
        direction: c_int,
        channel: usize,
        length: *mut usize,
    ) -> *mut RangeRaw;

    fn SoapySDRDevice_setMasterClockRate(device: *mut NativeDevice, rate: f64) -> c_int;
    fn SoapySDRDevice_getMasterClockRate(device: *const NativeDevice) -> f64;
    fn SoapySDRDevice_getMasterClockRates(device: *const NativeDevice, length: *mut usize) -> *mut RangeRaw;
    fn SoapySDRDevice_listClockSources(device: *const NativeDevice, length: *mut usize) -> *mut *mut c_char;
    fn SoapySDRDevice_listTimeSources(device: *const NativeDevice, length: *mut usize) -> *mut *mut c_char;
    fn SoapySDRDevice_setTimeSource(device: *mut NativeDevice, source: *const c_char) -> c_int;
    fn SoapySDRDevice_getTimeSource(device: *const NativeDevice) -> *mut c_char;
    fn SoapySDRDevice_hasHardwareTime(device: *const NativeDevice, what: *const c_char) -> bool;
    fn SoapySDRDevice_getHardwareTime(device: *const NativeDevice, what: *const c_char) -> c_longlong;
    fn SoapySDRDevice_setHardwareTime(device: *mut NativeDevice, time_ns: c_longlong, what: *const c_char) -> c_int;

    fn SoapySDRDevice_listSensors(device: *const NativeDevice, length: *mut usize) -> *mut *mut c_char;
    fn SoapySDRDevice_getSensorInfo(device: *const NativeDevice, key: *const c_char) -> ArgInfoRaw;
    fn SoapySDRDevice_readSensor(device: *const NativeDevice, key: *const c_char) -> *mut c_char;

    fn SoapySDRDevice_getSettingInfo(device: *const NativeDevice, length: *mut usize) -> *mut ArgInfoRaw;
    fn SoapySDRDevice_getChannelSettingInfo(
        device: *const NativeDevice,
        direction: c_int,
        channel: usize,
        length: *mut usize,
    ) -> *mut ArgInfoRaw;
    fn SoapySDRDevice_writeSetting(device: *mut NativeDevice, key: *const c_char, value: *const c_char) -> c_int;
    fn SoapySDRDevice_readSetting(device: *const NativeDevice, key: *const c_char) -> *mut c_char;
}

/// The linked SoapySDR library. Stateless; every call goes straight through.
#[derive(Debug, Default, Clone, Copy)]
pub struct SoapyLibrary;

impl SoapyLibrary {
    pub fn new() -> Self {
        Self
    }
}

fn static_cstr(ptr: *const c_char) -> &'static CStr {
    if ptr.is_null() {
        return c"";
    }
    // SAFETY: version strings are static storage inside the library.
    unsafe { CStr::from_ptr(ptr) }
}

fn timeout(timeout_us: i64) -> c_long {
    timeout_us.clamp(c_long::MIN as i64, c_long::MAX as i64) as c_long
}

impl NativeApi for SoapyLibrary {
    fn name(&self) -> &str {
        "SoapySDR"
    }

    fn api_version(&self) -> &'static CStr {
        static_cstr(unsafe { SoapySDR_getAPIVersion() })
    }

    fn abi_version(&self) -> &'static CStr {
        static_cstr(unsafe { SoapySDR_getABIVersion() })
    }

    fn lib_version(&self) -> &'static CStr {
        static_cstr(unsafe { SoapySDR_getLibVersion() })
    }

    fn last_error(&self) -> String {
        unsafe { cstr_to_string(SoapySDRDevice_lastError()) }
    }

    fn last_status(&self) -> c_int {
        unsafe { SoapySDRDevice_lastStatus() }
    }

    fn register_log_handler(&self, handler: Option<LogHandlerFn>) {
        unsafe { SoapySDR_registerLogHandler(handler) }
    }

    fn set_log_level(&self, level: c_int) {
        unsafe { SoapySDR_setLogLevel(level) }
    }

    unsafe fn log(&self, level: c_int, message: *const c_char) {
        SoapySDR_log(level, message)
    }

    unsafe fn enumerate(&self, args: *const Kwargs, length: *mut usize) -> *mut Kwargs {
        SoapySDRDevice_enumerate(args, length)
    }

    unsafe fn make(&self, args: *const Kwargs) -> *mut NativeDevice {
        SoapySDRDevice_make(args)
    }

    unsafe fn unmake(&self, device: *mut NativeDevice) -> c_int {
        SoapySDRDevice_unmake(device)
    }

    unsafe fn module_list(&self, query: ModuleList<'_>, length: *mut usize) -> *mut *mut c_char {
        match query {
            ModuleList::SearchPaths => SoapySDR_listSearchPaths(length),
            ModuleList::Modules => SoapySDR_listModules(length),
            ModuleList::ModulesIn { path } => SoapySDR_listModulesPath(path.as_ptr(), length),
        }
    }

    fn load_modules(&self) {
        unsafe { SoapySDR_loadModules() }
    }

    unsafe fn load_module(&self, path: *const c_char) -> *mut c_char {
        SoapySDR_loadModule(path)
    }

    unsafe fn unload_module(&self, path: *const c_char) -> *mut c_char {
        SoapySDR_unloadModule(path)
    }

    unsafe fn loader_result(&self, path: *const c_char) -> Kwargs {
        SoapySDR_getLoaderResult(path)
    }

    unsafe fn module_version(&self, path: *const c_char) -> *mut c_char {
        SoapySDR_getModuleVersion(path)
    }

    unsafe fn free(&self, ptr: *mut c_void) {
        SoapySDR_free(ptr)
    }

    unsafe fn strings_clear(&self, elems: *mut *mut *mut c_char, length: usize) {
        SoapySDRStrings_clear(elems, length)
    }

    unsafe fn kwargs_clear(&self, args: *mut Kwargs) {
        SoapySDRKwargs_clear(args)
    }

    unsafe fn kwargs_list_clear(&self, args: *mut Kwargs, length: usize) {
        SoapySDRKwargsList_clear(args, length)
    }

    unsafe fn arg_info_clear(&self, info: *mut ArgInfoRaw) {
        SoapySDRArgInfo_clear(info)
    }

    unsafe fn arg_info_list_clear(&self, info: *mut ArgInfoRaw, length: usize) {
        SoapySDRArgInfoList_clear(info, length)
    }

    unsafe fn query_string(&self, device: *const NativeDevice, query: StringQuery<'_>) -> *mut c_char {
        match query {
            StringQuery::DriverKey => SoapySDRDevice_getDriverKey(device),
            StringQuery::HardwareKey => SoapySDRDevice_getHardwareKey(device),
            StringQuery::Antenna { direction, channel } => {
                SoapySDRDevice_getAntenna(device, direction.as_raw(), channel)
            }
            StringQuery::Setting { key } => SoapySDRDevice_readSetting(device, key.as_ptr()),
            StringQuery::Sensor { key } => SoapySDRDevice_readSensor(device, key.as_ptr()),
            StringQuery::TimeSource => SoapySDRDevice_getTimeSource(device),
        }
    }

    unsafe fn write_string(&self, device: *mut NativeDevice, target: StringTarget<'_>, value: *const c_char) -> c_int {
        match target {
            StringTarget::Antenna { direction, channel } => {
                SoapySDRDevice_setAntenna(device, direction.as_raw(), channel, value)
            }
            StringTarget::Setting { key } => SoapySDRDevice_writeSetting(device, key.as_ptr(), value),
            StringTarget::TimeSource => SoapySDRDevice_setTimeSource(device, value),
        }
    }

    unsafe fn query_strings(&self, device: *const NativeDevice, query: StringsQuery, length: *mut usize) -> *mut *mut c_char {
        match query {
            StringsQuery::StreamFormats { direction, channel } => {
                SoapySDRDevice_getStreamFormats(device, direction.as_raw(), channel, length)
            }
            StringsQuery::Antennas { direction, channel } => {
                SoapySDRDevice_listAntennas(device, direction.as_raw(), channel, length)
            }
            StringsQuery::Gains { direction, channel } => {
                SoapySDRDevice_listGains(device, direction.as_raw(), channel, length)
            }
            StringsQuery::Frequencies { direction, channel } => {
                SoapySDRDevice_listFrequencies(device, direction.as_raw(), channel, length)
            }
            StringsQuery::ClockSources => SoapySDRDevice_listClockSources(device, length),
            StringsQuery::TimeSources => SoapySDRDevice_listTimeSources(device, length),
            StringsQuery::Sensors => SoapySDRDevice_listSensors(device, length),
        }
    }

    unsafe fn query_kwargs(&self, device: *const NativeDevice, query: KwargsQuery) -> Kwargs {
        match query {
            KwargsQuery::HardwareInfo => SoapySDRDevice_getHardwareInfo(device),
            KwargsQuery::ChannelInfo { direction, channel } => {
                SoapySDRDevice_getChannelInfo(device, direction.as_raw(), channel)
            }
        }
    }

    unsafe fn query_ranges(&self, device: *const NativeDevice, query: RangesQuery<'_>, length: *mut usize) -> *mut RangeRaw {
        match query {
            RangesQuery::Frequency { direction, channel } => {
                SoapySDRDevice_getFrequencyRange(device, direction.as_raw(), channel, length)
            }
            RangesQuery::FrequencyComponent { direction, channel, name } => {
                SoapySDRDevice_getFrequencyRangeComponent(device, direction.as_raw(), channel, name.as_ptr(), length)
            }
            RangesQuery::SampleRate { direction, channel } => {
                SoapySDRDevice_getSampleRateRange(device, direction.as_raw(), channel, length)
            }
            RangesQuery::Bandwidth { direction, channel } => {
                SoapySDRDevice_getBandwidthRange(device, direction.as_raw(), channel, length)
            }
            RangesQuery::MasterClockRates => SoapySDRDevice_getMasterClockRates(device, length),
        }
    }

    unsafe fn query_arg_info(&self, device: *const NativeDevice, query: ArgInfoQuery, length: *mut usize) -> *mut ArgInfoRaw {
        match query {
            ArgInfoQuery::Settings => SoapySDRDevice_getSettingInfo(device, length),
            ArgInfoQuery::ChannelSettings { direction, channel } => {
                SoapySDRDevice_getChannelSettingInfo(device, direction.as_raw(), channel, length)
            }
            ArgInfoQuery::StreamArgs { direction, channel } => {
                SoapySDRDevice_getStreamArgsInfo(device, direction.as_raw(), channel, length)
            }
            ArgInfoQuery::FrequencyArgs { direction, channel } => {
                SoapySDRDevice_getFrequencyArgsInfo(device, direction.as_raw(), channel, length)
            }
        }
    }

    unsafe fn sensor_info(&self, device: *const NativeDevice, key: *const c_char) -> ArgInfoRaw {
        SoapySDRDevice_getSensorInfo(device, key)
    }

    unsafe fn num_channels(&self, device: *const NativeDevice, direction: Direction) -> usize {
        SoapySDRDevice_getNumChannels(device, direction.as_raw())
    }

    unsafe fn full_duplex(&self, device: *const NativeDevice, direction: Direction, channel: usize) -> bool {
        SoapySDRDevice_getFullDuplex(device, direction.as_raw(), channel)
    }

    unsafe fn has_dc_offset_mode(&self, device: *const NativeDevice, direction: Direction, channel: usize) -> bool {
        SoapySDRDevice_hasDCOffsetMode(device, direction.as_raw(), channel)
    }

    unsafe fn gain_range(&self, device: *const NativeDevice, direction: Direction, channel: usize) -> RangeRaw {
        SoapySDRDevice_getGainRange(device, direction.as_raw(), channel)
    }

    unsafe fn native_stream_format(
        &self,
        device: *const NativeDevice,
        direction: Direction,
        channel: usize,
        full_scale: *mut f64,
    ) -> *mut c_char {
        SoapySDRDevice_getNativeStreamFormat(device, direction.as_raw(), channel, full_scale)
    }

    unsafe fn set_control(&self, device: *mut NativeDevice, control: Control, value: f64) -> c_int {
        match control {
            Control::Gain { direction, channel } => SoapySDRDevice_setGain(device, direction.as_raw(), channel, value),
            Control::Frequency { direction, channel } => {
                SoapySDRDevice_setFrequency(device, direction.as_raw(), channel, value, ptr::null())
            }
            Control::SampleRate { direction, channel } => {
                SoapySDRDevice_setSampleRate(device, direction.as_raw(), channel, value)
            }
            Control::Bandwidth { direction, channel } => {
                SoapySDRDevice_setBandwidth(device, direction.as_raw(), channel, value)
            }
            Control::MasterClockRate => SoapySDRDevice_setMasterClockRate(device, value),
        }
    }

    unsafe fn get_control(&self, device: *const NativeDevice, control: Control) -> f64 {
        match control {
            Control::Gain { direction, channel } => SoapySDRDevice_getGain(device, direction.as_raw(), channel),
            Control::Frequency { direction, channel } => SoapySDRDevice_getFrequency(device, direction.as_raw(), channel),
            Control::SampleRate { direction, channel } => {
                SoapySDRDevice_getSampleRate(device, direction.as_raw(), channel)
            }
            Control::Bandwidth { direction, channel } => SoapySDRDevice_getBandwidth(device, direction.as_raw(), channel),
            Control::MasterClockRate => SoapySDRDevice_getMasterClockRate(device),
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
        SoapySDRDevice_setFrequency(device, direction.as_raw(), channel, frequency, args)
    }

    unsafe fn has_hardware_time(&self, device: *const NativeDevice, what: *const c_char) -> bool {
        SoapySDRDevice_hasHardwareTime(device, what)
    }

    unsafe fn get_hardware_time(&self, device: *const NativeDevice, what: *const c_char) -> i64 {
        SoapySDRDevice_getHardwareTime(device, what)
    }

    unsafe fn set_hardware_time(&self, device: *mut NativeDevice, time_ns: i64, what: *const c_char) -> c_int {
        SoapySDRDevice_setHardwareTime(device, time_ns, what)
    }

    unsafe fn setup_stream(
        &self,
        device: *mut NativeDevice,
        direction: Direction,
        format: *const c_char,
        channels: *const usize,
        num_channels: usize,
        args: *const Kwargs,
    ) -> *mut NativeStream {
        SoapySDRDevice_setupStream(device, direction.as_raw(), format, channels, num_channels, args)
    }

    unsafe fn close_stream(&self, device: *mut NativeDevice, stream: *mut NativeStream) -> c_int {
        SoapySDRDevice_closeStream(device, stream)
    }

    unsafe fn stream_mtu(&self, device: *const NativeDevice, stream: *mut NativeStream) -> usize {
        SoapySDRDevice_getStreamMTU(device, stream)
    }

    unsafe fn activate_stream(
        &self,
        device: *mut NativeDevice,
        stream: *mut NativeStream,
        flags: c_int,
        time_ns: i64,
        num_elems: usize,
    ) -> c_int {
        SoapySDRDevice_activateStream(device, stream, flags, time_ns, num_elems)
    }

    unsafe fn deactivate_stream(&self, device: *mut NativeDevice, stream: *mut NativeStream, flags: c_int, time_ns: i64) -> c_int {
        SoapySDRDevice_deactivateStream(device, stream, flags, time_ns)
    }

    unsafe fn read_stream(
        &self,
        device: *mut NativeDevice,
        stream: *mut NativeStream,
        buffs: *const *mut c_void,
        num_elems: usize,
        flags: *mut c_int,
        time_ns: *mut i64,
        timeout_us: i64,
    ) -> c_int {
        SoapySDRDevice_readStream(device, stream, buffs, num_elems, flags, time_ns, timeout(timeout_us))
    }

    unsafe fn write_stream(
        &self,
        device: *mut NativeDevice,
        stream: *mut NativeStream,
        buffs: *const *const c_void,
        num_elems: usize,
        flags: *mut c_int,
        time_ns: i64,
        timeout_us: i64,
    ) -> c_int {
        SoapySDRDevice_writeStream(device, stream, buffs, num_elems, flags, time_ns, timeout(timeout_us))
    }

    unsafe fn read_stream_status(
        &self,
        device: *mut NativeDevice,
        stream: *mut NativeStream,
        chan_mask: *mut usize,
        flags: *mut c_int,
        time_ns: *mut i64,
        timeout_us: i64,
    ) -> c_int {
        SoapySDRDevice_readStreamStatus(device, stream, chan_mask, flags, time_ns, timeout(timeout_us))
    }

    unsafe fn num_direct_access_buffers(&self, device: *mut NativeDevice, stream: *mut NativeStream) -> usize {
        SoapySDRDevice_getNumDirectAccessBuffers(device, stream)
    }
}
