//! Control-plane queries. Everything returned by the native side is copied
//! into host types and released before these methods return.

use std::ffi::CString;
use std::os::raw::c_char;

use super::DeviceHandle;
use crate::codec::arg_info::{take_arg_info, take_arg_info_list};
use crate::codec::args::{take_kwargs, HostArgs};
use crate::codec::range::take_ranges;
use crate::codec::strings::{take_string, take_strings};
use crate::error::{check, Result};
use crate::native::{ArgInfoQuery, Control, KwargsQuery, RangesQuery, StringQuery, StringTarget, StringsQuery};
use crate::types::{ArgInfo, Args, Direction, Range};

impl DeviceHandle {
    /// Surface a failure recorded by the native side during the previous call
    fn last_status(&self) -> Result<()> {
        check(self.api().last_status())
    }

    fn string(&self, query: StringQuery<'_>) -> Result<String> {
        let value = unsafe { take_string(self.api(), self.api().query_string(self.raw(), query)) };
        self.last_status()?;
        Ok(value)
    }

    fn strings(&self, query: StringsQuery) -> Result<Vec<String>> {
        let mut length = 0;
        let list = unsafe {
            let ptr = self.api().query_strings(self.raw(), query, &mut length);
            take_strings(self.api(), ptr, length)
        };
        self.last_status()?;
        Ok(list)
    }

    fn kwargs(&self, query: KwargsQuery) -> Result<Args> {
        let args = unsafe { take_kwargs(self.api(), self.api().query_kwargs(self.raw(), query)) };
        self.last_status()?;
        Ok(args)
    }

    fn ranges(&self, query: RangesQuery<'_>) -> Result<Vec<Range>> {
        let mut length = 0;
        let list = unsafe {
            let ptr = self.api().query_ranges(self.raw(), query, &mut length);
            take_ranges(self.api(), ptr, length)
        };
        self.last_status()?;
        Ok(list)
    }

    fn arg_infos(&self, query: ArgInfoQuery) -> Result<Vec<ArgInfo>> {
        let mut length = 0;
        let list = unsafe {
            let ptr = self.api().query_arg_info(self.raw(), query, &mut length);
            take_arg_info_list(self.api(), ptr, length)
        };
        self.last_status()?;
        Ok(list)
    }

    fn set(&self, control: Control, value: f64) -> Result<()> {
        check(unsafe { self.api().set_control(self.raw(), control, value) })
    }

    fn get(&self, control: Control) -> Result<f64> {
        let value = unsafe { self.api().get_control(self.raw(), control) };
        self.last_status()?;
        Ok(value)
    }

    fn write(&self, target: StringTarget<'_>, value: &str) -> Result<()> {
        let value = CString::new(value)?;
        check(unsafe { self.api().write_string(self.raw(), target, value.as_ptr()) })
    }

    // Identification

    pub fn driver_key(&self) -> Result<String> {
        self.string(StringQuery::DriverKey)
    }

    pub fn hardware_key(&self) -> Result<String> {
        self.string(StringQuery::HardwareKey)
    }

    pub fn hardware_info(&self) -> Result<Args> {
        self.kwargs(KwargsQuery::HardwareInfo)
    }

    // Channels

    pub fn num_channels(&self, direction: Direction) -> usize {
        unsafe { self.api().num_channels(self.raw(), direction) }
    }

    pub fn channel_info(&self, direction: Direction, channel: usize) -> Result<Args> {
        self.kwargs(KwargsQuery::ChannelInfo { direction, channel })
    }

    pub fn full_duplex(&self, direction: Direction, channel: usize) -> bool {
        unsafe { self.api().full_duplex(self.raw(), direction, channel) }
    }

    // Stream metadata

    pub fn stream_formats(&self, direction: Direction, channel: usize) -> Result<Vec<String>> {
        self.strings(StringsQuery::StreamFormats { direction, channel })
    }

    /// The format the hardware produces without conversion, and its full-scale value
    pub fn native_stream_format(&self, direction: Direction, channel: usize) -> Result<(String, f64)> {
        let mut full_scale = 0.0;
        let format = unsafe {
            let ptr: *mut c_char = self
                .api()
                .native_stream_format(self.raw(), direction, channel, &mut full_scale);
            take_string(self.api(), ptr)
        };
        self.last_status()?;
        Ok((format, full_scale))
    }

    pub fn stream_args_info(&self, direction: Direction, channel: usize) -> Result<Vec<ArgInfo>> {
        self.arg_infos(ArgInfoQuery::StreamArgs { direction, channel })
    }

    // Antennas

    pub fn list_antennas(&self, direction: Direction, channel: usize) -> Result<Vec<String>> {
        self.strings(StringsQuery::Antennas { direction, channel })
    }

    pub fn set_antenna(&self, direction: Direction, channel: usize, name: &str) -> Result<()> {
        self.write(StringTarget::Antenna { direction, channel }, name)
    }

    pub fn antenna(&self, direction: Direction, channel: usize) -> Result<String> {
        self.string(StringQuery::Antenna { direction, channel })
    }

    // Frontend corrections

    /// Capability probe; `false` means automatic DC offset correction is absent
    pub fn has_dc_offset_mode(&self, direction: Direction, channel: usize) -> bool {
        unsafe { self.api().has_dc_offset_mode(self.raw(), direction, channel) }
    }

    // Gain

    pub fn list_gains(&self, direction: Direction, channel: usize) -> Result<Vec<String>> {
        self.strings(StringsQuery::Gains { direction, channel })
    }

    /// Set the overall gain, distributed over the gain elements by the driver
    pub fn set_gain(&self, direction: Direction, channel: usize, value: f64) -> Result<()> {
        self.set(Control::Gain { direction, channel }, value)
    }

    pub fn gain(&self, direction: Direction, channel: usize) -> Result<f64> {
        self.get(Control::Gain { direction, channel })
    }

    pub fn gain_range(&self, direction: Direction, channel: usize) -> Result<Range> {
        let range = unsafe { self.api().gain_range(self.raw(), direction, channel) };
        self.last_status()?;
        Ok(range.into())
    }

    // Frequency

    /// Tune the overall center frequency; `args` carries optional tuning hints
    pub fn set_frequency(
        &self,
        direction: Direction,
        channel: usize,
        frequency: f64,
        args: Option<&Args>,
    ) -> Result<()> {
        let args = HostArgs::encode(args)?;
        check(unsafe {
            self.api()
                .set_frequency(self.raw(), direction, channel, frequency, args.as_ptr())
        })
    }

    pub fn frequency(&self, direction: Direction, channel: usize) -> Result<f64> {
        self.get(Control::Frequency { direction, channel })
    }

    /// Names of the tunable elements in the chain, e.g. `RF`, `BB`
    pub fn list_frequencies(&self, direction: Direction, channel: usize) -> Result<Vec<String>> {
        self.strings(StringsQuery::Frequencies { direction, channel })
    }

    pub fn frequency_range(&self, direction: Direction, channel: usize) -> Result<Vec<Range>> {
        self.ranges(RangesQuery::Frequency { direction, channel })
    }

    pub fn frequency_component_range(&self, direction: Direction, channel: usize, name: &str) -> Result<Vec<Range>> {
        let name = CString::new(name)?;
        self.ranges(RangesQuery::FrequencyComponent {
            direction,
            channel,
            name: &name,
        })
    }

    pub fn frequency_args_info(&self, direction: Direction, channel: usize) -> Result<Vec<ArgInfo>> {
        self.arg_infos(ArgInfoQuery::FrequencyArgs { direction, channel })
    }

    // Sample rate

    pub fn set_sample_rate(&self, direction: Direction, channel: usize, rate: f64) -> Result<()> {
        self.set(Control::SampleRate { direction, channel }, rate)
    }

    pub fn sample_rate(&self, direction: Direction, channel: usize) -> Result<f64> {
        self.get(Control::SampleRate { direction, channel })
    }

    pub fn sample_rate_range(&self, direction: Direction, channel: usize) -> Result<Vec<Range>> {
        self.ranges(RangesQuery::SampleRate { direction, channel })
    }

    // Bandwidth

    pub fn set_bandwidth(&self, direction: Direction, channel: usize, bandwidth: f64) -> Result<()> {
        self.set(Control::Bandwidth { direction, channel }, bandwidth)
    }

    pub fn bandwidth(&self, direction: Direction, channel: usize) -> Result<f64> {
        self.get(Control::Bandwidth { direction, channel })
    }

    pub fn bandwidth_range(&self, direction: Direction, channel: usize) -> Result<Vec<Range>> {
        self.ranges(RangesQuery::Bandwidth { direction, channel })
    }

    // Clocking

    pub fn set_master_clock_rate(&self, rate: f64) -> Result<()> {
        self.set(Control::MasterClockRate, rate)
    }

    pub fn master_clock_rate(&self) -> Result<f64> {
        self.get(Control::MasterClockRate)
    }

    pub fn master_clock_rates(&self) -> Result<Vec<Range>> {
        self.ranges(RangesQuery::MasterClockRates)
    }

    pub fn list_clock_sources(&self) -> Result<Vec<String>> {
        self.strings(StringsQuery::ClockSources)
    }

    pub fn list_time_sources(&self) -> Result<Vec<String>> {
        self.strings(StringsQuery::TimeSources)
    }

    pub fn set_time_source(&self, source: &str) -> Result<()> {
        self.write(StringTarget::TimeSource, source)
    }

    pub fn time_source(&self) -> Result<String> {
        self.string(StringQuery::TimeSource)
    }

    // Hardware time. An empty `what` names the default clock.

    pub fn has_hardware_time(&self, what: &str) -> Result<bool> {
        let what = CString::new(what)?;
        Ok(unsafe { self.api().has_hardware_time(self.raw(), what.as_ptr()) })
    }

    /// Current hardware time in nanoseconds
    pub fn hardware_time(&self, what: &str) -> Result<i64> {
        let what = CString::new(what)?;
        let time_ns = unsafe { self.api().get_hardware_time(self.raw(), what.as_ptr()) };
        self.last_status()?;
        Ok(time_ns)
    }

    pub fn set_hardware_time(&self, time_ns: i64, what: &str) -> Result<()> {
        let what = CString::new(what)?;
        check(unsafe { self.api().set_hardware_time(self.raw(), time_ns, what.as_ptr()) })
    }

    // Sensors

    pub fn list_sensors(&self) -> Result<Vec<String>> {
        self.strings(StringsQuery::Sensors)
    }

    pub fn sensor_info(&self, key: &str) -> Result<ArgInfo> {
        let key = CString::new(key)?;
        let info = unsafe { take_arg_info(self.api(), self.api().sensor_info(self.raw(), key.as_ptr())) };
        self.last_status()?;
        Ok(info)
    }

    pub fn read_sensor(&self, key: &str) -> Result<String> {
        let key = CString::new(key)?;
        self.string(StringQuery::Sensor { key: &key })
    }

    // Settings

    pub fn setting_info(&self) -> Result<Vec<ArgInfo>> {
        self.arg_infos(ArgInfoQuery::Settings)
    }

    pub fn channel_setting_info(&self, direction: Direction, channel: usize) -> Result<Vec<ArgInfo>> {
        self.arg_infos(ArgInfoQuery::ChannelSettings { direction, channel })
    }

    pub fn write_setting(&self, key: &str, value: &str) -> Result<()> {
        let key = CString::new(key)?;
        self.write(StringTarget::Setting { key: &key }, value)
    }

    pub fn read_setting(&self, key: &str) -> Result<String> {
        let key = CString::new(key)?;
        self.string(StringQuery::Setting { key: &key })
    }
}
