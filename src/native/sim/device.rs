use std::collections::HashMap;
use std::sync::Mutex;

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::stream::{SimPacket, SimStatus, StreamFeeds, TxRecord};
use crate::stream::StreamFormat;
use crate::types::{ArgInfo, ArgType, Args, Direction, Range};

/// Description of one simulated device in the library catalog
#[derive(Debug, Clone)]
pub struct SimDeviceSpec {
    /// Identity reported by enumerate and matched against make filters
    pub args: Args,
    /// When set, make finds the device but fails with this message
    pub fail_make: Option<String>,
    pub hardware_key: String,
    pub hardware_info: Args,
    pub rx_channels: usize,
    pub tx_channels: usize,
    pub formats: Vec<StreamFormat>,
    pub native_format: StreamFormat,
    pub full_scale: f64,
    pub antennas: Vec<String>,
    pub gains: Vec<String>,
    pub gain_range: Range,
    pub frequency_range: Vec<Range>,
    pub sample_rate_range: Vec<Range>,
    pub bandwidth_range: Vec<Range>,
    pub master_clock_rates: Vec<Range>,
    pub clock_sources: Vec<String>,
    pub time_sources: Vec<String>,
    pub settings: Vec<ArgInfo>,
    pub stream_args: Vec<ArgInfo>,
    pub frequency_args: Vec<ArgInfo>,
    pub sensors: Vec<(ArgInfo, String)>,
    pub dc_offset_mode: bool,
    pub mtu: usize,
    /// Drivers without stream status report NotSupported from read_status
    pub status_supported: bool,
    feeds: Feeds,
}

#[derive(Debug, Clone)]
struct Feeds {
    rx: (Sender<SimPacket>, Receiver<SimPacket>),
    tx: (Sender<TxRecord>, Receiver<TxRecord>),
    status: (Sender<SimStatus>, Receiver<SimStatus>),
}

fn arg(key: &str, name: &str, arg_type: ArgType, value: &str) -> ArgInfo {
    ArgInfo {
        key: key.to_string(),
        value: value.to_string(),
        name: name.to_string(),
        description: String::new(),
        units: String::new(),
        arg_type,
        range: None,
        options: Vec::new(),
    }
}

impl SimDeviceSpec {
    /// A two-channel receiver with one transmit channel, identified by `serial`
    pub fn new(serial: &str) -> Self {
        let label = format!("Simulated SDR :: {}", serial);
        let args: Args = [("driver", "sim"), ("label", label.as_str()), ("serial", serial)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let mut gain = arg("agc_mode", "AGC Mode", ArgType::Bool, "false");
        gain.description = "Automatic gain control".to_string();

        let mut buffers = arg("buffers", "Buffer Count", ArgType::Int, "15");
        buffers.range = Some(Range::new(1.0, 64.0, 1.0));

        let mut offset = arg("OFFSET", "LO Offset", ArgType::Float, "0");
        offset.units = "Hz".to_string();
        offset.range = Some(Range::new(-1e6, 1e6, 0.0));

        let mut temperature = arg("temperature", "Board Temperature", ArgType::Float, "0");
        temperature.units = "C".to_string();

        Self {
            args,
            fail_make: None,
            hardware_key: "SIM-1".to_string(),
            hardware_info: [("origin", "sdrbridge"), ("revision", "1")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            rx_channels: 2,
            tx_channels: 1,
            formats: vec![StreamFormat::CS8, StreamFormat::CS16, StreamFormat::CF32],
            native_format: StreamFormat::CS8,
            full_scale: 128.0,
            antennas: vec!["RX".to_string(), "TX/RX".to_string()],
            gains: vec!["LNA".to_string(), "VGA".to_string()],
            gain_range: Range::new(0.0, 49.6, 0.0),
            frequency_range: vec![Range::new(24e6, 1.766e9, 0.0)],
            sample_rate_range: vec![Range::new(225_001.0, 300_000.0, 0.0), Range::new(900_001.0, 3.2e6, 0.0)],
            bandwidth_range: vec![Range::new(0.0, 8e6, 0.0)],
            master_clock_rates: vec![Range::new(28.8e6, 28.8e6, 0.0)],
            clock_sources: vec!["internal".to_string()],
            time_sources: vec!["sw_ticks".to_string()],
            settings: vec![gain, buffers],
            stream_args: Vec::new(),
            frequency_args: vec![offset],
            sensors: vec![(temperature, "38.5".to_string())],
            dc_offset_mode: false,
            mtu: 131_072,
            status_supported: true,
            feeds: Feeds {
                rx: unbounded(),
                tx: unbounded(),
                status: unbounded(),
            },
        }
    }

    /// Make finds this device but fails with `message`
    pub fn failing(mut self, message: &str) -> Self {
        self.fail_make = Some(message.to_string());
        self
    }

    pub fn with_hardware_key(mut self, key: &str) -> Self {
        self.hardware_key = key.to_string();
        self
    }

    pub fn with_channels(mut self, rx: usize, tx: usize) -> Self {
        self.rx_channels = rx;
        self.tx_channels = tx;
        self
    }

    pub fn with_mtu(mut self, mtu: usize) -> Self {
        self.mtu = mtu;
        self
    }

    pub fn without_status(mut self) -> Self {
        self.status_supported = false;
        self
    }

    pub fn with_stream_arg(mut self, info: ArgInfo) -> Self {
        self.stream_args.push(info);
        self
    }

    /// Sender for packets that RX streams of this device will read
    pub fn rx_feed(&self) -> Sender<SimPacket> {
        self.feeds.rx.0.clone()
    }

    /// Receiver of everything TX streams of this device wrote
    pub fn tx_log(&self) -> Receiver<TxRecord> {
        self.feeds.tx.1.clone()
    }

    /// Sender for events that `read_stream_status` will report
    pub fn status_feed(&self) -> Sender<SimStatus> {
        self.feeds.status.0.clone()
    }

    pub(crate) fn stream_feeds(&self) -> StreamFeeds {
        StreamFeeds {
            rx: self.feeds.rx.1.clone(),
            tx: self.feeds.tx.0.clone(),
            status: self.feeds.status.1.clone(),
            status_echo: self.feeds.status.0.clone(),
        }
    }

    /// Every filter entry must be present with the same value
    pub fn matches(&self, filter: &Args) -> bool {
        filter.iter().all(|(k, v)| self.args.get(k) == Some(v))
    }

    pub fn num_channels(&self, direction: Direction) -> usize {
        match direction {
            Direction::Rx => self.rx_channels,
            Direction::Tx => self.tx_channels,
        }
    }

    /// An empty name selects the default device clock
    pub fn has_clock(&self, what: &str) -> bool {
        what.is_empty() || self.time_sources.iter().any(|source| source == what)
    }
}

/// Mutable per-device tuning state
#[derive(Debug, Default)]
pub(crate) struct Tuning {
    pub controls: HashMap<(&'static str, Direction, usize), f64>,
    pub antennas: HashMap<(Direction, usize), String>,
    pub settings: HashMap<String, String>,
    pub master_clock_rate: f64,
    pub time_source: String,
    /// Last time written per clock name, in nanoseconds
    pub hardware_time: HashMap<String, i64>,
}

/// A made device; lives in a `Box` whose address is the native device pointer
pub(crate) struct SimDevice {
    pub spec: SimDeviceSpec,
    pub tuning: Mutex<Tuning>,
}

impl SimDevice {
    pub fn new(spec: SimDeviceSpec) -> Self {
        let mut tuning = Tuning {
            master_clock_rate: spec.master_clock_rates.first().map_or(0.0, |r| r.minimum),
            time_source: spec.time_sources.first().cloned().unwrap_or_default(),
            ..Tuning::default()
        };
        for info in &spec.settings {
            tuning.settings.insert(info.key.clone(), info.value.clone());
        }
        Self {
            spec,
            tuning: Mutex::new(tuning),
        }
    }

    pub fn tuning(&self) -> std::sync::MutexGuard<'_, Tuning> {
        self.tuning.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn has_channel(&self, direction: Direction, channel: usize) -> bool {
        channel < self.spec.num_channels(direction)
    }
}
