use std::sync::Arc;

use sdrbridge::native::{SimDeviceSpec, SimulatedLibrary};
use sdrbridge::{Api, ArgInfo, ArgOption, ArgType, Args, DeviceHandle, Direction, ErrorKind, Range, SdrError};

fn open() -> (Arc<SimulatedLibrary>, DeviceHandle) {
    let lib = Arc::new(SimulatedLibrary::new().with_device(SimDeviceSpec::new("0001")));
    let api: Api = lib.clone();
    let device = DeviceHandle::make_str(&api, "driver=sim, serial=0001").unwrap();
    (lib, device)
}

#[test]
fn test_identification() {
    let (lib, device) = open();

    assert_eq!(device.driver_key().unwrap(), "sim");
    assert_eq!(device.hardware_key().unwrap(), "SIM-1");
    assert_eq!(device.hardware_info().unwrap()["origin"], "sdrbridge");
    assert_eq!(device.num_channels(Direction::Rx), 2);
    assert_eq!(device.num_channels(Direction::Tx), 1);
    assert!(device.full_duplex(Direction::Rx, 0));
    assert_eq!(device.channel_info(Direction::Tx, 0).unwrap()["name"], "TX0");

    device.unmake().unwrap();
    assert_eq!(lib.heap().live_blocks(), 0);
}

#[test]
fn test_stream_metadata() {
    let (lib, device) = open();

    assert_eq!(device.stream_formats(Direction::Rx, 1).unwrap(), vec!["CS8", "CS16", "CF32"]);
    assert_eq!(device.native_stream_format(Direction::Rx, 0).unwrap(), ("CS8".to_string(), 128.0));
    assert!(device.stream_args_info(Direction::Rx, 0).unwrap().is_empty());

    drop(device);
    assert_eq!(lib.heap().live_blocks(), 0);
}

#[test]
fn test_stream_args_info_from_driver() {
    let buffers = ArgInfo {
        key: "bufflen".to_string(),
        value: "16384".to_string(),
        name: "Buffer Length".to_string(),
        description: "Samples per transfer buffer".to_string(),
        units: "samples".to_string(),
        arg_type: ArgType::Int,
        range: Some(Range::new(512.0, 65536.0, 512.0)),
        options: Vec::new(),
    };
    let mode = ArgInfo {
        key: "mode".to_string(),
        value: "fast".to_string(),
        name: String::new(),
        description: String::new(),
        units: String::new(),
        arg_type: ArgType::String,
        range: None,
        options: vec![
            ArgOption { value: "fast".to_string(), name: "Low latency".to_string() },
            ArgOption { value: "safe".to_string(), name: "Large buffers".to_string() },
        ],
    };
    let spec = SimDeviceSpec::new("0009")
        .with_stream_arg(buffers.clone())
        .with_stream_arg(mode.clone());
    let lib = Arc::new(SimulatedLibrary::new().with_device(spec));
    let api: Api = lib.clone();
    let device = DeviceHandle::make_str(&api, "serial=0009").unwrap();

    let info = device.stream_args_info(Direction::Rx, 1).unwrap();
    assert_eq!(info, vec![buffers, mode]);
    assert_eq!(info[1].display_name(), "mode");
    assert!(device.stream_args_info(Direction::Rx, 2).unwrap_err().is_not_supported());

    drop(device);
    assert_eq!(lib.heap().live_blocks(), 0);
    assert_eq!(lib.heap().invalid_frees(), 0);
}

#[test]
fn test_time_source_and_hardware_time() {
    let (lib, device) = open();

    assert_eq!(device.time_source().unwrap(), "sw_ticks");
    device.set_time_source("sw_ticks").unwrap();
    let err = device.set_time_source("gpsdo").unwrap_err();
    assert!(err.is_not_supported());
    assert!(device.last_error().contains("gpsdo"));
    assert_eq!(device.time_source().unwrap(), "sw_ticks");

    assert!(device.has_hardware_time("").unwrap());
    assert!(device.has_hardware_time("sw_ticks").unwrap());
    assert!(!device.has_hardware_time("pps").unwrap());

    assert_eq!(device.hardware_time("").unwrap(), 0);
    device.set_hardware_time(1_500_000_000, "").unwrap();
    assert_eq!(device.hardware_time("").unwrap(), 1_500_000_000);
    // Named clocks keep their own time
    assert_eq!(device.hardware_time("sw_ticks").unwrap(), 0);

    assert!(device.set_hardware_time(7, "pps").unwrap_err().is_not_supported());
    assert!(device.hardware_time("pps").unwrap_err().is_not_supported());
    assert!(matches!(device.has_hardware_time("a\0b"), Err(SdrError::NulByte(_))));

    drop(device);
    assert_eq!(lib.heap().live_blocks(), 0);
}

#[test]
fn test_antenna_and_gain() {
    let (_lib, device) = open();

    assert_eq!(device.list_antennas(Direction::Rx, 0).unwrap(), vec!["RX", "TX/RX"]);
    assert_eq!(device.antenna(Direction::Rx, 0).unwrap(), "RX");
    device.set_antenna(Direction::Rx, 0, "TX/RX").unwrap();
    assert_eq!(device.antenna(Direction::Rx, 0).unwrap(), "TX/RX");
    assert_eq!(
        device.set_antenna(Direction::Rx, 0, "LNAW").unwrap_err().kind(),
        Some(ErrorKind::NotSupported)
    );

    assert_eq!(device.list_gains(Direction::Rx, 0).unwrap(), vec!["LNA", "VGA"]);
    device.set_gain(Direction::Rx, 1, 32.5).unwrap();
    assert_eq!(device.gain(Direction::Rx, 1).unwrap(), 32.5);
    assert_eq!(device.gain(Direction::Rx, 0).unwrap(), 0.0);
    assert_eq!(device.gain_range(Direction::Rx, 0).unwrap(), Range::new(0.0, 49.6, 0.0));
}

#[test]
fn test_frequency_with_tuning_args() {
    let (_lib, device) = open();

    device.set_frequency(Direction::Rx, 0, 433.92e6, None).unwrap();
    assert_eq!(device.frequency(Direction::Rx, 0).unwrap(), 433.92e6);

    let mut args = Args::new();
    args.insert("OFFSET".to_string(), "250000".to_string());
    device.set_frequency(Direction::Rx, 0, 100e6, Some(&args)).unwrap();
    assert_eq!(device.frequency(Direction::Rx, 0).unwrap(), 100.25e6);

    assert_eq!(device.list_frequencies(Direction::Rx, 0).unwrap(), vec!["RF"]);
    assert_eq!(device.frequency_range(Direction::Rx, 0).unwrap(), vec![Range::new(24e6, 1.766e9, 0.0)]);
    assert_eq!(device.frequency_component_range(Direction::Rx, 0, "RF").unwrap().len(), 1);
    assert!(device.frequency_component_range(Direction::Rx, 0, "BB").unwrap_err().is_not_supported());

    let info = device.frequency_args_info(Direction::Rx, 0).unwrap();
    assert_eq!(info.len(), 1);
    assert_eq!(info[0].key, "OFFSET");
    assert_eq!(info[0].units, "Hz");
    assert_eq!(info[0].range, Some(Range::new(-1e6, 1e6, 0.0)));
}

#[test]
fn test_rates_and_clocking() {
    let (_lib, device) = open();

    device.set_sample_rate(Direction::Rx, 0, 2.4e6).unwrap();
    assert_eq!(device.sample_rate(Direction::Rx, 0).unwrap(), 2.4e6);
    assert_eq!(device.sample_rate_range(Direction::Rx, 0).unwrap().len(), 2);

    device.set_bandwidth(Direction::Tx, 0, 1.5e6).unwrap();
    assert_eq!(device.bandwidth(Direction::Tx, 0).unwrap(), 1.5e6);
    assert_eq!(device.bandwidth_range(Direction::Tx, 0).unwrap(), vec![Range::new(0.0, 8e6, 0.0)]);

    assert_eq!(device.master_clock_rate().unwrap(), 28.8e6);
    device.set_master_clock_rate(30.72e6).unwrap();
    assert_eq!(device.master_clock_rate().unwrap(), 30.72e6);
    assert_eq!(device.master_clock_rates().unwrap().len(), 1);
    assert_eq!(device.list_clock_sources().unwrap(), vec!["internal"]);
    assert_eq!(device.list_time_sources().unwrap(), vec!["sw_ticks"]);
}

#[test]
fn test_sensors_and_settings() {
    let (lib, device) = open();

    assert_eq!(device.list_sensors().unwrap(), vec!["temperature"]);
    let sensor = device.sensor_info("temperature").unwrap();
    assert_eq!(sensor.arg_type, ArgType::Float);
    assert_eq!(sensor.units, "C");
    assert_eq!(device.read_sensor("temperature").unwrap(), "38.5");
    assert!(device.read_sensor("humidity").unwrap_err().is_not_supported());

    let settings = device.setting_info().unwrap();
    let keys: Vec<&str> = settings.iter().map(|s| s.key.as_str()).collect();
    assert_eq!(keys, vec!["agc_mode", "buffers"]);
    assert_eq!(settings[1].range, Some(Range::new(1.0, 64.0, 1.0)));
    assert!(device.channel_setting_info(Direction::Rx, 0).unwrap().is_empty());

    assert_eq!(device.read_setting("agc_mode").unwrap(), "false");
    device.write_setting("agc_mode", "true").unwrap();
    assert_eq!(device.read_setting("agc_mode").unwrap(), "true");
    assert!(device.write_setting("unknown", "1").unwrap_err().is_not_supported());

    drop(device);
    assert_eq!(lib.heap().live_blocks(), 0);
    assert_eq!(lib.heap().invalid_frees(), 0);
}

#[test]
fn test_invalid_channel_is_not_supported() {
    let (_lib, device) = open();

    let err = device.set_gain(Direction::Tx, 4, 1.0).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NotSupported));
    assert!(device.last_error().contains("channel 4"));

    assert!(device.list_antennas(Direction::Tx, 4).unwrap_err().is_not_supported());
    assert!(device.gain_range(Direction::Tx, 4).is_err());
}
