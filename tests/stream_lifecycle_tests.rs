use std::sync::Arc;

use crossbeam_channel::Sender;
use sdrbridge::native::{SimDeviceSpec, SimPacket, SimStatus, SimulatedLibrary};
use sdrbridge::{Api, DeviceHandle, Direction, ErrorKind, SdrError, StreamFlags, StreamFormat, StreamState};

const TIMEOUT_US: i64 = 100_000;

fn sim_with(spec: SimDeviceSpec) -> (Arc<SimulatedLibrary>, Api, Sender<SimPacket>) {
    let feed = spec.rx_feed();
    let lib = Arc::new(SimulatedLibrary::new().with_device(spec));
    let api: Api = lib.clone();
    (lib, api, feed)
}

fn sim() -> (Arc<SimulatedLibrary>, Api, Sender<SimPacket>) {
    sim_with(SimDeviceSpec::new("0001"))
}

fn open(api: &Api) -> DeviceHandle {
    DeviceHandle::make_str(api, "driver=sim").unwrap()
}

#[test]
fn test_io_before_activate_is_invalid_state() {
    let (_lib, api, _feed) = sim();
    let device = open(&api);
    let mut stream = device.setup_stream(Direction::Rx, StreamFormat::CS16, &[0], None).unwrap();
    assert_eq!(stream.state(), StreamState::Created);

    let mut buf = vec![[0i16; 2]; 64];
    let err = stream.read(&mut [buf.as_mut_slice()], 64, TIMEOUT_US).unwrap_err();
    assert!(matches!(err, SdrError::InvalidState { state: StreamState::Created, .. }));

    let err = stream.read_status(TIMEOUT_US).unwrap_err();
    assert!(matches!(err, SdrError::InvalidState { .. }));

    // Deactivate requires an active stream
    assert!(stream.deactivate(StreamFlags::NONE, 0).is_err());
}

#[test]
fn test_io_after_close_is_invalid_state() {
    let (_lib, api, _feed) = sim();
    let device = open(&api);
    let mut stream = device.setup_stream(Direction::Tx, StreamFormat::CF32, &[0], None).unwrap();
    stream.activate(StreamFlags::NONE, 0, 0).unwrap();
    stream.close().unwrap();

    let buf = vec![[0f32; 2]; 16];
    let err = stream
        .write(&[buf.as_slice()], 16, StreamFlags::NONE, 0, TIMEOUT_US)
        .unwrap_err();
    assert!(matches!(err, SdrError::InvalidState { state: StreamState::Closed, .. }));
    assert!(stream.activate(StreamFlags::NONE, 0, 0).is_err());
    assert!(stream.mtu().is_err());
}

#[test]
fn test_write_before_activate_is_invalid_state() {
    let spec = SimDeviceSpec::new("0001");
    let tx_log = spec.tx_log();
    let (_lib, api, _feed) = sim_with(spec);
    let device = open(&api);
    let mut stream = device.setup_stream(Direction::Tx, StreamFormat::CS16, &[0], None).unwrap();

    let buf = vec![[0i16; 2]; 16];
    let err = stream
        .write(&[buf.as_slice()], 16, StreamFlags::NONE, 0, TIMEOUT_US)
        .unwrap_err();
    assert!(matches!(err, SdrError::InvalidState { operation: "write", state: StreamState::Created }));
    assert!(tx_log.try_recv().is_err());
}

#[test]
fn test_io_while_deactivated_is_invalid_state() {
    let (_lib, api, feed) = sim();
    let device = open(&api);
    let mut rx = device.setup_stream(Direction::Rx, StreamFormat::CS8, &[0], None).unwrap();
    let mut tx = device.setup_stream(Direction::Tx, StreamFormat::CS8, &[0], None).unwrap();
    for stream in [&mut rx, &mut tx] {
        stream.activate(StreamFlags::NONE, 0, 0).unwrap();
        stream.deactivate(StreamFlags::NONE, 0).unwrap();
        assert_eq!(stream.state(), StreamState::Deactivated);
    }

    // Queued data is not consumed by a rejected read
    feed.send(SimPacket::elements(8)).unwrap();
    let mut buf = vec![[0i8; 2]; 8];
    let err = rx.read(&mut [buf.as_mut_slice()], 8, TIMEOUT_US).unwrap_err();
    assert!(matches!(err, SdrError::InvalidState { state: StreamState::Deactivated, .. }));

    let err = tx
        .write(&[buf.as_slice()], 8, StreamFlags::NONE, 0, TIMEOUT_US)
        .unwrap_err();
    assert!(matches!(err, SdrError::InvalidState { state: StreamState::Deactivated, .. }));
    assert!(matches!(
        tx.read_status(TIMEOUT_US).unwrap_err(),
        SdrError::InvalidState { state: StreamState::Deactivated, .. }
    ));

    // Reactivation picks the queued packet up
    rx.activate(StreamFlags::NONE, 0, 0).unwrap();
    assert_eq!(rx.read(&mut [buf.as_mut_slice()], 8, TIMEOUT_US).unwrap().num_elems, 8);
}

#[test]
fn test_read_after_close_is_invalid_state() {
    let (lib, api, feed) = sim();
    let device = open(&api);
    let mut stream = device.setup_stream(Direction::Rx, StreamFormat::CS8, &[0], None).unwrap();
    stream.activate(StreamFlags::NONE, 0, 0).unwrap();
    stream.close().unwrap();

    feed.send(SimPacket::elements(8)).unwrap();
    let mut buf = vec![[0i8; 2]; 8];
    let err = stream.read(&mut [buf.as_mut_slice()], 8, TIMEOUT_US).unwrap_err();
    assert!(matches!(err, SdrError::InvalidState { operation: "read", state: StreamState::Closed }));
    assert!(matches!(
        stream.read_status(TIMEOUT_US).unwrap_err(),
        SdrError::InvalidState { state: StreamState::Closed, .. }
    ));
    assert!(stream.deactivate(StreamFlags::NONE, 0).is_err());
    assert_eq!(lib.stream_closes(), 1);
    assert_eq!(lib.invalid_releases(), 0);
}

#[test]
fn test_legal_sequence_and_double_close() {
    let (lib, api, _feed) = sim();
    let device = open(&api);

    {
        let mut stream = device.setup_stream(Direction::Rx, StreamFormat::CS8, &[0, 1], None).unwrap();
        stream.activate(StreamFlags::NONE, 0, 0).unwrap();
        stream.deactivate(StreamFlags::NONE, 0).unwrap();
        stream.activate(StreamFlags::NONE, 0, 0).unwrap();
        assert_eq!(stream.state(), StreamState::Active);

        stream.close().unwrap();
        stream.close().unwrap();
        assert_eq!(stream.state(), StreamState::Closed);
    }

    assert_eq!(lib.stream_closes(), 1);
    assert_eq!(lib.invalid_releases(), 0);
    assert_eq!(lib.open_streams(), 0);

    device.unmake().unwrap();
    assert_eq!(lib.open_devices(), 0);
}

#[test]
fn test_dropped_stream_is_closed() {
    let (lib, api, _feed) = sim();
    let device = open(&api);

    let mut stream = device.setup_stream(Direction::Rx, StreamFormat::CS8, &[0], None).unwrap();
    stream.activate(StreamFlags::NONE, 0, 0).unwrap();
    drop(stream);

    assert_eq!(lib.stream_closes(), 1);
    assert_eq!(lib.open_streams(), 0);
}

#[test]
fn test_short_read_reports_delivered_count() {
    let (_lib, api, feed) = sim();
    let device = open(&api);
    let mut stream = device.setup_stream(Direction::Rx, StreamFormat::CS8, &[0], None).unwrap();
    stream.activate(StreamFlags::NONE, 0, 0).unwrap();

    feed.send(SimPacket::elements(480).with_fill(0x7f)).unwrap();

    let mut buf = vec![[0i8; 2]; 511];
    let outcome = stream.read(&mut [buf.as_mut_slice()], 511, TIMEOUT_US).unwrap();

    assert_eq!(outcome.num_elems, 480);
    assert!(!outcome.flags.contains(StreamFlags::MORE_FRAGMENTS));
    assert_eq!(outcome.time_ns, None);
    assert_eq!(buf[479], [0x7f, 0x7f]);
    assert_eq!(buf[480], [0, 0]);
}

#[test]
fn test_read_fills_every_channel() {
    let (_lib, api, feed) = sim();
    let device = open(&api);
    let mut stream = device.setup_stream(Direction::Rx, StreamFormat::CS16, &[0, 1], None).unwrap();
    stream.activate(StreamFlags::NONE, 0, 0).unwrap();

    feed.send(SimPacket::elements(32).with_fill(1).with_time(5_000)).unwrap();

    let mut a = vec![[0i16; 2]; 32];
    let mut b = vec![[0i16; 2]; 32];
    let outcome = stream
        .read(&mut [a.as_mut_slice(), b.as_mut_slice()], 32, TIMEOUT_US)
        .unwrap();

    assert_eq!(outcome.num_elems, 32);
    assert_eq!(outcome.time_ns, Some(5_000));
    assert_eq!(a, b);
    assert_eq!(a[0], [0x0101, 0x0101]);
}

#[test]
fn test_read_timeout_is_recoverable() {
    let (_lib, api, _feed) = sim();
    let device = open(&api);
    let mut stream = device.setup_stream(Direction::Rx, StreamFormat::CS8, &[0], None).unwrap();
    stream.activate(StreamFlags::NONE, 0, 0).unwrap();

    let mut buf = vec![[0i8; 2]; 16];
    let err = stream.read(&mut [buf.as_mut_slice()], 16, 1_000).unwrap_err();

    assert_eq!(err.kind(), Some(ErrorKind::Timeout));
    assert!(err.is_recoverable());
}

#[test]
fn test_negative_status_discards_count() {
    let (_lib, api, feed) = sim();
    let device = open(&api);
    let mut stream = device.setup_stream(Direction::Rx, StreamFormat::CS8, &[0], None).unwrap();
    stream.activate(StreamFlags::NONE, 0, 0).unwrap();

    feed.send(SimPacket::error(ErrorKind::Overflow.code())).unwrap();
    feed.send(SimPacket::elements(8)).unwrap();

    let mut buf = vec![[0i8; 2]; 16];
    let err = stream.read(&mut [buf.as_mut_slice()], 16, TIMEOUT_US).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Overflow));

    // The stream keeps going after an overflow
    let outcome = stream.read(&mut [buf.as_mut_slice()], 16, TIMEOUT_US).unwrap();
    assert_eq!(outcome.num_elems, 8);
}

#[test]
fn test_packet_larger_than_mtu_is_fragmented() {
    let (_lib, api, feed) = sim_with(SimDeviceSpec::new("0001").with_mtu(256));
    let device = open(&api);
    let mut stream = device.setup_stream(Direction::Rx, StreamFormat::CS8, &[0], None).unwrap();
    assert_eq!(stream.mtu().unwrap(), 256);
    stream.activate(StreamFlags::NONE, 0, 0).unwrap();

    feed.send(SimPacket::elements(600)).unwrap();

    let mut buf = vec![[0i8; 2]; 1024];
    let counts: Vec<(usize, bool)> = (0..3)
        .map(|_| {
            let outcome = stream.read(&mut [buf.as_mut_slice()], 1024, TIMEOUT_US).unwrap();
            (outcome.num_elems, outcome.flags.contains(StreamFlags::MORE_FRAGMENTS))
        })
        .collect();

    assert_eq!(counts, vec![(256, true), (256, true), (88, false)]);
}

#[test]
fn test_buffer_shape_is_checked() {
    let (_lib, api, _feed) = sim();
    let device = open(&api);
    let mut stream = device.setup_stream(Direction::Rx, StreamFormat::CS16, &[0, 1], None).unwrap();
    stream.activate(StreamFlags::NONE, 0, 0).unwrap();

    let mut a = vec![[0i16; 2]; 64];
    let err = stream.read(&mut [a.as_mut_slice()], 64, TIMEOUT_US).unwrap_err();
    assert!(matches!(err, SdrError::BufferCount { expected: 2, actual: 1 }));

    let mut b = vec![[0i16; 2]; 10];
    let err = stream
        .read(&mut [a.as_mut_slice(), b.as_mut_slice()], 64, TIMEOUT_US)
        .unwrap_err();
    assert!(matches!(
        err,
        SdrError::BufferTooSmall { index: 1, capacity: 10, requested: 64 }
    ));
}

#[test]
fn test_end_burst_write_reports_status() {
    let spec = SimDeviceSpec::new("0001");
    let tx_log = spec.tx_log();
    let (_lib, api, _feed) = sim_with(spec);
    let device = open(&api);

    let mut stream = device.setup_stream(Direction::Tx, StreamFormat::CS16, &[0], None).unwrap();
    stream.activate(StreamFlags::NONE, 0, 0).unwrap();

    let samples = vec![[0x0102i16, 0x0304]; 100];
    let outcome = stream
        .write(&[samples.as_slice()], 100, StreamFlags::END_BURST | StreamFlags::HAS_TIME, 42, TIMEOUT_US)
        .unwrap();
    assert_eq!(outcome.num_elems, 100);

    let record = tx_log.try_recv().unwrap();
    assert_eq!(record.num_elems, 100);
    assert_eq!(record.time_ns, 42);
    assert_eq!(record.data.len(), 1);
    assert_eq!(record.data[0].len(), 400);

    let status = stream.read_status(TIMEOUT_US).unwrap();
    assert!(status.flags.contains(StreamFlags::END_BURST));
    assert_eq!(status.channel_mask, 1);
    assert_eq!(status.time_ns, Some(42));
}

#[test]
fn test_negative_status_event_is_translated() {
    let spec = SimDeviceSpec::new("0001");
    let status_feed = spec.status_feed();
    let (_lib, api, _feed) = sim_with(spec);
    let device = open(&api);
    let mut stream = device.setup_stream(Direction::Tx, StreamFormat::CS16, &[0], None).unwrap();
    stream.activate(StreamFlags::NONE, 0, 0).unwrap();

    status_feed
        .send(SimStatus {
            status: ErrorKind::Underflow.code(),
            channel_mask: 1,
            flags: 0,
            time_ns: 0,
        })
        .unwrap();
    status_feed
        .send(SimStatus {
            status: -42,
            channel_mask: 1,
            flags: 0,
            time_ns: 0,
        })
        .unwrap();

    let err = stream.read_status(TIMEOUT_US).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Underflow));
    assert!(err.is_recoverable());

    let err = stream.read_status(TIMEOUT_US).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Unknown));

    // Nothing queued: the poll times out
    let err = stream.read_status(1_000).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Timeout));
    assert_eq!(stream.state(), StreamState::Active);
}

#[test]
fn test_status_not_supported() {
    let (_lib, api, _feed) = sim_with(SimDeviceSpec::new("0001").without_status());
    let device = open(&api);
    let mut stream = device.setup_stream(Direction::Tx, StreamFormat::CS16, &[0], None).unwrap();
    stream.activate(StreamFlags::NONE, 0, 0).unwrap();

    let err = stream.read_status(TIMEOUT_US).unwrap_err();
    assert!(err.is_not_supported());
}

#[test]
fn test_setup_rejections() {
    let (lib, api, _feed) = sim();
    let device = open(&api);

    match device.setup_stream(Direction::Rx, StreamFormat::CS12, &[0], None) {
        Err(SdrError::Rejected { kind, message }) => {
            assert_eq!(kind, ErrorKind::NotSupported);
            assert!(message.contains("CS12"), "{}", message);
        }
        other => panic!("expected rejection, got {:?}", other.map(|s| s.state())),
    }

    let err = device
        .setup_stream(Direction::Tx, StreamFormat::CS8, &[3], None)
        .map(|_| ())
        .unwrap_err();
    assert!(err.is_not_supported());

    let err = device
        .setup_stream(Direction::Rx, StreamFormat::CS8, &[], None)
        .map(|_| ())
        .unwrap_err();
    assert!(matches!(err, SdrError::EmptyChannels));

    assert_eq!(lib.open_streams(), 0);
}

#[test]
fn test_wide_device_channels() {
    let (lib, api, feed) = sim_with(SimDeviceSpec::new("0001").with_channels(4, 2));
    let device = open(&api);
    assert_eq!(device.num_channels(Direction::Rx), 4);
    assert_eq!(device.num_channels(Direction::Tx), 2);

    let mut stream = device.setup_stream(Direction::Rx, StreamFormat::CS8, &[3, 0], None).unwrap();
    assert_eq!(stream.channels(), &[3, 0]);
    stream.activate(StreamFlags::NONE, 0, 0).unwrap();
    feed.send(SimPacket::elements(4).with_fill(9)).unwrap();

    let mut a = vec![[0i8; 2]; 4];
    let mut b = vec![[0i8; 2]; 4];
    let outcome = stream
        .read(&mut [a.as_mut_slice(), b.as_mut_slice()], 4, TIMEOUT_US)
        .unwrap();
    assert_eq!(outcome.num_elems, 4);
    assert_eq!(a, b);
    assert_eq!(a[3], [9, 9]);
    stream.close().unwrap();

    let tx = device.setup_stream(Direction::Tx, StreamFormat::CS8, &[1], None).unwrap();
    drop(tx);
    let err = device
        .setup_stream(Direction::Tx, StreamFormat::CS8, &[2], None)
        .map(|_| ())
        .unwrap_err();
    assert!(err.is_not_supported());

    assert_eq!(lib.stream_closes(), 2);
    assert_eq!(lib.open_streams(), 0);
}
