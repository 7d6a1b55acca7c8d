use std::sync::Arc;

use sdrbridge::native::{SimDeviceSpec, SimPacket, SimulatedLibrary};
use sdrbridge::{Api, BridgeConfig, DeviceHandle, DeviceProfile, Direction, StreamFlags, StreamFormat};
use tempfile::tempdir;

#[tokio::test]
async fn test_profile_from_config_opens_and_streams() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("bridge.json");

    let config = BridgeConfig {
        default_format: StreamFormat::CS8,
        ..BridgeConfig::load(&config_path).await.unwrap()
    };
    config.save(&config_path).await.unwrap();

    let store = config.profile_store(dir.path()).unwrap();
    assert!(dir.path().join("profiles").is_dir());

    let spec = SimDeviceSpec::new("7");
    let feed = spec.rx_feed();
    let lib = Arc::new(SimulatedLibrary::new().with_device(spec));
    let api: Api = lib.clone();
    config.apply(lib.as_ref());

    // Save a profile for the first enumerated device
    let found = DeviceHandle::enumerate(&api, None).unwrap();
    let mut profile = DeviceProfile::new("sim-7", "Bench receiver", found[0].clone());
    profile.stream.format = config.default_format;
    profile.stream.channels = vec![1];
    profile.stream.sample_rate = Some(2.048e6);
    store.save(&profile).unwrap();

    let matching = store.find_matching(&found[0]).unwrap();
    assert_eq!(matching.len(), 1);
    let profile = &matching[0];

    let device = profile.open(&api).unwrap();
    assert_eq!(device.sample_rate(Direction::Rx, 1).unwrap(), 2.048e6);

    {
        let mut stream = profile.setup_stream(&device).unwrap();
        assert_eq!(stream.channels(), &[1]);
        assert_eq!(stream.format(), StreamFormat::CS8);

        stream.activate(StreamFlags::NONE, 0, 0).unwrap();
        feed.send(SimPacket::elements(64)).unwrap();
        let mut buf = vec![[0i8; 2]; 64];
        let outcome = stream
            .read(&mut [buf.as_mut_slice()], 64, config.default_timeout_us)
            .unwrap();
        assert_eq!(outcome.num_elems, 64);
    }

    device.unmake().unwrap();
    assert_eq!(lib.open_devices(), 0);
    assert_eq!(lib.open_streams(), 0);
}
