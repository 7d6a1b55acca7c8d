use std::sync::Arc;

use anyhow::Context;
use sdrbridge::native::{SimDeviceSpec, SimPacket};
use sdrbridge::{Api, DeviceHandle, Direction, SimulatedLibrary, StreamFlags, StreamFormat, VersionInfo};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("sdrbridge - simulated receiver demo");
    println!("===================================\n");

    let spec = SimDeviceSpec::new("0001");
    let feed = spec.rx_feed();
    let api: Api = Arc::new(
        SimulatedLibrary::new()
            .with_device(spec)
            .with_device(SimDeviceSpec::new("0002")),
    );

    let versions = VersionInfo::query(api.as_ref());
    println!("Library {} (API {}, ABI {})", versions.lib, versions.api, versions.abi);

    let found = DeviceHandle::enumerate_str(&api, "driver=sim")?;
    println!("Found {} device(s):", found.len());
    for args in &found {
        println!("  {}", sdrbridge::codec::to_markup(args));
    }

    let devices = DeviceHandle::make_list(&api, found).await?;
    let device = devices.first().context("no devices found")?;
    println!("\nOpened {} ({})", device.hardware_key()?, device.driver_key()?);

    device.set_frequency(Direction::Rx, 0, 100.1e6, None)?;
    device.set_gain(Direction::Rx, 0, 30.0)?;
    let (native, full_scale) = device.native_stream_format(Direction::Rx, 0)?;
    println!("Tuned RX0 to {:.1} MHz, native format {} (full scale {})", device.frequency(Direction::Rx, 0)? / 1e6, native, full_scale);

    {
        let mut stream = device.setup_stream(Direction::Rx, StreamFormat::CS8, &[0], None)?;
        stream.activate(StreamFlags::NONE, 0, 0)?;

        for (i, fill) in [0x10u8, 0x20, 0x30].into_iter().enumerate() {
            feed.send(SimPacket::elements(1024).with_fill(fill).with_time(i as i64 * 1_000_000))?;
        }

        let mut samples = vec![[0i8; 2]; 1024];
        for _ in 0..3 {
            let num_elems = samples.len();
            let outcome = stream.read(&mut [samples.as_mut_slice()], num_elems, 100_000)?;
            println!(
                "Read {} elements, flags {}, time {:?}, first sample {:?}",
                outcome.num_elems, outcome.flags, outcome.time_ns, samples[0]
            );
        }

        stream.deactivate(StreamFlags::NONE, 0)?;
        stream.close()?;
    }

    DeviceHandle::unmake_list(devices).await?;
    println!("\nAll devices released");
    Ok(())
}
