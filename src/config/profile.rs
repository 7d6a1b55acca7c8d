use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::device::DeviceHandle;
use crate::native::Api;
use crate::stream::{StreamFormat, StreamHandle};
use crate::types::{Args, Direction};

/// Saved device selection plus the tuning applied when it is opened
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceProfile {
    /// Unique identifier, also the file stem in a [`super::ProfileStore`]
    pub id: String,

    /// User-friendly name
    pub alias: String,

    /// Construction args passed to the native `make`
    pub args: Args,

    #[serde(default)]
    pub stream: StreamDefaults,

    #[serde(default)]
    pub metadata: ProfileMetadata,
}

/// Stream setup and per-channel tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamDefaults {
    pub direction: Direction,
    pub channels: Vec<usize>,
    pub format: StreamFormat,
    pub sample_rate: Option<f64>,
    pub frequency: Option<f64>,
    pub gain: Option<f64>,
    pub antenna: Option<String>,
    /// Extra args for stream setup
    pub args: Args,
}

impl Default for StreamDefaults {
    fn default() -> Self {
        Self {
            direction: Direction::Rx,
            channels: vec![0],
            format: StreamFormat::CS16,
            sample_rate: None,
            frequency: None,
            gain: None,
            antenna: None,
            args: Args::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileMetadata {
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub created_at: u64,  // Unix timestamp
    pub modified_at: u64, // Unix timestamp
}

impl Default for ProfileMetadata {
    fn default() -> Self {
        let now = unix_now();
        Self {
            description: None,
            tags: Vec::new(),
            created_at: now,
            modified_at: now,
        }
    }
}

pub(crate) fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl DeviceProfile {
    pub fn new(id: impl Into<String>, alias: impl Into<String>, args: Args) -> Self {
        Self {
            id: id.into(),
            alias: alias.into(),
            args,
            stream: StreamDefaults::default(),
            metadata: ProfileMetadata::default(),
        }
    }

    /// Make the device and apply the saved tuning to every configured channel.
    ///
    /// A device that fails tuning is released before the error is returned.
    pub fn open(&self, api: &Api) -> Result<DeviceHandle> {
        let device = DeviceHandle::make(api, &self.args)
            .with_context(|| format!("Failed to open device for profile '{}'", self.id))?;

        if let Err(e) = self.apply(&device) {
            if let Err(release) = device.unmake() {
                warn!("profile '{}': release after failed tuning: {}", self.id, release);
            }
            return Err(e);
        }

        info!("Opened profile '{}' ({})", self.id, self.alias);
        Ok(device)
    }

    /// Apply antenna, sample rate, frequency and gain to each channel
    pub fn apply(&self, device: &DeviceHandle) -> Result<()> {
        let s = &self.stream;
        for &channel in &s.channels {
            if let Some(antenna) = &s.antenna {
                device
                    .set_antenna(s.direction, channel, antenna)
                    .with_context(|| format!("Failed to set antenna on {} channel {}", s.direction, channel))?;
            }
            if let Some(rate) = s.sample_rate {
                device
                    .set_sample_rate(s.direction, channel, rate)
                    .with_context(|| format!("Failed to set sample rate on {} channel {}", s.direction, channel))?;
            }
            if let Some(frequency) = s.frequency {
                device
                    .set_frequency(s.direction, channel, frequency, None)
                    .with_context(|| format!("Failed to set frequency on {} channel {}", s.direction, channel))?;
            }
            if let Some(gain) = s.gain {
                device
                    .set_gain(s.direction, channel, gain)
                    .with_context(|| format!("Failed to set gain on {} channel {}", s.direction, channel))?;
            }
        }
        Ok(())
    }

    /// Set up a stream with the saved direction, channels, format and args
    pub fn setup_stream<'a>(&self, device: &'a DeviceHandle) -> Result<StreamHandle<'a>> {
        let s = &self.stream;
        let args = (!s.args.is_empty()).then_some(&s.args);
        device
            .setup_stream(s.direction, s.format, &s.channels, args)
            .with_context(|| format!("Failed to set up stream for profile '{}'", self.id))
    }

    pub fn touch(&mut self) {
        self.metadata.modified_at = unix_now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{SimDeviceSpec, SimulatedLibrary};
    use std::sync::Arc;

    fn sim_args(serial: &str) -> Args {
        [("driver", "sim"), ("serial", serial)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_device_profile_serialization() {
        let mut profile = DeviceProfile::new("rx-1", "Roof antenna", sim_args("A1"));
        profile.stream.format = StreamFormat::CF32;
        profile.stream.frequency = Some(100e6);
        profile.metadata.tags = vec!["fm".to_string()];

        let json = serde_json::to_string(&profile).unwrap();
        let deserialized: DeviceProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(profile, deserialized);
        assert!(json.contains("\"CF32\""));
    }

    #[test]
    fn test_minimal_json_fills_defaults() {
        let json = r#"{"id": "x", "alias": "X", "args": {"driver": "sim"}}"#;
        let profile: DeviceProfile = serde_json::from_str(json).unwrap();

        assert_eq!(profile.stream, StreamDefaults::default());
        assert_eq!(profile.args["driver"], "sim");
    }

    #[test]
    fn test_open_applies_tuning() {
        let lib = Arc::new(SimulatedLibrary::new().with_device(SimDeviceSpec::new("A1")));
        let api: Api = lib.clone();

        let mut profile = DeviceProfile::new("rx-1", "Roof", sim_args("A1"));
        profile.stream.frequency = Some(101.1e6);
        profile.stream.gain = Some(20.0);
        profile.stream.antenna = Some("TX/RX".to_string());

        let device = profile.open(&api).unwrap();
        assert_eq!(device.frequency(Direction::Rx, 0).unwrap(), 101.1e6);
        assert_eq!(device.gain(Direction::Rx, 0).unwrap(), 20.0);
        assert_eq!(device.antenna(Direction::Rx, 0).unwrap(), "TX/RX");
        device.unmake().unwrap();
        assert_eq!(lib.open_devices(), 0);
    }

    #[test]
    fn test_open_releases_device_on_tuning_failure() {
        let lib = Arc::new(SimulatedLibrary::new().with_device(SimDeviceSpec::new("A1")));
        let api: Api = lib.clone();

        let mut profile = DeviceProfile::new("rx-1", "Roof", sim_args("A1"));
        profile.stream.channels = vec![0, 7];
        profile.stream.gain = Some(10.0);

        let err = profile.open(&api).unwrap_err();
        assert!(err.to_string().contains("channel 7"));
        assert_eq!(lib.open_devices(), 0);
    }
}
