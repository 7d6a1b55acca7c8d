pub mod codec;
pub mod config;
pub mod device;
pub mod error;
pub mod logger;
pub mod modules;
pub mod native;
pub mod stream;
pub mod time;
pub mod types;
pub mod version;

pub use config::{BridgeConfig, DeviceProfile, ProfileStore};
pub use device::DeviceHandle;
pub use error::{ErrorKind, Result, SdrError};
pub use logger::LogLevel;
pub use native::{Api, NativeApi, SimulatedLibrary};
pub use stream::{ReadOutcome, Sample, StreamFlags, StreamFormat, StreamHandle, StreamState, StreamStatus, WriteOutcome};
pub use types::{ArgInfo, ArgOption, ArgType, Args, Direction, Range};
pub use version::VersionInfo;
