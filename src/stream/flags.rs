use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::os::raw::c_int;

use serde::{Deserialize, Serialize};

/// Bit set passed to and reported by stream calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StreamFlags(c_int);

impl StreamFlags {
    pub const NONE: StreamFlags = StreamFlags(0);
    /// Marks the end of a burst
    pub const END_BURST: StreamFlags = StreamFlags(1 << 1);
    /// The time argument is valid
    pub const HAS_TIME: StreamFlags = StreamFlags(1 << 2);
    /// A burst ended in an unexpected way
    pub const END_ABRUPT: StreamFlags = StreamFlags(1 << 3);
    /// Packet-oriented transfer (one packet per call)
    pub const ONE_PACKET: StreamFlags = StreamFlags(1 << 4);
    /// More data from the same packet remains to be read
    pub const MORE_FRAGMENTS: StreamFlags = StreamFlags(1 << 5);
    /// Wait for a hardware trigger before streaming
    pub const WAIT_TRIGGER: StreamFlags = StreamFlags(1 << 6);

    pub const fn from_bits(bits: c_int) -> Self {
        StreamFlags(bits)
    }

    pub const fn bits(self) -> c_int {
        self.0
    }

    pub const fn contains(self, other: StreamFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for StreamFlags {
    type Output = StreamFlags;

    fn bitor(self, rhs: StreamFlags) -> StreamFlags {
        StreamFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for StreamFlags {
    fn bitor_assign(&mut self, rhs: StreamFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for StreamFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(StreamFlags, &str); 6] = [
            (StreamFlags::END_BURST, "END_BURST"),
            (StreamFlags::HAS_TIME, "HAS_TIME"),
            (StreamFlags::END_ABRUPT, "END_ABRUPT"),
            (StreamFlags::ONE_PACKET, "ONE_PACKET"),
            (StreamFlags::MORE_FRAGMENTS, "MORE_FRAGMENTS"),
            (StreamFlags::WAIT_TRIGGER, "WAIT_TRIGGER"),
        ];

        let set: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();

        if set.is_empty() {
            f.write_str("NONE")
        } else {
            f.write_str(&set.join("|"))
        }
    }
}
