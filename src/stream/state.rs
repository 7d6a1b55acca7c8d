use std::fmt;

use serde::{Deserialize, Serialize};

/// Stream lifecycle states
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamState {
    /// Set up on the device, not yet streaming
    #[default]
    Created,
    Active,
    /// Stopped; may be activated again
    Deactivated,
    /// Terminal; the native stream has been released
    Closed,
}

impl StreamState {
    /// Check if transition from current state to target state is valid
    pub fn can_transition_to(&self, target: StreamState) -> bool {
        use StreamState::*;

        matches!(
            (self, target),
            (Created, Active) |
            (Active, Deactivated) |
            (Deactivated, Active) |
            // Closed is reachable from anywhere except itself
            (Created | Active | Deactivated, Closed)
        )
    }

    /// Whether data I/O and status polling are allowed
    pub fn is_streaming(&self) -> bool {
        *self == StreamState::Active
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Active => "Active",
            Self::Deactivated => "Deactivated",
            Self::Closed => "Closed",
        }
    }
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
