//! The driver's state machine:
//!
//! ```text
//! UNLOADED --load()--> LOADED --uci handshake complete--> IDLE
//! IDLE --position set--> READY --go--> THINKING --bestmove--> IDLE
//! any --unload--> UNLOADED
//! ```

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Unloaded,
    Loaded,
    Idle,
    Ready,
    Thinking,
}

impl DriverState {
    /// Steps back one state along `Unloaded < Loaded < Idle < Ready <
    /// Thinking`, clamping at `Unloaded`. Used by the I/O loop's internal
    /// error recovery: an engine that misbehaves mid-command is
    /// demoted rather than torn down outright.
    pub fn decrease_state(self) -> DriverState {
        match self {
            DriverState::Unloaded => DriverState::Unloaded,
            DriverState::Loaded => DriverState::Unloaded,
            DriverState::Idle => DriverState::Loaded,
            DriverState::Ready => DriverState::Idle,
            DriverState::Thinking => DriverState::Ready,
        }
    }

    pub fn is_at_least(self, other: DriverState) -> bool {
        self.rank() >= other.rank()
    }

    fn rank(self) -> u8 {
        match self {
            DriverState::Unloaded => 0,
            DriverState::Loaded => 1,
            DriverState::Idle => 2,
            DriverState::Ready => 3,
            DriverState::Thinking => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decrease_state_steps_back_and_clamps() {
        assert_eq!(DriverState::Thinking.decrease_state(), DriverState::Ready);
        assert_eq!(DriverState::Ready.decrease_state(), DriverState::Idle);
        assert_eq!(DriverState::Idle.decrease_state(), DriverState::Loaded);
        assert_eq!(DriverState::Loaded.decrease_state(), DriverState::Unloaded);
        assert_eq!(DriverState::Unloaded.decrease_state(), DriverState::Unloaded);
    }

    #[test]
    fn ordering() {
        assert!(DriverState::Thinking.is_at_least(DriverState::Idle));
        assert!(!DriverState::Loaded.is_at_least(DriverState::Ready));
    }
}
