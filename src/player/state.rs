//! Player state machine
//!
//! ```text
//!   Idle --play--> Playing --fade_out--> FadingOut --stop timer--> Idle
//!                     ^                      |
//!                     +------play/toggle-----+   (cancel and restart)
//! ```
//!
//! `stop()` returns to Idle from any state.

use std::fmt;

/// Playback state of the ambient player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerState {
    /// No layers exist (default state)
    #[default]
    Idle,
    /// Layers are sounding and the master is at or ramping to its target
    Playing,
    /// Master is ramping to zero; a stop is scheduled
    FadingOut,
}

impl PlayerState {
    /// Whether the player counts as playing for the UI and for `toggle`
    pub fn is_playing(&self) -> bool {
        *self == PlayerState::Playing
    }

    /// Whether tone layers exist in this state
    pub fn has_layers(&self) -> bool {
        *self != PlayerState::Idle
    }

    /// State reached by `toggle` from this one
    pub fn toggled(&self) -> PlayerState {
        match self {
            PlayerState::Playing => PlayerState::FadingOut,
            PlayerState::Idle | PlayerState::FadingOut => PlayerState::Playing,
        }
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerState::Idle => write!(f, "Idle"),
            PlayerState::Playing => write!(f, "Playing"),
            PlayerState::FadingOut => write!(f, "FadingOut"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_default_state_is_idle() {
        assert_eq!(PlayerState::default(), PlayerState::Idle);
    }

    #[test_case(PlayerState::Idle, PlayerState::Playing ; "idle starts playing")]
    #[test_case(PlayerState::Playing, PlayerState::FadingOut ; "playing fades out")]
    #[test_case(PlayerState::FadingOut, PlayerState::Playing ; "fading restarts")]
    fn test_toggled(from: PlayerState, to: PlayerState) {
        assert_eq!(from.toggled(), to);
    }

    #[test]
    fn test_only_playing_is_playing() {
        assert!(PlayerState::Playing.is_playing());
        assert!(!PlayerState::FadingOut.is_playing());
        assert!(!PlayerState::Idle.is_playing());
        assert!(PlayerState::FadingOut.has_layers());
        assert!(!PlayerState::Idle.has_layers());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", PlayerState::Idle), "Idle");
        assert_eq!(format!("{}", PlayerState::Playing), "Playing");
        assert_eq!(format!("{}", PlayerState::FadingOut), "FadingOut");
    }
}
