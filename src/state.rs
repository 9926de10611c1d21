//! Locomotion states and their marker components.
//!
//! The authoritative state lives in the
//! [`CharacterController`](crate::config::CharacterController) hub as a
//! [`MovementState`] value; marker components mirror it once per tick so
//! other systems can filter queries on it.

use bevy::prelude::*;

/// The locomotion state machine's states.
///
/// Transitions:
/// - `Grounded` to `AnticipatingJump` on an edge-triggered jump request.
/// - `AnticipatingJump` to `Airborne` once `elapsed` reaches the
///   configured anticipation duration.
/// - `Airborne` to `Grounded` when the integrated height falls to the
///   resting ground contact height.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Default)]
pub enum MovementState {
    /// Standing or walking with ground support.
    #[default]
    Grounded,
    /// Crouched, waiting out the pre-jump delay.
    AnticipatingJump {
        /// Time spent in this state so far, in seconds.
        elapsed: f32,
    },
    /// Ballistic flight under gravity with horizontal inertia carry.
    Airborne,
}

impl MovementState {
    /// Whether the character currently has ground support.
    pub fn is_grounded(self) -> bool {
        matches!(self, MovementState::Grounded)
    }

    /// Whether the character is waiting out the pre-jump delay.
    pub fn is_anticipating(self) -> bool {
        matches!(self, MovementState::AnticipatingJump { .. })
    }

    /// Whether the character is in ballistic flight.
    pub fn is_airborne(self) -> bool {
        matches!(self, MovementState::Airborne)
    }
}

/// Marker component indicating the character is grounded.
///
/// Added and removed automatically from the hub state once per tick.
/// Mutually exclusive with [`AnticipatingJump`] and [`Airborne`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the character is crouched before a jump.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct AnticipatingJump;

/// Marker component indicating the character is airborne.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_grounded() {
        let state = MovementState::default();
        assert!(state.is_grounded());
        assert!(!state.is_anticipating());
        assert!(!state.is_airborne());
    }

    #[test]
    fn anticipation_carries_elapsed_time() {
        let state = MovementState::AnticipatingJump { elapsed: 0.15 };
        assert!(state.is_anticipating());
        assert!(!state.is_grounded());

        let MovementState::AnticipatingJump { elapsed } = state else {
            panic!("expected anticipation state");
        };
        assert_eq!(elapsed, 0.15);
    }

    #[test]
    fn state_predicates_are_exclusive() {
        for state in [
            MovementState::Grounded,
            MovementState::AnticipatingJump { elapsed: 0.0 },
            MovementState::Airborne,
        ] {
            let flags = [
                state.is_grounded(),
                state.is_anticipating(),
                state.is_airborne(),
            ];
            assert_eq!(flags.iter().filter(|&&f| f).count(), 1);
        }
    }
}
