//! Movement intent component.
//!
//! The intent is the logical input snapshot for one tick: which movement
//! actions are currently held. It is written by an input collaborator
//! (keyboard, gamepad, AI, replay) and read by the controller systems;
//! the controller never touches raw device events.
//!
//! Every field is level-triggered except jump, which is edge-triggered:
//! holding the jump action does not re-arm a jump every tick.

use bevy::prelude::*;

/// Logical input state for one character.
///
/// # Example
///
/// ```rust
/// use strut_character_controller::prelude::*;
///
/// let mut intent = MovementIntent::default();
/// intent.forward = true;
/// intent.sprint = true;
/// assert_eq!(intent.walk_axis(), 1.0);
///
/// // Jump is a held boolean; the controller detects the rising edge.
/// intent.set_jump_pressed(true);
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct MovementIntent {
    /// Move along the current facing.
    pub forward: bool,
    /// Move against the current facing.
    pub back: bool,
    /// Turn counter-clockwise (positive yaw).
    pub turn_left: bool,
    /// Turn clockwise (negative yaw).
    pub turn_right: bool,
    /// Use the sprint speed and gait while translating.
    pub sprint: bool,
    /// Whether the jump action is currently held.
    ///
    /// Set this from any input source via [`set_jump_pressed`](Self::set_jump_pressed).
    /// The controller turns the false-to-true transition into a single
    /// jump request; holding the action does not repeat it.
    pub jump_pressed: bool,
    /// Previous tick's `jump_pressed`, for edge detection.
    pub(crate) jump_pressed_prev: bool,
    /// Rising edge detected this tick.
    pub(crate) jump_edge: bool,
}

impl MovementIntent {
    /// Create a new empty intent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the held state of the jump action.
    pub fn set_jump_pressed(&mut self, pressed: bool) {
        self.jump_pressed = pressed;
    }

    /// Translation axis along the facing: `1.0` forward, `-1.0` back,
    /// `0.0` when neither or both are held.
    pub fn walk_axis(&self) -> f32 {
        (self.forward as i8 - self.back as i8) as f32
    }

    /// Turn axis: `1.0` left (counter-clockwise), `-1.0` right.
    pub fn turn_axis(&self) -> f32 {
        (self.turn_left as i8 - self.turn_right as i8) as f32
    }

    /// Whether any translation input is held.
    pub fn translating(&self) -> bool {
        self.walk_axis() != 0.0
    }

    /// Whether a jump was requested this tick (rising edge).
    pub fn has_jump_edge(&self) -> bool {
        self.jump_edge
    }

    /// Release every held action.
    pub fn clear(&mut self) {
        self.forward = false;
        self.back = false;
        self.turn_left = false;
        self.turn_right = false;
        self.sprint = false;
        self.jump_pressed = false;
    }

    /// Recompute the jump edge from the held state.
    pub(crate) fn refresh_jump_edge(&mut self) {
        let pressed = self.jump_pressed;
        self.jump_edge = pressed && !self.jump_pressed_prev;
        self.jump_pressed_prev = pressed;
    }
}

/// Turn held jump state into edge-triggered jump requests, once per tick.
pub fn buffer_jump_intents(mut intents: Query<&mut MovementIntent>) {
    for mut intent in &mut intents {
        intent.refresh_jump_edge();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_axis_resolves_opposing_input() {
        let mut intent = MovementIntent::new();
        assert_eq!(intent.walk_axis(), 0.0);
        assert!(!intent.translating());

        intent.forward = true;
        assert_eq!(intent.walk_axis(), 1.0);
        assert!(intent.translating());

        intent.back = true;
        assert_eq!(intent.walk_axis(), 0.0);
        assert!(!intent.translating());

        intent.forward = false;
        assert_eq!(intent.walk_axis(), -1.0);
    }

    #[test]
    fn turn_axis_sign_convention() {
        let mut intent = MovementIntent::new();
        intent.turn_left = true;
        assert_eq!(intent.turn_axis(), 1.0);

        intent.turn_left = false;
        intent.turn_right = true;
        assert_eq!(intent.turn_axis(), -1.0);
    }

    #[test]
    fn jump_edge_fires_once_per_press() {
        let mut intent = MovementIntent::new();

        intent.set_jump_pressed(true);
        intent.refresh_jump_edge();
        assert!(intent.has_jump_edge());

        // Held: no new edge.
        intent.refresh_jump_edge();
        assert!(!intent.has_jump_edge());
        intent.refresh_jump_edge();
        assert!(!intent.has_jump_edge());

        // Release and press again: a new edge.
        intent.set_jump_pressed(false);
        intent.refresh_jump_edge();
        assert!(!intent.has_jump_edge());
        intent.set_jump_pressed(true);
        intent.refresh_jump_edge();
        assert!(intent.has_jump_edge());
    }

    #[test]
    fn clear_releases_everything() {
        let mut intent = MovementIntent::new();
        intent.forward = true;
        intent.turn_right = true;
        intent.sprint = true;
        intent.set_jump_pressed(true);

        intent.clear();
        assert!(!intent.translating());
        assert_eq!(intent.turn_axis(), 0.0);
        assert!(!intent.sprint);
        assert!(!intent.jump_pressed);
    }
}
