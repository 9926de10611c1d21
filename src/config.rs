//! Controller configuration and the central state component.
//!
//! All tuning constants were calibrated at a 60 Hz tick; smoothing values
//! are stored as per-reference-tick factors and converted to time-based
//! exponential form at use sites, so behavior does not change with the
//! tick rate.

use bevy::prelude::*;

use crate::gait::GaitMode;
use crate::state::MovementState;

/// The tick duration the tuning constants were calibrated at.
pub const REFERENCE_DT: f32 = 1.0 / 60.0;

/// Convert a per-reference-tick approach factor into one for `dt`.
///
/// An approach factor is the fraction of the remaining distance covered
/// each reference tick (camera easing, step and terrain corrections).
/// The returned value covers the same fraction over `dt` regardless of
/// how `dt` relates to the reference tick.
pub fn approach_alpha(per_tick: f32, dt: f32) -> f32 {
    1.0 - (1.0 - per_tick.clamp(0.0, 1.0)).powf(dt / REFERENCE_DT)
}

/// Convert a per-reference-tick decay multiplier into one for `dt`.
///
/// A decay multiplier scales a quantity down each reference tick
/// (air-inertia drag). The returned value produces the same decay over
/// `dt` regardless of tick rate.
pub fn decay_factor(per_tick: f32, dt: f32) -> f32 {
    per_tick.clamp(0.0, 1.0).powf(dt / REFERENCE_DT)
}

/// Fixed timestep in seconds, with a fallback for test harnesses that run
/// the fixed schedule directly without advancing the clock.
pub(crate) fn fixed_dt(time: &Time<Fixed>) -> f32 {
    let dt = time.delta_secs();
    if dt > 0.0 { dt } else { REFERENCE_DT }
}

/// Same as [`fixed_dt`], read straight from a world (exclusive systems).
pub(crate) fn world_fixed_dt(world: &World) -> f32 {
    world
        .get_resource::<Time<Fixed>>()
        .map(|time| time.delta_secs())
        .filter(|&dt| dt > 0.0)
        .unwrap_or(REFERENCE_DT)
}

/// Tuning constants for one character controller.
///
/// Defaults reproduce the reference tuning; builder methods adjust
/// individual values.
///
/// # Example
///
/// ```rust
/// use strut_character_controller::prelude::*;
///
/// let config = ControllerConfig::player()
///     .with_walk_speed(18.0)
///     .with_step_height(0.6);
/// assert_eq!(config.speed(false), 18.0);
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct ControllerConfig {
    /// Horizontal speed while walking, units per second.
    pub walk_speed: f32,
    /// Horizontal speed while sprinting, units per second.
    pub sprint_speed: f32,
    /// Yaw rate from the turn actions, radians per second.
    pub turn_rate: f32,
    /// Per-reference-tick blend of the visible rotation toward the heading.
    pub turn_smoothing: f32,
    /// Vertical acceleration while airborne, units per second squared.
    /// Negative is downward.
    pub gravity: f32,
    /// Upward velocity applied when a jump launches, units per second.
    pub jump_impulse: f32,
    /// Small upward nudge at launch so the crouch visually clears.
    pub jump_clearance: f32,
    /// Duration of the pre-jump crouch, seconds.
    pub anticipation_secs: f32,
    /// Per-reference-tick multiplier applied to airborne inertia.
    pub air_damping: f32,
    /// Tallest rise treated as a climbable step rather than a blocker.
    pub step_height: f32,
    /// Per-reference-tick approach factor of the step-up correction.
    pub step_smoothing: f32,
    /// Height above the current position the step probe is cast from.
    pub probe_lift: f32,
    /// Extra probe length beyond one tick of travel.
    pub probe_margin: f32,
    /// Height the character rests above the probed ground surface.
    pub ground_offset: f32,
    /// Largest ground-height gap the terrain follower will close; larger
    /// gaps are treated as a ledge and ignored.
    pub follow_tolerance: f32,
    /// Per-reference-tick approach factor of the terrain correction.
    pub follow_smoothing: f32,
    /// Height above the character the terrain probe is cast from.
    pub terrain_probe_height: f32,
    /// Maximum length of the terrain probe.
    pub terrain_probe_range: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            walk_speed: 24.0,
            sprint_speed: 42.0,
            turn_rate: 2.5,
            turn_smoothing: 0.2,
            gravity: -108.0,
            jump_impulse: 39.0,
            jump_clearance: 0.2,
            anticipation_secs: 0.2,
            air_damping: 0.98,
            step_height: 0.8,
            step_smoothing: 0.2,
            probe_lift: 0.05,
            probe_margin: 0.5,
            ground_offset: 0.4,
            follow_tolerance: 1.4,
            follow_smoothing: 0.2,
            terrain_probe_height: 10.0,
            terrain_probe_range: 60.0,
        }
    }
}

impl ControllerConfig {
    /// Create a config with the reference tuning.
    pub fn new() -> Self {
        Self::default()
    }

    /// The reference player tuning.
    pub fn player() -> Self {
        Self::default()
    }

    /// Set the walking speed.
    pub fn with_walk_speed(mut self, speed: f32) -> Self {
        self.walk_speed = speed;
        self
    }

    /// Set the sprinting speed.
    pub fn with_sprint_speed(mut self, speed: f32) -> Self {
        self.sprint_speed = speed;
        self
    }

    /// Set the jump launch velocity.
    pub fn with_jump_impulse(mut self, impulse: f32) -> Self {
        self.jump_impulse = impulse;
        self
    }

    /// Set the airborne vertical acceleration (negative is downward).
    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the tallest climbable rise.
    pub fn with_step_height(mut self, height: f32) -> Self {
        self.step_height = height;
        self
    }

    /// Set the pre-jump crouch duration.
    pub fn with_anticipation_secs(mut self, secs: f32) -> Self {
        self.anticipation_secs = secs;
        self
    }

    /// Set the resting height above the probed ground surface.
    pub fn with_ground_offset(mut self, offset: f32) -> Self {
        self.ground_offset = offset;
        self
    }

    /// The translation speed for the given sprint state.
    pub fn speed(&self, sprint: bool) -> f32 {
        if sprint {
            self.sprint_speed
        } else {
            self.walk_speed
        }
    }
}

/// Core character controller component.
///
/// This is the central hub for the controller's mutable state. The
/// character's position and visible orientation live in its `Transform`;
/// everything else the state machine needs is here.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct CharacterController {
    /// Current locomotion state.
    pub movement_state: MovementState,
    /// Vertical velocity while airborne, units per second.
    pub vertical_velocity: f32,
    /// Horizontal velocity carried into the air from the last grounded
    /// move, damped each airborne tick.
    pub air_inertia: Vec3,
    /// Authoritative heading, radians about the world Y axis. The visible
    /// rotation eases toward it.
    pub yaw: f32,
    /// Resting ground contact height for the current frame. Refreshed by
    /// the terrain probe; landing clamps to it.
    pub rest_height: f32,
    /// Scheduled step-up correction: the height the character should
    /// converge to, if a climbable step was probed this tick.
    pub step_target: Option<f32>,
    /// Gait the pose driver should play this tick; `None` means idle.
    pub gait_mode: Option<GaitMode>,
    /// Accumulated walk time driving the gait phase.
    pub gait_clock: f32,
}

impl Default for CharacterController {
    fn default() -> Self {
        Self {
            movement_state: MovementState::Grounded,
            vertical_velocity: 0.0,
            air_inertia: Vec3::ZERO,
            yaw: 0.0,
            rest_height: 0.0,
            step_target: None,
            gait_mode: None,
            gait_clock: 0.0,
        }
    }
}

impl CharacterController {
    /// Create a controller at rest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial resting ground contact height.
    pub fn with_rest_height(mut self, height: f32) -> Self {
        self.rest_height = height;
        self
    }

    /// Set the initial heading, radians about the world Y axis.
    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.yaw = yaw;
        self
    }

    /// Whether the character currently has ground support.
    pub fn is_grounded(&self) -> bool {
        self.movement_state.is_grounded()
    }

    /// Whether the character is in ballistic flight.
    pub fn is_airborne(&self) -> bool {
        self.movement_state.is_airborne()
    }

    /// The rotation of the authoritative heading.
    pub fn facing(&self) -> Quat {
        Quat::from_rotation_y(self.yaw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approach_alpha_identity_at_reference_rate() {
        let alpha = approach_alpha(0.2, REFERENCE_DT);
        assert!((alpha - 0.2).abs() < 1.0e-6);
    }

    #[test]
    fn approach_alpha_composes_across_tick_rates() {
        // Two half-length steps must cover the same fraction as one full step.
        let half = approach_alpha(0.2, REFERENCE_DT * 0.5);
        let composed = 1.0 - (1.0 - half) * (1.0 - half);
        assert!((composed - 0.2).abs() < 1.0e-5);
    }

    #[test]
    fn decay_factor_identity_at_reference_rate() {
        let factor = decay_factor(0.98, REFERENCE_DT);
        assert!((factor - 0.98).abs() < 1.0e-6);
    }

    #[test]
    fn decay_factor_composes_across_tick_rates() {
        let half = decay_factor(0.98, REFERENCE_DT * 0.5);
        assert!((half * half - 0.98).abs() < 1.0e-5);
    }

    #[test]
    fn sprint_speed_ratio() {
        let config = ControllerConfig::default();
        assert_eq!(config.speed(false), config.walk_speed);
        assert_eq!(config.speed(true), config.sprint_speed);
        let ratio = config.sprint_speed / config.walk_speed;
        assert!((ratio - 1.75).abs() < 1.0e-3);
    }

    #[test]
    fn builders_override_defaults() {
        let config = ControllerConfig::player()
            .with_walk_speed(10.0)
            .with_sprint_speed(17.5)
            .with_jump_impulse(20.0)
            .with_step_height(0.5);
        assert_eq!(config.walk_speed, 10.0);
        assert_eq!(config.sprint_speed, 17.5);
        assert_eq!(config.jump_impulse, 20.0);
        assert_eq!(config.step_height, 0.5);
    }

    #[test]
    fn controller_facing_tracks_yaw() {
        let controller = CharacterController::new().with_yaw(std::f32::consts::FRAC_PI_2);
        let forward = controller.facing() * Vec3::NEG_Z;
        // Quarter turn counter-clockwise: forward swings from -Z to -X.
        assert!((forward - Vec3::NEG_X).length() < 1.0e-5);
    }

    #[test]
    fn controller_default_is_at_rest() {
        let controller = CharacterController::default();
        assert!(controller.is_grounded());
        assert_eq!(controller.vertical_velocity, 0.0);
        assert_eq!(controller.air_inertia, Vec3::ZERO);
        assert!(controller.step_target.is_none());
        assert!(controller.gait_mode.is_none());
    }
}
