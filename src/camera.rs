//! Trailing camera rig.
//!
//! The camera eases toward a point held behind and above the character,
//! rotated with the character's visible orientation, and always looks at
//! a point near head height. When the character backs up, the rig can
//! swing to the front so the camera leads instead of trails.

use bevy::prelude::*;

use crate::config::{approach_alpha, fixed_dt, CharacterController};
use crate::intent::MovementIntent;

/// Camera rig component. Attach to the camera entity.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use strut_character_controller::prelude::*;
///
/// fn setup(mut commands: Commands) {
///     let character = commands
///         .spawn((
///             Transform::default(),
///             CharacterController::new(),
///             ControllerConfig::player(),
///             MovementIntent::default(),
///             CharacterVolume::default(),
///         ))
///         .id();
///     commands.spawn((Transform::default(), CameraRig::follow(character)));
/// }
/// ```
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct CameraRig {
    /// The character to follow. `None` leaves the camera untouched.
    pub target: Option<Entity>,
    /// Offset from the character while trailing, in the character's local
    /// frame. The default sits behind and above.
    pub follow_offset: Vec3,
    /// Offset used while the character backs up, swung to the front.
    pub lead_offset: Vec3,
    /// Height above the character's position the camera looks at.
    pub look_height: f32,
    /// Per-reference-tick fraction of the remaining distance covered.
    pub smoothing: f32,
    /// Swing to `lead_offset` while only the back action is held.
    pub lead_while_reversing: bool,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            target: None,
            follow_offset: Vec3::new(0.0, 10.0, 10.0),
            lead_offset: Vec3::new(0.0, 10.0, -15.0),
            look_height: 2.0,
            smoothing: 0.1,
            lead_while_reversing: true,
        }
    }
}

impl CameraRig {
    /// Create a rig following the given character.
    pub fn follow(target: Entity) -> Self {
        Self {
            target: Some(target),
            ..Default::default()
        }
    }
}

/// Ease the camera toward its desired pose behind the character.
pub fn follow_camera(
    time: Res<Time<Fixed>>,
    characters: Query<(&Transform, Option<&MovementIntent>), With<CharacterController>>,
    mut rigs: Query<(&CameraRig, &mut Transform), Without<CharacterController>>,
) {
    let dt = fixed_dt(&time);
    for (rig, mut camera) in &mut rigs {
        let Some(target) = rig.target else {
            continue;
        };
        let Ok((anchor, intent)) = characters.get(target) else {
            continue;
        };

        let reversing = intent.is_some_and(|intent| intent.back && !intent.forward);
        let offset = if reversing && rig.lead_while_reversing {
            rig.lead_offset
        } else {
            rig.follow_offset
        };

        let desired = anchor.translation + anchor.rotation * offset;
        let alpha = approach_alpha(rig.smoothing, dt);
        let current = camera.translation;
        camera.translation += (desired - current) * alpha;

        let focus = anchor.translation + Vec3::Y * rig.look_height;
        if (focus - camera.translation).length_squared() > 1.0e-6 {
            camera.look_at(focus, Vec3::Y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rig_trails_behind_and_above() {
        let rig = CameraRig::default();
        assert!(rig.follow_offset.z > 0.0);
        assert!(rig.follow_offset.y > 0.0);
        assert!(rig.lead_offset.z < 0.0);
        assert!(rig.target.is_none());
    }

    #[test]
    fn follow_targets_an_entity() {
        let mut world = World::new();
        let character = world.spawn_empty().id();
        let rig = CameraRig::follow(character);
        assert_eq!(rig.target, Some(character));
        assert!(rig.lead_while_reversing);
    }
}
