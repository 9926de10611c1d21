//! Character rig resolution and the rest pose store.
//!
//! Character assets arrive asynchronously: the controller entity exists
//! before its joint hierarchy does. Once named descendants show up, the
//! rig resolver walks them a single time, maps recognized names to typed
//! joint slots, and captures each joint's rest rotation. From then on the
//! pose driver works with entity handles, never name lookups.
//!
//! Until a rig is resolved, every controller system treats the character
//! as absent and does nothing. Joints missing from a particular asset
//! variant resolve to empty slots and are skipped silently.

use bevy::log::warn;
use bevy::prelude::*;
use thiserror::Error;

use crate::config::CharacterController;
use crate::state::MovementState;

/// The joints the controller knows how to drive.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointId {
    LeftThigh,
    RightThigh,
    LeftFoot,
    RightFoot,
    LeftShoulder,
    RightShoulder,
    LeftLeg,
    RightLeg,
}

impl JointId {
    /// Number of joint slots.
    pub const COUNT: usize = 8;

    /// Every joint, in slot order.
    pub const ALL: [JointId; JointId::COUNT] = [
        JointId::LeftThigh,
        JointId::RightThigh,
        JointId::LeftFoot,
        JointId::RightFoot,
        JointId::LeftShoulder,
        JointId::RightShoulder,
        JointId::LeftLeg,
        JointId::RightLeg,
    ];

    /// The node name this joint is resolved from.
    pub fn node_name(self) -> &'static str {
        match self {
            JointId::LeftThigh => "LeftThigh",
            JointId::RightThigh => "RightThigh",
            JointId::LeftFoot => "LeftFoot",
            JointId::RightFoot => "RightFoot",
            JointId::LeftShoulder => "LeftShoulder",
            JointId::RightShoulder => "RightShoulder",
            JointId::LeftLeg => "LeftLeg",
            JointId::RightLeg => "RightLeg",
        }
    }

    /// Look up a joint by node name.
    pub fn from_node_name(name: &str) -> Option<JointId> {
        match name {
            "LeftThigh" => Some(JointId::LeftThigh),
            "RightThigh" => Some(JointId::RightThigh),
            "LeftFoot" => Some(JointId::LeftFoot),
            "RightFoot" => Some(JointId::RightFoot),
            "LeftShoulder" => Some(JointId::LeftShoulder),
            "RightShoulder" => Some(JointId::RightShoulder),
            "LeftLeg" => Some(JointId::LeftLeg),
            "RightLeg" => Some(JointId::RightLeg),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Failure to build a rig from a loaded hierarchy.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigResolveError {
    /// The hierarchy has descendants, but none carry a recognizable joint
    /// name. The asset is probably the wrong one.
    #[error("character hierarchy has no recognizable joints")]
    NoJoints,
}

/// Resolved joint table and rest pose for one character.
///
/// Built once when the asset hierarchy becomes available; immutable
/// afterward. Slots for joints the asset does not provide stay empty and
/// are skipped by the pose driver.
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct CharacterRig {
    joints: [Option<Entity>; JointId::COUNT],
    rest: [Quat; JointId::COUNT],
}

impl CharacterRig {
    /// Build a rig from resolved joints.
    ///
    /// Returns [`RigResolveError::NoJoints`] when nothing matched.
    pub fn from_joints(
        joints: impl IntoIterator<Item = (JointId, Entity, Quat)>,
    ) -> Result<Self, RigResolveError> {
        let mut rig = Self::default();
        let mut matched = 0;
        for (id, entity, rest) in joints {
            let slot = id.index();
            if rig.joints[slot].is_none() {
                matched += 1;
            }
            rig.joints[slot] = Some(entity);
            rig.rest[slot] = rest;
        }
        if matched == 0 {
            return Err(RigResolveError::NoJoints);
        }
        Ok(rig)
    }

    /// The entity behind a joint, if the asset provides it.
    pub fn joint(&self, id: JointId) -> Option<Entity> {
        self.joints[id.index()]
    }

    /// The captured rest rotation of a joint.
    ///
    /// Identity for joints the asset does not provide.
    pub fn rest_rotation(&self, id: JointId) -> Quat {
        self.rest[id.index()]
    }

    /// How many joints resolved.
    pub fn resolved_count(&self) -> usize {
        self.joints.iter().filter(|slot| slot.is_some()).count()
    }
}

/// Marker for characters whose rig cannot be resolved.
///
/// Inserted by the resolver after a reported failure, or by the loading
/// collaborator when the asset itself failed to load. The controller
/// stays disabled for the entity; no further resolution is attempted.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct RigUnavailable;

/// Resolve rigs for characters whose joint hierarchy has arrived.
///
/// Characters without children are still loading and are left alone. A
/// populated hierarchy that yields no recognizable joints is reported
/// once and marked [`RigUnavailable`].
pub fn resolve_character_rigs(
    mut commands: Commands,
    pending: Query<
        Entity,
        (
            With<CharacterController>,
            With<Children>,
            Without<CharacterRig>,
            Without<RigUnavailable>,
        ),
    >,
    children: Query<&Children>,
    names: Query<(&Name, &Transform)>,
) {
    for root in &pending {
        let mut found = Vec::new();
        collect_joints(root, &children, &names, &mut found);
        match CharacterRig::from_joints(found) {
            Ok(rig) => {
                commands.entity(root).insert(rig);
            }
            Err(err) => {
                warn!("character {root} rig disabled: {err}");
                commands.entity(root).insert(RigUnavailable);
            }
        }
    }
}

fn collect_joints(
    entity: Entity,
    children: &Query<&Children>,
    names: &Query<(&Name, &Transform)>,
    out: &mut Vec<(JointId, Entity, Quat)>,
) {
    let Ok(direct) = children.get(entity) else {
        return;
    };
    for slot in 0..direct.len() {
        let child = direct[slot];
        if let Ok((name, transform)) = names.get(child) {
            if let Some(id) = JointId::from_node_name(name.as_str()) {
                out.push((id, child, transform.rotation));
            }
        }
        collect_joints(child, children, names, out);
    }
}

/// Drop pending jump anticipation when a character's rig goes away.
///
/// The anticipation timer must never launch a jump against a destroyed or
/// reloading asset; losing the rig cancels the transition outright.
pub fn cancel_pending_jumps_on_rig_loss(
    mut removed: RemovedComponents<CharacterRig>,
    mut characters: Query<&mut CharacterController>,
) {
    for entity in removed.read() {
        if let Ok(mut controller) = characters.get_mut(entity) {
            if controller.movement_state.is_anticipating() {
                controller.movement_state = MovementState::Grounded;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_names_round_trip() {
        for id in JointId::ALL {
            assert_eq!(JointId::from_node_name(id.node_name()), Some(id));
        }
        assert_eq!(JointId::from_node_name("Pelvis"), None);
        assert_eq!(JointId::from_node_name(""), None);
    }

    #[test]
    fn rig_with_partial_joints_leaves_empty_slots() {
        let mut world = World::new();
        let thigh = world.spawn_empty().id();
        let foot = world.spawn_empty().id();

        let rig = CharacterRig::from_joints([
            (JointId::LeftThigh, thigh, Quat::from_rotation_z(0.3)),
            (JointId::LeftFoot, foot, Quat::IDENTITY),
        ])
        .unwrap();

        assert_eq!(rig.resolved_count(), 2);
        assert_eq!(rig.joint(JointId::LeftThigh), Some(thigh));
        assert_eq!(rig.joint(JointId::LeftFoot), Some(foot));
        assert_eq!(rig.joint(JointId::RightShoulder), None);
        assert_eq!(
            rig.rest_rotation(JointId::LeftThigh),
            Quat::from_rotation_z(0.3)
        );
        assert_eq!(rig.rest_rotation(JointId::RightShoulder), Quat::IDENTITY);
    }

    #[test]
    fn rig_without_matches_is_an_error() {
        let result = CharacterRig::from_joints([]);
        assert_eq!(result.unwrap_err(), RigResolveError::NoJoints);
    }

    #[test]
    fn duplicate_joint_names_keep_last_entity() {
        let mut world = World::new();
        let first = world.spawn_empty().id();
        let second = world.spawn_empty().id();

        let rig = CharacterRig::from_joints([
            (JointId::LeftLeg, first, Quat::IDENTITY),
            (JointId::LeftLeg, second, Quat::from_rotation_z(0.1)),
        ])
        .unwrap();

        assert_eq!(rig.resolved_count(), 1);
        assert_eq!(rig.joint(JointId::LeftLeg), Some(second));
    }
}
