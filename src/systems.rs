//! Core controller systems.
//!
//! These implement the locomotion state machine. Scene-dependent systems
//! are generic over the query backend and run as exclusive systems: they
//! snapshot the query results, consult the backend, then write the
//! committed state back.
//!
//! Every system here requires a resolved [`CharacterRig`], so a character
//! whose asset has not arrived is a no-op for the whole tick.

use bevy::prelude::*;

use crate::backend::SceneQueryBackend;
use crate::collision::{CharacterVolume, GeometrySet};
use crate::config::{
    approach_alpha, decay_factor, fixed_dt, world_fixed_dt, CharacterController, ControllerConfig,
};
use crate::gait::{airborne_offsets, crouch_offsets, stride_offsets, GaitMode};
use crate::intent::MovementIntent;
use crate::rig::{CharacterRig, JointId};
use crate::state::{Airborne, AnticipatingJump, Grounded, MovementState};

/// Remaining step-up distance below which the correction snaps closed.
const STEP_CONVERGED_EPS: f32 = 0.01;

/// Enter jump anticipation on an edge-triggered request while grounded.
///
/// Requests made in any other state are ignored, which also debounces a
/// held jump: nothing re-arms until a full cycle returns to grounded and
/// the action is pressed again.
pub fn begin_jump_anticipation(
    mut characters: Query<(&mut CharacterController, &MovementIntent), With<CharacterRig>>,
) {
    for (mut controller, intent) in &mut characters {
        if intent.has_jump_edge() && controller.movement_state.is_grounded() {
            controller.movement_state = MovementState::AnticipatingJump { elapsed: 0.0 };
        }
    }
}

/// Advance the anticipation timer and launch once it expires.
///
/// On launch: the jump impulse becomes the vertical velocity and the
/// position gets a small upward nudge so the crouch visually clears.
/// Gravity does not act until the following tick, so the launch velocity
/// holds for one full tick.
pub fn advance_jump_anticipation(
    time: Res<Time<Fixed>>,
    mut characters: Query<
        (&mut CharacterController, &ControllerConfig, &mut Transform),
        With<CharacterRig>,
    >,
) {
    let dt = fixed_dt(&time);
    for (mut controller, config, mut transform) in &mut characters {
        let MovementState::AnticipatingJump { elapsed } = controller.movement_state else {
            continue;
        };
        let elapsed = elapsed + dt;
        if elapsed >= config.anticipation_secs {
            controller.movement_state = MovementState::Airborne;
            controller.vertical_velocity = config.jump_impulse;
            transform.translation.y += config.jump_clearance;
        } else {
            controller.movement_state = MovementState::AnticipatingJump { elapsed };
        }
    }
}

/// Grounded steering: turning, the step probe, obstacle rejection and the
/// committed translation.
pub fn steer_grounded<B: SceneQueryBackend>(world: &mut World) {
    let dt = world_fixed_dt(world);

    let characters: Vec<(
        Entity,
        ControllerConfig,
        MovementIntent,
        CharacterVolume,
        CharacterController,
        Transform,
    )> = world
        .query_filtered::<(
            Entity,
            &ControllerConfig,
            &MovementIntent,
            &CharacterVolume,
            &CharacterController,
            &Transform,
        ), With<CharacterRig>>()
        .iter(world)
        .map(|(entity, config, intent, volume, controller, transform)| {
            (entity, *config, *intent, *volume, *controller, *transform)
        })
        .collect();

    for (entity, config, intent, volume, mut controller, mut transform) in characters {
        if !controller.movement_state.is_grounded() {
            continue;
        }

        let turn = intent.turn_axis();
        if turn != 0.0 {
            controller.yaw += turn * config.turn_rate * dt;
        }

        let axis = intent.walk_axis();
        if axis != 0.0 {
            // Heading-relative move direction, re-projected onto the
            // horizontal plane and re-normalized before scaling by speed.
            let mut direction = controller.facing() * (Vec3::NEG_Z * axis);
            direction.y = 0.0;
            let direction = direction.normalize_or_zero();

            if direction != Vec3::ZERO {
                let speed = config.speed(intent.sprint);
                let travel = speed * dt;

                // Probe along the move direction for steps and blockers.
                let origin = transform.translation + Vec3::Y * config.probe_lift;
                let hits = B::raycast(
                    world,
                    origin,
                    direction,
                    travel + config.probe_margin,
                    GeometrySet::All,
                );
                let mut blocked = false;
                match hits.first() {
                    Some(hit) => {
                        if hit.surface_top - transform.translation.y <= config.step_height {
                            controller.step_target =
                                Some(hit.surface_top + config.ground_offset);
                        } else {
                            blocked = true;
                        }
                    }
                    None => {
                        controller.step_target = None;
                    }
                }

                // Obstacle rejection always wins over step-up permission.
                let delta = direction * travel;
                let swept = volume.aabb_at(transform.translation + delta);
                let colliding = B::box_overlap(world, swept).is_some();

                if !blocked && !colliding {
                    transform.translation += delta;
                    if let Some(target) = controller.step_target {
                        let alpha = approach_alpha(config.step_smoothing, dt);
                        transform.translation.y += (target - transform.translation.y) * alpha;
                        if (target - transform.translation.y).abs() <= STEP_CONVERGED_EPS {
                            transform.translation.y = target;
                            controller.step_target = None;
                        }
                    }
                    // Baseline carried into the air if the ground is left
                    // next tick.
                    controller.air_inertia = direction * speed;
                }

                // The gait keeps running while blocked; the character
                // walks in place against the obstacle.
                controller.gait_mode = Some(if intent.sprint {
                    GaitMode::Sprint
                } else {
                    GaitMode::Walk
                });
                controller.gait_clock += dt;
            }
        } else {
            controller.gait_mode = None;
        }

        // The visible rotation eases toward the heading every tick.
        let blend = approach_alpha(config.turn_smoothing, dt);
        transform.rotation = transform.rotation.slerp(controller.facing(), blend);

        if let Some(mut stored) = world.get_mut::<Transform>(entity) {
            *stored = transform;
        }
        if let Some(mut stored) = world.get_mut::<CharacterController>(entity) {
            *stored = controller;
        }
    }
}

/// Terrain following: keep the character resting on the probed surface.
///
/// Runs after steering so it sees the post-step-up height; once a step-up
/// has converged the probe targets the same height and this becomes a
/// no-op. While grounded, gaps beyond the tolerance are a ledge and are
/// ignored. While airborne the probe only refreshes the landing height.
pub fn follow_terrain<B: SceneQueryBackend>(world: &mut World) {
    let dt = world_fixed_dt(world);

    let characters: Vec<(Entity, ControllerConfig, CharacterController, Transform)> = world
        .query_filtered::<(
            Entity,
            &ControllerConfig,
            &CharacterController,
            &Transform,
        ), With<CharacterRig>>()
        .iter(world)
        .map(|(entity, config, controller, transform)| (entity, *config, *controller, *transform))
        .collect();

    for (entity, config, mut controller, mut transform) in characters {
        let origin = transform.translation + Vec3::Y * config.terrain_probe_height;
        let hits = B::raycast(
            world,
            origin,
            Vec3::NEG_Y,
            config.terrain_probe_range,
            GeometrySet::Terrain,
        );
        let Some(hit) = hits.first() else {
            continue;
        };
        let target = hit.point.y + config.ground_offset;

        match controller.movement_state {
            MovementState::Grounded => {
                let gap = target - transform.translation.y;
                if gap.abs() <= config.follow_tolerance {
                    let alpha = approach_alpha(config.follow_smoothing, dt);
                    transform.translation.y += gap * alpha;
                    controller.rest_height = target;
                }
            }
            MovementState::Airborne => {
                controller.rest_height = target;
            }
            MovementState::AnticipatingJump { .. } => {}
        }

        if let Some(mut stored) = world.get_mut::<Transform>(entity) {
            *stored = transform;
        }
        if let Some(mut stored) = world.get_mut::<CharacterController>(entity) {
            *stored = controller;
        }
    }
}

/// Airborne integration: gravity, inertia carry and landing.
///
/// Gated on the [`Airborne`] marker, which trails the state change by one
/// tick, so a fresh launch keeps its full impulse for one tick before
/// gravity bites.
pub fn integrate_airborne(
    time: Res<Time<Fixed>>,
    mut characters: Query<
        (&mut CharacterController, &ControllerConfig, &mut Transform),
        (With<CharacterRig>, With<Airborne>),
    >,
) {
    let dt = fixed_dt(&time);
    for (mut controller, config, mut transform) in &mut characters {
        if !controller.movement_state.is_airborne() {
            continue;
        }

        controller.vertical_velocity += config.gravity * dt;
        transform.translation.y += controller.vertical_velocity * dt;

        // Horizontal carry-over, decaying toward rest.
        transform.translation += controller.air_inertia * dt;
        let damping = decay_factor(config.air_damping, dt);
        controller.air_inertia *= damping;

        if transform.translation.y <= controller.rest_height {
            transform.translation.y = controller.rest_height;
            controller.vertical_velocity = 0.0;
            controller.movement_state = MovementState::Grounded;
            controller.gait_mode = None;
        }
    }
}

/// Mirror the hub state onto the marker components.
pub fn sync_state_markers(
    mut commands: Commands,
    characters: Query<(
        Entity,
        &CharacterController,
        Has<Grounded>,
        Has<AnticipatingJump>,
        Has<Airborne>,
    )>,
) {
    for (entity, controller, has_grounded, has_anticipating, has_airborne) in &characters {
        match controller.movement_state {
            MovementState::Grounded => {
                if !has_grounded {
                    commands
                        .entity(entity)
                        .insert(Grounded)
                        .remove::<(AnticipatingJump, Airborne)>();
                }
            }
            MovementState::AnticipatingJump { .. } => {
                if !has_anticipating {
                    commands
                        .entity(entity)
                        .insert(AnticipatingJump)
                        .remove::<(Grounded, Airborne)>();
                }
            }
            MovementState::Airborne => {
                if !has_airborne {
                    commands
                        .entity(entity)
                        .insert(Airborne)
                        .remove::<(Grounded, AnticipatingJump)>();
                }
            }
        }
    }
}

/// Drive the rig from the current state: walk cycle, crouch, arm lift, or
/// the rest pose.
///
/// The full pose is written every tick, so each posture is idempotent and
/// idle restores every rest rotation verbatim.
pub fn apply_pose(
    characters: Query<(&CharacterController, &CharacterRig)>,
    mut joints: Query<&mut Transform, Without<CharacterController>>,
) {
    for (controller, rig) in &characters {
        match controller.movement_state {
            MovementState::AnticipatingJump { .. } => {
                set_pose(rig, &mut joints, &crouch_offsets());
            }
            MovementState::Airborne => {
                set_pose(rig, &mut joints, &airborne_offsets());
            }
            MovementState::Grounded => match controller.gait_mode {
                Some(mode) => {
                    set_pose(rig, &mut joints, &stride_offsets(controller.gait_clock, mode));
                }
                None => reset_idle_pose(rig, &mut joints),
            },
        }
    }
}

fn set_pose(
    rig: &CharacterRig,
    joints: &mut Query<&mut Transform, Without<CharacterController>>,
    offsets: &[(JointId, f32)],
) {
    reset_idle_pose(rig, joints);
    for &(id, angle) in offsets {
        let Some(entity) = rig.joint(id) else {
            continue;
        };
        if let Ok(mut transform) = joints.get_mut(entity) {
            transform.rotation = rig.rest_rotation(id) * Quat::from_rotation_z(angle);
        }
    }
}

fn reset_idle_pose(
    rig: &CharacterRig,
    joints: &mut Query<&mut Transform, Without<CharacterController>>,
) {
    for id in JointId::ALL {
        let Some(entity) = rig.joint(id) else {
            continue;
        };
        if let Ok(mut transform) = joints.get_mut(entity) {
            transform.rotation = rig.rest_rotation(id);
        }
    }
}
