//! Procedural gait synthesis.
//!
//! The walk cycle is a pure function of accumulated walk time and speed
//! mode: thighs oscillate in antiphase, feet counter them a quarter cycle
//! off, arms swing against the legs at a fixed amplitude. Offsets compose
//! with the rig's rest rotations; they never replace them.

use std::f32::consts::PI;

use bevy::prelude::*;

use crate::rig::JointId;

/// Speed mode of the gait.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaitMode {
    Walk,
    Sprint,
}

impl GaitMode {
    /// Phase advance per second of walk time.
    pub fn frequency(self) -> f32 {
        match self {
            GaitMode::Walk => 6.0,
            GaitMode::Sprint => 10.5,
        }
    }

    /// Stride amplitude scale for the leg joints.
    pub fn stride_factor(self) -> f32 {
        match self {
            GaitMode::Walk => 0.4,
            GaitMode::Sprint => 0.7,
        }
    }
}

/// Peak thigh swing, radians, before the stride factor.
const THIGH_AMPLITUDE: f32 = 0.4;
/// Peak foot counter-rotation, radians, before the stride factor.
const FOOT_AMPLITUDE: f32 = 0.25;
/// Peak arm swing, radians. Independent of speed mode.
const ARM_AMPLITUDE: f32 = 0.6;

/// Pre-jump crouch rotation on the leg joints.
pub const CROUCH_ANGLE: f32 = -25.0 * (PI / 180.0);
/// Airborne lift rotation on the shoulder joints.
pub const ARM_LIFT_ANGLE: f32 = -30.0 * (PI / 180.0);

/// Joint rotation offsets for one tick of the walk cycle.
///
/// `clock` is accumulated walk time in seconds; it only advances while
/// the character translates, so the cycle pauses in place when movement
/// stops and resumes without a pop.
pub fn stride_offsets(clock: f32, mode: GaitMode) -> [(JointId, f32); 6] {
    let phase = clock * mode.frequency();
    let stride = mode.stride_factor();

    let leg_swing = phase.sin() * THIGH_AMPLITUDE * stride;
    let foot_lift = phase.cos() * FOOT_AMPLITUDE * stride;
    let arm_swing = phase.sin() * ARM_AMPLITUDE;

    [
        (JointId::LeftThigh, leg_swing),
        (JointId::RightThigh, -leg_swing),
        (JointId::LeftFoot, -foot_lift),
        (JointId::RightFoot, foot_lift),
        (JointId::LeftShoulder, -arm_swing),
        (JointId::RightShoulder, arm_swing),
    ]
}

/// Crouch posture held while anticipating a jump.
pub fn crouch_offsets() -> [(JointId, f32); 2] {
    [
        (JointId::LeftLeg, CROUCH_ANGLE),
        (JointId::RightLeg, CROUCH_ANGLE),
    ]
}

/// Arm-lift silhouette held while airborne.
pub fn airborne_offsets() -> [(JointId, f32); 2] {
    [
        (JointId::LeftShoulder, ARM_LIFT_ANGLE),
        (JointId::RightShoulder, ARM_LIFT_ANGLE),
    ]
}
