//! # `strut_character_controller`
//!
//! A 3D third-person character controller with a procedural walk cycle
//! and a trailing camera.
//!
//! This crate drives one articulated character over uneven, obstacle-laden
//! terrain from a logical input snapshot:
//! - A small locomotion state machine (grounded, anticipating-jump,
//!   airborne) with Euler-integrated vertical motion and damped horizontal
//!   inertia carry while airborne
//! - Raycast terrain following and step-up over small rises
//! - Axis-aligned bounding-box rejection against static obstacles
//! - A procedural gait that offsets the rig's rest pose, plus crouch and
//!   arm-lift postures for the jump phases
//! - A smoothed trailing camera that can lead while backing up
//!
//! Rendering, asset loading and raw input stay outside: the controller
//! consumes a [`MovementIntent`](intent::MovementIntent) snapshot, resolves
//! its rig from named descendants once they exist, and queries scene
//! geometry through a swappable backend.
//!
//! ## Architecture
//!
//! Scene queries go through the [`SceneQueryBackend`](backend::SceneQueryBackend)
//! trait. The built-in [`StaticSceneBackend`](scene::StaticSceneBackend)
//! answers them from [`ObstacleVolume`](scene::ObstacleVolume) and
//! [`TerrainTile`](scene::TerrainTile) components via a per-tick index.
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use strut_character_controller::prelude::*;
//!
//! App::new()
//!     .add_plugins(MinimalPlugins)
//!     .add_plugins(CharacterControllerPlugin::<StaticSceneBackend>::default());
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod camera;
pub mod collision;
pub mod config;
pub mod gait;
pub mod intent;
pub mod rig;
pub mod scene;
pub mod state;
pub mod systems;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::{NoOpBackendPlugin, SceneQueryBackend};
    pub use crate::camera::CameraRig;
    pub use crate::collision::{CharacterVolume, GeometrySet, RayHit};
    pub use crate::config::{
        approach_alpha, decay_factor, CharacterController, ControllerConfig, REFERENCE_DT,
    };
    pub use crate::gait::GaitMode;
    pub use crate::intent::MovementIntent;
    pub use crate::rig::{CharacterRig, JointId, RigResolveError, RigUnavailable};
    pub use crate::scene::{
        ObstacleVolume, SceneIndex, StaticSceneBackend, StaticScenePlugin, TerrainTile,
    };
    pub use crate::state::{Airborne, AnticipatingJump, Grounded, MovementState};
    pub use crate::{CharacterControllerPlugin, ControllerSet};
}

/// System sets of one controller tick, run in declaration order.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerSet {
    /// Scene index refresh (backend bookkeeping).
    Probe,
    /// Input buffering, rig resolution, cancellation on rig loss.
    Intent,
    /// The locomotion state machine: anticipation, steering.
    Locomotion,
    /// Terrain following and airborne integration.
    Terrain,
    /// Marker component mirroring.
    State,
    /// Pose application onto the rig.
    Pose,
    /// Camera rig update.
    Camera,
}

/// Main plugin for the character controller.
///
/// Generic over a scene query backend `B`, whose own plugin is added
/// automatically. All controller systems run in `FixedUpdate`.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use strut_character_controller::prelude::*;
///
/// App::new()
///     .add_plugins(MinimalPlugins)
///     .add_plugins(CharacterControllerPlugin::<StaticSceneBackend>::default());
/// ```
pub struct CharacterControllerPlugin<B: backend::SceneQueryBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::SceneQueryBackend> Default for CharacterControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::SceneQueryBackend> Plugin for CharacterControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<collision::CharacterVolume>();
        app.register_type::<config::CharacterController>();
        app.register_type::<config::ControllerConfig>();
        app.register_type::<intent::MovementIntent>();
        app.register_type::<rig::CharacterRig>();
        app.register_type::<rig::RigUnavailable>();
        app.register_type::<state::MovementState>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::AnticipatingJump>();
        app.register_type::<state::Airborne>();
        app.register_type::<gait::GaitMode>();
        app.register_type::<camera::CameraRig>();

        // Add the scene query backend plugin
        app.add_plugins(B::plugin());

        app.configure_sets(
            FixedUpdate,
            (
                ControllerSet::Probe,
                ControllerSet::Intent,
                ControllerSet::Locomotion,
                ControllerSet::Terrain,
                ControllerSet::State,
                ControllerSet::Pose,
                ControllerSet::Camera,
            )
                .chain(),
        );

        app.add_systems(
            FixedUpdate,
            (
                rig::cancel_pending_jumps_on_rig_loss,
                intent::buffer_jump_intents,
                rig::resolve_character_rigs,
            )
                .chain()
                .in_set(ControllerSet::Intent),
        );
        app.add_systems(
            FixedUpdate,
            (
                systems::begin_jump_anticipation,
                systems::advance_jump_anticipation,
                systems::steer_grounded::<B>,
            )
                .chain()
                .in_set(ControllerSet::Locomotion),
        );
        app.add_systems(
            FixedUpdate,
            (systems::follow_terrain::<B>, systems::integrate_airborne)
                .chain()
                .in_set(ControllerSet::Terrain),
        );
        app.add_systems(
            FixedUpdate,
            systems::sync_state_markers.in_set(ControllerSet::State),
        );
        app.add_systems(FixedUpdate, systems::apply_pose.in_set(ControllerSet::Pose));
        app.add_systems(
            FixedUpdate,
            camera::follow_camera.in_set(ControllerSet::Camera),
        );
    }
}
