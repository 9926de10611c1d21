//! Scene query backend abstraction.
//!
//! This module defines the trait a scene backend must implement to work
//! with the character controller. The controller itself never walks scene
//! geometry; it asks the backend for distance-ordered ray intersections
//! and box overlap results, so the geometry source can be swapped (the
//! built-in static volume index, a spatial hash, a physics engine, etc.).

use bevy::math::bounding::Aabb3d;
use bevy::prelude::*;

use crate::collision::{GeometrySet, RayHit};

/// Trait for scene query backend implementations.
///
/// Implement this trait to let the controller query a different geometry
/// source. The crate ships [`StaticSceneBackend`](crate::scene::StaticSceneBackend),
/// which answers queries from [`ObstacleVolume`](crate::scene::ObstacleVolume)
/// and [`TerrainTile`](crate::scene::TerrainTile) components.
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
pub trait SceneQueryBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    ///
    /// Added automatically by `CharacterControllerPlugin`; do not add it a
    /// second time.
    fn plugin() -> impl Plugin;

    /// Cast a ray and return every intersection with the selected geometry,
    /// ordered nearest-first.
    ///
    /// # Arguments
    /// * `world` - The ECS world for queries
    /// * `origin` - Ray origin in world space
    /// * `direction` - Cast direction (normalized internally; a zero vector
    ///   yields no hits)
    /// * `max_distance` - Maximum cast distance
    /// * `set` - Which geometry to test against
    fn raycast(
        world: &World,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        set: GeometrySet,
    ) -> Vec<RayHit>;

    /// Test a world-space box against every obstacle volume.
    ///
    /// Returns the first obstacle whose box touches or overlaps `volume`.
    /// The test is exact; touching counts as a collision.
    fn box_overlap(world: &World, volume: Aabb3d) -> Option<Entity>;
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}
