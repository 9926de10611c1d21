//! Query result structures.
//!
//! These structures carry the results of scene queries (raycasts and box
//! overlap tests) between the backend and the controller systems, plus the
//! character's own collision volume.

use bevy::math::bounding::Aabb3d;
use bevy::prelude::*;

/// Which part of the static scene a query runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeometrySet {
    /// Obstacle volumes only.
    Obstacles,
    /// Terrain tiles only.
    Terrain,
    /// Obstacles and terrain together.
    #[default]
    All,
}

impl GeometrySet {
    /// Whether obstacle volumes are part of this set.
    pub fn includes_obstacles(self) -> bool {
        matches!(self, GeometrySet::Obstacles | GeometrySet::All)
    }

    /// Whether terrain tiles are part of this set.
    pub fn includes_terrain(self) -> bool {
        matches!(self, GeometrySet::Terrain | GeometrySet::All)
    }
}

/// A single ray intersection.
///
/// Backends return these ordered nearest-first. `surface_top` is the
/// world-space top of the volume that was hit; the step probe compares it
/// against the waist threshold to decide whether the hit is climbable,
/// since the hit point of a horizontal ray carries no usable height.
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    /// Distance from the ray origin to the hit point.
    pub distance: f32,
    /// World position of the hit point.
    pub point: Vec3,
    /// Entity that was hit.
    pub entity: Entity,
    /// World-space top of the hit volume.
    pub surface_top: f32,
}

impl RayHit {
    /// Create a hit result.
    pub fn new(distance: f32, point: Vec3, entity: Entity, surface_top: f32) -> Self {
        Self {
            distance,
            point,
            entity,
            surface_top,
        }
    }
}

/// The character's collision volume, as a local axis-aligned box.
///
/// Resolved once at spawn. The world-space box used for obstacle rejection
/// is this box re-centered on the candidate translation, so a prospective
/// move can be tested before it is committed.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct CharacterVolume {
    /// Half-extents of the box on each axis.
    pub half_extents: Vec3,
    /// Offset of the box center from the entity translation.
    pub offset: Vec3,
}

impl Default for CharacterVolume {
    fn default() -> Self {
        Self {
            half_extents: Vec3::new(0.5, 0.9, 0.5),
            offset: Vec3::new(0.0, 0.5, 0.0),
        }
    }
}

impl CharacterVolume {
    /// Create a volume with the given half-extents, centered on the entity.
    pub fn new(half_extents: Vec3) -> Self {
        Self {
            half_extents,
            offset: Vec3::ZERO,
        }
    }

    /// Offset the box center from the entity translation.
    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    /// The world-space box for a character at `translation`.
    pub fn aabb_at(&self, translation: Vec3) -> Aabb3d {
        let center = translation + self.offset;
        Aabb3d {
            min: (center - self.half_extents).into(),
            max: (center + self.half_extents).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_set_membership() {
        assert!(GeometrySet::All.includes_obstacles());
        assert!(GeometrySet::All.includes_terrain());
        assert!(GeometrySet::Obstacles.includes_obstacles());
        assert!(!GeometrySet::Obstacles.includes_terrain());
        assert!(GeometrySet::Terrain.includes_terrain());
        assert!(!GeometrySet::Terrain.includes_obstacles());
    }

    #[test]
    fn ray_hit_new() {
        let mut world = World::new();
        let entity = world.spawn_empty().id();
        let hit = RayHit::new(2.5, Vec3::new(0.0, 1.0, -2.5), entity, 1.5);

        assert_eq!(hit.distance, 2.5);
        assert_eq!(hit.point, Vec3::new(0.0, 1.0, -2.5));
        assert_eq!(hit.entity, entity);
        assert_eq!(hit.surface_top, 1.5);
    }

    #[test]
    fn volume_world_box_follows_translation() {
        let volume = CharacterVolume::new(Vec3::new(0.5, 1.0, 0.5)).with_offset(Vec3::Y);
        let aabb = volume.aabb_at(Vec3::new(2.0, 0.0, -3.0));

        assert_eq!(Vec3::from(aabb.min), Vec3::new(1.5, 0.0, -3.5));
        assert_eq!(Vec3::from(aabb.max), Vec3::new(2.5, 2.0, -2.5));
    }
}
