//! Static scene geometry and the built-in query backend.
//!
//! Obstacles and terrain are registered as world-space axis-aligned
//! volumes. A small index resource is rebuilt once per tick ahead of the
//! controller sets, so backend queries never walk entity storage; they
//! scan the index, which also lets tiled terrain answer a single ray with
//! hits aggregated across every tile.

use bevy::math::bounding::{Aabb3d, IntersectsVolume, RayCast3d};
use bevy::prelude::*;

use crate::backend::SceneQueryBackend;
use crate::collision::{GeometrySet, RayHit};
use crate::ControllerSet;

/// A static obstacle collider, as a world-space axis-aligned box.
///
/// Obstacles hard-block the character: movement is rejected whenever the
/// character's translated box would touch one. Read-only after scene
/// construction.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct ObstacleVolume {
    /// Minimum corner in world space.
    pub min: Vec3,
    /// Maximum corner in world space.
    pub max: Vec3,
}

impl ObstacleVolume {
    /// Create an obstacle from world-space corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an obstacle from a center and a full size.
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// The obstacle box as a bounding volume.
    pub fn aabb(&self) -> Aabb3d {
        Aabb3d {
            min: self.min.into(),
            max: self.max.into(),
        }
    }
}

/// One walkable terrain patch, as a world-space axis-aligned box.
///
/// A terrain surface may be any number of tiles; ray queries aggregate
/// hits across all of them. Unlike obstacles, terrain never hard-blocks:
/// tiles rising less than the step threshold are climbed, taller ones
/// block through the step probe.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct TerrainTile {
    /// Minimum corner in world space.
    pub min: Vec3,
    /// Maximum corner in world space.
    pub max: Vec3,
}

impl TerrainTile {
    /// Create a tile from world-space corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create a tile from a center and a full size.
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// The tile box as a bounding volume.
    pub fn aabb(&self) -> Aabb3d {
        Aabb3d {
            min: self.min.into(),
            max: self.max.into(),
        }
    }
}

/// Flat index of scene volumes, rebuilt once per tick.
#[derive(Resource, Default)]
pub struct SceneIndex {
    pub(crate) obstacles: Vec<(Entity, Aabb3d)>,
    pub(crate) terrain: Vec<(Entity, Aabb3d)>,
}

impl SceneIndex {
    /// Number of indexed obstacle volumes.
    pub fn obstacle_count(&self) -> usize {
        self.obstacles.len()
    }

    /// Number of indexed terrain tiles.
    pub fn terrain_count(&self) -> usize {
        self.terrain.len()
    }
}

/// Rebuild the volume index from the current scene entities.
pub fn refresh_scene_index(
    mut index: ResMut<SceneIndex>,
    obstacles: Query<(Entity, &ObstacleVolume)>,
    terrain: Query<(Entity, &TerrainTile)>,
) {
    index.obstacles.clear();
    index.terrain.clear();
    for (entity, volume) in &obstacles {
        index.obstacles.push((entity, volume.aabb()));
    }
    for (entity, tile) in &terrain {
        index.terrain.push((entity, tile.aabb()));
    }
}

fn cast_against(
    hits: &mut Vec<RayHit>,
    volumes: &[(Entity, Aabb3d)],
    ray: &RayCast3d,
    origin: Vec3,
    direction: Vec3,
) {
    for (entity, aabb) in volumes {
        if let Some(distance) = ray.aabb_intersection_at(aabb) {
            hits.push(RayHit::new(
                distance,
                origin + direction * distance,
                *entity,
                aabb.max.y,
            ));
        }
    }
}

/// Backend answering queries from [`ObstacleVolume`] and [`TerrainTile`]
/// components through the per-tick [`SceneIndex`].
pub struct StaticSceneBackend;

impl SceneQueryBackend for StaticSceneBackend {
    fn plugin() -> impl Plugin {
        StaticScenePlugin
    }

    fn raycast(
        world: &World,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        set: GeometrySet,
    ) -> Vec<RayHit> {
        let Ok(direction) = Dir3::new(direction) else {
            return Vec::new();
        };
        let Some(index) = world.get_resource::<SceneIndex>() else {
            return Vec::new();
        };

        let ray = RayCast3d::from_ray(Ray3d { origin, direction }, max_distance);
        let direction = *direction;
        let mut hits = Vec::new();
        if set.includes_obstacles() {
            cast_against(&mut hits, &index.obstacles, &ray, origin, direction);
        }
        if set.includes_terrain() {
            cast_against(&mut hits, &index.terrain, &ray, origin, direction);
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    fn box_overlap(world: &World, volume: Aabb3d) -> Option<Entity> {
        let index = world.get_resource::<SceneIndex>()?;
        index
            .obstacles
            .iter()
            .find(|(_, aabb)| aabb.intersects(&volume))
            .map(|(entity, _)| *entity)
    }
}

/// Sets up the [`SceneIndex`] and its refresh system.
pub struct StaticScenePlugin;

impl Plugin for StaticScenePlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<ObstacleVolume>();
        app.register_type::<TerrainTile>();
        app.init_resource::<SceneIndex>();
        app.add_systems(
            FixedUpdate,
            refresh_scene_index.in_set(ControllerSet::Probe),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with_index(
        obstacles: &[Aabb3d],
        terrain: &[Aabb3d],
    ) -> (World, Vec<Entity>, Vec<Entity>) {
        let mut world = World::new();
        let mut index = SceneIndex::default();
        let mut obstacle_ids = Vec::new();
        let mut terrain_ids = Vec::new();
        for aabb in obstacles {
            let entity = world.spawn_empty().id();
            index.obstacles.push((entity, *aabb));
            obstacle_ids.push(entity);
        }
        for aabb in terrain {
            let entity = world.spawn_empty().id();
            index.terrain.push((entity, *aabb));
            terrain_ids.push(entity);
        }
        world.insert_resource(index);
        (world, obstacle_ids, terrain_ids)
    }

    fn aabb(min: Vec3, max: Vec3) -> Aabb3d {
        Aabb3d {
            min: min.into(),
            max: max.into(),
        }
    }

    #[test]
    fn raycast_orders_hits_across_tiles() {
        let near = aabb(Vec3::new(-1.0, -1.0, -4.0), Vec3::new(1.0, 1.0, -3.0));
        let far = aabb(Vec3::new(-1.0, -1.0, -8.0), Vec3::new(1.0, 1.0, -7.0));
        // Deliberately indexed far-first.
        let (world, _, terrain_ids) = world_with_index(&[], &[far, near]);

        let hits = StaticSceneBackend::raycast(
            &world,
            Vec3::ZERO,
            Vec3::NEG_Z,
            20.0,
            GeometrySet::Terrain,
        );

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].entity, terrain_ids[1]);
        assert_eq!(hits[1].entity, terrain_ids[0]);
        assert!(hits[0].distance < hits[1].distance);
        assert!((hits[0].distance - 3.0).abs() < 1.0e-4);
    }

    #[test]
    fn raycast_respects_geometry_set() {
        let obstacle = aabb(Vec3::new(-1.0, -1.0, -3.0), Vec3::new(1.0, 1.0, -2.0));
        let tile = aabb(Vec3::new(-1.0, -1.0, -6.0), Vec3::new(1.0, 1.0, -5.0));
        let (world, obstacle_ids, terrain_ids) = world_with_index(&[obstacle], &[tile]);

        let only_terrain = StaticSceneBackend::raycast(
            &world,
            Vec3::ZERO,
            Vec3::NEG_Z,
            20.0,
            GeometrySet::Terrain,
        );
        assert_eq!(only_terrain.len(), 1);
        assert_eq!(only_terrain[0].entity, terrain_ids[0]);

        let both =
            StaticSceneBackend::raycast(&world, Vec3::ZERO, Vec3::NEG_Z, 20.0, GeometrySet::All);
        assert_eq!(both.len(), 2);
        assert_eq!(both[0].entity, obstacle_ids[0]);
    }

    #[test]
    fn raycast_misses_beyond_max_distance() {
        let tile = aabb(Vec3::new(-1.0, -1.0, -10.0), Vec3::new(1.0, 1.0, -9.0));
        let (world, _, _) = world_with_index(&[], &[tile]);

        let hits =
            StaticSceneBackend::raycast(&world, Vec3::ZERO, Vec3::NEG_Z, 5.0, GeometrySet::All);
        assert!(hits.is_empty());
    }

    #[test]
    fn raycast_zero_direction_yields_nothing() {
        let tile = aabb(Vec3::new(-1.0, -1.0, -3.0), Vec3::new(1.0, 1.0, -2.0));
        let (world, _, _) = world_with_index(&[], &[tile]);

        let hits =
            StaticSceneBackend::raycast(&world, Vec3::ZERO, Vec3::ZERO, 5.0, GeometrySet::All);
        assert!(hits.is_empty());
    }

    #[test]
    fn raycast_reports_surface_top() {
        let tile = aabb(Vec3::new(-5.0, -0.6, -5.0), Vec3::new(5.0, -0.4, 5.0));
        let (world, _, _) = world_with_index(&[], &[tile]);

        let hits = StaticSceneBackend::raycast(
            &world,
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::NEG_Y,
            60.0,
            GeometrySet::Terrain,
        );
        assert_eq!(hits.len(), 1);
        assert!((hits[0].surface_top - (-0.4)).abs() < 1.0e-6);
        assert!((hits[0].point.y - (-0.4)).abs() < 1.0e-4);
    }

    #[test]
    fn box_overlap_is_exact_and_reproducible() {
        let obstacle = aabb(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let (world, obstacle_ids, _) = world_with_index(&[obstacle], &[]);

        // Touching faces count as a collision.
        let touching = aabb(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        assert_eq!(
            StaticSceneBackend::box_overlap(&world, touching),
            Some(obstacle_ids[0])
        );
        // Identical input, identical result.
        assert_eq!(
            StaticSceneBackend::box_overlap(&world, touching),
            Some(obstacle_ids[0])
        );

        let separated = aabb(Vec3::new(1.1, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        assert_eq!(StaticSceneBackend::box_overlap(&world, separated), None);
    }

    #[test]
    fn box_overlap_ignores_terrain() {
        let tile = aabb(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let (world, _, _) = world_with_index(&[], &[tile]);

        let query = aabb(Vec3::new(0.5, 0.5, 0.5), Vec3::new(1.5, 1.5, 1.5));
        assert_eq!(StaticSceneBackend::box_overlap(&world, query), None);
    }
}
