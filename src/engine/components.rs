// Scene graph components.
// Static level geometry lives in the bevy_ecs world as obstacle entities;
// agents are entities carrying an `AgentController` (see agent.rs).

use bevy_ecs::prelude::*;
use glam::Vec2;

use super::geometry::{ObstacleSource, ShapeKind};

/// World-space position of an entity in the 2D scene
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Transform {
    pub position: Vec2,
}

impl Transform {
    pub fn from_position(position: Vec2) -> Self {
        Self { position }
    }
}

/// Editor visibility toggle. Hidden obstacles stay in the scene but are not
/// baked into the navigation mesh.
#[derive(Component, Debug, Clone, Copy)]
pub struct Visibility {
    pub visible: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self { visible: true }
    }
}

/// Collision shape attached to a static body.
#[derive(Component, Debug, Clone)]
pub struct StaticObstacle {
    pub shape: ShapeKind,
}

/// Monotonic spawn sequence number. Entity indices are recycled after a
/// despawn, so ordering uses this instead.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpawnOrder(pub u64);

#[derive(Resource, Default)]
struct SpawnCounter(u64);

/// Next sequence number of this world.
pub fn next_spawn_order(world: &mut World) -> SpawnOrder {
    let mut counter = world.get_resource_or_insert_with(SpawnCounter::default);
    let order = SpawnOrder(counter.0);
    counter.0 += 1;
    order
}

/// Spawn one static obstacle entity.
pub fn spawn_obstacle(world: &mut World, shape: ShapeKind, position: Vec2, visible: bool) -> Entity {
    let order = next_spawn_order(world);
    world
        .spawn((StaticObstacle { shape }, Transform::from_position(position), Visibility { visible }, order))
        .id()
}

/// Sort key for entities: `SpawnOrder` first, entities without one last.
pub fn spawn_sort_key(entity: Entity, order: Option<&SpawnOrder>) -> (u64, u32) {
    (order.map_or(u64::MAX, |o| o.0), entity.index())
}

/// Read every static obstacle of the scene graph, in spawn order.
/// Entities without a `Visibility` component count as visible.
pub fn collect_obstacle_sources(world: &mut World) -> Vec<ObstacleSource> {
    let mut query =
        world.query::<(Entity, &StaticObstacle, &Transform, Option<&Visibility>, Option<&SpawnOrder>)>();
    let mut found: Vec<((u64, u32), ObstacleSource)> = query
        .iter(world)
        .map(|(entity, obstacle, transform, visibility, order)| {
            let source = ObstacleSource {
                kind: obstacle.shape.clone(),
                position: transform.position,
                visible: visibility.is_none_or(|v| v.visible),
            };
            (spawn_sort_key(entity, order), source)
        })
        .collect();
    found.sort_by_key(|(key, _)| *key);
    found.into_iter().map(|(_, source)| source).collect()
}
