// Scene orchestration.
// `SceneCoordinator` owns the navigation mesh and answers path requests;
// `Scene` owns the bevy_ecs world the agents live in.

use std::sync::Arc;

use bevy_ecs::prelude::*;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use super::agent::{AgentBuilder, AgentConfig, AgentController, PathPlanner};
use super::components::{SpawnOrder, collect_obstacle_sources, next_spawn_order, spawn_sort_key};
use super::config::SceneConfig;
use super::error::{SceneError, SceneResult};
use super::geometry::{self, ObstacleSource, Polygon};
use super::navmesh::{NavMeshFacade, NavMeshLibrary};
use super::render::{Color, RenderSink};
use super::systems::{Drawable, agent_draw_system, agent_tick_system};

const NAVMESH_ALPHA: f32 = 0.7;

const NAVMESH_PALETTE: [Color; 10] = [
    Color::YELLOW,
    Color::GREEN,
    Color::AQUA,
    Color::BLUE,
    Color::PURPLE,
    Color::PINK,
    Color::ORANGE,
    Color::GOLD,
    Color::DARK_CYAN,
    Color::DARK_ORANGE,
];

// ============================================================================
// COORDINATOR
// ============================================================================

/// Owns the built mesh for the lifetime of the scene. Agents reach it only
/// through `PathPlanner`.
#[derive(Debug)]
pub struct SceneCoordinator {
    navmesh: NavMeshFacade,
    /// Host-space mesh polygons, read once; the mesh never changes.
    polygons: Vec<Polygon>,
    viewport: Vec2,
    overlay_seed: u64,
}

impl SceneCoordinator {
    /// Extract obstacle polygons and build the mesh. Both steps are fatal on
    /// failure.
    pub fn build<L: NavMeshLibrary>(
        config: &SceneConfig,
        sources: &[ObstacleSource],
        library: &L,
    ) -> SceneResult<Self> {
        let obstacles = geometry::extract(sources)?;
        log::info!("extracted {} obstacle polygons from {} sources", obstacles.len(), sources.len());

        let navmesh = NavMeshFacade::build(library, &config.bounds_polygon(), &obstacles, config.agent_radius)?;
        let polygons = navmesh.polygons();
        log::info!("navigation mesh built: {} polygons", polygons.len());

        Ok(Self {
            navmesh,
            polygons,
            viewport: config.viewport_size(),
            overlay_seed: config.overlay_seed,
        })
    }

    pub fn navmesh(&self) -> &NavMeshFacade {
        &self.navmesh
    }

    pub fn navmesh_polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn nearest_point(&self, query: Vec2) -> Vec2 {
        self.navmesh.nearest_point(query)
    }

    /// Path between two points, both clamped onto the mesh.
    pub fn request_path(&self, start: Vec2, end: Vec2) -> Vec<Vec2> {
        let path = self.navmesh.find_path(start, end, true);
        log::debug!("path {} -> {}: {} waypoints", start, end, path.len());
        path
    }

    /// Uniform sample of the viewport, moved onto the mesh.
    pub fn spawn_position(&self, rng: &mut impl Rng) -> Vec2 {
        let sample = Vec2::new(
            rng.gen_range(0.0..1.0f32) * self.viewport.x,
            rng.gen_range(0.0..1.0f32) * self.viewport.y,
        );
        self.nearest_point(sample)
    }
}

impl PathPlanner for SceneCoordinator {
    fn request_path(&self, start: Vec2, end: Vec2) -> Vec<Vec2> {
        SceneCoordinator::request_path(self, start, end)
    }

    fn viewport(&self) -> Vec2 {
        self.viewport
    }
}

/// Navmesh overlay. Reseeding every frame keeps each polygon's colour
/// stable.
impl Drawable for SceneCoordinator {
    fn draw(&self, sink: &mut dyn RenderSink) {
        let mut rng = StdRng::seed_from_u64(self.overlay_seed);
        for polygon in &self.polygons {
            let color = NAVMESH_PALETTE[rng.gen_range(0..NAVMESH_PALETTE.len())].with_alpha(NAVMESH_ALPHA);
            sink.draw_filled_polygon(polygon.points(), color);
        }
    }
}

// ============================================================================
// SCENE
// ============================================================================

pub struct Scene {
    world: World,
    coordinator: Arc<SceneCoordinator>,
    agent_config: AgentConfig,
    spawn_rng: StdRng,
    show_navmesh_polygons: bool,
}

impl Scene {
    /// Build a world from the scene description and start it.
    pub fn from_config<L: NavMeshLibrary>(config: &SceneConfig, library: &L) -> SceneResult<Self> {
        let mut world = World::new();
        config.spawn_obstacles(&mut world);
        Self::start(config, world, library)
    }

    /// Read the static obstacles of `world`, build the mesh and spawn
    /// `agent_count` agents on it.
    pub fn start<L: NavMeshLibrary>(config: &SceneConfig, mut world: World, library: &L) -> SceneResult<Self> {
        let sources = collect_obstacle_sources(&mut world);
        let coordinator = Arc::new(SceneCoordinator::build(config, &sources, library)?);

        let spawn_rng = match config.spawn_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut scene = Self {
            world,
            coordinator,
            agent_config: config.agent_config(),
            spawn_rng,
            show_navmesh_polygons: config.show_navmesh_polygons,
        };

        for _ in 0..config.agent_count {
            let position = scene.coordinator.spawn_position(&mut scene.spawn_rng);
            scene.spawn_agent(position);
        }
        log::info!("spawned {} agents", scene.agent_count());
        Ok(scene)
    }

    pub fn coordinator(&self) -> &Arc<SceneCoordinator> {
        &self.coordinator
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Spawn one agent wired to this scene's coordinator.
    pub fn spawn_agent(&mut self, position: Vec2) -> Option<Entity> {
        let planner: Arc<dyn PathPlanner> = self.coordinator.clone();
        let builder = AgentBuilder::new(position)
            .config(self.agent_config)
            .planner(planner)
            .seed(self.spawn_rng.next_u64());
        self.insert_agent(builder)
    }

    /// Build and insert an agent. A failed build is logged and skipped.
    pub fn insert_agent(&mut self, builder: AgentBuilder) -> Option<Entity> {
        match builder.build() {
            Ok(agent) => {
                let order = next_spawn_order(&mut self.world);
                Some(self.world.spawn((agent, order)).id())
            }
            Err(SceneError::MissingCollaborator(what)) => {
                log::error!("agent not spawned: missing {what}");
                None
            }
            Err(e) => {
                log::error!("agent not spawned: {e}");
                None
            }
        }
    }

    /// Returns false if `entity` was not alive.
    pub fn despawn_agent(&mut self, entity: Entity) -> bool {
        self.world.despawn(entity)
    }

    pub fn agent_count(&mut self) -> usize {
        self.world.query::<&AgentController>().iter(&self.world).count()
    }

    /// Agent positions in spawn order.
    pub fn agent_positions(&mut self) -> Vec<Vec2> {
        let mut agents: Vec<((u64, u32), Vec2)> = self
            .world
            .query::<(Entity, &AgentController, Option<&SpawnOrder>)>()
            .iter(&self.world)
            .map(|(entity, agent, order)| (spawn_sort_key(entity, order), agent.position()))
            .collect();
        agents.sort_by_key(|(key, _)| *key);
        agents.into_iter().map(|(_, position)| position).collect()
    }

    pub fn show_navmesh_polygons(&self) -> bool {
        self.show_navmesh_polygons
    }

    pub fn set_show_navmesh_polygons(&mut self, show: bool) {
        self.show_navmesh_polygons = show;
    }

    pub fn show_agent_paths(&self) -> bool {
        self.agent_config.show_path
    }

    /// Applies to live agents and to agents spawned later.
    pub fn set_show_agent_paths(&mut self, show: bool) {
        self.agent_config.show_path = show;
        let mut query = self.world.query::<&mut AgentController>();
        for mut agent in query.iter_mut(&mut self.world) {
            agent.set_show_path(show);
        }
    }

    pub fn tick(&mut self, delta_time: f32) {
        agent_tick_system(&mut self.world, delta_time);
    }

    /// Navmesh overlay first, agents on top.
    pub fn draw(&mut self, sink: &mut dyn RenderSink) {
        if self.show_navmesh_polygons {
            self.coordinator.draw(sink);
        }
        agent_draw_system(&mut self.world, sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::components::spawn_obstacle;
    use crate::engine::config::Point;
    use crate::engine::error::MeshBuildError;
    use crate::engine::geometry::ShapeKind;
    use crate::engine::navigation::PolyanyaLibrary;
    use crate::engine::render::DrawList;

    fn small_config(agent_count: usize) -> SceneConfig {
        SceneConfig {
            bounds: vec![
                Point { x: 0.0, y: 0.0 },
                Point { x: 320.0, y: 0.0 },
                Point { x: 320.0, y: 240.0 },
                Point { x: 0.0, y: 240.0 },
            ],
            viewport: Point { x: 320.0, y: 240.0 },
            agent_radius: 8.0,
            agent_count,
            spawn_seed: Some(7),
            ..Default::default()
        }
    }

    fn world_with_block() -> World {
        let mut world = World::new();
        spawn_obstacle(
            &mut world,
            ShapeKind::Rectangle { half_extents: Vec2::new(40.0, 40.0) },
            Vec2::new(160.0, 120.0),
            true,
        );
        world
    }

    #[test]
    fn spawns_requested_agents_on_the_mesh() {
        let mut scene = Scene::start(&small_config(12), world_with_block(), &PolyanyaLibrary).unwrap();
        assert_eq!(scene.agent_count(), 12);

        let coordinator = scene.coordinator().clone();
        for position in scene.agent_positions() {
            assert_eq!(coordinator.nearest_point(position), position);
        }
    }

    #[test]
    fn zero_agents_is_a_valid_scene() {
        let mut scene = Scene::start(&small_config(0), world_with_block(), &PolyanyaLibrary).unwrap();
        assert_eq!(scene.agent_count(), 0);
    }

    #[test]
    fn path_requests_go_around_the_block() {
        let coordinator =
            SceneCoordinator::build(&small_config(0), &collect_obstacle_sources(&mut world_with_block()), &PolyanyaLibrary)
                .unwrap();
        let start = Vec2::new(60.0, 124.0);
        let end = Vec2::new(260.0, 124.0);
        let path = coordinator.request_path(start, end);

        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&end));
        assert!(path.len() > 2, "straight line crosses the block");
        for p in &path {
            assert!(!(p.x > 120.0 && p.x < 200.0 && p.y > 80.0 && p.y < 160.0), "{p} inside block");
        }
    }

    #[test]
    fn off_mesh_endpoints_are_clamped() {
        let coordinator =
            SceneCoordinator::build(&small_config(0), &[], &PolyanyaLibrary).unwrap();
        let path = coordinator.request_path(Vec2::new(-50.0, 20.0), Vec2::new(200.0, 20.0));
        assert!(!path.is_empty());
        assert!(path[0].x >= 0.0);
        assert_eq!(coordinator.nearest_point(path[0]), path[0]);
    }

    #[test]
    fn unsupported_shape_aborts_startup() {
        let mut world = world_with_block();
        spawn_obstacle(&mut world, ShapeKind::Circle { radius: 10.0 }, Vec2::new(40.0, 40.0), true);
        let result = Scene::start(&small_config(3), world, &PolyanyaLibrary);
        assert!(matches!(result, Err(SceneError::UnsupportedShapeKind("circle"))));
    }

    #[test]
    fn hidden_unsupported_shape_is_ignored() {
        let mut world = world_with_block();
        spawn_obstacle(&mut world, ShapeKind::Circle { radius: 10.0 }, Vec2::new(40.0, 40.0), false);
        assert!(Scene::start(&small_config(1), world, &PolyanyaLibrary).is_ok());
    }

    #[test]
    fn mesh_build_failure_aborts_startup() {
        let mut world = World::new();
        spawn_obstacle(
            &mut world,
            ShapeKind::Rectangle { half_extents: Vec2::splat(10.0) },
            Vec2::new(1000.0, 1000.0),
            true,
        );
        let result = Scene::start(&small_config(3), world, &PolyanyaLibrary);
        assert!(matches!(
            result,
            Err(SceneError::MeshBuild(MeshBuildError::ObstacleOutsideBounds { index: 0 }))
        ));
    }

    #[test]
    fn agent_without_planner_is_skipped() {
        let mut scene = Scene::start(&small_config(2), World::new(), &PolyanyaLibrary).unwrap();
        assert!(scene.insert_agent(AgentBuilder::new(Vec2::new(10.0, 10.0))).is_none());
        assert_eq!(scene.agent_count(), 2);
    }

    #[test]
    fn spawn_and_despawn() {
        let mut scene = Scene::start(&small_config(0), World::new(), &PolyanyaLibrary).unwrap();
        let entity = scene.spawn_agent(Vec2::new(50.0, 50.0)).unwrap();
        assert_eq!(scene.agent_positions(), vec![Vec2::new(50.0, 50.0)]);
        assert!(scene.despawn_agent(entity));
        assert!(!scene.despawn_agent(entity));
        assert_eq!(scene.agent_count(), 0);
    }

    #[test]
    fn positions_keep_spawn_order_after_despawn() {
        let mut scene = Scene::start(&small_config(0), World::new(), &PolyanyaLibrary).unwrap();
        let first = scene.spawn_agent(Vec2::new(10.0, 10.0)).unwrap();
        scene.spawn_agent(Vec2::new(20.0, 20.0));
        scene.spawn_agent(Vec2::new(30.0, 30.0));
        assert!(scene.despawn_agent(first));
        // Reuses the freed entity index.
        scene.spawn_agent(Vec2::new(40.0, 40.0));

        assert_eq!(
            scene.agent_positions(),
            vec![Vec2::new(20.0, 20.0), Vec2::new(30.0, 30.0), Vec2::new(40.0, 40.0)]
        );
    }

    #[test]
    fn overlay_uses_polygons_read_at_build() {
        let scene = Scene::start(&small_config(0), world_with_block(), &PolyanyaLibrary).unwrap();
        let coordinator = scene.coordinator();
        assert!(!coordinator.navmesh_polygons().is_empty());
        assert_eq!(coordinator.navmesh_polygons(), coordinator.navmesh().polygons().as_slice());

        let mut list = DrawList::new();
        coordinator.draw(&mut list);
        let drawn: Vec<&[Vec2]> = list.polygons().map(|(points, _)| points).collect();
        let cached: Vec<&[Vec2]> = coordinator.navmesh_polygons().iter().map(|p| p.points()).collect();
        assert_eq!(drawn, cached);
    }

    #[test]
    fn first_tick_requests_a_path_for_every_agent() {
        let mut scene = Scene::start(&small_config(5), world_with_block(), &PolyanyaLibrary).unwrap();
        let before = scene.agent_positions();
        scene.tick(1.0 / 60.0);

        assert_eq!(scene.agent_positions(), before, "no movement on a request tick");
        let mut query = scene.world_mut().query::<&AgentController>();
        for agent in query.iter(scene.world()) {
            assert_eq!(agent.path_requests(), 1);
        }
    }

    #[test]
    fn same_seed_same_scene() {
        let library = PolyanyaLibrary;
        let mut a = Scene::start(&small_config(6), world_with_block(), &library).unwrap();
        let mut b = Scene::start(&small_config(6), world_with_block(), &library).unwrap();
        for _ in 0..30 {
            a.tick(1.0 / 60.0);
            b.tick(1.0 / 60.0);
        }
        assert_eq!(a.agent_positions(), b.agent_positions());
    }

    #[test]
    fn overlay_colors_are_stable_and_translucent() {
        let mut scene = Scene::start(&small_config(0), world_with_block(), &PolyanyaLibrary).unwrap();
        let mut first = DrawList::new();
        let mut second = DrawList::new();
        scene.draw(&mut first);
        scene.draw(&mut second);

        assert_eq!(first.commands(), second.commands());
        assert_eq!(first.polygons().count(), scene.coordinator().navmesh().polygons().len());
        for (_, color) in first.polygons() {
            assert_eq!(color.a, NAVMESH_ALPHA);
            assert!(NAVMESH_PALETTE.contains(&color.with_alpha(1.0)));
        }

        scene.set_show_navmesh_polygons(false);
        let mut hidden = DrawList::new();
        scene.draw(&mut hidden);
        assert!(hidden.is_empty());
    }

    #[test]
    fn path_toggle_reaches_live_agents() {
        let mut config = small_config(3);
        config.show_agent_paths = false;
        config.show_navmesh_polygons = false;
        let mut scene = Scene::start(&config, world_with_block(), &PolyanyaLibrary).unwrap();
        scene.tick(1.0 / 60.0);

        let mut list = DrawList::new();
        scene.draw(&mut list);
        assert_eq!(list.lines().count(), 0);
        assert_eq!(list.polygons().count(), 3, "agent bodies only");

        scene.set_show_agent_paths(true);
        assert!(scene.show_agent_paths());
        let mut query = scene.world_mut().query::<&AgentController>();
        for agent in query.iter(scene.world()) {
            assert!(agent.config().show_path);
        }
    }
}
