// Agent locomotion.
//
// Each agent walks its waypoint queue at a fixed speed. When the queue runs
// dry it picks a random point in the viewport and asks its planner for a new
// route, then keeps walking. Arrival within a tick snaps exactly onto the
// waypoint; leftover movement is dropped rather than carried over.

use std::collections::VecDeque;
use std::sync::Arc;

use bevy_ecs::prelude::*;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::error::{SceneError, SceneResult};
use super::render::{Color, RenderSink, circle_outline};
use super::systems::{Drawable, Tickable};

/// Default walking speed in world units per second.
pub const DEFAULT_AGENT_SPEED: f32 = 300.0;
const PATH_COLOR: Color = Color::rgba(1.0, 0.0, 0.0, 0.3);
const BODY_COLOR: Color = Color::rgba(1.0, 1.0, 1.0, 0.9);
const BODY_SEGMENTS: usize = 12;

/// Answers path requests on behalf of agents.
pub trait PathPlanner: Send + Sync {
    /// Waypoints from `start` towards `end`, with off-mesh endpoints clamped
    /// onto the mesh. Empty when there is nowhere to go.
    fn request_path(&self, start: Vec2, end: Vec2) -> Vec<Vec2>;

    /// Size of the visible area; random destinations are drawn from
    /// `[0, w) x [0, h)`.
    fn viewport(&self) -> Vec2;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentConfig {
    pub speed: f32,
    pub radius: f32,
    pub show_path: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            speed: DEFAULT_AGENT_SPEED,
            radius: 16.0,
            show_path: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentPhase {
    /// Walking towards the head of a non-empty path.
    Following,
    /// Path exhausted; a new one is requested on the next tick.
    Requesting,
}

#[derive(Component)]
pub struct AgentController {
    position: Vec2,
    path: VecDeque<Vec2>,
    config: AgentConfig,
    planner: Arc<dyn PathPlanner>,
    rng: StdRng,
    path_requests: u32,
}

impl AgentController {
    pub fn builder(position: Vec2) -> AgentBuilder {
        AgentBuilder::new(position)
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn path(&self) -> &VecDeque<Vec2> {
        &self.path
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn phase(&self) -> AgentPhase {
        if self.path.is_empty() { AgentPhase::Requesting } else { AgentPhase::Following }
    }

    /// Number of path requests issued since spawn.
    pub fn path_requests(&self) -> u32 {
        self.path_requests
    }

    pub fn set_show_path(&mut self, show: bool) {
        self.config.show_path = show;
    }

    /// Replace the remaining route wholesale.
    pub fn set_path(&mut self, path: impl IntoIterator<Item = Vec2>) {
        self.path = path.into_iter().collect();
    }

    fn request_new_path(&mut self) {
        let viewport = self.planner.viewport();
        let target = Vec2::new(
            self.rng.gen_range(0.0..1.0f32) * viewport.x,
            self.rng.gen_range(0.0..1.0f32) * viewport.y,
        );
        let path = self.planner.request_path(self.position, target);
        log::trace!("agent at {} -> {}: {} waypoints", self.position, target, path.len());
        self.path_requests += 1;
        self.set_path(path);
    }
}

impl Tickable for AgentController {
    fn tick(&mut self, delta_time: f32) {
        let Some(&target) = self.path.front() else {
            // Whatever comes back, empty included, is handled next tick.
            self.request_new_path();
            return;
        };

        let step = self.config.speed * delta_time;
        let difference = target - self.position;
        let distance_left = difference.length();

        if distance_left <= step {
            // Waypoints come from the mesh, so snapping keeps the agent on it.
            self.position = target;
            self.path.pop_front();
            return;
        }

        self.position += difference / distance_left * step;
    }
}

impl Drawable for AgentController {
    fn draw(&self, sink: &mut dyn RenderSink) {
        if self.config.show_path {
            if let Some(&head) = self.path.front() {
                sink.draw_line(self.position, head, PATH_COLOR);
                for (a, b) in self.path.iter().zip(self.path.iter().skip(1)) {
                    sink.draw_line(*a, *b, PATH_COLOR);
                }
            }
        }
        if self.config.radius > 0.0 {
            let body = circle_outline(self.position, self.config.radius, BODY_SEGMENTS);
            sink.draw_filled_polygon(&body, BODY_COLOR);
        }
    }
}

/// Assembles an agent; the planner is mandatory.
pub struct AgentBuilder {
    position: Vec2,
    config: AgentConfig,
    planner: Option<Arc<dyn PathPlanner>>,
    seed: Option<u64>,
}

impl AgentBuilder {
    pub fn new(position: Vec2) -> Self {
        Self { position, config: AgentConfig::default(), planner: None, seed: None }
    }

    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn planner(mut self, planner: Arc<dyn PathPlanner>) -> Self {
        self.planner = Some(planner);
        self
    }

    /// Seed for destination picking. Unseeded agents draw from OS entropy.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> SceneResult<AgentController> {
        let planner = self.planner.ok_or(SceneError::MissingCollaborator("agent path planner"))?;
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(AgentController {
            position: self.position,
            path: VecDeque::new(),
            config: self.config,
            planner,
            rng,
            path_requests: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::render::DrawList;
    use approx::assert_abs_diff_eq;
    use std::sync::Mutex;

    const DT: f32 = 1.0 / 60.0;

    /// Hands out scripted paths and records every request.
    #[derive(Default)]
    struct ScriptedPlanner {
        replies: Mutex<VecDeque<Vec<Vec2>>>,
        requests: Mutex<Vec<(Vec2, Vec2)>>,
    }

    impl ScriptedPlanner {
        fn with_replies(replies: Vec<Vec<Vec2>>) -> Arc<Self> {
            Arc::new(Self { replies: Mutex::new(replies.into()), ..Default::default() })
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl PathPlanner for ScriptedPlanner {
        fn request_path(&self, start: Vec2, end: Vec2) -> Vec<Vec2> {
            self.requests.lock().unwrap().push((start, end));
            self.replies.lock().unwrap().pop_front().unwrap_or_default()
        }

        fn viewport(&self) -> Vec2 {
            Vec2::new(640.0, 480.0)
        }
    }

    fn agent_at(position: Vec2, planner: Arc<ScriptedPlanner>) -> AgentController {
        AgentController::builder(position)
            .config(AgentConfig { speed: 300.0, radius: 8.0, show_path: true })
            .planner(planner)
            .seed(7)
            .build()
            .unwrap()
    }

    #[test]
    fn close_waypoint_is_reached_in_one_tick() {
        let mut agent = agent_at(Vec2::ZERO, ScriptedPlanner::with_replies(vec![]));
        agent.set_path([Vec2::new(1.0, 0.0)]);

        agent.tick(DT);

        assert_eq!(agent.position(), Vec2::new(1.0, 0.0));
        assert!(agent.path().is_empty());
        assert_eq!(agent.phase(), AgentPhase::Requesting);
    }

    #[test]
    fn far_waypoint_advances_by_speed_times_dt() {
        let mut agent = agent_at(Vec2::ZERO, ScriptedPlanner::with_replies(vec![]));
        agent.set_path([Vec2::new(1000.0, 0.0)]);

        agent.tick(DT);

        assert_abs_diff_eq!(agent.position().x, 5.0, epsilon = 1e-4);
        assert_eq!(agent.position().y, 0.0);
        assert_eq!(agent.path().iter().copied().collect::<Vec<_>>(), vec![Vec2::new(1000.0, 0.0)]);
        assert_eq!(agent.phase(), AgentPhase::Following);
    }

    /// Speed 40 and dt 1/8 give a step of exactly 5 units.
    fn stepping_agent(position: Vec2, planner: Arc<ScriptedPlanner>) -> AgentController {
        AgentController::builder(position)
            .config(AgentConfig { speed: 40.0, radius: 0.0, show_path: false })
            .planner(planner)
            .seed(11)
            .build()
            .unwrap()
    }

    #[test]
    fn arrival_is_exact_for_any_distance_within_one_step() {
        let start = Vec2::new(10.0, 20.0);
        for offset in [Vec2::new(5.0, 0.0), Vec2::new(0.0, -5.0), Vec2::new(3.0, 4.0), Vec2::new(-4.0, 3.0)] {
            for fraction in [0.0, 0.25, 0.5, 0.75, 1.0] {
                let waypoint = start + offset * fraction;
                let mut agent = stepping_agent(start, ScriptedPlanner::with_replies(vec![]));
                agent.set_path([waypoint, Vec2::new(500.0, 500.0)]);

                agent.tick(0.125);

                assert_eq!(agent.position(), waypoint);
                assert_eq!(agent.path().len(), 1);
            }
        }
    }

    #[test]
    fn empty_path_requests_once_per_tick() {
        let planner = ScriptedPlanner::with_replies(vec![Vec::new(), Vec::new()]);
        let mut agent = agent_at(Vec2::new(5.0, 5.0), planner.clone());

        agent.tick(DT);
        assert_eq!(planner.request_count(), 1);
        assert_eq!(agent.position(), Vec2::new(5.0, 5.0));

        agent.tick(DT);
        assert_eq!(planner.request_count(), 2);
        assert_eq!(agent.path_requests(), 2);
    }

    #[test]
    fn request_uses_position_and_a_viewport_target() {
        let route = vec![Vec2::new(5.0, 5.0), Vec2::new(100.0, 5.0)];
        let planner = ScriptedPlanner::with_replies(vec![route.clone()]);
        let mut agent = agent_at(Vec2::new(5.0, 5.0), planner.clone());

        agent.tick(DT);

        let (start, target) = planner.requests.lock().unwrap()[0];
        assert_eq!(start, Vec2::new(5.0, 5.0));
        assert!((0.0..640.0).contains(&target.x) && (0.0..480.0).contains(&target.y));
        assert_eq!(agent.path().iter().copied().collect::<Vec<_>>(), route);

        // First waypoint is the agent's own position: consumed without moving.
        agent.tick(DT);
        assert_eq!(agent.path().len(), 1);
        agent.tick(DT);
        assert_abs_diff_eq!(agent.position().x, 10.0, epsilon = 1e-4);
    }

    #[test]
    fn walks_a_multi_waypoint_route_to_the_end() {
        let planner = ScriptedPlanner::with_replies(vec![]);
        let mut agent = stepping_agent(Vec2::ZERO, planner.clone());
        agent.set_path([Vec2::new(30.0, 0.0), Vec2::new(30.0, 40.0)]);

        let mut ticks = 0;
        while !agent.path().is_empty() {
            agent.tick(0.125);
            ticks += 1;
            assert!(ticks < 100);
        }
        assert_eq!(agent.position(), Vec2::new(30.0, 40.0));
        assert_eq!(planner.request_count(), 0);
        // Each leg: one tick per full step, the last one snapping.
        assert_eq!(ticks, 14);
    }

    #[test]
    fn missing_planner_is_rejected_at_construction() {
        let result = AgentController::builder(Vec2::ZERO).build();
        assert!(matches!(result, Err(SceneError::MissingCollaborator(_))));
    }

    #[test]
    fn path_drawing_connects_agent_and_waypoints() {
        let mut agent = agent_at(Vec2::new(1.0, 1.0), ScriptedPlanner::with_replies(vec![]));
        agent.set_path([Vec2::new(10.0, 1.0), Vec2::new(10.0, 10.0), Vec2::new(0.0, 10.0)]);

        let mut list = DrawList::new();
        agent.draw(&mut list);
        let lines: Vec<_> = list.lines().map(|(a, b, _)| (a, b)).collect();
        assert_eq!(
            lines,
            vec![
                (Vec2::new(1.0, 1.0), Vec2::new(10.0, 1.0)),
                (Vec2::new(10.0, 1.0), Vec2::new(10.0, 10.0)),
                (Vec2::new(10.0, 10.0), Vec2::new(0.0, 10.0)),
            ]
        );
        assert!(list.lines().all(|(_, _, color)| color == PATH_COLOR));
        assert_eq!(list.polygons().count(), 1);

        agent.set_show_path(false);
        let mut hidden = DrawList::new();
        agent.draw(&mut hidden);
        assert_eq!(hidden.lines().count(), 0);
    }
}
