//! Scene description.
//!
//! A scene file (RON) carries the navigation settings of the scene and the
//! static obstacles placed by the level designer:
//!
//! ```ron
//! (
//!     bounds: [(x: 0.0, y: 0.0), (x: 1280.0, y: 0.0), (x: 1280.0, y: 720.0), (x: 0.0, y: 720.0)],
//!     agent_radius: 16.0,
//!     agent_count: 20,
//!     show_agent_paths: true,
//!     obstacles: [
//!         (position: (x: 400.0, y: 300.0), shape: Rectangle(half_extents: (x: 80.0, y: 40.0))),
//!     ],
//! )
//! ```

use std::path::Path;

use bevy_ecs::prelude::*;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::agent::{AgentConfig, DEFAULT_AGENT_SPEED};
use super::components::spawn_obstacle;
use super::error::ConfigError;
use super::geometry::{Polygon, ShapeKind};

/// Plain serializable point; converts to `Vec2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl From<Point> for Vec2 {
    fn from(p: Point) -> Self {
        Vec2::new(p.x, p.y)
    }
}

impl From<Vec2> for Point {
    fn from(v: Vec2) -> Self {
        Point { x: v.x, y: v.y }
    }
}

fn to_points(points: &[Point]) -> Vec<Vec2> {
    points.iter().copied().map(Vec2::from).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeDesc {
    Rectangle { half_extents: Point },
    ConvexPolygon { points: Vec<Point> },
    FreeformPolygon { points: Vec<Point> },
    Circle { radius: f32 },
    Segment { a: Point, b: Point },
}

impl ShapeDesc {
    pub fn to_shape(&self) -> ShapeKind {
        match self {
            ShapeDesc::Rectangle { half_extents } => ShapeKind::Rectangle { half_extents: (*half_extents).into() },
            ShapeDesc::ConvexPolygon { points } => ShapeKind::ConvexPolygon { points: to_points(points) },
            ShapeDesc::FreeformPolygon { points } => ShapeKind::FreeformPolygon { points: to_points(points) },
            ShapeDesc::Circle { radius } => ShapeKind::Circle { radius: *radius },
            ShapeDesc::Segment { a, b } => ShapeKind::Segment { a: (*a).into(), b: (*b).into() },
        }
    }
}

/// One collision shape of a static body, as authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleDesc {
    pub position: Point,
    pub shape: ShapeDesc,
    #[serde(default = "default_true")]
    pub visible: bool,
}

fn default_true() -> bool {
    true
}

/// Scene-level navigation settings plus the authored obstacles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Outer navigable polygon, clockwise.
    pub bounds: Vec<Point>,
    pub agent_radius: f32,
    pub show_navmesh_polygons: bool,
    pub agent_count: usize,
    pub show_agent_paths: bool,
    pub agent_speed: f32,
    /// Visible area; random spawn and destination samples come from here.
    pub viewport: Point,
    /// Seed for spawn positions and agent destinations. `None` = entropy.
    pub spawn_seed: Option<u64>,
    /// Seed for the navmesh overlay colours, stable across runs.
    pub overlay_seed: u64,
    pub obstacles: Vec<ObstacleDesc>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        let (w, h) = (1280.0, 720.0);
        Self {
            bounds: vec![
                Point { x: 0.0, y: 0.0 },
                Point { x: w, y: 0.0 },
                Point { x: w, y: h },
                Point { x: 0.0, y: h },
            ],
            agent_radius: 16.0,
            show_navmesh_polygons: true,
            agent_count: 10,
            show_agent_paths: true,
            agent_speed: DEFAULT_AGENT_SPEED,
            viewport: Point { x: w, y: h },
            spawn_seed: None,
            overlay_seed: 0,
            obstacles: Vec::new(),
        }
    }
}

impl SceneConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_ron(&contents)
    }

    pub fn from_ron(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_ron(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bounds.len() < 3 {
            return Err(ConfigError::Invalid(format!(
                "bounds need at least 3 points, got {}",
                self.bounds.len()
            )));
        }
        if !(self.agent_radius >= 0.0) {
            return Err(ConfigError::Invalid(format!("agent_radius must be >= 0, got {}", self.agent_radius)));
        }
        if !(self.agent_speed > 0.0) {
            return Err(ConfigError::Invalid(format!("agent_speed must be > 0, got {}", self.agent_speed)));
        }
        if !(self.viewport.x > 0.0 && self.viewport.y > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "viewport must be positive, got {}x{}",
                self.viewport.x, self.viewport.y
            )));
        }
        Ok(())
    }

    pub fn bounds_polygon(&self) -> Polygon {
        Polygon::new(to_points(&self.bounds))
    }

    pub fn viewport_size(&self) -> Vec2 {
        self.viewport.into()
    }

    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            speed: self.agent_speed,
            radius: self.agent_radius,
            show_path: self.show_agent_paths,
        }
    }

    /// Place the authored obstacles into the scene graph as static bodies.
    pub fn spawn_obstacles(&self, world: &mut World) -> Vec<Entity> {
        self.obstacles
            .iter()
            .map(|desc| spawn_obstacle(world, desc.shape.to_shape(), desc.position.into(), desc.visible))
            .collect()
    }
}
