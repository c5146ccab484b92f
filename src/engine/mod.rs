// Engine module - scene graph, navigation and agents for the navmesh showcase

pub mod agent;
pub mod components;
pub mod config;
pub mod coords;
pub mod debug_overlay;
pub mod error;
pub mod geometry;
pub mod navigation;
pub mod navmesh;
pub mod render;
pub mod scene;
pub mod systems;

// Re-export commonly used items
pub use agent::{AgentBuilder, AgentConfig, AgentController, AgentPhase, PathPlanner};
pub use components::*;
pub use config::SceneConfig;
pub use error::{ConfigError, MeshBuildError, SceneError, SceneResult};
pub use geometry::{ObstacleSource, Polygon, ShapeKind};
pub use navigation::{PolyanyaLibrary, PolyanyaMesh};
pub use navmesh::{NavMeshFacade, NavMeshLibrary, NavMeshQuery, NavVertex};
pub use render::{Color, DrawList, RenderSink};
pub use scene::{Scene, SceneCoordinator};
pub use systems::{Drawable, Tickable};
