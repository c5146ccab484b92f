// Error taxonomy for scene startup.
// Per-tick agent logic has no error conditions; everything here happens at
// load / init time.

use thiserror::Error;

/// Failure to build a navigation mesh from bounds and obstacles.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshBuildError {
    #[error("bounds polygon is degenerate ({vertices} vertices, area {area})")]
    DegenerateBounds { vertices: usize, area: f32 },

    #[error("obstacle {index} has only {vertices} vertices")]
    DegenerateObstacle { index: usize, vertices: usize },

    #[error("obstacle {index} lies entirely outside the bounds")]
    ObstacleOutsideBounds { index: usize },

    #[error("no walkable area left after removing obstacles")]
    NoWalkableArea,
}

/// Scene description loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid scene description: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum SceneError {
    /// Content error: the scene contains a collision shape the extractor
    /// cannot turn into an obstacle polygon.
    #[error("unsupported shape kind `{0}`")]
    UnsupportedShapeKind(&'static str),

    #[error("navigation mesh build failed: {0}")]
    MeshBuild(#[from] MeshBuildError),

    /// A required collaborator (e.g. the path planner of an agent) is absent.
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type SceneResult<T> = Result<T, SceneError>;
