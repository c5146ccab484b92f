// Navigation mesh boundary.
//
// The mesh itself (construction, point location, path search) belongs to a
// navmesh library that speaks `NavVertex`. `NavMeshFacade` is the only place
// the engine talks to it, and it does so in host coordinates.

use glam::Vec2;

use super::coords::{as_library_slice, to_host, to_host_vec, to_library};
use super::error::MeshBuildError;
use super::geometry::Polygon;

/// Read-only queries against a built mesh.
///
/// A built mesh is never mutated, so queries may be issued from any number
/// of agents within the same tick.
pub trait NavMeshQuery: Send + Sync {
    /// Closest point lying on the navigable surface.
    fn nearest_point(&self, query: NavVertex) -> NavVertex;

    /// Waypoints from `start` to `end`, both included.
    ///
    /// With `clamp_to_mesh`, off-mesh endpoints are projected onto the mesh
    /// first. Empty when no path exists or when the endpoints coincide.
    fn find_path(&self, start: NavVertex, end: NavVertex, clamp_to_mesh: bool) -> Vec<NavVertex>;

    /// Walkable polygons, for debug drawing.
    fn polygons(&self) -> Vec<Vec<NavVertex>>;
}

/// Mesh factory side of a navmesh library.
pub trait NavMeshLibrary {
    type Mesh: NavMeshQuery + 'static;

    fn build(
        &self,
        bounds: &[NavVertex],
        obstacles: &[&[NavVertex]],
        agent_radius: f32,
    ) -> Result<Self::Mesh, MeshBuildError>;
}

pub use super::coords::NavVertex;

/// Host-side handle to a built navigation mesh.
pub struct NavMeshFacade {
    mesh: Box<dyn NavMeshQuery>,
    agent_radius: f32,
}

impl NavMeshFacade {
    pub fn build<L: NavMeshLibrary>(
        library: &L,
        bounds: &Polygon,
        obstacles: &[Polygon],
        agent_radius: f32,
    ) -> Result<Self, MeshBuildError> {
        let obstacle_views: Vec<&[NavVertex]> = obstacles
            .iter()
            .map(|polygon| as_library_slice(polygon.points()))
            .collect();
        let mesh = library.build(as_library_slice(bounds.points()), &obstacle_views, agent_radius)?;
        Ok(Self::from_mesh(mesh, agent_radius))
    }

    /// Wrap an already built mesh.
    pub fn from_mesh(mesh: impl NavMeshQuery + 'static, agent_radius: f32) -> Self {
        Self { mesh: Box::new(mesh), agent_radius }
    }

    pub fn agent_radius(&self) -> f32 {
        self.agent_radius
    }

    pub fn nearest_point(&self, query: Vec2) -> Vec2 {
        to_host(self.mesh.nearest_point(to_library(query)))
    }

    pub fn find_path(&self, start: Vec2, end: Vec2, clamp_to_mesh: bool) -> Vec<Vec2> {
        to_host_vec(&self.mesh.find_path(to_library(start), to_library(end), clamp_to_mesh))
    }

    pub fn polygons(&self) -> Vec<Polygon> {
        self.mesh
            .polygons()
            .iter()
            .map(|ring| Polygon::new(to_host_vec(ring)))
            .collect()
    }
}

impl std::fmt::Debug for NavMeshFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavMeshFacade")
            .field("agent_radius", &self.agent_radius)
            .finish_non_exhaustive()
    }
}
