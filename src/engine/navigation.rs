// polyanya-backed navigation mesh library.
//
//   Build: the bounds become the outer edges of a constrained triangulation,
//          obstacles are cut out as holes and inflated by the agent radius.
//   Query: point location, closest point and any-angle path search are
//          polyanya's; this module only adapts vertex types and fills the
//          gaps of the `NavMeshQuery` contract (coincident endpoints, points
//          beyond polyanya's closest-point search radius).

use glam::Vec2;
use polyanya::{Mesh, Triangulation};

use super::coords::{to_host, to_host_vec, to_library};
use super::error::MeshBuildError;
use super::geometry::Polygon;
use super::navmesh::{NavMeshLibrary, NavMeshQuery, NavVertex};

/// How far a fallback projection is pulled into the chosen polygon, so the
/// result is strictly inside the mesh and not on a shared edge.
const INTERIOR_NUDGE: f32 = 0.01;

// ============================================================================
// LIBRARY
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct PolyanyaLibrary;

impl NavMeshLibrary for PolyanyaLibrary {
    type Mesh = PolyanyaMesh;

    fn build(
        &self,
        bounds: &[NavVertex],
        obstacles: &[&[NavVertex]],
        agent_radius: f32,
    ) -> Result<PolyanyaMesh, MeshBuildError> {
        let bounds = Polygon::new(to_host_vec(bounds));
        let area = bounds.signed_area().abs();
        if bounds.len() < 3 || !(area > f32::EPSILON) {
            return Err(MeshBuildError::DegenerateBounds { vertices: bounds.len(), area });
        }

        let mut holes = Vec::with_capacity(obstacles.len());
        for (index, ring) in obstacles.iter().enumerate() {
            let hole = Polygon::new(to_host_vec(ring));
            if hole.len() < 3 {
                return Err(MeshBuildError::DegenerateObstacle { index, vertices: hole.len() });
            }
            if !hole.overlaps(&bounds) {
                return Err(MeshBuildError::ObstacleOutsideBounds { index });
            }
            holes.push(hole.0);
        }

        let mut triangulation = Triangulation::from_outer_edges(bounds.points());
        triangulation.add_obstacles(holes);
        if agent_radius > 0.0 {
            triangulation.set_agent_radius(agent_radius);
        }
        let mesh = PolyanyaMesh::new(triangulation.as_navmesh());

        if mesh.polygons.is_empty() {
            return Err(MeshBuildError::NoWalkableArea);
        }
        log::debug!(
            "polyanya mesh: {} polygons from {} obstacles (agent radius {})",
            mesh.polygons.len(),
            obstacles.len(),
            agent_radius
        );
        Ok(mesh)
    }
}

// ============================================================================
// MESH
// ============================================================================

/// A built polyanya mesh plus its polygons in host coordinates.
pub struct PolyanyaMesh {
    mesh: Mesh,
    polygons: Vec<Polygon>,
}

impl PolyanyaMesh {
    pub fn new(mesh: Mesh) -> Self {
        let polygons = mesh
            .layers
            .iter()
            .flat_map(|layer| {
                layer.polygons.iter().map(move |polygon| {
                    Polygon::new(
                        polygon
                            .vertices
                            .iter()
                            .filter_map(|v| layer.vertices.get(*v as usize))
                            .map(|vertex| vertex.coords)
                            .collect(),
                    )
                })
            })
            .filter(|polygon| polygon.len() >= 3)
            .collect();
        Self { mesh, polygons }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.is_finite() && self.mesh.point_in_mesh(point)
    }

    /// `point` itself when it is on the mesh, otherwise the closest mesh
    /// point polyanya finds, otherwise the closest point of any polygon
    /// boundary pulled slightly into that polygon.
    pub fn project(&self, point: Vec2) -> Vec2 {
        if self.contains(point) {
            return point;
        }
        if point.is_finite() {
            if let Some(coords) = self.mesh.get_closest_point(point) {
                return coords.position();
            }
        }
        self.closest_interior_point(point).unwrap_or(point)
    }

    fn closest_interior_point(&self, point: Vec2) -> Option<Vec2> {
        let query = if point.is_finite() { point } else { Vec2::ZERO };
        self.polygons
            .iter()
            .filter_map(|polygon| polygon.closest_boundary_point(query).map(|q| (polygon, q)))
            .min_by(|(_, a), (_, b)| a.distance_squared(query).total_cmp(&b.distance_squared(query)))
            .map(|(polygon, q)| {
                let inward = polygon.centroid() - q;
                q + inward.normalize_or_zero() * INTERIOR_NUDGE.min(inward.length())
            })
    }

    /// Host-coordinate path query, see [`NavMeshQuery::find_path`].
    pub fn path(&self, start: Vec2, end: Vec2, clamp_to_mesh: bool) -> Vec<Vec2> {
        let (start, end) = if clamp_to_mesh {
            (self.project(start), self.project(end))
        } else if self.contains(start) && self.contains(end) {
            (start, end)
        } else {
            return Vec::new();
        };
        if start == end {
            return Vec::new();
        }

        match self.mesh.path(start, end) {
            Some(found) => {
                let mut waypoints = Vec::with_capacity(found.path.len() + 1);
                waypoints.push(start);
                waypoints.extend(found.path.into_iter().filter(|p| *p != start));
                if waypoints.last() != Some(&end) {
                    waypoints.push(end);
                }
                waypoints
            }
            None => Vec::new(),
        }
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }
}

impl NavMeshQuery for PolyanyaMesh {
    fn nearest_point(&self, query: NavVertex) -> NavVertex {
        to_library(self.project(to_host(query)))
    }

    fn find_path(&self, start: NavVertex, end: NavVertex, clamp_to_mesh: bool) -> Vec<NavVertex> {
        self.path(to_host(start), to_host(end), clamp_to_mesh)
            .into_iter()
            .map(to_library)
            .collect()
    }

    fn polygons(&self) -> Vec<Vec<NavVertex>> {
        self.polygons
            .iter()
            .map(|polygon| polygon.points().iter().copied().map(to_library).collect())
            .collect()
    }
}
