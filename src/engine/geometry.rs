// Obstacle geometry extraction.
//
// Level designers author obstacles as collision shapes attached to static
// bodies. The navmesh build step wants closed polygons in world space, so
// every visible shape is flattened into one `Polygon` here.
//
// Winding convention: clockwise in screen space (y grows downward), which is
// the order (-x,-y), (+x,-y), (+x,+y), (-x,+y) for an axis-aligned box.

use glam::Vec2;

use super::error::{SceneError, SceneResult};

/// An ordered, closed vertex ring in world coordinates.
///
/// At least three vertices, clockwise by convention. Neither property is
/// checked here; the navmesh backend validates what it needs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon(pub Vec<Vec2>);

impl Polygon {
    pub fn new(points: Vec<Vec2>) -> Self {
        Self(points)
    }

    pub fn points(&self) -> &[Vec2] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the closed edge loop, last vertex back to the first.
    pub fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        let n = self.0.len();
        (0..n).map(move |i| (self.0[i], self.0[(i + 1) % n]))
    }

    pub fn translated(&self, offset: Vec2) -> Self {
        Self(self.0.iter().map(|p| *p + offset).collect())
    }

    /// Shoelace area. Positive means clockwise on a y-down screen.
    pub fn signed_area(&self) -> f32 {
        signed_area(&self.0)
    }

    pub fn is_clockwise(&self) -> bool {
        self.signed_area() > 0.0
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point_in_polygon(&self.0, point)
    }

    /// Shortest distance from `point` to any edge of the ring.
    pub fn distance_to_boundary(&self, point: Vec2) -> f32 {
        self.edges()
            .map(|(a, b)| segment_distance(point, a, b))
            .fold(f32::INFINITY, f32::min)
    }

    /// Point of the ring's boundary closest to `point`.
    pub fn closest_boundary_point(&self, point: Vec2) -> Option<Vec2> {
        self.edges()
            .map(|(a, b)| closest_point_on_segment(point, a, b))
            .min_by(|x, y| x.distance_squared(point).total_cmp(&y.distance_squared(point)))
    }

    /// Vertex average; inside the ring for convex polygons.
    pub fn centroid(&self) -> Vec2 {
        if self.0.is_empty() {
            return Vec2::ZERO;
        }
        self.0.iter().copied().sum::<Vec2>() / self.0.len() as f32
    }

    /// True when the two rings share any area or touch along an edge.
    pub fn overlaps(&self, other: &Polygon) -> bool {
        self.0.iter().any(|p| other.contains(*p))
            || other.0.iter().any(|p| self.contains(*p))
            || self
                .edges()
                .any(|(a, b)| other.edges().any(|(c, d)| segments_intersect(a, b, c, d)))
    }
}

impl From<Vec<Vec2>> for Polygon {
    fn from(points: Vec<Vec2>) -> Self {
        Self(points)
    }
}

// ============================================================================
// OBSTACLE SOURCES
// ============================================================================

/// Collision shape kinds that can appear on a static body.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    /// Axis-aligned box centred on the shape origin.
    Rectangle { half_extents: Vec2 },
    /// Convex hull points in the shape's local frame.
    ConvexPolygon { points: Vec<Vec2> },
    /// Arbitrary simple polygon in the shape's local frame.
    FreeformPolygon { points: Vec<Vec2> },
    Circle { radius: f32 },
    Segment { a: Vec2, b: Vec2 },
}

impl ShapeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle { .. } => "rectangle",
            ShapeKind::ConvexPolygon { .. } => "convex_polygon",
            ShapeKind::FreeformPolygon { .. } => "freeform_polygon",
            ShapeKind::Circle { .. } => "circle",
            ShapeKind::Segment { .. } => "segment",
        }
    }
}

/// One authored obstacle shape with its world-space translation.
#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleSource {
    pub kind: ShapeKind,
    pub position: Vec2,
    pub visible: bool,
}

impl ObstacleSource {
    pub fn new(kind: ShapeKind, position: Vec2) -> Self {
        Self { kind, position, visible: true }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// Flatten visible obstacle sources into world-space polygons.
///
/// Rectangles are expanded to their four corners in clockwise order. Authored
/// polygons are translated but never re-sorted: supplying clockwise points is
/// the author's job.
pub fn extract(sources: &[ObstacleSource]) -> SceneResult<Vec<Polygon>> {
    sources
        .iter()
        .filter(|source| source.visible)
        .map(polygon_from_source)
        .collect()
}

fn polygon_from_source(source: &ObstacleSource) -> SceneResult<Polygon> {
    let origin = source.position;
    match &source.kind {
        ShapeKind::Rectangle { half_extents: e } => Ok(Polygon(vec![
            origin + Vec2::new(-e.x, -e.y),
            origin + Vec2::new(e.x, -e.y),
            origin + Vec2::new(e.x, e.y),
            origin + Vec2::new(-e.x, e.y),
        ])),
        ShapeKind::ConvexPolygon { points } | ShapeKind::FreeformPolygon { points } => {
            Ok(Polygon(points.iter().map(|p| *p + origin).collect()))
        }
        other => Err(SceneError::UnsupportedShapeKind(other.name())),
    }
}

// ============================================================================
// POLYGON HELPERS
// ============================================================================

pub fn signed_area(points: &[Vec2]) -> f32 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f32 = (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum();
    twice * 0.5
}

/// Even-odd crossing test. Points exactly on an edge may land either way.
pub fn point_in_polygon(points: &[Vec2], p: Vec2) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (points[i], points[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

pub fn segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    p.distance(closest_point_on_segment(p, a, b))
}

/// Closed-segment intersection test, collinear overlaps included.
pub fn segments_intersect(a: Vec2, b: Vec2, c: Vec2, d: Vec2) -> bool {
    let d1 = (b - a).perp_dot(c - a);
    let d2 = (b - a).perp_dot(d - a);
    let d3 = (d - c).perp_dot(a - c);
    let d4 = (d - c).perp_dot(b - c);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    let on_segment = |p: Vec2, q: Vec2, r: Vec2| {
        r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.y >= p.y.min(q.y) && r.y <= p.y.max(q.y)
    };
    (d1 == 0.0 && on_segment(a, b, c))
        || (d2 == 0.0 && on_segment(a, b, d))
        || (d3 == 0.0 && on_segment(c, d, a))
        || (d4 == 0.0 && on_segment(c, d, b))
}
