// Navmesh showcase: obstacle extraction, a navigation mesh boundary and
// agents that wander the mesh, with debug overlays.

pub mod engine;
