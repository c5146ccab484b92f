// Host <-> navmesh library coordinate conversion.
//
// The engine works in `glam::Vec2`; the navmesh library consumes `NavVertex`.
// Both are two packed f32 with identical layout, so every conversion is a
// plain field copy (bit-exact, NaN and infinities included) and slices can be
// reinterpreted in place.

use glam::Vec2;

/// Vertex type of the navmesh library boundary.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct NavVertex {
    pub x: f32,
    pub y: f32,
}

impl NavVertex {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<Vec2> for NavVertex {
    #[inline]
    fn from(v: Vec2) -> Self {
        to_library(v)
    }
}

impl From<NavVertex> for Vec2 {
    #[inline]
    fn from(v: NavVertex) -> Self {
        to_host(v)
    }
}

#[inline]
pub fn to_library(v: Vec2) -> NavVertex {
    NavVertex { x: v.x, y: v.y }
}

#[inline]
pub fn to_host(v: NavVertex) -> Vec2 {
    Vec2::new(v.x, v.y)
}

pub fn to_library_array<const N: usize>(points: [Vec2; N]) -> [NavVertex; N] {
    points.map(to_library)
}

pub fn to_host_array<const N: usize>(points: [NavVertex; N]) -> [Vec2; N] {
    points.map(to_host)
}

pub fn to_library_vec(points: &[Vec2]) -> Vec<NavVertex> {
    points.iter().copied().map(to_library).collect()
}

pub fn to_host_vec(points: &[NavVertex]) -> Vec<Vec2> {
    points.iter().copied().map(to_host).collect()
}

/// Borrow host points as library vertices without copying.
pub fn as_library_slice(points: &[Vec2]) -> &[NavVertex] {
    bytemuck::cast_slice(points)
}

/// Borrow library vertices as host points without copying.
pub fn as_host_slice(points: &[NavVertex]) -> &[Vec2] {
    bytemuck::cast_slice(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_is_exact() {
        let samples = [
            Vec2::ZERO,
            Vec2::new(1.0, -1.0),
            Vec2::new(0.1, 0.2),
            Vec2::new(f32::MAX, f32::MIN_POSITIVE),
            Vec2::new(-1234.5678, 9876.54321),
        ];
        for v in samples {
            let back = to_host(to_library(v));
            assert_eq!(back.x.to_bits(), v.x.to_bits());
            assert_eq!(back.y.to_bits(), v.y.to_bits());
        }
    }

    #[test]
    fn non_finite_values_pass_through() {
        let v = Vec2::new(f32::NAN, f32::INFINITY);
        let lib = to_library(v);
        assert!(lib.x.is_nan());
        assert_eq!(lib.y, f32::INFINITY);

        let back: Vec2 = NavVertex::new(f32::NEG_INFINITY, f32::NAN).into();
        assert_eq!(back.x, f32::NEG_INFINITY);
        assert!(back.y.is_nan());
    }

    #[test]
    fn batch_conversions_keep_order_and_count() {
        let host = vec![Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0), Vec2::new(5.0, 6.0)];
        let lib = to_library_vec(&host);
        assert_eq!(lib, vec![NavVertex::new(1.0, 2.0), NavVertex::new(3.0, 4.0), NavVertex::new(5.0, 6.0)]);
        assert_eq!(to_host_vec(&lib), host);

        let arr = to_library_array([Vec2::X, Vec2::Y]);
        assert_eq!(arr, [NavVertex::new(1.0, 0.0), NavVertex::new(0.0, 1.0)]);
        assert_eq!(to_host_array(arr), [Vec2::X, Vec2::Y]);

        assert!(to_library_vec(&[]).is_empty());
    }

    #[test]
    fn slice_views_alias_the_same_memory() {
        let host = [Vec2::new(7.0, 8.0), Vec2::new(-1.0, 0.5)];
        let view = as_library_slice(&host);
        assert_eq!(view, &[NavVertex::new(7.0, 8.0), NavVertex::new(-1.0, 0.5)]);
        assert_eq!(as_host_slice(view), &host);
    }
}
