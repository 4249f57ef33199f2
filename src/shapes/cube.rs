// Copyright @yucwang 2026

use crate::math::constants::Vector3f;
use crate::shapes::rectangle::rectangle;
use crate::shapes::triangle::Triangle;

/// Axis-aligned box as 12 triangles with outward normals.
pub fn cuboid(p_min: Vector3f, p_max: Vector3f) -> Vec<Triangle> {
    let center = (p_min + p_max) * 0.5;
    let half = (p_max - p_min) * 0.5;
    let ex = Vector3f::new(half.x, 0.0, 0.0);
    let ey = Vector3f::new(0.0, half.y, 0.0);
    let ez = Vector3f::new(0.0, 0.0, half.z);

    let mut triangles = Vec::with_capacity(12);
    triangles.extend(rectangle(center + ex, ey, ez));
    triangles.extend(rectangle(center - ex, ez, ey));
    triangles.extend(rectangle(center + ey, ez, ex));
    triangles.extend(rectangle(center - ey, ex, ez));
    triangles.extend(rectangle(center + ez, ex, ey));
    triangles.extend(rectangle(center - ez, ey, ex));
    triangles
}
