// Copyright @yucwang 2026

use crate::math::constants::Vector3f;
use crate::shapes::triangle::Triangle;

/// Two triangles spanning `center ± u ± v`. The normal follows `u x v`.
pub fn rectangle(center: Vector3f, u: Vector3f, v: Vector3f) -> Vec<Triangle> {
    let p00 = center - u - v;
    let p10 = center + u - v;
    let p11 = center + u + v;
    let p01 = center - u + v;
    vec![Triangle::new(p00, p10, p11), Triangle::new(p00, p11, p01)]
}
