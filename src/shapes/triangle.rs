// Copyright @yucwang 2023

use crate::core::computation_node::ComputationNode;
use crate::core::shape::Shape;
use crate::math::aabb::{ AABB, BoundsBuilder };
use crate::math::constants::{ Float, Vector3f };
use crate::math::ray::Ray3f;

use std::option::Option;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Triangle {
    p0: Vector3f,
    p1: Vector3f,
    p2: Vector3f
}

impl ComputationNode for Triangle {
    fn to_string(&self) -> String {
        format!("Triangle: {{ {:?}, {:?}, {:?} }}",
                self.p0.as_slice(), self.p1.as_slice(), self.p2.as_slice())
    }
}

impl Shape for Triangle {
    /// Padded so that axis-aligned triangles still have thickness.
    fn bounding_box(&self) -> AABB {
        let mut builder = BoundsBuilder::new();
        builder.expand(&self.p0);
        builder.expand(&self.p1);
        builder.expand(&self.p2);
        builder.build().unwrap_or_default()
    }

    // Signed volumes of the tetrahedra spanned by the ray and each edge decide
    // the side; both windings are accepted.
    fn ray_intersection(&self, ray: &Ray3f) -> Option<Float> {
        let o = ray.origin();
        let d = ray.dir();
        let pa = self.p0 - o;
        let pb = self.p1 - o;
        let pc = self.p2 - o;

        let mut u = d.dot(&pc.cross(&pb));
        let mut v = d.dot(&pa.cross(&pc));
        let mut w = d.dot(&pb.cross(&pa));

        let front = u >= 0.0 && v >= 0.0 && w >= 0.0;
        let back = u <= 0.0 && v <= 0.0 && w <= 0.0;
        if !front && !back {
            return None;
        }

        let sum = u + v + w;
        if sum == 0.0 || !sum.is_finite() {
            return None;
        }
        let denom = 1.0 / sum;
        u *= denom;
        v *= denom;
        w *= denom;

        let p = self.p0 * u + self.p1 * v + self.p2 * w;
        let t = (p - o).dot(&d);
        if t.is_nan() || !ray.test_segment(t) {
            return None;
        }

        Some(t)
    }
}

impl Triangle {
    pub fn new(new_p0: Vector3f, new_p1: Vector3f, new_p2: Vector3f) -> Self {
        Triangle {
            p0: new_p0,
            p1: new_p1,
            p2: new_p2,
        }
    }

    /// Unit normal following the p0 -> p1 -> p2 winding, `None` when degenerate.
    pub fn geometric_normal(&self) -> Option<Vector3f> {
        let edge0 = self.p1 - self.p0;
        let edge1 = self.p2 - self.p0;
        edge0.cross(&edge1).try_normalize(1e-12)
    }

    pub fn vertices(&self) -> (Vector3f, Vector3f, Vector3f) {
        (self.p0, self.p1, self.p2)
    }

    pub fn surface_area(&self) -> Float {
        0.5 * ((self.p1 - self.p0).cross(&(self.p2 - self.p0))).norm()
    }
}
