// Copyright @yucwang 2026

use crate::math::constants::Vector3f;

pub fn build_tangent_frame(n: &Vector3f) -> (Vector3f, Vector3f) {
    let up = if n.z.abs() < 0.999 {
        Vector3f::new(0.0, 0.0, 1.0)
    } else {
        Vector3f::new(1.0, 0.0, 0.0)
    };
    let tangent = n.cross(&up).normalize();
    let bitangent = n.cross(&tangent).normalize();
    (tangent, bitangent)
}

/// Orthonormal basis at a surface point. Local +Y maps to the normal.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SurfaceFrame {
    pub tangent: Vector3f,
    pub normal: Vector3f,
    pub bitangent: Vector3f,
}

impl SurfaceFrame {
    pub fn new(tangent: Vector3f, normal: Vector3f, bitangent: Vector3f) -> Self {
        Self { tangent, normal, bitangent }
    }

    pub fn from_normal(n: &Vector3f) -> Self {
        let normal = n.normalize();
        let (tangent, bitangent) = build_tangent_frame(&normal);
        Self { tangent, normal, bitangent }
    }

    /// Same frame, mirrored when needed so the normal points against `incoming`.
    pub fn facing(&self, incoming: &Vector3f) -> Self {
        if self.normal.dot(incoming) > 0.0 {
            Self { tangent: -self.tangent, normal: -self.normal, bitangent: -self.bitangent }
        } else {
            *self
        }
    }

    pub fn local_to_world(&self, v: &Vector3f) -> Vector3f {
        self.tangent * v.x + self.normal * v.y + self.bitangent * v.z
    }
}
