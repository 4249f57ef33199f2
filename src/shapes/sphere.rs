// Copyright @yucwang 2026

use crate::core::computation_node::ComputationNode;
use crate::core::shape::Shape;
use crate::math::aabb::AABB;
use crate::math::constants::{ Float, Vector3f };
use crate::math::ray::Ray3f;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Sphere {
    center: Vector3f,
    radius: Float,
}

impl ComputationNode for Sphere {
    fn to_string(&self) -> String {
        format!("Sphere: {{ center: {:?}, radius: {} }}", self.center.as_slice(), self.radius)
    }
}

impl Shape for Sphere {
    fn bounding_box(&self) -> AABB {
        let r = Vector3f::new(self.radius, self.radius, self.radius);
        AABB::new(self.center - r, self.center + r)
    }

    // Nearest root in front of the origin; the far root when starting inside.
    fn ray_intersection(&self, ray: &Ray3f) -> Option<Float> {
        let oc = ray.origin() - self.center;
        let b = oc.dot(&ray.dir());
        let c = oc.dot(&oc) - self.radius * self.radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }

        let root = discriminant.sqrt();
        let near = -b - root;
        let far = -b + root;
        if ray.test_segment(near) {
            Some(near)
        } else if ray.test_segment(far) {
            Some(far)
        } else {
            None
        }
    }
}

impl Sphere {
    pub fn new(center: Vector3f, radius: Float) -> Self {
        Self { center, radius: radius.abs() }
    }

    pub fn center(&self) -> Vector3f {
        self.center
    }

    pub fn radius(&self) -> Float {
        self.radius
    }

    pub fn normal_at(&self, p: &Vector3f) -> Vector3f {
        (p - self.center).normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_at_origin() {
        let sphere = Sphere::new(Vector3f::zeros(), 1.0);
        let ray = Ray3f::new(Vector3f::new(0.0, 0.0, -2.0), Vector3f::new(0.0, 0.0, 1.0), None, None);
        let t = sphere.ray_intersection(&ray).unwrap();
        assert!((t - 1.0).abs() < 1e-6);
        let n = sphere.normal_at(&ray.at(t));
        assert!((n.z + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_sphere_with_position() {
        let sphere = Sphere::new(Vector3f::new(0.0, 0.0, -1.0), 1.0);
        let ray = Ray3f::new(Vector3f::new(0.0, 0.0, -3.0), Vector3f::new(0.0, 0.0, 1.0), None, None);
        let t = sphere.ray_intersection(&ray).unwrap();
        assert!((t - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_inside_and_behind() {
        let sphere = Sphere::new(Vector3f::zeros(), 20.0);
        let inside = Ray3f::new(Vector3f::new(0.0, 1.0, 0.0), Vector3f::new(0.0, 1.0, 0.0), None, None);
        let t = sphere.ray_intersection(&inside).unwrap();
        assert!((t - 19.0).abs() < 1e-4);

        let small = Sphere::new(Vector3f::new(0.0, 0.0, 5.0), 1.0);
        let away = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, -1.0), None, None);
        assert!(small.ray_intersection(&away).is_none());
        let miss = Ray3f::new(Vector3f::new(3.0, 0.0, 0.0), Vector3f::new(0.0, 0.0, 1.0), None, None);
        assert!(small.ray_intersection(&miss).is_none());
    }

    #[test]
    fn test_bounds() {
        let sphere = Sphere::new(Vector3f::new(0.0, 1.0, 1.0), 0.1);
        let b = sphere.bounding_box();
        assert!((b.p_min - Vector3f::new(-0.1, 0.9, 0.9)).norm() < 1e-6);
        assert!((b.p_max - Vector3f::new(0.1, 1.1, 1.1)).norm() < 1e-6);
    }
}
