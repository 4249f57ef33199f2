// Copyright @yucwang 2026

use crate::math::constants::{ Float, Vector3f };
use crate::math::ray::Ray3f;

/// Pinhole camera looking down +Z with +Y up. The image plane sits one
/// unit in front of the eye and spans one unit vertically.
#[derive(Debug, Copy, Clone)]
pub struct PinholeCamera {
    origin: Vector3f,
    width: Float,
    height: Float,
    aspect: Float,
}

impl PinholeCamera {
    pub fn new(width: usize, height: usize) -> Self {
        let width = width.max(1) as Float;
        let height = height.max(1) as Float;
        Self { origin: Vector3f::zeros(), width, height, aspect: width / height }
    }

    pub fn with_origin(mut self, origin: Vector3f) -> Self {
        self.origin = origin;
        self
    }

    pub fn origin(&self) -> Vector3f {
        self.origin
    }

    /// Ray through pixel `(x, y)`, offset by `(jx, jy)` in `[0, 1)` pixels.
    /// Row 0 is the top of the image and column 0 its left edge.
    pub fn generate_ray(&self, x: usize, y: usize, jx: Float, jy: Float) -> Ray3f {
        let fx = (self.width - (x as Float + jx)) / self.width - 0.5;
        let fy = (self.height - (y as Float + jy)) / self.height - 0.5;
        let fragment = Vector3f::new(fx * self.aspect, fy, 1.0);
        Ray3f::new(self.origin, fragment, None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::PinholeCamera;
    use crate::math::constants::Vector3f;

    #[test]
    fn test_center_ray_looks_forward() {
        let camera = PinholeCamera::new(200, 100);
        let ray = camera.generate_ray(100, 50, 0.0, 0.0);
        assert!((ray.dir() - Vector3f::new(0.0, 0.0, 1.0)).norm() < 1e-6);
        assert_eq!(ray.origin(), Vector3f::zeros());
    }

    #[test]
    fn test_corners_and_aspect() {
        let camera = PinholeCamera::new(200, 100).with_origin(Vector3f::new(0.0, 1.0, 0.0));
        let top_left = camera.generate_ray(0, 0, 0.0, 0.0);
        // Looking down +Z with +Y up, +X is on the left.
        let d = top_left.dir() / top_left.dir().z;
        assert!((d.x - 1.0).abs() < 1e-5);
        assert!((d.y - 0.5).abs() < 1e-5);
        assert_eq!(top_left.origin(), Vector3f::new(0.0, 1.0, 0.0));

        let bottom_right = camera.generate_ray(199, 99, 0.999, 0.999);
        let d = bottom_right.dir() / bottom_right.dir().z;
        assert!((d.x + 1.0).abs() < 1e-3);
        assert!((d.y + 0.5).abs() < 1e-3);
    }
}
