// Copyright 2020 @TwoCookingMice

use super::constants::{ BOUNDS_EPSILON, Float, Vector3f,
                        FLOAT_MIN, FLOAT_MAX };
use super::ray::{ Ray3f };

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AABB {
    pub p_min: Vector3f,
    pub p_max: Vector3f
}

impl Default for AABB {
    fn default() -> Self {
        Self { p_min: Vector3f::new(FLOAT_MAX, FLOAT_MAX, FLOAT_MAX),
               p_max: Vector3f::new(FLOAT_MIN, FLOAT_MIN, FLOAT_MIN) }
    }
}

impl AABB {
    pub fn new(p_min: Vector3f, p_max: Vector3f) -> Self {
        let mut min = Vector3f::zeros();
        let mut max = Vector3f::zeros();
        for idx in 0..3 {
            min[idx] = p_min[idx].min(p_max[idx]);
            max[idx] = p_max[idx].max(p_min[idx]);
        }
        Self { p_min: min, p_max: max }
    }

    pub fn center(&self) -> Vector3f {
        0.5f32 * self.p_min + 0.5f32 * self.p_max
    }

    pub fn expand_by_point(&mut self, p: &Vector3f) {
        for idx in 0..3 {
            self.p_min[idx] = self.p_min[idx].min(p[idx]);
            self.p_max[idx] = self.p_max[idx].max(p[idx]);
        }
    }

    pub fn expand_by_aabb(&mut self, other: &AABB) {
        for idx in 0..3 {
            self.p_min[idx] = self.p_min[idx].min(other.p_min[idx]);
            self.p_max[idx] = self.p_max[idx].max(other.p_max[idx]);
        }
    }

    /// Overlap of two boxes. May be invalid when they are disjoint.
    pub fn intersection(&self, other: &AABB) -> AABB {
        let mut result = *self;
        for idx in 0..3 {
            result.p_min[idx] = self.p_min[idx].max(other.p_min[idx]);
            result.p_max[idx] = self.p_max[idx].min(other.p_max[idx]);
        }
        result
    }

    /// Cuts the box with the plane `axis = location`, returning (below, above).
    pub fn split(&self, axis: usize, location: Float) -> (AABB, AABB) {
        debug_assert!(axis < 3);
        debug_assert!(location >= self.p_min[axis] && location <= self.p_max[axis]);

        let mut below = *self;
        let mut above = *self;
        below.p_max[axis] = location;
        above.p_min[axis] = location;
        (below, above)
    }

    /// Strictly inside along one axis.
    pub fn contains_location(&self, location: Float, axis: usize) -> bool {
        location > self.p_min[axis] && location < self.p_max[axis]
    }

    /// Strictly inside on every axis.
    pub fn contains_point(&self, p: &Vector3f) -> bool {
        (0..3).all(|idx| p[idx] > self.p_min[idx] && p[idx] < self.p_max[idx])
    }

    pub fn contains_or_touches(&self, p: &Vector3f, tolerance: Float) -> bool {
        (0..3).all(|idx| p[idx] >= self.p_min[idx] - tolerance
                      && p[idx] <= self.p_max[idx] + tolerance)
    }

    pub fn ray_intersect(&self, ray: &Ray3f) -> bool {
        self.ray_intersect_range(ray).is_some()
    }

    pub fn ray_intersect_range(&self, ray: &Ray3f) -> Option<(Float, Float)> {
        if !self.is_valid() {
            return None;
        }

        let o = ray.origin();
        let d = ray.dir();
        let mut t_min = ray.min_t;
        let mut t_max = ray.max_t;

        for idx in 0..3 {
            let dir = d[idx];
            if dir.abs() < 1e-8 {
                if o[idx] < self.p_min[idx] || o[idx] > self.p_max[idx] {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / dir;
            let mut t0 = (self.p_min[idx] - o[idx]) * inv;
            let mut t1 = (self.p_max[idx] - o[idx]) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }

            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_max < t_min {
                return None;
            }
        }

        Some((t_min, t_max))
    }

    pub fn surface_area(&self) -> Float {
        let d = self.diagonal();
        2.0f32 * (d.x * d.y + d.x * d.z + d.y * d.z)
    }

    pub fn diagonal(&self) -> Vector3f {
        self.p_max - self.p_min
    }

    /// Axis the kd-tree splits on: x unless y or z is strictly the longest.
    pub fn split_axis(&self) -> usize {
        let dims = self.diagonal();
        if dims.x < dims.y && dims.z < dims.y {
            1
        } else if dims.x < dims.z && dims.y < dims.z {
            2
        } else {
            0
        }
    }

    pub fn is_valid(&self) -> bool {
        (0..3).all(|idx| self.p_min[idx] <= self.p_max[idx])
    }
}

/// Accumulates points into a padded bounding box. Empty until the first point.
#[derive(Debug, Copy, Clone, Default)]
pub struct BoundsBuilder {
    bounds: Option<AABB>,
}

impl BoundsBuilder {
    pub fn new() -> Self {
        Self { bounds: None }
    }

    pub fn expand(&mut self, p: &Vector3f) {
        let pad = Vector3f::new(BOUNDS_EPSILON, BOUNDS_EPSILON, BOUNDS_EPSILON);
        match self.bounds.as_mut() {
            Some(bounds) => {
                for idx in 0..3 {
                    if p[idx] < bounds.p_min[idx] {
                        bounds.p_min[idx] = p[idx] - BOUNDS_EPSILON;
                    }
                    if p[idx] > bounds.p_max[idx] {
                        bounds.p_max[idx] = p[idx] + BOUNDS_EPSILON;
                    }
                }
            }
            None => {
                self.bounds = Some(AABB { p_min: p - pad, p_max: p + pad });
            }
        }
    }

    pub fn expand_by_aabb(&mut self, other: &AABB) {
        self.expand(&other.p_min);
        self.expand(&other.p_max);
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    pub fn build(&self) -> Option<AABB> {
        self.bounds
    }
}
