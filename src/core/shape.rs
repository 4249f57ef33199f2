// Copyright @yucwang 2023

use crate::core::computation_node::ComputationNode;
use crate::math::aabb::AABB;
use crate::math::constants::Float;
use crate::math::ray::Ray3f;

pub trait Shape: ComputationNode + Send + Sync {
    fn bounding_box(&self) -> AABB;

    /// Distance along `ray` to the nearest hit inside the ray's segment.
    /// Parallel and degenerate configurations report no hit.
    fn ray_intersection(&self, ray: &Ray3f) -> Option<Float>;
}
