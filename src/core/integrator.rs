// Copyright @yucwang 2026

use crate::core::computation_node::ComputationNode;
use crate::core::kdtree::SearchCache;
use crate::core::provider::{ GeometryProvider, ShadingProvider };
use crate::core::rng::LcgRng;
use crate::core::shade_stack::ShadeStack;
use crate::math::ray::Ray3f;
use crate::math::spectrum::SampledSpectrum;

/// Scratch state owned by one render thread and never shared.
pub struct ThreadContext {
    pub cache: SearchCache,
    pub stack: ShadeStack,
    pub rng: LcgRng,
}

impl ThreadContext {
    pub fn new(seed: u64, thread_index: usize) -> Self {
        Self {
            cache: SearchCache::new(),
            stack: ShadeStack::with_capacity(16),
            rng: LcgRng::for_stream(seed, thread_index as u64),
        }
    }
}

pub trait Integrator: ComputationNode + Send + Sync {
    /// Radiance arriving along a camera ray.
    fn trace_ray_forward(&self,
                         ray: &Ray3f,
                         geometry: &dyn GeometryProvider,
                         shading: &dyn ShadingProvider,
                         ctx: &mut ThreadContext) -> SampledSpectrum;
}
