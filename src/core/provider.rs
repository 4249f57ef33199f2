// Copyright @yucwang 2026

use crate::core::kdtree::SearchCache;
use crate::core::shader::Shader;
use crate::core::tangent_frame::SurfaceFrame;
use crate::core::trace_result::{ GeoId, TraceResult };
use crate::math::ray::Ray3f;

/// Answers nearest-hit queries. Called from every worker at once, each with
/// its own cache.
pub trait GeometryProvider: Send + Sync {
    fn trace(&self, ray: &Ray3f, cache: &mut SearchCache) -> TraceResult;
}

/// Local frame and material lookup for geometry that was hit.
pub trait ShadingProvider: Send + Sync {
    fn surface_frame(&self, geo_id: &GeoId) -> SurfaceFrame;
    fn surface_shader(&self, geo_id: &GeoId) -> &dyn Shader;
}
