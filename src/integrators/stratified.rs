// Copyright @yucwang 2026

use crate::core::computation_node::ComputationNode;
use crate::core::integrator::{ Integrator, ThreadContext };
use crate::core::kdtree::SearchCache;
use crate::core::provider::{ GeometryProvider, ShadingProvider };
use crate::core::rng::LcgRng;
use crate::core::shade_stack::{ ShadeFrame, ShadeStack };
use crate::core::shader::Radiance;
use crate::math::constants::Float;
use crate::math::ray::Ray3f;
use crate::math::spectrum::SampledSpectrum;
use crate::math::warp::HemisphereStrata;

// Polar strata stop short of grazing angles.
const IGNORE_RAYS_CLOSE_TO_SURFACE: Float = 0.9;

pub const DEFAULT_RAY_POSITION_OFFSET: Float = 1e-4;

/// Monte-Carlo gathering over stratified hemispheres, evaluated on an
/// explicit frame stack instead of recursion.
///
/// `quality_level` Q gives Q polar by 4Q azimuthal strata per bounce.
/// A frame at depth `max_ray_depth` never bounces, so the stack holds at most
/// `max(max_ray_depth, 1)` frames.
pub struct StratifiedIntegrator {
    max_ray_depth: usize,
    quality_level: u32,
    strata: HemisphereStrata,
    ray_position_offset: Float,
}

impl ComputationNode for StratifiedIntegrator {
    fn to_string(&self) -> String {
        format!("StratifiedIntegrator: {{ max_ray_depth: {}, quality: {}, samples: {} }}",
                self.max_ray_depth, self.quality_level, self.samples_per_hemisphere())
    }
}

impl Integrator for StratifiedIntegrator {
    fn trace_ray_forward(&self,
                         ray: &Ray3f,
                         geometry: &dyn GeometryProvider,
                         shading: &dyn ShadingProvider,
                         ctx: &mut ThreadContext) -> SampledSpectrum {
        let ThreadContext { cache, stack, rng } = ctx;
        let trace = geometry.trace(ray, cache);
        let mut root = ShadeFrame::new(*ray, trace);

        while self.next(&mut root, stack, geometry, shading, cache, rng) {}

        self.compute_color(&root, shading)
    }
}

impl StratifiedIntegrator {
    pub fn new(max_ray_depth: u32, quality_level: u32, ray_position_offset: Float) -> Self {
        let q = quality_level.max(1) as usize;
        Self {
            max_ray_depth: max_ray_depth as usize,
            quality_level: q as u32,
            strata: HemisphereStrata::new(q, 4 * q, IGNORE_RAYS_CLOSE_TO_SURFACE),
            ray_position_offset,
        }
    }

    pub fn max_ray_depth(&self) -> usize {
        self.max_ray_depth
    }

    pub fn samples_per_hemisphere(&self) -> u32 {
        self.strata.sample_count() as u32
    }

    /// Runs the frame stack until `root` is resolved. Returns false once the
    /// root was already done, so `while integrator.next(..) {}` terminates.
    /// `stack` is empty on entry and on return.
    pub fn next(&self,
                root: &mut ShadeFrame,
                stack: &mut ShadeStack,
                geometry: &dyn GeometryProvider,
                shading: &dyn ShadingProvider,
                cache: &mut SearchCache,
                rng: &mut LcgRng) -> bool {
        if root.is_done() {
            return false;
        }
        debug_assert!(stack.is_empty());
        stack.push(*root);

        loop {
            let depth = stack.len();
            let top = match stack.top() {
                Some(frame) => *frame,
                None => break,
            };

            if self.wants_bounce(&top, depth, shading) {
                let bounce = self.bounce_ray(&top, shading, rng);
                if let Some(frame) = stack.top_mut() {
                    frame.increment_samples();
                }
                let trace = geometry.trace(&bounce, cache);
                stack.push(ShadeFrame::new(bounce, trace));
            } else if depth > 1 {
                let color = self.compute_color(&top, shading);
                stack.pop();
                if let Some(parent) = stack.top_mut() {
                    let incoming = Radiance { trace: top.trace, color };
                    shading.surface_shader(&parent.trace.geo_id)
                        .accumulate(&parent.trace, &incoming, &top.ray, shading, &mut parent.radiance_sum);
                }
            } else {
                if let Some(frame) = stack.top_mut() {
                    frame.mark_done();
                }
                break;
            }
        }

        if let Some(resolved) = stack.pop() {
            *root = resolved;
        }
        debug_assert!(stack.is_empty());
        true
    }

    /// Shaded colour of a resolved frame; black for rays that escaped.
    pub fn compute_color(&self, frame: &ShadeFrame, shading: &dyn ShadingProvider) -> SampledSpectrum {
        if !frame.trace.is_hit() {
            return SampledSpectrum::black();
        }
        shading.surface_shader(&frame.trace.geo_id).shade(frame.sample_count(),
                                                          &frame.radiance_sum,
                                                          &frame.trace,
                                                          &frame.ray,
                                                          &SampledSpectrum::white())
    }

    fn wants_bounce(&self, frame: &ShadeFrame, depth: usize, shading: &dyn ShadingProvider) -> bool {
        frame.trace.is_hit()
            && depth < self.max_ray_depth
            && frame.sample_count() < self.samples_per_hemisphere()
            && shading.surface_shader(&frame.trace.geo_id).needs_rays()
    }

    fn bounce_ray(&self, frame: &ShadeFrame, shading: &dyn ShadingProvider, rng: &mut LcgRng) -> Ray3f {
        let surface = shading.surface_frame(&frame.trace.geo_id).facing(&frame.ray.dir());
        let local = self.strata.direction(frame.sample_count() as usize, rng.next_f32(), rng.next_f32());
        let dir = surface.local_to_world(&local);
        Ray3f::spawn(frame.hit_point(), dir, self.ray_position_offset)
    }
}
