// Copyright @yucwang 2026

use crate::core::computation_node::ComputationNode;
use crate::core::provider::ShadingProvider;
use crate::core::shader::{ Radiance, Shader };
use crate::core::trace_result::TraceResult;
use crate::math::constants::Float;
use crate::math::ray::Ray3f;
use crate::math::spectrum::SampledSpectrum;

/// Constant emitter. Never asks for more rays.
pub struct WhiteLight {
    intensity: SampledSpectrum
}

impl ComputationNode for WhiteLight {
    fn to_string(&self) -> String {
        format!("WhiteLight: {{ intensity: {:?} }}", self.intensity)
    }
}

impl Shader for WhiteLight {
    fn shade(&self,
             _sample_count: u32,
             _radiance_sum: &SampledSpectrum,
             _trace: &TraceResult,
             _ray: &Ray3f,
             _local_color: &SampledSpectrum) -> SampledSpectrum {
        self.intensity
    }

    fn accumulate(&self,
                  _parent: &TraceResult,
                  _incoming: &Radiance,
                  _ray: &Ray3f,
                  _shading: &dyn ShadingProvider,
                  _radiance_sum: &mut SampledSpectrum) {
    }

    fn needs_rays(&self) -> bool {
        false
    }
}

impl WhiteLight {
    pub fn new(intensity: Float) -> Self {
        Self { intensity: SampledSpectrum::splat(intensity) }
    }

    pub fn intensity(&self) -> SampledSpectrum {
        self.intensity
    }
}
