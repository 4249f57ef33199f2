// Copyright @yucwang 2026

use crate::core::computation_node::ComputationNode;
use crate::core::provider::ShadingProvider;
use crate::core::trace_result::TraceResult;
use crate::math::ray::Ray3f;
use crate::math::spectrum::SampledSpectrum;

/// Shaded colour of one child ray, handed to its parent's shader.
#[derive(Debug, Copy, Clone)]
pub struct Radiance {
    pub trace: TraceResult,
    pub color: SampledSpectrum,
}

/// Material contract driven by the integrator.
pub trait Shader: ComputationNode + Send + Sync {
    /// Outgoing colour of a resolved frame. Must depend only on its arguments.
    fn shade(&self,
             sample_count: u32,
             radiance_sum: &SampledSpectrum,
             trace: &TraceResult,
             ray: &Ray3f,
             local_color: &SampledSpectrum) -> SampledSpectrum;

    /// Folds one child's colour into the parent's running sum. `ray` is the
    /// child ray, `parent` is where it started.
    fn accumulate(&self,
                  parent: &TraceResult,
                  incoming: &Radiance,
                  ray: &Ray3f,
                  shading: &dyn ShadingProvider,
                  radiance_sum: &mut SampledSpectrum);

    fn needs_rays(&self) -> bool;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ShaderId(usize);

impl ShaderId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Owns every shader of a scene; geometry refers to them by `ShaderId`.
#[derive(Default)]
pub struct ShaderSet {
    shaders: Vec<Box<dyn Shader>>,
}

impl ShaderSet {
    pub fn new() -> Self {
        Self { shaders: Vec::new() }
    }

    pub fn add(&mut self, shader: Box<dyn Shader>) -> ShaderId {
        log::debug!("Registering shader {}: {}", self.shaders.len(), shader.to_string());
        self.shaders.push(shader);
        ShaderId(self.shaders.len() - 1)
    }

    /// Ids only come from `add`, so lookups stay in range.
    pub fn get(&self, id: ShaderId) -> &dyn Shader {
        self.shaders[id.0].as_ref()
    }

    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::ShaderSet;
    use crate::materials::diffuse::Diffuse;
    use crate::materials::white_light::WhiteLight;

    #[test]
    fn test_shader_set_hands_out_stable_ids() {
        let mut set = ShaderSet::new();
        assert!(set.is_empty());
        let diffuse = set.add(Box::new(Diffuse::default()));
        let light = set.add(Box::new(WhiteLight::new(40.0)));
        assert_ne!(diffuse, light);
        assert_eq!(set.len(), 2);
        assert!(set.get(diffuse).needs_rays());
        assert!(!set.get(light).needs_rays());
    }
}
