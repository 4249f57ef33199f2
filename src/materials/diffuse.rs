// Copyright @yucwang 2023

use crate::core::computation_node::ComputationNode;
use crate::core::provider::ShadingProvider;
use crate::core::shader::{ Radiance, Shader };
use crate::core::trace_result::TraceResult;
use crate::math::ray::Ray3f;
use crate::math::spectrum::SampledSpectrum;

/// Averages the light gathered over the hemisphere, weighted by the cosine
/// to the normal and an inverse-distance falloff.
pub struct Diffuse {
    albedo: SampledSpectrum
}

impl Default for Diffuse {
    fn default() -> Self {
        Self { albedo: SampledSpectrum::white() }
    }
}

impl ComputationNode for Diffuse {
    fn to_string(&self) -> String {
        format!("Diffuse: {{ albedo: {:?} }}", self.albedo)
    }
}

impl Shader for Diffuse {
    fn shade(&self,
             sample_count: u32,
             radiance_sum: &SampledSpectrum,
             _trace: &TraceResult,
             _ray: &Ray3f,
             local_color: &SampledSpectrum) -> SampledSpectrum {
        if sample_count == 0 {
            return SampledSpectrum::black();
        }

        *local_color * self.albedo * (*radiance_sum / sample_count as f32)
    }

    fn accumulate(&self,
                  parent: &TraceResult,
                  incoming: &Radiance,
                  ray: &Ray3f,
                  shading: &dyn ShadingProvider,
                  radiance_sum: &mut SampledSpectrum) {
        if !incoming.trace.is_hit() {
            return;
        }

        let normal = shading.surface_frame(&parent.geo_id).normal;
        // Bounce rays leave on the lit side, whichever way the mesh is wound.
        let angular = ray.dir().dot(&normal).abs();
        let distance = incoming.trace.distance;
        let falloff = if distance >= 1.0 { 1.0 / distance } else { 1.0 };

        *radiance_sum += incoming.color * (angular * falloff);
    }

    fn needs_rays(&self) -> bool {
        true
    }
}

impl Diffuse {
    pub fn new(albedo: SampledSpectrum) -> Self {
        Self { albedo }
    }
}

#[cfg(test)]
mod tests {
    use super::Diffuse;
    use crate::core::provider::ShadingProvider;
    use crate::core::shader::{ Radiance, Shader };
    use crate::core::tangent_frame::SurfaceFrame;
    use crate::core::trace_result::{ GeoId, TraceResult };
    use crate::materials::white_light::WhiteLight;
    use crate::math::constants::Vector3f;
    use crate::math::ray::Ray3f;
    use crate::math::spectrum::SampledSpectrum;

    struct FlatGround {
        light: WhiteLight,
    }

    impl ShadingProvider for FlatGround {
        fn surface_frame(&self, _geo_id: &GeoId) -> SurfaceFrame {
            SurfaceFrame::from_normal(&Vector3f::new(0.0, 1.0, 0.0))
        }

        fn surface_shader(&self, _geo_id: &GeoId) -> &dyn Shader {
            &self.light
        }
    }

    #[test]
    fn test_shade_without_samples_is_black() {
        let diffuse = Diffuse::default();
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None);
        let color = diffuse.shade(0, &SampledSpectrum::splat(5.0), &TraceResult::miss(), &ray, &SampledSpectrum::white());
        assert!(color.is_black());
    }

    #[test]
    fn test_accumulate_weights_by_cosine_and_distance() {
        let ground = FlatGround { light: WhiteLight::new(1.0) };
        let diffuse = Diffuse::default();
        let parent = TraceResult::new(1.0, GeoId::new(1, 0));
        let mut sum = SampledSpectrum::black();

        // Straight up, close light: full weight.
        let up = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 1.0, 0.0), None, None);
        let near = Radiance { trace: TraceResult::new(0.5, GeoId::new(2, 0)), color: SampledSpectrum::splat(2.0) };
        diffuse.accumulate(&parent, &near, &up, &ground, &mut sum);
        assert!((sum.sample(0) - 2.0).abs() < 1e-6);

        // 60 degrees off the normal, four units away.
        let slanted = Ray3f::new(Vector3f::zeros(), Vector3f::new(3.0f32.sqrt(), 1.0, 0.0), None, None);
        let far = Radiance { trace: TraceResult::new(4.0, GeoId::new(2, 0)), color: SampledSpectrum::splat(2.0) };
        diffuse.accumulate(&parent, &far, &slanted, &ground, &mut sum);
        assert!((sum.sample(1) - 2.25).abs() < 1e-5);

        // Misses add nothing.
        let miss = Radiance { trace: TraceResult::miss(), color: SampledSpectrum::splat(9.0) };
        diffuse.accumulate(&parent, &miss, &up, &ground, &mut sum);
        assert!((sum.sample(2) - 2.25).abs() < 1e-5);

        let shaded = diffuse.shade(2, &sum, &parent, &up, &SampledSpectrum::white());
        assert!((shaded.sample(0) - 1.125).abs() < 1e-5);
    }
}
