// Copyright @yucwang 2023

use super::constants::{ PI, Float, Vector3f };

/// Direction for polar angle `theta` (measured from +Y) and azimuth `phi`.
/// +Y plays the role of the surface normal.
pub fn spherical_to_cartesian(theta: Float, phi: Float) -> Vector3f {
    let (sin_theta, cos_theta) = theta.sin_cos();
    let (sin_phi, cos_phi) = phi.sin_cos();

    Vector3f::new(sin_theta * sin_phi, cos_theta, sin_theta * cos_phi)
}

/// Stratified layout of a hemisphere around +Y.
///
/// `pitch_range` in (0, 1] is the fraction of the quarter turn covered by the
/// polar strata; grazing directions beyond it are never generated.
#[derive(Debug, Copy, Clone)]
pub struct HemisphereStrata {
    pitch_samples: usize,
    yaw_samples: usize,
    pitch_offset: Float,
    pitch_step: Float,
    yaw_step: Float,
}

impl HemisphereStrata {
    pub fn new(pitch_samples: usize, yaw_samples: usize, pitch_range: Float) -> Self {
        let pitch_samples = pitch_samples.max(1);
        let yaw_samples = yaw_samples.max(1);
        Self {
            pitch_samples,
            yaw_samples,
            pitch_offset: 1.0 - pitch_range,
            pitch_step: (pitch_range * PI * 0.5) / pitch_samples as Float,
            yaw_step: (2.0 * PI) / yaw_samples as Float,
        }
    }

    pub fn sample_count(&self) -> usize {
        self.pitch_samples * self.yaw_samples
    }

    /// Direction inside stratum `index`, placed at `(u, v)` in [0, 1)^2 within
    /// the stratum. `(0.5, 0.5)` gives the stratum centre.
    pub fn direction(&self, index: usize, u: Float, v: Float) -> Vector3f {
        debug_assert!(index < self.sample_count());
        let pitch = (index % self.pitch_samples) as Float;
        let yaw = (index / self.pitch_samples) as Float;

        let pitch_lower = self.pitch_offset + self.pitch_step * pitch;
        let theta = pitch_lower + self.pitch_step * u;
        let phi = self.yaw_step * (yaw + v);

        spherical_to_cartesian(theta, phi)
    }
}
