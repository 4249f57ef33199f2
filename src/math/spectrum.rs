// Copyright 2020 @TwoCookingMice

use super::constants::{Float, Vector3f, Vector4f};

use std::ops;

pub const SPECTRUM_SAMPLES: usize = 3;

/// Display colour written into the output image.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RGBSpectrum {
    rgb: Vector3f
}

impl Default for RGBSpectrum {
    fn default() -> Self {
        Self { rgb: Vector3f::new(0.0f32, 0.0f32, 0.0f32) }
    }
}

impl RGBSpectrum {
    pub fn new(r: Float, g: Float, b: Float) -> Self {
        Self { rgb: Vector3f::new(r, g, b) }
    }

    pub fn r(&self) -> Float { self.rgb[0] }
    pub fn g(&self) -> Float { self.rgb[1] }
    pub fn b(&self) -> Float { self.rgb[2] }

    pub fn is_black(&self) -> bool {
        self.rgb.iter().all(|c| *c == 0.0)
    }

    pub fn to_rgba(&self) -> Vector4f {
        Vector4f::new(self.rgb[0], self.rgb[1], self.rgb[2], 1.0)
    }
}

/// Radiance carried through the shading tree, one value per wavelength band.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SampledSpectrum {
    samples: [Float; SPECTRUM_SAMPLES]
}

impl Default for SampledSpectrum {
    fn default() -> Self {
        Self::splat(0.0)
    }
}

impl SampledSpectrum {
    pub fn new(samples: [Float; SPECTRUM_SAMPLES]) -> Self {
        Self { samples }
    }

    pub fn splat(value: Float) -> Self {
        Self { samples: [value; SPECTRUM_SAMPLES] }
    }

    pub fn black() -> Self {
        Self::splat(0.0)
    }

    pub fn white() -> Self {
        Self::splat(1.0)
    }

    pub fn sample(&self, band: usize) -> Float {
        self.samples[band]
    }

    pub fn is_black(&self) -> bool {
        self.samples.iter().all(|s| *s == 0.0)
    }

    // Bands map to channels in order: long, middle, short.
    pub fn to_rgb(&self) -> RGBSpectrum {
        RGBSpectrum::new(self.samples[0], self.samples[1], self.samples[2])
    }
}

impl ops::Add for SampledSpectrum {
    type Output = SampledSpectrum;

    fn add(self, rhs: SampledSpectrum) -> SampledSpectrum {
        let mut out = self;
        out += rhs;
        out
    }
}

impl ops::AddAssign for SampledSpectrum {
    fn add_assign(&mut self, rhs: SampledSpectrum) {
        for (s, r) in self.samples.iter_mut().zip(rhs.samples.iter()) {
            *s += *r;
        }
    }
}

impl ops::Mul for SampledSpectrum {
    type Output = SampledSpectrum;

    fn mul(self, rhs: SampledSpectrum) -> SampledSpectrum {
        let mut out = self;
        for (s, r) in out.samples.iter_mut().zip(rhs.samples.iter()) {
            *s *= *r;
        }
        out
    }
}

impl ops::Mul<Float> for SampledSpectrum {
    type Output = SampledSpectrum;

    fn mul(self, rhs: Float) -> SampledSpectrum {
        let mut out = self;
        for s in out.samples.iter_mut() {
            *s *= rhs;
        }
        out
    }
}

impl ops::Div<Float> for SampledSpectrum {
    type Output = SampledSpectrum;

    fn div(self, rhs: Float) -> SampledSpectrum {
        self * (1.0 / rhs)
    }
}
