// Copyright @yucwang 2026

use crate::math::constants::Float;

/// 64-bit LCG. Cheap, per-thread, never shared.
#[derive(Debug, Clone)]
pub struct LcgRng {
    state: u64,
}

impl LcgRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Decorrelated stream for one worker thread.
    pub fn for_stream(seed: u64, stream: u64) -> Self {
        let mut rng = Self::new(seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        // Throw away the first outputs, they are close to the seed.
        rng.next_u32();
        rng.next_u32();
        rng
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.state >> 32) as u32
    }

    /// Uniform in [0, 1).
    pub fn next_f32(&mut self) -> Float {
        ((self.next_u32() >> 8) as Float) * (1.0 / 16_777_216.0)
    }

    /// Uniform in [lower, upper).
    pub fn next_range(&mut self, lower: Float, upper: Float) -> Float {
        lower + (upper - lower) * self.next_f32()
    }
}

#[cfg(test)]
mod tests {
    use super::LcgRng;

    #[test]
    fn test_unit_interval() {
        let mut rng = LcgRng::new(7);
        for _ in 0..10_000 {
            let u = rng.next_f32();
            assert!(u >= 0.0 && u < 1.0);
        }
        for _ in 0..1_000 {
            let v = rng.next_range(-2.0, 3.0);
            assert!(v >= -2.0 && v < 3.0);
        }
    }

    #[test]
    fn test_streams_differ() {
        let mut a = LcgRng::for_stream(1, 0);
        let mut b = LcgRng::for_stream(1, 1);
        let same = (0..16).filter(|_| a.next_u32() == b.next_u32()).count();
        assert!(same < 16);
    }
}
