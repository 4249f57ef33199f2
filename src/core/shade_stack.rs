// Copyright @yucwang 2026

use crate::core::trace_result::TraceResult;
use crate::math::constants::Vector3f;
use crate::math::ray::Ray3f;
use crate::math::spectrum::SampledSpectrum;

const DONE_FLAG: u32 = 1 << 31;
const SAMPLE_MASK: u32 = !DONE_FLAG;

/// One node of the bounce tree being evaluated for a single pixel sample.
#[derive(Debug, Copy, Clone)]
pub struct ShadeFrame {
    // Low 31 bits: bounce rays spawned so far. Top bit: resolved.
    state: u32,
    pub radiance_sum: SampledSpectrum,
    pub ray: Ray3f,
    pub trace: TraceResult,
}

impl ShadeFrame {
    pub fn new(ray: Ray3f, trace: TraceResult) -> Self {
        Self { state: 0, radiance_sum: SampledSpectrum::black(), ray, trace }
    }

    pub fn sample_count(&self) -> u32 {
        self.state & SAMPLE_MASK
    }

    pub fn is_done(&self) -> bool {
        self.state & DONE_FLAG != 0
    }

    pub fn mark_done(&mut self) {
        self.state |= DONE_FLAG;
    }

    pub fn increment_samples(&mut self) {
        debug_assert!(self.sample_count() < SAMPLE_MASK);
        self.state += 1;
    }

    pub fn hit_point(&self) -> Vector3f {
        self.ray.at(self.trace.distance)
    }
}

/// Explicit call stack for the integrator. Reused across samples by one thread.
#[derive(Debug, Default)]
pub struct ShadeStack {
    frames: Vec<ShadeFrame>,
    high_water: usize,
}

impl ShadeStack {
    pub fn new() -> Self {
        Self { frames: Vec::new(), high_water: 0 }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { frames: Vec::with_capacity(capacity), high_water: 0 }
    }

    pub fn push(&mut self, frame: ShadeFrame) {
        self.frames.push(frame);
        self.high_water = self.high_water.max(self.frames.len());
    }

    pub fn pop(&mut self) -> Option<ShadeFrame> {
        self.frames.pop()
    }

    pub fn top(&self) -> Option<&ShadeFrame> {
        self.frames.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut ShadeFrame> {
        self.frames.last_mut()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Deepest the stack has been since construction or the last reset.
    pub fn high_water_mark(&self) -> usize {
        self.high_water
    }

    pub fn reset_high_water_mark(&mut self) {
        self.high_water = self.frames.len();
    }
}

#[cfg(test)]
mod tests {
    use super::{ ShadeFrame, ShadeStack };
    use crate::core::trace_result::TraceResult;
    use crate::math::constants::Vector3f;
    use crate::math::ray::Ray3f;

    fn frame() -> ShadeFrame {
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None);
        ShadeFrame::new(ray, TraceResult::miss())
    }

    #[test]
    fn test_done_flag_does_not_touch_counter() {
        let mut f = frame();
        for _ in 0..5 {
            f.increment_samples();
        }
        assert!(!f.is_done());
        f.mark_done();
        assert!(f.is_done());
        assert_eq!(f.sample_count(), 5);
    }

    #[test]
    fn test_high_water_mark() {
        let mut stack = ShadeStack::with_capacity(4);
        stack.push(frame());
        stack.push(frame());
        stack.push(frame());
        assert_eq!(stack.pop().map(|f| f.sample_count()), Some(0));
        stack.clear();
        assert!(stack.is_empty());
        assert_eq!(stack.high_water_mark(), 3);
        stack.reset_high_water_mark();
        assert_eq!(stack.high_water_mark(), 0);
    }
}
