// Copyright @yucwang 2021

use crate::core::computation_node::ComputationNode;
use crate::core::image::{ ImageSink, SharedImage };
use crate::core::integrator::{ Integrator, ThreadContext };
use crate::core::provider::{ GeometryProvider, ShadingProvider };
use crate::renderers::thread_bundle::WorkerControl;
use crate::renderers::tile::{ BlockGrid, Tile };
use crate::sensors::pinhole::PinholeCamera;

use std::sync::atomic::{ AtomicUsize, Ordering };
use std::sync::Arc;
use std::thread;

/// Everything the render workers share. A unit of work is one block of the
/// image for one sample pass; units are claimed through an atomic counter.
pub struct RenderJob<I: ImageSink> {
    image: Arc<SharedImage<I>>,
    geometry: Arc<dyn GeometryProvider>,
    shading: Arc<dyn ShadingProvider>,
    integrator: Box<dyn Integrator>,
    camera: PinholeCamera,
    grid: BlockGrid,
    samples_per_pixel: usize,
    seed: u64,
    next_unit: AtomicUsize,
    // Passes already merged into each block.
    block_passes: Vec<AtomicUsize>,
}

impl<I: ImageSink> ComputationNode for RenderJob<I> {
    fn to_string(&self) -> String {
        format!("RenderJob: {{ {}x{}, spp: {}, blocks: {}, integrator: {} }}",
                self.image.width(), self.image.height(), self.samples_per_pixel,
                self.grid.block_count(), self.integrator.to_string())
    }
}

impl<I: ImageSink> RenderJob<I> {
    pub fn new(image: Arc<SharedImage<I>>,
               geometry: Arc<dyn GeometryProvider>,
               shading: Arc<dyn ShadingProvider>,
               integrator: Box<dyn Integrator>,
               samples_per_pixel: usize,
               thread_count: usize) -> Self {
        let (width, height) = (image.width(), image.height());
        let grid = BlockGrid::new(width, height, thread_count);
        let block_passes = (0..grid.block_count()).map(|_| AtomicUsize::new(0)).collect();
        Self {
            image,
            geometry,
            shading,
            integrator,
            camera: PinholeCamera::new(width, height),
            grid,
            samples_per_pixel,
            seed: 0x5eed,
            next_unit: AtomicUsize::new(0),
            block_passes,
        }
    }

    pub fn set_camera(&mut self, camera: PinholeCamera) {
        self.camera = camera;
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }

    pub fn grid(&self) -> &BlockGrid {
        &self.grid
    }

    pub fn total_units(&self) -> usize {
        self.grid.block_count() * self.samples_per_pixel
    }

    /// Pixel samples in the whole render; the progress counter ends here.
    pub fn total_pixel_samples(&self) -> usize {
        self.image.width() * self.image.height() * self.samples_per_pixel
    }

    pub fn image(&self) -> &Arc<SharedImage<I>> {
        &self.image
    }

    /// Sample passes merged into `block` so far.
    pub fn completed_passes(&self, block: usize) -> usize {
        self.block_passes[block].load(Ordering::Acquire)
    }

    /// Worker body: claim units until none are left or a stop is requested.
    pub fn run(&self, thread_index: usize, control: &WorkerControl) {
        let mut ctx = ThreadContext::new(self.seed, thread_index);
        let mut tile = Tile::new();
        let total_units = self.total_units();
        let block_count = self.grid.block_count();
        let mut processed = 0usize;

        loop {
            if control.should_stop() {
                break;
            }
            let unit = self.next_unit.fetch_add(1, Ordering::AcqRel);
            if unit >= total_units {
                break;
            }
            let block = unit % block_count;
            let pass = unit / block_count;

            // Passes of one block are merged in order; the earlier pass was
            // claimed first, so its worker is already running.
            if !self.wait_for_pass(block, pass, control) {
                break;
            }
            if !self.render_unit(block, pass, &mut tile, &mut ctx, control) {
                break;
            }
            self.block_passes[block].store(pass + 1, Ordering::Release);
            control.progress_increment(tile.rect().area());
            processed += 1;
        }

        log::debug!("Render thread {} exits after {} units (stack high water {}).",
                    thread_index, processed, ctx.stack.high_water_mark());
    }

    // Spins with yield_now; only contended when threads outnumber free blocks.
    fn wait_for_pass(&self, block: usize, pass: usize, control: &WorkerControl) -> bool {
        while self.block_passes[block].load(Ordering::Acquire) != pass {
            if control.should_stop() {
                return false;
            }
            thread::yield_now();
        }
        true
    }

    // Returns false when interrupted; nothing is written back in that case.
    fn render_unit(&self,
                   block: usize,
                   pass: usize,
                   tile: &mut Tile,
                   ctx: &mut ThreadContext,
                   control: &WorkerControl) -> bool {
        let rect = self.grid.block(block);
        self.image.inspect(|image| tile.load(rect, image));

        let geometry = self.geometry.as_ref();
        let shading = self.shading.as_ref();
        for ly in 0..rect.height {
            for lx in 0..rect.width {
                if control.should_stop() {
                    return false;
                }
                let jx = ctx.rng.next_f32();
                let jy = ctx.rng.next_f32();
                let ray = self.camera.generate_ray(rect.x0 + lx, rect.y0 + ly, jx, jy);
                let radiance = self.integrator.trace_ray_forward(&ray, geometry, shading, ctx);
                tile.merge_sample(lx, ly, &radiance.to_rgb().to_rgba(), pass);
            }
        }

        self.image.update(|image| tile.store(image));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::RenderJob;
    use crate::core::image::{ ImageSink, SharedImage };
    use crate::core::scene::SimpleScene;
    use crate::integrators::stratified::{ StratifiedIntegrator, DEFAULT_RAY_POSITION_OFFSET };
    use crate::math::bitmap::Bitmap;
    use crate::renderers::thread_bundle::WorkerControl;

    use std::sync::Arc;

    fn job(width: usize, height: usize, spp: usize) -> RenderJob<Bitmap> {
        let scene = Arc::new(SimpleScene::builder().with_environment(20.0, 3.0).build());
        let image = Arc::new(SharedImage::new(Bitmap::new(width, height)));
        let integrator = Box::new(StratifiedIntegrator::new(1, 1, DEFAULT_RAY_POSITION_OFFSET));
        RenderJob::new(image, scene.clone(), scene, integrator, spp, 1)
    }

    #[test]
    fn test_single_worker_fills_image() {
        let job = job(9, 6, 3);
        let control = WorkerControl::default();
        job.run(0, &control);

        assert_eq!(control.progress_read(), job.total_pixel_samples());
        let view = job.image().read();
        assert!(view.has_new_content());
        for y in 0..6 {
            for x in 0..9 {
                let pixel = view.get_pixel(x, y);
                assert!((pixel[0] - 3.0).abs() < 1e-4);
                assert!((pixel[3] - 1.0).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_stopped_worker_writes_nothing() {
        let job = job(8, 8, 2);
        let control = WorkerControl::default();
        control.request_stop();
        job.run(0, &control);

        assert_eq!(control.progress_read(), 0);
        assert!(!job.image().read().has_new_content());
    }
}
