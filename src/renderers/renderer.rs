// Copyright @yucwang 2021

use crate::core::computation_node::ComputationNode;
use crate::core::image::{ ImageReadLock, ImageSink, SharedImage };
use crate::core::provider::{ GeometryProvider, ShadingProvider };
use crate::integrators::stratified::{ StratifiedIntegrator, DEFAULT_RAY_POSITION_OFFSET };
use crate::math::constants::Float;
use crate::renderers::render_threads::RenderJob;
use crate::renderers::thread_bundle::{ resolve_thread_count, ProgressReader, RenderError, ThreadBundle };
use crate::sensors::pinhole::PinholeCamera;

use std::sync::Arc;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RenderState {
    Starting,
    Running,
    Finishing,
    Finished,
}

/// Drives a progressive render one step at a time.
///
/// `advance` moves Starting -> Running -> Finishing -> Finished and never
/// goes back. The caller decides how often to poll, and can take `read`
/// snapshots of the image in between.
pub struct Renderer<I: ImageSink + 'static> {
    state: RenderState,
    history: Vec<RenderState>,
    job: Arc<RenderJob<I>>,
    threads: ThreadBundle,
    progress: ProgressReader,
}

impl<I: ImageSink + 'static> ComputationNode for Renderer<I> {
    fn to_string(&self) -> String {
        format!("Renderer: {{ state: {:?}, threads: {}, job: {} }}",
                self.state, self.threads.thread_count(), self.job.to_string())
    }
}

impl<I: ImageSink + 'static> Renderer<I> {
    pub fn new(image: I,
               samples_per_pixel: usize,
               quality_level: u32,
               max_ray_depth: u32,
               geometry: Arc<dyn GeometryProvider>,
               shading: Arc<dyn ShadingProvider>,
               thread_count: usize) -> Self {
        let thread_count = resolve_thread_count(thread_count);
        let image = Arc::new(SharedImage::new(image));
        let integrator = StratifiedIntegrator::new(max_ray_depth, quality_level, DEFAULT_RAY_POSITION_OFFSET);
        let job = RenderJob::new(image,
                                 geometry,
                                 shading,
                                 Box::new(integrator),
                                 samples_per_pixel,
                                 thread_count);
        let threads = ThreadBundle::new("render", thread_count);
        let progress = threads.progress_reader(job.total_pixel_samples());

        Self {
            state: RenderState::Starting,
            history: vec![RenderState::Starting],
            job: Arc::new(job),
            threads,
            progress,
        }
    }

    /// Only effective before the first `advance`.
    pub fn set_camera(&mut self, camera: PinholeCamera) {
        match Arc::get_mut(&mut self.job) {
            Some(job) => job.set_camera(camera),
            None => log::warn!("Camera change ignored: render already started."),
        }
    }

    pub fn set_seed(&mut self, seed: u64) {
        match Arc::get_mut(&mut self.job) {
            Some(job) => job.set_seed(seed),
            None => log::warn!("Seed change ignored: render already started."),
        }
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Every state entered so far, oldest first.
    pub fn history(&self) -> &[RenderState] {
        &self.history
    }

    /// Zero requested threads resolves to the hardware concurrency.
    pub fn thread_count(&self) -> usize {
        self.threads.thread_count()
    }

    /// Performs one step of the state machine. Returns false once finished.
    pub fn advance(&mut self) -> Result<bool, RenderError> {
        match self.state {
            RenderState::Starting => {
                let job = Arc::clone(&self.job);
                self.threads.start(move |index, control| job.run(index, control))?;
                log::info!("Rendering started: {}.", self.job.to_string());
                self.transition(RenderState::Running);
                Ok(true)
            }
            RenderState::Running => {
                if !self.progress.next() || self.threads.should_stop() {
                    self.transition(RenderState::Finishing);
                }
                Ok(true)
            }
            RenderState::Finishing => {
                self.transition(RenderState::Finished);
                self.threads.join()?;
                Ok(false)
            }
            RenderState::Finished => Ok(false),
        }
    }

    pub fn percent_complete(&self) -> Float {
        self.progress.percent_complete()
    }

    pub fn progress(&self) -> &ProgressReader {
        &self.progress
    }

    /// Asks every worker to return. Blocks already written stay in the image.
    pub fn stop(&self) {
        self.threads.stop();
    }

    /// Waits for every worker, then finishes. Without a prior `stop` this
    /// waits for the whole render.
    pub fn join(&mut self) -> Result<(), RenderError> {
        debug_assert!(self.state != RenderState::Starting, "join before start");
        if self.state == RenderState::Finished {
            return Ok(());
        }
        if self.state != RenderState::Finishing {
            self.transition(RenderState::Finishing);
        }
        let joined = self.threads.join();
        self.transition(RenderState::Finished);
        joined
    }

    /// Scoped read access; `has_new_content` reports writes since the last call.
    pub fn read(&self) -> ImageReadLock<'_, I> {
        self.job.image().read()
    }

    pub fn image(&self) -> &Arc<SharedImage<I>> {
        self.job.image()
    }

    pub fn job(&self) -> &RenderJob<I> {
        &self.job
    }

    fn transition(&mut self, next: RenderState) {
        debug_assert!(next as u8 > self.state as u8);
        log::info!("Renderer: {:?} -> {:?} ({:.1}%).", self.state, next, self.percent_complete());
        self.state = next;
        self.history.push(next);
    }
}

#[cfg(test)]
mod tests {
    use super::{ RenderState, Renderer };
    use crate::core::image::ImageSink;
    use crate::core::scene::SimpleScene;
    use crate::math::bitmap::Bitmap;
    use crate::math::constants::Vector3f;
    use crate::shapes::triangle::Triangle;

    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn sky_only(intensity: f32) -> Arc<SimpleScene> {
        Arc::new(SimpleScene::builder().with_environment(20.0, intensity).build())
    }

    fn floor_scene() -> Arc<SimpleScene> {
        let mut builder = SimpleScene::builder();
        let shader = builder.default_shader();
        builder.add_mesh(vec![
            Triangle::new(Vector3f::new(-5.0, -1.0, 0.0), Vector3f::new(-5.0, -1.0, 10.0), Vector3f::new(5.0, -1.0, 10.0)),
            Triangle::new(Vector3f::new(-5.0, -1.0, 0.0), Vector3f::new(5.0, -1.0, 10.0), Vector3f::new(5.0, -1.0, 0.0)),
        ], shader);
        Arc::new(builder.build())
    }

    fn run_to_end(renderer: &mut Renderer<Bitmap>) -> Vec<RenderState> {
        let mut states = vec![renderer.state()];
        loop {
            let busy = renderer.advance().unwrap_or(false);
            if states.last() != Some(&renderer.state()) {
                states.push(renderer.state());
            }
            if !busy {
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }
        states
    }

    #[test]
    fn test_state_sequence() {
        let scene = sky_only(2.0);
        let mut renderer = Renderer::new(Bitmap::new(8, 8), 1, 1, 1, scene.clone(), scene, 2);
        assert_eq!(renderer.state(), RenderState::Starting);

        let states = run_to_end(&mut renderer);
        assert_eq!(states, vec![RenderState::Starting,
                                RenderState::Running,
                                RenderState::Finishing,
                                RenderState::Finished]);
        assert!(matches!(renderer.advance(), Ok(false)));
        assert_eq!(renderer.state(), RenderState::Finished);
        assert_eq!(renderer.history(), &states[..]);
        assert_eq!(renderer.percent_complete(), 100.0);
    }

    #[test]
    fn test_zero_threads_uses_every_core() {
        let scene = sky_only(1.0);
        let mut renderer = Renderer::new(Bitmap::new(6, 6), 1, 1, 1, scene.clone(), scene, 0);
        let hardware = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        assert_eq!(renderer.thread_count(), hardware);

        run_to_end(&mut renderer);
        assert_eq!(renderer.progress().progress(), 6 * 6);
    }

    #[test]
    fn test_every_thread_count_completes() {
        for &threads in &[1usize, 2, 4, 8] {
            let scene = sky_only(5.0);
            let spp = 3;
            let mut renderer = Renderer::new(Bitmap::new(37, 29), spp, 1, 2, scene.clone(), scene, threads);
            run_to_end(&mut renderer);

            let job = renderer.job();
            assert_eq!(renderer.progress().progress(), 37 * 29 * spp);
            for block in 0..job.grid().block_count() {
                assert_eq!(job.completed_passes(block), spp);
            }

            let view = renderer.read();
            assert!(view.has_new_content());
            for y in 0..29 {
                for x in 0..37 {
                    assert!((view.get_pixel(x, y)[1] - 5.0).abs() < 1e-4, "{} threads", threads);
                }
            }
        }
    }

    #[test]
    fn test_floor_render_is_finite() {
        let scene = floor_scene();
        let mut renderer = Renderer::new(Bitmap::new(16, 16), 2, 1, 2, scene.clone(), scene, 4);
        run_to_end(&mut renderer);

        let view = renderer.read();
        let mut lit_floor = false;
        for y in 0..16 {
            for x in 0..16 {
                let pixel = view.get_pixel(x, y);
                assert!(pixel.iter().all(|v| v.is_finite() && *v >= 0.0));
                // Lower half looks at the floor, which only reflects.
                if y >= 12 && pixel[0] < 40.0 && pixel[0] > 0.0 {
                    lit_floor = true;
                }
            }
        }
        assert!(lit_floor);
    }

    #[test]
    fn test_stop_then_join_freezes_image() {
        let scene = floor_scene();
        let mut renderer = Renderer::new(Bitmap::new(64, 64), 64, 2, 3, scene.clone(), scene, 4);
        assert!(matches!(renderer.advance(), Ok(true)));
        thread::sleep(Duration::from_millis(5));

        renderer.stop();
        assert!(renderer.join().is_ok());
        assert_eq!(renderer.state(), RenderState::Finished);
        assert_eq!(renderer.history(), &[RenderState::Starting,
                                         RenderState::Running,
                                         RenderState::Finishing,
                                         RenderState::Finished][..]);

        let done = renderer.progress().progress();
        assert!(done < 64 * 64 * 64);
        let _ = renderer.read();
        thread::sleep(Duration::from_millis(5));
        assert_eq!(renderer.progress().progress(), done);
        assert!(!renderer.read().has_new_content());
        assert!(matches!(renderer.advance(), Ok(false)));
    }
}
