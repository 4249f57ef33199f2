// Copyright @yucwang 2026

use crate::math::constants::Float;

use std::fmt;
use std::sync::atomic::{ AtomicBool, AtomicUsize, Ordering };
use std::sync::Arc;
use std::thread::{ self, JoinHandle };

#[derive(Debug)]
pub enum RenderError {
    Spawn(std::io::Error),
    AlreadyStarted,
    WorkerPanicked(String),
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::Spawn(err)
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Spawn(err) => write!(f, "failed to spawn worker: {}", err),
            RenderError::AlreadyStarted => write!(f, "worker threads already started"),
            RenderError::WorkerPanicked(name) => write!(f, "worker {} panicked", name),
        }
    }
}

impl std::error::Error for RenderError {}

/// Half-open interval `[lower, upper)` of work indices.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Range {
    pub lower: usize,
    pub upper: usize,
}

impl Range {
    pub fn new(lower: usize, upper: usize) -> Self {
        debug_assert!(lower <= upper);
        Self { lower, upper }
    }

    pub fn len(&self) -> usize {
        self.upper - self.lower
    }

    pub fn is_empty(&self) -> bool {
        self.upper == self.lower
    }

    pub fn mid(&self) -> usize {
        self.lower + self.len() / 2
    }

    pub fn contains(&self, value: usize) -> bool {
        value >= self.lower && value < self.upper
    }

    /// Part `index` of `parts` equal slices. The last part also takes the
    /// remainder, so the parts cover the range exactly.
    pub fn split(&self, parts: usize, index: usize) -> Range {
        debug_assert!(parts > 0 && index < parts);
        let step = self.len() / parts;
        let lower = self.lower + step * index;
        let upper = if index + 1 == parts { self.upper } else { lower + step };
        Range::new(lower, upper)
    }
}

/// Shared counters handed to every worker of a bundle.
#[derive(Debug, Default)]
pub struct WorkerControl {
    progress: AtomicUsize,
    stop: AtomicBool,
}

impl WorkerControl {
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    pub fn progress_increment(&self, amount: usize) {
        self.progress.fetch_add(amount, Ordering::AcqRel);
    }

    pub fn progress_read(&self) -> usize {
        self.progress.load(Ordering::Acquire)
    }
}

/// Worker count for a request; 0 means one per hardware thread.
pub fn resolve_thread_count(requested: usize) -> usize {
    match requested {
        0 => thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
        n => n,
    }
}

/// A fixed pool of named worker threads sharing a progress counter and a
/// stop flag. Started once, joined once.
pub struct ThreadBundle {
    name: String,
    thread_count: usize,
    control: Arc<WorkerControl>,
    handles: Vec<JoinHandle<()>>,
    started: bool,
}

impl ThreadBundle {
    pub fn new(name: &str, thread_count: usize) -> Self {
        Self {
            name: String::from(name),
            thread_count: thread_count.max(1),
            control: Arc::new(WorkerControl::default()),
            handles: Vec::new(),
            started: false,
        }
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Runs `work(thread_index, control)` on every thread of the bundle.
    pub fn start<F>(&mut self, work: F) -> Result<(), RenderError>
    where
        F: Fn(usize, &WorkerControl) + Send + Sync + 'static,
    {
        if self.started {
            return Err(RenderError::AlreadyStarted);
        }
        self.started = true;

        let work = Arc::new(work);
        for index in 0..self.thread_count {
            let work = Arc::clone(&work);
            let control = Arc::clone(&self.control);
            let handle = thread::Builder::new()
                .name(format!("{}-{}", self.name, index))
                .spawn(move || work(index, &control));
            match handle {
                Ok(handle) => self.handles.push(handle),
                Err(err) => {
                    // Let the threads already running wind down.
                    self.stop();
                    return Err(RenderError::from(err));
                }
            }
        }
        log::debug!("Started {} threads for {}.", self.thread_count, self.name);
        Ok(())
    }

    /// Blocks until every worker returned. A no-op when nothing is running.
    pub fn join(&mut self) -> Result<(), RenderError> {
        let mut result = Ok(());
        for handle in self.handles.drain(..) {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                log::warn!("Worker {} panicked.", name);
                result = Err(RenderError::WorkerPanicked(name));
            }
        }
        result
    }

    pub fn stop(&self) {
        self.control.request_stop();
    }

    pub fn should_stop(&self) -> bool {
        self.control.should_stop()
    }

    pub fn progress_increment(&self, amount: usize) {
        self.control.progress_increment(amount);
    }

    pub fn progress_read(&self) -> usize {
        self.control.progress_read()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_running(&self) -> bool {
        !self.handles.is_empty()
    }

    pub fn progress_reader(&self, upper_limit: usize) -> ProgressReader {
        ProgressReader { control: Arc::clone(&self.control), upper_limit }
    }
}

impl Drop for ThreadBundle {
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            self.stop();
            let _ = self.join();
        }
    }
}

/// Reads a bundle's progress against a known total.
#[derive(Clone)]
pub struct ProgressReader {
    control: Arc<WorkerControl>,
    upper_limit: usize,
}

impl ProgressReader {
    /// True while work remains.
    pub fn next(&self) -> bool {
        self.control.progress_read() < self.upper_limit
    }

    pub fn progress(&self) -> usize {
        self.control.progress_read()
    }

    pub fn upper_limit(&self) -> usize {
        self.upper_limit
    }

    pub fn percent_complete(&self) -> Float {
        if self.upper_limit == 0 {
            return 100.0;
        }
        let ratio = self.progress() as f64 / self.upper_limit as f64;
        (ratio.min(1.0) * 100.0) as Float
    }
}

#[cfg(test)]
mod tests {
    use super::{ resolve_thread_count, Range, RenderError, ThreadBundle };

    use std::sync::atomic::{ AtomicUsize, Ordering };
    use std::sync::Arc;

    #[test]
    fn test_range_split_covers_everything() {
        let range = Range::new(3, 20);
        assert_eq!(range.len(), 17);
        assert_eq!(range.mid(), 11);
        for parts in 1..8 {
            let mut next = range.lower;
            for i in 0..parts {
                let part = range.split(parts, i);
                assert_eq!(part.lower, next);
                next = part.upper;
            }
            assert_eq!(next, range.upper);
        }
        assert_eq!(range.split(4, 3), Range::new(15, 20));
        assert!(range.contains(3) && !range.contains(20));
        assert!(Range::new(5, 5).is_empty());
    }

    #[test]
    fn test_bundle_runs_every_thread_once() {
        let seen = Arc::new(AtomicUsize::new(0));
        let mut bundle = ThreadBundle::new("test", 4);
        let reader = bundle.progress_reader(40);
        assert!(reader.next());
        assert_eq!(reader.percent_complete(), 0.0);

        assert!(!bundle.is_started());
        let counter = Arc::clone(&seen);
        let started = bundle.start(move |index, control| {
            counter.fetch_add(1 << (index * 8), Ordering::SeqCst);
            control.progress_increment(10);
        });
        assert!(started.is_ok());
        assert!(bundle.is_started());
        assert!(matches!(bundle.start(|_, _| {}), Err(RenderError::AlreadyStarted)));
        assert!(bundle.join().is_ok());

        assert_eq!(seen.load(Ordering::SeqCst), 0x01010101);
        assert_eq!(bundle.progress_read(), 40);
        assert!(!reader.next());
        assert_eq!(reader.percent_complete(), 100.0);
    }

    #[test]
    fn test_stop_is_observed() {
        let mut bundle = ThreadBundle::new("spin", 3);
        let started = bundle.start(|_, control| {
            while !control.should_stop() {
                std::thread::yield_now();
            }
        });
        assert!(started.is_ok());
        assert!(bundle.is_running());
        bundle.stop();
        assert!(bundle.should_stop());
        assert!(bundle.join().is_ok());
        assert!(!bundle.is_running());
    }

    #[test]
    fn test_panicking_worker_is_reported() {
        let mut bundle = ThreadBundle::new("fragile", 2);
        let started = bundle.start(|index, _| {
            if index == 1 {
                panic!("boom");
            }
        });
        assert!(started.is_ok());
        assert!(matches!(bundle.join(), Err(RenderError::WorkerPanicked(_))));
    }

    #[test]
    fn test_zero_threads_means_hardware_concurrency() {
        let hardware = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        assert_eq!(resolve_thread_count(0), hardware);
        assert_eq!(resolve_thread_count(3), 3);
    }
}
