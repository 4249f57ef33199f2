// Copyright @yucwang 2026

use crate::math::constants::Vector4f;

use std::ops::Deref;
use std::sync::atomic::{ AtomicBool, Ordering };
use std::sync::{ PoisonError, RwLock, RwLockReadGuard };

/// Pixel storage the renderer writes into. Colours are RGBA.
pub trait ImageSink: Send + Sync {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn get_pixel(&self, x: usize, y: usize) -> Vector4f;
    fn set_pixel(&mut self, x: usize, y: usize, value: &Vector4f);
}

/// An image shared between render workers and one consumer.
///
/// Workers go through `update`, which holds the write lock and raises the
/// new-content flag. The consumer goes through `read`, which holds the read
/// lock and lowers the flag. The flag is atomic, so lowering it never races
/// with a writer: a writer cannot hold the write lock while any read guard
/// is alive.
pub struct SharedImage<I: ImageSink> {
    pixels: RwLock<I>,
    has_new_content: AtomicBool,
    width: usize,
    height: usize,
}

/// Scoped read access. Pixels stay locked against writers until dropped.
pub struct ImageReadLock<'a, I: ImageSink> {
    guard: RwLockReadGuard<'a, I>,
    has_new_content: bool,
}

impl<'a, I: ImageSink> ImageReadLock<'a, I> {
    /// Whether any worker wrote since the previous `read`.
    pub fn has_new_content(&self) -> bool {
        self.has_new_content
    }
}

impl<'a, I: ImageSink> Deref for ImageReadLock<'a, I> {
    type Target = I;

    fn deref(&self) -> &I {
        &self.guard
    }
}

impl<I: ImageSink> SharedImage<I> {
    pub fn new(image: I) -> Self {
        let width = image.width();
        let height = image.height();
        Self {
            pixels: RwLock::new(image),
            has_new_content: AtomicBool::new(false),
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn read(&self) -> ImageReadLock<'_, I> {
        let guard = self.pixels.read().unwrap_or_else(PoisonError::into_inner);
        let has_new_content = self.has_new_content.swap(false, Ordering::AcqRel);
        ImageReadLock { guard, has_new_content }
    }

    /// Reads without consuming the new-content flag. Used by workers to
    /// fetch the current state of their block.
    pub fn inspect<R, F: FnOnce(&I) -> R>(&self, f: F) -> R {
        let guard = self.pixels.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    pub fn update<R, F: FnOnce(&mut I) -> R>(&self, f: F) -> R {
        let mut guard = self.pixels.write().unwrap_or_else(PoisonError::into_inner);
        let result = f(&mut guard);
        self.has_new_content.store(true, Ordering::Release);
        result
    }

    pub fn into_inner(self) -> I {
        self.pixels.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}
