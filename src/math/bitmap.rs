// Copyright 2020 @TwoCookingMice

use super::constants::{ Float, Vector4f };
use crate::core::image::ImageSink;

use std::ops;
use std::vec::Vec;

/// Row-major RGBA float image.
#[derive(Debug, Clone)]
pub struct Bitmap {
    data: Vec<Vector4f>,
    height: usize,
    width: usize
}

impl ops::Index<(usize, usize)> for Bitmap {
    type Output = Vector4f;

    fn index(&self, index: (usize, usize)) -> &Vector4f {
        debug_assert!(index.0 < self.width && index.1 < self.height);
        &self.data[index.0 + self.width * index.1]
    }
}

impl ops::IndexMut<(usize, usize)> for Bitmap {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Vector4f {
        debug_assert!(index.0 < self.width && index.1 < self.height);
        &mut self.data[index.0 + self.width * index.1]
    }
}

impl ImageSink for Bitmap {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn get_pixel(&self, x: usize, y: usize) -> Vector4f {
        self[(x, y)]
    }

    fn set_pixel(&mut self, x: usize, y: usize, value: &Vector4f) {
        self[(x, y)] = *value;
    }
}

impl Bitmap {
    pub fn new(width: usize, height: usize) -> Self {
        Self { data: vec![Vector4f::zeros(); width * height],
               width: width,
               height: height }
    }

    pub fn raw_rgb(&self) -> Vec<(Float, Float, Float)> {
        self.data.iter().map(|p| (p[0], p[1], p[2])).collect()
    }
}
