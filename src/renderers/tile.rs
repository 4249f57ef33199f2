// Copyright @yucwang 2026

use crate::core::image::ImageSink;
use crate::math::constants::{ Float, Vector4f };

/// Rectangle of pixels `[x0, x0 + width) x [y0, y0 + height)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BlockRect {
    pub x0: usize,
    pub y0: usize,
    pub width: usize,
    pub height: usize,
}

impl BlockRect {
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

/// Splits an image into `divisions x divisions` blocks. The last column and
/// the last row absorb what is left when the size does not divide evenly.
#[derive(Debug, Copy, Clone)]
pub struct BlockGrid {
    width: usize,
    height: usize,
    divisions: usize,
    step_x: usize,
    step_y: usize,
}

impl BlockGrid {
    pub fn new(width: usize, height: usize, thread_count: usize) -> Self {
        // Never more divisions than pixels along the short side.
        let divisions = (thread_count.max(1) * 4).min(width.min(height)).max(1);
        Self {
            width,
            height,
            divisions,
            step_x: width / divisions,
            step_y: height / divisions,
        }
    }

    pub fn divisions(&self) -> usize {
        self.divisions
    }

    pub fn block_count(&self) -> usize {
        self.divisions * self.divisions
    }

    pub fn block(&self, index: usize) -> BlockRect {
        debug_assert!(index < self.block_count());
        let bx = index % self.divisions;
        let by = index / self.divisions;
        let x0 = bx * self.step_x;
        let y0 = by * self.step_y;
        let width = if bx + 1 == self.divisions { self.width - x0 } else { self.step_x };
        let height = if by + 1 == self.divisions { self.height - y0 } else { self.step_y };
        BlockRect { x0, y0, width, height }
    }
}

/// Worker-local copy of one block.
#[derive(Debug, Clone)]
pub struct Tile {
    rect: BlockRect,
    pixels: Vec<Vector4f>,
}

impl Tile {
    pub fn new() -> Self {
        Self { rect: BlockRect { x0: 0, y0: 0, width: 0, height: 0 }, pixels: Vec::new() }
    }

    pub fn rect(&self) -> BlockRect {
        self.rect
    }

    /// Retargets the tile at `rect` and copies its current pixels from `image`.
    pub fn load<I: ImageSink + ?Sized>(&mut self, rect: BlockRect, image: &I) {
        self.rect = rect;
        self.pixels.clear();
        self.pixels.reserve(rect.area());
        for y in rect.y0..rect.y0 + rect.height {
            for x in rect.x0..rect.x0 + rect.width {
                self.pixels.push(image.get_pixel(x, y));
            }
        }
    }

    pub fn store<I: ImageSink + ?Sized>(&self, image: &mut I) {
        let rect = self.rect;
        for y in 0..rect.height {
            for x in 0..rect.width {
                image.set_pixel(rect.x0 + x, rect.y0 + y, &self.pixels[x + rect.width * y]);
            }
        }
    }

    /// Folds the colour of sample pass `pass` into the running mean of the
    /// pixel at tile-local `(x, y)`.
    pub fn merge_sample(&mut self, x: usize, y: usize, color: &Vector4f, pass: usize) {
        let n = (pass + 1) as Float;
        let old = &mut self.pixels[x + self.rect.width * y];
        *old += (*color - *old) / n;
    }

    pub fn pixel(&self, x: usize, y: usize) -> Vector4f {
        self.pixels[x + self.rect.width * y]
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{ BlockGrid, Tile };
    use crate::core::image::ImageSink;
    use crate::math::bitmap::Bitmap;
    use crate::math::constants::Vector4f;

    #[test]
    fn test_blocks_cover_image_once() {
        for &(w, h, threads) in &[(64, 48, 1), (10, 10, 1), (33, 17, 2), (7, 300, 8), (1, 1, 4)] {
            let grid = BlockGrid::new(w, h, threads);
            let mut hits = vec![0u32; w * h];
            for b in 0..grid.block_count() {
                let rect = grid.block(b);
                for y in rect.y0..rect.y0 + rect.height {
                    for x in rect.x0..rect.x0 + rect.width {
                        hits[x + w * y] += 1;
                    }
                }
            }
            assert!(hits.iter().all(|&c| c == 1), "grid {}x{} with {} threads", w, h, threads);
        }
    }

    #[test]
    fn test_divisions_follow_thread_count() {
        assert_eq!(BlockGrid::new(256, 256, 2).divisions(), 8);
        assert_eq!(BlockGrid::new(256, 256, 8).block_count(), 32 * 32);
        // 10 = 4 * 2 + 2: the last block is wider.
        let grid = BlockGrid::new(10, 10, 1);
        assert_eq!(grid.block(0).width, 2);
        assert_eq!(grid.block(3).width, 4);
        assert_eq!(grid.block(15).height, 4);
    }

    #[test]
    fn test_progressive_mean() {
        let mut image = Bitmap::new(4, 4);
        let grid = BlockGrid::new(4, 4, 1);
        let rect = grid.block(5);
        let samples = [0.5, 2.0, 1.0, 4.5];

        for (pass, &value) in samples.iter().enumerate() {
            let mut tile = Tile::new();
            tile.load(rect, &image);
            tile.merge_sample(0, 0, &Vector4f::new(value, value * 2.0, 0.0, 1.0), pass);
            tile.store(&mut image);
        }

        let mean = samples.iter().sum::<f32>() / samples.len() as f32;
        let pixel = image.get_pixel(rect.x0, rect.y0);
        assert!((pixel[0] - mean).abs() < 1e-5);
        assert!((pixel[1] - 2.0 * mean).abs() < 1e-5);
        assert!((pixel[3] - 1.0).abs() < 1e-6);
    }
}
