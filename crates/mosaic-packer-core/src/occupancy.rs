use crate::mask::MaskModel;
use image::{GrayImage, Luma};

/// Pixels already claimed by placed tiles during one run.
///
/// Claims are monotonic: nothing is ever released. Regions passed to
/// [`count_occupied`](Self::count_occupied) and [`mark`](Self::mark) are clipped
/// to the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    width: u32,
    height: u32,
    cells: Vec<bool>,
    claimed: u64,
}

impl OccupancyGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width as usize * height as usize],
            claimed: 0,
        }
    }

    /// A free grid with the same dimensions as `mask`.
    pub fn for_mask(mask: &MaskModel) -> Self {
        let (w, h) = mask.dimensions();
        Self::new(w, h)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_occupied(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.cells[self.index(x, y)]
    }

    /// Claimed pixels inside the `size`×`size` square at `(x, y)`.
    pub fn count_occupied(&self, x: u32, y: u32, size: u32) -> u64 {
        let (x0, x1, y0, y1) = self.clip(x, y, size);
        let mut count = 0u64;
        for yy in y0..y1 {
            let start = self.index(x0, yy);
            let end = start + (x1 - x0) as usize;
            count += self.cells[start..end].iter().filter(|c| **c).count() as u64;
        }
        count
    }

    /// Claims every pixel of the `size`×`size` square at `(x, y)`.
    pub fn mark(&mut self, x: u32, y: u32, size: u32) {
        let (x0, x1, y0, y1) = self.clip(x, y, size);
        for yy in y0..y1 {
            let start = self.index(x0, yy);
            let end = start + (x1 - x0) as usize;
            for cell in &mut self.cells[start..end] {
                if !*cell {
                    *cell = true;
                    self.claimed += 1;
                }
            }
        }
    }

    /// Total claimed pixels.
    pub fn occupied_pixels(&self) -> u64 {
        self.claimed
    }

    /// Claimed pixels that are also opaque in `mask`.
    pub fn occupied_opaque_pixels(&self, mask: &MaskModel) -> u64 {
        let mut count = 0u64;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.cells[self.index(x, y)] && mask.is_opaque(x, y) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Share of the mask's opaque pixels that are claimed, in `[0, 1]`.
    ///
    /// Zero when the mask has no opaque pixels.
    pub fn fill_ratio(&self, mask: &MaskModel) -> f64 {
        let total = mask.total_opaque_pixels();
        if total == 0 {
            return 0.0;
        }
        self.occupied_opaque_pixels(mask) as f64 / total as f64
    }

    /// Renders claimed pixels white on black, for debugging.
    pub fn to_luma(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            if self.cells[self.index(x, y)] {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn clip(&self, x: u32, y: u32, size: u32) -> (u32, u32, u32, u32) {
        let x0 = x.min(self.width);
        let y0 = y.min(self.height);
        let x1 = x.saturating_add(size).min(self.width);
        let y1 = y.saturating_add(size).min(self.height);
        (x0, x1, y0, y1)
    }
}
