use crate::error::{MosaicError, Result};
use image::{DynamicImage, RgbaImage};

/// Read-only opacity field of the mask.
///
/// A pixel is opaque when its alpha is above zero. Region queries are answered in
/// constant time from a summed-area table built once at construction, and the total
/// opaque pixel count is memoized alongside it.
#[derive(Debug, Clone)]
pub struct MaskModel {
    width: u32,
    height: u32,
    // (width + 1) * (height + 1) prefix sums; row 0 and column 0 are zero.
    integral: Vec<u64>,
    total_opaque: u64,
}

impl MaskModel {
    /// Builds a mask from a row-major alpha channel of `width * height` bytes.
    pub fn from_alpha(width: u32, height: u32, alpha: &[u8]) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(MosaicError::InvalidDimensions { width, height });
        }
        let expected = width as usize * height as usize;
        if alpha.len() != expected {
            return Err(MosaicError::InvalidInput(format!(
                "alpha channel has {} values, expected {} for {}x{}",
                alpha.len(),
                expected,
                width,
                height
            )));
        }
        let stride = width as usize + 1;
        let mut integral = vec![0u64; stride * (height as usize + 1)];
        for y in 0..height as usize {
            let mut row_sum = 0u64;
            for x in 0..width as usize {
                if alpha[y * width as usize + x] > 0 {
                    row_sum += 1;
                }
                integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row_sum;
            }
        }
        let total_opaque = integral[height as usize * stride + width as usize];
        Ok(Self {
            width,
            height,
            integral,
            total_opaque,
        })
    }

    /// Builds a mask from the alpha channel of an RGBA raster.
    pub fn from_rgba(img: &RgbaImage) -> Result<Self> {
        let (w, h) = img.dimensions();
        let alpha: Vec<u8> = img.pixels().map(|p| p[3]).collect();
        Self::from_alpha(w, h, &alpha)
    }

    /// Builds a mask from any decoded image; images without alpha are fully opaque.
    pub fn from_image(img: &DynamicImage) -> Result<Self> {
        Self::from_rgba(&img.to_rgba8())
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of opaque pixels in the whole mask.
    pub fn total_opaque_pixels(&self) -> u64 {
        self.total_opaque
    }

    pub fn is_opaque(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.sum(x, y, 1, 1) > 0
    }

    /// Opaque pixels inside the `size`×`size` square at `(x, y)`.
    ///
    /// Fails when the square is not fully inside the mask.
    pub fn opaque_count(&self, x: u32, y: u32, size: u32) -> Result<u64> {
        let fits_x = x.checked_add(size).is_some_and(|r| r <= self.width);
        let fits_y = y.checked_add(size).is_some_and(|b| b <= self.height);
        if !fits_x || !fits_y {
            return Err(MosaicError::RegionOutOfBounds {
                x,
                y,
                size,
                width: self.width,
                height: self.height,
            });
        }
        Ok(self.sum(x, y, size, size))
    }

    /// Opaque share of the `size`×`size` square at `(x, y)`, in `[0, 1]`.
    ///
    /// An empty square reports 1.0 (nothing in it is transparent).
    pub fn opacity_fraction(&self, x: u32, y: u32, size: u32) -> Result<f64> {
        let count = self.opaque_count(x, y, size)?;
        let area = size as u64 * size as u64;
        if area == 0 {
            return Ok(1.0);
        }
        Ok(count as f64 / area as f64)
    }

    fn sum(&self, x: u32, y: u32, w: u32, h: u32) -> u64 {
        let stride = self.width as usize + 1;
        let (x0, y0) = (x as usize, y as usize);
        let (x1, y1) = (x0 + w as usize, y0 + h as usize);
        self.integral[y1 * stride + x1] + self.integral[y0 * stride + x0]
            - self.integral[y0 * stride + x1]
            - self.integral[y1 * stride + x0]
    }
}
