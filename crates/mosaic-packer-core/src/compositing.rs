use crate::config::WHITE_TOLERANCE;
use crate::error::{MosaicError, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};

/// Draws a photo onto the canvas.
///
/// Implementations resize `tile` to `size`×`size` and alpha-composite it at
/// `(x, y)`, using the tile's own alpha as the blend mask.
pub trait Compositor {
    fn composite(
        &self,
        canvas: &mut RgbaImage,
        tile: &RgbaImage,
        x: u32,
        y: u32,
        size: u32,
    ) -> Result<()>;
}

/// Lanczos3 resampling followed by alpha-over blending.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCompositor;

impl Compositor for ImageCompositor {
    fn composite(
        &self,
        canvas: &mut RgbaImage,
        tile: &RgbaImage,
        x: u32,
        y: u32,
        size: u32,
    ) -> Result<()> {
        if size == 0 || tile.width() == 0 || tile.height() == 0 {
            return Err(MosaicError::Composite(format!(
                "cannot draw {}x{} photo at size {}",
                tile.width(),
                tile.height(),
                size
            )));
        }
        let (cw, ch) = canvas.dimensions();
        if x >= cw || y >= ch {
            return Err(MosaicError::Composite(format!(
                "origin ({x}, {y}) outside {cw}x{ch} canvas"
            )));
        }
        if tile.dimensions() == (size, size) {
            imageops::overlay(canvas, tile, x as i64, y as i64);
        } else {
            let resized = imageops::resize(tile, size, size, FilterType::Lanczos3);
            imageops::overlay(canvas, &resized, x as i64, y as i64);
        }
        Ok(())
    }
}

/// Makes near-white pixels fully transparent.
///
/// A pixel whose R, G and B all exceed `tolerance` becomes `(255, 255, 255, 0)`;
/// others are kept. Meant for logos saved without an alpha channel.
pub fn make_white_transparent(img: &DynamicImage, tolerance: u8) -> RgbaImage {
    let mut rgba = img.to_rgba8();
    for px in rgba.pixels_mut() {
        if px[0] > tolerance && px[1] > tolerance && px[2] > tolerance {
            *px = Rgba([255, 255, 255, 0]);
        }
    }
    rgba
}

/// Converts a decoded mask to RGBA with a meaningful alpha channel.
///
/// Images that already carry alpha are converted as-is. Others get near-white
/// pixels knocked out when `white_is_background` is set (JPEG logos), and are
/// fully opaque otherwise.
pub fn normalize_mask_image(img: &DynamicImage, white_is_background: bool) -> RgbaImage {
    if !img.color().has_alpha() && white_is_background {
        make_white_transparent(img, WHITE_TOLERANCE)
    } else {
        img.to_rgba8()
    }
}

/// Resizes a mask image with Lanczos3; returns it unchanged when already `width`×`height`.
pub fn resize_mask(img: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage> {
    if width == 0 || height == 0 {
        return Err(MosaicError::InvalidDimensions { width, height });
    }
    if img.dimensions() == (width, height) {
        return Ok(img.clone());
    }
    Ok(imageops::resize(img, width, height, FilterType::Lanczos3))
}

/// Resizes a decoded mask to `size` (when given), then normalizes its alpha.
///
/// Thresholding happens after resampling so Lanczos ringing around a white
/// background cannot leave a faint halo of low-alpha pixels that would count as
/// opaque.
pub fn prepare_mask(
    img: &DynamicImage,
    size: Option<(u32, u32)>,
    white_is_background: bool,
) -> Result<RgbaImage> {
    let Some((width, height)) = size else {
        return Ok(normalize_mask_image(img, white_is_background));
    };
    if width == 0 || height == 0 {
        return Err(MosaicError::InvalidDimensions { width, height });
    }
    if img.dimensions() == (width, height) {
        return Ok(normalize_mask_image(img, white_is_background));
    }
    // keeps the source color type, so images without alpha stay without alpha
    let resized = img.resize_exact(width, height, FilterType::Lanczos3);
    Ok(normalize_mask_image(&resized, white_is_background))
}

/// Crops the largest centered square out of `img`.
pub fn crop_center_square(img: &RgbaImage) -> RgbaImage {
    let (w, h) = img.dimensions();
    let side = w.min(h);
    let x = (w - side) / 2;
    let y = (h - side) / 2;
    imageops::crop_imm(img, x, y, side, side).to_image()
}
