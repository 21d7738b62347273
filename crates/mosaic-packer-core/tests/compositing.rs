use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use image::imageops::FilterType;
use mosaic_packer_core::compositing::{
    crop_center_square, make_white_transparent, normalize_mask_image, prepare_mask, resize_mask,
};
use mosaic_packer_core::prelude::*;
use mosaic_packer_core::{MosaicError, WHITE_TOLERANCE};

#[test]
fn test_white_pixels_become_transparent() {
    let mut img = RgbImage::from_pixel(4, 1, Rgb([255, 255, 255]));
    img.put_pixel(1, 0, Rgb([201, 201, 201]));
    img.put_pixel(2, 0, Rgb([200, 255, 255]));
    img.put_pixel(3, 0, Rgb([10, 20, 30]));
    let out = make_white_transparent(&DynamicImage::ImageRgb8(img), WHITE_TOLERANCE);
    assert_eq!(out.get_pixel(0, 0), &Rgba([255, 255, 255, 0]));
    assert_eq!(out.get_pixel(1, 0)[3], 0);
    // a single channel at the tolerance keeps the pixel
    assert_eq!(out.get_pixel(2, 0), &Rgba([200, 255, 255, 255]));
    assert_eq!(out.get_pixel(3, 0), &Rgba([10, 20, 30, 255]));
}

#[test]
fn test_normalize_keeps_existing_alpha() {
    let mut img = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
    img.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
    let out = normalize_mask_image(&DynamicImage::ImageRgba8(img.clone()), true);
    assert_eq!(out, img);

    let rgb = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([250, 250, 250])));
    assert!(normalize_mask_image(&rgb, true).pixels().all(|p| p[3] == 0));
    assert!(normalize_mask_image(&rgb, false).pixels().all(|p| p[3] == 255));
}

#[test]
fn test_crop_center_square() {
    let mut img = RgbaImage::from_pixel(6, 4, Rgba([0, 0, 0, 255]));
    img.put_pixel(1, 0, Rgba([9, 9, 9, 255]));
    let sq = crop_center_square(&img);
    assert_eq!(sq.dimensions(), (4, 4));
    assert_eq!(sq.get_pixel(0, 0), &Rgba([9, 9, 9, 255]));

    let tall = RgbaImage::new(3, 7);
    assert_eq!(crop_center_square(&tall).dimensions(), (3, 3));
}

#[test]
fn test_photo_from_dynamic_is_square() {
    let img = DynamicImage::ImageRgb8(RgbImage::new(10, 4));
    let photo = Photo::from_dynamic("wide", &img);
    assert_eq!(photo.key, "wide");
    assert_eq!(photo.image.dimensions(), (4, 4));
    assert!(photo.image.pixels().all(|p| p[3] == 255));
}

#[test]
fn test_image_compositor_draws_scaled_tile() {
    let mut canvas = RgbaImage::new(20, 20);
    let tile = RgbaImage::from_pixel(3, 3, Rgba([200, 10, 10, 255]));
    ImageCompositor
        .composite(&mut canvas, &tile, 5, 5, 8)
        .expect("composite");
    assert_eq!(canvas.get_pixel(4, 4)[3], 0);
    assert_eq!(canvas.get_pixel(5, 5)[3], 255);
    assert_eq!(canvas.get_pixel(12, 12)[3], 255);
    assert_eq!(canvas.get_pixel(13, 13)[3], 0);
}

#[test]
fn test_image_compositor_blends_with_tile_alpha() {
    let mut canvas = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));
    let mut tile = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
    tile.put_pixel(1, 1, Rgba([255, 0, 0, 0]));
    ImageCompositor
        .composite(&mut canvas, &tile, 0, 0, 2)
        .expect("composite");
    assert_eq!(canvas.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
    assert_eq!(canvas.get_pixel(1, 1), &Rgba([0, 0, 255, 255]));
}

#[test]
fn test_image_compositor_rejects_bad_input() {
    let mut canvas = RgbaImage::new(10, 10);
    let tile = RgbaImage::new(2, 2);
    let err = ImageCompositor.composite(&mut canvas, &tile, 0, 0, 0);
    assert!(matches!(err, Err(MosaicError::Composite(_))));
    let err = ImageCompositor.composite(&mut canvas, &RgbaImage::new(0, 0), 0, 0, 4);
    assert!(matches!(err, Err(MosaicError::Composite(_))));
    let err = ImageCompositor.composite(&mut canvas, &tile, 10, 0, 4);
    assert!(matches!(err, Err(MosaicError::Composite(_))));
}

#[test]
fn test_resize_mask() {
    let img = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
    let same = resize_mask(&img, 10, 10).unwrap();
    assert_eq!(same, img);
    let big = resize_mask(&img, 40, 20).unwrap();
    assert_eq!(big.dimensions(), (40, 20));
    assert!(big.pixels().all(|p| p[3] == 255));
    assert!(matches!(
        resize_mask(&img, 0, 10),
        Err(MosaicError::InvalidDimensions { width: 0, height: 10 })
    ));
}

/// White 100x100 logo background with a dark 40x40 square in the middle.
fn jpeg_like_logo() -> DynamicImage {
    let mut img = RgbImage::from_pixel(100, 100, Rgb([255, 255, 255]));
    for y in 30..70 {
        for x in 30..70 {
            img.put_pixel(x, y, Rgb([20, 20, 20]));
        }
    }
    DynamicImage::ImageRgb8(img)
}

fn opaque_pixels(img: &RgbaImage) -> usize {
    img.pixels().filter(|p| p[3] > 0).count()
}

#[test]
fn test_prepare_mask_resizes_before_knockout() {
    let logo = jpeg_like_logo();
    let prepared = prepare_mask(&logo, Some((250, 250)), true).unwrap();
    assert_eq!(prepared.dimensions(), (250, 250));

    let resized_then_knocked = make_white_transparent(
        &logo.resize_exact(250, 250, FilterType::Lanczos3),
        WHITE_TOLERANCE,
    );
    assert_eq!(prepared, resized_then_knocked);

    // knocking out first leaves a ringing halo of faint alpha after resampling
    let knocked_then_resized = resize_mask(&normalize_mask_image(&logo, true), 250, 250).unwrap();
    assert!(opaque_pixels(&prepared) < opaque_pixels(&knocked_then_resized));
}

#[test]
fn test_prepare_mask_without_resize() {
    let logo = jpeg_like_logo();
    let prepared = prepare_mask(&logo, None, true).unwrap();
    assert_eq!(prepared, normalize_mask_image(&logo, true));
    assert_eq!(opaque_pixels(&prepared), 40 * 40);
    let same = prepare_mask(&logo, Some((100, 100)), true).unwrap();
    assert_eq!(same, prepared);
    assert!(matches!(
        prepare_mask(&logo, Some((0, 5)), true),
        Err(MosaicError::InvalidDimensions { width: 0, height: 5 })
    ));
}
