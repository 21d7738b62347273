use image::{Rgba, RgbaImage};
use mosaic_packer_core::error::MosaicError;
use mosaic_packer_core::prelude::*;

fn half_opaque(w: u32, h: u32) -> MaskModel {
    // left half opaque, right half transparent
    let mut alpha = Vec::with_capacity((w * h) as usize);
    for _y in 0..h {
        for x in 0..w {
            alpha.push(if x < w / 2 { 255 } else { 0 });
        }
    }
    MaskModel::from_alpha(w, h, &alpha).expect("mask")
}

#[test]
fn test_total_opaque_is_memoized_count() {
    let mask = half_opaque(40, 10);
    assert_eq!(mask.dimensions(), (40, 10));
    assert_eq!(mask.total_opaque_pixels(), 200);
}

#[test]
fn test_any_nonzero_alpha_is_opaque() {
    let alpha = vec![0, 1, 128, 255];
    let mask = MaskModel::from_alpha(2, 2, &alpha).expect("mask");
    assert_eq!(mask.total_opaque_pixels(), 3);
    assert!(!mask.is_opaque(0, 0));
    assert!(mask.is_opaque(1, 0));
    assert!(mask.is_opaque(0, 1));
}

#[test]
fn test_opacity_fraction_regions() {
    let mask = half_opaque(40, 40);
    assert_eq!(mask.opacity_fraction(0, 0, 20).unwrap(), 1.0);
    assert_eq!(mask.opacity_fraction(20, 0, 20).unwrap(), 0.0);
    // straddles the edge: 10 opaque columns out of 20
    assert_eq!(mask.opacity_fraction(10, 5, 20).unwrap(), 0.5);
    assert_eq!(mask.opaque_count(10, 5, 20).unwrap(), 200);
}

#[test]
fn test_region_touching_the_edge_is_in_range() {
    let mask = half_opaque(40, 40);
    assert!(mask.opaque_count(20, 20, 20).is_ok());
    assert!(mask.opaque_count(0, 0, 40).is_ok());
}

#[test]
fn test_region_past_the_edge_is_out_of_range() {
    let mask = half_opaque(40, 40);
    match mask.opacity_fraction(21, 0, 20) {
        Err(MosaicError::RegionOutOfBounds {
            x,
            size,
            width,
            height,
            ..
        }) => {
            assert_eq!(x, 21);
            assert_eq!(size, 20);
            assert_eq!((width, height), (40, 40));
        }
        other => panic!("expected RegionOutOfBounds, got {:?}", other),
    }
    assert!(mask.opaque_count(0, 39, 2).is_err());
    assert!(mask.opaque_count(u32::MAX, 0, 2).is_err());
}

#[test]
fn test_from_rgba_uses_alpha_channel() {
    let mut img = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 0]));
    for y in 2..5 {
        for x in 3..7 {
            img.put_pixel(x, y, Rgba([0, 0, 0, 255]));
        }
    }
    let mask = MaskModel::from_rgba(&img).expect("mask");
    assert_eq!(mask.total_opaque_pixels(), 12);
    assert_eq!(mask.opaque_count(3, 2, 3).unwrap(), 9);
}

#[test]
fn test_rejects_bad_dimensions() {
    assert!(matches!(
        MaskModel::from_alpha(0, 10, &[]),
        Err(MosaicError::InvalidDimensions { width: 0, height: 10 })
    ));
    assert!(matches!(
        MaskModel::from_alpha(3, 3, &[255; 8]),
        Err(MosaicError::InvalidInput(_))
    ));
}
