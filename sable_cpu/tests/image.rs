// Copyright 2026 the Sable Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end tests of the direct and scaled image kernels.

use std::sync::Arc;

use sable_cpu::kurbo::Affine;
use sable_cpu::raster::{
    raster_direct_image, raster_direct_rle_image, raster_scaled_image, raster_scaled_rle_image,
};
use sable_cpu::{
    ColorSpace, CompositeMethod, Image, MaskMethod, Pixmap, RenderRegion, Rle, Span, Surface,
};

fn abgr_surface(w: u32, h: u32) -> Surface {
    Surface::new(w, h, ColorSpace::Abgr8888).unwrap()
}

fn constant_image(w: u16, h: u16, px: u32) -> Image {
    Image::new(Arc::new(Pixmap::from_parts(
        vec![px; usize::from(w) * usize::from(h)],
        w,
        h,
    )))
}

fn channel_diff(a: u32, b: u32) -> u8 {
    (0..4)
        .map(|i| (((a >> (i * 8)) & 0xff) as u8).abs_diff(((b >> (i * 8)) & 0xff) as u8))
        .max()
        .unwrap()
}

#[test]
fn direct_blit_copies_pixels() {
    let mut surface = abgr_surface(8, 8);
    let pixels: Vec<u32> = (0..16).map(|i| 0xff00_0000 | (i * 16) as u32).collect();
    let mut image = Image::new(Arc::new(Pixmap::from_parts(pixels.clone(), 4, 4)));
    // Place the 4x4 image at (2, 2).
    image.ox = -2;
    image.oy = -2;

    assert!(raster_direct_image(
        &mut surface,
        &image,
        RenderRegion::new(2, 2, 6, 6),
        255,
    ));

    let data = surface.data32().unwrap();
    for y in 0..4 {
        for x in 0..4 {
            assert_eq!(data[(y + 2) * 8 + x + 2], pixels[y * 4 + x], "at ({x}, {y})");
        }
    }
    assert_eq!(data[0], 0);
    assert_eq!(data[7 * 8 + 7], 0);
}

#[test]
fn direct_blit_with_opacity_halves_contribution() {
    let mut surface = abgr_surface(2, 1);
    let image = constant_image(2, 1, 0xffff_ffff);

    assert!(raster_direct_image(
        &mut surface,
        &image,
        RenderRegion::new(0, 0, 2, 1),
        128,
    ));

    for &px in surface.data32().unwrap() {
        assert!(channel_diff(px, 0x8080_8080) <= 1, "got {px:#010x}");
    }
}

#[test]
fn direct_blit_clips_to_source_extent() {
    let mut surface = abgr_surface(8, 8);
    let image = constant_image(3, 3, 0xff11_2233);

    // The bbox asks for 8x8 but the source only provides 3x3.
    assert!(raster_direct_image(
        &mut surface,
        &image,
        RenderRegion::new(0, 0, 8, 8),
        255,
    ));

    let data = surface.data32().unwrap();
    assert_eq!(data[0], 0xff11_2233);
    assert_eq!(data[2 * 8 + 2], 0xff11_2233);
    assert_eq!(data[3 * 8 + 3], 0);
    assert_eq!(data[5], 0);
}

#[test]
fn scaled_identity_blit_stays_close() {
    let mut surface = abgr_surface(4, 4);
    let image = constant_image(4, 4, 0xff33_6699);

    assert!(raster_scaled_image(
        &mut surface,
        &image,
        &Affine::IDENTITY,
        RenderRegion::new(0, 0, 4, 4),
        255,
    ));

    for &px in surface.data32().unwrap() {
        assert!(channel_diff(px, 0xff33_6699) <= 2, "got {px:#010x}");
    }
}

#[test]
fn scaled_downsample_of_uniform_field_is_exact() {
    let mut surface = abgr_surface(2, 2);
    let mut image = constant_image(8, 8, 0xff80_8080);
    image.scale = 0.25;

    assert!(raster_scaled_image(
        &mut surface,
        &image,
        &Affine::scale(0.25),
        RenderRegion::new(0, 0, 2, 2),
        255,
    ));

    for &px in surface.data32().unwrap() {
        assert_eq!(px, 0xff80_8080);
    }
}

#[test]
fn scaled_blit_rejects_out_of_range_samples() {
    let mut surface = abgr_surface(8, 8);
    let image = constant_image(2, 2, 0xffff_ffff);

    // Identity transform: only destination pixels mapping inside the 2x2
    // source get written.
    assert!(raster_scaled_image(
        &mut surface,
        &image,
        &Affine::IDENTITY,
        RenderRegion::new(0, 0, 8, 8),
        255,
    ));

    let data = surface.data32().unwrap();
    assert_ne!(data[0], 0);
    assert_eq!(data[5], 0, "column beyond the source stays untouched");
    assert_eq!(data[5 * 8], 0, "row beyond the source stays untouched");
}

#[test]
fn degenerate_transform_draws_nothing() {
    let mut surface = abgr_surface(4, 4);
    let image = constant_image(4, 4, 0xffff_ffff);

    assert!(raster_scaled_image(
        &mut surface,
        &image,
        &Affine::scale(0.0),
        RenderRegion::new(0, 0, 4, 4),
        255,
    ));
    assert!(surface.data32().unwrap().iter().all(|&px| px == 0));
}

#[test]
fn masked_images_are_unsupported_and_do_not_write() {
    let mut surface = abgr_surface(4, 4);
    let region = RenderRegion::new(0, 0, 4, 4);
    assert!(surface.begin_composite(CompositeMethod::Mask(MaskMethod::Add), region));
    let before = surface.data32().unwrap().to_vec();

    let mut image = constant_image(4, 4, 0xffff_ffff);
    assert!(!raster_direct_image(&mut surface, &image, region, 255));
    assert!(!raster_scaled_image(
        &mut surface,
        &image,
        &Affine::IDENTITY,
        region,
        255,
    ));

    image.rle = Some(Rle::from_spans(vec![Span {
        x: 0,
        y: 0,
        len: 4,
        coverage: 255,
    }]));
    assert!(!raster_direct_rle_image(&mut surface, &image, region, 255));
    assert!(!raster_scaled_rle_image(
        &mut surface,
        &image,
        &Affine::IDENTITY,
        region,
        255,
    ));

    assert_eq!(surface.data32().unwrap(), &before[..]);
}

#[test]
fn direct_rle_image_respects_coverage() {
    let mut surface = abgr_surface(4, 2);
    let mut image = constant_image(4, 2, 0xffff_ffff);
    image.rle = Some(Rle::from_spans(vec![
        Span { x: 0, y: 0, len: 4, coverage: 255 },
        Span { x: 0, y: 1, len: 4, coverage: 128 },
    ]));

    assert!(raster_direct_rle_image(
        &mut surface,
        &image,
        RenderRegion::new(0, 0, 4, 2),
        255,
    ));

    let data = surface.data32().unwrap();
    for x in 0..4 {
        assert_eq!(data[x], 0xffff_ffff, "full coverage row");
        assert!(
            channel_diff(data[4 + x], 0x8080_8080) <= 1,
            "half coverage row, got {:#010x}",
            data[4 + x]
        );
    }
}

#[test]
fn rle_images_without_coverage_fail() {
    let mut surface = abgr_surface(4, 4);
    let image = constant_image(4, 4, 0xffff_ffff);
    let region = RenderRegion::new(0, 0, 4, 4);

    assert!(!raster_direct_rle_image(&mut surface, &image, region, 255));
    assert!(!raster_scaled_rle_image(
        &mut surface,
        &image,
        &Affine::IDENTITY,
        region,
        255,
    ));
}

#[test]
fn rle_images_on_grayscale_targets_are_unsupported() {
    let mut surface = Surface::new(4, 4, ColorSpace::Grayscale8).unwrap();
    let mut image = constant_image(4, 4, 0xffff_ffff);
    image.rle = Some(Rle::from_spans(vec![Span {
        x: 0,
        y: 0,
        len: 4,
        coverage: 255,
    }]));
    let region = RenderRegion::new(0, 0, 4, 4);

    assert!(!raster_direct_rle_image(&mut surface, &image, region, 255));
    assert!(!raster_scaled_rle_image(
        &mut surface,
        &image,
        &Affine::IDENTITY,
        region,
        255,
    ));
    assert!(surface.data8().unwrap().iter().all(|&px| px == 0));
}

#[test]
fn scaled_rle_image_composites_spans() {
    let mut surface = abgr_surface(4, 1);
    let mut image = constant_image(4, 1, 0xffff_ffff);
    image.rle = Some(Rle::from_spans(vec![Span {
        x: 1,
        y: 0,
        len: 2,
        coverage: 255,
    }]));

    assert!(raster_scaled_rle_image(
        &mut surface,
        &image,
        &Affine::IDENTITY,
        RenderRegion::new(0, 0, 4, 1),
        255,
    ));

    let data = surface.data32().unwrap();
    assert_eq!(data[0], 0);
    assert!(channel_diff(data[1], 0xffff_ffff) <= 2);
    assert!(channel_diff(data[2], 0xffff_ffff) <= 2);
    assert_eq!(data[3], 0);
}
