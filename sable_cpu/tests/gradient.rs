// Copyright 2026 the Sable Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end tests of the gradient kernel families.

use sable_cpu::color::AlphaColor;
use sable_cpu::kurbo::{Affine, Point};
use sable_cpu::peniko::color::Srgb;
use sable_cpu::peniko::{Gradient, Extend};
use sable_cpu::raster::raster_gradient_shape;
use sable_cpu::{
    ColorSpace, CompositeMethod, EncodedFill, MatteMethod, RenderRegion, Rle, Shape, Span, Surface,
};

fn abgr_surface(w: u32, h: u32) -> Surface {
    Surface::new(w, h, ColorSpace::Abgr8888).unwrap()
}

fn rgba(r: f32, g: f32, b: f32, a: f32) -> AlphaColor<Srgb> {
    AlphaColor::new([r, g, b, a])
}

fn horizontal_ramp(w: f64, stops: [(f32, AlphaColor<Srgb>); 2]) -> EncodedFill {
    let gradient = Gradient::new_linear(Point::ZERO, Point::new(w, 0.0))
        .with_stops(stops)
        .with_extend(Extend::Pad);
    EncodedFill::from_gradient(&gradient, Affine::IDENTITY).unwrap()
}

fn alpha(px: u32) -> u8 {
    (px >> 24) as u8
}

#[test]
fn linear_gradient_rect_is_a_monotone_ramp() {
    let mut surface = abgr_surface(16, 2);
    let mut shape = Shape::rect();
    shape.fill = Some(horizontal_ramp(
        16.0,
        [(0.0, rgba(0.0, 0.0, 0.0, 1.0)), (1.0, rgba(1.0, 1.0, 1.0, 1.0))],
    ));

    assert!(raster_gradient_shape(
        &mut surface,
        &shape,
        RenderRegion::new(0, 0, 16, 2),
        255,
    ));

    let data = surface.data32().unwrap();
    for x in 0..15 {
        assert!(
            (data[x] & 0xff) <= (data[x + 1] & 0xff),
            "ramp not monotone at {x}"
        );
        assert_eq!(alpha(data[x]), 255);
    }
    // Both rows are identical for a horizontal gradient.
    assert_eq!(&data[0..16], &data[16..32]);
    assert!(data[0] & 0xff <= 0x12);
    assert!(data[15] & 0xff >= 0xed);
}

#[test]
fn translucent_gradient_composites_over_white() {
    let mut surface = abgr_surface(8, 1);
    surface.data32_mut().unwrap().fill(0xffff_ffff);

    let mut shape = Shape::rect();
    shape.fill = Some(horizontal_ramp(
        8.0,
        [(0.0, rgba(0.0, 0.0, 0.0, 0.0)), (1.0, rgba(0.0, 0.0, 0.0, 1.0))],
    ));

    assert!(raster_gradient_shape(
        &mut surface,
        &shape,
        RenderRegion::new(0, 0, 8, 1),
        255,
    ));

    let data = surface.data32().unwrap();
    // Compositing anything opaque-or-less over opaque white stays opaque,
    // and the ramp darkens towards the right.
    for x in 0..8 {
        assert_eq!(alpha(data[x]), 255, "at {x}");
    }
    assert!(data[0] & 0xff >= 0xe8, "left stays white");
    assert!(data[7] & 0xff <= 0x20, "right goes black");
}

#[test]
fn solid_gradient_reroutes_to_color_kernels() {
    let mut surface = abgr_surface(4, 1);
    let mut shape = Shape::rect();
    shape.fill = Some(horizontal_ramp(
        4.0,
        [(0.0, rgba(1.0, 0.0, 0.0, 1.0)), (1.0, rgba(1.0, 0.0, 0.0, 1.0))],
    ));

    assert!(raster_gradient_shape(
        &mut surface,
        &shape,
        RenderRegion::new(0, 0, 4, 1),
        255,
    ));

    // An exact solid fill, no gradient rounding.
    for &px in surface.data32().unwrap() {
        assert_eq!(px, 0xff00_00ff);
    }
}

#[test]
fn gradient_opacity_scales_the_result() {
    let mut opaque = abgr_surface(8, 1);
    let mut faded = abgr_surface(8, 1);
    let fill = horizontal_ramp(
        8.0,
        [(0.0, rgba(1.0, 1.0, 1.0, 1.0)), (1.0, rgba(0.0, 0.0, 1.0, 1.0))],
    );

    let mut shape = Shape::rect();
    shape.fill = Some(fill.clone());
    assert!(raster_gradient_shape(
        &mut opaque,
        &shape,
        RenderRegion::new(0, 0, 8, 1),
        255,
    ));
    assert!(raster_gradient_shape(
        &mut faded,
        &shape,
        RenderRegion::new(0, 0, 8, 1),
        128,
    ));

    for (&o, &f) in opaque
        .data32()
        .unwrap()
        .iter()
        .zip(faded.data32().unwrap())
    {
        let half = alpha(o) / 2;
        assert!(
            alpha(f).abs_diff(half) <= 1,
            "opacity 128 should halve alpha: {o:#010x} vs {f:#010x}"
        );
    }
}

#[test]
fn zero_opacity_solid_gradient_is_a_no_op() {
    let mut surface = abgr_surface(4, 1);
    let mut shape = Shape::rect();
    shape.fill = Some(horizontal_ramp(
        4.0,
        [(0.0, rgba(1.0, 0.0, 0.0, 1.0)), (1.0, rgba(1.0, 0.0, 0.0, 1.0))],
    ));

    assert!(raster_gradient_shape(
        &mut surface,
        &shape,
        RenderRegion::new(0, 0, 4, 1),
        0,
    ));
    assert!(surface.data32().unwrap().iter().all(|&px| px == 0));
}

#[test]
fn gradient_without_fill_fails() {
    let mut surface = abgr_surface(4, 1);
    let shape = Shape::rect();
    assert!(!raster_gradient_shape(
        &mut surface,
        &shape,
        RenderRegion::new(0, 0, 4, 1),
        255,
    ));
}

#[test]
fn gradient_rle_respects_coverage() {
    let mut full = abgr_surface(8, 1);
    let mut half = abgr_surface(8, 1);
    // Stops must differ, or the fill reroutes to the solid kernels.
    let fill = horizontal_ramp(
        8.0,
        [(0.0, rgba(1.0, 1.0, 1.0, 1.0)), (1.0, rgba(1.0, 1.0, 0.9, 1.0))],
    );

    let span = |coverage| {
        Rle::from_spans(vec![Span {
            x: 0,
            y: 0,
            len: 8,
            coverage,
        }])
    };

    let mut shape = Shape::from_rle(span(255));
    shape.fill = Some(fill.clone());
    assert!(raster_gradient_shape(
        &mut full,
        &shape,
        RenderRegion::new(0, 0, 8, 1),
        255,
    ));

    let mut shape = Shape::from_rle(span(128));
    shape.fill = Some(fill);
    assert!(raster_gradient_shape(
        &mut half,
        &shape,
        RenderRegion::new(0, 0, 8, 1),
        255,
    ));

    for (&f, &h) in full.data32().unwrap().iter().zip(half.data32().unwrap()) {
        assert_eq!(alpha(f), 255);
        assert!(alpha(h).abs_diff(128) <= 1, "half coverage: {h:#010x}");
        // The half-coverage pixel is the full pixel scaled by ~1/2.
        let fr = f & 0xff;
        let hr = h & 0xff;
        assert!(hr.abs_diff(fr / 2) <= 2);
    }
}

#[test]
fn matted_gradient_is_gated_by_the_matte() {
    let mut surface = abgr_surface(8, 1);
    let region = RenderRegion::new(0, 0, 8, 1);
    assert!(surface.begin_composite(CompositeMethod::Matte(MatteMethod::Alpha), region));
    {
        let matte = surface.composite_image_mut().unwrap();
        let data = matte.data32_mut().unwrap();
        for px in &mut data[0..4] {
            *px = 0xffff_ffff;
        }
    }

    let mut shape = Shape::rect();
    shape.fill = Some(horizontal_ramp(
        8.0,
        [(0.0, rgba(1.0, 0.0, 0.0, 1.0)), (1.0, rgba(0.0, 1.0, 0.0, 1.0))],
    ));
    assert!(raster_gradient_shape(&mut surface, &shape, region, 255));
    assert!(surface.end_composite());

    let data = surface.data32().unwrap();
    for x in 0..4 {
        assert_eq!(alpha(data[x]), 255, "matte lets the left through at {x}");
    }
    for x in 4..8 {
        assert_eq!(data[x], 0, "matte blocks the right at {x}");
    }
}

#[test]
fn radial_gradient_rect_smoke() {
    let gradient = Gradient::new_two_point_radial(
        Point::new(4.0, 4.0),
        0.0,
        Point::new(4.0, 4.0),
        4.0,
    )
    .with_stops([(0.0, rgba(1.0, 1.0, 1.0, 1.0)), (1.0, rgba(0.0, 0.0, 0.0, 1.0))])
    .with_extend(Extend::Pad);
    let fill = EncodedFill::from_gradient(&gradient, Affine::IDENTITY).unwrap();

    let mut surface = abgr_surface(8, 8);
    let mut shape = Shape::rect();
    shape.fill = Some(fill);
    assert!(raster_gradient_shape(
        &mut surface,
        &shape,
        RenderRegion::new(0, 0, 8, 8),
        255,
    ));

    let data = surface.data32().unwrap();
    let center = data[4 * 8 + 4] & 0xff;
    let corner = data[0] & 0xff;
    assert!(center > 0xb0, "center is bright, got {center:#x}");
    assert!(corner < 0x40, "corner is dark, got {corner:#x}");
    for &px in data {
        assert_eq!(alpha(px), 255);
    }
}
