// Copyright 2026 the Sable Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end tests of the full-target effect passes.

use sable_cpu::effects::{
    effect_drop_shadow, effect_fill, effect_gaussian_blur, effect_tint, effect_tritone,
};
use sable_cpu::filter::{BlurDirection, DropShadow, FillEffect, GaussianBlur, Tint, Tritone};
use sable_cpu::{ColorSpace, RenderColor, RenderRegion, Surface};

fn abgr_surface(w: u32, h: u32) -> Surface {
    Surface::new(w, h, ColorSpace::Abgr8888).unwrap()
}

fn channels(px: u32) -> [u8; 4] {
    [
        (px >> 24) as u8,
        ((px >> 16) & 0xff) as u8,
        ((px >> 8) & 0xff) as u8,
        (px & 0xff) as u8,
    ]
}

fn assert_px_near(actual: u32, expected: u32, tolerance: u8) {
    let a = channels(actual);
    let e = channels(expected);
    for i in 0..4 {
        assert!(
            a[i].abs_diff(e[i]) <= tolerance,
            "channel {i}: {actual:#010x} vs {expected:#010x}"
        );
    }
}

#[test]
fn blur_of_a_uniform_field_is_identity() {
    let mut target = abgr_surface(8, 8);
    target.data32_mut().unwrap().fill(0xff80_8080);

    let blur = GaussianBlur::new(1.5, BlurDirection::Both);
    assert!(effect_gaussian_blur(
        &mut target,
        RenderRegion::new(0, 0, 8, 8),
        &blur,
    ));

    for &px in target.data32().unwrap() {
        assert_px_near(px, 0xff80_8080, 1);
    }
}

#[test]
fn blur_with_zero_sigma_is_exact_identity() {
    let mut target = abgr_surface(4, 4);
    target.data32_mut().unwrap()[5] = 0xffff_ffff;
    let before = target.data32().unwrap().to_vec();

    let blur = GaussianBlur::new(0.0, BlurDirection::Both);
    assert!(effect_gaussian_blur(
        &mut target,
        RenderRegion::new(0, 0, 4, 4),
        &blur,
    ));
    assert_eq!(target.data32().unwrap(), &before[..]);
}

#[test]
fn horizontal_blur_does_not_bleed_vertically() {
    let mut target = abgr_surface(9, 9);
    // A single bright row in the middle.
    for x in 0..9 {
        target.data32_mut().unwrap()[4 * 9 + x] = 0xffff_ffff;
    }

    let blur = GaussianBlur::new(1.0, BlurDirection::Horizontal);
    assert!(effect_gaussian_blur(
        &mut target,
        RenderRegion::new(0, 0, 9, 9),
        &blur,
    ));

    let data = target.data32().unwrap();
    for x in 0..9 {
        assert_eq!(data[3 * 9 + x], 0, "row above untouched at {x}");
        assert_eq!(data[5 * 9 + x], 0, "row below untouched at {x}");
        assert_px_near(data[4 * 9 + x], 0xffff_ffff, 2);
    }
}

#[test]
fn vertical_blur_spreads_a_row() {
    let mut target = abgr_surface(5, 9);
    for x in 0..5 {
        target.data32_mut().unwrap()[4 * 5 + x] = 0xffff_ffff;
    }

    let blur = GaussianBlur::new(1.0, BlurDirection::Vertical);
    assert!(effect_gaussian_blur(
        &mut target,
        RenderRegion::new(0, 0, 5, 9),
        &blur,
    ));

    let data = target.data32().unwrap();
    assert!(data[3 * 5] > 0, "energy moved to the neighbor row");
    assert!(data[5 * 5] > 0);
    let center = channels(data[4 * 5])[0];
    let neighbor = channels(data[3 * 5])[0];
    assert!(center > neighbor, "center keeps the most energy");
}

#[test]
fn blur_rejects_grayscale_targets() {
    let mut target = Surface::new(4, 4, ColorSpace::Grayscale8).unwrap();
    let blur = GaussianBlur::new(1.0, BlurDirection::Both);
    assert!(!effect_gaussian_blur(
        &mut target,
        RenderRegion::new(0, 0, 4, 4),
        &blur,
    ));
}

#[test]
fn drop_shadow_with_zero_sigma_is_a_hard_offset() {
    let mut target = abgr_surface(8, 4);
    // An opaque white 2x2 square at (1, 1).
    for y in 1..3_usize {
        for x in 1..3_usize {
            target.data32_mut().unwrap()[y * 8 + x] = 0xffff_ffff;
        }
    }

    let shadow = DropShadow::new(3.0, 0.0, 0.0, RenderColor::new(0, 0, 0, 255));
    assert!(effect_drop_shadow(
        &mut target,
        RenderRegion::new(0, 0, 8, 4),
        &shadow,
    ));

    let data = target.data32().unwrap();
    // The square itself is opaque, the shadow cannot show through it.
    assert_eq!(data[8 + 1], 0xffff_ffff);
    assert_eq!(data[8 + 2], 0xffff_ffff);
    // Three pixels right of the square, the silhouette lands on empty
    // ground as pure shadow color.
    assert_eq!(data[8 + 4], 0xff00_0000);
    assert_eq!(data[8 + 5], 0xff00_0000);
    // Far field stays empty.
    assert_eq!(data[8 + 7], 0);
    assert_eq!(data[0], 0);
}

#[test]
fn drop_shadow_with_blur_softens_the_edge() {
    let mut target = abgr_surface(16, 5);
    // A full-height bar, so the vertical pass is a no-op under edge clamping
    // and the falloff below is purely horizontal.
    for y in 0..5_usize {
        for x in 4..8_usize {
            target.data32_mut().unwrap()[y * 16 + x] = 0xffff_ffff;
        }
    }

    let shadow = DropShadow::new(4.0, 0.0, 1.0, RenderColor::new(0, 0, 0, 255));
    assert!(effect_drop_shadow(
        &mut target,
        RenderRegion::new(0, 0, 16, 5),
        &shadow,
    ));

    let data = target.data32().unwrap();
    let deep = channels(data[2 * 16 + 10])[0];
    let edge = channels(data[2 * 16 + 13])[0];
    assert!(deep > 0xc0, "shadow core is strong, got {deep:#x}");
    assert!(edge < deep, "shadow falls off at the edge");
}

#[test]
fn fill_effect_preserves_coverage() {
    let mut target = abgr_surface(4, 1);
    {
        let data = target.data32_mut().unwrap();
        data[0] = 0xff11_2233; // opaque
        data[1] = 0x8008_1018; // half covered
        data[2] = 0x0000_0000; // empty
        data[3] = 0x4010_2030;
    }

    let fill = FillEffect {
        color: RenderColor::new(255, 0, 0, 255),
    };
    assert!(effect_fill(
        &mut target,
        RenderRegion::new(0, 0, 4, 1),
        &fill,
    ));

    let data = target.data32().unwrap();
    assert_eq!(data[0], 0xff00_00ff, "opaque pixel becomes pure red");
    assert_px_near(data[1], 0x8000_0080, 1);
    assert_eq!(data[2], 0, "empty pixels stay empty");
    assert_eq!(channels(data[3])[0], 0x40, "coverage preserved");
}

#[test]
fn tint_with_zero_intensity_is_identity() {
    let mut target = abgr_surface(4, 1);
    target.data32_mut().unwrap().fill(0xff12_3456);
    let before = target.data32().unwrap().to_vec();

    let tint = Tint {
        black: RenderColor::new(0, 0, 64, 255),
        white: RenderColor::new(255, 200, 0, 255),
        intensity: 0,
    };
    assert!(effect_tint(&mut target, RenderRegion::new(0, 0, 4, 1), &tint));
    assert_eq!(target.data32().unwrap(), &before[..]);
}

#[test]
fn full_tint_maps_gray_through_the_ramp() {
    let mut target = abgr_surface(2, 1);
    {
        let data = target.data32_mut().unwrap();
        data[0] = 0xff80_8080; // mid gray
        data[1] = 0xff00_0000; // black
    }

    let tint = Tint {
        black: RenderColor::new(0, 0, 0, 255),
        white: RenderColor::new(255, 255, 255, 255),
        intensity: 255,
    };
    assert!(effect_tint(&mut target, RenderRegion::new(0, 0, 2, 1), &tint));

    let data = target.data32().unwrap();
    // A black-to-white tint of a gray image is the image itself.
    assert_px_near(data[0], 0xff80_8080, 1);
    assert_px_near(data[1], 0xff00_0000, 1);
}

#[test]
fn tritone_maps_the_extremes() {
    let mut target = abgr_surface(2, 1);
    {
        let data = target.data32_mut().unwrap();
        data[0] = 0xff00_0000; // black -> shadow color
        data[1] = 0xffff_ffff; // white -> highlight color
    }

    let tritone = Tritone {
        shadow: RenderColor::new(0, 0, 128, 255),
        midtone: RenderColor::new(0, 255, 0, 255),
        highlight: RenderColor::new(255, 128, 0, 255),
    };
    assert!(effect_tritone(
        &mut target,
        RenderRegion::new(0, 0, 2, 1),
        &tritone,
    ));

    let data = target.data32().unwrap();
    // ABGR packing: shadow (r=0, g=0, b=128).
    assert_px_near(data[0], 0xff80_0000, 2);
    // Highlight (r=255, g=128, b=0), within interpolation rounding of the
    // luma cap.
    assert_px_near(data[1], 0xff00_80ff, 4);
}

#[test]
fn effects_clip_to_the_target() {
    let mut target = abgr_surface(4, 4);
    target.data32_mut().unwrap().fill(0xff40_4040);
    // A bbox hanging off the surface still works on the overlap.
    let fill = FillEffect {
        color: RenderColor::new(0, 255, 0, 255),
    };
    assert!(effect_fill(
        &mut target,
        RenderRegion::new(2, 2, 100, 100),
        &fill,
    ));

    let data = target.data32().unwrap();
    assert_eq!(data[0], 0xff40_4040);
    assert_eq!(data[3 * 4 + 3], 0xff00_ff00);
}
