// Copyright 2026 the Sable Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Full-target effect passes over intermediate render targets.
//!
//! Every pass reads from a snapshot of the destination region so that a
//! kernel never feeds on pixels it has already written this pass.

use sable_common::filter::{BlurDirection, DropShadow, FillEffect, GaussianBlur, Tint, Tritone};
use sable_common::pixel::{alpha, alpha_blend, interpolate, interpolate8, inv_alpha, premultiply, unpremultiply};
use sable_common::region::RenderRegion;

use crate::surface::Surface;

fn clip_32bit(target: &Surface, bbox: RenderRegion, what: &str) -> Option<RenderRegion> {
    if target.channel_size() != 4 {
        log::error!("not supported: {what} on a grayscale target");
        return None;
    }
    Some(bbox.intersected(&target.region()))
}

/// Gaussian-blur the region, separably.
pub fn effect_gaussian_blur(target: &mut Surface, bbox: RenderRegion, params: &GaussianBlur) -> bool {
    let Some(bbox) = clip_32bit(target, bbox, "gaussian blur") else {
        return false;
    };
    if !bbox.valid() || params.kernel.len() <= 1 {
        return true;
    }

    log::trace!("gaussian blur sigma={} [region: {bbox:?}]", params.sigma);

    let stride = target.stride;
    let buf = target.buf32_mut();
    if matches!(params.direction, BlurDirection::Both | BlurDirection::Horizontal) {
        blur_pass(buf, stride, bbox, &params.kernel, true);
    }
    if matches!(params.direction, BlurDirection::Both | BlurDirection::Vertical) {
        blur_pass(buf, stride, bbox, &params.kernel, false);
    }
    true
}

/// One separable convolution pass over `bbox`, reading from a copy.
fn blur_pass(buf: &mut [u32], stride: usize, bbox: RenderRegion, kernel: &[f32], horizontal: bool) {
    let w = bbox.w() as usize;
    let h = bbox.h() as usize;
    let radius = (kernel.len() / 2) as i32;

    let mut snapshot = vec![0_u32; w * h];
    for (y, row) in snapshot.chunks_exact_mut(w).enumerate() {
        let src = (bbox.min.y as usize + y) * stride + bbox.min.x as usize;
        row.copy_from_slice(&buf[src..src + w]);
    }

    let sample = |x: i32, y: i32| -> u32 {
        // Clamp to the region edge.
        let x = x.clamp(0, w as i32 - 1) as usize;
        let y = y.clamp(0, h as i32 - 1) as usize;
        snapshot[y * w + x]
    };

    for y in 0..h as i32 {
        let drow = (bbox.min.y + y) as usize * stride + bbox.min.x as usize;
        for x in 0..w as i32 {
            let mut acc = [0.0_f32; 4];
            for (k, weight) in kernel.iter().enumerate() {
                let o = k as i32 - radius;
                let s = if horizontal {
                    sample(x + o, y)
                } else {
                    sample(x, y + o)
                };
                acc[0] += *weight * (s >> 24) as f32;
                acc[1] += *weight * ((s >> 16) & 0xff) as f32;
                acc[2] += *weight * ((s >> 8) & 0xff) as f32;
                acc[3] += *weight * (s & 0xff) as f32;
            }
            // Normalization keeps the sum in range; the clamp only guards
            // against float drift at full intensity.
            let q = |v: f32| (v + 0.5).min(255.0) as u32;
            buf[drow + x as usize] =
                q(acc[0]) << 24 | q(acc[1]) << 16 | q(acc[2]) << 8 | q(acc[3]);
        }
    }
}

/// Composite a blurred, shifted silhouette of the region under it.
pub fn effect_drop_shadow(target: &mut Surface, bbox: RenderRegion, params: &DropShadow) -> bool {
    let Some(bbox) = clip_32bit(target, bbox, "drop shadow") else {
        return false;
    };
    if !bbox.valid() {
        return true;
    }

    log::trace!(
        "drop shadow offset=({}, {}) sigma={} [region: {bbox:?}]",
        params.dx,
        params.dy,
        params.sigma
    );

    let w = bbox.w() as usize;
    let h = bbox.h() as usize;
    let stride = target.stride;

    let mut color = params.color;
    color.premultiply();
    let shadow_color = target.join(color.r, color.g, color.b, color.a);

    // The shadow source: the silhouette of the destination tinted with the
    // shadow color, in its own target.
    let buf = target.buf32_mut();
    let mut shadow = vec![0_u32; w * h];
    for (y, row) in shadow.chunks_exact_mut(w).enumerate() {
        let src = (bbox.min.y as usize + y) * stride + bbox.min.x as usize;
        for (s, &d) in row.iter_mut().zip(&buf[src..src + w]) {
            *s = alpha_blend(shadow_color, alpha(d));
        }
    }

    // Sigma zero skips the blur passes entirely.
    if !params.kernel.is_empty() {
        let shadow_bbox = RenderRegion::new(0, 0, w as i32, h as i32);
        blur_pass(&mut shadow, w, shadow_bbox, &params.kernel, true);
        blur_pass(&mut shadow, w, shadow_bbox, &params.kernel, false);
    }

    let dx = params.dx.round() as i32;
    let dy = params.dy.round() as i32;

    // Composite the shifted shadow under the destination.
    for y in 0..h as i32 {
        let drow = (bbox.min.y + y) as usize * stride + bbox.min.x as usize;
        for x in 0..w as i32 {
            let (sx, sy) = (x - dx, y - dy);
            if sx < 0 || sy < 0 || sx >= w as i32 || sy >= h as i32 {
                continue;
            }
            let s = shadow[sy as usize * w + sx as usize];
            let dst = &mut buf[drow + x as usize];
            *dst += alpha_blend(s, inv_alpha(*dst));
        }
    }
    true
}

/// Replace the region's color, preserving its coverage.
pub fn effect_fill(target: &mut Surface, bbox: RenderRegion, params: &FillEffect) -> bool {
    let Some(bbox) = clip_32bit(target, bbox, "fill effect") else {
        return false;
    };
    if !bbox.valid() {
        return true;
    }

    log::trace!("fill effect [region: {bbox:?}]");

    let mut color = params.color;
    color.premultiply();
    let fill = target.join(color.r, color.g, color.b, color.a);
    let stride = target.stride;

    let buf = target.buf32_mut();
    for y in bbox.min.y..bbox.max.y {
        let row = y as usize * stride + bbox.min.x as usize;
        for px in &mut buf[row..row + bbox.w() as usize] {
            *px = alpha_blend(fill, alpha(*px));
        }
    }
    true
}

/// Map the region's luma linearly between two colors.
pub fn effect_tint(target: &mut Surface, bbox: RenderRegion, params: &Tint) -> bool {
    let Some(bbox) = clip_32bit(target, bbox, "tint") else {
        return false;
    };
    if !bbox.valid() {
        return true;
    }
    if params.intensity == 0 {
        return true;
    }

    log::trace!("tint intensity={} [region: {bbox:?}]", params.intensity);

    let luma_fn = target.alphas[2];
    let join = target.join;
    let stride = target.stride;
    let (black, white, intensity) = (params.black, params.white, params.intensity);

    let buf = target.buf32_mut();
    for y in bbox.min.y..bbox.max.y {
        let row = y as usize * stride + bbox.min.x as usize;
        for px in &mut buf[row..row + bbox.w() as usize] {
            let a = alpha(*px);
            if a == 0 {
                continue;
            }
            let luma = luma_fn(unpremultiply(*px));
            let tinted = join(
                interpolate8(white.r, black.r, luma),
                interpolate8(white.g, black.g, luma),
                interpolate8(white.b, black.b, luma),
                a,
            );
            *px = interpolate(premultiply(tinted, a), *px, intensity);
        }
    }
    true
}

/// Map the region's luma piecewise through three colors.
pub fn effect_tritone(target: &mut Surface, bbox: RenderRegion, params: &Tritone) -> bool {
    let Some(bbox) = clip_32bit(target, bbox, "tritone") else {
        return false;
    };
    if !bbox.valid() {
        return true;
    }

    log::trace!("tritone [region: {bbox:?}]");

    let luma_fn = target.alphas[2];
    let join = target.join;
    let stride = target.stride;
    let (shadow, midtone, highlight) = (params.shadow, params.midtone, params.highlight);

    let buf = target.buf32_mut();
    for y in bbox.min.y..bbox.max.y {
        let row = y as usize * stride + bbox.min.x as usize;
        for px in &mut buf[row..row + bbox.w() as usize] {
            let a = alpha(*px);
            if a == 0 {
                continue;
            }
            let luma = luma_fn(unpremultiply(*px));
            let mapped = if luma < 128 {
                let t = luma * 2;
                join(
                    interpolate8(midtone.r, shadow.r, t),
                    interpolate8(midtone.g, shadow.g, t),
                    interpolate8(midtone.b, shadow.b, t),
                    a,
                )
            } else {
                let t = (luma - 128).saturating_mul(2);
                join(
                    interpolate8(highlight.r, midtone.r, t),
                    interpolate8(highlight.g, midtone.g, t),
                    interpolate8(highlight.b, midtone.b, t),
                    a,
                )
            };
            *px = premultiply(mapped, a);
        }
    }
    true
}
