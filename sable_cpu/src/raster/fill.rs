// Copyright 2026 the Sable Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gradient fills over rects and coverage spans.
//!
//! Every kernel here evaluates the gradient for one scanline run into a
//! scratch row, then composites that row exactly like the color kernels
//! composite a constant. This keeps one evaluator for all compositing modes
//! instead of one hand-written body per combination.

use sable_common::gradient::EncodedFill;
use sable_common::mask::{CompositeMethod, MaskOp, MASK_ADD, MASK_NONE};
use sable_common::pixel::{alpha, alpha_blend, interpolate, interpolate8, inv_alpha, mul_255};
use sable_common::region::RenderRegion;
use sable_common::rle::Rle;

use crate::raster::composite_mask_image;
use crate::surface::{Surface, SurfaceBuf};

/// Composite a gradient over a rectangle.
pub(crate) fn raster_gradient_rect(
    surface: &mut Surface,
    bbox: RenderRegion,
    fill: &EncodedFill,
    opacity: u8,
) -> bool {
    if !bbox.valid() {
        return false;
    }

    if let Some(compositor) = surface.compositor() {
        match compositor.method {
            CompositeMethod::Matte(_) => gradient_matted_rect(surface, bbox, fill, opacity),
            CompositeMethod::Mask(_) => gradient_masked_rect(surface, bbox, fill, opacity),
        }
    } else if surface.blender.is_some() {
        gradient_blending_rect(surface, bbox, fill, opacity)
    } else {
        gradient_normal_rect(surface, bbox, fill, opacity)
    }
}

/// Composite a gradient through coverage spans.
pub(crate) fn raster_gradient_rle(
    surface: &mut Surface,
    rle: &Rle,
    bbox: RenderRegion,
    fill: &EncodedFill,
    opacity: u8,
) -> bool {
    if !rle.is_valid() {
        return false;
    }

    if let Some(compositor) = surface.compositor() {
        match compositor.method {
            CompositeMethod::Matte(_) => gradient_matted_rle(surface, rle, bbox, fill, opacity),
            CompositeMethod::Mask(_) => gradient_masked_rle(surface, rle, bbox, fill, opacity),
        }
    } else if surface.blender.is_some() {
        gradient_blending_rle(surface, rle, bbox, fill, opacity)
    } else {
        gradient_normal_rle(surface, rle, bbox, fill, opacity)
    }
}

/// Evaluate one run and fold an extra alpha factor into it.
fn fetch_row(fill: &EncodedFill, x: i32, y: i32, row: &mut [u32], surface_join: sable_common::pixel::JoinFn, extra: u8) {
    fill.fetch(x, y, row, surface_join);
    if extra < 255 {
        for px in row {
            *px = alpha_blend(*px, extra);
        }
    }
}

fn gradient_normal_rect(
    surface: &mut Surface,
    bbox: RenderRegion,
    fill: &EncodedFill,
    opacity: u8,
) -> bool {
    let stride = surface.stride;
    let join = surface.join;
    let translucent = fill.translucent() || opacity < 255;
    let w = bbox.w() as usize;
    let mut row = vec![0_u32; w];

    match &mut surface.buf {
        SurfaceBuf::Rgba(buf) => {
            for y in bbox.min.y..bbox.max.y {
                fetch_row(fill, bbox.min.x, y, &mut row, join, opacity);
                let drow = y as usize * stride + bbox.min.x as usize;
                let dst = &mut buf[drow..drow + w];
                if translucent {
                    for (d, &s) in dst.iter_mut().zip(&row) {
                        *d = s + alpha_blend(*d, inv_alpha(s));
                    }
                } else {
                    dst.copy_from_slice(&row);
                }
            }
        }
        SurfaceBuf::Gray(buf) => {
            let op = if translucent { MASK_ADD } else { MASK_NONE };
            for y in bbox.min.y..bbox.max.y {
                fetch_row(fill, bbox.min.x, y, &mut row, join, opacity);
                let drow = y as usize * stride + bbox.min.x as usize;
                for (d, &s) in buf[drow..drow + w].iter_mut().zip(&row) {
                    let a = alpha(s);
                    *d = op(a, *d, 255 - a);
                }
            }
        }
    }
    true
}

fn gradient_blending_rect(
    surface: &mut Surface,
    bbox: RenderRegion,
    fill: &EncodedFill,
    opacity: u8,
) -> bool {
    if surface.channel_size() != 4 {
        return false;
    }

    let blender = surface.blender.unwrap();
    let stride = surface.stride;
    let join = surface.join;
    let w = bbox.w() as usize;
    let mut row = vec![0_u32; w];

    let buf = surface.buf32_mut();
    for y in bbox.min.y..bbox.max.y {
        fetch_row(fill, bbox.min.x, y, &mut row, join, opacity);
        let drow = y as usize * stride + bbox.min.x as usize;
        for (d, &s) in buf[drow..drow + w].iter_mut().zip(&row) {
            *d = interpolate(blender(s, *d), *d, alpha(s));
        }
    }
    true
}

fn gradient_masked_rect(
    surface: &mut Surface,
    bbox: RenderRegion,
    fill: &EncodedFill,
    opacity: u8,
) -> bool {
    if surface.channel_size() != 1 {
        return false;
    }
    let compositor = surface.compositor().unwrap();
    let CompositeMethod::Mask(method) = compositor.method else {
        return false;
    };
    if compositor.image.channel_size() != 1 {
        log::error!("masked gradient requires an 8-bit mask image");
        return false;
    }

    log::trace!("masked({method:?}) gradient [region: {bbox:?}]");

    let op = method.op();
    let join = surface.join;
    let stride = surface.stride;
    let w = bbox.w() as usize;
    let mut row = vec![0_u32; w];

    if method.is_direct() {
        let Surface {
            buf, compositors, ..
        } = surface;
        let cmp_image = &compositors.last().unwrap().image;
        let cstride = cmp_image.stride;
        let cbuf = cmp_image.buf8();
        let SurfaceBuf::Gray(dbuf) = buf else {
            return false;
        };
        for y in bbox.min.y..bbox.max.y {
            fetch_row(fill, bbox.min.x, y, &mut row, join, opacity);
            let crow = y as usize * cstride + bbox.min.x as usize;
            let drow = y as usize * stride + bbox.min.x as usize;
            for i in 0..w {
                let tmp = op(alpha(row[i]), cbuf[crow + i], 0);
                let dst = &mut dbuf[drow + i];
                *dst = tmp + mul_255(*dst, !tmp);
            }
        }
        true
    } else {
        {
            let cmp_image = &mut surface.compositors.last_mut().unwrap().image;
            let cstride = cmp_image.stride;
            let cbuf = cmp_image.buf8_mut();
            for y in bbox.min.y..bbox.max.y {
                fetch_row(fill, bbox.min.x, y, &mut row, join, opacity);
                let crow = y as usize * cstride + bbox.min.x as usize;
                for (cmp, &s) in cbuf[crow..crow + w].iter_mut().zip(&row) {
                    let src = alpha(s);
                    *cmp = op(src, *cmp, 255 - src);
                }
            }
        }
        composite_mask_image(surface)
    }
}

fn gradient_matted_rect(
    surface: &mut Surface,
    bbox: RenderRegion,
    fill: &EncodedFill,
    opacity: u8,
) -> bool {
    let stride = surface.stride;
    let join = surface.join;
    let alphas = surface.alphas;
    let Surface {
        buf, compositors, ..
    } = surface;
    let compositor = compositors.last().unwrap();
    let CompositeMethod::Matte(matte) = compositor.method else {
        return false;
    };
    if compositor.image.channel_size() != 4 {
        log::error!("matted gradient requires a 32-bit matte image");
        return false;
    }

    log::trace!("matted({matte:?}) gradient [region: {bbox:?}]");

    let alpha_fn = alphas[matte.index()];
    let cstride = compositor.image.stride;
    let cbuf = compositor.image.buf32();
    let w = bbox.w() as usize;
    let mut row = vec![0_u32; w];

    match buf {
        SurfaceBuf::Rgba(dbuf) => {
            for y in bbox.min.y..bbox.max.y {
                fetch_row(fill, bbox.min.x, y, &mut row, join, opacity);
                let drow = y as usize * stride + bbox.min.x as usize;
                let crow = y as usize * cstride + bbox.min.x as usize;
                for i in 0..w {
                    let tmp = alpha_blend(row[i], alpha_fn(cbuf[crow + i]));
                    let dst = &mut dbuf[drow + i];
                    *dst = tmp + alpha_blend(*dst, inv_alpha(tmp));
                }
            }
        }
        SurfaceBuf::Gray(dbuf) => {
            for y in bbox.min.y..bbox.max.y {
                fetch_row(fill, bbox.min.x, y, &mut row, join, opacity);
                let drow = y as usize * stride + bbox.min.x as usize;
                let crow = y as usize * cstride + bbox.min.x as usize;
                for i in 0..w {
                    let dst = &mut dbuf[drow + i];
                    *dst = interpolate8(alpha(row[i]), *dst, alpha_fn(cbuf[crow + i]));
                }
            }
        }
    }
    true
}

fn gradient_normal_rle(
    surface: &mut Surface,
    rle: &Rle,
    bbox: RenderRegion,
    fill: &EncodedFill,
    opacity: u8,
) -> bool {
    let stride = surface.stride;
    let join = surface.join;
    let translucent = fill.translucent() || opacity < 255;
    let mut row = Vec::new();

    match &mut surface.buf {
        SurfaceBuf::Rgba(buf) => {
            for span in rle.fetch(&bbox) {
                let Some((x, len)) = span.fetch(&bbox) else {
                    continue;
                };
                row.resize(len as usize, 0);
                let cov = mul_255(span.coverage, opacity);
                fetch_row(fill, x, i32::from(span.y), &mut row, join, cov);
                let drow = span.y as usize * stride + x as usize;
                let dst = &mut buf[drow..drow + len as usize];
                if translucent || cov < 255 {
                    for (d, &s) in dst.iter_mut().zip(&row) {
                        *d = s + alpha_blend(*d, inv_alpha(s));
                    }
                } else {
                    dst.copy_from_slice(&row);
                }
            }
        }
        SurfaceBuf::Gray(buf) => {
            for span in rle.fetch(&bbox) {
                let Some((x, len)) = span.fetch(&bbox) else {
                    continue;
                };
                row.resize(len as usize, 0);
                let cov = mul_255(span.coverage, opacity);
                fetch_row(fill, x, i32::from(span.y), &mut row, join, cov);
                let op = if translucent || cov < 255 { MASK_ADD } else { MASK_NONE };
                let drow = span.y as usize * stride + x as usize;
                for (d, &s) in buf[drow..drow + len as usize].iter_mut().zip(&row) {
                    let a = alpha(s);
                    *d = op(a, *d, 255 - a);
                }
            }
        }
    }
    true
}

fn gradient_blending_rle(
    surface: &mut Surface,
    rle: &Rle,
    bbox: RenderRegion,
    fill: &EncodedFill,
    opacity: u8,
) -> bool {
    if surface.channel_size() != 4 {
        return false;
    }

    let blender = surface.blender.unwrap();
    let stride = surface.stride;
    let join = surface.join;
    let mut row = Vec::new();

    let buf = surface.buf32_mut();
    for span in rle.fetch(&bbox) {
        let Some((x, len)) = span.fetch(&bbox) else {
            continue;
        };
        row.resize(len as usize, 0);
        let cov = mul_255(span.coverage, opacity);
        fetch_row(fill, x, i32::from(span.y), &mut row, join, cov);
        let drow = span.y as usize * stride + x as usize;
        for (d, &s) in buf[drow..drow + len as usize].iter_mut().zip(&row) {
            *d = interpolate(blender(s, *d), *d, alpha(s));
        }
    }
    true
}

fn gradient_masked_rle(
    surface: &mut Surface,
    rle: &Rle,
    bbox: RenderRegion,
    fill: &EncodedFill,
    opacity: u8,
) -> bool {
    if surface.channel_size() != 1 {
        return false;
    }
    let compositor = surface.compositor().unwrap();
    let CompositeMethod::Mask(method) = compositor.method else {
        return false;
    };
    if compositor.image.channel_size() != 1 {
        log::error!("masked gradient rle requires an 8-bit mask image");
        return false;
    }

    log::trace!("masked({method:?}) gradient rle");

    let op = method.op();
    let join = surface.join;
    let stride = surface.stride;
    let mut row = Vec::new();

    if method.is_direct() {
        let Surface {
            buf, compositors, ..
        } = surface;
        let cmp_image = &compositors.last().unwrap().image;
        let cstride = cmp_image.stride;
        let cbuf = cmp_image.buf8();
        let SurfaceBuf::Gray(dbuf) = buf else {
            return false;
        };
        for span in rle.fetch(&bbox) {
            let Some((x, len)) = span.fetch(&bbox) else {
                continue;
            };
            row.resize(len as usize, 0);
            let cov = mul_255(span.coverage, opacity);
            fetch_row(fill, x, i32::from(span.y), &mut row, join, cov);
            let crow = span.y as usize * cstride + x as usize;
            let drow = span.y as usize * stride + x as usize;
            for i in 0..len as usize {
                let tmp = op(alpha(row[i]), cbuf[crow + i], 0);
                let dst = &mut dbuf[drow + i];
                *dst = tmp + mul_255(*dst, !tmp);
            }
        }
        true
    } else {
        {
            let cmp_image = &mut surface.compositors.last_mut().unwrap().image;
            let cstride = cmp_image.stride;
            let cbuf = cmp_image.buf8_mut();
            for span in rle.fetch(&bbox) {
                let Some((x, len)) = span.fetch(&bbox) else {
                    continue;
                };
                row.resize(len as usize, 0);
                let cov = mul_255(span.coverage, opacity);
                fetch_row(fill, x, i32::from(span.y), &mut row, join, cov);
                let crow = span.y as usize * cstride + x as usize;
                for (cmp, &s) in cbuf[crow..crow + len as usize].iter_mut().zip(&row) {
                    let src = alpha(s);
                    *cmp = op(src, *cmp, 255 - src);
                }
            }
        }
        composite_mask_image(surface)
    }
}

fn gradient_matted_rle(
    surface: &mut Surface,
    rle: &Rle,
    bbox: RenderRegion,
    fill: &EncodedFill,
    opacity: u8,
) -> bool {
    let stride = surface.stride;
    let join = surface.join;
    let alphas = surface.alphas;
    let Surface {
        buf, compositors, ..
    } = surface;
    let compositor = compositors.last().unwrap();
    let CompositeMethod::Matte(matte) = compositor.method else {
        return false;
    };
    if compositor.image.channel_size() != 4 {
        log::error!("matted gradient rle requires a 32-bit matte image");
        return false;
    }

    log::trace!("matted({matte:?}) gradient rle");

    let alpha_fn = alphas[matte.index()];
    let cstride = compositor.image.stride;
    let cbuf = compositor.image.buf32();
    let mut row = Vec::new();

    match buf {
        SurfaceBuf::Rgba(dbuf) => {
            for span in rle.fetch(&bbox) {
                let Some((x, len)) = span.fetch(&bbox) else {
                    continue;
                };
                row.resize(len as usize, 0);
                let cov = mul_255(span.coverage, opacity);
                fetch_row(fill, x, i32::from(span.y), &mut row, join, cov);
                let drow = span.y as usize * stride + x as usize;
                let crow = span.y as usize * cstride + x as usize;
                for i in 0..len as usize {
                    let tmp = alpha_blend(row[i], alpha_fn(cbuf[crow + i]));
                    let dst = &mut dbuf[drow + i];
                    *dst = tmp + alpha_blend(*dst, inv_alpha(tmp));
                }
            }
        }
        SurfaceBuf::Gray(dbuf) => {
            for span in rle.fetch(&bbox) {
                let Some((x, len)) = span.fetch(&bbox) else {
                    continue;
                };
                row.resize(len as usize, 0);
                let cov = mul_255(span.coverage, opacity);
                fetch_row(fill, x, i32::from(span.y), &mut row, join, cov);
                let drow = span.y as usize * stride + x as usize;
                let crow = span.y as usize * cstride + x as usize;
                for i in 0..len as usize {
                    let dst = &mut dbuf[drow + i];
                    *dst = interpolate8(alpha(row[i]), *dst, alpha_fn(cbuf[crow + i]));
                }
            }
        }
    }
    true
}
