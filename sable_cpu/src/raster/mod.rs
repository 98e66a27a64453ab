// Copyright 2026 the Sable Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The raster pipeline entry points.
//!
//! Every entry returns `bool`: true when the draw ran (possibly doing
//! nothing for degenerate input), false when the combination is unsupported
//! or an argument is invalid. A false return guarantees the destination was
//! not modified.

mod fill;
mod image;
pub(crate) mod pix;
mod rect;
mod rle;
pub(crate) mod sampler;

use sable_common::pixel::{mul_255, RenderColor};
use sable_common::pixmap::Image;
use sable_common::region::RenderRegion;

use peniko::kurbo::Affine;

use crate::shape::Shape;
use crate::surface::{Surface, SurfaceBuf};

/// Composite a solid color through a shape.
///
/// Fast-track shapes fill their bbox directly; everything else walks the
/// shape's coverage spans.
pub fn raster_shape(surface: &mut Surface, shape: &Shape, bbox: RenderRegion, mut c: RenderColor) -> bool {
    let bbox = bbox.intersected(&surface.region());
    if !bbox.valid() {
        return true;
    }
    c.premultiply();
    if shape.fast_track {
        rect::raster_rect(surface, bbox, c)
    } else {
        rle::raster_rle(surface, shape.rle.as_ref(), bbox, c)
    }
}

/// Composite a solid color through a shape's stroke coverage.
pub fn raster_stroke(surface: &mut Surface, shape: &Shape, bbox: RenderRegion, mut c: RenderColor) -> bool {
    let bbox = bbox.intersected(&surface.region());
    if !bbox.valid() {
        return true;
    }
    c.premultiply();
    rle::raster_rle(surface, shape.stroke_rle.as_ref(), bbox, c)
}

/// Composite a gradient through a shape.
///
/// A degenerate (single-color) gradient is rerouted to the color kernels.
pub fn raster_gradient_shape(
    surface: &mut Surface,
    shape: &Shape,
    bbox: RenderRegion,
    opacity: u8,
) -> bool {
    let Some(fill) = shape.fill.as_ref() else {
        return false;
    };
    let bbox = bbox.intersected(&surface.region());
    if !bbox.valid() {
        return true;
    }

    if let Some(color) = fill.fetch_solid() {
        let a = mul_255(color.a, opacity);
        return if a > 0 {
            raster_shape(surface, shape, bbox, RenderColor { a, ..color })
        } else {
            true
        };
    }

    if shape.fast_track {
        fill::raster_gradient_rect(surface, bbox, fill, opacity)
    } else if let Some(rle) = shape.rle.as_ref() {
        fill::raster_gradient_rle(surface, rle, bbox, fill, opacity)
    } else {
        false
    }
}

/// Composite a gradient through a shape's stroke coverage.
pub fn raster_gradient_stroke(
    surface: &mut Surface,
    shape: &Shape,
    bbox: RenderRegion,
    opacity: u8,
) -> bool {
    let Some(fill) = shape.stroke_fill.as_ref() else {
        return false;
    };
    let Some(stroke_rle) = shape.stroke_rle.as_ref() else {
        return false;
    };
    let bbox = bbox.intersected(&surface.region());
    if !bbox.valid() {
        return true;
    }

    if let Some(color) = fill.fetch_solid() {
        let a = mul_255(color.a, opacity);
        return if a > 0 {
            raster_stroke(surface, shape, bbox, RenderColor { a, ..color })
        } else {
            true
        };
    }

    fill::raster_gradient_rle(surface, stroke_rle, bbox, fill, opacity)
}

/// Blit an image at an integer offset.
pub fn raster_direct_image(
    surface: &mut Surface,
    img: &Image,
    bbox: RenderRegion,
    opacity: u8,
) -> bool {
    let bbox = bbox.intersected(&surface.region());
    if !bbox.valid() {
        return true;
    }
    image::raster_direct_image(surface, img, bbox, opacity)
}

/// Blit an image under an inverse-affine transform.
pub fn raster_scaled_image(
    surface: &mut Surface,
    img: &Image,
    transform: &Affine,
    bbox: RenderRegion,
    opacity: u8,
) -> bool {
    let bbox = bbox.intersected(&surface.region());
    if !bbox.valid() {
        return true;
    }
    image::raster_scaled_image(surface, img, transform, bbox, opacity)
}

/// Blit a shaped image through its coverage spans.
pub fn raster_direct_rle_image(
    surface: &mut Surface,
    img: &Image,
    bbox: RenderRegion,
    opacity: u8,
) -> bool {
    let bbox = bbox.intersected(&surface.region());
    if !bbox.valid() {
        return true;
    }
    image::raster_direct_rle_image(surface, img, bbox, opacity)
}

/// Blit a shaped image through its coverage spans under a transform.
pub fn raster_scaled_rle_image(
    surface: &mut Surface,
    img: &Image,
    transform: &Affine,
    bbox: RenderRegion,
    opacity: u8,
) -> bool {
    let bbox = bbox.intersected(&surface.region());
    if !bbox.valid() {
        return true;
    }
    image::raster_scaled_rle_image(surface, img, transform, bbox, opacity)
}

/// Zero a region of the surface.
///
/// Takes the full-row fast path when the region spans the whole stride.
pub fn raster_clear(surface: &mut Surface, x: u32, y: u32, w: u32, h: u32) -> bool {
    if surface.w == 0 || surface.h == 0 || surface.stride == 0 {
        return false;
    }
    let region = RenderRegion::from_xywh(x as i32, y as i32, w as i32, h as i32)
        .intersected(&surface.region());
    if !region.valid() {
        return true;
    }
    let stride = surface.stride;
    let (x, w) = (region.min.x as usize, region.w() as usize);
    let full_rows = w == stride;

    match &mut surface.buf {
        SurfaceBuf::Rgba(buf) => {
            if full_rows {
                pix::fill_pixel32(buf, 0, stride * region.min.y as usize, w * region.h() as usize);
            } else {
                for y in region.min.y..region.max.y {
                    pix::fill_pixel32(buf, 0, y as usize * stride + x, w);
                }
            }
        }
        SurfaceBuf::Gray(buf) => {
            if full_rows {
                pix::fill_gray8(buf, 0, stride * region.min.y as usize, w * region.h() as usize);
            } else {
                for y in region.min.y..region.max.y {
                    pix::fill_gray8(buf, 0, y as usize * stride + x, w);
                }
            }
        }
    }
    true
}

/// Apply the active compositor's mask to the destination.
///
/// `dst = mask + dst * ~mask` over the compositor bbox; the read-after-write
/// barrier of every indirect mask operator.
pub fn composite_mask_image(surface: &mut Surface) -> bool {
    let stride = surface.stride;
    let Surface {
        buf, compositors, ..
    } = surface;
    let Some(compositor) = compositors.last() else {
        return false;
    };
    if compositor.image.channel_size() != 1 {
        return false;
    }
    let SurfaceBuf::Gray(dbuf) = buf else {
        return false;
    };

    let bbox = compositor.bbox;
    let cstride = compositor.image.stride;
    let cbuf = compositor.image.buf8();

    for y in bbox.min.y..bbox.max.y {
        let crow = y as usize * cstride + bbox.min.x as usize;
        let drow = y as usize * stride + bbox.min.x as usize;
        for i in 0..bbox.w() as usize {
            let src = cbuf[crow + i];
            let dst = &mut dbuf[drow + i];
            *dst = src + mul_255(*dst, !src);
        }
    }
    true
}

/// Block size of the XY-flip tiling, chosen for cache behavior.
const FLIP_BLOCK: i32 = 8;

/// Transpose a region between two buffers sharing one stride.
///
/// With `flipped` the roles of the source and destination offsets swap, which
/// turns the transpose into the inverse rotation. The block loop is
/// data-parallel across destination row blocks.
pub fn raster_xy_flip(
    src: &[u32],
    dst: &mut [u32],
    stride: usize,
    w: i32,
    h: i32,
    bbox: RenderRegion,
    flipped: bool,
) {
    let (soff, doff) = if flipped {
        (
            bbox.min.x as usize * stride + bbox.min.y as usize,
            bbox.min.y as usize * stride + bbox.min.x as usize,
        )
    } else {
        (
            bbox.min.y as usize * stride + bbox.min.x as usize,
            bbox.min.x as usize * stride + bbox.min.y as usize,
        )
    };

    let src = &src[soff..];
    let dst = &mut dst[doff..];

    #[cfg(feature = "multithreading")]
    {
        use rayon::prelude::*;

        let blocks = (w + FLIP_BLOCK - 1) / FLIP_BLOCK;
        dst.par_chunks_mut(stride * FLIP_BLOCK as usize)
            .take(blocks as usize)
            .enumerate()
            .for_each(|(bi, chunk)| {
                let x0 = bi as i32 * FLIP_BLOCK;
                let bx = (w - x0).min(FLIP_BLOCK);
                flip_block(src, chunk, stride, x0, bx, h);
            });
    }

    #[cfg(not(feature = "multithreading"))]
    {
        let mut x0 = 0;
        while x0 < w {
            let bx = (w - x0).min(FLIP_BLOCK);
            flip_block(src, &mut dst[x0 as usize * stride..], stride, x0, bx, h);
            x0 += FLIP_BLOCK;
        }
    }
}

/// Transpose `bx` destination rows starting at source column `x0`.
fn flip_block(src: &[u32], dst_rows: &mut [u32], stride: usize, x0: i32, bx: i32, h: i32) {
    let mut y0 = 0;
    while y0 < h {
        let by = (h - y0).min(FLIP_BLOCK);
        for xx in 0..bx {
            for yy in 0..by {
                let sx = (x0 + xx) as usize;
                let sy = (y0 + yy) as usize;
                dst_rows[xx as usize * stride + sy] = src[sy * stride + sx];
            }
        }
        y0 += FLIP_BLOCK;
    }
}
