// Copyright 2026 the Sable Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rasterizing axis-aligned rectangles in every compositing mode.

use sable_common::mask::{CompositeMethod, MaskOp};
use sable_common::pixel::{alpha_blend, interpolate8, inv_alpha, mul_255, RenderColor};
use sable_common::region::RenderRegion;

use crate::raster::{composite_mask_image, pix};
use crate::surface::{Surface, SurfaceBuf};

/// Composite a premultiplied color over a rectangle.
///
/// The bbox must already be clipped to the surface.
pub(crate) fn raster_rect(surface: &mut Surface, bbox: RenderRegion, c: RenderColor) -> bool {
    if !bbox.valid() {
        return false;
    }

    if let Some(compositor) = surface.compositor() {
        match compositor.method {
            CompositeMethod::Matte(_) => raster_matted_rect(surface, bbox, c),
            CompositeMethod::Mask(_) => raster_masked_rect(surface, bbox, c),
        }
    } else if surface.blender.is_some() {
        raster_blending_rect(surface, bbox, c)
    } else if c.a == 255 {
        raster_solid_rect(surface, bbox, c)
    } else {
        raster_translucent_rect(surface, bbox, c)
    }
}

fn raster_solid_rect(surface: &mut Surface, bbox: RenderRegion, c: RenderColor) -> bool {
    let stride = surface.stride;
    let color = (surface.join)(c.r, c.g, c.b, 255);
    let (x, w) = (bbox.min.x as usize, bbox.w() as usize);

    match &mut surface.buf {
        SurfaceBuf::Rgba(buf) => {
            for y in bbox.min.y..bbox.max.y {
                pix::fill_pixel32(buf, color, y as usize * stride + x, w);
            }
        }
        SurfaceBuf::Gray(buf) => {
            for y in bbox.min.y..bbox.max.y {
                pix::fill_gray8(buf, 0xff, y as usize * stride + x, w);
            }
        }
    }
    true
}

fn raster_translucent_rect(surface: &mut Surface, bbox: RenderRegion, c: RenderColor) -> bool {
    let stride = surface.stride;
    let color = (surface.join)(c.r, c.g, c.b, c.a);
    let (x, w) = (bbox.min.x as usize, bbox.w() as usize);

    match &mut surface.buf {
        SurfaceBuf::Rgba(buf) => {
            // Rows have no cross-row dependency, so the row loop may run in
            // parallel.
            #[cfg(feature = "multithreading")]
            {
                use rayon::prelude::*;
                buf[bbox.min.y as usize * stride..]
                    .par_chunks_mut(stride)
                    .take(bbox.h() as usize)
                    .for_each(|row| pix::src_over_row32(&mut row[x..x + w], color));
            }
            #[cfg(not(feature = "multithreading"))]
            for y in bbox.min.y..bbox.max.y {
                let row = y as usize * stride + x;
                pix::src_over_row32(&mut buf[row..row + w], color);
            }
        }
        SurfaceBuf::Gray(buf) => {
            for y in bbox.min.y..bbox.max.y {
                let row = y as usize * stride + x;
                pix::src_over_row8(&mut buf[row..row + w], c.a);
            }
        }
    }
    true
}

fn raster_blending_rect(surface: &mut Surface, bbox: RenderRegion, c: RenderColor) -> bool {
    if surface.channel_size() != 4 {
        return false;
    }

    let blender = surface.blender.unwrap();
    let color = (surface.join)(c.r, c.g, c.b, c.a);
    let stride = surface.stride;
    let (x, w) = (bbox.min.x as usize, bbox.w() as usize);

    let buf = surface.buf32_mut();
    for y in bbox.min.y..bbox.max.y {
        let row = y as usize * stride + x;
        for px in &mut buf[row..row + w] {
            *px = blender(color, *px);
        }
    }
    true
}

fn raster_masked_rect(surface: &mut Surface, bbox: RenderRegion, c: RenderColor) -> bool {
    // 8-bit masking channel composition only.
    if surface.channel_size() != 1 {
        return false;
    }

    let compositor = surface.compositor().unwrap();
    let CompositeMethod::Mask(method) = compositor.method else {
        return false;
    };
    if compositor.image.channel_size() != 1 {
        log::error!("masked rect requires an 8-bit mask image");
        return false;
    }

    log::trace!("masked({method:?}) rect [region: {bbox:?}]");

    let op = method.op();
    if method.is_direct() {
        raster_direct_masked_rect(surface, bbox, op, c.a)
    } else {
        raster_composite_masked_rect(surface, bbox, op, c.a)
    }
}

fn raster_direct_masked_rect(surface: &mut Surface, bbox: RenderRegion, op: MaskOp, a: u8) -> bool {
    let stride = surface.stride;
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
        let crow = y as usize * cstride + bbox.min.x as usize;
        let drow = y as usize * stride + bbox.min.x as usize;
        for i in 0..bbox.w() as usize {
            let tmp = op(a, cbuf[crow + i], 0);
            let dst = &mut dbuf[drow + i];
            *dst = tmp + mul_255(*dst, !tmp);
        }
    }
    true
}

fn raster_composite_masked_rect(
    surface: &mut Surface,
    bbox: RenderRegion,
    op: MaskOp,
    a: u8,
) -> bool {
    let ialpha = 255 - a;
    {
        let cmp_image = &mut surface.compositors.last_mut().unwrap().image;
        let cstride = cmp_image.stride;
        let cbuf = cmp_image.buf8_mut();
        for y in bbox.min.y..bbox.max.y {
            let crow = y as usize * cstride + bbox.min.x as usize;
            for cmp in &mut cbuf[crow..crow + bbox.w() as usize] {
                *cmp = op(a, *cmp, ialpha);
            }
        }
    }
    composite_mask_image(surface)
}

fn raster_matted_rect(surface: &mut Surface, bbox: RenderRegion, c: RenderColor) -> bool {
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
        log::error!("matted rect requires a 32-bit matte image");
        return false;
    }

    log::trace!("matted({matte:?}) rect [region: {bbox:?}]");

    let alpha = alphas[matte.index()];
    let cstride = compositor.image.stride;
    let cbuf = compositor.image.buf32();
    let (x, w) = (bbox.min.x as usize, bbox.w() as usize);

    match buf {
        SurfaceBuf::Rgba(dbuf) => {
            let color = join(c.r, c.g, c.b, c.a);
            for y in bbox.min.y..bbox.max.y {
                let drow = y as usize * stride + x;
                let crow = y as usize * cstride + x;
                for i in 0..w {
                    let tmp = alpha_blend(color, alpha(cbuf[crow + i]));
                    let dst = &mut dbuf[drow + i];
                    *dst = tmp + alpha_blend(*dst, inv_alpha(tmp));
                }
            }
        }
        SurfaceBuf::Gray(dbuf) => {
            for y in bbox.min.y..bbox.max.y {
                let drow = y as usize * stride + x;
                let crow = y as usize * cstride + x;
                for i in 0..w {
                    let dst = &mut dbuf[drow + i];
                    *dst = interpolate8(c.a, *dst, alpha(cbuf[crow + i]));
                }
            }
        }
    }
    true
}
