// Copyright 2026 the Sable Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rasterizing anti-aliased coverage spans in every compositing mode.
//!
//! The per-span work mirrors the rect kernels with one addition: coverage
//! modulation. A span with full coverage takes the same fast path as a rect
//! row; partial coverage scales the source before compositing.

use sable_common::mask::{CompositeMethod, MaskOp};
use sable_common::pixel::{alpha_blend, interpolate, interpolate8, inv_alpha, mul_255, RenderColor};
use sable_common::region::RenderRegion;
use sable_common::rle::Rle;

use crate::raster::{composite_mask_image, pix};
use crate::surface::{Surface, SurfaceBuf};

/// Composite a premultiplied color through coverage spans.
pub(crate) fn raster_rle(
    surface: &mut Surface,
    rle: Option<&Rle>,
    bbox: RenderRegion,
    c: RenderColor,
) -> bool {
    let Some(rle) = rle else {
        return false;
    };
    if !rle.is_valid() {
        return false;
    }

    if let Some(compositor) = surface.compositor() {
        match compositor.method {
            CompositeMethod::Matte(_) => raster_matted_rle(surface, rle, bbox, c),
            CompositeMethod::Mask(_) => raster_masked_rle(surface, rle, bbox, c),
        }
    } else if surface.blender.is_some() {
        raster_blending_rle(surface, rle, bbox, c)
    } else if c.a == 255 {
        raster_solid_rle(surface, rle, bbox, c)
    } else {
        raster_translucent_rle(surface, rle, bbox, c)
    }
}

fn raster_solid_rle(surface: &mut Surface, rle: &Rle, bbox: RenderRegion, c: RenderColor) -> bool {
    let stride = surface.stride;
    let color = (surface.join)(c.r, c.g, c.b, 255);

    match &mut surface.buf {
        SurfaceBuf::Rgba(buf) => {
            for span in rle.fetch(&bbox) {
                let Some((x, len)) = span.fetch(&bbox) else {
                    continue;
                };
                let row = span.y as usize * stride + x as usize;
                if span.coverage == 255 {
                    pix::fill_pixel32(buf, color, row, len as usize);
                } else {
                    let src = alpha_blend(color, span.coverage);
                    let ialpha = 255 - span.coverage;
                    for px in &mut buf[row..row + len as usize] {
                        *px = src + alpha_blend(*px, ialpha);
                    }
                }
            }
        }
        SurfaceBuf::Gray(buf) => {
            for span in rle.fetch(&bbox) {
                let Some((x, len)) = span.fetch(&bbox) else {
                    continue;
                };
                let row = span.y as usize * stride + x as usize;
                if span.coverage == 255 {
                    pix::fill_gray8(buf, span.coverage, row, len as usize);
                } else {
                    let ialpha = 255 - span.coverage;
                    for px in &mut buf[row..row + len as usize] {
                        *px = span.coverage + mul_255(*px, ialpha);
                    }
                }
            }
        }
    }
    true
}

fn raster_translucent_rle(
    surface: &mut Surface,
    rle: &Rle,
    bbox: RenderRegion,
    c: RenderColor,
) -> bool {
    let stride = surface.stride;
    let color = (surface.join)(c.r, c.g, c.b, c.a);

    match &mut surface.buf {
        SurfaceBuf::Rgba(buf) => {
            for span in rle.fetch(&bbox) {
                let Some((x, len)) = span.fetch(&bbox) else {
                    continue;
                };
                let row = span.y as usize * stride + x as usize;
                let src = if span.coverage == 255 {
                    color
                } else {
                    alpha_blend(color, span.coverage)
                };
                pix::src_over_row32(&mut buf[row..row + len as usize], src);
            }
        }
        SurfaceBuf::Gray(buf) => {
            for span in rle.fetch(&bbox) {
                let Some((x, len)) = span.fetch(&bbox) else {
                    continue;
                };
                let row = span.y as usize * stride + x as usize;
                let src = if span.coverage == 255 {
                    c.a
                } else {
                    mul_255(c.a, span.coverage)
                };
                pix::src_over_row8(&mut buf[row..row + len as usize], src);
            }
        }
    }
    true
}

fn raster_blending_rle(
    surface: &mut Surface,
    rle: &Rle,
    bbox: RenderRegion,
    c: RenderColor,
) -> bool {
    if surface.channel_size() != 4 {
        return false;
    }

    let blender = surface.blender.unwrap();
    let color = (surface.join)(c.r, c.g, c.b, c.a);
    let stride = surface.stride;

    let buf = surface.buf32_mut();
    for span in rle.fetch(&bbox) {
        let Some((x, len)) = span.fetch(&bbox) else {
            continue;
        };
        let row = span.y as usize * stride + x as usize;
        if span.coverage == 255 {
            for px in &mut buf[row..row + len as usize] {
                *px = blender(color, *px);
            }
        } else {
            for px in &mut buf[row..row + len as usize] {
                *px = interpolate(blender(color, *px), *px, span.coverage);
            }
        }
    }
    true
}

fn raster_masked_rle(surface: &mut Surface, rle: &Rle, bbox: RenderRegion, c: RenderColor) -> bool {
    // 8-bit masking channel composition only.
    if surface.channel_size() != 1 {
        return false;
    }

    let compositor = surface.compositor().unwrap();
    let CompositeMethod::Mask(method) = compositor.method else {
        return false;
    };
    if compositor.image.channel_size() != 1 {
        log::error!("masked rle requires an 8-bit mask image");
        return false;
    }

    log::trace!("masked({method:?}) rle");

    let op = method.op();
    if method.is_direct() {
        raster_direct_masked_rle(surface, rle, bbox, op, c.a)
    } else {
        raster_composite_masked_rle(surface, rle, bbox, op, c.a)
    }
}

fn raster_direct_masked_rle(
    surface: &mut Surface,
    rle: &Rle,
    bbox: RenderRegion,
    op: MaskOp,
    a: u8,
) -> bool {
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

    for span in rle.fetch(&bbox) {
        let Some((x, len)) = span.fetch(&bbox) else {
            continue;
        };
        let src = if span.coverage == 255 {
            a
        } else {
            mul_255(a, span.coverage)
        };
        let crow = span.y as usize * cstride + x as usize;
        let drow = span.y as usize * stride + x as usize;
        for i in 0..len as usize {
            let tmp = op(src, cbuf[crow + i], 0);
            let dst = &mut dbuf[drow + i];
            *dst = tmp + mul_255(*dst, !tmp);
        }
    }
    true
}

fn raster_composite_masked_rle(
    surface: &mut Surface,
    rle: &Rle,
    bbox: RenderRegion,
    op: MaskOp,
    a: u8,
) -> bool {
    {
        let cmp_image = &mut surface.compositors.last_mut().unwrap().image;
        let cstride = cmp_image.stride;
        let cbuf = cmp_image.buf8_mut();
        for span in rle.fetch(&bbox) {
            let Some((x, len)) = span.fetch(&bbox) else {
                continue;
            };
            let src = if span.coverage == 255 {
                a
            } else {
                mul_255(a, span.coverage)
            };
            let ialpha = 255 - src;
            let crow = span.y as usize * cstride + x as usize;
            for cmp in &mut cbuf[crow..crow + len as usize] {
                *cmp = op(src, *cmp, ialpha);
            }
        }
    }
    composite_mask_image(surface)
}

fn raster_matted_rle(surface: &mut Surface, rle: &Rle, bbox: RenderRegion, c: RenderColor) -> bool {
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
        log::error!("matted rle requires a 32-bit matte image");
        return false;
    }

    log::trace!("matted({matte:?}) rle");

    let alpha = alphas[matte.index()];
    let cstride = compositor.image.stride;
    let cbuf = compositor.image.buf32();

    match buf {
        SurfaceBuf::Rgba(dbuf) => {
            let color = join(c.r, c.g, c.b, c.a);
            for span in rle.fetch(&bbox) {
                let Some((x, len)) = span.fetch(&bbox) else {
                    continue;
                };
                let src = if span.coverage == 255 {
                    color
                } else {
                    alpha_blend(color, span.coverage)
                };
                let drow = span.y as usize * stride + x as usize;
                let crow = span.y as usize * cstride + x as usize;
                for i in 0..len as usize {
                    let tmp = alpha_blend(src, alpha(cbuf[crow + i]));
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
                let src = if span.coverage == 255 {
                    c.a
                } else {
                    mul_255(c.a, span.coverage)
                };
                let drow = span.y as usize * stride + x as usize;
                let crow = span.y as usize * cstride + x as usize;
                for i in 0..len as usize {
                    let dst = &mut dbuf[drow + i];
                    *dst = interpolate8(src, *dst, alpha(cbuf[crow + i]));
                }
            }
        }
    }
    true
}
