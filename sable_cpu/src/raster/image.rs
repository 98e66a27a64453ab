// Copyright 2026 the Sable Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Image blits, direct and scaled, in every compositing mode.
//!
//! Direct blits copy with an integer offset; scaled blits walk the
//! destination region and invert-transform each pixel into source space,
//! resampling through the up/down samplers. The scaled paths assume the
//! inverse transform is axis-aligned (no skew term); rotated images are a
//! different rasterizer's job.
//!
//! Masked image composition is unsupported in all four sub-modes: those
//! kernels return false without touching the destination.

use sable_common::mask::CompositeMethod;
use sable_common::pixel::{
    alpha, alpha_blend, interpolate, interpolate8, inv_alpha, mul_255, unpremultiply,
};
use sable_common::pixmap::Image;
use sable_common::region::RenderRegion;

use peniko::kurbo::Affine;

use crate::raster::pix;
use crate::raster::sampler::{scale_method, Sampler};
use crate::surface::{Surface, SurfaceBuf};

/// The per-row source window of a scaled blit, or `None` when the row maps
/// outside the image.
struct ScaledRow {
    sy: f32,
    miny: i32,
    maxy: i32,
}

fn scaled_row(y: i32, inv: &[f64; 6], image: &Image, down: bool, n: i32) -> Option<ScaledRow> {
    // inv = [a, b, c, d, e, f]: sy depends only on y for axis-aligned
    // transforms.
    let sy = (f64::from(y) * inv[3] + inv[5] - 0.49) as f32;
    if sy <= -0.5 || sy + 0.5 >= image.h() as f32 {
        return None;
    }
    let (mut miny, mut maxy) = (0, 0);
    if down {
        let my = sy.round() as i32;
        miny = (my - n).max(0);
        maxy = (my + n).min(image.h());
    }
    Some(ScaledRow { sy, miny, maxy })
}

#[inline(always)]
fn scaled_col(x: i32, inv: &[f64; 6], image: &Image) -> Option<f32> {
    let sx = (f64::from(x) * inv[0] + inv[4] - 0.49) as f32;
    if sx <= -0.5 || sx + 0.5 >= image.w() as f32 {
        return None;
    }
    Some(sx)
}

fn invert(transform: &Affine) -> Option<[f64; 6]> {
    if transform.determinant().abs() < 1e-6 {
        return None;
    }
    Some(transform.inverse().as_coeffs())
}

/* Direct image */

/// Blit an image at an integer offset.
pub(crate) fn raster_direct_image(
    surface: &mut Surface,
    image: &Image,
    bbox: RenderRegion,
    opacity: u8,
) -> bool {
    // The actual drawing size, clipped to what the source can provide.
    let w = bbox.w().min(image.w() - (bbox.min.x + image.ox));
    let h = bbox.h().min(image.h() - (bbox.min.y + image.oy));
    if w <= 0 || h <= 0 {
        return true;
    }
    if bbox.min.x + image.ox < 0 || bbox.min.y + image.oy < 0 {
        return false;
    }

    if let Some(compositor) = surface.compositor() {
        match compositor.method {
            CompositeMethod::Matte(_) => {
                if surface.blender.is_some() {
                    direct_matted_blending_image(surface, image, bbox, w, h, opacity)
                } else {
                    direct_matted_image(surface, image, bbox, w, h, opacity)
                }
            }
            CompositeMethod::Mask(_) => {
                log::error!("not supported: direct masked image");
                false
            }
        }
    } else if surface.blender.is_some() {
        direct_blending_image(surface, image, bbox, w, h, opacity)
    } else {
        direct_image(surface, image, bbox, w, h, opacity)
    }
}

fn direct_image(
    surface: &mut Surface,
    image: &Image,
    bbox: RenderRegion,
    w: i32,
    h: i32,
    opacity: u8,
) -> bool {
    let stride = surface.stride;
    let istride = image.stride();
    let sbuf = image.pixmap.data();
    let sx = (bbox.min.x + image.ox) as usize;
    let sy = (bbox.min.y + image.oy) as usize;

    match &mut surface.buf {
        SurfaceBuf::Rgba(dbuf) => {
            for y in 0..h as usize {
                let srow = (sy + y) * istride + sx;
                let drow = (bbox.min.y as usize + y) * stride + bbox.min.x as usize;
                pix::translucent_row32(
                    &mut dbuf[drow..drow + w as usize],
                    &sbuf[srow..srow + w as usize],
                    opacity,
                );
            }
        }
        SurfaceBuf::Gray(dbuf) => {
            for y in 0..h as usize {
                let srow = (sy + y) * istride + sx;
                let drow = (bbox.min.y as usize + y) * stride + bbox.min.x as usize;
                for (d, &s) in dbuf[drow..drow + w as usize]
                    .iter_mut()
                    .zip(&sbuf[srow..srow + w as usize])
                {
                    if opacity == 255 {
                        *d = alpha(s) + mul_255(*d, inv_alpha(s));
                    } else {
                        *d = interpolate8(alpha(s), *d, opacity);
                    }
                }
            }
        }
    }
    true
}

fn direct_blending_image(
    surface: &mut Surface,
    image: &Image,
    bbox: RenderRegion,
    w: i32,
    h: i32,
    opacity: u8,
) -> bool {
    if surface.channel_size() != 4 {
        log::error!("not supported: grayscale direct blending image");
        return false;
    }

    let blender = surface.blender.unwrap();
    let stride = surface.stride;
    let istride = image.stride();
    let sbuf = image.pixmap.data();
    let sx = (bbox.min.x + image.ox) as usize;
    let sy = (bbox.min.y + image.oy) as usize;

    let dbuf = surface.buf32_mut();
    for y in 0..h as usize {
        let srow = (sy + y) * istride + sx;
        let drow = (bbox.min.y as usize + y) * stride + bbox.min.x as usize;
        for (d, &s) in dbuf[drow..drow + w as usize]
            .iter_mut()
            .zip(&sbuf[srow..srow + w as usize])
        {
            let weight = if opacity == 255 {
                alpha(s)
            } else {
                mul_255(opacity, alpha(s))
            };
            *d = interpolate(blender(unpremultiply(s), *d), *d, weight);
        }
    }
    true
}

fn direct_matted_image(
    surface: &mut Surface,
    image: &Image,
    bbox: RenderRegion,
    w: i32,
    h: i32,
    opacity: u8,
) -> bool {
    let stride = surface.stride;
    let alphas = surface.alphas;
    let Surface {
        buf, compositors, ..
    } = surface;
    let compositor = compositors.last().unwrap();
    let CompositeMethod::Matte(matte) = compositor.method else {
        return false;
    };
    if compositor.image.channel_size() != 4 {
        log::error!("matted image requires a 32-bit matte image");
        return false;
    }

    log::trace!("direct matted({matte:?}) image [region: {bbox:?}]");

    let alpha_fn = alphas[matte.index()];
    let cstride = compositor.image.stride;
    let cbuf = compositor.image.buf32();
    let istride = image.stride();
    let sbuf = image.pixmap.data();
    let sx = (bbox.min.x + image.ox) as usize;
    let sy = (bbox.min.y + image.oy) as usize;

    match buf {
        SurfaceBuf::Rgba(dbuf) => {
            for y in 0..h as usize {
                let srow = (sy + y) * istride + sx;
                let drow = (bbox.min.y as usize + y) * stride + bbox.min.x as usize;
                let crow = (bbox.min.y as usize + y) * cstride + bbox.min.x as usize;
                for i in 0..w as usize {
                    let weight = if opacity == 255 {
                        alpha_fn(cbuf[crow + i])
                    } else {
                        mul_255(opacity, alpha_fn(cbuf[crow + i]))
                    };
                    let tmp = alpha_blend(sbuf[srow + i], weight);
                    let dst = &mut dbuf[drow + i];
                    *dst = tmp + alpha_blend(*dst, inv_alpha(tmp));
                }
            }
        }
        SurfaceBuf::Gray(dbuf) => {
            for y in 0..h as usize {
                let srow = (sy + y) * istride + sx;
                let drow = (bbox.min.y as usize + y) * stride + bbox.min.x as usize;
                let crow = (bbox.min.y as usize + y) * cstride + bbox.min.x as usize;
                for i in 0..w as usize {
                    let weight = if opacity == 255 {
                        alpha_fn(cbuf[crow + i])
                    } else {
                        mul_255(opacity, alpha_fn(cbuf[crow + i]))
                    };
                    let tmp = mul_255(alpha(sbuf[srow + i]), weight);
                    let dst = &mut dbuf[drow + i];
                    *dst = tmp + mul_255(*dst, 255 - tmp);
                }
            }
        }
    }
    true
}

fn direct_matted_blending_image(
    surface: &mut Surface,
    image: &Image,
    bbox: RenderRegion,
    w: i32,
    h: i32,
    opacity: u8,
) -> bool {
    if surface.channel_size() != 4 {
        log::error!("not supported: grayscale matted blending image");
        return false;
    }

    let blender = surface.blender.unwrap();
    let stride = surface.stride;
    let alphas = surface.alphas;
    let Surface {
        buf, compositors, ..
    } = surface;
    let compositor = compositors.last().unwrap();
    let CompositeMethod::Matte(matte) = compositor.method else {
        return false;
    };
    if compositor.image.channel_size() != 4 {
        log::error!("matted image requires a 32-bit matte image");
        return false;
    }

    let alpha_fn = alphas[matte.index()];
    let cstride = compositor.image.stride;
    let cbuf = compositor.image.buf32();
    let istride = image.stride();
    let sbuf = image.pixmap.data();
    let sx = (bbox.min.x + image.ox) as usize;
    let sy = (bbox.min.y + image.oy) as usize;

    let SurfaceBuf::Rgba(dbuf) = buf else {
        return false;
    };
    for y in 0..h as usize {
        let srow = (sy + y) * istride + sx;
        let drow = (bbox.min.y as usize + y) * stride + bbox.min.x as usize;
        let crow = (bbox.min.y as usize + y) * cstride + bbox.min.x as usize;
        for i in 0..w as usize {
            let s = sbuf[srow + i];
            let mut weight = mul_255(alpha(s), alpha_fn(cbuf[crow + i]));
            if opacity < 255 {
                weight = mul_255(weight, opacity);
            }
            let dst = &mut dbuf[drow + i];
            *dst = interpolate(blender(s, *dst), *dst, weight);
        }
    }
    true
}

/* Scaled image */

/// Blit an image under an arbitrary axis-aligned transform.
pub(crate) fn raster_scaled_image(
    surface: &mut Surface,
    image: &Image,
    transform: &Affine,
    bbox: RenderRegion,
    opacity: u8,
) -> bool {
    let Some(inv) = invert(transform) else {
        // A degenerate transform draws nothing.
        return true;
    };

    if let Some(compositor) = surface.compositor() {
        match compositor.method {
            CompositeMethod::Matte(_) => scaled_matted_image(surface, image, &inv, bbox, opacity),
            CompositeMethod::Mask(_) => {
                log::error!("not supported: scaled masked image");
                false
            }
        }
    } else if surface.blender.is_some() {
        scaled_blending_image(surface, image, &inv, bbox, opacity)
    } else {
        scaled_image(surface, image, &inv, bbox, opacity)
    }
}

fn scaled_image(
    surface: &mut Surface,
    image: &Image,
    inv: &[f64; 6],
    bbox: RenderRegion,
    opacity: u8,
) -> bool {
    let stride = surface.stride;
    let (sampler, n): (Sampler, i32) = scale_method(image.scale);
    let down = image.scale < super::sampler::DOWN_SCALE_TOLERANCE;
    let istride = image.stride();
    let sbuf = image.pixmap.data();
    let (iw, ih) = (image.w() as u32, image.h() as u32);

    match &mut surface.buf {
        SurfaceBuf::Rgba(dbuf) => {
            for y in bbox.min.y..bbox.max.y {
                let Some(row) = scaled_row(y, inv, image, down, n) else {
                    continue;
                };
                let drow = y as usize * stride;
                for x in bbox.min.x..bbox.max.x {
                    let Some(sx) = scaled_col(x, inv, image) else {
                        continue;
                    };
                    let mut src =
                        sampler(sbuf, istride, iw, ih, sx, row.sy, row.miny, row.maxy, n);
                    if opacity < 255 {
                        src = alpha_blend(src, opacity);
                    }
                    let dst = &mut dbuf[drow + x as usize];
                    *dst = src + alpha_blend(*dst, inv_alpha(src));
                }
            }
        }
        SurfaceBuf::Gray(dbuf) => {
            for y in bbox.min.y..bbox.max.y {
                let Some(row) = scaled_row(y, inv, image, down, n) else {
                    continue;
                };
                let drow = y as usize * stride;
                for x in bbox.min.x..bbox.max.x {
                    let Some(sx) = scaled_col(x, inv, image) else {
                        continue;
                    };
                    let src = sampler(sbuf, istride, iw, ih, sx, row.sy, row.miny, row.maxy, n);
                    dbuf[drow + x as usize] = mul_255(alpha(src), opacity);
                }
            }
        }
    }
    true
}

fn scaled_blending_image(
    surface: &mut Surface,
    image: &Image,
    inv: &[f64; 6],
    bbox: RenderRegion,
    opacity: u8,
) -> bool {
    if surface.channel_size() != 4 {
        log::error!("not supported: grayscale scaled blending image");
        return false;
    }

    let blender = surface.blender.unwrap();
    let stride = surface.stride;
    let (sampler, n): (Sampler, i32) = scale_method(image.scale);
    let down = image.scale < super::sampler::DOWN_SCALE_TOLERANCE;
    let istride = image.stride();
    let sbuf = image.pixmap.data();
    let (iw, ih) = (image.w() as u32, image.h() as u32);

    let dbuf = surface.buf32_mut();
    for y in bbox.min.y..bbox.max.y {
        let Some(row) = scaled_row(y, inv, image, down, n) else {
            continue;
        };
        let drow = y as usize * stride;
        for x in bbox.min.x..bbox.max.x {
            let Some(sx) = scaled_col(x, inv, image) else {
                continue;
            };
            let src = sampler(sbuf, istride, iw, ih, sx, row.sy, row.miny, row.maxy, n);
            let dst = &mut dbuf[drow + x as usize];
            *dst = interpolate(
                blender(unpremultiply(src), *dst),
                *dst,
                mul_255(opacity, alpha(src)),
            );
        }
    }
    true
}

fn scaled_matted_image(
    surface: &mut Surface,
    image: &Image,
    inv: &[f64; 6],
    bbox: RenderRegion,
    opacity: u8,
) -> bool {
    if surface.channel_size() != 4 {
        log::error!("not supported: grayscale scaled matted image");
        return false;
    }

    let stride = surface.stride;
    let alphas = surface.alphas;
    let Surface {
        buf, compositors, ..
    } = surface;
    let compositor = compositors.last().unwrap();
    let CompositeMethod::Matte(matte) = compositor.method else {
        return false;
    };
    if compositor.image.channel_size() != 4 {
        log::error!("matted image requires a 32-bit matte image");
        return false;
    }

    log::trace!("scaled matted({matte:?}) image [region: {bbox:?}]");

    let alpha_fn = alphas[matte.index()];
    let cstride = compositor.image.stride;
    let cbuf = compositor.image.buf32();
    let (sampler, n): (Sampler, i32) = scale_method(image.scale);
    let down = image.scale < super::sampler::DOWN_SCALE_TOLERANCE;
    let istride = image.stride();
    let sbuf = image.pixmap.data();
    let (iw, ih) = (image.w() as u32, image.h() as u32);

    let SurfaceBuf::Rgba(dbuf) = buf else {
        return false;
    };
    for y in bbox.min.y..bbox.max.y {
        let Some(row) = scaled_row(y, inv, image, down, n) else {
            continue;
        };
        let drow = y as usize * stride;
        let crow = y as usize * cstride;
        for x in bbox.min.x..bbox.max.x {
            let Some(sx) = scaled_col(x, inv, image) else {
                continue;
            };
            let src = sampler(sbuf, istride, iw, ih, sx, row.sy, row.miny, row.maxy, n);
            let weight = if opacity == 255 {
                alpha_fn(cbuf[crow + x as usize])
            } else {
                mul_255(opacity, alpha_fn(cbuf[crow + x as usize]))
            };
            let tmp = alpha_blend(src, weight);
            let dst = &mut dbuf[drow + x as usize];
            *dst = tmp + alpha_blend(*dst, inv_alpha(tmp));
        }
    }
    true
}

/* Direct RLE image */

/// Blit a shaped image through its coverage spans at an integer offset.
pub(crate) fn raster_direct_rle_image(
    surface: &mut Surface,
    image: &Image,
    bbox: RenderRegion,
    opacity: u8,
) -> bool {
    if surface.channel_size() == 1 {
        log::error!("not supported: grayscale rle image");
        return false;
    }
    let Some(rle) = image.rle.as_ref() else {
        return false;
    };
    if !rle.is_valid() {
        return false;
    }

    if let Some(compositor) = surface.compositor() {
        match compositor.method {
            CompositeMethod::Matte(_) => direct_matted_rle_image(surface, image, bbox, opacity),
            CompositeMethod::Mask(_) => {
                log::error!("not supported: direct masked rle image");
                false
            }
        }
    } else if surface.blender.is_some() {
        direct_blending_rle_image(surface, image, bbox, opacity)
    } else {
        direct_rle_image(surface, image, bbox, opacity)
    }
}

/// The source window for one clipped span of a direct rle blit.
fn direct_span_window<'a>(
    image: &'a Image,
    y: u16,
    x: i32,
    len: i32,
) -> Option<(&'a [u32], i32)> {
    let sy = i32::from(y) + image.oy;
    let sx = x + image.ox;
    if sy < 0 || sy >= image.h() || sx < 0 || sx >= image.w() {
        return None;
    }
    let len = len.min(image.w() - sx);
    let start = sy as usize * image.stride() + sx as usize;
    Some((&image.pixmap.data()[start..start + len as usize], len))
}

fn direct_rle_image(surface: &mut Surface, image: &Image, bbox: RenderRegion, opacity: u8) -> bool {
    let stride = surface.stride;
    let rle = image.rle.as_ref().unwrap();

    let dbuf = surface.buf32_mut();
    for span in rle.fetch(&bbox) {
        let Some((x, len)) = span.fetch(&bbox) else {
            continue;
        };
        let Some((src, len)) = direct_span_window(image, span.y, x, len) else {
            continue;
        };
        let drow = span.y as usize * stride + x as usize;
        let a = mul_255(span.coverage, opacity);
        pix::translucent_row32(&mut dbuf[drow..drow + len as usize], src, a);
    }
    true
}

fn direct_blending_rle_image(
    surface: &mut Surface,
    image: &Image,
    bbox: RenderRegion,
    opacity: u8,
) -> bool {
    let blender = surface.blender.unwrap();
    let stride = surface.stride;
    let rle = image.rle.as_ref().unwrap();

    let dbuf = surface.buf32_mut();
    for span in rle.fetch(&bbox) {
        let Some((x, len)) = span.fetch(&bbox) else {
            continue;
        };
        let Some((src, len)) = direct_span_window(image, span.y, x, len) else {
            continue;
        };
        let drow = span.y as usize * stride + x as usize;
        let a = mul_255(span.coverage, opacity);
        for (d, &s) in dbuf[drow..drow + len as usize].iter_mut().zip(src) {
            if a == 255 {
                *d = blender(unpremultiply(s), *d);
            } else {
                *d = interpolate(blender(unpremultiply(s), *d), *d, mul_255(a, alpha(s)));
            }
        }
    }
    true
}

fn direct_matted_rle_image(
    surface: &mut Surface,
    image: &Image,
    bbox: RenderRegion,
    opacity: u8,
) -> bool {
    let stride = surface.stride;
    let alphas = surface.alphas;
    let Surface {
        buf, compositors, ..
    } = surface;
    let compositor = compositors.last().unwrap();
    let CompositeMethod::Matte(matte) = compositor.method else {
        return false;
    };
    if compositor.image.channel_size() != 4 {
        log::error!("matted image requires a 32-bit matte image");
        return false;
    }

    log::trace!("direct matted({matte:?}) rle image");

    let alpha_fn = alphas[matte.index()];
    let cstride = compositor.image.stride;
    let cbuf = compositor.image.buf32();
    let rle = image.rle.as_ref().unwrap();

    let SurfaceBuf::Rgba(dbuf) = buf else {
        return false;
    };
    for span in rle.fetch(&bbox) {
        let Some((x, len)) = span.fetch(&bbox) else {
            continue;
        };
        let Some((src, len)) = direct_span_window(image, span.y, x, len) else {
            continue;
        };
        let drow = span.y as usize * stride + x as usize;
        let crow = span.y as usize * cstride + x as usize;
        let a = mul_255(span.coverage, opacity);
        for i in 0..len as usize {
            let weight = if a == 255 {
                alpha_fn(cbuf[crow + i])
            } else {
                mul_255(a, alpha_fn(cbuf[crow + i]))
            };
            let tmp = alpha_blend(src[i], weight);
            let dst = &mut dbuf[drow + i];
            *dst = tmp + alpha_blend(*dst, inv_alpha(tmp));
        }
    }
    true
}

/* Scaled RLE image */

/// Blit a shaped image through its coverage spans under a transform.
pub(crate) fn raster_scaled_rle_image(
    surface: &mut Surface,
    image: &Image,
    transform: &Affine,
    bbox: RenderRegion,
    opacity: u8,
) -> bool {
    if surface.channel_size() == 1 {
        log::error!("not supported: grayscale scaled rle image");
        return false;
    }
    let Some(rle) = image.rle.as_ref() else {
        return false;
    };
    if !rle.is_valid() {
        return false;
    }
    let Some(inv) = invert(transform) else {
        return true;
    };

    if let Some(compositor) = surface.compositor() {
        match compositor.method {
            CompositeMethod::Matte(_) => {
                scaled_matted_rle_image(surface, image, &inv, bbox, opacity)
            }
            CompositeMethod::Mask(_) => {
                log::error!("not supported: scaled masked rle image");
                false
            }
        }
    } else if surface.blender.is_some() {
        scaled_blending_rle_image(surface, image, &inv, bbox, opacity)
    } else {
        scaled_rle_image(surface, image, &inv, bbox, opacity)
    }
}

fn scaled_rle_image(
    surface: &mut Surface,
    image: &Image,
    inv: &[f64; 6],
    bbox: RenderRegion,
    opacity: u8,
) -> bool {
    let stride = surface.stride;
    let (sampler, n): (Sampler, i32) = scale_method(image.scale);
    let down = image.scale < super::sampler::DOWN_SCALE_TOLERANCE;
    let istride = image.stride();
    let sbuf = image.pixmap.data();
    let (iw, ih) = (image.w() as u32, image.h() as u32);
    let rle = image.rle.as_ref().unwrap();

    let dbuf = surface.buf32_mut();
    for span in rle.fetch(&bbox) {
        let Some((x0, len)) = span.fetch(&bbox) else {
            continue;
        };
        let Some(row) = scaled_row(i32::from(span.y), inv, image, down, n) else {
            continue;
        };
        let a = mul_255(span.coverage, opacity);
        let drow = span.y as usize * stride;
        for x in x0..x0 + len {
            let Some(sx) = scaled_col(x, inv, image) else {
                continue;
            };
            let mut src = sampler(sbuf, istride, iw, ih, sx, row.sy, row.miny, row.maxy, n);
            if a < 255 {
                src = alpha_blend(src, a);
            }
            let dst = &mut dbuf[drow + x as usize];
            *dst = src + alpha_blend(*dst, inv_alpha(src));
        }
    }
    true
}

fn scaled_blending_rle_image(
    surface: &mut Surface,
    image: &Image,
    inv: &[f64; 6],
    bbox: RenderRegion,
    opacity: u8,
) -> bool {
    let blender = surface.blender.unwrap();
    let stride = surface.stride;
    let (sampler, n): (Sampler, i32) = scale_method(image.scale);
    let down = image.scale < super::sampler::DOWN_SCALE_TOLERANCE;
    let istride = image.stride();
    let sbuf = image.pixmap.data();
    let (iw, ih) = (image.w() as u32, image.h() as u32);
    let rle = image.rle.as_ref().unwrap();

    let dbuf = surface.buf32_mut();
    for span in rle.fetch(&bbox) {
        let Some((x0, len)) = span.fetch(&bbox) else {
            continue;
        };
        let Some(row) = scaled_row(i32::from(span.y), inv, image, down, n) else {
            continue;
        };
        let a = mul_255(span.coverage, opacity);
        let drow = span.y as usize * stride;
        for x in x0..x0 + len {
            let Some(sx) = scaled_col(x, inv, image) else {
                continue;
            };
            let src = sampler(sbuf, istride, iw, ih, sx, row.sy, row.miny, row.maxy, n);
            let weight = if a == 255 { alpha(src) } else { mul_255(a, alpha(src)) };
            let dst = &mut dbuf[drow + x as usize];
            *dst = interpolate(blender(unpremultiply(src), *dst), *dst, weight);
        }
    }
    true
}

fn scaled_matted_rle_image(
    surface: &mut Surface,
    image: &Image,
    inv: &[f64; 6],
    bbox: RenderRegion,
    opacity: u8,
) -> bool {
    let stride = surface.stride;
    let alphas = surface.alphas;
    let Surface {
        buf, compositors, ..
    } = surface;
    let compositor = compositors.last().unwrap();
    let CompositeMethod::Matte(matte) = compositor.method else {
        return false;
    };
    if compositor.image.channel_size() != 4 {
        log::error!("matted image requires a 32-bit matte image");
        return false;
    }

    log::trace!("scaled matted({matte:?}) rle image");

    let alpha_fn = alphas[matte.index()];
    let cstride = compositor.image.stride;
    let cbuf = compositor.image.buf32();
    let (sampler, n): (Sampler, i32) = scale_method(image.scale);
    let down = image.scale < super::sampler::DOWN_SCALE_TOLERANCE;
    let istride = image.stride();
    let sbuf = image.pixmap.data();
    let (iw, ih) = (image.w() as u32, image.h() as u32);
    let rle = image.rle.as_ref().unwrap();

    let SurfaceBuf::Rgba(dbuf) = buf else {
        return false;
    };
    for span in rle.fetch(&bbox) {
        let Some((x0, len)) = span.fetch(&bbox) else {
            continue;
        };
        let Some(row) = scaled_row(i32::from(span.y), inv, image, down, n) else {
            continue;
        };
        let a = mul_255(span.coverage, opacity);
        let drow = span.y as usize * stride;
        let crow = span.y as usize * cstride;
        for x in x0..x0 + len {
            let Some(sx) = scaled_col(x, inv, image) else {
                continue;
            };
            let sample = sampler(sbuf, istride, iw, ih, sx, row.sy, row.miny, row.maxy, n);
            let weight = if a == 255 {
                alpha_fn(cbuf[crow + x as usize])
            } else {
                mul_255(alpha_fn(cbuf[crow + x as usize]), a)
            };
            let src = alpha_blend(sample, weight);
            let dst = &mut dbuf[drow + x as usize];
            *dst = src + alpha_blend(*dst, inv_alpha(src));
        }
    }
    true
}
