// Copyright 2026 the Sable Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render target and its compositor stack.

use sable_common::blend::Blender;
use sable_common::mask::CompositeMethod;
use sable_common::pixel::{self, AlphaFn, ColorSpace, JoinFn};
use sable_common::region::RenderRegion;

/// Pixel storage of a surface: packed 32-bit words or one 8-bit channel.
#[derive(Debug, Clone)]
pub enum SurfaceBuf {
    /// 32-bit pixels, channel order per the surface's color space.
    Rgba(Vec<u32>),
    /// 8-bit alpha/coverage pixels.
    Gray(Vec<u8>),
}

impl SurfaceBuf {
    /// The size of one pixel in bytes.
    pub fn channel_size(&self) -> usize {
        match self {
            Self::Rgba(_) => 4,
            Self::Gray(_) => 1,
        }
    }
}

/// A compositor attached to a surface for the duration of a scope.
///
/// The `image` is the secondary buffer: 8-bit for masking methods, 32-bit for
/// matting methods. `bbox` is the region the composition is valid over.
#[derive(Debug)]
pub struct Compositor {
    /// How draws composite against the secondary buffer.
    pub method: CompositeMethod,
    /// The mask or matte storage.
    pub image: Surface,
    /// The region the composition covers, clipped to the surface.
    pub bbox: RenderRegion,
}

/// A render target.
///
/// Internal storage is always premultiplied; `premultiplied` tracks whether
/// the buffer currently is, to avoid double conversion on hand-off. All
/// kernels clip to the intersection of their bbox with the surface.
#[derive(Debug)]
pub struct Surface {
    pub(crate) buf: SurfaceBuf,
    pub(crate) stride: usize,
    pub(crate) w: u32,
    pub(crate) h: u32,
    pub(crate) cs: ColorSpace,
    pub(crate) premultiplied: bool,
    pub(crate) join: JoinFn,
    pub(crate) alphas: [AlphaFn; 4],
    pub(crate) blender: Option<Blender>,
    pub(crate) compositors: Vec<Compositor>,
}

/// The join and alpha-extractor tables for a color space.
///
/// `None` for color spaces the compositor cannot work with.
fn tables(cs: ColorSpace) -> Option<(JoinFn, [AlphaFn; 4])> {
    match cs {
        ColorSpace::Abgr8888 | ColorSpace::Abgr8888S => Some((
            pixel::abgr_join,
            [
                pixel::pixel_alpha,
                pixel::pixel_inv_alpha,
                pixel::abgr_luma,
                pixel::abgr_inv_luma,
            ],
        )),
        ColorSpace::Argb8888 | ColorSpace::Argb8888S => Some((
            pixel::argb_join,
            [
                pixel::pixel_alpha,
                pixel::pixel_inv_alpha,
                pixel::argb_luma,
                pixel::argb_inv_luma,
            ],
        )),
        // Grayscale surfaces never pack colors; they reuse the ABGR tables.
        ColorSpace::Grayscale8 => Some((
            pixel::abgr_join,
            [
                pixel::pixel_alpha,
                pixel::pixel_inv_alpha,
                pixel::abgr_luma,
                pixel::abgr_inv_luma,
            ],
        )),
        ColorSpace::Unknown => None,
    }
}

impl Surface {
    /// Create a zeroed surface.
    ///
    /// Returns `None` for a color space the compositor does not support.
    pub fn new(w: u32, h: u32, cs: ColorSpace) -> Option<Self> {
        let len = w as usize * h as usize;
        let buf = match cs.channel_size() {
            1 => SurfaceBuf::Gray(vec![0; len]),
            _ => SurfaceBuf::Rgba(vec![0; len]),
        };
        Self::from_buf(buf, w, h, w as usize, cs)
    }

    /// Wrap an existing 32-bit pixel buffer.
    ///
    /// `data` must hold at least `stride * h` pixels with `stride >= w`. A
    /// straight (`S`) color space marks the surface as not yet premultiplied;
    /// call [`premultiply`](Self::premultiply) before drawing.
    pub fn from_parts(data: Vec<u32>, w: u32, h: u32, stride: usize, cs: ColorSpace) -> Option<Self> {
        if cs.channel_size() != 4 {
            return None;
        }
        Self::from_buf(SurfaceBuf::Rgba(data), w, h, stride, cs)
    }

    fn from_buf(buf: SurfaceBuf, w: u32, h: u32, stride: usize, cs: ColorSpace) -> Option<Self> {
        let Some((join, alphas)) = tables(cs) else {
            log::error!("unsupported color space {cs:?}");
            return None;
        };
        assert!(stride >= w as usize, "stride must cover the surface width");
        let len = match &buf {
            SurfaceBuf::Rgba(v) => v.len(),
            SurfaceBuf::Gray(v) => v.len(),
        };
        assert!(
            len >= stride * h as usize || h == 0,
            "buffer must cover `stride * h` pixels"
        );
        Some(Self {
            buf,
            stride,
            w,
            h,
            cs,
            premultiplied: cs.premultiplied(),
            join,
            alphas,
            blender: None,
            compositors: Vec::new(),
        })
    }

    /// The surface width in pixels.
    pub fn w(&self) -> u32 {
        self.w
    }

    /// The surface height in pixels.
    pub fn h(&self) -> u32 {
        self.h
    }

    /// The row stride in pixels.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The color space.
    pub fn cs(&self) -> ColorSpace {
        self.cs
    }

    /// The size of one pixel in bytes.
    pub fn channel_size(&self) -> usize {
        self.buf.channel_size()
    }

    /// The region covering the whole surface.
    pub fn region(&self) -> RenderRegion {
        RenderRegion::new(0, 0, self.w as i32, self.h as i32)
    }

    /// The 32-bit pixels, if this is a 32-bit surface.
    pub fn data32(&self) -> Option<&[u32]> {
        match &self.buf {
            SurfaceBuf::Rgba(v) => Some(v),
            SurfaceBuf::Gray(_) => None,
        }
    }

    /// The 8-bit pixels, if this is a grayscale surface.
    pub fn data8(&self) -> Option<&[u8]> {
        match &self.buf {
            SurfaceBuf::Gray(v) => Some(v),
            SurfaceBuf::Rgba(_) => None,
        }
    }

    /// Mutable access to the 32-bit pixels, if this is a 32-bit surface.
    pub fn data32_mut(&mut self) -> Option<&mut [u32]> {
        match &mut self.buf {
            SurfaceBuf::Rgba(v) => Some(v),
            SurfaceBuf::Gray(_) => None,
        }
    }

    /// Mutable access to the 8-bit pixels, if this is a grayscale surface.
    pub fn data8_mut(&mut self) -> Option<&mut [u8]> {
        match &mut self.buf {
            SurfaceBuf::Gray(v) => Some(v),
            SurfaceBuf::Rgba(_) => None,
        }
    }

    /// The pixel data as raw bytes.
    pub fn data_as_u8_slice(&self) -> &[u8] {
        match &self.buf {
            SurfaceBuf::Rgba(v) => bytemuck::cast_slice(v),
            SurfaceBuf::Gray(v) => v,
        }
    }

    pub(crate) fn buf32(&self) -> &[u32] {
        match &self.buf {
            SurfaceBuf::Rgba(v) => v,
            SurfaceBuf::Gray(_) => unreachable!("kernel dispatched a 32-bit path on a grayscale surface"),
        }
    }

    pub(crate) fn buf32_mut(&mut self) -> &mut [u32] {
        match &mut self.buf {
            SurfaceBuf::Rgba(v) => v,
            SurfaceBuf::Gray(_) => unreachable!("kernel dispatched a 32-bit path on a grayscale surface"),
        }
    }

    pub(crate) fn buf8(&self) -> &[u8] {
        match &self.buf {
            SurfaceBuf::Gray(v) => v,
            SurfaceBuf::Rgba(_) => unreachable!("kernel dispatched an 8-bit path on a 32-bit surface"),
        }
    }

    pub(crate) fn buf8_mut(&mut self) -> &mut [u8] {
        match &mut self.buf {
            SurfaceBuf::Gray(v) => v,
            SurfaceBuf::Rgba(_) => unreachable!("kernel dispatched an 8-bit path on a 32-bit surface"),
        }
    }

    /// Pack a non-premultiplied color for this surface's channel ordering.
    pub fn join(&self, r: u8, g: u8, b: u8, a: u8) -> u32 {
        (self.join)(r, g, b, a)
    }

    /// Whether the buffer currently holds premultiplied pixels.
    pub fn is_premultiplied(&self) -> bool {
        self.premultiplied
    }

    /// Install a blend function; draws use the blending kernel paths while
    /// one is set.
    pub fn set_blender(&mut self, blender: Option<Blender>) {
        self.blender = blender;
    }

    /// The installed blender, if any.
    pub fn blender(&self) -> Option<Blender> {
        self.blender
    }

    /// The active compositor, if a composite scope is open.
    pub fn compositor(&self) -> Option<&Compositor> {
        self.compositors.last()
    }

    /// Open a composite scope.
    ///
    /// Allocates the secondary buffer: 8-bit for masking methods, 32-bit for
    /// matting methods, both zeroed and surface-sized. Scopes nest LIFO with
    /// [`end_composite`](Self::end_composite). Returns false for a degenerate
    /// bbox.
    pub fn begin_composite(&mut self, method: CompositeMethod, bbox: RenderRegion) -> bool {
        let bbox = bbox.intersected(&self.region());
        if !bbox.valid() {
            return false;
        }

        let image_cs = match method {
            CompositeMethod::Mask(_) => ColorSpace::Grayscale8,
            CompositeMethod::Matte(_) => {
                if self.channel_size() == 4 {
                    self.cs
                } else {
                    ColorSpace::Abgr8888
                }
            }
        };
        // The tables accept every allocatable color space, so this cannot
        // fail for a surface that exists.
        let image = Self::new(self.w, self.h, image_cs).unwrap();

        log::trace!("begin composite {method:?} over {bbox:?}");
        self.compositors.push(Compositor { method, image, bbox });
        true
    }

    /// The secondary buffer of the innermost composite scope, for rendering
    /// the mask or matte content into.
    pub fn composite_image_mut(&mut self) -> Option<&mut Surface> {
        self.compositors.last_mut().map(|c| &mut c.image)
    }

    /// Close the innermost composite scope. Returns false when none is open.
    pub fn end_composite(&mut self) -> bool {
        self.compositors.pop().is_some()
    }

    /// Premultiply the buffer in place. A no-op when already premultiplied or
    /// not 32-bit.
    pub fn premultiply(&mut self) {
        if self.premultiplied || self.channel_size() != 4 {
            return;
        }
        self.premultiplied = true;

        log::info!("premultiply [size: {} x {}]", self.w, self.h);

        let (w, h, stride) = (self.w as usize, self.h as usize, self.stride);
        let buf = self.buf32_mut();
        for row in buf.chunks_mut(stride).take(h) {
            let n = w.min(row.len());
            for px in &mut row[..n] {
                let a = pixel::alpha(*px);
                if a == 255 {
                    continue;
                }
                *px = pixel::premultiply(*px, a);
            }
        }
    }

    /// Unpremultiply the buffer in place for external hand-off. A no-op when
    /// already straight or not 32-bit.
    pub fn unpremultiply(&mut self) {
        if !self.premultiplied || self.channel_size() != 4 {
            return;
        }
        self.premultiplied = false;

        log::info!("unpremultiply [size: {} x {}]", self.w, self.h);

        let (w, h, stride) = (self.w as usize, self.h as usize, self.stride);
        let buf = self.buf32_mut();
        for row in buf.chunks_mut(stride).take(h) {
            let n = w.min(row.len());
            for px in &mut row[..n] {
                *px = pixel::unpremultiply(*px);
            }
        }
    }

    /// Swap between the ABGR and ARGB channel orderings in place.
    ///
    /// Only ABGR⇄ARGB conversions (in any premultiplication flavor) are
    /// supported; everything else is rejected. Converting to the current
    /// ordering is a no-op.
    pub fn convert_cs(&mut self, to: ColorSpace) -> bool {
        if self.cs == to {
            return true;
        }
        let swap = (self.cs.is_abgr() && to.is_argb()) || (self.cs.is_argb() && to.is_abgr());
        if !swap || self.channel_size() != 4 {
            return false;
        }

        log::info!("convert color space {:?} -> {to:?}", self.cs);

        let Some((join, alphas)) = tables(to) else {
            return false;
        };
        self.cs = to;
        self.join = join;
        self.alphas = alphas;

        for px in self.buf32_mut() {
            let c = *px;
            *px = (c & 0xff00_ff00) | ((c & 0x00ff_0000) >> 16) | ((c & 0x0000_00ff) << 16);
        }
        true
    }
}
