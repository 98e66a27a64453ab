// Copyright 2026 the Sable Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A simple pixmap type.

use crate::pixel;

/// A pixmap of premultiplied 32-bit pixels.
///
/// Pixels are packed words whose channel ordering is decided by the surface
/// that consumes them; the PNG loader produces ABGR8888 (little-endian RGBA
/// bytes). Storage is row-major top-to-bottom with `stride == width`.
#[derive(Debug, Clone)]
pub struct Pixmap {
    width: u16,
    height: u16,
    buf: Vec<u32>,
}

impl Pixmap {
    /// Create a new pixmap with the given size, initialized to transparent
    /// black.
    pub fn new(width: u16, height: u16) -> Self {
        let buf = vec![0; usize::from(width) * usize::from(height)];
        Self { width, height, buf }
    }

    /// Create a new pixmap from premultiplied pixel data.
    ///
    /// The pixels are in row-major order.
    ///
    /// # Panics
    ///
    /// Panics if the `data` vector is not of length `width * height`.
    pub fn from_parts(data: Vec<u32>, width: u16, height: u16) -> Self {
        assert_eq!(
            data.len(),
            usize::from(width) * usize::from(height),
            "Expected `data` to have length of exactly `width * height`"
        );
        Self {
            width,
            height,
            buf: data,
        }
    }

    /// Return the width of the pixmap.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Return the height of the pixmap.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Returns a reference to the underlying premultiplied pixels in
    /// row-major order.
    pub fn data(&self) -> &[u32] {
        &self.buf
    }

    /// Returns a mutable reference to the underlying premultiplied pixels in
    /// row-major order.
    pub fn data_mut(&mut self) -> &mut [u32] {
        &mut self.buf
    }

    /// Returns the pixel data as raw bytes.
    pub fn data_as_u8_slice(&self) -> &[u8] {
        bytemuck::cast_slice(&self.buf)
    }

    /// Returns the pixel data as mutable raw bytes.
    pub fn data_as_u8_slice_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.buf)
    }

    /// Sample a pixel. Out-of-bounds coordinates yield transparent black.
    #[inline(always)]
    pub fn sample(&self, x: i32, y: i32) -> u32 {
        if x < 0 || y < 0 || x >= i32::from(self.width) || y >= i32::from(self.height) {
            return 0;
        }
        self.buf[y as usize * usize::from(self.width) + x as usize]
    }

    /// Set a pixel. The coordinate system has its origin at the top-left
    /// corner, `x` increasing to the right and `y` increasing downward.
    #[inline(always)]
    pub fn set_pixel(&mut self, x: u16, y: u16, pixel: u32) {
        let idx = usize::from(self.width) * usize::from(y) + usize::from(x);
        self.buf[idx] = pixel;
    }

    /// Apply an alpha value to the whole pixmap.
    pub fn multiply_alpha(&mut self, alpha: u8) {
        if alpha == 255 {
            return;
        }
        for pixel in &mut self.buf {
            *pixel = pixel::alpha_blend(*pixel, alpha);
        }
    }

    /// Consume the pixmap, returning the premultiplied pixel data.
    pub fn take(self) -> Vec<u32> {
        self.buf
    }

    /// Create a pixmap from a PNG stream.
    ///
    /// The result is ABGR8888 (little-endian RGBA bytes), premultiplied.
    #[cfg(feature = "png")]
    pub fn from_png(data: impl std::io::Read) -> Result<Self, png::DecodingError> {
        let mut decoder = png::Decoder::new(data);
        decoder.set_transformations(
            png::Transformations::normalize_to_color8() | png::Transformations::ALPHA,
        );

        let mut reader = decoder.read_info()?;
        let mut pixmap = {
            let info = reader.info();
            let width: u16 = info
                .width
                .try_into()
                .map_err(|_| png::DecodingError::LimitsExceeded)?;
            let height: u16 = info
                .height
                .try_into()
                .map_err(|_| png::DecodingError::LimitsExceeded)?;
            Self::new(width, height)
        };

        let (color_type, bit_depth) = reader.output_color_type();
        debug_assert_eq!(
            bit_depth,
            png::BitDepth::Eight,
            "normalize_to_color8 means the bit depth is always 8."
        );

        match color_type {
            png::ColorType::Rgb | png::ColorType::Grayscale => {
                unreachable!("We set a transformation to always convert to alpha")
            }
            png::ColorType::Indexed => {
                unreachable!("Transformation should have expanded indexed images")
            }
            png::ColorType::Rgba => {
                debug_assert_eq!(
                    pixmap.data_as_u8_slice().len(),
                    reader.output_buffer_size(),
                    "The pixmap buffer should have the same number of bytes as the image."
                );
                reader.next_frame(pixmap.data_as_u8_slice_mut())?;
            }
            png::ColorType::GrayscaleAlpha => {
                let mut grayscale_data = vec![0; reader.output_buffer_size()];
                reader.next_frame(&mut grayscale_data)?;

                for (grayscale_pixel, pixmap_pixel) in
                    grayscale_data.chunks_exact(2).zip(pixmap.data_mut())
                {
                    let gray = u32::from(grayscale_pixel[0]);
                    let alpha = u32::from(grayscale_pixel[1]);
                    *pixmap_pixel = (alpha << 24) | (gray << 16) | (gray << 8) | gray;
                }
            }
        };

        for pixel in pixmap.data_mut() {
            let a = pixel::alpha(*pixel);
            if a != 255 {
                *pixel = pixel::premultiply(*pixel, a);
            }
        }

        Ok(pixmap)
    }

    /// Return the current content of the pixmap as a PNG.
    ///
    /// Pixels are unpremultiplied on the way out.
    #[cfg(feature = "png")]
    pub fn into_png(self) -> Result<Vec<u8>, png::EncodingError> {
        let mut data = Vec::new();
        let mut encoder =
            png::Encoder::new(&mut data, u32::from(self.width), u32::from(self.height));
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        let unpremultiplied: Vec<u32> = self
            .buf
            .iter()
            .map(|&pixel| pixel::unpremultiply(pixel))
            .collect();
        writer.write_image_data(bytemuck::cast_slice(&unpremultiplied))?;
        writer.finish().map(|_| data)
    }
}

/// The scale-derived sample radius for the mean down-sampler.
///
/// `max(1, floor(0.5 / scale))`.
#[inline]
pub fn sample_size(scale: f32) -> i32 {
    let n = (0.5 / scale) as i32;
    n.max(1)
}

/// An image as consumed by the raster pipeline: a premultiplied pixmap plus
/// placement data prepared by the scene layer.
#[derive(Debug, Clone)]
pub struct Image {
    /// The pixel data; always premultiplied.
    pub pixmap: std::sync::Arc<Pixmap>,
    /// Horizontal pre-translate in pixels.
    pub ox: i32,
    /// Vertical pre-translate in pixels.
    pub oy: i32,
    /// Optional coverage for shaped images.
    pub rle: Option<crate::rle::Rle>,
    /// The uniform scale factor of the draw transform; selects the sampling
    /// strategy for scaled blits.
    pub scale: f32,
}

impl Image {
    /// Wrap a pixmap with neutral placement.
    pub fn new(pixmap: std::sync::Arc<Pixmap>) -> Self {
        Self {
            pixmap,
            ox: 0,
            oy: 0,
            rle: None,
            scale: 1.0,
        }
    }

    /// Width of the source pixels.
    pub fn w(&self) -> i32 {
        i32::from(self.pixmap.width())
    }

    /// Height of the source pixels.
    pub fn h(&self) -> i32 {
        i32::from(self.pixmap.height())
    }

    /// Row stride of the source pixels.
    pub fn stride(&self) -> usize {
        usize::from(self.pixmap.width())
    }

    /// Scale the image's alpha, e.g. for a fading snapshot.
    pub fn multiply_alpha(&mut self, alpha: u8) {
        if alpha < 255 {
            std::sync::Arc::make_mut(&mut self.pixmap).multiply_alpha(alpha);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_sample_is_zero() {
        let mut pixmap = Pixmap::new(2, 2);
        pixmap.set_pixel(1, 1, 0xff00_1122);
        assert_eq!(pixmap.sample(1, 1), 0xff00_1122);
        assert_eq!(pixmap.sample(-1, 0), 0);
        assert_eq!(pixmap.sample(0, -1), 0);
        assert_eq!(pixmap.sample(2, 0), 0);
        assert_eq!(pixmap.sample(0, 2), 0);
    }

    #[test]
    fn sample_size_selection() {
        assert_eq!(sample_size(1.0), 1);
        assert_eq!(sample_size(0.5), 1);
        assert_eq!(sample_size(0.25), 2);
        assert_eq!(sample_size(0.1), 5);
    }

    #[test]
    fn multiply_alpha_scales_all_channels() {
        let mut pixmap = Pixmap::from_parts(vec![0xffff_ffff], 1, 1);
        pixmap.multiply_alpha(128);
        let c = pixmap.data()[0];
        assert_eq!(c, 0x8080_8080);
    }
}
