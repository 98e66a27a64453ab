// Copyright 2026 the Sable Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resampling source images at non-integer coordinates.
//!
//! Two strategies: bilinear interpolation for up-scaling and a 2N×2N mean
//! kernel for down-scaling, selected by the image's transform scale. Both
//! take the same argument list so the image kernels can hold either as a
//! plain function value.

use sable_common::pixel::interpolate;
use sable_common::pixmap::sample_size;

/// Below this scale the mean down-sampler takes over from bilinear.
pub(crate) const DOWN_SCALE_TOLERANCE: f32 = 0.5;

/// A sampler: `(img, stride, w, h, sx, sy, miny, maxy, n) -> pixel`.
pub(crate) type Sampler = fn(&[u32], usize, u32, u32, f32, f32, i32, i32, i32) -> u32;

/// The sampler and sample radius for an image scale.
pub(crate) fn scale_method(scale: f32) -> (Sampler, i32) {
    if scale < DOWN_SCALE_TOLERANCE {
        (interp_down_scaler, sample_size(scale))
    } else {
        (interp_up_scaler, sample_size(scale))
    }
}

/// Bilinear interpolation of the four neighbors of `(sx, sy)`.
pub(crate) fn interp_up_scaler(
    img: &[u32],
    stride: usize,
    w: u32,
    h: u32,
    sx: f32,
    sy: f32,
    _miny: i32,
    _maxy: i32,
    _n: i32,
) -> u32 {
    let rx = sx.max(0.0) as usize;
    let ry = sy.max(0.0) as usize;
    let rx2 = (rx + 1).min(w as usize - 1);
    let ry2 = (ry + 1).min(h as usize - 1);

    let dx = if sx > 0.0 { ((sx - rx as f32) * 255.0) as u8 } else { 0 };
    let dy = if sy > 0.0 { ((sy - ry as f32) * 255.0) as u8 } else { 0 };

    let c1 = img[rx + ry * stride];
    let c2 = img[rx2 + ry * stride];
    let c3 = img[rx + ry2 * stride];
    let c4 = img[rx2 + ry2 * stride];

    interpolate(interpolate(c4, c3, dx), interpolate(c2, c1, dx), dy)
}

/// Mean of the 2N×2N neighborhood of `(sx, _)` over the scanline window
/// `[miny, maxy)`, stepping by `(n / 2) + 1`.
pub(crate) fn interp_down_scaler(
    img: &[u32],
    stride: usize,
    w: u32,
    _h: u32,
    sx: f32,
    _sy: f32,
    miny: i32,
    maxy: i32,
    n: i32,
) -> u32 {
    let minx = (sx as i32 - n).max(0);
    let maxx = (sx as i32 + n).min(w as i32);
    let inc = (n / 2) + 1;

    let mut c = [0_u64; 4];
    let mut count = 0_u64;

    let mut y = miny;
    while y < maxy {
        let mut x = minx;
        while x < maxx {
            let p = img[y as usize * stride + x as usize];
            c[0] += u64::from(p >> 24);
            c[1] += u64::from((p >> 16) & 0xff);
            c[2] += u64::from((p >> 8) & 0xff);
            c[3] += u64::from(p & 0xff);
            count += 1;
            x += inc;
        }
        y += inc;
    }

    if count == 0 {
        return 0;
    }
    for ch in &mut c {
        *ch /= count;
    }
    ((c[0] as u32) << 24) | ((c[1] as u32) << 16) | ((c[2] as u32) << 8) | c[3] as u32
}
