// Copyright 2026 the Sable Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Non-normal blend modes.
//!
//! A [`Blender`] combines a source and destination pixel channel-wise and
//! returns an *opaque* result; the kernels interpolate that result against the
//! untouched destination by the source alpha, so the blend formulas themselves
//! never have to reason about transparency. Formulas are the separable modes
//! of the CSS compositing spec.

use crate::pixel::mul_255;

/// A blend function `(src, dst) -> pixel` installed on a surface.
///
/// Both inputs share the surface's channel ordering; the result carries full
/// alpha.
pub type Blender = fn(u32, u32) -> u32;

#[inline(always)]
fn join3(c1: u8, c2: u8, c3: u8) -> u32 {
    0xff00_0000 | (u32::from(c1) << 16) | (u32::from(c2) << 8) | u32::from(c3)
}

#[inline(always)]
fn split3(c: u32) -> (u8, u8, u8) {
    (((c >> 16) & 0xff) as u8, ((c >> 8) & 0xff) as u8, (c & 0xff) as u8)
}

macro_rules! channel_blender {
    ($name:ident, $doc:literal, $f:expr) => {
        #[doc = $doc]
        pub fn $name(s: u32, d: u32) -> u32 {
            let f = $f;
            let (s1, s2, s3) = split3(s);
            let (d1, d2, d3) = split3(d);
            join3(f(s1, d1), f(s2, d2), f(s3, d3))
        }
    };
}

channel_blender!(multiply, "Darkens: `s * d`.", |s, d| mul_255(s, d));

channel_blender!(screen, "Lightens: `s + d - s * d`.", |s: u8, d: u8| {
    (u16::from(s) + u16::from(d) - u16::from(mul_255(s, d))) as u8
});

channel_blender!(
    overlay,
    "Multiplies or screens depending on the destination.",
    |s: u8, d: u8| {
        if d < 128 {
            mul_255(s, 2 * d)
        } else {
            255 - mul_255(255 - s, 2 * (255 - d))
        }
    }
);

channel_blender!(darken, "Selects the darker channel.", |s: u8, d: u8| s.min(d));

channel_blender!(lighten, "Selects the lighter channel.", |s: u8, d: u8| s.max(d));

channel_blender!(difference, "Absolute channel difference.", |s: u8, d: u8| {
    s.abs_diff(d)
});

channel_blender!(
    exclusion,
    "Like difference with lower contrast: `s + d - 2 * s * d`.",
    |s: u8, d: u8| {
        let sd2 = 2 * u16::from(mul_255(s, d));
        (u16::from(s) + u16::from(d)).saturating_sub(sd2).min(255) as u8
    }
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiply_with_white_is_identity() {
        let d = join3(10, 200, 33);
        assert_eq!(multiply(0xffff_ffff, d), d);
        assert_eq!(multiply(0xff00_0000, d), 0xff00_0000);
    }

    #[test]
    fn screen_with_black_is_identity() {
        let d = join3(10, 200, 33);
        assert_eq!(screen(0xff00_0000, d), d);
        assert_eq!(screen(0xffff_ffff, d), 0xffff_ffff);
    }

    #[test]
    fn difference_is_symmetric() {
        let a = join3(40, 90, 250);
        let b = join3(200, 15, 3);
        assert_eq!(difference(a, b), difference(b, a));
        assert_eq!(difference(a, a), 0xff00_0000);
    }

    #[test]
    fn darken_lighten_partition() {
        let a = join3(40, 90, 250);
        let b = join3(200, 15, 3);
        assert_eq!(darken(a, b), join3(40, 15, 3));
        assert_eq!(lighten(a, b), join3(200, 90, 250));
    }
}
