// Copyright 2026 the Sable Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A shape in rendered form, as handed over by the scene layer.

use sable_common::gradient::EncodedFill;
use sable_common::rle::Rle;

/// A shape ready for rasterization.
///
/// The vector pre-processing (flattening, stroking, scan conversion) happens
/// upstream; by the time a shape reaches the raster kernels it is coverage
/// plus paint.
#[derive(Debug, Default)]
pub struct Shape {
    /// Anti-aliased fill coverage.
    pub rle: Option<Rle>,
    /// Anti-aliased stroke coverage.
    pub stroke_rle: Option<Rle>,
    /// The gradient fill, if the shape is gradient-filled.
    pub fill: Option<EncodedFill>,
    /// The gradient fill of the stroke, if any.
    pub stroke_fill: Option<EncodedFill>,
    /// The shape is an axis-aligned rectangle exactly coincident with its
    /// bbox; kernels skip the coverage walk entirely.
    pub fast_track: bool,
}

impl Shape {
    /// A fast-track rectangle shape.
    pub fn rect() -> Self {
        Self {
            fast_track: true,
            ..Self::default()
        }
    }

    /// A coverage-driven shape.
    pub fn from_rle(rle: Rle) -> Self {
        Self {
            rle: Some(rle),
            ..Self::default()
        }
    }
}
