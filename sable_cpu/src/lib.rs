// Copyright 2026 the Sable Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A software raster compositor.
//!
//! `sable_cpu` turns prepared geometry (coverage spans, fast-track
//! rectangles, images with transforms, encoded gradients) into final pixels:
//! anti-aliased compositing, masking and matting, blend modes, and
//! full-target effects, all on the CPU.
//!
//! The entry points live in [`raster`]: `raster_shape`, `raster_stroke`,
//! their gradient counterparts, the four image blit variants, `raster_clear`
//! and the surface utilities. Draws composite against the state carried by
//! the [`Surface`]: an optional blender switches the blending kernel paths
//! in, an open composite scope (see [`Surface::begin_composite`]) routes
//! draws through the masking or matting kernels.
//!
//! ```
//! use sable_cpu::{raster, Shape, Surface};
//! use sable_cpu::{ColorSpace, RenderColor, RenderRegion};
//!
//! let mut surface = Surface::new(16, 16, ColorSpace::Abgr8888).unwrap();
//! let rect = Shape::rect();
//! let bbox = RenderRegion::new(4, 4, 12, 12);
//! assert!(raster::raster_shape(&mut surface, &rect, bbox, RenderColor::new(255, 0, 0, 255)));
//! assert_eq!(surface.data32().unwrap()[4 * 16 + 4], 0xff00_00ff);
//! ```
//!
//! # Features
//!
//! - `png` (enabled by default): PNG interchange for
//!   [`Pixmap`][sable_common::pixmap::Pixmap]s.
//! - `multithreading`: parallelize the row- and block-parallel loops with
//!   rayon.

// These lints shouldn't apply to tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![warn(clippy::print_stdout, clippy::print_stderr)]
#![forbid(unsafe_code)]
#![expect(
    clippy::cast_possible_truncation,
    reason = "pixel math deliberately quantizes wider intermediates back to u8"
)]

pub mod effects;
pub mod raster;
mod shape;
mod surface;

pub use shape::Shape;
pub use surface::{Compositor, Surface, SurfaceBuf};

pub use sable_common::blend;
pub use sable_common::filter;
pub use sable_common::gradient::EncodedFill;
pub use sable_common::mask::{CompositeMethod, MaskMethod, MatteMethod};
pub use sable_common::pixel::{rgb_to_hsl, ColorSpace, RenderColor};
pub use sable_common::pixmap::{Image, Pixmap};
pub use sable_common::region::RenderRegion;
pub use sable_common::rle::{Rle, Span};
pub use sable_common::{color, kurbo, peniko};
