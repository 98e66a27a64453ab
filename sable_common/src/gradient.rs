// Copyright 2026 the Sable Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Encoding [`peniko::Gradient`]s for scanline evaluation.
//!
//! A gradient is validated and lowered into a sequence of [`GradientRange`]s
//! over the parameter domain `[0, 1]`, each storing a per-channel bias and
//! scale so that sampling is `bias + t * scale` on premultiplied channels.
//! The `Reflect` extend mode is folded away up front by mirroring the stops
//! and doubling the geometry, leaving only pad/repeat at evaluation time.

use crate::pixel::{JoinFn, RenderColor};
use peniko::color::Srgb;
use peniko::kurbo::{Affine, Point, Vec2};
use peniko::{ColorStop, Extend, Gradient, GradientKind};
use smallvec::SmallVec;

const DEGENERATE_THRESHOLD: f64 = 1.0e-6;

/// An encoded range between two color stops.
///
/// Channel values are premultiplied `[r, g, b, a]` scaled to `0..=255`.
#[derive(Debug, Clone)]
pub struct GradientRange {
    /// The start of the range in parameter space.
    pub x0: f32,
    /// The end of the range in parameter space.
    pub x1: f32,
    /// Per-channel bias; `bias + x0 * scale` is the start color.
    pub bias: [f32; 4],
    /// Per-channel scale over the parameter domain.
    pub scale: [f32; 4],
}

impl GradientRange {
    fn flat(x0: f32, x1: f32, color: [f32; 4]) -> Self {
        Self {
            x0,
            x1,
            bias: color,
            scale: [0.0; 4],
        }
    }

    #[inline(always)]
    fn sample(&self, t: f32) -> [f32; 4] {
        [
            self.bias[0] + t * self.scale[0],
            self.bias[1] + t * self.scale[1],
            self.bias[2] + t * self.scale[2],
            self.bias[3] + t * self.scale[3],
        ]
    }
}

/// The geometric half of an encoded fill.
#[derive(Debug, Clone)]
pub enum FillKind {
    /// The gradient line has been mapped to `(0,0) -> (1,0)`; the parameter
    /// is the x coordinate in gradient space.
    Linear,
    /// Two-point conical evaluation in gradient space.
    Radial(RadialFill),
}

/// Precomputed two-point conical parameters.
#[derive(Debug, Clone)]
pub struct RadialFill {
    /// The start (focal) center.
    pub c0: Point,
    /// Vector from the start to the end center.
    pub dc: Vec2,
    /// The start radius.
    pub r0: f64,
    /// The radius delta.
    pub dr: f64,
    /// `dc . dc - dr^2`; the quadratic coefficient.
    pub a: f64,
}

impl RadialFill {
    /// Solve for the gradient parameter at `p`, or `None` where the cone is
    /// undefined.
    #[inline]
    fn position(&self, p: Point) -> Option<f32> {
        let fx = p.x - self.c0.x;
        let fy = p.y - self.c0.y;
        let b = fx * self.dc.x + fy * self.dc.y + self.r0 * self.dr;
        let c = fx * fx + fy * fy - self.r0 * self.r0;

        if self.a.abs() < DEGENERATE_THRESHOLD {
            if b.abs() < DEGENERATE_THRESHOLD {
                return None;
            }
            let t = c / (2.0 * b);
            return (self.r0 + t * self.dr >= 0.0).then_some(t as f32);
        }

        let disc = b * b - self.a * c;
        if disc < 0.0 {
            return None;
        }
        let sq = disc.sqrt();
        // Prefer the larger root; fall back to the other when it produces a
        // negative cone radius.
        for t in [(b + sq) / self.a, (b - sq) / self.a] {
            if self.r0 + t * self.dr >= 0.0 {
                return Some(t as f32);
            }
        }
        None
    }
}

/// A gradient lowered into evaluation form.
#[derive(Debug, Clone)]
pub struct EncodedFill {
    kind: FillKind,
    ranges: Vec<GradientRange>,
    /// Device pixel center -> gradient parameter space.
    transform: Affine,
    /// Parameter-space step for one step in device x.
    x_advance: Vec2,
    pad: bool,
    translucent: bool,
    solid: Option<RenderColor>,
}

impl EncodedFill {
    /// Encode a gradient drawn under `transform` (user to device space).
    ///
    /// Returns `None` for gradients this pipeline cannot evaluate: no stops,
    /// an un-invertible transform, or sweep gradients.
    pub fn from_gradient(gradient: &Gradient, transform: Affine) -> Option<Self> {
        if gradient.stops.is_empty() {
            return None;
        }
        if transform.determinant().abs() < DEGENERATE_THRESHOLD {
            return None;
        }

        let mut stops: SmallVec<[ColorStop; 8]> =
            SmallVec::from_slice(&gradient.stops.0);
        let reflect = gradient.extend == Extend::Reflect;
        if reflect {
            stops = apply_reflect(&stops);
        }

        let solid = fetch_solid_color(&gradient.stops.0);
        let translucent = gradient
            .stops
            .iter()
            .any(|s| s.color.components[3] < 1.0);

        let device_to_user = transform.inverse();

        let kind;
        let param_transform;
        match gradient.kind {
            GradientKind::Linear(peniko::LinearGradientPosition { start: p0, end: mut p1 }) => {
                if reflect {
                    p1 += p1 - p0;
                }
                if (p1 - p0).hypot2() < DEGENERATE_THRESHOLD {
                    // A zero-length line paints the last stop everywhere.
                    let last = gradient.stops.last().unwrap();
                    return Some(Self::solid_only(color_of(last)));
                }
                param_transform =
                    ts_from_line_to_line(p0, p1, Point::ZERO, Point::new(1.0, 0.0))
                        * device_to_user;
                kind = FillKind::Linear;
            }
            GradientKind::Radial(peniko::RadialGradientPosition {
                start_center: c0,
                start_radius,
                end_center: mut c1,
                end_radius,
            }) => {
                let r0 = f64::from(start_radius);
                let mut r1 = f64::from(end_radius);
                if reflect {
                    c1 += c1 - c0;
                    r1 += r1 - r0;
                }
                let dc = c1 - c0;
                let dr = r1 - r0;
                if dc.hypot2() < DEGENERATE_THRESHOLD && dr.abs() < DEGENERATE_THRESHOLD {
                    let last = gradient.stops.last().unwrap();
                    return Some(Self::solid_only(color_of(last)));
                }
                param_transform = device_to_user;
                kind = FillKind::Radial(RadialFill {
                    c0,
                    dc,
                    r0,
                    dr,
                    a: dc.hypot2() - dr * dr,
                });
            }
            GradientKind::Sweep(_) => return None,
        }

        let origin = param_transform * Point::ZERO;
        let x_advance = param_transform * Point::new(1.0, 0.0) - origin;

        Some(Self {
            kind,
            ranges: encode_stops(&stops),
            transform: param_transform,
            x_advance,
            pad: gradient.extend == Extend::Pad,
            translucent,
            solid,
        })
    }

    fn solid_only(color: RenderColor) -> Self {
        let premul = premul_components(color);
        Self {
            kind: FillKind::Linear,
            ranges: vec![GradientRange::flat(0.0, 1.0, premul)],
            transform: Affine::IDENTITY,
            x_advance: Vec2::ZERO,
            pad: true,
            translucent: color.a < 255,
            solid: Some(color),
        }
    }

    /// The single color of a degenerate gradient, if there is one.
    ///
    /// Callers reroute solid fills to the color kernels before dispatching
    /// any gradient kernel.
    pub fn fetch_solid(&self) -> Option<RenderColor> {
        self.solid
    }

    /// Whether any stop is translucent.
    pub fn translucent(&self) -> bool {
        self.translucent
    }

    /// Evaluate one scanline run starting at device pixel `(x, y)` into
    /// `out`, packing premultiplied channels with `join`.
    pub fn fetch(&self, x: i32, y: i32, out: &mut [u32], join: JoinFn) {
        let mut pos =
            self.transform * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
        let mut cursor = RangeCursor::new(&self.ranges);

        match &self.kind {
            FillKind::Linear => {
                for px in out.iter_mut() {
                    *px = cursor.pack(self.extend(pos.x as f32), join);
                    pos += self.x_advance;
                }
            }
            FillKind::Radial(radial) => {
                for px in out.iter_mut() {
                    *px = match radial.position(pos) {
                        Some(t) => cursor.pack(self.extend(t), join),
                        None => 0,
                    };
                    pos += self.x_advance;
                }
            }
        }
    }

    #[inline(always)]
    fn extend(&self, t: f32) -> f32 {
        if self.pad {
            t.clamp(0.0, 1.0)
        } else {
            t - t.floor()
        }
    }
}

/// A stateful lookup over gradient ranges; scanline parameters move slowly,
/// so the cursor usually stays put.
struct RangeCursor<'a> {
    ranges: &'a [GradientRange],
    idx: usize,
}

impl<'a> RangeCursor<'a> {
    fn new(ranges: &'a [GradientRange]) -> Self {
        Self { ranges, idx: 0 }
    }

    #[inline(always)]
    fn pack(&mut self, t: f32, join: JoinFn) -> u32 {
        while t > self.ranges[self.idx].x1 && self.idx + 1 < self.ranges.len() {
            self.idx += 1;
        }
        while t < self.ranges[self.idx].x0 && self.idx > 0 {
            self.idx -= 1;
        }
        let [r, g, b, a] = self.ranges[self.idx].sample(t);
        join(
            (r + 0.5) as u8,
            (g + 0.5) as u8,
            (b + 0.5) as u8,
            (a + 0.5) as u8,
        )
    }
}

fn color_of(stop: &ColorStop) -> RenderColor {
    let c = stop.color.components;
    RenderColor::new(
        (c[0] * 255.0 + 0.5) as u8,
        (c[1] * 255.0 + 0.5) as u8,
        (c[2] * 255.0 + 0.5) as u8,
        (c[3] * 255.0 + 0.5) as u8,
    )
}

fn premul_components(color: RenderColor) -> [f32; 4] {
    let a = f32::from(color.a) / 255.0;
    [
        f32::from(color.r) * a,
        f32::from(color.g) * a,
        f32::from(color.b) * a,
        f32::from(color.a),
    ]
}

fn premul_of(stop: &ColorStop) -> [f32; 4] {
    let premul = stop.color.to_alpha_color::<Srgb>().premultiply().components;
    [
        (premul[0] * 255.0).clamp(0.0, 255.0),
        (premul[1] * 255.0).clamp(0.0, 255.0),
        (premul[2] * 255.0).clamp(0.0, 255.0),
        (premul[3] * 255.0).clamp(0.0, 255.0),
    ]
}

/// The one color shared by every stop, if the gradient is degenerate.
fn fetch_solid_color(stops: &[ColorStop]) -> Option<RenderColor> {
    let first = stops.first()?;
    stops
        .iter()
        .all(|s| s.color.components == first.color.components)
        .then(|| color_of(first))
}

/// Mirror the stops into the second half of the domain so reflect behaves
/// like repeat over doubled geometry.
fn apply_reflect(stops: &[ColorStop]) -> SmallVec<[ColorStop; 8]> {
    let mut out = SmallVec::with_capacity(stops.len() * 2);
    for stop in stops {
        out.push(ColorStop {
            offset: stop.offset / 2.0,
            color: stop.color,
        });
    }
    for stop in stops.iter().rev() {
        out.push(ColorStop {
            offset: 1.0 - stop.offset / 2.0,
            color: stop.color,
        });
    }
    out
}

fn encode_stops(stops: &[ColorStop]) -> Vec<GradientRange> {
    let mut ranges = Vec::with_capacity(stops.len() + 1);

    let first = &stops[0];
    let last = &stops[stops.len() - 1];

    if first.offset > 0.0 {
        ranges.push(GradientRange::flat(0.0, first.offset, premul_of(first)));
    }

    for pair in stops.windows(2) {
        let (left, right) = (&pair[0], &pair[1]);
        let x0 = left.offset;
        let x1 = right.offset;
        let c0 = premul_of(left);
        let c1 = premul_of(right);

        let span = (x1 - x0).max(f32::EPSILON);
        let mut scale = [0.0; 4];
        let mut bias = [0.0; 4];
        for i in 0..4 {
            scale[i] = (c1[i] - c0[i]) / span;
            bias[i] = c0[i] - x0 * scale[i];
        }
        ranges.push(GradientRange { x0, x1, bias, scale });
    }

    if last.offset < 1.0 || ranges.is_empty() {
        ranges.push(GradientRange::flat(last.offset, 1.0, premul_of(last)));
    }

    ranges
}

fn ts_from_line_to_line(p0: Point, p1: Point, q0: Point, q1: Point) -> Affine {
    let d = p1 - p0;
    let e = q1 - q0;
    let denom = d.hypot2();
    let a = (e.x * d.x + e.y * d.y) / denom;
    let b = (e.y * d.x - e.x * d.y) / denom;
    Affine::translate(q0.to_vec2())
        * Affine::new([a, b, -b, a, 0.0, 0.0])
        * Affine::translate(-p0.to_vec2())
}
