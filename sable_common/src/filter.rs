// Copyright 2026 the Sable Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parameters and kernel planning for the full-target effect passes.

use crate::pixel::RenderColor;

/// Which separable passes a blur applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlurDirection {
    /// Horizontal, then vertical.
    #[default]
    Both,
    /// Horizontal only.
    Horizontal,
    /// Vertical only.
    Vertical,
}

/// A gaussian blur over an intermediate target.
#[derive(Debug, Clone)]
pub struct GaussianBlur {
    /// The standard deviation, in pixels.
    pub sigma: f32,
    /// Which passes to run.
    pub direction: BlurDirection,
    /// Pre-computed kernel weights for the separable convolution.
    pub kernel: Vec<f32>,
}

impl GaussianBlur {
    /// Create a blur with the kernel planned for `sigma`.
    pub fn new(sigma: f32, direction: BlurDirection) -> Self {
        Self {
            sigma,
            direction,
            kernel: compute_gaussian_kernel(sigma),
        }
    }

    /// The kernel radius; the kernel has `2 * radius + 1` taps.
    pub fn radius(&self) -> usize {
        self.kernel.len() / 2
    }
}

/// A drop shadow: a blurred, offset silhouette composited under the target.
#[derive(Debug, Clone)]
pub struct DropShadow {
    /// Horizontal shadow offset in pixels.
    pub dx: f32,
    /// Vertical shadow offset in pixels.
    pub dy: f32,
    /// Blur standard deviation; zero skips the blur passes.
    pub sigma: f32,
    /// The shadow color.
    pub color: RenderColor,
    /// Pre-computed kernel weights, empty when `sigma` is zero.
    pub kernel: Vec<f32>,
}

impl DropShadow {
    /// Create a drop shadow with its blur kernel planned.
    pub fn new(dx: f32, dy: f32, sigma: f32, color: RenderColor) -> Self {
        let kernel = if sigma > 0.0 {
            compute_gaussian_kernel(sigma)
        } else {
            Vec::new()
        };
        Self {
            dx,
            dy,
            sigma,
            color,
            kernel,
        }
    }
}

/// Replace the target's color with one color, preserving coverage.
#[derive(Debug, Clone, Copy)]
pub struct FillEffect {
    /// The replacement color; its alpha scales the existing coverage.
    pub color: RenderColor,
}

/// Map the target's luma linearly between two colors.
#[derive(Debug, Clone, Copy)]
pub struct Tint {
    /// The color luma 0 maps to.
    pub black: RenderColor,
    /// The color luma 255 maps to.
    pub white: RenderColor,
    /// How strongly the mapping replaces the original, 0..=255.
    pub intensity: u8,
}

/// Map the target's luma piecewise through three colors.
#[derive(Debug, Clone, Copy)]
pub struct Tritone {
    /// The color for luma 0.
    pub shadow: RenderColor,
    /// The color for luma 128.
    pub midtone: RenderColor,
    /// The color for luma 255.
    pub highlight: RenderColor,
}

/// Compute 1D gaussian kernel weights for separable convolution.
///
/// The radius is `ceil(3 * sigma)`, capturing 99.7% of the distribution;
/// weights are normalized to sum to 1 so a pass never changes overall
/// brightness. A non-positive `sigma` yields the identity kernel.
pub fn compute_gaussian_kernel(sigma: f32) -> Vec<f32> {
    if sigma <= 0.0 {
        return vec![1.0];
    }

    let radius = (3.0 * sigma).ceil() as usize;
    let size = 1 + radius * 2;

    let mut kernel = vec![0.0; size];
    let denom = 2.0 * sigma * sigma;
    let mut sum = 0.0;
    for (i, weight) in kernel.iter_mut().enumerate() {
        let x = i as f32 - radius as f32;
        *weight = (-x * x / denom).exp();
        sum += *weight;
    }

    let scale = 1.0 / sum;
    for weight in &mut kernel {
        *weight *= scale;
    }

    kernel
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_small_sigma() {
        let kernel = compute_gaussian_kernel(1.0);
        // For sigma = 1.0, radius = 3, size = 7.
        assert_eq!(kernel.len(), 7);

        // The kernel is symmetric.
        for i in 0..kernel.len() / 2 {
            assert!((kernel[i] - kernel[kernel.len() - 1 - i]).abs() < 1e-6);
        }

        // And normalized.
        let sum: f32 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);

        // The center is the largest weight.
        let center = kernel.len() / 2;
        for (i, w) in kernel.iter().enumerate() {
            if i != center {
                assert!(kernel[center] >= *w);
            }
        }
    }

    #[test]
    fn kernel_very_small_sigma() {
        let kernel = compute_gaussian_kernel(0.1);
        // radius = ceil(0.3) = 1, size = 3.
        assert_eq!(kernel.len(), 3);
        let sum: f32 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(kernel[1] > 0.9);
    }

    #[test]
    fn kernel_fractional_sigma() {
        let kernel = compute_gaussian_kernel(0.5);
        // radius = ceil(1.5) = 2, size = 5.
        assert_eq!(kernel.len(), 5);
        let sum: f32 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn kernel_invalid_sigma_is_identity() {
        assert_eq!(compute_gaussian_kernel(0.0), vec![1.0]);
        assert_eq!(compute_gaussian_kernel(-2.0), vec![1.0]);
    }

    #[test]
    fn drop_shadow_zero_sigma_has_no_kernel() {
        let shadow = DropShadow::new(3.0, 4.0, 0.0, RenderColor::new(0, 0, 0, 160));
        assert!(shadow.kernel.is_empty());
        let blurred = DropShadow::new(3.0, 4.0, 2.0, RenderColor::new(0, 0, 0, 160));
        assert_eq!(blurred.kernel.len(), 13);
    }
}
