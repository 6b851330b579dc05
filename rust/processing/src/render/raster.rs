// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Depth-buffered triangle rasterizer.

use super::camera::ScreenPoint;
use image::{Rgba, RgbaImage};

/// Colour and depth buffers for one frame
pub struct Raster {
    width: u32,
    height: u32,
    color: Vec<[f32; 3]>,
    depth: Vec<f32>,
}

/// How a triangle interacts with the depth buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthMode {
    /// Test and write depth, replace colour
    Opaque,
    /// Test depth only, blend colour
    Translucent,
}

/// Depth slack so coplanar outlines and faces win over the surfaces they lie on
const DEPTH_BIAS: f32 = 1e-4;

impl Raster {
    pub fn new(width: u32, height: u32, background: [f32; 3]) -> Self {
        let size = (width as usize) * (height as usize);
        Self {
            width,
            height,
            color: vec![background; size],
            depth: vec![f32::NEG_INFINITY; size],
        }
    }

    fn edge(a: &ScreenPoint, b: &ScreenPoint, px: f32, py: f32) -> f32 {
        (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
    }

    /// Fill a triangle, sampling at pixel centres
    pub fn fill_triangle(&mut self, tri: [ScreenPoint; 3], rgba: [f32; 4], mode: DepthMode) {
        let [a, b, c] = tri;
        let area = Self::edge(&a, &b, c.x, c.y);
        if area.abs() < f32::EPSILON {
            return;
        }

        let min_x = a.x.min(b.x).min(c.x).floor().max(0.0) as i64;
        let max_x = (a.x.max(b.x).max(c.x).ceil() as i64).min(self.width as i64 - 1);
        let min_y = a.y.min(b.y).min(c.y).floor().max(0.0) as i64;
        let max_y = (a.y.max(b.y).max(c.y).ceil() as i64).min(self.height as i64 - 1);

        let alpha = rgba[3].clamp(0.0, 1.0);
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
                let w0 = Self::edge(&b, &c, px, py) / area;
                let w1 = Self::edge(&c, &a, px, py) / area;
                let w2 = Self::edge(&a, &b, px, py) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let z = w0 * a.depth + w1 * b.depth + w2 * c.depth;
                let i = y as usize * self.width as usize + x as usize;
                if z + DEPTH_BIAS < self.depth[i] {
                    continue;
                }

                match mode {
                    DepthMode::Opaque => {
                        self.depth[i] = z;
                        self.color[i] = [rgba[0], rgba[1], rgba[2]];
                    }
                    DepthMode::Translucent => {
                        let dst = self.color[i];
                        self.color[i] = [
                            rgba[0] * alpha + dst[0] * (1.0 - alpha),
                            rgba[1] * alpha + dst[1] * (1.0 - alpha),
                            rgba[2] * alpha + dst[2] * (1.0 - alpha),
                        ];
                    }
                }
            }
        }
    }

    pub fn into_image(self) -> RgbaImage {
        let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let mut image = RgbaImage::new(self.width, self.height);
        for (pixel, c) in image.pixels_mut().zip(self.color) {
            *pixel = Rgba([to_byte(c[0]), to_byte(c[1]), to_byte(c[2]), 255]);
        }
        image
    }
}
