// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Orthographic view projections.

use nalgebra::{Point3, Vector3};

/// Standard orthographic views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Looking straight down the Z axis, X right and Y up
    Top,
    /// Looking from (+X, -Y, +Z) towards the origin, Z up
    Iso,
}

impl View {
    /// Unit vector from the scene towards the viewer
    pub fn eye_direction(self) -> Vector3<f64> {
        match self {
            View::Top => Vector3::z(),
            View::Iso => Vector3::new(1.0, -1.0, 1.0).normalize(),
        }
    }

    /// Screen axes (right, up) in world space
    fn screen_axes(self) -> (Vector3<f64>, Vector3<f64>) {
        match self {
            View::Top => (Vector3::x(), Vector3::y()),
            View::Iso => {
                let forward = -self.eye_direction();
                let right = forward.cross(&Vector3::z()).normalize();
                let up = right.cross(&forward);
                (right, up)
            }
        }
    }
}

/// Projected vertex: pixel coordinates plus depth (larger is closer)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
    pub depth: f32,
}

/// Maps world points into a `width` x `height` pixel frame.
#[derive(Debug, Clone)]
pub struct Camera {
    right: Vector3<f64>,
    up: Vector3<f64>,
    eye: Vector3<f64>,
    scale: f64,
    min_u: f64,
    min_v: f64,
    offset_x: f64,
    offset_y: f64,
    height: f64,
}

/// Fraction of the frame left empty on each side
const PADDING: f64 = 0.04;

impl Camera {
    /// Camera that fits all `points` into the frame (the "fit all" of a viewer)
    pub fn fit<'a>(view: View, points: impl IntoIterator<Item = &'a Point3<f64>>, width: u32, height: u32) -> Self {
        let (right, up) = view.screen_axes();
        let eye = view.eye_direction();

        let (mut min_u, mut max_u) = (f64::MAX, f64::MIN);
        let (mut min_v, mut max_v) = (f64::MAX, f64::MIN);
        for p in points {
            let u = p.coords.dot(&right);
            let v = p.coords.dot(&up);
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }
        if min_u > max_u {
            (min_u, max_u, min_v, max_v) = (0.0, 1.0, 0.0, 1.0);
        }

        let (w, h) = (width as f64, height as f64);
        let avail_w = w * (1.0 - 2.0 * PADDING);
        let avail_h = h * (1.0 - 2.0 * PADDING);
        let data_w = (max_u - min_u).max(1e-3);
        let data_h = (max_v - min_v).max(1e-3);
        let scale = (avail_w / data_w).min(avail_h / data_h);

        Self {
            right,
            up,
            eye,
            scale,
            min_u,
            min_v,
            offset_x: (w - data_w * scale) / 2.0,
            offset_y: (h - data_h * scale) / 2.0,
            height: h,
        }
    }

    pub fn project(&self, p: &Point3<f64>) -> ScreenPoint {
        let u = p.coords.dot(&self.right);
        let v = p.coords.dot(&self.up);
        let x = (u - self.min_u) * self.scale + self.offset_x;
        // Image rows grow downwards
        let y = self.height - ((v - self.min_v) * self.scale + self.offset_y);
        ScreenPoint {
            x: x as f32,
            y: y as f32,
            depth: p.coords.dot(&self.eye) as f32,
        }
    }

    pub fn eye_direction(&self) -> Vector3<f64> {
        self.eye
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_top_view_fits_square() {
        let points = [Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 10.0, 3.0)];
        let camera = Camera::fit(View::Top, &points, 100, 100);

        let lo = camera.project(&points[0]);
        let hi = camera.project(&points[1]);
        assert_relative_eq!(lo.x, 4.0, epsilon = 1e-4);
        assert_relative_eq!(lo.y, 96.0, epsilon = 1e-4);
        assert_relative_eq!(hi.x, 96.0, epsilon = 1e-4);
        assert_relative_eq!(hi.y, 4.0, epsilon = 1e-4);
        assert!(hi.depth > lo.depth);
    }

    #[test]
    fn test_iso_axes() {
        let (right, up) = View::Iso.screen_axes();
        assert_relative_eq!(right.dot(&up), 0.0, epsilon = 1e-12);
        assert_relative_eq!(right.z, 0.0, epsilon = 1e-12);
        assert!(up.z > 0.0);
        // Nearer corner of the scene is the (+X, -Y, +Z) one
        let eye = View::Iso.eye_direction();
        assert!(Point3::new(1.0, -1.0, 1.0).coords.dot(&eye) > Point3::new(-1.0, 1.0, -1.0).coords.dot(&eye));
    }

    #[test]
    fn test_empty_scene_camera_is_finite() {
        let camera = Camera::fit(View::Iso, std::iter::empty(), 64, 32);
        let p = camera.project(&Point3::origin());
        assert!(p.x.is_finite() && p.y.is_finite());
    }
}
