//! Pixel-write policies, applied once per covered pixel

use glam::DVec4;
use serde::{Deserialize, Serialize};

use super::image::Framebuffer;
use super::types::Vertex;

/// Checker cells per unit of color channel
const CHECKER_CELLS: f64 = 8.0;
const CHECKER_DARK: DVec4 = DVec4::new(0.1, 0.1, 0.1, 1.0);
const CHECKER_LIGHT: DVec4 = DVec4::new(0.9, 0.9, 0.9, 1.0);

/// How a rasterized vertex lands in the framebuffer.
///
/// The vertex's x/y are viewport pixels with y pointing up; every policy
/// flips y into image rows and drops pixels outside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelWrite {
    /// Write color and depth when z is nearer than the stored depth
    DepthTested,
    /// Always write color, depth untouched (debug overlays)
    Overwrite,
    /// Depth as gray, always written
    DepthGrayscale,
    /// Depth as gray behind the depth test
    DepthGrayscaleTested,
    /// Procedural checkerboard from the color channels, depth tested
    Checkerboard,
    None,
}

impl PixelWrite {
    pub const ALL: [PixelWrite; 6] = [
        PixelWrite::DepthTested,
        PixelWrite::Overwrite,
        PixelWrite::DepthGrayscale,
        PixelWrite::DepthGrayscaleTested,
        PixelWrite::Checkerboard,
        PixelWrite::None,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PixelWrite::DepthTested => "Color, depth tested",
            PixelWrite::Overwrite => "Color, overwrite",
            PixelWrite::DepthGrayscale => "Depth gray, overwrite",
            PixelWrite::DepthGrayscaleTested => "Depth gray, depth tested",
            PixelWrite::Checkerboard => "Checkerboard",
            PixelWrite::None => "None",
        }
    }

    /// Returns whether a pixel was written
    pub fn apply(self, vertex: &Vertex, fb: &mut Framebuffer) -> bool {
        if self == PixelWrite::None {
            return false;
        }
        let Some((x, y)) = fb.flip_pixel(vertex.pos.x, vertex.pos.y) else {
            return false;
        };
        let z = vertex.pos.z;

        match self {
            PixelWrite::DepthTested => fb.write_depth_tested(x, y, z, vertex.resolved_color()),
            PixelWrite::Overwrite => fb.write_color(x, y, vertex.resolved_color()),
            PixelWrite::DepthGrayscale => fb.write_color(x, y, depth_gray(z)),
            PixelWrite::DepthGrayscaleTested => fb.write_depth_tested(x, y, z, depth_gray(z)),
            PixelWrite::Checkerboard => fb.write_depth_tested(x, y, z, checker(vertex)),
            PixelWrite::None => false,
        }
    }
}

fn depth_gray(z: f64) -> DVec4 {
    let g = z.clamp(0.0, 1.0);
    DVec4::new(g, g, g, 1.0)
}

fn checker(vertex: &Vertex) -> DVec4 {
    let color = vertex.resolved_color();
    let u = (color.x * CHECKER_CELLS).floor() as i64;
    let v = (color.y * CHECKER_CELLS).floor() as i64;
    if (u + v).rem_euclid(2) == 0 {
        CHECKER_LIGHT
    } else {
        CHECKER_DARK
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::types::Color;

    fn pixel(x: f64, y: f64, z: f64, color: DVec4) -> Vertex {
        Vertex::new(DVec4::new(x, y, z, 1.0), color, Default::default())
    }

    fn cleared(width: usize, height: usize) -> Framebuffer {
        let mut fb = Framebuffer::new(width, height).expect("framebuffer");
        fb.clear(DVec4::new(0.0, 0.0, 0.0, 1.0), 1.0);
        fb
    }

    #[test]
    fn test_writes_flip_y() {
        let mut fb = cleared(4, 4);
        assert!(PixelWrite::Overwrite.apply(&pixel(1.0, 0.0, 0.5, DVec4::new(1.0, 0.0, 0.0, 1.0)), &mut fb));
        assert_eq!(fb.image.get_color(1, 3), Some(Color::RED));
        assert_eq!(fb.image.get_color(1, 0), Some(Color::BLACK));
    }

    #[test]
    fn test_out_of_bounds_dropped() {
        let mut fb = cleared(4, 4);
        for write in PixelWrite::ALL {
            assert!(!write.apply(&pixel(4.0, 0.0, 0.5, DVec4::ONE), &mut fb));
            assert!(!write.apply(&pixel(0.0, -1.0, 0.5, DVec4::ONE), &mut fb));
        }
        assert_eq!(fb.pixels_written(), 0);
    }

    #[test]
    fn test_depth_test_order_independent() {
        let near = pixel(2.0, 2.0, 0.25, DVec4::new(0.0, 1.0, 0.0, 1.0));
        let far = pixel(2.0, 2.0, 0.75, DVec4::new(0.0, 0.0, 1.0, 1.0));

        for order in [[near, far], [far, near]] {
            let mut fb = cleared(4, 4);
            for v in &order {
                PixelWrite::DepthTested.apply(v, &mut fb);
            }
            assert_eq!(fb.image.get_color(2, 1), Some(Color::GREEN));
            assert_eq!(fb.depth.get_depth(2, 1), Some(0.25));
        }
    }

    #[test]
    fn test_overwrite_ignores_depth() {
        let mut fb = cleared(2, 2);
        PixelWrite::DepthTested.apply(&pixel(0.0, 0.0, 0.1, DVec4::new(0.0, 1.0, 0.0, 1.0)), &mut fb);
        PixelWrite::Overwrite.apply(&pixel(0.0, 0.0, 0.9, DVec4::new(1.0, 0.0, 0.0, 1.0)), &mut fb);
        assert_eq!(fb.image.get_color(0, 1), Some(Color::RED));
        assert_eq!(fb.depth.get_depth(0, 1), Some(0.1));
    }

    #[test]
    fn test_depth_grayscale() {
        let mut fb = cleared(2, 2);
        PixelWrite::DepthGrayscaleTested.apply(&pixel(1.0, 1.0, 0.5, DVec4::ONE), &mut fb);
        assert_eq!(fb.image.get_color(1, 0), Some(Color::new(127, 127, 127)));
        assert_eq!(fb.depth.get_depth(1, 0), Some(0.5));

        // Farther than stored depth, the tested variant refuses
        assert!(!PixelWrite::DepthGrayscaleTested.apply(&pixel(1.0, 1.0, 0.8, DVec4::ONE), &mut fb));
        assert!(PixelWrite::DepthGrayscale.apply(&pixel(1.0, 1.0, 0.8, DVec4::ONE), &mut fb));
        assert_eq!(fb.image.get_color(1, 0), Some(Color::new(204, 204, 204)));
    }

    #[test]
    fn test_checkerboard_alternates() {
        let mut fb = cleared(2, 1);
        PixelWrite::Checkerboard.apply(&pixel(0.0, 0.0, 0.5, DVec4::new(0.05, 0.05, 0.0, 1.0)), &mut fb);
        PixelWrite::Checkerboard.apply(&pixel(1.0, 0.0, 0.5, DVec4::new(0.2, 0.05, 0.0, 1.0)), &mut fb);
        assert_ne!(fb.image.get_color(0, 0), fb.image.get_color(1, 0));
    }

    #[test]
    fn test_none_writes_nothing() {
        let mut fb = cleared(2, 2);
        assert!(!PixelWrite::None.apply(&pixel(0.0, 0.0, 0.5, DVec4::ONE), &mut fb));
        assert_eq!(fb.pixels_written(), 0);
    }
}
