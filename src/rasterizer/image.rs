//! Render targets: RGBA8 color image, depth buffer and the framebuffer pairing them

use std::path::Path;

use glam::DVec4;
use thiserror::Error;

use super::types::Color;

/// Failure writing an image to disk
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("image is empty ({width}x{height})")]
    Empty { width: usize, height: usize },
    #[error("pixel buffer does not match {width}x{height}")]
    BufferSize { width: usize, height: usize },
    #[error("encode error: {0}")]
    Encode(#[from] ::image::ImageError),
}

/// Buffer of `len` copies of `value`, or None when it can't be allocated.
/// Sizes past `isize::MAX` bytes are refused before asking the allocator.
fn try_buffer<T: Clone>(len: usize, value: T) -> Option<Vec<T>> {
    let bytes = len.checked_mul(std::mem::size_of::<T>())?;
    if bytes > isize::MAX as usize {
        return None;
    }

    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len).ok()?;
    buffer.resize(len, value);
    Some(buffer)
}

/// Color buffer, RGBA8, row-major, top row first
#[derive(Debug, Clone)]
pub struct Image {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Image {
    /// Opaque black image. None when the buffer can't be allocated.
    pub fn new(width: usize, height: usize) -> Option<Self> {
        let len = width.checked_mul(height)?.checked_mul(4)?;
        let mut pixels = try_buffer(len, 0u8)?;
        for pixel in pixels.chunks_exact_mut(4) {
            pixel[3] = 255;
        }
        Some(Self { width, height, pixels })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self, color: DVec4) {
        let bytes = Color::from_rgba_f64(color).to_bytes();
        for pixel in self.pixels.chunks_exact_mut(4) {
            pixel.copy_from_slice(&bytes);
        }
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: DVec4) {
        if x < self.width && y < self.height {
            let idx = (y * self.width + x) * 4;
            self.pixels[idx..idx + 4].copy_from_slice(&Color::from_rgba_f64(color).to_bytes());
        }
    }

    pub fn get_color(&self, x: usize, y: usize) -> Option<Color> {
        if x < self.width && y < self.height {
            let idx = (y * self.width + x) * 4;
            let p = &self.pixels[idx..idx + 4];
            Some(Color::from_bytes([p[0], p[1], p[2], p[3]]))
        } else {
            None
        }
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> Option<DVec4> {
        self.get_color(x, y).map(Color::to_rgba_f64)
    }

    /// Packed RGBA8 bytes, 4 per pixel
    pub fn get_image_data(&self) -> &[u8] {
        &self.pixels
    }

    /// Write the image as a PNG file
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), SnapshotError> {
        if self.width == 0 || self.height == 0 {
            return Err(SnapshotError::Empty { width: self.width, height: self.height });
        }

        let buffer = ::image::RgbaImage::from_raw(self.width as u32, self.height as u32, self.pixels.clone())
            .ok_or(SnapshotError::BufferSize { width: self.width, height: self.height })?;
        buffer.save_with_format(path.as_ref(), ::image::ImageFormat::Png)?;

        log::info!("Saved {}x{} snapshot to {}", self.width, self.height, path.as_ref().display());
        Ok(())
    }
}

/// Per-pixel depth, same layout as the image
#[derive(Debug, Clone)]
pub struct DepthBuffer {
    width: usize,
    height: usize,
    depth: Vec<f64>,
}

impl DepthBuffer {
    /// Depth every pixel holds after a clear unless told otherwise
    pub const FAR: f64 = 1.0;

    pub fn new(width: usize, height: usize) -> Option<Self> {
        Some(Self {
            width,
            height,
            depth: try_buffer(width.checked_mul(height)?, Self::FAR)?,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self, depth: f64) {
        self.depth.fill(depth);
    }

    pub fn get_depth(&self, x: usize, y: usize) -> Option<f64> {
        if x < self.width && y < self.height {
            Some(self.depth[y * self.width + x])
        } else {
            None
        }
    }

    pub fn set_depth(&mut self, x: usize, y: usize, depth: f64) {
        if x < self.width && y < self.height {
            self.depth[y * self.width + x] = depth;
        }
    }
}

/// The render target of one frame: color, depth and a write counter
#[derive(Debug, Clone)]
pub struct Framebuffer {
    pub image: Image,
    pub depth: DepthBuffer,
    pixels_written: usize,
}

impl Framebuffer {
    /// None when either buffer can't be allocated
    pub fn new(width: usize, height: usize) -> Option<Self> {
        Some(Self {
            image: Image::new(width, height)?,
            depth: DepthBuffer::new(width, height)?,
            pixels_written: 0,
        })
    }

    pub fn width(&self) -> usize {
        self.image.width()
    }

    pub fn height(&self) -> usize {
        self.image.height()
    }

    pub fn clear(&mut self, color: DVec4, depth: f64) {
        self.image.clear(color);
        self.depth.clear(depth);
        self.pixels_written = 0;
    }

    /// Pixels written since the last clear
    pub fn pixels_written(&self) -> usize {
        self.pixels_written
    }

    /// Convert a viewport pixel (y up) into image coordinates (y down).
    /// Non-finite and out of range coordinates yield None.
    pub fn flip_pixel(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        if !(x.is_finite() && y.is_finite()) {
            return None;
        }

        let (x, y) = (x.floor() as i64, y.floor() as i64);
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return None;
        }

        Some((x as usize, self.height() - 1 - y as usize))
    }

    /// Unconditional color write in image coordinates
    pub fn write_color(&mut self, x: usize, y: usize, color: DVec4) -> bool {
        if !color.is_finite() || x >= self.width() || y >= self.height() {
            return false;
        }
        self.image.set_pixel(x, y, color);
        self.pixels_written += 1;
        true
    }

    /// Less-than depth test, then color and depth write in image coordinates
    pub fn write_depth_tested(&mut self, x: usize, y: usize, z: f64, color: DVec4) -> bool {
        if !color.is_finite() {
            return false;
        }
        match self.depth.get_depth(x, y) {
            Some(stored) if z < stored => {
                self.depth.set_depth(x, y, z);
                self.image.set_pixel(x, y, color);
                self.pixels_written += 1;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_and_readback() {
        let mut image = Image::new(3, 2).expect("image");
        image.clear(DVec4::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(image.get_image_data().len(), 3 * 2 * 4);
        assert_eq!(image.get_color(2, 1), Some(Color::BLUE));
        assert_eq!(image.get_color(3, 0), None);

        image.set_pixel(1, 0, DVec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(&image.get_image_data()[4..8], &[255, 0, 0, 255]);

        // Out of range writes are dropped
        image.set_pixel(5, 5, DVec4::ONE);
        assert_eq!(image.get_image_data().len(), 24);
    }

    #[test]
    fn test_depth_buffer_clear() {
        let mut depth = DepthBuffer::new(4, 4).expect("depth");
        assert_eq!(depth.get_depth(3, 3), Some(DepthBuffer::FAR));
        depth.set_depth(1, 2, 0.25);
        assert_eq!(depth.get_depth(1, 2), Some(0.25));
        depth.clear(0.5);
        assert_eq!(depth.get_depth(1, 2), Some(0.5));
        assert_eq!(depth.get_depth(4, 0), None);
    }

    #[test]
    fn test_flip_pixel_corners() {
        let fb = Framebuffer::new(8, 6).expect("framebuffer");
        assert_eq!(fb.flip_pixel(0.0, 0.0), Some((0, 5)));
        assert_eq!(fb.flip_pixel(7.0, 5.0), Some((7, 0)));
        assert_eq!(fb.flip_pixel(8.0, 0.0), None);
        assert_eq!(fb.flip_pixel(-1.0, 0.0), None);
        assert_eq!(fb.flip_pixel(f64::NAN, 1.0), None);

        // Just left of or below the image is outside, not pixel 0
        assert_eq!(fb.flip_pixel(-0.5, 1.0), None);
        assert_eq!(fb.flip_pixel(1.0, -0.25), None);
        assert_eq!(fb.flip_pixel(7.9, 5.9), Some((7, 0)));
    }

    #[test]
    fn test_depth_tested_write_keeps_nearest() {
        let mut fb = Framebuffer::new(2, 2).expect("framebuffer");
        fb.clear(DVec4::new(0.0, 0.0, 0.0, 1.0), 1.0);

        assert!(fb.write_depth_tested(0, 0, 0.6, DVec4::new(0.0, 0.0, 1.0, 1.0)));
        assert!(fb.write_depth_tested(0, 0, 0.3, DVec4::new(0.0, 1.0, 0.0, 1.0)));
        assert!(!fb.write_depth_tested(0, 0, 0.6, DVec4::new(0.0, 0.0, 1.0, 1.0)));
        assert!(!fb.write_depth_tested(0, 0, f64::NAN, DVec4::ONE));

        assert_eq!(fb.image.get_color(0, 0), Some(Color::GREEN));
        assert_eq!(fb.depth.get_depth(0, 0), Some(0.3));
        assert_eq!(fb.pixels_written(), 2);

        fb.clear(DVec4::ZERO, 1.0);
        assert_eq!(fb.pixels_written(), 0);
    }

    #[test]
    fn test_oversized_buffers_refused() {
        assert!(Image::new(1 << 32, 1 << 29).is_none());
        assert!(DepthBuffer::new(1 << 32, 1 << 29).is_none());
        assert!(Framebuffer::new(usize::MAX, 2).is_none());
        assert!(Framebuffer::new(0, 0).is_some());
    }

    #[test]
    fn test_save_png_rejects_empty_image() {
        let image = Image::new(0, 4).expect("image");
        assert!(matches!(image.save_png("unused.png"), Err(SnapshotError::Empty { .. })));
    }
}
