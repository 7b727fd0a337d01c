//! Core types for the pipeline: colors, vertices, topology and solids

use std::ops::{Add, Mul, Sub};

use glam::{DMat4, DVec2, DVec4};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Quantize a floating point RGBA color (0.0-1.0 per channel).
    /// Out of range channels saturate, NaN becomes 0.
    pub fn from_rgba_f64(color: DVec4) -> Self {
        fn channel(c: f64) -> u8 {
            (c.clamp(0.0, 1.0) * 255.999) as u8
        }
        Self {
            r: channel(color.x),
            g: channel(color.y),
            b: channel(color.z),
            a: channel(color.w),
        }
    }

    pub fn to_rgba_f64(self) -> DVec4 {
        DVec4::new(
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
            self.a as f64 / 255.0,
        )
    }

    /// Convert to [u8; 4] for the image buffer
    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self::with_alpha(bytes[0], bytes[1], bytes[2], bytes[3])
    }
}

fn default_one() -> f64 {
    1.0
}

/// A pipeline vertex.
///
/// `one` starts at 1.0 and is divided by `w` together with every attribute
/// when the whole vertex is dehomogenized. Multiplying an attribute by
/// `1 / one` after interpolation yields its perspective-correct value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub pos: DVec4,
    #[serde(default = "Vertex::default_color")]
    pub color: DVec4,
    #[serde(default)]
    pub uv: DVec2,
    #[serde(default = "default_one")]
    pub one: f64,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            pos: DVec4::W,
            color: DVec4::ONE,
            uv: DVec2::ZERO,
            one: 1.0,
        }
    }
}

impl Vertex {
    fn default_color() -> DVec4 {
        DVec4::ONE
    }

    pub fn new(pos: DVec4, color: DVec4, uv: DVec2) -> Self {
        Self { pos, color, uv, one: 1.0 }
    }

    /// White vertex at a cartesian position (w = 1)
    pub fn from_pos(x: f64, y: f64, z: f64) -> Self {
        Self {
            pos: DVec4::new(x, y, z, 1.0),
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: DVec4) -> Self {
        self.color = color;
        self
    }

    pub fn with_uv(mut self, uv: DVec2) -> Self {
        self.uv = uv;
        self
    }

    /// Blend every field linearly. `t` saturates to the endpoints outside
    /// of [0, 1]; a NaN `t` propagates into the result.
    pub fn interpolate(t: f64, a: &Vertex, b: &Vertex) -> Vertex {
        if t <= 0.0 {
            *a
        } else if t >= 1.0 {
            *b
        } else {
            (*a * (1.0 - t)) + (*b * t)
        }
    }

    /// Perspective divide of the position only
    pub fn dehomogenize_position(&mut self) {
        let w = self.pos.w;
        self.pos = DVec4::new(self.pos.x / w, self.pos.y / w, self.pos.z / w, 1.0);
    }

    /// Perspective divide of the position and every attribute, `one` included
    pub fn dehomogenize_all(&mut self) {
        *self = *self * (1.0 / self.pos.w);
    }

    pub fn resolved_color(&self) -> DVec4 {
        self.color * (1.0 / self.one)
    }

    pub fn resolved_uv(&self) -> DVec2 {
        self.uv * (1.0 / self.one)
    }

    pub fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.color.is_finite() && self.uv.is_finite() && self.one.is_finite()
    }
}

impl Add for Vertex {
    type Output = Vertex;
    fn add(self, other: Vertex) -> Vertex {
        Vertex {
            pos: self.pos + other.pos,
            color: self.color + other.color,
            uv: self.uv + other.uv,
            one: self.one + other.one,
        }
    }
}

impl Add<f64> for Vertex {
    type Output = Vertex;
    fn add(self, f: f64) -> Vertex {
        Vertex {
            pos: self.pos + f,
            color: self.color + f,
            uv: self.uv + f,
            one: self.one + f,
        }
    }
}

impl Sub for Vertex {
    type Output = Vertex;
    fn sub(self, other: Vertex) -> Vertex {
        Vertex {
            pos: self.pos - other.pos,
            color: self.color - other.color,
            uv: self.uv - other.uv,
            one: self.one - other.one,
        }
    }
}

impl Sub<f64> for Vertex {
    type Output = Vertex;
    fn sub(self, f: f64) -> Vertex {
        Vertex {
            pos: self.pos - f,
            color: self.color - f,
            uv: self.uv - f,
            one: self.one - f,
        }
    }
}

impl Mul for Vertex {
    type Output = Vertex;
    fn mul(self, other: Vertex) -> Vertex {
        Vertex {
            pos: self.pos * other.pos,
            color: self.color * other.color,
            uv: self.uv * other.uv,
            one: self.one * other.one,
        }
    }
}

impl Mul<f64> for Vertex {
    type Output = Vertex;
    fn mul(self, f: f64) -> Vertex {
        Vertex {
            pos: self.pos * f,
            color: self.color * f,
            uv: self.uv * f,
            one: self.one * f,
        }
    }
}

/// Primitive assembly mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topology {
    Point,
    Line,
    Triangle,
}

impl Topology {
    pub const ALL: [Topology; 3] = [Topology::Point, Topology::Line, Topology::Triangle];

    pub fn vertices_per(self) -> usize {
        match self {
            Topology::Point => 1,
            Topology::Line => 2,
            Topology::Triangle => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Topology::Point => "Points",
            Topology::Line => "Lines",
            Topology::Triangle => "Triangles",
        }
    }
}

/// A contiguous run of primitives inside a solid's index buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub topology: Topology,
    pub start: usize,
    pub count: usize,
}

impl Layout {
    pub fn new(topology: Topology, start: usize, count: usize) -> Self {
        Self { topology, start, count }
    }

    /// One past the last index used by this run
    pub fn end(&self) -> usize {
        self.start + self.count * self.topology.vertices_per()
    }
}

/// Structural problems in a solid's buffers
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolidError {
    #[error("layout run {run} ends at index {end} but only {len} indices exist")]
    LayoutOutOfRange { run: usize, end: usize, len: usize },
    #[error("index buffer position {position} references vertex {index} but only {len} vertices exist")]
    IndexOutOfRange { position: usize, index: usize, len: usize },
}

/// Indexed geometry with a typed layout and a local-to-world matrix
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Solid {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<usize>,
    pub layout: Vec<Layout>,
    #[serde(default)]
    pub matrix: DMat4,
}

impl Solid {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_matrix(mut self, matrix: DMat4) -> Self {
        self.matrix = matrix;
        self
    }

    /// Append primitives of one topology, extending the last run when it has
    /// the same topology. Trailing indices that don't fill a primitive are
    /// ignored.
    pub fn push_primitives(&mut self, topology: Topology, indices: &[usize]) {
        let k = topology.vertices_per();
        let count = indices.len() / k;
        if count == 0 {
            return;
        }

        let start = self.indices.len();
        self.indices.extend_from_slice(&indices[..count * k]);

        match self.layout.last_mut() {
            Some(last) if last.topology == topology && last.end() == start => last.count += count,
            _ => self.layout.push(Layout::new(topology, start, count)),
        }
    }

    pub fn primitive_count(&self) -> usize {
        self.layout.iter().map(|run| run.count).sum()
    }

    /// Check the layout and index invariants
    pub fn validate(&self) -> Result<(), SolidError> {
        for (run, layout) in self.layout.iter().enumerate() {
            let end = layout.end();
            if end > self.indices.len() {
                return Err(SolidError::LayoutOutOfRange {
                    run,
                    end,
                    len: self.indices.len(),
                });
            }
        }

        for (position, &index) in self.indices.iter().enumerate() {
            if index >= self.vertices.len() {
                return Err(SolidError::IndexOutOfRange {
                    position,
                    index,
                    len: self.vertices.len(),
                });
            }
        }

        Ok(())
    }

    /// Copy the vertices of primitive `i` of `run` into `out`.
    /// Returns false (leaving `out` empty) when any index is out of range.
    pub fn gather_primitive(&self, run: &Layout, i: usize, out: &mut Vec<Vertex>) -> bool {
        out.clear();

        let k = run.topology.vertices_per();
        let first = run.start + i * k;
        let Some(indices) = self.indices.get(first..first + k) else {
            return false;
        };

        for &index in indices {
            match self.vertices.get(index) {
                Some(vertex) => out.push(*vertex),
                None => {
                    out.clear();
                    return false;
                }
            }
        }

        true
    }
}
