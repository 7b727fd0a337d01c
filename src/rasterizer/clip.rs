//! Frustum tests and clipping.
//!
//! Vertex lists are flat: consecutive groups of `vertices_per(topology)`
//! vertices form one primitive. Clipping rewrites the list in place and may
//! grow it (a triangle clipped by a plane can become a quad, fanned back
//! into two triangles) or empty it.

use glam::DVec4;

use super::types::{Topology, Vertex};

/// A clipping plane together with the space it is tested in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipPlane {
    /// z = 0 in clip space, before the perspective divide
    Near,
    /// x = -1 in NDC
    Left,
    /// x = 1 in NDC
    Right,
    /// y = -1 in NDC
    Bottom,
    /// y = 1 in NDC
    Top,
    /// z = 1 in NDC
    Far,
}

impl ClipPlane {
    /// Planes applied after dehomogenization, in order
    pub const NDC: [ClipPlane; 5] = [
        ClipPlane::Left,
        ClipPlane::Right,
        ClipPlane::Bottom,
        ClipPlane::Top,
        ClipPlane::Far,
    ];

    /// Signed distance, positive on the visible side
    pub fn distance(self, v: &Vertex) -> f64 {
        let p = v.pos;
        match self {
            ClipPlane::Near => p.z,
            ClipPlane::Left => p.x + 1.0,
            ClipPlane::Right => 1.0 - p.x,
            ClipPlane::Bottom => p.y + 1.0,
            ClipPlane::Top => 1.0 - p.y,
            ClipPlane::Far => 1.0 - p.z,
        }
    }

    /// Vertices on the near plane itself count as behind the camera
    pub fn inside(self, v: &Vertex) -> bool {
        let d = self.distance(v);
        match self {
            ClipPlane::Near => d > 0.0,
            _ => d >= 0.0,
        }
    }

    /// Point where segment a-b crosses the plane
    fn intersect(self, a: &Vertex, b: &Vertex) -> Vertex {
        let da = self.distance(a);
        let db = self.distance(b);
        Vertex::interpolate(da / (da - db), a, b)
    }
}

/// True when every vertex lies outside the same homogeneous clip plane.
/// Only ever rejects whole primitives; anything straddling passes.
pub fn fast_reject(vertices: &[Vertex]) -> bool {
    if vertices.is_empty() {
        return false;
    }

    let all = |outside: fn(&DVec4) -> bool| vertices.iter().all(|v| outside(&v.pos));

    all(|p| p.x < -p.w)
        || all(|p| p.x > p.w)
        || all(|p| p.y < -p.w)
        || all(|p| p.y > p.w)
        || all(|p| p.z < 0.0)
        || all(|p| p.z > p.w)
}

/// Clip against the near plane in clip space
pub fn clip_near(vertices: &mut Vec<Vertex>, topology: Topology) {
    clip_against(vertices, topology, &[ClipPlane::Near]);
}

/// Clip against the five remaining frustum planes in NDC
pub fn clip_ndc(vertices: &mut Vec<Vertex>, topology: Topology) {
    clip_against(vertices, topology, &ClipPlane::NDC);
}

/// Drop every primitive with a non-finite vertex (division by a zero w)
pub fn retain_finite(vertices: &mut Vec<Vertex>, topology: Topology) {
    let k = topology.vertices_per();
    if vertices.iter().all(Vertex::is_finite) {
        return;
    }

    let kept: Vec<Vertex> = vertices
        .chunks_exact(k)
        .filter(|group| group.iter().all(Vertex::is_finite))
        .flatten()
        .copied()
        .collect();
    *vertices = kept;
}

fn clip_against(vertices: &mut Vec<Vertex>, topology: Topology, planes: &[ClipPlane]) {
    let mut out = Vec::with_capacity(vertices.len());

    match topology {
        Topology::Point => {
            out.extend(vertices.iter().filter(|v| planes.iter().all(|plane| plane.inside(v))));
        }
        Topology::Line => {
            for pair in vertices.chunks_exact(2) {
                if let Some((a, b)) = clip_segment(pair[0], pair[1], planes) {
                    out.push(a);
                    out.push(b);
                }
            }
        }
        Topology::Triangle => {
            let mut polygon = Vec::with_capacity(9);
            let mut scratch = Vec::with_capacity(9);
            for triangle in vertices.chunks_exact(3) {
                polygon.clear();
                polygon.extend_from_slice(triangle);
                for &plane in planes {
                    clip_polygon(&polygon, plane, &mut scratch);
                    std::mem::swap(&mut polygon, &mut scratch);
                    if polygon.is_empty() {
                        break;
                    }
                }
                fan(&polygon, &mut out);
            }
        }
    }

    *vertices = out;
}

/// Successive endpoint clipping of a segment. None when fully outside.
fn clip_segment(mut a: Vertex, mut b: Vertex, planes: &[ClipPlane]) -> Option<(Vertex, Vertex)> {
    for &plane in planes {
        match (plane.inside(&a), plane.inside(&b)) {
            (true, true) => {}
            (false, false) => return None,
            (true, false) => b = plane.intersect(&a, &b),
            (false, true) => a = plane.intersect(&a, &b),
        }
    }
    Some((a, b))
}

/// One Sutherland–Hodgman pass: keep inside vertices, insert a crossing
/// vertex on every edge that changes side.
fn clip_polygon(polygon: &[Vertex], plane: ClipPlane, out: &mut Vec<Vertex>) {
    out.clear();
    let n = polygon.len();

    for i in 0..n {
        let current = &polygon[i];
        let next = &polygon[(i + 1) % n];
        let current_inside = plane.inside(current);

        if current_inside {
            out.push(*current);
        }
        if current_inside != plane.inside(next) {
            out.push(plane.intersect(current, next));
        }
    }
}

/// Triangulate a convex polygon as a fan around its first vertex
fn fan(polygon: &[Vertex], out: &mut Vec<Vertex>) {
    if polygon.len() < 3 {
        return;
    }
    for i in 1..polygon.len() - 1 {
        out.push(polygon[0]);
        out.push(polygon[i]);
        out.push(polygon[i + 1]);
    }
}
