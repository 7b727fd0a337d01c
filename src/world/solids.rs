//! Built-in solids
//!
//! Small generators used by the default scene, the viewer and tests. Every
//! builder returns a solid with an identity matrix; place it with
//! `Solid::with_matrix`.

use std::collections::HashMap;

use glam::{DVec2, DVec3, DVec4};

use crate::rasterizer::{Solid, Topology, Vertex};

const RED: DVec4 = DVec4::new(1.0, 0.0, 0.0, 1.0);
const GREEN: DVec4 = DVec4::new(0.0, 1.0, 0.0, 1.0);
const BLUE: DVec4 = DVec4::new(0.0, 0.0, 1.0, 1.0);
const WHITE: DVec4 = DVec4::ONE;

fn vertex(position: DVec3, color: DVec4, uv: DVec2) -> Vertex {
    Vertex::from_pos(position.x, position.y, position.z)
        .with_color(color)
        .with_uv(uv)
}

/// Single triangle spanning the three unit axes, one primary color per corner
pub fn triangle(name: &str) -> Solid {
    let mut solid = Solid::new(name);
    solid.vertices = vec![
        vertex(DVec3::X, RED, DVec2::new(0.0, 0.0)),
        vertex(DVec3::Y, GREEN, DVec2::new(1.0, 0.0)),
        vertex(DVec3::Z, BLUE, DVec2::new(0.0, 1.0)),
    ];
    solid.push_primitives(Topology::Triangle, &[0, 1, 2]);
    solid
}

/// Unit square at z = -1 made of two triangles
pub fn square(name: &str) -> Solid {
    let mut solid = Solid::new(name);
    solid.vertices = vec![
        vertex(DVec3::new(-0.5, -0.5, -1.0), RED, DVec2::new(0.0, 0.0)),
        vertex(DVec3::new(0.5, -0.5, -1.0), GREEN, DVec2::new(1.0, 0.0)),
        vertex(DVec3::new(-0.5, 0.5, -1.0), BLUE, DVec2::new(0.0, 1.0)),
        vertex(DVec3::new(0.5, 0.5, -1.0), WHITE, DVec2::new(1.0, 1.0)),
    ];
    solid.push_primitives(Topology::Triangle, &[0, 1, 2, 1, 2, 3]);
    solid
}

/// X, Y and Z unit lines from the origin in red, green and blue
pub fn axis(name: &str) -> Solid {
    let mut solid = Solid::new(name);
    solid.vertices = vec![
        vertex(DVec3::ZERO, WHITE, DVec2::ZERO),
        vertex(DVec3::X, RED, DVec2::ZERO),
        vertex(DVec3::Y, GREEN, DVec2::ZERO),
        vertex(DVec3::Z, BLUE, DVec2::ZERO),
    ];
    solid.push_primitives(Topology::Line, &[1, 0, 2, 0, 3, 0]);
    solid
}

/// Cube of edge `size` centered on the origin. Each face has its own four
/// vertices so it can carry a flat color and a full 0..1 uv square.
pub fn cube(name: &str, size: f64) -> Solid {
    let h = size * 0.5;
    let faces: [(DVec3, DVec3, DVec3, DVec4); 6] = [
        (DVec3::X, DVec3::Y, DVec3::Z, RED),
        (DVec3::NEG_X, DVec3::NEG_Y, DVec3::Z, DVec4::new(0.0, 1.0, 1.0, 1.0)),
        (DVec3::Y, DVec3::NEG_X, DVec3::Z, GREEN),
        (DVec3::NEG_Y, DVec3::X, DVec3::Z, DVec4::new(1.0, 0.0, 1.0, 1.0)),
        (DVec3::Z, DVec3::Y, DVec3::NEG_X, BLUE),
        (DVec3::NEG_Z, DVec3::Y, DVec3::X, DVec4::new(1.0, 1.0, 0.0, 1.0)),
    ];

    let mut solid = Solid::new(name);
    for (normal, u, v, color) in faces {
        let base = solid.vertices.len();
        let center = normal * h;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let position = center + u * (su * h) + v * (sv * h);
            let uv = DVec2::new((su + 1.0) * 0.5, (sv + 1.0) * 0.5);
            solid.vertices.push(vertex(position, color, uv));
        }
        solid.push_primitives(
            Topology::Triangle,
            &[base, base + 1, base + 2, base, base + 2, base + 3],
        );
    }
    solid
}

/// Line lattice on the z = 0 plane, `cells` squares per side of `spacing`
pub fn grid(name: &str, cells: usize, spacing: f64) -> Solid {
    let mut solid = Solid::new(name);
    let extent = cells as f64 * spacing * 0.5;
    let color = DVec4::new(0.4, 0.4, 0.4, 1.0);

    for i in 0..=cells {
        let offset = -extent + i as f64 * spacing;
        let base = solid.vertices.len();
        solid.vertices.extend([
            vertex(DVec3::new(offset, -extent, 0.0), color, DVec2::ZERO),
            vertex(DVec3::new(offset, extent, 0.0), color, DVec2::ZERO),
            vertex(DVec3::new(-extent, offset, 0.0), color, DVec2::ZERO),
            vertex(DVec3::new(extent, offset, 0.0), color, DVec2::ZERO),
        ]);
        solid.push_primitives(Topology::Line, &[base, base + 1, base + 2, base + 3]);
    }
    solid
}

/// Unit-radius sphere from a subdivided icosahedron, colored by normal
pub fn icosphere(name: &str, subdivisions: u32) -> Solid {
    let t = (1.0 + 5f64.sqrt()) / 2.0;
    let mut positions: Vec<DVec3> = [
        (-1.0, t, 0.0),
        (1.0, t, 0.0),
        (-1.0, -t, 0.0),
        (1.0, -t, 0.0),
        (0.0, -1.0, t),
        (0.0, 1.0, t),
        (0.0, -1.0, -t),
        (0.0, 1.0, -t),
        (t, 0.0, -1.0),
        (t, 0.0, 1.0),
        (-t, 0.0, -1.0),
        (-t, 0.0, 1.0),
    ]
    .into_iter()
    .map(|(x, y, z)| DVec3::new(x, y, z).normalize())
    .collect();

    let mut triangles: Vec<[usize; 3]> = vec![
        [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
        [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
        [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
        [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
    ];

    for _ in 0..subdivisions {
        let mut midpoints: HashMap<(usize, usize), usize> = HashMap::new();
        let mut midpoint = |a: usize, b: usize, positions: &mut Vec<DVec3>| {
            let key = (a.min(b), a.max(b));
            *midpoints.entry(key).or_insert_with(|| {
                positions.push(((positions[a] + positions[b]) * 0.5).normalize());
                positions.len() - 1
            })
        };

        triangles = triangles
            .iter()
            .flat_map(|&[a, b, c]| {
                let ab = midpoint(a, b, &mut positions);
                let bc = midpoint(b, c, &mut positions);
                let ca = midpoint(c, a, &mut positions);
                [[a, ab, ca], [b, bc, ab], [c, ca, bc], [ab, bc, ca]]
            })
            .collect();
    }

    let mut solid = Solid::new(name);
    solid.vertices = positions
        .iter()
        .map(|&p| {
            let color = (p * 0.5 + DVec3::splat(0.5)).extend(1.0);
            let uv = DVec2::new(
                0.5 + p.y.atan2(p.x) / std::f64::consts::TAU,
                0.5 + p.z.asin() / std::f64::consts::PI,
            );
            vertex(p, color, uv)
        })
        .collect();

    let indices: Vec<usize> = triangles.into_iter().flatten().collect();
    solid.push_primitives(Topology::Triangle, &indices);
    solid
}

/// `n` x `n` x `n` lattice of points filling the cube [-half, half]³,
/// colored by position
pub fn point_grid(name: &str, n: usize, half: f64) -> Solid {
    let mut solid = Solid::new(name);
    if n == 0 {
        return solid;
    }

    let step = if n > 1 { 2.0 * half / (n - 1) as f64 } else { 0.0 };
    let start = if n > 1 { -half } else { 0.0 };
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                let p = DVec3::new(
                    start + i as f64 * step,
                    start + j as f64 * step,
                    start + k as f64 * step,
                );
                let color = if half > 0.0 {
                    (p / (2.0 * half) + DVec3::splat(0.5)).extend(1.0)
                } else {
                    WHITE
                };
                solid.vertices.push(vertex(p, color, DVec2::ZERO));
            }
        }
    }

    let indices: Vec<usize> = (0..solid.vertices.len()).collect();
    solid.push_primitives(Topology::Point, &indices);
    solid
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_builtins_validate() {
        let solids = [
            triangle("t"),
            square("s"),
            axis("a"),
            cube("c", 1.0),
            grid("g", 4, 1.0),
            icosphere("i", 2),
            point_grid("p", 3, 1.0),
        ];
        for solid in &solids {
            assert!(solid.validate().is_ok(), "{} failed validation", solid.name);
            assert_eq!(solid.layout.len(), 1, "{} should be one run", solid.name);
        }
    }

    #[test]
    fn test_primitive_counts() {
        assert_eq!(triangle("t").primitive_count(), 1);
        assert_eq!(square("s").primitive_count(), 2);
        assert_eq!(axis("a").primitive_count(), 3);
        assert_eq!(cube("c", 2.0).primitive_count(), 12);
        assert_eq!(grid("g", 4, 1.0).primitive_count(), 10);
        assert_eq!(point_grid("p", 3, 1.0).primitive_count(), 27);
    }

    #[test]
    fn test_cube_extent() {
        let cube = cube("c", 2.0);
        assert_eq!(cube.vertices.len(), 24);
        for v in &cube.vertices {
            assert_relative_eq!(v.pos.truncate().abs().max_element(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_icosphere_subdivision() {
        // 20 * 4^n faces, shared midpoints keep vertices at 10 * 4^n + 2
        for n in 0..3u32 {
            let sphere = icosphere("i", n);
            assert_eq!(sphere.primitive_count(), 20 * 4usize.pow(n));
            assert_eq!(sphere.vertices.len(), 10 * 4usize.pow(n) + 2);
            for v in &sphere.vertices {
                assert_relative_eq!(v.pos.truncate().length(), 1.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_square_uv_corners() {
        let square = square("s");
        let uvs: Vec<DVec2> = square.vertices.iter().map(|v| v.uv).collect();
        assert_eq!(uvs, vec![DVec2::ZERO, DVec2::X, DVec2::Y, DVec2::ONE]);
        assert!(square.vertices.iter().all(|v| v.one == 1.0 && v.pos.w == 1.0));
    }

    #[test]
    fn test_empty_point_grid() {
        let solid = point_grid("p", 0, 1.0);
        assert!(solid.vertices.is_empty());
        assert!(solid.layout.is_empty());
    }
}
