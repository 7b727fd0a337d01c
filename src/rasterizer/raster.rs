//! Scan conversion of viewport-space primitives.
//!
//! Every function hands each covered pixel to `plot` as a fully
//! interpolated vertex whose x/y are the exact integer pixel coordinates.
//! Iteration is clamped to the image so off-screen geometry costs nothing.
//! Pixels whose interpolation produced NaN or infinity are skipped.

use std::mem::swap;

use super::types::Vertex;

/// Map NDC x/y in [-1, 1] onto [0, width-1] x [0, height-1]. y is not flipped.
pub fn map_to_viewport(vertices: &mut [Vertex], width: usize, height: usize) {
    let max_x = width.saturating_sub(1) as f64;
    let max_y = height.saturating_sub(1) as f64;
    for vertex in vertices {
        vertex.pos.x = (vertex.pos.x + 1.0) / 2.0 * max_x;
        vertex.pos.y = (vertex.pos.y + 1.0) / 2.0 * max_y;
    }
}

/// One pixel per vertex, rounded to the nearest pixel
pub fn draw_points(vertices: &[Vertex], plot: &mut impl FnMut(Vertex)) {
    for vertex in vertices {
        let mut v = *vertex;
        v.pos.x = v.pos.x.round();
        v.pos.y = v.pos.y.round();
        if v.is_finite() {
            plot(v);
        }
    }
}

/// DDA line. Steps one pixel at a time along the major axis and advances
/// the minor coordinate by the slope. Zero length lines draw nothing.
pub fn draw_line(a: &Vertex, b: &Vertex, width: usize, height: usize, plot: &mut impl FnMut(Vertex)) {
    if width == 0 || height == 0 {
        return;
    }

    let dx = b.pos.x - a.pos.x;
    let dy = b.pos.y - a.pos.y;
    if !(dx.is_finite() && dy.is_finite()) || (dx == 0.0 && dy == 0.0) {
        return;
    }

    if dy.abs() > dx.abs() {
        let slope = dx / dy;
        let Some((start, end)) = clamped_range(a.pos.y, b.pos.y, height) else {
            return;
        };

        let mut x = a.pos.x + (start as f64 - a.pos.y) * slope;
        for y in start..=end {
            let yf = y as f64;
            let mut v = Vertex::interpolate((yf - a.pos.y) / dy, a, b);
            v.pos.x = x.round();
            v.pos.y = yf;
            if v.is_finite() {
                plot(v);
            }
            x += slope;
        }
    } else {
        let slope = dy / dx;
        let Some((start, end)) = clamped_range(a.pos.x, b.pos.x, width) else {
            return;
        };

        let mut y = a.pos.y + (start as f64 - a.pos.x) * slope;
        for x in start..=end {
            let xf = x as f64;
            let mut v = Vertex::interpolate((xf - a.pos.x) / dx, a, b);
            v.pos.x = xf;
            v.pos.y = y.round();
            if v.is_finite() {
                plot(v);
            }
            y += slope;
        }
    }
}

/// Integer pixels covered by [min(p, q), max(p, q)] inside [0, size-1]
fn clamped_range(p: f64, q: f64, size: usize) -> Option<(i64, i64)> {
    let (lo, hi) = if p <= q { (p, q) } else { (q, p) };
    let start = lo.ceil().max(0.0);
    let end = hi.floor().min(size.saturating_sub(1) as f64);
    if !(start <= end) {
        return None;
    }
    Some((start as i64, end as i64))
}

/// Triangle outline as three DDA lines
pub fn draw_triangle_edges(a: &Vertex, b: &Vertex, c: &Vertex, width: usize, height: usize, plot: &mut impl FnMut(Vertex)) {
    draw_line(a, b, width, height, plot);
    draw_line(b, c, width, height, plot);
    draw_line(c, a, width, height, plot);
}

/// Scanline fill. Vertices are sorted by y into a <= b <= c; the top half
/// walks edges A-B and A-C, the bottom half B-C and A-C.
pub fn fill_triangle(a: &Vertex, b: &Vertex, c: &Vertex, width: usize, height: usize, plot: &mut impl FnMut(Vertex)) {
    if width == 0 || height == 0 {
        return;
    }
    if ![a, b, c].iter().all(|v| v.pos.x.is_finite() && v.pos.y.is_finite()) {
        return;
    }

    let (mut a, mut b, mut c) = (*a, *b, *c);
    if a.pos.y > b.pos.y {
        swap(&mut a, &mut b);
    }
    if b.pos.y > c.pos.y {
        swap(&mut b, &mut c);
    }
    if a.pos.y > b.pos.y {
        swap(&mut a, &mut b);
    }

    // A row on an integer b.y belongs to the top half only
    let last = fill_half(&a, &b, &a, &c, i64::MIN, width, height, plot);
    fill_half(&b, &c, &a, &c, last.map_or(i64::MIN, |row| row + 1), width, height, plot);
}

/// Rows between the ends of the short edge s0-s1, bounded on the other side
/// by the long edge l0-l1. Rows below `first_row` are skipped. Returns the
/// last row that was scanned.
fn fill_half(
    s0: &Vertex,
    s1: &Vertex,
    l0: &Vertex,
    l1: &Vertex,
    first_row: i64,
    width: usize,
    height: usize,
    plot: &mut impl FnMut(Vertex),
) -> Option<i64> {
    let (start, end) = clamped_range(s0.pos.y, s1.pos.y, height)?;
    let mut last = None;

    for y in start.max(first_row)..=end {
        let yf = y as f64;
        let mut left = Vertex::interpolate((yf - s0.pos.y) / (s1.pos.y - s0.pos.y), s0, s1);
        let mut right = Vertex::interpolate((yf - l0.pos.y) / (l1.pos.y - l0.pos.y), l0, l1);

        // A flat short edge gives 0/0 here; the other half covers that row
        if !(left.pos.x.is_finite() && right.pos.x.is_finite()) {
            continue;
        }
        if left.pos.x > right.pos.x {
            swap(&mut left, &mut right);
        }

        fill_span(yf, &left, &right, width, plot);
        last = Some(y);
    }

    last
}

fn fill_span(y: f64, left: &Vertex, right: &Vertex, width: usize, plot: &mut impl FnMut(Vertex)) {
    let Some((start, end)) = clamped_range(left.pos.x, right.pos.x, width) else {
        return;
    };

    for x in start..=end {
        let xf = x as f64;
        let mut v = Vertex::interpolate((xf - left.pos.x) / (right.pos.x - left.pos.x), left, right);
        v.pos.x = xf;
        v.pos.y = y;
        if v.is_finite() {
            plot(v);
        }
    }
}
