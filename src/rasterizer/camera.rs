//! Perspective camera: look-at view and [0, 1] depth projection

use glam::{DMat4, DQuat, DVec3, DVec4};
use serde::{Deserialize, Serialize};

use super::types::{Solid, Topology, Vertex};

/// Rotations that would bring the view direction this close to the up axis
/// are refused, look-at degenerates there.
const VERTICAL_LIMIT: f64 = 0.99999;

/// Camera state. Matrices are derived on every call, nothing is cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: DVec3,
    pub direction: DVec3,
    pub up: DVec3,
    /// Vertical field of view in radians
    pub fov: f64,
    pub near_plane: f64,
    pub far_plane: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: DVec3::new(-6.0, 0.0, 2.0),
            direction: DVec3::X,
            up: DVec3::Z,
            fov: 90f64.to_radians(),
            near_plane: 0.5,
            far_plane: 50.0,
            width: 1.0,
            height: 1.0,
        }
    }
}

impl Camera {
    pub fn new(position: DVec3, direction: DVec3, up: DVec3) -> Self {
        Self {
            position,
            direction,
            up,
            ..Self::default()
        }
    }

    pub fn set_viewport(&mut self, width: usize, height: usize) {
        self.width = width as f64;
        self.height = height as f64;
    }

    pub fn aspect(&self) -> f64 {
        if self.width > 0.0 && self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    pub fn get_view(&self) -> DMat4 {
        DMat4::look_at_rh(self.position, self.position + self.direction, self.up)
    }

    pub fn get_projection(&self) -> DMat4 {
        DMat4::perspective_rh(self.fov, self.aspect(), self.near_plane, self.far_plane)
    }

    fn right(&self) -> DVec3 {
        self.direction.cross(self.up).normalize_or_zero()
    }

    pub fn move_forward(&mut self, distance: f64) {
        self.position += self.direction * distance;
    }

    pub fn move_backward(&mut self, distance: f64) {
        self.position -= self.direction * distance;
    }

    pub fn move_left(&mut self, distance: f64) {
        self.position -= self.right() * distance;
    }

    pub fn move_right(&mut self, distance: f64) {
        self.position += self.right() * distance;
    }

    pub fn move_up(&mut self, distance: f64) {
        self.position += self.up * distance;
    }

    pub fn move_down(&mut self, distance: f64) {
        self.position -= self.up * distance;
    }

    pub fn rotate_left(&mut self, angle: f64) {
        let axis = self.up.normalize_or_zero();
        if axis != DVec3::ZERO {
            self.direction = DQuat::from_axis_angle(axis, angle) * self.direction;
        }
    }

    pub fn rotate_right(&mut self, angle: f64) {
        self.rotate_left(-angle);
    }

    /// Tilt towards `up`. Returns false when the tilt was refused.
    pub fn rotate_up(&mut self, angle: f64) -> bool {
        self.tilt(angle)
    }

    pub fn rotate_down(&mut self, angle: f64) -> bool {
        self.tilt(-angle)
    }

    fn tilt(&mut self, angle: f64) -> bool {
        let axis = self.right();
        if axis == DVec3::ZERO {
            return false;
        }

        let direction = DQuat::from_axis_angle(axis, angle) * self.direction;
        let alignment = direction.normalize_or_zero().dot(self.up.normalize_or_zero());
        if alignment.abs() >= VERTICAL_LIMIT {
            log::trace!("Refused camera tilt of {angle} rad, alignment {alignment}");
            return false;
        }

        self.direction = direction;
        true
    }

    /// World space corners of the view frustum: near plane first, then far,
    /// each in (-x -y), (+x -y), (+x +y), (-x +y) order.
    pub fn frustum_corners(&self) -> [DVec3; 8] {
        let inverse = (self.get_projection() * self.get_view()).inverse();
        let mut corners = [DVec3::ZERO; 8];
        let ndc = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

        for (plane, z) in [0.0, 1.0].into_iter().enumerate() {
            for (i, (x, y)) in ndc.into_iter().enumerate() {
                let world = inverse * DVec4::new(x, y, z, 1.0);
                corners[plane * 4 + i] = world.truncate() / world.w;
            }
        }

        corners
    }

    /// Line solid outlining this camera's frustum, for drawing it from
    /// another camera
    pub fn frustum_solid(&self, name: &str, color: DVec4) -> Solid {
        let mut solid = Solid::new(name);
        solid.vertices.push(Vertex::new(self.position.extend(1.0), color, Default::default()));
        solid.vertices.extend(
            self.frustum_corners()
                .into_iter()
                .map(|c| Vertex::new(c.extend(1.0), color, Default::default())),
        );

        let edges: [usize; 32] = [
            // near rectangle
            1, 2, 2, 3, 3, 4, 4, 1,
            // far rectangle
            5, 6, 6, 7, 7, 8, 8, 5,
            // sides
            1, 5, 2, 6, 3, 7, 4, 8,
            // eye to near corners
            0, 1, 0, 2, 0, 3, 0, 4,
        ];
        solid.push_primitives(Topology::Line, &edges);
        solid
    }
}
