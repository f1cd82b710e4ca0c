//! Transform component and utilities for spatial positioning.

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Euler order used by scene nodes: yaw, then pitch, then roll.
pub const NODE_EULER: EulerRot = EulerRot::YXZ;

/// A 3D transform representing position, rotation, and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform at the given position.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform at height `y` on the local vertical axis.
    pub fn from_y(y: f32) -> Self {
        Self::from_position(Vec3::new(0.0, y, 0.0))
    }

    /// Create a new transform with position and rotation.
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Create a transform from a position and per-axis Euler angles (x = pitch, y = yaw, z = roll).
    pub fn from_position_euler(position: Vec3, euler: Vec3) -> Self {
        Self::from_position_rotation(position, Quat::from_euler(NODE_EULER, euler.y, euler.x, euler.z))
    }

    /// Builder-style scale override.
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Create the model matrix for this transform.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Rotation as per-axis Euler angles (x = pitch, y = yaw, z = roll).
    pub fn euler(&self) -> Vec3 {
        let (yaw, pitch, roll) = self.rotation.to_euler(NODE_EULER);
        Vec3::new(pitch, yaw, roll)
    }

    /// Replace the rotation with per-axis Euler angles.
    pub fn set_euler(&mut self, euler: Vec3) {
        self.rotation = Quat::from_euler(NODE_EULER, euler.y, euler.x, euler.z);
    }
}
