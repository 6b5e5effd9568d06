// src/transform.rs

use serde::{Deserialize, Serialize};

/// A position in 3D space.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Same position with only the vertical component replaced.
    pub fn with_y(self, y: f32) -> Self {
        Self { y, ..self }
    }
}

/// Anything the actuator can move. Only `y` is ever changed; `x` and `z`
/// are written back as they were read.
pub trait PositionSink {
    fn position(&self) -> Vec3;
    fn set_position(&mut self, position: Vec3);
}

/// Plain transform owned by the host scene.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub position: Vec3,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self { position }
    }
}

impl PositionSink for Transform {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }
}
