/*
 * Vehicle Module
 *
 * The kinematic state every steering agent exposes to obstacles and to its
 * flockmates. Local space is velocity-aligned, so velocity = forward * speed.
 */

use glam::Vec3;

use crate::math::{SteerVec3, UP};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vehicle {
    pub position: Vec3,
    /// Unit heading
    pub forward: Vec3,
    /// Unit lateral axis, perpendicular to forward and up
    pub side: Vec3,
    /// Speed along forward
    pub speed: f32,
    /// Steering force is clipped to this magnitude
    pub max_force: f32,
    /// Bounding sphere radius
    pub radius: f32,
}

impl Vehicle {
    pub fn new(position: Vec3, forward: Vec3, speed: f32, max_force: f32, radius: f32) -> Self {
        let forward = forward.normalize_or_self();
        Self {
            position,
            forward,
            side: side_for(forward, false),
            speed,
            max_force,
            radius,
        }
    }

    #[inline]
    pub fn velocity(&self) -> Vec3 {
        self.forward * self.speed
    }
}

// Lateral axis for a heading in the ground plane
#[inline]
pub fn side_for(forward: Vec3, right_handed: bool) -> Vec3 {
    let side = if right_handed {
        forward.cross(UP)
    } else {
        UP.cross(forward)
    };
    side.normalize_or_self()
}
