/*
 * Physics Module
 *
 * Turns a raw steering force into motion for one boid:
 * - Bias the force toward forward at low speed so slow agents never spin in place
 * - Clip to max_force, smooth the acceleration, Euler-integrate velocity and position
 * - Re-align the local frame with the new velocity and pin the agent to the ground plane
 * - Track path curvature, wrap around the toroidal world and report the new position
 *
 * Steps run in exactly this order; the spatial index sees the wrapped position.
 */

use glam::Vec3;

use crate::boid::Boid;
use crate::math::{clip, interpolate, limit_max_deviation_angle, SteerVec3, UP};
use crate::params::WorldBounds;
use crate::vehicle::{side_for, Vehicle};

// Below this fraction of max speed the force is confined to a forward cone
const ADJUSTMENT_SPEED_FRACTION: f32 = 0.2;
const THRESHOLD_TOLERANCE: f32 = 4.0 * f32::EPSILON;

// Narrow the force into a forward cone whose half-angle collapses to zero as
// speed drops to zero. At or above 20% of max speed the force passes untouched.
pub fn adjust_raw_steering_force(force: Vec3, vehicle: &Vehicle, max_speed: f32) -> Vec3 {
    let max_adjusted_speed = ADJUSTMENT_SPEED_FRACTION * max_speed;
    let range = vehicle.speed / max_adjusted_speed;

    // 0.2 * max_speed rounds in f32, so a speed at the threshold can land a few ulps short
    if force == Vec3::ZERO || !(range < 1.0 - THRESHOLD_TOLERANCE) {
        return force;
    }

    let cosine = interpolate(range.powi(20), 1.0, -1.0);
    limit_max_deviation_angle(force, cosine, vehicle.forward)
}

// Align forward with the horizontal part of the new velocity. A zero velocity
// keeps the old heading.
pub fn regenerate_local_space(vehicle: &mut Vehicle, new_velocity: Vec3, right_handed: bool) {
    let new_velocity = new_velocity.perpendicular_component(UP);

    vehicle.speed = new_velocity.length();
    vehicle.position = vehicle.position.set_y_to_zero();

    if vehicle.speed > 0.0 {
        vehicle.forward = new_velocity / vehicle.speed;
    }
    vehicle.side = side_for(vehicle.forward, right_handed);
}

// Toroidal wrap: leaving past half extent + margin re-enters at the opposite half extent
pub fn wrap_position(mut position: Vec3, world: &WorldBounds) -> Vec3 {
    let limit_x = world.half_length + world.margin;
    let limit_z = world.half_width + world.margin;

    if position.x < -limit_x {
        position.x = world.half_length;
    } else if position.x > limit_x {
        position.x = -world.half_length;
    }

    if position.z < -limit_z {
        position.z = world.half_width;
    } else if position.z > limit_z {
        position.z = -world.half_width;
    }

    position
}

// One full integration step for a single boid
pub fn apply_steering_force(boid: &mut Boid, force: Vec3, elapsed_time: f32, world: &WorldBounds) {
    let params = boid.params;

    let adjusted_force = adjust_raw_steering_force(force, &boid.vehicle, params.max_speed);
    let clipped_force = adjusted_force.truncate_length(params.max_force);

    // Damp abrupt changes, faster at small time steps
    if elapsed_time > 0.0 {
        let smooth_rate = clip(9.0 * elapsed_time, 0.15, 0.4);
        boid.smoothed_acceleration = interpolate(smooth_rate, boid.smoothed_acceleration, clipped_force);
    }

    let mut new_velocity = boid.vehicle.velocity() + boid.smoothed_acceleration * elapsed_time;
    new_velocity = new_velocity.truncate_length(params.max_speed);

    boid.vehicle.speed = new_velocity.length();
    boid.vehicle.position += new_velocity * elapsed_time;

    regenerate_local_space(&mut boid.vehicle, new_velocity, params.right_handed);

    if elapsed_time > 0.0 {
        measure_path_curvature(boid);
    }

    boid.vehicle.position = wrap_position(boid.vehicle.position, world);
    boid.token.update_for_new_position(boid.vehicle.position);
}

// Lateral change of heading per unit distance, positive when turning toward -side
fn measure_path_curvature(boid: &mut Boid) {
    let displacement = (boid.last_position - boid.vehicle.position).length();

    if displacement > 0.0 {
        let forward_change = (boid.last_forward - boid.vehicle.forward) / displacement;
        let lateral = forward_change.perpendicular_component(boid.vehicle.forward);
        let sign = if lateral.dot(boid.vehicle.side) < 0.0 { 1.0 } else { -1.0 };
        boid.curvature = lateral.length() * sign;
    }

    boid.last_forward = boid.vehicle.forward;
    boid.last_position = boid.vehicle.position;
}
