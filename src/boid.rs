/*
 * Boid Module
 *
 * This module defines the Boid struct and its behavior.
 * Each boid follows three main rules:
 * 1. Separation: Avoid crowding neighbors
 * 2. Alignment: Steer towards the average heading of neighbors
 * 3. Cohesion: Steer towards the average position of neighbors
 *
 * An imminent obstacle collision overrides all three for that frame.
 * Neighbors come from the flock's proximity database through the token each
 * boid owns; a neighbor only counts if it passes the neighborhood test of the
 * behavior being computed.
 */

use glam::{Mat4, Vec3, Vec4};
use rand::Rng;

use crate::math::{random_unit_vector_on_xz_plane, random_vector_in_unit_radius_sphere, SteerVec3, UP};
use crate::obstacle::ObstacleGroup;
use crate::params::{BoidParams, ForceParams};
use crate::proximity::{ProximityDatabase, ProximityToken};
use crate::vehicle::{side_for, Vehicle};

/// Index of a boid in its flock. Doubles as the object stored in the proximity database.
pub type AgentId = usize;

/// Outcome of one steering decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steering {
    pub force: Vec3,
    /// The force is an obstacle-avoidance vector, flocking was skipped
    pub avoiding: bool,
    /// Candidates returned by the proximity query (self included)
    pub neighbors: usize,
}

#[derive(Debug)]
pub struct Boid {
    id: AgentId,
    pub(crate) vehicle: Vehicle,
    pub(crate) params: BoidParams,
    pub(crate) smoothed_acceleration: Vec3,
    pub(crate) last_forward: Vec3,
    pub(crate) last_position: Vec3,
    pub(crate) curvature: f32,
    pub(crate) token: ProximityToken<AgentId>,
}

impl Boid {
    // Registered at the origin facing +z at the initial speed
    pub fn new(id: AgentId, database: &ProximityDatabase<AgentId>, params: BoidParams) -> Self {
        let mut token = database.allocate_token(id);
        token.update_for_new_position(Vec3::ZERO);

        let mut vehicle = Vehicle::new(
            Vec3::ZERO,
            Vec3::Z,
            params.max_speed * params.initial_speed_fraction,
            params.max_force,
            params.radius,
        );
        vehicle.side = side_for(vehicle.forward, params.right_handed);

        Self {
            id,
            vehicle,
            params,
            smoothed_acceleration: Vec3::ZERO,
            last_forward: Vec3::ZERO,
            last_position: Vec3::ZERO,
            curvature: 0.0,
            token,
        }
    }

    // Random heading and scattered start position
    pub fn spawn<R: Rng + ?Sized>(
        id: AgentId,
        database: &ProximityDatabase<AgentId>,
        params: BoidParams,
        rng: &mut R,
    ) -> Self {
        let mut boid = Self::new(id, database, params);
        boid.reset(rng);
        boid
    }

    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.last_forward = Vec3::ZERO;
        self.last_position = Vec3::ZERO;
        self.smoothed_acceleration = Vec3::ZERO;
        self.curvature = 0.0;

        self.vehicle.max_force = self.params.max_force;
        self.vehicle.radius = self.params.radius;
        self.vehicle.speed = self.params.max_speed * self.params.initial_speed_fraction;

        let forward = random_unit_vector_on_xz_plane(rng);
        self.set_forward(if forward == Vec3::ZERO { Vec3::Z } else { forward });
        self.set_position(random_vector_in_unit_radius_sphere(rng) * self.params.spawn_radius);
    }

    // Accessors
    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    pub fn params(&self) -> &BoidParams {
        &self.params
    }

    pub fn position(&self) -> Vec3 {
        self.vehicle.position
    }

    pub fn forward(&self) -> Vec3 {
        self.vehicle.forward
    }

    pub fn side(&self) -> Vec3 {
        self.vehicle.side
    }

    pub fn speed(&self) -> f32 {
        self.vehicle.speed
    }

    pub fn velocity(&self) -> Vec3 {
        self.vehicle.velocity()
    }

    pub fn smoothed_acceleration(&self) -> Vec3 {
        self.smoothed_acceleration
    }

    /// Signed path curvature measured on the last step that moved the boid.
    pub fn curvature(&self) -> f32 {
        self.curvature
    }

    // Placement by the caller; the proximity database follows immediately
    pub fn set_position(&mut self, position: Vec3) {
        self.vehicle.position = position;
        self.token.update_for_new_position(position);
    }

    pub fn move_by(&mut self, offset: Vec3) {
        self.set_position(self.vehicle.position + offset);
    }

    /// Zero headings are ignored.
    pub fn set_forward(&mut self, forward: Vec3) {
        let forward = forward.normalize_or_self();
        if forward == Vec3::ZERO {
            return;
        }
        self.vehicle.forward = forward;
        self.vehicle.side = side_for(forward, self.params.right_handed);
    }

    /// Instance matrix for a renderer: basis (-side, up, -forward), origin at
    /// (x, height, z), uniformly scaled.
    pub fn world_transform(&self, scale: f32, height: f32) -> Mat4 {
        let position = self.vehicle.position;
        Mat4::from_cols(
            (-self.vehicle.side * scale).extend(0.0),
            (UP * scale).extend(0.0),
            (-self.vehicle.forward * scale).extend(0.0),
            Vec4::new(position.x, height, position.z, 1.0),
        )
    }

    // Avoid obstacles if needed, flock otherwise. `neighbors` is scratch space
    // reused across calls; `boids` must be indexable by AgentId.
    pub fn steer_to_flock(&self, obstacles: &ObstacleGroup, boids: &[Boid], neighbors: &mut Vec<AgentId>) -> Steering {
        let avoidance = obstacles.steer_to_avoid(&self.vehicle, self.params.min_time_to_collision);
        if avoidance != Vec3::ZERO {
            return Steering {
                force: avoidance,
                avoiding: true,
                neighbors: 0,
            };
        }

        neighbors.clear();
        self.token
            .find_neighbors(self.vehicle.position, self.params.max_radius(), neighbors);

        let force = self.steer_for_separation(flockmates(boids, neighbors))
            + self.steer_for_alignment(flockmates(boids, neighbors))
            + self.steer_for_cohesion(flockmates(boids, neighbors));

        Steering {
            force,
            avoiding: false,
            neighbors: neighbors.len(),
        }
    }

    // Steer away from neighbors, inverse-square weighted
    pub fn steer_for_separation<'a, I>(&self, flockmates: I) -> Vec3
    where
        I: IntoIterator<Item = &'a Boid>,
    {
        let force = &self.params.separation;
        let mut steering = Vec3::ZERO;

        for other in flockmates {
            if !self.in_force_neighborhood(other, force) {
                continue;
            }
            let offset = other.position() - self.position();
            let distance_squared = offset.length_squared();
            // Coincident agents give no direction to flee in
            if distance_squared > 0.0 {
                steering += offset / -distance_squared;
            }
        }

        steering.normalize_or_self() * force.weight
    }

    // Steer toward the average heading of neighbors
    pub fn steer_for_alignment<'a, I>(&self, flockmates: I) -> Vec3
    where
        I: IntoIterator<Item = &'a Boid>,
    {
        let force = &self.params.alignment;
        let mut steering = Vec3::ZERO;
        let mut count = 0;

        for other in flockmates {
            if self.in_force_neighborhood(other, force) {
                steering += other.forward();
                count += 1;
            }
        }

        if count > 0 {
            steering = (steering / count as f32 - self.forward()).normalize_or_self();
        }

        steering * force.weight
    }

    // Steer toward the average position of neighbors
    pub fn steer_for_cohesion<'a, I>(&self, flockmates: I) -> Vec3
    where
        I: IntoIterator<Item = &'a Boid>,
    {
        let force = &self.params.cohesion;
        let mut steering = Vec3::ZERO;
        let mut count = 0;

        for other in flockmates {
            if self.in_force_neighborhood(other, force) {
                steering += other.position();
                count += 1;
            }
        }

        if count > 0 {
            steering = (steering / count as f32 - self.position()).normalize_or_self();
        }

        steering * force.weight
    }

    #[inline]
    fn in_force_neighborhood(&self, other: &Boid, force: &ForceParams) -> bool {
        self.in_boid_neighborhood(other, self.params.min_distance(), force.radius, force.cos_max_angle)
    }

    /// Neighborhood test: always in inside `min_distance`, always out beyond
    /// `max_distance`, otherwise in when ahead of the forward cone threshold.
    pub fn in_boid_neighborhood(&self, other: &Boid, min_distance: f32, max_distance: f32, cos_max_angle: f32) -> bool {
        if other.id == self.id {
            return false;
        }

        let offset = other.position() - self.position();
        let distance_squared = offset.length_squared();

        if distance_squared < min_distance * min_distance {
            return true;
        }
        if distance_squared > max_distance * max_distance {
            return false;
        }

        let unit_offset = offset / distance_squared.sqrt();
        self.forward().dot(unit_offset) > cos_max_angle
    }
}

fn flockmates<'a>(boids: &'a [Boid], ids: &'a [AgentId]) -> impl Iterator<Item = &'a Boid> + 'a {
    ids.iter().map(move |&id| &boids[id])
}
