/*
 * Simulation Parameters Module
 *
 * Tunable values for the flock, grouped by what consumes them:
 * - ForceParams: one per flocking behavior (radius, field of view, weight)
 * - BoidParams: per-agent limits and behavior tuning
 * - WorldBounds: the toroidal world agents wrap around
 * - IndexKind: which proximity database the flock builds
 * - FlockParams / CrowdParams: everything the manager and calling layer need
 *
 * The defaults reproduce the tuned constants of the reference flock.
 */

use glam::{IVec3, Vec3};

// Parameters for one steering behavior
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceParams {
    /// Neighbors beyond this distance never count
    pub radius: f32,
    /// Cosine of the half-angle of the forward-facing field of view
    pub cos_max_angle: f32,
    pub weight: f32,
}

impl ForceParams {
    pub const fn new(radius: f32, cos_max_angle: f32, weight: f32) -> Self {
        Self {
            radius,
            cos_max_angle,
            weight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoidParams {
    pub max_force: f32,
    pub max_speed: f32,
    /// Speed after reset as a fraction of max_speed
    pub initial_speed_fraction: f32,
    /// Bounding sphere radius
    pub radius: f32,
    /// Reset scatters agents inside a sphere of this radius
    pub spawn_radius: f32,
    /// Neighbors closer than radius * this always count, whatever the angle
    pub min_distance_factor: f32,
    /// Seconds of look-ahead for obstacle avoidance
    pub min_time_to_collision: f32,
    /// Side = forward x up when set, up x forward otherwise
    pub right_handed: bool,
    pub separation: ForceParams,
    pub alignment: ForceParams,
    pub cohesion: ForceParams,
}

impl Default for BoidParams {
    fn default() -> Self {
        Self {
            max_force: 27.0,
            max_speed: 9.0,
            initial_speed_fraction: 0.3,
            radius: 0.5,
            spawn_radius: 20.0,
            min_distance_factor: 3.0,
            min_time_to_collision: 1.0,
            right_handed: false,
            separation: ForceParams::new(1.0, -0.707, 12.0),
            alignment: ForceParams::new(1.0, 0.7, 8.0),
            cohesion: ForceParams::new(1.0, -0.15, 8.0),
        }
    }
}

impl BoidParams {
    /// Query radius covering all three behaviors
    pub fn max_radius(&self) -> f32 {
        f32::max(
            self.separation.radius,
            f32::max(self.alignment.radius, self.cohesion.radius),
        )
    }

    pub fn min_distance(&self) -> f32 {
        self.radius * self.min_distance_factor
    }
}

// Toroidal world in the ground plane. Crossing x < -(half_length + margin)
// re-enters at x = half_length, and so on for each edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub half_length: f32,
    pub half_width: f32,
    pub margin: f32,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            half_length: 16.0,
            half_width: 13.0,
            margin: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndexKind {
    BruteForce,
    LocalityGrid {
        center: Vec3,
        dimensions: Vec3,
        divisions: IVec3,
    },
}

impl IndexKind {
    // Lattice slightly larger than the world, flat in y
    pub fn grid_for(world: &WorldBounds) -> Self {
        IndexKind::LocalityGrid {
            center: Vec3::ZERO,
            dimensions: Vec3::new(world.half_length * 1.1 * 2.0, 2.2, world.half_width * 1.1 * 2.0),
            divisions: IVec3::new(10, 1, 10),
        }
    }
}

impl Default for IndexKind {
    fn default() -> Self {
        Self::grid_for(&WorldBounds::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlockParams {
    pub boid: BoidParams,
    pub world: WorldBounds,
    pub index: IndexKind,
    /// Footprint of the open box every agent stays inside
    pub obstacle_width: f32,
    pub obstacle_depth: f32,
    /// Fixed seed for reproducible runs, entropy otherwise
    pub seed: Option<u64>,
}

impl Default for FlockParams {
    fn default() -> Self {
        let world = WorldBounds::default();
        Self {
            boid: BoidParams::default(),
            world,
            index: IndexKind::grid_for(&world),
            obstacle_width: world.half_length * 2.0,
            obstacle_depth: world.half_width * 2.0,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrowdParams {
    pub flock: FlockParams,
    pub max_instances: usize,
    pub default_instances: usize,
    /// Uniform scale baked into each instance transform
    pub instance_scale: f32,
    /// Height of each instance above the ground plane
    pub instance_height: f32,
}

impl Default for CrowdParams {
    fn default() -> Self {
        Self {
            flock: FlockParams::default(),
            max_instances: 4000,
            default_instances: 100,
            instance_scale: 0.005,
            instance_height: 1.8,
        }
    }
}
