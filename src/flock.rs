/*
 * Flock Module
 *
 * The flock manager owns everything one simulation needs:
 * - The proximity database, its variant fixed when the flock is opened
 * - The obstacle group every boid avoids (an open box around the world)
 * - The boids themselves, in insertion order
 *
 * Boids are stepped one at a time in collection order. A later boid in the
 * same step already sees the moved positions of earlier ones.
 */

use std::time::Instant;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::boid::{AgentId, Boid};
use crate::debug::DebugInfo;
use crate::error::Result;
use crate::obstacle::{BoxObstacle, ObstacleGroup};
use crate::params::FlockParams;
use crate::physics;
use crate::proximity::ProximityDatabase;

pub struct Flock {
    // Declared first so every token is released before the database goes
    boids: Vec<Boid>,
    database: ProximityDatabase<AgentId>,
    obstacles: ObstacleGroup,
    params: FlockParams,
    rng: StdRng,
    neighbors: Vec<AgentId>,
    debug_info: DebugInfo,
}

impl Flock {
    // Build the proximity database and obstacle group. No boids yet.
    pub fn open(params: FlockParams) -> Result<Self> {
        let database = ProximityDatabase::from_kind(&params.index)?;
        let obstacles = ObstacleGroup::with(BoxObstacle::new(params.obstacle_width, params.obstacle_depth)?);
        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(
            "Opened flock with {} index, obstacle box {}x{}",
            database.kind_name(),
            params.obstacle_width,
            params.obstacle_depth
        );

        Ok(Self {
            boids: Vec::new(),
            database,
            obstacles,
            params,
            rng,
            neighbors: Vec::new(),
            debug_info: DebugInfo::default(),
        })
    }

    // Remove every boid, then release the database
    pub fn close(mut self) {
        let count = self.boids.len();
        self.boids.clear();
        debug_assert!(self.database.is_empty());
        info!("Closed flock after {} steps, released {} boids", self.debug_info.steps, count);
    }

    // Advance every boid by one step of `elapsed_time` seconds
    pub fn update(&mut self, elapsed_time: f32) {
        let started = Instant::now();
        self.debug_info.begin_step(self.boids.len());

        for i in 0..self.boids.len() {
            let steering = self.boids[i].steer_to_flock(&self.obstacles, &self.boids, &mut self.neighbors);
            physics::apply_steering_force(&mut self.boids[i], steering.force, elapsed_time, &self.params.world);
            self.debug_info.record_agent(steering.neighbors, steering.avoiding);
        }

        self.debug_info.end_step(started.elapsed());
        debug!("{}", self.debug_info);
    }

    pub fn add_boid(&mut self) -> AgentId {
        let id = self.boids.len();
        let boid = Boid::spawn(id, &self.database, self.params.boid, &mut self.rng);
        self.boids.push(boid);
        id
    }

    // Remove the most recently added boid. Its token leaves the database at once.
    pub fn remove_boid(&mut self) -> bool {
        self.boids.pop().is_some()
    }

    pub fn remove_all_boids(&mut self) {
        self.boids.clear();
    }

    // Re-randomize every boid in place
    pub fn reset(&mut self) {
        for boid in &mut self.boids {
            boid.reset(&mut self.rng);
        }
    }

    pub fn boids(&self) -> &[Boid] {
        &self.boids
    }

    pub fn boid_mut(&mut self, id: AgentId) -> Option<&mut Boid> {
        self.boids.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.boids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boids.is_empty()
    }

    pub fn database(&self) -> &ProximityDatabase<AgentId> {
        &self.database
    }

    pub fn obstacles(&self) -> &ObstacleGroup {
        &self.obstacles
    }

    pub fn params(&self) -> &FlockParams {
        &self.params
    }

    pub fn debug_info(&self) -> &DebugInfo {
        &self.debug_info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::IndexKind;
    use glam::Vec3;

    fn seeded(index: IndexKind) -> FlockParams {
        FlockParams {
            index,
            seed: Some(11),
            ..FlockParams::default()
        }
    }

    #[test]
    fn add_and_remove_follow_stack_order() {
        let mut flock = Flock::open(seeded(IndexKind::default())).expect("open");
        assert!(flock.is_empty());
        assert_eq!(flock.add_boid(), 0);
        assert_eq!(flock.add_boid(), 1);
        assert_eq!(flock.add_boid(), 2);
        assert_eq!(flock.database().len(), 3);

        assert!(flock.remove_boid());
        assert_eq!(flock.len(), 2);
        assert_eq!(flock.database().len(), 2);
        assert_eq!(flock.boids().last().map(Boid::id), Some(1));

        flock.remove_all_boids();
        assert!(!flock.remove_boid());
        assert!(flock.database().is_empty());
    }

    #[test]
    fn update_keeps_boids_on_ground_and_in_world() {
        let mut flock = Flock::open(seeded(IndexKind::default())).expect("open");
        for _ in 0..50 {
            flock.add_boid();
        }
        for _ in 0..120 {
            flock.update(1.0 / 60.0);
        }

        let world = flock.params().world;
        for boid in flock.boids() {
            let p = boid.position();
            assert_eq!(p.y, 0.0);
            assert!(p.x.abs() <= world.half_length + world.margin);
            assert!(p.z.abs() <= world.half_width + world.margin);
            assert!(boid.speed() <= flock.params().boid.max_speed + 1e-4);
            assert!(!p.is_nan());
        }
        assert_eq!(flock.debug_info().steps, 120);
        assert_eq!(flock.debug_info().agents, 50);
    }

    #[test]
    fn same_seed_same_trajectory() {
        let run = || {
            let mut flock = Flock::open(seeded(IndexKind::BruteForce)).expect("open");
            for _ in 0..20 {
                flock.add_boid();
            }
            for _ in 0..30 {
                flock.update(1.0 / 60.0);
            }
            flock.boids().iter().map(Boid::position).collect::<Vec<Vec3>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn reset_rescatters_every_boid() {
        let mut flock = Flock::open(seeded(IndexKind::default())).expect("open");
        for _ in 0..5 {
            flock.add_boid();
        }
        let before: Vec<Vec3> = flock.boids().iter().map(Boid::position).collect();
        flock.reset();
        let after: Vec<Vec3> = flock.boids().iter().map(Boid::position).collect();
        assert_ne!(before, after);
        assert!(after.iter().all(|p| p.length() < 20.0));
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let params = FlockParams {
            obstacle_width: -1.0,
            ..FlockParams::default()
        };
        assert!(Flock::open(params).is_err());

        let params = FlockParams {
            index: IndexKind::LocalityGrid {
                center: Vec3::ZERO,
                dimensions: Vec3::ONE,
                divisions: glam::IVec3::new(0, 1, 1),
            },
            ..FlockParams::default()
        };
        assert!(Flock::open(params).is_err());
    }

    #[test]
    fn close_releases_every_token() {
        let mut flock = Flock::open(seeded(IndexKind::default())).expect("open");
        for _ in 0..10 {
            flock.add_boid();
        }
        let database = flock.database().clone();
        flock.close();
        assert!(database.is_empty());
    }
}
