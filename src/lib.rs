/*
 * Boid Flocking Simulation - Module Definitions
 *
 * This file defines the module structure for the flocking library.
 * Bottom-up: math and vehicle state, the proximity databases, obstacle
 * geometry, the boid agent and its physics, then the flock manager and the
 * crowd layer that drives it.
 */

// Re-export key components for easier access
pub use boid::{AgentId, Boid, Steering};
pub use crowd::Crowd;
pub use debug::DebugInfo;
pub use error::{FlockError, Result};
pub use flock::Flock;
pub use obstacle::{BoxObstacle, Obstacle, ObstacleGroup, PathIntersection, RectangleObstacle};
pub use params::{BoidParams, CrowdParams, FlockParams, ForceParams, IndexKind, WorldBounds};
pub use proximity::{Bin, ProximityDatabase, ProximityToken};
pub use vehicle::Vehicle;

// Define modules
pub mod boid;
pub mod crowd;
pub mod debug;
pub mod error;
pub mod flock;
pub mod math;
pub mod obstacle;
pub mod params;
pub mod physics;
pub mod proximity;
pub mod vehicle;
