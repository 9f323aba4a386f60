/*
 * Debug Information Module
 *
 * This module defines the DebugInfo struct that collects per-step statistics
 * for logging and for whatever front end drives the flock.
 *
 * Includes metrics for:
 * - Number of agents stepped
 * - Neighbor candidates returned by the proximity database
 * - Agents steering around an obstacle instead of flocking
 * - Step count and wall-clock time of the last step
 */

use std::fmt;
use std::time::Duration;

// Debug information for the most recent step plus running totals
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebugInfo {
    pub agents: usize,
    pub neighbors_found: usize,
    pub avoiding_obstacles: usize,
    pub steps: u64,
    pub step_time: Duration,
}

impl DebugInfo {
    pub fn begin_step(&mut self, agents: usize) {
        self.agents = agents;
        self.neighbors_found = 0;
        self.avoiding_obstacles = 0;
    }

    pub fn record_agent(&mut self, neighbors: usize, avoiding: bool) {
        self.neighbors_found += neighbors;
        if avoiding {
            self.avoiding_obstacles += 1;
        }
    }

    pub fn end_step(&mut self, step_time: Duration) {
        self.steps += 1;
        self.step_time = step_time;
    }

    // Average neighbor candidates per agent that queried the database
    pub fn mean_neighbors(&self) -> f32 {
        let flocking = self.agents.saturating_sub(self.avoiding_obstacles);
        if flocking == 0 {
            0.0
        } else {
            self.neighbors_found as f32 / flocking as f32
        }
    }
}

impl fmt::Display for DebugInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "step {}: {} agents, {:.1} neighbors/agent, {} avoiding, {:.3} ms",
            self.steps,
            self.agents,
            self.mean_neighbors(),
            self.avoiding_obstacles,
            self.step_time.as_secs_f64() * 1000.0
        )
    }
}
