/*
 * Crowd Module
 *
 * The calling layer around a Flock. It owns what the flock core leaves out:
 * - Population controls, capped at max_instances
 * - The "boids animation" switch that gates stepping
 * - Display labels for an overlay
 * - Per-agent instance transforms for a renderer
 */

use glam::Mat4;
use log::{info, warn};

use crate::error::Result;
use crate::flock::Flock;
use crate::params::CrowdParams;

pub struct Crowd {
    flock: Flock,
    params: CrowdParams,
    use_boids: bool,
    label_instances: String,
    label_boids: String,
}

impl Crowd {
    // Open the flock and populate it with the default number of instances
    pub fn new(params: CrowdParams) -> Result<Self> {
        let flock = Flock::open(params.flock)?;
        let mut crowd = Self {
            flock,
            params,
            use_boids: true,
            label_instances: String::new(),
            label_boids: boids_label(true),
        };
        crowd.add_instances(params.default_instances);
        Ok(crowd)
    }

    // Step the flock, but only while boids animation is enabled
    pub fn update(&mut self, elapsed_time: f32) {
        if self.use_boids {
            self.flock.update(elapsed_time);
        }
    }

    /// Add up to `n` agents without exceeding max_instances. Returns how many were added.
    pub fn add_instances(&mut self, n: usize) -> usize {
        let room = self.params.max_instances.saturating_sub(self.flock.len());
        let added = n.min(room);
        if added < n {
            warn!(
                "Crowd capped at {} instances, added {} of {}",
                self.params.max_instances, added, n
            );
        }

        for _ in 0..added {
            self.flock.add_boid();
        }

        self.refresh_instances_label();
        if added > 0 {
            info!("Added {} instances, crowd size {}", added, self.flock.len());
        }
        added
    }

    /// Remove up to `n` agents from the back. Returns how many were removed.
    pub fn remove_instances(&mut self, n: usize) -> usize {
        let size = self.flock.len();
        if size == 0 {
            return 0;
        }

        let removed = if n >= size {
            self.flock.remove_all_boids();
            size
        } else {
            for _ in 0..n {
                self.flock.remove_boid();
            }
            n
        };

        self.refresh_instances_label();
        info!("Removed {} instances, crowd size {}", removed, self.flock.len());
        removed
    }

    // Toggle boids animation and return the new state
    pub fn switch_boids(&mut self) -> bool {
        self.use_boids = !self.use_boids;
        self.label_boids = boids_label(self.use_boids);
        info!("{}", self.label_boids);
        self.use_boids
    }

    pub fn use_boids(&self) -> bool {
        self.use_boids
    }

    pub fn label_instances(&self) -> &str {
        &self.label_instances
    }

    pub fn label_boids(&self) -> &str {
        &self.label_boids
    }

    // One world matrix per agent, in flock order
    pub fn instance_transforms(&self) -> impl Iterator<Item = Mat4> + '_ {
        let scale = self.params.instance_scale;
        let height = self.params.instance_height;
        self.flock
            .boids()
            .iter()
            .map(move |boid| boid.world_transform(scale, height))
    }

    pub fn flock(&self) -> &Flock {
        &self.flock
    }

    pub fn flock_mut(&mut self) -> &mut Flock {
        &mut self.flock
    }

    pub fn len(&self) -> usize {
        self.flock.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flock.is_empty()
    }

    // Close the underlying flock
    pub fn close(self) {
        self.flock.close();
    }

    fn refresh_instances_label(&mut self) {
        self.label_instances = format!("Crowd Size (Visible): {}", self.flock.len());
    }
}

fn boids_label(enabled: bool) -> String {
    let state = if enabled { "Enabled" } else { "Disabled" };
    format!("Boids Animation: {state}")
}
