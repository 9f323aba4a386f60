/*
 * Boid Flocking Simulation
 *
 * Headless driver for the flocking library. Runs the default crowd on a
 * fixed physics timestep, the way an interactive front end would between
 * frames, and exercises the same controls a user would:
 * - Grow and shrink the crowd
 * - Toggle boids animation off and back on
 *
 * Set RUST_LOG=debug to see per-step statistics.
 */

use std::process::ExitCode;
use std::time::Duration;

use log::{error, info};

use boid_flock::{Crowd, CrowdParams};

// Physics runs at a fixed rate regardless of how frames are paced
const PHYSICS_FPS: f32 = 60.0;
const FRAMES: u32 = 600;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut crowd = match Crowd::new(CrowdParams::default()) {
        Ok(crowd) => crowd,
        Err(err) => {
            error!("Failed to build crowd: {err}");
            return ExitCode::FAILURE;
        }
    };
    info!("{}", crowd.label_instances());

    let physics_step_size = Duration::from_secs_f32(1.0 / PHYSICS_FPS);
    // Frames arrive a little slower than physics so the accumulator sometimes runs two steps
    let frame_time = Duration::from_secs_f32(1.0 / 55.0);
    let mut physics_accumulator = Duration::ZERO;

    for frame in 0..FRAMES {
        match frame {
            150 => {
                crowd.add_instances(400);
                info!("{}", crowd.label_instances());
            }
            300 => {
                crowd.switch_boids();
            }
            360 => {
                crowd.switch_boids();
            }
            450 => {
                crowd.remove_instances(250);
                info!("{}", crowd.label_instances());
            }
            _ => {}
        }

        // Run fixed timestep updates
        physics_accumulator += frame_time;
        while physics_accumulator >= physics_step_size {
            crowd.update(physics_step_size.as_secs_f32());
            physics_accumulator -= physics_step_size;
        }
    }

    let debug_info = crowd.flock().debug_info();
    info!("{}", crowd.label_boids());
    info!("Final {debug_info}");
    info!("Produced {} instance transforms", crowd.instance_transforms().count());

    crowd.close();
    ExitCode::SUCCESS
}
