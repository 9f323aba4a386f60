/*
 * Obstacle Module
 *
 * Path-vs-shape intersection for obstacle avoidance.
 * - RectangleObstacle: a vertical strip of finite width and infinite height
 * - BoxObstacle: four rectangles forming an open box centered at the origin
 * - ObstacleGroup: the nearest intersection over any set of obstacles
 *
 * Agents only react when an intersection is closer than
 * min_time_to_collision * speed, and then steer laterally at full force.
 */

use glam::Vec3;

use crate::error::{FlockError, Result};
use crate::math::{SteerVec3, UP};
use crate::vehicle::Vehicle;

/// Where a vehicle's straight-line path meets an obstacle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathIntersection {
    /// Distance from the vehicle to the intersection point
    pub distance: f32,
    pub surface_point: Vec3,
    /// Unit normal facing the vehicle's side of the surface
    pub surface_normal: Vec3,
    /// Unit direction to steer away from the surface
    pub steer_hint: Vec3,
    pub vehicle_outside: bool,
}

impl PathIntersection {
    pub fn steer_to_avoid_if_needed(&self, vehicle: &Vehicle, min_time_to_collision: f32) -> Vec3 {
        let min_distance_to_collision = min_time_to_collision * vehicle.speed;
        if self.distance >= min_distance_to_collision {
            return Vec3::ZERO;
        }

        // Head-on: the hint has no lateral part, so break the tie with our side
        let lateral = self
            .steer_hint
            .perpendicular_component(vehicle.forward)
            .try_normalize()
            .unwrap_or(vehicle.side);
        lateral * vehicle.max_force
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectangleObstacle {
    pub start: Vec3,
    pub end: Vec3,
    /// Midpoint of the segment
    pub position: Vec3,
    /// Unit vector from start to end
    pub side: Vec3,
    /// Unit normal, side x up
    pub forward: Vec3,
    pub width: f32,
}

impl RectangleObstacle {
    pub fn new(start: Vec3, end: Vec3) -> Result<Self> {
        let line = end - start;
        let side = line.normalize_or_self();
        let forward = side.cross(UP);

        // Zero-length or vertical segments leave no usable frame
        if forward.length_squared() <= f32::EPSILON {
            return Err(FlockError::DegenerateObstacle {
                start: start.to_array(),
                end: end.to_array(),
            });
        }

        Ok(Self {
            start,
            end,
            position: start + line * 0.5,
            side,
            forward: forward.normalize(),
            width: line.length(),
        })
    }

    // Global direction into the (side, 0, forward) frame
    #[inline]
    fn localize_direction(&self, direction: Vec3) -> Vec3 {
        Vec3::new(direction.dot(self.side), 0.0, direction.dot(self.forward))
    }

    #[inline]
    fn xy_point_inside_shape(&self, point: Vec3, radius: f32) -> bool {
        let w = radius + self.width * 0.5;
        !(point.x > w || point.x < -w)
    }

    pub fn find_intersection_with_vehicle_path(&self, vehicle: &Vehicle) -> Option<PathIntersection> {
        let lp = self.localize_direction(vehicle.position - self.position);
        let ld = self.localize_direction(vehicle.forward);

        // Path parallel to the plane
        if ld.z == 0.0 {
            return None;
        }

        // Heading away from the plane on either side
        if (lp.z > 0.0 && ld.z > 0.0) || (lp.z < 0.0 && ld.z < 0.0) {
            return None;
        }

        let ix = lp.x - ld.x * lp.z / ld.z;
        let plane_intersection = Vec3::new(ix, 0.0, 0.0);

        if !self.xy_point_inside_shape(plane_intersection, vehicle.radius) {
            return None;
        }

        let side_sign = if lp.z > 0.0 { 1.0 } else { -1.0 };
        let surface_normal = self.forward * side_sign;

        Some(PathIntersection {
            distance: (lp - plane_intersection).length(),
            surface_point: self.position + self.side * ix,
            surface_normal,
            steer_hint: (surface_normal + self.side * plane_intersection.normalize_or_self().x).normalize_or_self(),
            vehicle_outside: lp.z > 0.0,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxObstacle {
    pub width: f32,
    pub depth: f32,
    pub position: Vec3,
    faces: [RectangleObstacle; 4],
}

impl BoxObstacle {
    pub fn new(width: f32, depth: f32) -> Result<Self> {
        if !(width.is_finite() && depth.is_finite() && width > 0.0 && depth > 0.0) {
            return Err(FlockError::InvalidBoxDimensions { width, depth });
        }

        let position = Vec3::ZERO;
        let hw = 0.5 * width;
        let hd = 0.5 * depth;

        let faces = [
            RectangleObstacle::new(position + Vec3::new(-hw, 0.0, hd), position + Vec3::new(hw, 0.0, hd))?,
            RectangleObstacle::new(position + Vec3::new(hw, 0.0, -hd), position + Vec3::new(-hw, 0.0, -hd))?,
            RectangleObstacle::new(position + Vec3::new(hw, 0.0, hd), position + Vec3::new(hw, 0.0, -hd))?,
            RectangleObstacle::new(position + Vec3::new(-hw, 0.0, -hd), position + Vec3::new(-hw, 0.0, hd))?,
        ];

        Ok(Self {
            width,
            depth,
            position,
            faces,
        })
    }

    pub fn faces(&self) -> &[RectangleObstacle; 4] {
        &self.faces
    }

    pub fn find_intersection_with_vehicle_path(&self, vehicle: &Vehicle) -> Option<PathIntersection> {
        let mut nearest = nearest_intersection(
            self.faces
                .iter()
                .filter_map(|face| face.find_intersection_with_vehicle_path(vehicle)),
        )?;

        // Steer toward (outside) or away from (inside) the box centre line
        let direction = if nearest.vehicle_outside { 1.0 } else { -1.0 };
        nearest.steer_hint = (nearest.surface_point - self.position).normalize_or_self() * direction;
        Some(nearest)
    }
}

fn nearest_intersection<I>(intersections: I) -> Option<PathIntersection>
where
    I: Iterator<Item = PathIntersection>,
{
    intersections.fold(None, |nearest: Option<PathIntersection>, current| match nearest {
        Some(best) if best.distance <= current.distance => Some(best),
        _ => Some(current),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum Obstacle {
    Rectangle(RectangleObstacle),
    Box(BoxObstacle),
}

impl Obstacle {
    pub fn find_intersection_with_vehicle_path(&self, vehicle: &Vehicle) -> Option<PathIntersection> {
        match self {
            Obstacle::Rectangle(rectangle) => rectangle.find_intersection_with_vehicle_path(vehicle),
            Obstacle::Box(open_box) => open_box.find_intersection_with_vehicle_path(vehicle),
        }
    }

    /// Lateral avoidance force, or zero when no collision is imminent.
    pub fn steer_to_avoid(&self, vehicle: &Vehicle, min_time_to_collision: f32) -> Vec3 {
        self.find_intersection_with_vehicle_path(vehicle)
            .map_or(Vec3::ZERO, |pi| pi.steer_to_avoid_if_needed(vehicle, min_time_to_collision))
    }
}

impl From<RectangleObstacle> for Obstacle {
    fn from(rectangle: RectangleObstacle) -> Self {
        Obstacle::Rectangle(rectangle)
    }
}

impl From<BoxObstacle> for Obstacle {
    fn from(open_box: BoxObstacle) -> Self {
        Obstacle::Box(open_box)
    }
}

/// Obstacles shared by a whole flock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObstacleGroup {
    obstacles: Vec<Obstacle>,
}

impl ObstacleGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(obstacle: impl Into<Obstacle>) -> Self {
        Self {
            obstacles: vec![obstacle.into()],
        }
    }

    pub fn push(&mut self, obstacle: impl Into<Obstacle>) {
        self.obstacles.push(obstacle.into());
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn find_intersection_with_vehicle_path(&self, vehicle: &Vehicle) -> Option<PathIntersection> {
        nearest_intersection(
            self.obstacles
                .iter()
                .filter_map(|obstacle| obstacle.find_intersection_with_vehicle_path(vehicle)),
        )
    }

    pub fn steer_to_avoid(&self, vehicle: &Vehicle, min_time_to_collision: f32) -> Vec3 {
        self.find_intersection_with_vehicle_path(vehicle)
            .map_or(Vec3::ZERO, |pi| pi.steer_to_avoid_if_needed(vehicle, min_time_to_collision))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle(position: Vec3, forward: Vec3, speed: f32) -> Vehicle {
        Vehicle::new(position, forward, speed, 27.0, 0.5)
    }

    fn wall() -> RectangleObstacle {
        RectangleObstacle::new(Vec3::new(-2.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0)).expect("valid wall")
    }

    #[test]
    fn rectangle_frame_is_orthonormal() {
        let r = wall();
        assert_eq!(r.side, Vec3::X);
        assert!((r.forward.length() - 1.0).abs() < 1e-6);
        assert!(r.forward.dot(r.side).abs() < 1e-6);
        assert_eq!(r.width, 4.0);
        assert_eq!(r.position, Vec3::ZERO);
    }

    #[test]
    fn degenerate_segments_are_rejected() {
        assert!(matches!(
            RectangleObstacle::new(Vec3::ONE, Vec3::ONE),
            Err(FlockError::DegenerateObstacle { .. })
        ));
        assert!(RectangleObstacle::new(Vec3::ZERO, Vec3::Y).is_err());
        assert!(matches!(
            BoxObstacle::new(0.0, 4.0),
            Err(FlockError::InvalidBoxDimensions { .. })
        ));
    }

    #[test]
    fn imminent_head_on_collision_steers_sideways() {
        let r = Obstacle::from(wall());
        let near = vehicle(Vec3::new(0.0, 0.0, -1.0), Vec3::Z, 5.0);

        let pi = r.find_intersection_with_vehicle_path(&near).expect("path hits the wall");
        assert!((pi.distance - 1.0).abs() < 1e-5);
        assert!(!pi.vehicle_outside);

        let force = r.steer_to_avoid(&near, 1.0);
        assert!(force.length() > 0.0);
        assert!(force.dot(near.forward).abs() < 1e-4, "force must be lateral");
        assert!((force.length() - near.max_force).abs() < 1e-3);

        let far = vehicle(Vec3::new(0.0, 0.0, -100.0), Vec3::Z, 5.0);
        assert_eq!(r.steer_to_avoid(&far, 1.0), Vec3::ZERO);
    }

    #[test]
    fn small_lateral_hint_is_followed_not_replaced() {
        let v = vehicle(Vec3::ZERO, Vec3::Z, 5.0);
        assert_eq!(v.side, Vec3::X);

        // Hint leans very slightly toward -side
        let pi = PathIntersection {
            distance: 1.0,
            surface_point: Vec3::new(0.0, 0.0, 1.0),
            surface_normal: -Vec3::Z,
            steer_hint: Vec3::new(-1e-4, 0.0, -1.0).normalize(),
            vehicle_outside: false,
        };
        let force = pi.steer_to_avoid_if_needed(&v, 1.0);
        assert!(force.x < 0.0, "force must follow the hint, got {force}");
        assert!((force.length() - v.max_force).abs() < 1e-3);

        // Exactly head-on falls back to the vehicle's side
        let head_on = PathIntersection {
            steer_hint: -Vec3::Z,
            ..pi
        };
        assert_eq!(head_on.steer_to_avoid_if_needed(&v, 1.0), Vec3::X * v.max_force);
    }

    #[test]
    fn paths_that_miss_do_not_intersect() {
        let r = wall();
        // Parallel to the wall
        assert!(r.find_intersection_with_vehicle_path(&vehicle(Vec3::new(0.0, 0.0, -1.0), Vec3::X, 5.0)).is_none());
        // Moving away
        assert!(r.find_intersection_with_vehicle_path(&vehicle(Vec3::new(0.0, 0.0, -1.0), -Vec3::Z, 5.0)).is_none());
        // Passing beyond the end plus radius
        assert!(r.find_intersection_with_vehicle_path(&vehicle(Vec3::new(3.0, 0.0, -1.0), Vec3::Z, 5.0)).is_none());
        // Within width / 2 + radius
        assert!(r.find_intersection_with_vehicle_path(&vehicle(Vec3::new(2.4, 0.0, -1.0), Vec3::Z, 5.0)).is_some());
    }

    #[test]
    fn off_centre_hint_points_toward_nearer_end() {
        let r = wall();
        let v = vehicle(Vec3::new(1.0, 0.0, -1.0), Vec3::Z, 5.0);
        let pi = r.find_intersection_with_vehicle_path(&v).expect("hit");
        assert!((pi.steer_hint.length() - 1.0).abs() < 1e-5);
        assert!(pi.steer_hint.x > 0.0);
        assert!(pi.steer_hint.z < 0.0);
        assert_eq!(pi.surface_point, Vec3::new(1.0, 0.0, 0.0));
        assert!(Obstacle::from(r).steer_to_avoid(&v, 1.0).x > 0.0);
    }

    #[test]
    fn box_picks_nearest_face_and_points_inward() {
        let b = BoxObstacle::new(32.0, 26.0).expect("valid box");
        // Inside, heading for the +x wall at x = 16
        let v = vehicle(Vec3::new(15.0, 0.0, 3.0), Vec3::X, 5.0);
        let pi = b.find_intersection_with_vehicle_path(&v).expect("hit the +x face");
        assert!((pi.distance - 1.0).abs() < 1e-4);
        assert!(!pi.vehicle_outside);
        assert!(pi.steer_hint.x < 0.0, "hint must point back into the box");

        let force = Obstacle::from(b).steer_to_avoid(&v, 1.0);
        assert!(force.length() > 0.0);
        assert!(force.x.abs() < 1e-3);
        assert!(force.z < 0.0, "steer back toward the centre line");
    }

    #[test]
    fn group_reports_nearest_of_all_members() {
        let mut group = ObstacleGroup::new();
        assert!(group.is_empty());
        group.push(RectangleObstacle::new(Vec3::new(-2.0, 0.0, 5.0), Vec3::new(2.0, 0.0, 5.0)).expect("wall"));
        group.push(wall());
        let v = vehicle(Vec3::new(0.0, 0.0, -1.0), Vec3::Z, 5.0);
        let pi = group.find_intersection_with_vehicle_path(&v).expect("hit");
        assert!((pi.distance - 1.0).abs() < 1e-5);
        assert_eq!(group.obstacles().len(), 2);
    }
}
