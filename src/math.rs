/*
 * Math Module
 *
 * Vector helpers layered on top of glam::Vec3 for steering code:
 * - Zero-safe normalization (a zero vector normalizes to itself)
 * - Parallel/perpendicular decomposition against a unit basis
 * - Length truncation
 * - Cone deviation limiting, used by the neighborhood test and force shaping
 * - Random vectors for spawning
 */

use glam::Vec3;
use rand::Rng;

/// World up axis. Agents move in the plane perpendicular to it.
pub const UP: Vec3 = Vec3::Y;

pub trait SteerVec3: Sized {
    /// Unit vector in the same direction, or the input unchanged if its length is zero.
    fn normalize_or_self(self) -> Self;
    /// Component parallel to `unit_basis`.
    fn parallel_component(self, unit_basis: Self) -> Self;
    /// Component perpendicular to `unit_basis`.
    fn perpendicular_component(self, unit_basis: Self) -> Self;
    /// Scale down to `max_length` if longer, otherwise return unchanged.
    fn truncate_length(self, max_length: f32) -> Self;
    fn set_y_to_zero(self) -> Self;
}

impl SteerVec3 for Vec3 {
    #[inline]
    fn normalize_or_self(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            self / len
        } else {
            self
        }
    }

    #[inline]
    fn parallel_component(self, unit_basis: Vec3) -> Vec3 {
        unit_basis * self.dot(unit_basis)
    }

    #[inline]
    fn perpendicular_component(self, unit_basis: Vec3) -> Vec3 {
        self - self.parallel_component(unit_basis)
    }

    #[inline]
    fn truncate_length(self, max_length: f32) -> Vec3 {
        let max_length_squared = max_length * max_length;
        let length_squared = self.length_squared();
        if length_squared <= max_length_squared {
            self
        } else {
            self * (max_length / length_squared.sqrt())
        }
    }

    #[inline]
    fn set_y_to_zero(self) -> Vec3 {
        Vec3::new(self.x, 0.0, self.z)
    }
}

/// Linear blend from `from` to `to` by `alpha`.
#[inline]
pub fn interpolate<T>(alpha: f32, from: T, to: T) -> T
where
    T: Copy + std::ops::Add<Output = T> + std::ops::Sub<Output = T> + std::ops::Mul<f32, Output = T>,
{
    from + (to - from) * alpha
}

#[inline]
pub fn clip(value: f32, lower: f32, upper: f32) -> f32 {
    if value < lower {
        lower
    } else if value > upper {
        upper
    } else {
        value
    }
}

// Cone deviation limiter. The cone has `basis` as its axis and
// `cosine_of_cone_angle` as the cosine of its half-angle. With `inside` set,
// `source` is rotated (length preserved) onto the cone surface if it points
// outside the cone; otherwise it is pushed out if it points inside.
pub fn limit_deviation_angle(inside: bool, source: Vec3, cosine_of_cone_angle: f32, basis: Vec3) -> Vec3 {
    let source_length = source.length();
    if source_length == 0.0 {
        return source;
    }

    let direction = source / source_length;
    let cosine_of_source_angle = direction.dot(basis);

    if inside {
        if cosine_of_source_angle >= cosine_of_cone_angle {
            return source;
        }
    } else if cosine_of_source_angle <= cosine_of_cone_angle {
        return source;
    }

    let unit_perp = source.perpendicular_component(basis).normalize_or_self();

    // Point on the cone in the plane spanned by source and basis
    let perp_dist = (1.0 - cosine_of_cone_angle * cosine_of_cone_angle).max(0.0).sqrt();
    let c0 = basis * cosine_of_cone_angle;
    let c1 = unit_perp * perp_dist;
    (c0 + c1) * source_length
}

#[inline]
pub fn limit_max_deviation_angle(source: Vec3, cosine_of_cone_angle: f32, basis: Vec3) -> Vec3 {
    limit_deviation_angle(true, source, cosine_of_cone_angle, basis)
}

#[inline]
pub fn limit_min_deviation_angle(source: Vec3, cosine_of_cone_angle: f32, basis: Vec3) -> Vec3 {
    limit_deviation_angle(false, source, cosine_of_cone_angle, basis)
}

// Rejection sampling inside the unit ball
pub fn random_vector_in_unit_radius_sphere<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        if v.length() < 1.0 {
            return v;
        }
    }
}

pub fn random_unit_vector_on_xz_plane<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    random_vector_in_unit_radius_sphere(rng).set_y_to_zero().normalize_or_self()
}
