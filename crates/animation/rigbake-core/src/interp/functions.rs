//! Interpolation helpers:
//! - lerp_f32 / lerp_vec3 (component-wise)
//! - slerp_unit (shortest-arc slerp with NLERP fallback)
//! - array <-> nalgebra conversions for stored keys

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

/// Below this 4D angle sine, slerp is ill-conditioned and NLERP is used instead.
const SLERP_EPSILON: f32 = 1e-6;

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn lerp_vec3(a: &Vector3<f32>, b: &Vector3<f32>, t: f32) -> Vector3<f32> {
    a.lerp(b, t)
}

/// Spherical interpolation between two unit quaternions along the shortest arc.
///
/// nalgebra refuses to slerp nearly identical (or opposite) rotations; those
/// fall back to a normalized lerp, which is exact in the limit.
#[inline]
pub fn slerp_unit(a: &UnitQuaternion<f32>, b: &UnitQuaternion<f32>, t: f32) -> UnitQuaternion<f32> {
    if t <= 0.0 {
        return *a;
    }
    if t >= 1.0 {
        return *b;
    }
    a.try_slerp(b, t, SLERP_EPSILON).unwrap_or_else(|| nlerp_unit(a, b, t))
}

/// Quaternion NLERP with shortest-arc correction.
#[inline]
pub fn nlerp_unit(a: &UnitQuaternion<f32>, b: &UnitQuaternion<f32>, t: f32) -> UnitQuaternion<f32> {
    let qa = a.quaternion();
    let mut qb = *b.quaternion();
    if qa.coords.dot(&qb.coords) < 0.0 {
        qb = -qb;
    }
    let mixed = Quaternion::from(qa.coords.lerp(&qb.coords, t));
    UnitQuaternion::try_new(mixed, f32::EPSILON).unwrap_or(*b)
}

#[inline]
pub fn vec3_from_array(v: [f32; 3]) -> Vector3<f32> {
    Vector3::new(v[0], v[1], v[2])
}

#[inline]
pub fn vec3_to_array(v: &Vector3<f32>) -> [f32; 3] {
    [v.x, v.y, v.z]
}

/// Build a unit quaternion from `[x, y, z, w]`; zero-length input maps to identity.
#[inline]
pub fn quat_from_array(q: [f32; 4]) -> UnitQuaternion<f32> {
    UnitQuaternion::try_new(Quaternion::new(q[3], q[0], q[1], q[2]), f32::EPSILON)
        .unwrap_or_else(UnitQuaternion::identity)
}

/// Flatten a unit quaternion to `[x, y, z, w]`.
#[inline]
pub fn quat_to_array(q: &UnitQuaternion<f32>) -> [f32; 4] {
    [q.i, q.j, q.k, q.w]
}
