//! Keyframe sampling of bone tracks.
//!
//! Model:
//! - Keys are ordered by frame (validated on load).
//! - Translations interpolate linearly, rotations by shortest-arc slerp.
//! - Before the first key the first value holds; after the last key the last value holds.
//!
//! API:
//! - sample_translation / sample_rotation return `None` for an empty channel so
//!   callers can leave the bone's current value untouched.

use nalgebra::{UnitQuaternion, Vector3};

use crate::data::{BoneTrack, RotationKey, TranslationKey};
use crate::interp::functions::{lerp_vec3, quat_from_array, slerp_unit, vec3_from_array};

/// Find the segment [i, i+1] that contains `frame`, and return (i, i+1, local_t).
/// Edge cases:
/// - If frame <= first, returns (0, 0, 0).
/// - If frame >= last, returns (last, last, 0).
fn find_segment<K>(keys: &[K], frame: f32, key_frame: impl Fn(&K) -> f32) -> (usize, usize, f32) {
    let n = keys.len();
    if n <= 1 || frame <= key_frame(&keys[0]) {
        return (0, 0, 0.0);
    }
    if frame >= key_frame(&keys[n - 1]) {
        return (n - 1, n - 1, 0.0);
    }
    // First key strictly after `frame`; always in 1..n here.
    let hi = keys.partition_point(|k| key_frame(k) <= frame);
    let lo = hi - 1;
    let (f0, f1) = (key_frame(&keys[lo]), key_frame(&keys[hi]));
    let denom = (f1 - f0).max(f32::EPSILON);
    let lt = ((frame - f0) / denom).clamp(0.0, 1.0);
    (lo, hi, lt)
}

pub fn sample_translation(keys: &[TranslationKey], frame: f32) -> Option<Vector3<f32>> {
    if keys.is_empty() {
        return None;
    }
    let (i0, i1, lt) = find_segment(keys, frame, |k| k.frame);
    let a = vec3_from_array(keys[i0].value);
    if i0 == i1 {
        return Some(a);
    }
    let b = vec3_from_array(keys[i1].value);
    Some(lerp_vec3(&a, &b, lt))
}

pub fn sample_rotation(keys: &[RotationKey], frame: f32) -> Option<UnitQuaternion<f32>> {
    if keys.is_empty() {
        return None;
    }
    let (i0, i1, lt) = find_segment(keys, frame, |k| k.frame);
    let a = quat_from_array(keys[i0].value);
    if i0 == i1 {
        return Some(a);
    }
    let b = quat_from_array(keys[i1].value);
    Some(slerp_unit(&a, &b, lt))
}

/// Sampled local transform of one track; channels without keys are `None`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackSample {
    pub translation: Option<Vector3<f32>>,
    pub rotation: Option<UnitQuaternion<f32>>,
}

pub fn sample_track(track: &BoneTrack, frame: f32) -> TrackSample {
    TrackSample {
        translation: sample_translation(&track.translations, frame),
        rotation: sample_rotation(&track.rotations, frame),
    }
}
