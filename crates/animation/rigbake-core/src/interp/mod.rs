//! Interpolation helpers shared by clip sampling, layer blending and IK.
//!
//! Keys are stored as plain arrays (translation `[x, y, z]`, rotation
//! `[x, y, z, w]`) and converted to nalgebra types at the sampling boundary.

pub mod functions;

pub use functions::{lerp_f32, quat_from_array, quat_to_array, slerp_unit, vec3_from_array};
