//! Analytic two-bone IK (start, mid, end bones reaching for a target bone).
//!
//! The solve is the law-of-cosines construction: bend the start and mid
//! joints so the start→end distance matches the start→target distance, then
//! swivel the start joint so the chain points at the target. The end bone's
//! world rotation is then pulled toward the target's. Every correction is
//! blended by the solver's weight curve, so partially engaged frames slerp
//! smoothly between the layered pose and the solved pose.

use log::debug;
use nalgebra::{Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::config::IkChainSettings;
use crate::curve::{CurveCursor, WeightCurve};
use crate::error::{CoreError, Result};
use crate::ids::BoneId;
use crate::interp::functions::slerp_unit;
use crate::skeleton::Skeleton;

/// Minimum sine of the angle between two vectors for their cross product to
/// be trusted as a rotation axis.
const AXIS_EPSILON: f32 = 1e-6;

/// Which limb a chain, hand pose layer or notetrack belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Suffix used by notetrack names (`ik_out_start_left_hand`, ...).
    pub fn notetrack_suffix(self) -> &'static str {
        match self {
            Side::Left => "left_hand",
            Side::Right => "right_hand",
        }
    }
}

/// Outcome of one solver update.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SolveStatus {
    /// Weight was zero; the skeleton was not touched.
    Inactive,
    /// Coincident joints made the chain unsolvable; the skeleton was not touched.
    Degenerate,
    Solved { weight: f32 },
}

#[derive(Clone, Debug)]
pub struct TwoBoneIkSolver {
    name: String,
    side: Side,
    start: BoneId,
    mid: BoneId,
    end: BoneId,
    target: BoneId,
    weights: WeightCurve,
    cursor: CurveCursor,
    reach_epsilon: f32,
}

impl TwoBoneIkSolver {
    pub fn new(
        name: impl Into<String>,
        side: Side,
        [start, mid, end, target]: [BoneId; 4],
        reach_epsilon: f32,
    ) -> Self {
        Self {
            name: name.into(),
            side,
            start,
            mid,
            end,
            target,
            weights: WeightCurve::new(),
            cursor: CurveCursor::new(),
            reach_epsilon: reach_epsilon.max(f32::EPSILON),
        }
    }

    /// Resolve the chain's bones by name; the first missing bone is an error.
    pub fn from_settings(
        name: impl Into<String>,
        side: Side,
        settings: &IkChainSettings,
        skeleton: &Skeleton,
        reach_epsilon: f32,
    ) -> Result<Self> {
        let name = name.into();
        let lookup = |bone: &str| {
            skeleton.find(bone).ok_or_else(|| CoreError::MissingBone {
                chain: name.clone(),
                bone: bone.to_string(),
            })
        };
        let bones = [
            lookup(&settings.start_bone)?,
            lookup(&settings.mid_bone)?,
            lookup(&settings.end_bone)?,
            lookup(&settings.target_bone)?,
        ];
        Ok(Self::new(name, side, bones, reach_epsilon))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    /// (start, mid, end, target)
    #[inline]
    pub fn bones(&self) -> [BoneId; 4] {
        [self.start, self.mid, self.end, self.target]
    }

    #[inline]
    pub fn weights(&self) -> &WeightCurve {
        &self.weights
    }

    #[inline]
    pub fn weights_mut(&mut self) -> &mut WeightCurve {
        &mut self.weights
    }

    #[inline]
    pub fn reset_cursor(&mut self) {
        self.cursor.reset();
    }

    /// Solve at `time`. Times must not decrease between calls unless the
    /// cursor is reset (an earlier time rewinds it).
    pub fn update(&mut self, skeleton: &mut Skeleton, time: f32) -> SolveStatus {
        let weight = self.cursor.sample(&self.weights, time);
        if weight == 0.0 {
            return SolveStatus::Inactive;
        }

        let eps = self.reach_epsilon;
        let a = skeleton.bone(self.start).world_translation;
        let b = skeleton.bone(self.mid).world_translation;
        let c = skeleton.bone(self.end).world_translation;
        let t = skeleton.bone(self.target).world_translation;

        let ab = b - a;
        let ac = c - a;
        let at = t - a;
        let lab = ab.norm();
        let lcb = (b - c).norm();
        let lac = ac.norm();
        if lab < eps || lcb < eps || lac < eps {
            debug!(
                "IK chain '{}' has coincident joints (lab={lab}, lcb={lcb}, lac={lac}); skipping",
                self.name
            );
            return SolveStatus::Degenerate;
        }
        let lat = at.norm().clamp(eps, lab + lcb - eps);

        // Current interior angles, then the ones a triangle with side `lat` needs.
        let ac_ab_0 = angle_between(&ac, &ab);
        let ba_bc_0 = angle_between(&(a - b), &(c - b));
        let ac_at_0 = angle_between(&ac, &at);

        let ac_ab_1 = acos_clamped((lcb * lcb - lab * lab - lat * lat) / (-2.0 * lab * lat));
        let ba_bc_1 = acos_clamped((lat * lat - lab * lab - lcb * lcb) / (-2.0 * lab * lcb));

        let axis1 = Unit::try_new(ac.cross(&at), AXIS_EPSILON * lac * at.norm());
        let axis0 = Unit::try_new(ac.cross(&ab), AXIS_EPSILON * lac * lab)
            .or(axis1)
            .unwrap_or_else(|| any_perpendicular(&ac));
        // Target on the a→c line: no swivel when ahead, a half turn when behind.
        let swivel_axis = match axis1 {
            Some(axis) => Some(axis),
            None if ac_at_0 > std::f32::consts::FRAC_PI_2 => Some(any_perpendicular(&ac)),
            None => None,
        };

        let start_inv = skeleton.bone(self.start).world_rotation.inverse();
        let mid_inv = skeleton.bone(self.mid).world_rotation.inverse();

        let r0 = local_axis_angle(&start_inv, &axis0, ac_ab_1 - ac_ab_0);
        let r1 = local_axis_angle(&mid_inv, &axis0, ba_bc_1 - ba_bc_0);
        let r2 = swivel_axis
            .map(|axis| local_axis_angle(&start_inv, &axis, ac_at_0))
            .unwrap_or_else(UnitQuaternion::identity);

        let a_lr = r0 * r2;
        let b_lr = r1;

        let start_local = skeleton.bone(self.start).local_rotation;
        skeleton.bone_mut(self.start).local_rotation =
            slerp_unit(&start_local, &(start_local * a_lr), weight);
        let mid_local = skeleton.bone(self.mid).local_rotation;
        skeleton.bone_mut(self.mid).local_rotation =
            slerp_unit(&mid_local, &(mid_local * b_lr), weight);

        // Mid's world depends on start's, so start goes first.
        skeleton.update_world_subtree(self.start);
        skeleton.update_world_subtree(self.mid);

        let end_world = skeleton.bone(self.end).world_rotation;
        let target_world = skeleton.bone(self.target).world_rotation;
        skeleton.set_world_rotation(self.end, slerp_unit(&end_world, &target_world, weight));

        SolveStatus::Solved { weight }
    }
}

/// Closed set of solver kinds run by the composition player.
#[derive(Clone, Debug)]
pub enum Solver {
    TwoBone(TwoBoneIkSolver),
}

impl Solver {
    pub fn name(&self) -> &str {
        match self {
            Solver::TwoBone(s) => s.name(),
        }
    }

    pub fn side(&self) -> Side {
        match self {
            Solver::TwoBone(s) => s.side(),
        }
    }

    pub fn weights(&self) -> &WeightCurve {
        match self {
            Solver::TwoBone(s) => s.weights(),
        }
    }

    pub fn weights_mut(&mut self) -> &mut WeightCurve {
        match self {
            Solver::TwoBone(s) => s.weights_mut(),
        }
    }

    pub fn reset_cursor(&mut self) {
        match self {
            Solver::TwoBone(s) => s.reset_cursor(),
        }
    }

    pub fn update(&mut self, skeleton: &mut Skeleton, time: f32) -> SolveStatus {
        match self {
            Solver::TwoBone(s) => s.update(skeleton, time),
        }
    }
}

impl From<TwoBoneIkSolver> for Solver {
    fn from(s: TwoBoneIkSolver) -> Self {
        Solver::TwoBone(s)
    }
}

#[inline]
fn acos_clamped(x: f32) -> f32 {
    x.clamp(-1.0, 1.0).acos()
}

/// Unsigned angle between two vectors; 0 when either is (near) zero.
#[inline]
fn angle_between(u: &Vector3<f32>, v: &Vector3<f32>) -> f32 {
    let denom = u.norm() * v.norm();
    if denom <= f32::MIN_POSITIVE {
        return 0.0;
    }
    acos_clamped(u.dot(v) / denom)
}

/// Some unit vector perpendicular to the non-zero `v`.
fn any_perpendicular(v: &Vector3<f32>) -> Unit<Vector3<f32>> {
    let helper = if v.x.abs() < 0.9 * v.norm() {
        Vector3::x()
    } else {
        Vector3::y()
    };
    Unit::new_normalize(v.cross(&helper))
}

/// Rotation by `angle` about the world-space `axis`, expressed in the frame
/// whose inverse world rotation is `inv_world`.
#[inline]
fn local_axis_angle(
    inv_world: &UnitQuaternion<f32>,
    axis: &Unit<Vector3<f32>>,
    angle: f32,
) -> UnitQuaternion<f32> {
    let local = Unit::new_normalize(inv_world.transform_vector(axis.as_ref()));
    UnitQuaternion::from_axis_angle(&local, angle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perpendicular_is_orthogonal_for_axis_inputs() {
        for v in [Vector3::x(), Vector3::y(), Vector3::new(0.0, 0.0, -3.0)] {
            let p = any_perpendicular(&v);
            assert!(p.dot(&v).abs() < 1e-6);
        }
    }

    #[test]
    fn angle_between_zero_vector_is_zero() {
        assert_eq!(angle_between(&Vector3::zeros(), &Vector3::x()), 0.0);
        let right = angle_between(&Vector3::x(), &Vector3::y());
        assert!((right - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn side_suffixes_match_notetrack_names() {
        assert_eq!(Side::Left.notetrack_suffix(), "left_hand");
        assert_eq!(Side::Right.notetrack_suffix(), "right_hand");
    }
}
