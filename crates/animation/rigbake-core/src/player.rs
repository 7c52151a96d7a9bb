//! Composition player: layered clip sampling followed by IK solvers, one
//! discrete frame at a time.
//!
//! Per `update(frame)`:
//! - rewind cursors when playback restarts (frame 0 or an earlier frame)
//! - reset the skeleton to its bind pose
//! - apply layers in registration order
//! - regenerate world transforms
//! - run solvers in registration order
//!
//! Layers are expected in the order base, hand poses, gesture/additive
//! layers. Solvers always run after every layer.

use log::warn;
use nalgebra::UnitQuaternion;
use serde::{Deserialize, Serialize};

use crate::binding::BindingSet;
use crate::curve::{CurveCursor, WeightCurve};
use crate::data::{AnimationClip, TransformType};
use crate::ids::{LayerId, SolverId};
use crate::ik::{Side, SolveStatus, Solver};
use crate::interp::functions::{lerp_vec3, slerp_unit};
use crate::sampling::sample_track;
use crate::skeleton::Skeleton;

/// Role of a layer; decides which notetracks drive it and its default weight.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerTag {
    /// Main clip. Always fully applied.
    Base,
    /// Finger pose for one hand, driven by `fingers_*` notetracks.
    HandPose(Side),
    /// Plain additive layer. Always fully applied.
    Additive,
    /// Plain absolute layer. Always fully applied.
    Override,
    /// Gesture layer, driven by `gesture_*` notetracks.
    Gesture,
    /// Additive gesture pose, driven by `gesture_*` notetracks.
    GesturePose,
}

impl LayerTag {
    #[inline]
    pub fn is_gesture(self) -> bool {
        matches!(self, LayerTag::Gesture | LayerTag::GesturePose)
    }

    /// Notetrack-driven layers start with an empty curve and stay silent
    /// until an event brackets them; the rest apply at full weight.
    pub fn default_weight(self) -> LayerWeight {
        match self {
            LayerTag::Base | LayerTag::Additive | LayerTag::Override => LayerWeight::Constant(1.0),
            LayerTag::HandPose(_) | LayerTag::Gesture | LayerTag::GesturePose => {
                LayerWeight::curve()
            }
        }
    }
}

/// Where a layer's per-frame weight comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum LayerWeight {
    Constant(f32),
    Curve {
        curve: WeightCurve,
        cursor: CurveCursor,
    },
}

impl LayerWeight {
    pub fn curve() -> Self {
        LayerWeight::Curve {
            curve: WeightCurve::new(),
            cursor: CurveCursor::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Layer {
    name: String,
    tag: LayerTag,
    clip: AnimationClip,
    bindings: BindingSet,
    weight: LayerWeight,
}

impl Layer {
    /// Bind `clip` to `skeleton`. Tracks for bones the skeleton lacks are skipped.
    pub fn new(
        name: impl Into<String>,
        clip: AnimationClip,
        tag: LayerTag,
        skeleton: &Skeleton,
    ) -> Self {
        let name = name.into();
        let bindings = BindingSet::resolve(&clip, skeleton);
        if !bindings.unbound.is_empty() {
            warn!(
                "Layer '{}' ({}): {} track(s) have no matching bone: {}",
                name,
                clip.name,
                bindings.unbound.len(),
                bindings.unbound.join(", ")
            );
        }
        Self {
            name,
            weight: tag.default_weight(),
            tag,
            clip,
            bindings,
        }
    }

    pub fn with_weight(mut self, weight: LayerWeight) -> Self {
        self.weight = weight;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn tag(&self) -> LayerTag {
        self.tag
    }

    #[inline]
    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    #[inline]
    pub fn bindings(&self) -> &BindingSet {
        &self.bindings
    }

    #[inline]
    pub fn weight_source(&self) -> &LayerWeight {
        &self.weight
    }

    pub fn curve(&self) -> Option<&WeightCurve> {
        match &self.weight {
            LayerWeight::Curve { curve, .. } => Some(curve),
            LayerWeight::Constant(_) => None,
        }
    }

    pub fn curve_mut(&mut self) -> Option<&mut WeightCurve> {
        match &mut self.weight {
            LayerWeight::Curve { curve, .. } => Some(curve),
            LayerWeight::Constant(_) => None,
        }
    }

    pub fn reset_cursor(&mut self) {
        if let LayerWeight::Curve { cursor, .. } = &mut self.weight {
            cursor.reset();
        }
    }

    /// Weight at `frame`, advancing the cursor of curve-driven layers.
    pub fn weight_at(&mut self, frame: f32) -> f32 {
        match &mut self.weight {
            LayerWeight::Constant(w) => *w,
            LayerWeight::Curve { curve, cursor } => cursor.sample(curve, frame),
        }
    }

    /// Blend this layer's sample at `frame` into the skeleton's local transforms.
    /// World transforms are left stale; the player regenerates them.
    pub fn apply(&mut self, skeleton: &mut Skeleton, frame: f32) -> f32 {
        let w = self.weight_at(frame);
        if w == 0.0 {
            return 0.0;
        }
        for binding in &self.bindings.channels {
            let track = &self.clip.tracks[binding.track_idx as usize];
            let sample = sample_track(track, frame);
            let mode = self.clip.track_transform_type(track);
            let bone = skeleton.bone_mut(binding.bone);
            match mode {
                TransformType::Absolute | TransformType::Relative => {
                    if let Some(t) = sample.translation {
                        let t = if mode == TransformType::Relative {
                            bone.base_local_translation + t
                        } else {
                            t
                        };
                        bone.local_translation = lerp_vec3(&bone.local_translation, &t, w);
                    }
                    if let Some(r) = sample.rotation {
                        bone.local_rotation = slerp_unit(&bone.local_rotation, &r, w);
                    }
                }
                TransformType::Additive => {
                    if let Some(t) = sample.translation {
                        bone.local_translation += t * w;
                    }
                    if let Some(r) = sample.rotation {
                        let delta = slerp_unit(&UnitQuaternion::identity(), &r, w);
                        bone.local_rotation *= delta;
                    }
                }
            }
        }
        w
    }
}

/// Per-frame summary, mostly for tests and diagnostics.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    pub frame: u32,
    pub layer_weights: Vec<f32>,
    pub solves: Vec<SolveStatus>,
}

#[derive(Debug)]
pub struct CompositionPlayer {
    name: String,
    skeleton: Skeleton,
    layers: Vec<Layer>,
    solvers: Vec<Solver>,
    last_update: Option<u32>,
}

impl CompositionPlayer {
    pub fn new(name: impl Into<String>, skeleton: Skeleton) -> Self {
        Self {
            name: name.into(),
            skeleton,
            layers: Vec::new(),
            solvers: Vec::new(),
            last_update: None,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_layer(&mut self, layer: Layer) -> LayerId {
        let id = LayerId(self.layers.len() as u32);
        self.layers.push(layer);
        id
    }

    pub fn add_solver(&mut self, solver: impl Into<Solver>) -> SolverId {
        let id = SolverId(self.solvers.len() as u32);
        self.solvers.push(solver.into());
        id
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(id.0 as usize)
    }

    pub fn solver(&self, id: SolverId) -> Option<&Solver> {
        self.solvers.get(id.0 as usize)
    }

    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[inline]
    pub fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    #[inline]
    pub fn solvers(&self) -> &[Solver] {
        &self.solvers
    }

    #[inline]
    pub fn solvers_mut(&mut self) -> &mut [Solver] {
        &mut self.solvers
    }

    /// Layers and solvers borrowed together, for passes that write to both.
    pub fn targets_mut(&mut self) -> (&mut [Layer], &mut [Solver]) {
        (&mut self.layers, &mut self.solvers)
    }

    #[inline]
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    #[inline]
    pub fn skeleton_mut(&mut self) -> &mut Skeleton {
        &mut self.skeleton
    }

    pub fn into_skeleton(self) -> Skeleton {
        self.skeleton
    }

    /// Highest keyframe across every layer clip.
    pub fn last_frame(&self) -> u32 {
        self.layers
            .iter()
            .map(|l| l.clip.last_frame())
            .max()
            .unwrap_or(0)
    }

    /// Number of frames a full pass visits (`0..=last_frame`).
    pub fn frame_count(&self) -> u32 {
        self.last_frame() + 1
    }

    /// Rewind every layer and solver cursor.
    pub fn rewind(&mut self) {
        for layer in &mut self.layers {
            layer.reset_cursor();
        }
        for solver in &mut self.solvers {
            solver.reset_cursor();
        }
        self.last_update = None;
    }

    /// Compose the pose for `frame`.
    pub fn update(&mut self, frame: u32) -> FrameReport {
        if frame == 0 || self.last_update.is_some_and(|last| frame < last) {
            self.rewind();
        }
        self.last_update = Some(frame);
        let time = frame as f32;

        self.skeleton.reset_to_bind_pose();

        let mut layer_weights = Vec::with_capacity(self.layers.len());
        for layer in &mut self.layers {
            layer_weights.push(layer.apply(&mut self.skeleton, time));
        }
        self.skeleton.update_world_transforms();

        let mut solves = Vec::with_capacity(self.solvers.len());
        for solver in &mut self.solvers {
            solves.push(solver.update(&mut self.skeleton, time));
        }

        FrameReport {
            frame,
            layer_weights,
            solves,
        }
    }
}
