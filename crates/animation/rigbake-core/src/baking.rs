//! Baking API: run a composition player over its whole frame range and record
//! every bone's local transform into an absolute clip.

use serde::{Deserialize, Serialize};

use crate::data::{AnimationClip, BoneTrack, TransformType};
use crate::interp::functions::{quat_to_array, vec3_to_array};
use crate::notetracks::is_control_event;
use crate::player::{CompositionPlayer, Layer};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BakingConfig {
    /// Name of the output clip.
    pub name: String,
    /// Frame rate stored on the output clip. Frames are sampled one per
    /// integer frame regardless.
    pub framerate: f32,
}

impl Default for BakingConfig {
    fn default() -> Self {
        Self {
            name: "baked".to_string(),
            framerate: 30.0,
        }
    }
}

/// Bake frames `0..=player.last_frame()`: one translation and one rotation
/// key per bone per frame, no key reduction. Notetracks are not copied; see
/// [`copy_passthrough_notetracks`].
pub fn bake(player: &mut CompositionPlayer, cfg: &BakingConfig) -> AnimationClip {
    let mut out = AnimationClip::new(cfg.name.clone());
    out.framerate = cfg.framerate;
    out.transform_type = TransformType::Absolute;

    let frames = player.frame_count();
    out.tracks = player
        .skeleton()
        .bones()
        .iter()
        .map(|bone| {
            let mut track = BoneTrack::new(bone.name.clone());
            track.translations.reserve(frames as usize);
            track.rotations.reserve(frames as usize);
            track
        })
        .collect();

    player.rewind();
    for frame in 0..frames {
        player.update(frame);
        for (track, bone) in out.tracks.iter_mut().zip(player.skeleton().bones()) {
            track.add_translation_frame(frame as f32, vec3_to_array(&bone.local_translation));
            track.add_rotation_frame(frame as f32, quat_to_array(&bone.local_rotation));
        }
    }
    out
}

/// Copy every notetrack of every layer clip that is not a control event.
/// Same-named notetracks merge; frames keep source order.
pub fn copy_passthrough_notetracks(layers: &[Layer], out: &mut AnimationClip) {
    for layer in layers {
        for notetrack in &layer.clip().notetracks {
            if !is_control_event(&notetrack.name) {
                out.create_notetrack(&notetrack.name, &notetrack.frames);
            }
        }
    }
}

/// Export a baked clip as serde_json::Value (stable schema for tooling).
pub fn export_baked_json(baked: &AnimationClip) -> serde_json::Value {
    serde_json::to_value(baked).unwrap_or(serde_json::Value::Null)
}
