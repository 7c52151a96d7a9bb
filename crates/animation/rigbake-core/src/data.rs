//! Canonical animation clip model shared by source layers and baked output.

use serde::{Deserialize, Serialize};

/// How a clip's keys combine with the pose already on the skeleton.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformType {
    /// Keys are full local transforms and replace the current pose.
    #[default]
    Absolute,
    /// Translations are offsets from the bind pose; rotations are absolute.
    Relative,
    /// Keys are deltas added on top of the current pose.
    Additive,
}

/// Translation key: `[x, y, z]` at a (possibly fractional) frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TranslationKey {
    pub frame: f32,
    pub value: [f32; 3],
}

/// Rotation key: quaternion `[x, y, z, w]` at a (possibly fractional) frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotationKey {
    pub frame: f32,
    pub value: [f32; 4],
}

/// Keys for one bone, addressed by bone name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoneTrack {
    pub bone: String,
    /// Per-track override of the clip's transform type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform_type: Option<TransformType>,
    #[serde(default)]
    pub translations: Vec<TranslationKey>,
    #[serde(default)]
    pub rotations: Vec<RotationKey>,
}

impl BoneTrack {
    pub fn new(bone: impl Into<String>) -> Self {
        Self {
            bone: bone.into(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn add_translation_frame(&mut self, frame: f32, value: [f32; 3]) {
        self.translations.push(TranslationKey { frame, value });
    }

    #[inline]
    pub fn add_rotation_frame(&mut self, frame: f32, value: [f32; 4]) {
        self.rotations.push(RotationKey { frame, value });
    }

    /// Last keyed frame of either channel.
    pub fn last_frame(&self) -> Option<f32> {
        let t = self.translations.last().map(|k| k.frame);
        let r = self.rotations.last().map(|k| k.frame);
        match (t, r) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }
}

/// A named timeline event with one or more integer frame occurrences.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notetrack {
    pub name: String,
    #[serde(default)]
    pub frames: Vec<u32>,
}

impl Notetrack {
    pub fn new(name: impl Into<String>, frames: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            frames,
        }
    }
}

fn default_framerate() -> f32 {
    30.0
}

/// Skeletal animation clip: per-bone keys plus notetracks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    pub name: String,
    #[serde(default = "default_framerate")]
    pub framerate: f32,
    #[serde(default)]
    pub transform_type: TransformType,
    #[serde(default)]
    pub tracks: Vec<BoneTrack>,
    #[serde(default)]
    pub notetracks: Vec<Notetrack>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            framerate: default_framerate(),
            transform_type: TransformType::Absolute,
            tracks: Vec::new(),
            notetracks: Vec::new(),
        }
    }

    /// Transform type a given track samples with.
    #[inline]
    pub fn track_transform_type(&self, track: &BoneTrack) -> TransformType {
        track.transform_type.unwrap_or(self.transform_type)
    }

    /// Force the clip and every track to one transform type.
    pub fn force_transform_type(&mut self, transform_type: TransformType) {
        self.transform_type = transform_type;
        for track in &mut self.tracks {
            track.transform_type = Some(transform_type);
        }
    }

    pub fn track(&self, bone: &str) -> Option<&BoneTrack> {
        self.tracks.iter().find(|t| t.bone == bone)
    }

    /// Find the track for `bone`, creating an empty one if absent.
    pub fn track_mut_or_insert(&mut self, bone: &str) -> &mut BoneTrack {
        let idx = match self.tracks.iter().position(|t| t.bone == bone) {
            Some(idx) => idx,
            None => {
                self.tracks.push(BoneTrack::new(bone));
                self.tracks.len() - 1
            }
        };
        &mut self.tracks[idx]
    }

    /// Append frames to the notetrack called `name`, creating it if needed.
    pub fn create_notetrack(&mut self, name: &str, frames: &[u32]) {
        match self.notetracks.iter_mut().find(|n| n.name == name) {
            Some(existing) => existing.frames.extend_from_slice(frames),
            None => self.notetracks.push(Notetrack::new(name, frames.to_vec())),
        }
    }

    /// Highest frame referenced by any key or notetrack occurrence.
    pub fn last_frame(&self) -> u32 {
        let keyed = self
            .tracks
            .iter()
            .filter_map(BoneTrack::last_frame)
            .fold(0.0f32, f32::max);
        let noted = self
            .notetracks
            .iter()
            .flat_map(|n| n.frames.iter().copied())
            .max()
            .unwrap_or(0);
        (keyed.max(0.0).ceil() as u32).max(noted)
    }

    /// Validate basic invariants (non-decreasing finite key frames, positive framerate).
    pub fn validate_basic(&self) -> Result<(), String> {
        if !self.framerate.is_finite() || self.framerate <= 0.0 {
            return Err(format!("framerate must be > 0, got {}", self.framerate));
        }
        for track in &self.tracks {
            if track.bone.trim().is_empty() {
                return Err("track with empty bone name".into());
            }
            check_frames(&track.bone, track.translations.iter().map(|k| k.frame))?;
            check_frames(&track.bone, track.rotations.iter().map(|k| k.frame))?;
            if track
                .translations
                .iter()
                .any(|k| k.value.iter().any(|c| !c.is_finite()))
                || track
                    .rotations
                    .iter()
                    .any(|k| k.value.iter().any(|c| !c.is_finite()))
            {
                return Err(format!("non-finite key value on '{}'", track.bone));
            }
        }
        Ok(())
    }
}

fn check_frames(bone: &str, frames: impl Iterator<Item = f32>) -> Result<(), String> {
    let mut last = f32::NEG_INFINITY;
    for f in frames {
        if !f.is_finite() || f < 0.0 {
            return Err(format!("key frame must be finite and >= 0 for '{bone}'"));
        }
        if f < last {
            return Err(format!("key frames must be non-decreasing for '{bone}'"));
        }
        last = f;
    }
    Ok(())
}
