//! Binding of clip tracks to skeleton bones.
//!
//! Tracks address bones by name. Each layer resolves its clip once, when it
//! is created, into a `BindingSet` of (track index, bone) rows so the
//! per-frame loop never touches strings.

use crate::data::AnimationClip;
use crate::ids::BoneId;

/// Trait for resolving bone names to bone handles.
pub trait TargetResolver {
    fn resolve(&self, path: &str) -> Option<BoneId>;
}

/// One resolved channel: a clip track driving a bone.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Binding {
    pub track_idx: u32,
    pub bone: BoneId,
}

/// Per-layer view over the bound channels of its clip.
#[derive(Clone, Debug, Default)]
pub struct BindingSet {
    pub channels: Vec<Binding>,
    /// Bone names present in the clip but not in the skeleton.
    pub unbound: Vec<String>,
}

impl BindingSet {
    /// Resolve every track of `clip` against `resolver`.
    pub fn resolve(clip: &AnimationClip, resolver: &dyn TargetResolver) -> Self {
        let mut set = BindingSet::default();
        for (idx, track) in clip.tracks.iter().enumerate() {
            match resolver.resolve(&track.bone) {
                Some(bone) => set.channels.push(Binding {
                    track_idx: idx as u32,
                    bone,
                }),
                None => set.unbound.push(track.bone.clone()),
            }
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }
}
