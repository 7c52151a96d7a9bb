//! JSON documents for skeletons and clips.
//!
//! Clips serialize directly from [`AnimationClip`]. Skeletons use a flat
//! document where bones list their parent by name, parents first:
//!
//! ```json
//! { "bones": [
//!     { "name": "j_shoulder_le", "translation": [0, 1.4, 0] },
//!     { "name": "j_elbow_le", "parent": "j_shoulder_le", "translation": [0.3, 0, 0] }
//! ] }
//! ```
//!
//! Rotations are `[x, y, z, w]` and default to identity.

use serde::{Deserialize, Serialize};

use crate::data::AnimationClip;
use crate::error::{CoreError, Result};
use crate::interp::functions::{quat_from_array, quat_to_array, vec3_from_array, vec3_to_array};
use crate::skeleton::Skeleton;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SkeletonDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub bones: Vec<StoredBone>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredBone {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub translation: [f32; 3],
    #[serde(default = "identity_rotation")]
    pub rotation: [f32; 4],
}

fn identity_rotation() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

impl SkeletonDocument {
    /// Build the arena skeleton. A parent must appear before its children.
    pub fn into_skeleton(self) -> Result<Skeleton> {
        if self.bones.is_empty() {
            return Err(CoreError::InvalidSkeleton {
                reason: "document has no bones".into(),
            });
        }
        let mut skeleton = Skeleton::new();
        for bone in self.bones {
            if bone.name.trim().is_empty() {
                return Err(CoreError::InvalidSkeleton {
                    reason: "bone with empty name".into(),
                });
            }
            skeleton.add_bone_with_parent_name(
                bone.name,
                bone.parent.as_deref(),
                vec3_from_array(bone.translation),
                quat_from_array(bone.rotation),
            )?;
        }
        Ok(skeleton)
    }

    /// Bind pose of `skeleton` as a document.
    pub fn from_skeleton(skeleton: &Skeleton) -> Self {
        let bones = skeleton
            .bones()
            .iter()
            .map(|bone| StoredBone {
                name: bone.name.clone(),
                parent: bone.parent.map(|p| skeleton.bone(p).name.clone()),
                translation: vec3_to_array(&bone.base_local_translation),
                rotation: quat_to_array(&bone.base_local_rotation),
            })
            .collect();
        Self { name: None, bones }
    }
}

/// Parse a skeleton document.
pub fn parse_skeleton_json(s: &str) -> Result<Skeleton> {
    let doc: SkeletonDocument = serde_json::from_str(s)?;
    doc.into_skeleton()
}

/// Parse a clip and run basic validation.
pub fn parse_clip_json(s: &str) -> Result<AnimationClip> {
    let clip: AnimationClip = serde_json::from_str(s)?;
    clip.validate_basic().map_err(|reason| CoreError::InvalidClip {
        clip: clip.name.clone(),
        reason,
    })?;
    Ok(clip)
}

pub fn clip_to_json(clip: &AnimationClip) -> Result<String> {
    Ok(serde_json::to_string_pretty(clip)?)
}
