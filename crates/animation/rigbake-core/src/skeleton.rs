//! Arena skeleton: bones addressed by `BoneId`, parents stored as indices.
//!
//! Bones are kept in insertion order and a parent must be added before its
//! children, so a single forward pass regenerates every world transform.

use hashbrown::HashMap;
use nalgebra::{UnitQuaternion, Vector3};

use crate::binding::TargetResolver;
use crate::error::{CoreError, Result};
use crate::ids::BoneId;

#[derive(Clone, Debug, PartialEq)]
pub struct Bone {
    pub name: String,
    pub parent: Option<BoneId>,

    /// Bind pose, restored once per output frame.
    pub base_local_translation: Vector3<f32>,
    pub base_local_rotation: UnitQuaternion<f32>,

    pub local_translation: Vector3<f32>,
    pub local_rotation: UnitQuaternion<f32>,
    pub world_translation: Vector3<f32>,
    pub world_rotation: UnitQuaternion<f32>,
}

impl Bone {
    fn new(
        name: String,
        parent: Option<BoneId>,
        translation: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
    ) -> Self {
        Self {
            name,
            parent,
            base_local_translation: translation,
            base_local_rotation: rotation,
            local_translation: translation,
            local_rotation: rotation,
            world_translation: translation,
            world_rotation: rotation,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Skeleton {
    bones: Vec<Bone>,
    by_name: HashMap<String, BoneId>,
    /// Dirty flags reused by `update_world_subtree` across calls.
    subtree_scratch: Vec<bool>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    #[inline]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    #[inline]
    pub fn bone(&self, id: BoneId) -> &Bone {
        &self.bones[id.index()]
    }

    #[inline]
    pub fn bone_mut(&mut self, id: BoneId) -> &mut Bone {
        &mut self.bones[id.index()]
    }

    pub fn ids(&self) -> impl Iterator<Item = BoneId> + '_ {
        (0..self.bones.len() as u32).map(BoneId)
    }

    /// Look up a bone by name. With duplicate names the first one added wins.
    pub fn find(&self, name: &str) -> Option<BoneId> {
        self.by_name.get(name).copied()
    }

    /// Append a bone with its bind pose. World transforms are regenerated for it.
    pub fn add_bone(
        &mut self,
        name: impl Into<String>,
        parent: Option<BoneId>,
        translation: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
    ) -> Result<BoneId> {
        let name = name.into();
        if let Some(p) = parent {
            if p.index() >= self.bones.len() {
                return Err(CoreError::UnknownParent {
                    bone: name,
                    parent: format!("#{}", p.0),
                });
            }
        }
        let id = BoneId(self.bones.len() as u32);
        self.by_name.entry(name.clone()).or_insert(id);
        self.bones.push(Bone::new(name, parent, translation, rotation));
        self.update_world_transform(id);
        Ok(id)
    }

    /// Same as `add_bone`, resolving the parent by name.
    pub fn add_bone_with_parent_name(
        &mut self,
        name: impl Into<String>,
        parent: Option<&str>,
        translation: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
    ) -> Result<BoneId> {
        let name = name.into();
        let parent = match parent {
            Some(p) => Some(self.find(p).ok_or_else(|| CoreError::UnknownParent {
                bone: name.clone(),
                parent: p.to_string(),
            })?),
            None => None,
        };
        self.add_bone(name, parent, translation, rotation)
    }

    /// Whether `ancestor` lies on the parent chain of `bone` (or is `bone`).
    pub fn is_ancestor_or_self(&self, ancestor: BoneId, bone: BoneId) -> bool {
        let mut cur = Some(bone);
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.bones[id.index()].parent;
        }
        false
    }

    /// Restore every bone's local transform to the bind pose and regenerate worlds.
    pub fn reset_to_bind_pose(&mut self) {
        for bone in &mut self.bones {
            bone.local_translation = bone.base_local_translation;
            bone.local_rotation = bone.base_local_rotation;
        }
        self.update_world_transforms();
    }

    /// Replace every bind pose with the identity transform, then reset to it.
    pub fn zero_bind_pose(&mut self) {
        for bone in &mut self.bones {
            bone.base_local_translation = Vector3::zeros();
            bone.base_local_rotation = UnitQuaternion::identity();
        }
        self.reset_to_bind_pose();
    }

    /// Regenerate all world transforms in one top-down pass.
    pub fn update_world_transforms(&mut self) {
        for idx in 0..self.bones.len() {
            self.update_world_transform(BoneId(idx as u32));
        }
    }

    /// Regenerate a single bone's world transform from its parent's world and its local.
    pub fn update_world_transform(&mut self, id: BoneId) {
        let (parent_t, parent_r) = match self.bones[id.index()].parent {
            Some(p) => {
                let parent = &self.bones[p.index()];
                (parent.world_translation, parent.world_rotation)
            }
            None => (Vector3::zeros(), UnitQuaternion::identity()),
        };
        let bone = &mut self.bones[id.index()];
        bone.world_translation = parent_t + parent_r * bone.local_translation;
        bone.world_rotation = parent_r * bone.local_rotation;
    }

    /// Regenerate the world transform of `id` and of every descendant.
    pub fn update_world_subtree(&mut self, id: BoneId) {
        let start = id.index();
        let mut dirty = std::mem::take(&mut self.subtree_scratch);
        dirty.clear();
        dirty.resize(self.bones.len() - start, false);
        dirty[0] = true;
        self.update_world_transform(id);
        for idx in (start + 1)..self.bones.len() {
            let is_dirty = match self.bones[idx].parent {
                Some(p) if p.index() >= start => dirty[p.index() - start],
                _ => false,
            };
            if is_dirty {
                dirty[idx - start] = true;
                self.update_world_transform(BoneId(idx as u32));
            }
        }
        self.subtree_scratch = dirty;
    }

    /// Re-derive a bone's local transform from its current world transform.
    pub fn update_local_transform(&mut self, id: BoneId) {
        let (parent_t, parent_r) = match self.bones[id.index()].parent {
            Some(p) => {
                let parent = &self.bones[p.index()];
                (parent.world_translation, parent.world_rotation)
            }
            None => (Vector3::zeros(), UnitQuaternion::identity()),
        };
        let inv = parent_r.inverse();
        let bone = &mut self.bones[id.index()];
        bone.local_translation = inv * (bone.world_translation - parent_t);
        bone.local_rotation = inv * bone.world_rotation;
    }

    /// Set a bone's world rotation, then fix up its local rotation and descendants.
    pub fn set_world_rotation(&mut self, id: BoneId, rotation: UnitQuaternion<f32>) {
        self.bones[id.index()].world_rotation = rotation;
        self.update_local_transform(id);
        self.update_world_subtree(id);
    }

    /// Append every bone of `part` under `attach_to`.
    ///
    /// The part's roots are re-parented under `attach_to` (or stay roots when
    /// it is `None`). Part roots whose name collides with an existing bone are
    /// renamed with a numeric suffix so lookups keep resolving the original.
    pub fn attach(&mut self, part: &Skeleton, attach_to: Option<BoneId>) -> Vec<BoneId> {
        let offset = self.bones.len() as u32;
        let mut added = Vec::with_capacity(part.len());
        for (idx, bone) in part.bones.iter().enumerate() {
            let parent = match bone.parent {
                Some(p) => Some(BoneId(p.0 + offset)),
                None => attach_to,
            };
            let mut name = bone.name.clone();
            if bone.parent.is_none() && self.by_name.contains_key(&name) {
                name = format!("{name}_{}", offset as usize + idx);
            }
            let id = BoneId(self.bones.len() as u32);
            self.by_name.entry(name.clone()).or_insert(id);
            self.bones.push(Bone::new(
                name,
                parent,
                bone.base_local_translation,
                bone.base_local_rotation,
            ));
            added.push(id);
        }
        self.update_world_transforms();
        added
    }
}

impl TargetResolver for Skeleton {
    fn resolve(&self, path: &str) -> Option<BoneId> {
        self.find(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn arm() -> (Skeleton, [BoneId; 3]) {
        let mut sk = Skeleton::new();
        let root = sk
            .add_bone("root", None, Vector3::zeros(), UnitQuaternion::identity())
            .unwrap();
        let mid = sk
            .add_bone(
                "mid",
                Some(root),
                Vector3::new(1.0, 0.0, 0.0),
                UnitQuaternion::identity(),
            )
            .unwrap();
        let tip = sk
            .add_bone(
                "tip",
                Some(mid),
                Vector3::new(1.0, 0.0, 0.0),
                UnitQuaternion::identity(),
            )
            .unwrap();
        (sk, [root, mid, tip])
    }

    #[test]
    fn world_follows_parent_rotation() {
        let (mut sk, [root, _, tip]) = arm();
        sk.bone_mut(root).local_rotation =
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        sk.update_world_subtree(root);
        let w = sk.bone(tip).world_translation;
        assert!((w - Vector3::new(0.0, 2.0, 0.0)).norm() < 1e-5, "{w:?}");
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let mut sk = Skeleton::new();
        let err = sk
            .add_bone("orphan", Some(BoneId(3)), Vector3::zeros(), UnitQuaternion::identity())
            .unwrap_err();
        assert_eq!(err.category(), "skeleton");
    }

    #[test]
    fn set_world_rotation_rederives_local() {
        let (mut sk, [root, mid, _]) = arm();
        let quarter = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        sk.bone_mut(root).local_rotation = quarter;
        sk.update_world_transforms();
        sk.set_world_rotation(mid, quarter);
        assert!(sk.bone(mid).local_rotation.angle() < 1e-5);
    }

    #[test]
    fn attach_renames_colliding_root() {
        let (mut sk, [_, _, tip]) = arm();
        let (part, _) = arm();
        let added = sk.attach(&part, Some(tip));
        assert_eq!(added.len(), 3);
        assert_eq!(sk.find("root"), Some(BoneId(0)));
        assert_eq!(sk.bone(added[0]).name, "root_3");
        assert_eq!(sk.bone(added[0]).parent, Some(tip));
        assert!(sk.is_ancestor_or_self(tip, added[2]));
    }

    #[test]
    fn subtree_update_touches_only_descendants_across_calls() {
        let mut sk = Skeleton::new();
        let id = UnitQuaternion::identity();
        let root = sk.add_bone("root", None, Vector3::zeros(), id).unwrap();
        let a = sk
            .add_bone("a", Some(root), Vector3::new(1.0, 0.0, 0.0), id)
            .unwrap();
        let b = sk
            .add_bone("b", Some(root), Vector3::new(0.0, 1.0, 0.0), id)
            .unwrap();
        let a1 = sk
            .add_bone("a1", Some(a), Vector3::new(1.0, 0.0, 0.0), id)
            .unwrap();
        let b1 = sk
            .add_bone("b1", Some(b), Vector3::new(0.0, 1.0, 0.0), id)
            .unwrap();

        // Flags every bone as dirty in the reused buffer.
        sk.update_world_subtree(root);

        sk.bone_mut(a1).local_translation = Vector3::new(2.0, 0.0, 0.0);
        sk.bone_mut(b1).local_translation = Vector3::new(0.0, 2.0, 0.0);
        sk.update_world_subtree(a);

        assert_eq!(sk.bone(a1).world_translation, Vector3::new(3.0, 0.0, 0.0));
        // Stale flags from the previous call must not reach the other branch.
        assert_eq!(sk.bone(b1).world_translation, Vector3::new(0.0, 2.0, 0.0));

        sk.update_world_subtree(b1);
        assert_eq!(sk.bone(b1).world_translation, Vector3::new(0.0, 3.0, 0.0));
    }

    #[test]
    fn bind_pose_reset_restores_locals() {
        let (mut sk, [_, mid, _]) = arm();
        sk.bone_mut(mid).local_translation = Vector3::new(5.0, 0.0, 0.0);
        sk.reset_to_bind_pose();
        assert_eq!(sk.bone(mid).local_translation, Vector3::new(1.0, 0.0, 0.0));
    }
}
