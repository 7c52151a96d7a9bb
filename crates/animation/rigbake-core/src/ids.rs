//! Identifiers for core entities.

use serde::{Deserialize, Serialize};

/// Index of a bone inside its owning `Skeleton` arena.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoneId(pub u32);

impl BoneId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct LayerId(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SolverId(pub u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bone_id_indexes_its_arena() {
        assert_eq!(BoneId(7).index(), 7);
        assert!(BoneId(1) < BoneId(2));
    }
}
