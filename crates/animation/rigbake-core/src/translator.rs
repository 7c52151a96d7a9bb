//! Asset translators: the boundary between on-disk formats and the clip and
//! skeleton model.
//!
//! Only JSON ships here. Other formats plug in by implementing
//! [`AssetTranslator`] and registering with a [`TranslatorFactory`] under
//! their file extension.

use std::fs;
use std::path::Path;

use hashbrown::HashMap;
use log::debug;

use crate::data::AnimationClip;
use crate::error::{CoreError, Result};
use crate::skeleton::Skeleton;
use crate::stored::{clip_to_json, parse_clip_json, parse_skeleton_json};

/// Loads and saves clips and skeletons in one file format.
pub trait AssetTranslator {
    fn load_clip(&self, path: &Path) -> Result<AnimationClip>;
    fn save_clip(&self, path: &Path, clip: &AnimationClip) -> Result<()>;
    fn load_skeleton(&self, path: &Path) -> Result<Skeleton>;
}

/// JSON documents as defined in [`crate::stored`].
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonTranslator;

impl JsonTranslator {
    fn read(path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| CoreError::io(path, e))
    }
}

impl AssetTranslator for JsonTranslator {
    fn load_clip(&self, path: &Path) -> Result<AnimationClip> {
        debug!("Loading clip {}", path.display());
        parse_clip_json(&Self::read(path)?)
    }

    /// Writes the clip, creating missing parent directories.
    fn save_clip(&self, path: &Path, clip: &AnimationClip) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CoreError::io(parent, e))?;
        }
        let json = clip_to_json(clip)?;
        fs::write(path, json).map_err(|e| CoreError::io(path, e))
    }

    fn load_skeleton(&self, path: &Path) -> Result<Skeleton> {
        debug!("Loading skeleton {}", path.display());
        parse_skeleton_json(&Self::read(path)?)
    }
}

/// Picks a translator by file extension (case-insensitive, with the dot).
#[derive(Default)]
pub struct TranslatorFactory {
    translators: HashMap<String, Box<dyn AssetTranslator>>,
}

impl std::fmt::Debug for TranslatorFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut exts: Vec<_> = self.translators.keys().collect();
        exts.sort();
        f.debug_struct("TranslatorFactory")
            .field("extensions", &exts)
            .finish()
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_ascii_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

impl TranslatorFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_translators() -> Self {
        let mut factory = Self::new();
        factory.register(".json", JsonTranslator);
        factory
    }

    /// Register `translator` for `extension` (`"json"` and `".json"` are equivalent).
    /// Replaces any earlier registration.
    pub fn register(&mut self, extension: &str, translator: impl AssetTranslator + 'static) {
        self.translators
            .insert(normalize_extension(extension), Box::new(translator));
    }

    pub fn supports(&self, path: &Path) -> bool {
        self.for_path(path).is_ok()
    }

    pub fn for_path(&self, path: &Path) -> Result<&dyn AssetTranslator> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| self.translators.get(&normalize_extension(e)))
            .map(|t| t.as_ref())
            .ok_or_else(|| CoreError::UnsupportedFormat {
                path: path.display().to_string(),
            })
    }
}

/// Dispatches each call to the translator registered for the path's extension.
impl AssetTranslator for TranslatorFactory {
    fn load_clip(&self, path: &Path) -> Result<AnimationClip> {
        self.for_path(path)?.load_clip(path)
    }

    fn save_clip(&self, path: &Path, clip: &AnimationClip) -> Result<()> {
        self.for_path(path)?.save_clip(path, clip)
    }

    fn load_skeleton(&self, path: &Path) -> Result<Skeleton> {
        self.for_path(path)?.load_skeleton(path)
    }
}
