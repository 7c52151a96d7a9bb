//! Core configuration for rigbake-core.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Names of the four bones that make up one two-bone IK chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IkChainSettings {
    pub start_bone: String,
    pub mid_bone: String,
    pub end_bone: String,
    pub target_bone: String,
}

impl IkChainSettings {
    pub fn new(
        start_bone: impl Into<String>,
        mid_bone: impl Into<String>,
        end_bone: impl Into<String>,
        target_bone: impl Into<String>,
    ) -> Self {
        Self {
            start_bone: start_bone.into(),
            mid_bone: mid_bone.into(),
            end_bone: end_bone.into(),
            target_bone: target_bone.into(),
        }
    }

    /// Default left arm chain of the viewmodel rigs this tool targets.
    pub fn left_hand() -> Self {
        Self::new("j_shoulder_le", "j_elbow_le", "j_wrist_le", "tag_ik_loc_le")
    }

    /// Default right arm chain.
    pub fn right_hand() -> Self {
        Self::new("j_shoulder_ri", "j_elbow_ri", "j_wrist_ri", "tag_ik_loc_ri")
    }

    /// Copy of these settings with the target bone replaced, if one is given.
    pub fn with_target_override(&self, target: Option<&str>) -> Self {
        let mut out = self.clone();
        if let Some(t) = target.filter(|t| !t.trim().is_empty()) {
            out.target_bone = t.to_string();
        }
        out
    }
}

/// How the output file name is assembled: `prefix + name + suffix + format`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputNaming {
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
    /// File extension including the dot, also used to pick the translator.
    pub format: String,
}

impl Default for OutputNaming {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            suffix: String::new(),
            format: ".json".to_string(),
        }
    }
}

impl OutputNaming {
    pub fn file_name(&self, name: &str) -> String {
        format!("{}{}{}{}", self.prefix, name, self.suffix, self.format)
    }
}

/// Configuration shared by every conversion of a session.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub left_ik: IkChainSettings,
    pub right_ik: IkChainSettings,

    /// Margin kept between the IK reach and the fully extended chain length.
    pub reach_epsilon: f32,

    /// Framerate written to baked clips when a job does not set one.
    pub default_framerate: f32,

    pub output: OutputNaming,

    /// Treat the base clip as relative to the bind pose regardless of its tag.
    /// Older viewmodel exports store base clips this way.
    pub force_relative_base: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            left_ik: IkChainSettings::left_hand(),
            right_ik: IkChainSettings::right_hand(),
            reach_epsilon: 1e-4,
            default_framerate: 30.0,
            output: OutputNaming::default(),
            force_relative_base: false,
        }
    }
}

impl Config {
    /// Parse a config from JSON; missing fields fall back to defaults.
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}
