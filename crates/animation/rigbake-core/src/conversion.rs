//! End-to-end conversion: load a main clip plus optional hand poses and
//! extra layers, wire IK chains, compile notetracks, bake and save.
//!
//! Fatal problems (missing main clip path or output folder, unreadable or
//! invalid clips) fail before any baking. Missing IK bones only skip that
//! chain.

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::baking::{bake, copy_passthrough_notetracks, BakingConfig};
use crate::config::{Config, IkChainSettings};
use crate::data::{AnimationClip, TransformType};
use crate::error::{CoreError, Result};
use crate::ik::{Side, TwoBoneIkSolver};
use crate::notetracks::{CompileSummary, NotetrackCompiler};
use crate::player::{CompositionPlayer, Layer, LayerTag};
use crate::skeleton::Skeleton;
use crate::translator::AssetTranslator;

/// Kind of an extra layer stacked after the hand poses.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    /// Forced additive, always applied.
    Additive,
    /// Gesture layer, keeps its own transform type, notetrack driven.
    Gesture,
    /// Forced additive gesture layer, notetrack driven.
    GesturePose,
    /// Keeps its own transform type, always applied.
    Override,
}

impl LayerKind {
    fn tag(self) -> LayerTag {
        match self {
            LayerKind::Additive => LayerTag::Additive,
            LayerKind::Gesture => LayerTag::Gesture,
            LayerKind::GesturePose => LayerTag::GesturePose,
            LayerKind::Override => LayerTag::Override,
        }
    }

    fn forces_additive(self) -> bool {
        matches!(self, LayerKind::Additive | LayerKind::GesturePose)
    }

    fn layer_name(self) -> &'static str {
        match self {
            LayerKind::Additive => "additive",
            LayerKind::Gesture => "gesture",
            LayerKind::GesturePose => "gesturepose",
            LayerKind::Override => "override",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub path: PathBuf,
    pub kind: LayerKind,
}

/// One conversion request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionJob {
    pub main_clip: PathBuf,
    pub output_name: String,
    pub output_folder: PathBuf,
    /// Falls back to `Config::default_framerate`.
    pub output_framerate: Option<f32>,
    pub enable_left_ik: bool,
    pub enable_right_ik: bool,
    pub left_hand_pose: Option<PathBuf>,
    pub right_hand_pose: Option<PathBuf>,
    /// Replace the configured IK target bone for this job.
    pub left_target_override: Option<String>,
    pub right_target_override: Option<String>,
    pub layers: Vec<LayerSpec>,
}

impl Default for ConversionJob {
    fn default() -> Self {
        Self {
            main_clip: PathBuf::new(),
            output_name: String::new(),
            output_folder: PathBuf::new(),
            output_framerate: None,
            enable_left_ik: true,
            enable_right_ik: true,
            left_hand_pose: None,
            right_hand_pose: None,
            left_target_override: None,
            right_target_override: None,
            layers: Vec::new(),
        }
    }
}

impl ConversionJob {
    pub fn new(main_clip: impl Into<PathBuf>, output_folder: impl Into<PathBuf>) -> Self {
        let main_clip = main_clip.into();
        let output_name = main_clip
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            main_clip,
            output_name,
            output_folder: output_folder.into(),
            ..Self::default()
        }
    }

    /// Reject jobs missing their main clip or output folder.
    pub fn validate(&self) -> Result<()> {
        if self.main_clip.as_os_str().is_empty() {
            return Err(CoreError::MissingInput {
                what: "main animation clip".into(),
            });
        }
        if self.output_folder.as_os_str().is_empty() {
            return Err(CoreError::MissingInput {
                what: "output folder".into(),
            });
        }
        Ok(())
    }

    /// `output_folder / (prefix + name + suffix + format)`
    pub fn output_path(&self, config: &Config) -> PathBuf {
        self.output_folder
            .join(config.output.file_name(&self.output_name))
    }
}

#[derive(Clone, Debug)]
pub struct ConversionOutput {
    pub path: PathBuf,
    pub clip: AnimationClip,
    pub summary: CompileSummary,
}

fn load_clip(translator: &dyn AssetTranslator, path: &Path) -> Result<AnimationClip> {
    info!("Loading clip: {}", path.display());
    translator.load_clip(path)
}

fn create_solver(
    name: &str,
    side: Side,
    settings: &IkChainSettings,
    skeleton: &Skeleton,
    config: &Config,
) -> Option<TwoBoneIkSolver> {
    info!("Attempting to create IK solver: {name}");
    match TwoBoneIkSolver::from_settings(name, side, settings, skeleton, config.reach_epsilon) {
        Ok(solver) => {
            info!("Created IK solver: {name}");
            Some(solver)
        }
        Err(err) => {
            warn!("Skipping IK solver {name}: {err}");
            None
        }
    }
}

/// Build the player for `job` without baking it.
///
/// Layer order: main clip, left then right hand pose, extra layers in job
/// order. Solvers: left then right.
pub fn build_player(
    job: &ConversionJob,
    skeleton: &Skeleton,
    config: &Config,
    translator: &dyn AssetTranslator,
) -> Result<CompositionPlayer> {
    job.validate()?;
    let mut player = CompositionPlayer::new(job.output_name.clone(), skeleton.clone());

    let mut main = load_clip(translator, &job.main_clip)?;
    if config.force_relative_base {
        main.force_transform_type(TransformType::Relative);
    }
    player.add_layer(Layer::new("main", main, LayerTag::Base, skeleton));

    let poses = [
        (Side::Left, "pose_left", &job.left_hand_pose),
        (Side::Right, "pose_right", &job.right_hand_pose),
    ];
    for (side, name, path) in poses {
        match path {
            Some(path) => {
                let mut pose = load_clip(translator, path)?;
                pose.force_transform_type(TransformType::Additive);
                player.add_layer(Layer::new(name, pose, LayerTag::HandPose(side), skeleton));
            }
            None => info!("No {side:?} hand pose provided, skipping"),
        }
    }

    if job.enable_left_ik {
        let settings = config
            .left_ik
            .with_target_override(job.left_target_override.as_deref());
        if let Some(solver) = create_solver("left_ik", Side::Left, &settings, skeleton, config) {
            player.add_solver(solver);
        }
    }
    if job.enable_right_ik {
        let settings = config
            .right_ik
            .with_target_override(job.right_target_override.as_deref());
        if let Some(solver) = create_solver("right_ik", Side::Right, &settings, skeleton, config)
        {
            player.add_solver(solver);
        }
    }

    for extra in &job.layers {
        let mut clip = load_clip(translator, &extra.path)?;
        if extra.kind.forces_additive() {
            clip.force_transform_type(TransformType::Additive);
        }
        player.add_layer(Layer::new(
            extra.kind.layer_name(),
            clip,
            extra.kind.tag(),
            skeleton,
        ));
    }
    Ok(player)
}

/// Compose and bake `job` in memory.
pub fn convert(
    job: &ConversionJob,
    skeleton: &Skeleton,
    config: &Config,
    translator: &dyn AssetTranslator,
) -> Result<ConversionOutput> {
    info!("Attempting to convert: {}", job.main_clip.display());
    let mut player = build_player(job, skeleton, config, translator)?;

    let summary = NotetrackCompiler::new().compile(&mut player);

    info!(
        "Generating output animation with {} frames and {} bones",
        player.frame_count(),
        player.skeleton().len()
    );
    let cfg = BakingConfig {
        name: job.output_name.clone(),
        framerate: job.output_framerate.unwrap_or(config.default_framerate),
    };
    let mut clip = bake(&mut player, &cfg);
    copy_passthrough_notetracks(player.layers(), &mut clip);

    Ok(ConversionOutput {
        path: job.output_path(config),
        clip,
        summary,
    })
}

/// `convert`, then save the baked clip through `translator`.
pub fn run_conversion(
    job: &ConversionJob,
    skeleton: &Skeleton,
    config: &Config,
    translator: &dyn AssetTranslator,
) -> Result<ConversionOutput> {
    let output = convert(job, skeleton, config, translator)?;
    info!("Saving animation to: {}", output.path.display());
    translator.save_clip(&output.path, &output.clip)?;
    Ok(output)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartKind {
    ViewHands,
    Attachment,
}

/// A model file contributing bones to a merged skeleton.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub path: PathBuf,
    /// Bone of the merged skeleton to attach under. When absent the part's
    /// root name is looked up instead.
    #[serde(default)]
    pub parent_bone_tag: Option<String>,
    pub kind: PartKind,
}

/// Merge part skeletons in order.
///
/// Each part's roots attach under `parent_bone_tag` (or a bone already named
/// like the part's first bone); parts with no match stay roots. With
/// `match_legacy`, view-hands parts have their bind pose zeroed first.
pub fn load_skeleton_from_parts(
    parts: &[Part],
    translator: &dyn AssetTranslator,
    match_legacy: bool,
) -> Result<Skeleton> {
    let mut skeleton = Skeleton::new();
    for part in parts {
        let mut loaded = translator.load_skeleton(&part.path)?;
        let Some(root_name) = loaded.bones().first().map(|b| b.name.clone()) else {
            warn!("Part {} has no bones, skipping", part.path.display());
            continue;
        };
        let tag = part
            .parent_bone_tag
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&root_name);
        let attach_to = skeleton.find(tag);

        if part.kind == PartKind::ViewHands && match_legacy {
            loaded.zero_bind_pose();
        }
        skeleton.attach(&loaded, attach_to);
    }
    Ok(skeleton)
}
