//! rigbake core (engine-agnostic)
//!
//! Composites a base clip, hand pose and gesture layers on a skeleton,
//! corrects two limb chains with analytic two-bone IK and bakes the result
//! into a single absolute clip, one key per bone per frame.
//!
//! Layer and IK weights are not authored directly: the [`NotetrackCompiler`]
//! derives them from named events (notetracks) in the source clips.

pub mod baking;
pub mod binding;
pub mod config;
pub mod conversion;
pub mod curve;
pub mod data;
pub mod error;
pub mod ids;
pub mod ik;
pub mod interp;
pub mod notetracks;
pub mod player;
pub mod sampling;
pub mod skeleton;
pub mod stored;
pub mod translator;

// Re-exports for consumers (tools, tests)
pub use baking::{bake, copy_passthrough_notetracks, export_baked_json, BakingConfig};
pub use binding::{Binding, BindingSet, TargetResolver};
pub use config::{Config, IkChainSettings, OutputNaming};
pub use conversion::{
    build_player, convert, load_skeleton_from_parts, run_conversion, ConversionJob,
    ConversionOutput, LayerKind, LayerSpec, Part, PartKind,
};
pub use curve::{CurveCursor, CurveSampler, WeightCurve, WeightPoint};
pub use data::{AnimationClip, BoneTrack, Notetrack, RotationKey, TransformType, TranslationKey};
pub use error::{CoreError, Result};
pub use ids::{BoneId, LayerId, SolverId};
pub use ik::{Side, SolveStatus, Solver, TwoBoneIkSolver};
pub use notetracks::{
    classify, is_control_event, CompileSummary, ControlEvent, ControlTarget, NotetrackCompiler,
};
pub use player::{CompositionPlayer, FrameReport, Layer, LayerTag, LayerWeight};
pub use sampling::sample_track;
pub use skeleton::{Bone, Skeleton};
pub use stored::{parse_clip_json, parse_skeleton_json, SkeletonDocument};
pub use translator::{AssetTranslator, JsonTranslator, TranslatorFactory};
