//! Notetrack compilation: named timeline events become weight-curve points.
//!
//! Source clips mark where IK, finger poses and gestures engage with
//! symmetric in/out events (`ik_out_start_left_hand` = fully engaged,
//! `ik_in_start_left_hand` = fully disengaged, ...). The compiler scans every
//! layer clip once before playback, appends a point per event frame to the
//! matching solver or layer curves, then sorts each curve exactly once.
//!
//! Names that are not control events are ignored here and copied through
//! to the baked clip (see `baking::copy_passthrough_notetracks`).

use log::{debug, info};

use crate::ik::{Side, Solver};
use crate::player::{CompositionPlayer, Layer, LayerTag};

/// Marks the end of a gesture blend-in. Its first occurrence also seeds the
/// gesture curves with `(0, 0)`.
pub const GESTURE_BLEND_IN: &str = "gesture_blend_in";
pub const GESTURE_BLEND_OUT_START: &str = "gesture_blend_out_start";
pub const GESTURE_BLEND_OUT_END: &str = "gesture_blend_out_end";

/// What a control event writes to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ControlTarget {
    /// The IK solver(s) of one side.
    Solver(Side),
    /// The hand pose layer(s) of one side.
    HandPose(Side),
    /// Every gesture-tagged layer.
    Gestures,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ControlEvent {
    pub target: ControlTarget,
    pub weight: f32,
}

/// Sided event prefixes: (prefix, targets the IK solver, fully engaged).
const SIDED_EVENTS: &[(&str, bool, bool)] = &[
    ("ik_out_start_", true, true),
    ("ik_in_end_", true, true),
    ("ik_in_start_", true, false),
    ("ik_out_end_", true, false),
    ("fingers_out_start_", false, true),
    ("fingers_in_end_", false, true),
    ("fingers_in_start_", false, false),
    ("fingers_out_end_", false, false),
];

fn parse_side(suffix: &str) -> Option<Side> {
    match suffix {
        "left_hand" => Some(Side::Left),
        "right_hand" => Some(Side::Right),
        _ => None,
    }
}

/// Map a notetrack name to the control event it encodes, if any.
/// A known prefix followed by an unknown side is not a control event.
pub fn classify(name: &str) -> Option<ControlEvent> {
    let gesture = |weight| {
        Some(ControlEvent {
            target: ControlTarget::Gestures,
            weight,
        })
    };
    match name {
        GESTURE_BLEND_IN | GESTURE_BLEND_OUT_START => return gesture(1.0),
        GESTURE_BLEND_OUT_END => return gesture(0.0),
        _ => {}
    }
    SIDED_EVENTS.iter().find_map(|&(prefix, is_ik, engaged)| {
        let side = parse_side(name.strip_prefix(prefix)?)?;
        Some(ControlEvent {
            target: if is_ik {
                ControlTarget::Solver(side)
            } else {
                ControlTarget::HandPose(side)
            },
            weight: if engaged { 1.0 } else { 0.0 },
        })
    })
}

/// True for names consumed by the compiler; those never reach the output clip.
#[inline]
pub fn is_control_event(name: &str) -> bool {
    classify(name).is_some()
}

/// Counts gathered by one `compile` pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompileSummary {
    /// Control points appended across all curves (bootstrap included).
    pub points_added: usize,
    /// Event frames whose target does not exist (no solver or pose layer on that side).
    pub dropped: usize,
    /// Notetracks that are not control events.
    pub ignored: usize,
    pub gesture_bootstrapped: bool,
}

#[derive(Copy, Clone, Debug)]
struct CurveWrite {
    target: ControlTarget,
    frame: f32,
    weight: f32,
    bootstrap: bool,
}

/// Compiles the notetracks of a player's layer clips into its curves.
#[derive(Clone, Debug, Default)]
pub struct NotetrackCompiler {
    _private: (),
}

impl NotetrackCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan every layer clip in registration order and write the resulting
    /// points. Every layer and solver curve is sorted once afterwards, so
    /// this must run after all layers and solvers are registered and before
    /// the first `update`.
    pub fn compile(&self, player: &mut CompositionPlayer) -> CompileSummary {
        let mut summary = CompileSummary::default();
        let writes = Self::collect(player, &mut summary);

        let (layers, solvers) = player.targets_mut();
        for write in &writes {
            let hits = apply_write(layers, solvers, write);
            if hits == 0 {
                if !write.bootstrap {
                    summary.dropped += 1;
                }
            } else {
                summary.points_added += hits;
            }
        }

        for layer in layers.iter_mut() {
            if let Some(curve) = layer.curve_mut() {
                curve.sort();
            }
        }
        for solver in solvers.iter_mut() {
            solver.weights_mut().sort();
        }

        info!(
            "Compiled notetracks for '{}': {} point(s), {} dropped, {} ignored",
            player.name(),
            summary.points_added,
            summary.dropped,
            summary.ignored
        );
        summary
    }

    fn collect(player: &CompositionPlayer, summary: &mut CompileSummary) -> Vec<CurveWrite> {
        let mut writes = Vec::new();
        for layer in player.layers() {
            let notetracks = &layer.clip().notetracks;
            // The seed goes ahead of every event of the layer that carries it,
            // so same-frame events listed earlier still sort after it.
            if !summary.gesture_bootstrapped
                && notetracks.iter().any(|n| n.name == GESTURE_BLEND_IN)
            {
                summary.gesture_bootstrapped = true;
                writes.push(CurveWrite {
                    target: ControlTarget::Gestures,
                    frame: 0.0,
                    weight: 0.0,
                    bootstrap: true,
                });
            }
            for notetrack in notetracks {
                let Some(event) = classify(&notetrack.name) else {
                    debug!("Notetrack '{}' is not a control event", notetrack.name);
                    summary.ignored += 1;
                    continue;
                };
                for &frame in &notetrack.frames {
                    info!(
                        "Notetrack '{}' at frame {} in '{}' -> {:?} = {}",
                        notetrack.name,
                        frame,
                        layer.clip().name,
                        event.target,
                        event.weight
                    );
                    writes.push(CurveWrite {
                        target: event.target,
                        frame: frame as f32,
                        weight: event.weight,
                        bootstrap: false,
                    });
                }
            }
        }
        writes
    }
}

/// Append one point to every curve `write` targets; returns how many curves took it.
fn apply_write(layers: &mut [Layer], solvers: &mut [Solver], write: &CurveWrite) -> usize {
    let mut hits = 0;
    match write.target {
        ControlTarget::Solver(side) => {
            for solver in solvers.iter_mut().filter(|s| s.side() == side) {
                solver.weights_mut().add(write.frame, write.weight);
                hits += 1;
            }
        }
        ControlTarget::HandPose(side) => {
            for layer in layers
                .iter_mut()
                .filter(|l| l.tag() == LayerTag::HandPose(side))
            {
                if let Some(curve) = layer.curve_mut() {
                    curve.add(write.frame, write.weight);
                    hits += 1;
                }
            }
        }
        ControlTarget::Gestures => {
            for layer in layers.iter_mut().filter(|l| l.tag().is_gesture()) {
                if let Some(curve) = layer.curve_mut() {
                    curve.add(write.frame, write.weight);
                    hits += 1;
                }
            }
        }
    }
    hits
}
