use nalgebra::{UnitQuaternion, Vector3};
use rigbake_core::{
    AnimationClip, BoneId, CompositionPlayer, Layer, LayerTag, LayerWeight, NotetrackCompiler,
    Side, Skeleton, TwoBoneIkSolver,
};

fn two_arm_skeleton() -> Skeleton {
    let mut sk = Skeleton::new();
    let root = sk
        .add_bone("tag_view", None, Vector3::zeros(), UnitQuaternion::identity())
        .unwrap();
    for (suffix, dir) in [("le", -1.0f32), ("ri", 1.0)] {
        let shoulder = sk
            .add_bone(
                format!("j_shoulder_{suffix}"),
                Some(root),
                Vector3::new(0.2 * dir, 0.0, 0.0),
                UnitQuaternion::identity(),
            )
            .unwrap();
        let elbow = sk
            .add_bone(
                format!("j_elbow_{suffix}"),
                Some(shoulder),
                Vector3::new(0.3 * dir, 0.0, 0.0),
                UnitQuaternion::identity(),
            )
            .unwrap();
        sk.add_bone(
            format!("j_wrist_{suffix}"),
            Some(elbow),
            Vector3::new(0.3 * dir, 0.0, 0.05),
            UnitQuaternion::identity(),
        )
        .unwrap();
        sk.add_bone(
            format!("tag_ik_loc_{suffix}"),
            Some(root),
            Vector3::new(0.5 * dir, 0.2, 0.1),
            UnitQuaternion::identity(),
        )
        .unwrap();
    }
    sk
}

fn solver(sk: &Skeleton, side: Side) -> TwoBoneIkSolver {
    let settings = match side {
        Side::Left => rigbake_core::IkChainSettings::left_hand(),
        Side::Right => rigbake_core::IkChainSettings::right_hand(),
    };
    TwoBoneIkSolver::from_settings(format!("{side:?}"), side, &settings, sk, 1e-4).unwrap()
}

fn clip_with_notes(name: &str, notes: &[(&str, Vec<u32>)]) -> AnimationClip {
    let mut clip = AnimationClip::new(name);
    for (note, frames) in notes {
        clip.create_notetrack(note, frames);
    }
    clip
}

fn points(curve: &rigbake_core::WeightCurve) -> Vec<(f32, f32)> {
    curve.points().iter().map(|p| (p.frame, p.weight)).collect()
}

#[test]
fn ik_pair_builds_sorted_solver_curve() {
    let sk = two_arm_skeleton();
    let mut player = CompositionPlayer::new("p", sk.clone());
    // Written out of order on purpose.
    let clip = clip_with_notes(
        "main",
        &[
            ("ik_in_start_left_hand", vec![40]),
            ("ik_out_start_left_hand", vec![10]),
        ],
    );
    player.add_layer(Layer::new("main", clip, LayerTag::Base, &sk));
    let left = player.add_solver(solver(&sk, Side::Left));
    let right = player.add_solver(solver(&sk, Side::Right));

    let summary = NotetrackCompiler::new().compile(&mut player);

    assert_eq!(
        points(player.solver(left).unwrap().weights()),
        vec![(10.0, 1.0), (40.0, 0.0)]
    );
    assert!(player.solver(right).unwrap().weights().is_empty());
    assert_eq!(summary.points_added, 2);
    assert_eq!(summary.dropped, 0);
    assert!(!summary.gesture_bootstrapped);
}

#[test]
fn gesture_blend_in_bootstraps_every_gesture_layer() {
    let sk = two_arm_skeleton();
    let mut player = CompositionPlayer::new("p", sk.clone());
    let main = clip_with_notes("main", &[("gesture_blend_in", vec![50])]);
    player.add_layer(Layer::new("main", main, LayerTag::Base, &sk));
    let gesture = player.add_layer(Layer::new(
        "gesture",
        AnimationClip::new("wave"),
        LayerTag::Gesture,
        &sk,
    ));
    let pose = player.add_layer(Layer::new(
        "gesturepose",
        clip_with_notes("pose", &[("gesture_blend_in", vec![60])]),
        LayerTag::GesturePose,
        &sk,
    ));

    let summary = NotetrackCompiler::new().compile(&mut player);
    assert!(summary.gesture_bootstrapped);

    let g = player.layer(gesture).unwrap().curve().unwrap();
    assert_eq!(points(g), vec![(0.0, 0.0), (50.0, 1.0), (60.0, 1.0)]);
    // Only one bootstrap point even though two clips carry gesture_blend_in.
    let p = player.layer(pose).unwrap().curve().unwrap();
    assert_eq!(points(p), vec![(0.0, 0.0), (50.0, 1.0), (60.0, 1.0)]);
    assert!(player.layers()[0].curve().is_none());
}

#[test]
fn gesture_seed_precedes_events_listed_before_blend_in() {
    let sk = two_arm_skeleton();
    let mut player = CompositionPlayer::new("p", sk.clone());
    let clip = clip_with_notes(
        "wave",
        &[
            ("gesture_blend_out_start", vec![0]),
            ("gesture_blend_in", vec![10]),
        ],
    );
    let gesture = player.add_layer(Layer::new("gesture", clip, LayerTag::Gesture, &sk));

    let summary = NotetrackCompiler::new().compile(&mut player);
    assert!(summary.gesture_bootstrapped);

    let layer = player.layer(gesture).unwrap();
    assert_eq!(
        points(layer.curve().unwrap()),
        vec![(0.0, 0.0), (0.0, 1.0), (10.0, 1.0)]
    );
    assert_eq!(layer.curve().unwrap().evaluate_at(0.0), 1.0);
    assert_eq!(player.update(0).layer_weights, vec![1.0]);
}

#[test]
fn finger_events_drive_matching_pose_layer() {
    let sk = two_arm_skeleton();
    let mut player = CompositionPlayer::new("p", sk.clone());
    let main = clip_with_notes(
        "main",
        &[
            ("fingers_out_start_right_hand", vec![5, 25]),
            ("fingers_in_start_right_hand", vec![15]),
            ("fingers_out_start_left_hand", vec![8]),
        ],
    );
    player.add_layer(Layer::new("main", main, LayerTag::Base, &sk));
    let right = player.add_layer(Layer::new(
        "pose_right",
        AnimationClip::new("fist"),
        LayerTag::HandPose(Side::Right),
        &sk,
    ));

    let summary = NotetrackCompiler::new().compile(&mut player);

    assert_eq!(
        points(player.layer(right).unwrap().curve().unwrap()),
        vec![(5.0, 1.0), (15.0, 0.0), (25.0, 1.0)]
    );
    // No left pose layer: the left event has nowhere to go.
    assert_eq!(summary.dropped, 1);
    assert_eq!(summary.points_added, 3);
}

#[test]
fn unknown_and_malformed_names_are_ignored() {
    let sk = two_arm_skeleton();
    let mut player = CompositionPlayer::new("p", sk.clone());
    let main = clip_with_notes(
        "main",
        &[
            ("footstep", vec![3]),
            ("ik_out_start_left_foot", vec![4]),
            ("ik_out_start_left_hand", vec![6]),
        ],
    );
    player.add_layer(Layer::new("main", main, LayerTag::Base, &sk));
    let left = player.add_solver(solver(&sk, Side::Left));

    let summary = NotetrackCompiler::new().compile(&mut player);
    assert_eq!(summary.ignored, 2);
    assert_eq!(points(player.solver(left).unwrap().weights()), vec![(6.0, 1.0)]);
}

#[test]
fn constant_weight_layers_are_not_written() {
    let sk = two_arm_skeleton();
    let mut player = CompositionPlayer::new("p", sk.clone());
    let main = clip_with_notes("main", &[("gesture_blend_out_end", vec![12])]);
    player.add_layer(Layer::new("main", main, LayerTag::Base, &sk));
    player.add_layer(
        Layer::new("gesture", AnimationClip::new("g"), LayerTag::Gesture, &sk)
            .with_weight(LayerWeight::Constant(0.5)),
    );

    let summary = NotetrackCompiler::new().compile(&mut player);
    assert_eq!(summary.dropped, 1);
    assert_eq!(summary.points_added, 0);
    assert_eq!(player.layers()[1].clone().weight_at(12.0), 0.5);
}

#[test]
fn solver_bones_resolve_by_name() {
    let sk = two_arm_skeleton();
    let s = solver(&sk, Side::Right);
    let [start, mid, end, target] = s.bones();
    assert_eq!(sk.bone(start).name, "j_shoulder_ri");
    assert_eq!(sk.bone(mid).name, "j_elbow_ri");
    assert_eq!(sk.bone(end).name, "j_wrist_ri");
    assert_eq!(sk.bone(target).name, "tag_ik_loc_ri");
    assert_ne!(start, BoneId(0));
}
