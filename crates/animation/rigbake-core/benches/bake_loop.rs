use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::{UnitQuaternion, Vector3};
use rigbake_core::{
    bake, AnimationClip, BakingConfig, CompositionPlayer, IkChainSettings, Layer, LayerTag,
    NotetrackCompiler, Side, Skeleton, TwoBoneIkSolver, WeightCurve,
};

fn arm_rig() -> Skeleton {
    let mut sk = Skeleton::new();
    let id = UnitQuaternion::identity();
    sk.add_bone("tag_view", None, Vector3::zeros(), id).unwrap();
    for (suffix, dir) in [("le", -1.0f32), ("ri", 1.0)] {
        let mut parent = format!("j_shoulder_{suffix}");
        sk.add_bone_with_parent_name(
            &parent,
            Some("tag_view"),
            Vector3::new(0.2 * dir, 0.0, 0.0),
            id,
        )
        .unwrap();
        for joint in ["j_elbow", "j_wrist"] {
            let name = format!("{joint}_{suffix}");
            sk.add_bone_with_parent_name(
                &name,
                Some(parent.as_str()),
                Vector3::new(0.3 * dir, 0.0, 0.05),
                id,
            )
            .unwrap();
            parent = name;
        }
        for finger in 0..15 {
            sk.add_bone_with_parent_name(
                format!("j_finger{finger}_{suffix}"),
                Some(parent.as_str()),
                Vector3::new(0.02 * dir, 0.0, 0.01 * finger as f32),
                id,
            )
            .unwrap();
        }
        sk.add_bone_with_parent_name(
            format!("tag_ik_loc_{suffix}"),
            Some("tag_view"),
            Vector3::new(0.5 * dir, 0.3, 0.2),
            id,
        )
        .unwrap();
    }
    sk
}

fn reach_clip(frames: u32) -> AnimationClip {
    let mut clip = AnimationClip::new("reach");
    for (suffix, side, dir) in [("le", "left_hand", -1.0f32), ("ri", "right_hand", 1.0)] {
        let track = clip.track_mut_or_insert(&format!("tag_ik_loc_{suffix}"));
        for f in (0..=frames).step_by(10) {
            let s = (f as f32 * 0.1).sin() * 0.05;
            track.add_translation_frame(f as f32, [0.5 * dir + s, 0.3, 0.2 - s]);
        }
        clip.create_notetrack(&format!("ik_out_start_{side}"), &[frames / 8]);
        clip.create_notetrack(&format!("ik_in_start_{side}"), &[frames / 2]);
    }
    clip
}

fn player(frames: u32) -> CompositionPlayer {
    let sk = arm_rig();
    let mut player = CompositionPlayer::new("bench", sk.clone());
    player.add_layer(Layer::new("main", reach_clip(frames), LayerTag::Base, &sk));
    for (side, settings) in [
        (Side::Left, IkChainSettings::left_hand()),
        (Side::Right, IkChainSettings::right_hand()),
    ] {
        let solver = TwoBoneIkSolver::from_settings("ik", side, &settings, &sk, 1e-4).unwrap();
        player.add_solver(solver);
    }
    NotetrackCompiler::new().compile(&mut player);
    player
}

fn bench_bake(c: &mut Criterion) {
    let mut group = c.benchmark_group("bake");
    for frames in [120u32, 600] {
        group.bench_with_input(BenchmarkId::from_parameter(frames), &frames, |b, &frames| {
            let mut p = player(frames);
            let cfg = BakingConfig::default();
            b.iter(|| black_box(bake(&mut p, &cfg)));
        });
    }
    group.finish();
}

fn bench_curve(c: &mut Criterion) {
    let mut curve = WeightCurve::new();
    for i in 0..256 {
        curve.add(i as f32 * 4.0, (i % 2) as f32);
    }
    curve.sort();
    c.bench_function("curve_sequential_1024", |b| {
        b.iter(|| {
            let sum: f32 = curve.sampler().samples((0..1024).map(|f| f as f32)).sum();
            black_box(sum)
        })
    });
    c.bench_function("curve_binary_search_1024", |b| {
        b.iter(|| {
            let sum: f32 = (0..1024).map(|f| curve.evaluate_at(f as f32)).sum();
            black_box(sum)
        })
    });
}

criterion_group!(benches, bench_bake, bench_curve);
criterion_main!(benches);
