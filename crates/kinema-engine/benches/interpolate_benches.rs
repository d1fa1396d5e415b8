use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kinema_core::Easing;
use kinema_engine::player::frame_actions;
use kinema_store::{
    component_types, interpolate, KeyFrame, NewGameObject, ParentRef, ProjectSettings, Store,
};
use serde_json::json;

fn build_track() -> Vec<KeyFrame> {
    (0..64)
        .map(|i| {
            let mut key = KeyFrame::new(i * 10, json!(i as f64 * 3.5));
            if i % 2 == 1 {
                key.easing_type = Easing::EaseInOut;
            }
            key
        })
        .collect()
}

// 4 timeline layers x 25 objects, each with an animated transform.
fn build_store() -> Store {
    let store = Store::new();
    store.create_project(
        "bench",
        ProjectSettings {
            total_frames: 600,
            ..ProjectSettings::default()
        },
    );
    let scene = store.create_scene("main").unwrap();
    for l in 0..4 {
        let layer = store.create_layer(&scene, format!("layer {l}"), true).unwrap();
        store.add_clip(&layer, 0, 600).unwrap();
        for o in 0..25 {
            let go = store
                .create_game_object(NewGameObject::new(
                    ParentRef::Layer(layer.clone()),
                    format!("object {o}"),
                ))
                .unwrap();
            let transform = store
                .with_state(|s| {
                    s.component_of_type(&go, component_types::TRANSFORM)
                        .map(|c| c.id.clone())
                })
                .unwrap();
            store.set_key_frame(&transform, "x", 0, json!(0.0));
            store.set_key_frame(&transform, "x", 300, json!(o as f64 * 10.0));
            store.set_key_frame(&transform, "rotation", 600, json!(360.0));
        }
    }
    store
}

fn bench_interpolate(c: &mut Criterion) {
    let track = build_track();
    let mut group = c.benchmark_group("kinema_interpolate");

    group.bench_function("track_64_keys_sweep", |b| {
        b.iter(|| {
            for frame in 0..640 {
                black_box(interpolate(black_box(&track), frame as f64));
            }
        })
    });

    group.finish();
}

fn bench_frame_sync(c: &mut Criterion) {
    let store = build_store();
    let state = store.state();
    let mut group = c.benchmark_group("kinema_frame_sync");

    group.bench_function("frame_actions_100_objects", |b| {
        let mut frame = 0;
        b.iter(|| {
            frame = (frame + 7) % 600;
            black_box(frame_actions(black_box(&state), frame))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_interpolate, bench_frame_sync);
criterion_main!(benches);
