use std::cell::RefCell;
use std::rc::Rc;

use kinema_core::value::PropMap;
use kinema_core::KinemaConfig;
use kinema_engine::{
    BackendCall, Engine, InstanceKey, LayerNode, ManualScheduler, RecordingBackend, RenderBackend,
    SceneNode, Shape,
};
use kinema_store::component_types;
use serde_json::json;

struct Fixture {
    engine: Engine,
    backend: Rc<RefCell<RecordingBackend>>,
    scene: Rc<SceneNode>,
    layer: Rc<LayerNode>,
}

fn fixture() -> Fixture {
    let backend = RecordingBackend::shared();
    let engine = Engine::new(
        KinemaConfig::default(),
        backend.clone(),
        Box::new(ManualScheduler::new()),
    )
    .expect("engine should initialize");
    let scene = engine.create_scene("main").unwrap();
    let layer = scene.add_layer(engine.context(), "shapes", true).unwrap();
    Fixture {
        engine,
        backend,
        scene,
        layer,
    }
}

fn props(pairs: &[(&str, serde_json::Value)]) -> PropMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn test_renderer_component_creates_and_paints_item() {
    let f = fixture();
    let ctx = f.engine.context();
    let ball = f
        .layer
        .add_game_object(ctx, f.layer.new_object("ball").at(10.0, 20.0), None)
        .unwrap();
    assert!(ball.item(ctx).is_none());

    ball.add_component(
        ctx,
        component_types::CIRCLE_RENDERER,
        props(&[("radius", json!(5.0)), ("fill", json!("#ff0000"))]),
    )
    .unwrap();

    let item = ball.item(ctx).expect("circle renderer binds a draw item");
    let backend = f.backend.borrow();
    let recorded = backend.item(item).unwrap();
    assert_eq!(recorded.kind, "circle");
    assert_eq!(recorded.layer, f.layer.context_handle(ctx).unwrap());
    assert_eq!(recorded.transform.position.x, 10.0);
    assert_eq!(recorded.transform.position.y, 20.0);
    assert_eq!(recorded.style.shape, Some(Shape::Circle { radius: 5.0 }));
    assert_eq!(recorded.style.fill.map(|c| c.r), Some(255));
}

#[test]
fn test_unchanged_references_cost_no_backend_calls() {
    let f = fixture();
    let ctx = f.engine.context();
    let ball = f
        .layer
        .add_game_object(ctx, f.layer.new_object("ball").at(10.0, 20.0), None)
        .unwrap();
    ball.add_component(ctx, component_types::CIRCLE_RENDERER, PropMap::new())
        .unwrap();
    let transform = ball.transform(ctx).unwrap();
    f.backend.borrow_mut().clear_calls();

    // identical value: the reducer keeps every reference
    transform.set_x(10.0);
    // playback flags are not a tracked category
    f.engine.store().set_playing(true);
    f.engine.store().set_playing(false);
    assert_eq!(f.backend.borrow().call_count(), 0);

    transform.set_x(30.0);
    let calls = f.backend.borrow().calls().to_vec();
    assert_eq!(calls.len(), 2);
    assert!(matches!(calls[0], BackendCall::UpdateItemTransform { .. }));
    assert_eq!(calls[1], BackendCall::Render);
}

#[test]
fn test_layer_name_is_forwarded_but_flags_are_not() {
    let f = fixture();
    let ctx = f.engine.context();
    let handle = f.layer.context_handle(ctx).unwrap();
    f.backend.borrow_mut().clear_calls();

    f.engine.store().set_layer_visible(&f.layer.id, false);
    f.engine.store().set_layer_locked(&f.layer.id, true);
    assert_eq!(f.backend.borrow().call_count(), 0);

    f.engine.store().rename_layer(&f.layer.id, "foreground");
    assert_eq!(
        f.backend.borrow().calls(),
        &[
            BackendCall::SetLayerName {
                layer: handle,
                name: "foreground".into()
            },
            BackendCall::Render
        ]
    );
    assert_eq!(f.backend.borrow().layer(handle).unwrap().name, "foreground");
}

#[test]
fn test_destroying_game_object_removes_everything() {
    let f = fixture();
    let ctx = f.engine.context();
    let ball = f
        .layer
        .add_game_object(ctx, f.layer.new_object("ball"), None)
        .unwrap();
    ball.add_component(ctx, component_types::RECTANGLE_RENDERER, PropMap::new())
        .unwrap();
    let child = ball
        .add_child(ctx, f.layer.new_object("shadow"), None)
        .unwrap();
    let item = ball.item(ctx).unwrap();
    let component_ids = f
        .engine
        .store()
        .with_state(|s| s.game_object(&ball.id).unwrap().component_ids.clone());

    assert!(f.layer.remove_game_object(ctx, &ball.id));

    let state = f.engine.store().state();
    assert!(state.game_object(&ball.id).is_none());
    assert!(state.game_object(&child.id).is_none());
    assert!(state.layer(&f.layer.id).unwrap().game_object_ids.is_empty());
    assert!(component_ids.iter().all(|id| state.component(id).is_none()));
    assert!(f.backend.borrow().item(item).is_none());
    assert!(ctx
        .directory
        .get(&InstanceKey::GameObject(ball.id.clone()))
        .is_none());
    assert!(ctx.game_object(&ball.id).is_none());

    // a second destroy only warns
    ball.destroy(ctx);
    assert!(!f.layer.remove_game_object(ctx, &ball.id));
}

#[test]
fn test_store_level_delete_does_not_cascade() {
    let f = fixture();
    let ctx = f.engine.context();
    let ball = f
        .layer
        .add_game_object(ctx, f.layer.new_object("ball"), None)
        .unwrap();
    let transform_id = ball.transform(ctx).unwrap().core.id.clone();

    assert!(f.engine.store().delete_game_object(&ball.id));
    let state = f.engine.store().state();
    assert!(state.game_object(&ball.id).is_none());
    assert!(state.component(&transform_id).is_some());
}

#[test]
fn test_binding_an_existing_item() {
    let f = fixture();
    let ctx = f.engine.context();
    let handle = f.layer.context_handle(ctx).unwrap();
    let item = f
        .backend
        .borrow_mut()
        .create_render_item(handle, "image", &PropMap::new())
        .unwrap();

    let logo = f
        .layer
        .add_game_object(ctx, f.layer.new_object("logo").at(3.0, 4.0), Some(item))
        .unwrap();
    assert_eq!(logo.item(ctx), Some(item));
    assert_eq!(f.backend.borrow().item(item).unwrap().transform.position.x, 3.0);

    logo.transform(ctx).unwrap().set_rotation(45.0);
    assert_eq!(f.backend.borrow().item(item).unwrap().transform.rotation, 45.0);
}

#[test]
fn test_deleting_layer_removes_its_context() {
    let f = fixture();
    let ctx = f.engine.context();
    let extra = f.scene.add_layer(ctx, "overlay", false).unwrap();
    let handle = extra.context_handle(ctx).unwrap();
    assert_eq!(f.scene.layers(ctx).len(), 2);

    extra.destroy(ctx);
    assert!(f.backend.borrow().layer(handle).is_none());
    assert_eq!(f.scene.layers(ctx).len(), 1);
}

#[test]
fn test_unknown_component_type() {
    let f = fixture();
    let ctx = f.engine.context();
    let ball = f
        .layer
        .add_game_object(ctx, f.layer.new_object("ball"), None)
        .unwrap();
    assert!(ball.add_component(ctx, "Sprite", PropMap::new()).is_err());
}
