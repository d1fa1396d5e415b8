//! A small keyframed scene used by `kinema preview`.

use std::rc::Rc;

use anyhow::{Context, Result};
use kinema_core::value::PropMap;
use kinema_core::Easing;
use kinema_engine::{Engine, GameObjectNode};
use kinema_store::component_types;
use serde_json::json;

fn props(pairs: &[(&str, serde_json::Value)]) -> PropMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Build one scene with a timeline layer holding a ball sliding across the
/// canvas and a card that appears a quarter of the way in and spins.
pub fn build(engine: &Engine) -> Result<Vec<Rc<GameObjectNode>>> {
    let ctx = engine.context();
    let store = engine.store();
    let project = &engine.config().project;
    let total = project.total_frames.max(1);
    let (width, height) = (project.width as f64, project.height as f64);

    let scene = engine.create_scene("Main")?;
    let layer = scene.add_layer(ctx, "Shapes", true)?;
    store
        .add_clip(&layer.id, 0, total)
        .context("failed to add the demo clip")?;

    let ball = layer.add_game_object(ctx, layer.new_object("Ball").at(100.0, height / 3.0), None)?;
    ball.add_component(
        ctx,
        component_types::CIRCLE_RENDERER,
        props(&[("radius", json!(40.0)), ("fill", json!("#f97316"))]),
    )?;
    let ball_transform = ball
        .transform(ctx)
        .context("ball has no transform")?
        .core
        .id
        .clone();
    let midpoint = total / 2;
    store.set_key_frame(&ball_transform, "x", 0, json!(100.0));
    store.set_key_frame(&ball_transform, "x", midpoint, json!(width - 100.0));
    store.set_easing(&ball_transform, "x", midpoint, Easing::EaseInOut, None);

    let card = layer.add_game_object(
        ctx,
        layer
            .new_object("Card")
            .at(width / 2.0, height / 2.0)
            .born_at(total / 4),
        None,
    )?;
    card.add_component(
        ctx,
        component_types::RECTANGLE_RENDERER,
        props(&[
            ("width", json!(160.0)),
            ("height", json!(90.0)),
            ("cornerRadius", json!(12.0)),
        ]),
    )?;
    let card_transform = card
        .transform(ctx)
        .context("card has no transform")?
        .core
        .id
        .clone();
    store.set_key_frame(&card_transform, "rotation", total / 4, json!(0.0));
    store.set_key_frame(&card_transform, "rotation", total - 1, json!(360.0));

    tracing::debug!(total_frames = total, "demo scene built");
    Ok(vec![ball, card])
}
