//! Keeps the drawing backend in step with the store.
//!
//! The adapter is a store subscriber. It keeps the previous snapshot and,
//! on every notification, walks only the categories whose `Rc` changed.
//! Nothing is painted except in response to a store change, and a change
//! that touched no tracked category costs no backend call at all.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use kinema_core::{KinemaError, KinemaResult};
use kinema_store::{Component, GameObjectId, LayerId, SceneId, StoreState, SubscriberId};

use crate::backend::{ItemHandle, LayerHandle, SceneHandle};
use crate::context::EngineContext;
use crate::directory::InstanceKey;

/// A draw item bound to a game object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundItem {
    pub item: ItemHandle,
    pub layer: LayerHandle,
}

/// Which backend objects stand for which store entities.
#[derive(Debug, Default)]
pub struct RenderBindings {
    scenes: HashMap<SceneId, SceneHandle>,
    layers: HashMap<LayerId, LayerHandle>,
    items: HashMap<GameObjectId, BoundItem>,
}

impl RenderBindings {
    pub fn scene(&self, id: &SceneId) -> Option<SceneHandle> {
        self.scenes.get(id).copied()
    }

    pub fn layer(&self, id: &LayerId) -> Option<LayerHandle> {
        self.layers.get(id).copied()
    }

    pub fn item(&self, id: &GameObjectId) -> Option<ItemHandle> {
        self.items.get(id).map(|b| b.item)
    }

    pub fn bind_scene(&mut self, id: SceneId, handle: SceneHandle) {
        self.scenes.insert(id, handle);
    }

    pub fn bind_layer(&mut self, id: LayerId, handle: LayerHandle) {
        self.layers.insert(id, handle);
    }

    pub fn bind_item(&mut self, id: GameObjectId, item: BoundItem) -> Option<BoundItem> {
        self.items.insert(id, item)
    }

    pub fn unbind_item(&mut self, id: &GameObjectId) -> Option<BoundItem> {
        self.items.remove(id)
    }

    /// Unbind a layer together with every item drawn on it.
    pub fn unbind_layer(&mut self, id: &LayerId) -> Option<LayerHandle> {
        let handle = self.layers.remove(id)?;
        self.items.retain(|_, bound| bound.layer != handle);
        Some(handle)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

/// Scene context for `scene_id`, created on first use.
pub(crate) fn ensure_scene_context(ctx: &EngineContext, scene_id: &SceneId) -> KinemaResult<SceneHandle> {
    if let Some(handle) = ctx.bindings.borrow().scene(scene_id) {
        return Ok(handle);
    }
    let handle = ctx.backend.borrow_mut().create_scene_context()?;
    ctx.bindings.borrow_mut().bind_scene(scene_id.clone(), handle);
    Ok(handle)
}

/// Layer context for `layer_id`, created on first use.
pub(crate) fn ensure_layer_context(
    ctx: &EngineContext,
    state: &StoreState,
    layer_id: &LayerId,
) -> KinemaResult<LayerHandle> {
    if let Some(handle) = ctx.bindings.borrow().layer(layer_id) {
        return Ok(handle);
    }
    let layer = state
        .layer(layer_id)
        .ok_or_else(|| KinemaError::InvalidArgument(format!("layer {layer_id} does not exist")))?;
    let scene = ensure_scene_context(ctx, &layer.scene_id)?;
    let handle = ctx
        .backend
        .borrow_mut()
        .create_layer_context(scene, &layer.name)?;
    ctx.bindings.borrow_mut().bind_layer(layer_id.clone(), handle);
    Ok(handle)
}

/// Push every enabled component of a game object to its draw item.
pub(crate) fn apply_all(ctx: &EngineContext, state: &StoreState, id: &GameObjectId, item: ItemHandle) {
    for record in state.components_of(id) {
        if !record.enabled {
            continue;
        }
        let Some(component) = ctx.component(&record.id) else {
            continue;
        };
        let result = component.apply_to_renderer(&mut *ctx.backend.borrow_mut(), item);
        if let Err(err) = result {
            tracing::warn!(component = %record.id, %err, "apply to renderer failed");
        }
    }
}

fn logged(result: KinemaResult<()>, what: &str) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(%err, "{what} failed");
            false
        }
    }
}

/// Store subscriber that mirrors store changes onto the backend.
pub struct RendererAdapter {
    ctx: EngineContext,
    previous: StoreState,
    renders: usize,
}

impl RendererAdapter {
    pub fn new(ctx: EngineContext) -> Self {
        let previous = ctx.store.state();
        Self {
            ctx,
            previous,
            renders: 0,
        }
    }

    /// Create an adapter and subscribe it to the context's store.
    pub fn attach(ctx: &EngineContext) -> (Rc<RefCell<RendererAdapter>>, SubscriberId) {
        let adapter = Rc::new(RefCell::new(Self::new(ctx.clone())));
        let handle = adapter.clone();
        let subscription = ctx.store.subscribe(move |state| match handle.try_borrow_mut() {
            Ok(mut adapter) => {
                adapter.sync(state);
            }
            Err(_) => tracing::warn!("renderer adapter re-entered; notification skipped"),
        });
        (adapter, subscription)
    }

    /// Number of `render` calls issued so far.
    pub fn render_count(&self) -> usize {
        self.renders
    }

    /// Diff `state` against the previous snapshot and update the backend.
    /// Returns whether a render was issued.
    pub fn sync(&mut self, state: &StoreState) -> bool {
        let previous = std::mem::replace(&mut self.previous, state.clone());
        let mut touched = false;

        if !Rc::ptr_eq(&previous.scenes, &state.scenes) {
            self.sync_scenes(&previous, state);
        }
        if !Rc::ptr_eq(&previous.layers, &state.layers) {
            touched |= self.sync_layers(&previous, state);
        }
        if !Rc::ptr_eq(&previous.game_objects, &state.game_objects) {
            touched |= self.sync_game_objects(&previous, state);
        }
        if !Rc::ptr_eq(&previous.components, &state.components) {
            touched |= self.sync_components(&previous, state);
        }

        if !touched {
            return false;
        }
        self.renders += 1;
        logged(self.ctx.backend.borrow_mut().render(), "render")
    }

    fn sync_scenes(&mut self, previous: &StoreState, state: &StoreState) {
        for id in previous.scenes.keys().filter(|id| !state.scenes.contains_key(*id)) {
            self.ctx.directory.discard(&InstanceKey::Scene(id.clone()));
        }
    }

    fn sync_layers(&mut self, previous: &StoreState, state: &StoreState) -> bool {
        let mut touched = false;
        for (id, layer) in state.layers.iter() {
            match previous.layers.get(id) {
                None => {
                    let known = self.ctx.bindings.borrow().layer(id).is_some();
                    if !known {
                        touched |= match ensure_layer_context(&self.ctx, state, id) {
                            Ok(_) => true,
                            Err(err) => {
                                tracing::warn!(layer = %id, %err, "cannot create layer context");
                                false
                            }
                        };
                    }
                }
                Some(old) if !Rc::ptr_eq(old, layer) && old.name != layer.name => {
                    // visible/locked stay store-only
                    let handle = self.ctx.bindings.borrow().layer(id);
                    if let Some(handle) = handle {
                        let result = self.ctx.backend.borrow_mut().set_layer_name(handle, &layer.name);
                        touched |= logged(result, "set layer name");
                    }
                }
                Some(_) => {}
            }
        }
        for id in previous.layers.keys().filter(|id| !state.layers.contains_key(*id)) {
            self.ctx.directory.discard(&InstanceKey::Layer(id.clone()));
            let handle = self.ctx.bindings.borrow_mut().unbind_layer(id);
            if let Some(handle) = handle {
                let result = self.ctx.backend.borrow_mut().remove_layer(handle);
                touched |= logged(result, "remove layer");
            }
        }
        touched
    }

    fn sync_game_objects(&mut self, previous: &StoreState, state: &StoreState) -> bool {
        let mut touched = false;
        for (id, go) in state.game_objects.iter() {
            let Some(old) = previous.game_objects.get(id) else {
                continue;
            };
            if Rc::ptr_eq(old, go) || old.active == go.active {
                continue;
            }
            let Some(item) = self.ctx.bindings.borrow().item(id) else {
                continue;
            };
            let mut backend = self.ctx.backend.borrow_mut();
            touched |= logged(backend.set_item_visible(item, go.active), "set item visible");
            if !go.active {
                touched |= logged(backend.set_item_selected(item, false), "clear selection");
            }
        }
        for id in previous
            .game_objects
            .keys()
            .filter(|id| !state.game_objects.contains_key(*id))
        {
            self.ctx.directory.discard(&InstanceKey::GameObject(id.clone()));
            let bound = self.ctx.bindings.borrow_mut().unbind_item(id);
            if let Some(bound) = bound {
                let result = self.ctx.backend.borrow_mut().remove_render_item(bound.item);
                touched |= logged(result, "remove render item");
            }
        }
        touched
    }

    fn sync_components(&mut self, previous: &StoreState, state: &StoreState) -> bool {
        let mut touched = false;
        let changed: Vec<&Component> = state
            .components
            .values()
            .filter(|c| match previous.components.get(&c.id) {
                Some(old) => !Rc::ptr_eq(&old.props, &c.props),
                None => true,
            })
            .map(|c| c.as_ref())
            .collect();

        let mut freshly_bound: HashSet<GameObjectId> = HashSet::new();
        for record in changed {
            if freshly_bound.contains(&record.parent_id) {
                continue;
            }
            let Some(component) = self.ctx.component(&record.id) else {
                continue;
            };
            if !record.enabled {
                continue;
            }
            let bound = self.ctx.bindings.borrow().item(&record.parent_id);
            match bound {
                Some(item) => {
                    let result =
                        component.apply_to_renderer(&mut *self.ctx.backend.borrow_mut(), item);
                    touched |= logged(result, "apply to renderer");
                }
                None => {
                    let Some(kind) = component.render_item_kind() else {
                        continue;
                    };
                    match self.create_item(state, record, kind) {
                        Ok(item) => {
                            apply_all(&self.ctx, state, &record.parent_id, item);
                            freshly_bound.insert(record.parent_id.clone());
                            touched = true;
                        }
                        Err(err) => {
                            tracing::warn!(component = %record.id, %err, "cannot create draw item");
                        }
                    }
                }
            }
        }

        for id in previous
            .components
            .keys()
            .filter(|id| !state.components.contains_key(*id))
        {
            if let Some(crate::directory::Instance::Component(component)) =
                self.ctx.directory.discard(&InstanceKey::Component(id.clone()))
            {
                component.on_destroy();
            }
        }
        touched
    }

    fn create_item(&self, state: &StoreState, record: &Component, kind: &str) -> KinemaResult<ItemHandle> {
        let go = state.game_object(&record.parent_id).ok_or_else(|| {
            KinemaError::InvalidArgument(format!("game object {} does not exist", record.parent_id))
        })?;
        let layer = state.layer_of(&go.id).ok_or_else(|| {
            KinemaError::InvalidArgument(format!("game object {} is not on a layer", go.id))
        })?;
        let layer_handle = ensure_layer_context(&self.ctx, state, &layer.id)?;
        let item = self
            .ctx
            .backend
            .borrow_mut()
            .create_render_item(layer_handle, kind, &record.props)?;
        self.ctx.bindings.borrow_mut().bind_item(
            go.id.clone(),
            BoundItem {
                item,
                layer: layer_handle,
            },
        );
        if !go.active {
            self.ctx.backend.borrow_mut().set_item_visible(item, false)?;
        }
        tracing::debug!(game_object = %go.id, kind, item = item.0, "bound new draw item");
        Ok(item)
    }
}
