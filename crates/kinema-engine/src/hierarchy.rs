//! Runtime wrappers for scenes, layers and game objects.
//!
//! A wrapper holds only its id. Data is read from and written to the store
//! through the [`EngineContext`] passed to each call, so wrappers never
//! point back at the services that own them.

use std::rc::Rc;

use kinema_core::value::PropMap;
use kinema_core::{KinemaError, KinemaResult};
use kinema_store::{
    component_types, Action, ComponentId, GameObjectId, LayerId, NewGameObject, ParentRef, SceneId,
};

use crate::adapter::{apply_all, ensure_layer_context, ensure_scene_context, BoundItem};
use crate::backend::{ItemHandle, LayerHandle, SceneHandle};
use crate::component::{downcast, ComponentBehavior};
use crate::components::{TimelineComponent, TransformComponent};
use crate::context::EngineContext;
use crate::directory::{Instance, InstanceKey};

// ──────────────────────────────────────────────────────────────────────────────
// Scene
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct SceneNode {
    pub id: SceneId,
}

impl SceneNode {
    pub fn new(id: SceneId) -> Self {
        Self { id }
    }

    /// Create a scene in the current project together with its drawing context.
    pub fn create(ctx: &EngineContext, name: &str) -> KinemaResult<Rc<SceneNode>> {
        let id = ctx
            .store
            .create_scene(name)
            .ok_or_else(|| KinemaError::not_initialized("no current project to add a scene to"))?;
        ensure_scene_context(ctx, &id)?;
        let node = Rc::new(SceneNode::new(id.clone()));
        ctx.directory
            .register(InstanceKey::Scene(id), Instance::Scene(node.clone()));
        Ok(node)
    }

    pub fn name(&self, ctx: &EngineContext) -> Option<String> {
        ctx.store
            .with_state(|s| s.scene(&self.id).map(|scene| scene.name.clone()))
    }

    pub fn context_handle(&self, ctx: &EngineContext) -> Option<SceneHandle> {
        ctx.bindings.borrow().scene(&self.id)
    }

    /// Add a layer and obtain its layer-level drawing context.
    pub fn add_layer(
        &self,
        ctx: &EngineContext,
        name: &str,
        has_timeline: bool,
    ) -> KinemaResult<Rc<LayerNode>> {
        let id = ctx
            .store
            .create_layer(&self.id, name, has_timeline)
            .ok_or_else(|| KinemaError::InvalidArgument(format!("scene {} does not exist", self.id)))?;
        // the adapter usually bound it while handling the notification
        ensure_layer_context(ctx, &ctx.store.state(), &id)?;
        let node = Rc::new(LayerNode::new(id.clone()));
        ctx.directory
            .register(InstanceKey::Layer(id), Instance::Layer(node.clone()));
        Ok(node)
    }

    pub fn layers(&self, ctx: &EngineContext) -> Vec<Rc<LayerNode>> {
        let ids = ctx.store.with_state(|s| {
            s.scene(&self.id)
                .map(|scene| scene.layer_ids.clone())
                .unwrap_or_default()
        });
        ids.iter().filter_map(|id| ctx.layer(id)).collect()
    }

    /// Destroy every layer, then the scene itself.
    pub fn destroy(&self, ctx: &EngineContext) {
        for layer in self.layers(ctx) {
            layer.destroy(ctx);
        }
        ctx.directory.unregister(&InstanceKey::Scene(self.id.clone()));
        ctx.store.delete_scene(&self.id);
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Layer
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct LayerNode {
    pub id: LayerId,
}

impl LayerNode {
    pub fn new(id: LayerId) -> Self {
        Self { id }
    }

    pub fn context_handle(&self, ctx: &EngineContext) -> Option<LayerHandle> {
        ctx.bindings.borrow().layer(&self.id)
    }

    /// Creation payload for a top-level object of this layer.
    pub fn new_object(&self, name: impl Into<String>) -> NewGameObject {
        NewGameObject::new(ParentRef::Layer(self.id.clone()), name)
    }

    /// Add a top-level game object; `visual` binds an existing draw item.
    pub fn add_game_object(
        &self,
        ctx: &EngineContext,
        spec: NewGameObject,
        visual: Option<ItemHandle>,
    ) -> KinemaResult<Rc<GameObjectNode>> {
        let spec = NewGameObject {
            parent: ParentRef::Layer(self.id.clone()),
            ..spec
        };
        spawn(ctx, spec, visual)
    }

    /// Top-level game objects, in paint order.
    pub fn game_objects(&self, ctx: &EngineContext) -> Vec<Rc<GameObjectNode>> {
        let ids = ctx.store.with_state(|s| {
            s.layer(&self.id)
                .map(|layer| layer.game_object_ids.clone())
                .unwrap_or_default()
        });
        ids.iter().filter_map(|id| ctx.game_object(id)).collect()
    }

    /// Destroy a game object of this layer with its children and components.
    /// Returns false when `id` is not on this layer.
    pub fn remove_game_object(&self, ctx: &EngineContext, id: &GameObjectId) -> bool {
        let on_layer = ctx
            .store
            .with_state(|s| s.layer_of(id).is_some_and(|layer| layer.id == self.id));
        if !on_layer {
            tracing::debug!(layer = %self.id, game_object = %id, "removeGameObject: not on this layer");
            return false;
        }
        match ctx.game_object(id) {
            Some(node) => {
                node.destroy(ctx);
                true
            }
            None => false,
        }
    }

    /// Destroy every game object of the layer, then the layer itself.
    pub fn destroy(&self, ctx: &EngineContext) {
        for node in self.game_objects(ctx) {
            node.destroy(ctx);
        }
        ctx.directory.unregister(&InstanceKey::Layer(self.id.clone()));
        ctx.store.delete_layer(&self.id);
    }
}

fn spawn(
    ctx: &EngineContext,
    spec: NewGameObject,
    visual: Option<ItemHandle>,
) -> KinemaResult<Rc<GameObjectNode>> {
    let parent = spec.parent.clone();
    let id = ctx
        .store
        .create_game_object(spec)
        .ok_or_else(|| KinemaError::InvalidArgument(format!("parent {parent} does not exist")))?;
    let node = Rc::new(GameObjectNode::new(id.clone()));
    ctx.directory
        .register(InstanceKey::GameObject(id), Instance::GameObject(node.clone()));
    if let Some(item) = visual {
        node.bind_visual(ctx, item)?;
    }
    Ok(node)
}

// ──────────────────────────────────────────────────────────────────────────────
// GameObject
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct GameObjectNode {
    pub id: GameObjectId,
}

impl GameObjectNode {
    pub fn new(id: GameObjectId) -> Self {
        Self { id }
    }

    pub fn name(&self, ctx: &EngineContext) -> Option<String> {
        ctx.store
            .with_state(|s| s.game_object(&self.id).map(|go| go.name.clone()))
    }

    pub fn is_active(&self, ctx: &EngineContext) -> bool {
        ctx.store
            .with_state(|s| s.game_object(&self.id).is_some_and(|go| go.active))
    }

    /// Attach a component of a registered type. `props` override the
    /// type's defaults.
    pub fn add_component(
        &self,
        ctx: &EngineContext,
        type_tag: &str,
        props: PropMap,
    ) -> KinemaResult<Rc<dyn ComponentBehavior>> {
        let initial = {
            let registry = ctx.registry.borrow();
            if !registry.contains(type_tag) {
                return Err(KinemaError::UnknownComponentType(type_tag.to_string()));
            }
            registry.initial_props(type_tag, props)
        };
        let id = ctx
            .store
            .add_component(&self.id, type_tag, initial)
            .ok_or_else(|| {
                KinemaError::InvalidArgument(format!("cannot add {type_tag} to game object {}", self.id))
            })?;
        ctx.component(&id).ok_or_else(|| {
            KinemaError::Other(format!("component {id} vanished while being created"))
        })
    }

    pub fn component(&self, ctx: &EngineContext, id: &ComponentId) -> Option<Rc<dyn ComponentBehavior>> {
        let owned = ctx
            .store
            .with_state(|s| s.component(id).is_some_and(|c| c.parent_id == self.id));
        if owned {
            ctx.component(id)
        } else {
            None
        }
    }

    /// Components in attachment order (Transform first).
    pub fn components(&self, ctx: &EngineContext) -> Vec<Rc<dyn ComponentBehavior>> {
        let ids = self.component_ids(ctx);
        ids.iter().filter_map(|id| ctx.component(id)).collect()
    }

    pub fn component_of_type(
        &self,
        ctx: &EngineContext,
        type_tag: &str,
    ) -> Option<Rc<dyn ComponentBehavior>> {
        let id = ctx.store.with_state(|s| {
            s.component_of_type(&self.id, type_tag)
                .map(|c| c.id.clone())
        })?;
        ctx.component(&id)
    }

    pub fn transform(&self, ctx: &EngineContext) -> Option<Rc<TransformComponent>> {
        self.component_of_type(ctx, component_types::TRANSFORM)
            .and_then(downcast::<TransformComponent>)
    }

    pub fn timeline(&self, ctx: &EngineContext) -> Option<Rc<TimelineComponent>> {
        self.component_of_type(ctx, component_types::TIMELINE)
            .and_then(downcast::<TimelineComponent>)
    }

    /// Add a nested game object under this one.
    pub fn add_child(
        &self,
        ctx: &EngineContext,
        spec: NewGameObject,
        visual: Option<ItemHandle>,
    ) -> KinemaResult<Rc<GameObjectNode>> {
        let spec = NewGameObject {
            parent: ParentRef::GameObject(self.id.clone()),
            ..spec
        };
        spawn(ctx, spec, visual)
    }

    pub fn children(&self, ctx: &EngineContext) -> Vec<Rc<GameObjectNode>> {
        let ids = ctx.store.with_state(|s| {
            s.game_object(&self.id)
                .map(|go| go.child_ids.clone())
                .unwrap_or_default()
        });
        ids.iter().filter_map(|id| ctx.game_object(id)).collect()
    }

    pub fn item(&self, ctx: &EngineContext) -> Option<ItemHandle> {
        ctx.bindings.borrow().item(&self.id)
    }

    /// Use an existing draw item as this object's visual and push the
    /// current component state to it.
    pub fn bind_visual(&self, ctx: &EngineContext, item: ItemHandle) -> KinemaResult<()> {
        let state = ctx.store.state();
        let go = state.game_object(&self.id).ok_or_else(|| {
            KinemaError::InvalidArgument(format!("game object {} does not exist", self.id))
        })?;
        let layer = state.layer_of(&self.id).ok_or_else(|| {
            KinemaError::InvalidArgument(format!("game object {} is not on a layer", self.id))
        })?;
        let layer_handle = ensure_layer_context(ctx, &state, &layer.id)?;
        let replaced = ctx.bindings.borrow_mut().bind_item(
            self.id.clone(),
            BoundItem {
                item,
                layer: layer_handle,
            },
        );
        if let Some(old) = replaced.filter(|old| old.item != item) {
            tracing::debug!(game_object = %self.id, old = old.item.0, new = item.0, "rebinding visual");
        }
        apply_all(ctx, &state, &self.id, item);
        let mut backend = ctx.backend.borrow_mut();
        backend.set_item_visible(item, go.active)?;
        backend.render()
    }

    fn component_ids(&self, ctx: &EngineContext) -> Vec<ComponentId> {
        ctx.store.with_state(|s| {
            s.game_object(&self.id)
                .map(|go| go.component_ids.clone())
                .unwrap_or_default()
        })
    }

    /// Destroy this object, its descendants and all their components, in a
    /// single store update. Destroying twice only logs a warning.
    pub fn destroy(&self, ctx: &EngineContext) {
        ctx.directory
            .unregister(&InstanceKey::GameObject(self.id.clone()));

        let state = ctx.store.state();
        if state.game_object(&self.id).is_none() {
            return;
        }
        let mut doomed = state.descendants(&self.id);
        doomed.reverse();
        doomed.push(self.id.clone());

        let mut deletes = Vec::with_capacity(doomed.len());
        let mut removals = Vec::new();
        for id in &doomed {
            if id != &self.id {
                ctx.directory.discard(&InstanceKey::GameObject(id.clone()));
            }
            for component in state.components_of(id) {
                if let Some(Instance::Component(behavior)) =
                    ctx.directory.discard(&InstanceKey::Component(component.id.clone()))
                {
                    behavior.on_destroy();
                }
                removals.push(Action::RemoveComponent {
                    component_id: component.id.clone(),
                });
            }
            deletes.push(Action::DeleteGameObject {
                game_object_id: id.clone(),
            });
        }
        // owners first, so mandatory components may go too
        deletes.extend(removals);
        ctx.store.batch(deletes);
        tracing::debug!(game_object = %self.id, count = doomed.len(), "destroyed game object tree");
    }
}
