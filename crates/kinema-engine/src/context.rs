use std::cell::RefCell;
use std::rc::Rc;

use kinema_store::{ComponentId, GameObjectId, LayerId, SceneId, Store};

use crate::adapter::RenderBindings;
use crate::backend::SharedBackend;
use crate::component::ComponentBehavior;
use crate::directory::{Instance, InstanceDirectory, InstanceKey};
use crate::hierarchy::{GameObjectNode, LayerNode, SceneNode};
use crate::props::ComponentCore;
use crate::registry::ComponentRegistry;

/// The services of one engine instance, passed explicitly to everything
/// that needs them. Cloning shares the same services.
#[derive(Clone)]
pub struct EngineContext {
    pub store: Rc<Store>,
    pub directory: Rc<InstanceDirectory>,
    pub registry: Rc<RefCell<ComponentRegistry>>,
    pub backend: SharedBackend,
    pub bindings: Rc<RefCell<RenderBindings>>,
}

impl EngineContext {
    /// Fresh services around `store` and `backend`, with the built-in
    /// component types registered.
    pub fn new(store: Rc<Store>, backend: SharedBackend) -> Self {
        Self {
            store,
            directory: Rc::new(InstanceDirectory::new()),
            registry: Rc::new(RefCell::new(ComponentRegistry::with_builtins())),
            backend,
            bindings: Rc::new(RefCell::new(RenderBindings::default())),
        }
    }

    /// Runtime behavior of a component, materialized on first access.
    ///
    /// `None` when the record is gone or its type has no registered factory.
    pub fn component(&self, id: &ComponentId) -> Option<Rc<dyn ComponentBehavior>> {
        let (type_tag, owner) = self.store.with_state(|s| {
            s.component(id)
                .map(|c| (c.type_tag.clone(), c.parent_id.clone()))
        })?;
        let created = self
            .directory
            .try_get_or_create(InstanceKey::Component(id.clone()), || {
                let core = ComponentCore::new(self.store.clone(), id.clone(), type_tag, owner);
                self.registry.borrow().create(core).map(Instance::Component)
            });
        match created {
            Ok(Instance::Component(component)) => Some(component),
            Ok(other) => {
                tracing::warn!(component = %id, ?other, "directory entry has the wrong kind");
                None
            }
            Err(err) => {
                tracing::warn!(component = %id, %err, "cannot materialize component");
                None
            }
        }
    }

    pub fn game_object(&self, id: &GameObjectId) -> Option<Rc<GameObjectNode>> {
        if self.store.with_state(|s| s.game_object(id).is_none()) {
            return None;
        }
        let key = InstanceKey::GameObject(id.clone());
        match self.directory.get_or_create(key, || {
            Instance::GameObject(Rc::new(GameObjectNode::new(id.clone())))
        }) {
            Instance::GameObject(node) => Some(node),
            _ => None,
        }
    }

    pub fn layer(&self, id: &LayerId) -> Option<Rc<LayerNode>> {
        if self.store.with_state(|s| s.layer(id).is_none()) {
            return None;
        }
        let key = InstanceKey::Layer(id.clone());
        match self
            .directory
            .get_or_create(key, || Instance::Layer(Rc::new(LayerNode::new(id.clone()))))
        {
            Instance::Layer(node) => Some(node),
            _ => None,
        }
    }

    pub fn scene(&self, id: &SceneId) -> Option<Rc<SceneNode>> {
        if self.store.with_state(|s| s.scene(id).is_none()) {
            return None;
        }
        let key = InstanceKey::Scene(id.clone());
        match self
            .directory
            .get_or_create(key, || Instance::Scene(Rc::new(SceneNode::new(id.clone()))))
        {
            Instance::Scene(node) => Some(node),
            _ => None,
        }
    }
}
