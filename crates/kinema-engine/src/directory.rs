use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use kinema_store::{ComponentId, GameObjectId, LayerId, SceneId};

use crate::component::ComponentBehavior;
use crate::hierarchy::{GameObjectNode, LayerNode, SceneNode};

/// Address of a runtime wrapper: an entity id plus its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InstanceKey {
    Scene(SceneId),
    Layer(LayerId),
    GameObject(GameObjectId),
    Component(ComponentId),
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceKey::Scene(id) => write!(f, "scene:{id}"),
            InstanceKey::Layer(id) => write!(f, "layer:{id}"),
            InstanceKey::GameObject(id) => write!(f, "gameObject:{id}"),
            InstanceKey::Component(id) => write!(f, "component:{id}"),
        }
    }
}

/// A live runtime wrapper.
#[derive(Clone)]
pub enum Instance {
    Scene(Rc<SceneNode>),
    Layer(Rc<LayerNode>),
    GameObject(Rc<GameObjectNode>),
    Component(Rc<dyn ComponentBehavior>),
}

impl Instance {
    fn kind(&self) -> &'static str {
        match self {
            Instance::Scene(_) => "scene",
            Instance::Layer(_) => "layer",
            Instance::GameObject(_) => "gameObject",
            Instance::Component(_) => "component",
        }
    }

    /// Whether two handles point at the same wrapper.
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        match (self, other) {
            (Instance::Scene(a), Instance::Scene(b)) => Rc::ptr_eq(a, b),
            (Instance::Layer(a), Instance::Layer(b)) => Rc::ptr_eq(a, b),
            (Instance::GameObject(a), Instance::GameObject(b)) => Rc::ptr_eq(a, b),
            (Instance::Component(a), Instance::Component(b)) => {
                std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance::{}", self.kind())
    }
}

/// Maps ids to the runtime wrappers created for them.
///
/// Wrappers are not authoritative: the store owns the data. A wrapper is
/// created on first access and lives until its owner unregisters it.
#[derive(Default)]
pub struct InstanceDirectory {
    entries: RefCell<HashMap<InstanceKey, Instance>>,
}

impl InstanceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// The wrapper for `key`, building it with `factory` on first access.
    ///
    /// `factory` runs without the directory borrowed, so it may itself look
    /// up other wrappers.
    pub fn get_or_create(&self, key: InstanceKey, factory: impl FnOnce() -> Instance) -> Instance {
        if let Some(existing) = self.get(&key) {
            return existing;
        }
        let instance = factory();
        self.entries
            .borrow_mut()
            .entry(key)
            .or_insert(instance)
            .clone()
    }

    /// Fallible variant of [`InstanceDirectory::get_or_create`]; nothing is
    /// stored when the factory fails.
    pub fn try_get_or_create<E>(
        &self,
        key: InstanceKey,
        factory: impl FnOnce() -> Result<Instance, E>,
    ) -> Result<Instance, E> {
        if let Some(existing) = self.get(&key) {
            return Ok(existing);
        }
        let instance = factory()?;
        Ok(self
            .entries
            .borrow_mut()
            .entry(key)
            .or_insert(instance)
            .clone())
    }

    pub fn get(&self, key: &InstanceKey) -> Option<Instance> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn contains(&self, key: &InstanceKey) -> bool {
        self.entries.borrow().contains_key(key)
    }

    /// Store `instance` under `key`, replacing any previous wrapper.
    pub fn register(&self, key: InstanceKey, instance: Instance) {
        if let Some(previous) = self.entries.borrow_mut().insert(key.clone(), instance) {
            tracing::debug!(%key, kind = previous.kind(), "replaced registered instance");
        }
    }

    /// Drop the wrapper for `key`. A missing key is only worth a warning.
    pub fn unregister(&self, key: &InstanceKey) -> Option<Instance> {
        let removed = self.entries.borrow_mut().remove(key);
        if removed.is_none() {
            tracing::warn!(%key, "unregister: no instance registered");
        }
        removed
    }

    /// Like [`InstanceDirectory::unregister`] but silent for wrappers that
    /// were never materialized.
    pub(crate) fn discard(&self, key: &InstanceKey) -> Option<Instance> {
        self.entries.borrow_mut().remove(key)
    }

    pub fn component(&self, id: &ComponentId) -> Option<Rc<dyn ComponentBehavior>> {
        match self.get(&InstanceKey::Component(id.clone())) {
            Some(Instance::Component(c)) => Some(c),
            _ => None,
        }
    }

    pub fn game_object(&self, id: &GameObjectId) -> Option<Rc<GameObjectNode>> {
        match self.get(&InstanceKey::GameObject(id.clone())) {
            Some(Instance::GameObject(g)) => Some(g),
            _ => None,
        }
    }

    pub fn layer(&self, id: &LayerId) -> Option<Rc<LayerNode>> {
        match self.get(&InstanceKey::Layer(id.clone())) {
            Some(Instance::Layer(l)) => Some(l),
            _ => None,
        }
    }

    pub fn scene(&self, id: &SceneId) -> Option<Rc<SceneNode>> {
        match self.get(&InstanceKey::Scene(id.clone())) {
            Some(Instance::Scene(s)) => Some(s),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn layer_instance(id: &str) -> Instance {
        Instance::Layer(Rc::new(LayerNode::new(LayerId::new(id))))
    }

    #[test]
    fn test_get_or_create_runs_factory_once() {
        let directory = InstanceDirectory::new();
        let calls = Cell::new(0);
        let key = InstanceKey::Layer(LayerId::new("l1"));
        let first = directory.get_or_create(key.clone(), || {
            calls.set(calls.get() + 1);
            layer_instance("l1")
        });
        let second = directory.get_or_create(key, || {
            calls.set(calls.get() + 1);
            layer_instance("l1")
        });
        assert_eq!(calls.get(), 1);
        assert!(first.ptr_eq(&second));
    }

    #[test]
    fn test_unregister_twice_is_harmless() {
        let directory = InstanceDirectory::new();
        let key = InstanceKey::Layer(LayerId::new("l1"));
        directory.register(key.clone(), layer_instance("l1"));
        assert!(directory.unregister(&key).is_some());
        assert!(directory.unregister(&key).is_none());
        assert!(directory.get(&key).is_none());
        assert!(directory.is_empty());
    }

    #[test]
    fn test_failed_factory_stores_nothing() {
        let directory = InstanceDirectory::new();
        let key = InstanceKey::Layer(LayerId::new("l1"));
        let result: Result<Instance, &str> = directory.try_get_or_create(key.clone(), || Err("nope"));
        assert!(result.is_err());
        assert!(!directory.contains(&key));
    }

    #[test]
    fn test_keys_of_different_kinds_do_not_collide() {
        let directory = InstanceDirectory::new();
        directory.register(InstanceKey::Layer(LayerId::new("x")), layer_instance("x"));
        assert!(directory.game_object(&GameObjectId::new("x")).is_none());
        assert!(directory.layer(&LayerId::new("x")).is_some());
    }
}
