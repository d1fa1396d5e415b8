use std::collections::HashMap;
use std::rc::Rc;

use kinema_core::value::PropMap;
use kinema_core::{KinemaError, KinemaResult};
use kinema_store::component_types;

use crate::component::ComponentBehavior;
use crate::components::{
    CircleRenderer, RectangleRenderer, TimelineComponent, TransformComponent, VisualComponent,
};
use crate::props::ComponentCore;

/// Builds the runtime behavior for a component record.
pub type ComponentFactory = Rc<dyn Fn(ComponentCore) -> Rc<dyn ComponentBehavior>>;

/// Maps component type tags to behavior factories and default props.
///
/// Host applications register their own types here; the built-ins are
/// registered by [`ComponentRegistry::with_builtins`].
#[derive(Default)]
pub struct ComponentRegistry {
    factories: HashMap<String, ComponentFactory>,
    defaults: HashMap<String, PropMap>,
}

impl ComponentRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that knows Transform, Visual, CircleRenderer,
    /// RectangleRenderer and Timeline.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(component_types::TRANSFORM, |core| {
            Rc::new(TransformComponent::new(core))
        });
        registry.set_default_props(component_types::TRANSFORM, TransformComponent::default_props());

        registry.register(component_types::VISUAL, |core| Rc::new(VisualComponent::new(core)));
        registry.set_default_props(component_types::VISUAL, VisualComponent::default_props());

        registry.register(component_types::CIRCLE_RENDERER, |core| {
            Rc::new(CircleRenderer::new(core))
        });
        registry.set_default_props(component_types::CIRCLE_RENDERER, CircleRenderer::default_props());

        registry.register(component_types::RECTANGLE_RENDERER, |core| {
            Rc::new(RectangleRenderer::new(core))
        });
        registry.set_default_props(
            component_types::RECTANGLE_RENDERER,
            RectangleRenderer::default_props(),
        );

        registry.register(component_types::TIMELINE, |core| {
            Rc::new(TimelineComponent::new(core))
        });
        registry
    }

    /// Register (or replace) the factory for a component type.
    pub fn register(
        &mut self,
        type_tag: impl Into<String>,
        factory: impl Fn(ComponentCore) -> Rc<dyn ComponentBehavior> + 'static,
    ) {
        let type_tag = type_tag.into();
        if self.factories.contains_key(&type_tag) {
            tracing::debug!(%type_tag, "replacing component factory");
        }
        self.factories.insert(type_tag, Rc::new(factory));
    }

    /// Props a new component of this type starts with.
    pub fn set_default_props(&mut self, type_tag: impl Into<String>, props: PropMap) {
        self.defaults.insert(type_tag.into(), props);
    }

    pub fn get_factory(&self, type_tag: &str) -> Option<ComponentFactory> {
        self.factories.get(type_tag).cloned()
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        self.factories.contains_key(type_tag)
    }

    /// Defaults for `type_tag` with `overrides` merged on top.
    pub fn initial_props(&self, type_tag: &str, overrides: PropMap) -> PropMap {
        let mut props = self.defaults.get(type_tag).cloned().unwrap_or_default();
        props.extend(overrides);
        props
    }

    /// Instantiate the behavior for a bound core.
    pub fn create(&self, core: ComponentCore) -> KinemaResult<Rc<dyn ComponentBehavior>> {
        let factory = self
            .get_factory(&core.type_tag)
            .ok_or_else(|| KinemaError::UnknownComponentType(core.type_tag.clone()))?;
        Ok(factory(core))
    }

    /// Registered type tags, sorted.
    pub fn types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("types", &self.types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::downcast;
    use kinema_store::{GameObjectId, ComponentId, Store};
    use serde_json::json;

    #[test]
    fn test_builtins_registered() {
        let registry = ComponentRegistry::with_builtins();
        assert_eq!(
            registry.types(),
            vec!["CircleRenderer", "RectangleRenderer", "Timeline", "Transform", "Visual"]
        );
        assert!(registry.get_factory("Sprite").is_none());
    }

    #[test]
    fn test_initial_props_merge_overrides() {
        let registry = ComponentRegistry::with_builtins();
        let mut overrides = PropMap::new();
        overrides.insert("radius".into(), json!(12.0));
        let props = registry.initial_props(component_types::CIRCLE_RENDERER, overrides);
        assert_eq!(props["radius"], json!(12.0));
        assert_eq!(props["opacity"], json!(1.0));
        assert!(registry.initial_props("Custom", PropMap::new()).is_empty());
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        let registry = ComponentRegistry::new();
        let core = ComponentCore::new(
            Rc::new(Store::new()),
            ComponentId::new("c"),
            "Sprite",
            GameObjectId::new("g"),
        );
        assert!(matches!(
            registry.create(core),
            Err(KinemaError::UnknownComponentType(t)) if t == "Sprite"
        ));
    }

    #[test]
    fn test_custom_factory() {
        let mut registry = ComponentRegistry::new();
        registry.register("Spin", |core| Rc::new(TransformComponent::new(core)));
        let core = ComponentCore::new(
            Rc::new(Store::new()),
            ComponentId::new("c"),
            "Spin",
            GameObjectId::new("g"),
        );
        let behavior = registry.create(core).unwrap();
        assert_eq!(behavior.type_tag(), "Spin");
        assert!(downcast::<TransformComponent>(behavior).is_some());
    }
}
