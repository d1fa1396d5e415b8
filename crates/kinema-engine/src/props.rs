//! Store-backed component properties.
//!
//! A component behavior never keeps its own copy of user-visible data.
//! [`ComponentCore`] reads and writes `props[name]` of the component's record
//! in the store, and the [`props!`](crate::props) macro turns a list of
//! declared fields into typed getter/setter pairs over it.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use kinema_core::value::{PropMap, PropValue};
use kinema_store::{ComponentId, GameObjectId, Store};

/// Bookkeeping shared by every component behavior.
///
/// `id`, `type_tag` and `game_object_id` are plain fields; everything else
/// goes through the store.
pub struct ComponentCore {
    pub id: ComponentId,
    pub type_tag: String,
    pub game_object_id: GameObjectId,
    store: Rc<Store>,
    tracked: RefCell<BTreeSet<String>>,
}

impl ComponentCore {
    /// Bind to an existing component record. Props already present on the
    /// record start out tracked.
    pub fn new(
        store: Rc<Store>,
        id: ComponentId,
        type_tag: impl Into<String>,
        game_object_id: GameObjectId,
    ) -> Self {
        let tracked = store.with_state(|s| {
            s.component(&id)
                .map(|c| c.props.keys().cloned().collect())
                .unwrap_or_default()
        });
        Self {
            id,
            type_tag: type_tag.into(),
            game_object_id,
            store,
            tracked: RefCell::new(tracked),
        }
    }

    pub fn store(&self) -> &Rc<Store> {
        &self.store
    }

    /// Whether the record still exists in the store.
    pub fn is_alive(&self) -> bool {
        self.store.with_state(|s| s.component(&self.id).is_some())
    }

    pub fn enabled(&self) -> bool {
        self.store
            .with_state(|s| s.component(&self.id).map(|c| c.enabled))
            .unwrap_or(false)
    }

    pub fn set_enabled(&self, enabled: bool) -> bool {
        self.store.set_component_enabled(&self.id, enabled)
    }

    /// Current props of the record (empty once the record is gone).
    pub fn props(&self) -> Rc<PropMap> {
        self.store
            .with_state(|s| s.component(&self.id).map(|c| c.props.clone()))
            .unwrap_or_default()
    }

    pub fn prop(&self, name: &str) -> Option<PropValue> {
        self.store
            .with_state(|s| s.component(&self.id).and_then(|c| c.props.get(name).cloned()))
    }

    /// Write one prop. An unseen name becomes tracked from now on.
    pub fn set_prop(&self, name: &str, value: PropValue) -> bool {
        if self.tracked.borrow_mut().insert(name.to_string()) {
            tracing::debug!(component = %self.id, prop = name, "tracking new property");
        }
        self.store.set_prop(&self.id, name, value)
    }

    /// Typed read; `None` when missing or of another shape.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.prop(name)
            .and_then(|value| serde_json::from_value(value).ok())
    }

    /// Typed write.
    pub fn set<T: Serialize>(&self, name: &str, value: T) -> bool {
        match serde_json::to_value(value) {
            Ok(value) => self.set_prop(name, value),
            Err(err) => {
                tracing::warn!(component = %self.id, prop = name, %err, "property value not representable");
                false
            }
        }
    }

    pub fn is_tracked(&self, name: &str) -> bool {
        self.tracked.borrow().contains(name)
    }

    pub fn tracked_props(&self) -> Vec<String> {
        self.tracked.borrow().iter().cloned().collect()
    }
}

impl std::fmt::Debug for ComponentCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentCore")
            .field("id", &self.id)
            .field("type_tag", &self.type_tag)
            .field("game_object_id", &self.game_object_id)
            .finish()
    }
}

/// Declare store-backed fields on a component behavior.
///
/// The type must expose its [`ComponentCore`] through a `core` field.
/// For every entry `"key" => getter / setter: Type = default` this generates
/// `getter(&self) -> Type` (falling back to `default` when the prop is
/// missing or malformed) and `setter(&self, value: Type) -> bool`. It also
/// generates `DECLARED_PROPS` and `default_props()`.
///
/// ```ignore
/// props! {
///     TransformComponent {
///         "x" => x / set_x: f64 = 0.0,
///         "rotation" => rotation / set_rotation: f64 = 0.0,
///     }
/// }
/// ```
#[macro_export]
macro_rules! props {
    ($ty:ident { $( $key:literal => $get:ident / $set:ident : $t:ty = $default:expr ),* $(,)? }) => {
        impl $ty {
            /// Prop names declared for this component type.
            pub const DECLARED_PROPS: &'static [&'static str] = &[$($key),*];

            /// Declared props with their default values.
            pub fn default_props() -> $crate::__private::PropMap {
                let mut props = $crate::__private::PropMap::new();
                $(
                    if let Ok(value) = $crate::__private::to_value::<$t>($default) {
                        props.insert($key.to_string(), value);
                    }
                )*
                props
            }

            $(
                pub fn $get(&self) -> $t {
                    self.core.get::<$t>($key).unwrap_or_else(|| $default)
                }

                pub fn $set(&self, value: $t) -> bool {
                    self.core.set($key, value)
                }
            )*
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinema_store::{component_types, NewGameObject, ParentRef, ProjectSettings};
    use serde_json::json;

    struct Probe {
        core: ComponentCore,
    }

    crate::props! {
        Probe {
            "speed" => speed / set_speed: f64 = 1.5,
            "label" => label / set_label: String = String::from("probe"),
        }
    }

    fn probe() -> (Rc<Store>, Probe) {
        let store = Rc::new(Store::new());
        store.create_project("p", ProjectSettings::default());
        let scene = store.create_scene("s").unwrap();
        let layer = store.create_layer(&scene, "l", true).unwrap();
        let go = store
            .create_game_object(NewGameObject::new(ParentRef::Layer(layer), "g"))
            .unwrap();
        let id = store
            .add_component(&go, "Probe", Probe::default_props())
            .unwrap();
        let core = ComponentCore::new(store.clone(), id, "Probe", go);
        (store, Probe { core })
    }

    #[test]
    fn test_declared_fields_route_to_store() {
        let (store, probe) = probe();
        assert_eq!(probe.speed(), 1.5);
        assert!(probe.set_speed(4.0));
        let stored = store.with_state(|s| s.component(&probe.core.id).unwrap().props["speed"].clone());
        assert_eq!(stored, json!(4.0));
        assert_eq!(probe.speed(), 4.0);
    }

    #[test]
    fn test_getter_reads_external_writes() {
        let (store, probe) = probe();
        store.set_prop(&probe.core.id, "label", json!("renamed"));
        assert_eq!(probe.label(), "renamed");
    }

    #[test]
    fn test_unseen_prop_becomes_tracked() {
        let (_store, probe) = probe();
        assert!(probe.core.is_tracked("speed"));
        assert!(!probe.core.is_tracked("extra"));
        probe.core.set("extra", 7);
        assert!(probe.core.is_tracked("extra"));
        assert_eq!(probe.core.get::<i64>("extra"), Some(7));
    }

    #[test]
    fn test_malformed_prop_falls_back_to_default() {
        let (store, probe) = probe();
        store.set_prop(&probe.core.id, "speed", json!("fast"));
        assert_eq!(probe.speed(), 1.5);
        assert_eq!(Probe::DECLARED_PROPS, &["speed", "label"]);
    }

    #[test]
    fn test_enabled_bypasses_props() {
        let (store, probe) = probe();
        assert!(probe.core.enabled());
        probe.core.set_enabled(false);
        assert!(!probe.core.enabled());
        let props = store.with_state(|s| s.component(&probe.core.id).unwrap().props.clone());
        assert!(!props.contains_key("enabled"));
        assert!(store
            .with_state(|s| s.component_of_type(&probe.core.game_object_id, component_types::TRANSFORM).is_some()));
    }
}
