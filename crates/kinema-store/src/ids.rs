use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Allocate a fresh, globally unique id.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a project.
    ProjectId
);
entity_id!(
    /// Unique identifier for a scene.
    SceneId
);
entity_id!(
    /// Unique identifier for a layer.
    LayerId
);
entity_id!(
    /// Unique identifier for a game object.
    GameObjectId
);
entity_id!(
    /// Unique identifier for a component.
    ComponentId
);
entity_id!(
    /// Unique identifier for a timeline clip within a layer.
    ClipId
);

/// The owner of a game object: either a layer (top level) or another game object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum ParentRef {
    Layer(LayerId),
    GameObject(GameObjectId),
}

impl std::fmt::Display for ParentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParentRef::Layer(id) => write!(f, "layer:{}", id),
            ParentRef::GameObject(id) => write!(f, "gameObject:{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = GameObjectId::generate();
        let b = GameObjectId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = LayerId::new("layer-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"layer-1\"");
    }

    #[test]
    fn test_parent_ref_wire_shape() {
        let parent = ParentRef::Layer(LayerId::new("l1"));
        assert_eq!(
            serde_json::to_value(&parent).unwrap(),
            serde_json::json!({"kind": "layer", "id": "l1"})
        );
        assert_eq!(parent.to_string(), "layer:l1");
    }
}
