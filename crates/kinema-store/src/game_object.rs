use serde::{Deserialize, Serialize};

use kinema_core::value::PropMap;

use crate::ids::{ComponentId, GameObjectId, ParentRef};

/// A node in a layer's object tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameObject {
    pub id: GameObjectId,
    pub name: String,
    /// Cached visibility, recomputed whenever the current frame changes.
    /// Always false before `born_frame_id`.
    pub active: bool,
    /// Frame from which the object may be visible.
    pub born_frame_id: u32,
    pub parent: ParentRef,
    pub child_ids: Vec<GameObjectId>,
    /// The first entry is always the Transform.
    pub component_ids: Vec<ComponentId>,
}

impl GameObject {
    pub fn new(id: GameObjectId, parent: ParentRef, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            active: true,
            born_frame_id: 0,
            parent,
            child_ids: Vec::new(),
            component_ids: Vec::new(),
        }
    }
}

/// Payload for creating a game object together with its mandatory components.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGameObject {
    pub parent: ParentRef,
    pub name: String,
    pub born_frame_id: u32,
    /// Overrides merged over the default Transform props.
    pub transform: PropMap,
}

impl NewGameObject {
    pub fn new(parent: ParentRef, name: impl Into<String>) -> Self {
        Self {
            parent,
            name: name.into(),
            born_frame_id: 0,
            transform: PropMap::new(),
        }
    }

    pub fn born_at(mut self, frame: u32) -> Self {
        self.born_frame_id = frame;
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.transform.insert("x".into(), x.into());
        self.transform.insert("y".into(), y.into());
        self
    }
}
