use serde::{Deserialize, Serialize};

use crate::ids::{LayerId, SceneId};

/// A scene: an ordered stack of layers (bottom to top).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: SceneId,
    pub name: String,
    pub layer_ids: Vec<LayerId>,
}

impl Scene {
    pub fn new(id: SceneId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            layer_ids: Vec::new(),
        }
    }
}
