use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use kinema_core::value::PropMap;

use crate::ids::{ComponentId, GameObjectId};
use crate::keyframe::KeyFrame;

/// Type tags of the built-in component kinds.
pub mod component_types {
    pub const TRANSFORM: &str = "Transform";
    pub const VISUAL: &str = "Visual";
    pub const CIRCLE_RENDERER: &str = "CircleRenderer";
    pub const RECTANGLE_RENDERER: &str = "RectangleRenderer";
    pub const TIMELINE: &str = "Timeline";

    /// Components every game object carries from creation until deletion.
    pub fn is_mandatory(type_tag: &str) -> bool {
        type_tag == TRANSFORM || type_tag == TIMELINE
    }
}

/// A component attached to a game object.
///
/// `props` sits behind its own `Rc`: every prop mutation installs a fresh
/// allocation, so observers can detect changes by pointer identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: ComponentId,
    #[serde(rename = "type")]
    pub type_tag: String,
    /// Owning game object.
    pub parent_id: GameObjectId,
    pub enabled: bool,
    pub props: Rc<PropMap>,
    /// Per-property tracks, each frame-ascending with unique frames.
    pub key_frames: BTreeMap<String, Vec<KeyFrame>>,
}

impl Component {
    pub fn new(
        id: ComponentId,
        type_tag: impl Into<String>,
        parent_id: GameObjectId,
        props: PropMap,
    ) -> Self {
        Self {
            id,
            type_tag: type_tag.into(),
            parent_id,
            enabled: true,
            props: Rc::new(props),
            key_frames: BTreeMap::new(),
        }
    }

    pub fn is_type(&self, type_tag: &str) -> bool {
        self.type_tag == type_tag
    }

    pub fn has_keyframes(&self) -> bool {
        self.key_frames.values().any(|track| !track.is_empty())
    }
}

/// Default props of a freshly created Transform.
pub fn default_transform_props() -> PropMap {
    let mut props = PropMap::new();
    props.insert("x".into(), 0.0.into());
    props.insert("y".into(), 0.0.into());
    props.insert("rotation".into(), 0.0.into());
    props.insert("scaleX".into(), 1.0.into());
    props.insert("scaleY".into(), 1.0.into());
    props
}
