use kinema_store::component_types;

use crate::component::ComponentBehavior;
use crate::props::ComponentCore;

/// Editing helper present on every game object. Stores nothing of its own;
/// it exposes the keyframes of its sibling components as one track.
#[derive(Debug)]
pub struct TimelineComponent {
    pub core: ComponentCore,
}

impl TimelineComponent {
    pub fn new(core: ComponentCore) -> Self {
        Self { core }
    }

    /// Sorted, unique frames keyed by any sibling component.
    pub fn keyframe_frames(&self) -> Vec<u32> {
        self.core
            .store()
            .with_state(|s| s.game_object_keyframe_frames(&self.core.game_object_id))
    }

    /// `(component type, prop)` pairs keyed at `frame`.
    pub fn keys_at(&self, frame: u32) -> Vec<(String, String)> {
        self.core.store().with_state(|s| {
            s.components_of(&self.core.game_object_id)
                .into_iter()
                .filter(|c| !c.is_type(component_types::TIMELINE))
                .flat_map(|c| {
                    c.key_frames
                        .iter()
                        .filter(|(_, track)| track.iter().any(|k| k.frame == frame))
                        .map(|(prop, _)| (c.type_tag.clone(), prop.clone()))
                        .collect::<Vec<_>>()
                })
                .collect()
        })
    }
}

impl ComponentBehavior for TimelineComponent {
    fn core(&self) -> &ComponentCore {
        &self.core
    }
}
