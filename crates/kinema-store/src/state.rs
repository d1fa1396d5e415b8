use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use serde::Serialize;

use crate::component::Component;
use crate::game_object::GameObject;
use crate::ids::{ComponentId, GameObjectId, LayerId, ParentRef, ProjectId, SceneId};
use crate::layer::Layer;
use crate::project::{Playback, Project};
use crate::scene::Scene;

/// A normalized `id -> record` collection.
pub type EntityMap<K, V> = HashMap<K, Rc<V>>;

/// Complete store contents at one point in time.
///
/// Cloning is cheap (pointer copies). Each category, each record and each
/// component's props sit behind `Rc`; the reducer replaces exactly the
/// pointers along the path of a change, so comparing two snapshots with
/// `Rc::ptr_eq` tells which categories changed.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    pub current_project_id: Option<ProjectId>,
    pub projects: Rc<EntityMap<ProjectId, Project>>,
    pub scenes: Rc<EntityMap<SceneId, Scene>>,
    pub layers: Rc<EntityMap<LayerId, Layer>>,
    pub game_objects: Rc<EntityMap<GameObjectId, GameObject>>,
    pub components: Rc<EntityMap<ComponentId, Component>>,
    pub playback: Rc<Playback>,
}

impl StoreState {
    pub fn current_project(&self) -> Option<&Project> {
        self.current_project_id
            .as_ref()
            .and_then(|id| self.projects.get(id))
            .map(|p| p.as_ref())
    }

    pub fn current_scene(&self) -> Option<&Scene> {
        self.current_project()
            .and_then(|p| p.current_scene_id.as_ref())
            .and_then(|id| self.scene(id))
    }

    pub fn scene(&self, id: &SceneId) -> Option<&Scene> {
        self.scenes.get(id).map(|s| s.as_ref())
    }

    pub fn layer(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.get(id).map(|l| l.as_ref())
    }

    pub fn game_object(&self, id: &GameObjectId) -> Option<&GameObject> {
        self.game_objects.get(id).map(|g| g.as_ref())
    }

    pub fn component(&self, id: &ComponentId) -> Option<&Component> {
        self.components.get(id).map(|c| c.as_ref())
    }

    /// Components of a game object in attachment order; dangling ids are skipped.
    pub fn components_of(&self, id: &GameObjectId) -> Vec<&Component> {
        self.game_object(id)
            .map(|go| {
                go.component_ids
                    .iter()
                    .filter_map(|cid| self.component(cid))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// First component of the given type on a game object.
    pub fn component_of_type(&self, id: &GameObjectId, type_tag: &str) -> Option<&Component> {
        self.components_of(id)
            .into_iter()
            .find(|c| c.is_type(type_tag))
    }

    /// The layer a game object ultimately hangs from.
    pub fn layer_of(&self, id: &GameObjectId) -> Option<&Layer> {
        let mut current = self.game_object(id)?;
        // bounded by the map size in case of a corrupted (cyclic) parent chain
        for _ in 0..=self.game_objects.len() {
            match &current.parent {
                ParentRef::Layer(layer_id) => return self.layer(layer_id),
                ParentRef::GameObject(parent_id) => current = self.game_object(parent_id)?,
            }
        }
        None
    }

    /// All descendants of a game object, depth-first, excluding itself.
    pub fn descendants(&self, id: &GameObjectId) -> Vec<GameObjectId> {
        let mut out = Vec::new();
        let mut stack: Vec<GameObjectId> = self
            .game_object(id)
            .map(|go| go.child_ids.iter().rev().cloned().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            if out.contains(&next) || &next == id {
                continue;
            }
            if let Some(go) = self.game_object(&next) {
                stack.extend(go.child_ids.iter().rev().cloned());
            }
            out.push(next);
        }
        out
    }

    /// Game objects of a layer, top-level first then nested children, in tree order.
    pub fn layer_game_objects(&self, id: &LayerId) -> Vec<GameObjectId> {
        let mut out = Vec::new();
        if let Some(layer) = self.layer(id) {
            for go in &layer.game_object_ids {
                out.push(go.clone());
                out.extend(self.descendants(go));
            }
        }
        out
    }

    /// Sorted, unique frames keyed by any component of a game object.
    ///
    /// This is what the Timeline helper component shows for editing.
    pub fn game_object_keyframe_frames(&self, id: &GameObjectId) -> Vec<u32> {
        let frames: BTreeSet<u32> = self
            .components_of(id)
            .into_iter()
            .flat_map(|c| c.key_frames.values())
            .flat_map(|track| track.iter().map(|k| k.frame))
            .collect();
        frames.into_iter().collect()
    }

    /// Last playable frame of the current project (0 without a project).
    pub fn effective_end_frame(&self) -> u32 {
        self.current_project()
            .map(|p| p.effective_end_frame())
            .unwrap_or(0)
    }

    pub fn current_frame(&self) -> u32 {
        self.playback.current_frame
    }

    /// Whether `ancestor` is `id` itself or one of its parents.
    pub fn is_ancestor_or_self(&self, ancestor: &GameObjectId, id: &GameObjectId) -> bool {
        ancestor == id || self.descendants(ancestor).contains(id)
    }
}

/// Replace `rc` with a fresh allocation holding a copy of its value and
/// return it for mutation. The previous allocation stays intact for any
/// snapshot still holding it.
pub(crate) fn fresh<T: Clone>(rc: &mut Rc<T>) -> &mut T {
    let copy = T::clone(&**rc);
    *rc = Rc::new(copy);
    Rc::make_mut(rc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_changes_identity_and_keeps_old() {
        let mut a = Rc::new(vec![1, 2]);
        let old = a.clone();
        fresh(&mut a).push(3);
        assert!(!Rc::ptr_eq(&a, &old));
        assert_eq!(*old, vec![1, 2]);
        assert_eq!(*a, vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_state_queries() {
        let state = StoreState::default();
        assert!(state.current_project().is_none());
        assert!(state.current_scene().is_none());
        assert_eq!(state.effective_end_frame(), 0);
        assert!(state.descendants(&GameObjectId::new("nope")).is_empty());
    }
}
