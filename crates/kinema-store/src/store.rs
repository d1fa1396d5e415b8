//! The shared store handle: owns the current [`StoreState`], applies actions
//! and notifies subscribers synchronously.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use kinema_core::value::{PropMap, PropValue};
use kinema_core::{BezierCurve, Easing};

use crate::action::Action;
use crate::component::{component_types, default_transform_props};
use crate::game_object::NewGameObject;
use crate::ids::{ClipId, ComponentId, GameObjectId, LayerId, ParentRef, ProjectId, SceneId};
use crate::layer::TimelineClip;
use crate::project::{now_millis, ProjectSettings};
use crate::reducer::{parent_exists, reduce};
use crate::state::StoreState;

/// Handle returned by [`Store::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

type Listener = Rc<RefCell<dyn FnMut(&StoreState)>>;

/// Single-threaded entity store.
///
/// Every operation applies fully before any subscriber runs. Subscribers are
/// called in registration order with the new state. A dispatch issued from
/// inside a subscriber is applied at once; subscribers then get another
/// round with the resulting state once the current round has finished.
pub struct Store {
    state: RefCell<StoreState>,
    listeners: RefCell<Vec<(SubscriberId, Listener)>>,
    next_subscriber: Cell<u64>,
    notifying: Cell<bool>,
    pending: Cell<bool>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(StoreState::default()),
            listeners: RefCell::new(Vec::new()),
            next_subscriber: Cell::new(0),
            notifying: Cell::new(false),
            pending: Cell::new(false),
        }
    }

    /// A snapshot of the current state. Cheap: only `Rc` pointers are cloned.
    pub fn state(&self) -> StoreState {
        self.state.borrow().clone()
    }

    /// Borrow the current state without cloning.
    ///
    /// The borrow must be released before dispatching.
    pub fn read(&self) -> Ref<'_, StoreState> {
        self.state.borrow()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Apply an action and notify subscribers. Returns whether state changed.
    ///
    /// Subscribers run even when nothing changed; observers that care
    /// compare snapshots by pointer.
    pub fn dispatch(&self, action: Action) -> bool {
        let changed = {
            let mut state = self.state.borrow_mut();
            reduce(&mut state, &action)
        };
        tracing::debug!(action = action.kind(), changed, "dispatch");
        self.notify();
        changed
    }

    /// Apply several actions atomically with a single notification.
    pub fn batch(&self, actions: Vec<Action>) -> bool {
        self.dispatch(Action::Batch { actions })
    }

    pub fn subscribe(&self, listener: impl FnMut(&StoreState) + 'static) -> SubscriberId {
        let id = SubscriberId(self.next_subscriber.get());
        self.next_subscriber.set(id.0 + 1);
        self.listeners
            .borrow_mut()
            .push((id, Rc::new(RefCell::new(listener))));
        id
    }

    /// Returns false when `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn notify(&self) {
        if self.notifying.get() {
            self.pending.set(true);
            return;
        }
        self.notifying.set(true);
        loop {
            self.pending.set(false);
            let snapshot = self.state();
            let round: Vec<(SubscriberId, Listener)> = self.listeners.borrow().clone();
            for (id, listener) in round {
                let still_subscribed = self.listeners.borrow().iter().any(|(sid, _)| *sid == id);
                if !still_subscribed {
                    continue;
                }
                match listener.try_borrow_mut() {
                    Ok(mut callback) => (&mut *callback)(&snapshot),
                    Err(_) => tracing::warn!(?id, "subscriber is already running; skipped"),
                };
            }
            if !self.pending.get() {
                break;
            }
        }
        self.notifying.set(false);
    }

    // -- Project --

    pub fn create_project(&self, name: impl Into<String>, settings: ProjectSettings) -> ProjectId {
        let id = ProjectId::generate();
        self.dispatch(Action::CreateProject {
            id: id.clone(),
            name: name.into(),
            settings,
            created_at: now_millis(),
        });
        id
    }

    pub fn rename_project(&self, name: impl Into<String>) -> bool {
        self.dispatch(Action::RenameProject { name: name.into() })
    }

    pub fn set_total_frames(&self, total_frames: u32) -> bool {
        self.dispatch(Action::SetTotalFrames { total_frames })
    }

    pub fn set_project_fps(&self, fps: u32) -> bool {
        self.dispatch(Action::SetProjectFps { fps })
    }

    pub fn set_canvas_size(&self, width: u32, height: u32) -> bool {
        self.dispatch(Action::SetCanvasSize { width, height })
    }

    pub fn set_animation_end_frame(&self, frame: Option<i64>) -> bool {
        self.dispatch(Action::SetAnimationEndFrame { frame })
    }

    pub fn set_current_scene(&self, scene_id: &SceneId) -> bool {
        self.dispatch(Action::SetCurrentScene {
            scene_id: scene_id.clone(),
        })
    }

    // -- Scene --

    /// `None` when there is no current project.
    pub fn create_scene(&self, name: impl Into<String>) -> Option<SceneId> {
        let id = SceneId::generate();
        self.dispatch(Action::CreateScene {
            id: id.clone(),
            name: name.into(),
        })
        .then_some(id)
    }

    pub fn delete_scene(&self, scene_id: &SceneId) -> bool {
        self.dispatch(Action::DeleteScene {
            scene_id: scene_id.clone(),
        })
    }

    pub fn rename_scene(&self, scene_id: &SceneId, name: impl Into<String>) -> bool {
        self.dispatch(Action::RenameScene {
            scene_id: scene_id.clone(),
            name: name.into(),
        })
    }

    // -- Layer --

    pub fn create_layer(
        &self,
        scene_id: &SceneId,
        name: impl Into<String>,
        has_timeline: bool,
    ) -> Option<LayerId> {
        let id = LayerId::generate();
        self.dispatch(Action::CreateLayer {
            id: id.clone(),
            scene_id: scene_id.clone(),
            name: name.into(),
            has_timeline,
        })
        .then_some(id)
    }

    pub fn delete_layer(&self, layer_id: &LayerId) -> bool {
        self.dispatch(Action::DeleteLayer {
            layer_id: layer_id.clone(),
        })
    }

    pub fn rename_layer(&self, layer_id: &LayerId, name: impl Into<String>) -> bool {
        self.dispatch(Action::RenameLayer {
            layer_id: layer_id.clone(),
            name: name.into(),
        })
    }

    pub fn set_layer_visible(&self, layer_id: &LayerId, visible: bool) -> bool {
        self.dispatch(Action::SetLayerVisible {
            layer_id: layer_id.clone(),
            visible,
        })
    }

    pub fn set_layer_locked(&self, layer_id: &LayerId, locked: bool) -> bool {
        self.dispatch(Action::SetLayerLocked {
            layer_id: layer_id.clone(),
            locked,
        })
    }

    pub fn set_layer_has_timeline(&self, layer_id: &LayerId, has_timeline: bool) -> bool {
        self.dispatch(Action::SetLayerHasTimeline {
            layer_id: layer_id.clone(),
            has_timeline,
        })
    }

    pub fn reorder_layer(&self, layer_id: &LayerId, index: usize) -> bool {
        self.dispatch(Action::ReorderLayer {
            layer_id: layer_id.clone(),
            index,
        })
    }

    pub fn add_keyframe_marker(&self, layer_id: &LayerId, frame: u32) -> bool {
        self.dispatch(Action::AddKeyframeMarker {
            layer_id: layer_id.clone(),
            frame,
        })
    }

    pub fn remove_keyframe_marker(&self, layer_id: &LayerId, frame: u32) -> bool {
        self.dispatch(Action::RemoveKeyframeMarker {
            layer_id: layer_id.clone(),
            frame,
        })
    }

    // -- Timeline clips --

    /// `None` when the layer is missing or the clip would overlap another.
    pub fn add_clip(&self, layer_id: &LayerId, start_frame: u32, length: u32) -> Option<ClipId> {
        let id = ClipId::generate();
        self.dispatch(Action::AddClip {
            layer_id: layer_id.clone(),
            clip: TimelineClip::new(id.clone(), start_frame, length),
        })
        .then_some(id)
    }

    pub fn remove_clip(&self, layer_id: &LayerId, clip_id: &ClipId) -> bool {
        self.dispatch(Action::RemoveClip {
            layer_id: layer_id.clone(),
            clip_id: clip_id.clone(),
        })
    }

    pub fn move_clip(&self, layer_id: &LayerId, clip_id: &ClipId, start_frame: u32) -> bool {
        self.dispatch(Action::MoveClip {
            layer_id: layer_id.clone(),
            clip_id: clip_id.clone(),
            start_frame,
        })
    }

    pub fn resize_clip(&self, layer_id: &LayerId, clip_id: &ClipId, length: u32) -> bool {
        self.dispatch(Action::ResizeClip {
            layer_id: layer_id.clone(),
            clip_id: clip_id.clone(),
            length,
        })
    }

    pub fn merge_clips(&self, layer_id: &LayerId, first: &ClipId, second: &ClipId) -> bool {
        self.dispatch(Action::MergeClips {
            layer_id: layer_id.clone(),
            first: first.clone(),
            second: second.clone(),
        })
    }

    /// Returns the id of the new right-hand clip.
    pub fn split_clip(&self, layer_id: &LayerId, clip_id: &ClipId, at_frame: u32) -> Option<ClipId> {
        let new_clip_id = ClipId::generate();
        self.dispatch(Action::SplitClip {
            layer_id: layer_id.clone(),
            clip_id: clip_id.clone(),
            at_frame,
            new_clip_id: new_clip_id.clone(),
        })
        .then_some(new_clip_id)
    }

    // -- Game objects --

    /// Create a game object with its Transform and Timeline components, in
    /// one notification. `None` when the parent does not exist.
    pub fn create_game_object(&self, spec: NewGameObject) -> Option<GameObjectId> {
        if !self.with_state(|s| parent_exists(s, &spec.parent)) {
            tracing::debug!(parent = %spec.parent, "createGameObject: no such parent");
            return None;
        }
        let id = GameObjectId::generate();
        let mut transform = default_transform_props();
        transform.extend(spec.transform);
        self.batch(vec![
            Action::CreateGameObject {
                id: id.clone(),
                parent: spec.parent,
                name: spec.name,
                born_frame_id: spec.born_frame_id,
            },
            Action::AddComponent {
                id: ComponentId::generate(),
                game_object_id: id.clone(),
                component_type: component_types::TRANSFORM.into(),
                props: transform,
            },
            Action::AddComponent {
                id: ComponentId::generate(),
                game_object_id: id.clone(),
                component_type: component_types::TIMELINE.into(),
                props: PropMap::new(),
            },
        ])
        .then_some(id)
    }

    /// Non-cascading: children and components stay in the store.
    pub fn delete_game_object(&self, game_object_id: &GameObjectId) -> bool {
        self.dispatch(Action::DeleteGameObject {
            game_object_id: game_object_id.clone(),
        })
    }

    pub fn rename_game_object(&self, game_object_id: &GameObjectId, name: impl Into<String>) -> bool {
        self.dispatch(Action::RenameGameObject {
            game_object_id: game_object_id.clone(),
            name: name.into(),
        })
    }

    pub fn reparent_game_object(
        &self,
        game_object_id: &GameObjectId,
        parent: ParentRef,
        index: Option<usize>,
    ) -> bool {
        self.dispatch(Action::ReparentGameObject {
            game_object_id: game_object_id.clone(),
            parent,
            index,
        })
    }

    pub fn set_game_object_active(&self, game_object_id: &GameObjectId, active: bool) -> bool {
        self.dispatch(Action::SetGameObjectActive {
            game_object_id: game_object_id.clone(),
            active,
        })
    }

    pub fn set_born_frame(&self, game_object_id: &GameObjectId, frame: u32) -> bool {
        self.dispatch(Action::SetBornFrame {
            game_object_id: game_object_id.clone(),
            frame,
        })
    }

    // -- Components --

    pub fn add_component(
        &self,
        game_object_id: &GameObjectId,
        component_type: impl Into<String>,
        props: PropMap,
    ) -> Option<ComponentId> {
        let id = ComponentId::generate();
        self.dispatch(Action::AddComponent {
            id: id.clone(),
            game_object_id: game_object_id.clone(),
            component_type: component_type.into(),
            props,
        })
        .then_some(id)
    }

    pub fn remove_component(&self, component_id: &ComponentId) -> bool {
        self.dispatch(Action::RemoveComponent {
            component_id: component_id.clone(),
        })
    }

    pub fn update_props(&self, component_id: &ComponentId, patch: PropMap) -> bool {
        self.dispatch(Action::UpdateProps {
            component_id: component_id.clone(),
            patch,
        })
    }

    /// Single-property convenience over [`Store::update_props`].
    pub fn set_prop(&self, component_id: &ComponentId, name: &str, value: PropValue) -> bool {
        let mut patch = PropMap::new();
        patch.insert(name.to_string(), value);
        self.update_props(component_id, patch)
    }

    pub fn replace_props(&self, component_id: &ComponentId, props: PropMap) -> bool {
        self.dispatch(Action::ReplaceProps {
            component_id: component_id.clone(),
            props,
        })
    }

    pub fn set_component_enabled(&self, component_id: &ComponentId, enabled: bool) -> bool {
        self.dispatch(Action::SetComponentEnabled {
            component_id: component_id.clone(),
            enabled,
        })
    }

    // -- Keyframes --

    pub fn set_key_frame(
        &self,
        component_id: &ComponentId,
        prop: &str,
        frame: u32,
        value: PropValue,
    ) -> bool {
        self.dispatch(Action::SetKeyFrame {
            component_id: component_id.clone(),
            prop: prop.to_string(),
            frame,
            value,
        })
    }

    pub fn remove_key_frame(&self, component_id: &ComponentId, prop: &str, frame: u32) -> bool {
        self.dispatch(Action::RemoveKeyFrame {
            component_id: component_id.clone(),
            prop: prop.to_string(),
            frame,
        })
    }

    pub fn set_easing(
        &self,
        component_id: &ComponentId,
        prop: &str,
        frame: u32,
        easing: Easing,
        bezier_curve: Option<BezierCurve>,
    ) -> bool {
        self.dispatch(Action::SetEasing {
            component_id: component_id.clone(),
            prop: prop.to_string(),
            frame,
            easing,
            bezier_curve,
        })
    }

    // -- Playback --

    pub fn set_current_frame(&self, frame: u32) -> bool {
        self.dispatch(Action::SetCurrentFrame { frame })
    }

    pub fn set_playing(&self, playing: bool) -> bool {
        self.dispatch(Action::SetPlaying { playing })
    }

    pub fn set_playback_fps(&self, fps: u32) -> bool {
        self.dispatch(Action::SetPlaybackFps { fps })
    }
}
