//! The pure state transition function of the store.

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::rc::Rc;

use crate::action::Action;
use crate::component::{component_types, Component};
use crate::game_object::GameObject;
use crate::ids::{GameObjectId, ParentRef};
use crate::keyframe;
use crate::layer::Layer;
use crate::project::{now_millis, Playback, Project};
use crate::scene::Scene;
use crate::state::{fresh, StoreState};
use crate::timeline;

/// Apply `action` to `state`; returns whether anything changed.
///
/// Actions that target a missing id, or that would not alter anything,
/// leave every pointer in `state` untouched.
pub fn reduce(state: &mut StoreState, action: &Action) -> bool {
    match action {
        // -- Project --
        Action::CreateProject {
            id,
            name,
            settings,
            created_at,
        } => {
            let project = Project {
                id: id.clone(),
                name: name.clone(),
                scene_ids: Vec::new(),
                current_scene_id: None,
                settings: settings.clone(),
                created_at: *created_at,
                modified_at: *created_at,
            };
            fresh(&mut state.projects).insert(id.clone(), Rc::new(project));
            state.current_project_id = Some(id.clone());
            state.playback = Rc::new(Playback {
                current_frame: 0,
                is_playing: false,
                fps: settings.fps,
            });
            true
        }
        Action::RenameProject { name } => update_project(state, |p| p.name = name.clone()),
        Action::SetTotalFrames { total_frames } => {
            update_project(state, |p| p.settings.total_frames = *total_frames)
        }
        Action::SetProjectFps { fps } => {
            let changed = update_project(state, |p| p.settings.fps = *fps);
            set_playback(state, |pb| pb.fps = *fps) || changed
        }
        Action::SetCanvasSize { width, height } => update_project(state, |p| {
            p.settings.width = *width;
            p.settings.height = *height;
        }),
        Action::SetAnimationEndFrame { frame } => {
            update_project(state, |p| p.settings.animation_end_frame = *frame)
        }
        Action::SetCurrentScene { scene_id } => update_project(state, |p| {
            if p.scene_ids.contains(scene_id) {
                p.current_scene_id = Some(scene_id.clone());
            } else {
                tracing::debug!(scene = %scene_id, "setCurrentScene: scene not in project");
            }
        }),

        // -- Scene --
        Action::CreateScene { id, name } => {
            if state.current_project().is_none() {
                tracing::debug!("createScene: no current project");
                return false;
            }
            if state.scenes.contains_key(id) {
                tracing::warn!(scene = %id, "createScene: id already in use");
                return false;
            }
            fresh(&mut state.scenes).insert(id.clone(), Rc::new(Scene::new(id.clone(), name.clone())));
            update_project(state, |p| {
                p.scene_ids.push(id.clone());
                if p.current_scene_id.is_none() {
                    p.current_scene_id = Some(id.clone());
                }
            });
            true
        }
        Action::DeleteScene { scene_id } => {
            if !remove_entry(&mut state.scenes, scene_id) {
                return false;
            }
            update_project(state, |p| {
                p.scene_ids.retain(|s| s != scene_id);
                if p.current_scene_id.as_ref() == Some(scene_id) {
                    p.current_scene_id = p.scene_ids.first().cloned();
                }
            });
            true
        }
        Action::RenameScene { scene_id, name } => {
            update(&mut state.scenes, scene_id, |s| s.name = name.clone())
        }

        // -- Layer --
        Action::CreateLayer {
            id,
            scene_id,
            name,
            has_timeline,
        } => {
            if state.layers.contains_key(id) {
                tracing::warn!(layer = %id, "createLayer: id already in use");
                return false;
            }
            if !update(&mut state.scenes, scene_id, |s| s.layer_ids.push(id.clone())) {
                return false;
            }
            let mut layer = Layer::new(id.clone(), scene_id.clone(), name.clone());
            layer.has_timeline = *has_timeline;
            fresh(&mut state.layers).insert(id.clone(), Rc::new(layer));
            true
        }
        Action::DeleteLayer { layer_id } => {
            let Some(scene_id) = state.layer(layer_id).map(|l| l.scene_id.clone()) else {
                tracing::debug!(layer = %layer_id, "deleteLayer: no such layer");
                return false;
            };
            update(&mut state.scenes, &scene_id, |s| s.layer_ids.retain(|l| l != layer_id));
            remove_entry(&mut state.layers, layer_id)
        }
        Action::RenameLayer { layer_id, name } => {
            update(&mut state.layers, layer_id, |l| l.name = name.clone())
        }
        Action::SetLayerVisible { layer_id, visible } => {
            update(&mut state.layers, layer_id, |l| l.visible = *visible)
        }
        Action::SetLayerLocked { layer_id, locked } => {
            update(&mut state.layers, layer_id, |l| l.locked = *locked)
        }
        Action::SetLayerHasTimeline {
            layer_id,
            has_timeline,
        } => update(&mut state.layers, layer_id, |l| l.has_timeline = *has_timeline),
        Action::ReorderLayer { layer_id, index } => {
            let Some(scene_id) = state.layer(layer_id).map(|l| l.scene_id.clone()) else {
                tracing::debug!(layer = %layer_id, "reorderLayer: no such layer");
                return false;
            };
            update(&mut state.scenes, &scene_id, |s| {
                if let Some(pos) = s.layer_ids.iter().position(|l| l == layer_id) {
                    let id = s.layer_ids.remove(pos);
                    let index = (*index).min(s.layer_ids.len());
                    s.layer_ids.insert(index, id);
                }
            })
        }
        Action::AddKeyframeMarker { layer_id, frame } => {
            update(&mut state.layers, layer_id, |l| {
                if let Err(idx) = l.keyframe_markers.binary_search(frame) {
                    l.keyframe_markers.insert(idx, *frame);
                }
            })
        }
        Action::RemoveKeyframeMarker { layer_id, frame } => {
            update(&mut state.layers, layer_id, |l| l.keyframe_markers.retain(|f| f != frame))
        }

        // -- Timeline clips --
        Action::AddClip { layer_id, clip } => update(&mut state.layers, layer_id, |l| {
            refuse_logged(layer_id, timeline::add_clip(&mut l.clips, clip.clone()));
        }),
        Action::RemoveClip { layer_id, clip_id } => update(&mut state.layers, layer_id, |l| {
            timeline::remove_clip(&mut l.clips, clip_id);
        }),
        Action::MoveClip {
            layer_id,
            clip_id,
            start_frame,
        } => update(&mut state.layers, layer_id, |l| {
            refuse_logged(layer_id, timeline::move_clip(&mut l.clips, clip_id, *start_frame));
        }),
        Action::ResizeClip {
            layer_id,
            clip_id,
            length,
        } => update(&mut state.layers, layer_id, |l| {
            refuse_logged(layer_id, timeline::resize_clip(&mut l.clips, clip_id, *length));
        }),
        Action::MergeClips {
            layer_id,
            first,
            second,
        } => update(&mut state.layers, layer_id, |l| {
            refuse_logged(layer_id, timeline::merge_clips(&mut l.clips, first, second));
        }),
        Action::SplitClip {
            layer_id,
            clip_id,
            at_frame,
            new_clip_id,
        } => update(&mut state.layers, layer_id, |l| {
            refuse_logged(
                layer_id,
                timeline::split_clip(&mut l.clips, clip_id, *at_frame, new_clip_id.clone()),
            );
        }),

        // -- Game objects --
        Action::CreateGameObject {
            id,
            parent,
            name,
            born_frame_id,
        } => {
            if state.game_objects.contains_key(id) {
                tracing::warn!(game_object = %id, "createGameObject: id already in use");
                return false;
            }
            if !attach(state, id, parent, None) {
                tracing::debug!(%parent, "createGameObject: no such parent");
                return false;
            }
            let mut go = GameObject::new(id.clone(), parent.clone(), name.clone());
            go.born_frame_id = *born_frame_id;
            go.active = state.current_frame() >= *born_frame_id;
            fresh(&mut state.game_objects).insert(id.clone(), Rc::new(go));
            true
        }
        Action::DeleteGameObject { game_object_id } => {
            let Some(parent) = state.game_object(game_object_id).map(|g| g.parent.clone()) else {
                tracing::debug!(game_object = %game_object_id, "deleteGameObject: no such object");
                return false;
            };
            detach(state, game_object_id, &parent);
            remove_entry(&mut state.game_objects, game_object_id)
        }
        Action::RenameGameObject {
            game_object_id,
            name,
        } => update(&mut state.game_objects, game_object_id, |g| g.name = name.clone()),
        Action::ReparentGameObject {
            game_object_id,
            parent,
            index,
        } => reparent(state, game_object_id, parent, *index),
        Action::SetGameObjectActive {
            game_object_id,
            active,
        } => {
            let current = state.current_frame();
            update(&mut state.game_objects, game_object_id, |g| {
                g.active = *active && current >= g.born_frame_id;
            })
        }
        Action::SetBornFrame {
            game_object_id,
            frame,
        } => {
            let current = state.current_frame();
            update(&mut state.game_objects, game_object_id, |g| {
                g.born_frame_id = *frame;
                if current < *frame {
                    g.active = false;
                }
            })
        }

        // -- Components --
        Action::AddComponent {
            id,
            game_object_id,
            component_type,
            props,
        } => {
            if state.components.contains_key(id) {
                tracing::warn!(component = %id, "addComponent: id already in use");
                return false;
            }
            if component_types::is_mandatory(component_type)
                && state
                    .component_of_type(game_object_id, component_type)
                    .is_some()
            {
                tracing::warn!(
                    game_object = %game_object_id,
                    component_type = %component_type,
                    "addComponent: object already has this component"
                );
                return false;
            }
            let is_transform = component_type == component_types::TRANSFORM;
            let attached = update(&mut state.game_objects, game_object_id, |g| {
                if is_transform {
                    g.component_ids.insert(0, id.clone());
                } else {
                    g.component_ids.push(id.clone());
                }
            });
            if !attached {
                tracing::debug!(game_object = %game_object_id, "addComponent: no such object");
                return false;
            }
            let component = Component::new(
                id.clone(),
                component_type.clone(),
                game_object_id.clone(),
                props.clone(),
            );
            fresh(&mut state.components).insert(id.clone(), Rc::new(component));
            true
        }
        Action::RemoveComponent { component_id } => {
            let Some((owner, type_tag)) = state
                .component(component_id)
                .map(|c| (c.parent_id.clone(), c.type_tag.clone()))
            else {
                tracing::debug!(component = %component_id, "removeComponent: no such component");
                return false;
            };
            // mandatory components go only once their owner is gone
            if component_types::is_mandatory(&type_tag) && state.game_object(&owner).is_some() {
                tracing::warn!(component = %component_id, %type_tag, "removeComponent: component is mandatory");
                return false;
            }
            update(&mut state.game_objects, &owner, |g| {
                g.component_ids.retain(|c| c != component_id)
            });
            remove_entry(&mut state.components, component_id)
        }
        Action::UpdateProps {
            component_id,
            patch,
        } => update(&mut state.components, component_id, |c| {
            if patch.iter().all(|(k, v)| c.props.get(k) == Some(v)) {
                return;
            }
            let mut props = (*c.props).clone();
            props.extend(patch.iter().map(|(k, v)| (k.clone(), v.clone())));
            c.props = Rc::new(props);
        }),
        Action::ReplaceProps {
            component_id,
            props,
        } => update(&mut state.components, component_id, |c| {
            if *c.props != *props {
                c.props = Rc::new(props.clone());
            }
        }),
        Action::SetComponentEnabled {
            component_id,
            enabled,
        } => update(&mut state.components, component_id, |c| c.enabled = *enabled),

        // -- Keyframes --
        Action::SetKeyFrame {
            component_id,
            prop,
            frame,
            value,
        } => update(&mut state.components, component_id, |c| {
            let track = c.key_frames.entry(prop.clone()).or_default();
            keyframe::upsert(track, *frame, value.clone());
        }),
        Action::RemoveKeyFrame {
            component_id,
            prop,
            frame,
        } => update(&mut state.components, component_id, |c| {
            if let Some(track) = c.key_frames.get_mut(prop) {
                keyframe::remove(track, *frame);
                if track.is_empty() {
                    c.key_frames.remove(prop);
                }
            }
        }),
        Action::SetEasing {
            component_id,
            prop,
            frame,
            easing,
            bezier_curve,
        } => update(&mut state.components, component_id, |c| {
            match c.key_frames.get_mut(prop) {
                Some(track) => {
                    if !keyframe::set_easing(track, *frame, *easing, *bezier_curve) {
                        tracing::debug!(component = %component_id, %prop, frame, "setEasing: no keyframe at frame");
                    }
                }
                None => tracing::debug!(component = %component_id, %prop, "setEasing: property has no keyframes"),
            }
        }),

        // -- Playback --
        Action::SetCurrentFrame { frame } => {
            let moved = set_playback(state, |pb| pb.current_frame = *frame);
            retire_unborn(state) || moved
        }
        Action::SetPlaying { playing } => set_playback(state, |pb| pb.is_playing = *playing),
        Action::SetPlaybackFps { fps } => set_playback(state, |pb| pb.fps = *fps),

        Action::Batch { actions } => actions
            .iter()
            .fold(false, |changed, action| reduce(state, action) || changed),
    }
}

/// Copy-on-write update of one record. Installs a fresh record (and a fresh
/// map) only when `f` actually changed something.
fn update<K, V>(map: &mut Rc<HashMap<K, Rc<V>>>, id: &K, f: impl FnOnce(&mut V)) -> bool
where
    K: Eq + Hash + Clone + Display,
    V: Clone + PartialEq,
{
    let Some(current) = map.get(id) else {
        tracing::debug!(%id, "no such entity; operation ignored");
        return false;
    };
    let mut next = V::clone(current);
    f(&mut next);
    if next == **current {
        return false;
    }
    fresh(map).insert(id.clone(), Rc::new(next));
    true
}

fn remove_entry<K, V>(map: &mut Rc<HashMap<K, Rc<V>>>, id: &K) -> bool
where
    K: Eq + Hash + Clone + Display,
    V: Clone,
{
    if !map.contains_key(id) {
        tracing::debug!(%id, "no such entity; nothing removed");
        return false;
    }
    fresh(map).remove(id);
    true
}

fn update_project(state: &mut StoreState, f: impl FnOnce(&mut Project)) -> bool {
    let Some(id) = state.current_project_id.clone() else {
        tracing::debug!("no current project; operation ignored");
        return false;
    };
    update(&mut state.projects, &id, |p| {
        let before = p.clone();
        f(p);
        if *p != before {
            p.modified_at = now_millis().max(before.modified_at);
        }
    })
}

fn set_playback(state: &mut StoreState, f: impl FnOnce(&mut Playback)) -> bool {
    let mut next = (*state.playback).clone();
    f(&mut next);
    if next == *state.playback {
        return false;
    }
    state.playback = Rc::new(next);
    true
}

/// Clear `active` on every game object not yet born at the current frame.
fn retire_unborn(state: &mut StoreState) -> bool {
    let frame = state.current_frame();
    let unborn: Vec<GameObjectId> = state
        .game_objects
        .values()
        .filter(|g| g.active && frame < g.born_frame_id)
        .map(|g| g.id.clone())
        .collect();
    unborn.iter().fold(false, |changed, id| {
        update(&mut state.game_objects, id, |g| g.active = false) || changed
    })
}

fn refuse_logged(layer: &crate::ids::LayerId, result: Result<(), timeline::ClipRefusal>) {
    if let Err(refusal) = result {
        tracing::warn!(%layer, %refusal, "clip edit refused");
    }
}

pub(crate) fn parent_exists(state: &StoreState, parent: &ParentRef) -> bool {
    match parent {
        ParentRef::Layer(id) => state.layers.contains_key(id),
        ParentRef::GameObject(id) => state.game_objects.contains_key(id),
    }
}

fn attach(state: &mut StoreState, id: &GameObjectId, parent: &ParentRef, index: Option<usize>) -> bool {
    let insert = |list: &mut Vec<GameObjectId>| match index {
        Some(i) => list.insert(i.min(list.len()), id.clone()),
        None => list.push(id.clone()),
    };
    match parent {
        ParentRef::Layer(layer_id) => {
            update(&mut state.layers, layer_id, |l| insert(&mut l.game_object_ids))
        }
        ParentRef::GameObject(parent_id) => {
            update(&mut state.game_objects, parent_id, |g| insert(&mut g.child_ids))
        }
    }
}

fn detach(state: &mut StoreState, id: &GameObjectId, parent: &ParentRef) -> bool {
    match parent {
        ParentRef::Layer(layer_id) => update(&mut state.layers, layer_id, |l| {
            l.game_object_ids.retain(|g| g != id)
        }),
        ParentRef::GameObject(parent_id) => update(&mut state.game_objects, parent_id, |g| {
            g.child_ids.retain(|c| c != id)
        }),
    }
}

fn reparent(
    state: &mut StoreState,
    id: &GameObjectId,
    parent: &ParentRef,
    index: Option<usize>,
) -> bool {
    let Some(old_parent) = state.game_object(id).map(|g| g.parent.clone()) else {
        tracing::debug!(game_object = %id, "reparentGameObject: no such object");
        return false;
    };
    if !parent_exists(state, parent) {
        tracing::debug!(%parent, "reparentGameObject: no such parent");
        return false;
    }
    if let ParentRef::GameObject(target) = parent {
        if state.is_ancestor_or_self(id, target) {
            tracing::warn!(game_object = %id, %parent, "reparentGameObject: would create a cycle");
            return false;
        }
    }
    detach(state, id, &old_parent);
    attach(state, id, parent, index);
    update(&mut state.game_objects, id, |g| g.parent = parent.clone());
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{ComponentId, LayerId, ProjectId, SceneId};
    use crate::project::ProjectSettings;
    use kinema_core::value::PropMap;
    use serde_json::json;

    fn seeded() -> StoreState {
        let mut state = StoreState::default();
        let actions = vec![
            Action::CreateProject {
                id: ProjectId::new("p"),
                name: "demo".into(),
                settings: ProjectSettings::custom(640, 480, 24, 100),
                created_at: 1,
            },
            Action::CreateScene {
                id: SceneId::new("s"),
                name: "main".into(),
            },
            Action::CreateLayer {
                id: LayerId::new("l"),
                scene_id: SceneId::new("s"),
                name: "layer".into(),
                has_timeline: true,
            },
            Action::CreateGameObject {
                id: GameObjectId::new("g"),
                parent: ParentRef::Layer(LayerId::new("l")),
                name: "ball".into(),
                born_frame_id: 0,
            },
            Action::AddComponent {
                id: ComponentId::new("t"),
                game_object_id: GameObjectId::new("g"),
                component_type: component_types::TRANSFORM.into(),
                props: crate::component::default_transform_props(),
            },
        ];
        for action in &actions {
            assert!(reduce(&mut state, action), "{} should apply", action.kind());
        }
        state
    }

    fn patch(key: &str, value: serde_json::Value) -> PropMap {
        let mut p = PropMap::new();
        p.insert(key.into(), value);
        p
    }

    #[test]
    fn test_scene_becomes_current() {
        let state = seeded();
        assert_eq!(state.current_scene().unwrap().id, SceneId::new("s"));
        assert_eq!(state.scene(&SceneId::new("s")).unwrap().layer_ids.len(), 1);
    }

    #[test]
    fn test_missing_component_update_is_noop() {
        let mut state = seeded();
        let before = state.clone();
        let changed = reduce(
            &mut state,
            &Action::UpdateProps {
                component_id: ComponentId::new("missing"),
                patch: patch("x", json!(1)),
            },
        );
        assert!(!changed);
        assert!(Rc::ptr_eq(&before.components, &state.components));
    }

    #[test]
    fn test_identical_patch_keeps_identity() {
        let mut state = seeded();
        let before = state.clone();
        let changed = reduce(
            &mut state,
            &Action::UpdateProps {
                component_id: ComponentId::new("t"),
                patch: patch("x", json!(0.0)),
            },
        );
        assert!(!changed);
        assert!(Rc::ptr_eq(&before.components, &state.components));
    }

    #[test]
    fn test_props_update_allocates_new_props_only_for_target() {
        let mut state = seeded();
        let before = state.clone();
        reduce(
            &mut state,
            &Action::UpdateProps {
                component_id: ComponentId::new("t"),
                patch: patch("x", json!(42)),
            },
        );
        let old = before.component(&ComponentId::new("t")).unwrap();
        let new = state.component(&ComponentId::new("t")).unwrap();
        assert!(!Rc::ptr_eq(&old.props, &new.props));
        assert_eq!(new.props["x"], json!(42));
        assert_eq!(new.props["scaleX"], json!(1.0));
        assert!(Rc::ptr_eq(&before.layers, &state.layers));
        assert!(Rc::ptr_eq(&before.game_objects, &state.game_objects));
    }

    #[test]
    fn test_delete_game_object_does_not_cascade() {
        let mut state = seeded();
        reduce(
            &mut state,
            &Action::DeleteGameObject {
                game_object_id: GameObjectId::new("g"),
            },
        );
        assert!(state.game_object(&GameObjectId::new("g")).is_none());
        assert!(state.layer(&LayerId::new("l")).unwrap().game_object_ids.is_empty());
        assert!(state.component(&ComponentId::new("t")).is_some());
    }

    #[test]
    fn test_transform_is_mandatory_and_unique() {
        let mut state = seeded();
        assert!(!reduce(
            &mut state,
            &Action::RemoveComponent {
                component_id: ComponentId::new("t")
            }
        ));
        assert!(!reduce(
            &mut state,
            &Action::AddComponent {
                id: ComponentId::new("t2"),
                game_object_id: GameObjectId::new("g"),
                component_type: component_types::TRANSFORM.into(),
                props: PropMap::new(),
            }
        ));
    }

    #[test]
    fn test_remove_last_keyframe_drops_track() {
        let mut state = seeded();
        let id = ComponentId::new("t");
        reduce(
            &mut state,
            &Action::SetKeyFrame {
                component_id: id.clone(),
                prop: "x".into(),
                frame: 3,
                value: json!(1),
            },
        );
        assert!(state.component(&id).unwrap().key_frames.contains_key("x"));
        reduce(
            &mut state,
            &Action::RemoveKeyFrame {
                component_id: id.clone(),
                prop: "x".into(),
                frame: 3,
            },
        );
        assert!(!state.component(&id).unwrap().key_frames.contains_key("x"));
    }

    #[test]
    fn test_reparent_refuses_cycle() {
        let mut state = seeded();
        reduce(
            &mut state,
            &Action::CreateGameObject {
                id: GameObjectId::new("child"),
                parent: ParentRef::GameObject(GameObjectId::new("g")),
                name: "child".into(),
                born_frame_id: 0,
            },
        );
        assert!(!reduce(
            &mut state,
            &Action::ReparentGameObject {
                game_object_id: GameObjectId::new("g"),
                parent: ParentRef::GameObject(GameObjectId::new("child")),
                index: None,
            }
        ));
        assert!(reduce(
            &mut state,
            &Action::ReparentGameObject {
                game_object_id: GameObjectId::new("child"),
                parent: ParentRef::Layer(LayerId::new("l")),
                index: Some(0),
            }
        ));
        let layer = state.layer(&LayerId::new("l")).unwrap();
        assert_eq!(layer.game_object_ids[0], GameObjectId::new("child"));
        assert!(state.game_object(&GameObjectId::new("g")).unwrap().child_ids.is_empty());
    }

    #[test]
    fn test_refused_clip_edit_changes_nothing() {
        let mut state = seeded();
        let layer_id = LayerId::new("l");
        reduce(
            &mut state,
            &Action::AddClip {
                layer_id: layer_id.clone(),
                clip: crate::layer::TimelineClip::new("a".into(), 0, 10),
            },
        );
        let before = state.clone();
        assert!(!reduce(
            &mut state,
            &Action::AddClip {
                layer_id,
                clip: crate::layer::TimelineClip::new("b".into(), 5, 10),
            }
        ));
        assert!(Rc::ptr_eq(&before.layers, &state.layers));
    }

    #[test]
    fn test_set_project_fps_updates_playback() {
        let mut state = seeded();
        reduce(&mut state, &Action::SetProjectFps { fps: 60 });
        assert_eq!(state.playback.fps, 60);
        assert_eq!(state.current_project().unwrap().settings.fps, 60);
    }

    #[test]
    fn test_batch_reports_change() {
        let mut state = seeded();
        let changed = reduce(
            &mut state,
            &Action::Batch {
                actions: vec![
                    Action::SetCurrentFrame { frame: 0 },
                    Action::SetCurrentFrame { frame: 9 },
                ],
            },
        );
        assert!(changed);
        assert_eq!(state.current_frame(), 9);
    }
}
