use serde::{Deserialize, Serialize};

use kinema_core::value::{PropMap, PropValue};
use kinema_core::{BezierCurve, Easing};

use crate::ids::{ClipId, ComponentId, GameObjectId, LayerId, ParentRef, ProjectId, SceneId};
use crate::layer::TimelineClip;
use crate::project::ProjectSettings;

/// One state transition of the store.
///
/// Creation actions carry ids allocated by the caller, so applying an action
/// is deterministic and an action log can be replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Action {
    // -- Project --
    CreateProject {
        id: ProjectId,
        name: String,
        settings: ProjectSettings,
        created_at: u64,
    },
    RenameProject {
        name: String,
    },
    SetTotalFrames {
        total_frames: u32,
    },
    /// Also resets the playback rate.
    SetProjectFps {
        fps: u32,
    },
    SetCanvasSize {
        width: u32,
        height: u32,
    },
    SetAnimationEndFrame {
        frame: Option<i64>,
    },
    SetCurrentScene {
        scene_id: SceneId,
    },

    // -- Scene --
    CreateScene {
        id: SceneId,
        name: String,
    },
    DeleteScene {
        scene_id: SceneId,
    },
    RenameScene {
        scene_id: SceneId,
        name: String,
    },

    // -- Layer --
    CreateLayer {
        id: LayerId,
        scene_id: SceneId,
        name: String,
        has_timeline: bool,
    },
    DeleteLayer {
        layer_id: LayerId,
    },
    RenameLayer {
        layer_id: LayerId,
        name: String,
    },
    SetLayerVisible {
        layer_id: LayerId,
        visible: bool,
    },
    SetLayerLocked {
        layer_id: LayerId,
        locked: bool,
    },
    SetLayerHasTimeline {
        layer_id: LayerId,
        has_timeline: bool,
    },
    ReorderLayer {
        layer_id: LayerId,
        index: usize,
    },
    AddKeyframeMarker {
        layer_id: LayerId,
        frame: u32,
    },
    RemoveKeyframeMarker {
        layer_id: LayerId,
        frame: u32,
    },

    // -- Timeline clips --
    AddClip {
        layer_id: LayerId,
        clip: TimelineClip,
    },
    RemoveClip {
        layer_id: LayerId,
        clip_id: ClipId,
    },
    MoveClip {
        layer_id: LayerId,
        clip_id: ClipId,
        start_frame: u32,
    },
    ResizeClip {
        layer_id: LayerId,
        clip_id: ClipId,
        length: u32,
    },
    MergeClips {
        layer_id: LayerId,
        first: ClipId,
        second: ClipId,
    },
    SplitClip {
        layer_id: LayerId,
        clip_id: ClipId,
        at_frame: u32,
        new_clip_id: ClipId,
    },

    // -- Game objects --
    /// Creates the bare record; components are attached by follow-up actions.
    CreateGameObject {
        id: GameObjectId,
        parent: ParentRef,
        name: String,
        born_frame_id: u32,
    },
    DeleteGameObject {
        game_object_id: GameObjectId,
    },
    RenameGameObject {
        game_object_id: GameObjectId,
        name: String,
    },
    ReparentGameObject {
        game_object_id: GameObjectId,
        parent: ParentRef,
        index: Option<usize>,
    },
    SetGameObjectActive {
        game_object_id: GameObjectId,
        active: bool,
    },
    SetBornFrame {
        game_object_id: GameObjectId,
        frame: u32,
    },

    // -- Components --
    AddComponent {
        id: ComponentId,
        game_object_id: GameObjectId,
        component_type: String,
        props: PropMap,
    },
    RemoveComponent {
        component_id: ComponentId,
    },
    /// Merges `patch` into the component's props.
    UpdateProps {
        component_id: ComponentId,
        patch: PropMap,
    },
    ReplaceProps {
        component_id: ComponentId,
        props: PropMap,
    },
    SetComponentEnabled {
        component_id: ComponentId,
        enabled: bool,
    },

    // -- Keyframes --
    SetKeyFrame {
        component_id: ComponentId,
        prop: String,
        frame: u32,
        value: PropValue,
    },
    RemoveKeyFrame {
        component_id: ComponentId,
        prop: String,
        frame: u32,
    },
    SetEasing {
        component_id: ComponentId,
        prop: String,
        frame: u32,
        easing: Easing,
        bezier_curve: Option<BezierCurve>,
    },

    // -- Playback --
    SetCurrentFrame {
        frame: u32,
    },
    SetPlaying {
        playing: bool,
    },
    SetPlaybackFps {
        fps: u32,
    },

    /// Applied atomically; subscribers are notified once.
    Batch {
        actions: Vec<Action>,
    },
}

impl Action {
    /// Short operation name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::CreateProject { .. } => "createProject",
            Action::RenameProject { .. } => "renameProject",
            Action::SetTotalFrames { .. } => "setTotalFrames",
            Action::SetProjectFps { .. } => "setProjectFps",
            Action::SetCanvasSize { .. } => "setCanvasSize",
            Action::SetAnimationEndFrame { .. } => "setAnimationEndFrame",
            Action::SetCurrentScene { .. } => "setCurrentScene",
            Action::CreateScene { .. } => "createScene",
            Action::DeleteScene { .. } => "deleteScene",
            Action::RenameScene { .. } => "renameScene",
            Action::CreateLayer { .. } => "createLayer",
            Action::DeleteLayer { .. } => "deleteLayer",
            Action::RenameLayer { .. } => "renameLayer",
            Action::SetLayerVisible { .. } => "setLayerVisible",
            Action::SetLayerLocked { .. } => "setLayerLocked",
            Action::SetLayerHasTimeline { .. } => "setLayerHasTimeline",
            Action::ReorderLayer { .. } => "reorderLayer",
            Action::AddKeyframeMarker { .. } => "addKeyframeMarker",
            Action::RemoveKeyframeMarker { .. } => "removeKeyframeMarker",
            Action::AddClip { .. } => "addClip",
            Action::RemoveClip { .. } => "removeClip",
            Action::MoveClip { .. } => "moveClip",
            Action::ResizeClip { .. } => "resizeClip",
            Action::MergeClips { .. } => "mergeClips",
            Action::SplitClip { .. } => "splitClip",
            Action::CreateGameObject { .. } => "createGameObject",
            Action::DeleteGameObject { .. } => "deleteGameObject",
            Action::RenameGameObject { .. } => "renameGameObject",
            Action::ReparentGameObject { .. } => "reparentGameObject",
            Action::SetGameObjectActive { .. } => "setGameObjectActive",
            Action::SetBornFrame { .. } => "setBornFrame",
            Action::AddComponent { .. } => "addComponent",
            Action::RemoveComponent { .. } => "removeComponent",
            Action::UpdateProps { .. } => "updateProps",
            Action::ReplaceProps { .. } => "replaceProps",
            Action::SetComponentEnabled { .. } => "setComponentEnabled",
            Action::SetKeyFrame { .. } => "setKeyFrame",
            Action::RemoveKeyFrame { .. } => "removeKeyFrame",
            Action::SetEasing { .. } => "setEasing",
            Action::SetCurrentFrame { .. } => "setCurrentFrame",
            Action::SetPlaying { .. } => "setPlaying",
            Action::SetPlaybackFps { .. } => "setPlaybackFps",
            Action::Batch { .. } => "batch",
        }
    }
}
