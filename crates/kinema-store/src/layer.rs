use serde::{Deserialize, Serialize};

use crate::ids::{ClipId, GameObjectId, LayerId, SceneId};

/// A contiguous frame range `[start_frame, start_frame + length - 1]` on a layer's timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineClip {
    pub id: ClipId,
    pub start_frame: u32,
    pub length: u32,
}

impl TimelineClip {
    pub fn new(id: ClipId, start_frame: u32, length: u32) -> Self {
        Self {
            id,
            start_frame,
            length,
        }
    }

    /// Last frame covered by the clip (inclusive).
    pub fn end_frame(&self) -> u32 {
        self.start_frame
            .saturating_add(self.length.saturating_sub(1))
    }

    /// Whether the last frame is representable, i.e. the range does not run
    /// past `u32::MAX`.
    pub fn fits(&self) -> bool {
        self.start_frame
            .checked_add(self.length.saturating_sub(1))
            .is_some()
    }

    pub fn contains(&self, frame: u32) -> bool {
        self.length > 0 && frame >= self.start_frame && frame <= self.end_frame()
    }

    pub fn overlaps(&self, other: &TimelineClip) -> bool {
        self.length > 0
            && other.length > 0
            && self.start_frame <= other.end_frame()
            && other.start_frame <= self.end_frame()
    }
}

/// A layer in a scene: ordered game objects plus its timeline track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    /// Owning scene.
    pub scene_id: SceneId,
    /// Top-level game objects, back to front.
    pub game_object_ids: Vec<GameObjectId>,
    pub visible: bool,
    pub locked: bool,
    /// Whether the layer participates in the frame timeline.
    pub has_timeline: bool,
    /// Non-overlapping, sorted by start frame; gaps are allowed.
    pub clips: Vec<TimelineClip>,
    /// Sorted, unique frames flagged in the timeline UI.
    pub keyframe_markers: Vec<u32>,
}

impl Layer {
    pub fn new(id: LayerId, scene_id: SceneId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            scene_id,
            game_object_ids: Vec::new(),
            visible: true,
            locked: false,
            has_timeline: true,
            clips: Vec::new(),
            keyframe_markers: Vec::new(),
        }
    }

    /// The clip covering `frame`, if any.
    pub fn clip_at(&self, frame: u32) -> Option<&TimelineClip> {
        self.clips.iter().find(|c| c.contains(frame))
    }
}
