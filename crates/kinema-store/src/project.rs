use serde::{Deserialize, Serialize};

use crate::ids::{ProjectId, SceneId};

/// Frame timing and canvas settings of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSettings {
    pub total_frames: u32,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    /// Loop point override; ignored when negative.
    pub animation_end_frame: Option<i64>,
}

impl ProjectSettings {
    pub fn custom(width: u32, height: u32, fps: u32, total_frames: u32) -> Self {
        Self {
            total_frames,
            fps,
            width,
            height,
            animation_end_frame: None,
        }
    }
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self::from(&kinema_core::ProjectConfig::default())
    }
}

impl From<&kinema_core::ProjectConfig> for ProjectSettings {
    fn from(config: &kinema_core::ProjectConfig) -> Self {
        Self {
            total_frames: config.total_frames,
            fps: config.fps,
            width: config.width,
            height: config.height,
            animation_end_frame: config.animation_end_frame,
        }
    }
}

/// Top-level project, the root of the scene tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// Ordered scenes.
    pub scene_ids: Vec<SceneId>,
    pub current_scene_id: Option<SceneId>,
    #[serde(flatten)]
    pub settings: ProjectSettings,
    /// Unix milliseconds.
    pub created_at: u64,
    /// Unix milliseconds.
    pub modified_at: u64,
}

impl Project {
    /// Last playable frame: the end-frame override when set and non-negative,
    /// else `total_frames - 1`.
    pub fn effective_end_frame(&self) -> u32 {
        match self.settings.animation_end_frame {
            Some(end) if end >= 0 => u32::try_from(end).unwrap_or(u32::MAX),
            _ => self.settings.total_frames.saturating_sub(1),
        }
    }
}

/// Process-wide playback cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playback {
    pub current_frame: u32,
    pub is_playing: bool,
    pub fps: u32,
}

impl Default for Playback {
    fn default() -> Self {
        Self {
            current_frame: 0,
            is_playing: false,
            fps: kinema_core::ProjectConfig::default().fps,
        }
    }
}

pub(crate) fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(settings: ProjectSettings) -> Project {
        Project {
            id: ProjectId::new("p"),
            name: "demo".into(),
            scene_ids: Vec::new(),
            current_scene_id: None,
            settings,
            created_at: 0,
            modified_at: 0,
        }
    }

    #[test]
    fn test_effective_end_frame_defaults_to_last_frame() {
        let p = project(ProjectSettings::custom(640, 480, 24, 100));
        assert_eq!(p.effective_end_frame(), 99);
    }

    #[test]
    fn test_effective_end_frame_override() {
        let mut settings = ProjectSettings::custom(640, 480, 24, 100);
        settings.animation_end_frame = Some(40);
        assert_eq!(project(settings.clone()).effective_end_frame(), 40);

        settings.animation_end_frame = Some(-1);
        assert_eq!(project(settings).effective_end_frame(), 99);
    }

    #[test]
    fn test_effective_end_frame_empty_project() {
        let p = project(ProjectSettings::custom(640, 480, 24, 0));
        assert_eq!(p.effective_end_frame(), 0);
    }

    #[test]
    fn test_settings_flatten_on_wire() {
        let value = serde_json::to_value(project(ProjectSettings::custom(1, 2, 3, 4))).unwrap();
        assert_eq!(value["totalFrames"], 4);
        assert_eq!(value["fps"], 3);
    }
}
