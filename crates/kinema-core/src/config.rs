use serde::{Deserialize, Serialize};

use crate::error::KinemaResult;

/// Defaults for the project created when an engine starts.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectConfig {
    pub name: String,
    pub fps: u32,
    pub total_frames: u32,
    pub width: u32,
    pub height: u32,
    /// Overrides `total_frames - 1` as the loop point when set and non-negative.
    #[serde(default)]
    pub animation_end_frame: Option<i64>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "Untitled".to_string(),
            fps: 24,
            total_frames: 120,
            width: 1280,
            height: 720,
            animation_end_frame: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackConfig {
    pub autoplay: bool,
    pub loop_playback: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            autoplay: false,
            loop_playback: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub filter: String, // tracing EnvFilter directive, e.g. "info,kinema_store=debug"
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct KinemaConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl KinemaConfig {
    pub fn from_toml_str(contents: &str) -> KinemaResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load_from_file(path: &std::path::Path) -> KinemaResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn save_to_file(&self, path: &std::path::Path) -> KinemaResult<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = KinemaConfig::from_toml_str("").unwrap();
        assert_eq!(config.project.fps, 24);
        assert_eq!(config.project.total_frames, 120);
        assert!(config.project.animation_end_frame.is_none());
        assert!(config.playback.loop_playback);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_partial_project_section() {
        let config = KinemaConfig::from_toml_str(
            r#"
            [project]
            name = "Bounce"
            fps = 30
            total_frames = 60
            width = 640
            height = 480
            animation_end_frame = 45
            "#,
        )
        .unwrap();
        assert_eq!(config.project.name, "Bounce");
        assert_eq!(config.project.animation_end_frame, Some(45));
        assert!(!config.playback.autoplay);
    }

    #[test]
    fn test_invalid_config_is_error() {
        assert!(KinemaConfig::from_toml_str("[project]\nfps = \"fast\"").is_err());
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = std::env::temp_dir().join(format!("kinema-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("kinema.toml");

        let mut config = KinemaConfig::default();
        config.project.fps = 12;
        config.save_to_file(&path).unwrap();

        let loaded = KinemaConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.project.fps, 12);
        std::fs::remove_dir_all(&dir).ok();
    }
}
