//! Viewer settings with persistence
//!
//! Settings are saved to `<config_dir>/aeroview/settings.toml`

use std::fs;
use std::path::{Path, PathBuf};

use aeroview_integration::{InferenceConfig, ReuploadPolicy};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Environment variable that overrides `inference.api_key`
pub const API_KEY_ENV: &str = "AEROVIEW_API_KEY";

/// All dashboard settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub display: DisplaySettings,
    pub viewer: ViewerSettings,
    pub analysis: AnalysisSettings,
    pub inference: InferenceConfig,
}

impl Settings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("aeroview"))
    }

    /// Get the default settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.toml"))
    }

    /// Load settings from the default location, or return defaults if not found
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => {
                warn!("Could not determine config directory");
                Self::default()
            }
        }
    }

    /// Load settings from `path`, falling back to defaults on any problem
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No settings file at {:?}, using defaults", path);
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save settings to `path`
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Save settings to the default location
    pub fn save(&self) -> anyhow::Result<()> {
        let Some(path) = Self::settings_path() else {
            anyhow::bail!("Could not determine config directory");
        };
        self.save_to(&path)
    }

    /// Frames the headless loop runs before giving up on a pending analysis:
    /// the inference timeout plus one second, at the configured frame rate.
    pub fn frame_budget(&self) -> u32 {
        let seconds = self.inference.timeout().as_secs().saturating_add(1);
        let frames = seconds.saturating_mul(u64::from(self.viewer.frame_rate.max(1)));
        u32::try_from(frames).unwrap_or(u32::MAX)
    }

    /// Inference settings with the environment override applied
    pub fn inference_config(&self) -> InferenceConfig {
        self.inference_config_with(std::env::var(API_KEY_ENV).ok())
    }

    fn inference_config_with(&self, env_key: Option<String>) -> InferenceConfig {
        match env_key.filter(|k| !k.trim().is_empty()) {
            Some(key) => self.inference.clone().with_api_key(key),
            None => self.inference.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Passed through to the presentation layer unchanged
    pub dark_mode: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self { dark_mode: true }
    }
}

/// Viewer animation and pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    /// Idle sway amplitude in radians
    pub idle_amplitude: f32,
    /// Idle sway angular frequency in radians per second
    pub idle_frequency: f32,
    /// Target frames per second of the headless loop
    pub frame_rate: u32,
    /// Upper bound on a single frame's delta, in seconds
    pub max_delta_time: f32,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            idle_amplitude: 0.1,
            idle_frequency: 1.0,
            frame_rate: 60,
            max_delta_time: 0.25,
        }
    }
}

impl ViewerSettings {
    /// Seconds per frame at the configured rate
    pub fn frame_interval(&self) -> f32 {
        1.0 / self.frame_rate.max(1) as f32
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub reupload_policy: ReuploadPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.display.dark_mode);
        assert_eq!(settings.viewer.frame_rate, 60);
        assert_eq!(settings.analysis.reupload_policy, ReuploadPolicy::Supersede);
        assert!(settings.inference.api_key().is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [display]
            dark_mode = false

            [analysis]
            reupload_policy = "reject"

            [inference]
            model = "custom"
            "#,
        )
        .unwrap();
        assert!(!settings.display.dark_mode);
        assert_eq!(settings.analysis.reupload_policy, ReuploadPolicy::Reject);
        assert_eq!(settings.inference.model, "custom");
        assert_eq!(settings.inference.top_k, 40);
        assert_eq!(settings.viewer.idle_amplitude, 0.1);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = std::env::temp_dir().join(format!("aeroview-settings-{}", std::process::id()));
        let path = dir.join("settings.toml");

        let mut settings = Settings::default();
        settings.viewer.frame_rate = 30;
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_unparsable_file_gives_defaults() {
        let path = std::env::temp_dir().join(format!("aeroview-bad-{}.toml", std::process::id()));
        fs::write(&path, "display = [[[").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_env_key_overrides_file() {
        let mut settings = Settings::default();
        settings.inference.api_key = Some("from-file".into());

        let config = settings.inference_config_with(Some("from-env".into()));
        assert_eq!(config.api_key(), Some("from-env"));

        let config = settings.inference_config_with(Some("  ".into()));
        assert_eq!(config.api_key(), Some("from-file"));
    }

    #[test]
    fn test_frame_budget_outlasts_inference_timeout() {
        let mut settings = Settings::default();
        assert_eq!(settings.frame_budget(), 31 * 60);

        settings.inference.timeout_secs = 5;
        settings.viewer.frame_rate = 30;
        assert_eq!(settings.frame_budget(), 6 * 30);
        assert!(settings.frame_budget() as f32 * settings.viewer.frame_interval() > 5.0);
    }

    #[test]
    fn test_frame_interval_guards_zero() {
        let viewer = ViewerSettings { frame_rate: 0, ..Default::default() };
        assert_eq!(viewer.frame_interval(), 1.0);
    }
}
