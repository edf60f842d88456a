//! # Launcher Configuration
//!
//! One TOML file under the user's config directory holds every tunable of the
//! launcher: where applications live, how the wheel moves, which GPIO lines
//! carry which buttons. A missing file is written out with defaults on first
//! start; missing keys fall back to their defaults so older files keep
//! loading after new settings are added.

use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = "carousel";
const CONFIG_FILE: &str = "config.toml";
const MAX_FRAME_RATE: u32 = 240;

/// Logical screen size the launcher lays out for
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ScreenConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: 480.0,
            height: 270.0,
        }
    }
}

/// Wheel shape and motion
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct WheelConfig {
    pub radius_x: f32,
    pub radius_y: f32,
    pub vertical_offset: f32,
    /// Fraction of the remaining angle closed per frame
    pub smoothing: f64,
    pub snap_threshold_deg: f64,
    /// The highlighted item only zooms this close to its target
    pub zoom_window_deg: f64,
    pub zoom_factor: f32,
    /// Edge length of a thumbnail at rest, pixels
    pub thumbnail_size: f32,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            radius_x: 150.0,
            radius_y: 40.0,
            vertical_offset: 40.0,
            smoothing: 0.15,
            snap_threshold_deg: 1.0,
            zoom_window_deg: 6.0,
            zoom_factor: 2.0,
            thumbnail_size: 40.0,
        }
    }
}

/// BCM pin numbers of the navigation buttons
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PinConfig {
    pub up: u8,
    pub down: u8,
    pub left: u8,
    pub right: u8,
    pub confirm: u8,
    pub cancel: u8,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            up: 17,
            down: 18,
            left: 27,
            right: 22,
            confirm: 23,
            cancel: 24,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    pub poll_interval_ms: u64,
    pub debounce_ms: u64,
    pub power_button_pin: u8,
    pub queue_capacity: usize,
    pub pins: PinConfig,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10,
            debounce_ms: 200,
            power_button_pin: 5,
            queue_capacity: 256,
            pins: PinConfig::default(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct StatusConfig {
    pub network_poll_secs: u64,
    /// Address the network probe routes towards; nothing is sent to it
    pub probe_target: String,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            network_poll_secs: 3,
            probe_target: "8.8.8.8:80".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SplashConfig {
    pub enabled: bool,
    pub title: String,
}

impl Default for SplashConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            title: "Carousel".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct LauncherConfig {
    /// Directory scanned for applications, one subdirectory each
    pub apps_dir: PathBuf,
    /// File that marks a subdirectory as an application and is executed
    pub entry_point: String,
    /// Program the entry point is handed to
    pub interpreter: String,
    pub thumbnail_name: String,
    pub frame_rate: u32,
    pub fullscreen: bool,
    pub screen: ScreenConfig,
    pub wheel: WheelConfig,
    pub input: InputConfig,
    pub status: StatusConfig,
    pub splash: SplashConfig,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            apps_dir: PathBuf::from("games"),
            entry_point: "main.py".to_string(),
            interpreter: "python".to_string(),
            thumbnail_name: "thumbnail.png".to_string(),
            frame_rate: 60,
            fullscreen: false,
            screen: ScreenConfig::default(),
            wheel: WheelConfig::default(),
            input: InputConfig::default(),
            status: StatusConfig::default(),
            splash: SplashConfig::default(),
        }
    }
}

impl LauncherConfig {
    /// `<config_dir>/carousel/config.toml`, or the working directory if the
    /// platform has no config directory
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| {
            warn!("Could not determine config directory, using current directory");
            PathBuf::from(".")
        });
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        path
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| eyre!("Failed to parse launcher config: {}", e))?;
        Ok(config.sanitized())
    }

    /// Replaces values the frame loop cannot run with by usable ones
    pub fn sanitized(mut self) -> Self {
        let defaults = WheelConfig::default();

        if !(1..=MAX_FRAME_RATE).contains(&self.frame_rate) {
            let clamped = self.frame_rate.clamp(1, MAX_FRAME_RATE);
            warn!("frame_rate {} out of range, using {}", self.frame_rate, clamped);
            self.frame_rate = clamped;
        }

        let wheel = &mut self.wheel;
        if !(wheel.smoothing > 0.0 && wheel.smoothing <= 1.0) {
            warn!(
                "wheel.smoothing {} must be in (0, 1], using {}",
                wheel.smoothing, defaults.smoothing
            );
            wheel.smoothing = defaults.smoothing;
        }
        if !(wheel.snap_threshold_deg.is_finite() && wheel.snap_threshold_deg > 0.0) {
            warn!(
                "wheel.snap_threshold_deg {} must be positive, using {}",
                wheel.snap_threshold_deg, defaults.snap_threshold_deg
            );
            wheel.snap_threshold_deg = defaults.snap_threshold_deg;
        }

        self
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;
        Self::from_toml(&content)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| eyre!("Failed to serialize launcher config: {}", e))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| eyre!("Failed to write config file {}: {}", path.display(), e))?;
        debug!("Wrote config to {}", path.display());
        Ok(())
    }

    /// Loads the config at `path`, writing the defaults there first if the
    /// file does not exist yet
    pub async fn load_or_create(path: &Path) -> Result<Self> {
        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check config file {}: {}", path.display(), e))?;

        if !exists {
            info!("No config at {}, writing defaults", path.display());
            let config = Self::default();
            config.save(path).await?;
            return Ok(config);
        }

        let config = Self::load(path).await?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = LauncherConfig::from_toml(
            r#"
            apps_dir = "/opt/apps"

            [input]
            debounce_ms = 150

            [input.pins]
            confirm = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.apps_dir, PathBuf::from("/opt/apps"));
        assert_eq!(config.input.debounce_ms, 150);
        assert_eq!(config.input.pins.confirm, 4);
        assert_eq!(config.input.pins.left, 27);
        assert_eq!(config.wheel, WheelConfig::default());
        assert_eq!(config.frame_rate, 60);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(LauncherConfig::from_toml("frame_rate = \"fast\"").is_err());
    }

    #[test]
    fn unusable_motion_values_are_replaced() {
        let config = LauncherConfig::from_toml(
            r#"
            frame_rate = 2000000000

            [wheel]
            smoothing = nan
            snap_threshold_deg = 0.0
            "#,
        )
        .unwrap();

        assert_eq!(config.frame_rate, MAX_FRAME_RATE);
        assert_eq!(config.wheel.smoothing, WheelConfig::default().smoothing);
        assert_eq!(
            config.wheel.snap_threshold_deg,
            WheelConfig::default().snap_threshold_deg
        );

        let stopped = LauncherConfig::from_toml("frame_rate = 0").unwrap();
        assert_eq!(stopped.frame_rate, 1);
    }

    #[tokio::test]
    async fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let created = LauncherConfig::load_or_create(&path).await.unwrap();
        assert_eq!(created, LauncherConfig::default());
        assert!(path.exists());

        let reloaded = LauncherConfig::load_or_create(&path).await.unwrap();
        assert_eq!(reloaded, created);
    }
}
