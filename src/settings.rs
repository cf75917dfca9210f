use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec3;
use log::{info, warn};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SettingsError;
use crate::renderer::postprocess::PostProcessSettings;

pub const DEFAULT_SETTINGS_PATH: &str = "resources/config/default-renderer-settings.ini";
pub const USER_SETTINGS_PATH: &str = "resources/config/renderer-settings.ini";

/// Renderer options persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RendererSettings {
    #[serde(rename = "enable post-processing", default = "enabled")]
    pub enable_post_processing: bool,
    #[serde(rename = "enable v-sync", default = "enabled")]
    pub enable_vsync: bool,
    #[serde(rename = "enable fxaa", default = "enabled")]
    pub enable_fxaa: bool,
    #[serde(with = "vec3_string", default = "unit_brightness")]
    pub brightness: Vec3,
    #[serde(with = "vec3_string", default)]
    pub offset: Vec3,
    #[serde(default = "unit_saturation")]
    pub saturation: f32,
}

const fn enabled() -> bool {
    true
}

const fn unit_brightness() -> Vec3 {
    Vec3::ONE
}

const fn unit_saturation() -> f32 {
    1.0
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            enable_post_processing: true,
            enable_vsync: true,
            enable_fxaa: true,
            brightness: Vec3::ONE,
            offset: Vec3::ZERO,
            saturation: 1.0,
        }
    }
}

impl RendererSettings {
    pub fn present_mode(&self) -> wgpu::PresentMode {
        if self.enable_vsync {
            wgpu::PresentMode::Fifo
        } else {
            wgpu::PresentMode::Immediate
        }
    }

    pub fn post_process(&self) -> PostProcessSettings {
        PostProcessSettings {
            brightness: self.brightness,
            offset: self.offset,
            saturation: self.saturation,
        }
    }

    /// FXAA only runs as part of post-processing.
    pub fn fxaa_active(&self) -> bool {
        self.enable_post_processing && self.enable_fxaa
    }

    pub fn from_json(contents: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Formats a vector the way the settings files store it. Components use the
/// shortest form that parses back to the same `f32`.
pub fn format_vec3(v: Vec3) -> String {
    format!("{}, {}, {}", v.x, v.y, v.z)
}

pub fn parse_vec3(s: &str) -> Result<Vec3, SettingsError> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(SettingsError::InvalidVector(s.to_string()));
    }
    let mut values = [0.0f32; 3];
    for (value, part) in values.iter_mut().zip(parts) {
        *value = part
            .parse()
            .map_err(|_| SettingsError::InvalidVector(s.to_string()))?;
    }
    Ok(Vec3::from_array(values))
}

mod vec3_string {
    use super::*;

    pub fn serialize<S: Serializer>(v: &Vec3, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_vec3(*v))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec3, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_vec3(&s).map_err(serde::de::Error::custom)
    }
}

/// The user settings file layered over a shipped defaults file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    pub user_path: PathBuf,
    pub default_path: PathBuf,
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(USER_SETTINGS_PATH, DEFAULT_SETTINGS_PATH)
    }
}

impl SettingsStore {
    pub fn new(user_path: impl Into<PathBuf>, default_path: impl Into<PathBuf>) -> Self {
        Self {
            user_path: user_path.into(),
            default_path: default_path.into(),
        }
    }

    /// Reads the user file, falling back to the defaults file.
    pub fn load(&self) -> Result<RendererSettings, SettingsError> {
        let path = if self.user_path.exists() {
            &self.user_path
        } else if self.default_path.exists() {
            &self.default_path
        } else {
            return Err(SettingsError::MissingFile {
                path: self.user_path.clone(),
            });
        };
        let settings = read(path)?;
        info!("Loaded renderer settings from {:?}", path);
        Ok(settings)
    }

    /// Like [`SettingsStore::load`], but logs and returns defaults on failure.
    pub fn load_or_default(&self) -> RendererSettings {
        match self.load() {
            Ok(settings) => settings,
            Err(SettingsError::MissingFile { .. }) => {
                info!("No renderer settings on disk. Using default settings.");
                RendererSettings::default()
            }
            Err(err) => {
                warn!("Failed to read renderer settings ({}). Falling back to defaults.", err);
                RendererSettings::default()
            }
        }
    }

    pub fn save(&self, settings: &RendererSettings) -> Result<(), SettingsError> {
        write(&self.user_path, settings)
    }

    /// Replaces the defaults file; the user file is removed so the new
    /// defaults take effect.
    pub fn save_over_defaults(&self, settings: &RendererSettings) -> Result<(), SettingsError> {
        remove_if_exists(&self.user_path)?;
        write(&self.default_path, settings)
    }

    pub fn restore_defaults(&self) -> Result<RendererSettings, SettingsError> {
        remove_if_exists(&self.user_path)?;
        if !self.default_path.exists() {
            return Err(SettingsError::MissingFile {
                path: self.default_path.clone(),
            });
        }
        read(&self.default_path)
    }
}

fn read(path: &Path) -> Result<RendererSettings, SettingsError> {
    RendererSettings::from_json(&fs::read_to_string(path)?)
}

fn write(path: &Path, settings: &RendererSettings) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, settings.to_json()?)?;
    info!("Saved renderer settings to {:?}", path);
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<(), SettingsError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}
