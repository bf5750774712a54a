//! Settings file and named presets.
//!
//! Settings are layered with the `config` crate: a TOML file, then
//! `CAMERA_CONFIG__*` environment overrides (`__` separates nesting levels,
//! e.g. `CAMERA_CONFIG__CAMERA__FORCE_UPDATE=true`).
//!
//! ```toml
//! [camera]
//! model = "Nikon DSC D750"
//! port = "usb:"
//! force_update = false
//!
//! [presets.night]
//! iso = "3200"
//! shutterspeed2 = "1/30"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::error::{CameraError, Result};
use crate::widget::WidgetValue;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "CAMERA_CONFIG";

/// Top-level settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// Camera selection and defaults.
    #[serde(default)]
    pub camera: CameraSettings,
    /// Named presets: preset name → widget id → value.
    #[serde(default)]
    pub presets: BTreeMap<String, BTreeMap<String, toml::Value>>,
}

/// Camera selection and defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CameraSettings {
    /// Model name as the driver lists it, for backends that open by model.
    #[serde(default)]
    pub model: Option<String>,
    /// Port path, e.g. `usb:001,004`.
    #[serde(default)]
    pub port: Option<String>,
    /// Default `force` flag when applying presets.
    #[serde(default)]
    pub force_update: bool,
}

impl Settings {
    /// Load from a TOML file, with environment overrides on top.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let s = Config::builder()
            .add_source(File::from(path.as_ref()).format(FileFormat::Toml))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let settings: Settings = s.try_deserialize()?;
        tracing::debug!(
            path = %path.as_ref().display(),
            presets = settings.presets.len(),
            "Loaded settings"
        );
        Ok(settings)
    }

    /// Parse from TOML text, without environment overrides.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let s = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?;
        Ok(s.try_deserialize()?)
    }

    /// Names of all presets, sorted.
    pub fn preset_names(&self) -> Vec<&str> {
        self.presets.keys().map(String::as_str).collect()
    }

    /// Preset by name.
    pub fn preset(&self, name: &str) -> Option<Preset> {
        self.presets.get(name).map(|entries| Preset {
            name: name.to_string(),
            entries: entries.clone(),
        })
    }
}

/// A named set of widget values.
#[derive(Debug, Clone, Default)]
pub struct Preset {
    name: String,
    entries: BTreeMap<String, toml::Value>,
}

impl Preset {
    /// Build a preset from `(id, value)` pairs.
    pub fn new<I, K>(name: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, toml::Value)>,
        K: Into<String>,
    {
        Self {
            name: name.into(),
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Preset name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the preset is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order, each converted to a widget value.
    pub fn entries(&self) -> impl Iterator<Item = (&str, Result<WidgetValue>)> + '_ {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), to_widget_value(key, value)))
    }
}

fn to_widget_value(key: &str, value: &toml::Value) -> Result<WidgetValue> {
    match value {
        toml::Value::String(s) => Ok(WidgetValue::Text(s.clone())),
        toml::Value::Integer(i) => Ok(WidgetValue::Int(*i)),
        toml::Value::Float(f) => Ok(WidgetValue::Float(*f as f32)),
        toml::Value::Boolean(b) => Ok(WidgetValue::Bool(*b)),
        toml::Value::Datetime(dt) => Ok(WidgetValue::Text(dt.to_string())),
        toml::Value::Array(_) | toml::Value::Table(_) => Err(CameraError::InvalidValue {
            id: key.to_string(),
            reason: format!("preset value must be a scalar, got {}", value.type_str()),
        }),
    }
}
