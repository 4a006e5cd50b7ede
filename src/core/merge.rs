//! Base/overlay configuration merging
//!
//! A [`ConfigRecord`] carries the settings the bundler consumes. The base
//! record is shared by every environment; each environment contributes an
//! overlay. [`merge`] resolves the two into one [`EffectiveConfig`].

use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Build mode handed to the bundler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Development,
    Production,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Development => write!(f, "development"),
            Mode::Production => write!(f, "production"),
        }
    }
}

/// One configuration record, base or overlay
///
/// Every recognized field is optional. Unrecognized fields are kept in
/// `extra` and flow through the merge untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigRecord {
    /// Bundler entry point (e.g. `./bootstrap.js`)
    #[serde(default, alias = "entryPoint", skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<String>,

    /// Output directory, relative to the pipeline root
    #[serde(default, alias = "outputPath", skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,

    /// Bundle file name inside the output directory
    #[serde(default, alias = "outputFilename", skip_serializing_if = "Option::is_none")]
    pub output_filename: Option<String>,

    /// Build mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,

    /// Whether the bundler should emit performance hints
    #[serde(default, alias = "performanceHints", skip_serializing_if = "Option::is_none")]
    pub performance_hints: Option<bool>,

    /// Fields this crate does not interpret
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ConfigRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = Some(entry_point.into());
        self
    }

    pub fn with_output_path(mut self, output_path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(output_path.into());
        self
    }

    pub fn with_output_filename(mut self, output_filename: impl Into<String>) -> Self {
        self.output_filename = Some(output_filename.into());
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_performance_hints(mut self, hints: bool) -> Self {
        self.performance_hints = Some(hints);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// The merged, environment-resolved configuration
///
/// Read-only once built; the only way to obtain one is [`merge`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EffectiveConfig(ConfigRecord);

impl EffectiveConfig {
    pub fn entry_point(&self) -> Option<&str> {
        self.0.entry_point.as_deref()
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.0.output_path.as_deref()
    }

    pub fn output_filename(&self) -> Option<&str> {
        self.0.output_filename.as_deref()
    }

    pub fn mode(&self) -> Option<Mode> {
        self.0.mode
    }

    pub fn performance_hints(&self) -> Option<bool> {
        self.0.performance_hints
    }

    pub fn extra(&self) -> &BTreeMap<String, Value> {
        &self.0.extra
    }

    pub fn as_record(&self) -> &ConfigRecord {
        &self.0
    }

    pub fn into_record(self) -> ConfigRecord {
        self.0
    }

    /// Names of required fields that neither base nor overlay provided
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.0.entry_point.is_none() {
            missing.push("entry_point");
        }
        if self.0.output_path.is_none() {
            missing.push("output_path");
        }
        if self.0.output_filename.is_none() {
            missing.push("output_filename");
        }
        if self.0.mode.is_none() {
            missing.push("mode");
        }
        missing
    }

    /// Fail on the first missing required field
    pub fn require_complete(&self) -> Result<(), ConfigError> {
        match self.missing_fields().first() {
            Some(field) => Err(ConfigError::MissingField(*field)),
            None => Ok(()),
        }
    }
}

/// Merge `overlay` onto `base`, field by field
pub fn merge(base: &ConfigRecord, overlay: &ConfigRecord) -> EffectiveConfig {
    let mut extra = base.extra.clone();
    extra.extend(overlay.extra.iter().map(|(k, v)| (k.clone(), v.clone())));

    EffectiveConfig(ConfigRecord {
        entry_point: overlay.entry_point.clone().or_else(|| base.entry_point.clone()),
        output_path: overlay.output_path.clone().or_else(|| base.output_path.clone()),
        output_filename: overlay
            .output_filename
            .clone()
            .or_else(|| base.output_filename.clone()),
        mode: overlay.mode.or(base.mode),
        performance_hints: overlay.performance_hints.or(base.performance_hints),
        extra,
    })
}
