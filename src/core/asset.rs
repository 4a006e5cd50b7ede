//! Asset staging rules

use crate::core::transform::Transform;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Copy one source file into the output directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRule {
    /// Source path, relative to the pipeline root
    pub from: PathBuf,

    /// Destination relative to the output directory (defaults to the source file name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<PathBuf>,

    /// Overwrite an existing destination
    #[serde(default)]
    pub force: bool,

    /// Fail when the source is missing; otherwise the rule is skipped
    #[serde(default = "default_required")]
    pub required: bool,

    /// Content transform applied before writing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
}

fn default_required() -> bool {
    true
}

impl AssetRule {
    /// A required, non-forced verbatim copy
    pub fn new(from: impl Into<PathBuf>) -> Self {
        Self {
            from: from.into(),
            to: None,
            force: false,
            required: true,
            transform: None,
        }
    }

    pub fn to(mut self, to: impl Into<PathBuf>) -> Self {
        self.to = Some(to.into());
        self
    }

    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Destination path relative to the output directory
    ///
    /// Returns `None` when there is no explicit `to` and `from` has no file name.
    pub fn destination(&self) -> Option<PathBuf> {
        match &self.to {
            Some(to) => Some(to.clone()),
            None => self.from.file_name().map(PathBuf::from),
        }
    }

    /// Destination, only if it stays inside the output directory
    ///
    /// Absolute paths and `..` components are rejected.
    pub fn contained_destination(&self) -> Option<PathBuf> {
        self.destination().filter(|dest| {
            dest.components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        })
    }

    /// Source path resolved against `root`
    pub fn source_in(&self, root: &Path) -> PathBuf {
        root.join(&self.from)
    }
}
