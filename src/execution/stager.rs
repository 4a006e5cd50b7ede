//! Asset stager - copies (and optionally transforms) files into the output directory

use crate::core::{AssetRule, StageError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, warn};

/// A file written to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedAsset {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub bytes: usize,
    pub transformed: bool,
    pub overwritten: bool,
}

/// Result of applying one rule
#[derive(Debug, Clone)]
pub enum StageEvent {
    Staged(StagedAsset),
    /// Optional source was missing
    Skipped { source: PathBuf },
    Failed { source: PathBuf, error: String },
}

/// What a staging pass did
#[derive(Debug, Clone, Default)]
pub struct StageReport {
    pub staged: Vec<StagedAsset>,
    pub skipped: Vec<PathBuf>,
}

/// Applies asset rules relative to a root directory
#[derive(Debug, Clone)]
pub struct AssetStager {
    root: PathBuf,
}

impl AssetStager {
    /// Sources resolve against `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Apply `rules` in order, writing into `output_dir`
    pub async fn stage(&self, rules: &[AssetRule], output_dir: &Path) -> Result<StageReport, StageError> {
        self.stage_observed(rules, output_dir, &|_| {}).await
    }

    /// Same as [`stage`](Self::stage), reporting each rule's outcome to `observer`
    ///
    /// A failing rule does not stop the pass: the remaining rules are still
    /// applied in order and the first failure is returned at the end.
    pub async fn stage_observed(
        &self,
        rules: &[AssetRule],
        output_dir: &Path,
        observer: &(dyn Fn(&StageEvent) + Send + Sync),
    ) -> Result<StageReport, StageError> {
        fs::create_dir_all(output_dir)
            .await
            .map_err(|source| StageError::Io {
                path: output_dir.to_path_buf(),
                source,
            })?;

        info!("Staging {} assets into {}", rules.len(), output_dir.display());

        let mut report = StageReport::default();
        let mut first_error = None;

        for rule in rules {
            let event = match self.stage_rule(rule, output_dir).await {
                Ok(Some(asset)) => {
                    report.staged.push(asset.clone());
                    StageEvent::Staged(asset)
                }
                Ok(None) => {
                    let source = rule.source_in(&self.root);
                    report.skipped.push(source.clone());
                    StageEvent::Skipped { source }
                }
                Err(e) => {
                    error!("{}", e);
                    let event = StageEvent::Failed {
                        source: rule.source_in(&self.root),
                        error: e.to_string(),
                    };
                    first_error.get_or_insert(e);
                    event
                }
            };
            observer(&event);
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    /// Apply one rule; `Ok(None)` when an optional source is absent
    async fn stage_rule(&self, rule: &AssetRule, output_dir: &Path) -> Result<Option<StagedAsset>, StageError> {
        let source = rule.source_in(&self.root);

        let content = match fs::read(&source).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if rule.required {
                    return Err(StageError::SourceNotFound(source));
                }
                warn!("Optional asset {} not found, skipping", source.display());
                return Ok(None);
            }
            Err(e) => return Err(io_error(&source, e)),
        };

        let relative = rule.destination().ok_or_else(|| {
            io_error(
                &source,
                std::io::Error::new(ErrorKind::InvalidInput, "source path has no file name"),
            )
        })?;
        if rule.contained_destination().is_none() {
            return Err(StageError::DestinationOutsideOutput(relative));
        }
        let destination = output_dir.join(relative);

        let exists = fs::try_exists(&destination)
            .await
            .map_err(|e| io_error(&destination, e))?;
        if exists && !rule.force {
            return Err(StageError::DestinationExists(destination));
        }

        let (content, transformed) = match &rule.transform {
            Some(transform) => {
                debug!("Applying {:?} to {}", transform, source.display());
                (transform.apply(&content, &source), true)
            }
            None => (content, false),
        };

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).await.map_err(|e| io_error(parent, e))?;
        }
        fs::write(&destination, &content)
            .await
            .map_err(|e| io_error(&destination, e))?;
        carry_executable_bits(&source, &destination).await?;

        debug!(
            "Staged {} -> {} ({} bytes)",
            source.display(),
            destination.display(),
            content.len()
        );

        Ok(Some(StagedAsset {
            source,
            destination,
            bytes: content.len(),
            transformed,
            overwritten: exists,
        }))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StageError {
    StageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(unix)]
async fn carry_executable_bits(source: &Path, destination: &Path) -> Result<(), StageError> {
    use std::os::unix::fs::PermissionsExt;

    let exec_bits = fs::metadata(source)
        .await
        .map_err(|e| io_error(source, e))?
        .permissions()
        .mode()
        & 0o111;
    if exec_bits == 0 {
        return Ok(());
    }

    let mut permissions = fs::metadata(destination)
        .await
        .map_err(|e| io_error(destination, e))?
        .permissions();
    permissions.set_mode(permissions.mode() | exec_bits);
    fs::set_permissions(destination, permissions)
        .await
        .map_err(|e| io_error(destination, e))
}

#[cfg(not(unix))]
async fn carry_executable_bits(_source: &Path, _destination: &Path) -> Result<(), StageError> {
    Ok(())
}
