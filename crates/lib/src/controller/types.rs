//! Error and report types for the recipe lifecycle.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::state::{LifecycleState, Phase};
use crate::backend::{BackendError, BuildStep};
use crate::recipe::PackageIdentity;
use crate::recipe::export::ExportError;
use crate::util::hash::ContentHash;

/// Errors returned by lifecycle phases.
///
/// Every error ends the current phase; none are retried.
#[derive(Debug, Error)]
pub enum RecipeError {
  /// The `os` setting is not the one platform this recipe builds for.
  #[error("unsupported platform: {0}")]
  PlatformUnsupported(String),

  /// `build` ran without a toolchain descriptor from `generate`.
  #[error("configuration missing: run generate before build")]
  ConfigurationMissing,

  /// The backend failed during configure, build or install.
  #[error("{step} step failed: {diagnostic}")]
  BuildFailed {
    step: BuildStep,
    code: Option<i32>,
    diagnostic: String,
  },

  /// `package` ran without compiled artifacts from `build`.
  #[error("artifacts missing: run build before package")]
  ArtifactsMissing,

  /// A phase was invoked from a state that does not precede it.
  #[error("cannot run {phase} while the recipe is {state}")]
  PhaseOutOfOrder { phase: Phase, state: LifecycleState },

  #[error(transparent)]
  Export(#[from] ExportError),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl RecipeError {
  pub(crate) fn backend(step: BuildStep, err: BackendError) -> Self {
    Self::BuildFailed {
      step,
      code: err.code(),
      diagnostic: err.diagnostic(),
    }
  }
}

/// One installed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagedFile {
  /// Path relative to the package directory, `/`-separated.
  pub path: String,
  pub size: u64,
  pub sha256: ContentHash,
}

/// Result of a successful `package` phase, also persisted as the package
/// manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageReport {
  pub package: PackageIdentity,
  pub package_dir: PathBuf,
  pub files: Vec<PackagedFile>,
}
