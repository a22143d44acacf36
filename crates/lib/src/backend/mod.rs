//! Build-description consumer seam.
//!
//! The recipe never compiles anything itself. It hands a [`BackendJob`] to a
//! [`BuildBackend`], which configures, builds and installs the project. The
//! production backend is [`cmake::CMake`]; tests substitute their own.

pub mod cmake;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::toolchain::ToolchainDescriptor;

pub use cmake::{BackendConfig, CMake};

/// The backend sub-step that was running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStep {
  Configure,
  Build,
  Install,
}

impl fmt::Display for BuildStep {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Configure => "configure",
      Self::Build => "build",
      Self::Install => "install",
    };
    write!(f, "{}", name)
  }
}

/// Errors reported by a build backend.
#[derive(Debug, Error)]
pub enum BackendError {
  /// The backend program could not be started.
  #[error("failed to launch {program}: {source}")]
  Launch {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// The backend ran and reported failure.
  #[error("{program} exited with code {code:?}: {diagnostic}")]
  Failed {
    program: String,
    code: Option<i32>,
    diagnostic: String,
  },
}

impl BackendError {
  /// The text the backend produced, unmodified.
  pub fn diagnostic(&self) -> String {
    match self {
      Self::Launch { .. } => self.to_string(),
      Self::Failed { diagnostic, .. } => diagnostic.clone(),
    }
  }

  pub fn code(&self) -> Option<i32> {
    match self {
      Self::Launch { .. } => None,
      Self::Failed { code, .. } => *code,
    }
  }
}

/// Everything a backend needs to act on one build context.
#[derive(Debug, Clone, Copy)]
pub struct BackendJob<'a> {
  pub source_dir: &'a Path,
  pub build_dir: &'a Path,
  pub install_dir: &'a Path,
  pub toolchain_file: &'a Path,
  pub descriptor: &'a ToolchainDescriptor,
}

/// An external build-description consumer.
///
/// Each call blocks the lifecycle until the external tool finishes; the
/// controller issues at most one call at a time.
#[allow(async_fn_in_trait)]
pub trait BuildBackend {
  /// Resolve the build graph from the toolchain descriptor.
  async fn configure(&self, job: &BackendJob<'_>) -> Result<(), BackendError>;

  /// Compile and link.
  async fn build(&self, job: &BackendJob<'_>) -> Result<(), BackendError>;

  /// Copy the produced artifacts into `job.install_dir`.
  async fn install(&self, job: &BackendJob<'_>) -> Result<(), BackendError>;
}
