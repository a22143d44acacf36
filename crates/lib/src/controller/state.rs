//! Lifecycle state machine.
//!
//! `Uninitialized → Generated → Built → Packaged`, strictly linear. The state
//! is persisted in the build context so each phase can run in its own
//! process.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::types::RecipeError;
use crate::recipe::PackageIdentity;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
  #[default]
  Uninitialized,
  Generated,
  Built,
  Packaged,
}

impl fmt::Display for LifecycleState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Uninitialized => "uninitialized",
      Self::Generated => "generated",
      Self::Built => "built",
      Self::Packaged => "packaged",
    };
    write!(f, "{}", name)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
  Export,
  Generate,
  Build,
  Package,
}

impl fmt::Display for Phase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Export => "export",
      Self::Generate => "generate",
      Self::Build => "build",
      Self::Package => "package",
    };
    write!(f, "{}", name)
  }
}

impl LifecycleState {
  /// Check that `phase` may run from this state.
  ///
  /// A missing predecessor reports the specific precondition that is not
  /// met; repeating or going back a phase reports `PhaseOutOfOrder`.
  /// `generate` may re-run from `Generated`, overwriting its output.
  pub fn admits(self, phase: Phase) -> Result<(), RecipeError> {
    use LifecycleState::*;

    match (phase, self) {
      (Phase::Export, Uninitialized) => Ok(()),
      (Phase::Generate, Uninitialized | Generated) => Ok(()),
      (Phase::Build, Generated) => Ok(()),
      (Phase::Build, Uninitialized) => Err(RecipeError::ConfigurationMissing),
      (Phase::Package, Built) => Ok(()),
      (Phase::Package, Uninitialized | Generated) => Err(RecipeError::ArtifactsMissing),
      (phase, state) => Err(RecipeError::PhaseOutOfOrder { phase, state }),
    }
  }
}

#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
  package: PackageIdentity,
  state: LifecycleState,
}

/// Load the persisted state, `Uninitialized` when none was saved.
pub fn load(path: &Path) -> Result<LifecycleState, RecipeError> {
  if !path.exists() {
    return Ok(LifecycleState::Uninitialized);
  }
  let content = std::fs::read_to_string(path)?;
  let file: StateFile = serde_json::from_str(&content)?;
  Ok(file.state)
}

pub fn save(path: &Path, package: &PackageIdentity, state: LifecycleState) -> Result<(), RecipeError> {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)?;
  }
  let file = StateFile {
    package: package.clone(),
    state,
  };
  std::fs::write(path, serde_json::to_string_pretty(&file)?)?;
  Ok(())
}
