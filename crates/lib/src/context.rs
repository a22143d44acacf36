//! Build context layout.
//!
//! A build context is a directory owned by exactly one recipe instance for
//! its whole lifecycle:
//!
//! ```text
//! <root>/
//!   source/                  exported sources
//!   generators/              toolchain descriptor and CMake files
//!   build/                   backend build tree
//!   package/                 install prefix
//!   state.json               lifecycle state
//!   package-manifest.json    installed files and their hashes
//! ```

use std::path::{Path, PathBuf};

use crate::consts::{
  DESCRIPTOR_FILENAME, PACKAGE_MANIFEST_FILENAME, PATHS_FILENAME, STATE_FILENAME, TOOLCHAIN_FILENAME,
};

pub const DEFAULT_CONTEXT_DIR: &str = "build-context";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
  root: PathBuf,
}

impl BuildContext {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Pin the context to an absolute path without creating anything.
  ///
  /// An existing root is canonicalized; a missing one is made absolute and
  /// created by the first phase that writes into it.
  pub fn resolve(root: &Path) -> std::io::Result<Self> {
    let root = if root.exists() {
      dunce::canonicalize(root)?
    } else {
      std::path::absolute(root)?
    };
    Ok(Self::new(root))
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn source_dir(&self) -> PathBuf {
    self.root.join("source")
  }

  pub fn generators_dir(&self) -> PathBuf {
    self.root.join("generators")
  }

  pub fn build_dir(&self) -> PathBuf {
    self.root.join("build")
  }

  pub fn package_dir(&self) -> PathBuf {
    self.root.join("package")
  }

  pub fn descriptor_path(&self) -> PathBuf {
    self.generators_dir().join(DESCRIPTOR_FILENAME)
  }

  pub fn toolchain_file(&self) -> PathBuf {
    self.generators_dir().join(TOOLCHAIN_FILENAME)
  }

  pub fn paths_file(&self) -> PathBuf {
    self.generators_dir().join(PATHS_FILENAME)
  }

  pub fn state_path(&self) -> PathBuf {
    self.root.join(STATE_FILENAME)
  }

  pub fn manifest_path(&self) -> PathBuf {
    self.root.join(PACKAGE_MANIFEST_FILENAME)
  }

  /// True when the build tree exists and holds at least one entry.
  pub fn has_build_artifacts(&self) -> bool {
    std::fs::read_dir(self.build_dir())
      .map(|mut entries| entries.next().is_some())
      .unwrap_or(false)
  }
}
