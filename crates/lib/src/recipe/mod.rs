//! Recipe definition.
//!
//! A recipe fixes the package identity, the sources exported into the build
//! context and the generator handed to the build-description consumer. It is
//! pure data; the lifecycle that acts on it lives in [`crate::controller`].

pub mod export;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_GENERATOR, EXPORTS_SOURCES, PACKAGE_NAME, PACKAGE_VERSION};
use export::ExportManifest;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageIdentity {
  pub name: String,
  pub version: String,
}

impl PackageIdentity {
  pub fn new(name: &str, version: &str) -> Self {
    Self {
      name: name.to_string(),
      version: version.to_string(),
    }
  }
}

impl fmt::Display for PackageIdentity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.name, self.version)
  }
}

/// Name of the low-level build backend passed to CMake unmodified (`-G`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Generator(pub String);

impl Generator {
  pub fn ninja() -> Self {
    Self(DEFAULT_GENERATOR.to_string())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Generator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
  pub identity: PackageIdentity,
  pub exports: ExportManifest,
  pub generator: Generator,
}

impl Recipe {
  /// The `metalraytracing` recipe.
  pub fn metalraytracing() -> Self {
    Self {
      identity: PackageIdentity::new(PACKAGE_NAME, PACKAGE_VERSION),
      exports: ExportManifest::from_patterns(EXPORTS_SOURCES),
      generator: Generator::ninja(),
    }
  }
}
