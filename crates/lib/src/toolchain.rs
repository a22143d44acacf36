//! Toolchain descriptor.
//!
//! `generate` turns the build settings and the recipe's generator into a
//! descriptor and writes three artifacts into the context's `generators/`
//! directory:
//!
//! - `toolchain.json`: the serialized descriptor and its fingerprint, read
//!   back by `build`
//! - `mrt_toolchain.cmake`: the toolchain file passed to CMake
//! - `mrt_paths.cmake`: module/prefix paths for the exported `cmake/` helpers
//!
//! Rendering depends only on the descriptor (no absolute paths, no
//! timestamps), so identical settings always produce byte-identical files.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::consts::{APP_NAME, DESCRIPTOR_FILENAME, PATHS_FILENAME, TOOLCHAIN_FILENAME};
use crate::platform::arch::Arch;
use crate::recipe::{Generator, PackageIdentity};
use crate::settings::BuildSettings;
use crate::util::hash::{Hashable, ObjectHash};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainDescriptor {
  pub package: PackageIdentity,
  pub settings: BuildSettings,
  pub generator: Generator,
  /// CMake variables set by the toolchain file, sorted by name.
  pub variables: BTreeMap<String, String>,
}

impl Hashable for ToolchainDescriptor {}

#[derive(Serialize)]
struct DescriptorRecord<'a> {
  fingerprint: ObjectHash,
  #[serde(flatten)]
  descriptor: &'a ToolchainDescriptor,
}

#[derive(Deserialize)]
struct StoredDescriptor {
  fingerprint: ObjectHash,
  #[serde(flatten)]
  descriptor: ToolchainDescriptor,
}

impl ToolchainDescriptor {
  pub fn new(package: &PackageIdentity, settings: &BuildSettings, generator: &Generator) -> Self {
    Self {
      package: package.clone(),
      settings: settings.clone(),
      generator: generator.clone(),
      variables: cmake_variables(settings),
    }
  }

  /// Render the CMake toolchain file.
  pub fn render_toolchain(&self) -> String {
    let mut out = String::new();
    out.push_str(&format!(
      "# Toolchain for {} generated by {}. Do not edit.\n",
      self.package, APP_NAME
    ));
    out.push_str(&format!("# {}\n", self.settings));
    out.push_str(&format!("# generator: {}\n\n", self.generator));
    out.push_str("include_guard()\n\n");
    for (name, value) in &self.variables {
      out.push_str(&format!("set({} \"{}\")\n", name, escape(value)));
    }
    out.push_str(&format!("\ninclude(\"${{CMAKE_CURRENT_LIST_DIR}}/{}\")\n", PATHS_FILENAME));
    out
  }

  /// Render the paths file that exposes the exported `cmake/` directory to
  /// `include()` and `find_package()`.
  pub fn render_paths(&self) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Paths for {} generated by {}. Do not edit.\n\n", self.package, APP_NAME));
    out.push_str("get_filename_component(MRT_HELPERS_DIR \"${CMAKE_CURRENT_LIST_DIR}/../source/cmake\" ABSOLUTE)\n");
    out.push_str("list(PREPEND CMAKE_MODULE_PATH \"${MRT_HELPERS_DIR}\")\n");
    out.push_str("list(PREPEND CMAKE_PREFIX_PATH \"${MRT_HELPERS_DIR}\")\n");
    out
  }

  /// Serialize the descriptor with its fingerprint, as stored in `toolchain.json`.
  pub fn to_json(&self) -> Result<String, serde_json::Error> {
    let record = DescriptorRecord {
      fingerprint: self.compute_hash()?,
      descriptor: self,
    };
    let mut json = serde_json::to_string_pretty(&record)?;
    json.push('\n');
    Ok(json)
  }

  /// Write the descriptor and both CMake files into `dir`, replacing previous
  /// versions atomically.
  pub fn write_to(&self, dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let json = self.to_json().map_err(std::io::Error::other)?;
    write_atomic(dir, DESCRIPTOR_FILENAME, &json)?;
    write_atomic(dir, TOOLCHAIN_FILENAME, &self.render_toolchain())?;
    write_atomic(dir, PATHS_FILENAME, &self.render_paths())?;
    info!(dir = %dir.display(), generator = %self.generator, "wrote toolchain");
    Ok(())
  }

  /// Read a stored descriptor, rejecting it when the recorded fingerprint
  /// does not match its content.
  pub fn read_from(path: &Path) -> std::io::Result<Self> {
    let content = std::fs::read_to_string(path)?;
    let stored: StoredDescriptor = serde_json::from_str(&content).map_err(std::io::Error::other)?;
    let actual = stored.descriptor.compute_hash().map_err(std::io::Error::other)?;
    if actual != stored.fingerprint {
      return Err(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!(
          "{}: fingerprint {} does not match content ({})",
          path.display(),
          stored.fingerprint,
          actual
        ),
      ));
    }
    Ok(stored.descriptor)
  }
}

/// Derive the CMake variables for a set of build settings.
///
/// Values that the recipe cannot map are still passed through verbatim so
/// CMake reports them; the recipe itself does not validate them.
fn cmake_variables(settings: &BuildSettings) -> BTreeMap<String, String> {
  let mut vars = BTreeMap::new();
  vars.insert("CMAKE_BUILD_TYPE".to_string(), settings.build_type.clone());

  let arch = Arch::from_setting(&settings.arch)
    .map(|a| a.apple_name().to_string())
    .unwrap_or_else(|| settings.arch.clone());
  vars.insert("CMAKE_OSX_ARCHITECTURES".to_string(), arch);

  if let Some((cc, cxx)) = compiler_drivers(&settings.compiler) {
    vars.insert("CMAKE_C_COMPILER".to_string(), cc.to_string());
    vars.insert("CMAKE_CXX_COMPILER".to_string(), cxx.to_string());
  }
  vars.insert("MRT_COMPILER".to_string(), settings.compiler.clone());

  debug!(count = vars.len(), "derived cmake variables");
  vars
}

fn compiler_drivers(compiler: &str) -> Option<(&'static str, &'static str)> {
  match compiler {
    "apple-clang" | "clang" => Some(("clang", "clang++")),
    "gcc" => Some(("gcc", "g++")),
    _ => None,
  }
}

fn escape(value: &str) -> String {
  value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn write_atomic(dir: &Path, name: &str, content: &str) -> std::io::Result<()> {
  let mut tmp = NamedTempFile::new_in(dir)?;
  tmp.write_all(content.as_bytes())?;
  tmp.persist(dir.join(name)).map_err(|e| e.error)?;
  Ok(())
}
