//! Build settings supplied by the invoking environment.
//!
//! Settings are resolved in layers, later layers overriding earlier ones:
//! host defaults, an optional TOML profile, `MRT_SETTINGS_*` environment
//! variables and finally `key=value` pairs from the command line.
//!
//! Only the four declared keys exist. Values are not validated here; the
//! platform gate in `generate` is the only check the recipe performs.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::platform::arch::Arch;
use crate::platform::os::Os;

pub const SETTING_KEYS: [&str; 4] = ["os", "compiler", "build_type", "arch"];

const ENV_PREFIX: &str = "MRT_SETTINGS_";

#[derive(Debug, Error)]
pub enum SettingsError {
  #[error("unknown setting '{0}' (expected one of: os, compiler, build_type, arch)")]
  UnknownKey(String),

  #[error("invalid setting '{0}' (expected key=value)")]
  InvalidPair(String),

  #[error("failed to read profile {path}: {source}")]
  ReadProfile {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse profile {path}: {source}")]
  ParseProfile {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildSettings {
  pub os: String,
  pub compiler: String,
  pub build_type: String,
  pub arch: String,
}

/// On-disk profile layout.
///
/// ```toml
/// [settings]
/// os = "Macos"
/// arch = "armv8"
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Profile {
  #[serde(default)]
  settings: BTreeMap<String, String>,
}

impl BuildSettings {
  pub fn new(os: &str, compiler: &str, build_type: &str, arch: &str) -> Self {
    Self {
      os: os.to_string(),
      compiler: compiler.to_string(),
      build_type: build_type.to_string(),
      arch: arch.to_string(),
    }
  }

  /// Settings describing the machine we are running on, as a Release build.
  ///
  /// Unknown hosts get an empty `os`/`arch`, which the platform gate rejects.
  pub fn host() -> Self {
    let os = Os::current();
    Self {
      os: os.map(|o| o.as_setting()).unwrap_or_default().to_string(),
      compiler: os.map(|o| o.default_compiler()).unwrap_or_default().to_string(),
      build_type: "Release".to_string(),
      arch: Arch::current().map(|a| a.as_setting()).unwrap_or_default().to_string(),
    }
  }

  /// Resolve settings from every layer.
  pub fn resolve(profile: Option<&Path>, pairs: &[String]) -> Result<Self, SettingsError> {
    let mut settings = Self::host();
    if let Some(path) = profile {
      settings.apply_profile(path)?;
    }
    settings.apply_env();
    for pair in pairs {
      settings.apply_pair(pair)?;
    }
    debug!(settings = %settings, "resolved build settings");
    Ok(settings)
  }

  pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
    let slot = match key {
      "os" => &mut self.os,
      "compiler" => &mut self.compiler,
      "build_type" => &mut self.build_type,
      "arch" => &mut self.arch,
      _ => return Err(SettingsError::UnknownKey(key.to_string())),
    };
    *slot = value.to_string();
    Ok(())
  }

  /// Apply a `key=value` pair.
  pub fn apply_pair(&mut self, pair: &str) -> Result<(), SettingsError> {
    let (key, value) = pair
      .split_once('=')
      .ok_or_else(|| SettingsError::InvalidPair(pair.to_string()))?;
    self.set(key.trim(), value.trim())
  }

  pub fn apply_profile(&mut self, path: &Path) -> Result<(), SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::ReadProfile {
      path: path.to_path_buf(),
      source,
    })?;
    let profile: Profile = toml::from_str(&content).map_err(|source| SettingsError::ParseProfile {
      path: path.to_path_buf(),
      source,
    })?;
    for (key, value) in &profile.settings {
      self.set(key, value)?;
    }
    Ok(())
  }

  /// Apply `MRT_SETTINGS_OS`, `MRT_SETTINGS_COMPILER`, `MRT_SETTINGS_BUILD_TYPE`
  /// and `MRT_SETTINGS_ARCH` when present.
  pub fn apply_env(&mut self) {
    for key in SETTING_KEYS {
      let var = format!("{}{}", ENV_PREFIX, key.to_uppercase());
      if let Ok(value) = std::env::var(&var) {
        debug!(var = %var, value = %value, "setting from environment");
        // SETTING_KEYS only holds known keys
        let _ = self.set(key, &value);
      }
    }
  }
}

impl fmt::Display for BuildSettings {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "os={} compiler={} build_type={} arch={}",
      self.os, self.compiler, self.build_type, self.arch
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;
  use tempfile::TempDir;

  fn clear_env<F: FnOnce()>(f: F) {
    temp_env::with_vars(
      [
        ("MRT_SETTINGS_OS", None::<&str>),
        ("MRT_SETTINGS_COMPILER", None),
        ("MRT_SETTINGS_BUILD_TYPE", None),
        ("MRT_SETTINGS_ARCH", None),
      ],
      f,
    );
  }

  #[test]
  fn pair_overrides_single_key() {
    let mut settings = BuildSettings::new("Macos", "apple-clang", "Release", "armv8");
    settings.apply_pair("build_type=Debug").unwrap();
    assert_eq!(settings.build_type, "Debug");
    assert_eq!(settings.os, "Macos");
  }

  #[test]
  fn pair_without_equals_is_rejected() {
    let mut settings = BuildSettings::host();
    let err = settings.apply_pair("os").unwrap_err();
    assert!(matches!(err, SettingsError::InvalidPair(p) if p == "os"));
  }

  #[test]
  fn unknown_key_is_rejected() {
    let mut settings = BuildSettings::host();
    let err = settings.apply_pair("compiler.version=15").unwrap_err();
    assert!(matches!(err, SettingsError::UnknownKey(k) if k == "compiler.version"));
  }

  #[test]
  fn values_are_not_validated() {
    let mut settings = BuildSettings::host();
    settings.apply_pair("build_type=NotARealType").unwrap();
    settings.apply_pair("arch=sparc").unwrap();
    assert_eq!(settings.build_type, "NotARealType");
    assert_eq!(settings.arch, "sparc");
  }

  #[test]
  fn profile_sets_declared_keys() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("macos.toml");
    std::fs::write(
      &path,
      "[settings]\nos = \"Macos\"\ncompiler = \"apple-clang\"\narch = \"armv8\"\n",
    )
    .unwrap();

    let mut settings = BuildSettings::new("Linux", "gcc", "Debug", "x86_64");
    settings.apply_profile(&path).unwrap();

    assert_eq!(settings, BuildSettings::new("Macos", "apple-clang", "Debug", "armv8"));
  }

  #[test]
  fn profile_with_unknown_section_fails_to_parse() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bad.toml");
    std::fs::write(&path, "[options]\nshared = true\n").unwrap();

    let err = BuildSettings::host().apply_profile(&path).unwrap_err();
    assert!(matches!(err, SettingsError::ParseProfile { .. }));
  }

  #[test]
  fn missing_profile_reports_path() {
    let err = BuildSettings::host()
      .apply_profile(Path::new("/nonexistent/profile.toml"))
      .unwrap_err();
    assert!(err.to_string().contains("/nonexistent/profile.toml"));
  }

  #[test]
  #[serial]
  fn env_overrides_profile_and_pairs_override_env() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("profile.toml");
    std::fs::write(&path, "[settings]\nos = \"Windows\"\nbuild_type = \"Debug\"\n").unwrap();

    clear_env(|| {
      temp_env::with_vars([("MRT_SETTINGS_OS", Some("Linux"))], || {
        let settings = BuildSettings::resolve(Some(&path), &["os=Macos".to_string()]).unwrap();
        assert_eq!(settings.os, "Macos");
        assert_eq!(settings.build_type, "Debug");
      });

      temp_env::with_vars([("MRT_SETTINGS_OS", Some("Linux"))], || {
        let settings = BuildSettings::resolve(Some(&path), &[]).unwrap();
        assert_eq!(settings.os, "Linux");
      });
    });
  }

  #[test]
  #[serial]
  fn host_defaults_to_release() {
    clear_env(|| {
      let settings = BuildSettings::resolve(None, &[]).unwrap();
      assert_eq!(settings.build_type, "Release");
      assert_eq!(settings, BuildSettings::host());
    });
  }
}
