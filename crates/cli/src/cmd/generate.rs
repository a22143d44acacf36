//! Implementation of the `mrt generate` command.
//!
//! Resolves the build settings, applies the platform gate and writes the
//! CMake toolchain into the build context.

use std::path::Path;

use anyhow::{Context, Result};

use mrt_lib::util::hash::Hashable;

use crate::SettingsArgs;
use crate::output::{OutputFormat, print_json, print_stat, print_success, truncate_hash};

use super::{open_controller, resolve_settings};

pub fn cmd_generate(context: &Path, args: &SettingsArgs, format: OutputFormat) -> Result<()> {
  let settings = resolve_settings(args)?;
  let mut controller = open_controller(context)?;

  let descriptor = controller.generate(&settings).context("Generate failed")?.clone();

  if format.is_json() {
    return print_json(&descriptor);
  }

  let fingerprint = descriptor.compute_hash().context("Failed to fingerprint toolchain")?;
  print_success(&format!("Generated toolchain for {}", descriptor.package));
  print_stat("Settings", &descriptor.settings.to_string());
  print_stat("Generator", descriptor.generator.as_str());
  print_stat("Toolchain", &controller.context().toolchain_file().display().to_string());
  print_stat("Fingerprint", truncate_hash(&fingerprint.0));
  Ok(())
}
