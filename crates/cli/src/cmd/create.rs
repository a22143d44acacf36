//! Implementation of the `mrt create` command.
//!
//! Runs the whole recipe lifecycle in one process:
//! - Exports the sources into the build context
//! - Generates the toolchain (platform gate)
//! - Configures and builds
//! - Installs and records the package manifest

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use crate::SettingsArgs;
use crate::output::{OutputFormat, format_duration, print_json, print_stat, print_step, print_success};

use super::{open_controller, resolve_settings};

pub fn cmd_create(context: &Path, recipe_dir: &Path, args: &SettingsArgs, format: OutputFormat) -> Result<()> {
  let settings = resolve_settings(args)?;
  let mut controller = open_controller(context)?;

  if !format.is_json() {
    print_step(&format!("Creating {} ({})", controller.recipe().identity, settings));
  }

  let started = Instant::now();
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt
    .block_on(controller.create(recipe_dir, &settings))
    .context("Create failed")?;

  if format.is_json() {
    return print_json(&report);
  }

  println!();
  print_success(&format!(
    "Created {} in {}",
    report.package,
    format_duration(started.elapsed())
  ));
  print_stat("Files", &report.files.len().to_string());
  print_stat("Package", &report.package_dir.display().to_string());
  Ok(())
}
