//! Implementation of the `mrt export` command.

use std::path::Path;

use anyhow::{Context, Result};

use crate::output::{OutputFormat, print_json, print_stat, print_success};

use super::open_controller;

pub fn cmd_export(context: &Path, recipe_dir: &Path, format: OutputFormat) -> Result<()> {
  let mut controller = open_controller(context)?;

  let report = controller
    .export(recipe_dir)
    .with_context(|| format!("Failed to export sources from {}", recipe_dir.display()))?;

  if format.is_json() {
    return print_json(&report);
  }

  print_success(&format!(
    "Exported {} file(s) from {} entries",
    report.files, report.entries
  ));
  print_stat("Sources", &controller.context().source_dir().display().to_string());
  Ok(())
}
