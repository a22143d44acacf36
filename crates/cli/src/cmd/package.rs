//! Implementation of the `mrt package` command.
//!
//! Installs the build into the package directory and prints the resulting
//! package manifest.

use std::path::Path;

use anyhow::{Context, Result};

use crate::output::{OutputFormat, format_bytes, print_json, print_stat, print_step, print_success, truncate_hash};

use super::open_controller;

pub fn cmd_package(context: &Path, verbose: bool, format: OutputFormat) -> Result<()> {
  let mut controller = open_controller(context)?;

  if !format.is_json() {
    print_step(&format!("Packaging {}", controller.recipe().identity));
  }

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt.block_on(controller.package()).context("Package failed")?;

  if format.is_json() {
    return print_json(&report);
  }

  print_success(&format!("Packaged {} ({} file(s))", report.package, report.files.len()));
  print_stat("Package", &report.package_dir.display().to_string());
  print_stat("Manifest", &controller.context().manifest_path().display().to_string());

  if verbose {
    println!();
    for file in &report.files {
      println!(
        "  {}  {:>9}  {}",
        truncate_hash(&file.sha256.0),
        format_bytes(file.size),
        file.path
      );
    }
  }

  Ok(())
}
