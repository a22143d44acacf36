//! Implementation of the `mrt build` command.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use crate::output::{OutputFormat, format_duration, print_json, print_step, print_success};

use super::open_controller;

pub fn cmd_build(context: &Path, format: OutputFormat) -> Result<()> {
  let mut controller = open_controller(context)?;
  let package = controller.recipe().identity.clone();

  if !format.is_json() {
    print_step(&format!("Building {}", package));
  }

  let started = Instant::now();
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  rt.block_on(controller.build()).context("Build failed")?;
  let elapsed = started.elapsed();

  if format.is_json() {
    return print_json(&serde_json::json!({
      "package": package,
      "state": controller.state(),
      "build_dir": controller.context().build_dir(),
      "elapsed_ms": elapsed.as_millis() as u64,
    }));
  }

  print_success(&format!("Built {} in {}", package, format_duration(elapsed)));
  Ok(())
}
