//! Implementation of the `mrt info` command.

use std::path::Path;

use anyhow::{Context, Result};

use mrt_lib::consts::SUPPORTED_OS;
use mrt_lib::context::BuildContext;
use mrt_lib::controller::state;
use mrt_lib::recipe::Recipe;
use mrt_lib::settings::BuildSettings;

use crate::output::{OutputFormat, print_info, print_json, print_stat};

pub fn cmd_info(context: &Path, format: OutputFormat) -> Result<()> {
  let recipe = Recipe::metalraytracing();
  let ctx = BuildContext::new(context);
  let host = BuildSettings::host();
  let lifecycle = state::load(&ctx.state_path()).context("Failed to read lifecycle state")?;
  let exports: Vec<String> = recipe
    .exports
    .entries()
    .iter()
    .map(|e| e.path().display().to_string())
    .collect();

  if format.is_json() {
    return print_json(&serde_json::json!({
      "package": recipe.identity,
      "supported_os": SUPPORTED_OS,
      "generator": recipe.generator,
      "exports": exports,
      "host": host,
      "context": ctx.root(),
      "state": lifecycle,
    }));
  }

  print_info(&format!("Recipe {}", recipe.identity));
  print_stat("Platform", SUPPORTED_OS);
  print_stat("Generator", recipe.generator.as_str());
  print_stat("Exports", &exports.join(", "));
  println!();
  print_info("System");
  print_stat("Host defaults", &host.to_string());
  print_stat("Context", &ctx.root().display().to_string());
  print_stat("State", &lifecycle.to_string());
  Ok(())
}
