mod build;
mod create;
mod export;
mod generate;
mod info;
mod package;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use mrt_lib::backend::{BackendConfig, CMake};
use mrt_lib::context::BuildContext;
use mrt_lib::controller::RecipeController;
use mrt_lib::recipe::Recipe;
use mrt_lib::settings::BuildSettings;

use crate::SettingsArgs;

pub use build::cmd_build;
pub use create::cmd_create;
pub use export::cmd_export;
pub use generate::cmd_generate;
pub use info::cmd_info;
pub use package::cmd_package;

/// Attach the `metalraytracing` recipe and the CMake backend to a build context.
fn open_controller(context: &Path) -> Result<RecipeController<CMake>> {
  let ctx = BuildContext::resolve(context)
    .with_context(|| format!("Failed to resolve build context: {}", context.display()))?;
  let controller = RecipeController::open(Recipe::metalraytracing(), ctx, CMake::new(BackendConfig::from_env()))
    .with_context(|| format!("Failed to open build context: {}", context.display()))?;
  debug!(
    context = %controller.context().root().display(),
    state = %controller.state(),
    "opened build context"
  );
  Ok(controller)
}

fn resolve_settings(args: &SettingsArgs) -> Result<BuildSettings> {
  BuildSettings::resolve(args.profile.as_deref(), &args.settings).context("Invalid build settings")
}
