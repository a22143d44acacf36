//! Recipe controller.
//!
//! Sequences the recipe lifecycle against one build context:
//!
//! 1. `export` copies the declared sources into the context
//! 2. `generate` checks the platform gate and writes the toolchain descriptor
//! 3. `build` runs the backend's configure and build steps
//! 4. `package` runs the backend's install step and records a manifest
//!
//! Each phase checks the lifecycle state first and persists the new state on
//! success, so the phases can be driven from separate processes.
//!
//! # Submodules
//!
//! - [`state`] - Lifecycle states, phases and the transition table
//! - [`types`] - Errors and reports

pub mod state;
mod types;

use std::path::Path;

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::backend::{BackendJob, BuildBackend, BuildStep};
use crate::context::BuildContext;
use crate::platform::os;
use crate::recipe::Recipe;
use crate::recipe::export::ExportReport;
use crate::settings::BuildSettings;
use crate::toolchain::ToolchainDescriptor;
use crate::util::hash::{Hashable, hash_file};

pub use state::{LifecycleState, Phase};
pub use types::*;

pub struct RecipeController<B> {
  recipe: Recipe,
  context: BuildContext,
  backend: B,
  state: LifecycleState,
  descriptor: Option<ToolchainDescriptor>,
}

impl<B: BuildBackend> RecipeController<B> {
  /// Attach to a build context, resuming whatever state it was left in.
  pub fn open(recipe: Recipe, context: BuildContext, backend: B) -> Result<Self, RecipeError> {
    let state = state::load(&context.state_path())?;
    let descriptor_path = context.descriptor_path();
    let descriptor = if state >= LifecycleState::Generated && descriptor_path.exists() {
      Some(ToolchainDescriptor::read_from(&descriptor_path)?)
    } else {
      None
    };

    Ok(Self {
      recipe,
      context,
      backend,
      state,
      descriptor,
    })
  }

  pub fn recipe(&self) -> &Recipe {
    &self.recipe
  }

  pub fn context(&self) -> &BuildContext {
    &self.context
  }

  pub fn state(&self) -> LifecycleState {
    self.state
  }

  pub fn descriptor(&self) -> Option<&ToolchainDescriptor> {
    self.descriptor.as_ref()
  }

  /// Copy the exported source set from `recipe_dir` into the context.
  pub fn export(&mut self, recipe_dir: &Path) -> Result<ExportReport, RecipeError> {
    self.state.admits(Phase::Export)?;
    let report = self.recipe.exports.copy_into(recipe_dir, &self.context.source_dir())?;
    Ok(report)
  }

  /// Produce the toolchain descriptor for `settings`.
  ///
  /// Fails with `PlatformUnsupported` before touching the context when the
  /// `os` setting is not the supported platform.
  pub fn generate(&mut self, settings: &BuildSettings) -> Result<&ToolchainDescriptor, RecipeError> {
    if !os::is_supported(&settings.os) {
      warn!(os = %settings.os, "platform gate rejected settings");
      return Err(RecipeError::PlatformUnsupported(settings.os.clone()));
    }
    self.state.admits(Phase::Generate)?;

    let descriptor = ToolchainDescriptor::new(&self.recipe.identity, settings, &self.recipe.generator);
    descriptor.write_to(&self.context.generators_dir())?;
    let fingerprint = descriptor.compute_hash()?;
    info!(package = %self.recipe.identity, fingerprint = %fingerprint, "generated toolchain");

    self.transition(LifecycleState::Generated)?;
    Ok(self.descriptor.insert(descriptor))
  }

  /// Configure and compile through the backend.
  pub async fn build(&mut self) -> Result<(), RecipeError> {
    self.state.admits(Phase::Build)?;

    let toolchain_file = self.context.toolchain_file();
    let descriptor = match &self.descriptor {
      Some(descriptor) if toolchain_file.is_file() => descriptor,
      _ => return Err(RecipeError::ConfigurationMissing),
    };

    let source_dir = self.context.source_dir();
    let build_dir = self.context.build_dir();
    let install_dir = self.context.package_dir();
    let job = BackendJob {
      source_dir: &source_dir,
      build_dir: &build_dir,
      install_dir: &install_dir,
      toolchain_file: &toolchain_file,
      descriptor,
    };

    info!(build_dir = %build_dir.display(), "configuring");
    self
      .backend
      .configure(&job)
      .await
      .map_err(|e| RecipeError::backend(BuildStep::Configure, e))?;

    info!("building");
    self
      .backend
      .build(&job)
      .await
      .map_err(|e| RecipeError::backend(BuildStep::Build, e))?;

    self.transition(LifecycleState::Built)
  }

  /// Install the built artifacts into the package directory and record the
  /// package manifest.
  pub async fn package(&mut self) -> Result<PackageReport, RecipeError> {
    self.state.admits(Phase::Package)?;
    if !self.context.has_build_artifacts() {
      return Err(RecipeError::ArtifactsMissing);
    }

    let toolchain_file = self.context.toolchain_file();
    let Some(descriptor) = &self.descriptor else {
      return Err(RecipeError::ConfigurationMissing);
    };

    let source_dir = self.context.source_dir();
    let build_dir = self.context.build_dir();
    let install_dir = self.context.package_dir();
    if install_dir.exists() {
      tokio::fs::remove_dir_all(&install_dir).await?;
    }

    let job = BackendJob {
      source_dir: &source_dir,
      build_dir: &build_dir,
      install_dir: &install_dir,
      toolchain_file: &toolchain_file,
      descriptor,
    };

    info!(install_dir = %install_dir.display(), "installing");
    self
      .backend
      .install(&job)
      .await
      .map_err(|e| RecipeError::backend(BuildStep::Install, e))?;

    let report = self.scan_package(&install_dir)?;
    std::fs::write(self.context.manifest_path(), serde_json::to_string_pretty(&report)?)?;
    info!(files = report.files.len(), "packaged");

    self.transition(LifecycleState::Packaged)?;
    Ok(report)
  }

  /// Run every phase in order, stopping at the first error.
  pub async fn create(&mut self, recipe_dir: &Path, settings: &BuildSettings) -> Result<PackageReport, RecipeError> {
    self.export(recipe_dir)?;
    self.generate(settings)?;
    self.build().await?;
    self.package().await
  }

  fn transition(&mut self, next: LifecycleState) -> Result<(), RecipeError> {
    state::save(&self.context.state_path(), &self.recipe.identity, next)?;
    info!(from = %self.state, to = %next, "lifecycle transition");
    self.state = next;
    Ok(())
  }

  fn scan_package(&self, install_dir: &Path) -> Result<PackageReport, RecipeError> {
    let mut files = Vec::new();
    if install_dir.exists() {
      for entry in WalkDir::new(install_dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::other)?;
        if !entry.file_type().is_file() {
          continue;
        }
        let rel = entry.path().strip_prefix(install_dir).unwrap_or(entry.path());
        let path = rel
          .components()
          .map(|c| c.as_os_str().to_string_lossy())
          .collect::<Vec<_>>()
          .join("/");
        files.push(PackagedFile {
          path,
          size: entry.metadata().map_err(std::io::Error::other)?.len(),
          sha256: hash_file(entry.path())?,
        });
      }
    }

    Ok(PackageReport {
      package: self.recipe.identity.clone(),
      package_dir: install_dir.to_path_buf(),
      files,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::{FakeBackend, recipe_tree};
  use tempfile::TempDir;
  use tracing_test::traced_test;

  struct Fixture {
    recipe_dir: TempDir,
    ctx_dir: TempDir,
  }

  impl Fixture {
    fn new() -> Self {
      let recipe_dir = TempDir::new().unwrap();
      recipe_tree(recipe_dir.path());
      Self {
        recipe_dir,
        ctx_dir: TempDir::new().unwrap(),
      }
    }

    fn controller(&self, backend: FakeBackend) -> RecipeController<FakeBackend> {
      let ctx = BuildContext::resolve(self.ctx_dir.path()).unwrap();
      RecipeController::open(Recipe::metalraytracing(), ctx, backend).unwrap()
    }
  }

  fn macos() -> BuildSettings {
    BuildSettings::new("Macos", "apple-clang", "Release", "armv8")
  }

  #[test]
  fn unsupported_platform_writes_nothing() {
    let fx = Fixture::new();
    let mut ctl = fx.controller(FakeBackend::default());

    let err = ctl.generate(&BuildSettings::new("Linux", "gcc", "Release", "x86_64")).unwrap_err();

    assert!(matches!(err, RecipeError::PlatformUnsupported(ref os) if os == "Linux"));
    assert_eq!(ctl.state(), LifecycleState::Uninitialized);
    assert!(ctl.descriptor().is_none());
    assert!(!ctl.context().generators_dir().exists());
    assert!(!ctl.context().state_path().exists());
  }

  #[test]
  #[traced_test]
  fn transitions_are_logged() {
    let fx = Fixture::new();
    let mut ctl = fx.controller(FakeBackend::default());

    assert!(ctl.generate(&BuildSettings::new("Windows", "msvc", "Release", "x86_64")).is_err());
    assert!(logs_contain("platform gate rejected settings"));

    ctl.generate(&macos()).unwrap();
    assert!(logs_contain("lifecycle transition"));
  }

  #[test]
  fn empty_os_is_unsupported() {
    let fx = Fixture::new();
    let mut ctl = fx.controller(FakeBackend::default());

    let err = ctl.generate(&BuildSettings::new("", "apple-clang", "Release", "armv8")).unwrap_err();
    assert!(matches!(err, RecipeError::PlatformUnsupported(ref os) if os.is_empty()));
  }

  #[test]
  fn generate_reflects_settings() {
    let fx = Fixture::new();
    let mut ctl = fx.controller(FakeBackend::default());

    let descriptor = ctl.generate(&macos()).unwrap().clone();

    assert_eq!(descriptor.settings, macos());
    assert_eq!(descriptor.generator.as_str(), "Ninja");
    assert_eq!(ctl.state(), LifecycleState::Generated);
    assert!(ctl.context().toolchain_file().is_file());
    assert!(ctl.context().paths_file().is_file());
  }

  #[test]
  fn regenerate_is_byte_identical() {
    let fx = Fixture::new();
    let mut ctl = fx.controller(FakeBackend::default());

    ctl.generate(&macos()).unwrap();
    let first = std::fs::read(ctl.context().descriptor_path()).unwrap();
    let first_toolchain = std::fs::read(ctl.context().toolchain_file()).unwrap();
    ctl.generate(&macos()).unwrap();

    assert_eq!(std::fs::read(ctl.context().descriptor_path()).unwrap(), first);
    assert_eq!(std::fs::read(ctl.context().toolchain_file()).unwrap(), first_toolchain);
  }

  #[tokio::test]
  async fn build_without_generate_never_invokes_backend() {
    let fx = Fixture::new();
    let backend = FakeBackend::default();
    let mut ctl = fx.controller(backend.clone());

    let err = ctl.build().await.unwrap_err();

    assert!(matches!(err, RecipeError::ConfigurationMissing));
    assert!(backend.calls().is_empty());
  }

  #[tokio::test]
  async fn build_with_deleted_descriptor_is_configuration_missing() {
    let fx = Fixture::new();
    let backend = FakeBackend::default();
    let mut ctl = fx.controller(backend.clone());
    ctl.generate(&macos()).unwrap();
    std::fs::remove_file(ctl.context().toolchain_file()).unwrap();

    let err = ctl.build().await.unwrap_err();

    assert!(matches!(err, RecipeError::ConfigurationMissing));
    assert!(backend.calls().is_empty());
  }

  #[tokio::test]
  async fn package_without_build_is_artifacts_missing() {
    let fx = Fixture::new();
    let mut ctl = fx.controller(FakeBackend::default());
    assert!(matches!(ctl.package().await, Err(RecipeError::ArtifactsMissing)));

    ctl.generate(&macos()).unwrap();
    assert!(matches!(ctl.package().await, Err(RecipeError::ArtifactsMissing)));
  }

  #[tokio::test]
  async fn full_lifecycle_produces_package() {
    let fx = Fixture::new();
    let backend = FakeBackend::default();
    let mut ctl = fx.controller(backend.clone());

    let report = ctl.create(fx.recipe_dir.path(), &macos()).await.unwrap();

    assert_eq!(ctl.state(), LifecycleState::Packaged);
    assert_eq!(backend.calls(), vec![BuildStep::Configure, BuildStep::Build, BuildStep::Install]);
    assert_eq!(report.files.len(), 1);
    assert_eq!(report.files[0].path, "lib/libmetalraytracing.a");
    assert!(ctl.context().package_dir().join("lib/libmetalraytracing.a").is_file());
    assert!(ctl.context().manifest_path().is_file());
  }

  #[tokio::test]
  async fn compile_error_is_build_failed_then_artifacts_missing() {
    let fx = Fixture::new();
    let backend = FakeBackend::failing(BuildStep::Build, "Renderer.mm:42: error: use of undeclared identifier");
    let mut ctl = fx.controller(backend.clone());
    ctl.export(fx.recipe_dir.path()).unwrap();
    ctl.generate(&macos()).unwrap();

    let err = ctl.build().await.unwrap_err();
    match err {
      RecipeError::BuildFailed { step, diagnostic, .. } => {
        assert_eq!(step, BuildStep::Build);
        assert_eq!(diagnostic, "Renderer.mm:42: error: use of undeclared identifier");
      }
      other => panic!("expected BuildFailed, got {other:?}"),
    }
    assert_eq!(ctl.state(), LifecycleState::Generated);

    assert!(matches!(ctl.package().await, Err(RecipeError::ArtifactsMissing)));
  }

  #[tokio::test]
  async fn configure_failure_skips_build_step() {
    let fx = Fixture::new();
    let backend = FakeBackend::failing(BuildStep::Configure, "CMake Error: Could not find Ninja");
    let mut ctl = fx.controller(backend.clone());
    ctl.generate(&macos()).unwrap();

    let err = ctl.build().await.unwrap_err();

    assert!(matches!(err, RecipeError::BuildFailed { step: BuildStep::Configure, .. }));
    assert_eq!(backend.calls(), vec![BuildStep::Configure]);
  }

  #[tokio::test]
  async fn install_failure_keeps_built_state() {
    let fx = Fixture::new();
    let backend = FakeBackend::failing(BuildStep::Install, "CMake Error: file INSTALL cannot find libmetalraytracing.a");
    let mut ctl = fx.controller(backend.clone());
    ctl.generate(&macos()).unwrap();
    ctl.build().await.unwrap();

    let err = ctl.package().await.unwrap_err();

    match err {
      RecipeError::BuildFailed { step, diagnostic, .. } => {
        assert_eq!(step, BuildStep::Install);
        assert_eq!(diagnostic, "CMake Error: file INSTALL cannot find libmetalraytracing.a");
      }
      other => panic!("expected BuildFailed, got {other:?}"),
    }
    assert_eq!(ctl.state(), LifecycleState::Built);
    assert!(!ctl.context().manifest_path().exists());
    assert_eq!(backend.calls(), vec![BuildStep::Configure, BuildStep::Build, BuildStep::Install]);
  }

  #[test]
  fn unsupported_platform_leaves_missing_context_absent() {
    let fx = Fixture::new();
    let root = fx.ctx_dir.path().join("fresh");
    let ctx = BuildContext::resolve(&root).unwrap();
    let mut ctl = RecipeController::open(Recipe::metalraytracing(), ctx, FakeBackend::default()).unwrap();

    assert!(ctl.generate(&BuildSettings::new("Linux", "gcc", "Release", "x86_64")).is_err());
    assert!(!root.exists());

    ctl.generate(&macos()).unwrap();
    assert!(ctl.context().toolchain_file().is_file());
  }

  #[tokio::test]
  async fn phases_resume_from_persisted_state() {
    let fx = Fixture::new();
    let backend = FakeBackend::default();

    {
      let mut ctl = fx.controller(backend.clone());
      ctl.export(fx.recipe_dir.path()).unwrap();
      ctl.generate(&macos()).unwrap();
    }
    {
      let mut ctl = fx.controller(backend.clone());
      assert_eq!(ctl.state(), LifecycleState::Generated);
      assert_eq!(ctl.descriptor().map(|d| &d.settings), Some(&macos()));
      ctl.build().await.unwrap();
    }
    let mut ctl = fx.controller(backend.clone());
    assert_eq!(ctl.state(), LifecycleState::Built);
    ctl.package().await.unwrap();
    assert_eq!(ctl.state(), LifecycleState::Packaged);
  }

  #[tokio::test]
  async fn repeating_a_phase_is_out_of_order() {
    let fx = Fixture::new();
    let mut ctl = fx.controller(FakeBackend::default());
    ctl.create(fx.recipe_dir.path(), &macos()).await.unwrap();

    assert!(matches!(
      ctl.build().await,
      Err(RecipeError::PhaseOutOfOrder {
        phase: Phase::Build,
        state: LifecycleState::Packaged
      })
    ));
    assert!(matches!(
      ctl.generate(&macos()),
      Err(RecipeError::PhaseOutOfOrder { phase: Phase::Generate, .. })
    ));
    assert!(matches!(
      ctl.export(fx.recipe_dir.path()),
      Err(RecipeError::PhaseOutOfOrder { phase: Phase::Export, .. })
    ));
  }

  #[test]
  fn export_missing_source_fails() {
    let fx = Fixture::new();
    std::fs::remove_file(fx.recipe_dir.path().join("CMakeLists.txt")).unwrap();
    let mut ctl = fx.controller(FakeBackend::default());

    let err = ctl.export(fx.recipe_dir.path()).unwrap_err();
    assert!(matches!(err, RecipeError::Export(_)));
  }
}
