//! Test utilities for mrt-lib.
//!
//! Helpers for laying out recipe directories and standing in for external
//! build tools.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::backend::{BackendError, BackendJob, BuildBackend, BuildStep};

/// Create the minimal recipe layout the exported source set expects.
pub fn recipe_tree(root: &Path) {
  std::fs::write(root.join("CMakeLists.txt"), "cmake_minimum_required(VERSION 3.20)\n").unwrap();
  std::fs::create_dir_all(root.join("src")).unwrap();
  std::fs::write(root.join("src/Renderer.mm"), "// renderer\n").unwrap();
  std::fs::create_dir_all(root.join("cmake")).unwrap();
  std::fs::write(root.join("cmake/metal.cmake"), "# helpers\n").unwrap();
}

/// Write an executable `/bin/sh` script named `name` into `dir`.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
  use std::os::unix::fs::PermissionsExt;

  let path = dir.join(name);
  std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
  std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
  path
}

/// In-process stand-in for the CMake backend.
///
/// Records each step it is asked to run and produces a static library in
/// the build tree, unless told to fail at a given step.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
  calls: Arc<Mutex<Vec<BuildStep>>>,
  fail_at: Option<(BuildStep, String)>,
}

impl FakeBackend {
  pub fn failing(step: BuildStep, diagnostic: &str) -> Self {
    Self {
      calls: Arc::default(),
      fail_at: Some((step, diagnostic.to_string())),
    }
  }

  pub fn calls(&self) -> Vec<BuildStep> {
    self.calls.lock().unwrap().clone()
  }

  fn enter(&self, step: BuildStep) -> Result<(), BackendError> {
    self.calls.lock().unwrap().push(step);
    match &self.fail_at {
      Some((failing, diagnostic)) if *failing == step => Err(BackendError::Failed {
        program: "fake-cmake".to_string(),
        code: Some(1),
        diagnostic: diagnostic.clone(),
      }),
      _ => Ok(()),
    }
  }
}

impl BuildBackend for FakeBackend {
  async fn configure(&self, job: &BackendJob<'_>) -> Result<(), BackendError> {
    self.enter(BuildStep::Configure)?;
    std::fs::create_dir_all(job.build_dir).unwrap();
    std::fs::write(job.build_dir.join("CMakeCache.txt"), "CMAKE_GENERATOR:INTERNAL=Ninja\n").unwrap();
    Ok(())
  }

  async fn build(&self, job: &BackendJob<'_>) -> Result<(), BackendError> {
    self.enter(BuildStep::Build)?;
    std::fs::write(job.build_dir.join("libmetalraytracing.a"), "!<arch>\n").unwrap();
    Ok(())
  }

  async fn install(&self, job: &BackendJob<'_>) -> Result<(), BackendError> {
    self.enter(BuildStep::Install)?;
    let lib_dir = job.install_dir.join("lib");
    std::fs::create_dir_all(&lib_dir).unwrap();
    std::fs::copy(
      job.build_dir.join("libmetalraytracing.a"),
      lib_dir.join("libmetalraytracing.a"),
    )
    .unwrap();
    Ok(())
  }
}
