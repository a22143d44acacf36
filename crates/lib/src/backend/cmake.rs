//! CMake backend.
//!
//! Drives the three CMake entry points (`cmake -S/-B`, `cmake --build`,
//! `cmake --install`) as child processes. The generator recorded in the
//! toolchain descriptor is passed through with `-G`; parallelism inside a
//! step belongs to that generator.

use std::ffi::OsString;
use std::path::Path;

use tokio::process::Command;
use tracing::{debug, info};

use super::{BackendError, BackendJob, BuildBackend};

const CMAKE_ENV: &str = "MRT_CMAKE";
const JOBS_ENV: &str = "MRT_JOBS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
  /// CMake executable, resolved through `PATH` when not absolute.
  pub program: String,
  /// Forwarded as `--parallel N`; the generator decides when unset.
  pub jobs: Option<usize>,
}

impl Default for BackendConfig {
  fn default() -> Self {
    Self {
      program: "cmake".to_string(),
      jobs: None,
    }
  }
}

impl BackendConfig {
  /// Read `MRT_CMAKE` and `MRT_JOBS`, falling back to defaults.
  ///
  /// A `MRT_JOBS` value that is not a positive integer is ignored.
  pub fn from_env() -> Self {
    let mut config = Self::default();
    if let Some(program) = std::env::var(CMAKE_ENV).ok().filter(|p| !p.is_empty()) {
      config.program = program;
    }
    config.jobs = std::env::var(JOBS_ENV)
      .ok()
      .and_then(|v| v.parse::<usize>().ok())
      .filter(|&n| n > 0);
    config
  }
}

#[derive(Debug, Clone, Default)]
pub struct CMake {
  config: BackendConfig,
}

impl CMake {
  pub fn new(config: BackendConfig) -> Self {
    Self { config }
  }

  pub fn configure_args(&self, job: &BackendJob<'_>) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
      "-S".into(),
      job.source_dir.into(),
      "-B".into(),
      job.build_dir.into(),
      "-G".into(),
      job.descriptor.generator.as_str().into(),
    ];
    args.push(define("CMAKE_TOOLCHAIN_FILE", job.toolchain_file));
    args.push(define("CMAKE_INSTALL_PREFIX", job.install_dir));
    args.push(format!("-DCMAKE_BUILD_TYPE={}", job.descriptor.settings.build_type).into());
    args
  }

  pub fn build_args(&self, job: &BackendJob<'_>) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
      "--build".into(),
      job.build_dir.into(),
      "--config".into(),
      job.descriptor.settings.build_type.as_str().into(),
    ];
    if let Some(jobs) = self.config.jobs {
      args.push("--parallel".into());
      args.push(jobs.to_string().into());
    }
    args
  }

  pub fn install_args(&self, job: &BackendJob<'_>) -> Vec<OsString> {
    vec![
      "--install".into(),
      job.build_dir.into(),
      "--config".into(),
      job.descriptor.settings.build_type.as_str().into(),
    ]
  }

  async fn run(&self, args: Vec<OsString>, cwd: &Path) -> Result<(), BackendError> {
    let program = &self.config.program;
    info!(program = %program, args = ?args, "running backend");

    let output = Command::new(program)
      .args(&args)
      .current_dir(cwd)
      .output()
      .await
      .map_err(|source| BackendError::Launch {
        program: program.clone(),
        source,
      })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !stdout.trim().is_empty() {
      debug!(stdout = %stdout.trim(), "backend stdout");
    }

    if !output.status.success() {
      if !stderr.trim().is_empty() {
        debug!(stderr = %stderr.trim(), "backend stderr");
      }
      return Err(BackendError::Failed {
        program: program.clone(),
        code: output.status.code(),
        diagnostic: diagnostic(&stderr, &stdout),
      });
    }

    Ok(())
  }
}

/// Both captured streams, unmodified, stderr first. Ninja reports compiler
/// errors on stdout.
fn diagnostic(stderr: &str, stdout: &str) -> String {
  let mut text = String::with_capacity(stderr.len() + stdout.len() + 1);
  text.push_str(stderr);
  if !stderr.is_empty() && !stdout.is_empty() && !stderr.ends_with('\n') {
    text.push('\n');
  }
  text.push_str(stdout);
  text
}

fn define(name: &str, path: &Path) -> OsString {
  let mut arg = OsString::from(format!("-D{}=", name));
  arg.push(path);
  arg
}

impl BuildBackend for CMake {
  async fn configure(&self, job: &BackendJob<'_>) -> Result<(), BackendError> {
    tokio::fs::create_dir_all(job.build_dir)
      .await
      .map_err(|source| BackendError::Launch {
        program: self.config.program.clone(),
        source,
      })?;
    self.run(self.configure_args(job), job.build_dir).await
  }

  async fn build(&self, job: &BackendJob<'_>) -> Result<(), BackendError> {
    self.run(self.build_args(job), job.build_dir).await
  }

  async fn install(&self, job: &BackendJob<'_>) -> Result<(), BackendError> {
    self.run(self.install_args(job), job.build_dir).await
  }
}
