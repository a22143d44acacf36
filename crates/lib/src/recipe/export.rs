//! Exported source set.
//!
//! The recipe declares which files travel with it into the build context.
//! Declarations are parsed once into an explicit manifest of file and tree
//! entries; the copy step walks that manifest instead of globbing the
//! recipe directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum ExportError {
  #[error("exported source not found: {0}")]
  Missing(PathBuf),

  #[error("failed to copy {path}: {source}")]
  Copy {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to walk {path}: {source}")]
  Walk {
    path: PathBuf,
    #[source]
    source: walkdir::Error,
  },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportEntry {
  /// A single file, copied to the same relative path.
  File(PathBuf),
  /// A directory copied recursively.
  Tree(PathBuf),
}

impl ExportEntry {
  /// Parse a declaration. `dir/*` and `dir/` denote a tree, anything else a file.
  pub fn parse(pattern: &str) -> Self {
    match pattern.strip_suffix("/*").or_else(|| pattern.strip_suffix('/')) {
      Some(dir) => Self::Tree(PathBuf::from(dir)),
      None => Self::File(PathBuf::from(pattern)),
    }
  }

  pub fn path(&self) -> &Path {
    match self {
      Self::File(path) | Self::Tree(path) => path,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExportReport {
  pub files: usize,
  pub entries: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportManifest {
  entries: Vec<ExportEntry>,
}

impl ExportManifest {
  pub fn from_patterns(patterns: &[&str]) -> Self {
    Self {
      entries: patterns.iter().map(|p| ExportEntry::parse(p)).collect(),
    }
  }

  pub fn entries(&self) -> &[ExportEntry] {
    &self.entries
  }

  /// Copy every entry from `recipe_dir` into `dest`, replacing whatever `dest`
  /// held before.
  ///
  /// All entries are checked before anything is copied, so a missing entry
  /// leaves `dest` untouched.
  pub fn copy_into(&self, recipe_dir: &Path, dest: &Path) -> Result<ExportReport, ExportError> {
    for entry in &self.entries {
      let src = recipe_dir.join(entry.path());
      let present = match entry {
        ExportEntry::File(_) => src.is_file(),
        ExportEntry::Tree(_) => src.is_dir(),
      };
      if !present {
        return Err(ExportError::Missing(src));
      }
    }

    if dest.exists() {
      fs::remove_dir_all(dest).map_err(|source| copy_err(dest, source))?;
    }
    fs::create_dir_all(dest).map_err(|source| copy_err(dest, source))?;

    let mut report = ExportReport::default();
    for entry in &self.entries {
      let src = recipe_dir.join(entry.path());
      let target = dest.join(entry.path());
      match entry {
        ExportEntry::File(_) => {
          copy_file(&src, &target)?;
          report.files += 1;
        }
        ExportEntry::Tree(_) => {
          report.files += copy_tree(&src, &target)?;
        }
      }
      report.entries += 1;
      debug!(entry = %entry.path().display(), "exported");
    }

    info!(files = report.files, dest = %dest.display(), "exported sources");
    Ok(report)
  }
}

fn copy_err(path: &Path, source: std::io::Error) -> ExportError {
  ExportError::Copy {
    path: path.to_path_buf(),
    source,
  }
}

fn copy_file(src: &Path, target: &Path) -> Result<(), ExportError> {
  if let Some(parent) = target.parent() {
    fs::create_dir_all(parent).map_err(|source| copy_err(parent, source))?;
  }
  fs::copy(src, target).map_err(|source| copy_err(src, source))?;
  Ok(())
}

fn copy_tree(src: &Path, target: &Path) -> Result<usize, ExportError> {
  fs::create_dir_all(target).map_err(|source| copy_err(target, source))?;

  let mut files = 0;
  for entry in WalkDir::new(src).follow_links(true).sort_by_file_name() {
    let entry = entry.map_err(|source| ExportError::Walk {
      path: src.to_path_buf(),
      source,
    })?;
    let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
    if rel.as_os_str().is_empty() {
      continue;
    }

    let out = target.join(rel);
    if entry.file_type().is_dir() {
      fs::create_dir_all(&out).map_err(|source| copy_err(&out, source))?;
    } else if entry.file_type().is_file() {
      copy_file(entry.path(), &out)?;
      files += 1;
    }
  }
  Ok(files)
}
