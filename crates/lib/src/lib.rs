//! mrt-lib: Recipe model and lifecycle for the `metalraytracing` package
//!
//! This crate provides the pieces the `mrt` driver is built from:
//! - `Recipe`: package identity, exported sources and generator choice
//! - `BuildSettings`: the `{os, compiler, build_type, arch}` tuple
//! - `ToolchainDescriptor`: generated CMake toolchain configuration
//! - `RecipeController`: the `generate → build → package` lifecycle
//! - `BuildBackend`: the seam to the external build-description consumer

pub mod backend;
pub mod consts;
pub mod context;
pub mod controller;
pub mod platform;
pub mod recipe;
pub mod settings;
pub mod toolchain;
pub mod util;
