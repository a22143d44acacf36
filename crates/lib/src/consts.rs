//! Fixed identifiers of the `metalraytracing` recipe and the `mrt` driver.

pub const APP_NAME: &str = "mrt";

pub const PACKAGE_NAME: &str = "metalraytracing";
pub const PACKAGE_VERSION: &str = "0.1.0";

/// The only `os` setting accepted by the platform gate.
pub const SUPPORTED_OS: &str = "Macos";

/// Low-level build backend handed to CMake with `-G`.
pub const DEFAULT_GENERATOR: &str = "Ninja";

/// Sources copied from the recipe directory into the build context.
pub const EXPORTS_SOURCES: &[&str] = &["CMakeLists.txt", "src/*", "cmake/*"];

/// Length of truncated object hashes used for descriptor fingerprints.
pub const OBJ_HASH_PREFIX_LEN: usize = 20;

pub const TOOLCHAIN_FILENAME: &str = "mrt_toolchain.cmake";
pub const PATHS_FILENAME: &str = "mrt_paths.cmake";
pub const DESCRIPTOR_FILENAME: &str = "toolchain.json";
pub const STATE_FILENAME: &str = "state.json";
pub const PACKAGE_MANIFEST_FILENAME: &str = "package-manifest.json";
