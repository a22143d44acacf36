use crate::consts::SUPPORTED_OS;

/// Operating systems known to the recipe settings model.
///
/// The identifiers follow the package-manager settings vocabulary
/// (`Macos`, `Linux`, ...), not Rust's `std::env::consts::OS` names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
  Linux,
  Macos,
  Windows,
  FreeBsd,
}

impl Os {
  /// Detect the current operating system at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::Macos),
      "windows" => Some(Self::Windows),
      "freebsd" => Some(Self::FreeBsd),
      _ => None,
    }
  }

  /// Returns the settings identifier for this OS
  pub fn as_setting(&self) -> &'static str {
    match self {
      Self::Linux => "Linux",
      Self::Macos => "Macos",
      Self::Windows => "Windows",
      Self::FreeBsd => "FreeBSD",
    }
  }

  /// Default compiler family for builds targeting this OS.
  pub fn default_compiler(&self) -> &'static str {
    match self {
      Self::Macos => "apple-clang",
      Self::Linux => "gcc",
      Self::Windows => "msvc",
      Self::FreeBsd => "clang",
    }
  }
}

/// Whether an `os` setting passes the recipe's platform gate.
pub fn is_supported(os: &str) -> bool {
  os == SUPPORTED_OS
}
