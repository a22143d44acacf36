/// CPU architectures known to the recipe settings model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
  X86_64,
  Armv8,
}

impl Arch {
  /// Detect the current CPU architecture at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::ARCH {
      "x86_64" => Some(Self::X86_64),
      "aarch64" => Some(Self::Armv8),
      _ => None,
    }
  }

  /// Parse a settings identifier, accepting the common aliases for 64-bit ARM.
  pub fn from_setting(value: &str) -> Option<Self> {
    match value {
      "x86_64" => Some(Self::X86_64),
      "armv8" | "arm64" | "aarch64" => Some(Self::Armv8),
      _ => None,
    }
  }

  /// Returns the settings identifier for this architecture
  pub fn as_setting(&self) -> &'static str {
    match self {
      Self::X86_64 => "x86_64",
      Self::Armv8 => "armv8",
    }
  }

  /// Architecture name as Apple toolchains spell it (`CMAKE_OSX_ARCHITECTURES`).
  pub fn apple_name(&self) -> &'static str {
    match self {
      Self::X86_64 => "x86_64",
      Self::Armv8 => "arm64",
    }
  }
}
