//! Host CPU architecture resolution for helper binary downloads

use std::fmt;

/// Canonical download architecture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Architecture {
    Arm64, // aarch64, arm64
    Armv7, // armv7l, armv8l (32-bit userland), arm
    Amd64, // x86_64, amd64
    X86,   // i686, i386, x86
    /// Anything else; callers must skip architecture-dependent downloads
    Unknown(String),
}

impl Architecture {
    /// Resolve a host identifier such as the output of `uname -m`
    pub fn resolve(host_arch: &str) -> Self {
        match host_arch.trim().to_ascii_lowercase().as_str() {
            "aarch64" | "arm64" => Self::Arm64,
            "armv7l" | "armv8l" | "arm" => Self::Armv7,
            "x86_64" | "amd64" => Self::Amd64,
            "i686" | "i386" | "x86" => Self::X86,
            _ => Self::Unknown(host_arch.trim().to_string()),
        }
    }

    /// Canonical name used in helper download tables
    pub fn canonical(&self) -> &str {
        match self {
            Self::Arm64 => "arm64",
            Self::Armv7 => "armv7",
            Self::Amd64 => "amd64",
            Self::X86 => "386",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

/// Where to fetch one helper for one architecture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub architecture: Architecture,
    /// `None` when the helper has no build for this architecture
    pub url: Option<String>,
}
