//! Canonical registry of helper binaries
//!
//! When adding or removing a helper, update ONLY the HELPERS array below.

use super::download::platform::{Architecture, DownloadTarget};

/// How a helper is packaged upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packaging {
    /// The download is the executable itself
    Raw,
    /// A `.tar.gz` holding the executable under the given member name
    TarGz { member: &'static str },
}

/// A helper binary fetched outside the package manager
#[derive(Debug, Clone, Copy)]
pub struct HelperBinary {
    /// File name under `<install_root>/bin`
    pub name: &'static str,
    /// What the manager loses without it
    pub feature: &'static str,
    pub packaging: Packaging,
    /// (canonical architecture, url)
    pub urls: &'static [(&'static str, &'static str)],
}

impl HelperBinary {
    /// Download target for `arch`; `url` is `None` when there is no build for it
    pub fn target(&self, arch: &Architecture) -> DownloadTarget {
        if !arch.is_supported() {
            return DownloadTarget {
                architecture: arch.clone(),
                url: None,
            };
        }
        let url = self
            .urls
            .iter()
            .find(|(name, _)| *name == arch.canonical())
            .map(|(_, url)| (*url).to_string());
        DownloadTarget {
            architecture: arch.clone(),
            url,
        }
    }
}

/// Tunnelling agent and web file manager used by the server manager
pub const HELPERS: &[HelperBinary] = &[
    HelperBinary {
        name: "playit",
        feature: "external access through playit.gg tunnels",
        packaging: Packaging::Raw,
        urls: &[
            ("arm64", "https://github.com/playit-cloud/playit-agent/releases/latest/download/playit-linux-aarch64"),
            ("armv7", "https://github.com/playit-cloud/playit-agent/releases/latest/download/playit-linux-armv7"),
            ("amd64", "https://github.com/playit-cloud/playit-agent/releases/latest/download/playit-linux-amd64"),
            ("386", "https://github.com/playit-cloud/playit-agent/releases/latest/download/playit-linux-i686"),
        ],
    },
    HelperBinary {
        name: "filebrowser",
        feature: "the web file manager for uploading server files",
        packaging: Packaging::TarGz {
            member: "filebrowser",
        },
        urls: &[
            ("arm64", "https://github.com/filebrowser/filebrowser/releases/latest/download/linux-arm64-filebrowser.tar.gz"),
            ("armv7", "https://github.com/filebrowser/filebrowser/releases/latest/download/linux-armv7-filebrowser.tar.gz"),
            ("amd64", "https://github.com/filebrowser/filebrowser/releases/latest/download/linux-amd64-filebrowser.tar.gz"),
            ("386", "https://github.com/filebrowser/filebrowser/releases/latest/download/linux-386-filebrowser.tar.gz"),
        ],
    },
];

/// Total number of helpers (derived from HELPERS.len())
pub const HELPER_COUNT: usize = HELPERS.len();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_helper_covers_every_known_architecture() {
        for arch in [
            Architecture::Arm64,
            Architecture::Armv7,
            Architecture::Amd64,
            Architecture::X86,
        ] {
            for helper in HELPERS {
                assert!(helper.target(&arch).url.is_some(), "{} {arch}", helper.name);
            }
        }
    }

    #[test]
    fn unknown_architecture_has_no_url() {
        let arch = Architecture::resolve("mips");
        assert_eq!(HELPERS[0].target(&arch).url, None);
    }

    #[test]
    fn unknown_architecture_named_like_a_table_entry_has_no_url() {
        // an unresolved identifier that happens to equal a canonical name
        let arch = Architecture::Unknown("arm64".to_string());
        for helper in HELPERS {
            let target = helper.target(&arch);
            assert_eq!(target.url, None, "{}", helper.name);
            assert_eq!(target.architecture, arch);
        }
    }
}
