//! Archive extraction for helper packages

use anyhow::{Context, Result, anyhow};
use flate2::read::GzDecoder;
use std::path::Path;
use tar::Archive;

/// Extract the regular file named `member` (at any depth) from a `.tar.gz`
/// into `dest`.
pub async fn extract_member(archive_path: &Path, member: &str, dest: &Path) -> Result<()> {
    let archive_path = archive_path.to_path_buf();
    let member = member.to_string();
    let dest = dest.to_path_buf();

    // Decompression is CPU-bound
    tokio::task::spawn_blocking(move || -> Result<()> {
        let file = std::fs::File::open(&archive_path)
            .with_context(|| format!("Failed to open {}", archive_path.display()))?;
        let mut archive = Archive::new(GzDecoder::new(file));

        let mut seen = Vec::new();
        for entry in archive.entries().context("Failed to read tar.gz archive")? {
            let mut entry = entry?;
            let path = entry.path()?.into_owned();
            let is_member = path.file_name().is_some_and(|n| n == member.as_str());
            if is_member && entry.header().entry_type().is_file() {
                entry
                    .unpack(&dest)
                    .with_context(|| format!("Failed to extract {member}"))?;
                return Ok(());
            }
            seen.push(path.display().to_string());
        }

        Err(anyhow!(
            "{} not found in archive. Archive contains: {}",
            member,
            seen.join(", ")
        ))
    })
    .await?
}
