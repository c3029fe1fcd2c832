//! Helper binary download with progress tracking

use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::install::binaries::{HELPER_COUNT, HELPERS, HelperBinary, Packaging};
use crate::install::core::{AsyncTask, InstallContext};
use crate::install::error::{
    InstallError, InstallWarning, StepOutcome, StepResult, WarningKind,
};
use crate::install::output;
use super::extract::extract_member;
use super::platform::Architecture;

const DOWNLOAD_CONNECT_TIMEOUT: Duration = Duration::from_secs(30); // Initial connection
const DOWNLOAD_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(300); // 5 min no data

/// Seam over HTTP downloads
pub trait Downloader: Send + Sync {
    /// Stream `url` into `dest`, returning the number of bytes written
    fn fetch(&self, url: &str, dest: &Path) -> AsyncTask<Result<u64>>;
}

/// Streaming reqwest downloader
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    connect_timeout: Duration,
    inactivity_timeout: Duration,
    user_agent: String,
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self {
            connect_timeout: DOWNLOAD_CONNECT_TIMEOUT,
            inactivity_timeout: DOWNLOAD_INACTIVITY_TIMEOUT,
            user_agent: format!("mcst-install/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Downloader for HttpDownloader {
    fn fetch(&self, url: &str, dest: &Path) -> AsyncTask<Result<u64>> {
        let this = self.clone();
        let url = url.to_string();
        let dest = dest.to_path_buf();
        AsyncTask::from_future(async move { this.stream_to_file(&url, &dest).await })
    }
}

impl HttpDownloader {
    async fn stream_to_file(&self, url: &str, dest: &Path) -> Result<u64> {
        use futures::StreamExt;
        use tokio::io::AsyncWriteExt;

        let client = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .user_agent(&self.user_agent)
            .build()?;
        let response = client.get(url).send().await?.error_for_status()?;
        let total_bytes = response.content_length();

        let mut file = tokio::fs::File::create(dest)
            .await
            .with_context(|| format!("Failed to create {}", dest.display()))?;
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        loop {
            let chunk = match timeout(self.inactivity_timeout, stream.next()).await {
                Ok(Some(Ok(chunk))) => chunk,
                Ok(Some(Err(e))) => return Err(e.into()),
                Ok(None) => break,
                Err(_) => {
                    return Err(anyhow!(
                        "Download timeout: no data received for {} seconds from {}. \
                         Downloaded {} of {} bytes.",
                        self.inactivity_timeout.as_secs(),
                        url,
                        downloaded,
                        total_bytes.map_or_else(|| "?".to_string(), |t| t.to_string()),
                    ));
                }
            };
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
        }
        file.flush().await?;

        if let Some(total) = total_bytes
            && downloaded != total
        {
            return Err(anyhow!("Download of {url} truncated: {downloaded}/{total} bytes"));
        }
        log::debug!("downloaded {downloaded} bytes from {url}");
        Ok(downloaded)
    }
}

/// Download every helper missing from `<install_root>/bin`.
///
/// Helpers already present are left untouched. A host architecture outside
/// the download tables yields one warning and no downloads; a failed helper
/// yields a warning and the loop moves on.
pub async fn fetch_helpers(ctx: &InstallContext) -> StepResult {
    let bin_dir = ctx.config.bin_dir();
    tokio::fs::create_dir_all(&bin_dir)
        .await
        .map_err(|e| InstallError::io(format!("Failed to create {}", bin_dir.display()), e))?;

    let pending: Vec<&'static HelperBinary> = HELPERS
        .iter()
        .filter(|helper| {
            let present = bin_dir.join(helper.name).is_file();
            if present {
                output::skip(&format!("{} already installed", helper.name));
            }
            !present
        })
        .collect();
    if pending.is_empty() {
        return Ok(StepOutcome::Success);
    }

    let raw_arch = ctx.host.architecture().await;
    let arch = Architecture::resolve(&raw_arch);
    output::debug(ctx.config.debug, &format!("architecture '{raw_arch}' -> {arch:?}"));

    if !arch.is_supported() {
        let names: Vec<&str> = pending.iter().map(|h| h.name).collect();
        output::warning(&format!(
            "Architecture '{raw_arch}' is not supported; skipping {}",
            names.join(", ")
        ));
        return Ok(StepOutcome::Degraded(vec![InstallWarning::new(
            WarningKind::UnsupportedArchitecture,
            format!(
                "unsupported architecture '{raw_arch}': {} not installed",
                names.join(", ")
            ),
        )]));
    }

    let mut warnings = Vec::new();
    for (i, helper) in pending.into_iter().enumerate() {
        let index = HELPERS.iter().position(|h| h.name == helper.name).unwrap_or(i) + 1;
        let Some(url) = helper.target(&arch).url else {
            warnings.push(InstallWarning::new(
                WarningKind::HelperDownload,
                format!("no {} build for {arch}; {} is unavailable", helper.name, helper.feature),
            ));
            continue;
        };

        let message = format!("Downloading {} ({index}/{HELPER_COUNT})...", helper.name);
        let task = install_helper(ctx.downloader.clone(), helper, url, bin_dir.clone());
        match ctx.track(&message, task).await? {
            Ok(path) => {
                output::success(&format!("{} installed at {}", helper.name, path.display()));
            }
            Err(e) => {
                log::warn!("{} download failed: {e:#}", helper.name);
                output::warning(&format!("Could not install {}: {e}", helper.name));
                warnings.push(InstallWarning::new(
                    WarningKind::HelperDownload,
                    format!(
                        "{} failed to download; {} is unavailable",
                        helper.name, helper.feature
                    ),
                ));
            }
        }
    }

    Ok(StepOutcome::from_warnings(warnings))
}

/// Download one helper into a staging directory inside `bin_dir`, then move
/// the executable into place. A failed download never leaves a partial
/// `bin/<name>` behind.
fn install_helper(
    downloader: Arc<dyn Downloader>,
    helper: &'static HelperBinary,
    url: String,
    bin_dir: PathBuf,
) -> AsyncTask<Result<PathBuf>> {
    AsyncTask::from_future(async move {
        let staging = tempfile::Builder::new()
            .prefix(".download-")
            .tempdir_in(&bin_dir)
            .context("Failed to create download staging directory")?;
        let package_path = staging.path().join("package");

        downloader
            .fetch(&url, &package_path)
            .await
            .with_context(|| format!("Failed to download {url}"))?;

        let staged = match helper.packaging {
            Packaging::Raw => package_path,
            Packaging::TarGz { member } => {
                let extracted = staging.path().join(helper.name);
                extract_member(&package_path, member, &extracted).await?;
                extracted
            }
        };

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&staged, std::fs::Permissions::from_mode(0o755)).await?;
        }

        let final_path = bin_dir.join(helper.name);
        tokio::fs::rename(&staged, &final_path)
            .await
            .with_context(|| format!("Failed to move {} into place", helper.name))?;
        Ok(final_path)
    })
}
