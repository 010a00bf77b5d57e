// Toolchain archive download: streamed to a temp file, promoted atomically
//
// The canonical archive path must never be observable half-written; the
// only operation that makes it appear is the final rename.

use std::path::Path;

use futures::StreamExt;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{DownloadError, Result};

const USER_AGENT: &str = concat!("pylift/", env!("CARGO_PKG_VERSION"));

/// Observer for fractional download progress (received / Content-Length).
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, fraction: f64);
}

/// Observer for headless runs.
pub struct NullProgress;

impl ProgressObserver for NullProgress {
    fn on_progress(&self, _fraction: f64) {}
}

/// Downloads versioned toolchain archives over HTTP(S), honoring an
/// environment-provided proxy. No retry here; a failed download is
/// surfaced and the canonical path is left untouched.
pub struct ArchiveFetcher {
    client: reqwest::Client,
}

impl ArchiveFetcher {
    pub fn new() -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(proxy_url) = proxy_from_env() {
            debug!(proxy = %proxy_url, "Using proxy from environment");
            let proxy = reqwest::Proxy::all(&proxy_url).map_err(|e| DownloadError::Client {
                error: format!("invalid proxy {proxy_url}: {e}"),
            })?;
            builder = builder.proxy(proxy);
        }
        let client = builder.build().map_err(|e| DownloadError::Client {
            error: e.to_string(),
        })?;
        Ok(Self { client })
    }

    /// Streams `url` into a randomized temp name next to `dest`, then
    /// promotes it to `dest` once the full byte stream is on disk.
    pub async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        progress: &dyn ProgressObserver,
    ) -> Result<()> {
        let response =
            self.client
                .get(url)
                .send()
                .await
                .map_err(|e| DownloadError::Transport {
                    url: url.to_string(),
                    error: e.to_string(),
                })?;

        // Fail before any bytes land on disk.
        if !response.status().is_success() {
            return Err(DownloadError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            }
            .into());
        }
        let total = response.content_length().filter(|len| *len > 0);

        let dir = dest.parent().unwrap_or_else(|| Path::new("."));
        tokio::fs::create_dir_all(dir).await?;

        // Same directory as the destination, so the promoting rename
        // stays on one filesystem.
        let temp = NamedTempFile::new_in(dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            temp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o750))?;
        }

        let mut file = tokio::fs::File::from_std(temp.reopen()?);
        let mut received: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DownloadError::Interrupted {
                url: url.to_string(),
                error: e.to_string(),
            })?;
            file.write_all(&chunk).await?;
            received += chunk.len() as u64;
            if let Some(total) = total {
                progress.on_progress(received as f64 / total as f64);
            }
        }
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        promote_archive(temp, dest)?;
        info!(url, bytes = received, dest = %dest.display(), "Archive downloaded");
        Ok(())
    }
}

/// Delete-then-rename promotion. A stale canonical file is removed first
/// (already absent is fine); the rename is what makes the new archive
/// visible.
fn promote_archive(temp: NamedTempFile, dest: &Path) -> Result<()> {
    match std::fs::remove_file(dest) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    temp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

fn proxy_from_env() -> Option<String> {
    ["https_proxy", "HTTPS_PROXY"]
        .iter()
        .find_map(|name| std::env::var(name).ok())
        .filter(|value| !value.is_empty())
}
