//! Release archive download.

use crate::error::{Result, UpdaterError};
use crate::ui::ProgressManager;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

/// Downloads a release archive to a local file.
///
/// The destination is owned by the caller (normally a temporary file), so
/// the fetcher never has to clean up after itself.
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveFetcher {
    /// Stream `url` into `dest`, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::DownloadFailed`] when the server does not
    /// answer with a success status, [`UpdaterError::NetworkError`] when the
    /// transfer breaks off and [`UpdaterError::FileWrite`] when `dest`
    /// cannot be written.
    fn fetch_to(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// HTTP-based fetcher using `ureq`, reporting progress as it streams.
pub struct HttpArchiveFetcher {
    agent: ureq::Agent,
    user_agent: String,
    progress_manager: ProgressManager,
    buffer_size: usize,
}

impl HttpArchiveFetcher {
    pub fn new(progress_manager: ProgressManager) -> Self {
        Self {
            // Archive size varies, so only the client's own defaults apply.
            agent: super::http_agent(None),
            user_agent: format!("neversink-updater/{}", env!("CARGO_PKG_VERSION")),
            progress_manager,
            buffer_size: 64 * 1024,
        }
    }

    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl ArchiveFetcher for HttpArchiveFetcher {
    fn fetch_to(&self, url: &str, dest: &Path) -> Result<u64> {
        log::debug!("downloading {} to {}", url, dest.display());

        let response = self
            .agent
            .get(url)
            .header("User-Agent", self.user_agent.as_str())
            .call()
            .map_err(|e| map_download_error(url, &e))?;

        let total = content_length(response.headers());
        let pb = self
            .progress_manager
            .create_download_progress(total, "Downloading the archive...");

        let result = self.stream_body(pb.wrap_read(response.into_body().into_reader()), url, dest);
        pb.finish_and_clear();

        let total_bytes = result?;
        log::info!("downloaded {} bytes from {}", total_bytes, url);

        Ok(total_bytes)
    }
}

impl HttpArchiveFetcher {
    fn stream_body<R: Read>(&self, mut reader: R, url: &str, dest: &Path) -> Result<u64> {
        let file = File::create(dest).map_err(|e| UpdaterError::file_write(dest, e))?;
        let mut writer = BufWriter::with_capacity(self.buffer_size, file);

        let mut total_bytes = 0u64;
        let mut buffer = vec![0u8; 8192];

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(UpdaterError::NetworkError {
                        url: url.to_string(),
                        message: e.to_string(),
                    })
                }
            };

            writer
                .write_all(&buffer[..bytes_read])
                .map_err(|e| UpdaterError::file_write(dest, e))?;
            total_bytes += bytes_read as u64;
        }

        writer
            .flush()
            .map_err(|e| UpdaterError::file_write(dest, e))?;

        Ok(total_bytes)
    }
}

fn content_length(headers: &ureq::http::HeaderMap) -> Option<u64> {
    headers
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

fn map_download_error(url: &str, err: &ureq::Error) -> UpdaterError {
    match super::error_status(err) {
        Some(status) => UpdaterError::DownloadFailed {
            url: url.to_string(),
            status: Some(status),
        },
        None => UpdaterError::NetworkError {
            url: url.to_string(),
            message: err.to_string(),
        },
    }
}
