//! Input resolution: turn a path, URL or in-memory upload into a local PDF.
//!
//! pdfium opens files by path, so URLs and byte buffers are first written to
//! a temp location owned by [`ResolvedInput`]; dropping it removes the copy.
//! The `%PDF` magic is checked up front so a wrong file type produces a
//! clear error rather than a pdfium failure.

use crate::error::RoadmapError;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A PDF that can be opened by path for the lifetime of this value.
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; PDF downloaded to a temp directory.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
    /// Input was a byte buffer written to a temp file.
    Buffered(NamedTempFile),
}

impl ResolvedInput {
    /// Path to the PDF file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
            ResolvedInput::Buffered(file) => file.path(),
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a path or URL to a local PDF file.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, RoadmapError> {
    if input.trim().is_empty() {
        return Err(RoadmapError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

/// Write an uploaded PDF to a temp file.
pub fn resolve_bytes(bytes: &[u8]) -> Result<ResolvedInput, RoadmapError> {
    let mut file = tempfile::Builder::new()
        .prefix("upload_")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| RoadmapError::Internal(format!("tempfile: {e}")))?;

    if let Some(magic) = bad_magic(bytes) {
        return Err(RoadmapError::NotAPdf {
            path: file.path().to_path_buf(),
            magic,
        });
    }

    file.write_all(bytes)
        .and_then(|_| file.flush())
        .map_err(|e| RoadmapError::Internal(format!("tempfile write: {e}")))?;

    debug!("Buffered {} bytes to {}", bytes.len(), file.path().display());
    Ok(ResolvedInput::Buffered(file))
}

/// The leading bytes (zero-padded) when they are not `%PDF`.
///
/// Buffers shorter than the magic are never a PDF.
fn bad_magic(bytes: &[u8]) -> Option<[u8; 4]> {
    let mut head = [0u8; 4];
    let n = bytes.len().min(head.len());
    head[..n].copy_from_slice(&bytes[..n]);
    (n < head.len() || &head != PDF_MAGIC).then_some(head)
}

/// Resolve a local file path, validating existence and PDF magic bytes.
fn resolve_local(path_str: &str) -> Result<ResolvedInput, RoadmapError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(RoadmapError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(f) => {
            let mut head = Vec::with_capacity(PDF_MAGIC.len());
            if f.take(PDF_MAGIC.len() as u64).read_to_end(&mut head).is_ok() {
                if let Some(magic) = bad_magic(&head) {
                    return Err(RoadmapError::NotAPdf { path, magic });
                }
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(RoadmapError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(RoadmapError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// Download a URL to a temporary directory and return the path.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, RoadmapError> {
    info!("Downloading PDF from: {}", url);

    let parsed = reqwest::Url::parse(url).map_err(|_| RoadmapError::InvalidInput {
        input: url.to_string(),
    })?;

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| RoadmapError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(parsed.clone()).send().await.map_err(|e| {
        if e.is_timeout() {
            RoadmapError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            RoadmapError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(RoadmapError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| RoadmapError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let temp_dir = TempDir::new().map_err(|e| RoadmapError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(filename_from_url(&parsed));

    if let Some(magic) = bad_magic(&bytes) {
        return Err(RoadmapError::NotAPdf {
            path: file_path,
            magic,
        });
    }

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| RoadmapError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded {} bytes to: {}", bytes.len(), file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Last path segment when it looks like a file name, else `paper.pdf`.
fn filename_from_url(url: &reqwest::Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|last| !last.is_empty() && last.contains('.'))
        .map(str::to_string)
        .unwrap_or_else(|| "paper.pdf".to_string())
}
