//! Publishing rendered pages to the file host.
//!
//! ## Concurrency
//!
//! Uploads are network-bound, so one document's pages are sent through a
//! `buffer_unordered(concurrency)` stream: at most `concurrency` requests are
//! in flight and results arrive in completion order, not page order. The
//! stream is drained before [`upload_all`] returns, so nothing outlives the
//! batch however many items failed.
//!
//! ## Failure policy
//!
//! A failed upload is terminal for that file within the batch: it is logged
//! with the owning document and dropped from the URL list. No retries.

use crate::error::UploadError;
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// The remote storage capability.
///
/// `put` stores the file at `local_path` under `endpoint` and returns the URL
/// it can be retrieved from, `endpoint + '/' + file name` by convention.
pub trait RemoteStore: Send + Sync {
    fn put(
        &self,
        local_path: &Path,
        endpoint: &str,
    ) -> impl Future<Output = Result<String, UploadError>> + Send;
}

/// Outcome of one upload: the URL on success, the reason otherwise.
#[derive(Debug, Clone)]
pub struct UploadResult {
    pub local_path: PathBuf,
    pub url: Option<String>,
    pub error: Option<UploadError>,
}

/// URL a file named `file_name` is served from once stored at `endpoint`.
pub fn remote_url(endpoint: &str, file_name: &str) -> String {
    format!("{}/{}", endpoint.trim_end_matches('/'), file_name)
}

/// [`RemoteStore`] posting each file as `multipart/form-data` (field `file`).
#[derive(Debug, Clone, Default)]
pub struct HttpStore {
    client: reqwest::Client,
}

impl HttpStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (proxy, TLS roots, timeouts).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl RemoteStore for HttpStore {
    async fn put(&self, local_path: &Path, endpoint: &str) -> Result<String, UploadError> {
        let missing = || UploadError::FileMissing {
            path: local_path.to_path_buf(),
        };
        let transport = |detail: String| UploadError::Transport {
            path: local_path.to_path_buf(),
            detail,
        };

        let file_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(missing)?;

        let bytes = tokio::fs::read(local_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                missing()
            } else {
                transport(format!("read failed: {e}"))
            }
        })?;

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str("image/png")
            .map_err(|e| transport(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(transport(format!("HTTP {status}")));
        }
        debug!("Uploaded '{}' → HTTP {}", local_path.display(), status);

        Ok(remote_url(endpoint, &file_name))
    }
}

/// Upload every path with at most `concurrency` requests in flight.
///
/// Returns one [`UploadResult`] per input, in completion order. `document`
/// only adds context to the log lines.
pub async fn upload_all<S: RemoteStore>(
    store: &S,
    paths: &[PathBuf],
    endpoint: &str,
    concurrency: usize,
    document: &str,
) -> Vec<UploadResult> {
    stream::iter(
        paths
            .iter()
            .map(|path| upload_one(store, path, endpoint, document))
            .collect::<Vec<_>>(),
    )
    .buffer_unordered(concurrency.max(1))
    .collect()
    .await
}

async fn upload_one<'a, S: RemoteStore>(
    store: &'a S,
    path: &'a PathBuf,
    endpoint: &'a str,
    document: &'a str,
) -> UploadResult {
    match store.put(path, endpoint).await {
        Ok(url) => UploadResult {
            local_path: path.clone(),
            url: Some(url),
            error: None,
        },
        Err(e) => {
            error!(document, path = %path.display(), "Upload failed: {}", e);
            UploadResult {
                local_path: path.clone(),
                url: None,
                error: Some(e),
            }
        }
    }
}

/// Upload every path and keep only the URLs that succeeded.
///
/// The order of the returned URLs is not guaranteed to match `paths`.
pub async fn upload_batch<S: RemoteStore>(
    store: &S,
    paths: &[PathBuf],
    endpoint: &str,
    concurrency: usize,
    document: &str,
) -> Vec<String> {
    let results = upload_all(store, paths, endpoint, concurrency, document).await;
    let total = results.len();
    let urls: Vec<String> = results.into_iter().filter_map(|r| r.url).collect();
    info!(document, "Uploaded {}/{} images", urls.len(), total);
    urls
}
