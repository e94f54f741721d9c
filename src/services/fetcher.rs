// src/services/fetcher.rs

//! Single-image download.
//!
//! [`ImageFetcher::fetch`] never returns an error: every failure becomes a
//! Fail [`ImageResult`] carrying the failure category, and nothing is left
//! on disk for it.

use std::error::Error as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::error::Result;
use crate::models::{FetchConfig, ImageResult};
use crate::utils::fs::{ensure_dir, resolve_unique_path, write_atomic};
use crate::utils::truncate_graphemes;
use crate::utils::url::file_name_from_url;

const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".jfif", ".jpe", ".gif", ".png", ".bmp", ".svg", ".webp", ".ico",
];

const CONTENT_TYPE_EXTENSIONS: &[(&str, &str)] = &[
    ("image/gif", "gif"),
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/svg+xml", "svg"),
    ("image/x-icon", "ico"),
    ("image/webp", "webp"),
    ("image/bmp", "bmp"),
];

const FALLBACK_NAME: &str = "image";

/// Why a single download failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("image response is not ok. status: {0}")]
    Status(StatusCode),

    #[error("{source}")]
    Transport {
        category: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("unrecognized content type: {}", .0.as_deref().unwrap_or("<missing>"))]
    UnknownContentType(Option<String>),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    fn transport(source: reqwest::Error) -> Self {
        Self::Transport {
            category: classify_transport(&source),
            source,
        }
    }

    /// Short failure category embedded in result messages.
    pub fn category(&self) -> &'static str {
        match self {
            FetchError::Status(_) => "status",
            FetchError::Transport { category, .. } => *category,
            FetchError::UnknownContentType(_) => "content-type",
            FetchError::Io(_) => "io",
        }
    }
}

fn classify_transport(err: &reqwest::Error) -> &'static str {
    if err.is_timeout() {
        return "timeout";
    }
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string().to_lowercase();
        if text.contains("certificate") || text.contains("tls") || text.contains("ssl") {
            return "tls";
        }
        source = cause.source();
    }
    if err.is_connect() {
        "connection"
    } else {
        "request"
    }
}

/// Whether the name already ends in a recognized image extension.
pub fn has_image_extension(name: &str) -> bool {
    let lower = name.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Extension for a declared content type, ignoring parameters.
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();
    CONTENT_TYPE_EXTENSIONS
        .iter()
        .find(|(known, _)| *known == mime)
        .map(|(_, ext)| *ext)
}

/// Downloads image URLs into a directory tree.
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    client: Client,
    max_filename_length: usize,
}

impl ImageFetcher {
    /// Create a fetcher with its own HTTP client.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            max_filename_length: config.max_filename_length,
        })
    }

    /// Download `url` into `output_dir/subdirectory`.
    ///
    /// `worker` tags the filename so that pool workers writing into the same
    /// directory never pick the same name.
    pub async fn fetch(
        &self,
        url: &str,
        output_dir: &Path,
        subdirectory: &str,
        worker: Option<usize>,
    ) -> ImageResult {
        match self.try_fetch(url, output_dir, subdirectory, worker).await {
            Ok(path) => {
                log::info!("    Downloaded the image. ==> {}", path.display());
                ImageResult::success(url, path)
            }
            Err(e) => {
                let message = format!("[{}] {}", e.category(), e);
                log::info!("    fail: {url} error: {message}");
                ImageResult::fail(url, message)
            }
        }
    }

    async fn try_fetch(
        &self,
        url: &str,
        output_dir: &Path,
        subdirectory: &str,
        worker: Option<usize>,
    ) -> std::result::Result<PathBuf, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let data = response.bytes().await.map_err(FetchError::transport)?;

        let (base_name, file_name) = self.target_name(url, content_type.as_deref(), worker)?;

        let directory = output_dir.join(subdirectory);
        ensure_dir(&directory).await?;

        let path = resolve_unique_path(&directory, &base_name, &directory.join(&file_name));
        write_atomic(&path, &data).await?;
        Ok(path)
    }

    /// Compute `(base_name, file_name)` for a download.
    fn target_name(
        &self,
        url: &str,
        content_type: Option<&str>,
        worker: Option<usize>,
    ) -> std::result::Result<(String, String), FetchError> {
        let raw = file_name_from_url(url).unwrap_or_else(|| FALLBACK_NAME.to_string());
        let mut name = truncate_graphemes(&raw, self.max_filename_length).to_string();
        if let Some(worker) = worker {
            name = format!("[{worker}] {name}");
        }

        if !has_image_extension(&name) {
            let ext = content_type
                .and_then(extension_for_content_type)
                .ok_or_else(|| FetchError::UnknownContentType(content_type.map(str::to_string)))?;
            name = Path::new(&name)
                .with_extension(ext)
                .to_string_lossy()
                .into_owned();
        }

        let base_name = Path::new(&name)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.clone());
        Ok((base_name, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;
    use crate::testing::{ImageServer, Route};
    use tempfile::TempDir;

    fn fetcher() -> ImageFetcher {
        ImageFetcher::new(&FetchConfig::default()).unwrap()
    }

    fn files_in(dir: &Path) -> Vec<String> {
        if !dir.exists() {
            return Vec::new();
        }
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_extension_tables() {
        assert!(has_image_extension("cat.JPG"));
        assert!(has_image_extension("cat.jpe"));
        assert!(!has_image_extension("cat.php"));
        assert_eq!(extension_for_content_type("image/jpeg"), Some("jpg"));
        assert_eq!(
            extension_for_content_type("image/png; charset=binary"),
            Some("png")
        );
        assert_eq!(extension_for_content_type("text/html"), None);
    }

    #[test]
    fn test_target_name_truncates_then_tags() {
        let fetcher = fetcher();
        let long = "a".repeat(80);
        let url = format!("https://a.test/{long}.jpg");
        let (base, name) = fetcher.target_name(&url, Some("image/jpeg"), Some(3)).unwrap();
        assert_eq!(name, format!("[3] {}.jpg", "a".repeat(50)));
        assert_eq!(base, format!("[3] {}", "a".repeat(50)));
    }

    #[test]
    fn test_target_name_replaces_foreign_extension() {
        let (base, name) = fetcher()
            .target_name("https://a.test/render.php", Some("image/gif"), None)
            .unwrap();
        assert_eq!(name, "render.gif");
        assert_eq!(base, "render");
    }

    #[tokio::test]
    async fn test_not_found_writes_nothing() {
        let server = ImageServer::start(vec![("/missing.jpg", Route::status(404))]).await;
        let tmp = TempDir::new().unwrap();

        let result = fetcher()
            .fetch(&server.url("/missing.jpg"), tmp.path(), "cats", None)
            .await;

        assert_eq!(result.status, Status::Fail);
        assert!(result.message.contains("not ok"));
        assert!(result.message.contains("404"));
        assert!(result.local_path.is_none());
        assert!(files_in(&tmp.path().join("cats")).is_empty());
    }

    #[tokio::test]
    async fn test_extension_from_content_type() {
        let server =
            ImageServer::start(vec![("/img/photo", Route::image("image/png", b"PNGDATA"))]).await;
        let tmp = TempDir::new().unwrap();

        let result = fetcher()
            .fetch(&server.url("/img/photo"), tmp.path(), "cats", None)
            .await;

        assert_eq!(result.status, Status::Success);
        let path = result.local_path.unwrap();
        assert_eq!(path, tmp.path().join("cats").join("photo.png"));
        assert_eq!(std::fs::read(path).unwrap(), b"PNGDATA".to_vec());
    }

    #[tokio::test]
    async fn test_repeated_download_is_deduplicated() {
        let server =
            ImageServer::start(vec![("/a.jpg", Route::image("image/jpeg", b"JPEG"))]).await;
        let tmp = TempDir::new().unwrap();
        let fetcher = fetcher();

        for _ in 0..3 {
            let result = fetcher.fetch(&server.url("/a.jpg"), tmp.path(), "cats", None).await;
            assert_eq!(result.status, Status::Success);
        }

        assert_eq!(
            files_in(&tmp.path().join("cats")),
            vec!["a (1).jpg", "a (2).jpg", "a.jpg"]
        );
    }

    #[tokio::test]
    async fn test_unknown_content_type_fails_cleanly() {
        let server =
            ImageServer::start(vec![("/page", Route::image("text/html", b"<html></html>"))]).await;
        let tmp = TempDir::new().unwrap();

        let result = fetcher().fetch(&server.url("/page"), tmp.path(), "cats", None).await;

        assert_eq!(result.status, Status::Fail);
        assert!(result.message.starts_with("[content-type]"));
        assert!(files_in(&tmp.path().join("cats")).is_empty());
    }

    #[tokio::test]
    async fn test_worker_tag_in_filename() {
        let server =
            ImageServer::start(vec![("/cat.jpg", Route::image("image/jpeg", b"JPEG"))]).await;
        let tmp = TempDir::new().unwrap();

        let result = fetcher()
            .fetch(&server.url("/cat.jpg"), tmp.path(), "", Some(2))
            .await;

        assert_eq!(result.local_path, Some(tmp.path().join("[2] cat.jpg")));
    }

    #[tokio::test]
    async fn test_connection_failure_is_reported() {
        // Bind and drop a listener to get a port nothing listens on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let tmp = TempDir::new().unwrap();

        let result = fetcher()
            .fetch(&format!("http://127.0.0.1:{port}/a.jpg"), tmp.path(), "cats", None)
            .await;

        assert_eq!(result.status, Status::Fail);
        assert!(result.message.starts_with("[connection]"));
        assert!(files_in(&tmp.path().join("cats")).is_empty());
    }
}
