// THEORY:
// Image acquisition for the web front end. A submission names an image in one
// of two ways and the remote link wins:
//
// 1.  `image_url`: the link is fetched. A transport failure, a timeout or a
//     body larger than the upload limit ends the request, but a non-200 answer
//     only means "no image from the link" and the form falls through to the
//     file field.
// 2.  `image_file`: an uploaded file with a non-empty name.
//
// Whatever is acquired is stored in the upload directory under a sanitised
// name, so the result page can show it back to the user.

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use reqwest::Url;
use std::path::{Path, PathBuf};
use std::time::Duration;
use terrain_risk::InvalidImageError;
use thiserror::Error;

use crate::page;

pub const FALLBACK_DOWNLOAD_NAME: &str = "downloaded_image.jpg";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("no image selected")]
    NoImageSelected,

    #[error("error loading image from URL: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("image is larger than the {limit} byte limit")]
    TooLarge { limit: usize },

    #[error("unreadable form submission: {0}")]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Image(#[from] InvalidImageError),

    #[error("could not render histogram: {0}")]
    Chart(#[from] image::ImageError),

    #[error("could not store upload: {0}")]
    Io(#[from] std::io::Error),

    #[error("analysis worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl UploadError {
    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::NoImageSelected => StatusCode::BAD_REQUEST,
            UploadError::Multipart(error) => error.status(),
            UploadError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            UploadError::Fetch(_) => StatusCode::BAD_GATEWAY,
            UploadError::Image(_) => StatusCode::UNPROCESSABLE_ENTITY,
            UploadError::Chart(_) | UploadError::Io(_) | UploadError::Worker(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "upload failed");
        } else {
            tracing::warn!(error = %self, "upload rejected");
        }
        (status, Html(page::error_page(&self.to_string()))).into_response()
    }
}

/// The two ways a submission can name an image.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub image_url: Option<String>,
    pub image_file: Option<AcquiredImage>,
}

/// Encoded image bytes plus the name they will be stored under.
#[derive(Debug, Clone)]
pub struct AcquiredImage {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadForm {
    /// Reads the multipart fields; unknown fields are ignored.
    pub async fn read(mut multipart: Multipart) -> Result<Self, UploadError> {
        let mut form = UploadForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some("image_url") => {
                    let url = field.text().await?;
                    let url = url.trim();
                    if !url.is_empty() {
                        form.image_url = Some(url.to_string());
                    }
                }
                Some("image_file") => {
                    let Some(filename) = field.file_name().and_then(sanitize_filename) else {
                        continue;
                    };
                    let bytes = field.bytes().await?;
                    form.image_file = Some(AcquiredImage {
                        filename,
                        bytes: bytes.to_vec(),
                    });
                }
                _ => {}
            }
        }
        Ok(form)
    }
}

/// HTTP client used for image links; every request is bounded by `timeout`.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build()
}

/// Picks the image for a submission, fetching the URL first when one is given.
pub async fn acquire(
    client: &reqwest::Client,
    form: UploadForm,
    max_bytes: usize,
) -> Result<AcquiredImage, UploadError> {
    if let Some(url) = form.image_url.as_deref() {
        if let Some(fetched) = fetch_remote(client, url, max_bytes).await? {
            return Ok(fetched);
        }
    }
    form.image_file.ok_or(UploadError::NoImageSelected)
}

/// Downloads `url`, reading at most `max_bytes` of body. Returns `None` when
/// the server answers with anything but 200.
pub async fn fetch_remote(
    client: &reqwest::Client,
    url: &str,
    max_bytes: usize,
) -> Result<Option<AcquiredImage>, UploadError> {
    let mut response = client.get(url).send().await?;
    let status = response.status();
    if status != reqwest::StatusCode::OK {
        tracing::info!(%url, %status, "remote image unavailable, falling back to file field");
        return Ok(None);
    }

    if let Some(length) = response.content_length() {
        if length > max_bytes as u64 {
            tracing::warn!(%url, length, max_bytes, "remote image too large");
            return Err(UploadError::TooLarge { limit: max_bytes });
        }
    }

    // Content-Length may be absent or wrong, so the limit is enforced while reading too.
    let mut bytes = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if bytes.len() + chunk.len() > max_bytes {
            tracing::warn!(%url, max_bytes, "remote image body exceeded limit");
            return Err(UploadError::TooLarge { limit: max_bytes });
        }
        bytes.extend_from_slice(&chunk);
    }

    tracing::info!(%url, bytes = bytes.len(), "fetched remote image");
    Ok(Some(AcquiredImage {
        filename: filename_from_url(url),
        bytes,
    }))
}

/// Last path segment of `url`, or the fallback name when there is none.
pub fn filename_from_url(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .and_then(|segment| sanitize_filename(&segment))
        .unwrap_or_else(|| FALLBACK_DOWNLOAD_NAME.to_string())
}

/// Reduces a client-supplied name to its final path component.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next()?.trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

/// Writes the acquired bytes into `upload_dir`.
pub async fn store(upload_dir: &Path, image: &AcquiredImage) -> Result<PathBuf, UploadError> {
    let path = upload_dir.join(&image.filename);
    tokio::fs::write(&path, &image.bytes).await?;
    tracing::debug!(path = %path.display(), "stored upload");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn local_client(timeout: Duration) -> reqwest::Client {
        reqwest::Client::builder()
            .no_proxy()
            .timeout(timeout)
            .build()
            .expect("client")
    }

    /// Answers the first connection with `response` verbatim and returns a URL for it.
    async fn serve_once(response: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let mut request = [0u8; 2048];
            let _ = socket.read(&mut request).await;
            let _ = socket.write_all(&response).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/tiles/big.png")
    }

    fn http_response(headers: &str, body_len: usize) -> Vec<u8> {
        let mut response = format!("HTTP/1.1 200 OK\r\nConnection: close\r\n{headers}\r\n").into_bytes();
        response.extend(std::iter::repeat_n(7u8, body_len));
        response
    }

    #[test]
    fn names_come_from_the_url_path() {
        assert_eq!(filename_from_url("https://example.com/tiles/field.png"), "field.png");
        assert_eq!(filename_from_url("https://example.com/a/b.jpg?size=large"), "b.jpg");
    }

    #[test]
    fn bare_urls_use_the_fallback_name() {
        assert_eq!(filename_from_url("https://example.com/"), FALLBACK_DOWNLOAD_NAME);
        assert_eq!(filename_from_url("https://example.com"), FALLBACK_DOWNLOAD_NAME);
        assert_eq!(filename_from_url("not a url"), FALLBACK_DOWNLOAD_NAME);
    }

    #[test]
    fn sanitising_strips_directories() {
        assert_eq!(sanitize_filename("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(sanitize_filename("C:\\photos\\lake.jpg").as_deref(), Some("lake.jpg"));
        assert_eq!(sanitize_filename("plain.png").as_deref(), Some("plain.png"));
        assert_eq!(sanitize_filename(".."), None);
        assert_eq!(sanitize_filename("dir/"), None);
        assert_eq!(sanitize_filename(""), None);
    }

    #[tokio::test]
    async fn url_takes_priority_but_file_is_the_fallback() {
        let client = reqwest::Client::new();
        let form = UploadForm {
            image_url: None,
            image_file: Some(AcquiredImage {
                filename: "local.png".into(),
                bytes: vec![1, 2, 3],
            }),
        };
        let acquired = acquire(&client, form, 1024).await.expect("file field used");
        assert_eq!(acquired.filename, "local.png");

        let empty = acquire(&client, UploadForm::default(), 1024).await;
        assert!(matches!(empty, Err(UploadError::NoImageSelected)));
    }

    #[tokio::test]
    async fn fetches_bodies_within_the_limit() {
        let url = serve_once(http_response("Content-Length: 512\r\n", 512)).await;
        let fetched = fetch_remote(&local_client(Duration::from_secs(5)), &url, 1024)
            .await
            .expect("fetch")
            .expect("200 answer");

        assert_eq!(fetched.filename, "big.png");
        assert_eq!(fetched.bytes.len(), 512);
    }

    #[tokio::test]
    async fn declared_oversized_bodies_are_refused() {
        let url = serve_once(http_response("Content-Length: 4096\r\n", 4096)).await;
        let result = fetch_remote(&local_client(Duration::from_secs(5)), &url, 1024).await;

        let error = result.expect_err("body over the limit");
        assert!(matches!(error, UploadError::TooLarge { limit: 1024 }));
        assert_eq!(error.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn undeclared_oversized_bodies_stop_at_the_limit() {
        // No Content-Length: the body runs until the connection closes.
        let url = serve_once(http_response("", 64 * 1024)).await;
        let result = fetch_remote(&local_client(Duration::from_secs(5)), &url, 1024).await;

        assert!(matches!(result, Err(UploadError::TooLarge { limit: 1024 })));
    }

    #[tokio::test]
    async fn non_200_answers_fall_through_to_the_file() {
        let url = serve_once(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_vec()).await;
        let form = UploadForm {
            image_url: Some(url),
            image_file: Some(AcquiredImage {
                filename: "local.png".into(),
                bytes: vec![1],
            }),
        };

        let acquired = acquire(&local_client(Duration::from_secs(5)), form, 1024)
            .await
            .expect("file field used");
        assert_eq!(acquired.filename, "local.png");
    }

    #[tokio::test]
    async fn silent_servers_time_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let url = format!("http://{}/slow.png", listener.local_addr().expect("addr"));
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.expect("accept");
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(socket);
        });

        let result = fetch_remote(&local_client(Duration::from_millis(200)), &url, 1024).await;
        let error = result.expect_err("request times out");
        assert!(matches!(&error, UploadError::Fetch(inner) if inner.is_timeout()));
        assert_eq!(error.status(), StatusCode::BAD_GATEWAY);
        server.abort();
    }

    #[test]
    fn client_builds_with_a_timeout() {
        assert!(http_client(Duration::from_secs(1)).is_ok());
    }

    #[tokio::test]
    async fn stores_into_the_upload_dir() {
        let dir = std::env::temp_dir().join(format!("terrain_risk_upload_{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.expect("temp dir");

        let image = AcquiredImage {
            filename: "stored.bin".into(),
            bytes: vec![9, 8, 7],
        };
        let path = store(&dir, &image).await.expect("store");
        assert_eq!(tokio::fs::read(&path).await.expect("read back"), vec![9, 8, 7]);

        tokio::fs::remove_dir_all(&dir).await.expect("cleanup");
    }

    #[test]
    fn statuses_follow_the_failure() {
        assert_eq!(UploadError::NoImageSelected.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            UploadError::Image(InvalidImageError::Empty { width: 0, height: 0 }).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
