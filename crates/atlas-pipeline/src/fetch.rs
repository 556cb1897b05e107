//! The byte-fetching seam.
//!
//! A [`Fetcher`] turns a URL into the full response body, reporting progress
//! as `(received, total)` byte counts. `total` is `None` when the source does
//! not announce a length.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use http_body_util::{BodyExt, Empty};
use hyper::header::CONTENT_LENGTH;
use hyper::Uri;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use rustls::{ClientConfig, RootCertStore};
use tracing::debug;

use crate::error::{FetchError, FetchResult};

/// Upper bound on the buffer reserved from an announced `Content-Length`.
/// Larger bodies grow the buffer as frames arrive.
const MAX_PREALLOC: u64 = 8 << 20;

/// Progress callback: bytes received so far and the announced total.
pub type ProgressFn<'a> = &'a (dyn Fn(u64, Option<u64>) + Send + Sync);

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, progress: ProgressFn<'_>) -> FetchResult<Bytes>;
}

fn scheme_of(url: &str) -> Option<&str> {
    url.split_once("://").map(|(scheme, _)| scheme)
}

/// `http://` and `https://` client. TLS trusts the webpki root set.
/// Redirects are not followed.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client<HttpsConnector<HttpConnector>, Empty<Bytes>>,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let tls = ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();
        let connector = HttpsConnectorBuilder::new()
            .with_tls_config(tls)
            .https_or_http()
            .enable_http1()
            .build();
        Self {
            client: Client::builder(TokioExecutor::new()).build(connector),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFetcher").finish_non_exhaustive()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, progress: ProgressFn<'_>) -> FetchResult<Bytes> {
        match scheme_of(url) {
            Some("http" | "https") => {}
            other => {
                return Err(FetchError::UnsupportedScheme {
                    scheme: other.unwrap_or_default().to_string(),
                    url: url.to_string(),
                })
            }
        }
        let uri: Uri = url.parse().map_err(|e: hyper::http::uri::InvalidUri| {
            FetchError::InvalidUrl {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;

        let response = self
            .client
            .get(uri)
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let total = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        let mut body = response.into_body();
        let reserve = total.map_or(0, |t| t.min(MAX_PREALLOC)) as usize;
        let mut buf = BytesMut::with_capacity(reserve);
        while let Some(frame) = body.frame().await {
            let frame = frame.map_err(|e| FetchError::Transport(e.to_string()))?;
            if let Ok(data) = frame.into_data() {
                buf.extend_from_slice(&data);
                progress(buf.len() as u64, total);
            }
        }
        debug!(url, bytes = buf.len(), "http fetch complete");
        Ok(buf.freeze())
    }
}

/// Reads `file://` URLs and bare filesystem paths.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileFetcher;

impl FileFetcher {
    fn path_of(url: &str) -> FetchResult<&Path> {
        match scheme_of(url) {
            None => Ok(Path::new(url)),
            Some("file") => Ok(Path::new(&url["file://".len()..])),
            Some(scheme) => Err(FetchError::UnsupportedScheme {
                scheme: scheme.to_string(),
                url: url.to_string(),
            }),
        }
    }
}

#[async_trait]
impl Fetcher for FileFetcher {
    async fn fetch(&self, url: &str, progress: ProgressFn<'_>) -> FetchResult<Bytes> {
        let path = Self::path_of(url)?;
        let data = tokio::fs::read(path).await.map_err(|source| FetchError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let len = data.len() as u64;
        progress(len, Some(len));
        Ok(Bytes::from(data))
    }
}

/// Routes `http://` and `https://` to [`HttpFetcher`] and files to
/// [`FileFetcher`].
#[derive(Clone, Debug, Default)]
pub struct DefaultFetcher {
    http: HttpFetcher,
    file: FileFetcher,
}

impl DefaultFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Fetcher for DefaultFetcher {
    async fn fetch(&self, url: &str, progress: ProgressFn<'_>) -> FetchResult<Bytes> {
        match scheme_of(url) {
            Some("http" | "https") => self.http.fetch(url, progress).await,
            None | Some("file") => self.file.fetch(url, progress).await,
            Some(scheme) => Err(FetchError::UnsupportedScheme {
                scheme: scheme.to_string(),
                url: url.to_string(),
            }),
        }
    }
}
