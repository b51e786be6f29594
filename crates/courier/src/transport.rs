use async_trait::async_trait;
use futures::AsyncWriteExt;
use livebundle_core::{LiveBundleError, Result, Url};
use std::path::Path;
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A 2xx body was written in full to the destination.
    Downloaded { bytes: u64 },
    /// The server answered 304 for the conditional request.
    NotModified,
}

/// Fetches a remote resource into a local file.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url`, streaming a successful body into `dest`. When
    /// `if_modified_since` is set the request is conditional.
    /// Non-2xx statuses other than 304 are `TransportFailure`s.
    async fn fetch(
        &self,
        url: &Url,
        if_modified_since: Option<SystemTime>,
        dest: &Path,
    ) -> Result<FetchOutcome>;
}

fn transport_err(e: impl std::fmt::Display) -> LiveBundleError {
    LiveBundleError::TransportFailure(e.to_string())
}

/// HTTP(S) transport over surf, following redirects.
pub struct SurfTransport {
    client: surf::Client,
}

impl SurfTransport {
    pub fn new() -> Self {
        Self {
            client: surf::Client::new().with(RedirectMiddleware::new(5)),
        }
    }
}

impl Default for SurfTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for SurfTransport {
    async fn fetch(
        &self,
        url: &Url,
        if_modified_since: Option<SystemTime>,
        dest: &Path,
    ) -> Result<FetchOutcome> {
        let mut request = self.client.get(url.as_str());
        if let Some(since) = if_modified_since {
            request = request.header("If-Modified-Since", httpdate::fmt_http_date(since));
        }

        let mut response = request.await.map_err(transport_err)?;
        let status = response.status();
        if status == surf::StatusCode::NotModified {
            log::debug!("{} not modified", url);
            return Ok(FetchOutcome::NotModified);
        }
        if !status.is_success() {
            return Err(transport_err(format!("{} answered {}", url, status)));
        }

        let mut file = async_std::fs::File::create(dest).await?;
        let bytes = futures::io::copy(&mut response, &mut file)
            .await
            .map_err(|e| transport_err(format!("streaming {} failed: {}", url, e)))?;
        file.flush().await?;
        file.sync_all().await?;

        log::debug!("fetched {} bytes from {}", bytes, url);
        Ok(FetchOutcome::Downloaded { bytes })
    }
}

struct RedirectMiddleware {
    max_attempts: u8,
}

impl RedirectMiddleware {
    pub fn new(max_attempts: u8) -> Self {
        Self { max_attempts }
    }
}

#[surf::utils::async_trait]
impl surf::middleware::Middleware for RedirectMiddleware {
    async fn handle(
        &self,
        req: surf::Request,
        client: surf::Client,
        next: surf::middleware::Next<'_>,
    ) -> surf::Result<surf::Response> {
        let mut attempts = 0;
        let mut current_req = req;

        loop {
            if attempts > self.max_attempts {
                return Err(surf::Error::from_str(
                    surf::StatusCode::LoopDetected,
                    "Too many redirects",
                ));
            }

            let response = next.run(current_req.clone(), client.clone()).await?;
            if !response.status().is_redirection() {
                return Ok(response);
            }

            let location = match response.header("Location") {
                Some(location) => location.last().as_str().to_string(),
                None => return Ok(response),
            };

            // Relative locations resolve against the request URL.
            let next_url = current_req.url().join(&location).map_err(|_| {
                surf::Error::from_str(surf::StatusCode::BadGateway, "Invalid redirect location")
            })?;

            let mut redirected = surf::Request::new(current_req.method(), next_url);
            for (name, values) in current_req.iter() {
                redirected.insert_header(name.clone(), values.last().clone());
            }
            current_req = redirected;
            attempts += 1;
        }
    }
}
