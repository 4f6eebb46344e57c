use crate::core::config::FetchConfig;
use crate::data::query::ViewportQuery;
use crate::data::response::FetchResponse;
use crate::{Error, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::{RequestBuilder, Response, Url};
use std::time::Duration;

/// Shared async HTTP client for viewport queries and bulk actions
pub(crate) static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent(concat!("plotmap/", env!("CARGO_PKG_VERSION")))
        .tcp_keepalive(Duration::from_secs(30))
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .unwrap_or_else(|e| {
            log::warn!("Falling back to default HTTP client: {e}");
            reqwest::Client::new()
        })
});

/// Where parcels and clusters for a viewport come from
#[async_trait]
pub trait PlotSource: Send + Sync {
    async fn fetch(&self, query: &ViewportQuery) -> Result<FetchResponse>;
}

/// Resolves `path` against `base`, keeping any path prefix of `base`
pub(crate) fn join_url(base: &str, path: &str) -> Result<Url> {
    let base = Url::parse(base).map_err(|e| Error::InvalidConfig(format!("{base}: {e}")))?;
    let mut joined = base.clone();
    let prefix = base.path().trim_end_matches('/');
    joined.set_path(&format!("{prefix}{path}"));
    Ok(joined)
}

/// Adds bearer auth and timeout when configured
pub(crate) fn prepare(
    request: RequestBuilder,
    token: Option<&str>,
    timeout: Option<Duration>,
) -> RequestBuilder {
    let request = match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    };
    match timeout {
        Some(timeout) => request.timeout(timeout),
        None => request,
    }
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Maps a non-2xx response to [`Error::Http`]. The message is the backend's
/// `detail` field when present, otherwise the raw body.
pub(crate) async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => parsed.detail,
        Err(_) => body,
    };
    Err(Error::Http {
        status: status.as_u16(),
        message,
    })
}

/// [`PlotSource`] backed by the listings backend's viewport endpoint
#[derive(Debug, Clone)]
pub struct HttpPlotSource {
    url: Url,
    auth_token: Option<String>,
    timeout: Option<Duration>,
}

impl HttpPlotSource {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        Ok(Self {
            url: join_url(&config.base_url, &config.endpoint)?,
            auth_token: config.auth_token.clone(),
            timeout: config.request_timeout(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Full request URL for a query
    pub fn request_url(&self, query: &ViewportQuery) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut().extend_pairs(query.to_query_pairs());
        url
    }
}

#[async_trait]
impl PlotSource for HttpPlotSource {
    async fn fetch(&self, query: &ViewportQuery) -> Result<FetchResponse> {
        let url = self.request_url(query);
        log::debug!("GET {url}");

        let request = prepare(
            HTTP_CLIENT.get(url),
            self.auth_token.as_deref(),
            self.timeout,
        );
        let response = check_status(request.send().await?).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::viewport::Viewport;
    use crate::data::query::FilterParams;

    #[test]
    fn test_join_url_keeps_prefix() {
        let url = join_url("https://example.org/backend/", "/api/plots/viewport").unwrap();
        assert_eq!(url.as_str(), "https://example.org/backend/api/plots/viewport");

        let url = join_url("http://localhost:8000", "/api/admin/plots/map").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/admin/plots/map");

        assert!(join_url("no scheme", "/x").is_err());
    }

    #[test]
    fn test_request_url_carries_viewport_and_filters() {
        let source = HttpPlotSource::new(&FetchConfig::default()).unwrap();
        let query = ViewportQuery::new(
            Viewport::new(54.72, 54.7, 20.5, 20.4, 10).unwrap(),
            FilterParams::new().with("settlements", "Svetlogorsk"),
        );

        let url = source.request_url(&query);
        assert_eq!(url.path(), "/api/admin/plots/map");
        assert_eq!(
            url.query(),
            Some("north=54.72&south=54.7&east=20.5&west=20.4&zoom=10&settlements=Svetlogorsk")
        );
    }
}
