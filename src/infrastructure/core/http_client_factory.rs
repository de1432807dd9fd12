use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Transport settings shared by every HTTP feed adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    /// Whole-request timeout enforced by the client
    pub timeout: Duration,
    /// Transient-error retries done by the middleware inside one feed call
    pub max_retries: u32,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Creates a new HTTP client with retry middleware
    pub fn create_client(settings: HttpSettings) -> ClientWithMiddleware {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(settings.max_retries);

        let client = Client::builder()
            .pool_max_idle_per_host(5)
            .timeout(settings.timeout)
            .connect_timeout(settings.timeout.min(Duration::from_secs(10)))
            .build()
            .unwrap_or_else(|e| {
                warn!("HttpClientFactory: falling back to default client: {}", e);
                Client::new()
            });

        ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build()
    }
}

/// Append `segments` to the path of `base` and set the query pairs.
/// Segments are percent-encoded. Returns None when `base` cannot carry a path.
pub fn build_url<S, K, V>(base: &Url, segments: &[S], params: &[(K, V)]) -> Option<Url>
where
    S: AsRef<str>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut url = base.clone();
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .extend(segments.iter().map(AsRef::as_ref));

    if !params.is_empty() {
        let mut query = url.query_pairs_mut();
        for (key, value) in params {
            query.append_pair(key.as_ref(), value.as_ref());
        }
    }
    Some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_encodes_segments_and_query() {
        let base = Url::parse("https://api.polygon.io/").unwrap();
        let url = build_url(
            &base,
            &["v2", "aggs", "ticker", "C:XAUUSD"],
            &[("sort", "asc"), ("apiKey", "a b")],
        )
        .unwrap();

        assert_eq!(
            url.as_str(),
            "https://api.polygon.io/v2/aggs/ticker/C:XAUUSD?sort=asc&apiKey=a+b"
        );
    }

    #[test]
    fn test_build_url_keeps_base_path() {
        let base = Url::parse("http://localhost:8080/proxy").unwrap();
        let no_params: &[(&str, &str)] = &[];
        let url = build_url(&base, &["v2"], no_params).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/proxy/v2");
    }

    #[test]
    fn test_build_url_rejects_opaque_base() {
        let base = Url::parse("mailto:desk@example.com").unwrap();
        assert!(build_url(&base, &["v2"], &[("a", "b")]).is_none());
    }
}
