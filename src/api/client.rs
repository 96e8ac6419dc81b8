//! Odds API request gateway.

use super::params::QueryParams;
use super::quota::QuotaSnapshot;
use super::retry::{RetryPolicy, Sleeper, TokioSleeper};
use super::transport::{ReqwestTransport, Transport};
use crate::config::ApiConfig;
use crate::credentials::ApiKey;
use crate::error::{Error, Result};
use reqwest::StatusCode;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Query parameter the API reads the key from. Always set by the client.
pub const API_KEY_PARAM: &str = "apiKey";

/// Parsed body and quota of a call; both `None` in dry-run mode.
pub type ApiResponse = (Option<Value>, Option<QuotaSnapshot>);

/// A fully resolved request: URL plus merged query parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    endpoint: String,
    url: String,
    params: QueryParams,
}

impl PreparedRequest {
    /// HTTP method. The API is read-only.
    pub fn method(&self) -> &'static str {
        "GET"
    }

    /// Endpoint path as given by the caller.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Base URL joined with the endpoint, without query string.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Query parameters including the API key.
    pub fn params(&self) -> &QueryParams {
        &self.params
    }
}

impl fmt::Display for PreparedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = serde_json::to_string(&self.params).map_err(|_| fmt::Error)?;
        write!(f, "{} {} params={}", self.method(), self.url, params)
    }
}

/// Builder for creating an Odds API client.
pub struct OddsApiBuilder {
    config: ApiConfig,
    api_key: Option<String>,
    transport: Option<Arc<dyn Transport>>,
    sleeper: Option<Arc<dyn Sleeper>>,
}

impl OddsApiBuilder {
    /// Create a new builder with default config.
    pub fn new() -> Self {
        Self {
            config: ApiConfig::default(),
            api_key: None,
            transport: None,
            sleeper: None,
        }
    }

    /// Set the API configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Override the dry-run flag from the config.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.dry_run = dry_run;
        self
    }

    /// Use a custom transport instead of `reqwest`.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a custom sleeper for rate-limit delays.
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    /// Build the client. Fails if the key is missing or blank.
    pub fn build(self) -> Result<OddsApi> {
        let api_key = match self.api_key {
            Some(key) => ApiKey::new(key)?,
            None => {
                return Err(Error::configuration(format!(
                    "{} not set",
                    self.config.api_key_env
                )));
            }
        };
        self.config.validate()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&self.config)?),
        };
        let sleeper = self.sleeper.unwrap_or_else(|| Arc::new(TokioSleeper));

        Ok(OddsApi {
            retry: RetryPolicy::from_config(&self.config),
            config: self.config,
            api_key,
            transport,
            sleeper,
        })
    }
}

impl Default for OddsApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Quota-aware client for The Odds API.
///
/// In dry-run mode (the default) requests are logged and never sent.
/// Otherwise each call performs one GET, retrying after a fixed delay while
/// the API answers 429, up to the configured retry limit.
#[derive(Clone)]
pub struct OddsApi {
    config: ApiConfig,
    api_key: ApiKey,
    retry: RetryPolicy,
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
}

impl fmt::Debug for OddsApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OddsApi")
            .field("base_url", &self.config.base_url)
            .field("dry_run", &self.config.dry_run)
            .field("api_key", &self.api_key)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl OddsApi {
    /// Start building a client.
    pub fn builder() -> OddsApiBuilder {
        OddsApiBuilder::new()
    }

    /// Create a client with the `reqwest` transport.
    pub fn new(config: ApiConfig, api_key: impl Into<String>) -> Result<Self> {
        OddsApiBuilder::new().config(config).api_key(api_key).build()
    }

    /// Create a client reading the key from `config.api_key_env`.
    pub fn from_env(config: ApiConfig) -> Result<Self> {
        let api_key = ApiKey::from_var(&config.api_key_env)?;
        Self::new(config, api_key.expose())
    }

    /// Whether requests are only logged.
    pub fn is_dry_run(&self) -> bool {
        self.config.dry_run
    }

    /// Base URL endpoints are appended to.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// The configured key.
    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Retry policy applied to 429 responses.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Resolve the URL and merge the key into a copy of `params`.
    pub fn prepare(&self, endpoint: &str, params: &QueryParams) -> PreparedRequest {
        let mut params = params.clone();
        params.insert(API_KEY_PARAM, self.api_key.expose());

        PreparedRequest {
            endpoint: endpoint.to_string(),
            url: join_url(&self.config.base_url, endpoint),
            params,
        }
    }

    /// Call `endpoint` with `params`.
    ///
    /// Returns `(None, None)` in dry-run mode without touching the network.
    ///
    /// # Errors
    ///
    /// * [`Error::Request`] for a non-success status other than 429.
    /// * [`Error::RateLimited`] when 429 persists past the retry limit.
    /// * [`Error::ResponseFormat`] when the body is not JSON.
    /// * [`Error::Network`] when the transport fails.
    pub async fn execute(&self, endpoint: &str, params: &QueryParams) -> Result<ApiResponse> {
        let request = self.prepare(endpoint, params);

        if self.config.dry_run {
            info!("[DRY-RUN] {}", request);
            return Ok((None, None));
        }

        let (body, quota) = self.send_with_retry(&request).await?;
        Ok((Some(body), Some(quota)))
    }

    async fn send_with_retry(&self, request: &PreparedRequest) -> Result<(Value, QuotaSnapshot)> {
        let pairs = request.params().to_pairs();
        let mut retries = 0;

        loop {
            debug!("GET {}", request.url());
            let response = self.transport.send(request.url(), &pairs).await?;

            if response.status == StatusCode::TOO_MANY_REQUESTS {
                if !self.retry.allows_retry(retries) {
                    warn!(
                        "Rate limit hit (429) on {}, giving up after {} attempts",
                        request.endpoint(),
                        retries + 1
                    );
                    return Err(Error::RateLimited {
                        endpoint: request.endpoint().to_string(),
                        attempts: retries + 1,
                    });
                }

                retries += 1;
                warn!(
                    "Rate limit hit (429), retrying in {:?} ({}/{})",
                    self.retry.delay, retries, self.retry.max_retries
                );
                self.sleeper.sleep(self.retry.delay).await;
                continue;
            }

            if !response.status.is_success() {
                return Err(Error::request(response.status, request.endpoint()));
            }

            let quota = QuotaSnapshot::from_headers(&response.headers);
            debug!(
                last = ?quota.last,
                used = ?quota.used,
                remaining = ?quota.remaining,
                "Quota after {}",
                request.endpoint()
            );
            if quota.is_exhausted() {
                warn!("Request quota exhausted");
            }

            let body: Value = serde_json::from_str(&response.body)?;
            return Ok((body, quota));
        }
    }

    /// List in-season sports; `all` includes out-of-season ones.
    pub async fn sports(&self, all: bool) -> Result<ApiResponse> {
        let mut params = QueryParams::new();
        if all {
            params.insert("all", true);
        }
        self.execute("/sports", &params).await
    }

    /// Current odds for `sport` in the given regions and markets
    /// (comma-separated, e.g. `"us"` and `"h2h,spreads"`).
    pub async fn odds(&self, sport: &str, regions: &str, markets: &str) -> Result<ApiResponse> {
        if sport.trim().is_empty() {
            return Err(Error::invalid_input("sport key must not be empty"));
        }
        let params = QueryParams::new()
            .with("regions", regions)
            .with("markets", markets);
        self.execute(&format!("/sports/{sport}/odds"), &params).await
    }
}

fn join_url(base: &str, endpoint: &str) -> String {
    let base = base.trim_end_matches('/');
    if endpoint.starts_with('/') {
        format!("{base}{endpoint}")
    } else {
        format!("{base}/{endpoint}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::params::ParamValue;
    use crate::api::quota::{
        HEADER_REQUESTS_LAST, HEADER_REQUESTS_REMAINING, HEADER_REQUESTS_USED,
    };
    use crate::api::retry::MockSleeper;
    use crate::api::transport::{HttpResponse, MockTransport};
    use mockall::Sequence;
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;
    use reqwest::header::{HeaderMap, HeaderValue};
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    const KEY: &str = "test-key-0123456789";
    const SPORTS_URL: &str = "https://api.the-odds-api.com/v4/sports";

    fn live_client(transport: MockTransport, sleeper: MockSleeper) -> OddsApi {
        OddsApi::builder()
            .api_key(KEY)
            .dry_run(false)
            .transport(Arc::new(transport))
            .sleeper(Arc::new(sleeper))
            .build()
            .unwrap()
    }

    fn quota_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_REQUESTS_LAST, HeaderValue::from_static("1"));
        headers.insert(HEADER_REQUESTS_USED, HeaderValue::from_static("10"));
        headers.insert(HEADER_REQUESTS_REMAINING, HeaderValue::from_static("490"));
        headers
    }

    fn ok_response() -> HttpResponse {
        HttpResponse::new(StatusCode::OK)
            .with_headers(quota_headers())
            .with_body(r#"{"foo":"bar"}"#)
    }

    #[test]
    fn test_build_requires_key() {
        for dry_run in [true, false] {
            let err = OddsApi::builder().dry_run(dry_run).build().unwrap_err();
            assert_eq!(err.to_string(), "Configuration error: ODDS_API_KEY not set");

            let err = OddsApi::builder()
                .dry_run(dry_run)
                .api_key("")
                .build()
                .unwrap_err();
            assert!(matches!(err, Error::Configuration(_)));
        }
    }

    #[test]
    fn test_from_env_requires_variable() {
        let config = ApiConfig {
            api_key_env: "ODDSAPI_TEST_SURELY_UNSET_91C2".to_string(),
            ..ApiConfig::default()
        };
        assert!(matches!(
            OddsApi::from_env(config),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_build_rejects_bad_base_url() {
        let config = ApiConfig {
            base_url: "api.the-odds-api.com".to_string(),
            ..ApiConfig::default()
        };
        assert_err!(OddsApi::new(config, KEY));
    }

    #[test]
    fn test_default_client_is_dry_run() {
        let client = assert_ok!(OddsApi::new(ApiConfig::default(), KEY));
        assert!(client.is_dry_run());
        assert_eq!(client.retry_policy(), RetryPolicy::default());
        assert!(!format!("{client:?}").contains(KEY));
    }

    #[test]
    fn test_prepare_injects_key_without_mutating_caller() {
        let client = OddsApi::new(ApiConfig::default(), KEY).unwrap();
        let params = QueryParams::new()
            .with("regions", "us")
            .with(API_KEY_PARAM, "caller-supplied");
        let before = params.clone();

        let request = client.prepare("/sports/americanfootball_nfl/odds", &params);

        assert_eq!(params, before);
        assert_eq!(
            request.url(),
            "https://api.the-odds-api.com/v4/sports/americanfootball_nfl/odds"
        );
        assert_eq!(
            request.params().get(API_KEY_PARAM),
            Some(&ParamValue::from(KEY))
        );
        assert_eq!(request.params().len(), 2);
    }

    #[test]
    fn test_prepared_request_display() {
        let client = OddsApi::new(ApiConfig::default(), KEY).unwrap();
        let request = client.prepare("/sports", &QueryParams::new().with("all", true));
        assert_eq!(
            request.to_string(),
            format!(r#"GET {SPORTS_URL} params={{"all":true,"apiKey":"{KEY}"}}"#)
        );
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("https://x.test/v4", "/sports"), "https://x.test/v4/sports");
        assert_eq!(join_url("https://x.test/v4/", "/sports"), "https://x.test/v4/sports");
        assert_eq!(join_url("https://x.test/v4", "sports"), "https://x.test/v4/sports");
    }

    #[tokio::test]
    async fn test_dry_run_never_sends() {
        let mut transport = MockTransport::new();
        transport.expect_send().never();
        let mut sleeper = MockSleeper::new();
        sleeper.expect_sleep().never();

        let client = OddsApi::builder()
            .api_key(KEY)
            .transport(Arc::new(transport))
            .sleeper(Arc::new(sleeper))
            .build()
            .unwrap();

        let params = QueryParams::new().with("regions", "us").with("markets", "h2h");
        let (body, quota) = client
            .execute("/sports/americanfootball_nfl/odds", &params)
            .await
            .unwrap();
        assert!(body.is_none());
        assert!(quota.is_none());
    }

    #[tokio::test]
    async fn test_success_returns_body_and_quota() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|url, params| {
                url == SPORTS_URL
                    && params.contains(&(API_KEY_PARAM.to_string(), KEY.to_string()))
            })
            .times(1)
            .returning(|_, _| Ok(ok_response()));
        let mut sleeper = MockSleeper::new();
        sleeper.expect_sleep().never();

        let client = live_client(transport, sleeper);
        let (body, quota) = client.execute("/sports", &QueryParams::new()).await.unwrap();

        assert_eq!(body, Some(serde_json::json!({"foo": "bar"})));
        assert_eq!(
            quota,
            Some(QuotaSnapshot {
                last: Some("1".to_string()),
                used: Some("10".to_string()),
                remaining: Some("490".to_string()),
            })
        );
    }

    #[tokio::test]
    async fn test_rate_limit_retries_once_then_succeeds() {
        let mut seq = Sequence::new();
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(HttpResponse::new(StatusCode::TOO_MANY_REQUESTS)));
        transport
            .expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(ok_response()));

        let mut sleeper = MockSleeper::new();
        sleeper
            .expect_sleep()
            .with(eq(Duration::from_secs(5)))
            .times(1)
            .return_const(());

        let client = live_client(transport, sleeper);
        let (body, quota) = client.execute("/sports", &QueryParams::new()).await.unwrap();

        assert_eq!(body, Some(serde_json::json!({"foo": "bar"})));
        assert_eq!(quota.and_then(|q| q.remaining), Some("490".to_string()));
    }

    #[tokio::test]
    async fn test_rate_limit_gives_up_after_max_retries() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(4)
            .returning(|_, _| Ok(HttpResponse::new(StatusCode::TOO_MANY_REQUESTS)));
        let mut sleeper = MockSleeper::new();
        sleeper.expect_sleep().times(3).return_const(());

        let client = live_client(transport, sleeper);
        let err = client
            .execute("/sports", &QueryParams::new())
            .await
            .unwrap_err();

        match err {
            Error::RateLimited { endpoint, attempts } => {
                assert_eq!(endpoint, "/sports");
                assert_eq!(attempts, 4);
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_, _| Ok(HttpResponse::new(StatusCode::INTERNAL_SERVER_ERROR)));
        let mut sleeper = MockSleeper::new();
        sleeper.expect_sleep().never();

        let client = live_client(transport, sleeper);
        let err = client
            .execute("/sports", &QueryParams::new())
            .await
            .unwrap_err();

        match err {
            Error::Request { status, endpoint } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(endpoint, "/sports");
            }
            other => panic!("expected Request, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_response_format_error() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_, _| Ok(HttpResponse::new(StatusCode::OK).with_body("<html>")));

        let client = live_client(transport, MockSleeper::new());
        let err = client
            .execute("/sports", &QueryParams::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ResponseFormat(_)));
    }

    #[tokio::test]
    async fn test_network_error_propagates_without_retry() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_, _| Err(Error::network("connection refused")));

        let client = live_client(transport, MockSleeper::new());
        let err = client
            .execute("/sports", &QueryParams::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn test_odds_builds_endpoint_and_params() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|url, params| {
                url == "https://api.the-odds-api.com/v4/sports/americanfootball_nfl/odds"
                    && params
                        == [
                            ("regions".to_string(), "us".to_string()),
                            ("markets".to_string(), "h2h,spreads".to_string()),
                            (API_KEY_PARAM.to_string(), KEY.to_string()),
                        ]
            })
            .times(1)
            .returning(|_, _| Ok(HttpResponse::new(StatusCode::OK).with_body("[]")));

        let client = live_client(transport, MockSleeper::new());
        let (body, _) = client
            .odds("americanfootball_nfl", "us", "h2h,spreads")
            .await
            .unwrap();
        assert_eq!(body, Some(serde_json::json!([])));
    }

    #[tokio::test]
    async fn test_odds_rejects_blank_sport() {
        let mut transport = MockTransport::new();
        transport.expect_send().never();

        let client = live_client(transport, MockSleeper::new());
        let err = client.odds(" ", "us", "h2h").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_sports_all_flag() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|_, params| params.contains(&("all".to_string(), "true".to_string())))
            .times(1)
            .returning(|_, _| Ok(HttpResponse::new(StatusCode::OK).with_body("[]")));

        let client = live_client(transport, MockSleeper::new());
        assert_ok!(client.sports(true).await);
    }
}
