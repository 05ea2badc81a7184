//! Connection self-tests
//!
//! Runs the named connectivity and configuration checks whose outcome feeds
//! the report's `cxn_tests` entry. Local checks read the options store;
//! HTTP checks probe the site's XML-RPC endpoint and outbound connectivity,
//! and can be skipped for offline runs.

use crate::config::ConfigStore;
use crate::error::{Error, Result};
use regex::Regex;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// User agent for requests
const USER_AGENT: &str = concat!("wp-site-health/", env!("CARGO_PKG_VERSION"));

/// Request timeout in seconds
const TIMEOUT_SECS: u64 = 30;

/// XML-RPC endpoint path on the site
const XMLRPC_PATH: &str = "/xmlrpc.php";

/// Marker a live XML-RPC endpoint returns on GET
const XMLRPC_MARKER: &str = "XML-RPC server accepts POST requests only";

/// Default endpoint probed by the outbound connectivity check
const OUTBOUND_TEST_URL: &str = "https://jetpack.com/";

/// Maximum tolerated offset against the connection server's clock, in seconds
const MAX_CLOCK_SKEW_SECS: i64 = 300;

/// Outcome of one named check
#[derive(Debug, Clone)]
struct TestOutcome {
    name: String,
    passed: bool,
}

/// Results of a self-test run
///
/// This is the surface the report collector consumes: an overall pass flag
/// and the identifiers of failing checks. An empty run passes vacuously.
#[derive(Debug, Clone, Default)]
pub struct TestResults {
    outcomes: Vec<TestOutcome>,
}

impl TestResults {
    /// Create an empty result set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a named check
    pub fn record(&mut self, name: impl Into<String>, passed: bool) {
        self.outcomes.push(TestOutcome {
            name: name.into(),
            passed,
        });
    }

    /// Whether every recorded check passed
    pub fn pass(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    /// Identifiers of the failing checks, in run order
    pub fn list_fails(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| !o.passed)
            .map(|o| o.name.clone())
            .collect()
    }
}

/// Runs the connection self-tests against a store and its site
pub struct ConnectionTester<'a> {
    store: &'a dyn ConfigStore,
    client: Client,
    site_url: Option<Url>,
    outbound_url: Url,
    offline: bool,
}

impl<'a> ConnectionTester<'a> {
    /// Create a tester for the given store
    ///
    /// The site URL defaults to the store's `siteurl` option when it parses.
    pub fn new(store: &'a dyn ConfigStore) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .danger_accept_invalid_certs(false)
            .build()
            .map_err(|e| Error::HttpClient(e.to_string()))?;

        let site_url = store
            .get("siteurl")
            .and_then(|v| v.as_str().and_then(|s| Url::parse(s).ok()));

        let outbound_url =
            Url::parse(OUTBOUND_TEST_URL).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        Ok(Self {
            store,
            client,
            site_url,
            outbound_url,
            offline: false,
        })
    }

    /// Override the site URL probed by the XML-RPC check
    pub fn site_url(mut self, url: &str) -> Result<Self> {
        self.site_url = Some(Url::parse(url).map_err(|e| Error::InvalidUrl(e.to_string()))?);
        Ok(self)
    }

    /// Override the endpoint probed by the outbound connectivity check
    pub fn outbound_url(mut self, url: &str) -> Result<Self> {
        self.outbound_url = Url::parse(url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(self)
    }

    /// Skip the HTTP checks and run only the local ones
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Run all checks and collect the results
    ///
    /// A failing check is recorded, never raised; the run always completes.
    pub async fn run(&self) -> TestResults {
        let mut results = TestResults::new();

        results.record("blog_token", self.check_blog_token());
        results.record("master_user", self.check_master_user());
        results.record("clock_skew", self.check_clock_skew());
        results.record("identity_crisis", self.check_identity_crisis());

        if !self.offline {
            results.record("xmlrpc", self.check_xmlrpc().await);
            results.record("outbound_https", self.check_outbound().await);
        }

        results
    }

    /// A blog token is present
    fn check_blog_token(&self) -> bool {
        self.store
            .get("blog_token")
            .and_then(|v| v.as_str().map(|s| !s.is_empty()))
            .unwrap_or(false)
    }

    /// A master user is set and holds a user token
    fn check_master_user(&self) -> bool {
        let Some(master_user) = self.store.get("master_user").and_then(|v| as_user_id(&v)) else {
            return false;
        };

        self.store
            .get("user_tokens")
            .and_then(|v| {
                v.as_object()
                    .map(|tokens| tokens.contains_key(&master_user.to_string()))
            })
            .unwrap_or(false)
    }

    /// The recorded clock offset is within tolerance
    fn check_clock_skew(&self) -> bool {
        let offset = self
            .store
            .get("time_diff")
            .and_then(|v| v.as_i64())
            .unwrap_or(0);
        offset.abs() <= MAX_CLOCK_SKEW_SECS
    }

    /// No sync identity-crisis error has been recorded
    fn check_identity_crisis(&self) -> bool {
        match self.store.get("sync_error_idc") {
            None => true,
            Some(serde_json::Value::Null) => true,
            Some(serde_json::Value::Bool(recorded)) => !recorded,
            Some(_) => false,
        }
    }

    /// The site's XML-RPC endpoint answers with its marker string
    async fn check_xmlrpc(&self) -> bool {
        let Some(base) = &self.site_url else {
            return false;
        };
        let Ok(url) = base.join(XMLRPC_PATH) else {
            return false;
        };

        // A live endpoint answers GET with 405 and the marker body, so the
        // status is ignored and only the body is inspected.
        let body = match self.client.get(url.as_str()).send().await {
            Ok(response) => match response.text().await {
                Ok(body) => body,
                Err(_) => return false,
            },
            Err(_) => return false,
        };

        match Regex::new(XMLRPC_MARKER) {
            Ok(re) => re.is_match(&body),
            Err(_) => false,
        }
    }

    /// Outbound HTTPS requests reach the test endpoint
    async fn check_outbound(&self) -> bool {
        match self.client.get(self.outbound_url.as_str()).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

/// Read a user id that may be stored as a number or numeric string
fn as_user_id(value: &serde_json::Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryStore;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn connected_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.insert("blog_token", json!("blog.secret"));
        store.insert("master_user", json!(7));
        store.insert("user_tokens", json!({ "7": "user.secret.7" }));
        store.insert("time_diff", json!(-2));
        store
    }

    #[test]
    fn empty_results_pass() {
        let results = TestResults::new();
        assert!(results.pass());
        assert!(results.list_fails().is_empty());
    }

    #[test]
    fn fails_are_listed_in_run_order() {
        let mut results = TestResults::new();
        results.record("blog_token", false);
        results.record("master_user", true);
        results.record("xmlrpc", false);

        assert!(!results.pass());
        assert_eq!(results.list_fails(), ["blog_token", "xmlrpc"]);
    }

    #[test]
    fn local_checks_pass_for_connected_store() {
        let store = connected_store();
        let tester = ConnectionTester::new(&store).unwrap().offline(true);

        let results = tokio_test::block_on(tester.run());
        assert!(results.pass(), "unexpected fails: {:?}", results.list_fails());
    }

    #[test]
    fn missing_tokens_fail_local_checks() {
        let store = MemoryStore::new();
        let tester = ConnectionTester::new(&store).unwrap().offline(true);

        let results = tokio_test::block_on(tester.run());
        let fails = results.list_fails();
        assert!(fails.contains(&"blog_token".to_string()));
        assert!(fails.contains(&"master_user".to_string()));
    }

    #[test]
    fn excessive_clock_skew_fails() {
        let mut store = connected_store();
        store.insert("time_diff", json!(4000));
        let tester = ConnectionTester::new(&store).unwrap().offline(true);

        let results = tokio_test::block_on(tester.run());
        assert_eq!(results.list_fails(), ["clock_skew"]);
    }

    #[test]
    fn recorded_idc_error_fails() {
        let mut store = connected_store();
        store.insert("sync_error_idc", json!({ "home": "https://elsewhere.example" }));
        let tester = ConnectionTester::new(&store).unwrap().offline(true);

        let results = tokio_test::block_on(tester.run());
        assert_eq!(results.list_fails(), ["identity_crisis"]);
    }

    #[tokio::test]
    async fn xmlrpc_marker_detected_via_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/xmlrpc.php"))
            .respond_with(
                ResponseTemplate::new(405)
                    .set_body_string("XML-RPC server accepts POST requests only."),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let store = connected_store();
        let tester = ConnectionTester::new(&store)
            .unwrap()
            .site_url(&server.uri())
            .unwrap()
            .outbound_url(&server.uri())
            .unwrap();

        let results = tester.run().await;
        assert!(results.pass(), "unexpected fails: {:?}", results.list_fails());
    }

    #[tokio::test]
    async fn broken_xmlrpc_endpoint_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/xmlrpc.php"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let store = connected_store();
        let tester = ConnectionTester::new(&store)
            .unwrap()
            .site_url(&server.uri())
            .unwrap()
            .outbound_url(&server.uri())
            .unwrap();

        let results = tester.run().await;
        assert_eq!(results.list_fails(), ["xmlrpc"]);
    }
}
