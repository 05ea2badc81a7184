//! Diagnostic report collection
//!
//! [`Collector`] reads the options store, the request environment, the two
//! sync queue accessors, and the self-test results, and assembles them into
//! one ordered [`Report`]. Collection never fails: a missing option renders
//! as a sentinel string and an unreachable collaborator degrades its own
//! entries only.

use crate::config::{ConfigStore, RequestContext, SERVER_VARS};
use crate::queue::{EmptyQueue, FullSyncStatus, QueueStatus};
use crate::report::{Report, ReportEntry};
use crate::selftest::TestResults;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// Sentinel rendered for options that are not set
const NOT_SET: &str = "Not set.";

/// Duration units from largest to smallest, with their length in seconds
const DURATION_UNITS: &[(&str, u64)] = &[
    ("week", 604_800),
    ("day", 86_400),
    ("hour", 3_600),
    ("minute", 60),
    ("second", 1),
];

/// Convert seconds to a human readable compound duration
///
/// Largest unit first, zero-valued units omitted, singular/plural unit
/// names. Zero renders as the literal `0 seconds`.
///
/// # Example
///
/// ```
/// use wp_site_health::collect::format_duration;
///
/// assert_eq!(format_duration(3661), "1 hour, 1 minute, 1 second");
/// assert_eq!(format_duration(0), "0 seconds");
/// ```
pub fn format_duration(seconds: u64) -> String {
    if seconds == 0 {
        return "0 seconds".to_string();
    }

    let mut remaining = seconds;
    let mut parts = Vec::new();
    for (name, unit_seconds) in DURATION_UNITS {
        let quantity = remaining / unit_seconds;
        if quantity > 0 {
            let plural = if quantity > 1 { "s" } else { "" };
            parts.push(format!("{} {}{}", quantity, name, plural));
            remaining -= quantity * unit_seconds;
        }
    }

    parts.join(", ")
}

/// Render a stored value for display: strings as-is, everything else as JSON
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// JSON-encode an optional stored value; absent encodes as `null`
fn json_encoded(value: Option<Value>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => Value::Null.to_string(),
    }
}

/// PHP-style truthiness for stored option values
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty() && s != "0",
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

/// Site identity URLs reported for identity-crisis debugging
#[derive(Serialize)]
struct IdcUrls {
    home: String,
    siteurl: String,
    #[serde(rename = "WP_HOME")]
    wp_home: String,
    #[serde(rename = "WP_SITEURL")]
    wp_siteurl: String,
}

/// Assembles the diagnostic report from its collaborators
///
/// Collaborators are borrowed, read-only, and explicit; nothing is read
/// from ambient global state. Queues default to [`EmptyQueue`] so a report
/// can be collected even when the sync state is unreachable.
pub struct Collector<'a> {
    store: &'a dyn ConfigStore,
    request: &'a RequestContext,
    cxn_tests: &'a TestResults,
    sync_queue: &'a dyn QueueStatus,
    full_sync_queue: &'a dyn QueueStatus,
    full_sync: Option<&'a FullSyncStatus>,
    options_path: Option<&'a Path>,
}

impl<'a> Collector<'a> {
    /// Create a collector over the given store, request, and test results
    pub fn new(
        store: &'a dyn ConfigStore,
        request: &'a RequestContext,
        cxn_tests: &'a TestResults,
    ) -> Self {
        Self {
            store,
            request,
            cxn_tests,
            sync_queue: &EmptyQueue,
            full_sync_queue: &EmptyQueue,
            full_sync: None,
            options_path: None,
        }
    }

    /// Attach the incremental sync queue accessor
    pub fn sync_queue(mut self, queue: &'a dyn QueueStatus) -> Self {
        self.sync_queue = queue;
        self
    }

    /// Attach the full-sync queue accessor
    pub fn full_sync_queue(mut self, queue: &'a dyn QueueStatus) -> Self {
        self.full_sync_queue = queue;
        self
    }

    /// Attach the full-sync module's status snapshot
    pub fn full_sync(mut self, status: &'a FullSyncStatus) -> Self {
        self.full_sync = Some(status);
        self
    }

    /// Record where the options store was loaded from
    pub fn options_path(mut self, path: &'a Path) -> Self {
        self.options_path = Some(path);
        self
    }

    /// Compile the diagnostic report
    ///
    /// Builds a fresh report on every call from live reads of the
    /// collaborators. Emission order is fixed and is the display order.
    pub fn collect(&self) -> Report {
        let mut report = Report::new();

        self.collect_options(&mut report);
        self.collect_tokens(&mut report);
        self.collect_environment(&mut report);
        self.collect_sync(&mut report);
        self.collect_identity(&mut report);
        self.collect_cxn_tests(&mut report);

        report
    }

    /// Important stored options
    fn collect_options(&self, report: &mut Report) {
        report.push(self.option_entry("site_id", "Site ID", "id"));
        report.push(ReportEntry::new(
            "ssl_cert",
            "SSL Verification Bypass",
            if self.option_truthy("fallback_no_verify_ssl_certs") {
                "Yes"
            } else {
                "No"
            },
        ));
        report.push(self.option_entry(
            "time_diff",
            "Offset between the connection server's time and this server's time.",
            "time_diff",
        ));
        report.push(self.option_entry("version_option", "Current Version Option", "version"));
        report.push(self.option_entry("old_version", "Previous Version", "old_version"));
        report.push(ReportEntry::new(
            "public",
            "Site Public",
            if self.option_truthy("public") {
                "Public"
            } else {
                "Private"
            },
        ));
        report.push(self.option_entry("master_user", "Master User", "master_user"));
    }

    /// Token presence is public; token values themselves are private
    fn collect_tokens(&self, report: &mut Report) {
        let blog_token = self.string_option("blog_token");
        let user_token = self.user_token();

        let tokens_set = match (&blog_token, &user_token) {
            (Some(_), Some(_)) => "Blog User",
            (Some(_), None) => "Blog",
            (None, Some(_)) => "User",
            (None, None) => "None",
        };

        report.push(ReportEntry::new(
            "current_user",
            "Current User",
            self.request.user_id().to_string(),
        ));
        report.push(ReportEntry::new("tokens_set", "Tokens defined", tokens_set));
        report.push(ReportEntry::private(
            "blog_token",
            "Blog token",
            blog_token.unwrap_or_else(|| NOT_SET.to_string()),
        ));
        report.push(ReportEntry::private(
            "user_token",
            "User token",
            user_token.unwrap_or_else(|| NOT_SET.to_string()),
        ));
    }

    /// Tool environment and server variables
    fn collect_environment(&self, report: &mut Report) {
        report.push(ReportEntry::new(
            "version",
            "Site Health Tool Version",
            env!("CARGO_PKG_VERSION"),
        ));
        report.push(ReportEntry::new(
            "options_path",
            "Options File",
            self.options_path
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| NOT_SET.to_string()),
        ));
        report.push(ReportEntry::new("plan", "Plan Type", self.plan()));

        // Only variables actually present on the request are reported.
        for name in SERVER_VARS {
            if let Some(value) = self.request.var(name) {
                report.push(ReportEntry::new(
                    *name,
                    format!("Server Variable {}", name),
                    if value.is_empty() { "false" } else { value },
                ));
            }
        }

        report.push(ReportEntry::new(
            "protect_header",
            "Trusted IP",
            json_encoded(self.store.get("trusted_ip_header")),
        ));
    }

    /// Sync queue status and full-sync progress
    fn collect_sync(&self, report: &mut Report) {
        if let Some(full_sync) = self.full_sync {
            report.push(ReportEntry::new(
                "full_sync",
                "Full Sync Status",
                json_encoded(Some(Value::Object(full_sync.humanize()))),
            ));
        }

        report.push(ReportEntry::new(
            "sync_size",
            "Sync Queue Size",
            self.sync_queue.size().to_string(),
        ));
        report.push(ReportEntry::new(
            "sync_lag",
            "Sync Queue Lag",
            format_duration(self.sync_queue.lag()),
        ));
        report.push(ReportEntry::new(
            "full_sync_size",
            "Full Sync Queue Size",
            self.full_sync_queue.size().to_string(),
        ));
        report.push(ReportEntry::new(
            "full_sync_lag",
            "Full Sync Queue Lag",
            format_duration(self.full_sync_queue.lag()),
        ));
    }

    /// Site identity URLs and identity-crisis state
    fn collect_identity(&self, report: &mut Report) {
        let urls = IdcUrls {
            home: self.string_option("home").unwrap_or_default(),
            siteurl: self.string_option("siteurl").unwrap_or_default(),
            wp_home: self.request.var("WP_HOME").unwrap_or_default().to_string(),
            wp_siteurl: self.request.var("WP_SITEURL").unwrap_or_default().to_string(),
        };

        report.push(ReportEntry::new(
            "idc_urls",
            "IDC URLs",
            serde_json::to_string(&urls).unwrap_or_else(|_| Value::Null.to_string()),
        ));
        report.push(ReportEntry::new(
            "idc_error_option",
            "IDC Error Option",
            json_encoded(self.store.get("sync_error_idc")),
        ));
        report.push(self.option_entry("idc_optin", "IDC Opt-in", "idc_optin"));
    }

    /// Connection self-test summary
    fn collect_cxn_tests(&self, report: &mut Report) {
        let value = if self.cxn_tests.pass() {
            "All Pass.".to_string()
        } else {
            serde_json::to_string(&self.cxn_tests.list_fails())
                .unwrap_or_else(|_| Value::Null.to_string())
        };

        report.push(ReportEntry::new("cxn_tests", "Connection Tests", value));
    }

    /// Public entry for a stored option, with the missing-value sentinel
    fn option_entry(&self, key: &str, label: &str, option: &str) -> ReportEntry {
        let value = self
            .store
            .get(option)
            .map(|v| display_value(&v))
            .unwrap_or_else(|| NOT_SET.to_string());
        ReportEntry::new(key, label, value)
    }

    fn option_truthy(&self, option: &str) -> bool {
        is_truthy(self.store.get(option).as_ref())
    }

    fn string_option(&self, option: &str) -> Option<String> {
        self.store
            .get(option)
            .and_then(|v| v.as_str().filter(|s| !s.is_empty()).map(str::to_string))
    }

    /// The current user's token from the stored token map
    fn user_token(&self) -> Option<String> {
        let tokens = self.store.get("user_tokens")?;
        tokens
            .as_object()?
            .get(&self.request.user_id().to_string())
            .and_then(|v| v.as_str().filter(|s| !s.is_empty()).map(str::to_string))
    }

    /// Normalized plan slug from the stored plan object
    fn plan(&self) -> String {
        self.store
            .get("plan")
            .and_then(|v| {
                v.as_object().and_then(|plan| {
                    plan.get("class")
                        .and_then(|c| c.as_str().filter(|s| !s.is_empty()).map(str::to_string))
                })
            })
            .unwrap_or_else(|| "undefined".to_string())
    }
}
