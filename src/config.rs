//! Configuration store access
//!
//! The report collector never reads ambient global state. Everything it
//! needs comes in through [`ConfigStore`] (the install's stored options) and
//! [`RequestContext`] (the request/process environment), so tests can swap
//! in fakes.

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Server variables surfaced in the report when present.
///
/// Matches the proxy/CDN client-IP headers (plus basic host information)
/// that hosting support teams ask for. Absent variables are never reported.
pub const SERVER_VARS: &[&str] = &[
    "HTTP_HOST",
    "SERVER_PORT",
    "HTTPS",
    "GD_PHP_HANDLER",
    "HTTP_AKAMAI_ORIGIN_HOP",
    "HTTP_CF_CONNECTING_IP",
    "HTTP_CLIENT_IP",
    "HTTP_FASTLY_CLIENT_IP",
    "HTTP_FORWARDED",
    "HTTP_FORWARDED_FOR",
    "HTTP_INCAP_CLIENT_IP",
    "HTTP_TRUE_CLIENT_IP",
    "HTTP_X_CLIENTIP",
    "HTTP_X_CLUSTER_CLIENT_IP",
    "HTTP_X_FORWARDED",
    "HTTP_X_FORWARDED_FOR",
    "HTTP_X_IP_TRAIL",
    "HTTP_X_REAL_IP",
    "HTTP_X_VARNISH",
    "REMOTE_ADDR",
];

/// Environment variable naming the acting user id
const CURRENT_USER_VAR: &str = "WP_CURRENT_USER";

/// Read-only key-value view of a site's stored options
pub trait ConfigStore {
    /// Look up an option by name, returning its stored value
    fn get(&self, key: &str) -> Option<Value>;
}

/// Store backed by an exported options JSON file
///
/// Expects a top-level JSON object mapping option names to values, the
/// shape produced by exporting the options table.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    options: serde_json::Map<String, Value>,
}

impl JsonFileStore {
    /// Load an options export from disk
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(Error::ConfigRead)?;
        let value: Value = serde_json::from_str(&raw).map_err(Error::ConfigParse)?;
        let options = match value {
            Value::Object(map) => map,
            _ => return Err(Error::ConfigFormat),
        };

        Ok(Self {
            path: path.to_path_buf(),
            options,
        })
    }

    /// Path the options were loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.options.get(key).cloned()
    }
}

/// In-memory store for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    options: HashMap<String, Value>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option value
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.options.insert(key.into(), value);
    }
}

impl ConfigStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.options.get(key).cloned()
    }
}

/// Snapshot of the request-scoped environment
///
/// Carries the acting user id and the server variable map. In the CLI these
/// come from process environment variables, the same surface a PHP request
/// exposes them on via `$_SERVER`.
#[derive(Debug, Clone)]
pub struct RequestContext {
    user_id: u64,
    vars: HashMap<String, String>,
}

impl RequestContext {
    /// Create a context for the given user with no server variables
    pub fn new(user_id: u64) -> Self {
        Self {
            user_id,
            vars: HashMap::new(),
        }
    }

    /// Capture the context from the process environment
    ///
    /// The acting user id is read from `WP_CURRENT_USER` and defaults to 0
    /// when unset or unparseable.
    pub fn from_env() -> Self {
        let vars: HashMap<String, String> = std::env::vars().collect();
        let user_id = vars
            .get(CURRENT_USER_VAR)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        Self { user_id, vars }
    }

    /// Set a server variable
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Look up a server variable
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Id of the acting user
    pub fn user_id(&self) -> u64 {
        self.user_id
    }
}

/// Which optional modules are active on the install
///
/// Derived from the `active_modules` option. When the option is absent the
/// state is unknown and every module is treated as active.
#[derive(Debug, Clone)]
pub struct ModuleState {
    active: Option<HashSet<String>>,
}

impl ModuleState {
    /// Derive the module state from the store
    pub fn from_store(store: &dyn ConfigStore) -> Self {
        let active = store.get("active_modules").and_then(|value| {
            value.as_array().map(|list| {
                list.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
        });

        Self { active }
    }

    /// State with every module treated as active
    pub fn all_active() -> Self {
        Self { active: None }
    }

    /// Whether a module should be treated as active
    pub fn is_active(&self, module: &str) -> bool {
        match &self.active {
            Some(active) => active.contains(module),
            None => true,
        }
    }
}
