//! WP Site Health - WordPress site diagnostic reporter
//!
//! Collects a site install's configuration, sync queue status, and
//! connection health into one ordered, labeled report.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use wp_site_health::{Collector, ConnectionTester, JsonFileStore, RequestContext};
//!
//! #[tokio::main]
//! async fn main() -> wp_site_health::Result<()> {
//!     let store = JsonFileStore::load(Path::new("options.json"))?;
//!     let request = RequestContext::from_env();
//!     let cxn = ConnectionTester::new(&store)?.offline(true).run().await;
//!     let report = Collector::new(&store, &request, &cxn).collect();
//!     println!("Tokens: {}", report.get("tokens_set").unwrap().value);
//!     Ok(())
//! }
//! ```

pub mod collect;
pub mod config;
pub mod error;
pub mod output;
pub mod queue;
pub mod report;
pub mod selftest;

pub use collect::{Collector, format_duration};
pub use config::{ConfigStore, JsonFileStore, MemoryStore, ModuleState, RequestContext};
pub use error::{Error, Result};
pub use output::{OutputConfig, OutputFormat, OutputVisibility, output_report};
pub use queue::{EmptyQueue, FullSyncStatus, QueueStatus, StoredQueue};
pub use report::{Report, ReportEntry, Section, info_sections};
pub use selftest::{ConnectionTester, TestResults};
