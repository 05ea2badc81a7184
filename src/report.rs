//! Diagnostic report structure
//!
//! A [`Report`] is an ordered collection of labeled entries, each with a
//! privacy flag. Insertion order is display order. Private entries stay in
//! the full report but are dropped from the shareable rendering, which is
//! what gets pasted into support requests.

use crate::config::{ModuleState, SERVER_VARS};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One labeled value in a report
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ReportEntry {
    /// Stable identifier, independent of the label text
    #[serde(skip)]
    pub key: String,
    /// Human-readable description of the field
    pub label: String,
    /// Collected value, string- or JSON-encoded
    pub value: String,
    /// When true the entry is excluded from the shareable rendering
    pub private: bool,
}

impl ReportEntry {
    /// Create a public entry
    pub fn new(key: impl Into<String>, label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            value: value.into(),
            private: false,
        }
    }

    /// Create a private entry (token values, keys)
    pub fn private(
        key: impl Into<String>,
        label: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            private: true,
            ..Self::new(key, label, value)
        }
    }
}

/// Ordered collection of report entries
///
/// Every key is present exactly once; pushing an entry with an existing key
/// replaces the old entry in place, keeping its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    entries: Vec<ReportEntry>,
}

impl Report {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, replacing any existing entry with the same key
    pub fn push(&mut self, entry: ReportEntry) {
        match self.entries.iter_mut().find(|e| e.key == entry.key) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Look up an entry by key
    pub fn get(&self, key: &str) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Iterate entries in display order
    pub fn iter(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter()
    }

    /// Iterate the non-private entries in display order
    pub fn shareable(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|e| !e.private)
    }

    /// Copy of the report with private entries removed
    pub fn to_shareable(&self) -> Self {
        Self {
            entries: self.shareable().cloned().collect(),
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the report has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Report {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.key, entry)?;
        }
        map.end()
    }
}

/// Labeled grouping of report entries in the Site Health Info shape
#[derive(Debug, Clone, serde::Serialize)]
pub struct Section {
    /// Stable section identifier
    #[serde(skip)]
    pub key: String,
    /// Section title
    pub label: String,
    /// Short description of what the section covers
    pub description: String,
    /// Whether the host display should show the field count in the title
    pub show_count: bool,
    /// Entries belonging to this section
    pub fields: Report,
}

/// Descriptor for one info section
///
/// Sections are composed generically from this list instead of per-section
/// conditionals: each descriptor claims a fixed set of report keys and
/// carries a visibility predicate over the install's module state.
struct SectionSpec {
    key: &'static str,
    label: &'static str,
    description: &'static str,
    show_count: bool,
    keys: &'static [&'static str],
    visible: fn(&ModuleState) -> bool,
}

fn always(_: &ModuleState) -> bool {
    true
}

fn protect_active(state: &ModuleState) -> bool {
    state.is_active("protect")
}

fn sync_active(state: &ModuleState) -> bool {
    state.is_active("sync")
}

const INFO_SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        key: "connection",
        label: "Connection",
        description: "Connection credentials and health for this install",
        show_count: false,
        keys: &[
            "site_id",
            "public",
            "master_user",
            "current_user",
            "tokens_set",
            "blog_token",
            "user_token",
            "ssl_cert",
            "time_diff",
            "cxn_tests",
        ],
        visible: always,
    },
    SectionSpec {
        key: "versions",
        label: "Versions",
        description: "Installed and previously installed versions",
        show_count: false,
        keys: &["version_option", "old_version", "version", "options_path", "plan"],
        visible: always,
    },
    SectionSpec {
        key: "environment",
        label: "Server Environment",
        description: "Server variables present on the current request",
        show_count: true,
        keys: SERVER_VARS,
        visible: always,
    },
    SectionSpec {
        key: "protect",
        label: "Protect",
        description: "Brute-force protection configuration",
        show_count: false,
        keys: &["protect_header"],
        visible: protect_active,
    },
    SectionSpec {
        key: "sync",
        label: "Sync",
        description: "Sync queue status and site identity",
        show_count: false,
        keys: &[
            "full_sync",
            "sync_size",
            "sync_lag",
            "full_sync_size",
            "full_sync_lag",
            "idc_urls",
            "idc_error_option",
            "idc_optin",
        ],
        visible: sync_active,
    },
];

/// Group a flat report into Site Health info sections
///
/// Sections whose module is inactive are omitted, as are sections that end
/// up with no fields. The flat report itself is left untouched.
pub fn info_sections(report: &Report, state: &ModuleState) -> Vec<Section> {
    INFO_SECTIONS
        .iter()
        .filter(|spec| (spec.visible)(state))
        .filter_map(|spec| {
            let mut fields = Report::new();
            for entry in report.iter() {
                if spec.keys.contains(&entry.key.as_str()) {
                    fields.push(entry.clone());
                }
            }
            if fields.is_empty() {
                return None;
            }
            Some(Section {
                key: spec.key.to_string(),
                label: spec.label.to_string(),
                description: spec.description.to_string(),
                show_count: spec.show_count,
                fields,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryStore;
    use serde_json::json;

    fn sample_report() -> Report {
        let mut report = Report::new();
        report.push(ReportEntry::new("site_id", "Site ID", "12345"));
        report.push(ReportEntry::private("blog_token", "Blog token", "abc.123"));
        report.push(ReportEntry::new("sync_size", "Sync Queue Size", "3"));
        report
    }

    #[test]
    fn push_preserves_insertion_order() {
        let report = sample_report();
        let keys: Vec<&str> = report.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, ["site_id", "blog_token", "sync_size"]);
    }

    #[test]
    fn push_replaces_existing_key_in_place() {
        let mut report = sample_report();
        report.push(ReportEntry::new("site_id", "Site ID", "99999"));

        assert_eq!(report.len(), 3);
        assert_eq!(report.get("site_id").unwrap().value, "99999");
        // Position unchanged
        assert_eq!(report.iter().next().unwrap().key, "site_id");
    }

    #[test]
    fn shareable_drops_private_entries() {
        let report = sample_report();
        let shared = report.to_shareable();

        assert_eq!(shared.len(), 2);
        assert!(shared.get("blog_token").is_none());
        assert!(shared.get("site_id").is_some());
    }

    #[test]
    fn report_serializes_as_ordered_map() {
        let report = sample_report();
        let json = serde_json::to_string(&report).unwrap();

        let site_id = json.find("site_id").unwrap();
        let blog_token = json.find("blog_token").unwrap();
        let sync_size = json.find("sync_size").unwrap();
        assert!(site_id < blog_token && blog_token < sync_size);
        assert!(json.contains(r#""private":true"#));
    }

    #[test]
    fn sections_follow_module_state() {
        let mut report = sample_report();
        report.push(ReportEntry::new("protect_header", "Trusted IP", "null"));

        let mut store = MemoryStore::new();
        store.insert("active_modules", json!(["sync"]));
        let state = ModuleState::from_store(&store);

        let sections = info_sections(&report, &state);
        let keys: Vec<&str> = sections.iter().map(|s| s.key.as_str()).collect();

        // Protect is inactive so its section is dropped; sync stays.
        assert!(keys.contains(&"connection"));
        assert!(keys.contains(&"sync"));
        assert!(!keys.contains(&"protect"));
    }

    #[test]
    fn empty_sections_are_omitted() {
        let mut report = Report::new();
        report.push(ReportEntry::new("site_id", "Site ID", "1"));

        let sections = info_sections(&report, &ModuleState::all_active());
        let keys: Vec<&str> = sections.iter().map(|s| s.key.as_str()).collect();

        assert_eq!(keys, ["connection"]);
    }
}
