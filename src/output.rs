//! Output formatting for diagnostic reports

use crate::error::{Error, Result};
use crate::report::{Report, Section};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ContentArrangement, Table, presets::UTF8_FULL,
};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::io::Write;
use std::str::FromStr;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable table output
    #[default]
    Human,
    /// JSON output in the Site Health info shape
    Json,
    /// No output (silent mode)
    None,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "none" => Ok(Self::None),
            _ => Err(Error::InvalidOutputFormat(s.to_string())),
        }
    }
}

/// Which entries make it into the rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputVisibility {
    /// Full report, private entries included (default)
    #[default]
    All,
    /// Copy-for-sharing rendering: private entries excluded
    Shareable,
}

impl FromStr for OutputVisibility {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "shareable" => Ok(Self::Shareable),
            _ => Err(Error::InvalidOutputVisibility(s.to_string())),
        }
    }
}

/// Configuration for output formatting
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Output format
    pub format: OutputFormat,
    /// Entry visibility
    pub visibility: OutputVisibility,
}

impl OutputConfig {
    /// Create a new output config
    pub fn new(format: OutputFormat, visibility: OutputVisibility) -> Self {
        Self { format, visibility }
    }
}

/// Output the report
///
/// Human output renders the flat report as one table; JSON output renders
/// the grouped sections in the Site Health info shape.
pub fn output_report<W: Write>(
    report: &Report,
    sections: &[Section],
    config: &OutputConfig,
    writer: &mut W,
) -> Result<()> {
    match config.format {
        OutputFormat::Human => output_human(report, config, writer),
        OutputFormat::Json => output_json(sections, config, writer),
        OutputFormat::None => Ok(()),
    }
}

/// Sections keyed by identifier, serialized in order
struct InfoMap<'a>(Vec<&'a Section>);

impl Serialize for InfoMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for section in &self.0 {
            map.serialize_entry(&section.key, section)?;
        }
        map.end()
    }
}

/// Output JSON format
fn output_json<W: Write>(
    sections: &[Section],
    config: &OutputConfig,
    writer: &mut W,
) -> Result<()> {
    let shareable: Vec<Section>;
    let visible: Vec<&Section> = match config.visibility {
        OutputVisibility::All => sections.iter().collect(),
        OutputVisibility::Shareable => {
            shareable = sections
                .iter()
                .map(|s| Section {
                    key: s.key.clone(),
                    label: s.label.clone(),
                    description: s.description.clone(),
                    show_count: s.show_count,
                    fields: s.fields.to_shareable(),
                })
                .filter(|s| !s.fields.is_empty())
                .collect();
            shareable.iter().collect()
        }
    };

    serde_json::to_writer_pretty(&mut *writer, &InfoMap(visible))?;
    writeln!(writer).map_err(Error::OutputFailed)?;
    Ok(())
}

/// Output human-readable table format
fn output_human<W: Write>(report: &Report, config: &OutputConfig, writer: &mut W) -> Result<()> {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Field").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
            Cell::new("Private").add_attribute(Attribute::Bold),
        ]);

    for entry in report.iter() {
        if config.visibility == OutputVisibility::Shareable && entry.private {
            continue;
        }

        let private_cell = if entry.private {
            Cell::new("Yes")
                .fg(Color::Yellow)
                .set_alignment(CellAlignment::Center)
        } else {
            Cell::new("No")
                .fg(Color::DarkGrey)
                .set_alignment(CellAlignment::Center)
        };

        table.add_row(vec![
            Cell::new(&entry.label),
            Cell::new(&entry.value),
            private_cell,
        ]);
    }

    writeln!(writer, "{}", table).map_err(Error::OutputFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModuleState;
    use crate::report::{ReportEntry, info_sections};

    fn sample_report() -> Report {
        let mut report = Report::new();
        report.push(ReportEntry::new("site_id", "Site ID", "12345"));
        report.push(ReportEntry::private("blog_token", "Blog token", "blog.secret"));
        report.push(ReportEntry::new("cxn_tests", "Connection Tests", "All Pass."));
        report
    }

    fn render(config: &OutputConfig) -> String {
        let report = sample_report();
        let sections = info_sections(&report, &ModuleState::all_active());
        let mut out = Vec::new();
        output_report(&report, &sections, config, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn human_output_lists_all_entries() {
        let rendered = render(&OutputConfig::default());

        assert!(rendered.contains("Site ID"));
        assert!(rendered.contains("12345"));
        assert!(rendered.contains("blog.secret"));
    }

    #[test]
    fn shareable_human_output_drops_private_entries() {
        let config = OutputConfig::new(OutputFormat::Human, OutputVisibility::Shareable);
        let rendered = render(&config);

        assert!(rendered.contains("Site ID"));
        assert!(!rendered.contains("blog.secret"));
    }

    #[test]
    fn json_output_groups_sections() {
        let config = OutputConfig::new(OutputFormat::Json, OutputVisibility::All);
        let rendered = render(&config);

        assert!(rendered.contains(r#""connection""#));
        assert!(rendered.contains(r#""blog_token""#));
        assert!(rendered.contains("blog.secret"));
    }

    #[test]
    fn shareable_json_output_drops_private_entries() {
        let config = OutputConfig::new(OutputFormat::Json, OutputVisibility::Shareable);
        let rendered = render(&config);

        assert!(rendered.contains(r#""site_id""#));
        assert!(!rendered.contains("blog.secret"));
    }

    #[test]
    fn none_output_writes_nothing() {
        let config = OutputConfig::new(OutputFormat::None, OutputVisibility::All);
        assert!(render(&config).is_empty());
    }

    #[test]
    fn format_and_visibility_parse_from_str() {
        assert_eq!("human".parse::<OutputFormat>().unwrap(), OutputFormat::Human);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("table".parse::<OutputFormat>().is_err());

        assert_eq!(
            "shareable".parse::<OutputVisibility>().unwrap(),
            OutputVisibility::Shareable
        );
        assert!("private".parse::<OutputVisibility>().is_err());
    }
}
