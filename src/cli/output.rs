//! Output formatting for history entries

use console::style;
use miette::{IntoDiagnostic, Result};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli::helpers::{compact_state, format_short_id_str, truncate_str};
use crate::cli::OutputFormat;
use crate::core::{ChangeEntry, ShortIdIndex};

/// Determine the effective output format based on context
pub fn effective_format(format: OutputFormat, is_list: bool) -> OutputFormat {
    match format {
        OutputFormat::Auto => {
            if is_list {
                OutputFormat::Table
            } else {
                OutputFormat::Yaml
            }
        }
        other => other,
    }
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "SHORT")]
    short: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "WHEN")]
    when: String,
    #[tabled(rename = "ENTITY")]
    entity: String,
    #[tabled(rename = "ACTION")]
    action: String,
    #[tabled(rename = "USER")]
    user: String,
    #[tabled(rename = "BEFORE")]
    before: String,
    #[tabled(rename = "AFTER")]
    after: String,
}

fn short_of(short_ids: &ShortIdIndex, entry: &ChangeEntry) -> String {
    short_ids.get_short_id(entry.id()).unwrap_or_default()
}

/// Render a list of entries
pub fn render_entries(
    entries: &[ChangeEntry],
    short_ids: &ShortIdIndex,
    format: OutputFormat,
) -> Result<String> {
    match effective_format(format, true) {
        OutputFormat::Json => serde_json::to_string_pretty(entries).into_diagnostic(),
        OutputFormat::Yaml => serde_yml::to_string(&entries).into_diagnostic(),
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            writer
                .write_record([
                    "short_id", "id", "timestamp", "entity_type", "entity_id", "action",
                    "user_id", "user_name",
                ])
                .into_diagnostic()?;
            for entry in entries {
                writer
                    .write_record([
                        short_of(short_ids, entry),
                        entry.id().to_string(),
                        entry.timestamp().to_rfc3339(),
                        entry.entity_type().to_string(),
                        entry.entity_id().to_string(),
                        entry.action().to_string(),
                        entry.user_id().to_string(),
                        entry.user_name().to_string(),
                    ])
                    .into_diagnostic()?;
            }
            let bytes = writer
                .into_inner()
                .map_err(|e| miette::miette!("Cannot write CSV: {}", e.error()))?;
            String::from_utf8(bytes).into_diagnostic()
        }
        OutputFormat::Md => {
            let mut out = String::from("| Short | ID | When | Entity | Action | User |\n");
            out.push_str("|---|---|---|---|---|---|\n");
            for entry in entries {
                out.push_str(&format!(
                    "| {} | {} | {} | {} | {} | {} |\n",
                    short_of(short_ids, entry),
                    format_short_id_str(&entry.id().to_string()),
                    entry.timestamp().format("%Y-%m-%d %H:%M:%S"),
                    entry.entity(),
                    entry.action(),
                    entry.user_name()
                ));
            }
            Ok(out)
        }
        OutputFormat::Id => Ok(entries
            .iter()
            .map(|e| format!("{}\n", e.id()))
            .collect()),
        OutputFormat::Table | OutputFormat::Auto => {
            let rows: Vec<EntryRow> = entries
                .iter()
                .map(|entry| EntryRow {
                    short: short_of(short_ids, entry),
                    id: format_short_id_str(&entry.id().to_string()),
                    when: entry.timestamp().format("%Y-%m-%d %H:%M:%S").to_string(),
                    entity: truncate_str(&entry.entity().to_string(), 24),
                    action: truncate_str(entry.action(), 32),
                    user: truncate_str(entry.user_name(), 16),
                    before: truncate_str(&compact_state(entry.previous_state()), 24),
                    after: truncate_str(&compact_state(entry.current_state()), 24),
                })
                .collect();
            let mut table = Table::new(rows);
            table.with(Style::sharp());
            Ok(format!("{}\n", table))
        }
    }
}

/// Render a single entry
pub fn render_entry(entry: &ChangeEntry, short_id: Option<&str>, format: OutputFormat) -> Result<String> {
    match effective_format(format, false) {
        OutputFormat::Json => serde_json::to_string_pretty(entry).into_diagnostic(),
        OutputFormat::Id => Ok(format!("{}\n", entry.id())),
        OutputFormat::Table | OutputFormat::Md | OutputFormat::Csv => {
            let mut out = String::new();
            let header = match short_id {
                Some(short) => format!("{} {}", style(short).cyan(), style(entry.id()).bold()),
                None => style(entry.id()).bold().to_string(),
            };
            out.push_str(&format!("{}\n", header));
            out.push_str(&format!("  {:<10} {}\n", style("Action:").bold(), entry.action()));
            if entry.is_rollback() {
                out.push_str(&format!("  {:<10} rollback audit\n", style("Kind:").bold()));
            }
            out.push_str(&format!("  {:<10} {}\n", style("Entity:").bold(), entry.entity()));
            out.push_str(&format!(
                "  {:<10} {} ({})\n",
                style("User:").bold(),
                entry.user_name(),
                entry.user_id()
            ));
            out.push_str(&format!(
                "  {:<10} {}\n",
                style("When:").bold(),
                entry.timestamp().to_rfc3339()
            ));
            out.push_str(&format!(
                "  {:<10} {}\n",
                style("Before:").bold(),
                compact_state(entry.previous_state())
            ));
            out.push_str(&format!(
                "  {:<10} {}\n",
                style("After:").bold(),
                compact_state(entry.current_state())
            ));
            Ok(out)
        }
        OutputFormat::Yaml | OutputFormat::Auto => serde_yml::to_string(entry).into_diagnostic(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Actor, EntityRef, HistoryFilter, HistoryStore, MemorySlot};
    use serde_json::json;

    fn entries() -> Vec<ChangeEntry> {
        let mut store = HistoryStore::new(Box::new(MemorySlot::default()), 10);
        let actor = Actor::new("hub-1", "Hub, Manager");
        store
            .record_change("Update price", &EntityRef::new("product", "p1"), &json!(1), &json!(2), &actor)
            .unwrap();
        store
            .record_change("Relabel", &EntityRef::new("label", "lb1"), &json!("A"), &json!("B"), &actor)
            .unwrap();
        store.query_history(&HistoryFilter::All)
    }

    #[test]
    fn test_effective_format() {
        assert_eq!(effective_format(OutputFormat::Auto, true), OutputFormat::Table);
        assert_eq!(effective_format(OutputFormat::Auto, false), OutputFormat::Yaml);
        assert_eq!(effective_format(OutputFormat::Json, true), OutputFormat::Json);
    }

    #[test]
    fn test_render_ids() {
        let entries = entries();
        let out = render_entries(&entries, &ShortIdIndex::new(), OutputFormat::Id).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], entries[0].id().to_string());
    }

    #[test]
    fn test_render_json_is_parseable() {
        let entries = entries();
        let out = render_entries(&entries, &ShortIdIndex::new(), OutputFormat::Json).unwrap();
        let back: Vec<ChangeEntry> = serde_json::from_str(&out).unwrap();
        assert_eq!(back, entries);
    }

    #[test]
    fn test_render_csv_quotes_fields() {
        let entries = entries();
        let mut short_ids = ShortIdIndex::new();
        short_ids.rebuild(entries.iter().map(|e| e.id()));
        let out = render_entries(&entries, &short_ids, OutputFormat::Csv).unwrap();
        let mut lines = out.lines();
        assert!(lines.next().unwrap().starts_with("short_id,id,timestamp"));
        let first = lines.next().unwrap();
        assert!(first.starts_with("@1,"));
        assert!(first.contains("\"Hub, Manager\""));
    }

    #[test]
    fn test_render_table_has_headers() {
        let entries = entries();
        let out = render_entries(&entries, &ShortIdIndex::new(), OutputFormat::Table).unwrap();
        assert!(out.contains("ACTION"));
        assert!(out.contains("Relabel"));
        assert!(out.contains("product/p1"));
    }

    #[test]
    fn test_render_single_entry_marks_rollback() {
        let mut store = HistoryStore::new(Box::new(MemorySlot::default()), 10);
        let actor = Actor::new("hub-1", "Hub Manager");
        let id = store
            .record_change("Update price", &EntityRef::new("product", "p1"), &json!(1), &json!(2), &actor)
            .unwrap();
        let record = store.consume_for_rollback(&id).unwrap();
        let audit = store.get(&record.audit_id).unwrap();

        let out = render_entry(audit, None, OutputFormat::Table).unwrap();
        assert!(out.contains("rollback audit"));
        let out = render_entry(&record.original, None, OutputFormat::Table).unwrap();
        assert!(!out.contains("rollback audit"));
    }

    #[test]
    fn test_render_single_entry_yaml() {
        let entries = entries();
        let out = render_entry(&entries[0], Some("@1"), OutputFormat::Auto).unwrap();
        assert!(out.contains("action: Relabel"));
        assert!(out.contains("entityType: label"));
    }
}
