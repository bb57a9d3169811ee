//! Terminal rendering of a list page.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use serde_json::Value;

use ffr_model::{FetchStatus, FieldAccess, Identified};
use ffr_store::ListModel;

use crate::source::{Filter, Record};

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

/// Table of `records` with one column per name. The selected row is highlighted.
pub fn records_table(records: &[Record], columns: &[String], selected: Option<&Value>) -> Table {
    let mut table = Table::new();
    table.set_header(columns.iter().map(|name| header_cell(name)));
    apply_table_style(&mut table);
    for record in records {
        let is_selected = selected.is_some_and(|id| record.id() == id);
        table.add_row(columns.iter().map(|name| {
            let text = record.field_text(name).unwrap_or_default();
            if is_selected {
                Cell::new(text).fg(Color::Green).add_attribute(Attribute::Bold)
            } else if text.is_empty() {
                dim_cell("-")
            } else {
                Cell::new(text)
            }
        }));
    }
    table
}

/// One-line status for the list: page position, totals and fetch state.
pub fn page_summary(model: &ListModel<Record, Filter>, fetches: u64) -> String {
    let count = model.visible_count();
    let paging = model.query.paging;
    let mut summary = format!(
        "page {} of {}, {} record{}, {} fetch{}",
        paging.page_index(),
        paging.page_count(count),
        count,
        if count == 1 { "" } else { "s" },
        fetches,
        if fetches == 1 { "" } else { "es" },
    );
    if model.list.status != FetchStatus::Ready {
        summary.push_str(&format!(", {}", model.list.status.display_name()));
    }
    if let Some(fingerprint) = model.list.fingerprint {
        summary.push_str(&format!(" [{fingerprint}]"));
    }
    summary
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
