use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::model::{EdgeKind, Severity};

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn create_cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

pub fn severity_cell(severity: Severity) -> Cell {
    match severity {
        Severity::Error => Cell::new("ERROR").fg(TableColor::Red),
        Severity::Warning => Cell::new("WARN").fg(TableColor::Yellow),
    }
}

pub fn edge_kind_cell(kind: EdgeKind) -> Cell {
    match kind {
        EdgeKind::Needs => Cell::new("needs").fg(TableColor::Blue),
        EdgeKind::Dependency => Cell::new("dependency").fg(TableColor::DarkCyan),
    }
}

/// Comma-joined names, or a dimmed dash when there are none.
pub fn names_cell(names: &[String]) -> Cell {
    if names.is_empty() {
        Cell::new("-").fg(TableColor::DarkGrey)
    } else {
        Cell::new(names.join(", "))
    }
}

pub fn job_count_cell(count: usize) -> Cell {
    if count == 0 {
        Cell::new(count).fg(TableColor::Yellow)
    } else {
        Cell::new(count)
    }
}
