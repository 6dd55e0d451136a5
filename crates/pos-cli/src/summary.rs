use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use pos_model::{Severity, ValidationIssue};

use crate::types::IngestResult;

pub fn print_summary(result: &IngestResult) {
    let report = &result.output.report;
    let summary = &report.summary;
    println!("File: {}", result.file.display());
    println!(
        "Report type: {}{}",
        result.report_type,
        if result.detected_type { " (detected)" } else { "" }
    );
    if let Some(path) = &result.output_path {
        println!("Output: {}", path.display());
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Store"),
        header_cell("Business date"),
        header_cell("Source"),
        header_cell("Rows"),
        header_cell("Errors"),
        header_cell("Warnings"),
        header_cell("Fuzzy"),
        header_cell("Payment methods"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 3..=6 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    let stores = if summary.store_names.len() > 1 {
        summary.store_names.join(", ")
    } else {
        summary.store_name.clone().unwrap_or_default()
    };
    let methods: Vec<&str> = summary
        .payment_methods
        .iter()
        .map(|method| method.name.as_str())
        .collect();
    table.add_row(vec![
        text_or_dash(&stores),
        summary
            .detected_date
            .map_or_else(|| dim_cell("-"), Cell::new),
        summary
            .business_date_source
            .map_or_else(|| dim_cell("-"), |source| Cell::new(source.label())),
        Cell::new(report.total_rows).add_attribute(Attribute::Bold),
        count_cell(report.error_count, Color::Red),
        count_cell(summary.warning_count, Color::Yellow),
        count_cell(summary.fuzzy_match_count, Color::Yellow),
        text_or_dash(&methods.join(", ")),
    ]);
    println!("{table}");
    println!(
        "Status: {}",
        if report.is_valid { "valid" } else { "invalid" }
    );
    print_issue_table(&report.issues, result.max_issues);
}

fn print_issue_table(issues: &[ValidationIssue], max_issues: usize) {
    if issues.is_empty() || max_issues == 0 {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Row"),
        header_cell("Severity"),
        header_cell("Kind"),
        header_cell("Column"),
        header_cell("Message"),
        header_cell("Values"),
    ]);
    apply_issue_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 1, CellAlignment::Center);
    for issue in issues.iter().take(max_issues) {
        let row = if issue.is_file_level() {
            dim_cell("file")
        } else {
            Cell::new(issue.row_index)
        };
        table.add_row(vec![
            row,
            severity_cell(issue.severity),
            Cell::new(issue.kind.label()),
            text_or_dash(&issue.column),
            Cell::new(&issue.message),
            snapshot_cell(issue),
        ]);
    }
    println!();
    println!("Issues:");
    println!("{table}");
    if issues.len() > max_issues {
        println!("... {} more (use --max-issues or --output)", issues.len() - max_issues);
    }
}

fn snapshot_cell(issue: &ValidationIssue) -> Cell {
    if issue.raw_snapshot.is_empty() {
        return dim_cell("-");
    }
    let values: Vec<String> = issue
        .raw_snapshot
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    Cell::new(values.join(" ")).fg(Color::DarkGrey)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn text_or_dash(text: &str) -> Cell {
    if text.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(text)
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
}

fn apply_issue_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
    if table.column_count() >= 6 {
        table.set_constraints(vec![
            ColumnConstraint::LowerBoundary(Width::Fixed(5)),
            ColumnConstraint::UpperBoundary(Width::Fixed(9)),
            ColumnConstraint::UpperBoundary(Width::Fixed(9)),
            ColumnConstraint::UpperBoundary(Width::Fixed(22)),
            ColumnConstraint::UpperBoundary(Width::Percentage(40)),
            ColumnConstraint::UpperBoundary(Width::Percentage(35)),
        ]);
    }
}

pub fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn severity_cell(severity: Severity) -> Cell {
    match severity {
        Severity::Error => Cell::new("ERROR")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        Severity::Warning => Cell::new("WARN").fg(Color::Yellow),
    }
}

pub fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

pub fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
