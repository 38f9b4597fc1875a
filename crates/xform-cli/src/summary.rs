use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use xform_build::PrototypeSummary;

use crate::types::BuildResult;

pub fn print_summary(result: &BuildResult) {
    println!("Template: {}", result.template.display());
    match &result.output {
        Some(path) => println!("Output: {}", path.display()),
        None => println!("Output: (dry run, nothing written)"),
    }

    let stats = &result.stats;
    let mut table = Table::new();
    table.set_header(vec![header_cell("Form"), header_cell("Nodes")]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (label, count) in [
        ("Records", stats.records),
        ("Study Parameters and Demographics", stats.spd),
        ("Safety", stats.safety),
        ("Harms", stats.harms),
        ("Performance (discrete)", stats.performance),
        ("Follow-up", stats.follow_up),
    ] {
        table.add_row(vec![Cell::new(label), count_cell(count, Color::Reset)]);
    }
    if stats.synthesized_follow_up > 0 {
        table.add_row(vec![
            dim_cell("  synthesized Follow-up"),
            count_cell(stats.synthesized_follow_up, Color::Yellow),
        ]);
    }
    if stats.skipped_follow_up > 0 {
        table.add_row(vec![
            dim_cell("  skipped Follow-up rows"),
            count_cell(stats.skipped_follow_up, Color::Yellow),
        ]);
    }
    if stats.skipped_spd_rows > 0 {
        table.add_row(vec![
            dim_cell("  skipped SPD rows"),
            count_cell(stats.skipped_spd_rows, Color::Yellow),
        ]);
    }
    println!("{table}");

    match &result.output {
        Some(_) => println!("Wrote {} record(s)", stats.records),
        None => println!("Built {} record(s)", stats.records),
    }
}

pub fn print_prototypes(summaries: &[PrototypeSummary]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Kind"),
        header_cell("Form label"),
        header_cell("Questions"),
        header_cell("Found"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Center);
    for summary in summaries {
        let kind = Cell::new(summary.kind.label())
            .fg(Color::Blue)
            .add_attribute(Attribute::Bold);
        let row = match &summary.form {
            Some(form) => vec![
                kind,
                Cell::new(form),
                Cell::new(summary.questions),
                Cell::new("yes").fg(Color::Green),
            ],
            None => {
                let found = if summary.kind.is_required() {
                    Cell::new("missing").fg(Color::Red)
                } else {
                    dim_cell("no")
                };
                vec![kind, dim_cell("-"), dim_cell("-"), found]
            }
        };
        table.add_row(row);
    }
    println!("{table}");
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

fn apply_table_style(table: &mut Table) {
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
        .set_width(80);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}
