use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use minrand_cli::commands::{AssignResult, ProjectListing};
use minrand_core::{BalanceReport, Reassignment};
use minrand_model::Project;
use minrand_store::ProjectKey;

/// Imbalance at or above this is highlighted in the report.
const IMBALANCE_WARNING: f64 = 2.0;

pub fn print_created(key: &ProjectKey, project: &Project) {
    println!("Created project '{}' as {key}", project.name);
    println!("Groups: {}", project.group_names.join(", "));
    let variables: Vec<String> = project
        .variables
        .iter()
        .map(|v| format!("{} ({})", v.name, v.levels.join("/")))
        .collect();
    if variables.is_empty() {
        println!("Variables: none");
    } else {
        println!("Variables: {}", variables.join(", "));
    }
    println!("Bias: {}", project.bias);
}

pub fn print_assignment(result: &AssignResult) {
    println!(
        "Subject {} assigned to {}",
        result.subject_id, result.assignment.group_name
    );
    let mut table = Table::new();
    table.set_header(vec![header_cell("Group"), header_cell("Score")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (index, score) in result.assignment.scores.iter().enumerate() {
        let mut name = result.group_names[index].clone();
        if result.assignment.ties.len() > 1 && result.assignment.ties.contains(&index) {
            name.push_str(" (tied)");
        }
        let mut cell = Cell::new(name);
        if index == result.assignment.group_index {
            cell = cell.fg(Color::Green).add_attribute(Attribute::Bold);
        }
        table.add_row(vec![cell, Cell::new(format!("{score:.4}"))]);
    }
    println!("{table}");
    if result.attempts > 1 {
        println!("Committed after {} attempts", result.attempts);
    }
}

pub fn print_reassignment(moved: &Reassignment) {
    println!(
        "Subject {} moved from {} to {}",
        moved.subject_id, moved.from, moved.to
    );
}

pub fn print_report(report: &BalanceReport) {
    let status = if report.open { "open" } else { "closed" };
    println!("Project: {} ({status})", report.project);
    println!("Subjects: {}", report.num_assignments);

    let mut groups = Table::new();
    groups.set_header(vec![
        header_cell("Group"),
        header_cell("Rate"),
        header_cell("Subjects"),
    ]);
    apply_table_style(&mut groups);
    align_column(&mut groups, 1, CellAlignment::Right);
    align_column(&mut groups, 2, CellAlignment::Right);
    for group in &report.groups {
        groups.add_row(vec![
            Cell::new(&group.name),
            Cell::new(group.sampling_rate),
            Cell::new(group.assignments),
        ]);
    }
    println!("{groups}");

    if report.levels.is_empty() {
        return;
    }
    let mut levels = Table::new();
    let mut header = vec![header_cell("Variable"), header_cell("Level")];
    header.extend(report.groups.iter().map(|g| header_cell(&g.name)));
    header.push(header_cell("Imbalance"));
    levels.set_header(header);
    apply_report_table_style(&mut levels);
    for column in 2..report.groups.len() + 3 {
        align_column(&mut levels, column, CellAlignment::Right);
    }
    let mut previous: Option<&str> = None;
    for row in &report.levels {
        let variable = if previous == Some(row.variable.as_str()) {
            dim_cell("")
        } else {
            Cell::new(format!("{} ({})", row.variable, row.scoring_function))
                .add_attribute(Attribute::Bold)
        };
        previous = Some(row.variable.as_str());
        let mut cells = vec![variable, Cell::new(&row.level)];
        cells.extend(row.counts.iter().map(Cell::new));
        cells.push(imbalance_cell(row.imbalance));
        levels.add_row(cells);
    }
    println!("{levels}");
}

pub fn print_list(listings: &[ProjectListing]) {
    if listings.is_empty() {
        println!("No projects");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Key"),
        header_cell("Name"),
        header_cell("Groups"),
        header_cell("Subjects"),
        header_cell("Enrollment"),
        header_cell("Last change"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);
    for listing in listings {
        let enrollment = if listing.open {
            Cell::new("open").fg(Color::Green)
        } else {
            Cell::new("closed").fg(Color::Yellow)
        };
        let changed = listing.modified.unwrap_or(listing.created);
        table.add_row(vec![
            Cell::new(&listing.key),
            Cell::new(&listing.name),
            Cell::new(listing.groups.join(", ")),
            Cell::new(listing.num_assignments),
            enrollment,
            dim_cell(changed.format("%Y-%m-%d %H:%M UTC")),
        ]);
    }
    println!("{table}");
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_report_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn imbalance_cell(value: f64) -> Cell {
    let cell = Cell::new(format!("{value:.3}"));
    if value >= IMBALANCE_WARNING {
        cell.fg(Color::Yellow)
    } else {
        cell
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
