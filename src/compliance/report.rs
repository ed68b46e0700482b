use super::{ComplianceReport, TextFieldReport};
use itertools::Itertools;

/// Renders the report as plain text. Fields are listed in the same order
/// as in [`ComplianceReport`].
pub fn generate_report(report: &ComplianceReport) -> String {
    let status = if report.is_valid { "valid" } else { "invalid" };

    let size = &report.file_size;
    let dimensions = &report.dimensions;
    let meta = &report.metadata;
    let categories = &meta.categories;

    let lines = [
        format!("Sticker compliance report: {} {status}", mark(report.is_valid)),
        String::new(),
        format!(
            "File size:  {} / {} bytes ({}) {}",
            size.size,
            size.limit,
            size.kind,
            mark(size.is_valid)
        ),
        format!(
            "Dimensions: {}x{} {}",
            dimensions.width,
            dimensions.height,
            mark(dimensions.is_valid)
        ),
        text_field("Pack:      ", &meta.pack),
        text_field("Author:    ", &meta.author),
        text_field("ID:        ", &meta.id),
        format!(
            "Categories: [{}] ({} of max {}) {}",
            categories.value.iter().join(", "),
            categories.count,
            super::limits::MAX_CATEGORIES,
            mark(categories.is_valid)
        ),
        list("Errors", &report.errors),
        list("Warnings", &report.warnings),
    ];

    lines.iter().map(|line| format!("{line}\n")).collect()
}

fn text_field(label: &str, field: &TextFieldReport) -> String {
    format!(
        "{label} {:?} ({}/{} characters) {}",
        field.value,
        field.value.chars().count(),
        field.limit,
        mark(field.is_valid)
    )
}

/// A blank line, the title and one line per item.
fn list(title: &str, items: &[String]) -> String {
    let lines = items.iter().map(|item| format!("\n  - {item}")).join("");

    format!("\n{title} ({}):{lines}", items.len())
}

fn mark(ok: bool) -> char {
    if ok {
        '✅'
    } else {
        '❌'
    }
}
