//! CLI output formatting for a preview run.
//!
//! # Output Format
//!
//! Progress goes to stdout:
//!
//! ```text
//! No slugs provided. Generating previews for 3 pages from short-form-pages.md
//! Components: 14 loaded
//! ✓ Generated welcome.html
//!     Template: a1-welcome.html.slim
//! ✓ Generated contact.html
//!     Template: b2-contact.html.slim
//! ✓ Generated index.html
//! Generated 2 pages, skipped 1, failed 0
//! ```
//!
//! Diagnostics go to stderr:
//!
//! ```text
//! ⚠ Skipped sub-template components/broken.html.slim: Syntax error on line 3: unterminated attribute wrapper
//! ⚠ Multiple templates match contact, using b2-contact.html.slim (also: c1-contact.html.slim)
//! ⚠ No template found for review
//! ✗ Failed cyclic: Sub-template <loop-a> nested deeper than 32 levels (cyclic components?)
//! ```
//!
//! # Architecture
//!
//! Each stream has a `format_*` function (returns `Vec<String>`) for
//! testability, and [`print_run_output`] writes both. Format functions are
//! pure: no I/O, no side effects.

use crate::generate::{PageReport, RunReport, SlugSource};
use std::path::Path;

/// Final path component for display, falling back to the full path.
fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Format the stdout lines of a run: progress and summary.
pub fn format_run_output(report: &RunReport) -> Vec<String> {
    let mut lines = Vec::new();
    if let SlugSource::Outline(outline) = &report.slug_source {
        lines.push(format!(
            "No slugs provided. Generating previews for {} from {}",
            plural(report.pages.len(), "page"),
            file_name(outline)
        ));
    }
    lines.push(format!("Components: {} loaded", report.components));

    for page in &report.pages {
        if let PageReport::Generated {
            template, output, ..
        } = page
        {
            lines.push(format!("\u{2713} Generated {}", file_name(output)));
            lines.push(format!("{}Template: {}", indent(1), file_name(&template.path)));
        }
    }

    if let Some(index) = &report.index {
        lines.push(format!("\u{2713} Generated {}", file_name(index)));
    }

    lines.push(format!(
        "Generated {}, skipped {}, failed {}",
        plural(report.generated(), "page"),
        report.missing(),
        report.failed()
    ));
    lines
}

/// Format the stderr lines of a run: warnings and page failures, in order.
pub fn format_run_warnings(report: &RunReport) -> Vec<String> {
    let mut lines = Vec::new();

    for skipped in &report.skipped_components {
        lines.push(format!(
            "\u{26a0} Skipped sub-template {}: {}",
            skipped.path.display(),
            skipped.error
        ));
    }

    for page in &report.pages {
        match page {
            PageReport::Generated { slug, template, .. } if !template.alternatives.is_empty() => {
                let others: Vec<String> =
                    template.alternatives.iter().map(|p| file_name(p)).collect();
                lines.push(format!(
                    "\u{26a0} Multiple templates match {}, using {} (also: {})",
                    slug,
                    file_name(&template.path),
                    others.join(", ")
                ));
            }
            PageReport::Generated { .. } => {}
            PageReport::Missing { slug } => {
                lines.push(format!("\u{26a0} No template found for {slug}"));
            }
            PageReport::Failed { slug, error } => {
                lines.push(format!("\u{2717} Failed {slug}: {error}"));
            }
        }
    }
    lines
}

/// Print a run report: diagnostics to stderr, progress to stdout.
pub fn print_run_output(report: &RunReport) {
    for line in format_run_warnings(report) {
        eprintln!("{}", line);
    }
    for line in format_run_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
