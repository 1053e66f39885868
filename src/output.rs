//! CLI output formatting for build and check runs.
//!
//! Output is **page-centric**: pages are grouped by locale and each line leads
//! with the template that produced it, followed by the files it became.
//! Skipped pages stay in place in the list, so a broken template shows up next
//! to its siblings instead of at the end.
//!
//! ```text
//! pt
//!     001 index.html → pt/index.html
//!     002 sobre.html SKIPPED
//!         Reason: template sobre.html: line 3: section 'items' is never closed
//!     003 artigo.html [lgpd] → pt/blog/lgpd.html
//! en
//!     …
//!
//! Warnings (2)
//!     post 'cnpj' has no 'es' translation, using 'pt'
//!     content not found: lang/fr.json
//!
//! Artifacts
//!     index.html
//!     sitemap.xml
//!
//! Built 35 pages, skipped 1 → dist
//! Assets: 12 files, version 3f2a9c0d1b4e
//! ```
//!
//! Each `format_*` function returns `Vec<String>` and is pure; `print_*`
//! writes the lines to stdout.

use crate::page::PageKind;
use crate::site::{BuildReport, PageOutcome, PageReport};

/// 1-based positional index, 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Template name, plus the post id for articles.
fn page_label(page: &PageReport) -> String {
    match &page.request.kind {
        PageKind::Article { id } => format!("{} [{id}]", page.template),
        _ => page.template.clone(),
    }
}

fn page_lines(index: usize, page: &PageReport) -> Vec<String> {
    let head = format!("{}{} {}", indent(1), format_index(index), page_label(page));
    match &page.outcome {
        PageOutcome::Built { outputs } => vec![format!("{head} → {}", outputs.join(", "))],
        PageOutcome::Skipped { reason } => vec![
            format!("{head} SKIPPED"),
            format!("{}Reason: {reason}", indent(2)),
        ],
    }
}

/// Pages grouped under their locale, in plan order.
pub fn format_pages(report: &BuildReport) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Option<&str> = None;
    let mut index = 0;
    for page in &report.pages {
        if current != Some(page.request.locale.as_str()) {
            current = Some(page.request.locale.as_str());
            index = 0;
            lines.push(page.request.locale.clone());
        }
        index += 1;
        lines.extend(page_lines(index, page));
    }
    lines
}

pub fn format_warnings(report: &BuildReport) -> Vec<String> {
    if report.warnings.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![format!("Warnings ({})", report.warnings.len())];
    lines.extend(report.warnings.iter().map(|w| format!("{}{w}", indent(1))));
    lines
}

/// Full report: pages, warnings, artifacts and a summary.
pub fn format_build_report(report: &BuildReport) -> Vec<String> {
    let mut lines = format_pages(report);

    let warnings = format_warnings(report);
    if !warnings.is_empty() {
        lines.push(String::new());
        lines.extend(warnings);
    }

    if !report.artifacts.is_empty() {
        lines.push(String::new());
        lines.push("Artifacts".to_string());
        lines.extend(report.artifacts.iter().map(|a| format!("{}{a}", indent(1))));
    }

    lines.push(String::new());
    let summary = format!("Built {} pages, skipped {}", report.built(), report.skipped());
    match &report.output {
        Some(dist) => {
            lines.push(format!("{summary} → {}", dist.display()));
            lines.push(format!(
                "Assets: {} files, version {}",
                report.assets_copied, report.asset_version
            ));
        }
        None => lines.push(format!("{summary} (check only, nothing written)")),
    }
    lines
}

pub fn print_build_report(report: &BuildReport) {
    for line in format_build_report(report) {
        println!("{}", line);
    }
}
