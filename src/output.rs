//! CLI output formatting for all pipeline stages.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. The primary display
//! for every entity is its semantic identity (title, route), with filenames
//! and hosts shown as secondary context. The fetch summary reads as a
//! content inventory; the process stream reads as cache accounting.
//!
//! # Output Format
//!
//! ## Fetch
//!
//! ```text
//! Fetched from cdn.contentful.com (space space1, environment master)
//! Title: Jane Doe
//! Projects (3)
//!     001 Dawn Series → /spotlight/dawn-series/
//!     002 Untitled Set (no page: missing slug)
//!     003 Bare → /spotlight/bare/
//! Layouts
//!     landing: present
//!     about: present
//!     resume: present
//!     contact: missing
//! Assets: 4 images, 1 attachment
//! ```
//!
//! ## Process
//!
//! ```text
//!     prev1-400.webp: downloaded
//!     prev1-800.webp: cached
//! ```
//!
//! ## Generate
//!
//! ```text
//! Home → index.html
//! Resume → resume/index.html
//! About → about/index.html
//! Contact → contact/index.html
//! Spotlight
//!     001 Dawn Series → spotlight/dawn-series/index.html
//! Generated 5 pages
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::assets::ProcessEvent;
use crate::content::SiteContent;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Truncate text to `max` characters, appending `...` if truncated.
/// The cut lands on a char boundary, never inside a multi-byte character.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}...", &text[..cut]),
    }
}

/// Displayable project title, with a placeholder for untitled projects.
fn title_label(title: &str) -> &str {
    if title.is_empty() { "(untitled)" } else { title }
}

/// One project line: index, title, and where its page goes (or why it gets
/// none).
fn project_line(index: usize, title: &str, route: Option<&str>) -> String {
    match route {
        Some(route) => format!(
            "    {} {} \u{2192} {}",
            format_index(index),
            title_label(title),
            route
        ),
        None => format!(
            "    {} {} (no page: missing slug)",
            format_index(index),
            title_label(title)
        ),
    }
}

fn presence(present: bool) -> &'static str {
    if present { "present" } else { "missing" }
}

// ============================================================================
// Stage 1: Fetch output
// ============================================================================

/// Format fetch stage output: where content came from and what arrived.
pub fn format_fetch_output(content: &SiteContent) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push(format!(
        "Fetched from {} (space {}, environment {})",
        content.source_host, content.space_id, content.environment
    ));
    lines.push(format!("Title: {}", content.site_title()));

    if let Some(statement) = content.landing.as_ref().and_then(|l| l.statement.as_deref()) {
        lines.push(format!("Statement: {}", truncate_desc(statement.trim(), 60)));
    }

    let projects = content.projects();
    lines.push(format!("Projects ({})", projects.len()));
    for (i, project) in projects.iter().enumerate() {
        let route = project.route();
        lines.push(project_line(
            i + 1,
            project.display_title(),
            route.as_deref(),
        ));
    }

    lines.push("Layouts".to_string());
    lines.push(format!("    landing: {}", presence(content.landing.is_some())));
    lines.push(format!("    about: {}", presence(content.about.is_some())));
    lines.push(format!("    resume: {}", presence(content.resume.is_some())));
    lines.push(format!("    contact: {}", presence(content.contact.is_some())));

    let image_count = content.image_assets().len();
    let attachment_count = content
        .resume
        .as_ref()
        .and_then(|r| r.attachment.as_ref())
        .map(|_| 1)
        .unwrap_or(0);
    lines.push(format!(
        "Assets: {} images, {} attachment{}",
        image_count,
        attachment_count,
        if attachment_count == 1 { "" } else { "s" }
    ));

    lines
}

/// Print fetch output to stdout.
pub fn print_fetch_output(content: &SiteContent) {
    for line in format_fetch_output(content) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 2: Process output
// ============================================================================

/// Format a single download progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::Downloaded { filename } => {
            vec![format!("    {}: downloaded", filename)]
        }
        ProcessEvent::Cached { filename } => {
            vec![format!("    {}: cached", filename)]
        }
    }
}

// ============================================================================
// Stage 3: Generate output
// ============================================================================

/// Format generate stage output showing generated HTML files.
pub fn format_generate_output(content: &SiteContent) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Home \u{2192} index.html".to_string());
    lines.push("Resume \u{2192} resume/index.html".to_string());
    lines.push("About \u{2192} about/index.html".to_string());
    lines.push("Contact \u{2192} contact/index.html".to_string());

    let mut page_count = 4;
    let spotlights: Vec<_> = content
        .projects()
        .iter()
        .filter(|p| p.usable_slug().is_some())
        .collect();

    if !spotlights.is_empty() {
        lines.push("Spotlight".to_string());
        for (i, project) in spotlights.iter().enumerate() {
            // usable_slug is Some for everything in this list
            if let Some(slug) = project.usable_slug() {
                lines.push(format!(
                    "    {} {} \u{2192} spotlight/{}/index.html",
                    format_index(i + 1),
                    title_label(project.display_title()),
                    slug
                ));
                page_count += 1;
            }
        }
    }

    lines.push(format!("Generated {} pages", page_count));
    lines
}

/// Print generate output to stdout.
pub fn print_generate_output(content: &SiteContent) {
    for line in format_generate_output(content) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
