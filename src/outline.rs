//! Outline document → index page.
//!
//! The outline is a light markdown file describing every page of the flow.
//! Each line is classified on its own ([`classify`]); precedence is
//! explicit in the order [`classify`] tries the line kinds:
//!
//! | Line | Kind |
//! |------|------|
//! | `## contact` | [`OutlineLine::PageHeading`], opens a page block |
//! | `### Notes` | [`OutlineLine::Subheading`] |
//! | `# Section` | [`OutlineLine::Title`], closes the page block |
//! | `---` | [`OutlineLine::Rule`] |
//! | *(empty)* | [`OutlineLine::Blank`], keeps the block open |
//! | `> note` | [`OutlineLine::Quote`] |
//! | `- item`, `* item`, `• item` | [`OutlineLine::Bullet`] |
//! | anything else | [`OutlineLine::Paragraph`], closes the page block |
//!
//! A page heading whose slug has a generated page renders as a link, and
//! the block ends with a live `<iframe>` preview of that page:
//!
//! ```html
//! <div class="page-block"><div class="page-info">
//!   <h2><a href="contact.html">contact</a></h2>
//!   <ul><li>…</li></ul>
//! </div><iframe class="page-preview" src="contact.html"></iframe></div>
//! ```

use crate::naming::slug_from_heading;
use crate::page::page_document;
use maud::{PreEscaped, html};
use pulldown_cmark::{Event, Parser, Tag, TagEnd, html as md_html};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// Placeholder in the index template replaced by the rendered outline.
pub const CONTENT_PLACEHOLDER: &str = "{{CONTENT}}";

static LINK_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[[^\]]+\]:").expect("invalid link reference regex"));
static ORDERED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,9})([.)])(\s|$)").expect("invalid ordered marker regex"));

#[derive(Error, Debug)]
pub enum OutlineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One classified outline line, borrowing its text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutlineLine<'a> {
    PageHeading(&'a str),
    Subheading(&'a str),
    Title(&'a str),
    Rule,
    Blank,
    Quote(&'a str),
    Bullet(&'a str),
    Paragraph(&'a str),
}

/// Classify a line; the first matching kind wins.
pub fn classify(line: &str) -> OutlineLine<'_> {
    if let Some(text) = parse_heading(line, 2) {
        OutlineLine::PageHeading(text)
    } else if let Some(text) = parse_heading(line, 3) {
        OutlineLine::Subheading(text)
    } else if let Some(text) = parse_heading(line, 1) {
        OutlineLine::Title(text)
    } else if parse_rule(line) {
        OutlineLine::Rule
    } else if line.trim().is_empty() {
        OutlineLine::Blank
    } else if let Some(text) = parse_quote(line) {
        OutlineLine::Quote(text)
    } else if let Some(text) = parse_bullet(line) {
        OutlineLine::Bullet(text)
    } else {
        OutlineLine::Paragraph(line)
    }
}

/// `level` hashes at column 0, whitespace, then non-empty text.
fn parse_heading(line: &str, level: usize) -> Option<&str> {
    let rest = line.strip_prefix(&"#".repeat(level)[..])?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let text = rest.trim();
    (!text.is_empty()).then_some(text)
}

fn parse_rule(line: &str) -> bool {
    line.trim() == "---"
}

fn parse_quote(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix('>')?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

fn parse_bullet(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let rest = trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix('*'))
        .or_else(|| trimmed.strip_prefix('•'))?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim_start())
}

/// Unique slugs of all page headings, in first-seen order.
pub fn collect_slugs(source: &str) -> Vec<String> {
    let mut slugs: Vec<String> = Vec::new();
    for line in source.lines() {
        if let OutlineLine::PageHeading(heading) = classify(line) {
            if let Some(slug) = slug_from_heading(heading) {
                if !slugs.contains(&slug) {
                    slugs.push(slug);
                }
            }
        }
    }
    slugs
}

// ============================================================================
// Inline markdown
// ============================================================================

/// Convert inline markdown (bold, italic, code, links) in one line of text.
///
/// Block-level syntax is disabled: a line that would start a list, heading,
/// quote, fence or link definition is escaped first, and block events are
/// dropped, so the output never contains `<p>`, `<ul>` or `<h*>`.
pub fn inline_markdown(text: &str) -> String {
    let source = escape_block_start(text.trim());
    let events = Parser::new(&source).filter(is_inline_event);
    let mut out = String::new();
    md_html::push_html(&mut out, events);
    out.trim_end().to_string()
}

fn is_inline_event(event: &Event<'_>) -> bool {
    match event {
        Event::Start(tag) => matches!(
            tag,
            Tag::Emphasis | Tag::Strong | Tag::Strikethrough | Tag::Link { .. } | Tag::Image { .. }
        ),
        Event::End(tag) => matches!(
            tag,
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link | TagEnd::Image
        ),
        Event::Rule => false,
        _ => true,
    }
}

fn escape_block_start(text: &str) -> String {
    let first = text.chars().next();
    let second = text.chars().nth(1);
    let needs_escape = match first {
        Some('#' | '>' | '=') => true,
        Some('-' | '+' | '*' | '_') => {
            second.is_none_or(char::is_whitespace) || is_thematic_break(text)
        }
        Some('`' | '~') => text.starts_with("```") || text.starts_with("~~~"),
        Some('[') => LINK_REFERENCE.is_match(text),
        _ => false,
    };
    if needs_escape {
        return format!("\\{text}");
    }
    if let Some(caps) = ORDERED_MARKER.captures(text) {
        let digits = caps[1].len();
        return format!("{}\\{}", &text[..digits], &text[digits..]);
    }
    text.to_string()
}

fn is_thematic_break(text: &str) -> bool {
    let marks: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    marks.len() >= 3 && marks.iter().all(|c| *c == marks[0])
}

// ============================================================================
// Rendering
// ============================================================================

/// Accumulates index HTML while walking the outline.
struct IndexWriter<F> {
    html: String,
    page_exists: F,
    in_list: bool,
    block_open: bool,
    pending_preview: Option<String>,
}

impl<F: Fn(&str) -> bool> IndexWriter<F> {
    fn new(page_exists: F) -> Self {
        Self {
            html: String::new(),
            page_exists,
            in_list: false,
            block_open: false,
            pending_preview: None,
        }
    }

    fn flush_list(&mut self) {
        if self.in_list {
            self.html.push_str("</ul>");
            self.in_list = false;
        }
    }

    fn close_block(&mut self) {
        if !self.block_open {
            return;
        }
        self.flush_list();
        self.html.push_str("</div>");
        if let Some(preview) = self.pending_preview.take() {
            self.html.push_str(&preview);
        }
        self.html.push_str("</div>");
        self.block_open = false;
    }

    fn push_markup(&mut self, markup: maud::Markup) {
        self.html.push_str(&markup.into_string());
    }

    fn line(&mut self, line: OutlineLine<'_>) {
        if !matches!(line, OutlineLine::Bullet(_)) {
            self.flush_list();
        }
        match line {
            OutlineLine::PageHeading(heading) => self.page_heading(heading),
            OutlineLine::Subheading(text) => {
                self.push_markup(html! { h3 { (PreEscaped(inline_markdown(text))) } });
            }
            OutlineLine::Title(text) => {
                self.close_block();
                self.push_markup(html! { h1 { (PreEscaped(inline_markdown(text))) } });
            }
            OutlineLine::Rule => self.html.push_str("<hr>"),
            OutlineLine::Blank => {}
            OutlineLine::Quote(text) => {
                self.push_markup(html! { blockquote { (PreEscaped(inline_markdown(text))) } });
            }
            OutlineLine::Bullet(text) => {
                if !self.in_list {
                    self.html.push_str("<ul>");
                    self.in_list = true;
                }
                self.push_markup(html! { li { (PreEscaped(inline_markdown(text))) } });
            }
            OutlineLine::Paragraph(text) => {
                self.close_block();
                self.push_markup(html! { p { (PreEscaped(inline_markdown(text))) } });
            }
        }
    }

    fn page_heading(&mut self, heading: &str) {
        self.close_block();
        let title = PreEscaped(inline_markdown(heading));
        let target = slug_from_heading(heading)
            .filter(|slug| (self.page_exists)(slug.as_str()))
            .map(|slug| format!("{slug}.html"));

        self.html
            .push_str(r#"<div class="page-block"><div class="page-info">"#);
        match target {
            Some(href) => {
                self.push_markup(html! { h2 { a href=(href) { (title) } } });
                self.pending_preview = Some(
                    html! { iframe.page-preview src=(href) {} }.into_string(),
                );
            }
            None => {
                self.push_markup(html! { h2 { (title) } });
                self.pending_preview = None;
            }
        }
        self.block_open = true;
    }

    fn finish(mut self) -> String {
        self.flush_list();
        self.close_block();
        self.html
    }
}

/// Render outline source to the index body HTML.
///
/// `page_exists` reports whether `<slug>.html` was generated.
pub fn render_outline(source: &str, page_exists: impl Fn(&str) -> bool) -> String {
    let mut writer = IndexWriter::new(page_exists);
    for line in source.lines() {
        writer.line(classify(line));
    }
    writer.finish()
}

/// Put rendered content into an index template, or the fallback shell.
pub fn fill_index_template(template: Option<&str>, content: &str, stylesheet_href: &str) -> String {
    match template {
        Some(template) => template.replacen(CONTENT_PLACEHOLDER, content, 1),
        None => page_document("preview index", stylesheet_href, content).into_string(),
    }
}

/// Where the index page looks for its inputs.
#[derive(Debug, Clone)]
pub struct IndexSources<'a> {
    pub outline: &'a Path,
    pub template: &'a Path,
    pub output_dir: &'a Path,
    pub stylesheet_href: &'a str,
}

/// Write `index.html` into the output directory.
///
/// Returns `Ok(None)` without writing anything when the outline is missing.
pub fn generate_index(sources: &IndexSources<'_>) -> Result<Option<PathBuf>, OutlineError> {
    if !sources.outline.exists() {
        return Ok(None);
    }
    let source = fs::read_to_string(sources.outline)?;
    let content = render_outline(&source, |slug| {
        sources.output_dir.join(format!("{slug}.html")).is_file()
    });

    let template = if sources.template.is_file() {
        Some(fs::read_to_string(sources.template)?)
    } else {
        None
    };
    let index = fill_index_template(template.as_deref(), &content, sources.stylesheet_href);

    fs::create_dir_all(sources.output_dir)?;
    let path = sources.output_dir.join("index.html");
    fs::write(&path, index)?;
    Ok(Some(path))
}
