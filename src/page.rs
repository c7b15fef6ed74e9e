//! Preview page assembly.
//!
//! For one slug: find the page template, compile it, inline components,
//! apply translations, wrap the result in the marker container and write
//! `<output_dir>/<slug>.html`.
//!
//! ## Template Matching
//!
//! Any file in the templates directory whose name contains the slug and ends
//! with the page extension is a candidate. Candidates are sorted and the
//! first one wins, which prefers section-prefixed names:
//!
//! ```text
//! templates/
//! ├── b2-contact.html.slim          ← chosen for "contact"
//! └── b3-alternate-contact.html.slim
//! ```
//!
//! The other candidates are kept on the result so the run can warn about
//! the ambiguity.

use crate::config::{PreviewConfig, ResolvedPaths};
use crate::inline::{InlineError, SubTemplateMap};
use crate::template::{self, TemplateError};
use crate::translate::{TranslationTable, Translator};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use regex::Regex;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// How far into the page body the existing-wrapper check looks.
const WRAPPER_SCAN_CHARS: usize = 200;

static DIV_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<div\b[^>]*?\bclass\s*=\s*["']([^"']*)"#).expect("invalid div regex")
});

#[derive(Error, Debug)]
pub enum PageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to compile {}: {source}", .path.display())]
    Template {
        path: PathBuf,
        source: TemplateError,
    },
    #[error(transparent)]
    Inline(#[from] InlineError),
}

/// The template chosen for a slug.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateMatch {
    pub path: PathBuf,
    /// Other candidates that also matched, in sorted order.
    pub alternatives: Vec<PathBuf>,
}

/// Result of building one page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Generated {
        slug: String,
        template: TemplateMatch,
        output: PathBuf,
    },
    /// No template matched; nothing was written.
    Missing { slug: String },
}

/// Find the page template for `slug` in `dir`.
pub fn find_template(
    dir: &Path,
    slug: &str,
    extension: &str,
) -> Result<Option<TemplateMatch>, PageError> {
    let mut names: Vec<String> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.contains(slug) && name.ends_with(extension))
        .collect();
    if names.is_empty() {
        return Ok(None);
    }
    names.sort();
    let first = names.remove(0);
    Ok(Some(TemplateMatch {
        path: dir.join(first),
        alternatives: names.into_iter().map(|name| dir.join(name)).collect(),
    }))
}

/// Whether the content already opens with a `<div>` carrying `class`.
pub fn has_wrapper(content: &str, class: &str) -> bool {
    let head: String = content.trim_start().chars().take(WRAPPER_SCAN_CHARS).collect();
    DIV_CLASS
        .captures_iter(&head)
        .any(|caps| caps[1].split_ascii_whitespace().any(|c| c == class))
}

/// Wrap `content` in `<div class="{class}">` unless it already is.
pub fn wrap_content(content: &str, class: &str) -> String {
    if has_wrapper(content, class) {
        content.to_string()
    } else {
        format!(r#"<div class="{class}">{content}</div>"#)
    }
}

/// Path from `from_dir` to `to`, `/`-separated, for use as an href.
///
/// Both paths must be relative to the same base (or both absolute). `.` and
/// `..` segments are folded lexically first.
pub fn relative_href(from_dir: &Path, to: &Path) -> String {
    let from = normalize(from_dir);
    let target = normalize(to);
    let common = from
        .iter()
        .zip(&target)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = vec!["..".to_string(); from.len() - common];
    parts.extend(
        target[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}

fn normalize(path: &Path) -> Vec<Component<'_>> {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir if matches!(parts.last(), Some(Component::Normal(_))) => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts
}

/// `path` made absolute against the working directory, unchanged if that fails.
fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Renders the page document around already-built body HTML.
pub fn page_document(title: &str, stylesheet_href: &str, body: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (title) }
                link rel="stylesheet" href=(stylesheet_href);
            }
            body {
                "\n"
                (PreEscaped(body))
                "\n"
            }
        }
    }
}

/// Builds preview pages with a shared component map and translation table.
pub struct PageBuilder<'a> {
    config: &'a PreviewConfig,
    paths: &'a ResolvedPaths,
    translator: Translator<'a>,
}

impl<'a> PageBuilder<'a> {
    pub fn new(
        config: &'a PreviewConfig,
        paths: &'a ResolvedPaths,
        components: &'a SubTemplateMap,
        table: &'a TranslationTable,
    ) -> Self {
        Self {
            config,
            paths,
            translator: Translator::new(table, components, config.templates.max_inline_depth),
        }
    }

    /// Href of the shared stylesheet as seen from the output directory.
    pub fn stylesheet_href(&self) -> String {
        let stylesheet = self.paths.asset_dir.join(&self.config.page.stylesheet);
        relative_href(&absolute(&self.paths.output_dir), &absolute(&stylesheet))
    }

    /// Render the full page HTML for a template file.
    pub fn render(&self, slug: &str, template_path: &Path) -> Result<String, PageError> {
        let compiled = template::compile_file(template_path).map_err(|source| {
            PageError::Template {
                path: template_path.to_path_buf(),
                source,
            }
        })?;
        let translated = self.translator.translate(&compiled)?;
        let body = wrap_content(&translated, &self.config.page.wrapper_class);
        Ok(page_document(slug, &self.stylesheet_href(), &body).into_string())
    }

    /// Build and write the page for `slug`.
    pub fn build(&self, slug: &str) -> Result<PageOutcome, PageError> {
        let Some(template) = find_template(
            &self.paths.templates_dir,
            slug,
            &self.config.templates.page_extension,
        )?
        else {
            return Ok(PageOutcome::Missing {
                slug: slug.to_string(),
            });
        };

        let html = self.render(slug, &template.path)?;
        fs::create_dir_all(&self.paths.output_dir)?;
        let output = self.paths.output_dir.join(format!("{slug}.html"));
        fs::write(&output, html)?;

        Ok(PageOutcome::Generated {
            slug: slug.to_string(),
            template,
            output,
        })
    }
}
