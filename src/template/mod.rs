//! Template compilation: Slim source → HTML fragment.
//!
//! [`compile_file`] and [`compile_str`] render Slim with [`slim::render`] and
//! then normalize the result with [`strip_outer_shell`], so that a template
//! written as a complete document (`doctype html` / `html` / `body`) yields
//! the same kind of fragment as a bare partial.

pub mod slim;

use crate::dom;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

static BODY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<body[\s>/]").expect("invalid body regex"));

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },
}

/// Compile a template file into an HTML fragment.
pub fn compile_file(path: &Path) -> Result<String, TemplateError> {
    let source = fs::read_to_string(path).map_err(|source| TemplateError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    compile_str(&source)
}

/// Compile Slim source into an HTML fragment.
pub fn compile_str(source: &str) -> Result<String, TemplateError> {
    let html = slim::render(source)?;
    Ok(strip_outer_shell(&html))
}

/// Return the inner HTML of `<body>` if the markup has one, else the markup
/// unchanged.
pub fn strip_outer_shell(html: &str) -> String {
    if BODY_TAG.is_match(html) {
        dom::to_html(&dom::parse_document_body(html))
    } else {
        html.to_string()
    }
}
