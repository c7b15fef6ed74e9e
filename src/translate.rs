//! Translation lookups.
//!
//! The translation file is a JSON object keyed by locale:
//!
//! ```json
//! { "en": { "label": { "first_name": "First name" } } }
//! ```
//!
//! Only one locale is loaded. Keys are dotted paths (`label.first_name`)
//! resolved one level at a time; a missing segment or a non-string value at
//! the end means "not found", and the key itself is shown instead.
//!
//! Two placeholder forms are substituted, after sub-templates are inlined:
//!
//! 1. `{{ 'label.first_name' | translate }}` (quotes optional)
//! 2. `<span translate="label.first_name"></span>`: text replaced,
//!    attribute removed

use crate::dom::{self, Node};
use crate::inline::{self, InlineError, SubTemplateMap};
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// Attribute marking an element whose text is a translation key.
pub const TRANSLATE_ATTR: &str = "translate";

static EXPRESSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*'?([\w.]+)'?\s*\|\s*translate\s*\}\}").expect("invalid translate regex")
});

#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("Failed to read translations {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed translations JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Locale '{0}' not found in translations")]
    MissingLocale(String),
}

/// A translation table: string leaves inside nested tables.
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationTable {
    Text(String),
    Table(BTreeMap<String, TranslationTable>),
    /// Numbers, booleans, arrays and null: present, but never a translation.
    Opaque,
}

impl From<Value> for TranslationTable {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            Value::Object(map) => Self::Table(
                map.into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
            _ => Self::Opaque,
        }
    }
}

impl Default for TranslationTable {
    fn default() -> Self {
        Self::Table(BTreeMap::new())
    }
}

impl TranslationTable {
    /// Load the `locale` section of a JSON translations file.
    pub fn load(path: &Path, locale: &str) -> Result<Self, TranslationError> {
        let content = fs::read_to_string(path).map_err(|source| TranslationError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content, locale)
    }

    pub fn from_json(json: &str, locale: &str) -> Result<Self, TranslationError> {
        let mut root: Value = serde_json::from_str(json)?;
        let section = root
            .get_mut(locale)
            .map(Value::take)
            .ok_or_else(|| TranslationError::MissingLocale(locale.to_string()))?;
        Ok(Self::from(section))
    }

    /// Follow a dotted key to a string leaf.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        let mut node = self;
        for segment in key.split('.') {
            match node {
                Self::Table(children) => node = children.get(segment)?,
                Self::Text(_) | Self::Opaque => return None,
            }
        }
        match node {
            Self::Text(text) => Some(text),
            Self::Table(_) | Self::Opaque => None,
        }
    }

    /// The translation for `key`, or the key itself.
    pub fn resolve<'a>(&'a self, key: &'a str) -> &'a str {
        self.lookup(key).unwrap_or(key)
    }
}

/// Applies a translation table to compiled page HTML.
pub struct Translator<'a> {
    table: &'a TranslationTable,
    components: &'a SubTemplateMap,
    max_depth: usize,
}

impl<'a> Translator<'a> {
    pub fn new(table: &'a TranslationTable, components: &'a SubTemplateMap, max_depth: usize) -> Self {
        Self {
            table,
            components,
            max_depth,
        }
    }

    /// Inline sub-templates, then substitute both placeholder forms.
    pub fn translate(&self, html: &str) -> Result<String, InlineError> {
        let inlined = inline::inline_components(html, self.components, self.max_depth)?;
        let expressions_done = self.replace_expressions(&inlined);
        Ok(self.replace_attributes(&expressions_done))
    }

    /// Substitute `{{ key | translate }}` expressions in raw HTML.
    pub fn replace_expressions(&self, html: &str) -> String {
        EXPRESSION
            .replace_all(html, |caps: &Captures| self.table.resolve(&caps[1]).to_string())
            .into_owned()
    }

    /// Replace the text of every `translate="key"` element.
    pub fn replace_attributes(&self, html: &str) -> String {
        let mut nodes = dom::parse_html_fragment(html);
        dom::for_each_element_mut(&mut nodes, &mut |el| {
            if let Some(key) = el.remove_attr(TRANSLATE_ATTR) {
                el.children = vec![Node::Text(self.table.resolve(&key).to_string())];
            }
        });
        dom::to_html(&nodes)
    }
}
