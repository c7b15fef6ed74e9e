//! Component and directive inlining.
//!
//! Page templates reference sub-templates through custom elements:
//! `components/address-form.html.slim` is invoked as `<address-form>`. The
//! inliner replaces each such element with a fresh copy of the compiled
//! sub-template, moving the element's children into the sub-template's
//! transclusion slot:
//!
//! - an `<ng-transclude>` element is replaced by the captured content;
//! - an element carrying an `ng-transclude` attribute keeps its tag, loses
//!   the attribute, and has its children replaced by the captured content.
//!
//! Expansion works on the parsed tree. Each custom element is expanded once,
//! caller content first, then the instantiated fragment at `depth + 1`.
//! Exceeding the configured depth aborts with
//! [`InlineError::DepthExceeded`], which is how a cyclic set of
//! sub-templates surfaces instead of looping forever.

use crate::dom::{self, Node};
use crate::template::{self, TemplateError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Tag and attribute name of a transclusion slot.
pub const TRANSCLUDE: &str = "ng-transclude";

#[derive(Error, Debug)]
pub enum InlineError {
    #[error("Sub-template <{tag}> nested deeper than {depth} levels (cyclic components?)")]
    DepthExceeded { tag: String, depth: usize },
}

/// A sub-template that failed to compile while building the map.
#[derive(Debug)]
pub struct SkippedTemplate {
    pub path: PathBuf,
    pub error: TemplateError,
}

/// Compiled sub-templates keyed by lowercase tag name.
#[derive(Debug, Clone, Default)]
pub struct SubTemplateMap {
    fragments: BTreeMap<String, Vec<Node>>,
}

impl SubTemplateMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the fragment for `tag`.
    pub fn insert(&mut self, tag: &str, html: &str) {
        self.fragments
            .insert(tag.to_ascii_lowercase(), dom::parse_html_fragment(html));
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.fragments.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    fn instantiate(&self, tag: &str) -> Option<Vec<Node>> {
        self.fragments.get(tag).cloned()
    }

    /// Build the map from every file ending in `extension` under `dirs`.
    ///
    /// Directories are walked recursively in order, later ones overriding
    /// earlier ones on tag collisions. Missing directories are ignored.
    /// Templates that fail to compile are left out and returned alongside
    /// the map so the caller can report them.
    pub fn collect(dirs: &[PathBuf], extension: &str) -> (Self, Vec<SkippedTemplate>) {
        let mut map = Self::new();
        let mut skipped = Vec::new();
        for dir in dirs {
            for path in template_files(dir, extension) {
                let Some(tag) = tag_name(&path, extension) else {
                    continue;
                };
                match template::compile_file(&path) {
                    Ok(html) => map.insert(&tag, &html),
                    Err(error) => skipped.push(SkippedTemplate { path, error }),
                }
            }
        }
        (map, skipped)
    }
}

fn template_files(dir: &Path, extension: &str) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(extension))
        })
        .collect()
}

/// `address-form.html.slim` → `address-form`.
fn tag_name(path: &Path, extension: &str) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let tag = file_name.strip_suffix(extension)?;
    (!tag.is_empty()).then(|| tag.to_string())
}

/// Expand every sub-template element in an HTML string.
pub fn inline_components(
    html: &str,
    map: &SubTemplateMap,
    max_depth: usize,
) -> Result<String, InlineError> {
    let nodes = dom::parse_html_fragment(html);
    let nodes = inline_nodes(nodes, map, max_depth)?;
    Ok(dom::to_html(&nodes))
}

/// Expand every sub-template element in a parsed tree.
pub fn inline_nodes(
    nodes: Vec<Node>,
    map: &SubTemplateMap,
    max_depth: usize,
) -> Result<Vec<Node>, InlineError> {
    if map.is_empty() {
        return Ok(nodes);
    }
    expand(nodes, map, 0, max_depth)
}

fn expand(
    nodes: Vec<Node>,
    map: &SubTemplateMap,
    depth: usize,
    max_depth: usize,
) -> Result<Vec<Node>, InlineError> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Element(el) if map.contains(&el.name) => {
                if depth >= max_depth {
                    return Err(InlineError::DepthExceeded {
                        tag: el.name,
                        depth: max_depth,
                    });
                }
                let captured = expand(el.children, map, depth, max_depth)?;
                let Some(mut instance) = map.instantiate(&el.name) else {
                    continue;
                };
                fill_slots(&mut instance, &captured);
                out.extend(expand(instance, map, depth + 1, max_depth)?);
            }
            Node::Element(mut el) => {
                el.children = expand(el.children, map, depth, max_depth)?;
                out.push(Node::Element(el));
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

/// Put `captured` into every transclusion slot of `nodes`.
///
/// Inserted content is not searched for further slots.
fn fill_slots(nodes: &mut Vec<Node>, captured: &[Node]) {
    let mut filled = Vec::with_capacity(nodes.len());
    for node in nodes.drain(..) {
        match node {
            Node::Element(el) if el.name == TRANSCLUDE => filled.extend(captured.iter().cloned()),
            Node::Element(mut el) if el.has_attr(TRANSCLUDE) => {
                el.remove_attr(TRANSCLUDE);
                el.children = captured.to_vec();
                filled.push(Node::Element(el));
            }
            Node::Element(mut el) => {
                fill_slots(&mut el.children, captured);
                filled.push(Node::Element(el));
            }
            other => filled.push(other),
        }
    }
    *nodes = filled;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn has_pending(nodes: &[Node], map: &SubTemplateMap) -> bool {
        nodes.iter().any(|node| match node {
            Node::Element(el) => map.contains(&el.name) || has_pending(&el.children, map),
            _ => false,
        })
    }

    fn map_of(entries: &[(&str, &str)]) -> SubTemplateMap {
        let mut map = SubTemplateMap::new();
        for (tag, html) in entries {
            map.insert(tag, html);
        }
        map
    }

    #[test]
    fn element_slot_replaced_by_content() {
        let map = map_of(&[("foo", "<div><ng-transclude></ng-transclude></div>")]);
        assert_eq!(
            inline_components("<foo>X</foo>", &map, 32).unwrap(),
            "<div>X</div>"
        );
    }

    #[test]
    fn attribute_slot_keeps_host_element() {
        let map = map_of(&[("panel", r#"<section class="panel"><div ng-transclude>default</div></section>"#)]);
        assert_eq!(
            inline_components("<panel><b>Body</b></panel>", &map, 32).unwrap(),
            r#"<section class="panel"><div><b>Body</b></div></section>"#
        );
    }

    #[test]
    fn fragment_without_slot_discards_content() {
        let map = map_of(&[("spinner", r#"<span class="spin"></span>"#)]);
        assert_eq!(
            inline_components("<p><spinner>ignored</spinner></p>", &map, 32).unwrap(),
            r#"<p><span class="spin"></span></p>"#
        );
    }

    #[test]
    fn nested_components_fully_expanded() {
        let map = map_of(&[
            ("outer-box", "<div class=\"outer\"><inner-box><ng-transclude></ng-transclude></inner-box></div>"),
            ("inner-box", "<div class=\"inner\" ng-transclude></div>"),
        ]);
        let html = inline_components("<outer-box>Hi</outer-box>", &map, 32).unwrap();
        assert_eq!(html, r#"<div class="outer"><div class="inner">Hi</div></div>"#);
        assert!(!has_pending(&dom::parse_html_fragment(&html), &map));
    }

    #[test]
    fn components_inside_transcluded_content_expanded() {
        let map = map_of(&[
            ("card-box", "<div class=\"card\" ng-transclude></div>"),
            ("help-text", "<small>help</small>"),
        ]);
        assert_eq!(
            inline_components("<card-box><help-text></help-text></card-box>", &map, 32).unwrap(),
            r#"<div class="card"><small>help</small></div>"#
        );
    }

    #[test]
    fn each_instance_is_a_fresh_copy() {
        let map = map_of(&[("tag-x", "<i ng-transclude></i>")]);
        assert_eq!(
            inline_components("<tag-x>a</tag-x><tag-x>b</tag-x>", &map, 32).unwrap(),
            "<i>a</i><i>b</i>"
        );
    }

    #[test]
    fn cyclic_map_hits_depth_guard() {
        let map = map_of(&[
            ("ping-el", "<pong-el></pong-el>"),
            ("pong-el", "<ping-el></ping-el>"),
        ]);
        let err = inline_components("<ping-el></ping-el>", &map, 8).unwrap_err();
        let InlineError::DepthExceeded { depth, .. } = err;
        assert_eq!(depth, 8);
    }

    #[test]
    fn empty_map_leaves_html_alone() {
        let html = "<foo>X</foo>";
        let nodes = inline_nodes(dom::parse_html_fragment(html), &SubTemplateMap::new(), 4).unwrap();
        assert_eq!(dom::to_html(&nodes), html);
    }

    #[test]
    fn collect_walks_recursively_and_skips_broken() {
        let tmp = TempDir::new().unwrap();
        let components = tmp.path().join("components");
        let directives = tmp.path().join("directives");
        fs::create_dir_all(components.join("forms")).unwrap();
        fs::create_dir_all(&directives).unwrap();
        fs::write(components.join("forms/address-form.html.slim"), "fieldset.address").unwrap();
        fs::write(components.join("broken.html.slim"), "div\n    p a\n  p b").unwrap();
        fs::write(components.join("notes.txt"), "not a template").unwrap();
        fs::write(directives.join("address-form.html.slim"), "div.override").unwrap();

        let (map, skipped) = SubTemplateMap::collect(
            &[components, directives, tmp.path().join("missing")],
            ".html.slim",
        );

        assert_eq!(map.len(), 1);
        assert!(map.contains("address-form"));
        assert_eq!(skipped.len(), 1);
        assert!(skipped[0].path.ends_with("broken.html.slim"));
        assert_eq!(
            inline_components("<address-form></address-form>", &map, 4).unwrap(),
            r#"<div class="override"></div>"#
        );
    }

    #[test]
    fn tag_name_strips_extension() {
        assert_eq!(
            tag_name(Path::new("a/b/phone-input.html.slim"), ".html.slim").as_deref(),
            Some("phone-input")
        );
        assert_eq!(tag_name(Path::new(".html.slim"), ".html.slim"), None);
    }
}
