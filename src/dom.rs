//! Owned HTML tree used by every rewriting stage.
//!
//! Parsing goes through html5ever into an `RcDom`, which is then converted
//! into plain owned [`Node`] values. Components, translations and shell
//! stripping all work on this tree and serialize it back with [`to_html`].
//!
//! Parsing follows the HTML5 fragment algorithm in a `<body>` context, so
//! unknown tags such as `<ng-transclude>` or `<my-widget>` survive as
//! ordinary elements with lowercased names.

use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, parse_document, parse_fragment};
use markup5ever::{LocalName, Namespace, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Elements that never carry a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose text children are written without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
    Doctype(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(key, _)| key == name)
    }

    /// Remove an attribute, returning its value if it was present.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|(key, _)| key == name)?;
        Some(self.attrs.remove(pos).1)
    }
}

/// Parse an HTML fragment into owned nodes.
pub fn parse_html_fragment(html: &str) -> Vec<Node> {
    let context = QualName::new(
        None,
        Namespace::from(HTML_NAMESPACE),
        LocalName::from("body"),
    );
    let dom = parse_fragment(RcDom::default(), ParseOpts::default(), context, Vec::new()).one(html);

    // The fragment algorithm puts everything under a synthetic <html> root.
    let document = dom.document.children.borrow();
    match document.first() {
        Some(root) => convert_children(root),
        None => Vec::new(),
    }
}

/// Parse a full document and return the children of its `<body>` element.
///
/// html5ever always synthesizes a body, so this never fails; callers decide
/// beforehand whether the source actually had one.
pub fn parse_document_body(html: &str) -> Vec<Node> {
    let dom = parse_document(RcDom::default(), ParseOpts::default()).one(html);
    find_element(&dom.document, "body")
        .map(|body| convert_children(&body))
        .unwrap_or_default()
}

fn find_element(handle: &Handle, name: &str) -> Option<Handle> {
    if let NodeData::Element { name: qual, .. } = &handle.data {
        if qual.local.as_ref() == name {
            return Some(handle.clone());
        }
    }
    handle
        .children
        .borrow()
        .iter()
        .find_map(|child| find_element(child, name))
}

fn convert_children(handle: &Handle) -> Vec<Node> {
    handle.children.borrow().iter().filter_map(convert).collect()
}

fn convert(handle: &Handle) -> Option<Node> {
    match &handle.data {
        NodeData::Element {
            name,
            attrs,
            template_contents,
            ..
        } => {
            let attrs = attrs
                .borrow()
                .iter()
                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                .collect();
            // <template> children live in a separate document fragment
            let children = match template_contents.borrow().as_ref() {
                Some(contents) => convert_children(contents),
                None => convert_children(handle),
            };
            Some(Node::Element(Element {
                name: name.local.to_string(),
                attrs,
                children,
            }))
        }
        NodeData::Text { contents } => Some(Node::Text(contents.borrow().to_string())),
        NodeData::Comment { contents } => Some(Node::Comment(contents.to_string())),
        NodeData::Doctype { name, .. } => Some(Node::Doctype(name.to_string())),
        NodeData::Document | NodeData::ProcessingInstruction { .. } => None,
    }
}

// ============================================================================
// Serialization
// ============================================================================

/// Serialize a node list back to HTML.
pub fn to_html(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(node, false, &mut out);
    }
    out
}

fn write_node(node: &Node, raw_text: bool, out: &mut String) {
    match node {
        Node::Text(text) if raw_text => out.push_str(text),
        Node::Text(text) => out.push_str(&escape_text(text)),
        Node::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        Node::Doctype(name) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
        Node::Element(el) => write_element(el, out),
    }
}

fn write_element(el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&el.name);
    for (key, value) in &el.attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&el.name.as_str()) {
        return;
    }

    let raw_text = RAW_TEXT_ELEMENTS.contains(&el.name.as_str());
    for child in &el.children {
        write_node(child, raw_text, out);
    }

    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
}

pub fn escape_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '\u{a0}' => result.push_str("&nbsp;"),
            _ => result.push(ch),
        }
    }
    result
}

pub fn escape_attr(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\u{a0}' => result.push_str("&nbsp;"),
            _ => result.push(ch),
        }
    }
    result
}

// ============================================================================
// Traversal
// ============================================================================

/// Visit every element in document order, parents before children.
pub fn for_each_element_mut(nodes: &mut [Node], f: &mut impl FnMut(&mut Element)) {
    for node in nodes {
        if let Node::Element(el) = node {
            f(el);
            for_each_element_mut(&mut el.children, f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_keeps_custom_elements() {
        let nodes = parse_html_fragment("<my-widget size=\"2\">Hi</my-widget>");
        assert_eq!(nodes.len(), 1);
        let Node::Element(el) = &nodes[0] else {
            panic!("expected element, got {nodes:?}");
        };
        assert_eq!(el.name, "my-widget");
        assert_eq!(el.attrs, vec![("size".to_string(), "2".to_string())]);
        assert_eq!(el.children, vec![Node::Text("Hi".into())]);
    }

    #[test]
    fn fragment_round_trip_is_stable() {
        let html = r#"<div class="a b"><p>One &amp; two</p><img src="x.png"><br></div>"#;
        assert_eq!(to_html(&parse_html_fragment(html)), html);
    }

    #[test]
    fn tag_names_are_lowercased() {
        let nodes = parse_html_fragment("<FOO>X</FOO>");
        assert_eq!(to_html(&nodes), "<foo>X</foo>");
    }

    #[test]
    fn mustache_placeholders_survive_parsing() {
        let html = r#"<label placeholder="{{ 'label.name' | translate }}">{{ x }}</label>"#;
        assert_eq!(to_html(&parse_html_fragment(html)), html);
    }

    #[test]
    fn script_content_not_escaped() {
        let html = "<script>if (a < b && c) {}</script>";
        assert_eq!(to_html(&parse_html_fragment(html)), html);
    }

    #[test]
    fn document_body_extracted() {
        let html = "<html><head><title>t</title></head><body><p>inside</p></body></html>";
        assert_eq!(to_html(&parse_document_body(html)), "<p>inside</p>");
    }

    #[test]
    fn for_each_element_visits_nested() {
        let mut nodes = parse_html_fragment("<div><p><b>x</b></p></div><i></i>");
        let mut seen = Vec::new();
        for_each_element_mut(&mut nodes, &mut |el| seen.push(el.name.clone()));
        assert_eq!(seen, vec!["div", "p", "b", "i"]);
    }

    #[test]
    fn remove_attr_returns_value() {
        let mut el = Element {
            name: "span".into(),
            attrs: vec![("translate".into(), "label.x".into())],
            children: Vec::new(),
        };
        assert_eq!(el.remove_attr("translate").as_deref(), Some("label.x"));
        assert!(!el.has_attr("translate"));
        assert_eq!(el.remove_attr("translate"), None);
    }
}
