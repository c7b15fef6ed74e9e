//! Slim template renderer.
//!
//! Renders the subset of [Slim](https://slim-template.github.io/) used by
//! page, component and directive templates straight to an HTML string.
//! Nothing is ever evaluated: control code (`-`) is dropped with its block
//! rendered in place, output code (`=`, `==`) and `#{}` interpolation are
//! emitted as literal text, and `{{ }}` client-side expressions pass through
//! untouched for the translator.
//!
//! ## Line Indicators
//!
//! | Indicator | Meaning |
//! |-----------|---------|
//! | `\|`, `'` | Verbatim text (`'` adds a trailing space) |
//! | `<`       | Raw HTML line |
//! | `/`, `/!` | Code comment (dropped), HTML comment |
//! | `-`       | Control code (dropped, block kept) |
//! | `=`, `==` | Output code (emitted literally, escaped / raw) |
//! | `doctype` | Document type declaration |
//! | `javascript:`, `css:`, `ruby:` | Embedded engines |
//!
//! Anything else is a tag line: `tag#id.class(attr="v") text`, with `.class`
//! and `#id` alone implying `div`, `tag: nested` inline nesting, and a
//! trailing `/` for self-closing tags.

use super::TemplateError;
use crate::dom::{escape_attr, escape_text};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Render Slim source to HTML.
pub fn render(source: &str) -> Result<String, TemplateError> {
    let lines = source
        .lines()
        .enumerate()
        .filter(|(_, raw)| !raw.trim().is_empty())
        .map(|(idx, raw)| {
            let raw = raw.trim_end();
            let text = raw.trim_start();
            Line {
                number: idx + 1,
                indent: raw.len() - text.len(),
                raw,
                text,
            }
        })
        .collect();

    let mut renderer = Renderer {
        lines,
        pos: 0,
        out: String::with_capacity(source.len() * 2),
    };
    renderer.render_block(None)?;
    Ok(renderer.out)
}

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    number: usize,
    indent: usize,
    raw: &'a str,
    text: &'a str,
}

struct Renderer<'a> {
    lines: Vec<Line<'a>>,
    pos: usize,
    out: String,
}

impl<'a> Renderer<'a> {
    /// Next line if it is nested deeper than `parent`.
    fn peek_child(&self, parent: Option<usize>) -> Option<Line<'a>> {
        let line = *self.lines.get(self.pos)?;
        match parent {
            Some(indent) if line.indent <= indent => None,
            _ => Some(line),
        }
    }

    fn render_block(&mut self, parent: Option<usize>) -> Result<(), TemplateError> {
        let Some(first) = self.peek_child(parent) else {
            return Ok(());
        };
        while let Some(line) = self.peek_child(parent) {
            if line.indent != first.indent {
                return Err(syntax(line.number, "malformed indentation"));
            }
            self.pos += 1;
            self.render_line(line)?;
        }
        Ok(())
    }

    fn skip_block(&mut self, parent: usize) {
        while self.peek_child(Some(parent)).is_some() {
            self.pos += 1;
        }
    }

    /// Consume the block under `parent` as text lines joined by newlines.
    fn text_continuation(&mut self, parent: usize) -> String {
        let mut text = String::new();
        while let Some(line) = self.peek_child(Some(parent)) {
            self.pos += 1;
            text.push('\n');
            text.push_str(line.text);
        }
        text
    }

    fn render_line(&mut self, line: Line<'a>) -> Result<(), TemplateError> {
        let text = line.text;

        if let Some(rest) = text.strip_prefix("/!") {
            let mut comment = strip_one_space(rest).to_string();
            comment.push_str(&self.text_continuation(line.indent));
            self.out.push_str("<!--");
            self.out.push_str(&comment);
            self.out.push_str("-->");
        } else if text.starts_with('/') {
            self.skip_block(line.indent);
        } else if let Some(rest) = text.strip_prefix('|') {
            self.out.push_str(strip_one_space(rest));
            let more = self.text_continuation(line.indent);
            self.out.push_str(&more);
        } else if let Some(rest) = text.strip_prefix('\'') {
            self.out.push_str(strip_one_space(rest));
            let more = self.text_continuation(line.indent);
            self.out.push_str(&more);
            self.out.push(' ');
        } else if text.starts_with('<') {
            self.out.push_str(text);
            self.render_block(Some(line.indent))?;
        } else if text.starts_with('-') {
            self.render_block(Some(line.indent))?;
        } else if text.starts_with('=') {
            self.push_output(text);
            self.render_block(Some(line.indent))?;
        } else if let Some(value) = doctype(text) {
            self.out.push_str("<!DOCTYPE ");
            self.out.push_str(value);
            self.out.push('>');
        } else if let Some(engine) = embedded_engine(text) {
            self.render_embedded(line, engine);
        } else {
            self.render_tag_line(line)?;
        }
        Ok(())
    }

    /// Emit `= expr` / `== expr` as literal text, never evaluated.
    fn push_output(&mut self, text: &str) {
        let (raw, expr) = match text.strip_prefix("==") {
            Some(rest) => (true, rest),
            None => (false, &text[1..]),
        };
        let expr = expr.trim_start_matches(['<', '>', '\'']).trim();
        if raw {
            self.out.push_str(expr);
        } else {
            self.out.push_str(&escape_text(expr));
        }
    }

    fn render_embedded(&mut self, line: Line<'a>, engine: &str) {
        let mut body = Vec::new();
        let mut strip = None;
        while let Some(child) = self.peek_child(Some(line.indent)) {
            self.pos += 1;
            let strip = *strip.get_or_insert(child.indent);
            body.push(dedent(child.raw, strip));
        }
        let body = body.join("\n");
        match engine {
            "javascript" => {
                self.out.push_str("<script>");
                self.out.push_str(&body);
                self.out.push_str("</script>");
            }
            "css" => {
                self.out.push_str("<style>");
                self.out.push_str(&body);
                self.out.push_str("</style>");
            }
            _ => {}
        }
    }

    fn render_tag_line(&mut self, line: Line<'a>) -> Result<(), TemplateError> {
        // Attribute wrappers may continue on following lines.
        let mut logical = line.text.to_string();
        let head = loop {
            match parse_tag_head(&logical) {
                Ok(head) => break head,
                Err(HeadError::Incomplete) => {
                    let Some(next) = self.lines.get(self.pos) else {
                        return Err(syntax(line.number, "unterminated attribute wrapper"));
                    };
                    self.pos += 1;
                    logical.push(' ');
                    logical.push_str(next.text);
                }
                Err(HeadError::Invalid(message)) => return Err(syntax(line.number, &message)),
            }
        };
        self.emit_tag(head, line)
    }

    fn emit_tag(&mut self, head: TagHead, line: Line<'a>) -> Result<(), TemplateError> {
        let is_void = VOID_ELEMENTS.contains(&head.name.as_str());

        if head.leading_space {
            self.out.push(' ');
        }
        self.out.push('<');
        self.out.push_str(&head.name);
        self.out.push_str(&head.render_attrs());
        self.out.push('>');

        match head.content {
            _ if is_void => {
                if !matches!(head.content, Content::Empty | Content::SelfClosing)
                    || self.peek_child(Some(line.indent)).is_some()
                {
                    return Err(syntax(
                        line.number,
                        &format!("void element <{}> cannot have content", head.name),
                    ));
                }
            }
            Content::Empty => self.render_block(Some(line.indent))?,
            Content::SelfClosing => {}
            Content::Text(text) => {
                self.out.push_str(&text);
                let more = self.text_continuation(line.indent);
                self.out.push_str(&more);
            }
            Content::Output(expr) => {
                self.push_output(&expr);
                self.render_block(Some(line.indent))?;
            }
            Content::Nested(rest) => {
                let nested = parse_tag_head(&rest).map_err(|err| match err {
                    HeadError::Incomplete => {
                        syntax(line.number, "unterminated attribute wrapper in nested tag")
                    }
                    HeadError::Invalid(message) => syntax(line.number, &message),
                })?;
                self.emit_tag(nested, line)?;
            }
        }

        if !is_void {
            self.out.push_str("</");
            self.out.push_str(&head.name);
            self.out.push('>');
        }
        if head.trailing_space {
            self.out.push(' ');
        }
        Ok(())
    }
}

fn syntax(line: usize, message: &str) -> TemplateError {
    TemplateError::Syntax {
        line,
        message: message.to_string(),
    }
}

/// Drop leading whitespace up to `width` bytes, stopping at a character
/// that would cross it.
fn dedent(raw: &str, width: usize) -> &str {
    let cut = raw
        .char_indices()
        .find(|&(idx, ch)| !ch.is_whitespace() || idx + ch.len_utf8() > width)
        .map_or(raw.len(), |(idx, _)| idx);
    &raw[cut..]
}

fn strip_one_space(text: &str) -> &str {
    text.strip_prefix(' ').unwrap_or(text)
}

fn doctype(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("doctype")?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    match rest.trim() {
        "" | "html" | "5" => Some("html"),
        other => Some(other),
    }
}

fn embedded_engine(text: &str) -> Option<&str> {
    let name = text.strip_suffix(':')?;
    matches!(name, "javascript" | "css" | "ruby").then_some(name)
}

// ============================================================================
// Tag line parsing
// ============================================================================

#[derive(Debug, PartialEq)]
enum HeadError {
    /// An attribute wrapper is still open at the end of the text.
    Incomplete,
    Invalid(String),
}

#[derive(Debug, PartialEq)]
enum Content {
    Empty,
    SelfClosing,
    Text(String),
    Output(String),
    Nested(String),
}

#[derive(Debug, PartialEq)]
struct TagHead {
    name: String,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
    leading_space: bool,
    trailing_space: bool,
    content: Content,
}

impl TagHead {
    fn render_attrs(&self) -> String {
        let mut out = String::new();
        let mut classes = self.classes.clone();
        let mut id = self.id.clone();
        for (key, value) in &self.attrs {
            match (key.as_str(), value) {
                ("class", Some(value)) => classes.push(value.clone()),
                ("id", Some(value)) => id = Some(value.clone()),
                _ => {}
            }
        }
        if let Some(id) = id {
            out.push_str(&format!(" id=\"{}\"", escape_attr(&id)));
        }
        if !classes.is_empty() {
            out.push_str(&format!(" class=\"{}\"", escape_attr(&classes.join(" "))));
        }
        for (key, value) in &self.attrs {
            match (key.as_str(), value) {
                ("class" | "id", Some(_)) => {}
                (_, Some(value)) => out.push_str(&format!(" {key}=\"{}\"", escape_attr(value))),
                (_, None) => {
                    out.push(' ');
                    out.push_str(key);
                }
            }
        }
        out
    }
}

struct Cursor<'s> {
    text: &'s str,
    pos: usize,
}

impl<'s> Cursor<'s> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.text[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn rest(&self) -> &'s str {
        &self.text[self.pos..]
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'s str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.text[start..self.pos]
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

fn is_bare_attr_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || matches!(ch, '_' | '@' | ':')
}

fn is_bare_attr_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '@' | ':' | '.' | '-')
}

fn closing_for(open: char) -> Option<char> {
    match open {
        '(' => Some(')'),
        '[' => Some(']'),
        '{' => Some('}'),
        _ => None,
    }
}

fn parse_tag_head(text: &str) -> Result<TagHead, HeadError> {
    let mut cur = Cursor { text, pos: 0 };

    let name = match cur.peek() {
        Some('#' | '.') => "div".to_string(),
        Some(ch) if ch.is_ascii_alphabetic() => parse_tag_name(&mut cur),
        _ => return Err(HeadError::Invalid("unknown line indicator".into())),
    };

    let mut head = TagHead {
        name,
        id: None,
        classes: Vec::new(),
        attrs: Vec::new(),
        leading_space: false,
        trailing_space: false,
        content: Content::Empty,
    };

    while let Some(marker @ ('#' | '.')) = cur.peek() {
        cur.bump();
        let ident = cur.take_while(is_ident_char);
        if ident.is_empty() {
            return Err(HeadError::Invalid(format!("empty {marker} shortcut")));
        }
        if marker == '#' {
            head.id = Some(ident.to_string());
        } else {
            head.classes.push(ident.to_string());
        }
    }

    while let Some(modifier @ ('<' | '>')) = cur.peek() {
        cur.bump();
        if modifier == '<' {
            head.leading_space = true;
        } else {
            head.trailing_space = true;
        }
    }

    match cur.peek().and_then(closing_for) {
        Some(close) => {
            cur.bump();
            parse_wrapped_attrs(&mut cur, close, &mut head.attrs)?;
        }
        None => parse_bare_attrs(&mut cur, &mut head.attrs)?,
    }

    head.content = parse_content(cur.rest())?;
    Ok(head)
}

/// Tag names allow `:` only between name characters, so `li: a` nests.
fn parse_tag_name(cur: &mut Cursor<'_>) -> String {
    let mut name = String::new();
    loop {
        name.push_str(cur.take_while(is_ident_char));
        match (cur.peek(), cur.peek_nth(1)) {
            (Some(':'), Some(next)) if next.is_ascii_alphanumeric() => {
                cur.bump();
                name.push(':');
            }
            _ => break,
        }
    }
    name
}

fn parse_content(rest: &str) -> Result<Content, HeadError> {
    let trimmed = rest.trim_start();
    if rest.is_empty() {
        return Ok(Content::Empty);
    }
    if let Some(nested) = trimmed.strip_prefix(':') {
        let nested = nested.trim_start();
        return Ok(if nested.is_empty() {
            Content::Empty
        } else {
            Content::Nested(nested.to_string())
        });
    }
    if trimmed == "/" {
        return Ok(Content::SelfClosing);
    }
    if trimmed.starts_with('=') {
        return Ok(Content::Output(trimmed.to_string()));
    }
    match rest.strip_prefix(' ') {
        Some(text) if text.trim().is_empty() => Ok(Content::Empty),
        Some(text) => Ok(Content::Text(text.to_string())),
        None => Err(HeadError::Invalid(format!("unexpected text after tag: {rest}"))),
    }
}

/// `name="value"` pairs directly after the tag, separated by spaces.
fn parse_bare_attrs(
    cur: &mut Cursor<'_>,
    attrs: &mut Vec<(String, Option<String>)>,
) -> Result<(), HeadError> {
    loop {
        let save = cur.pos;
        cur.skip_whitespace();
        if !cur.peek().is_some_and(is_bare_attr_start) {
            cur.pos = save;
            return Ok(());
        }
        let name = cur.take_while(is_bare_attr_char);
        if cur.peek() != Some('=') {
            cur.pos = save;
            return Ok(());
        }
        cur.bump();
        if cur.peek() == Some('=') {
            cur.bump();
        }
        let value = match cur.peek() {
            Some(quote @ ('"' | '\'')) => {
                cur.bump();
                parse_quoted(cur, quote)
                    .ok_or_else(|| HeadError::Invalid(format!("unterminated quote in {name}")))?
            }
            _ => parse_unquoted(cur, None),
        };
        attrs.push((name.to_string(), Some(value)));
    }
}

/// Attributes inside `( )`, `[ ]` or `{ }`; boolean attributes allowed.
fn parse_wrapped_attrs(
    cur: &mut Cursor<'_>,
    close: char,
    attrs: &mut Vec<(String, Option<String>)>,
) -> Result<(), HeadError> {
    loop {
        cur.skip_whitespace();
        match cur.peek() {
            None => return Err(HeadError::Incomplete),
            Some(ch) if ch == close => {
                cur.bump();
                return Ok(());
            }
            _ => {}
        }
        let name = cur.take_while(|ch| {
            !ch.is_whitespace() && ch != '=' && ch != close && ch != '"' && ch != '\''
        });
        if name.is_empty() {
            return Err(HeadError::Invalid("malformed attribute".into()));
        }
        let name = name.to_string();
        let save = cur.pos;
        cur.skip_whitespace();
        if cur.peek() != Some('=') {
            cur.pos = save;
            attrs.push((name, None));
            continue;
        }
        cur.bump();
        if cur.peek() == Some('=') {
            cur.bump();
        }
        cur.skip_whitespace();
        let value = match cur.peek() {
            None => return Err(HeadError::Incomplete),
            Some(quote @ ('"' | '\'')) => {
                cur.bump();
                parse_quoted(cur, quote).ok_or(HeadError::Incomplete)?
            }
            _ => parse_unquoted(cur, Some(close)),
        };
        attrs.push((name, Some(value)));
    }
}

fn parse_quoted(cur: &mut Cursor<'_>, quote: char) -> Option<String> {
    let mut value = String::new();
    loop {
        match cur.bump()? {
            '\\' => match cur.bump()? {
                ch if ch == quote => value.push(ch),
                ch => {
                    value.push('\\');
                    value.push(ch);
                }
            },
            ch if ch == quote => return Some(value),
            ch => value.push(ch),
        }
    }
}

/// Unquoted values run to whitespace, keeping brackets balanced.
fn parse_unquoted(cur: &mut Cursor<'_>, close: Option<char>) -> String {
    let mut depth = 0usize;
    let mut value = String::new();
    while let Some(ch) = cur.peek() {
        if depth == 0 && (ch.is_whitespace() || Some(ch) == close) {
            break;
        }
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
        value.push(ch);
        cur.bump();
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slim(source: &str) -> String {
        render(source).unwrap()
    }

    #[test]
    fn nested_tags_by_indentation() {
        let html = slim("div\n  p\n    | Hello\n  p World");
        assert_eq!(html, "<div><p>Hello</p><p>World</p></div>");
    }

    #[test]
    fn class_and_id_shortcuts() {
        assert_eq!(
            slim(".app-card#main.wide"),
            r#"<div id="main" class="app-card wide"></div>"#
        );
        assert_eq!(slim("span.label"), r#"<span class="label"></span>"#);
    }

    #[test]
    fn shortcut_and_attribute_classes_merge() {
        assert_eq!(
            slim(r#"p.lead class="big""#),
            r#"<p class="lead big"></p>"#
        );
    }

    #[test]
    fn bare_attributes_then_text() {
        assert_eq!(
            slim(r#"a href="/x" title='T' Go there"#),
            r#"<a href="/x" title="T">Go there</a>"#
        );
    }

    #[test]
    fn wrapped_attributes_with_boolean() {
        assert_eq!(
            slim(r#"input(type="checkbox" ng-model="form.ok" required)"#),
            r#"<input type="checkbox" ng-model="form.ok" required>"#
        );
    }

    #[test]
    fn wrapped_attributes_span_lines() {
        let html = slim("button(type=\"submit\"\n  ng-click=\"save()\") Save");
        assert_eq!(
            html,
            r#"<button type="submit" ng-click="save()">Save</button>"#
        );
    }

    #[test]
    fn unquoted_values_keep_balanced_brackets() {
        assert_eq!(
            slim("a(ng-click=go(1, 2)) x"),
            r#"<a ng-click="go(1, 2)">x</a>"#
        );
        assert_eq!(
            slim("a(ng-click=go(1,2)) x"),
            r#"<a ng-click="go(1,2)">x</a>"#
        );
    }

    #[test]
    fn inline_nesting() {
        assert_eq!(
            slim(r##"li: a href="#" Link"##),
            r##"<li><a href="#">Link</a></li>"##
        );
    }

    #[test]
    fn void_elements_have_no_closing_tag() {
        assert_eq!(slim(r#"img src="a.png""#), r#"<img src="a.png">"#);
        assert_eq!(slim("br"), "<br>");
    }

    #[test]
    fn self_closing_marker() {
        assert_eq!(slim("span.icon /"), r#"<span class="icon"></span>"#);
    }

    #[test]
    fn void_element_with_content_is_error() {
        let err = render("img\n  p x").unwrap_err();
        assert!(matches!(err, TemplateError::Syntax { line: 1, .. }));
    }

    #[test]
    fn comments() {
        assert_eq!(slim("/ hidden\n  p nope\np yes"), "<p>yes</p>");
        assert_eq!(slim("/! visible"), "<!--visible-->");
    }

    #[test]
    fn control_code_dropped_block_kept() {
        assert_eq!(slim("- if user\n  p Hi\n- else\n  p Bye"), "<p>Hi</p><p>Bye</p>");
    }

    #[test]
    fn output_code_is_literal() {
        assert_eq!(slim("p = user.name"), "<p>user.name</p>");
        assert_eq!(slim("= a < b"), "a &lt; b");
        assert_eq!(slim("== '<b>'"), "'<b>'");
    }

    #[test]
    fn interpolation_left_unevaluated() {
        assert_eq!(slim("p Hello #{name}"), "<p>Hello #{name}</p>");
    }

    #[test]
    fn angular_expressions_untouched() {
        assert_eq!(
            slim("label {{ 'label.first_name' | translate }}"),
            "<label>{{ 'label.first_name' | translate }}</label>"
        );
    }

    #[test]
    fn text_block_continuation() {
        assert_eq!(slim("p\n  | one\n    two"), "<p>one\ntwo</p>");
        assert_eq!(slim("p\n  ' spaced"), "<p>spaced </p>");
    }

    #[test]
    fn raw_html_line() {
        assert_eq!(slim("div\n  <hr class=\"x\">"), "<div><hr class=\"x\"></div>");
    }

    #[test]
    fn doctype_and_document() {
        assert_eq!(
            slim("doctype html\nhtml\n  body\n    p x"),
            "<!DOCTYPE html><html><body><p>x</p></body></html>"
        );
    }

    #[test]
    fn embedded_javascript() {
        assert_eq!(
            slim("javascript:\n  var a = 1;\n    nested();"),
            "<script>var a = 1;\n  nested();</script>"
        );
    }

    #[test]
    fn embedded_body_with_wide_whitespace() {
        assert_eq!(
            slim("javascript:\n  a();\n\u{3000}b();"),
            "<script>a();\n\u{3000}b();</script>"
        );
        assert_eq!(
            slim("css:\n\u{3000}p {}\n\u{3000}\u{3000}a {}"),
            "<style>p {}\n\u{3000}a {}</style>"
        );
    }

    #[test]
    fn custom_elements_and_transclusion_attribute() {
        assert_eq!(
            slim("my-widget\n  div(ng-transclude)"),
            "<my-widget><div ng-transclude></div></my-widget>"
        );
        assert_eq!(
            slim("ng-transclude"),
            "<ng-transclude></ng-transclude>"
        );
    }

    #[test]
    fn whitespace_modifiers() {
        assert_eq!(slim("a> x\nb y"), "<a>x</a> <b>y</b>");
    }

    #[test]
    fn malformed_indentation_is_error() {
        let err = render("div\n    p a\n  p b").unwrap_err();
        assert!(matches!(err, TemplateError::Syntax { line: 3, .. }));
    }

    #[test]
    fn unterminated_wrapper_is_error() {
        let err = render("a(href=\"x\"").unwrap_err();
        assert!(matches!(err, TemplateError::Syntax { line: 1, .. }));
    }

    #[test]
    fn unknown_line_indicator_is_error() {
        let err = render("div\n  {{ oops }}").unwrap_err();
        assert!(matches!(err, TemplateError::Syntax { line: 2, .. }));
    }
}
