//! # Static Previews
//!
//! Builds browsable static HTML previews of a Slim-templated page flow, so
//! designers and reviewers can look at every page without running the
//! application. Each page template is compiled to HTML, its components are
//! inlined, translation placeholders are resolved from the locale file, and
//! the result is written as a standalone page. An index page, driven by a
//! markdown outline of the flow, links every preview and embeds it in an
//! `<iframe>`.
//!
//! # Architecture
//!
//! ```text
//! page.slim ──compile──▶ HTML ──inline components──▶ ──translate──▶ wrap ──▶ <slug>.html
//!                               ▲                          ▲
//!                  components/ + directives/       locale-en.json
//!
//! outline.md ──classify lines──▶ index.html (links + iframes to existing pages)
//! ```
//!
//! Nothing in a template is evaluated. Interpolations such as `#{name}` and
//! `{{ value }}` stay in the output verbatim; the previews show structure and
//! copy, not data.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`template`] | Slim subset compiler: indentation, tag shorthand, attributes, text blocks |
//! | [`dom`] | Owned HTML tree: parsing with html5ever, serializing back to text |
//! | [`inline`] | Sub-template map and the recursive component inliner |
//! | [`translate`] | Translation table and placeholder substitution |
//! | [`page`] | Template lookup, wrapper check, page shell, writing `<slug>.html` |
//! | [`outline`] | Outline line classification and `index.html` rendering |
//! | [`generate`] | The run: slug discovery, loading, pages, index, run report |
//! | [`config`] | `previews.toml` loading, merging over stock defaults, validation |
//! | [`naming`] | Slug sanitizing and heading-to-slug extraction |
//! | [`output`] | CLI output formatting for run reports |
//!
//! # Design Decisions
//!
//! ## Trees, Not Regexes
//!
//! Component expansion and the `translate` attribute work on a parsed HTML
//! tree ([`dom`]), so nested and repeated custom elements behave the same
//! way a browser would see them. Only the mustache translation form is a
//! plain text substitution, because it can appear anywhere, including inside
//! attribute values.
//!
//! ## Bounded Expansion
//!
//! Components may use other components. Expansion depth is capped
//! (`templates.max_inline_depth`), so a cyclic set of components fails that
//! page with a clear error instead of hanging the run.
//!
//! ## Keep Going
//!
//! A page that is missing or fails to build never stops the run. The report
//! lists every outcome and the process exits non-zero if any page failed.

pub mod config;
pub mod dom;
pub mod generate;
pub mod inline;
pub mod naming;
pub mod outline;
pub mod output;
pub mod page;
pub mod template;
pub mod translate;

#[cfg(test)]
pub(crate) mod test_helpers;
