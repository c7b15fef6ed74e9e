//! Shared test utilities for the static-previews test suite.
//!
//! [`setup_project`] writes a small but complete project into a temp
//! directory: page templates, components and directives, a translation
//! file, an outline, and the preview assets. [`ProjectContext`] loads it
//! the way the CLI does.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let project = setup_project();
//! let ctx = ProjectContext::load(project.path());
//! let outcome = ctx.builder().build("contact").unwrap();
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::config::{CONFIG_FILE, PreviewConfig, ResolvedPaths, load_config};
use crate::generate::Project;
use crate::inline::SubTemplateMap;
use crate::page::PageBuilder;
use crate::translate::TranslationTable;

pub const TEMPLATES_DIR: &str = "templates";
pub const COMPONENTS_DIR: &str = "components";
pub const TRANSLATIONS_FILE: &str = "translations/locale-en.json";

const CONFIG: &str = r#"[paths]
templates_dir = "templates"
component_dirs = ["components", "directives"]
outline = "docs/pages.md"

[translations]
file = "translations/locale-en.json"
"#;

const FILES: &[(&str, &str)] = &[
    (
        "templates/b2-contact.html.slim",
        "h1 Contact\nphone-field\n  p Mobile numbers work best.\np {{ 'hint.privacy' | translate }}\n",
    ),
    ("templates/c1-contact.html.slim", "h1 Old contact\n"),
    (
        "templates/a1-welcome.html.slim",
        ".app-card.intro\n  h1 Welcome\n  p Let us get started.\n",
    ),
    (
        "components/phone-field.html.slim",
        ".field\n  label translate=\"label.applicant_phone\" Phone\n  input type=\"tel\"\n  .hint(ng-transclude)\n",
    ),
    ("directives/info-note.html.slim", "aside.note\n  ng-transclude\n"),
    (
        "translations/locale-en.json",
        r#"{"en": {"label": {"applicant_phone": "Your phone"}, "hint": {"privacy": "We keep this private."}}}"#,
    ),
    (
        "docs/pages.md",
        "# Short form\n\n## welcome\n- greets the applicant\n\n## contact / phone\n> asks for a number\n\n## review\nNot built yet.\n",
    ),
    ("docs/static-preview-assets/style.css", "body { margin: 0; }\n"),
    (
        "docs/static-preview-assets/index-template.html",
        "<!DOCTYPE html>\n<html><body><main>{{CONTENT}}</main></body></html>\n",
    ),
];

// =========================================================================
// Fixture setup
// =========================================================================

/// Write the fixture project to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate freely.
pub fn setup_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(CONFIG_FILE), CONFIG).unwrap();
    for (path, content) in FILES {
        write_file(tmp.path(), path, content);
    }
    tmp
}

fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

// =========================================================================
// Loaded project
// =========================================================================

/// Config, paths, components and translations of a fixture project.
pub struct ProjectContext {
    pub config: PreviewConfig,
    pub paths: ResolvedPaths,
    pub components: SubTemplateMap,
    pub table: TranslationTable,
}

impl ProjectContext {
    pub fn load(root: &Path) -> Self {
        let config = load_config(&root.join(CONFIG_FILE)).unwrap();
        let paths = config.resolve_paths(root);
        let (components, _skipped) =
            SubTemplateMap::collect(&paths.component_dirs, &config.templates.extension);
        let table = TranslationTable::load(&paths.translations, &config.translations.locale)
            .unwrap_or_default();
        Self {
            config,
            paths,
            components,
            table,
        }
    }

    pub fn builder(&self) -> PageBuilder<'_> {
        PageBuilder::new(&self.config, &self.paths, &self.components, &self.table)
    }

    pub fn project(&self) -> Project {
        Project {
            config: self.config.clone(),
            paths: self.paths.clone(),
        }
    }
}
