//! Preview configuration.
//!
//! Handles loading, validating, and merging `previews.toml`. Stock defaults
//! describe the standard project layout; a `previews.toml` in the project
//! root overrides any subset of them, and CLI flags override both.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [paths]
//! templates_dir = "app/assets/javascripts/short-form/templates"
//! component_dirs = [
//!     "app/assets/javascripts/short-form/components",
//!     "app/assets/javascripts/short-form/directives",
//! ]
//! output_dir = "docs/previews"
//! asset_dir = "docs/static-preview-assets"
//! outline = "docs/short-form-pages/short-form-pages.md"
//!
//! [templates]
//! extension = ".html.slim"      # Sub-template files (tag = name minus extension)
//! page_extension = ".slim"      # Page template match suffix
//! max_inline_depth = 32         # Nesting limit for sub-template expansion
//!
//! [translations]
//! file = "app/assets/json/translations/locale-en.json"
//! locale = "en"
//!
//! [page]
//! wrapper_class = "app-card"
//! stylesheet = "style.css"               # Inside asset_dir
//! index_template = "index-template.html" # Inside asset_dir
//! ```
//!
//! Relative paths are resolved against the project root. Unknown keys are
//! rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config filename, looked up in the project root.
pub const CONFIG_FILE: &str = "previews.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Preview configuration loaded from `previews.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewConfig {
    /// Input and output locations.
    pub paths: PathsConfig,
    /// Template discovery and expansion settings.
    pub templates: TemplatesConfig,
    /// Translation source and locale.
    pub translations: TranslationsConfig,
    /// Generated page shell settings.
    pub page: PageConfig,
}

impl PreviewConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.templates.extension.is_empty() || self.templates.page_extension.is_empty() {
            return Err(ConfigError::Validation(
                "templates.extension and templates.page_extension must not be empty".into(),
            ));
        }
        if self.templates.max_inline_depth == 0 {
            return Err(ConfigError::Validation(
                "templates.max_inline_depth must be at least 1".into(),
            ));
        }
        if self.translations.locale.trim().is_empty() {
            return Err(ConfigError::Validation(
                "translations.locale must not be empty".into(),
            ));
        }
        if self.page.wrapper_class.split_ascii_whitespace().count() != 1 {
            return Err(ConfigError::Validation(
                "page.wrapper_class must be a single class name".into(),
            ));
        }
        Ok(())
    }

    /// Resolve every configured path against the project root.
    pub fn resolve_paths(&self, root: &Path) -> ResolvedPaths {
        let join = |p: &Path| root.join(p);
        ResolvedPaths {
            templates_dir: join(&self.paths.templates_dir),
            component_dirs: self.paths.component_dirs.iter().map(|d| join(d.as_path())).collect(),
            output_dir: join(&self.paths.output_dir),
            asset_dir: join(&self.paths.asset_dir),
            outline: join(&self.paths.outline),
            translations: join(&self.translations.file),
        }
    }
}

/// Input and output locations, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Directory searched (non-recursively) for page templates.
    pub templates_dir: PathBuf,
    /// Directories walked recursively for sub-templates, later ones winning.
    pub component_dirs: Vec<PathBuf>,
    /// Where `<slug>.html` and `index.html` are written.
    pub output_dir: PathBuf,
    /// Holds the stylesheet and the optional index template.
    pub asset_dir: PathBuf,
    /// Markdown outline driving slug discovery and the index page.
    pub outline: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            templates_dir: "app/assets/javascripts/short-form/templates".into(),
            component_dirs: vec![
                "app/assets/javascripts/short-form/components".into(),
                "app/assets/javascripts/short-form/directives".into(),
            ],
            output_dir: "docs/previews".into(),
            asset_dir: "docs/static-preview-assets".into(),
            outline: "docs/short-form-pages/short-form-pages.md".into(),
        }
    }
}

/// Template discovery and expansion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatesConfig {
    /// Suffix of sub-template files; stripped to get the tag name.
    pub extension: String,
    /// Suffix a page template filename must end with.
    pub page_extension: String,
    /// Maximum sub-template nesting before expansion is aborted.
    pub max_inline_depth: usize,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            extension: ".html.slim".into(),
            page_extension: ".slim".into(),
            max_inline_depth: 32,
        }
    }
}

/// Translation source and locale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslationsConfig {
    /// JSON file keyed by locale.
    pub file: PathBuf,
    /// Locale section used for lookups.
    pub locale: String,
}

impl Default for TranslationsConfig {
    fn default() -> Self {
        Self {
            file: "app/assets/json/translations/locale-en.json".into(),
            locale: "en".into(),
        }
    }
}

/// Generated page shell settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageConfig {
    /// Class of the container every page body is wrapped in.
    pub wrapper_class: String,
    /// Stylesheet filename inside the asset directory.
    pub stylesheet: String,
    /// Index template filename inside the asset directory.
    pub index_template: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            wrapper_class: "app-card".into(),
            stylesheet: "style.css".into(),
            index_template: "index-template.html".into(),
        }
    }
}

/// Config paths joined onto the project root.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPaths {
    pub templates_dir: PathBuf,
    pub component_dirs: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub asset_dir: PathBuf,
    pub outline: PathBuf,
    pub translations: PathBuf,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Overlay `overlay` onto `base`, the way a `previews.toml` overrides the
/// stock defaults.
///
/// Tables merge key-by-key, so `[page] stylesheet = "x.css"` keeps the stock
/// wrapper class. Arrays and scalars replace: setting `component_dirs` drops
/// both stock directories.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Build a validated config from the stock defaults plus an optional
/// user overlay.
pub fn config_from_overlay(overlay: Option<toml::Value>) -> Result<PreviewConfig, ConfigError> {
    let stock = toml::Value::try_from(PreviewConfig::default())?;
    let merged = match overlay {
        Some(overlay) => merge_toml(stock, overlay),
        None => stock,
    };
    let config: PreviewConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `previews.toml` from `path` over the stock defaults.
///
/// The file is optional: a project following the stock layout needs none.
pub fn load_config(path: &Path) -> Result<PreviewConfig, ConfigError> {
    let overlay = if path.exists() {
        Some(toml::from_str::<toml::Value>(&fs::read_to_string(path)?)?)
    } else {
        None
    };
    config_from_overlay(overlay)
}

/// Returns a fully-commented stock `previews.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Static Previews Configuration
# =============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Relative paths are resolved against
# the project root (--root). Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Locations
# ---------------------------------------------------------------------------
[paths]
# Page templates. Searched non-recursively for files whose name contains
# the slug; the lexically first match wins.
templates_dir = "app/assets/javascripts/short-form/templates"

# Component and directive templates, walked recursively. Each file becomes
# a custom tag (address-form.html.slim -> <address-form>). Later directories
# override earlier ones when two files share a tag name.
component_dirs = [
    "app/assets/javascripts/short-form/components",
    "app/assets/javascripts/short-form/directives",
]

# Generated <slug>.html files and index.html.
output_dir = "docs/previews"

# Stylesheet and optional index template.
asset_dir = "docs/static-preview-assets"

# Markdown outline. Level-2 headings name the pages to build when no slugs
# are given on the command line, and the whole file renders as index.html.
outline = "docs/short-form-pages/short-form-pages.md"

# ---------------------------------------------------------------------------
# Templates
# ---------------------------------------------------------------------------
[templates]
# Suffix of sub-template files.
extension = ".html.slim"

# Suffix a page template filename must end with.
page_extension = ".slim"

# Sub-templates nested deeper than this abort the page (catches cycles).
max_inline_depth = 32

# ---------------------------------------------------------------------------
# Translations
# ---------------------------------------------------------------------------
[translations]
# JSON object keyed by locale: { "en": { "label": { "name": "Name" } } }
file = "app/assets/json/translations/locale-en.json"

# Locale section used for lookups.
locale = "en"

# ---------------------------------------------------------------------------
# Page shell
# ---------------------------------------------------------------------------
[page]
# Every page body is wrapped in <div class="..."> unless it already starts
# with one.
wrapper_class = "app-card"

# Stylesheet inside asset_dir, linked from every page.
stylesheet = "style.css"

# Index template inside asset_dir. Its {{CONTENT}} placeholder receives the
# rendered outline. A minimal shell is used when the file is missing.
index_template = "index-template.html"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = PreviewConfig::default();
        assert_eq!(config.paths.output_dir, PathBuf::from("docs/previews"));
        assert_eq!(config.paths.component_dirs.len(), 2);
        assert_eq!(config.templates.extension, ".html.slim");
        assert_eq!(config.templates.max_inline_depth, 32);
        assert_eq!(config.translations.locale, "en");
        assert_eq!(config.page.wrapper_class, "app-card");
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[translations]
locale = "es"
"#;
        let config: PreviewConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.translations.locale, "es");
        // Defaults preserved
        assert_eq!(
            config.translations.file,
            PathBuf::from("app/assets/json/translations/locale-en.json")
        );
        assert_eq!(config.page.stylesheet, "style.css");
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.paths.asset_dir, PathBuf::from("docs/static-preview-assets"));
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(
            &path,
            r#"
[paths]
output_dir = "out"
component_dirs = ["widgets"]

[page]
wrapper_class = "card"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.paths.output_dir, PathBuf::from("out"));
        assert_eq!(config.paths.component_dirs, vec![PathBuf::from("widgets")]);
        assert_eq!(config.page.wrapper_class, "card");
        // Unspecified values should be defaults
        assert_eq!(config.templates.page_extension, ".slim");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(&path, "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(&path, "[page]\nwraper_class = \"typo\"\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn zero_depth_rejected() {
        let overlay: toml::Value = toml::from_str("[templates]\nmax_inline_depth = 0").unwrap();
        let result = config_from_overlay(Some(overlay));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn multi_word_wrapper_class_rejected() {
        let overlay: toml::Value = toml::from_str("[page]\nwrapper_class = \"a b\"").unwrap();
        let result = config_from_overlay(Some(overlay));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str("[page]\nstylesheet = \"a.css\"\nwrapper_class = \"x\"").unwrap();
        let overlay: toml::Value = toml::from_str("[page]\nstylesheet = \"b.css\"").unwrap();
        let merged = merge_toml(base, overlay);
        let page = merged.get("page").unwrap();
        assert_eq!(page.get("stylesheet").unwrap().as_str(), Some("b.css"));
        assert_eq!(page.get("wrapper_class").unwrap().as_str(), Some("x"));
    }

    #[test]
    fn merge_toml_arrays_replaced_not_appended() {
        let overlay: toml::Value = toml::from_str("[paths]\ncomponent_dirs = [\"only\"]").unwrap();
        let config = config_from_overlay(Some(overlay)).unwrap();
        assert_eq!(config.paths.component_dirs, vec![PathBuf::from("only")]);
    }

    #[test]
    fn resolve_paths_joins_root() {
        let config = PreviewConfig::default();
        let paths = config.resolve_paths(Path::new("/project"));
        assert_eq!(paths.output_dir, PathBuf::from("/project/docs/previews"));
        assert_eq!(
            paths.translations,
            PathBuf::from("/project/app/assets/json/translations/locale-en.json")
        );
        assert_eq!(paths.component_dirs.len(), 2);
    }

    #[test]
    fn stock_config_toml_parses_to_defaults() {
        let config: PreviewConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = PreviewConfig::default();
        assert_eq!(config.paths.outline, defaults.paths.outline);
        assert_eq!(config.paths.component_dirs, defaults.paths.component_dirs);
        assert_eq!(config.templates.max_inline_depth, defaults.templates.max_inline_depth);
        assert_eq!(config.page.index_template, defaults.page.index_template);
    }
}
