//! The preview build pipeline.
//!
//! ```text
//! 1. Slugs        CLI arguments, or level-2 headings of the outline
//! 2. Load         translation table (fatal on error) + sub-template map
//! 3. Pages        one <slug>.html per slug with a matching template
//! 4. Index        index.html from the outline, linking the pages that exist
//! ```
//!
//! Everything runs once, in order, on one thread. A missing template skips
//! that page; a page that fails to compile or expand is recorded as failed
//! and the remaining pages are still built. [`run`] returns a
//! [`RunReport`] describing what happened; printing it is left to
//! [`crate::output`].

use crate::config::{PreviewConfig, ResolvedPaths};
use crate::inline::{SkippedTemplate, SubTemplateMap};
use crate::naming::sanitize_slug;
use crate::outline::{self, IndexSources, OutlineError};
use crate::page::{PageBuilder, PageError, PageOutcome, TemplateMatch};
use crate::translate::{TranslationError, TranslationTable};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("No page slugs given and none found in {}", .outline.display())]
    NoSlugs { outline: PathBuf },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),
    #[error("Index error: {0}")]
    Index(#[from] OutlineError),
}

/// A loaded configuration together with its root-resolved paths.
#[derive(Debug, Clone)]
pub struct Project {
    pub config: PreviewConfig,
    pub paths: ResolvedPaths,
}

impl Project {
    pub fn new(root: &Path, config: PreviewConfig) -> Self {
        let paths = config.resolve_paths(root);
        Self { config, paths }
    }
}

/// What to build in one run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Requested slugs; empty means "take them from the outline".
    pub slugs: Vec<String>,
    /// Skip writing `index.html`.
    pub skip_index: bool,
}

/// Where the slug list came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlugSource {
    Arguments,
    /// Scraped from the level-2 headings of this outline file.
    Outline(PathBuf),
}

/// Per-page result.
#[derive(Debug)]
pub enum PageReport {
    Generated {
        slug: String,
        template: TemplateMatch,
        output: PathBuf,
    },
    Missing {
        slug: String,
    },
    Failed {
        slug: String,
        error: PageError,
    },
}

/// Everything a run did, in order.
#[derive(Debug)]
pub struct RunReport {
    pub slug_source: SlugSource,
    /// Number of sub-templates available for inlining.
    pub components: usize,
    pub skipped_components: Vec<SkippedTemplate>,
    pub pages: Vec<PageReport>,
    /// Path of the written index, if one was generated.
    pub index: Option<PathBuf>,
}

impl RunReport {
    pub fn generated(&self) -> usize {
        self.count(|p| matches!(p, PageReport::Generated { .. }))
    }

    pub fn missing(&self) -> usize {
        self.count(|p| matches!(p, PageReport::Missing { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|p| matches!(p, PageReport::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    fn count(&self, pred: impl Fn(&PageReport) -> bool) -> usize {
        self.pages.iter().filter(|p| pred(p)).count()
    }
}

/// Decide which slugs to build.
///
/// CLI slugs are sanitized and de-duplicated; without any, the outline's
/// level-2 headings are used. An empty result is an error.
pub fn resolve_slugs(
    requested: &[String],
    outline: &Path,
) -> Result<(Vec<String>, SlugSource), GenerateError> {
    if !requested.is_empty() {
        let mut slugs: Vec<String> = Vec::new();
        for slug in requested.iter().map(|s| sanitize_slug(s)) {
            if !slug.is_empty() && !slugs.contains(&slug) {
                slugs.push(slug);
            }
        }
        if slugs.is_empty() {
            return Err(GenerateError::NoSlugs {
                outline: outline.to_path_buf(),
            });
        }
        return Ok((slugs, SlugSource::Arguments));
    }

    let slugs = if outline.is_file() {
        outline::collect_slugs(&fs::read_to_string(outline)?)
    } else {
        Vec::new()
    };
    if slugs.is_empty() {
        return Err(GenerateError::NoSlugs {
            outline: outline.to_path_buf(),
        });
    }
    Ok((slugs, SlugSource::Outline(outline.to_path_buf())))
}

/// Run the whole pipeline.
pub fn run(project: &Project, options: &RunOptions) -> Result<RunReport, GenerateError> {
    let config = &project.config;
    let paths = &project.paths;

    let (slugs, slug_source) = resolve_slugs(&options.slugs, &paths.outline)?;

    let table = TranslationTable::load(&paths.translations, &config.translations.locale)?;
    let (components, skipped_components) =
        SubTemplateMap::collect(&paths.component_dirs, &config.templates.extension);

    let builder = PageBuilder::new(config, paths, &components, &table);
    let pages = slugs
        .into_iter()
        .map(|slug| match builder.build(&slug) {
            Ok(PageOutcome::Generated {
                slug,
                template,
                output,
            }) => PageReport::Generated {
                slug,
                template,
                output,
            },
            Ok(PageOutcome::Missing { slug }) => PageReport::Missing { slug },
            Err(error) => PageReport::Failed { slug, error },
        })
        .collect();

    let index = if options.skip_index {
        None
    } else {
        let stylesheet_href = builder.stylesheet_href();
        let template = paths.asset_dir.join(&config.page.index_template);
        outline::generate_index(&IndexSources {
            outline: &paths.outline,
            template: &template,
            output_dir: &paths.output_dir,
            stylesheet_href: &stylesheet_href,
        })?
    };

    Ok(RunReport {
        slug_source,
        components: components.len(),
        skipped_components,
        pages,
        index,
    })
}
