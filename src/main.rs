use clap::{Parser, Subcommand};
use static_previews::config::{self, CONFIG_FILE};
use static_previews::generate::{self, Project, RunOptions};
use static_previews::output;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "static-previews")]
#[command(about = "Build static HTML previews of Slim page templates")]
#[command(long_about = "\
Build static HTML previews of Slim page templates

Each page template is compiled to HTML, components and directives are
inlined, translation placeholders are replaced from the locale file, and
the page is written to the output directory as <slug>.html. An index.html
built from the outline links every preview.

Project layout (defaults, all configurable in previews.toml):

  previews.toml                                   # Optional config
  app/assets/javascripts/short-form/
  ├── templates/b2-contact.html.slim              # Page for slug \"contact\"
  ├── components/phone-field.html.slim            # Used as <phone-field>
  └── directives/info-note.html.slim              # Used as <info-note>
  app/assets/json/translations/locale-en.json     # {\"en\": {\"label\": {...}}}
  docs/short-form-pages/short-form-pages.md       # Outline; \"## contact\" = page
  docs/static-preview-assets/
  ├── style.css                                   # Linked from every page
  └── index-template.html                         # Index shell with {{CONTENT}}

Without SLUG arguments, pages are taken from the outline's level-2 headings.

Run 'static-previews gen-config' to generate a documented previews.toml.")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Pages to build (default: every page heading in the outline)
    slugs: Vec<String>,

    /// Project root; relative config paths resolve against it
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Config file (default: <root>/previews.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory, relative to the root
    #[arg(long)]
    output: Option<PathBuf>,

    /// Outline document, relative to the root
    #[arg(long)]
    outline: Option<PathBuf>,

    /// Translation locale
    #[arg(long)]
    locale: Option<String>,

    /// Do not write index.html
    #[arg(long)]
    no_index: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print a stock previews.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    if let Some(Command::GenConfig) = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(ExitCode::SUCCESS);
    }

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.root.join(CONFIG_FILE));
    let mut config = config::load_config(&config_path)?;
    if let Some(output) = cli.output {
        config.paths.output_dir = output;
    }
    if let Some(outline) = cli.outline {
        config.paths.outline = outline;
    }
    if let Some(locale) = cli.locale {
        config.translations.locale = locale;
    }
    config.validate()?;

    let project = Project::new(&cli.root, config);
    let options = RunOptions {
        slugs: cli.slugs,
        skip_index: cli.no_index,
    };
    let report = generate::run(&project, &options)?;
    output::print_run_output(&report);

    Ok(if report.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
