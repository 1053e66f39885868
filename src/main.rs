use clap::{Parser, Subcommand};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use sinal_verde::{config, output, site};
use std::path::{Path, PathBuf};

/// Shared flags for commands that render pages.
#[derive(clap::Args, Clone)]
struct RenderArgs {
    /// Production build: also emit Netlify _redirects and _headers
    #[arg(long)]
    production: bool,

    /// Report unresolved {{placeholders}} and log at debug level
    #[arg(long)]
    debug: bool,
}

#[derive(Parser)]
#[command(name = "sinal-verde")]
#[command(about = "Multilingual static site generator for the Sinal Verde site")]
#[command(long_about = "\
Multilingual static site generator for the Sinal Verde site

Every page is rendered once per configured language from the same template.
Internal links get a /{lang} prefix and the language selector is pointed at
the current page in each language.

Project structure:

  .
  ├── config.toml                  # Optional, overrides stock defaults
  ├── templates/
  │   ├── index.html               # Root pages → dist/{lang}/index.html, …
  │   ├── blog.html                # → dist/{lang}/blog/index.html
  │   ├── artigo.html              # One per post → dist/{lang}/blog/{id}.html
  │   └── segmentos/*.html         # → dist/{lang}/segmentos/…
  ├── lang/{pt,en,es}.json         # UI strings per language
  ├── content/
  │   ├── segments.json            # Segment landing-page content
  │   ├── other-data.json
  │   ├── privacy-policy.json
  │   └── blog/*.json              # One post per file, all languages inside
  └── assets/                      # Copied verbatim to dist/assets/

Templates use {{name}}, {{{raw}}}, {{#if x}}…{{else}}…{{/if}} and
{{#each list}}…{{@index}}…{{/each}}.

Run 'sinal-verde gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Project root
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Output directory (default: paths.dist from the config)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Config file (default: config.toml in the project root)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render every page and write the site
    Build(RenderArgs),
    /// Render every page in memory and report, without writing
    Check(RenderArgs),
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Build(args) => {
            let site_config = load_site_config(&cli.root, cli.config.as_deref(), &args)?;
            init_logging(log_level(&site_config.build))?;
            init_thread_pool(&site_config.build);
            println!("==> Building {}", cli.root.display());
            let report = site::build(
                &cli.root,
                &site_config,
                cli.output.as_deref(),
                chrono::Utc::now(),
            )?;
            output::print_build_report(&report);
        }
        Command::Check(args) => {
            let site_config = load_site_config(&cli.root, cli.config.as_deref(), &args)?;
            init_logging(log_level(&site_config.build))?;
            init_thread_pool(&site_config.build);
            println!("==> Checking {}", cli.root.display());
            let report = site::check(&cli.root, &site_config, chrono::Utc::now())?;
            output::print_build_report(&report);
            if report.skipped() == 0 {
                println!("==> All pages render");
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn init_logging(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    SimpleLogger::new().with_level(level).init()
}

/// Debug logging follows `build.debug` after CLI flags are merged in.
fn log_level(build: &config::BuildConfig) -> LevelFilter {
    if build.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Config from `--config` or the project root, with CLI flags switched on top.
fn load_site_config(
    root: &Path,
    config_path: Option<&Path>,
    args: &RenderArgs,
) -> Result<config::SiteConfig, config::ConfigError> {
    let mut site_config = match config_path {
        Some(path) => config::load_config_file(path)?,
        None => config::load_config(root)?,
    };
    site_config.build.production |= args.production;
    site_config.build.debug |= args.debug;
    Ok(site_config)
}

/// Initialize the rayon thread pool based on build config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(build: &config::BuildConfig) {
    let threads = config::effective_threads(build);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
