use clap::{Parser, Subcommand};
use simple_blog::content::ContentSource;
use simple_blog::content::contentful::ContentfulClient;
use simple_blog::content::fixture::FixtureSource;
use simple_blog::pipeline::{self, Workspace};
use simple_blog::{config, output};
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "simple-blog")]
#[command(about = "Static blog generator for Contentful posts")]
#[command(long_about = "\
Static blog generator for Contentful posts

Posts live in a Contentful space (content type `blogPost`). Every page is
rendered at build time into plain HTML.

Site structure:

  site/
  ├── config.toml                  # Site config (optional)
  └── assets/                      # Copied verbatim → dist/assets/

  dist/
  ├── blog/index.html              # Listing
  ├── blog/post/<slug>/index.html  # One page per post
  ├── 404.html
  ├── sitemap.xml                  # With image:image cover entries
  └── robots.txt

Environment:
  CONTENTFUL_SPACE_ID        Space to read posts from
  CONTENTFUL_ACCESS_TOKEN    Delivery API token
  SITE_BASE_URL              Absolute site URL for canonical links and sitemap

Use --fixture posts.json to build from a local JSON file instead of the API.
Run 'simple-blog gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Site directory (config.toml, assets/)
    #[arg(long, default_value = ".", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Directory for intermediate files (routes manifest, metadata sidecar)
    #[arg(long, default_value = ".simple-blog-temp", global = true)]
    temp_dir: PathBuf,

    /// Read posts from a JSON file instead of the Contentful API
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch posts, write the routes manifest and metadata sidecar
    Paths,
    /// Produce the HTML site from the paths stage output
    Generate,
    /// Write sitemap.xml and robots.txt from the paths stage output
    Sitemap,
    /// Run the full pipeline: paths → generate → sitemap
    Build,
    /// Validate config and fetch the listing without writing anything
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let workspace = Workspace {
        source: cli.source.clone(),
        output: cli.output.clone(),
        temp_dir: cli.temp_dir.clone(),
    };

    match cli.command {
        Command::Paths => {
            let site_config = load_site_config(&cli.source)?;
            let source = open_source(cli.fixture.as_deref(), &site_config)?;
            let outcome = pipeline::paths_stage(source.as_ref(), &workspace)?;
            output::print_paths_output(&outcome.props, outcome.artifact.path());
        }
        Command::Generate => {
            let site_config = load_site_config(&cli.source)?;
            let paths = pipeline::load_paths(&workspace)?;
            let report = pipeline::generate_stage(&paths.props, &site_config, &workspace)?;
            output::print_generate_output(&report);
        }
        Command::Sitemap => {
            let site_config = load_site_config(&cli.source)?;
            let paths = pipeline::load_paths(&workspace)?;
            let outcome = pipeline::sitemap_stage(
                &paths.artifact,
                &paths.props.routes,
                &site_config,
                &workspace.output,
                &pipeline::build_timestamp(),
            )?;
            output::print_sitemap_output(&outcome.entries, outcome.wrote_robots);
        }
        Command::Build => {
            let site_config = load_site_config(&cli.source)?;
            let source = open_source(cli.fixture.as_deref(), &site_config)?;

            println!("==> Stage 1: Fetching posts");
            let paths = pipeline::paths_stage(source.as_ref(), &workspace)?;
            output::print_paths_output(&paths.props, paths.artifact.path());

            println!("==> Stage 2: Generating HTML → {}", workspace.output.display());
            let report = pipeline::generate_stage(&paths.props, &site_config, &workspace)?;
            output::print_generate_output(&report);

            println!("==> Stage 3: Writing sitemap");
            let outcome = pipeline::sitemap_stage(
                &paths.artifact,
                &paths.props.routes,
                &site_config,
                &workspace.output,
                &pipeline::build_timestamp(),
            )?;
            output::print_sitemap_output(&outcome.entries, outcome.wrote_robots);

            println!("==> Build complete: {}", workspace.output.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let site_config = load_site_config(&cli.source)?;
            let source = open_source(cli.fixture.as_deref(), &site_config)?;
            let posts = source.list_post_summaries()?.into_items();
            output::print_check_output(&site_config, &posts);
            println!("==> Config and content source are valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// `config.toml` from the site directory, with environment overrides.
fn load_site_config(source: &Path) -> Result<config::SiteConfig, config::ConfigError> {
    config::load_config_with_env(source, |key| std::env::var(key).ok())
}

/// The fixture file when one is given, otherwise the Contentful API.
fn open_source(
    fixture: Option<&Path>,
    site_config: &config::SiteConfig,
) -> Result<Box<dyn ContentSource>, Box<dyn std::error::Error>> {
    match fixture {
        Some(path) => Ok(Box::new(FixtureSource::load(path)?)),
        None => Ok(Box::new(ContentfulClient::new(&site_config.content)?)),
    }
}
