use clap::{Parser, Subcommand};
use folio_gen::config::{self, ContentSource};
use folio_gen::{assets, content, fetch, generate, output};
use std::path::PathBuf;

/// Shared flags for commands that download assets.
#[derive(clap::Args, Clone)]
struct CacheArgs {
    /// Disable the download cache and re-fetch every asset
    #[arg(long)]
    no_cache: bool,
}

#[derive(Parser)]
#[command(name = "folio-gen")]
#[command(about = "Static site generator for CMS-backed portfolio sites")]
#[command(long_about = "\
Static site generator for CMS-backed portfolio sites

Content lives in a Contentful space. Each page of the site is driven by its
own content type, all filtered to the configured platform:

  siteMetadata     site title used in page titles and navigation
  landingLayout    landing statement plus the ordered project list
  aboutLayout      statement, markdown body, portrait image
  resumeLayout     statement, markdown body, downloadable attachment
  contactLayout    statement, markdown body, profile link

Every project on the landing layout gets its own spotlight page with a photo
column. Layout types the space does not define are skipped; their pages still
render with navigation and title.

Credentials are read from the environment, never from config.toml:

  CONTENTFUL_SPACE_ID              space to query (required)
  CONTENTFUL_ACCESS_TOKEN          delivery API token (required)
  CONTENTFUL_ACCESS_PREVIEW_TOKEN  preview API token
  CONTENTFUL_PREVIEW_ENABLED       any value switches to the preview API
  CONTENTFUL_HOST                  endpoint override

Run 'folio-gen gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Site configuration file
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Directory for intermediate files (content manifest, downloaded assets)
    #[arg(long, default_value = ".folio-gen-temp", global = true)]
    temp_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch content from the CMS into a manifest
    Fetch,
    /// Download image variants and attachments for fetched content
    Process(CacheArgs),
    /// Produce the final HTML site from processed content
    Generate,
    /// Run the full pipeline: fetch → process → generate
    Build(CacheArgs),
    /// Validate credentials and configuration without building
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Fetch => {
            let site_config = config::load_config(&cli.config)?;
            let source = ContentSource::from_env()?;
            let content = fetch::fetch(&source, &site_config)?;
            std::fs::create_dir_all(&cli.temp_dir)?;
            let manifest_path = cli.temp_dir.join("content.json");
            let json = serde_json::to_string_pretty(&content)?;
            std::fs::write(&manifest_path, json)?;
            output::print_fetch_output(&content);
        }
        Command::Process(cache_args) => {
            let content_manifest_path = cli.temp_dir.join("content.json");
            let manifest_content = std::fs::read_to_string(&content_manifest_path)?;
            let content: content::SiteContent = serde_json::from_str(&manifest_content)?;
            init_thread_pool(&content.config.processing);
            let assets_dir = cli.temp_dir.join("assets");
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = assets::process(
                &content_manifest_path,
                &assets_dir,
                !cache_args.no_cache,
                Some(tx),
            )?;
            printer.join().unwrap();
            let processed_manifest_path = assets_dir.join("content.json");
            let json = serde_json::to_string_pretty(&result.content)?;
            std::fs::write(&processed_manifest_path, &json)?;
            println!("Cache: {}", result.cache_stats);
        }
        Command::Generate => {
            let assets_dir = cli.temp_dir.join("assets");
            let processed_manifest_path = assets_dir.join("content.json");
            generate::generate(&processed_manifest_path, &assets_dir, &cli.output)?;
            let manifest_content = std::fs::read_to_string(&processed_manifest_path)?;
            let content: content::SiteContent = serde_json::from_str(&manifest_content)?;
            output::print_generate_output(&content);
        }
        Command::Build(cache_args) => {
            let site_config = config::load_config(&cli.config)?;
            let source = ContentSource::from_env()?;

            std::fs::create_dir_all(&cli.temp_dir)?;

            println!("==> Stage 1: Fetching from {}", source.effective_host());
            let content = fetch::fetch(&source, &site_config)?;
            let content_manifest_path = cli.temp_dir.join("content.json");
            let json = serde_json::to_string_pretty(&content)?;
            std::fs::write(&content_manifest_path, json)?;
            output::print_fetch_output(&content);

            println!("==> Stage 2: Downloading assets");
            init_thread_pool(&content.config.processing);
            let assets_dir = cli.temp_dir.join("assets");
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = assets::process(
                &content_manifest_path,
                &assets_dir,
                !cache_args.no_cache,
                Some(tx),
            )?;
            printer.join().unwrap();
            let processed_manifest_path = assets_dir.join("content.json");
            let json = serde_json::to_string_pretty(&result.content)?;
            std::fs::write(&processed_manifest_path, &json)?;
            println!("Cache: {}", result.cache_stats);

            println!("==> Stage 3: Generating HTML → {}", cli.output.display());
            generate::generate(&processed_manifest_path, &assets_dir, &cli.output)?;
            output::print_generate_output(&result.content);

            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            println!("==> Checking configuration");
            let site_config = config::load_config(&cli.config)?;
            let source = ContentSource::from_env()?;
            println!(
                "Space {} on {} (environment {}, platform {})",
                source.space_id,
                source.effective_host(),
                site_config.content.environment,
                site_config.content.platform
            );
            println!("==> Configuration is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; users can constrain down,
/// not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
