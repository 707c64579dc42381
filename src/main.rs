use clap::{Parser, Subcommand};
use pixelpit_press::catalog::{self, Catalog};
use pixelpit_press::imaging::{IMAGE_FILENAME, ResvgBackend, write_share_png};
use pixelpit_press::render::{self, RenderEvent};
use pixelpit_press::share_image::ShareCard;
use pixelpit_press::{config, generate, output, server};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;
use tracing_subscriber::EnvFilter;

/// Shared flags for commands that render images.
#[derive(clap::Args, Clone)]
struct CacheArgs {
    /// Disable the render cache and re-rasterize every share image
    #[arg(long)]
    no_cache: bool,
}

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
#[command(name = "pixelpit-press")]
#[command(about = "Share images, lab pages and share links for the Pixelpit arcade")]
#[command(long_about = "\
Share images, lab pages and share links for the Pixelpit arcade

Every game gets a 1200x630 share image built from one shared template:
the game's palette and decorations, the score, name, tagline and a branding
footer. The static build pre-renders the game cards and the configured
sample scores; 'serve' renders any score on demand.

Content structure:

  content/
  ├── config.toml                  # Site config (optional)
  ├── assets/                      # Copied verbatim to the output root
  ├── games/
  │   ├── 010-beam.toml            # Game (numbered = listed, in order)
  │   └── proto-snake.toml         # No number prefix = unlisted
  └── labs/
      └── beam.toml                # Build transcript for the 'beam' game

Public routes (below site.arcade_path):

  /<game>/share/<score>                   forwards to /<game>, keeps the query
  /<game>/share/<score>/opengraph-image   score share image
  /<game>/opengraph-image                 game card
  /<game>/lab                             lab transcript
  /labs                                   labs index

Run 'pixelpit-press gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Directory for intermediate files (catalog, rendered images)
    #[arg(long, default_value = ".pixelpit-temp", global = true)]
    temp_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the content directory into a catalog
    Scan,
    /// Rasterize game cards and sample-score share images
    Render(CacheArgs),
    /// Write share pages, lab pages, redirects and metadata
    Generate,
    /// Run the full pipeline: scan → render → generate
    Build(CacheArgs),
    /// Validate the content directory without building
    Check,
    /// Serve share pages and share images for any score
    Serve {
        /// Address to listen on (defaults to server.bind from config)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Render a single share image to a PNG file
    ShareImage {
        /// Game slug
        game: String,
        /// Score to draw; omit for the game card
        score: Option<String>,
        /// Output file
        #[arg(long, default_value = IMAGE_FILENAME)]
        out: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let catalog_path = cli.temp_dir.join("catalog.json");
    let rendered_dir = cli.temp_dir.join("rendered");

    match cli.command {
        Command::Scan => {
            let catalog = catalog::scan(&cli.source)?;
            catalog.save(&catalog_path)?;
            output::print_scan_output(&catalog);
        }
        Command::Render(cache_args) => {
            let catalog = Catalog::load(&catalog_path)?;
            run_render(&catalog, &cli.source, &rendered_dir, !cache_args.no_cache)?;
        }
        Command::Generate => {
            let catalog = Catalog::load(&catalog_path)?;
            let summary = generate::generate(&catalog, &rendered_dir, &cli.output, &cli.source)?;
            output::print_generate_output(&summary);
        }
        Command::Build(cache_args) => {
            println!("==> Stage 1: Scanning {}", cli.source.display());
            let catalog = catalog::scan(&cli.source)?;
            catalog.save(&catalog_path)?;
            output::print_scan_output(&catalog);

            println!("==> Stage 2: Rendering share images");
            run_render(&catalog, &cli.source, &rendered_dir, !cache_args.no_cache)?;

            println!("==> Stage 3: Generating pages → {}", cli.output.display());
            let summary = generate::generate(&catalog, &rendered_dir, &cli.output, &cli.source)?;
            output::print_generate_output(&summary);

            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let catalog = catalog::scan(&cli.source)?;
            output::print_scan_output(&catalog);
            println!("==> Content is valid");
        }
        Command::Serve { bind } => {
            init_tracing();
            let catalog = catalog::scan(&cli.source)?;
            let bind = bind.unwrap_or_else(|| catalog.config.server.bind.clone());
            let backend = ResvgBackend::new(&catalog.config.font_dirs(&cli.source));
            let state = server::AppState::new(catalog, Arc::new(backend))?;
            tokio::runtime::Runtime::new()?.block_on(server::serve(state, &bind))?;
        }
        Command::ShareImage { game, score, out } => {
            let catalog = catalog::scan(&cli.source)?;
            let descriptor = catalog
                .game(&game)
                .ok_or_else(|| format!("unknown game '{game}'"))?;
            let backend = ResvgBackend::new(&catalog.config.font_dirs(&cli.source));
            let card = ShareCard::for_game(descriptor, score.as_deref(), &catalog.config);
            write_share_png(&backend, &card, &out)?;
            println!("{} → {}", descriptor.name, out.display());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Stage 2 with a progress printer on its own thread.
fn run_render(
    catalog: &Catalog,
    source: &Path,
    rendered_dir: &Path,
    use_cache: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    init_thread_pool(&catalog.config.processing);
    let (tx, printer) = spawn_printer();
    let result = render::render(
        catalog,
        rendered_dir,
        &catalog.config.font_dirs(source),
        use_cache,
        Some(tx),
    )?;
    printer
        .join()
        .map_err(|_| "progress printer panicked")?;
    println!("Cache: {}", result.cache_stats);
    Ok(())
}

fn spawn_printer() -> (Sender<RenderEvent>, JoinHandle<()>) {
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_render_event(&event) {
                println!("{}", line);
            }
        }
    });
    (tx, printer)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: the config can constrain
/// down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Log to stderr; `RUST_LOG` overrides the default `info` level.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
