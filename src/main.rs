use clap::{Parser, Subcommand};
use layerstack::config;
use layerstack::output;
use layerstack::render::{RenderRequest, RenderedImage, Renderer};
use layerstack::select::{ExplicitSelection, Selection};
use std::path::{Path, PathBuf};
use tracing::Level;

/// Decorations shared by the compositing commands.
#[derive(clap::Args, Clone)]
struct DecorationArgs {
    /// Text engraved in a rounded box near the bottom edge
    #[arg(long)]
    engraving: Option<String>,

    /// Payload stamped as a QR code in the center (replaces the emblem layer)
    #[arg(long)]
    qrcode: Option<String>,

    /// Output PNG file
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Parser)]
#[command(name = "layerstack")]
#[command(about = "Layered PNG compositing engine")]
#[command(long_about = "\
Layered PNG compositing engine

Every subdirectory of the assets directory is a collection. Layer images are
named L<level>_<name>_<number>.png; the level orders layers bottom to top and
the number orders variants within a layer.

Assets structure:

  assets/
  ├── layerstack.toml                  # Optional config (see gen-config)
  └── default_collection/
      ├── L0_Background_1.png          # Base layer, variant 1
      ├── L0_Background_2.png
      ├── L1_Eyes-XOR_1.png            # Mask: its alpha cuts the layer above
      ├── L2_Pupils_1.png              # Drawn through the Eyes-XOR mask
      ├── L3_Eyes-AND_1.png            # Drawn on top, paired with Eyes-XOR by ordinal
      └── L9_Emblem_1.png              # Dropped when a QR code is requested

Run 'layerstack gen-config' to generate a documented layerstack.toml.")]
#[command(version)]
struct Cli {
    /// Assets directory holding one subdirectory per collection
    #[arg(long, default_value = "assets", global = true)]
    assets: PathBuf,

    /// Collection to draw from (defaults to the configured default_collection)
    #[arg(long, global = true)]
    collection: Option<String>,

    /// Log more (repeat for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the layers of a collection with their variant counts
    Groups {
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },
    /// Composite an explicit selection of variants
    Composite {
        /// Variant index for a layer, as name=index (0-based, repeatable)
        #[arg(short, long = "select", value_name = "NAME=INDEX")]
        select: Vec<String>,

        #[command(flatten)]
        decoration: DecorationArgs,
    },
    /// Composite the variants derived from an identifier's SHA-256 digest
    Random {
        /// Identifier to hash (e.g. a UUID)
        id: String,

        #[command(flatten)]
        decoration: DecorationArgs,
    },
    /// Render a standalone QR code
    Qrcode {
        payload: String,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Scan every collection and report which ones load
    Warm,
    /// Print a stock layerstack.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    // gen-config must work even when the existing config is invalid.
    let command = match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            return Ok(());
        }
        command => command,
    };

    let app_config = config::load_config(&cli.assets)?;
    init_thread_pool(&app_config.processing);
    let renderer = Renderer::new(&cli.assets, app_config);
    let collection = cli.collection.as_deref();

    match command {
        Command::Groups { json } => {
            let catalog = renderer.catalog(collection)?;
            if json {
                let body = output::groups_json(&catalog.groups());
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                output::print_groups(&catalog);
            }
        }
        Command::Composite { select, decoration } => {
            let pairs = select.iter().filter_map(|pair| pair.split_once('='));
            let selection = ExplicitSelection::from_pairs(pairs);
            render_to_file(
                &renderer,
                collection,
                Selection::Explicit(selection),
                decoration,
            )?;
        }
        Command::Random { id, decoration } => {
            render_to_file(&renderer, collection, Selection::Hashed(id), decoration)?;
        }
        Command::Qrcode { payload, output } => {
            let image = renderer.render_qr(&payload)?;
            write_image(&output, &image)?;
        }
        Command::Warm => {
            let report = renderer
                .cache()
                .prewarm(collection.unwrap_or(renderer.config().default_collection.as_str()));
            output::print_warm_report(&report);
        }
        Command::GenConfig => {}
    }

    Ok(())
}

fn render_to_file(
    renderer: &Renderer,
    collection: Option<&str>,
    selection: Selection,
    decoration: DecorationArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut request = RenderRequest::new(selection);
    request.collection = collection.map(str::to_string);
    request.engraving = decoration.engraving;
    request.qr_payload = decoration.qrcode;

    let (catalog, plan) = renderer.plan(&request)?;
    output::print_plan(&catalog, &plan);
    let image = renderer.render_plan(&catalog, &plan, &request)?;
    write_image(&decoration.output, &image)
}

fn write_image(path: &Path, image: &RenderedImage) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, &image.png)?;
    println!(
        "==> Wrote {} ({}x{}, {})",
        path.display(),
        image.width,
        image.height,
        image.content_type()
    );
    Ok(())
}

/// Install the stderr log subscriber. Stdout stays reserved for command output.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        (false, 2) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
