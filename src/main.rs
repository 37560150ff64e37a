use clap::{Parser, Subcommand};
use photo_catalog::catalog::PhotoCatalog;
use photo_catalog::config::{self, CatalogConfig};
use photo_catalog::imaging::{OutputFormat, RustBackend};
use photo_catalog::process::{self, BatchMode, BatchOptions};
use photo_catalog::{output, resize, serializer};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "photo-catalog")]
#[command(about = "Catalog photos with their camera settings and web-sized variants")]
#[command(long_about = "\
Catalog photos with their camera settings and web-sized variants

Each image in a folder is read once for its EXIF camera settings and exported
three times, cropped to fill and stripped of all metadata:

  {base_dir}/img/Lg/{name}.{ext}   1920x1080
  {base_dir}/img/Md/{name}.{ext}   1024x768
  {base_dir}/img/Sm/{name}.{ext}   960x640

Everything is recorded in a JSON catalog (default photos.json). Files that
carry no camera model in their EXIF are reported and left out.

Run 'photo-catalog gen-config' to generate a documented photo-catalog.toml.")]
#[command(version)]
struct Cli {
    /// Config file [default: photo-catalog.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Catalog document, overriding the config file
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Flags that override the `[output]` config section.
#[derive(clap::Args, Clone)]
struct OutputArgs {
    /// Root directory for exported variants
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Output format (jpg, png, gif, bmp, tiff, webp)
    #[arg(long)]
    format: Option<OutputFormat>,

    /// JPEG/WebP quality
    #[arg(long, value_parser = clap::value_parser!(u32).range(25..=100))]
    quality: Option<u32>,

    /// Record paths with an "assets/" prefix
    #[arg(long)]
    assets: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Read EXIF and export variants for every image in a folder
    Process {
        folder: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
        /// Only read camera settings, export nothing
        #[arg(long, conflicts_with = "resize_only")]
        metadata_only: bool,
        /// Only export variants, skip EXIF
        #[arg(long)]
        resize_only: bool,
    },
    /// Re-export the variants of one catalogued photo
    Resize {
        file_name: String,
        /// Folder holding the source file
        #[arg(long)]
        source: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Append tags to a photo
    Tag {
        file_name: String,
        #[arg(required = true)]
        tags: Vec<String>,
    },
    /// Set a photo's alt text (empty clears it)
    Alt { file_name: String, text: String },
    /// Name a photo's exported variants (empty clears it)
    Rename { file_name: String, alt_name: String },
    /// Print the catalog
    List,
    /// Print a stock photo-catalog.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let mut config = load_cli_config(cli.config.as_deref())?;
    let catalog_path = cli.catalog.unwrap_or_else(|| config.catalog_path());

    let mut catalog = PhotoCatalog::new();
    let report = serializer::load_into(&mut catalog, &catalog_path)?;
    info!(
        path = %catalog_path.display(),
        loaded = report.loaded,
        skipped = report.skipped,
        "catalog loaded"
    );

    match cli.command {
        Command::Process {
            folder,
            output: output_args,
            metadata_only,
            resize_only,
        } => {
            apply_output_args(&mut config, &output_args)?;
            init_thread_pool(&config.processing);

            let mode = if metadata_only {
                BatchMode::MetadataOnly
            } else if resize_only {
                BatchMode::ResizeOnly
            } else {
                BatchMode::Full
            };
            let options = BatchOptions {
                resize: config.output.resize_options(),
                mode,
            };

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = process::process_folder(
                &mut catalog,
                &RustBackend::new(),
                &folder,
                &options,
                Some(tx),
            );
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let report = result?;
            for line in output::format_report(&report) {
                println!("{}", line);
            }
            serializer::save_to_path(&catalog, &catalog_path)?;
        }
        Command::Resize {
            file_name,
            source,
            output: output_args,
        } => {
            apply_output_args(&mut config, &output_args)?;
            require_record(&catalog, &file_name)?;
            let mut options = config.output.resize_options();
            if output_args.format.is_none() {
                options = options.in_format_of(&catalog, &file_name);
            }
            let variants = resize::resize(
                &mut catalog,
                &RustBackend::new(),
                &source.join(&file_name),
                &file_name,
                &options,
            )?;
            for (slot, resolution) in &variants {
                println!("{}: {}", slot.label(), resolution.path);
            }
            serializer::save_to_path(&catalog, &catalog_path)?;
        }
        Command::Tag { file_name, tags } => {
            require_record(&catalog, &file_name)?;
            for tag in &tags {
                catalog.add_tag(&file_name, tag);
            }
            serializer::save_to_path(&catalog, &catalog_path)?;
        }
        Command::Alt { file_name, text } => {
            require_record(&catalog, &file_name)?;
            catalog.set_alt(&file_name, &text);
            serializer::save_to_path(&catalog, &catalog_path)?;
        }
        Command::Rename {
            file_name,
            alt_name,
        } => {
            require_record(&catalog, &file_name)?;
            catalog.set_alt_name(&file_name, &alt_name);
            serializer::save_to_path(&catalog, &catalog_path)?;
        }
        Command::List => output::print_catalog(&catalog),
        Command::GenConfig => {}
    }

    Ok(())
}

/// Load the config file. An explicit `--config` must exist; the default
/// file is optional.
fn load_cli_config(path: Option<&Path>) -> Result<CatalogConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) if !path.exists() => {
            Err(format!("config file not found: {}", path.display()).into())
        }
        Some(path) => Ok(config::load_config(path)?),
        None => Ok(config::load_config(Path::new(config::DEFAULT_CONFIG_FILE))?),
    }
}

fn apply_output_args(
    config: &mut CatalogConfig,
    args: &OutputArgs,
) -> Result<(), config::ConfigError> {
    if let Some(base_dir) = &args.base_dir {
        config.output.base_dir = base_dir.to_string_lossy().into_owned();
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if let Some(quality) = args.quality {
        config.output.quality = quality;
    }
    if args.assets {
        config.output.assets_prefix = true;
    }
    config.validate()
}

fn require_record(catalog: &PhotoCatalog, file_name: &str) -> Result<(), String> {
    if catalog.contains(file_name) {
        Ok(())
    } else {
        Err(format!("no catalog record for '{}'", file_name))
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; users can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
