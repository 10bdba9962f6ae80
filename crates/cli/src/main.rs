//! # dcenrich: metadata enrichment from the command line
//!
//! Wires the HTTP and process-backed model adapters into a `ModelRegistry`
//! and runs the enhancement pipeline over image files, printing the results
//! as JSON.

mod config;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dcenrich::{
    config::{CaptionConfig, NerConfig, OcrConfig},
    providers::{
        CaptionModel, HttpNerProvider, NerModel, OcrBackend, TesseractProvider,
        VisionCaptionProvider,
    },
    BatchItem, EnhancementPipeline, EnrichConfig, EnrichError, ModelRegistry, ProcessingLog,
    ProgressEvent, ProgressLevel, ProgressObserver,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "tif", "tiff", "bmp", "gif", "webp"];

// --- CLI Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a YAML configuration file (default: ./dcenrich.yml if present)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Enrich a single image
    Enrich(EnrichArgs),
    /// Enrich every image in a directory, one at a time
    Batch(BatchArgs),
    /// Inspect or create configuration files
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Load the models and report their state
    Status,
}

#[derive(Parser, Debug)]
struct EnrichArgs {
    /// The image file to enrich
    image: PathBuf,
    /// Collection the item belongs to
    #[arg(long)]
    collection: String,
    /// Item identifier (default: the file stem)
    #[arg(long)]
    item: Option<String>,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Directory containing the images
    dir: PathBuf,
    /// Collection the items belong to
    #[arg(long)]
    collection: String,
    /// Write the JSON report here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Write the effective configuration to a new YAML file
    Init {
        #[arg(default_value = config::DEFAULT_CONFIG_FILE)]
        path: PathBuf,
    },
    /// Print the effective configuration
    Show,
}

/// Forwards progress to the log and keeps a bounded history for the summary.
#[derive(Debug, Default)]
struct CliObserver {
    log: ProcessingLog,
}

impl ProgressObserver for CliObserver {
    fn notify(&self, event: &ProgressEvent) {
        match event.level {
            ProgressLevel::Error => error!("{}", event.message),
            _ => info!("{}", event.message),
        }
        self.log.notify(event);
    }
}

// --- Main Application Entry ---

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::get_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Enrich(args) => handle_enrich(&config, args).await,
        Commands::Batch(args) => handle_batch(&config, args).await,
        Commands::Config { command } => handle_config(&config, command),
        Commands::Status => handle_status(&config).await,
    }
}

// --- Model Wiring ---

async fn connect_captioner(config: &CaptionConfig) -> Result<Box<dyn CaptionModel>, EnrichError> {
    let api_url = config.api_url.clone().ok_or(EnrichError::ModelLoad {
        model: "caption",
        reason: "image_captioning.api_url is not set".to_string(),
    })?;
    let provider = VisionCaptionProvider::new(
        api_url,
        config.api_key.clone(),
        Some(config.model_name.clone()),
    )?;
    Ok(Box::new(provider))
}

async fn connect_ocr(config: &OcrConfig) -> Result<Box<dyn OcrBackend>, EnrichError> {
    if config.engine != "tesseract" {
        return Err(EnrichError::ModelLoad {
            model: "ocr",
            reason: format!("unsupported OCR engine '{}'", config.engine),
        });
    }
    let provider = TesseractProvider::new(config.tesseract_path.clone());
    let version = provider.probe().await?;
    info!("Using {version}");
    Ok(Box::new(provider))
}

async fn connect_ner(config: &NerConfig) -> Result<Box<dyn NerModel>, EnrichError> {
    let api_url = config.api_url.clone().ok_or(EnrichError::ModelLoad {
        model: "ner",
        reason: "ner.api_url is not set".to_string(),
    })?;
    Ok(Box::new(HttpNerProvider::new(
        api_url,
        Some(config.model.clone()),
    )?))
}

/// Loads every configured model into a fresh registry. Load failures are
/// logged and left in the slot state; the pipeline refuses to run without
/// the required models.
async fn load_models(config: &EnrichConfig) -> Arc<ModelRegistry> {
    let registry = ModelRegistry::new();

    if let Err(e) = registry
        .captioner
        .load(|| connect_captioner(&config.image_captioning))
        .await
    {
        warn!("Caption model unavailable: {e}");
    }
    if config.ocr.enabled {
        if let Err(e) = registry.ocr.load(|| connect_ocr(&config.ocr)).await {
            warn!("OCR backend unavailable, text extraction will be skipped: {e}");
        }
    }
    if let Err(e) = registry.ner.load(|| connect_ner(&config.ner)).await {
        warn!("NER model unavailable: {e}");
    }

    Arc::new(registry)
}

async fn build_pipeline(config: &EnrichConfig) -> Result<EnhancementPipeline> {
    let registry = load_models(config).await;
    Ok(EnhancementPipeline::new(registry, config)?)
}

// --- Command Handlers ---

fn print_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            info!("Wrote results to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
}

async fn handle_enrich(config: &EnrichConfig, args: EnrichArgs) -> Result<()> {
    let item_id = match args.item.or_else(|| file_stem(&args.image)) {
        Some(id) => id,
        None => bail!("Cannot derive an item id from '{}'", args.image.display()),
    };
    let image = image::open(&args.image)
        .with_context(|| format!("opening image {}", args.image.display()))?;

    let pipeline = build_pipeline(config).await?;
    let observer = CliObserver::default();
    let result = pipeline
        .process_item(&image, &args.collection, &item_id, &observer)
        .await?;
    print_json(&result, None)
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("reading directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        })
        .collect();
    paths.sort();
    Ok(paths)
}

async fn handle_batch(config: &EnrichConfig, args: BatchArgs) -> Result<()> {
    let paths = list_images(&args.dir)?;
    if paths.is_empty() {
        bail!("No images found in {}", args.dir.display());
    }

    let mut unreadable = Vec::new();
    let mut items = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(item_id) = file_stem(&path) else {
            continue;
        };
        match image::open(&path) {
            Ok(image) => items.push(BatchItem::new(image, args.collection.clone(), item_id)),
            Err(e) => {
                warn!("Skipping unreadable image {}: {e}", path.display());
                unreadable.push(format!("{}/{item_id}", args.collection));
            }
        }
    }

    let pipeline = build_pipeline(config).await?;
    let observer = CliObserver::default();
    let mut report = pipeline.process_batch(items, &observer).await;
    report.failed.extend(unreadable);

    let stats = observer.log.stats();
    info!(
        "Batch finished: {} enriched, {} failed ({} log entries, {} errors)",
        report.results.len(),
        report.failed.len(),
        stats.total,
        stats.error
    );
    print_json(&report, args.output.as_deref())
}

fn handle_config(config: &EnrichConfig, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Init { path } => {
            config::write_config_file(&path, config)?;
            println!("Wrote configuration to {}", path.display());
        }
        ConfigCommands::Show => print!("{}", serde_yaml::to_string(config)?),
    }
    Ok(())
}

async fn handle_status(config: &EnrichConfig) -> Result<()> {
    let registry = load_models(config).await;
    for (name, state) in registry.status() {
        println!("{name:<8} {state:?}");
    }
    if let Err(e) = registry.ensure_ready() {
        bail!("{e}");
    }
    println!("Ready");
    Ok(())
}
