//! # Archivist CLI Application
//!
//! Command-line access to the collection pipeline:
//!
//! - `crawl`: discover the links on a seed page
//! - `create`: build a collection from text, web pages and audio
//! - `ingest`: add one `.txt` or audio file to an existing collection
//! - `query`: answer a question from a collection
//! - `search`: show the passages a question retrieves, without an answer
//! - `delete` / `list`: manage collections
//!
//! Completion and embedding use Gemini (`GEMINI_API_KEY`); transcription uses an
//! OpenAI-compatible endpoint (`OPENAI_API_KEY`). A `.env` file is loaded first.

mod telemetry;

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use anyhow::Context;
use archivist::collection::CollectionManager;
use archivist::config::ArchivistConfig;
use archivist::crawler::Crawler;
use archivist::ingest::{AUDIO_URL, AudioSource, FILENAME, IngestRequest, SOURCE_URL};
use archivist::model::{
    GeminiClient, RateLimitedCompletionModel, RateLimitedEmbeddingModel, RateLimitedTranscriber,
    WhisperTranscriber,
};
use archivist::search::SearchResult;
use clap::{Args, Parser, Subcommand, ValueEnum};
use governor::{Quota, RateLimiter};
use rig::providers::gemini;
use serde_json::json;
use tracing::{info, instrument};

type Manager = CollectionManager<
    RateLimitedCompletionModel<gemini::completion::CompletionModel>,
    RateLimitedEmbeddingModel<gemini::embedding::EmbeddingModel>,
    RateLimitedTranscriber<WhisperTranscriber>,
>;

#[derive(Parser)]
#[command(author, version, about = "Build named knowledge collections and query them with RAG", long_about = None)]
struct Cli {
    /// Directory holding the collections (overrides ARCHIVIST_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Number of passages retrieved per query (overrides ARCHIVIST_TOP_K)
    #[arg(long, global = true)]
    top_k: Option<usize>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Discover the links on a seed page
    Crawl(CrawlArgs),

    #[command(flatten)]
    Collection(CollectionCommands),
}

/// Commands that need the model capabilities
#[derive(Subcommand, Debug)]
enum CollectionCommands {
    /// Create (or rebuild) a collection
    Create(CreateArgs),

    /// Add a .txt or audio file to an existing collection
    Ingest(IngestArgs),

    /// Answer a question from a collection
    Query(QueryArgs),

    /// Show the passages retrieved for a question
    Search(SearchArgs),

    /// Delete a collection
    Delete(NameArgs),

    /// List collections
    List,
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// URL of the page to discover links on
    url: String,
}

#[derive(Args, Debug)]
struct CreateArgs {
    /// Collection name
    name: String,

    /// Text to add as a document (repeatable)
    #[arg(long)]
    text: Vec<String>,

    /// Web page to fetch as a document (repeatable)
    #[arg(long)]
    url: Vec<String>,

    /// Audio URL or local audio file to transcribe (repeatable)
    #[arg(long)]
    audio: Vec<String>,
}

#[derive(Args, Debug)]
struct IngestArgs {
    /// Collection name
    name: String,

    /// File to add
    file: PathBuf,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Collection name
    name: String,

    /// The question
    prompt: String,

    /// Also print the passages the answer was based on
    #[arg(long)]
    sources: bool,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Collection name
    name: String,

    /// The question
    prompt: String,
}

#[derive(Args, Debug)]
struct NameArgs {
    /// Collection name
    name: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let _guard = telemetry::init_tracing_subscriber(cli.log_file.as_deref())?;

    let mut config = ArchivistConfig::from_env()?;
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(top_k) = cli.top_k {
        config.index.top_k = top_k;
    }
    config.validate()?;

    match cli.command {
        Commands::Crawl(args) => crawl(config, args, cli.format).await,
        Commands::Collection(command) => {
            let manager = manager(config).await?;
            run(&manager, command, cli.format).await
        }
    }
}

async fn manager(config: ArchivistConfig) -> anyhow::Result<Manager> {
    let client = GeminiClient::new_gemini_from_env()?;
    let transcriber = RateLimitedTranscriber::new(
        WhisperTranscriber::from_env()?,
        RateLimiter::direct(Quota::per_minute(
            NonZeroU32::new(50).unwrap_or(NonZeroU32::MIN),
        )),
    );
    Ok(CollectionManager::new(config, client, transcriber).await?)
}

#[instrument(skip(config))]
async fn crawl(
    config: ArchivistConfig,
    args: CrawlArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let crawler = Crawler::with_config(config.crawler);
    let links = crawler.crawl(&args.url).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&links)?),
        OutputFormat::Text => links.iter().for_each(|link| println!("{}", link)),
    }
    Ok(())
}

async fn run(
    manager: &Manager,
    command: CollectionCommands,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match command {
        CollectionCommands::Create(args) => {
            let request = create_request(&args).await?;
            let report = manager.create_collection(&args.name, request).await?;
            let failures: Vec<_> = report
                .failures
                .iter()
                .map(|f| json!({ "source": f.source, "error": f.error.to_string() }))
                .collect();
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "collection": report.manifest,
                        "failures": failures,
                    }))?
                ),
                OutputFormat::Text => {
                    println!(
                        "Created {} with {} documents",
                        report.manifest.name, report.manifest.document_count
                    );
                    for failure in &report.failures {
                        println!("  skipped {}: {}", failure.source, failure.error);
                    }
                }
            }
        }
        CollectionCommands::Ingest(args) => {
            let filename = args
                .file
                .file_name()
                .and_then(|name| name.to_str())
                .with_context(|| format!("{} has no file name", args.file.display()))?
                .to_string();
            let bytes = tokio::fs::read(&args.file)
                .await
                .with_context(|| format!("Failed to read {}", args.file.display()))?;
            let manifest = manager
                .ingest_single_file(&args.name, &filename, bytes)
                .await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&manifest)?),
                OutputFormat::Text => println!(
                    "Added {} to {} ({} documents)",
                    filename, manifest.name, manifest.document_count
                ),
            }
        }
        CollectionCommands::Query(args) => {
            let answer = manager.query_with_sources(&args.name, &args.prompt).await?;
            match format {
                OutputFormat::Json if args.sources => {
                    println!("{}", serde_json::to_string_pretty(&answer)?)
                }
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({ "text": answer.text }))?
                ),
                OutputFormat::Text => {
                    println!("{}", answer.text);
                    if args.sources {
                        print_results(&answer.sources);
                    }
                }
            }
        }
        CollectionCommands::Search(args) => {
            let results = manager.retrieve(&args.name, &args.prompt).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
                OutputFormat::Text => print_results(&results),
            }
        }
        CollectionCommands::Delete(args) => {
            manager.delete(&args.name).await?;
            match format {
                OutputFormat::Json => println!("{}", json!({ "deleted": args.name })),
                OutputFormat::Text => println!("Deleted {}", args.name),
            }
        }
        CollectionCommands::List => {
            let manifests = manager.list().await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&manifests)?),
                OutputFormat::Text => {
                    if manifests.is_empty() {
                        println!("No collections");
                    }
                    for manifest in manifests {
                        println!(
                            "{}\t{} documents\t{} passages\tupdated {}",
                            manifest.name,
                            manifest.document_count,
                            manifest.passage_count,
                            manifest.updated_at.format("%Y-%m-%d %H:%M:%S")
                        );
                    }
                }
            }
        }
    }
    Ok(())
}

/// `None` when no inputs were given, so an empty collection is created
async fn create_request(args: &CreateArgs) -> anyhow::Result<Option<IngestRequest>> {
    if args.text.is_empty() && args.url.is_empty() && args.audio.is_empty() {
        return Ok(None);
    }

    let mut audio = Vec::with_capacity(args.audio.len());
    for input in &args.audio {
        audio.push(audio_source(input).await?);
    }
    info!("Creating {} from {} audio inputs", args.name, audio.len());

    Ok(Some(IngestRequest {
        text: args.text.clone(),
        urls: args.url.clone(),
        audio,
    }))
}

async fn audio_source(input: &str) -> anyhow::Result<AudioSource> {
    if input.starts_with("http://") || input.starts_with("https://") {
        return Ok(AudioSource::Url(input.to_string()));
    }

    let path = Path::new(input);
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read audio file {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(input)
        .to_string();
    Ok(AudioSource::Upload { filename, bytes })
}

fn print_results(results: &[SearchResult]) {
    for (rank, result) in results.iter().enumerate() {
        let source = result
            .metadata
            .get(SOURCE_URL)
            .or_else(|| result.metadata.get(AUDIO_URL))
            .or_else(|| result.metadata.get(FILENAME))
            .map(String::as_str)
            .unwrap_or("text");
        println!("\n[{}] score {:.3} ({})", rank + 1, result.score, source);
        println!("{}", result.text);
    }
}
