//! Chronicle CLI - Query and curate institutional memory
//!
//! Thin client over the Chronicle HTTP API.

mod api;
mod config;
mod dataset;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::{Input, Password};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::PathBuf;

use api::{ChronicleClient, MemoryResponse, QueryRequest};
use config::Config;

#[derive(Parser)]
#[command(name = "chronicle")]
#[command(about = "Chronicle CLI - Query and curate institutional memory", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Login and store API key
    Login {
        /// API key (will prompt if not provided)
        #[arg(short, long)]
        key: Option<String>,
        /// Server URL to store alongside the key
        #[arg(long)]
        url: Option<String>,
    },

    /// Show or change configuration
    Config {
        /// Set the server URL
        #[arg(long)]
        url: Option<String>,
    },

    /// Check that the server is up
    Health,

    /// Ask a question against stored memories
    Query {
        /// Natural-language query
        query: String,
        /// Max results
        #[arg(short, long, default_value = "5")]
        limit: usize,
        /// text, image or both
        #[arg(short = 'd', long, default_value = "both")]
        data_type: String,
        /// summary, recommendation or comparison
        #[arg(short, long, default_value = "summary")]
        mode: String,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        outcome: Option<String>,
        #[arg(long)]
        location: Option<String>,
        /// Match records carrying any of these tags (comma-separated)
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        /// Earliest date, YYYY-MM-DD
        #[arg(long)]
        from: Option<String>,
        /// Latest date, YYYY-MM-DD
        #[arg(long)]
        to: Option<String>,
    },

    /// Ingest one document or image
    Ingest {
        /// Document text (or use -f for file)
        text: Option<String>,
        /// Read text from file
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Ingest an image at this path (as seen by the server)
        #[arg(short, long)]
        image: Option<String>,
        /// Description stored with an image
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        department: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        #[arg(long)]
        outcome: String,
        #[arg(long)]
        location: Option<String>,
        /// Tags (comma-separated)
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        /// Extra metadata as key=value (repeatable)
        #[arg(long = "meta")]
        meta: Vec<String>,
    },

    /// Ingest prepared documents, metadata and images
    IngestBatch {
        #[arg(long, default_value = "data/processed/documents.json")]
        documents: PathBuf,
        #[arg(long, default_value = "data/processed/metadata.json")]
        metadata: PathBuf,
        #[arg(long, default_value = "data/raw/images")]
        images: PathBuf,
        /// Skip the images directory
        #[arg(long)]
        no_images: bool,
        /// Items per request
        #[arg(long, default_value = "32")]
        chunk_size: usize,
    },

    /// Change fields of an existing memory
    Update {
        /// Memory ID
        id: String,
        #[arg(long)]
        text: Option<String>,
        /// New image path
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        outcome: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
        /// Other fields as key=value (repeatable)
        #[arg(long = "set")]
        set: Vec<String>,
    },

    /// Show one memory
    Get {
        /// Memory ID
        id: String,
    },

    /// Ingest a sample document and run the sample queries
    Demo {
        #[arg(long, default_value = "data/sample_queries.json")]
        queries: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Login { key, url } => cmd_login(key, url).await,
        Commands::Config { url } => cmd_config(url),
        Commands::Health => cmd_health().await,
        Commands::Query {
            query,
            limit,
            data_type,
            mode,
            department,
            outcome,
            location,
            tags,
            from,
            to,
        } => {
            let filters = query_filters(department, outcome, location, tags, from, to);
            let request = QueryRequest {
                query,
                filters,
                limit,
                data_type,
                reasoning_mode: mode,
            };
            cmd_query(request).await
        }
        Commands::Ingest {
            text,
            file,
            image,
            description,
            department,
            date,
            outcome,
            location,
            tags,
            meta,
        } => {
            let mut item = Map::new();
            match (image, text, file) {
                (Some(image), None, None) => {
                    item.insert("type".into(), json!("image"));
                    item.insert("image_path".into(), json!(image));
                    if let Some(description) = description {
                        item.insert("description".into(), json!(description));
                    }
                }
                (Some(_), _, _) => bail!("Cannot combine --image with text input"),
                (None, text, file) => {
                    item.insert("type".into(), json!("text"));
                    item.insert("text".into(), json!(read_text(text, file)?));
                }
            }
            item.insert("department".into(), json!(department));
            item.insert("date".into(), json!(date));
            item.insert("outcome".into(), json!(outcome));
            if let Some(location) = location {
                item.insert("location".into(), json!(location));
            }
            if !tags.is_empty() {
                item.insert("tags".into(), json!(tags));
            }
            for (key, value) in parse_pairs(&meta)? {
                item.insert(key, value);
            }
            cmd_ingest(item).await
        }
        Commands::IngestBatch {
            documents,
            metadata,
            images,
            no_images,
            chunk_size,
        } => {
            let images = (!no_images).then_some(images);
            cmd_ingest_batch(documents, metadata, images, chunk_size).await
        }
        Commands::Update {
            id,
            text,
            image,
            department,
            date,
            outcome,
            location,
            tags,
            set,
        } => {
            let mut changes = Map::new();
            let fields = [
                ("text", text),
                ("image_path", image),
                ("department", department),
                ("date", date),
                ("outcome", outcome),
                ("location", location),
            ];
            for (key, value) in fields {
                if let Some(value) = value {
                    changes.insert(key.to_string(), json!(value));
                }
            }
            if let Some(tags) = tags {
                changes.insert("tags".into(), json!(tags));
            }
            for (key, value) in parse_pairs(&set)? {
                changes.insert(key, value);
            }
            cmd_update(id, changes).await
        }
        Commands::Get { id } => cmd_get(id).await,
        Commands::Demo { queries } => cmd_demo(queries).await,
    }
}

// ============================================
// Command Implementations
// ============================================

fn client(config: &Config) -> ChronicleClient {
    ChronicleClient::new(&config.base_url, config.api_key.as_deref())
}

async fn cmd_login(key: Option<String>, url: Option<String>) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(url) = url {
        config.set_base_url(&url);
    }

    let api_key = match key {
        Some(k) => k,
        None => Password::new()
            .with_prompt("API Key")
            .interact()
            .context("Failed to read API key")?,
    };

    print!("Testing connection... ");
    match ChronicleClient::new(&config.base_url, Some(&api_key)).health().await {
        Ok(_) => println!("{}", "OK".green()),
        Err(e) => {
            println!("{}", "Failed".red());
            bail!("Could not reach Chronicle API at {}: {}", config.base_url, e);
        }
    }

    config.set_api_key(api_key);
    config.save()?;

    println!("{} API key saved to {:?}", "✓".green(), Config::config_path()?);

    Ok(())
}

fn cmd_config(url: Option<String>) -> Result<()> {
    let mut config = Config::load()?;

    if let Some(url) = url {
        config.set_base_url(&url);
        config.save()?;
        println!("{} Base URL set to {}", "✓".green(), config.base_url);
    }

    println!("{}", "Configuration:".bold());
    println!("  Path: {:?}", Config::config_path()?);
    println!("  Base URL: {}", config.base_url);
    println!(
        "  API Key: {}",
        if config.api_key.is_some() {
            "Set".green()
        } else {
            "Not set".red()
        }
    );

    Ok(())
}

async fn cmd_health() -> Result<()> {
    let config = Config::load()?;
    let health = client(&config).health().await?;

    println!(
        "{} {} (v{}) - {}",
        "✓".green(),
        config.base_url.cyan(),
        health.version,
        health.message
    );
    if health.status != "ok" {
        println!("  status: {}", health.status.yellow());
    }

    Ok(())
}

async fn cmd_query(request: QueryRequest) -> Result<()> {
    let config = Config::load()?;
    let response = client(&config).query(&request).await?;

    if response.memories.is_empty() {
        println!("No memories found for '{}'", response.query);
    } else {
        println!(
            "{} memories for '{}':",
            response.memories.len().to_string().green(),
            response.query
        );
        for memory in &response.memories {
            print_memory_line(memory);
        }
    }

    println!("\n{}", format!("Reasoning ({}):", request.reasoning_mode).bold());
    println!("{}", response.reasoning);
    println!("\n{}", "Summary:".bold());
    println!("{}", response.summary);

    Ok(())
}

async fn cmd_ingest(item: Map<String, Value>) -> Result<()> {
    let config = Config::load()?;
    let response = client(&config).ingest(&item).await?;

    println!("{} {} [{}]", "✓".green(), response.message, response.id.cyan());

    Ok(())
}

async fn cmd_ingest_batch(
    documents: PathBuf,
    metadata: PathBuf,
    images: Option<PathBuf>,
    chunk_size: usize,
) -> Result<()> {
    if chunk_size == 0 {
        bail!("--chunk-size must be at least 1");
    }
    let config = Config::load()?;
    let client = client(&config);

    let mut items = dataset::load_documents(&documents, &metadata)?;
    let document_count = items.len();
    if let Some(dir) = images {
        items.extend(dataset::load_images(&dir)?);
    }
    println!(
        "Ingesting {} documents and {} images...",
        document_count,
        items.len() - document_count
    );

    let mut ingested = 0;
    for chunk in items.chunks(chunk_size) {
        let response = client.ingest_batch(chunk).await?;
        ingested += response.ingested;
        println!("  {} {}/{}", "✓".green(), ingested, items.len());
    }

    println!("{} Ingested {} memories", "✓".green(), ingested);

    Ok(())
}

async fn cmd_update(id: String, changes: Map<String, Value>) -> Result<()> {
    if changes.is_empty() {
        bail!("Nothing to update. Pass at least one field.");
    }
    let config = Config::load()?;
    let response = client(&config).update(&id, &changes).await?;

    let embedding = if response.reembedded {
        "re-embedded".yellow()
    } else {
        "embedding kept".dimmed()
    };
    println!("{} {} ({})", "✓".green(), response.message, embedding);

    Ok(())
}

async fn cmd_get(id: String) -> Result<()> {
    let config = Config::load()?;
    let memory = client(&config).get(&id).await?;

    println!("{} {}", "ID:".bold(), memory.id.cyan());
    println!("  Type: {}", memory.content_type);
    println!("  Department: {}", memory.department);
    println!("  Date: {}", memory.date);
    println!("  Outcome: {}", memory.outcome);
    if let Some(location) = &memory.location {
        println!("  Location: {}", location);
    }
    if let Some(tags) = &memory.tags {
        println!("  Tags: {}", tags.join(", "));
    }
    if let Some(image) = &memory.image_url {
        println!("  Image: {}", image);
    }
    if let Some(text) = &memory.text {
        println!("  Text: {}", text);
    }
    for (key, value) in &memory.attributes {
        println!("  {}: {}", key.dimmed(), value);
    }

    Ok(())
}

async fn cmd_demo(queries: PathBuf) -> Result<()> {
    let config = Config::load()?;
    let client = client(&config);

    println!("{}", "Chronicle Demo - Institutional Memory".bold());
    println!("{}", "=".repeat(50));

    println!("\n1. Ingesting a new document...");
    let sample = json!({
        "text": "Recent infrastructure improvements have enhanced emergency response capabilities, showing promising results in preliminary tests.",
        "department": "Emergency Management",
        "date": "2024-01-15",
        "outcome": "pending",
        "location": "Demo City",
        "type": "text"
    });
    let Value::Object(sample) = sample else {
        bail!("Sample document is not an object");
    };
    let ingested = client.ingest(&sample).await?;
    println!("{} {} [{}]", "✓".green(), ingested.message, ingested.id);

    println!("\n2. Running sample queries...");
    for query in dataset::load_queries(&queries)? {
        println!("\n{} {}", "Query:".bold(), query);
        let response = client
            .query(&QueryRequest {
                query,
                filters: None,
                limit: 5,
                data_type: "both".to_string(),
                reasoning_mode: "recommendation".to_string(),
            })
            .await?;

        println!("Retrieved {} memories", response.memories.len());
        println!(
            "{} {}",
            "Recommendation:".cyan(),
            truncate_string(&response.reasoning, 300)
        );
        println!("{} {}", "Summary:".cyan(), response.summary);
        println!("{}", "-".repeat(50));
    }

    Ok(())
}

// ============================================
// Helpers
// ============================================

fn read_text(text: Option<String>, file: Option<PathBuf>) -> Result<String> {
    match (text, file) {
        (Some(t), None) => Ok(t),
        (None, Some(f)) => {
            fs::read_to_string(&f).with_context(|| format!("Failed to read file: {:?}", f))
        }
        (Some(_), Some(_)) => bail!("Cannot specify both text and --file"),
        (None, None) => Input::new()
            .with_prompt("Document text")
            .interact_text()
            .context("Failed to read input"),
    }
}

fn query_filters(
    department: Option<String>,
    outcome: Option<String>,
    location: Option<String>,
    tags: Vec<String>,
    from: Option<String>,
    to: Option<String>,
) -> Option<Map<String, Value>> {
    let mut filters = Map::new();
    let fields = [
        ("department", department),
        ("outcome", outcome),
        ("location", location),
        ("date_from", from),
        ("date_to", to),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            filters.insert(key.to_string(), json!(value));
        }
    }
    if !tags.is_empty() {
        filters.insert("tags".to_string(), json!(tags));
    }
    (!filters.is_empty()).then_some(filters)
}

/// Parse `key=value` pairs; values that parse as JSON keep their type
fn parse_pairs(pairs: &[String]) -> Result<Vec<(String, Value)>> {
    pairs
        .iter()
        .map(|pair| {
            let (key, value) = pair
                .split_once('=')
                .with_context(|| format!("Expected key=value, got '{}'", pair))?;
            let key = key.trim();
            if key.is_empty() {
                bail!("Empty key in '{}'", pair);
            }
            let value = serde_json::from_str(value).unwrap_or_else(|_| json!(value));
            Ok((key.to_string(), value))
        })
        .collect()
}

fn print_memory_line(memory: &MemoryResponse) {
    let badge = format!("[{}]", memory.content_type).dimmed();
    let content = memory
        .text
        .as_deref()
        .or(memory.image_url.as_deref())
        .unwrap_or("-");
    println!(
        "  {} {} {} ({}) {}",
        badge,
        memory.id.dimmed(),
        memory.department.cyan(),
        memory.date,
        truncate_string(content, 60)
    );
}

/// Truncate string safely for UTF-8 (by char count, not bytes)
fn truncate_string(s: &str, max_chars: usize) -> String {
    let chars: Vec<char> = s.chars().take(max_chars).collect();
    if s.chars().count() > max_chars {
        format!("{}...", chars.into_iter().collect::<String>())
    } else {
        s.to_string()
    }
}
