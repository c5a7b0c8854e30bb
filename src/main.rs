// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tamilguardian::api::{self, AppState};
use tamilguardian::database::LegalRetriever;
use tamilguardian::ingest::CorpusIngestor;
use tamilguardian::mcp::{ExternalMcpClient, LegalAssistantMcp};
use tamilguardian::models::{LegalQuery, UploadedDocument, UserPreferences};
use tamilguardian::utils::logging::{format_error, format_info, format_success, format_warning};
use tamilguardian::utils::Validator;
use tamilguardian::{Config, LegalOrchestrator, ToolRegistry, report};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "tamilguardian")]
#[command(version)]
#[command(about = "Legal assistant for Tamil Nadu residents: RAG over statutes, web search, drafting and narration", long_about = None)]
struct Cli {
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API (default)
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Answer one legal question and print the markdown report
    Query {
        question: String,

        /// Document to attach (PDF, DOCX, markdown or text); repeatable
        #[arg(short, long = "document", value_name = "FILE")]
        documents: Vec<PathBuf>,

        #[arg(long)]
        audio: bool,

        #[arg(long)]
        allow_pii: bool,

        #[arg(long, default_value = "English")]
        language: String,

        #[arg(long)]
        voice_id: Option<String>,

        /// Print the raw execution result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check the health of every tool server
    Health,

    /// Index a directory of markdown statutes into the vector store
    Index {
        dir: PathBuf,

        #[arg(long)]
        force: bool,
    },

    /// Search the indexed statutes by semantic similarity
    Search {
        query: String,

        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },

    /// Start the MCP server over stdio for agentic tool integration
    Mcp,

    /// List the tools an external MCP server offers
    McpTools { server: String },

    /// Call a tool on an external MCP server
    McpCall {
        server: String,

        tool: String,

        /// JSON object of tool arguments
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    tamilguardian::utils::logging::init_logger(cli.color, cli.verbose || config.server.debug);

    info!("TamilGuardian legal assistant");

    match cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
    }) {
        Commands::Serve { host, port } => cmd_serve(&config, host, port).await?,
        Commands::Query {
            question,
            documents,
            audio,
            allow_pii,
            language,
            voice_id,
            json,
        } => {
            let preferences = UserPreferences {
                enable_audio: audio,
                language,
                allow_pii,
                voice_id,
            };
            cmd_query(&config, question, &documents, preferences, json).await?
        }
        Commands::Health => cmd_health(&config).await?,
        Commands::Index { dir, force } => cmd_index(&config, &dir, force, cli.color).await?,
        Commands::Search { query, limit } => cmd_search(&config, &query, limit).await?,
        Commands::Mcp => cmd_mcp(&config).await?,
        Commands::McpTools { server } => cmd_mcp_tools(&config, &server).await?,
        Commands::McpCall { server, tool, args } => {
            cmd_mcp_call(&config, &server, &tool, &args).await?
        }
    }

    Ok(())
}

/// A missing config file is not an error; defaults and the environment still apply.
fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        Config::load(Some(path)).context("Failed to load configuration")
    } else {
        Config::load(None).context("Failed to load configuration")
    }
}

async fn build_orchestrator(config: &Config) -> Result<Arc<LegalOrchestrator>> {
    let orchestrator = LegalOrchestrator::from_config(config)
        .await
        .context("Failed to initialize tool servers")?;
    Ok(Arc::new(orchestrator))
}

async fn cmd_serve(config: &Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

    let orchestrator = build_orchestrator(config).await?;
    if config.server.secret_key.is_none() {
        warn!("SECRET_KEY not set, /api routes are unauthenticated");
    }

    let state = AppState::new(orchestrator, config.server.secret_key.clone());
    // room for a few uploads at the per-document limit
    let body_limit = config.parser.max_document_mb.max(1) * 1024 * 1024 * 4;
    let router = api::create_router(state, body_limit);

    api::serve(router, addr).await.context("HTTP server failed")?;
    Ok(())
}

async fn cmd_query(
    config: &Config,
    question: String,
    paths: &[PathBuf],
    preferences: UserPreferences,
    json: bool,
) -> Result<()> {
    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        Validator::validate_file_path(path)?;
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path.file_name().map(|n| n.to_string_lossy().to_string());
        documents.push(UploadedDocument::new(name, bytes));
    }

    let orchestrator = build_orchestrator(config).await?;
    let query = LegalQuery::new(question)
        .with_documents(documents)
        .with_preferences(preferences);
    let result = orchestrator.process_legal_query(query).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", report::render_markdown(&result));
    }

    if !result.success {
        anyhow::bail!("Query failed: {}", result.error.unwrap_or_default());
    }
    Ok(())
}

async fn cmd_health(config: &Config) -> Result<()> {
    let orchestrator = build_orchestrator(config).await?;
    let health = orchestrator.health_check().await;

    println!("{}", health.format());

    if health.is_unhealthy() {
        eprintln!("{}", format_warning("One or more tool servers are unhealthy"));
    } else {
        eprintln!("{}", format_success("All tool servers reachable"));
    }
    Ok(())
}

async fn cmd_index(config: &Config, dir: &Path, force: bool, color: bool) -> Result<()> {
    info!("Indexing corpus from {}", dir.display());

    let retriever = LegalRetriever::open(&config.rag)
        .await
        .context("Failed to open vector store")?;

    let stats = CorpusIngestor::new(&retriever, &config.ingest)
        .with_progress(color)
        .run(dir, force)
        .await
        .context("Corpus ingestion failed")?;

    let line = format!(
        "Indexed {} of {} files ({} unchanged, {} failed) in {:.2}s",
        stats.files_indexed,
        stats.files_found,
        stats.files_unchanged,
        stats.files_failed,
        stats.duration_secs
    );
    if stats.files_failed > 0 {
        eprintln!("{}", format_warning(&line));
    } else {
        eprintln!("{}", format_success(&line));
    }
    Ok(())
}

async fn cmd_search(config: &Config, query: &str, limit: usize) -> Result<()> {
    info!("Searching for: {}", query);

    let retriever = LegalRetriever::open(&config.rag)
        .await
        .context("Failed to open vector store")?;
    let results = retriever
        .search(query, limit.max(1))
        .await
        .context("Vector search failed")?;

    if results.is_empty() {
        println!("\nNo results found for query: \"{}\"\n", query);
        println!("Try:");
        println!("  - Using different search terms");
        println!("  - Checking that statutes have been indexed");
        return Ok(());
    }

    println!("\nSearch Results for: \"{}\"\n", query);
    println!("Found {} result(s)\n", results.len());
    println!("{}", "=".repeat(80));

    for (idx, result) in results.iter().enumerate() {
        println!("\n{}. {} (Score: {:.4})", idx + 1, result.title, result.score);
        println!(
            "   {} | {}",
            result.jurisdiction.as_str(),
            result.source_type.as_str()
        );

        if let Some(distance) = result.distance {
            println!("   Distance: {:.4}", distance);
        }

        println!("   Preview:");
        for line in Validator::truncate_text(&result.content, 300).lines().take(5) {
            println!("     {}", line);
        }
    }

    println!("\n{}", "=".repeat(80));
    Ok(())
}

async fn cmd_mcp(config: &Config) -> Result<()> {
    let orchestrator = build_orchestrator(config).await?;
    let server = LegalAssistantMcp::new(orchestrator);

    info!("MCP server ready. Available tools:");
    for tool in server.tool_names() {
        info!("  - {}", tool);
    }

    server.serve_stdio().await.context("MCP server failed")?;
    Ok(())
}

/// External servers only; the built-in tool servers are not opened.
fn external_registry(config: &Config) -> ToolRegistry {
    ToolRegistry::new().with_external(ExternalMcpClient::new(&config.mcp))
}

async fn cmd_mcp_tools(config: &Config, server: &str) -> Result<()> {
    let out = external_registry(config).list_external_tools(server).await;
    print_external(&out)
}

async fn cmd_mcp_call(config: &Config, server: &str, tool: &str, args: &str) -> Result<()> {
    let arguments: serde_json::Value =
        serde_json::from_str(args).context("--args must be a JSON object")?;
    if !arguments.is_object() {
        anyhow::bail!("--args must be a JSON object");
    }

    let out = external_registry(config)
        .call_external(server, tool, arguments)
        .await;
    print_external(&out)
}

fn print_external(out: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(out)?);

    if tamilguardian::tools::is_failure(out) {
        let message = out["error"].as_str().unwrap_or("unknown error");
        eprintln!("{}", format_error(message));
        anyhow::bail!("External MCP call failed");
    }
    eprintln!("{}", format_info("External MCP call succeeded"));
    Ok(())
}
