//! Graphloom CLI
//!
//! A command-line interface for building a knowledge graph from text and
//! asking questions against it.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use graphloom_agents::{Answer, Answerer, Extractor, Ingestor, LlmClient};
use graphloom_core::Chunk;
use graphloom_db::{init_memory, init_persistent, Repository};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Minimum paragraph length worth extracting from
const MIN_CHUNK_CHARS: usize = 20;

/// Graphloom - turn text into a queryable knowledge graph
#[derive(Parser)]
#[command(name = "graphloom")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database path (defaults to ~/.graphloom/data)
    #[arg(short, long)]
    db_path: Option<PathBuf>,

    /// Use in-memory database (for testing)
    #[arg(long)]
    memory: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract triples from a text file and merge them into the graph
    Ingest {
        /// Path to the text file (not needed with --resume)
        #[arg(required_unless_present = "resume")]
        path: Option<PathBuf>,

        /// Source label stored with each chunk (defaults to the file name)
        #[arg(short, long)]
        source: Option<String>,

        /// Directory for the chunk/triple tables (enables replay)
        #[arg(long)]
        artifacts_dir: Option<PathBuf>,

        /// Replay triples from the artifacts directory instead of extracting
        #[arg(long, requires = "artifacts_dir")]
        resume: bool,
    },

    /// Ask a natural-language question against the graph
    Ask {
        /// The question
        question: String,
    },

    /// Show the current node labels and relation types
    Schema,

    /// Show graph statistics
    Stats,

    /// List nodes in the graph
    ListNodes {
        /// Maximum results
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// List edges in the graph
    ListRelations {
        /// Maximum results
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Interactive mode
    Interactive,

    /// Delete the local database (fresh start)
    ResetDb {
        /// Database path (defaults to ~/.graphloom/data)
        #[arg(short, long)]
        db_path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Commands::ResetDb { db_path } = &cli.command {
        let path = db_path.clone().unwrap_or_else(default_db_path);

        if path.exists() {
            std::fs::remove_dir_all(&path)
                .with_context(|| format!("Failed to remove db at {}", path.display()))?;
            println!("✓ Removed database at {}", path.display());
        } else {
            println!("Database not found at {}, nothing to remove", path.display());
        }
        return Ok(());
    }

    let db = if cli.memory {
        info!("Using in-memory database");
        init_memory().await?
    } else {
        let db_path = cli.db_path.unwrap_or_else(default_db_path);

        // Ensure directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("Using database at: {}", db_path.display());
        init_persistent(&db_path).await?
    };

    let repo = Repository::new(db);
    let llm = LlmClient::default_local();

    // Check the generative backend only for commands that reach it
    let needs_llm = match &cli.command {
        Commands::Ingest { resume, .. } => !resume,
        Commands::Ask { .. } | Commands::Interactive => true,
        _ => false,
    };

    if needs_llm {
        let llm_ok = llm.health().await.unwrap_or(false);
        if !llm_ok {
            eprintln!("Error: generative backend is not reachable.");
            eprintln!("  Backend: {} (model {})", llm.base_url(), llm.model());
            eprintln!("Start it, or point GRAPHLOOM_LLM_URL at a running instance.");
            anyhow::bail!("Generative backend unavailable");
        }
    }

    match cli.command {
        Commands::Ingest {
            path,
            source,
            artifacts_dir,
            resume,
        } => {
            cmd_ingest(repo, llm, path, source, artifacts_dir, resume).await?;
        }
        Commands::Ask { question } => {
            cmd_ask(repo, llm, &question).await?;
        }
        Commands::Schema => {
            cmd_schema(repo).await?;
        }
        Commands::Stats => {
            cmd_stats(repo).await?;
        }
        Commands::ListNodes { limit } => {
            cmd_list_nodes(repo, limit).await?;
        }
        Commands::ListRelations { limit } => {
            cmd_list_relations(repo, limit).await?;
        }
        Commands::Interactive => {
            cmd_interactive(repo, llm).await?;
        }
        Commands::ResetDb { .. } => {
            // Handled before database init.
        }
    }

    Ok(())
}

fn default_db_path() -> PathBuf {
    let mut path = dirs::home_dir().expect("Could not find home directory");
    path.push(".graphloom");
    path.push("data");
    path
}

/// Split file content into paragraph chunks.
///
/// Chunking is the concern of whatever feeds the pipeline; the engines only
/// ever see finished chunks with stable ids.
fn split_into_chunks(content: &str, source: &str) -> Vec<Chunk> {
    content
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty() && p.len() > MIN_CHUNK_CHARS)
        .map(|p| Chunk::new(p, source))
        .collect()
}

async fn cmd_ingest(
    repo: Repository,
    llm: LlmClient,
    path: Option<PathBuf>,
    source: Option<String>,
    artifacts_dir: Option<PathBuf>,
    resume: bool,
) -> Result<()> {
    let ingestor = Ingestor::new(repo, Extractor::new(llm));

    let report = if resume {
        let dir = artifacts_dir.expect("clap enforces artifacts_dir with --resume");
        ingestor.resume_from_artifacts(&dir).await?
    } else {
        let path = path.expect("clap enforces path without --resume");
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let source = source.unwrap_or_else(|| {
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "unknown".to_string())
        });

        let chunks = split_into_chunks(&content, &source);
        if chunks.is_empty() {
            anyhow::bail!("No usable chunks in {}", path.display());
        }
        println!("Split {} into {} chunks", path.display(), chunks.len());

        match artifacts_dir {
            Some(dir) => ingestor.ingest_with_artifacts(&chunks, &dir).await?,
            None => ingestor.ingest(&chunks).await?,
        }
    };

    println!("\n✓ Ingest complete:");
    println!("  • Chunks processed: {}", report.chunks_processed);
    println!("  • Triples extracted: {}", report.triples_extracted);
    println!("  • Node merges: {}", report.nodes_touched);
    println!("  • Edge merges: {}", report.edges_touched);
    if report.upserts_failed > 0 {
        println!("  • Failed upserts: {}", report.upserts_failed);
    }

    Ok(())
}

async fn cmd_ask(repo: Repository, llm: LlmClient, question: &str) -> Result<()> {
    let answerer = Answerer::new(repo, llm);
    let answer = answerer.ask(question).await?;
    print_answer(&answer);
    Ok(())
}

fn print_answer(answer: &Answer) {
    match answer {
        Answer::Graph(matches) => {
            println!("Found {} matches:\n", matches.len());
            for m in matches {
                println!(
                    "• {} —[{}]→ {}",
                    m.node_text(),
                    m.relationship_type,
                    m.related_node_text()
                );
                if let Some(detail) = m.detail() {
                    if detail != m.relationship_type {
                        println!("  {}", detail);
                    }
                }
            }
        }
        Answer::Fallback(text) => {
            println!("{}", text);
        }
    }
}

async fn cmd_schema(repo: Repository) -> Result<()> {
    let schema = repo.schema().await?;

    if schema.is_empty() {
        println!("The graph is empty. Ingest something first: graphloom ingest <file>");
        return Ok(());
    }

    println!("Entity labels ({}):", schema.labels.len());
    for label in &schema.labels {
        println!("  • {}", label);
    }

    println!("\nRelation types ({}):", schema.relationship_types.len());
    for rel in &schema.relationship_types {
        println!("  • {}", rel);
    }

    Ok(())
}

async fn cmd_stats(repo: Repository) -> Result<()> {
    let stats = repo.stats().await?;

    println!("Graph statistics:");
    println!("  • Nodes: {}", stats.node_count);
    println!("  • Relations: {}", stats.relation_count);

    Ok(())
}

async fn cmd_list_nodes(repo: Repository, limit: usize) -> Result<()> {
    let nodes = repo.list_nodes(limit).await?;

    if nodes.is_empty() {
        println!("No nodes yet.");
        return Ok(());
    }

    println!("Nodes ({}):\n", nodes.len());
    for node in nodes {
        let annotation = if node.entity.is_empty() {
            String::new()
        } else {
            format!(" [{}]", node.entity)
        };
        println!("• {}{} (importance {})", node.name, annotation, node.importance);
    }

    Ok(())
}

async fn cmd_list_relations(repo: Repository, limit: usize) -> Result<()> {
    let edges = repo.list_relations(limit).await?;

    if edges.is_empty() {
        println!("No relations yet.");
        return Ok(());
    }

    println!("Relations ({}):\n", edges.len());
    for edge in edges {
        println!(
            "• {} —[{}]→ {} (importance {})",
            edge.from_node, edge.relation_type, edge.to_node, edge.importance
        );
    }

    Ok(())
}

async fn cmd_interactive(repo: Repository, llm: LlmClient) -> Result<()> {
    let ingestor = Ingestor::new(repo.clone(), Extractor::new(llm.clone()));
    let answerer = Answerer::new(repo.clone(), llm);

    println!("Graphloom - Interactive Mode");
    println!("Commands: ask, ingest, schema, stats, help, quit");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("graphloom> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }

        let parts: Vec<&str> = line.trim().splitn(2, ' ').collect();
        let cmd = parts.first().copied().unwrap_or("");
        let arg = parts.get(1).copied().unwrap_or("");

        match cmd {
            "" => continue,

            "ask" | "a" => {
                if arg.is_empty() {
                    println!("Usage: ask <question>");
                    continue;
                }
                match answerer.ask(arg).await {
                    Ok(answer) => print_answer(&answer),
                    Err(e) => println!("Error: {}", e),
                }
            }

            "ingest" | "i" => {
                if arg.is_empty() {
                    println!("Usage: ingest <file>");
                    continue;
                }
                let path = PathBuf::from(arg);
                match std::fs::read_to_string(&path) {
                    Ok(content) => {
                        let source = path
                            .file_name()
                            .map(|name| name.to_string_lossy().into_owned())
                            .unwrap_or_else(|| "unknown".to_string());
                        let chunks = split_into_chunks(&content, &source);
                        match ingestor.ingest(&chunks).await {
                            Ok(report) => println!(
                                "✓ {} chunks, {} triples, {} edge merges",
                                report.chunks_processed,
                                report.triples_extracted,
                                report.edges_touched
                            ),
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    Err(e) => println!("Error reading {}: {}", path.display(), e),
                }
            }

            "schema" => match repo.schema().await {
                Ok(schema) => {
                    let labels: Vec<_> = schema.labels.iter().cloned().collect();
                    let rels: Vec<_> = schema.relationship_types.iter().cloned().collect();
                    println!("Labels: {}", labels.join(", "));
                    println!("Relations: {}", rels.join(", "));
                }
                Err(e) => println!("Error: {}", e),
            },

            "stats" => match repo.stats().await {
                Ok(s) => println!("Nodes: {}, Relations: {}", s.node_count, s.relation_count),
                Err(e) => println!("Error: {}", e),
            },

            "help" | "h" | "?" => {
                println!("Commands:");
                println!("  ask <question>   - Ask the graph a question");
                println!("  ingest <file>    - Extract a file into the graph");
                println!("  schema           - Show labels and relation types");
                println!("  stats            - Show statistics");
                println!("  quit             - Exit");
            }

            "quit" | "q" | "exit" => {
                println!("Goodbye!");
                break;
            }

            _ => {
                println!("Unknown command: {}. Type 'help' for available commands.", cmd);
            }
        }

        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_into_chunks() {
        let content = "First paragraph with enough text to keep.\n\n\
                       short\n\n\
                       Second paragraph, also long enough to keep around.";
        let chunks = split_into_chunks(content, "doc.txt");

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].content.starts_with("First paragraph"));
        assert_eq!(chunks[0].source, "doc.txt");
        assert_ne!(chunks[0].id, chunks[1].id);
    }

    #[test]
    fn test_split_empty_content() {
        assert!(split_into_chunks("", "doc.txt").is_empty());
        assert!(split_into_chunks("\n\n\n\n", "doc.txt").is_empty());
    }
}
