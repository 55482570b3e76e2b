mod interactive;
mod server;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mentor_core::{
    load_records_file, sample_records, EmbeddingProvider, HashEmbeddingProvider, MentorError,
    MentorService, MiniLmEmbeddingProvider, DEFAULT_EMBEDDING_DIM, DEFAULT_SEARCH_TOP_K,
    DEFAULT_STORE_PATH,
};
use std::fs::{self, File};
use std::io::Read;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "mentor", version)]
#[command(about = "Score learner answers against a reference Q&A set")]
struct Cli {
    /// Location of the trained store.
    #[arg(long, global = true, env = "MENTOR_STORE", default_value = DEFAULT_STORE_PATH)]
    store: PathBuf,

    /// all-MiniLM-L6-v2 weights (.safetensors). Without it a hashing embedder is used.
    #[arg(long, global = true, env = "MENTOR_MODEL_PATH")]
    model_path: Option<PathBuf>,

    /// tokenizer.json matching --model-path.
    #[arg(long, global = true, env = "MENTOR_TOKENIZER_PATH")]
    tokenizer_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Embed a reference set and replace the stored one.
    Train {
        /// .json or .csv file with question, answer and optional topic.
        #[arg(long, required_unless_present = "sample", conflicts_with = "sample")]
        input: Option<PathBuf>,
        /// Train on the bundled python/math reference set.
        #[arg(long)]
        sample: bool,
        /// Also write the bundled set out as JSON.
        #[arg(long, requires = "sample")]
        write_sample: Option<PathBuf>,
    },
    Evaluate {
        #[arg(long)]
        question: String,
        #[arg(long)]
        answer: String,
        #[arg(long)]
        json: bool,
    },
    Search {
        #[arg(long)]
        query: String,
        #[arg(long, default_value_t = DEFAULT_SEARCH_TOP_K)]
        top_k: usize,
        #[arg(long)]
        json: bool,
    },
    Topics,
    /// Line-oriented evaluation loop on stdin.
    Interactive,
    Serve {
        #[arg(long, env = "MENTOR_HOST", default_value = "0.0.0.0")]
        host: String,
        #[arg(long, env = "MENTOR_PORT", default_value_t = 8000)]
        port: u16,
    },
}

/// Only BERT-layout safetensors (all-MiniLM-L6-v2) are understood.
fn ensure_minilm_safetensors(path: &Path) -> Result<()> {
    let mut file =
        File::open(path).with_context(|| format!("open safetensors: {}", path.display()))?;

    // u64 little-endian header length, then the JSON header
    let mut size_buf = [0u8; 8];
    file.read_exact(&mut size_buf)
        .context("read safetensors header size")?;
    let header_size = u64::from_le_bytes(size_buf) as usize;

    let mut header_buf = vec![0u8; header_size.min(10 * 1024 * 1024)];
    file.read_exact(&mut header_buf)
        .context("read safetensors header JSON")?;

    if String::from_utf8_lossy(&header_buf).contains("encoder.layer.0.attention.self.query.weight") {
        Ok(())
    } else {
        anyhow::bail!(
            "{} is not an all-MiniLM-L6-v2 checkpoint (no BERT encoder.layer.* tensors)",
            path.display()
        )
    }
}

fn make_embedder(cli: &Cli) -> Result<Arc<dyn EmbeddingProvider>> {
    match (&cli.model_path, &cli.tokenizer_path) {
        (Some(model), Some(tokenizer)) => {
            match model.extension().and_then(|e| e.to_str()) {
                Some("safetensors") => ensure_minilm_safetensors(model)?,
                other => anyhow::bail!(
                    "unsupported model format '.{}' (expected .safetensors)",
                    other.unwrap_or("")
                ),
            }
            tracing::info!(model = %model.display(), "loading embedding model");
            Ok(Arc::new(MiniLmEmbeddingProvider::load(model, tokenizer)?))
        }
        (None, None) => Ok(Arc::new(HashEmbeddingProvider::new(DEFAULT_EMBEDDING_DIM))),
        _ => anyhow::bail!("--model-path and --tokenizer-path must both be provided"),
    }
}

/// Restores the trained store, or explains how to create one.
fn open_service(cli: &Cli) -> Result<MentorService> {
    let service = MentorService::new(make_embedder(cli)?);
    match service.restore(&cli.store) {
        Ok(_) => Ok(service),
        Err(MentorError::NotFound(path)) => anyhow::bail!(
            "no trained store at {}; run `mentor train` first",
            path.display()
        ),
        Err(err) => Err(err).context("load trained store"),
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Train {
            input,
            sample,
            write_sample,
        } => {
            let records = match input {
                Some(path) => load_records_file(path)
                    .with_context(|| format!("read training data {}", path.display()))?,
                None if *sample => sample_records(),
                None => anyhow::bail!("either --input or --sample is required"),
            };

            if let Some(out) = write_sample {
                if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                let json = serde_json::to_string_pretty(&records)?;
                fs::write(out, json).with_context(|| format!("write {}", out.display()))?;
            }

            let service = MentorService::new(make_embedder(&cli)?);
            let summary = service.train(records, &cli.store)?;
            let topics = service.list_topics()?;
            println!(
                "status={} items={} topics={} embedder={} store={}",
                summary.status,
                summary.item_count,
                topics.into_iter().collect::<Vec<_>>().join(","),
                service.embedder().name(),
                cli.store.display()
            );
        }
        Commands::Evaluate {
            question,
            answer,
            json,
        } => {
            let service = open_service(&cli)?;
            let result = service.evaluate(question, answer)?;

            if *json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("topic={}", result.topic);
                println!("matched_question={}", result.matched_question);
                println!("question_match_score={:.4}", result.question_match_score);
                println!("answer_match_score={:.4}", result.answer_match_score);
                println!("overall_score={:.4}", result.overall_score);
                println!("feedback={}", result.feedback);
            }
        }
        Commands::Search { query, top_k, json } => {
            let service = open_service(&cli)?;
            let results = service.search(query, Some(*top_k))?;

            if *json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                for (i, m) in results.iter().enumerate() {
                    println!(
                        "rank={} similarity={:.4} topic={} question={}",
                        i + 1,
                        m.similarity,
                        m.topic,
                        m.question
                    );
                }
            }
        }
        Commands::Topics => {
            for topic in open_service(&cli)?.list_topics()? {
                println!("{topic}");
            }
        }
        Commands::Interactive => {
            let service = open_service(&cli)?;
            interactive::run(&service, std::io::stdin().lock(), std::io::stdout().lock())?;
        }
        Commands::Serve { host, port } => {
            let addr: SocketAddr = format!("{host}:{port}")
                .parse()
                .with_context(|| format!("invalid listen address {host}:{port}"))?;

            let service = MentorService::new(make_embedder(&cli)?);
            match service.restore(&cli.store) {
                Ok(count) => tracing::info!(items = count, "model loaded"),
                Err(MentorError::NotFound(_)) => tracing::warn!(
                    store = %cli.store.display(),
                    "no trained store; train through /api/train or /api/upload"
                ),
                Err(err) => tracing::error!(error = %err, "failed to load store, starting empty"),
            }

            let state = server::AppState::new(service, cli.store.clone());
            tokio::runtime::Runtime::new()
                .context("start tokio runtime")?
                .block_on(server::serve(state, addr))?;
        }
    }

    Ok(())
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
