//! vision-rag command line interface
//!
//! Run with: cargo run -p vision-rag -- index --folder ./docs

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Args, CommandFactory, Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vision_rag::ingestion::{write_sample_pdf, PdftoppmRenderer, SAMPLE_QUESTIONS};
use vision_rag::providers::{OllamaVision, VisionGenerator};
use vision_rag::retrieval::{IndexStore, ServiceEncoder};
use vision_rag::{RagConfig, RagOrchestrator};

/// File under the index path naming the most recently built index
const LATEST_FILE: &str = "LATEST";

#[derive(Parser, Debug)]
#[command(
    name = "vision-rag",
    version,
    about = "ColPali + vision-language model multimodal RAG over PDF documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Index documents
    Index {
        #[command(flatten)]
        source: SourceArgs,

        /// Name for the index (defaults to the folder or first file name)
        #[arg(long)]
        index_name: Option<String>,

        /// Overwrite an existing index
        #[arg(long)]
        overwrite: bool,

        #[command(flatten)]
        shared: SharedArgs,
    },

    /// Ask a question
    Ask {
        /// Question to ask
        question: String,

        /// Number of pages to retrieve [default: 3]
        #[arg(long)]
        top_k: Option<usize>,

        /// Maximum tokens in the answer [default: 500]
        #[arg(long)]
        max_tokens: Option<u32>,

        /// Index to answer from (defaults to the last one built)
        #[arg(long)]
        index_name: Option<String>,

        /// Print the pages the answer was based on
        #[arg(long)]
        show_sources: bool,

        #[command(flatten)]
        shared: SharedArgs,
    },

    /// List indexed documents
    List {
        /// Index to list (defaults to the last one built)
        #[arg(long)]
        index_name: Option<String>,

        #[command(flatten)]
        shared: SharedArgs,
    },

    /// Write a two-page sample PDF to try the system on
    Sample {
        /// Output file
        #[arg(long, default_value = "sample_pdfs/sample.pdf")]
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct SourceArgs {
    /// Path to folder containing PDFs
    #[arg(long)]
    folder: Option<PathBuf>,

    /// Paths to PDF files
    #[arg(long, num_args = 1..)]
    files: Option<Vec<PathBuf>>,
}

#[derive(Args, Debug)]
struct SharedArgs {
    /// ColPali model to use
    #[arg(long)]
    colpali_model: Option<String>,

    /// Vision-language model to use
    #[arg(long)]
    vlm_model: Option<String>,

    /// Path to store indexes
    #[arg(long)]
    index_path: Option<PathBuf>,

    /// Use CPU instead of GPU
    #[arg(long)]
    cpu: bool,

    /// Use low memory mode
    #[arg(long)]
    low_memory: bool,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

impl SharedArgs {
    /// Config file (or defaults) with command line overrides applied
    fn load_config(&self) -> anyhow::Result<RagConfig> {
        let mut config = match &self.config {
            Some(path) => RagConfig::load(path)?,
            None => RagConfig::default(),
        };

        if let Some(model) = &self.colpali_model {
            config.models.colpali_model = model.clone();
        }
        if let Some(model) = &self.vlm_model {
            config.models.vlm_model = model.clone();
        }
        if let Some(path) = &self.index_path {
            config.index.index_path = path.clone();
        }
        if self.cpu {
            config.runtime.use_gpu = false;
        }
        if self.low_memory {
            config.runtime.low_memory = true;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the answer
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vision_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        std::process::exit(1);
    };

    match command {
        Commands::Index {
            source,
            index_name,
            overwrite,
            shared,
        } => {
            let config = shared.load_config()?;
            run_index(config, source, index_name, overwrite).await
        }
        Commands::Ask {
            question,
            top_k,
            max_tokens,
            index_name,
            show_sources,
            shared,
        } => {
            let mut config = shared.load_config()?;
            let top_k = top_k.unwrap_or(config.answer.top_k);
            let max_tokens = max_tokens.unwrap_or(config.answer.max_tokens);
            select_index(&mut config, index_name)?;
            run_ask(config, &question, top_k, max_tokens, show_sources).await
        }
        Commands::List { index_name, shared } => {
            let mut config = shared.load_config()?;
            select_index(&mut config, index_name)?;
            run_list(config).await
        }
        Commands::Sample { output } => run_sample(&output),
    }
}

async fn run_index(
    config: RagConfig,
    source: SourceArgs,
    index_name: Option<String>,
    overwrite: bool,
) -> anyhow::Result<()> {
    println!("{}", style("Initializing RAG system...").dim());
    warn_missing_pdftoppm(&config);
    check_encoder(&config).await?;
    let mut rag = RagOrchestrator::from_config(config)?;

    let progress = spinner("Indexing documents...");
    let result = rag
        .index_documents(
            source.folder.as_deref(),
            source.files.as_deref(),
            index_name.as_deref(),
            overwrite,
        )
        .await;
    progress.finish_and_clear();

    let name = result?;
    write_latest(&rag.config().index.index_path, &name)?;
    println!(
        "{} Indexing complete! Index name: {}",
        style("✓").green().bold(),
        style(&name).cyan()
    );
    Ok(())
}

async fn run_ask(
    config: RagConfig,
    question: &str,
    top_k: usize,
    max_tokens: u32,
    show_sources: bool,
) -> anyhow::Result<()> {
    println!("{}", style("Initializing RAG system...").dim());
    warn_missing_pdftoppm(&config);
    check_encoder(&config).await?;
    check_generator(&config).await?;
    let mut rag = RagOrchestrator::from_config(config)?;

    println!("{} {}", style("Question:").bold(), question);
    let progress = spinner("Thinking...");
    let result = rag.answer_with_sources(question, top_k, max_tokens).await;
    progress.finish_and_clear();
    let answer = result?;

    println!("\n{}", style("Answer:").green().bold());
    println!("{}", answer.text);

    if show_sources && !answer.pages.is_empty() {
        let documents = rag.list_documents().await?;
        println!("\n{}", style("Sources:").bold());
        for (i, page) in answer.pages.iter().enumerate() {
            let filename = documents
                .iter()
                .find(|d| d.doc_id == page.doc_id)
                .map(|d| d.filename.as_str())
                .unwrap_or("<unknown>");
            println!(
                "  [{}] {} page {} {}",
                i + 1,
                filename,
                page.page_num,
                style(format!("(score {:.4})", page.score)).dim()
            );
        }
    }
    Ok(())
}

async fn run_list(config: RagConfig) -> anyhow::Result<()> {
    if config.index.index_name.is_none() {
        let names = IndexStore::new(&config.index.index_path).list()?;
        if names.is_empty() {
            println!("No indexes found in {}", config.index.index_path.display());
        } else {
            println!("{}", style("Indexes:").bold());
            for name in names {
                println!("  {}", name);
            }
        }
        return Ok(());
    }

    let mut rag = RagOrchestrator::from_config(config)?;
    let documents = rag.list_documents().await?;
    println!(
        "{} {}",
        style("Index:").bold(),
        rag.index_name().unwrap_or_default()
    );
    for doc in documents {
        println!(
            "  [{}] {} ({} pages)",
            doc.doc_id, doc.filename, doc.page_count
        );
    }
    Ok(())
}

/// Explicit name, else the config file's, else the last index built
fn select_index(config: &mut RagConfig, explicit: Option<String>) -> anyhow::Result<()> {
    if explicit.is_some() {
        config.index.index_name = explicit;
    } else if config.index.index_name.is_none() {
        config.index.index_name = read_latest(&config.index.index_path)?;
    }
    Ok(())
}

fn read_latest(index_path: &Path) -> anyhow::Result<Option<String>> {
    let path = index_path.join(LATEST_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    let name = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = name.trim();
    Ok((!name.is_empty()).then(|| name.to_string()))
}

fn write_latest(index_path: &Path, name: &str) -> anyhow::Result<()> {
    let path = index_path.join(LATEST_FILE);
    std::fs::write(&path, format!("{}\n", name))
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn run_sample(output: &Path) -> anyhow::Result<()> {
    write_sample_pdf(output)?;
    println!(
        "{} Sample PDF created at: {}",
        style("✓").green().bold(),
        style(output.display()).cyan()
    );

    let folder = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    println!("\nNow you can test the RAG system with:");
    println!("  vision-rag index --folder {}", folder.display());
    for question in SAMPLE_QUESTIONS {
        println!("  vision-rag ask \"{}\"", question);
    }
    Ok(())
}

async fn check_encoder(config: &RagConfig) -> anyhow::Result<()> {
    let encoder = ServiceEncoder::new(config)?;
    if !encoder.health_check().await? {
        tracing::warn!("Page encoder service not available at {}", config.encoder.base_url);
        tracing::warn!("Start a ColPali embedding service serving /embed/images and /embed/queries");
    }
    Ok(())
}

async fn check_generator(config: &RagConfig) -> anyhow::Result<()> {
    let generator = OllamaVision::new(config)?;
    if !generator.health_check().await? {
        tracing::warn!("Ollama not available at {}", config.llm.base_url);
        tracing::warn!("Please start Ollama:");
        tracing::warn!("  1. Start: ollama serve");
        tracing::warn!("  2. Pull the model: ollama pull {}", generator.model());
    }
    Ok(())
}

fn warn_missing_pdftoppm(config: &RagConfig) {
    if !PdftoppmRenderer::new(&config.render).has_pdftoppm() {
        tracing::warn!("{} not found; page rendering will fail", config.render.pdftoppm);
        tracing::warn!("Install poppler-utils (apt install poppler-utils / brew install poppler)");
    }
}

fn spinner(message: &str) -> ProgressBar {
    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress.set_message(message.to_string());
    progress.enable_steady_tick(Duration::from_millis(120));
    progress
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_index_requires_exactly_one_source() {
        assert!(Cli::try_parse_from(["vision-rag", "index"]).is_err());
        assert!(Cli::try_parse_from([
            "vision-rag", "index", "--folder", "docs", "--files", "a.pdf"
        ])
        .is_err());

        let cli = Cli::try_parse_from(["vision-rag", "index", "--files", "a.pdf", "b.pdf", "--cpu"])
            .unwrap();
        match cli.command {
            Some(Commands::Index { source, shared, .. }) => {
                assert_eq!(source.files.unwrap().len(), 2);
                assert!(shared.cpu);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_shared_args_override_config() {
        let cli = Cli::try_parse_from([
            "vision-rag", "ask", "What is shown?", "--vlm-model", "llava:13b", "--low-memory",
            "--index-path", "/tmp/idx",
        ])
        .unwrap();
        let Some(Commands::Ask { shared, top_k, .. }) = cli.command else {
            panic!("expected ask");
        };
        assert!(top_k.is_none());

        let config = shared.load_config().unwrap();
        assert_eq!(config.models.vlm_model, "llava:13b");
        assert!(config.runtime.low_memory);
        assert!(config.runtime.use_gpu);
        assert_eq!(config.index.index_path, PathBuf::from("/tmp/idx"));
    }

    #[test]
    fn test_sample_defaults_to_sample_pdfs() {
        let cli = Cli::try_parse_from(["vision-rag", "sample"]).unwrap();
        match cli.command {
            Some(Commands::Sample { output }) => {
                assert_eq!(output, PathBuf::from("sample_pdfs/sample.pdf"))
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_run_sample_writes_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("pdfs").join("sample.pdf");
        run_sample(&output).unwrap();
        assert!(std::fs::read(&output).unwrap().starts_with(b"%PDF-1.5"));
    }

    #[test]
    fn test_latest_index_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_latest(dir.path()).unwrap(), None);

        write_latest(dir.path(), "reports").unwrap();
        let mut config = RagConfig::default();
        config.index.index_path = dir.path().to_path_buf();
        select_index(&mut config, None).unwrap();
        assert_eq!(config.index.index_name.as_deref(), Some("reports"));

        select_index(&mut config, Some("other".to_string())).unwrap();
        assert_eq!(config.index.index_name.as_deref(), Some("other"));
    }
}
