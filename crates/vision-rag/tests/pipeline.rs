//! End-to-end pipeline tests with in-process collaborators
//!
//! "PDFs" here are text files with one line per page. The renderer turns each
//! line into a page image holding that line's bytes, the encoder embeds words
//! from a small vocabulary as one-hot vectors, and the generator echoes the
//! pages it was shown. Everything else (staging, index store, MaxSim ranking,
//! image cache, orchestration) is the production code.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

use vision_rag::generation::VisionPrompt;
use vision_rag::providers::{GenerationOptions, PageRenderer, VisionGenerator};
use vision_rag::retrieval::{ColPaliRetriever, MultiVector, PageEncoder};
use vision_rag::{Error, PageImage, RagConfig, RagOrchestrator, Result, NO_RELEVANT_DOCUMENTS};

const VOCABULARY: [&str; 6] = ["figure", "chart", "table", "gamma", "revenue", "growth"];

fn embed_words(text: &str) -> MultiVector {
    text.split_whitespace()
        .map(|word| {
            let word = word
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            VOCABULARY
                .iter()
                .map(|v| if *v == word { 1.0 } else { 0.0 })
                .collect()
        })
        .collect()
}

struct LineRenderer {
    calls: AtomicUsize,
}

#[async_trait]
impl PageRenderer for LineRenderer {
    async fn render(&self, path: &Path) -> Result<Vec<PageImage>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = std::fs::read_to_string(path)?;
        Ok(text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .zip(1u32..)
            .map(|(line, page)| PageImage::new(page, line.as_bytes().to_vec()))
            .collect())
    }

    fn name(&self) -> &str {
        "line"
    }
}

struct WordEncoder {
    fail: AtomicBool,
}

#[async_trait]
impl PageEncoder for WordEncoder {
    async fn encode_pages(&self, pages: &[PageImage]) -> Result<Vec<MultiVector>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::encoder("encoder offline"));
        }
        Ok(pages
            .iter()
            .map(|p| embed_words(&String::from_utf8_lossy(&p.png)))
            .collect())
    }

    async fn encode_query(&self, query: &str) -> Result<MultiVector> {
        Ok(embed_words(query))
    }

    fn model(&self) -> &str {
        "word-encoder"
    }
}

struct EchoGenerator {
    calls: AtomicUsize,
    last_image_count: AtomicUsize,
}

#[async_trait]
impl VisionGenerator for EchoGenerator {
    async fn generate(&self, prompt: &VisionPrompt, options: GenerationOptions) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_image_count
            .store(prompt.images.len(), Ordering::SeqCst);
        let pages: Vec<String> = prompt
            .images
            .iter()
            .map(|p| String::from_utf8_lossy(&p.png).into_owned())
            .collect();
        Ok(format!(
            "[{} image(s), max {} tokens] {}",
            prompt.images.len(),
            options.max_tokens,
            pages.join(" | ")
        ))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "echo"
    }

    fn model(&self) -> &str {
        "echo-vlm"
    }
}

struct Stack {
    rag: RagOrchestrator,
    renderer: Arc<LineRenderer>,
    encoder: Arc<WordEncoder>,
    generator: Arc<EchoGenerator>,
}

/// Boxes an `Arc` so the test keeps a handle on the generator's counters
struct SharedGenerator(Arc<EchoGenerator>);

#[async_trait]
impl VisionGenerator for SharedGenerator {
    async fn generate(&self, prompt: &VisionPrompt, options: GenerationOptions) -> Result<String> {
        self.0.generate(prompt, options).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.0.health_check().await
    }

    fn name(&self) -> &str {
        self.0.name()
    }

    fn model(&self) -> &str {
        self.0.model()
    }
}

fn stack(config: RagConfig) -> Stack {
    let renderer = Arc::new(LineRenderer {
        calls: AtomicUsize::new(0),
    });
    let encoder = Arc::new(WordEncoder {
        fail: AtomicBool::new(false),
    });
    let generator = Arc::new(EchoGenerator {
        calls: AtomicUsize::new(0),
        last_image_count: AtomicUsize::new(0),
    });

    let retriever = ColPaliRetriever::new(
        config.index.index_path.clone(),
        encoder.clone(),
        renderer.clone(),
    );
    let rag = RagOrchestrator::new(
        config,
        Box::new(retriever),
        renderer.clone(),
        Box::new(SharedGenerator(generator.clone())),
    );

    Stack {
        rag,
        renderer,
        encoder,
        generator,
    }
}

struct Workspace {
    _dir: TempDir,
    docs: PathBuf,
    index: PathBuf,
}

fn workspace() -> Workspace {
    let dir = tempfile::tempdir().unwrap();
    let docs = dir.path().join("docs");
    std::fs::create_dir_all(&docs).unwrap();
    std::fs::write(
        docs.join("sample.pdf"),
        "Figure 1: bar chart of quarterly revenue\nTable 1: Alpha 12.5, Beta 45.2, Gamma 78.9\n",
    )
    .unwrap();
    std::fs::write(docs.join("growth.pdf"), "Revenue growth by region\n").unwrap();
    Workspace {
        docs,
        index: dir.path().join("index"),
        _dir: dir,
    }
}

fn config_for(ws: &Workspace) -> RagConfig {
    let mut config = RagConfig::default();
    config.index.index_path = ws.index.clone();
    config
}

fn staging_dirs(index: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(index) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("staging-"))
            })
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[tokio::test]
async fn test_sample_document_single_page_answer() {
    let ws = workspace();
    let mut s = stack(config_for(&ws));

    let files = vec![ws.docs.join("sample.pdf")];
    let name = s
        .rag
        .index_documents(None, Some(files.as_slice()), None, false)
        .await
        .unwrap();
    assert_eq!(name, "sample");

    let answer = s
        .rag
        .answer_with_sources("What does Figure 1 show?", 1, 500)
        .await
        .unwrap();

    assert_eq!(s.generator.calls.load(Ordering::SeqCst), 1);
    assert_eq!(s.generator.last_image_count.load(Ordering::SeqCst), 1);
    assert!(!answer.text.is_empty());
    assert!(answer.text.contains("Figure 1: bar chart"));
    assert_eq!(answer.pages.len(), 1);
    assert_eq!((answer.pages[0].doc_id, answer.pages[0].page_num), (0, 1));
}

#[tokio::test]
async fn test_hidden_file_name_indexes_under_trimmed_name() {
    let ws = workspace();
    let hidden = ws.docs.join(".notes.pdf");
    std::fs::write(&hidden, "Table 3: growth figures\n").unwrap();
    let mut s = stack(config_for(&ws));

    let files = vec![hidden];
    let name = s
        .rag
        .index_documents(None, Some(files.as_slice()), None, false)
        .await
        .unwrap();

    assert_eq!(name, "notes");
    assert!(ws.index.join("notes").join("manifest.json").is_file());
    assert!(staging_dirs(&ws.index).is_empty());
    let documents = s.rag.list_documents().await.unwrap();
    assert_eq!(documents[0].filename, ".notes.pdf");
}

#[tokio::test]
async fn test_reindexing_folder_that_holds_the_index() {
    let ws = workspace();
    let mut config = config_for(&ws);
    config.index.index_path = ws.docs.join("index");
    let mut s = stack(config);

    s.rag
        .index_documents(Some(ws.docs.as_path()), None, Some("docs"), false)
        .await
        .unwrap();
    s.rag
        .index_documents(Some(ws.docs.as_path()), None, Some("docs"), true)
        .await
        .unwrap();

    let documents = s.rag.list_documents().await.unwrap();
    let names: Vec<&str> = documents.iter().map(|d| d.filename.as_str()).collect();
    assert_eq!(names, vec!["growth.pdf", "sample.pdf"]);
}

#[tokio::test]
async fn test_staging_removed_after_success_and_failure() {
    let ws = workspace();
    let mut s = stack(config_for(&ws));
    let files = vec![ws.docs.join("sample.pdf"), ws.docs.join("growth.pdf")];

    s.rag
        .index_documents(None, Some(files.as_slice()), Some("both"), false)
        .await
        .unwrap();
    assert!(staging_dirs(&ws.index).is_empty());

    s.encoder.fail.store(true, Ordering::SeqCst);
    let err = s
        .rag
        .index_documents(None, Some(files.as_slice()), Some("broken"), false)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Encoder(_)));
    assert!(staging_dirs(&ws.index).is_empty());
    assert!(!ws.index.join("broken").exists());
}

#[tokio::test]
async fn test_missing_file_stages_nothing() {
    let ws = workspace();
    let mut s = stack(config_for(&ws));
    let files = vec![ws.docs.join("sample.pdf"), ws.docs.join("missing.pdf")];

    let err = s
        .rag
        .index_documents(None, Some(files.as_slice()), None, false)
        .await
        .unwrap_err();

    match err {
        Error::FileNotFound(path) => assert!(path.ends_with("missing.pdf")),
        other => panic!("expected FileNotFound, got {:?}", other),
    }
    assert!(staging_dirs(&ws.index).is_empty());
    assert_eq!(s.renderer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_index_requires_folder_or_files() {
    let ws = workspace();
    let mut s = stack(config_for(&ws));
    let err = s.rag.index_documents(None, None, None, false).await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[tokio::test]
async fn test_ask_before_index_is_not_indexed() {
    let ws = workspace();
    let mut s = stack(config_for(&ws));
    let err = s.rag.answer_question("What is shown?", 3, 100).await.unwrap_err();
    assert!(matches!(err, Error::NotIndexed));
    assert_eq!(s.generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_no_results_returns_sentinel_without_generation() {
    let ws = workspace();
    let mut s = stack(config_for(&ws));
    s.rag
        .index_documents(Some(ws.docs.as_path()), None, None, false)
        .await
        .unwrap();

    let answer = s.rag.answer_question("anything", 0, 100).await.unwrap();
    assert_eq!(answer, NO_RELEVANT_DOCUMENTS);
    assert_eq!(s.generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_folder_index_answers_deterministically_and_caches_images() {
    let ws = workspace();
    let mut s = stack(config_for(&ws));
    let name = s
        .rag
        .index_documents(Some(ws.docs.as_path()), None, None, false)
        .await
        .unwrap();
    assert_eq!(name, "docs");
    let rendered_while_indexing = s.renderer.calls.load(Ordering::SeqCst);
    assert_eq!(rendered_while_indexing, 2);

    let question = "Which chart shows revenue growth?";
    let first = s.rag.answer_with_sources(question, 3, 200).await.unwrap();
    let second = s.rag.answer_with_sources(question, 3, 200).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.pages.len(), 3);

    // growth.pdf sorts before sample.pdf, so it is document 0
    let order: Vec<(u32, u32)> = first.pages.iter().map(|p| (p.doc_id, p.page_num)).collect();
    assert_eq!(order, vec![(0, 1), (1, 1), (1, 2)]);

    // one render per document on the first answer, none on the second
    assert_eq!(s.rag.cache().len(), 2);
    assert_eq!(
        s.renderer.calls.load(Ordering::SeqCst),
        rendered_while_indexing + 2
    );
    assert_eq!(s.generator.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_existing_index_reopened_from_config() {
    let ws = workspace();
    let mut s = stack(config_for(&ws));
    s.rag
        .index_documents(Some(ws.docs.as_path()), None, Some("reports"), false)
        .await
        .unwrap();

    let err = s
        .rag
        .index_documents(Some(ws.docs.as_path()), None, Some("reports"), false)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::IndexExists(_)));

    let mut config = config_for(&ws);
    config.index.index_name = Some("reports".to_string());
    let mut fresh = stack(config);

    let documents = fresh.rag.list_documents().await.unwrap();
    let names: Vec<&str> = documents.iter().map(|d| d.filename.as_str()).collect();
    assert_eq!(names, vec!["growth.pdf", "sample.pdf"]);

    let answer = fresh.rag.answer_question("gamma table", 1, 50).await.unwrap();
    assert!(answer.contains("Gamma 78.9"));
    assert_eq!(fresh.renderer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_file_index_name_stops_at_first_dot() {
    let ws = workspace();
    let report = ws.docs.join("report.final.pdf");
    std::fs::write(&report, "Figure 2: growth chart\n").unwrap();
    let mut s = stack(config_for(&ws));

    let files = vec![report];
    let name = s
        .rag
        .index_documents(None, Some(files.as_slice()), None, false)
        .await
        .unwrap();
    assert_eq!(name, "report");
    assert_eq!(s.rag.index_name(), Some("report"));
}
