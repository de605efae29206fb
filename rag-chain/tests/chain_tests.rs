use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use futures::future::BoxFuture;
use rag_chain::{ChainConfig, ChainError, ChainState, GenerationProvider, RagChain};
use rag_store::{
    CollectionBinding, EmbeddingsProvider, InMemoryIndex, IndexPoint, RagError, RetrievableUnit,
    Retriever, RetrieverConfig, UnitMetadata, VectorIndex,
};

/// Two-bucket embedder: "headphone" vs everything else.
struct TopicEmbedder;

impl EmbeddingsProvider for TopicEmbedder {
    fn name(&self) -> &str {
        "topic"
    }

    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, RagError>> {
        let v = if text.to_lowercase().contains("headphone") {
            vec![1.0, 0.0]
        } else {
            vec![0.0, 1.0]
        };
        Box::pin(async move { Ok(v) })
    }
}

struct DownEmbedder;

impl EmbeddingsProvider for DownEmbedder {
    fn name(&self) -> &str {
        "down"
    }

    fn embed<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, RagError>> {
        Box::pin(async { Err(RagError::Embedding("connection refused".into())) })
    }
}

/// Records prompts and replies with a fixed answer or error.
struct RecordingGenerator {
    reply: Result<&'static str, &'static str>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl RecordingGenerator {
    fn ok(reply: &'static str) -> Self {
        Self {
            reply: Ok(reply),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    fn failing(cause: &'static str) -> Self {
        Self {
            reply: Err(cause),
            ..Self::ok("")
        }
    }
}

impl GenerationProvider for RecordingGenerator {
    fn name(&self) -> &str {
        "recording"
    }

    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, ChainError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            self.reply
                .map(str::to_string)
                .map_err(|e| ChainError::GenerationFailure(e.to_string()))
        })
    }
}

fn unit(name: &str, body: &str) -> RetrievableUnit {
    RetrievableUnit {
        body: body.into(),
        metadata: UnitMetadata {
            product_name: name.into(),
            product_rating: 4.0,
            product_summary: "Good bass".into(),
        },
    }
}

async fn seeded_retriever(top_k: usize) -> Arc<Retriever> {
    let index = Arc::new(InMemoryIndex::new());
    let coll = index.open_collection("reviews").await.unwrap();
    coll.ensure_created(2).await.unwrap();
    coll.insert_many(vec![
        IndexPoint {
            id: "1".into(),
            vector: vec![1.0, 0.0],
            unit: unit("Headphone X", "Great budget headphone under $20"),
        },
        IndexPoint {
            id: "2".into(),
            vector: vec![0.0, 1.0],
            unit: unit("Speaker Y", "Loud speaker for parties"),
        },
    ])
    .await
    .unwrap();

    Arc::new(
        Retriever::new(
            RetrieverConfig::new("reviews").with_top_k(top_k),
            index,
            Arc::new(TopicEmbedder),
        )
        .unwrap(),
    )
}

#[tokio::test]
async fn answers_headphone_question_with_context_and_returns_output_unmodified() {
    let generator = Arc::new(RecordingGenerator::ok("  Headphone X is the pick.\n"));
    let chain = RagChain::new(
        ChainConfig::default(),
        seeded_retriever(1).await,
        generator.clone(),
    )
    .unwrap();

    let question = "Can you tell me the low budget headphone?";
    let run = chain.answer_traced(question).await;
    assert_eq!(run.result.unwrap(), "  Headphone X is the pick.\n");
    assert_eq!(
        run.states,
        [
            ChainState::Received,
            ChainState::Retrieving,
            ChainState::PromptAssembled,
            ChainState::Generating,
            ChainState::Completed,
        ]
    );

    let prompts = generator.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Great budget headphone under $20"));
    assert!(prompts[0].contains(question));
    assert!(!prompts[0].contains("Loud speaker"));
}

#[tokio::test]
async fn context_bodies_are_joined_in_rank_order() {
    let generator = Arc::new(RecordingGenerator::ok("ok"));
    let chain = RagChain::new(
        ChainConfig::default(),
        seeded_retriever(2).await,
        generator.clone(),
    )
    .unwrap();

    chain.answer("which headphone?").await.unwrap();
    let prompts = generator.prompts.lock().unwrap();
    assert!(prompts[0].contains("Great budget headphone under $20\n\nLoud speaker for parties"));
}

#[tokio::test]
async fn retrieval_failure_never_reaches_generation() {
    let retriever = Arc::new(
        Retriever::new(
            RetrieverConfig::new("reviews"),
            Arc::new(InMemoryIndex::new()),
            Arc::new(DownEmbedder),
        )
        .unwrap(),
    );
    let generator = Arc::new(RecordingGenerator::ok("should not be used"));
    let chain = RagChain::new(ChainConfig::default(), retriever, generator.clone()).unwrap();

    let run = chain.answer_traced("anything").await;
    assert!(matches!(run.result, Err(ChainError::RetrievalUnavailable(_))));
    assert_eq!(
        run.states,
        [ChainState::Received, ChainState::Retrieving, ChainState::Failed]
    );
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn generation_failure_is_typed() {
    let chain = RagChain::new(
        ChainConfig::default(),
        seeded_retriever(1).await,
        Arc::new(RecordingGenerator::failing("quota exceeded")),
    )
    .unwrap();

    let run = chain.answer_traced("headphone?").await;
    match run.result {
        Err(ChainError::GenerationFailure(msg)) => assert!(msg.contains("quota exceeded")),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(run.states.last(), Some(&ChainState::Failed));
}

#[tokio::test]
async fn empty_generation_is_a_failure() {
    let chain = RagChain::new(
        ChainConfig::default(),
        seeded_retriever(1).await,
        Arc::new(RecordingGenerator::ok("   ")),
    )
    .unwrap();
    assert!(matches!(
        chain.answer("headphone?").await,
        Err(ChainError::GenerationFailure(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn slow_generation_times_out() {
    let generator = RecordingGenerator {
        delay: Some(Duration::from_secs(120)),
        ..RecordingGenerator::ok("late")
    };
    let cfg = ChainConfig {
        generation_timeout: Duration::from_secs(5),
        ..ChainConfig::default()
    };
    let chain = RagChain::new(cfg, seeded_retriever(1).await, Arc::new(generator)).unwrap();
    match chain.answer("headphone?").await {
        Err(ChainError::GenerationFailure(msg)) => assert!(msg.contains("timed out")),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn unknown_template_is_config_error() {
    let cfg = ChainConfig {
        prompt: "support_bot".into(),
        ..ChainConfig::default()
    };
    let res = RagChain::new(
        cfg,
        seeded_retriever(1).await,
        Arc::new(RecordingGenerator::ok("x")),
    );
    assert!(matches!(res, Err(ChainError::Config(_))));
}
