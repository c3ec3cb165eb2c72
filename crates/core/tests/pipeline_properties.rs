//! End-to-end properties of the content pipeline against scripted backends.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use scribe_core::agents::AgentRole;
use scribe_core::backends::{Backend, GenerationRequest};
use scribe_core::models::{ApiKey, GenerationOptions};
use scribe_core::pipeline::{ContentPipeline, RunState, Stage};
use scribe_core::{BackendError, PipelineError};

type Reply = dyn Fn(AgentRole, &str) -> String + Send + Sync;

/// Records every call and answers with `reply`, optionally failing one call
struct ScriptedBackend {
    reply: Box<Reply>,
    fail_on_call: Option<(usize, BackendError)>,
    calls: AtomicUsize,
    seen: Mutex<Vec<(AgentRole, String)>>,
}

impl ScriptedBackend {
    fn new(reply: impl Fn(AgentRole, &str) -> String + Send + Sync + 'static) -> Self {
        Self {
            reply: Box::new(reply),
            fail_on_call: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// `n` is 1-based
    fn failing_on(mut self, n: usize, error: BackendError) -> Self {
        self.fail_on_call = Some((n, error));
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn seen(&self) -> Vec<(AgentRole, String)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(
        &self,
        request: GenerationRequest<'_>,
        _options: &GenerationOptions,
    ) -> Result<String, BackendError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen
            .lock()
            .unwrap()
            .push((request.role, request.user_task.to_string()));

        if let Some((fail_at, error)) = &self.fail_on_call {
            if *fail_at == n {
                return Err(error.clone());
            }
        }
        Ok((self.reply)(request.role, request.user_task))
    }
}

fn options() -> GenerationOptions {
    GenerationOptions::new("scripted-model", ApiKey::new("test"))
}

fn pipeline_over(backend: &Arc<ScriptedBackend>) -> ContentPipeline {
    ContentPipeline::new(backend.clone(), options())
}

/// `[{role}] about {first 10 chars of input}`
fn about(role: AgentRole, input: &str) -> String {
    let head: String = input.chars().take(10).collect();
    format!("[{}] about {}", role, head)
}

#[tokio::test]
async fn each_stage_receives_the_previous_output() {
    let backend = Arc::new(ScriptedBackend::new(|role, _| {
        format!("<{} sentinel>", role)
    }));
    let bundle = pipeline_over(&backend).run("quantum dots").await.unwrap();

    let seen = backend.seen();
    assert_eq!(seen.len(), 4);
    assert_eq!(seen[0].1, "quantum dots");
    assert_eq!(seen[1].1, bundle.research());
    assert_eq!(seen[2].1, bundle.article());
    assert_eq!(seen[3].1, bundle.refined());
    assert_eq!(bundle.summary(), "<Summarizer sentinel>");
}

#[tokio::test]
async fn empty_topic_never_calls_the_backend() {
    let backend = Arc::new(ScriptedBackend::new(about));
    let pipeline = pipeline_over(&backend);

    for topic in ["", "   ", "\n\t "] {
        let err = pipeline.run(topic).await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn transport_failure_on_writer_aborts_the_run() {
    let backend = Arc::new(
        ScriptedBackend::new(about)
            .failing_on(2, BackendError::Transport("connection reset".into())),
    );
    let err = pipeline_over(&backend).run("solar energy").await.unwrap_err();

    match err {
        PipelineError::StageFailed {
            stage,
            source,
            partial,
        } => {
            assert_eq!(stage, Stage::Write);
            assert!(matches!(source, BackendError::Transport(_)));
            assert_eq!(partial.state(), RunState::Failed);
            assert_eq!(partial.research(), Some("[Researcher] about solar ener"));
            assert_eq!(partial.article(), None);
            assert_eq!(partial.refined(), None);
            assert_eq!(partial.summary(), None);
        }
        other => panic!("expected stage failure, got {:?}", other),
    }
    // Nothing after the failing stage runs
    assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn every_backend_error_kind_is_fatal() {
    let errors = [
        BackendError::Authentication("bad key".into()),
        BackendError::RateLimit("slow down".into()),
        BackendError::MalformedResponse("??".into()),
    ];
    for (i, error) in errors.into_iter().enumerate() {
        let fail_at = i + 1;
        let backend = Arc::new(ScriptedBackend::new(about).failing_on(fail_at, error.clone()));
        let err = pipeline_over(&backend).run("tides").await.unwrap_err();

        assert_eq!(err.kind(), error.kind());
        assert_eq!(err.stage(), Some(Stage::ALL[i]));
        assert_eq!(backend.calls(), fail_at);
    }
}

#[tokio::test]
async fn calls_follow_the_fixed_role_order() {
    let backend = Arc::new(ScriptedBackend::new(about));
    pipeline_over(&backend).run("coral reefs").await.unwrap();

    let roles: Vec<_> = backend.seen().into_iter().map(|(role, _)| role).collect();
    assert_eq!(
        roles,
        vec![
            AgentRole::Researcher,
            AgentRole::Writer,
            AgentRole::Proofreader,
            AgentRole::Summarizer
        ]
    );
}

#[tokio::test]
async fn repeated_runs_are_identical() {
    let backend = Arc::new(ScriptedBackend::new(about));
    let pipeline = pipeline_over(&backend);

    let first = pipeline.run("tidal power").await.unwrap();
    let second = pipeline.run("tidal power").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn solar_energy_scenario() {
    let backend = Arc::new(ScriptedBackend::new(about));
    let bundle = pipeline_over(&backend).run("solar energy").await.unwrap();

    assert_eq!(bundle.research(), "[Researcher] about solar ener");
    assert_eq!(bundle.article(), "[Writer] about [Researche");
    assert_eq!(bundle.refined(), "[Proofreader] about [Writer] a");
    assert_eq!(bundle.summary(), "[Summarizer] about [Proofread");

    // Each field embeds the first 10 characters of the one before it
    let fields = [bundle.research(), bundle.article(), bundle.refined(), bundle.summary()];
    for pair in fields.windows(2) {
        let head: String = pair[0].chars().take(10).collect();
        assert!(pair[1].ends_with(&head));
    }
}

#[tokio::test]
async fn blank_backend_output_is_malformed() {
    let backend = Arc::new(ScriptedBackend::new(|role, input| {
        if role == AgentRole::Proofreader {
            "  ".to_string()
        } else {
            about(role, input)
        }
    }));
    let err = pipeline_over(&backend).run("tides").await.unwrap_err();

    assert_eq!(err.kind(), "malformed_response");
    assert_eq!(err.stage(), Some(Stage::Proofread));
    assert_eq!(backend.calls(), 3);
}

#[tokio::test]
async fn concurrent_runs_do_not_share_state() {
    let backend = Arc::new(ScriptedBackend::new(about));
    let pipeline = Arc::new(pipeline_over(&backend));

    let handles: Vec<_> = ["alpha topic", "beta topic", "gamma topic"]
        .into_iter()
        .map(|topic| {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move { (topic, pipeline.run(topic).await) })
        })
        .collect();

    for handle in handles {
        let (topic, result) = handle.await.unwrap();
        let bundle = result.unwrap();
        assert_eq!(bundle.research(), about(AgentRole::Researcher, topic));
    }
    assert_eq!(backend.calls(), 12);
}
