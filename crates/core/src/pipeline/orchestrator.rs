//! # Content Pipeline
//!
//! Runs Researcher → Writer → Proofreader → Summarizer for one topic.
//! Each stage's output is the next stage's input, so the four calls are
//! strictly sequential. A `ContentPipeline` holds only immutable agents and
//! can serve any number of concurrent runs.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::agents::{Agent, AgentRole};
use crate::backends::Backend;
use crate::error::{AgentError, PipelineError};
use crate::models::GenerationOptions;

use super::bundle::ResultBundle;
use super::events::{PipelineEvent, PipelineEventKind};
use super::run::PipelineRun;
use super::stage::Stage;

/// Message shown when the topic is empty
pub const EMPTY_TOPIC_MESSAGE: &str = "Please enter a topic.";

/// The four-stage orchestrator
#[derive(Debug, Clone)]
pub struct ContentPipeline {
    researcher: Agent,
    writer: Agent,
    proofreader: Agent,
    summarizer: Agent,
}

impl ContentPipeline {
    /// Create a pipeline whose four agents share one backend and one set of options
    pub fn new(backend: Arc<dyn Backend>, options: GenerationOptions) -> Self {
        let options = Arc::new(options);
        let agent = |role| Agent::new(role, Arc::clone(&backend), Arc::clone(&options));
        Self {
            researcher: agent(AgentRole::Researcher),
            writer: agent(AgentRole::Writer),
            proofreader: agent(AgentRole::Proofreader),
            summarizer: agent(AgentRole::Summarizer),
        }
    }

    /// Agent responsible for `stage`
    pub fn agent(&self, stage: Stage) -> &Agent {
        match stage {
            Stage::Research => &self.researcher,
            Stage::Write => &self.writer,
            Stage::Proofread => &self.proofreader,
            Stage::Summarize => &self.summarizer,
        }
    }

    /// Run the pipeline on a topic
    pub async fn run(&self, topic: &str) -> Result<ResultBundle, PipelineError> {
        self.run_with_events(topic, None).await
    }

    /// Run the pipeline on a topic, streaming progress to `events`
    pub async fn run_with_events(
        &self,
        topic: &str,
        events: Option<&mpsc::Sender<PipelineEvent>>,
    ) -> Result<ResultBundle, PipelineError> {
        self.drive(PipelineRun::new(topic), events).await
    }

    /// Like [`run_with_events`](Self::run_with_events), but every event
    /// carries `run_id` so a client can pick its own run out of a shared stream
    pub async fn run_tracked(
        &self,
        run_id: &str,
        topic: &str,
        events: Option<&mpsc::Sender<PipelineEvent>>,
    ) -> Result<ResultBundle, PipelineError> {
        let id = uuid::Uuid::parse_str(run_id).map_err(|_| {
            PipelineError::Validation(format!("Run id must be a UUID, got {:?}", run_id))
        })?;
        self.drive(PipelineRun::with_id(id, topic), events).await
    }

    #[tracing::instrument(skip(self, run, events), fields(run_id = %run.id(), topic_preview = %run.topic().chars().take(50).collect::<String>()))]
    async fn drive(
        &self,
        mut run: PipelineRun,
        events: Option<&mpsc::Sender<PipelineEvent>>,
    ) -> Result<ResultBundle, PipelineError> {
        if run.topic().trim().is_empty() {
            return Err(PipelineError::Validation(EMPTY_TOPIC_MESSAGE.to_string()));
        }

        tracing::info!(run_id = %run.id(), "Pipeline run started");
        emit(events, PipelineEvent::new(PipelineEventKind::RunStarted, run.id())).await;

        while let Some(stage) = run.next_stage() {
            let input = run
                .input_for(stage)
                .map(str::to_string)
                .ok_or(PipelineError::OutOfOrder {
                    attempted: stage,
                    current: run.state(),
                })?;

            emit(
                events,
                PipelineEvent::new(PipelineEventKind::StageStarted, run.id()).with_stage(stage),
            )
            .await;

            match self.agent(stage).execute(&input).await {
                Ok(output) => {
                    let chars = output.chars().count();
                    run.record(stage, output)?;
                    tracing::info!(run_id = %run.id(), %stage, chars, "Stage completed");
                    emit(
                        events,
                        PipelineEvent::new(PipelineEventKind::StageCompleted, run.id())
                            .with_stage(stage)
                            .with_data(serde_json::json!({ "chars": chars })),
                    )
                    .await;
                }
                Err(AgentError::Backend(source)) => {
                    run.fail();
                    tracing::warn!(run_id = %run.id(), %stage, error = %source, "Stage failed");
                    let data = serde_json::json!({
                        "kind": source.kind(),
                        "message": source.user_message(),
                    });
                    emit(
                        events,
                        PipelineEvent::new(PipelineEventKind::StageFailed, run.id())
                            .with_stage(stage)
                            .with_data(data.clone()),
                    )
                    .await;
                    emit(
                        events,
                        PipelineEvent::new(PipelineEventKind::RunFailed, run.id()).with_data(data),
                    )
                    .await;
                    return Err(PipelineError::StageFailed {
                        stage,
                        source,
                        partial: Box::new(run),
                    });
                }
                Err(AgentError::EmptyTask { role }) => {
                    run.fail();
                    return Err(PipelineError::Validation(format!(
                        "{} received no input",
                        role
                    )));
                }
            }
        }

        let run_id = run.id().to_string();
        let state = run.state();
        let bundle = run.into_bundle().ok_or(PipelineError::OutOfOrder {
            attempted: Stage::Summarize,
            current: state,
        })?;

        tracing::info!(run_id = %run_id, "Pipeline run completed");
        emit(events, PipelineEvent::new(PipelineEventKind::RunCompleted, &run_id)).await;
        Ok(bundle)
    }
}

/// Send an event if a listener is attached. A dropped listener never stalls the run.
async fn emit(events: Option<&mpsc::Sender<PipelineEvent>>, event: PipelineEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::GenerationRequest;
    use crate::error::BackendError;
    use crate::models::ApiKey;
    use async_trait::async_trait;

    /// Echoes `{role}:{task}`
    struct Echo;

    #[async_trait]
    impl Backend for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        async fn generate(
            &self,
            request: GenerationRequest<'_>,
            _options: &GenerationOptions,
        ) -> Result<String, BackendError> {
            Ok(format!("{}:{}", request.role, request.user_task))
        }
    }

    fn pipeline() -> ContentPipeline {
        ContentPipeline::new(Arc::new(Echo), GenerationOptions::new("m", ApiKey::new("k")))
    }

    #[tokio::test]
    async fn test_run_chains_outputs() {
        let bundle = pipeline().run("tides").await.unwrap();
        assert_eq!(bundle.research(), "Researcher:tides");
        assert_eq!(bundle.article(), "Writer:Researcher:tides");
        assert_eq!(bundle.refined(), "Proofreader:Writer:Researcher:tides");
        assert_eq!(
            bundle.summary(),
            "Summarizer:Proofreader:Writer:Researcher:tides"
        );
    }

    #[tokio::test]
    async fn test_events_follow_stage_order() {
        let (tx, mut rx) = mpsc::channel(32);
        pipeline().run_with_events("tides", Some(&tx)).await.unwrap();
        drop(tx);

        let mut kinds = Vec::new();
        while let Some(event) = rx.recv().await {
            kinds.push((event.kind, event.stage));
        }

        let mut expected = vec![(PipelineEventKind::RunStarted, None)];
        for stage in Stage::ALL {
            expected.push((PipelineEventKind::StageStarted, Some(stage)));
            expected.push((PipelineEventKind::StageCompleted, Some(stage)));
        }
        expected.push((PipelineEventKind::RunCompleted, None));
        assert_eq!(kinds, expected);
    }

    #[tokio::test]
    async fn test_dropped_listener_does_not_stall() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        assert!(pipeline().run_with_events("tides", Some(&tx)).await.is_ok());
    }

    #[test]
    fn test_whitespace_topic_rejected() {
        let err = tokio_test::block_on(pipeline().run(" \t\n")).unwrap_err();
        assert!(matches!(err, PipelineError::Validation(ref msg) if msg == EMPTY_TOPIC_MESSAGE));
    }

    #[tokio::test]
    async fn test_tracked_run_tags_every_event() {
        let run_id = "5f0c7a52-8a0e-4c56-9a55-3f1f6f2b9d10";
        let (tx, mut rx) = mpsc::channel(32);
        pipeline()
            .run_tracked(run_id, "tides", Some(&tx))
            .await
            .unwrap();
        drop(tx);

        let mut count = 0;
        while let Some(event) = rx.recv().await {
            assert_eq!(event.run_id, run_id);
            count += 1;
        }
        assert_eq!(count, 10);
    }

    #[tokio::test]
    async fn test_tracked_run_rejects_bad_id() {
        let (tx, mut rx) = mpsc::channel(32);
        let err = pipeline()
            .run_tracked("run-1", "tides", Some(&tx))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
        drop(tx);
        assert!(rx.recv().await.is_none());
    }

    /// Collects the field names declared on every span
    #[derive(Clone, Default)]
    struct SpanFields(Arc<std::sync::Mutex<Vec<String>>>);

    impl tracing::Subscriber for SpanFields {
        fn enabled(&self, _: &tracing::Metadata<'_>) -> bool {
            true
        }

        fn new_span(&self, span: &tracing::span::Attributes<'_>) -> tracing::span::Id {
            let mut names = self.0.lock().unwrap();
            names.extend(span.metadata().fields().iter().map(|f| f.name().to_string()));
            tracing::span::Id::from_u64(1)
        }

        fn record(&self, _: &tracing::span::Id, _: &tracing::span::Record<'_>) {}
        fn record_follows_from(&self, _: &tracing::span::Id, _: &tracing::span::Id) {}
        fn event(&self, _: &tracing::Event<'_>) {}
        fn enter(&self, _: &tracing::span::Id) {}
        fn exit(&self, _: &tracing::span::Id) {}
    }

    #[test]
    fn test_span_records_preview_not_topic() {
        let fields = SpanFields::default();
        tracing::subscriber::with_default(fields.clone(), || {
            tokio_test::block_on(pipeline().run("a very long and private topic")).unwrap();
        });

        let names = fields.0.lock().unwrap();
        assert!(names.iter().any(|n| n == "topic_preview"));
        assert!(names.iter().any(|n| n == "run_id"));
        assert!(!names.iter().any(|n| n == "topic"));
    }

    #[test]
    fn test_agents_match_stages() {
        let pipeline = pipeline();
        for stage in Stage::ALL {
            assert_eq!(pipeline.agent(stage).role(), stage.role());
        }
    }
}
