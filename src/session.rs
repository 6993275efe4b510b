//! Listening session
//!
//! Owns the transcript channel between a speech capture source and the
//! classification pipeline. Segments are handled one at a time in arrival
//! order; interim segments are dropped.

use crate::error::PipelineError;
use crate::pipeline::{ClassificationPipeline, PipelineOutcome};
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// One recognition result segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    pub is_final: bool,
}

impl TranscriptSegment {
    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }

    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }
}

/// Handle a capture source uses to push segments into the session
#[derive(Clone)]
pub struct TranscriptPublisher {
    tx: mpsc::Sender<TranscriptSegment>,
}

impl TranscriptPublisher {
    pub async fn publish(&self, segment: TranscriptSegment) -> Result<()> {
        self.tx
            .send(segment)
            .await
            .map_err(|_| PipelineError::SessionClosed)
    }
}

/// Trait for speech capture backends
#[async_trait]
pub trait TranscriptSource: Send {
    fn name(&self) -> &str;

    /// Whether the runtime can capture speech at all
    fn is_supported(&self) -> bool {
        true
    }

    /// Publish segments until the input ends or the session closes
    async fn capture(self: Box<Self>, publisher: TranscriptPublisher) -> Result<()>;
}

/// Explicit start/stop lifecycle around one pipeline
pub struct ListeningSession {
    id: Uuid,
    publisher: Option<TranscriptPublisher>,
    shutdown: Option<oneshot::Sender<()>>,
    worker: Option<JoinHandle<()>>,
    capture: Option<JoinHandle<()>>,
    listening: Arc<AtomicBool>,
    last_outcome: Arc<RwLock<Option<PipelineOutcome>>>,
}

impl ListeningSession {
    /// Start a session fed through `publisher()`
    pub fn start(pipeline: Arc<ClassificationPipeline>, capacity: usize) -> Self {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let listening = Arc::new(AtomicBool::new(true));
        let last_outcome = Arc::new(RwLock::new(None));

        let worker = tokio::spawn(run_worker(
            id,
            pipeline,
            rx,
            shutdown_rx,
            last_outcome.clone(),
            listening.clone(),
        ));

        info!(session_id = %id, "Listening session started");

        Self {
            id,
            publisher: Some(TranscriptPublisher { tx }),
            shutdown: Some(shutdown_tx),
            worker: Some(worker),
            capture: None,
            listening,
            last_outcome,
        }
    }

    /// Start a session driven by a capture source.
    /// Fails without starting anything if the source is unsupported.
    pub fn start_with_source(
        pipeline: Arc<ClassificationPipeline>,
        source: Box<dyn TranscriptSource>,
        capacity: usize,
    ) -> Result<Self> {
        if !source.is_supported() {
            error!(source = source.name(), "Speech capture is not supported");
            return Err(PipelineError::SpeechUnsupported(format!(
                "{} cannot capture speech in this environment",
                source.name()
            )));
        }

        let mut session = Self::start(pipeline, capacity);
        let publisher = session.publisher()?;
        let source_name = source.name().to_string();

        session.capture = Some(tokio::spawn(async move {
            match source.capture(publisher).await {
                Ok(()) => debug!(source = %source_name, "Capture source finished"),
                Err(PipelineError::SessionClosed) => {
                    debug!(source = %source_name, "Capture source stopped by session")
                }
                Err(e) => warn!(source = %source_name, "Capture source failed: {}", e),
            }
        }));

        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn publisher(&self) -> Result<TranscriptPublisher> {
        self.publisher.clone().ok_or(PipelineError::SessionClosed)
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    pub async fn last_outcome(&self) -> Option<PipelineOutcome> {
        *self.last_outcome.read().await
    }

    pub async fn clear_last_outcome(&self) {
        *self.last_outcome.write().await = None;
    }

    /// Wait until the capture source has published everything it has
    pub async fn wait_for_capture(&mut self) {
        if let Some(capture) = self.capture.take() {
            if let Err(e) = capture.await {
                warn!(session_id = %self.id, "Capture task ended abnormally: {}", e);
            }
        }
    }

    /// Stop capture, finish already queued segments and end the worker.
    /// Publishers still held elsewhere get `SessionClosed` afterwards.
    pub async fn stop(mut self) {
        if let Some(capture) = self.capture.take() {
            capture.abort();
        }

        self.publisher = None;
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }

        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                error!(session_id = %self.id, "Session worker panicked: {}", e);
            }
        }

        self.listening.store(false, Ordering::SeqCst);
        info!(session_id = %self.id, "Listening session stopped");
    }
}

impl Drop for ListeningSession {
    fn drop(&mut self) {
        if let Some(capture) = self.capture.take() {
            capture.abort();
        }
    }
}

async fn run_worker(
    session_id: Uuid,
    pipeline: Arc<ClassificationPipeline>,
    mut rx: mpsc::Receiver<TranscriptSegment>,
    mut shutdown: oneshot::Receiver<()>,
    last_outcome: Arc<RwLock<Option<PipelineOutcome>>>,
    listening: Arc<AtomicBool>,
) {
    loop {
        tokio::select! {
            segment = rx.recv() => match segment {
                Some(segment) => handle_segment(session_id, &pipeline, segment, &last_outcome).await,
                None => break,
            },
            _ = &mut shutdown => {
                rx.close();
                while let Some(segment) = rx.recv().await {
                    handle_segment(session_id, &pipeline, segment, &last_outcome).await;
                }
                break;
            }
        }
    }

    listening.store(false, Ordering::SeqCst);
    debug!(session_id = %session_id, "Transcript channel closed");
}

async fn handle_segment(
    session_id: Uuid,
    pipeline: &ClassificationPipeline,
    segment: TranscriptSegment,
    last_outcome: &RwLock<Option<PipelineOutcome>>,
) {
    if !segment.is_final {
        debug!(session_id = %session_id, text = %segment.text, "Interim segment skipped");
        return;
    }

    let outcome = pipeline.process(&segment.text).await;
    *last_outcome.write().await = Some(outcome);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Intent;
    use crate::pipeline::tests::{CountingOracle, StubOracle};
    use crate::pipeline::{ClassificationMethod, ClassificationResult};
    use std::sync::Mutex;

    fn pipeline_with_answers() -> (Arc<ClassificationPipeline>, Arc<Mutex<Vec<String>>>) {
        let answers = Arc::new(Mutex::new(Vec::new()));
        let sink = answers.clone();
        let pipeline = ClassificationPipeline::new(CountingOracle::new(StubOracle::Verdict(true)))
            .with_answer_observer(Arc::new(move |t| sink.lock().unwrap().push(t.to_string())));
        (Arc::new(pipeline), answers)
    }

    async fn stop_and_take(session: ListeningSession) -> Option<PipelineOutcome> {
        let last = session.last_outcome.clone();
        session.stop().await;
        let outcome = *last.read().await;
        outcome
    }

    struct ScriptedSource {
        segments: Vec<TranscriptSegment>,
        supported: bool,
    }

    #[async_trait]
    impl TranscriptSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        fn is_supported(&self) -> bool {
            self.supported
        }

        async fn capture(self: Box<Self>, publisher: TranscriptPublisher) -> Result<()> {
            for segment in self.segments {
                publisher.publish(segment).await?;
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_segments_processed_in_order() {
        let (pipeline, answers) = pipeline_with_answers();
        let session = ListeningSession::start(pipeline, 4);
        let publisher = session.publisher().unwrap();

        publisher.publish(TranscriptSegment::interim("Par")).await.unwrap();
        publisher.publish(TranscriptSegment::final_text("Paris")).await.unwrap();
        publisher.publish(TranscriptSegment::final_text("blue whale")).await.unwrap();
        publisher.publish(TranscriptSegment::final_text("next team")).await.unwrap();
        drop(publisher);

        assert!(session.is_listening());
        let last = stop_and_take(session).await;

        assert_eq!(*answers.lock().unwrap(), vec!["Paris", "blue whale"]);
        assert_eq!(last.and_then(|o| o.intent()), Some(Intent::Next));
    }

    #[tokio::test]
    async fn test_interim_segments_ignored() {
        let (pipeline, answers) = pipeline_with_answers();
        let session = ListeningSession::start(pipeline, 4);
        let publisher = session.publisher().unwrap();

        publisher.publish(TranscriptSegment::interim("Paris")).await.unwrap();
        drop(publisher);

        let last = stop_and_take(session).await;
        assert!(last.is_none());
        assert!(answers.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_source_driven_session() {
        let (pipeline, answers) = pipeline_with_answers();
        let source = ScriptedSource {
            segments: vec![
                TranscriptSegment::final_text("bank"),
                TranscriptSegment::final_text("Neil Armstrong in 1969"),
            ],
            supported: true,
        };

        let mut session = ListeningSession::start_with_source(pipeline, Box::new(source), 2).unwrap();
        session.wait_for_capture().await;
        let last = stop_and_take(session).await;

        assert_eq!(*answers.lock().unwrap(), vec!["Neil Armstrong in 1969"]);
        assert_eq!(
            last,
            Some(PipelineOutcome::Classification(ClassificationResult {
                is_answer: true,
                method: ClassificationMethod::Rules,
                confidence: 6,
            }))
        );
    }

    #[tokio::test]
    async fn test_unsupported_source_never_starts() {
        let (pipeline, _) = pipeline_with_answers();
        let source = ScriptedSource {
            segments: vec![TranscriptSegment::final_text("Paris")],
            supported: false,
        };

        let result = ListeningSession::start_with_source(pipeline, Box::new(source), 2);
        assert!(matches!(result, Err(PipelineError::SpeechUnsupported(_))));
    }

    #[tokio::test]
    async fn test_publish_after_stop_fails() {
        let (pipeline, answers) = pipeline_with_answers();
        let session = ListeningSession::start(pipeline, 4);
        let publisher = session.publisher().unwrap();

        publisher.publish(TranscriptSegment::final_text("Paris")).await.unwrap();
        // the outstanding publisher must not keep the session alive
        session.stop().await;

        assert_eq!(*answers.lock().unwrap(), vec!["Paris"]);
        let err = publisher
            .publish(TranscriptSegment::final_text("Rome"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::SessionClosed));
    }

    #[tokio::test]
    async fn test_clear_last_outcome() {
        let (pipeline, _) = pipeline_with_answers();
        let session = ListeningSession::start(pipeline, 1);
        let publisher = session.publisher().unwrap();
        publisher.publish(TranscriptSegment::final_text("stop")).await.unwrap();
        drop(publisher);

        // wait until the worker has recorded the outcome
        for _ in 0..100 {
            if session.last_outcome().await.is_some() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(session.last_outcome().await.and_then(|o| o.intent()), Some(Intent::Stop));

        session.clear_last_outcome().await;
        assert!(session.last_outcome().await.is_none());
        session.stop().await;
    }
}
