//! Console listener: each stdin line is one finalized transcript.
//! Lines starting with `~` are treated as interim segments.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;
use trivia_voice_router::{
    config::AppConfig,
    session::{ListeningSession, TranscriptPublisher, TranscriptSegment, TranscriptSource},
    ClassificationPipeline, Intent, IntentDetector,
};

struct StdinSource;

#[async_trait]
impl TranscriptSource for StdinSource {
    fn name(&self) -> &str {
        "stdin"
    }

    async fn capture(self: Box<Self>, publisher: TranscriptPublisher) -> trivia_voice_router::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Some(line) = lines.next_line().await? {
            let segment = match line.strip_prefix('~') {
                Some(interim) => TranscriptSegment::interim(interim),
                None => TranscriptSegment::final_text(line),
            };
            publisher.publish(segment).await?;
        }

        Ok(())
    }
}

fn announce_intent(intent: Intent) {
    let action = match intent {
        Intent::Bank => "banking the chain",
        Intent::Next => "passing to the next team",
        Intent::Stop => "stopping the round",
        Intent::Answer => "answer requested",
    };
    println!("[{}] {}", intent, action);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout stays readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env()?;
    let oracle = config.build_oracle()?;

    let pipeline = Arc::new(
        ClassificationPipeline::new(oracle)
            .with_oracle_timeout(config.oracle_timeout)
            .with_detector(IntentDetector::new().with_observer(Arc::new(announce_intent)))
            .with_answer_observer(Arc::new(|answer: &str| println!("[ANSWER] {}", answer))),
    );

    let mut session =
        ListeningSession::start_with_source(pipeline, Box::new(StdinSource), config.queue_capacity)?;

    info!(session_id = %session.id(), "Listening on stdin (Ctrl-D to finish)");

    session.wait_for_capture().await;
    if let Some(outcome) = session.last_outcome().await {
        info!(last = ?outcome, "Final outcome");
    }
    session.stop().await;

    Ok(())
}
