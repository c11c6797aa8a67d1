//! Test fixtures for building pipelines with scripted collaborators.

use async_trait::async_trait;
use pf_core::persistence::{MemoryStore, ResultStore, SessionStore, StoreError};
use pf_core::pipeline::GenerationPipeline;
use pf_core::service::MockGenerationService;
use pf_core::settings::EngineSettings;
use pf_protocol::events::Event;
use pf_protocol::session_models::{ConfigPatch, PersistedResult, PipelineSession};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Big enough that no test scenario fills the channel before it is
/// drained; engine sends would otherwise block.
#[allow(dead_code)]
pub const EVENT_CAPACITY: usize = 512;

/// Default engine settings with a test-sized event buffer.
#[allow(dead_code)]
pub fn test_settings() -> EngineSettings {
    EngineSettings {
        event_buffer: EVENT_CAPACITY,
        ..EngineSettings::default()
    }
}

/// Build a pipeline over a fresh in-memory store.
#[allow(dead_code)]
pub fn build_pipeline(
    service: MockGenerationService,
) -> (GenerationPipeline, Arc<MemoryStore>, mpsc::Receiver<Event>) {
    build_pipeline_with(service, test_settings())
}

/// Build a pipeline with custom settings; the event channel is sized
/// from `settings.event_buffer`.
#[allow(dead_code)]
pub fn build_pipeline_with(
    service: MockGenerationService,
    settings: EngineSettings,
) -> (GenerationPipeline, Arc<MemoryStore>, mpsc::Receiver<Event>) {
    let store = Arc::new(MemoryStore::new());
    let (pipeline, events_rx) = GenerationPipeline::with_event_channel(
        Arc::new(service),
        Arc::clone(&store) as Arc<dyn SessionStore>,
        Arc::clone(&store) as Arc<dyn ResultStore>,
        settings,
    );
    (pipeline, store, events_rx)
}

/// Build a pipeline that shares an existing store, with a custom
/// result sink.
#[allow(dead_code)]
pub fn build_pipeline_over(
    service: MockGenerationService,
    store: &Arc<MemoryStore>,
    results: Arc<dyn ResultStore>,
) -> (GenerationPipeline, mpsc::Receiver<Event>) {
    GenerationPipeline::with_event_channel(
        Arc::new(service),
        Arc::clone(store) as Arc<dyn SessionStore>,
        results,
        test_settings(),
    )
}

/// A complete config patch for the given number of weeks.
#[allow(dead_code)]
pub fn valid_patch(week_count: u32) -> ConfigPatch {
    ConfigPatch {
        week_count: Some(week_count),
        source_id: Some("inventory-1".to_string()),
        prefer_inventory: Some(true),
    }
}

/// Start a session and configure it, leaving the pipeline ready for
/// `generate()`.
#[allow(dead_code)]
pub async fn start_configured(pipeline: &mut GenerationPipeline, week_count: u32) {
    pipeline.start("user-1").await.unwrap();
    pipeline.set_config(valid_patch(week_count)).await.unwrap();
}

/// A result sink that sleeps before delegating, to hold a save open
/// while a second one is attempted.
#[allow(dead_code)]
pub struct SlowResultStore {
    inner: Arc<MemoryStore>,
    delay: Duration,
}

impl SlowResultStore {
    #[allow(dead_code)]
    pub fn new(inner: Arc<MemoryStore>, delay_ms: u64) -> Self {
        Self {
            inner,
            delay: Duration::from_millis(delay_ms),
        }
    }
}

#[async_trait]
impl ResultStore for SlowResultStore {
    async fn persist(
        &self,
        session: &PipelineSession,
        include_details: bool,
    ) -> Result<PersistedResult, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.persist(session, include_details).await
    }
}

/// A result sink that always fails.
#[allow(dead_code)]
pub struct FailingResultStore;

#[async_trait]
impl ResultStore for FailingResultStore {
    async fn persist(
        &self,
        _session: &PipelineSession,
        _include_details: bool,
    ) -> Result<PersistedResult, StoreError> {
        Err(StoreError::OperationFailed(
            "result sink offline".to_string(),
        ))
    }
}
