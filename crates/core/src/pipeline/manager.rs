//! Concurrent access to a [`GenerationPipeline`].
//!
//! The engine itself is single-threaded by construction (`&mut self`
//! operations). [`PipelineManager`] shares one engine between
//! foreground callers and background generation tasks: operations are
//! serialized through a `tokio::sync::Mutex`, long-running generation
//! can be spawned onto a background task, `discard()` aborts that task
//! before taking the lock, and a compare-and-swap guard rejects
//! overlapping saves before they ever reach the engine.

use pf_protocol::progress_models::ProgressSnapshot;
use pf_protocol::session_models::{ConfigPatch, PersistedResult, PipelineSession};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::GenerationPipeline;

/// Shared handle to a [`GenerationPipeline`].
///
/// Owns the background task slot and the save guard; put the manager
/// itself behind an `Arc` to share it between tasks.
pub struct PipelineManager {
    engine: Arc<Mutex<GenerationPipeline>>,
    save_guard: Arc<AtomicBool>,
    background: Mutex<Option<JoinHandle<()>>>,
}

impl PipelineManager {
    /// Wrap an engine for concurrent use.
    pub fn new(engine: GenerationPipeline) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            save_guard: Arc::new(AtomicBool::new(false)),
            background: Mutex::new(None),
        }
    }

    /// The shared engine, for callers that need direct access (the
    /// recovery gate).
    pub fn engine(&self) -> Arc<Mutex<GenerationPipeline>> {
        Arc::clone(&self.engine)
    }

    /// Start a new session. See [`GenerationPipeline::start`].
    pub async fn start(&self, owner_id: &str) -> PipelineResult<Uuid> {
        let mut engine = self.engine.lock().await;
        let session = engine.start(owner_id).await?;
        Ok(session.session_id)
    }

    /// Update the session config. See [`GenerationPipeline::set_config`].
    pub async fn set_config(&self, patch: ConfigPatch) -> PipelineResult<()> {
        self.engine.lock().await.set_config(patch).await
    }

    /// Run plan generation on the calling task.
    pub async fn generate(&self) -> PipelineResult<()> {
        self.engine.lock().await.generate().await
    }

    /// Run plan generation on a background task.
    ///
    /// The engine lock is held for the duration of the stream, so
    /// foreground operations issued meanwhile queue behind it;
    /// `discard()` instead aborts the task. A previous finished
    /// background task is replaced; a still-running one is left alone
    /// and the call is a no-op.
    pub async fn spawn_generate(&self) {
        self.spawn_background("generate", |engine| async move {
            engine.lock().await.generate().await
        })
        .await;
    }

    /// Run detail generation on a background task.
    pub async fn spawn_detail_generation(&self) {
        self.spawn_background("proceed_to_details", |engine| async move {
            engine.lock().await.proceed_to_details().await
        })
        .await;
    }

    /// Replace one unit. See [`GenerationPipeline::regenerate_unit`].
    pub async fn regenerate_unit(
        &self,
        candidate_index: usize,
        unit_index: usize,
    ) -> PipelineResult<()> {
        self.engine
            .lock()
            .await
            .regenerate_unit(candidate_index, unit_index)
            .await
    }

    /// Run detail generation on the calling task.
    pub async fn proceed_to_details(&self) -> PipelineResult<()> {
        self.engine.lock().await.proceed_to_details().await
    }

    /// Save the session, rejecting overlapping attempts.
    ///
    /// The guard is taken before waiting on the engine lock, so a
    /// second `save()` issued while the first is still persisting fails
    /// fast with [`PipelineError::SaveInProgress`] instead of queuing a
    /// duplicate persist.
    pub async fn save(&self, include_details: bool) -> PipelineResult<PersistedResult> {
        if self.save_guard.swap(true, Ordering::SeqCst) {
            return Err(PipelineError::SaveInProgress);
        }

        let result = {
            let mut engine = self.engine.lock().await;
            engine.save(include_details).await
        };
        self.save_guard.store(false, Ordering::SeqCst);
        result
    }

    /// Discard the session, aborting any background generation first.
    pub async fn discard(&self) {
        if let Some(handle) = self.background.lock().await.take() {
            // Aborting drops the generation future, which releases the
            // engine lock if the task was holding it.
            handle.abort();
        }
        self.engine.lock().await.discard().await;
    }

    /// Snapshot of the current session, if any.
    pub async fn session(&self) -> Option<PipelineSession> {
        self.engine.lock().await.session().cloned()
    }

    /// Derived progress for the current session, if any.
    pub async fn progress(&self) -> Option<ProgressSnapshot> {
        self.engine.lock().await.progress()
    }

    /// Wait for the current background task, if any, to finish.
    ///
    /// Useful for embedders that need a join point before shutdown.
    pub async fn join_background(&self) {
        let handle = self.background.lock().await.take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                if !err.is_cancelled() {
                    warn!(%err, "background pipeline task panicked");
                }
            }
        }
    }

    async fn spawn_background<F, Fut>(&self, operation: &'static str, run: F)
    where
        F: FnOnce(Arc<Mutex<GenerationPipeline>>) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = PipelineResult<()>> + Send + 'static,
    {
        let mut slot = self.background.lock().await;
        if let Some(existing) = slot.as_ref() {
            if !existing.is_finished() {
                debug!(operation, "background task already running, not spawning another");
                return;
            }
        }

        let engine = Arc::clone(&self.engine);
        *slot = Some(tokio::spawn(async move {
            if let Err(err) = run(engine).await {
                warn!(operation, %err, "background pipeline operation rejected");
            }
        }));
    }
}
