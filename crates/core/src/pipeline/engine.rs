//! Generation pipeline state machine.
//!
//! [`GenerationPipeline`] owns at most one session at a time and drives
//! it through the fixed stage graph:
//!
//! `Configuration -> Generating -> Validation -> DetailGenerating ->
//! DetailValidation -> [Saved | Discarded]`
//!
//! Transition operations are the only mutation surface; observers read
//! the session and derived progress, and subscribe to the event
//! channel. Transport-class failures are absorbed into the session's
//! `last_error` so the caller can retry the same operation without
//! losing already-received work.

use pf_protocol::events::Event;
use pf_protocol::plan_models::Candidate;
use pf_protocol::progress_models::ProgressSnapshot;
use pf_protocol::session_models::{
    ConfigPatch, GenerationConfig, PersistedResult, PipelineSession, Stage,
};
use std::sync::Arc;
use tokio::sync::mpsc::Sender;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::persistence::{ResultStore, SessionStore};
use crate::progress;
use crate::service::{GenerationService, ServiceError};
use crate::session;
use crate::settings::EngineSettings;

/// Days generated per weekly period.
pub const UNITS_PER_WEEK: usize = 7;

/// The pipeline state machine.
///
/// Explicitly constructed with its collaborators injected; multiple
/// independent instances can coexist (one per owner), which is also
/// what makes the engine testable without global state.
pub struct GenerationPipeline {
    service: Arc<dyn GenerationService>,
    sessions: Arc<dyn SessionStore>,
    results: Arc<dyn ResultStore>,
    events_tx: Sender<Event>,
    settings: EngineSettings,
    session: Option<PipelineSession>,
}

impl GenerationPipeline {
    /// Create a new pipeline with the given collaborators.
    ///
    /// # Arguments
    ///
    /// * `service` - The external generation service
    /// * `sessions` - Session persistence
    /// * `results` - Sink for finalized results
    /// * `events_tx` - Channel the engine emits domain events on
    /// * `settings` - Engine tunables
    pub fn new(
        service: Arc<dyn GenerationService>,
        sessions: Arc<dyn SessionStore>,
        results: Arc<dyn ResultStore>,
        events_tx: Sender<Event>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            service,
            sessions,
            results,
            events_tx,
            settings,
            session: None,
        }
    }

    /// Create a pipeline together with its event channel, sized from
    /// `settings.event_buffer`.
    pub fn with_event_channel(
        service: Arc<dyn GenerationService>,
        sessions: Arc<dyn SessionStore>,
        results: Arc<dyn ResultStore>,
        settings: EngineSettings,
    ) -> (Self, tokio::sync::mpsc::Receiver<Event>) {
        let (events_tx, events_rx) = tokio::sync::mpsc::channel(settings.event_buffer.max(1));
        (
            Self::new(service, sessions, results, events_tx, settings),
            events_rx,
        )
    }

    /// The current session, if any.
    pub fn session(&self) -> Option<&PipelineSession> {
        self.session.as_ref()
    }

    /// Derived progress for the current session.
    pub fn progress(&self) -> Option<ProgressSnapshot> {
        self.session.as_ref().map(progress::snapshot)
    }

    /// The most recent absorbed recoverable error, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.session
            .as_ref()
            .and_then(|session| session.last_error.as_deref())
    }

    /// Create a new session in the `Configuration` stage.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::AlreadyActive`] if this instance already
    /// holds a non-terminal session, or the store reports an incomplete
    /// session for this owner. Callers resolve that by routing through
    /// the recovery gate.
    pub async fn start(&mut self, owner_id: &str) -> PipelineResult<&PipelineSession> {
        if let Some(active) = self.session.as_ref().filter(|s| !s.stage.is_terminal()) {
            return Err(PipelineError::AlreadyActive {
                session_id: active.session_id,
            });
        }
        if let Some(existing) = self.sessions.find_latest_incomplete(owner_id).await? {
            return Err(PipelineError::AlreadyActive {
                session_id: existing.session_id,
            });
        }

        let new_session = PipelineSession::new(owner_id);
        self.sessions.put(&new_session).await?;

        info!(session_id = %new_session.session_id, owner_id, "session started");
        let _ = self
            .events_tx
            .send(Event::SessionStarted {
                session_id: new_session.session_id,
                owner_id: new_session.owner_id.clone(),
            })
            .await;

        Ok(self.session.insert(new_session))
    }

    /// Reinstall a persisted session after a reload.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidStage`] unless the session was
    /// persisted in one of the two validation stages; streaming stages
    /// are abandoned on reload and must be restarted.
    pub async fn resume(&mut self, persisted: PipelineSession) -> PipelineResult<()> {
        if let Some(active) = self.session.as_ref().filter(|s| !s.stage.is_terminal()) {
            return Err(PipelineError::AlreadyActive {
                session_id: active.session_id,
            });
        }
        if !persisted.stage.is_resumable() {
            return Err(PipelineError::InvalidStage {
                operation: "resume",
                stage: persisted.stage,
            });
        }

        info!(session_id = %persisted.session_id, stage = ?persisted.stage, "session resumed");
        let _ = self
            .events_tx
            .send(Event::SessionResumed {
                session_id: persisted.session_id,
                stage: persisted.stage,
            })
            .await;
        self.session = Some(persisted);
        Ok(())
    }

    /// Merge a partial update into the session's config.
    ///
    /// Only legal while the session is in `Configuration`.
    pub async fn set_config(&mut self, patch: ConfigPatch) -> PipelineResult<()> {
        let session = session_mut(&mut self.session, "set_config")?;
        if session.stage != Stage::Configuration {
            return Err(PipelineError::InvalidStage {
                operation: "set_config",
                stage: session.stage,
            });
        }

        session.config.apply(patch);
        session.touch();
        self.sessions.put(session).await?;
        Ok(())
    }

    /// Run (or retry) plan-level generation.
    ///
    /// On the first call the session enters `Generating` and the unit
    /// total is fixed from the config. Units stream in order and are
    /// appended as they arrive; duplicates resent after an interrupted
    /// stream are suppressed by index. On a transport failure or
    /// timeout the session stays in `Generating` with its received
    /// units intact and the failure is absorbed into `last_error`;
    /// calling `generate()` again resumes appending. On completion the
    /// session enters `Validation`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::IncompleteConfig`] if required config
    /// fields are missing, and [`PipelineError::InvalidStage`] outside
    /// `Configuration`/`Generating`. Transport failures are absorbed,
    /// not returned.
    pub async fn generate(&mut self) -> PipelineResult<()> {
        let session = session_mut(&mut self.session, "generate")?;
        match session.stage {
            Stage::Configuration | Stage::Generating => {}
            stage => {
                return Err(PipelineError::InvalidStage {
                    operation: "generate",
                    stage,
                })
            }
        }
        validate_config(&session.config)?;

        if session.stage == Stage::Configuration {
            session.total_units = Some(session.config.week_count as usize * UNITS_PER_WEEK);
            session.received_units = 0;
            session.candidates.clear();
            session.candidates.push(Candidate::default());
            session::enter_stage(session, &self.events_tx, Stage::Generating).await;
            session::emit_progress(session, &self.events_tx).await;
        }
        session.last_error = None;

        let session_id = session.session_id;
        let config = session.config.clone();
        let total = session.total_units.unwrap_or(0);

        let mut stream = match self.service.generate_plan(&config).await {
            Ok(stream) => stream,
            Err(err) => {
                self.absorb_failure(err.to_string()).await;
                return Ok(());
            }
        };

        loop {
            let next = tokio::time::timeout(self.settings.unit_timeout(), stream.next()).await;

            let session = session_mut(&mut self.session, "generate")?;
            // The session was replaced while the stream was suspended;
            // anything else this stream produces is stale.
            if session.session_id != session_id {
                return Ok(());
            }

            match next {
                Err(_) => {
                    self.absorb_failure(ServiceError::Timeout.to_string()).await;
                    return Ok(());
                }
                Ok(None) => break,
                Ok(Some(Err(err))) => {
                    self.absorb_failure(err.to_string()).await;
                    return Ok(());
                }
                Ok(Some(Ok(unit))) => {
                    let already_received =
                        session.candidates.first().map_or(0, |c| c.units.len());
                    if unit.index < already_received {
                        debug!(session_id = %session_id, unit_index = unit.index, "duplicate unit suppressed");
                        continue;
                    }
                    if total > 0 && session.received_units >= total {
                        debug!(session_id = %session_id, unit_index = unit.index, "unexpected extra unit ignored");
                        continue;
                    }

                    session::record_unit(session, &self.events_tx, unit).await;
                    if let Err(err) = self.sessions.put(session).await {
                        warn!(%err, "failed to persist session after unit received");
                    }
                }
            }
        }

        let session = session_mut(&mut self.session, "generate")?;
        session.last_error = None;
        session::enter_stage(session, &self.events_tx, Stage::Validation).await;
        session::emit_progress(session, &self.events_tx).await;
        if let Err(err) = self.sessions.put(session).await {
            warn!(%err, "failed to persist session after generation completed");
        }
        Ok(())
    }

    /// Replace one unit's items in place, leaving siblings untouched.
    ///
    /// Only legal in `Validation`; the stage does not change.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnknownUnit`] for out-of-range indices
    /// and [`PipelineError::Transport`] if the service call fails; in
    /// both cases the session is not mutated.
    pub async fn regenerate_unit(
        &mut self,
        candidate_index: usize,
        unit_index: usize,
    ) -> PipelineResult<()> {
        let session = session_mut(&mut self.session, "regenerate_unit")?;
        if session.stage != Stage::Validation {
            return Err(PipelineError::InvalidStage {
                operation: "regenerate_unit",
                stage: session.stage,
            });
        }
        let exists = session
            .candidates
            .get(candidate_index)
            .and_then(|c| c.units.get(unit_index))
            .is_some();
        if !exists {
            return Err(PipelineError::UnknownUnit {
                candidate: candidate_index,
                unit: unit_index,
            });
        }

        let session_id = session.session_id;
        let config = session.config.clone();

        let mut replacement = self.service.regenerate_unit(&config, unit_index).await?;
        replacement.index = unit_index;

        let session = session_mut(&mut self.session, "regenerate_unit")?;
        if session.session_id != session_id || session.stage != Stage::Validation {
            return Ok(());
        }
        if let Some(slot) = session
            .candidates
            .get_mut(candidate_index)
            .and_then(|c| c.units.get_mut(unit_index))
        {
            *slot = replacement;
        }
        session.touch();

        let _ = self
            .events_tx
            .send(Event::UnitReceived {
                session_id,
                candidate_index,
                unit_index,
            })
            .await;
        self.sessions.put(session).await?;
        Ok(())
    }

    /// Run (or retry) per-item detail generation.
    ///
    /// Enters `DetailGenerating` from `Validation` and re-baselines the
    /// progress counters to item granularity. Detail requests are
    /// issued with bounded fan-out and complete in any order; each item
    /// flips pending -> ready (or pending -> failed, with the error
    /// recorded on the item) independently. Completions for a session
    /// that is no longer live are dropped silently.
    ///
    /// Only item-scoped failures settle an item as failed. Transport
    /// failures and timeouts leave their items pending and are absorbed
    /// into `last_error`, the session stays in `DetailGenerating`, and
    /// a retry revisits exactly the pending items. The stage completes
    /// into `DetailValidation` once every item has settled; settled
    /// failures do not prevent completion.
    pub async fn proceed_to_details(&mut self) -> PipelineResult<()> {
        let session = session_mut(&mut self.session, "proceed_to_details")?;
        match session.stage {
            Stage::Validation | Stage::DetailGenerating => {}
            stage => {
                return Err(PipelineError::InvalidStage {
                    operation: "proceed_to_details",
                    stage,
                })
            }
        }

        // Item-granularity counters; settled items count as received so
        // a retry resumes mid-bar rather than from zero.
        let total: usize = session.candidates.iter().map(Candidate::item_count).sum();
        let settled: usize = session
            .candidates
            .iter()
            .map(Candidate::settled_item_count)
            .sum();
        session.total_units = Some(total);
        session.received_units = settled;
        session.last_error = None;

        if session.stage == Stage::Validation {
            session::enter_stage(session, &self.events_tx, Stage::DetailGenerating).await;
        }
        session::emit_progress(session, &self.events_tx).await;

        let session_id = session.session_id;
        let mut pending = Vec::new();
        for (candidate_index, candidate) in session.candidates.iter().enumerate() {
            for (unit_index, unit) in candidate.units.iter().enumerate() {
                for (item_index, item) in unit.items.iter().enumerate() {
                    if !item.state.is_settled() {
                        pending.push((
                            candidate_index,
                            unit_index,
                            item_index,
                            Arc::new(unit.clone()),
                            item.clone(),
                        ));
                    }
                }
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.settings.detail_fan_out.max(1)));
        let timeout = self.settings.unit_timeout();
        let mut tasks = JoinSet::new();
        for (candidate_index, unit_index, item_index, unit, item) in pending {
            let service = Arc::clone(&self.service);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            candidate_index,
                            unit_index,
                            item_index,
                            Err(ServiceError::Transport("fan-out cancelled".to_string())),
                        )
                    }
                };
                let result =
                    match tokio::time::timeout(timeout, service.generate_details(&unit, &item))
                        .await
                    {
                        Ok(result) => result,
                        Err(_) => Err(ServiceError::Timeout),
                    };
                (candidate_index, unit_index, item_index, result)
            });
        }

        let mut recoverable: Option<String> = None;
        while let Some(joined) = tasks.join_next().await {
            let Ok((candidate_index, unit_index, item_index, result)) = joined else {
                warn!(session_id = %session_id, "detail generation task failed to join");
                continue;
            };

            let Some(session) = self.session.as_mut() else {
                return Ok(());
            };
            // Stale completion for a discarded or replaced session.
            if session.session_id != session_id {
                return Ok(());
            }

            match result {
                Ok(detailed) => {
                    session::settle_item_ready(
                        session,
                        &self.events_tx,
                        candidate_index,
                        unit_index,
                        item_index,
                        detailed,
                    )
                    .await;
                }
                Err(err @ (ServiceError::Transport(_) | ServiceError::Timeout)) => {
                    // Transport-class: the item stays pending so a
                    // retry of the whole stage can revisit it.
                    recoverable = Some(err.to_string());
                    continue;
                }
                Err(err) => {
                    session::settle_item_failed(
                        session,
                        &self.events_tx,
                        candidate_index,
                        unit_index,
                        item_index,
                        err.to_string(),
                    )
                    .await;
                }
            }
            if let Err(err) = self.sessions.put(session).await {
                warn!(%err, "failed to persist session after item settled");
            }
        }

        let session = session_mut(&mut self.session, "proceed_to_details")?;
        if session.session_id != session_id || session.stage != Stage::DetailGenerating {
            return Ok(());
        }

        if let Some(error) = recoverable {
            session::record_recoverable_error(session, &self.events_tx, error).await;
            if let Err(err) = self.sessions.put(session).await {
                warn!(%err, "failed to persist session after detail failure");
            }
            return Ok(());
        }

        session::enter_stage(session, &self.events_tx, Stage::DetailValidation).await;
        session::emit_progress(session, &self.events_tx).await;
        if let Err(err) = self.sessions.put(session).await {
            warn!(%err, "failed to persist session after details completed");
        }
        Ok(())
    }

    /// Convert the session's candidates into permanent records and
    /// finish in terminal `Saved`.
    ///
    /// Legal only in `Validation` (without details) or
    /// `DetailValidation` (with details). The result is persisted
    /// first; only once the sink acknowledges is the session record
    /// deleted and the terminal transition made, so a failed persist
    /// leaves the session exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Persistence`] if the result sink fails;
    /// the in-memory session is unchanged and may be retried.
    pub async fn save(&mut self, include_details: bool) -> PipelineResult<PersistedResult> {
        let session = session_mut(&mut self.session, "save")?;
        let legal = matches!(
            (session.stage, include_details),
            (Stage::Validation, false) | (Stage::DetailValidation, true)
        );
        if !legal {
            return Err(PipelineError::InvalidStage {
                operation: "save",
                stage: session.stage,
            });
        }

        let result = self.results.persist(session, include_details).await?;

        let session_id = session.session_id;
        let owner_id = session.owner_id.clone();
        if let Err(err) = self.sessions.delete(&owner_id, session_id).await {
            // The result is durable; a leftover session record will be
            // cleaned up by the next recovery-gate restart.
            warn!(%err, "failed to delete session record after save");
        }

        session::enter_stage(session, &self.events_tx, Stage::Saved).await;
        session::emit_progress(session, &self.events_tx).await;
        let _ = self
            .events_tx
            .send(Event::SessionSaved {
                session_id,
                result_id: result.result_id,
            })
            .await;
        info!(session_id = %session_id, result_id = %result.result_id, "session saved");

        self.session = None;
        Ok(result)
    }

    /// Discard the session from any non-terminal stage.
    ///
    /// Always succeeds: candidates are cleared, the persisted record is
    /// deleted (failures logged, not surfaced), and the session ends in
    /// terminal `Discarded`. A no-op without an active session.
    pub async fn discard(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        if session.stage.is_terminal() {
            return;
        }

        session.candidates.clear();
        if let Err(err) = self
            .sessions
            .delete(&session.owner_id, session.session_id)
            .await
        {
            warn!(%err, "failed to delete session record on discard");
        }

        session::enter_stage(&mut session, &self.events_tx, Stage::Discarded).await;
        let _ = self
            .events_tx
            .send(Event::SessionDiscarded {
                session_id: session.session_id,
            })
            .await;
        info!(session_id = %session.session_id, "session discarded");
    }

    async fn absorb_failure(&mut self, error: String) {
        if let Some(session) = self.session.as_mut() {
            session::record_recoverable_error(session, &self.events_tx, error).await;
            if let Err(err) = self.sessions.put(session).await {
                warn!(%err, "failed to persist session after generation failure");
            }
        }
    }
}

fn session_mut<'a>(
    session: &'a mut Option<PipelineSession>,
    operation: &'static str,
) -> PipelineResult<&'a mut PipelineSession> {
    session
        .as_mut()
        .ok_or(PipelineError::NoActiveSession { operation })
}

fn validate_config(config: &GenerationConfig) -> PipelineResult<()> {
    if config.source_id.is_none() {
        return Err(PipelineError::IncompleteConfig(
            "source_id is required".to_string(),
        ));
    }
    if config.week_count == 0 {
        return Err(PipelineError::IncompleteConfig(
            "week_count must be at least 1".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::service::MockGenerationService;
    use tokio::sync::mpsc;

    fn pipeline_with(
        service: MockGenerationService,
    ) -> (GenerationPipeline, Arc<MemoryStore>, mpsc::Receiver<Event>) {
        let store = Arc::new(MemoryStore::new());
        let (pipeline, events_rx) = GenerationPipeline::with_event_channel(
            Arc::new(service),
            Arc::clone(&store) as Arc<dyn SessionStore>,
            Arc::clone(&store) as Arc<dyn ResultStore>,
            EngineSettings {
                event_buffer: 256,
                ..EngineSettings::default()
            },
        );
        (pipeline, store, events_rx)
    }

    fn valid_patch() -> ConfigPatch {
        ConfigPatch {
            week_count: Some(2),
            source_id: Some("inv-1".to_string()),
            prefer_inventory: None,
        }
    }

    #[tokio::test]
    async fn test_start_creates_configuration_session() {
        let (mut pipeline, store, _rx) = pipeline_with(MockGenerationService::succeeding(3));

        let session = pipeline.start("user-1").await.unwrap();
        assert_eq!(session.stage, Stage::Configuration);
        assert_eq!(session.owner_id, "user-1");
        assert_eq!(store.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_start_rejects_second_active_session() {
        let (mut pipeline, _store, _rx) = pipeline_with(MockGenerationService::succeeding(3));

        let first_id = pipeline.start("user-1").await.unwrap().session_id;
        let err = pipeline.start("user-1").await.unwrap_err();
        assert_eq!(err, PipelineError::AlreadyActive { session_id: first_id });
    }

    #[tokio::test]
    async fn test_start_rejects_when_store_has_incomplete_session() {
        let (mut pipeline, store, _rx) = pipeline_with(MockGenerationService::succeeding(3));

        let mut orphan = PipelineSession::new("user-1");
        orphan.stage = Stage::Validation;
        store.put(&orphan).await.unwrap();

        let err = pipeline.start("user-1").await.unwrap_err();
        assert_eq!(
            err,
            PipelineError::AlreadyActive {
                session_id: orphan.session_id
            }
        );
    }

    #[tokio::test]
    async fn test_set_config_outside_configuration_is_rejected() {
        let (mut pipeline, _store, _rx) = pipeline_with(MockGenerationService::succeeding(3));

        pipeline.start("user-1").await.unwrap();
        pipeline.set_config(valid_patch()).await.unwrap();
        pipeline.generate().await.unwrap();

        let err = pipeline.set_config(valid_patch()).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidStage {
                operation: "set_config",
                stage: Stage::Validation
            }
        ));
    }

    #[tokio::test]
    async fn test_generate_requires_complete_config() {
        let (mut pipeline, _store, _rx) = pipeline_with(MockGenerationService::succeeding(3));

        pipeline.start("user-1").await.unwrap();
        let err = pipeline.generate().await.unwrap_err();
        assert!(matches!(err, PipelineError::IncompleteConfig(_)));

        // The session is untouched and still configurable.
        assert_eq!(pipeline.session().unwrap().stage, Stage::Configuration);
    }

    #[tokio::test]
    async fn test_generate_streams_to_validation() {
        let (mut pipeline, _store, _rx) = pipeline_with(MockGenerationService::succeeding(3));

        pipeline.start("user-1").await.unwrap();
        pipeline.set_config(valid_patch()).await.unwrap();
        pipeline.generate().await.unwrap();

        let session = pipeline.session().unwrap();
        assert_eq!(session.stage, Stage::Validation);
        assert_eq!(session.received_units, 14);
        assert_eq!(session.total_units, Some(14));
        assert_eq!(session.candidates[0].units.len(), 14);
        assert!(session.last_error.is_none());
    }

    #[tokio::test]
    async fn test_no_active_session_is_rejected() {
        let (mut pipeline, _store, _rx) = pipeline_with(MockGenerationService::succeeding(3));

        let err = pipeline.generate().await.unwrap_err();
        assert!(matches!(err, PipelineError::NoActiveSession { .. }));

        let err = pipeline.save(false).await.unwrap_err();
        assert!(matches!(err, PipelineError::NoActiveSession { .. }));
    }

    #[tokio::test]
    async fn test_discard_without_session_is_noop() {
        let (mut pipeline, _store, _rx) = pipeline_with(MockGenerationService::succeeding(3));
        pipeline.discard().await;
        assert!(pipeline.session().is_none());
    }

    #[tokio::test]
    async fn test_save_with_wrong_detail_flag_is_rejected() {
        let (mut pipeline, _store, _rx) = pipeline_with(MockGenerationService::succeeding(3));

        pipeline.start("user-1").await.unwrap();
        pipeline.set_config(valid_patch()).await.unwrap();
        pipeline.generate().await.unwrap();

        // In Validation, a detailed save is not legal.
        let err = pipeline.save(true).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidStage {
                operation: "save",
                stage: Stage::Validation
            }
        ));
    }

    #[tokio::test]
    async fn test_regenerate_unit_out_of_range() {
        let (mut pipeline, _store, _rx) = pipeline_with(MockGenerationService::succeeding(3));

        pipeline.start("user-1").await.unwrap();
        pipeline.set_config(valid_patch()).await.unwrap();
        pipeline.generate().await.unwrap();

        let err = pipeline.regenerate_unit(0, 99).await.unwrap_err();
        assert_eq!(
            err,
            PipelineError::UnknownUnit {
                candidate: 0,
                unit: 99
            }
        );
    }

    #[tokio::test]
    async fn test_with_event_channel_delivers_events() {
        let store = Arc::new(MemoryStore::new());
        let (mut pipeline, mut rx) = GenerationPipeline::with_event_channel(
            Arc::new(MockGenerationService::succeeding(2)),
            Arc::clone(&store) as Arc<dyn SessionStore>,
            Arc::clone(&store) as Arc<dyn ResultStore>,
            EngineSettings {
                event_buffer: 8,
                ..EngineSettings::default()
            },
        );

        pipeline.start("user-1").await.unwrap();
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, Event::SessionStarted { .. }));
    }
}
