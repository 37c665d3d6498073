use super::error::{PipelineError, PipelineServiceError};
use super::item::{GenerationRequest, ItemStatus, PipelineItem};
use crate::domain::playlist::PlaylistService;
use crate::domain::script::ScriptService;
use crate::domain::speech::{LanguageCode, SynthesisService};
use crate::infrastructure::cache::{
    ArtifactStore, AudioArtifact, CacheLookup, Fingerprint, FingerprintVersions, LockAcquisition,
    ScriptArtifact,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{RwLock, Semaphore};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub versions: FingerprintVersions,
    pub worker_concurrency: usize,
    pub item_deadline: Duration,
}

/// The state machine driving each pipeline item from topic to audio.
///
/// Items run independently on a bounded worker pool; the only cross-item
/// coordination is the store's per-fingerprint generation lock. All status
/// transitions go through this service.
pub struct PipelineService {
    store: Arc<ArtifactStore>,
    scripts: Arc<ScriptService>,
    synthesis: Arc<SynthesisService>,
    playlist: Arc<PlaylistService>,
    settings: PipelineSettings,
    items: RwLock<HashMap<Uuid, PipelineItem>>,
    cancellations: Mutex<HashMap<Uuid, CancellationToken>>,
    workers: Arc<Semaphore>,
}

impl PipelineService {
    pub fn new(
        store: Arc<ArtifactStore>,
        scripts: Arc<ScriptService>,
        synthesis: Arc<SynthesisService>,
        playlist: Arc<PlaylistService>,
        settings: PipelineSettings,
    ) -> Arc<Self> {
        let workers = Arc::new(Semaphore::new(settings.worker_concurrency.max(1)));
        Arc::new(Self {
            store,
            scripts,
            synthesis,
            playlist,
            settings,
            items: RwLock::new(HashMap::new()),
            cancellations: Mutex::new(HashMap::new()),
            workers,
        })
    }

    /// Submit a batch of topics. Items are created and appended to the
    /// playlist in submission order, then processed concurrently; one item's
    /// failure never blocks or rolls back its siblings.
    pub async fn submit_playlist(
        self: &Arc<Self>,
        topics: Vec<String>,
        language: LanguageCode,
        duration_minutes: u8,
    ) -> Result<Vec<PipelineItem>, PipelineServiceError> {
        if !(GenerationRequest::MIN_DURATION_MINUTES..=GenerationRequest::MAX_DURATION_MINUTES)
            .contains(&duration_minutes)
        {
            return Err(PipelineServiceError::Invalid(format!(
                "duration must be between {} and {} minutes",
                GenerationRequest::MIN_DURATION_MINUTES,
                GenerationRequest::MAX_DURATION_MINUTES
            )));
        }

        let topics: Vec<String> = topics
            .into_iter()
            .map(|topic| topic.trim().to_string())
            .filter(|topic| !topic.is_empty())
            .collect();
        if topics.is_empty() {
            return Err(PipelineServiceError::Invalid(
                "at least one topic is required".to_string(),
            ));
        }

        tracing::info!(
            topic_count = topics.len(),
            language = %language,
            duration_minutes = duration_minutes,
            "Playlist submitted"
        );

        let mut submitted = Vec::with_capacity(topics.len());
        for topic in topics {
            let request = GenerationRequest {
                topic,
                language,
                duration_minutes,
            };
            submitted.push(self.enqueue(request).await);
        }
        Ok(submitted)
    }

    /// Create a new item for a previously submitted one and process it again.
    /// The failed original stays terminal; the new item shares its
    /// fingerprint, so whatever was cached (typically the script after a
    /// synthesis failure) is reused.
    pub async fn retry(self: &Arc<Self>, item_id: Uuid) -> Result<PipelineItem, PipelineServiceError> {
        let request = {
            let items = self.items.read().await;
            let item = items.get(&item_id).ok_or(PipelineServiceError::NotFound)?;
            if !item.status.is_terminal() {
                return Err(PipelineServiceError::Conflict(
                    "item is still in progress".to_string(),
                ));
            }
            item.request.clone()
        };

        tracing::info!(retried_item = %item_id, topic = %request.topic, "Retrying item");
        Ok(self.enqueue(request).await)
    }

    /// Cancel a running item. The in-flight stage is abandoned at its next
    /// await point; the generation lock is released so waiters on the same
    /// fingerprint are not starved.
    pub async fn cancel(&self, item_id: Uuid) -> Result<(), PipelineServiceError> {
        {
            let items = self.items.read().await;
            let item = items.get(&item_id).ok_or(PipelineServiceError::NotFound)?;
            if item.status.is_terminal() {
                return Err(PipelineServiceError::Conflict(
                    "item already reached a terminal state".to_string(),
                ));
            }
        }

        let token = self
            .cancellations
            .lock()
            .unwrap()
            .get(&item_id)
            .cloned();
        match token {
            Some(token) => {
                token.cancel();
                Ok(())
            }
            None => Err(PipelineServiceError::Conflict(
                "item is not running".to_string(),
            )),
        }
    }

    pub async fn get_item(&self, item_id: Uuid) -> Option<PipelineItem> {
        self.items.read().await.get(&item_id).cloned()
    }

    /// Audio payload for a completed item, served from the cache store.
    pub async fn audio_for_item(
        &self,
        item_id: Uuid,
    ) -> Result<(AudioArtifact, Vec<u8>), PipelineServiceError> {
        let fingerprint = {
            let items = self.items.read().await;
            let item = items.get(&item_id).ok_or(PipelineServiceError::NotFound)?;
            if item.status != ItemStatus::Completed {
                return Err(PipelineServiceError::Conflict(
                    "item has no audio yet".to_string(),
                ));
            }
            item.fingerprint
                .clone()
                .ok_or_else(|| PipelineServiceError::Dependency("completed item lost its fingerprint".to_string()))?
        };

        self.store
            .read_audio(&fingerprint)
            .await
            .map_err(|e| PipelineServiceError::Dependency(e.to_string()))?
            .ok_or(PipelineServiceError::NotFound)
    }

    async fn enqueue(self: &Arc<Self>, request: GenerationRequest) -> PipelineItem {
        let item = PipelineItem::new(request.clone());
        let item_id = item.id;
        self.items.write().await.insert(item_id, item.clone());
        self.playlist.append(item_id).await;

        let token = CancellationToken::new();
        self.cancellations
            .lock()
            .unwrap()
            .insert(item_id, token.clone());

        let service = Arc::clone(self);
        tokio::spawn(async move {
            let _permit = match service.workers.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };

            let deadline = service.settings.item_deadline;
            let outcome = tokio::select! {
                _ = token.cancelled() => Err(PipelineError::Cancelled),
                result = tokio::time::timeout(deadline, service.process(item_id, &request)) => {
                    match result {
                        Ok(outcome) => outcome,
                        Err(_) => Err(PipelineError::DeadlineExceeded(deadline)),
                    }
                }
            };

            if let Err(error) = outcome {
                service.fail(item_id, &error).await;
            }
            service.cancellations.lock().unwrap().remove(&item_id);
        });

        item
    }

    /// Drive one item through its stages. Dropping this future (cancellation
    /// or deadline) releases the generation guard and leaves no partially
    /// committed artifact, since store writes are staged-then-renamed.
    async fn process(&self, item_id: Uuid, request: &GenerationRequest) -> Result<(), PipelineError> {
        let fingerprint = Fingerprint::compute(
            &request.topic,
            request.language,
            request.duration_minutes,
            self.settings.versions,
        );
        self.set_fingerprint(item_id, &fingerprint).await;

        loop {
            // Finished artifacts are served without touching the lock
            if let CacheLookup::HitFull(script, audio) = self.store.lookup(&fingerprint).await? {
                self.complete_from_cache(item_id, &script, &audio).await;
                return Ok(());
            }

            match self.store.acquire(&fingerprint) {
                LockAcquisition::Acquired(_guard) => {
                    // Re-check under the lock: the prior flight may have
                    // committed between our lookup and the acquire
                    let lookup = self.store.lookup(&fingerprint).await?;
                    if let CacheLookup::HitFull(script, audio) = lookup {
                        self.complete_from_cache(item_id, &script, &audio).await;
                        return Ok(());
                    }

                    self.transition(item_id, ItemStatus::Generating).await;
                    let script = match lookup {
                        CacheLookup::HitScript(script) => {
                            tracing::info!(
                                item_id = %item_id,
                                fingerprint = %fingerprint,
                                "Cached script found, skipping generation"
                            );
                            script
                        }
                        _ => {
                            let script = self
                                .scripts
                                .generate(
                                    &fingerprint,
                                    &request.topic,
                                    request.language,
                                    request.duration_minutes,
                                )
                                .await?;
                            self.store.put_script(&script).await?;
                            script
                        }
                    };

                    self.set_script(item_id, &script).await;
                    self.transition(item_id, ItemStatus::Synthesizing).await;

                    let audio = self
                        .synthesis
                        .synthesize(&script.speech_text(), request.language)
                        .await?;
                    let artifact = self
                        .store
                        .put_audio(
                            &fingerprint,
                            &audio.audio_data,
                            audio.provider.as_str(),
                            audio.duration_seconds,
                        )
                        .await?;

                    self.complete(item_id, &artifact).await;
                    return Ok(());
                }
                LockAcquisition::AlreadyInFlight(waiter) => {
                    tracing::debug!(
                        item_id = %item_id,
                        fingerprint = %fingerprint,
                        "Generation already in flight, waiting on its result"
                    );
                    waiter.wait().await;
                }
            }
        }
    }

    async fn set_fingerprint(&self, item_id: Uuid, fingerprint: &Fingerprint) {
        let mut items = self.items.write().await;
        if let Some(item) = items.get_mut(&item_id) {
            item.fingerprint = Some(fingerprint.clone());
            if item.status.can_transition_to(ItemStatus::Fingerprinted) {
                item.status = ItemStatus::Fingerprinted;
            }
        }
    }

    async fn transition(&self, item_id: Uuid, next: ItemStatus) {
        let mut items = self.items.write().await;
        if let Some(item) = items.get_mut(&item_id) {
            if item.status.can_transition_to(next) {
                tracing::debug!(item_id = %item_id, from = ?item.status, to = ?next, "Item transition");
                item.status = next;
            } else {
                tracing::error!(
                    item_id = %item_id,
                    from = ?item.status,
                    to = ?next,
                    "Invalid item transition ignored"
                );
            }
        }
    }

    async fn set_script(&self, item_id: Uuid, script: &ScriptArtifact) {
        let mut items = self.items.write().await;
        if let Some(item) = items.get_mut(&item_id) {
            item.script = Some(script.into());
        }
    }

    async fn complete_from_cache(
        &self,
        item_id: Uuid,
        script: &ScriptArtifact,
        audio: &AudioArtifact,
    ) {
        let mut items = self.items.write().await;
        if let Some(item) = items.get_mut(&item_id) {
            if item.status.can_transition_to(ItemStatus::CacheHit) {
                item.status = ItemStatus::CacheHit;
            }
            item.cache_hit = true;
            item.script = Some(script.into());
            item.audio = Some(audio.into());
            item.status = ItemStatus::Completed;
            tracing::info!(item_id = %item_id, fingerprint = %audio.fingerprint, "Item served from cache");
        }
    }

    async fn complete(&self, item_id: Uuid, audio: &AudioArtifact) {
        let mut items = self.items.write().await;
        if let Some(item) = items.get_mut(&item_id) {
            item.audio = Some(audio.into());
            if item.status.can_transition_to(ItemStatus::Completed) {
                item.status = ItemStatus::Completed;
            }
            tracing::info!(
                item_id = %item_id,
                provider = %audio.provider_used,
                duration_seconds = audio.duration_seconds,
                "Item completed"
            );
        }
    }

    async fn fail(&self, item_id: Uuid, error: &PipelineError) {
        let mut items = self.items.write().await;
        if let Some(item) = items.get_mut(&item_id) {
            if item.status.is_terminal() {
                return;
            }
            item.status = ItemStatus::Failed;
            item.error_detail = Some(error.to_string());
            tracing::warn!(item_id = %item_id, error = %error, "Item failed");
        }
    }
}
