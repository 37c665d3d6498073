use super::artifact::{AudioArtifact, ScriptArtifact};
use super::fingerprint::Fingerprint;
use chrono::Utc;
use moka::future::Cache;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt cache entry {0}: {1}")]
    Corrupt(String, String),

    #[error("audio artifact written without a script for {0}")]
    MissingScript(String),
}

/// Result of a cache lookup for one fingerprint
#[derive(Debug, Clone)]
pub enum CacheLookup {
    Miss,
    HitScript(ScriptArtifact),
    HitFull(ScriptArtifact, AudioArtifact),
}

/// Outcome of trying to start generation for a fingerprint
pub enum LockAcquisition {
    Acquired(GenerationGuard),
    AlreadyInFlight(FlightWaiter),
}

type FlightTable = Arc<Mutex<HashMap<Fingerprint, watch::Receiver<bool>>>>;

/// Held by the single caller generating for a fingerprint. Dropping the guard
/// releases the flight and wakes all waiters, whether the work finished,
/// failed or was cancelled mid-stage.
pub struct GenerationGuard {
    fingerprint: Fingerprint,
    flights: FlightTable,
    done: watch::Sender<bool>,
}

impl Drop for GenerationGuard {
    fn drop(&mut self) {
        if let Ok(mut flights) = self.flights.lock() {
            flights.remove(&self.fingerprint);
        }
        let _ = self.done.send(true);
    }
}

/// Handle given to callers that lost the single-flight race. Awaiting it
/// blocks until the in-flight generation releases its guard; the caller then
/// re-checks the cache instead of duplicating the work.
pub struct FlightWaiter {
    rx: watch::Receiver<bool>,
}

impl FlightWaiter {
    pub async fn wait(mut self) {
        // A dropped sender also means the flight is over
        let _ = self.rx.wait_for(|done| *done).await;
    }
}

/// Content-addressable store for generated scripts and rendered audio.
///
/// One explicitly constructed instance owns the cache root for the process:
/// built in `main`, swept at startup, passed by `Arc` to the services that
/// need it. Artifacts are immutable once committed; writes stage to a temp
/// file in the same directory and rename into place, so readers never observe
/// a partial artifact and an abandoned write leaves nothing visible.
pub struct ArtifactStore {
    root: PathBuf,
    scripts: Cache<Fingerprint, ScriptArtifact>,
    flights: FlightTable,
}

impl ArtifactStore {
    pub async fn open(root: impl Into<PathBuf>, memory_capacity: u64) -> Result<Self, CacheError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            scripts: Cache::builder().max_capacity(memory_capacity).build(),
            flights: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn script_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.root.join(format!("{fingerprint}.script.json"))
    }

    fn audio_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.root.join(format!("{fingerprint}.mp3"))
    }

    fn audio_meta_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.root.join(format!("{fingerprint}.audio.json"))
    }

    /// Look up both artifacts for a fingerprint. `HitFull` requires the audio
    /// payload to actually be present, not just its metadata.
    pub async fn lookup(&self, fingerprint: &Fingerprint) -> Result<CacheLookup, CacheError> {
        let script = match self.load_script(fingerprint).await? {
            Some(script) => script,
            None => return Ok(CacheLookup::Miss),
        };

        match self.load_audio_meta(fingerprint).await? {
            Some(audio) if tokio::fs::try_exists(&audio.path).await.unwrap_or(false) => {
                Ok(CacheLookup::HitFull(script, audio))
            }
            _ => Ok(CacheLookup::HitScript(script)),
        }
    }

    pub async fn exists(&self, fingerprint: &Fingerprint) -> bool {
        matches!(
            self.lookup(fingerprint).await,
            Ok(CacheLookup::HitScript(_)) | Ok(CacheLookup::HitFull(_, _))
        )
    }

    /// Persist a script artifact. Commit is atomic; the in-memory layer is
    /// refreshed after the disk write succeeds.
    pub async fn put_script(&self, artifact: &ScriptArtifact) -> Result<(), CacheError> {
        let path = self.script_path(&artifact.fingerprint);
        let payload = serde_json::to_vec_pretty(artifact)
            .map_err(|e| CacheError::Corrupt(artifact.fingerprint.to_string(), e.to_string()))?;
        self.write_atomic(&path, &payload).await?;
        self.scripts
            .insert(artifact.fingerprint.clone(), artifact.clone())
            .await;

        tracing::info!(
            fingerprint = %artifact.fingerprint,
            word_count = artifact.word_count,
            provider = %artifact.provider_used,
            "Script artifact cached"
        );
        Ok(())
    }

    /// Persist rendered audio for a fingerprint. Enforces the invariant that
    /// audio never exists without its script: payload commits first, metadata
    /// after, so a crash between the two leaves a re-renderable script hit.
    pub async fn put_audio(
        &self,
        fingerprint: &Fingerprint,
        audio_data: &[u8],
        provider_used: &str,
        duration_seconds: f32,
    ) -> Result<AudioArtifact, CacheError> {
        if self.load_script(fingerprint).await?.is_none() {
            return Err(CacheError::MissingScript(fingerprint.to_string()));
        }

        let path = self.audio_path(fingerprint);
        self.write_atomic(&path, audio_data).await?;

        let artifact = AudioArtifact {
            fingerprint: fingerprint.clone(),
            path,
            size_bytes: audio_data.len() as u64,
            duration_seconds,
            encoding: "mp3".to_string(),
            provider_used: provider_used.to_string(),
            generated_at: Utc::now(),
        };
        let meta = serde_json::to_vec_pretty(&artifact)
            .map_err(|e| CacheError::Corrupt(fingerprint.to_string(), e.to_string()))?;
        self.write_atomic(&self.audio_meta_path(fingerprint), &meta)
            .await?;

        tracing::info!(
            fingerprint = %fingerprint,
            audio_size_bytes = artifact.size_bytes,
            provider = provider_used,
            "Audio artifact cached"
        );
        Ok(artifact)
    }

    /// Read the audio artifact and its payload bytes
    pub async fn read_audio(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<(AudioArtifact, Vec<u8>)>, CacheError> {
        let Some(artifact) = self.load_audio_meta(fingerprint).await? else {
            return Ok(None);
        };
        match tokio::fs::read(&artifact.path).await {
            Ok(bytes) => Ok(Some((artifact, bytes))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Io(e)),
        }
    }

    /// Remove all artifacts for a fingerprint, audio first so the
    /// "audio implies script" invariant holds at every intermediate state.
    pub async fn delete(&self, fingerprint: &Fingerprint) -> Result<(), CacheError> {
        remove_if_exists(&self.audio_meta_path(fingerprint)).await?;
        remove_if_exists(&self.audio_path(fingerprint)).await?;
        remove_if_exists(&self.script_path(fingerprint)).await?;
        self.scripts.invalidate(fingerprint).await;
        Ok(())
    }

    /// Age-bounded eviction sweep. A script is never evicted while its audio
    /// remains fresh; an expired pair is removed together. Returns the number
    /// of fingerprints removed.
    pub async fn evict_older_than(&self, max_age: chrono::Duration) -> Result<usize, CacheError> {
        let cutoff = Utc::now() - max_age;
        let mut removed = 0;

        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(hex) = name.strip_suffix(".script.json") else {
                continue;
            };
            let fingerprint: Fingerprint = match serde_json::from_value(hex.into()) {
                Ok(fp) => fp,
                Err(_) => continue,
            };

            let Some(script) = self.load_script(&fingerprint).await? else {
                continue;
            };
            let audio = self.load_audio_meta(&fingerprint).await?;

            let expired = match &audio {
                Some(audio) => script.generated_at < cutoff && audio.generated_at < cutoff,
                None => script.generated_at < cutoff,
            };
            if expired {
                self.delete(&fingerprint).await?;
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!(removed = removed, "Cache eviction sweep removed expired entries");
        }
        Ok(removed)
    }

    /// Single-flight gate: at most one concurrent generation per fingerprint.
    pub fn acquire(&self, fingerprint: &Fingerprint) -> LockAcquisition {
        let mut flights = self.flights.lock().unwrap();
        if let Some(rx) = flights.get(fingerprint) {
            return LockAcquisition::AlreadyInFlight(FlightWaiter { rx: rx.clone() });
        }

        let (tx, rx) = watch::channel(false);
        flights.insert(fingerprint.clone(), rx);
        LockAcquisition::Acquired(GenerationGuard {
            fingerprint: fingerprint.clone(),
            flights: Arc::clone(&self.flights),
            done: tx,
        })
    }

    async fn load_script(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<ScriptArtifact>, CacheError> {
        if let Some(script) = self.scripts.get(fingerprint).await {
            return Ok(Some(script));
        }
        let Some(bytes) = read_if_exists(&self.script_path(fingerprint)).await? else {
            return Ok(None);
        };
        let script: ScriptArtifact = serde_json::from_slice(&bytes)
            .map_err(|e| CacheError::Corrupt(fingerprint.to_string(), e.to_string()))?;
        self.scripts.insert(fingerprint.clone(), script.clone()).await;
        Ok(Some(script))
    }

    async fn load_audio_meta(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<AudioArtifact>, CacheError> {
        let Some(bytes) = read_if_exists(&self.audio_meta_path(fingerprint)).await? else {
            return Ok(None);
        };
        let artifact: AudioArtifact = serde_json::from_slice(&bytes)
            .map_err(|e| CacheError::Corrupt(fingerprint.to_string(), e.to_string()))?;
        Ok(Some(artifact))
    }

    /// Stage to a temp file in the cache root, then rename into place.
    async fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
        let staged = self.root.join(format!(".staged-{}", Uuid::new_v4()));
        tokio::fs::write(&staged, bytes).await?;
        match tokio::fs::rename(&staged, path).await {
            Ok(()) => Ok(()),
            Err(e) => {
                let _ = tokio::fs::remove_file(&staged).await;
                Err(CacheError::Io(e))
            }
        }
    }
}

async fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>, CacheError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CacheError::Io(e)),
    }
}

async fn remove_if_exists(path: &Path) -> Result<(), CacheError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CacheError::Io(e)),
    }
}
