use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use uuid::Uuid;

use learntape_backend::domain::pipeline::{
    ItemStatus, PipelineItem, PipelineService, PipelineServiceError, PipelineSettings,
};
use learntape_backend::domain::playlist::PlaylistService;
use learntape_backend::domain::script::{GenerationError, ScriptService, SnippetPrompt};
use learntape_backend::domain::shared::RetryPolicy;
use learntape_backend::domain::speech::{
    LanguageCode, ProviderId, SpeechProviderError, SynthesisService, VoiceRegistry,
};
use learntape_backend::infrastructure::cache::{ArtifactStore, CacheLookup, FingerprintVersions};
use learntape_backend::infrastructure::repositories::{ScriptRepository, SpeechRepository};

const VERSIONS: FingerprintVersions = FingerprintVersions {
    prompt_template: 1,
    voice_chains: 1,
};

/// Script provider fake: returns a fixed completion and counts calls
struct FakeScriptRepository {
    content: String,
    calls: AtomicUsize,
}

impl FakeScriptRepository {
    fn returning(content: String) -> Arc<Self> {
        Arc::new(Self {
            content,
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScriptRepository for FakeScriptRepository {
    fn provider_id(&self) -> &str {
        "fake-llm"
    }

    async fn generate(
        &self,
        _prompt: &SnippetPrompt,
        _max_tokens: u32,
    ) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.content.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SpeechMode {
    Healthy,
    Failing,
    Hanging,
}

/// Speech provider fake: echoes chunk text as "audio", with switchable
/// failure modes
struct FakeSpeechRepository {
    provider: ProviderId,
    mode: Mutex<SpeechMode>,
    calls: AtomicUsize,
}

impl FakeSpeechRepository {
    fn new(provider: ProviderId, mode: SpeechMode) -> Arc<Self> {
        Arc::new(Self {
            provider,
            mode: Mutex::new(mode),
            calls: AtomicUsize::new(0),
        })
    }

    fn set_mode(&self, mode: SpeechMode) {
        *self.mode.lock().unwrap() = mode;
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechRepository for FakeSpeechRepository {
    fn provider(&self) -> ProviderId {
        self.provider
    }

    fn max_chunk_len(&self) -> usize {
        3000
    }

    async fn synthesize_chunk(
        &self,
        text: &str,
        _voice_id: &str,
    ) -> Result<Vec<u8>, SpeechProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mode = *self.mode.lock().unwrap();
        match mode {
            SpeechMode::Healthy => Ok(text.as_bytes().to_vec()),
            SpeechMode::Failing => Err(SpeechProviderError::Transport(
                "simulated outage".to_string(),
            )),
            SpeechMode::Hanging => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(Vec::new())
            }
        }
    }
}

struct TestContext {
    _cache_dir: tempfile::TempDir,
    store: Arc<ArtifactStore>,
    pipeline: Arc<PipelineService>,
    playlist: Arc<PlaylistService>,
    script_repo: Arc<FakeScriptRepository>,
    polly: Arc<FakeSpeechRepository>,
    openai: Arc<FakeSpeechRepository>,
}

impl TestContext {
    async fn new(script_content: String, polly_mode: SpeechMode, openai_mode: SpeechMode) -> Self {
        Self::with_deadline(script_content, polly_mode, openai_mode, Duration::from_secs(30)).await
    }

    async fn with_deadline(
        script_content: String,
        polly_mode: SpeechMode,
        openai_mode: SpeechMode,
        item_deadline: Duration,
    ) -> Self {
        let cache_dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ArtifactStore::open(cache_dir.path(), 100).await.unwrap());

        let script_repo = FakeScriptRepository::returning(script_content);
        let polly = FakeSpeechRepository::new(ProviderId::Polly, polly_mode);
        let openai = FakeSpeechRepository::new(ProviderId::OpenAi, openai_mode);

        let retry = RetryPolicy::new(2, Duration::from_millis(1), Duration::from_millis(2));
        let script_service = Arc::new(ScriptService::new(
            script_repo.clone(),
            retry.clone(),
            0.2,
            1500,
        ));
        let synthesis_service = Arc::new(SynthesisService::new(
            Arc::new(VoiceRegistry::with_default_chains()),
            vec![polly.clone() as Arc<dyn SpeechRepository>, openai.clone()],
            Duration::from_millis(500),
            retry,
        ));
        let playlist = Arc::new(PlaylistService::new());
        let pipeline = PipelineService::new(
            store.clone(),
            script_service,
            synthesis_service,
            playlist.clone(),
            PipelineSettings {
                versions: VERSIONS,
                worker_concurrency: 4,
                item_deadline,
            },
        );

        Self {
            _cache_dir: cache_dir,
            store,
            pipeline,
            playlist,
            script_repo,
            polly,
            openai,
        }
    }

    async fn wait_for_terminal(&self, item_id: Uuid) -> PipelineItem {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        loop {
            if let Some(item) = self.pipeline.get_item(item_id).await {
                if item.status.is_terminal() {
                    return item;
                }
            }
            if tokio::time::Instant::now() > deadline {
                panic!("item {item_id} never reached a terminal state");
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// A '# '-titled script body of roughly `words` words, in sentences
fn english_script(words: usize) -> String {
    let sentence = "Plants capture sunlight and turn it into sugar for growth. ";
    format!("# The Hidden Life of Plants\n{}", sentence.repeat(words / 10))
}

fn arabic_script(words: usize) -> String {
    let sentence = "كان تاريخ روما مليئا بالاحداث العظيمة والقصص المدهشة عبر القرون. ";
    format!("# تاريخ روما\n{}", sentence.repeat(words / 10))
}

#[tokio::test]
async fn it_should_complete_an_item_end_to_end() {
    // 3 minutes of English at 150 wpm: 450-word target
    let ctx = TestContext::new(english_script(450), SpeechMode::Healthy, SpeechMode::Healthy).await;

    let items = ctx
        .pipeline
        .submit_playlist(vec!["Photosynthesis".to_string()], LanguageCode::English, 3)
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].status, ItemStatus::Pending);

    let item = ctx.wait_for_terminal(items[0].id).await;
    assert_eq!(item.status, ItemStatus::Completed);
    assert!(!item.cache_hit);
    assert!(item.error_detail.is_none());

    let script = item.script.expect("completed item carries a script ref");
    assert_eq!(script.provider_used, "fake-llm");
    assert!(script.word_count >= 360 && script.word_count <= 540);

    let audio = item.audio.expect("completed item carries an audio ref");
    assert_eq!(audio.provider_used, "polly");
    assert_eq!(audio.encoding, "mp3");

    // Audio bytes round-trip byte-identical through the store
    let (artifact, bytes) = ctx.pipeline.audio_for_item(item.id).await.unwrap();
    assert_eq!(artifact.provider_used, "polly");
    assert_eq!(bytes.len() as u64, artifact.size_bytes);
    assert_eq!(ctx.script_repo.call_count(), 1);
}

#[tokio::test]
async fn it_should_dedup_concurrent_identical_topics() {
    let ctx = TestContext::new(english_script(450), SpeechMode::Healthy, SpeechMode::Healthy).await;

    // Same topic twice in one batch: identical fingerprints race for the lock
    let items = ctx
        .pipeline
        .submit_playlist(
            vec!["Photosynthesis".to_string(), "photosynthesis".to_string()],
            LanguageCode::English,
            3,
        )
        .await
        .unwrap();
    assert_eq!(items.len(), 2);

    let first = ctx.wait_for_terminal(items[0].id).await;
    let second = ctx.wait_for_terminal(items[1].id).await;
    assert_eq!(first.status, ItemStatus::Completed);
    assert_eq!(second.status, ItemStatus::Completed);
    assert_eq!(first.fingerprint, second.fingerprint);

    // Exactly one generation and one synthesis for the shared fingerprint
    assert_eq!(ctx.script_repo.call_count(), 1);
    assert_eq!(ctx.polly.call_count(), 1);

    // The loser of the race was served from the cache
    assert!(first.cache_hit || second.cache_hit);
}

#[tokio::test]
async fn it_should_fall_back_when_the_primary_provider_fails() {
    let ctx = TestContext::new(arabic_script(390), SpeechMode::Failing, SpeechMode::Healthy).await;

    let items = ctx
        .pipeline
        .submit_playlist(vec!["Histoire de Rome".to_string()], LanguageCode::Arabic, 3)
        .await
        .unwrap();

    let item = ctx.wait_for_terminal(items[0].id).await;
    assert_eq!(item.status, ItemStatus::Completed);

    let audio = item.audio.expect("fallback still produces audio");
    assert_eq!(audio.provider_used, "openai");
    assert!(ctx.polly.call_count() >= 1, "primary must have been attempted");
    assert!(ctx.openai.call_count() >= 1);
}

#[tokio::test]
async fn it_should_report_all_providers_exhausted_and_keep_the_script() {
    let ctx = TestContext::new(english_script(450), SpeechMode::Failing, SpeechMode::Failing).await;

    let items = ctx
        .pipeline
        .submit_playlist(vec!["Photosynthesis".to_string()], LanguageCode::English, 3)
        .await
        .unwrap();

    let item = ctx.wait_for_terminal(items[0].id).await;
    assert_eq!(item.status, ItemStatus::Failed);

    // Every chain entry's failure is listed, in chain order
    let detail = item.error_detail.expect("failed item carries error detail");
    assert!(detail.contains("all providers exhausted"), "{detail}");
    let polly_at = detail.find("polly/").expect("primary failure listed");
    let openai_at = detail.find("openai/").expect("fallback failure listed");
    assert!(polly_at < openai_at);

    // The script survived the synthesis failure
    let fingerprint = item.fingerprint.expect("failed after fingerprinting");
    assert!(matches!(
        ctx.store.lookup(&fingerprint).await.unwrap(),
        CacheLookup::HitScript(_)
    ));

    // A retry skips regeneration and goes straight to synthesis
    ctx.polly.set_mode(SpeechMode::Healthy);
    let retried = ctx.pipeline.retry(item.id).await.unwrap();
    let retried = ctx.wait_for_terminal(retried.id).await;
    assert_eq!(retried.status, ItemStatus::Completed);
    assert_eq!(ctx.script_repo.call_count(), 1, "script must come from cache");
}

#[tokio::test]
async fn it_should_hit_the_cache_on_resubmission() {
    let ctx = TestContext::new(english_script(450), SpeechMode::Healthy, SpeechMode::Healthy).await;

    let items = ctx
        .pipeline
        .submit_playlist(vec!["Photosynthesis".to_string()], LanguageCode::English, 3)
        .await
        .unwrap();
    let first = ctx.wait_for_terminal(items[0].id).await;
    assert_eq!(first.status, ItemStatus::Completed);

    let script_calls = ctx.script_repo.call_count();
    let speech_calls = ctx.polly.call_count();

    let resubmitted = ctx
        .pipeline
        .submit_playlist(vec!["Photosynthesis".to_string()], LanguageCode::English, 3)
        .await
        .unwrap();
    let second = ctx.wait_for_terminal(resubmitted[0].id).await;

    assert_eq!(second.status, ItemStatus::Completed);
    assert!(second.cache_hit);
    assert_eq!(second.fingerprint, first.fingerprint);
    // Zero new provider calls
    assert_eq!(ctx.script_repo.call_count(), script_calls);
    assert_eq!(ctx.polly.call_count(), speech_calls);
}

#[tokio::test]
async fn it_should_keep_playlist_order_and_process_items_independently() {
    let ctx = TestContext::new(english_script(450), SpeechMode::Healthy, SpeechMode::Healthy).await;

    let items = ctx
        .pipeline
        .submit_playlist(
            vec![
                "Photosynthesis".to_string(),
                "The French Revolution".to_string(),
                "Basics of cryptography".to_string(),
            ],
            LanguageCode::English,
            3,
        )
        .await
        .unwrap();

    for item in &items {
        let finished = ctx.wait_for_terminal(item.id).await;
        assert_eq!(finished.status, ItemStatus::Completed);
    }

    // Positions follow submission order, independent of completion order
    let entries = ctx.playlist.list().await;
    assert_eq!(entries.len(), 3);
    for (position, (entry, item)) in entries.iter().zip(items.iter()).enumerate() {
        assert_eq!(entry.position, position as u32);
        assert_eq!(entry.item_id, item.id);
    }

    // Tombstoning the middle entry keeps later positions stable
    ctx.playlist.remove(entries[1].id).await.unwrap();
    let after = ctx.playlist.list().await;
    assert!(after[1].is_removed());
    assert_eq!(after[2].position, 2);
}

#[tokio::test]
async fn it_should_reject_invalid_submissions() {
    let ctx = TestContext::new(english_script(450), SpeechMode::Healthy, SpeechMode::Healthy).await;

    let err = ctx
        .pipeline
        .submit_playlist(vec!["Photosynthesis".to_string()], LanguageCode::English, 2)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineServiceError::Invalid(_)));

    let err = ctx
        .pipeline
        .submit_playlist(vec!["   ".to_string()], LanguageCode::English, 5)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineServiceError::Invalid(_)));
}

#[tokio::test]
async fn it_should_cancel_a_running_item() {
    let ctx = TestContext::new(english_script(450), SpeechMode::Hanging, SpeechMode::Hanging).await;

    let items = ctx
        .pipeline
        .submit_playlist(vec!["Photosynthesis".to_string()], LanguageCode::English, 3)
        .await
        .unwrap();
    let item_id = items[0].id;

    // Let the worker reach the hanging synthesis stage, then cancel
    tokio::time::sleep(Duration::from_millis(100)).await;
    ctx.pipeline.cancel(item_id).await.unwrap();

    let item = ctx.wait_for_terminal(item_id).await;
    assert_eq!(item.status, ItemStatus::Failed);
    assert!(item.error_detail.unwrap().contains("cancelled"));

    // The fingerprint lock was released: a new submission makes progress
    // instead of waiting forever on the abandoned flight
    ctx.polly.set_mode(SpeechMode::Healthy);
    let resubmitted = ctx
        .pipeline
        .submit_playlist(vec!["Photosynthesis".to_string()], LanguageCode::English, 3)
        .await
        .unwrap();
    let second = ctx.wait_for_terminal(resubmitted[0].id).await;
    assert_eq!(second.status, ItemStatus::Completed);
}

#[tokio::test]
async fn it_should_fail_an_item_that_exceeds_its_deadline() {
    let ctx = TestContext::with_deadline(
        english_script(450),
        SpeechMode::Hanging,
        SpeechMode::Hanging,
        Duration::from_millis(300),
    )
    .await;

    let items = ctx
        .pipeline
        .submit_playlist(vec!["Photosynthesis".to_string()], LanguageCode::English, 3)
        .await
        .unwrap();

    let item = ctx.wait_for_terminal(items[0].id).await;
    assert_eq!(item.status, ItemStatus::Failed);
    assert!(item.error_detail.unwrap().contains("deadline exceeded"));
}

#[tokio::test]
async fn it_should_not_attempt_synthesis_for_an_unregistered_language() {
    // Registry with no chains at all: resolution fails before any speech call
    let cache_dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ArtifactStore::open(cache_dir.path(), 100).await.unwrap());
    let script_repo = FakeScriptRepository::returning(english_script(450));
    let polly = FakeSpeechRepository::new(ProviderId::Polly, SpeechMode::Healthy);

    let retry = RetryPolicy::new(2, Duration::from_millis(1), Duration::from_millis(2));
    let pipeline = PipelineService::new(
        store,
        Arc::new(ScriptService::new(script_repo, retry.clone(), 0.2, 1500)),
        Arc::new(SynthesisService::new(
            Arc::new(VoiceRegistry::new(Default::default())),
            vec![polly.clone() as Arc<dyn SpeechRepository>],
            Duration::from_millis(500),
            retry,
        )),
        Arc::new(PlaylistService::new()),
        PipelineSettings {
            versions: VERSIONS,
            worker_concurrency: 4,
            item_deadline: Duration::from_secs(30),
        },
    );

    let items = pipeline
        .submit_playlist(vec!["Photosynthesis".to_string()], LanguageCode::English, 3)
        .await
        .unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    let item = loop {
        if let Some(item) = pipeline.get_item(items[0].id).await {
            if item.status.is_terminal() {
                break item;
            }
        }
        assert!(tokio::time::Instant::now() < deadline);
        tokio::time::sleep(Duration::from_millis(10)).await;
    };

    assert_eq!(item.status, ItemStatus::Failed);
    assert!(item.error_detail.unwrap().contains("unsupported language"));
    assert_eq!(polly.call_count(), 0);
}
