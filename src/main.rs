use std::sync::Arc;
use std::time::Duration;

use learntape_backend::domain::pipeline::{PipelineService, PipelineSettings};
use learntape_backend::domain::playlist::PlaylistService;
use learntape_backend::domain::script::{ScriptService, PROMPT_TEMPLATE_VERSION};
use learntape_backend::domain::shared::RetryPolicy;
use learntape_backend::domain::speech::{SynthesisService, VoiceRegistry, VOICE_CHAIN_VERSION};
use learntape_backend::infrastructure::cache::{ArtifactStore, FingerprintVersions};
use learntape_backend::infrastructure::config::{Config, LogFormat};
use learntape_backend::infrastructure::http::start_http_server;
use learntape_backend::infrastructure::repositories::{
    OpenAiScriptRepository, OpenAiSpeechRepository, PollySpeechRepository, SpeechRepository,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting Learntape Backend on {}:{}",
        config.host,
        config.port
    );

    // Open the artifact store and sweep entries past the age bound
    let store = Arc::new(ArtifactStore::open(&config.cache_dir, config.cache_memory_capacity).await?);
    let removed = store
        .evict_older_than(chrono::Duration::days(config.cache_max_age_days))
        .await?;
    tracing::info!(
        cache_dir = %config.cache_dir.display(),
        evicted = removed,
        "Artifact store ready"
    );

    // Create AWS Polly client
    tracing::info!("Initializing AWS Polly client with region: {}", config.aws_region);

    // Check for AWS credentials in environment (for debugging)
    let has_access_key = std::env::var("AWS_ACCESS_KEY_ID").is_ok();
    let has_secret_key = std::env::var("AWS_SECRET_ACCESS_KEY").is_ok();
    tracing::info!(
        has_access_key_id = has_access_key,
        has_secret_access_key = has_secret_key,
        "AWS credentials environment check"
    );

    if !has_access_key || !has_secret_key {
        tracing::warn!("AWS credentials not found in environment variables. Will attempt to use other credential providers (instance metadata, etc.)");
    }

    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.aws_region.clone()))
        .load()
        .await;
    let polly_client = Arc::new(aws_sdk_polly::Client::new(&aws_config));
    tracing::info!("AWS Polly client initialized successfully");

    // OpenAI client reads OPENAI_API_KEY from the environment
    let openai_client = Arc::new(async_openai::Client::new());

    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Instantiate provider repositories (inject SDK clients)
    tracing::info!("Instantiating provider repositories...");
    let script_repo = Arc::new(OpenAiScriptRepository::new(
        openai_client.clone(),
        config.openai_chat_model.clone(),
        config.generation_temperature,
    ));
    let speech_repos: Vec<Arc<dyn SpeechRepository>> = vec![
        Arc::new(PollySpeechRepository::new(polly_client.clone())),
        Arc::new(OpenAiSpeechRepository::new(
            openai_client.clone(),
            config.openai_tts_model.clone(),
        )),
    ];

    // 2. Shared retry policy and voice registry
    let retry = RetryPolicy::new(
        config.retry_max_attempts,
        Duration::from_millis(config.retry_base_delay_ms),
        Duration::from_millis(config.retry_max_delay_ms),
    );
    let registry = Arc::new(VoiceRegistry::with_default_chains());

    // 3. Instantiate services (inject repositories and policies)
    tracing::info!("Instantiating services...");
    let script_service = Arc::new(ScriptService::new(
        script_repo,
        retry.clone(),
        config.length_tolerance,
        config.generation_max_tokens,
    ));
    let synthesis_service = Arc::new(SynthesisService::new(
        registry,
        speech_repos,
        Duration::from_secs(config.provider_timeout_secs),
        retry,
    ));
    let playlist_service = Arc::new(PlaylistService::new());
    let pipeline_service = PipelineService::new(
        store.clone(),
        script_service,
        synthesis_service,
        playlist_service.clone(),
        PipelineSettings {
            versions: FingerprintVersions {
                prompt_template: PROMPT_TEMPLATE_VERSION,
                voice_chains: VOICE_CHAIN_VERSION,
            },
            worker_concurrency: config.worker_concurrency,
            item_deadline: Duration::from_secs(config.item_deadline_secs),
        },
    );

    // 4. Instantiate controllers (inject services)
    tracing::info!("Instantiating controllers...");
    let playlist_controller = Arc::new(learntape_backend::controllers::PlaylistController::new(
        pipeline_service.clone(),
        playlist_service.clone(),
    ));
    let item_controller = Arc::new(learntape_backend::controllers::ItemController::new(
        pipeline_service,
    ));

    // Start HTTP server with all routes
    start_http_server(config, store, playlist_controller, item_controller).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "learntape_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "learntape_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
