use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    // Artifact cache
    pub cache_dir: PathBuf,
    pub cache_max_age_days: i64,
    pub cache_memory_capacity: u64,
    // Providers
    pub aws_region: String,
    pub openai_chat_model: String,
    pub openai_tts_model: String,
    // Generation policy
    pub generation_temperature: f32,
    pub generation_max_tokens: u32,
    pub length_tolerance: f32,
    // Retry / timeout policy
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub provider_timeout_secs: u64,
    pub item_deadline_secs: u64,
    pub worker_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let config = Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "production" => Environment::Production,
                    _ => Environment::Development,
                })?,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "json" => LogFormat::Json,
                    _ => LogFormat::Pretty,
                })?,
            cache_dir: env::var("CACHE_DIR")
                .unwrap_or_else(|_| "data/cache".to_string())
                .into(),
            cache_max_age_days: env::var("CACHE_MAX_AGE_DAYS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
            cache_memory_capacity: env::var("CACHE_MEMORY_CAPACITY")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,
            aws_region: env::var("AWS_REGION").unwrap_or_else(|_| "eu-west-1".to_string()),
            openai_chat_model: env::var("OPENAI_CHAT_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            openai_tts_model: env::var("OPENAI_TTS_MODEL").unwrap_or_else(|_| "tts-1".to_string()),
            generation_temperature: env::var("GENERATION_TEMPERATURE")
                .unwrap_or_else(|_| "0.7".to_string())
                .parse()?,
            generation_max_tokens: env::var("GENERATION_MAX_TOKENS")
                .unwrap_or_else(|_| "1500".to_string())
                .parse()?,
            length_tolerance: env::var("LENGTH_TOLERANCE")
                .unwrap_or_else(|_| "0.2".to_string())
                .parse()?,
            retry_max_attempts: env::var("RETRY_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()?,
            retry_base_delay_ms: env::var("RETRY_BASE_DELAY_MS")
                .unwrap_or_else(|_| "500".to_string())
                .parse()?,
            retry_max_delay_ms: env::var("RETRY_MAX_DELAY_MS")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()?,
            provider_timeout_secs: env::var("PROVIDER_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
            item_deadline_secs: env::var("ITEM_DEADLINE_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()?,
            worker_concurrency: env::var("WORKER_CONCURRENCY")
                .unwrap_or_else(|_| "4".to_string())
                .parse()?,
        };

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}
