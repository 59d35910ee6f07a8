//! Configuration module
//!
//! Environment-driven configuration for the API service and worker,
//! including auth, storage, queue, and external service settings.

use std::env;

const TOKEN_TTL_SECS: u64 = 3600;
const HTTP_RATE_LIMIT_PER_MINUTE: u32 = 10;
const ANALYZE_RATE_LIMIT_PER_MINUTE: u32 = 10;
const TRANSCRIBE_RATE_LIMIT_PER_MINUTE: u32 = 5;
const CHAT_RATE_LIMIT_PER_MINUTE: u32 = 20;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    /// Secret for auth tokens and signed upload URLs.
    pub auth_secret: String,
    pub token_ttl_secs: u64,
    // Storage configuration
    pub storage_bucket: String,
    pub local_storage_path: String,
    pub local_storage_base_url: String,
    // Queue configuration
    /// Base URL the queue delivers tasks to (the worker trigger lives under it).
    pub worker_base_url: String,
    /// Optional shared secret for signing queue deliveries.
    pub queue_shared_secret: Option<String>,
    pub queue_name: String,
    // External services
    pub analyzer_url: Option<String>,
    pub transcription_api_key: Option<String>,
    pub transcription_api_url: String,
    pub chat_api_key: Option<String>,
    pub chat_api_url: String,
    pub chat_model: String,
    // Rate limits
    pub token_rate_limit_per_minute: u32,
    pub analyze_rate_limit_per_minute: u32,
    pub transcribe_rate_limit_per_minute: u32,
    pub chat_rate_limit_per_minute: u32,
}

impl Config {
    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let server_port = env::var("PORT")
            .unwrap_or_else(|_| "4000".to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let config = Config {
            server_port,
            cors_origins,
            environment,
            auth_secret: env::var("AUTH_SECRET")
                .map_err(|_| anyhow::anyhow!("AUTH_SECRET must be set for authentication"))?,
            token_ttl_secs: env::var("TOKEN_TTL_SECS")
                .unwrap_or_else(|_| TOKEN_TTL_SECS.to_string())
                .parse()
                .unwrap_or(TOKEN_TTL_SECS),
            storage_bucket: env::var("STORAGE_BUCKET")
                .unwrap_or_else(|_| "earshot-uploads".to_string()),
            local_storage_path: env::var("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|_| "./storage".to_string()),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", server_port)),
            worker_base_url: env::var("WORKER_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", server_port)),
            queue_shared_secret: env::var("QUEUE_SHARED_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),
            queue_name: env::var("QUEUE_NAME").unwrap_or_else(|_| "report-processing".to_string()),
            analyzer_url: env::var("ANALYZER_URL").ok().filter(|s| !s.is_empty()),
            transcription_api_key: env::var("TRANSCRIPTION_API_KEY")
                .ok()
                .filter(|s| !s.is_empty()),
            transcription_api_url: env::var("TRANSCRIPTION_API_URL")
                .unwrap_or_else(|_| "https://api.deepgram.com/v1/listen".to_string()),
            chat_api_key: env::var("CHAT_API_KEY").ok().filter(|s| !s.is_empty()),
            chat_api_url: env::var("CHAT_API_URL").unwrap_or_else(|_| {
                "https://generativelanguage.googleapis.com/v1beta/models".to_string()
            }),
            chat_model: env::var("CHAT_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".to_string()),
            token_rate_limit_per_minute: env::var("TOKEN_RATE_LIMIT_PER_MINUTE")
                .unwrap_or_else(|_| HTTP_RATE_LIMIT_PER_MINUTE.to_string())
                .parse()
                .unwrap_or(HTTP_RATE_LIMIT_PER_MINUTE),
            analyze_rate_limit_per_minute: env::var("ANALYZE_RATE_LIMIT_PER_MINUTE")
                .unwrap_or_else(|_| ANALYZE_RATE_LIMIT_PER_MINUTE.to_string())
                .parse()
                .unwrap_or(ANALYZE_RATE_LIMIT_PER_MINUTE),
            transcribe_rate_limit_per_minute: env::var("TRANSCRIBE_RATE_LIMIT_PER_MINUTE")
                .unwrap_or_else(|_| TRANSCRIBE_RATE_LIMIT_PER_MINUTE.to_string())
                .parse()
                .unwrap_or(TRANSCRIBE_RATE_LIMIT_PER_MINUTE),
            chat_rate_limit_per_minute: env::var("CHAT_RATE_LIMIT_PER_MINUTE")
                .unwrap_or_else(|_| CHAT_RATE_LIMIT_PER_MINUTE.to_string())
                .parse()
                .unwrap_or(CHAT_RATE_LIMIT_PER_MINUTE),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.auth_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "AUTH_SECRET must be at least 32 characters long"
            ));
        }

        if self.token_ttl_secs == 0 {
            return Err(anyhow::anyhow!("TOKEN_TTL_SECS must be greater than zero"));
        }

        if let Some(secret) = &self.queue_shared_secret {
            if secret.len() < 16 {
                return Err(anyhow::anyhow!(
                    "QUEUE_SHARED_SECRET must be at least 16 characters long"
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            server_port: 4000,
            cors_origins: vec!["*".to_string()],
            environment: "development".to_string(),
            auth_secret: "a".repeat(32),
            token_ttl_secs: 3600,
            storage_bucket: "earshot-uploads".to_string(),
            local_storage_path: "./storage".to_string(),
            local_storage_base_url: "http://localhost:4000".to_string(),
            worker_base_url: "http://localhost:4000".to_string(),
            queue_shared_secret: None,
            queue_name: "report-processing".to_string(),
            analyzer_url: None,
            transcription_api_key: None,
            transcription_api_url: "https://api.deepgram.com/v1/listen".to_string(),
            chat_api_key: None,
            chat_api_url: "https://example.test".to_string(),
            chat_model: "gemini-2.0-flash".to_string(),
            token_rate_limit_per_minute: 10,
            analyze_rate_limit_per_minute: 10,
            transcribe_rate_limit_per_minute: 5,
            chat_rate_limit_per_minute: 20,
        }
    }

    #[test]
    fn short_auth_secret_rejected() {
        let mut config = base_config();
        config.auth_secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn production_detection() {
        let mut config = base_config();
        config.environment = "Production".to_string();
        assert!(config.is_production());
    }
}
