use anyhow::{bail, Context, Result};

/// Application configuration, loaded once at startup from the environment.
///
/// Chunking and retrieval knobs are deliberately explicit configuration
/// rather than hardcoded constants: they materially affect retrieval
/// quality and deployments tune them per corpus.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub cors_allow_origin: String,

    pub upload_dir: String,
    pub max_upload_size: usize,

    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,

    pub embedding_api_base_url: String,
    pub embedding_api_key: String,
    pub embedding_model: String,

    pub groq_api_base_url: String,
    pub groq_api_key: String,
    pub groq_model: String,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .ok()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            host: env_or("HOST", "0.0.0.0"),
            port: env_parse("PORT", 5000)?,
            cors_allow_origin: env_or("CORS_ALLOW_ORIGIN", "*"),

            upload_dir: env_or("UPLOAD_DIR", "./uploads"),
            max_upload_size: env_parse("MAX_UPLOAD_SIZE", 50 * 1024 * 1024)?,

            chunk_size: env_parse("CHUNK_SIZE", 1000)?,
            chunk_overlap: env_parse("CHUNK_OVERLAP", 100)?,
            top_k: env_parse("RAG_TOP_K", 5)?,

            embedding_api_base_url: env_or(
                "EMBEDDING_API_BASE_URL",
                "http://localhost:8080/v1",
            ),
            embedding_api_key: env_or("EMBEDDING_API_KEY", ""),
            embedding_model: env_or("EMBEDDING_MODEL", "all-MiniLM-L6-v2"),

            groq_api_base_url: env_or("GROQ_API_BASE_URL", "https://api.groq.com/openai/v1"),
            groq_api_key: env_or("GROQ_API_KEY", ""),
            groq_model: env_or("GROQ_MODEL", "llama-3.1-8b-instant"),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            bail!("CHUNK_SIZE must be greater than zero");
        }
        if self.chunk_overlap >= self.chunk_size {
            bail!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                self.chunk_overlap,
                self.chunk_size
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            host: "0.0.0.0".into(),
            port: 5000,
            cors_allow_origin: "*".into(),
            upload_dir: "./uploads".into(),
            max_upload_size: 50 * 1024 * 1024,
            chunk_size: 1000,
            chunk_overlap: 100,
            top_k: 5,
            embedding_api_base_url: "http://localhost:8080/v1".into(),
            embedding_api_key: String::new(),
            embedding_model: "all-MiniLM-L6-v2".into(),
            groq_api_base_url: "https://api.groq.com/openai/v1".into(),
            groq_api_key: String::new(),
            groq_model: "llama-3.1-8b-instant".into(),
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        let mut config = base_config();
        config.chunk_overlap = 1000;
        assert!(config.validate().is_err());

        config.chunk_overlap = 1200;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let mut config = base_config();
        config.chunk_size = 0;
        assert!(config.validate().is_err());
    }
}
