use std::env;

use url::Url;

pub const DEFAULT_COLLECTION_NAME: &str = "rag-agent-1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_EMBEDDING_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";
pub const DEFAULT_LLM_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_LLM_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { key, value, reason } => {
                write!(f, "Invalid value {:?} for {}: {}", value, key, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Window sizes for the splitter, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ConfigError> {
        if chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "CHUNK_SIZE".to_string(),
                value: chunk_size.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if chunk_overlap >= chunk_size {
            return Err(ConfigError::InvalidValue {
                key: "CHUNK_OVERLAP".to_string(),
                value: chunk_overlap.to_string(),
                reason: format!("must be smaller than chunk size {}", chunk_size),
            });
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// 512/400 windows: heavy overlap, small chunks.
    pub fn legacy() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 400,
        }
    }

    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name.trim().to_lowercase().as_str() {
            "default" => Ok(Self::default()),
            "legacy" => Ok(Self::legacy()),
            other => Err(ConfigError::InvalidValue {
                key: "CHUNK_PRESET".to_string(),
                value: other.to_string(),
                reason: "expected `default` or `legacy`".to_string(),
            }),
        }
    }

    pub fn stride(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    pub batch_size: usize,
    pub timeout_secs: u64,
}

#[derive(Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub collection_name: String,
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub retrieval_top_k: usize,
    pub worker_count: usize,
}

impl AppConfig {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let preset = match get("CHUNK_PRESET") {
            Some(name) => ChunkingConfig::from_preset(&name)?,
            None => ChunkingConfig::default(),
        };
        let chunk_size = parse_or(&get, "CHUNK_SIZE", preset.chunk_size)?;
        let chunk_overlap = parse_or(&get, "CHUNK_OVERLAP", preset.chunk_overlap)?;
        let chunking = ChunkingConfig::new(chunk_size, chunk_overlap)?;

        let embedding = EmbeddingConfig {
            base_url: validated_url(
                "EMBEDDING_BASE_URL",
                get("EMBEDDING_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_EMBEDDING_BASE_URL.to_string()),
            )?,
            model: get("EMBEDDING_MODEL").unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            batch_size: positive(parse_or(&get, "EMBEDDING_BATCH_SIZE", 10)?, "EMBEDDING_BATCH_SIZE")?,
            timeout_secs: parse_or(&get, "EMBEDDING_TIMEOUT_SECS", 30)?,
        };

        let llm = LlmConfig {
            base_url: validated_url(
                "LLM_BASE_URL",
                get("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            )?,
            model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            api_key: get("GEMINI_API_KEY").or_else(|| get("LLM_API_KEY")),
            timeout_secs: parse_or(&get, "LLM_TIMEOUT_SECS", 60)?,
        };

        Ok(Self {
            port: parse_or(&get, "PORT", DEFAULT_PORT)?,
            database_url: get("DATABASE_URL"),
            collection_name: get("COLLECTION_NAME")
                .unwrap_or_else(|| DEFAULT_COLLECTION_NAME.to_string()),
            chunking,
            embedding,
            llm,
            retrieval_top_k: positive(parse_or(&get, "RETRIEVAL_TOP_K", 4)?, "RETRIEVAL_TOP_K")?,
            worker_count: positive(parse_or(&get, "WORKER_COUNT", 3)?, "WORKER_COUNT")?,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn positive(value: usize, key: &str) -> Result<usize, ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

fn validated_url(key: &str, raw: String) -> Result<String, ConfigError> {
    Url::parse(&raw).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.clone(),
        reason: e.to_string(),
    })?;
    Ok(raw.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.collection_name, "rag-agent-1");
        assert_eq!(config.chunking, ChunkingConfig::new(1000, 200).unwrap());
        assert_eq!(config.embedding.model, "nomic-embed-text");
        assert_eq!(config.embedding.base_url, "http://localhost:11434");
        assert_eq!(config.llm.model, "gemini-2.5-flash");
        assert!(config.llm.api_key.is_none());
        assert!(config.database_url.is_none());
        assert_eq!(config.retrieval_top_k, 4);
        assert_eq!(config.worker_count, 3);
    }

    #[test]
    fn test_legacy_preset_and_overrides() {
        let config = config_from(&[("CHUNK_PRESET", "legacy")]).unwrap();
        assert_eq!(config.chunking, ChunkingConfig::legacy());

        let config = config_from(&[("CHUNK_PRESET", "legacy"), ("CHUNK_OVERLAP", "100")]).unwrap();
        assert_eq!(config.chunking.chunk_size, 512);
        assert_eq!(config.chunking.chunk_overlap, 100);
        assert_eq!(config.chunking.stride(), 412);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let err = config_from(&[("CHUNK_SIZE", "200"), ("CHUNK_OVERLAP", "200")]).unwrap_err();
        assert!(err.to_string().contains("CHUNK_OVERLAP"));

        assert!(ChunkingConfig::new(0, 0).is_err());
        assert!(ChunkingConfig::from_preset("huge").is_err());
    }

    #[test]
    fn test_invalid_numbers_and_urls() {
        assert!(config_from(&[("PORT", "eighty")]).is_err());
        assert!(config_from(&[("WORKER_COUNT", "0")]).is_err());
        assert!(config_from(&[("LLM_BASE_URL", "not a url")]).is_err());
    }

    #[test]
    fn test_api_key_fallback_and_trailing_slash() {
        let config = config_from(&[
            ("LLM_API_KEY", "secret"),
            ("EMBEDDING_BASE_URL", "http://ollama:11434/"),
            ("DATABASE_URL", "postgres://localhost/rag"),
        ])
        .unwrap();

        assert_eq!(config.llm.api_key.as_deref(), Some("secret"));
        assert_eq!(config.embedding.base_url, "http://ollama:11434");
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/rag")
        );
        assert!(!format!("{:?}", config.llm).contains("secret"));
    }
}
