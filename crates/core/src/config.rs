//! Configuration management for EasyDocs.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (`.easydocs/config.yaml` or `EASYDOCS_CONFIG`)
//! - Environment variables (the Azure variables of a deployed instance)
//! - Command-line flags
//!
//! Later sources win over earlier ones.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Known completion providers.
pub const LLM_PROVIDERS: [&str; 2] = ["azure-openai", "ollama"];

/// Known embedding providers.
pub const EMBEDDING_PROVIDERS: [&str; 3] = ["azure", "ollama", "mock"];

/// Known search index providers.
pub const SEARCH_PROVIDERS: [&str; 2] = ["azure", "memory"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .easydocs/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Completion provider settings
    pub llm: LlmSettings,

    /// Embedding provider settings
    pub embedding: EmbeddingSettings,

    /// Search index settings
    pub search: SearchSettings,

    /// Chunking policy
    pub chunking: ChunkingSettings,

    /// Upload acceptance policy
    pub upload: UploadSettings,
}

/// Completion provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// "azure-openai" or "ollama"
    pub provider: String,

    /// Base endpoint URL
    pub endpoint: Option<String>,

    /// Model name (Ollama) or deployment id (Azure)
    pub model: String,

    /// Azure REST API version
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Name of the environment variable holding the API key
    #[serde(rename = "apiKeyEnv")]
    pub api_key_env: String,

    /// Request timeout in seconds
    pub timeout: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "azure-openai".to_string(),
            endpoint: None,
            model: "gpt-4o".to_string(),
            api_version: "2024-02-01".to_string(),
            api_key_env: "AZURE_OPENAI_API_KEY".to_string(),
            timeout: 60,
        }
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// "azure", "ollama" or "mock"
    pub provider: String,

    /// Base endpoint URL (defaults to the completion endpoint for Azure)
    pub endpoint: Option<String>,

    /// Model name (Ollama) or deployment id (Azure)
    pub model: String,

    /// Expected vector dimensions
    pub dimensions: usize,

    /// Maximum inputs per provider call
    #[serde(rename = "batchSize")]
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "azure".to_string(),
            endpoint: None,
            model: "text-embedding-ada-002".to_string(),
            dimensions: 1536,
            batch_size: 16,
        }
    }
}

/// Search index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// "azure" or "memory"
    pub provider: String,

    /// Search service endpoint URL
    pub endpoint: Option<String>,

    /// Index name
    #[serde(rename = "indexName")]
    pub index_name: String,

    /// Field holding chunk text (keyword search is restricted to it)
    #[serde(rename = "textField")]
    pub text_field: String,

    /// Field holding the chunk vector
    #[serde(rename = "vectorField")]
    pub vector_field: String,

    /// Name of the environment variable holding the admin key
    #[serde(rename = "apiKeyEnv")]
    pub api_key_env: String,

    /// Search REST API version
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Number of chunks retrieved per question
    #[serde(rename = "topK")]
    pub top_k: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            provider: "azure".to_string(),
            endpoint: None,
            index_name: "easydocs".to_string(),
            text_field: "content".to_string(),
            vector_field: "contentVector".to_string(),
            api_key_env: "AZURE_SEARCH_API_KEY".to_string(),
            api_version: "2023-11-01".to_string(),
            top_k: 3,
        }
    }
}

/// Chunking policy, in characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub size: usize,
    pub overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            size: 1000,
            overlap: 200,
        }
    }
}

/// Upload acceptance policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    #[serde(rename = "acceptedMimeType")]
    pub accepted_mime_type: String,

    #[serde(rename = "maxBytes")]
    pub max_bytes: u64,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            accepted_mime_type: "application/pdf".to_string(),
            max_bytes: 20 * 1024 * 1024,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSettings>,
    embedding: Option<EmbeddingSettings>,
    search: Option<SearchSettings>,
    chunking: Option<ChunkingSettings>,
    upload: Option<UploadSettings>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: LlmSettings::default(),
            embedding: EmbeddingSettings::default(),
            search: SearchSettings::default(),
            chunking: ChunkingSettings::default(),
            upload: UploadSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML config file, and environment variables.
    ///
    /// Environment variables:
    /// - `EASYDOCS_WORKSPACE`: Override workspace path
    /// - `EASYDOCS_CONFIG`: Path to config file
    /// - `AZURE_OPENAI_ENDPOINT`: Completion (and default embedding) endpoint
    /// - `AZURE_API_VERSION`: Azure OpenAI REST API version
    /// - `AZURE_DEPLOYMENT_ID`: Chat completion deployment
    /// - `AZURE_EMBEDDING_DEPLOYMENT_ID`: Embedding deployment
    /// - `AZURE_SEARCH_ENDPOINT`: Search service endpoint
    /// - `AZURE_SEARCH_INDEX`: Index name
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// API keys are never stored in the config; only the name of the
    /// variable holding them is (see [`AppConfig::resolve_secret`]).
    ///
    /// # Example
    /// ```no_run
    /// use easydocs_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Index: {}", config.search.index_name);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Like [`AppConfig::load`], but an explicit workspace or config file
    /// (e.g. from command-line flags) wins over the environment.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace.or_else(|| std::env::var_os("EASYDOCS_WORKSPACE").map(PathBuf::from)) {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var_os("EASYDOCS_CONFIG").map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.easydocs_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        config.apply_env(|name| std::env::var(name).ok());

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&self, contents: &str) -> Result<Self, serde_yaml::Error> {
        let config_file: ConfigFile = serde_yaml::from_str(contents)?;

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            result.llm = llm;
        }
        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }
        if let Some(search) = config_file.search {
            result.search = search;
        }
        if let Some(chunking) = config_file.chunking {
            result.chunking = chunking;
        }
        if let Some(upload) = config_file.upload {
            result.upload = upload;
        }

        Ok(result)
    }

    /// Apply environment overrides through a lookup function.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = lookup("AZURE_OPENAI_ENDPOINT") {
            self.llm.endpoint = Some(endpoint);
        }
        if let Some(version) = lookup("AZURE_API_VERSION") {
            self.llm.api_version = version;
        }
        if let Some(deployment) = lookup("AZURE_DEPLOYMENT_ID") {
            self.llm.model = deployment;
        }
        if let Some(deployment) = lookup("AZURE_EMBEDDING_DEPLOYMENT_ID") {
            self.embedding.model = deployment;
        }
        if let Some(endpoint) = lookup("AZURE_SEARCH_ENDPOINT") {
            self.search.endpoint = Some(endpoint);
        }
        if let Some(index) = lookup("AZURE_SEARCH_INDEX") {
            self.search.index_name = index;
        }
        if let Some(level) = lookup("RUST_LOG") {
            self.log_level = Some(level);
        }
        if lookup("NO_COLOR").is_some() {
            self.no_color = true;
        }
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over file and environment values.
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .easydocs directory.
    pub fn easydocs_dir(&self) -> PathBuf {
        self.workspace.join(".easydocs")
    }

    /// Endpoint used for embeddings: explicit setting, else the completion endpoint.
    pub fn embedding_endpoint(&self) -> Option<&str> {
        self.embedding
            .endpoint
            .as_deref()
            .or(self.llm.endpoint.as_deref())
    }

    /// Read a secret from the named environment variable.
    pub fn resolve_secret(env_var: &str) -> AppResult<String> {
        std::env::var(env_var).map_err(|_| {
            AppError::Config(format!(
                "Secret not found in environment variable: {}",
                env_var
            ))
        })
    }

    /// Validate provider names, required endpoints, and the chunking policy.
    pub fn validate(&self) -> AppResult<()> {
        check_known("completion", &self.llm.provider, &LLM_PROVIDERS)?;
        check_known("embedding", &self.embedding.provider, &EMBEDDING_PROVIDERS)?;
        check_known("search", &self.search.provider, &SEARCH_PROVIDERS)?;

        if self.llm.provider == "azure-openai" && self.llm.endpoint.is_none() {
            return Err(AppError::Config(
                "azure-openai provider requires an endpoint (set AZURE_OPENAI_ENDPOINT)"
                    .to_string(),
            ));
        }

        if self.embedding.provider == "azure" && self.embedding_endpoint().is_none() {
            return Err(AppError::Config(
                "azure embedding provider requires an endpoint".to_string(),
            ));
        }

        if self.search.provider == "azure" && self.search.endpoint.is_none() {
            return Err(AppError::Config(
                "azure search provider requires an endpoint (set AZURE_SEARCH_ENDPOINT)"
                    .to_string(),
            ));
        }

        if self.embedding.dimensions == 0 || self.embedding.batch_size == 0 {
            return Err(AppError::Config(
                "embedding dimensions and batchSize must be positive".to_string(),
            ));
        }

        if self.search.top_k == 0 {
            return Err(AppError::Config("search topK must be positive".to_string()));
        }

        if self.chunking.size == 0 || self.chunking.overlap >= self.chunking.size {
            return Err(AppError::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunking.overlap, self.chunking.size
            )));
        }

        Ok(())
    }
}

fn check_known(kind: &str, provider: &str, known: &[&str]) -> AppResult<()> {
    if known.contains(&provider) {
        Ok(())
    } else {
        Err(AppError::Config(format!(
            "Unknown {} provider: {}. Supported: {}",
            kind,
            provider,
            known.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn local_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.llm.provider = "ollama".to_string();
        config.embedding.provider = "mock".to_string();
        config.search.provider = "memory".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.llm.provider, "azure-openai");
        assert_eq!(config.search.top_k, 3);
        assert_eq!(config.chunking.size, 1000);
        assert_eq!(config.chunking.overlap, 200);
        assert_eq!(config.upload.accepted_mime_type, "application/pdf");
        assert_eq!(config.upload.max_bytes, 20 * 1024 * 1024);
        assert!(!config.verbose);
    }

    #[test]
    fn test_easydocs_dir() {
        let config = AppConfig::default();
        assert!(config.easydocs_dir().ends_with(".easydocs"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(None, None, None, true, true);
        assert!(config.verbose);
        assert!(config.no_color);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("AZURE_OPENAI_ENDPOINT", "https://example.openai.azure.com"),
            ("AZURE_DEPLOYMENT_ID", "gpt-4o-mini"),
            ("AZURE_SEARCH_INDEX", "contracts"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(
            config.llm.endpoint.as_deref(),
            Some("https://example.openai.azure.com")
        );
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.search.index_name, "contracts");
        assert_eq!(
            config.embedding_endpoint(),
            Some("https://example.openai.azure.com")
        );
    }

    #[test]
    fn test_merge_yaml() {
        let yaml = r#"
llm:
  provider: ollama
  endpoint: http://localhost:11434
  model: llama3.2
search:
  provider: memory
  topK: 5
chunking:
  size: 500
  overlap: 50
logging:
  level: debug
  color: false
"#;
        let config = AppConfig::default().merge_yaml_str(yaml).unwrap();
        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.search.provider, "memory");
        assert_eq!(config.search.top_k, 5);
        // Unspecified fields keep their defaults
        assert_eq!(config.search.text_field, "content");
        assert_eq!(config.chunking.size, 500);
        assert_eq!(config.log_level, Some("debug".to_string()));
        assert!(config.no_color);
    }

    #[test]
    fn test_merge_yaml_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "upload:\n  maxBytes: 1024\n").unwrap();

        let config = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(config.upload.max_bytes, 1024);
        assert_eq!(config.upload.accepted_mime_type, "application/pdf");
    }

    #[test]
    fn test_load_from_explicit_config_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("custom.yaml");
        std::fs::write(&path, "upload:\n  maxBytes: 2048\n").unwrap();

        let config =
            AppConfig::load_from(Some(temp.path().to_path_buf()), Some(path.clone())).unwrap();
        assert_eq!(config.workspace, temp.path());
        assert_eq!(config.config_file, Some(path));
        assert_eq!(config.upload.max_bytes, 2048);
    }

    #[test]
    fn test_load_from_missing_workspace() {
        let result = AppConfig::load_from(Some(PathBuf::from("/no/such/easydocs/workspace")), None);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_local_stack() {
        assert!(local_config().validate().is_ok());
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = local_config();
        config.search.provider = "elastic".to_string();
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_azure_requires_endpoint() {
        let config = AppConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_overlap_not_smaller_than_size() {
        let mut config = local_config();
        config.chunking.size = 100;
        config.chunking.overlap = 100;
        assert!(config.validate().is_err());
    }
}
