use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

// Default values functions
fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_synthesis_model() -> String {
    "codestral".to_string()
}

fn default_answer_model() -> String {
    "mistral".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_neo4j_base_url() -> String {
    "http://localhost:7474".to_string()
}

fn default_neo4j_database() -> String {
    "neo4j".to_string()
}

fn default_neo4j_user() -> String {
    "neo4j".to_string()
}

fn default_chroma_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_chroma_collection() -> String {
    "codelore".to_string()
}

fn default_chunk_size() -> usize {
    500
}

fn default_chunk_overlap() -> usize {
    100
}

fn default_graph_batch_size() -> usize {
    200
}

fn default_vector_k() -> usize {
    7
}

fn default_refinement() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Code-specialized model used for Cypher synthesis and refinement
    #[serde(default = "default_synthesis_model")]
    pub synthesis_model: String,

    /// General model used for final answer composition
    #[serde(default = "default_answer_model")]
    pub answer_model: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            synthesis_model: default_synthesis_model(),
            answer_model: default_answer_model(),
            embedding_model: default_embedding_model(),
            timeout: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neo4jConfig {
    /// Base URL of the Neo4j HTTP connector (not the bolt port)
    #[serde(default = "default_neo4j_base_url")]
    pub base_url: String,

    #[serde(default = "default_neo4j_database")]
    pub database: String,

    #[serde(default = "default_neo4j_user")]
    pub user: String,

    pub password: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            base_url: default_neo4j_base_url(),
            database: default_neo4j_database(),
            user: default_neo4j_user(),
            password: None,
            timeout: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChromaConfig {
    #[serde(default = "default_chroma_base_url")]
    pub base_url: String,

    #[serde(default = "default_chroma_collection")]
    pub collection: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for ChromaConfig {
    fn default() -> Self {
        Self {
            base_url: default_chroma_base_url(),
            collection: default_chroma_collection(),
            timeout: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Cypher statements sent per transaction while loading the graph
    #[serde(default = "default_graph_batch_size")]
    pub graph_batch_size: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            graph_batch_size: default_graph_batch_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Documents requested from the vector index per question
    #[serde(default = "default_vector_k")]
    pub vector_k: usize,

    /// Whether low-relevance graph results trigger a second synthesis pass
    #[serde(default = "default_refinement")]
    pub refinement: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            vector_k: default_vector_k(),
            refinement: default_refinement(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub ollama: OllamaConfig,

    #[serde(default)]
    pub neo4j: Neo4jConfig,

    #[serde(default)]
    pub chroma: ChromaConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join("config.toml");

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            // Create default config if it doesn't exist
            let config = Config::default();
            let toml_content = toml::to_string_pretty(&config)?;
            fs::write(&config_path, toml_content)?;
            config
        };

        // Environment variables take precedence over config file values
        if let Ok(url) = std::env::var("OLLAMA_BASE_URL") {
            config.ollama.base_url = url;
        }
        if let Ok(url) = std::env::var("NEO4J_URL") {
            config.neo4j.base_url = url;
        }
        if let Ok(password) = std::env::var("NEO4J_PASSWORD") {
            config.neo4j.password = Some(password);
        }
        if let Ok(url) = std::env::var("CHROMA_BASE_URL") {
            config.chroma.base_url = url;
        }

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join("config.toml");

        let toml_content = toml::to_string_pretty(self)?;
        fs::write(config_path, toml_content)?;
        Ok(())
    }

    fn ensure_config_dir() -> Result<PathBuf> {
        let config_dir = std::env::current_dir()?.join(".codelore");
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }
        Ok(config_dir)
    }

    pub fn synthesis_model(&self) -> &str {
        &self.ollama.synthesis_model
    }

    pub fn answer_model(&self) -> &str {
        &self.ollama.answer_model
    }
}
