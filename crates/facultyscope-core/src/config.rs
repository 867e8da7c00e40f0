use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Root application configuration, loaded from `~/.config/facultyscope/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub openalex: OpenAlexConfig,
    pub directory: DirectoryConfig,
    pub resolver: ResolverConfig,
    pub aggregator: AggregatorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub faculty_csv: String,
    pub cache_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAlexConfig {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mailto: Option<String>,
    pub min_interval_ms: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub publications_page: String,
    pub journal_container_id: String,
    pub excluded_interest: String,
}

/// Knobs for the author-resolution ladder.
///
/// `name_match_threshold` is unset by default: the best-scoring authorship is
/// accepted whatever its score. Setting it (0-100) rejects weaker matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub institution_id: String,
    pub concept_id: String,
    pub concept_name: String,
    pub concept_min_score: f64,
    pub min_title_words: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_match_threshold: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    pub page_size: u32,
    pub collaborator_window: usize,
    pub tag_min_score: f64,
    pub tag_min_level: u32,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for StoreConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("facultyscope");

        Self {
            faculty_csv: data_dir.join("faculty.csv").to_string_lossy().to_string(),
            cache_path: data_dir
                .join("identities.db")
                .to_string_lossy()
                .to_string(),
        }
    }
}

impl Default for OpenAlexConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openalex.org".to_string(),
            mailto: None,
            min_interval_ms: 100,
            timeout_secs: 30,
            user_agent: "facultyscope/0.1".to_string(),
        }
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            publications_page: "selectedPublications.html".to_string(),
            journal_container_id: "facultyjournalDiv".to_string(),
            excluded_interest: "Computer Science and Engineering".to_string(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            institution_id: "I172675005".to_string(),
            concept_id: "C41008148".to_string(),
            concept_name: "Computer science".to_string(),
            concept_min_score: 70.0,
            min_title_words: 3,
            name_match_threshold: None,
        }
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            page_size: 200,
            collaborator_window: 50,
            tag_min_score: 50.0,
            tag_min_level: 1,
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/facultyscope/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("FACULTYSCOPE_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("facultyscope")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to the standard path.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn faculty_csv_path(&self) -> PathBuf {
        PathBuf::from(&self.store.faculty_csv)
    }

    pub fn cache_path(&self) -> PathBuf {
        PathBuf::from(&self.store.cache_path)
    }
}
