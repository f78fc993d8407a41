//! TOML configuration parsing and validation.
//!
//! ```toml
//! [corpus]
//! path = "./data/corpus"          # a JSON file or a directory of JSON files
//!
//! [retrieval]
//! final_k = 5
//! advisor_lambda = 0.7
//!
//! [embedding]
//! provider = "openai"             # disabled | openai | ollama
//! model = "text-embedding-3-small"
//! dims = 1536
//! ```
//!
//! Relative `corpus.path` values are resolved against the directory that
//! contains the config file.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use warcouncil_core::context::DEFAULT_MAX_EXCERPT_CHARS;
use warcouncil_core::engine::RetrievalParams;
use warcouncil_core::hybrid::BoostLimits;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    pub path: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.json".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_candidate_k")]
    pub semantic_k: usize,
    #[serde(default = "default_candidate_k")]
    pub keyword_k: usize,
    #[serde(default = "default_final_k")]
    pub final_k: usize,
    #[serde(default = "default_advisor_lambda")]
    pub advisor_lambda: f32,
    #[serde(default = "default_simulator_lambda")]
    pub simulator_lambda: f32,
    #[serde(default = "default_min_tier_pool")]
    pub min_tier_pool: usize,
    #[serde(default = "default_upgrade_boost_k")]
    pub upgrade_boost_k: usize,
    #[serde(default = "default_attack_boost_k")]
    pub attack_boost_k: usize,
    #[serde(default = "default_entity_k")]
    pub entity_k: usize,
    #[serde(default = "default_true")]
    pub degrade_to_keyword: bool,
    #[serde(default = "default_max_excerpt_chars")]
    pub max_excerpt_chars: usize,
}

fn default_candidate_k() -> usize {
    7
}
fn default_final_k() -> usize {
    5
}
fn default_advisor_lambda() -> f32 {
    0.7
}
fn default_simulator_lambda() -> f32 {
    0.5
}
fn default_min_tier_pool() -> usize {
    5
}
fn default_upgrade_boost_k() -> usize {
    3
}
fn default_attack_boost_k() -> usize {
    2
}
fn default_entity_k() -> usize {
    3
}
fn default_true() -> bool {
    true
}
fn default_max_excerpt_chars() -> usize {
    DEFAULT_MAX_EXCERPT_CHARS
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            semantic_k: default_candidate_k(),
            keyword_k: default_candidate_k(),
            final_k: default_final_k(),
            advisor_lambda: default_advisor_lambda(),
            simulator_lambda: default_simulator_lambda(),
            min_tier_pool: default_min_tier_pool(),
            upgrade_boost_k: default_upgrade_boost_k(),
            attack_boost_k: default_attack_boost_k(),
            entity_k: default_entity_k(),
            degrade_to_keyword: true,
            max_excerpt_chars: default_max_excerpt_chars(),
        }
    }
}

impl RetrievalConfig {
    pub fn to_params(&self) -> RetrievalParams {
        RetrievalParams {
            semantic_k: self.semantic_k,
            keyword_k: self.keyword_k,
            final_k: self.final_k,
            advisor_lambda: self.advisor_lambda,
            simulator_lambda: self.simulator_lambda,
            min_tier_pool: self.min_tier_pool,
            boosts: BoostLimits {
                upgrade_k: self.upgrade_boost_k,
                attack_k: self.attack_boost_k,
            },
            entity_k: self.entity_k,
            degrade_to_keyword: self.degrade_to_keyword,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL for the Ollama provider.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            dims: None,
            url: None,
            max_retries: 3,
            timeout_secs: 30,
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_max_retries() -> u32 {
    3
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Read, parse and validate the config file at `path`.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config = parse_config(&content)?;

    if config.corpus.path.is_relative() {
        if let Some(dir) = path.parent() {
            config.corpus.path = dir.join(&config.corpus.path);
        }
    }

    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let r = &config.retrieval;

    if r.final_k < 1 {
        bail!("retrieval.final_k must be >= 1");
    }
    if r.entity_k < 1 {
        bail!("retrieval.entity_k must be >= 1");
    }
    if r.semantic_k + r.keyword_k == 0 {
        bail!("retrieval.semantic_k + retrieval.keyword_k must be >= 1");
    }
    if !(0.0..=1.0).contains(&r.advisor_lambda) {
        bail!("retrieval.advisor_lambda must be in [0.0, 1.0]");
    }
    if !(0.0..=1.0).contains(&r.simulator_lambda) {
        bail!("retrieval.simulator_lambda must be in [0.0, 1.0]");
    }
    if r.max_excerpt_chars == 0 {
        bail!("retrieval.max_excerpt_chars must be > 0");
    }

    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "ollama" => {}
        other => bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, or ollama.",
            other
        ),
    }

    Ok(())
}
