//! Layered configuration: defaults → `.cerberus/settings.toml` → environment.
//!
//! Two environment layers apply, in order, so both contracts in spec.md hold:
//! - spec.md §6's literal, unprefixed names (`MAX_FILE_BYTES`, `WARN_THRESHOLD`, ...)
//! - a richer nested `CERBERUS_<SECTION>__<FIELD>` override for everything else,
//!   matching the teacher's own `CI_`-prefixed convention.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Project root. Defaults to the current directory at load time.
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,

    /// Path to the SQLite index file, relative to `workspace_root` unless absolute.
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    #[serde(default)]
    pub indexing: IndexingConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub watcher: WatcherConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexingConfig {
    #[serde(default = "default_parallel_threads")]
    pub parallel_threads: usize,

    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            parallel_threads: default_parallel_threads(),
            ignore_patterns: vec!["target/**".into(), ".git/**".into(), "__pycache__/**".into()],
            extensions: default_extensions(),
        }
    }
}

/// C1 — process-wide limits, env-overridable per spec.md §4.1 and §6.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    #[serde(default = "default_max_symbols_per_file")]
    pub max_symbols_per_file: usize,
    #[serde(default = "default_max_total_symbols")]
    pub max_total_symbols: usize,
    #[serde(default = "default_max_index_size_mb")]
    pub max_index_size_mb: u64,
    #[serde(default = "default_max_vectors")]
    pub max_vectors: usize,
    #[serde(default = "default_min_free_disk_mb")]
    pub min_free_disk_mb: u64,
    #[serde(default = "default_warn_threshold")]
    pub warn_threshold: f64,
    #[serde(default)]
    pub strict_mode: bool,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            max_symbols_per_file: default_max_symbols_per_file(),
            max_total_symbols: default_max_total_symbols(),
            max_index_size_mb: default_max_index_size_mb(),
            max_vectors: default_max_vectors(),
            min_free_disk_mb: default_min_free_disk_mb(),
            warn_threshold: default_warn_threshold(),
            strict_mode: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatcherConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_max_log_bytes")]
    pub max_log_bytes: u64,
    #[serde(default = "default_max_cpu_percent")]
    pub max_cpu_percent: f32,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            max_log_bytes: default_max_log_bytes(),
            max_cpu_percent: default_max_cpu_percent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_rrf_k")]
    pub rrf_k: f64,
    #[serde(default = "default_weight")]
    pub weight_keyword: f64,
    #[serde(default = "default_weight")]
    pub weight_semantic: f64,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            rrf_k: default_rrf_k(),
            weight_keyword: default_weight(),
            weight_semantic: default_weight(),
            embedding_model: default_embedding_model(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub default: String,
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

fn default_version() -> u32 {
    1
}
fn default_index_path() -> PathBuf {
    PathBuf::from("cerberus.db")
}
fn default_parallel_threads() -> usize {
    num_cpus::get()
}
fn default_extensions() -> Vec<String> {
    vec!["rs".into(), "py".into(), "pyi".into()]
}
fn default_max_file_bytes() -> u64 {
    1_000_000
}
fn default_max_symbols_per_file() -> usize {
    2_000
}
fn default_max_total_symbols() -> usize {
    100_000
}
fn default_max_index_size_mb() -> u64 {
    2_048
}
fn default_max_vectors() -> usize {
    100_000
}
fn default_min_free_disk_mb() -> u64 {
    256
}
fn default_warn_threshold() -> f64 {
    0.8
}
fn default_debounce_ms() -> u64 {
    3_000
}
fn default_max_log_bytes() -> u64 {
    50_000_000
}
fn default_max_cpu_percent() -> f32 {
    80.0
}
fn default_rrf_k() -> f64 {
    60.0
}
fn default_weight() -> f64 {
    0.5
}
fn default_embedding_model() -> String {
    "bge-small-en".into()
}
fn default_log_level() -> String {
    "warn".into()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            index_path: default_index_path(),
            indexing: IndexingConfig::default(),
            limits: LimitsConfig::default(),
            watcher: WatcherConfig::default(),
            logging: LoggingConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources: defaults, `.cerberus/settings.toml`
    /// found by walking up from the current directory, spec.md §6's literal
    /// environment variable names, and the richer `CERBERUS_` nested form.
    pub fn load() -> Result<Self, figment::Error> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(".cerberus/settings.toml"));

        let mut figment = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(&config_path));

        figment = apply_spec_env_vars(figment);

        figment = figment.merge(
            Env::prefixed("CERBERUS_").map(|key| key.as_str().to_lowercase().replace("__", ".").into()),
        );

        let mut settings: Settings = figment.extract()?;
        if settings.workspace_root.is_none() {
            settings.workspace_root = Self::workspace_root().or_else(|| std::env::current_dir().ok());
        }
        if let Ok(p) = std::env::var("INDEX_PATH") {
            settings.index_path = PathBuf::from(p);
        }
        Ok(settings)
    }

    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, figment::Error> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path));
        apply_spec_env_vars(figment).extract()
    }

    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        for ancestor in current.ancestors() {
            let dir = ancestor.join(".cerberus");
            if dir.is_dir() {
                return Some(dir.join("settings.toml"));
            }
        }
        None
    }

    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        for ancestor in current.ancestors() {
            if ancestor.join(".cerberus").is_dir() || ancestor.join(".git").is_dir() {
                return Some(ancestor.to_path_buf());
            }
        }
        None
    }

    pub fn resolved_index_path(&self) -> PathBuf {
        if self.index_path.is_absolute() {
            return self.index_path.clone();
        }
        let root = self
            .workspace_root
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        root.join(".cerberus").join(&self.index_path)
    }

    pub fn state_dir(&self) -> PathBuf {
        let root = self
            .workspace_root
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        root.join(".cerberus")
    }

    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Maps spec.md §6's literal (unprefixed) environment variable names onto
/// the nested config keys they control.
fn apply_spec_env_vars(figment: Figment) -> Figment {
    let mut figment = figment;
    let direct: &[(&str, &str)] = &[
        ("MAX_FILE_BYTES", "limits.max_file_bytes"),
        ("MAX_SYMBOLS_PER_FILE", "limits.max_symbols_per_file"),
        ("MAX_TOTAL_SYMBOLS", "limits.max_total_symbols"),
        ("MAX_INDEX_SIZE_MB", "limits.max_index_size_mb"),
        ("MAX_VECTORS", "limits.max_vectors"),
        ("MIN_FREE_DISK_MB", "limits.min_free_disk_mb"),
        ("WARN_THRESHOLD", "limits.warn_threshold"),
        ("LIMITS_STRICT", "limits.strict_mode"),
    ];
    // figment's `Env` provider maps flat names onto flat keys; these spec
    // names are flat but must land on nested `limits.*` keys, so each one is
    // folded in as its own single-key JSON provider instead.
    for (env_key, config_key) in direct {
        if let Ok(value) = std::env::var(env_key) {
            figment = figment.merge(figment::providers::Serialized::from(
                one_key(config_key, &value),
                figment::Profile::Default,
            ));
        }
    }
    figment
}

fn one_key(dotted: &str, value: &str) -> serde_json::Value {
    let parsed: serde_json::Value = value
        .parse::<f64>()
        .map(|n| serde_json::json!(n))
        .unwrap_or_else(|_| match value {
            "true" => serde_json::json!(true),
            "false" => serde_json::json!(false),
            other => serde_json::json!(other),
        });
    let mut parts: Vec<&str> = dotted.split('.').collect();
    let leaf = parts.pop().unwrap();
    let mut node = serde_json::json!({ leaf: parsed });
    for part in parts.into_iter().rev() {
        node = serde_json::json!({ part: node });
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let s = Settings::default();
        assert_eq!(s.limits.max_total_symbols, 100_000);
        assert_eq!(s.limits.warn_threshold, 0.8);
        assert!(!s.limits.strict_mode);
    }

    #[test]
    fn load_from_toml_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            r#"
[limits]
max_total_symbols = 5000
strict_mode = true
"#,
        )
        .unwrap();
        let s = Settings::load_from(&path).unwrap();
        assert_eq!(s.limits.max_total_symbols, 5000);
        assert!(s.limits.strict_mode);
        // untouched defaults survive
        assert_eq!(s.limits.warn_threshold, 0.8);
    }
}
