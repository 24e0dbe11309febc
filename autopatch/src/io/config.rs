//! Agent configuration: an optional `.autopatch.toml` settings file merged with
//! CLI/environment values into one [`AgentConfig`] built at process start.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PreconditionError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const SETTINGS_FILE: &str = ".autopatch.toml";
pub const PATCH_OUTPUT_FILE: &str = "autofix-output.json";
pub const REVIEW_OUTPUT_FILE: &str = "review-output.json";

/// Tunables read from the settings file (TOML).
///
/// Missing fields default to the values below, so an absent file is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AgentSettings {
    /// Model identifier used when neither `--model` nor `LLM_MODEL` is set.
    pub model: String,

    /// Upper bound on generated tokens per completion.
    pub max_tokens: u32,

    /// Wall-clock limit for one completion request.
    pub request_timeout_secs: u64,

    pub limits: Limits,
    pub retry: RetrySettings,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Limits {
    /// Maximum repository paths listed in the issue prompt.
    pub max_files: usize,
    /// Maximum diff characters embedded in the review prompt.
    pub max_diff_chars: usize,
    /// Maximum change items applied from one completion.
    pub max_changes: usize,
    /// Maximum content size of a single change item.
    pub max_file_bytes: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts for transient transport failures (1 disables retry).
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_files: 300,
            max_diff_chars: 60_000,
            max_changes: 50,
            max_file_bytes: 1024 * 1024,
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 4096,
            request_timeout_secs: 120,
            limits: Limits::default(),
            retry: RetrySettings::default(),
        }
    }
}

impl AgentSettings {
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(anyhow!("model must be non-empty"));
        }
        if self.max_tokens == 0 {
            return Err(anyhow!("max_tokens must be > 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("request_timeout_secs must be > 0"));
        }
        if self.limits.max_files == 0 {
            return Err(anyhow!("limits.max_files must be > 0"));
        }
        if self.limits.max_diff_chars == 0 {
            return Err(anyhow!("limits.max_diff_chars must be > 0"));
        }
        if self.limits.max_changes == 0 {
            return Err(anyhow!("limits.max_changes must be > 0"));
        }
        if self.limits.max_file_bytes == 0 {
            return Err(anyhow!("limits.max_file_bytes must be > 0"));
        }
        if self.retry.max_attempts == 0 {
            return Err(anyhow!("retry.max_attempts must be >= 1"));
        }
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(anyhow!("retry.max_delay_ms must be >= retry.base_delay_ms"));
        }
        Ok(())
    }
}

/// Load settings from a TOML file.
///
/// If the file is missing, returns `AgentSettings::default()`.
pub fn load_settings(path: &Path) -> Result<AgentSettings> {
    if !path.exists() {
        debug!(path = %path.display(), "settings file missing, using defaults");
        let settings = AgentSettings::default();
        settings.validate()?;
        return Ok(settings);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let settings: AgentSettings =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    settings.validate()?;
    Ok(settings)
}

/// Values supplied on the command line or through the environment.
///
/// Blank strings count as unset; CI runners export empty values for missing secrets.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub repo_root: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub settings_path: Option<PathBuf>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub api_version: Option<String>,
    pub model: Option<String>,
}

/// Connection parameters for the completion endpoint.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub api_version: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl LlmConfig {
    /// The API key, or a precondition failure when none was configured.
    pub fn require_api_key(&self) -> Result<&str, PreconditionError> {
        self.api_key
            .as_deref()
            .ok_or(PreconditionError::MissingApiKey)
    }
}

/// Fully resolved configuration passed down to every pipeline stage.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Canonical repository root.
    pub repo_root: PathBuf,
    /// Directory receiving the outcome record.
    pub output_dir: PathBuf,
    pub llm: LlmConfig,
    pub limits: Limits,
    pub retry: RetrySettings,
}

impl AgentConfig {
    /// Merge overrides with the settings file found at `settings_path`
    /// (default `<repo_root>/.autopatch.toml`).
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        let requested_root = match overrides.repo_root {
            Some(root) => root,
            None => std::env::current_dir().context("resolve current directory")?,
        };
        let repo_root = requested_root
            .canonicalize()
            .ok()
            .filter(|root| root.is_dir())
            .ok_or_else(|| PreconditionError::RepoRoot(requested_root.clone()))?;

        let settings_path = overrides
            .settings_path
            .unwrap_or_else(|| repo_root.join(SETTINGS_FILE));
        let settings = load_settings(&settings_path)
            .map_err(|err| PreconditionError::InvalidSettings(format!("{err:#}")))?;

        Ok(Self::from_parts(
            repo_root,
            overrides.output_dir.unwrap_or_else(std::env::temp_dir),
            settings,
            LlmOverrides {
                api_key: non_blank(overrides.api_key),
                base_url: non_blank(overrides.base_url),
                api_version: non_blank(overrides.api_version),
                model: non_blank(overrides.model),
            },
        ))
    }

    /// Build a configuration from explicit values, without touching the environment.
    pub fn from_parts(
        repo_root: PathBuf,
        output_dir: PathBuf,
        settings: AgentSettings,
        llm: LlmOverrides,
    ) -> Self {
        Self {
            repo_root,
            output_dir,
            llm: LlmConfig {
                api_key: llm.api_key,
                base_url: llm.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                api_version: llm.api_version,
                model: llm.model.unwrap_or(settings.model),
                max_tokens: settings.max_tokens,
                timeout: Duration::from_secs(settings.request_timeout_secs),
            },
            limits: settings.limits,
            retry: settings.retry,
        }
    }

    pub fn patch_output_path(&self) -> PathBuf {
        self.output_dir.join(PATCH_OUTPUT_FILE)
    }

    pub fn review_output_path(&self) -> PathBuf {
        self.output_dir.join(REVIEW_OUTPUT_FILE)
    }
}

/// Endpoint values that override the settings file.
#[derive(Debug, Clone, Default)]
pub struct LlmOverrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub api_version: Option<String>,
    pub model: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
