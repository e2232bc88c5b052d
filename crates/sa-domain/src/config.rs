//! Top-level configuration, deserialized from TOML.
//!
//! Field-by-field `#[serde(default = "...")]` helpers mirror the teacher's
//! `sa_domain::config` idiom: every field has an explicit, named default
//! rather than relying on `#[derive(Default)]` alone, so a partially
//! specified TOML document still produces a fully-formed `Config`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            policy: PolicyConfig::default(),
            agent: AgentConfig::default(),
            sessions: SessionsConfig::default(),
            memory: MemoryConfig::default(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Server
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "d_port")]
    pub port: u16,
    #[serde(default = "d_host")]
    pub host: String,
    #[serde(default)]
    pub cors: CorsConfig,
    /// Max inbound request body size, in bytes. Section 6: 1 MiB default.
    #[serde(default = "d_max_body")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: d_port(),
            host: d_host(),
            cors: CorsConfig::default(),
            max_body_bytes: d_max_body(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "d_cors_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { allowed_origins: d_cors_origins() }
    }
}

fn d_port() -> u16 {
    8080
}
fn d_host() -> String {
    "127.0.0.1".into()
}
fn d_max_body() -> usize {
    1024 * 1024
}
fn d_cors_origins() -> Vec<String> {
    vec!["http://localhost:*".into(), "http://127.0.0.1:*".into()]
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Gateway policy — Section 4.9 allowlist + require_mention gates
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PolicyConfig {
    /// Empty means "allow everyone".
    #[serde(default)]
    pub allow_users: Vec<String>,
    /// In thread contexts, require the text to contain one of these
    /// substrings (e.g. an `@mention`) before the agent responds.
    #[serde(default)]
    pub require_mention: Vec<String>,
}

impl PolicyConfig {
    pub fn allows_user(&self, user_id: &str) -> bool {
        self.allow_users.is_empty() || self.allow_users.iter().any(|u| u == user_id)
    }

    pub fn mention_satisfied(&self, is_thread: bool, text: &str) -> bool {
        if !is_thread || self.require_mention.is_empty() {
            return true;
        }
        self.require_mention.iter().any(|pat| text.contains(pat.as_str()))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Agent loop — Section 4.7
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "d_max_tool_iterations")]
    pub max_tool_iterations: usize,
    /// Section 9, Ambiguity (a): serial by default; this is the opt-in flag.
    #[serde(default)]
    pub parallel_tools: bool,
    #[serde(default = "d_channel_buffer")]
    pub event_channel_buffer: usize,
    #[serde(default)]
    pub max_history_runs: Option<usize>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_iterations: d_max_tool_iterations(),
            parallel_tools: false,
            event_channel_buffer: d_channel_buffer(),
            max_history_runs: None,
        }
    }
}

fn d_max_tool_iterations() -> usize {
    8
}
fn d_channel_buffer() -> usize {
    128
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Sessions — summarizer trigger thresholds (Section 4.5)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TriggerPolicy {
    #[default]
    Any,
    All,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    #[serde(default)]
    pub summarizer: SummarizerConfig,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self { summarizer: SummarizerConfig::default() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub event_count_threshold: Option<usize>,
    #[serde(default)]
    pub token_count_threshold: Option<u32>,
    #[serde(default)]
    pub idle_minutes_threshold: Option<u32>,
    #[serde(default)]
    pub policy: TriggerPolicy,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            event_count_threshold: Some(40),
            token_count_threshold: None,
            idle_minutes_threshold: None,
            policy: TriggerPolicy::Any,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Memory — extractor pool sizing + trigger thresholds (Section 4.6)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default = "d_search_limit")]
    pub default_search_limit: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            extractor: ExtractorConfig::default(),
            default_search_limit: d_search_limit(),
        }
    }
}

fn d_search_limit() -> usize {
    100
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "d_async_workers")]
    pub async_workers: usize,
    #[serde(default = "d_queue_size")]
    pub queue_size: usize,
    #[serde(default = "d_job_timeout_ms")]
    pub job_timeout_ms: u64,
    #[serde(default)]
    pub message_count_threshold: Option<usize>,
    #[serde(default)]
    pub interval_seconds_threshold: Option<u64>,
    #[serde(default)]
    pub policy: TriggerPolicy,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            async_workers: d_async_workers(),
            queue_size: d_queue_size(),
            job_timeout_ms: d_job_timeout_ms(),
            message_count_threshold: Some(1),
            interval_seconds_threshold: None,
            policy: TriggerPolicy::Any,
        }
    }
}

fn d_async_workers() -> usize {
    2
}
fn d_queue_size() -> usize {
    256
}
fn d_job_timeout_ms() -> u64 {
    10_000
}
