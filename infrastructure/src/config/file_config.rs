//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file and
//! convert into the application-layer parameter structs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use switchboard_application::{BreakerConfig, PipelineParams};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Remote model endpoint settings
    pub model: FileModelConfig,
    /// Admission caps
    pub limits: FileLimitsConfig,
    /// Classification settings
    pub classifier: FileClassifierConfig,
    /// Circuit breaker tuning
    pub breaker: FileBreakerConfig,
    /// Orchestration budgets
    pub orchestrator: FileOrchestratorConfig,
    /// Local and remote tool settings
    pub tools: FileToolsConfig,
    /// Conversation history settings
    pub conversation: FileConversationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelConfig {
    /// Base URL of the OpenAI-compatible completion endpoint.
    pub endpoint: String,
    /// Model name sent with every completion request.
    pub name: String,
    /// Whole-request HTTP timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for FileModelConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434/v1".to_string(),
            name: "qwen2.5:7b".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLimitsConfig {
    pub global_capacity: usize,
    pub per_caller_capacity: usize,
}

impl Default for FileLimitsConfig {
    fn default() -> Self {
        Self {
            global_capacity: 50,
            per_caller_capacity: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileClassifierConfig {
    pub timeout_ms: u64,
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
    pub max_words: usize,
}

impl Default for FileClassifierConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 2_000,
            cache_ttl_secs: 300,
            cache_capacity: 1024,
            max_words: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBreakerConfig {
    pub window_size: usize,
    pub min_samples: usize,
    pub failure_rate_threshold: f64,
    pub cooldown_secs: u64,
    pub probe_timeout_secs: u64,
}

impl Default for FileBreakerConfig {
    fn default() -> Self {
        Self {
            window_size: 16,
            min_samples: 5,
            failure_rate_threshold: 0.5,
            cooldown_secs: 30,
            probe_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOrchestratorConfig {
    pub max_iterations: usize,
    pub budget_secs: u64,
    pub planning_timeout_secs: u64,
    pub context_turns: usize,
}

impl Default for FileOrchestratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            budget_secs: 30,
            planning_timeout_secs: 10,
            context_turns: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileToolsConfig {
    /// Working directory for file and command tools (None = process cwd).
    pub working_dir: Option<String>,
    pub command_timeout_secs: u64,
    /// Remote tool families: name → forwarding endpoint.
    pub remote: HashMap<String, String>,
}

impl Default for FileToolsConfig {
    fn default() -> Self {
        Self {
            working_dir: None,
            command_timeout_secs: 10,
            remote: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConversationConfig {
    /// JSONL history file; in-memory only when unset.
    pub history_path: Option<String>,
    /// Turns retained per caller.
    pub max_turns: usize,
}

impl Default for FileConversationConfig {
    fn default() -> Self {
        Self {
            history_path: None,
            max_turns: 50,
        }
    }
}

impl FileConfig {
    /// Application-layer pipeline parameters from this file config.
    pub fn pipeline_params(&self) -> PipelineParams {
        PipelineParams {
            global_capacity: self.limits.global_capacity,
            per_caller_capacity: self.limits.per_caller_capacity,
            classify_timeout: Duration::from_millis(self.classifier.timeout_ms),
            classify_max_words: self.classifier.max_words,
            cache_ttl: Duration::from_secs(self.classifier.cache_ttl_secs),
            cache_capacity: self.classifier.cache_capacity,
            max_iterations: self.orchestrator.max_iterations,
            orchestration_budget: Duration::from_secs(self.orchestrator.budget_secs),
            planning_timeout: Duration::from_secs(self.orchestrator.planning_timeout_secs),
            context_turns: self.orchestrator.context_turns,
        }
    }

    /// Breaker tuning shared by every breaker instance.
    pub fn breaker_config(&self) -> BreakerConfig {
        BreakerConfig {
            window_size: self.breaker.window_size,
            min_samples: self.breaker.min_samples,
            failure_rate_threshold: self.breaker.failure_rate_threshold,
            cooldown: Duration::from_secs(self.breaker.cooldown_secs),
            probe_timeout: Duration::from_secs(self.breaker.probe_timeout_secs),
        }
    }
}
