// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::utils::retry_policy::RetryPolicy;

/// 未在输入中指定模型时使用的默认模型
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// 应用程序配置设置
///
/// 包含LLM、Actor存储和重试策略等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// LLM配置
    pub llm: LlmSettings,
    /// 存储配置
    pub storage: StorageSettings,
    /// 重试配置
    pub retry: RetrySettings,
}

/// LLM配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    /// API密钥（来自 `OPENAI_API_KEY`）
    pub api_key: Option<String>,
    /// 默认模型名称
    pub model: String,
    /// API基础URL
    pub api_base_url: String,
    /// 采样温度
    pub temperature: f32,
    /// 单次回复的最大令牌数
    pub max_tokens: u32,
    /// 单次请求超时时间（秒）
    pub timeout_secs: u64,
}

impl LlmSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 存储配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// 存储类型 (local, platform)
    pub storage_type: String,
    /// 本地存储根目录 (当 type=local 时使用)
    pub local_path: String,
    /// 输入记录的键
    pub input_key: String,
    /// 默认键值存储ID
    pub key_value_store_id: String,
    /// 默认数据集ID
    pub dataset_id: String,
    /// 平台API基础URL (当 type=platform 时使用)
    pub api_base_url: String,
    /// 平台API令牌
    pub token: Option<String>,
}

/// 重试配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    /// 最大重试次数
    pub max_retries: u32,
    /// 初始退避时间（毫秒）
    pub initial_backoff_ms: u64,
    /// 最大退避时间（毫秒）
    pub max_backoff_ms: u64,
}

impl RetrySettings {
    /// 转换为重试策略
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            ..RetryPolicy::default()
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_flag(name: &str) -> bool {
    matches!(
        env_var(name).as_deref().map(str::to_ascii_lowercase).as_deref(),
        Some("1") | Some("true")
    )
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从 `config/` 目录和环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_config_dir("config")
    }

    /// 从指定目录加载配置
    ///
    /// 优先级从低到高：内置默认值、`{dir}/default`、`{dir}/{APP_ENVIRONMENT}`、
    /// `LEAD_FILTER__*` 环境变量、Actor 约定的环境变量
    pub fn with_config_dir(dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let at_home = env_flag("APIFY_IS_AT_HOME");

        let builder = Config::builder()
            // Default LLM settings
            .set_default("llm.model", DEFAULT_MODEL)?
            .set_default("llm.api_base_url", "https://api.openai.com/v1")?
            .set_default("llm.temperature", 0.3)?
            .set_default("llm.max_tokens", 1000)?
            .set_default("llm.timeout_secs", 60)?
            // Default Storage settings
            .set_default("storage.storage_type", "local")?
            .set_default("storage.local_path", "./storage")?
            .set_default("storage.input_key", "INPUT")?
            .set_default("storage.key_value_store_id", "default")?
            .set_default("storage.dataset_id", "default")?
            .set_default("storage.api_base_url", "https://api.apify.com")?
            // Default Retry settings
            .set_default("retry.max_retries", 3)?
            .set_default("retry.initial_backoff_ms", 1000)?
            .set_default("retry.max_backoff_ms", 30_000)?
            .add_source(File::with_name(&format!("{}/default", dir)).required(false))
            .add_source(File::with_name(&format!("{}/{}", dir, env)).required(false))
            .add_source(Environment::with_prefix("LEAD_FILTER").separator("__"))
            // Conventional actor environment
            .set_override_option("llm.api_key", env_var("OPENAI_API_KEY"))?
            .set_override_option("llm.api_base_url", env_var("OPENAI_BASE_URL"))?
            .set_override_option("storage.local_path", env_var("APIFY_LOCAL_STORAGE_DIR"))?
            .set_override_option("storage.input_key", env_var("APIFY_INPUT_KEY"))?
            .set_override_option(
                "storage.key_value_store_id",
                env_var("APIFY_DEFAULT_KEY_VALUE_STORE_ID"),
            )?
            .set_override_option("storage.dataset_id", env_var("APIFY_DEFAULT_DATASET_ID"))?
            .set_override_option("storage.api_base_url", env_var("APIFY_API_BASE_URL"))?
            .set_override_option("storage.token", env_var("APIFY_TOKEN"))?
            .set_override_option("storage.storage_type", at_home.then_some("platform"))?;

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod settings_test;
