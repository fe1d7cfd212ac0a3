// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::ops::AddAssign;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::settings::LlmSettings;
use crate::utils::retry_policy::RetryPolicy;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, other: Self) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(other.prompt_tokens);
        self.completion_tokens = self.completion_tokens.saturating_add(other.completion_tokens);
        self.total_tokens = self.total_tokens.saturating_add(other.total_tokens);
    }
}

impl TokenUsage {
    /// 解析接口返回的 `usage` 字段，超出 `u32` 的值饱和为 `u32::MAX`
    pub fn from_response(usage_val: &Value) -> Self {
        let count = |key: &str| {
            usage_val[key]
                .as_u64()
                .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
                .unwrap_or(0)
        };
        Self {
            prompt_tokens: count("prompt_tokens"),
            completion_tokens: count("completion_tokens"),
            total_tokens: count("total_tokens"),
        }
    }
}

/// LLM错误类型
#[derive(Error, Debug)]
pub enum LLMError {
    #[error("OPENAI_API_KEY environment variable is required. Please set it in your environment or Apify actor settings.")]
    MissingApiKey,

    #[error("Failed to send request to LLM API: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("LLM API returned error: {status} - {body}")]
    Status { status: StatusCode, body: String },

    #[error("Invalid response format from LLM API: {0}")]
    InvalidResponse(String),

    #[error("Empty response from LLM")]
    EmptyResponse,
}

impl LLMError {
    /// 判断错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            LLMError::Transport(e) => e.is_timeout() || e.is_connect(),
            LLMError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }
}

#[async_trait]
pub trait LLMServiceTrait: Send + Sync {
    /// 发送一轮对话并返回模型回复的原始文本
    async fn complete_json(
        &self,
        system: &str,
        prompt: &str,
        model: &str,
    ) -> Result<(String, TokenUsage), LLMError>;
}

/// LLM服务 - 处理与OpenAI兼容接口的交互
///
/// 请求固定使用 `response_format = json_object`，对超时、连接失败、
/// 429 和 5xx 按 [`RetryPolicy`] 退避重试。
pub struct LLMService {
    client: reqwest::Client,
    api_key: Option<String>,
    api_base_url: String,
    temperature: f32,
    max_tokens: u32,
    retry_policy: RetryPolicy,
}

impl LLMService {
    pub fn new(settings: &LlmSettings, retry_policy: RetryPolicy) -> Result<Self, LLMError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()?;

        Ok(Self {
            client,
            api_key: settings.api_key.clone(),
            api_base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            retry_policy,
        })
    }

    pub fn new_with_config(api_key: String, api_base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: Some(api_key),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            temperature: 0.3,
            max_tokens: 1000,
            retry_policy: RetryPolicy::none(),
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    async fn send_once(
        &self,
        api_key: &str,
        request_body: &Value,
    ) -> Result<(String, TokenUsage), LLMError> {
        let url = format!("{}/chat/completions", self.api_base_url);
        let started = Instant::now();
        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(request_body)
            .send()
            .await?;
        metrics::histogram!("llm_request_duration_seconds").record(started.elapsed().as_secs_f64());

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LLMError::Status { status, body });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| LLMError::InvalidResponse(e.to_string()))?;

        let usage = body
            .get("usage")
            .map(TokenUsage::from_response)
            .unwrap_or_default();

        let message = body
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .ok_or_else(|| LLMError::InvalidResponse("missing choices[0].message".to_string()))?;

        match message.get("content").and_then(Value::as_str) {
            Some(content) if !content.trim().is_empty() => Ok((content.to_string(), usage)),
            _ => Err(LLMError::EmptyResponse),
        }
    }
}

#[async_trait]
impl LLMServiceTrait for LLMService {
    async fn complete_json(
        &self,
        system: &str,
        prompt: &str,
        model: &str,
    ) -> Result<(String, TokenUsage), LLMError> {
        let api_key = self.api_key.as_deref().ok_or(LLMError::MissingApiKey)?;

        let request_body = json!({
            "model": model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt }
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "response_format": { "type": "json_object" }
        });

        let mut attempt = 0;
        loop {
            match self.send_once(api_key, &request_body).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && self.retry_policy.should_retry(attempt) => {
                    attempt += 1;
                    let backoff: Duration = self.retry_policy.calculate_backoff(attempt);
                    warn!(
                        error = %e,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "LLM request failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    debug!(error = %e, attempt, "LLM request failed");
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "llm_service_test.rs"]
mod llm_service_test;
