// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use crate::domain::models::evaluation::{LeadEvaluation, Level, W6H};
use crate::domain::models::lead::LeadInput;
use crate::domain::services::llm_service::{LLMError, LLMServiceTrait, TokenUsage};
use crate::domain::services::prompt::{build_evaluation_prompt, SYSTEM_PROMPT};

static JSON_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```json\s*").expect("valid regex"));
static FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```\s*").expect("valid regex"));
static JSON_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"));

const UNKNOWN: &str = "Unknown";
const NO_REASONS: &str = "No reasons provided";

/// 评估错误类型
#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error(transparent)]
    Llm(#[from] LLMError),

    #[error("Invalid JSON in LLM response: {0}")]
    InvalidJson(String),
}

/// 从模型回复中提取JSON对象
///
/// 去掉 markdown 代码块标记后，取第一个 `{` 到最后一个 `}` 之间的内容解析
pub fn extract_json_from_response(text: &str) -> Result<Map<String, Value>, EvaluationError> {
    let text = JSON_FENCE.replace_all(text, "");
    let text = FENCE.replace_all(&text, "");
    let text = text.trim();

    let candidate = JSON_OBJECT
        .find(text)
        .map(|m| m.as_str())
        .unwrap_or(text);

    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(EvaluationError::InvalidJson(format!(
            "expected a JSON object, got {}",
            json_type_name(&other)
        ))),
        Err(e) => Err(EvaluationError::InvalidJson(e.to_string())),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truncate_finite(f: f64) -> Option<i64> {
    f.is_finite().then(|| f.trunc() as i64)
}

/// 评分归一化：整数原样保留，小数和数字字符串向零截断，布尔值为 1/0，其余为 0；最后限制在 0-100
fn coerce_score(value: Option<&Value>) -> u8 {
    let raw = match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(truncate_finite))
            .unwrap_or(0),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(truncate_finite)
            .unwrap_or(0),
        Some(Value::Bool(b)) => i64::from(*b),
        _ => 0,
    };
    raw.clamp(0, 100) as u8
}

fn w6h_field(w6h: Option<&Map<String, Value>>, key: &str, default: &str) -> String {
    match w6h.and_then(|m| m.get(key)) {
        None | Some(Value::Null) => default.to_string(),
        Some(value) => as_text(value),
    }
}

fn coerce_reasons(value: Option<&Value>) -> Vec<String> {
    let reasons: Vec<String> = match value {
        Some(Value::Array(items)) => items.iter().filter(|r| is_truthy(r)).map(as_text).collect(),
        Some(other) if is_truthy(other) => vec![as_text(other)],
        _ => Vec::new(),
    };

    if reasons.is_empty() {
        vec![NO_REASONS.to_string()]
    } else {
        reasons
    }
}

/// 将模型回复归一化为评估结果
///
/// 模型回复中缺失或不合法的字段会被替换为保守的默认值；
/// 当品牌需求和品牌价值匹配度均为 `LOW` 时强制判定为不合格。
pub fn normalize_evaluation(lead: &LeadInput, response: &Map<String, Value>) -> LeadEvaluation {
    let website_quality_score = coerce_score(response.get("website_quality_score"));
    let online_presence_score = coerce_score(response.get("online_presence_score"));
    let branding_need = Level::from_loose(response.get("branding_need"));
    let brand_value_match = Level::from_loose(response.get("brand_value_match"));

    let w6h_map = response.get("w6h").and_then(Value::as_object);
    let location = lead
        .location
        .as_deref()
        .filter(|l| !l.is_empty())
        .unwrap_or(UNKNOWN);
    let w6h = W6H {
        who: w6h_field(w6h_map, "who", UNKNOWN),
        what: w6h_field(w6h_map, "what", UNKNOWN),
        where_: w6h_field(w6h_map, "where", location),
        when: w6h_field(w6h_map, "when", UNKNOWN),
        why: w6h_field(w6h_map, "why", UNKNOWN),
        how: w6h_field(w6h_map, "how", UNKNOWN),
        how_much: w6h_field(w6h_map, "how_much", UNKNOWN),
    };

    let mut qualified = response.get("qualified").is_some_and(is_truthy);
    if branding_need == Level::Low && brand_value_match == Level::Low {
        qualified = false;
    }

    LeadEvaluation {
        company_name: lead.company_name.clone(),
        website_url: lead.website_url.clone(),
        website_quality_score,
        branding_need,
        online_presence_score,
        brand_value_match,
        w6h,
        qualified,
        reasons: coerce_reasons(response.get("reasons")),
        error: None,
    }
}

/// 线索评估器
///
/// 对单条线索构建提示词、调用LLM并归一化结果。评估本身不会失败：
/// 任何错误都会转换为一条未通过的错误记录。
pub struct LeadEvaluator {
    llm_service: Arc<dyn LLMServiceTrait>,
}

impl LeadEvaluator {
    pub fn new(llm_service: Arc<dyn LLMServiceTrait>) -> Self {
        Self { llm_service }
    }

    /// 调用LLM并解析回复
    ///
    /// 只要接口返回了回复，令牌用量就会被返回，即使回复无法解析
    async fn try_evaluate(
        &self,
        lead: &LeadInput,
        model: &str,
    ) -> (Result<LeadEvaluation, EvaluationError>, TokenUsage) {
        let prompt = build_evaluation_prompt(lead);
        let (content, usage) = match self
            .llm_service
            .complete_json(SYSTEM_PROMPT, &prompt, model)
            .await
        {
            Ok(reply) => reply,
            Err(e) => return (Err(e.into()), TokenUsage::default()),
        };

        let evaluation = extract_json_from_response(&content)
            .map(|response| normalize_evaluation(lead, &response));
        (evaluation, usage)
    }

    /// 评估单条线索
    pub async fn evaluate(&self, lead: &LeadInput, model: &str) -> (LeadEvaluation, TokenUsage) {
        info!("Evaluating lead: {}", lead.company_name);

        let (result, usage) = self.try_evaluate(lead, model).await;
        metrics::counter!("llm_tokens_total", "kind" => "prompt")
            .increment(u64::from(usage.prompt_tokens));
        metrics::counter!("llm_tokens_total", "kind" => "completion")
            .increment(u64::from(usage.completion_tokens));

        match result {
            Ok(evaluation) => {
                info!(
                    "Successfully evaluated lead: {} - Qualified: {}",
                    lead.company_name, evaluation.qualified
                );
                (evaluation, usage)
            }
            Err(e) => {
                let error_msg = format!("LLM evaluation failed: {}", e);
                error!("Error evaluating lead {}: {}", lead.company_name, error_msg);
                (LeadEvaluation::failed(lead, &error_msg), usage)
            }
        }
    }
}

#[cfg(test)]
#[path = "evaluation_service_test.rs"]
mod evaluation_service_test;
