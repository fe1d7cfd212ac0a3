// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use super::lead::LeadInput;

const UNKNOWN: &str = "Unknown";

/// 等级（品牌需求 / 品牌价值匹配度）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    #[default]
    Low,
    Medium,
    High,
}

impl Level {
    /// 宽松解析：去除空白并转大写，无法识别的值一律视为 `LOW`
    pub fn from_loose(value: Option<&Value>) -> Self {
        match value
            .and_then(Value::as_str)
            .map(|s| s.trim().to_ascii_uppercase())
            .as_deref()
        {
            Some("MEDIUM") => Level::Medium,
            Some("HIGH") => Level::High,
            _ => Level::Low,
        }
    }
}

/// W6H 分析
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct W6H {
    /// 目标受众或客户群
    pub who: String,
    /// 产品或服务
    pub what: String,
    /// 地理位置或市场
    #[serde(rename = "where")]
    pub where_: String,
    /// 时间线或成立时间
    pub when: String,
    /// 使命或目的
    pub why: String,
    /// 运营或交付价值的方式
    pub how: String,
    /// 定价或成本结构
    pub how_much: String,
}

impl W6H {
    /// 所有字段均未知的分析，`where` 使用线索所在地（如有）
    pub fn unknown(location: Option<&str>) -> Self {
        Self {
            who: UNKNOWN.to_string(),
            what: UNKNOWN.to_string(),
            where_: location.filter(|l| !l.is_empty()).unwrap_or(UNKNOWN).to_string(),
            when: UNKNOWN.to_string(),
            why: UNKNOWN.to_string(),
            how: UNKNOWN.to_string(),
            how_much: UNKNOWN.to_string(),
        }
    }
}

/// 单条线索的评估结果，即推送到数据集中的记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct LeadEvaluation {
    pub company_name: String,
    pub website_url: String,
    /// 网站质量评分 0-100
    #[validate(range(min = 0, max = 100))]
    pub website_quality_score: u8,
    pub branding_need: Level,
    /// 线上存在感评分 0-100
    #[validate(range(min = 0, max = 100))]
    pub online_presence_score: u8,
    pub brand_value_match: Level,
    pub w6h: W6H,
    pub qualified: bool,
    pub reasons: Vec<String>,
    /// 评估失败时的错误信息
    pub error: Option<String>,
}

impl LeadEvaluation {
    /// 构造一条未通过的错误记录
    pub fn unqualified(
        company_name: impl Into<String>,
        website_url: impl Into<String>,
        location: Option<&str>,
        reasons: Vec<String>,
        error: String,
    ) -> Self {
        Self {
            company_name: company_name.into(),
            website_url: website_url.into(),
            website_quality_score: 0,
            branding_need: Level::Low,
            online_presence_score: 0,
            brand_value_match: Level::Low,
            w6h: W6H::unknown(location),
            qualified: false,
            reasons,
            error: Some(error),
        }
    }

    /// LLM评估失败时的记录
    pub fn failed(lead: &LeadInput, error: &str) -> Self {
        Self::unqualified(
            lead.company_name.clone(),
            lead.website_url.clone(),
            lead.location.as_deref(),
            vec![format!("Evaluation failed: {}", error)],
            error.to_string(),
        )
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
