// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::errors::InputError;

/// 潜在客户（线索）实体
///
/// 描述一个待评估的潜在客户。除公司名称和网站URL外，其余字段均为可选，
/// 缺失时在提示词中显示为 `Not provided`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadInput {
    /// 公司名称
    pub company_name: String,
    /// 公司网站URL
    pub website_url: String,
    /// 所属行业
    #[serde(default)]
    pub industry: Option<String>,
    /// 所在地
    #[serde(default)]
    pub location: Option<String>,
    /// 社交媒体链接
    #[serde(default)]
    pub social_links: Option<Vec<String>>,
    /// 首页文本
    #[serde(default)]
    pub homepage_text: Option<String>,
    /// "关于我们"页面文本
    #[serde(default)]
    pub about_text: Option<String>,
}

impl LeadInput {
    /// 从原始JSON记录校验并构造线索
    pub fn from_value(value: &Value) -> Result<Self, InputError> {
        Ok(Self::deserialize(value)?)
    }
}

/// Actor输入
///
/// `leads` 中的每一项单独校验，单条线索无效不会导致整个输入被拒绝。
#[derive(Debug, Clone, PartialEq)]
pub struct ActorInput {
    /// 待评估的原始线索记录
    pub leads: Vec<Value>,
    /// 输入中指定的模型（为空时使用配置的默认模型）
    pub openai_model: Option<String>,
}

impl ActorInput {
    /// 解析Actor输入记录
    pub fn from_value(value: &Value) -> Result<Self, InputError> {
        let object = value.as_object().ok_or(InputError::NotAnObject)?;

        let leads = match object.get("leads") {
            None | Some(Value::Null) => return Err(InputError::MissingLeads),
            Some(leads) => Vec::<Value>::deserialize(leads)?,
        };

        let openai_model = match object.get("openai_model") {
            None | Some(Value::Null) => None,
            Some(model) => Some(String::deserialize(model)?),
        }
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty());

        Ok(Self {
            leads,
            openai_model,
        })
    }

    /// 实际使用的模型名称
    pub fn model_or<'a>(&'a self, default_model: &'a str) -> &'a str {
        self.openai_model.as_deref().unwrap_or(default_model)
    }
}

/// 取原始线索记录中的字符串字段（用于构造错误记录）
pub fn raw_str_field<'a>(raw: &'a Value, field: &str) -> Option<&'a str> {
    raw.as_object()
        .and_then(|o: &Map<String, Value>| o.get(field))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}
