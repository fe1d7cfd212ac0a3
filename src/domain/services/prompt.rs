// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::lead::LeadInput;

pub const SYSTEM_PROMPT: &str =
    "You are a brand strategist. Always respond with valid JSON only, no additional text.";

const NOT_PROVIDED: &str = "Not provided";

fn or_not_provided(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or(NOT_PROVIDED)
}

/// 构建线索评估提示词
///
/// 包含代理机构价值观、线索信息、七项评估标准以及模型必须遵循的JSON结构
pub fn build_evaluation_prompt(lead: &LeadInput) -> String {
    let social_links = match lead.social_links.as_deref() {
        Some(links) if !links.is_empty() => links.join(", "),
        _ => NOT_PROVIDED.to_string(),
    };

    format!(
        r#"You are an expert brand strategist for a branding and web design agency. Your task is to evaluate a potential client lead and determine if they are a good fit for your agency.

AGENCY VALUES:
- Focus on storytelling and long-term brand building
- Quality over speed/cheap solutions
- Strategic brand development
- Companies that value brand as an investment

EVALUATE THIS LEAD:

Company Name: {company_name}
Website URL: {website_url}
Industry: {industry}
Location: {location}
Social Links: {social_links}
Homepage Text: {homepage_text}
About Text: {about_text}

EVALUATION CRITERIA:
1. **website_quality_score** (0-100): Assess the website's design quality, functionality, user experience, and overall professionalism based on the provided text content.
2. **branding_need** (LOW/MEDIUM/HIGH): Determine how much the company needs branding improvement. LOW = already strong brand, HIGH = significant branding gaps.
3. **online_presence_score** (0-100): Evaluate their social media presence and digital footprint based on provided social links and content.
4. **brand_value_match** (LOW/MEDIUM/HIGH): Assess alignment with agency values. HIGH = values storytelling, long-term brand building, quality. LOW = only wants cheap/fast solutions, no brand strategy interest.
5. **w6h**: Extract and structure the W6H information (who, what, where, when, why, how, how_much) from the provided information.
6. **qualified** (boolean): True if the lead is a good fit (decent website quality score, medium-to-high branding need, and medium-to-high brand value match). False otherwise.
7. **reasons** (array of strings): Provide 2-4 short, clear reasons explaining your decision.

IMPORTANT: You MUST respond with ONLY valid JSON in this exact schema, no additional text or markdown:

{{
  "website_quality_score": <0-100 integer>,
  "branding_need": "<LOW|MEDIUM|HIGH>",
  "online_presence_score": <0-100 integer>,
  "brand_value_match": "<LOW|MEDIUM|HIGH>",
  "w6h": {{
    "who": "<string>",
    "what": "<string>",
    "where": "<string>",
    "when": "<string>",
    "why": "<string>",
    "how": "<string>",
    "how_much": "<string>"
  }},
  "qualified": <boolean>,
  "reasons": ["<string>", "<string>", ...]
}}

Respond with ONLY the JSON object, no markdown code blocks, no explanations, no additional text."#,
        company_name = lead.company_name,
        website_url = lead.website_url,
        industry = or_not_provided(lead.industry.as_deref()),
        location = or_not_provided(lead.location.as_deref()),
        social_links = social_links,
        homepage_text = or_not_provided(lead.homepage_text.as_deref()),
        about_text = or_not_provided(lead.about_text.as_deref()),
    )
}
