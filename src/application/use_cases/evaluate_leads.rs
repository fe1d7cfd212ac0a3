// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use validator::Validate;

use crate::domain::models::evaluation::LeadEvaluation;
use crate::domain::models::lead::{raw_str_field, ActorInput, LeadInput};
use crate::domain::repositories::actor_storage::{ActorStorage, StorageError};
use crate::domain::services::evaluation_service::LeadEvaluator;
use crate::domain::services::llm_service::TokenUsage;

#[derive(Error, Debug)]
pub enum EvaluateLeadsError {
    #[error("Failed to read actor input: {0}")]
    Input(#[from] StorageError),
}

/// 一次运行的统计
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// 已处理的线索数
    pub processed: usize,
    /// 判定合格的线索数
    pub qualified: usize,
    /// 产生错误记录的线索数
    pub failed: usize,
    /// 未能写入数据集的记录数
    pub push_failures: usize,
    pub token_usage: TokenUsage,
}

/// 批量线索评估用例
///
/// 读取Actor输入，按输入顺序逐条评估线索并推送到数据集。
/// 单条线索失败只会产生一条错误记录，不会中断整个运行。
pub struct EvaluateLeadsUseCase {
    storage: Arc<dyn ActorStorage>,
    evaluator: LeadEvaluator,
    default_model: String,
    input_key: String,
}

impl EvaluateLeadsUseCase {
    pub fn new(
        storage: Arc<dyn ActorStorage>,
        evaluator: LeadEvaluator,
        default_model: String,
        input_key: String,
    ) -> Self {
        Self {
            storage,
            evaluator,
            default_model,
            input_key,
        }
    }

    pub async fn run(&self) -> Result<RunSummary, EvaluateLeadsError> {
        let mut summary = RunSummary::default();

        let raw_input = match self.storage.get_record(&self.input_key).await? {
            Some(raw) if !is_empty_input(&raw) => raw,
            _ => {
                error!("No input provided");
                return Ok(summary);
            }
        };

        let input = match ActorInput::from_value(&raw_input) {
            Ok(input) => input,
            Err(e) => {
                error!("Invalid input format: {}", e);
                return Ok(summary);
            }
        };

        info!("Processing {} leads", input.leads.len());
        let model = input.model_or(&self.default_model);
        info!("Using OpenAI model: {}", model);

        for raw_lead in &input.leads {
            let evaluation = match LeadInput::from_value(raw_lead) {
                Ok(lead) => {
                    let (evaluation, usage) = self.evaluator.evaluate(&lead, model).await;
                    summary.token_usage += usage;
                    match evaluation.validate() {
                        Ok(()) => evaluation,
                        Err(e) => LeadEvaluation::failed(
                            &lead,
                            &format!("LLM evaluation failed: invalid evaluation: {}", e),
                        ),
                    }
                }
                Err(e) => {
                    let error_msg = format!("Failed to process lead: {}", e);
                    error!(
                        "Error processing lead {}: {}",
                        raw_str_field(raw_lead, "company_name").unwrap_or("Unknown"),
                        error_msg
                    );
                    Self::error_record(raw_lead, error_msg)
                }
            };

            summary.processed += 1;
            if evaluation.is_error() {
                summary.failed += 1;
                metrics::counter!("leads_failed_total").increment(1);
            }
            if evaluation.qualified {
                summary.qualified += 1;
            }
            metrics::counter!(
                "leads_evaluated_total",
                "qualified" => evaluation.qualified.to_string()
            )
            .increment(1);

            if let Err(e) = self.push(&evaluation).await {
                summary.push_failures += 1;
                warn!(
                    company_name = %evaluation.company_name,
                    error = %e,
                    "Failed to push evaluation to dataset"
                );
            }
        }

        info!("Finished processing all leads");
        info!(
            processed = summary.processed,
            qualified = summary.qualified,
            failed = summary.failed,
            push_failures = summary.push_failures,
            total_tokens = summary.token_usage.total_tokens,
            "Run summary"
        );

        Ok(summary)
    }

    async fn push(&self, evaluation: &LeadEvaluation) -> Result<(), StorageError> {
        let item = serde_json::to_value(evaluation)?;
        self.storage.push_data(&item).await
    }

    /// 由无法校验的原始线索记录构造错误记录
    fn error_record(raw_lead: &Value, error_msg: String) -> LeadEvaluation {
        LeadEvaluation::unqualified(
            raw_str_field(raw_lead, "company_name").unwrap_or("Unknown"),
            raw_str_field(raw_lead, "website_url").unwrap_or(""),
            raw_str_field(raw_lead, "location"),
            vec![error_msg.clone()],
            error_msg,
        )
    }
}

/// 空记录（null、`{}`、`[]`、空字符串）视为没有输入
fn is_empty_input(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::Object(o) => o.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
#[path = "evaluate_leads_test.rs"]
mod evaluate_leads_test;
