// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use lead_filter::application::use_cases::evaluate_leads::EvaluateLeadsUseCase;
use lead_filter::config::settings::Settings;
use lead_filter::domain::services::evaluation_service::LeadEvaluator;
use lead_filter::domain::services::llm_service::LLMService;
use lead_filter::infrastructure::storage::create_actor_storage;
use lead_filter::utils::telemetry;
use std::sync::Arc;
use tracing::info;

/// 主函数
///
/// Actor入口：加载配置、初始化存储与LLM服务，执行一次评估运行
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting lead-filter...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!(
        storage_type = %settings.storage.storage_type,
        model = %settings.llm.model,
        "Configuration loaded"
    );

    // 3. Initialize storage and LLM service
    let storage = create_actor_storage(&settings.storage)?;
    let llm_service = Arc::new(LLMService::new(&settings.llm, settings.retry.to_policy())?);

    // 4. Run
    let use_case = EvaluateLeadsUseCase::new(
        storage,
        LeadEvaluator::new(llm_service),
        settings.llm.model.clone(),
        settings.storage.input_key.clone(),
    );
    let summary = use_case.run().await?;
    info!(
        processed = summary.processed,
        qualified = summary.qualified,
        "Actor finished"
    );

    Ok(())
}
