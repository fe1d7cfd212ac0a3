// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{routing::post, Json, Router};
use lead_filter::application::use_cases::evaluate_leads::EvaluateLeadsUseCase;
use lead_filter::config::settings::{LlmSettings, StorageSettings};
use lead_filter::domain::services::evaluation_service::LeadEvaluator;
use lead_filter::domain::services::llm_service::LLMService;
use lead_filter::infrastructure::storage::create_actor_storage;
use lead_filter::utils::retry_policy::RetryPolicy;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;

/// 启动伪造的 chat completions 接口：提示词中含 "Fence Co" 时返回带代码块的回复
async fn start_fake_llm() -> String {
    let app = Router::new().route(
        "/chat/completions",
        post(|Json(body): Json<Value>| async move {
            let prompt = body["messages"][1]["content"].as_str().unwrap_or_default();
            let content = if prompt.contains("Company Name: Fence Co") {
                "```json\n{\"website_quality_score\": 90.5, \"branding_need\": \"medium\", \
                 \"online_presence_score\": 70, \"brand_value_match\": \"high\", \
                 \"w6h\": {\"who\": \"Families\"}, \"qualified\": true, \
                 \"reasons\": [\"Premium positioning\", \"Weak social presence\"]}\n```"
                    .to_string()
            } else {
                "not even close to json".to_string()
            };
            Json(json!({
                "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }],
                "usage": { "prompt_tokens": 400, "completion_tokens": 80, "total_tokens": 480 }
            }))
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn write_input(root: &Path, input: &Value) {
    let dir = root.join("key_value_stores").join("default");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("INPUT.json"), serde_json::to_vec(input).unwrap()).unwrap();
}

fn read_item(root: &Path, index: u64) -> Value {
    let path = root
        .join("datasets")
        .join("default")
        .join(format!("{:09}.json", index));
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

fn build_use_case(root: &Path, api_base_url: String, api_key: Option<&str>) -> EvaluateLeadsUseCase {
    let storage_settings = StorageSettings {
        storage_type: "local".to_string(),
        local_path: root.to_string_lossy().to_string(),
        input_key: "INPUT".to_string(),
        key_value_store_id: "default".to_string(),
        dataset_id: "default".to_string(),
        api_base_url: "https://api.apify.com".to_string(),
        token: None,
    };
    let llm_settings = LlmSettings {
        api_key: api_key.map(str::to_string),
        model: "gpt-4o-mini".to_string(),
        api_base_url,
        temperature: 0.3,
        max_tokens: 1000,
        timeout_secs: 5,
    };

    let storage = create_actor_storage(&storage_settings).unwrap();
    let llm_service = LLMService::new(&llm_settings, RetryPolicy::none()).unwrap();
    EvaluateLeadsUseCase::new(
        storage,
        LeadEvaluator::new(Arc::new(llm_service)),
        llm_settings.model.clone(),
        storage_settings.input_key.clone(),
    )
}

#[tokio::test]
async fn test_actor_run_writes_dataset_items() {
    let dir = tempfile::tempdir().unwrap();
    write_input(
        dir.path(),
        &json!({
            "leads": [
                {
                    "company_name": "Fence Co",
                    "website_url": "https://fence.test",
                    "location": "Austin",
                    "social_links": ["https://instagram.com/fenceco"],
                    "homepage_text": "Custom cedar fences built to last."
                },
                { "company_name": "Gibberish Ltd", "website_url": "https://gibberish.test" },
                { "website_url": "https://anonymous.test" }
            ]
        }),
    );
    let base_url = start_fake_llm().await;

    let summary = build_use_case(dir.path(), base_url, Some("test-key"))
        .run()
        .await
        .unwrap();

    assert_eq!(summary.processed, 3);
    assert_eq!(summary.qualified, 1);
    assert_eq!(summary.failed, 2);
    // the unparseable reply for Gibberish Ltd is still counted
    assert_eq!(summary.token_usage.total_tokens, 960);

    let fence = read_item(dir.path(), 1);
    assert_eq!(fence["website_quality_score"], 90);
    assert_eq!(fence["branding_need"], "MEDIUM");
    assert_eq!(fence["brand_value_match"], "HIGH");
    assert_eq!(fence["w6h"]["who"], "Families");
    assert_eq!(fence["w6h"]["where"], "Austin");
    assert_eq!(fence["w6h"]["how_much"], "Unknown");
    assert_eq!(fence["qualified"], true);
    assert_eq!(fence["reasons"].as_array().unwrap().len(), 2);
    assert_eq!(fence["error"], Value::Null);

    let gibberish = read_item(dir.path(), 2);
    assert_eq!(gibberish["qualified"], false);
    assert!(gibberish["error"]
        .as_str()
        .unwrap()
        .starts_with("LLM evaluation failed: Invalid JSON in LLM response:"));

    let anonymous = read_item(dir.path(), 3);
    assert_eq!(anonymous["company_name"], "Unknown");
    assert_eq!(anonymous["website_url"], "");
    assert!(anonymous["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to process lead:"));
}

#[tokio::test]
async fn test_actor_run_without_api_key_records_failures() {
    let dir = tempfile::tempdir().unwrap();
    write_input(
        dir.path(),
        &json!({ "leads": [{ "company_name": "Fence Co", "website_url": "https://fence.test" }] }),
    );

    let summary = build_use_case(dir.path(), "http://127.0.0.1:9".to_string(), None)
        .run()
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    let item = read_item(dir.path(), 1);
    assert_eq!(
        item["reasons"][0],
        "Evaluation failed: LLM evaluation failed: OPENAI_API_KEY environment variable is required. \
         Please set it in your environment or Apify actor settings."
    );
}

#[tokio::test]
async fn test_actor_run_without_input_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();

    let summary = build_use_case(dir.path(), "http://127.0.0.1:9".to_string(), Some("k"))
        .run()
        .await
        .unwrap();

    assert_eq!(summary.processed, 0);
    assert!(!dir.path().join("datasets").exists());
}
