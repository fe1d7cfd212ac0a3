use super::*;
use std::fs;
use std::sync::Mutex;

// Tests touching process environment must not interleave.
static ENV_LOCK: Mutex<()> = Mutex::new(());

const ACTOR_VARS: &[&str] = &[
    "OPENAI_API_KEY",
    "OPENAI_BASE_URL",
    "APIFY_LOCAL_STORAGE_DIR",
    "APIFY_INPUT_KEY",
    "APIFY_DEFAULT_KEY_VALUE_STORE_ID",
    "APIFY_DEFAULT_DATASET_ID",
    "APIFY_API_BASE_URL",
    "APIFY_TOKEN",
    "APIFY_IS_AT_HOME",
    "LEAD_FILTER__LLM__MODEL",
    "APP_ENVIRONMENT",
];

fn clear_actor_vars() {
    for name in ACTOR_VARS {
        std::env::remove_var(name);
    }
}

#[test]
fn test_defaults_without_config_files() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_actor_vars();
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::with_config_dir(dir.path().to_str().unwrap()).unwrap();

    assert_eq!(settings.llm.max_tokens, 1000);
    assert!((settings.llm.temperature - 0.3).abs() < f32::EPSILON);
    assert_eq!(settings.llm.timeout(), Duration::from_secs(60));
    assert_eq!(settings.retry.max_retries, 3);
    assert_eq!(settings.llm.model, DEFAULT_MODEL);
    assert_eq!(settings.llm.api_key, None);
    assert_eq!(settings.storage.storage_type, "local");
}

#[test]
fn test_config_file_overrides_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_actor_vars();
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("default.toml"),
        r#"
[llm]
max_tokens = 512
timeout_secs = 5

[retry]
max_retries = 1
initial_backoff_ms = 10
max_backoff_ms = 20
"#,
    )
    .unwrap();

    let settings = Settings::with_config_dir(dir.path().to_str().unwrap()).unwrap();
    assert_eq!(settings.llm.max_tokens, 512);
    assert_eq!(settings.llm.timeout_secs, 5);

    let policy = settings.retry.to_policy();
    assert_eq!(policy.max_retries, 1);
    assert_eq!(policy.initial_backoff, Duration::from_millis(10));
    assert_eq!(policy.max_backoff, Duration::from_millis(20));
}

#[test]
fn test_actor_environment_overrides() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_actor_vars();
    std::env::set_var("OPENAI_API_KEY", "sk-env");
    std::env::set_var("APIFY_IS_AT_HOME", "1");
    std::env::set_var("APIFY_TOKEN", "apify-token");
    std::env::set_var("APIFY_DEFAULT_DATASET_ID", "dataset-42");
    std::env::set_var("APIFY_DEFAULT_KEY_VALUE_STORE_ID", "store-7");
    std::env::set_var("LEAD_FILTER__LLM__MODEL", "gpt-4o");

    let dir = tempfile::tempdir().unwrap();
    let result = Settings::with_config_dir(dir.path().to_str().unwrap());
    clear_actor_vars();
    let settings = result.unwrap();

    assert_eq!(settings.llm.api_key.as_deref(), Some("sk-env"));
    assert_eq!(settings.llm.model, "gpt-4o");
    assert_eq!(settings.storage.storage_type, "platform");
    assert_eq!(settings.storage.token.as_deref(), Some("apify-token"));
    assert_eq!(settings.storage.dataset_id, "dataset-42");
    assert_eq!(settings.storage.key_value_store_id, "store-7");
}

#[test]
fn test_blank_environment_values_are_ignored() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_actor_vars();
    std::env::set_var("OPENAI_API_KEY", "  ");
    std::env::set_var("APIFY_IS_AT_HOME", "0");

    let dir = tempfile::tempdir().unwrap();
    let result = Settings::with_config_dir(dir.path().to_str().unwrap());
    clear_actor_vars();
    let settings = result.unwrap();

    assert_eq!(settings.llm.api_key, None);
    assert_eq!(settings.storage.storage_type, "local");
}
