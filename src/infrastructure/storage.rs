// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use url::Url;

use crate::config::settings::StorageSettings;
use crate::domain::repositories::actor_storage::{
    ActorStorage, Dataset, KeyValueStore, StorageError,
};

/// 本地文件系统存储实现
///
/// 目录结构：
/// - `<root>/key_value_stores/<store>/<KEY>.json`
/// - `<root>/datasets/<dataset>/000000001.json`（九位数字，从1开始）
pub struct LocalActorStorage {
    key_value_store_dir: PathBuf,
    dataset_dir: PathBuf,
    next_index: Mutex<Option<u64>>,
}

impl LocalActorStorage {
    pub fn new(root: impl AsRef<Path>, key_value_store_id: &str, dataset_id: &str) -> Self {
        let root = root.as_ref();
        Self {
            key_value_store_dir: root.join("key_value_stores").join(key_value_store_id),
            dataset_dir: root.join("datasets").join(dataset_id),
            next_index: Mutex::new(None),
        }
    }

    /// 扫描数据集目录，得到下一个可用序号
    async fn scan_next_index(&self) -> Result<u64, StorageError> {
        let mut entries = match fs::read_dir(&self.dataset_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(1),
            Err(e) => return Err(StorageError::Io(e)),
        };

        let mut max_index = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_json = path.extension().is_some_and(|ext| ext == "json");
            let index = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u64>().ok());
            if let (true, Some(index)) = (is_json, index) {
                max_index = max_index.max(index);
            }
        }
        Ok(max_index + 1)
    }
}

#[async_trait]
impl KeyValueStore for LocalActorStorage {
    async fn get_record(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let candidates = [
            self.key_value_store_dir.join(format!("{}.json", key)),
            self.key_value_store_dir.join(key),
        ];

        for path in candidates {
            match fs::read(&path).await {
                Ok(data) => {
                    debug!(path = %path.display(), "Read key-value store record");
                    return Ok(Some(serde_json::from_slice(&data)?));
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StorageError::Io(e)),
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl Dataset for LocalActorStorage {
    async fn push_data(&self, item: &Value) -> Result<(), StorageError> {
        let mut next_index = self.next_index.lock().await;
        let index = match *next_index {
            Some(index) => index,
            None => self.scan_next_index().await?,
        };

        fs::create_dir_all(&self.dataset_dir).await?;
        let full_path = self.dataset_dir.join(format!("{:09}.json", index));
        let data = serde_json::to_vec_pretty(item)?;

        let mut file = fs::File::create(&full_path).await?;
        file.write_all(&data).await?;
        file.flush().await?;

        *next_index = Some(index + 1);
        Ok(())
    }
}

/// 平台存储实现
///
/// 通过平台 REST API（v2）读取键值存储记录并向数据集追加记录
pub struct PlatformActorStorage {
    client: reqwest::Client,
    api_base_url: String,
    token: String,
    key_value_store_id: String,
    dataset_id: String,
}

impl PlatformActorStorage {
    pub fn new(
        api_base_url: String,
        token: String,
        key_value_store_id: String,
        dataset_id: String,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base_url,
            token,
            key_value_store_id,
            dataset_id,
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, StorageError> {
        let mut url = Url::parse(&self.api_base_url)
            .map_err(|e| StorageError::Other(format!("Invalid platform API URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| StorageError::Other("Platform API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push("v2")
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl KeyValueStore for PlatformActorStorage {
    async fn get_record(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let url = self.endpoint(&[
            "key-value-stores",
            self.key_value_store_id.as_str(),
            "records",
            key,
        ])?;
        let response = self.client.get(url).bearer_auth(&self.token).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response.error_for_status()?;
        let body = response.bytes().await?;
        if body.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&body)?))
    }
}

#[async_trait]
impl Dataset for PlatformActorStorage {
    async fn push_data(&self, item: &Value) -> Result<(), StorageError> {
        let url = self.endpoint(&["datasets", self.dataset_id.as_str(), "items"])?;
        self.client
            .post(url)
            .bearer_auth(&self.token)
            .json(item)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// 内存存储实现（用于测试和嵌入场景）
#[derive(Default)]
pub struct InMemoryActorStorage {
    records: RwLock<std::collections::HashMap<String, Value>>,
    items: RwLock<Vec<Value>>,
}

impl InMemoryActorStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_record(&self, key: &str, value: Value) {
        self.records.write().await.insert(key.to_string(), value);
    }

    pub async fn items(&self) -> Vec<Value> {
        self.items.read().await.clone()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryActorStorage {
    async fn get_record(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.records.read().await.get(key).cloned())
    }
}

#[async_trait]
impl Dataset for InMemoryActorStorage {
    async fn push_data(&self, item: &Value) -> Result<(), StorageError> {
        self.items.write().await.push(item.clone());
        Ok(())
    }
}

/// 存储工厂函数
pub fn create_actor_storage(
    settings: &StorageSettings,
) -> Result<Arc<dyn ActorStorage>, StorageError> {
    match settings.storage_type.as_str() {
        "local" => Ok(Arc::new(LocalActorStorage::new(
            &settings.local_path,
            &settings.key_value_store_id,
            &settings.dataset_id,
        ))),
        "platform" => {
            let token = settings.token.clone().ok_or_else(|| {
                StorageError::Other("APIFY_TOKEN is required for platform storage".to_string())
            })?;
            Ok(Arc::new(PlatformActorStorage::new(
                settings.api_base_url.clone(),
                token,
                settings.key_value_store_id.clone(),
                settings.dataset_id.clone(),
            )))
        }
        other => Err(StorageError::Other(format!(
            "Unsupported storage type: {}",
            other
        ))),
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;
