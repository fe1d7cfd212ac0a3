// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// 存储错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// 平台API请求错误
    #[error("Platform request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// 存储错误
    #[error("Storage error: {0}")]
    Other(String),
}

/// 键值存储特质
///
/// Actor 的输入记录保存在默认键值存储中
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// 读取记录，不存在时返回 `None`
    async fn get_record(&self, key: &str) -> Result<Option<Value>, StorageError>;
}

/// 数据集特质
///
/// 评估结果逐条追加到默认数据集
#[async_trait]
pub trait Dataset: Send + Sync {
    /// 追加一条记录
    async fn push_data(&self, item: &Value) -> Result<(), StorageError>;
}

/// Actor存储：同时提供输入读取和结果写入
pub trait ActorStorage: KeyValueStore + Dataset {}

impl<T: KeyValueStore + Dataset> ActorStorage for T {}
