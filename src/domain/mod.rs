// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：线索与评估结果
/// - 仓库接口（repositories）：Actor存储抽象接口
/// - 服务（services）：提示词构建、LLM调用与结果归一化
pub mod models;
pub mod repositories;
pub mod services;
