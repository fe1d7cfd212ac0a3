// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 编排一次完整的线索评估运行
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含线索模型、评估服务和存储接口
pub mod domain;

/// 基础设施模块
///
/// 提供Actor存储（本地目录 / 平台API）的具体实现
pub mod infrastructure;

/// 工具模块
///
/// 提供错误类型、重试策略和遥测等辅助功能
pub mod utils;
