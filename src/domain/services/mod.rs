// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 评估服务（evaluation_service）：解析并归一化模型回复，评估单条线索
/// - LLM服务（llm_service）：与OpenAI兼容接口的交互
/// - 提示词（prompt）：构建线索评估提示词
pub mod evaluation_service;
pub mod llm_service;
pub mod prompt;
