// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 线索（lead）：待评估的潜在客户及Actor输入
/// - 评估结果（evaluation）：推送到数据集的评估记录
pub mod evaluation;
pub mod lead;
