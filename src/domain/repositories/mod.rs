// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 定义Actor输入（键值存储）和输出（数据集）的访问接口，
/// 具体实现位于基础设施层。
pub mod actor_storage;
