// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 包含的子模块：
/// - 存储（storage）：Actor键值存储与数据集的本地、平台和内存实现
pub mod storage;
