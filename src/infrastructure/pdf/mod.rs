// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// PDF 处理模块
///
/// 基于 lopdf 合并多个渲染结果并添加页码
pub mod assembler;
