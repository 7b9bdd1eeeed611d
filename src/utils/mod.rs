// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工具模块
///
/// 文件名解析、代理URL构建和日志初始化
pub mod filename;
pub mod telemetry;
pub mod url_utils;
