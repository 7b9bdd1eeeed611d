// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 转换请求（conversion_request）：一次页面转 PDF 的全部参数
/// - 访问令牌（access_token）：一次性、限时、绑定用户的代理令牌
/// - 渲染结果（rendered_document）：PDF 字节与文件名
/// - 合并任务（merge_job）：多个 PDF 按顺序合并为一个文档
pub mod access_token;
pub mod conversion_request;
pub mod merge_job;
pub mod rendered_document;
