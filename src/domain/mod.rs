// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：转换请求、访问令牌、渲染结果和合并任务
/// - 仓库接口（repositories）：文档存储和会话管理的抽象接口
/// - 服务（services）：访问令牌代理和权限检查
///
/// 领域层不依赖于任何外部实现。
pub mod models;
pub mod repositories;
pub mod services;
