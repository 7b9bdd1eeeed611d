// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// - 访问令牌代理（access_token_service）：签发与一次性兑换代理令牌
/// - 权限检查（capability_service）：判断用户是否可以生成 PDF
pub mod access_token_service;
pub mod capability_service;
