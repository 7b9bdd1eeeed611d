// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use thiserror::Error;

/// 会话错误类型
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session backend error: {0}")]
    Backend(String),
}

/// 会话仓库特质
///
/// 令牌兑换时以绑定用户身份建立临时会话，转换结束后终止。
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// 为用户建立会话，返回会话ID
    async fn authenticate(&self, user_id: &str) -> Result<String, SessionError>;

    /// 查询会话对应的用户
    async fn user_for(&self, session_id: &str) -> Result<Option<String>, SessionError>;

    /// 终止会话。会话不存在时同样返回成功
    async fn terminate(&self, session_id: &str) -> Result<(), SessionError>;
}
