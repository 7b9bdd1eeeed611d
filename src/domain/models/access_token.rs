// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use std::fmt;

/// 一次性访问令牌
///
/// 绑定签发用户、目标URL和渲染器实例，只能在过期前被兑换一次。
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// 令牌值
    pub value: String,
    /// 签发用户
    pub user_id: String,
    /// 目标URL
    pub target_url: String,
    /// 签发令牌的渲染器实例
    pub instance_id: String,
    /// 过期时间
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

// Token values never end up in logs in full.
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &mask(&self.value))
            .field("user_id", &self.user_id)
            .field("target_url", &self.target_url)
            .field("instance_id", &self.instance_id)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// 兑换成功后的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redemption {
    pub user_id: String,
    pub target_url: String,
    /// 为该用户建立的临时会话
    pub session_id: String,
}

/// 截断令牌值，只保留前四位用于排查
pub fn mask(value: &str) -> String {
    let prefix: String = value.chars().take(4).collect();
    format!("{}…", prefix)
}
