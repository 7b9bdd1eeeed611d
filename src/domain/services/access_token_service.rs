// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{TimeDelta, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::distr::Alphanumeric;
use rand::Rng;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::models::access_token::{mask, AccessToken, Redemption};
use crate::domain::repositories::session_repository::{SessionError, SessionRepository};

const TOKEN_LENGTH: usize = 40;

/// 令牌错误类型
#[derive(Error, Debug)]
pub enum TokenError {
    /// 令牌不存在、已被使用或已过期
    #[error("Invalid or expired access token")]
    InvalidToken,
    /// 令牌不是为当前渲染器实例签发的
    #[error("Access token was issued for a different renderer instance")]
    InstanceMismatch,
    /// 建立会话失败
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// 访问令牌代理
///
/// 为一次渲染签发一次性令牌，并在无头浏览器访问代理端点时兑换令牌、
/// 以绑定用户身份建立临时会话。令牌的检查与作废在同一个分片锁内完成，
/// 同一令牌的并发兑换最多只有一个成功。
pub struct AccessTokenProxy {
    live: DashMap<String, AccessToken>,
    /// 已兑换令牌 -> 会话ID
    redeemed: DashMap<String, String>,
    sessions: Arc<dyn SessionRepository>,
    ttl: TimeDelta,
    instance_id: String,
}

impl AccessTokenProxy {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        ttl: TimeDelta,
        instance_id: impl Into<String>,
    ) -> Self {
        Self {
            live: DashMap::new(),
            redeemed: DashMap::new(),
            sessions,
            ttl,
            instance_id: instance_id.into(),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// 签发令牌
    ///
    /// # 参数
    ///
    /// * `user_id` - 签发用户
    /// * `target_url` - 令牌绑定的目标URL
    pub fn issue(&self, user_id: &str, target_url: &str) -> AccessToken {
        self.purge_expired();

        let expires_at = Utc::now() + self.ttl;
        loop {
            let value: String = rand::rng()
                .sample_iter(&Alphanumeric)
                .take(TOKEN_LENGTH)
                .map(char::from)
                .collect();

            if self.redeemed.contains_key(&value) {
                continue;
            }
            if let Entry::Vacant(slot) = self.live.entry(value.clone()) {
                let token = AccessToken {
                    value,
                    user_id: user_id.to_string(),
                    target_url: target_url.to_string(),
                    instance_id: self.instance_id.clone(),
                    expires_at,
                };
                slot.insert(token.clone());
                debug!(
                    "Issued access token {} for user {} ({})",
                    mask(&token.value),
                    user_id,
                    target_url
                );
                return token;
            }
        }
    }

    /// 兑换令牌
    ///
    /// # 返回值
    ///
    /// * `Ok(Redemption)` - 绑定的用户、目标URL以及新建立的会话
    /// * `Err(TokenError::InvalidToken)` - 令牌不存在、已使用或已过期
    /// * `Err(TokenError::InstanceMismatch)` - 渲染器实例不匹配
    pub async fn redeem(&self, value: &str, instance_id: &str) -> Result<Redemption, TokenError> {
        let token = match self.live.entry(value.to_string()) {
            Entry::Vacant(_) => {
                warn!("Rejected unknown or consumed token {}", mask(value));
                return Err(TokenError::InvalidToken);
            }
            Entry::Occupied(entry) => {
                if entry.get().is_expired(Utc::now()) {
                    entry.remove();
                    warn!("Rejected expired token {}", mask(value));
                    return Err(TokenError::InvalidToken);
                }
                if entry.get().instance_id != instance_id {
                    warn!(
                        "Token {} presented by instance {}, issued for {}",
                        mask(value),
                        instance_id,
                        entry.get().instance_id
                    );
                    return Err(TokenError::InstanceMismatch);
                }
                entry.remove()
            }
        };

        let session_id = self.sessions.authenticate(&token.user_id).await?;
        self.redeemed.insert(token.value.clone(), session_id.clone());
        info!(
            "Token {} redeemed, session opened for user {}",
            mask(&token.value),
            token.user_id
        );

        Ok(Redemption {
            user_id: token.user_id,
            target_url: token.target_url,
            session_id,
        })
    }

    /// 签发令牌并返回持有它的租约
    ///
    /// 租约被释放或丢弃时调用 `close` 的同等清理，转换被取消时会话也不会遗留
    pub fn lease(
        self: &Arc<Self>,
        user_id: &str,
        target_url: &str,
        keep_session: bool,
    ) -> TokenLease {
        let token = self.issue(user_id, target_url);
        TokenLease {
            tokens: Arc::clone(self),
            value: token.value,
            keep_session,
            open: true,
            session: None,
        }
    }

    /// 结束令牌的生命周期
    ///
    /// 未兑换的令牌被作废；已兑换令牌建立的会话在 `keep_session` 为假时被终止。
    /// 可重复调用。
    pub async fn close(&self, value: &str, keep_session: bool) -> Result<(), SessionError> {
        let Some(session_id) = self.detach(value, keep_session) else {
            return Ok(());
        };
        self.sessions.terminate(&session_id).await?;
        debug!("Terminated session opened by token {}", mask(value));
        Ok(())
    }

    /// 同步作废令牌，返回仍需终止的会话
    fn detach(&self, value: &str, keep_session: bool) -> Option<String> {
        if self.live.remove(value).is_some() {
            debug!("Revoked unredeemed token {}", mask(value));
        }

        let (_, session_id) = self.redeemed.remove(value)?;
        if keep_session {
            debug!("Keeping session opened by token {}", mask(value));
            return None;
        }
        Some(session_id)
    }

    /// 清理过期令牌
    pub fn purge_expired(&self) {
        let now = Utc::now();
        self.live.retain(|_, token| !token.is_expired(now));
    }

    /// 当前有效令牌数量
    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

/// 一次渲染持有的令牌
///
/// `release` 正常结束令牌的生命周期。租约在释放完成前被丢弃时，令牌在 `Drop`
/// 中同步作废，会话的终止交给当前 tokio 运行时在后台完成。
pub struct TokenLease {
    tokens: Arc<AccessTokenProxy>,
    value: String,
    keep_session: bool,
    /// 令牌尚未作废
    open: bool,
    /// 已作废但尚未终止的会话
    session: Option<String>,
}

impl TokenLease {
    pub fn value(&self) -> &str {
        &self.value
    }

    /// 作废令牌并按需终止会话
    pub async fn release(mut self) -> Result<(), SessionError> {
        self.open = false;
        let Some(session_id) = self.tokens.detach(&self.value, self.keep_session) else {
            return Ok(());
        };
        self.session = Some(session_id.clone());
        let result = self.tokens.sessions.terminate(&session_id).await;
        self.session = None;
        result?;
        debug!("Terminated session opened by token {}", mask(&self.value));
        Ok(())
    }
}

impl Drop for TokenLease {
    fn drop(&mut self) {
        let pending = if self.open {
            self.tokens.detach(&self.value, self.keep_session)
        } else {
            self.session.take()
        };
        let Some(session_id) = pending else {
            return;
        };

        let token = mask(&self.value);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let sessions = self.tokens.sessions.clone();
                handle.spawn(async move {
                    match sessions.terminate(&session_id).await {
                        Ok(()) => debug!("Terminated session of abandoned token {}", token),
                        Err(e) => warn!("Failed to terminate session of token {}: {}", token, e),
                    }
                });
            }
            Err(_) => warn!(
                "No runtime available to terminate session of abandoned token {}",
                token
            ),
        }
    }
}
