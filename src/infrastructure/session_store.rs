// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::domain::repositories::session_repository::{SessionError, SessionRepository};

/// 内存会话存储
pub struct InMemorySessionStore {
    sessions: DashMap<String, String>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// 当前活跃会话数量
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionStore {
    async fn authenticate(&self, user_id: &str) -> Result<String, SessionError> {
        let session_id = Uuid::new_v4().simple().to_string();
        self.sessions
            .insert(session_id.clone(), user_id.to_string());
        Ok(session_id)
    }

    async fn user_for(&self, session_id: &str) -> Result<Option<String>, SessionError> {
        Ok(self.sessions.get(session_id).map(|user| user.value().clone()))
    }

    async fn terminate(&self, session_id: &str) -> Result<(), SessionError> {
        self.sessions.remove(session_id);
        Ok(())
    }
}
