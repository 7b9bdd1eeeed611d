// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use pagepress::domain::services::access_token_service::{AccessTokenProxy, TokenError};
use pagepress::infrastructure::session_store::InMemorySessionStore;
use std::sync::Arc;

/// 多线程并发兑换同一令牌，只有一个成功
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_redemptions_have_one_winner() {
    let sessions = Arc::new(InMemorySessionStore::new());
    let tokens = Arc::new(AccessTokenProxy::new(
        sessions.clone(),
        chrono::TimeDelta::seconds(60),
        "default",
    ));

    for _ in 0..20 {
        let token = tokens.issue("42", "https://example.com/");
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tokens = tokens.clone();
                let value = token.value.clone();
                tokio::spawn(async move { tokens.redeem(&value, "default").await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => winners += 1,
                Err(TokenError::InvalidToken) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(winners, 1);
    }

    assert_eq!(sessions.len(), 20);
    assert_eq!(tokens.live_count(), 0);
}
