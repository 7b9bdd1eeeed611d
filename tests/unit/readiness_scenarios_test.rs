// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use pagepress::engines::readiness::{
    wait_until_ready, ReadinessProbe, ReadinessState, TokioClock, POLL_INTERVAL,
};
use pagepress::engines::traits::RenderError;
use std::time::Duration;
use tokio::time::Instant;

/// Reports ready once `ready_after` has passed on the tokio clock.
struct TimedProbe {
    started: Instant,
    ready_after: Option<Duration>,
}

#[async_trait]
impl ReadinessProbe for TimedProbe {
    async fn check(&self) -> Result<bool, RenderError> {
        Ok(self
            .ready_after
            .is_some_and(|after| self.started.elapsed() >= after))
    }
}

/// 脚本两秒后返回 true，超时 5000ms：约两秒后继续渲染
#[tokio::test(start_paused = true)]
async fn ready_after_two_seconds_within_timeout() {
    let started = Instant::now();
    let probe = TimedProbe {
        started,
        ready_after: Some(Duration::from_secs(2)),
    };

    let state = wait_until_ready(&probe, &TokioClock, Duration::from_millis(5000), POLL_INTERVAL)
        .await
        .unwrap();

    assert_eq!(state, ReadinessState::Satisfied);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(2));
    assert!(elapsed < Duration::from_millis(2500));
}

/// 脚本始终返回 false，超时 1000ms：在 1000 到 1500ms 之间失败
#[tokio::test(start_paused = true)]
async fn never_ready_times_out() {
    let started = Instant::now();
    let probe = TimedProbe {
        started,
        ready_after: None,
    };

    let result =
        wait_until_ready(&probe, &TokioClock, Duration::from_millis(1000), POLL_INTERVAL).await;

    assert!(matches!(
        result,
        Err(RenderError::ReadinessTimeout { timeout_ms: 1000 })
    ));
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(1000));
    assert!(elapsed <= Duration::from_millis(1500));
}
