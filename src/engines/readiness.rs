// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

use crate::domain::models::conversion_request::ReadinessCheck;
use crate::engines::traits::RenderError;

/// 轮询间隔
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// 就绪等待状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessState {
    Pending,
    Satisfied,
    TimedOut,
}

/// 在页面上下文中执行就绪检测
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    async fn check(&self) -> Result<bool, RenderError>;
}

/// 时钟抽象，便于在测试中控制时间
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

/// 基于 tokio 的时钟
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// 轮询就绪脚本直到返回 true 或超时
///
/// 每次检测失败后休眠 `interval`，然后检查自进入循环以来的耗时，
/// 达到 `timeout` 即以 `RenderError::ReadinessTimeout` 失败。
pub async fn wait_until_ready<P, C>(
    probe: &P,
    clock: &C,
    timeout: Duration,
    interval: Duration,
) -> Result<ReadinessState, RenderError>
where
    P: ReadinessProbe + ?Sized,
    C: Clock + ?Sized,
{
    let started = clock.now();
    let mut state = ReadinessState::Pending;
    let mut ticks: u32 = 0;

    while state == ReadinessState::Pending {
        ticks += 1;
        if probe.check().await? {
            state = ReadinessState::Satisfied;
            continue;
        }
        clock.sleep(interval).await;
        if clock.now().duration_since(started) >= timeout {
            state = ReadinessState::TimedOut;
        }
    }

    tracing::debug!("Readiness wait finished as {:?} after {} checks", state, ticks);
    match state {
        ReadinessState::Satisfied => Ok(state),
        _ => Err(RenderError::ReadinessTimeout {
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}

/// 把就绪脚本和参数包装成可在页面中求值的表达式
pub fn readiness_expression(check: &ReadinessCheck) -> String {
    let params = serde_json::Value::Array(check.params.clone());
    format!("Boolean(({}).apply(null, {}))", check.script.trim(), params)
}
