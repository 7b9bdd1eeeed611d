// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::models::conversion_request::{
    ConversionRequest, ReadinessCheck, SessionCookie, WindowSize,
};
use crate::engines::options::{filter_options, CONTEXT_OPTIONS};

/// 渲染错误类型
#[derive(Error, Debug)]
pub enum RenderError {
    /// 就绪脚本在超时前没有返回 true
    #[error("Readiness condition not satisfied within {timeout_ms}ms")]
    ReadinessTimeout { timeout_ms: u64 },
    /// PDF 生成超时
    #[error("PDF render timed out after {0}ms")]
    Timeout(u64),
    /// 浏览器错误
    #[error("Browser error: {0}")]
    Browser(String),
    /// 就绪脚本执行失败
    #[error("Readiness script failed: {0}")]
    Script(String),
    /// 缺少必需的配置项
    #[error("Renderer not configured: {0} is not set")]
    NotConfigured(String),
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

/// 一次渲染所需的全部参数
#[derive(Debug, Clone)]
pub struct RenderJob {
    /// 嵌入一次性令牌的代理URL
    pub proxy_url: String,
    /// 输出文件名
    pub filename: String,
    /// 调用方传入的渲染选项（尚未过滤）
    pub options: Map<String, Value>,
    /// 注入到目标域名的 Cookie
    pub cookie: Option<SessionCookie>,
    /// 浏览器窗口尺寸
    pub window_size: Option<WindowSize>,
    /// 自定义 User-Agent
    pub user_agent: Option<String>,
    /// 就绪检测脚本
    pub readiness: Option<ReadinessCheck>,
}

impl RenderJob {
    pub fn from_request(request: &ConversionRequest, proxy_url: String) -> Self {
        Self {
            proxy_url,
            filename: request.resolved_filename(),
            options: request.options().clone(),
            cookie: request.cookie().cloned(),
            window_size: request.window_size(),
            user_agent: request.user_agent().map(str::to_string),
            readiness: request.readiness().cloned(),
        }
    }
}

/// PDF 渲染器特质
///
/// 每个实现声明自己接受的选项集合，未知选项在转发前被丢弃。
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    /// 渲染代理URL指向的页面，返回 PDF 字节
    async fn generate(&self, job: &RenderJob) -> Result<Vec<u8>, RenderError>;

    /// 渲染器所需的外部程序和配置是否可用
    fn is_enabled(&self) -> bool;

    /// 允许的选项名
    fn valid_options(&self) -> Vec<&'static str> {
        CONTEXT_OPTIONS.to_vec()
    }

    /// 按白名单过滤选项
    fn validate_options(&self, options: &Map<String, Value>) -> Map<String, Value> {
        filter_options(options, &self.valid_options())
    }

    /// 渲染器名称
    fn name(&self) -> &'static str;
}
