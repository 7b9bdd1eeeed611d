// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::filename::resolve_filename;

/// 浏览器窗口尺寸（像素）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl WindowSize {
    /// 从 `[width, height]` 形式的选项值解析窗口尺寸
    ///
    /// 非两元素数组或包含非正整数时返回 `None`
    pub fn from_value(value: &Value) -> Option<Self> {
        let dims = value.as_array()?;
        if dims.len() != 2 {
            return None;
        }
        let width = u32::try_from(dims[0].as_u64()?).ok()?;
        let height = u32::try_from(dims[1].as_u64()?).ok()?;
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self { width, height })
    }
}

/// 页面就绪检测脚本
///
/// `script` 是一个返回布尔值的函数源码，`params` 按顺序作为参数传入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessCheck {
    pub script: String,
    pub params: Vec<Value>,
}

/// 渲染前注入到目标域名的 Cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
}

/// 转换请求
///
/// 构造完成后不可修改。渲染上下文相关的选项（windowSize、userAgent、
/// jsCondition、jsConditionParams）在构造时被提取为独立字段，格式不正确的
/// 值被静默丢弃；其余选项原样保留，由渲染器按白名单过滤。
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    url: String,
    filename: Option<String>,
    options: Map<String, Value>,
    cookie: Option<SessionCookie>,
    window_size: Option<WindowSize>,
    user_agent: Option<String>,
    readiness: Option<ReadinessCheck>,
    keep_session: bool,
}

impl ConversionRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            filename: None,
            options: Map::new(),
            cookie: None,
            window_size: None,
            user_agent: None,
            readiness: None,
            keep_session: false,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookie = Some(SessionCookie {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_keep_session(mut self, keep_session: bool) -> Self {
        self.keep_session = keep_session;
        self
    }

    /// 合并调用方传入的选项
    pub fn with_options(mut self, options: Map<String, Value>) -> Self {
        let mut condition = None;
        let mut params = Vec::new();

        for (key, value) in options {
            match key.as_str() {
                "windowSize" => match WindowSize::from_value(&value) {
                    Some(size) => self.window_size = Some(size),
                    None => tracing::debug!("Dropping malformed windowSize option: {}", value),
                },
                "userAgent" => {
                    if let Value::String(agent) = value {
                        self.user_agent = Some(agent);
                    }
                }
                "jsCondition" => {
                    if let Value::String(script) = value {
                        if !script.trim().is_empty() {
                            condition = Some(script);
                        }
                    }
                }
                "jsConditionParams" => {
                    if let Value::Array(values) = value {
                        params = values;
                    }
                }
                _ => {
                    self.options.insert(key, value);
                }
            }
        }

        if let Some(script) = condition {
            self.readiness = Some(ReadinessCheck { script, params });
        }
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// 最终保存使用的文件名
    pub fn resolved_filename(&self) -> String {
        resolve_filename(self.filename.as_deref(), &self.url)
    }

    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    pub fn cookie(&self) -> Option<&SessionCookie> {
        self.cookie.as_ref()
    }

    pub fn window_size(&self) -> Option<WindowSize> {
        self.window_size
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub fn readiness(&self) -> Option<&ReadinessCheck> {
        self.readiness.as_ref()
    }

    pub fn keep_session(&self) -> bool {
        self.keep_session
    }
}
