// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::{Map, Value};

/// 所有渲染器都接受的渲染上下文选项
pub const CONTEXT_OPTIONS: &[&str] = &["windowSize", "userAgent", "jsCondition", "jsConditionParams"];

/// 浏览器打印为 PDF 时的版式选项
///
/// 尺寸和边距以英寸为单位
pub const PRINT_OPTIONS: &[&str] = &[
    "landscape",
    "printBackground",
    "displayHeaderFooter",
    "headerTemplate",
    "footerTemplate",
    "paperWidth",
    "paperHeight",
    "marginTop",
    "marginBottom",
    "marginLeft",
    "marginRight",
    "preferCSSPageSize",
    "scale",
];

/// 只保留白名单中的选项，其余的静默丢弃
pub fn filter_options(options: &Map<String, Value>, allowed: &[&str]) -> Map<String, Value> {
    options
        .iter()
        .filter(|(key, _)| {
            let keep = allowed.contains(&key.as_str());
            if !keep {
                tracing::debug!("Dropping unsupported render option: {}", key);
            }
            keep
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

pub fn bool_option(options: &Map<String, Value>, key: &str) -> Option<bool> {
    options.get(key).and_then(Value::as_bool)
}

pub fn number_option(options: &Map<String, Value>, key: &str) -> Option<f64> {
    options.get(key).and_then(Value::as_f64)
}

pub fn string_option(options: &Map<String, Value>, key: &str) -> Option<String> {
    options.get(key).and_then(Value::as_str).map(str::to_string)
}
