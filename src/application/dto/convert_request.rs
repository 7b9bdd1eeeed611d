// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::domain::models::conversion_request::ConversionRequest;

/// 单页转换请求
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct ConvertRequestDto {
    #[validate(url)]
    pub url: String,
    #[validate(length(min = 1, max = 200, message = "Filename cannot be empty"))]
    pub filename: Option<String>,
    /// 渲染选项，未知键会被渲染器丢弃
    pub options: Option<Map<String, Value>>,
    #[validate(nested)]
    pub cookie: Option<CookieDto>,
    #[serde(default)]
    pub keep_session: bool,
}

#[derive(Debug, Deserialize, Serialize, Validate, Clone)]
pub struct CookieDto {
    #[validate(length(min = 1, message = "Cookie name cannot be empty"))]
    pub name: String,
    pub value: String,
}

impl ConvertRequestDto {
    pub fn into_request(self) -> ConversionRequest {
        let mut request = ConversionRequest::new(self.url)
            .with_options(self.options.unwrap_or_default())
            .with_keep_session(self.keep_session);
        if let Some(filename) = self.filename {
            request = request.with_filename(filename);
        }
        if let Some(cookie) = self.cookie {
            request = request.with_cookie(cookie.name, cookie.value);
        }
        request
    }
}

/// 多页合并转换请求
///
/// 各URL的格式在用例中逐一校验，任何一个不合法都会整体拒绝
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct BatchConvertRequestDto {
    #[validate(length(min = 1, message = "At least one URL is required"))]
    pub urls: Vec<String>,
    #[validate(length(min = 1, max = 200, message = "Filename cannot be empty"))]
    pub filename: String,
    /// 应用于每一页的渲染选项
    pub options: Option<Map<String, Value>>,
    #[validate(nested)]
    pub cookie: Option<CookieDto>,
    #[serde(default)]
    pub page_numbers: bool,
}

impl BatchConvertRequestDto {
    pub fn to_requests(&self) -> Vec<ConversionRequest> {
        let options = self.options.clone().unwrap_or_default();
        self.urls
            .iter()
            .map(|url| {
                let request = ConversionRequest::new(url.clone()).with_options(options.clone());
                match &self.cookie {
                    Some(cookie) => request.with_cookie(cookie.name.clone(), cookie.value.clone()),
                    None => request,
                }
            })
            .collect()
    }
}
