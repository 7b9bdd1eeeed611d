// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::domain::repositories::storage_repository::validate_key;

pub const USER_ID_HEADER: &str = "x-user-id";

/// 调用方用户ID，来自 `X-User-Id` 请求头
///
/// 同时用作文档存储的命名空间，因此必须是合法的存储键
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| validate_key(value).is_ok());

        match user_id {
            Some(user_id) => Ok(UserId(user_id.to_string())),
            None => {
                let body = Json(json!({
                    "success": false,
                    "error": "Missing or invalid X-User-Id header"
                }));
                Err((StatusCode::UNAUTHORIZED, body).into_response())
            }
        }
    }
}
