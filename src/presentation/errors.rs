// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::application::use_cases::convert_use_case::ConversionError;
use crate::domain::repositories::storage_repository::StorageError;
use crate::domain::services::access_token_service::TokenError;

/// 请求层错误
#[derive(Error, Debug)]
pub enum ApiError {
    /// 用户缺少所需权限
    #[error("User {0} is not allowed to generate PDFs")]
    Forbidden(String),
    /// 文档不存在
    #[error("Document not found: {0}")]
    NotFound(String),
}

/// 应用错误类型
///
/// 封装所有可能的应用层错误，提供统一的错误处理接口
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        if let Some(e) = self.0.downcast_ref::<ConversionError>() {
            return match e {
                ConversionError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                ConversionError::ConversionFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            };
        }
        if let Some(e) = self.0.downcast_ref::<TokenError>() {
            return match e {
                TokenError::InvalidToken | TokenError::InstanceMismatch => StatusCode::UNAUTHORIZED,
                TokenError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
        }
        if let Some(e) = self.0.downcast_ref::<ApiError>() {
            return match e {
                ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
                ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            };
        }
        if let Some(StorageError::InvalidKey(_)) = self.0.downcast_ref::<StorageError>() {
            return StatusCode::BAD_REQUEST;
        }
        if self.0.downcast_ref::<validator::ValidationErrors>().is_some() {
            return StatusCode::BAD_REQUEST;
        }
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {:#}", self.0);
        }

        let body = Json(json!({ "success": false, "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
