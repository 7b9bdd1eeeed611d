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

use axum::{
    extract::{Extension, Json, Path},
    http::{header, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use validator::Validate;

use crate::{
    application::dto::{
        convert_request::{BatchConvertRequestDto, ConvertRequestDto},
        convert_response::ConvertResponseDto,
    },
    application::use_cases::convert_use_case::ConversionOrchestrator,
    domain::repositories::storage_repository::{validate_key, StorageRepository},
    domain::services::capability_service::{Capability, CapabilityChecker},
    presentation::errors::{ApiError, AppError},
    presentation::extractors::user_id::UserId,
};

fn require_pdf_capability(
    capabilities: &dyn CapabilityChecker,
    user_id: &str,
) -> Result<(), AppError> {
    if capabilities.has_capability(user_id, Capability::GeneratePdf) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(user_id.to_string()).into())
    }
}

/// 转换单个页面
pub async fn convert(
    Extension(orchestrator): Extension<Arc<ConversionOrchestrator>>,
    Extension(capabilities): Extension<Arc<dyn CapabilityChecker>>,
    UserId(user_id): UserId,
    Json(payload): Json<ConvertRequestDto>,
) -> Result<impl IntoResponse, AppError> {
    require_pdf_capability(capabilities.as_ref(), &user_id)?;
    payload.validate()?;

    let request = payload.into_request();
    let document = orchestrator.convert_single(&user_id, &request).await?;
    Ok((StatusCode::OK, Json(ConvertResponseDto::from(&document))))
}

/// 转换多个页面并合并
pub async fn convert_batch(
    Extension(orchestrator): Extension<Arc<ConversionOrchestrator>>,
    Extension(capabilities): Extension<Arc<dyn CapabilityChecker>>,
    UserId(user_id): UserId,
    Json(payload): Json<BatchConvertRequestDto>,
) -> Result<impl IntoResponse, AppError> {
    require_pdf_capability(capabilities.as_ref(), &user_id)?;
    payload.validate()?;

    let requests = payload.to_requests();
    let document = orchestrator
        .convert_multiple(&user_id, &requests, &payload.filename, payload.page_numbers)
        .await?;
    Ok((StatusCode::OK, Json(ConvertResponseDto::from(&document))))
}

/// 下载已保存的文档
pub async fn get_document(
    Extension(storage): Extension<Arc<dyn StorageRepository>>,
    UserId(user_id): UserId,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    validate_key(&name)?;
    let handle = storage
        .fetch(&name, &user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(name.clone()))?;
    let bytes = storage.read(&handle).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", handle.name),
            ),
        ],
        bytes,
    ))
}
