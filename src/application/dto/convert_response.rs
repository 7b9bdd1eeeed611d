// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

use crate::domain::models::rendered_document::RenderedDocument;

/// 转换响应
#[derive(Debug, Deserialize, Serialize)]
pub struct ConvertResponseDto {
    pub success: bool,
    /// 保存使用的文件名，可用于 `GET /v1/documents/{name}`
    pub filename: String,
    /// 字节大小
    pub size: usize,
}

impl From<&RenderedDocument> for ConvertResponseDto {
    fn from(document: &RenderedDocument) -> Self {
        Self {
            success: true,
            filename: document.filename.clone(),
            size: document.size(),
        }
    }
}
