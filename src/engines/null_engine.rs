// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;

use crate::engines::traits::{PdfRenderer, RenderError, RenderJob};

/// 空渲染器
///
/// 不依赖任何外部程序，永远处于禁用状态，渲染结果为空
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

#[async_trait]
impl PdfRenderer for NullRenderer {
    async fn generate(&self, job: &RenderJob) -> Result<Vec<u8>, RenderError> {
        tracing::debug!("Null renderer asked to render {}", job.filename);
        Ok(Vec::new())
    }

    fn is_enabled(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "null"
    }
}
