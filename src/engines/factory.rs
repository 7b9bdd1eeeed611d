// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use crate::config::settings::RendererSettings;
use crate::engines::chrome_engine::ChromeRenderer;
use crate::engines::null_engine::NullRenderer;
use crate::engines::traits::{PdfRenderer, RenderError};

/// 根据配置创建渲染器
///
/// `chrome` 的浏览器配置不完整时返回禁用状态的渲染器，由 `is_enabled` 报告，
/// 转换请求在签发令牌前即被拒绝
pub fn create_renderer(settings: &RendererSettings) -> Result<Arc<dyn PdfRenderer>, RenderError> {
    match settings.kind.as_str() {
        "chrome" => {
            let renderer = ChromeRenderer::from_settings(settings);
            if let Some(config) = renderer.config_ref() {
                tracing::info!(
                    "Using Chrome renderer at {} (timeout {:?})",
                    config.chrome_path.display(),
                    config.response_timeout
                );
            }
            Ok(Arc::new(renderer))
        }
        "null" => {
            tracing::info!("Using null renderer");
            Ok(Arc::new(NullRenderer))
        }
        other => Err(RenderError::Other(format!(
            "Unsupported renderer kind: {}",
            other
        ))),
    }
}
