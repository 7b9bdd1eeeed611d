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

use anyhow::Context;
use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempPath;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};
use url::Url;

use crate::domain::models::conversion_request::ConversionRequest;
use crate::domain::models::merge_job::MergeJob;
use crate::domain::models::rendered_document::RenderedDocument;
use crate::domain::repositories::storage_repository::{StorageRepository, StoredDocument};
use crate::domain::services::access_token_service::AccessTokenProxy;
use crate::engines::traits::{PdfRenderer, RenderJob};
use crate::infrastructure::pdf::assembler::DocumentAssembler;
use crate::utils::filename::resolve_filename;
use crate::utils::url_utils::{build_proxy_url, validate_target_url};

/// 转换错误类型
#[derive(Error, Debug)]
pub enum ConversionError {
    /// 请求在开始渲染前被拒绝
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// 转换过程中的任何失败，`cause` 是完整的错误链
    #[error("Conversion failed: {cause}")]
    ConversionFailed { cause: String },
}

impl ConversionError {
    fn failed(error: anyhow::Error) -> Self {
        Self::ConversionFailed {
            cause: format!("{:#}", error),
        }
    }
}

/// 转换编排器
///
/// 串联令牌签发、页面渲染、文档合并与持久化。每次渲染结束后无论成败，
/// 都会作废令牌并按需终止它建立的会话；多页转换产生的临时文件在返回前同步删除。
pub struct ConversionOrchestrator {
    renderer: Arc<dyn PdfRenderer>,
    tokens: Arc<AccessTokenProxy>,
    storage: Arc<dyn StorageRepository>,
    assembler: DocumentAssembler,
    proxy_base: Url,
    temp_dir: Option<PathBuf>,
    /// (命名空间, 文件名) -> 保存锁，同名文档的替换串行执行
    persist_locks: DashMap<(String, String), Arc<Mutex<()>>>,
}

impl ConversionOrchestrator {
    pub fn new(
        renderer: Arc<dyn PdfRenderer>,
        tokens: Arc<AccessTokenProxy>,
        storage: Arc<dyn StorageRepository>,
        proxy_base: Url,
    ) -> Self {
        Self {
            renderer,
            tokens,
            storage,
            assembler: DocumentAssembler::new(),
            proxy_base,
            temp_dir: None,
            persist_locks: DashMap::new(),
        }
    }

    /// 指定临时文件目录，默认使用系统临时目录
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(temp_dir.into());
        self
    }

    pub fn renderer(&self) -> &dyn PdfRenderer {
        self.renderer.as_ref()
    }

    /// 转换单个页面
    ///
    /// 渲染结果以解析后的文件名保存在 `user_id` 命名空间下，覆盖同名文档
    pub async fn convert_single(
        &self,
        user_id: &str,
        request: &ConversionRequest,
    ) -> Result<RenderedDocument, ConversionError> {
        let filename = request.resolved_filename();
        info!("Converting {} to {} for user {}", request.url(), filename, user_id);

        let result: anyhow::Result<RenderedDocument> = async {
            self.ensure_enabled()?;
            let bytes = self.render(user_id, request).await?;
            self.persist(user_id, &filename, &bytes).await?;
            Ok(RenderedDocument::new(filename.clone(), bytes))
        }
        .await;

        match result {
            Ok(document) => {
                info!("Stored {} ({} bytes)", document.filename, document.size());
                Ok(document)
            }
            Err(e) => {
                warn!("Conversion of {} failed: {:#}", request.url(), e);
                Err(ConversionError::failed(e))
            }
        }
    }

    /// 按顺序转换多个页面并合并为一个文档
    ///
    /// 任何一个URL不合法时在渲染前整体拒绝。页面逐个渲染，中间结果只以临时文件存在。
    pub async fn convert_multiple(
        &self,
        user_id: &str,
        requests: &[ConversionRequest],
        output_name: &str,
        stamp_page_numbers: bool,
    ) -> Result<RenderedDocument, ConversionError> {
        let Some(first) = requests.first() else {
            return Err(ConversionError::InvalidInput(
                "At least one URL is required".to_string(),
            ));
        };
        for request in requests {
            validate_target_url(request.url()).map_err(ConversionError::InvalidInput)?;
        }

        let filename = resolve_filename(Some(output_name), first.url());
        info!(
            "Converting {} pages into {} for user {}",
            requests.len(),
            filename,
            user_id
        );

        let mut artifacts: Vec<TempPath> = Vec::with_capacity(requests.len() + 1);
        let result = self
            .render_and_merge(user_id, requests, &filename, stamp_page_numbers, &mut artifacts)
            .await;
        cleanup(artifacts);

        match result {
            Ok(document) => {
                info!("Stored {} ({} bytes)", document.filename, document.size());
                Ok(document)
            }
            Err(e) => {
                warn!("Merged conversion into {} failed: {:#}", filename, e);
                Err(ConversionError::failed(e))
            }
        }
    }

    async fn render_and_merge(
        &self,
        user_id: &str,
        requests: &[ConversionRequest],
        filename: &str,
        stamp_page_numbers: bool,
        artifacts: &mut Vec<TempPath>,
    ) -> anyhow::Result<RenderedDocument> {
        self.ensure_enabled()?;
        let mut sources = Vec::with_capacity(requests.len());
        for (index, request) in requests.iter().enumerate() {
            let bytes = self.render(user_id, request).await?;
            let artifact = self.temp_artifact()?;
            tokio::fs::write(&artifact, &bytes)
                .await
                .with_context(|| format!("Failed to write page {} to disk", index + 1))?;
            sources.push(artifact.to_path_buf());
            artifacts.push(artifact);
        }

        let destination = self.temp_artifact()?;
        let job = MergeJob::new(sources, destination.to_path_buf(), stamp_page_numbers);
        artifacts.push(destination);

        let merged = job.destination.clone();
        let assembler = self.assembler;
        let summary = tokio::task::spawn_blocking(move || assembler.merge(&job))
            .await
            .context("Merge task panicked")??;
        info!("Merged {} sources into {} pages", summary.sources, summary.pages);

        let bytes = tokio::fs::read(&merged)
            .await
            .context("Failed to read merged document")?;
        self.persist(user_id, filename, &bytes).await?;
        Ok(RenderedDocument::new(filename, bytes))
    }

    fn ensure_enabled(&self) -> anyhow::Result<()> {
        if !self.renderer.is_enabled() {
            anyhow::bail!("renderer {} is not enabled", self.renderer.name());
        }
        Ok(())
    }

    /// 签发令牌并渲染一个页面
    ///
    /// 令牌由租约持有，渲染结束或本 future 被丢弃时都会关闭
    async fn render(&self, user_id: &str, request: &ConversionRequest) -> anyhow::Result<Vec<u8>> {
        let lease = self
            .tokens
            .lease(user_id, request.url(), request.keep_session());
        let result = self.render_with_token(lease.value(), request).await;

        if let Err(e) = lease.release().await {
            warn!("Failed to close session for {}: {}", request.url(), e);
        }
        result
    }

    async fn render_with_token(
        &self,
        token: &str,
        request: &ConversionRequest,
    ) -> anyhow::Result<Vec<u8>> {
        let proxy_url = build_proxy_url(
            &self.proxy_base,
            request.url(),
            token,
            self.tokens.instance_id(),
        )
        .context("Failed to build proxy URL")?;
        let job = RenderJob::from_request(request, proxy_url.into());

        let bytes = self
            .renderer
            .generate(&job)
            .await
            .with_context(|| format!("{} renderer failed on {}", self.renderer.name(), request.url()))?;
        Ok(bytes)
    }

    /// 保存文档，已存在的同名文档被替换
    async fn persist(
        &self,
        user_id: &str,
        filename: &str,
        bytes: &[u8],
    ) -> anyhow::Result<StoredDocument> {
        let key = (user_id.to_string(), filename.to_string());
        let lock = self.persist_locks.entry(key.clone()).or_default().clone();
        let result = {
            let _guard = lock.lock().await;
            self.replace(user_id, filename, bytes).await
        };
        drop(lock);
        self.persist_locks
            .remove_if(&key, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    async fn replace(
        &self,
        user_id: &str,
        filename: &str,
        bytes: &[u8],
    ) -> anyhow::Result<StoredDocument> {
        if let Some(existing) = self.storage.fetch(filename, user_id).await? {
            self.storage.delete(&existing).await?;
        }
        let stored = self
            .storage
            .store(filename, user_id, bytes)
            .await
            .with_context(|| format!("Failed to store {}", filename))?;
        Ok(stored)
    }

    fn temp_artifact(&self) -> anyhow::Result<TempPath> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("pagepress-").suffix(".pdf");
        let file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .context("Failed to create temporary file")?;
        Ok(file.into_temp_path())
    }
}

fn cleanup(artifacts: Vec<TempPath>) {
    for artifact in artifacts {
        let path = artifact.to_path_buf();
        if let Err(e) = artifact.close() {
            warn!("Failed to remove temporary file {}: {}", path.display(), e);
        }
    }
}
