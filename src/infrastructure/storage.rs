// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::config::settings::StorageSettings;
use crate::domain::repositories::storage_repository::{
    validate_key, StorageError, StorageRepository, StoredDocument,
};

/// 本地文件系统存储实现
///
/// 文档保存在 `base_path/<namespace>/<name>`
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn get_full_path(&self, name: &str, namespace: &str) -> Result<PathBuf, StorageError> {
        validate_key(name)?;
        validate_key(namespace)?;
        Ok(self.base_path.join(namespace).join(name))
    }
}

#[async_trait]
impl StorageRepository for LocalStorage {
    async fn store(
        &self,
        name: &str,
        namespace: &str,
        data: &[u8],
    ) -> Result<StoredDocument, StorageError> {
        let full_path = self.get_full_path(name, namespace)?;

        // 确保目录存在
        if let Some(parent) = Path::new(&full_path).parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full_path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                })
            }
            Err(e) => return Err(StorageError::Io(e)),
        };
        file.write_all(data).await?;
        file.flush().await?;

        tracing::debug!("Stored {} bytes at {}", data.len(), full_path.display());

        Ok(StoredDocument {
            namespace: namespace.to_string(),
            name: name.to_string(),
            size: data.len() as u64,
        })
    }

    async fn fetch(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<StoredDocument>, StorageError> {
        let full_path = self.get_full_path(name, namespace)?;

        match fs::metadata(&full_path).await {
            Ok(meta) if meta.is_file() => Ok(Some(StoredDocument {
                namespace: namespace.to_string(),
                name: name.to_string(),
                size: meta.len(),
            })),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn read(&self, handle: &StoredDocument) -> Result<Vec<u8>, StorageError> {
        let full_path = self.get_full_path(&handle.name, &handle.namespace)?;
        Ok(fs::read(&full_path).await?)
    }

    async fn delete(&self, handle: &StoredDocument) -> Result<(), StorageError> {
        let full_path = self.get_full_path(&handle.name, &handle.namespace)?;

        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

/// 内存存储实现（用于单元测试和无状态部署）
pub struct InMemoryStorage {
    data: Arc<RwLock<HashMap<(String, String), Vec<u8>>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// 当前保存的文档数量
    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageRepository for InMemoryStorage {
    async fn store(
        &self,
        name: &str,
        namespace: &str,
        data: &[u8],
    ) -> Result<StoredDocument, StorageError> {
        validate_key(name)?;
        validate_key(namespace)?;

        let mut map = self.data.write().await;
        let key = (namespace.to_string(), name.to_string());
        if map.contains_key(&key) {
            return Err(StorageError::AlreadyExists {
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        }
        map.insert(key, data.to_vec());
        Ok(StoredDocument {
            namespace: namespace.to_string(),
            name: name.to_string(),
            size: data.len() as u64,
        })
    }

    async fn fetch(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<StoredDocument>, StorageError> {
        let map = self.data.read().await;
        Ok(map
            .get(&(namespace.to_string(), name.to_string()))
            .map(|data| StoredDocument {
                namespace: namespace.to_string(),
                name: name.to_string(),
                size: data.len() as u64,
            }))
    }

    async fn read(&self, handle: &StoredDocument) -> Result<Vec<u8>, StorageError> {
        let map = self.data.read().await;
        map.get(&(handle.namespace.clone(), handle.name.clone()))
            .cloned()
            .ok_or_else(|| StorageError::Other(format!("{} not found", handle.name)))
    }

    async fn delete(&self, handle: &StoredDocument) -> Result<(), StorageError> {
        let mut map = self.data.write().await;
        map.remove(&(handle.namespace.clone(), handle.name.clone()));
        Ok(())
    }
}

/// 存储工厂函数
pub fn create_storage_repository(
    settings: &StorageSettings,
) -> Result<Arc<dyn StorageRepository>, StorageError> {
    match settings.storage_type.as_str() {
        "local" => {
            let base_path = settings
                .local_path
                .as_ref()
                .cloned()
                .unwrap_or_else(|| "./storage".to_string());
            Ok(Arc::new(LocalStorage::new(base_path)))
        }
        "memory" => Ok(Arc::new(InMemoryStorage::new())),
        other => Err(StorageError::Other(format!(
            "Unsupported storage type: {}",
            other
        ))),
    }
}
