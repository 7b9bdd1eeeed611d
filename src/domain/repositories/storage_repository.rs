// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use thiserror::Error;

/// 存储错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// 同名文档已存在
    #[error("Document already exists: {namespace}/{name}")]
    AlreadyExists { namespace: String, name: String },
    /// 非法的文档名或命名空间
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
    /// 存储错误
    #[error("Storage error: {0}")]
    Other(String),
}

/// 已保存文档的句柄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    /// 所属命名空间（通常是用户ID）
    pub namespace: String,
    /// 逻辑文件名
    pub name: String,
    /// 字节大小
    pub size: u64,
}

/// 存储仓库特质
///
/// 定义文档持久化接口。`store` 不做覆盖写入，同名文档已存在时返回
/// `StorageError::AlreadyExists`，需要替换时由调用方先删除再创建。
#[async_trait]
pub trait StorageRepository: Send + Sync {
    /// 在命名空间下以指定文件名保存数据
    async fn store(
        &self,
        name: &str,
        namespace: &str,
        data: &[u8],
    ) -> Result<StoredDocument, StorageError>;

    /// 查找文档
    async fn fetch(&self, name: &str, namespace: &str)
        -> Result<Option<StoredDocument>, StorageError>;

    /// 读取文档内容
    async fn read(&self, handle: &StoredDocument) -> Result<Vec<u8>, StorageError>;

    /// 删除文档
    async fn delete(&self, handle: &StoredDocument) -> Result<(), StorageError>;
}

/// 校验存储键，拒绝空值和路径穿越
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty()
        || key == "."
        || key == ".."
        || key.contains('/')
        || key.contains('\\')
        || key.contains('\0')
    {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}
