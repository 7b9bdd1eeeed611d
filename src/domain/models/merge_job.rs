// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::path::PathBuf;

/// 合并任务
///
/// `sources` 的顺序即输出文档中的页面顺序。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeJob {
    /// 按顺序排列的源 PDF 路径
    pub sources: Vec<PathBuf>,
    /// 合并结果写入的路径
    pub destination: PathBuf,
    /// 是否在每页右下角添加 "Page X of Y" 页脚
    pub stamp_page_numbers: bool,
}

impl MergeJob {
    pub fn new(sources: Vec<PathBuf>, destination: PathBuf, stamp_page_numbers: bool) -> Self {
        Self {
            sources,
            destination,
            stamp_page_numbers,
        }
    }
}
