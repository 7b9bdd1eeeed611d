// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashSet;

/// 平台权限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// 生成 PDF
    GeneratePdf,
}

/// 权限检查特质
pub trait CapabilityChecker: Send + Sync {
    fn has_capability(&self, user_id: &str, capability: Capability) -> bool;
}

/// 基于用户白名单的权限检查
///
/// 白名单包含 `*` 时所有用户都拥有生成 PDF 的权限
pub struct AllowListCapabilities {
    generators: HashSet<String>,
    everyone: bool,
}

impl AllowListCapabilities {
    pub fn new(generators: impl IntoIterator<Item = String>) -> Self {
        let generators: HashSet<String> = generators.into_iter().collect();
        let everyone = generators.contains("*");
        Self {
            generators,
            everyone,
        }
    }
}

impl CapabilityChecker for AllowListCapabilities {
    fn has_capability(&self, user_id: &str, capability: Capability) -> bool {
        match capability {
            Capability::GeneratePdf => self.everyone || self.generators.contains(user_id),
        }
    }
}
