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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含服务器、渲染器、访问令牌、存储和权限等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 渲染器配置
    pub renderer: RendererSettings,
    /// 访问令牌配置
    pub tokens: TokenSettings,
    /// 存储配置
    pub storage: StorageSettings,
    /// 权限配置
    pub auth: AuthSettings,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
    /// 无头浏览器访问代理端点时使用的外部地址
    pub public_url: String,
}

/// 渲染器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct RendererSettings {
    /// 渲染器类型 (chrome, null)
    pub kind: String,
    /// Chrome/Chromium 可执行文件路径
    pub chrome_path: Option<String>,
    /// 渲染响应超时时间（毫秒）
    pub response_timeout_ms: Option<u64>,
    /// 渲染器实例标识，令牌只能被签发它的实例兑换
    pub instance_id: String,
    /// 是否关闭浏览器沙箱（仅用于无法使用沙箱的容器环境）
    pub no_sandbox: bool,
}

/// 访问令牌配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct TokenSettings {
    /// 令牌有效期（秒）
    pub ttl_secs: u64,
}

/// 存储配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// 存储类型 (local, memory)
    pub storage_type: String,
    /// 本地存储路径 (当 type=local 时使用)
    pub local_path: Option<String>,
}

/// 权限配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// 拥有生成 PDF 权限的用户列表，"*" 表示所有用户
    pub pdf_generators: Vec<String>,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从配置文件和环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("PAGEPRESS").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// 仅使用默认值构建配置，再叠加给定的 TOML 片段
    pub fn from_toml(overrides: &str) -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::from_str(overrides, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            // Server
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.public_url", "http://127.0.0.1:3000")?
            // Renderer; chrome_path has no default on purpose, see RendererConfig::resolve
            .set_default("renderer.kind", "chrome")?
            .set_default("renderer.response_timeout_ms", 30_000)?
            .set_default("renderer.instance_id", "default")?
            .set_default("renderer.no_sandbox", false)?
            // Tokens
            .set_default("tokens.ttl_secs", 60)?
            // Storage
            .set_default("storage.storage_type", "local")?
            .set_default("storage.local_path", "./storage")?
            // Auth
            .set_default("auth.pdf_generators", vec!["*"])
    }
}
