// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{
    CookieParam, SetCookiesParams, TimeSinceEpoch,
};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::config::settings::RendererSettings;
use crate::domain::models::conversion_request::{SessionCookie, WindowSize};
use crate::engines::options::{
    bool_option, number_option, string_option, CONTEXT_OPTIONS, PRINT_OPTIONS,
};
use crate::engines::readiness::{
    readiness_expression, wait_until_ready, ReadinessProbe, TokioClock, POLL_INTERVAL,
};
use crate::engines::traits::{PdfRenderer, RenderError, RenderJob};
use crate::utils::url_utils::cookie_domain;

/// 注入 Cookie 的有效期（天）
const COOKIE_LIFETIME_DAYS: i64 = 3;

/// 已解析的渲染器配置
///
/// 在构建时一次性从 `RendererSettings` 解析，之后不再读取全局配置
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub chrome_path: PathBuf,
    pub response_timeout: Duration,
    pub no_sandbox: bool,
}

impl RendererConfig {
    /// 解析渲染器配置
    ///
    /// 必需的配置项缺失时返回 `RenderError::NotConfigured`
    pub fn resolve(settings: &RendererSettings) -> Result<Self, RenderError> {
        let chrome_path = settings
            .chrome_path
            .as_deref()
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .ok_or_else(|| RenderError::NotConfigured("renderer.chrome_path".to_string()))?;
        let response_timeout_ms = settings
            .response_timeout_ms
            .filter(|ms| *ms > 0)
            .ok_or_else(|| RenderError::NotConfigured("renderer.response_timeout_ms".to_string()))?;

        Ok(Self {
            chrome_path: PathBuf::from(chrome_path),
            response_timeout: Duration::from_millis(response_timeout_ms),
            no_sandbox: settings.no_sandbox,
        })
    }
}

/// Chrome 渲染器
///
/// 基于 chromiumoxide，每次渲染启动一个独立的浏览器进程，渲染结束后无论成败都会关闭。
pub struct ChromeRenderer {
    config: Result<RendererConfig, String>,
}

impl ChromeRenderer {
    /// 从配置构建，配置不完整时渲染器处于禁用状态
    pub fn from_settings(settings: &RendererSettings) -> Self {
        let config = RendererConfig::resolve(settings).map_err(|e| match e {
            RenderError::NotConfigured(key) => key,
            other => other.to_string(),
        });
        if let Err(key) = &config {
            tracing::warn!("Chrome renderer disabled: {} is not set", key);
        }
        Self { config }
    }

    /// 已解析的配置，禁用状态下为 `None`
    pub fn config_ref(&self) -> Option<&RendererConfig> {
        self.config.as_ref().ok()
    }

    fn config(&self) -> Result<&RendererConfig, RenderError> {
        self.config
            .as_ref()
            .map_err(|key| RenderError::NotConfigured(key.clone()))
    }
}

#[async_trait]
impl PdfRenderer for ChromeRenderer {
    async fn generate(&self, job: &RenderJob) -> Result<Vec<u8>, RenderError> {
        let config = self.config()?;
        let options = self.validate_options(&job.options);

        let session = BrowserSession::launch(config, job.window_size).await?;
        let result = render_page(&session, config, job, &options).await;
        session.shutdown().await;

        match &result {
            Ok(bytes) => tracing::info!("Rendered {} ({} bytes)", job.filename, bytes.len()),
            Err(e) => tracing::warn!("Render of {} failed: {}", job.filename, e),
        }
        result
    }

    fn is_enabled(&self) -> bool {
        self.config.is_ok()
    }

    fn valid_options(&self) -> Vec<&'static str> {
        CONTEXT_OPTIONS.iter().chain(PRINT_OPTIONS).copied().collect()
    }

    fn name(&self) -> &'static str {
        "chrome"
    }
}

/// 单次渲染使用的浏览器进程
struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    // Holds the profile directory until the browser is gone.
    _profile: tempfile::TempDir,
}

impl BrowserSession {
    async fn launch(
        config: &RendererConfig,
        window_size: Option<WindowSize>,
    ) -> Result<Self, RenderError> {
        let profile = tempfile::Builder::new()
            .prefix("pagepress-chrome-")
            .tempdir()
            .map_err(|e| RenderError::Browser(format!("Failed to create profile dir: {}", e)))?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(&config.chrome_path)
            .user_data_dir(profile.path())
            .request_timeout(config.response_timeout)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage");
        if config.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(size) = window_size {
            builder = builder.window_size(size.width, size.height).viewport(None);
        }

        let browser_config = builder.build().map_err(RenderError::Browser)?;
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| RenderError::Browser(format!("Failed to launch Chrome: {}", e)))?;

        // Spawn a handler to process browser events
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        tracing::debug!("Launched Chrome from {}", config.chrome_path.display());
        Ok(Self {
            browser,
            handler,
            _profile: profile,
        })
    }

    /// 关闭浏览器进程，关闭失败时强制结束
    async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("Graceful Chrome shutdown failed: {}", e);
            if let Some(Err(e)) = self.browser.kill().await {
                tracing::warn!("Failed to kill Chrome process: {}", e);
            }
        }
        if let Err(e) = self.browser.wait().await {
            tracing::warn!("Failed to reap Chrome process: {}", e);
        }
        self.handler.abort();
        tracing::debug!("Chrome session closed");
    }
}

async fn render_page(
    session: &BrowserSession,
    config: &RendererConfig,
    job: &RenderJob,
    options: &Map<String, Value>,
) -> Result<Vec<u8>, RenderError> {
    let page = session
        .browser
        .new_page("about:blank")
        .await
        .map_err(|e| RenderError::Browser(e.to_string()))?;

    // The page is still on about:blank here, and `Page::set_cookie` refuses to
    // set cookies for a blank page. Network.setCookies only needs the domain.
    if let Some(cookie) = &job.cookie {
        page.execute(set_cookies_command(cookie, &job.proxy_url)?)
            .await
            .map_err(|e| RenderError::Browser(format!("Failed to install cookie: {}", e)))?;
    }

    if let Some(user_agent) = &job.user_agent {
        page.set_user_agent(user_agent.as_str())
            .await
            .map_err(|e| RenderError::Browser(e.to_string()))?;
    }

    page.goto(job.proxy_url.as_str())
        .await
        .map_err(|e| RenderError::Browser(format!("Navigation failed: {}", e)))?;
    page.wait_for_navigation()
        .await
        .map_err(|e| RenderError::Browser(format!("Navigation failed: {}", e)))?;

    if let Some(check) = &job.readiness {
        let probe = PageProbe {
            page: &page,
            expression: readiness_expression(check),
        };
        wait_until_ready(&probe, &TokioClock, config.response_timeout, POLL_INTERVAL).await?;
    }

    let timeout_ms = config.response_timeout.as_millis() as u64;
    tokio::time::timeout(config.response_timeout, page.pdf(print_params(options)))
        .await
        .map_err(|_| RenderError::Timeout(timeout_ms))?
        .map_err(|e| RenderError::Browser(format!("PDF render failed: {}", e)))
}

/// 在页面中求值就绪脚本
struct PageProbe<'a> {
    page: &'a Page,
    expression: String,
}

#[async_trait]
impl ReadinessProbe for PageProbe<'_> {
    async fn check(&self) -> Result<bool, RenderError> {
        self.page
            .evaluate(self.expression.as_str())
            .await
            .map_err(|e| RenderError::Script(e.to_string()))?
            .into_value::<bool>()
            .map_err(|e| RenderError::Script(e.to_string()))
    }
}

/// 在导航前注入 Cookie 的 CDP 命令
fn set_cookies_command(
    cookie: &SessionCookie,
    proxy_url: &str,
) -> Result<SetCookiesParams, RenderError> {
    Ok(SetCookiesParams::new(vec![cookie_param(cookie, proxy_url)?]))
}

/// 构建作用于目标域名的 Cookie
fn cookie_param(cookie: &SessionCookie, proxy_url: &str) -> Result<CookieParam, RenderError> {
    let domain = cookie_domain(proxy_url).ok_or_else(|| {
        RenderError::Other(format!("Cannot derive cookie domain from {}", proxy_url))
    })?;
    let expires =
        (chrono::Utc::now() + chrono::TimeDelta::days(COOKIE_LIFETIME_DAYS)).timestamp() as f64;

    CookieParam::builder()
        .name(cookie.name.clone())
        .value(cookie.value.clone())
        .domain(domain)
        .path("/")
        .expires(TimeSinceEpoch::new(expires))
        .build()
        .map_err(RenderError::Other)
}

/// 把已过滤的选项映射为打印参数
fn print_params(options: &Map<String, Value>) -> PrintToPdfParams {
    PrintToPdfParams {
        landscape: bool_option(options, "landscape"),
        print_background: bool_option(options, "printBackground"),
        display_header_footer: bool_option(options, "displayHeaderFooter"),
        header_template: string_option(options, "headerTemplate"),
        footer_template: string_option(options, "footerTemplate"),
        paper_width: number_option(options, "paperWidth"),
        paper_height: number_option(options, "paperHeight"),
        margin_top: number_option(options, "marginTop"),
        margin_bottom: number_option(options, "marginBottom"),
        margin_left: number_option(options, "marginLeft"),
        margin_right: number_option(options, "marginRight"),
        prefer_css_page_size: bool_option(options, "preferCSSPageSize"),
        scale: number_option(options, "scale"),
        ..Default::default()
    }
}
