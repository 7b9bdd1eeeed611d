// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::{ParseError, Url};

/// 代理端点路径
pub const PROXY_PATH: &str = "convert-proxy";

/// 构建嵌入令牌的代理URL
///
/// 生成 `{base}/convert-proxy?url=..&key=..&instance=..`，目标URL经过百分号编码
pub fn build_proxy_url(
    base: &Url,
    target_url: &str,
    token: &str,
    instance_id: &str,
) -> Result<Url, ParseError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    let mut proxy = base.join(PROXY_PATH)?;
    proxy
        .query_pairs_mut()
        .clear()
        .append_pair("url", target_url)
        .append_pair("key", token)
        .append_pair("instance", instance_id);
    Ok(proxy)
}

/// 从代理URL中取回目标URL
pub fn target_from_proxy_url(proxy_url: &str) -> Option<Url> {
    let proxy = Url::parse(proxy_url).ok()?;
    let target = proxy
        .query_pairs()
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.into_owned())?;
    Url::parse(&target).ok()
}

/// 目标URL的主机名，用作注入 Cookie 的域
pub fn cookie_domain(proxy_url: &str) -> Option<String> {
    target_from_proxy_url(proxy_url)?
        .host_str()
        .map(str::to_string)
}

/// 校验目标URL
///
/// 只接受带主机名的 http/https 地址
pub fn validate_target_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw.trim()).map_err(|e| format!("'{}' is not a valid URL: {}", raw, e))?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(format!("'{}' uses unsupported scheme {}", raw, scheme)),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(format!("'{}' has no host", raw));
    }
    Ok(url)
}
