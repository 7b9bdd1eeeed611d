// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::models::access_token::mask;
use crate::domain::services::access_token_service::AccessTokenProxy;
use crate::domain::services::capability_service::{Capability, CapabilityChecker};
use crate::presentation::errors::{ApiError, AppError};

/// 临时会话 Cookie 名
pub const SESSION_COOKIE: &str = "pagepress_session";

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    /// 目标URL
    pub url: String,
    /// 一次性令牌
    pub key: String,
    /// 渲染器实例ID
    pub instance: String,
}

/// 代理端点
///
/// 由无头浏览器访问：兑换令牌、校验权限，然后重定向到令牌绑定的目标URL。
/// 响应没有正文。
pub async fn convert_proxy(
    Extension(tokens): Extension<Arc<AccessTokenProxy>>,
    Extension(capabilities): Extension<Arc<dyn CapabilityChecker>>,
    Query(query): Query<ProxyQuery>,
) -> Result<Response, AppError> {
    let redemption = tokens.redeem(&query.key, &query.instance).await?;

    if !capabilities.has_capability(&redemption.user_id, Capability::GeneratePdf) {
        warn!(
            "User {} redeemed token {} without the PDF capability",
            redemption.user_id,
            mask(&query.key)
        );
        tokens.close(&query.key, false).await?;
        return Err(ApiError::Forbidden(redemption.user_id).into());
    }

    if redemption.target_url != query.url {
        // Only the URL the token was issued for is ever a redirect target.
        warn!(
            "Proxy url parameter differs from the bound target for token {}",
            mask(&query.key)
        );
    }

    info!(
        "Token {} redeemed by user {}, redirecting to {}",
        mask(&query.key),
        redemption.user_id,
        redemption.target_url
    );
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, redemption.session_id
    );
    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, redemption.target_url),
            (header::SET_COOKIE, cookie),
        ],
    )
        .into_response())
}
