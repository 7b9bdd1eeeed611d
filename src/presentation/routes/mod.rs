// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::Extension,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::application::use_cases::convert_use_case::ConversionOrchestrator;
use crate::domain::repositories::storage_repository::StorageRepository;
use crate::domain::services::access_token_service::AccessTokenProxy;
use crate::domain::services::capability_service::CapabilityChecker;
use crate::presentation::handlers::{convert_handler, proxy_handler};

/// 路由所需的共享组件
#[derive(Clone)]
pub struct AppComponents {
    pub orchestrator: Arc<ConversionOrchestrator>,
    pub tokens: Arc<AccessTokenProxy>,
    pub storage: Arc<dyn StorageRepository>,
    pub capabilities: Arc<dyn CapabilityChecker>,
}

/// 创建应用路由
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes() -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version))
        .route("/convert-proxy", get(proxy_handler::convert_proxy));

    let protected_routes = Router::new()
        .route("/v1/convert", post(convert_handler::convert))
        .route("/v1/convert/batch", post(convert_handler::convert_batch))
        .route("/v1/documents/{name}", get(convert_handler::get_document));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// 挂载共享组件和请求追踪
pub fn app(components: AppComponents) -> Router {
    routes()
        .layer(Extension(components.orchestrator))
        .layer(Extension(components.tokens))
        .layer(Extension(components.storage))
        .layer(Extension(components.capabilities))
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
///
/// 同时报告当前渲染器是否可用
pub async fn health_check(
    Extension(orchestrator): Extension<Arc<ConversionOrchestrator>>,
) -> Json<Value> {
    let renderer = orchestrator.renderer();
    Json(json!({
        "status": "ok",
        "renderer": renderer.name(),
        "renderer_enabled": renderer.is_enabled(),
    }))
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
