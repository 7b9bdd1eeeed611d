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

use pagepress::application::use_cases::convert_use_case::ConversionOrchestrator;
use pagepress::config::settings::Settings;
use pagepress::domain::services::access_token_service::AccessTokenProxy;
use pagepress::domain::services::capability_service::AllowListCapabilities;
use pagepress::engines::factory::create_renderer;
use pagepress::infrastructure::session_store::InMemorySessionStore;
use pagepress::infrastructure::storage::create_storage_repository;
use pagepress::presentation::routes::{self, AppComponents};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use url::Url;

use pagepress::utils::telemetry;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting pagepress...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded");

    // 3. Resolve the renderer once; a disabled renderer rejects every conversion
    let renderer = create_renderer(&settings.renderer)?;
    if renderer.is_enabled() {
        info!("Renderer {} ready", renderer.name());
    } else {
        warn!("Renderer {} is not enabled, conversions will fail", renderer.name());
    }

    // 4. Initialize storage, sessions and tokens
    let storage = create_storage_repository(&settings.storage)?;
    let sessions = Arc::new(InMemorySessionStore::new());
    let ttl = chrono::TimeDelta::seconds(i64::try_from(settings.tokens.ttl_secs)?);
    let tokens = Arc::new(AccessTokenProxy::new(
        sessions,
        ttl,
        settings.renderer.instance_id.clone(),
    ));
    let capabilities = Arc::new(AllowListCapabilities::new(
        settings.auth.pdf_generators.clone(),
    ));

    // 5. Wire the orchestrator
    let proxy_base = Url::parse(&settings.server.public_url)?;
    let orchestrator = Arc::new(ConversionOrchestrator::new(
        renderer,
        tokens.clone(),
        storage.clone(),
        proxy_base,
    ));

    // 6. Start HTTP server
    let app = routes::app(AppComponents {
        orchestrator,
        tokens,
        storage,
        capabilities,
    });

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
