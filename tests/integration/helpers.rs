// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use pagepress::application::use_cases::convert_use_case::ConversionOrchestrator;
use pagepress::domain::models::access_token::Redemption;
use pagepress::domain::services::access_token_service::AccessTokenProxy;
use pagepress::domain::services::capability_service::AllowListCapabilities;
use pagepress::engines::traits::{PdfRenderer, RenderError, RenderJob};
use pagepress::infrastructure::session_store::InMemorySessionStore;
use pagepress::infrastructure::storage::InMemoryStorage;
use pagepress::presentation::routes::AppComponents;
use std::sync::{Arc, Mutex};
use url::Url;

pub const INSTANCE_ID: &str = "test-instance";
pub const PUBLIC_URL: &str = "http://127.0.0.1:3000";

/// Builds a small PDF with one labelled page per entry of `sizes`.
pub fn fixture_pdf(label: &str, sizes: &[(i64, i64)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut kids = Vec::new();
    for (index, (width, height)) in sizes.iter().enumerate() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![40.into(), 40.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::string_literal(format!("{}-{}", label, index + 1))],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), (*width).into(), (*height).into()],
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => sizes.len() as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Concatenated content of every page, in page order.
pub fn page_texts(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|id| String::from_utf8_lossy(&doc.get_page_content(*id).unwrap()).to_string())
        .collect()
}

/// What a renderer call should produce.
#[derive(Debug, Clone)]
pub enum Script {
    /// A PDF with this many letter-size pages.
    Pages(usize),
    /// Bytes that are not a PDF.
    Garbage,
    Fail,
    /// Never finishes after the token is redeemed.
    Hang,
}

/// Renderer that plays the browser's part: it follows the proxy URL by
/// redeeming the embedded token, then returns scripted output.
pub struct ScriptedRenderer {
    tokens: Arc<AccessTokenProxy>,
    script: Vec<Script>,
    pub jobs: Mutex<Vec<RenderJob>>,
    pub redemptions: Mutex<Vec<Redemption>>,
}

impl ScriptedRenderer {
    pub fn new(tokens: Arc<AccessTokenProxy>, script: Vec<Script>) -> Self {
        Self {
            tokens,
            script,
            jobs: Mutex::new(Vec::new()),
            redemptions: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }
}

#[async_trait]
impl PdfRenderer for ScriptedRenderer {
    async fn generate(&self, job: &RenderJob) -> Result<Vec<u8>, RenderError> {
        let call = {
            let mut jobs = self.jobs.lock().unwrap();
            jobs.push(job.clone());
            jobs.len()
        };

        let proxy = Url::parse(&job.proxy_url).unwrap();
        let query = |name: &str| {
            proxy
                .query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
                .unwrap()
        };
        let redemption = self
            .tokens
            .redeem(&query("key"), &query("instance"))
            .await
            .map_err(|e| RenderError::Browser(e.to_string()))?;
        self.redemptions.lock().unwrap().push(redemption);

        let step = self.script.get(call - 1).cloned().unwrap_or(Script::Pages(1));
        match step {
            Script::Pages(count) => Ok(fixture_pdf(
                &format!("call{}", call),
                &vec![(612, 792); count],
            )),
            Script::Garbage => Ok(b"<html>not a pdf</html>".to_vec()),
            Script::Fail => Err(RenderError::Timeout(1000)),
            Script::Hang => std::future::pending().await,
        }
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

pub struct Harness {
    pub tokens: Arc<AccessTokenProxy>,
    pub sessions: Arc<InMemorySessionStore>,
    pub storage: Arc<InMemoryStorage>,
    pub renderer: Arc<ScriptedRenderer>,
    pub orchestrator: Arc<ConversionOrchestrator>,
}

impl Harness {
    pub fn new(script: Vec<Script>) -> Self {
        let sessions = Arc::new(InMemorySessionStore::new());
        let tokens = Arc::new(AccessTokenProxy::new(
            sessions.clone(),
            chrono::TimeDelta::seconds(60),
            INSTANCE_ID,
        ));
        let storage = Arc::new(InMemoryStorage::new());
        let renderer = Arc::new(ScriptedRenderer::new(tokens.clone(), script));
        let orchestrator = Arc::new(ConversionOrchestrator::new(
            renderer.clone(),
            tokens.clone(),
            storage.clone(),
            Url::parse(PUBLIC_URL).unwrap(),
        ));
        Self {
            tokens,
            sessions,
            storage,
            renderer,
            orchestrator,
        }
    }

    pub fn with_temp_dir(mut self, dir: &std::path::Path) -> Self {
        let orchestrator = ConversionOrchestrator::new(
            self.renderer.clone(),
            self.tokens.clone(),
            self.storage.clone(),
            Url::parse(PUBLIC_URL).unwrap(),
        )
        .with_temp_dir(dir);
        self.orchestrator = Arc::new(orchestrator);
        self
    }

    pub fn components(&self, generators: &[&str]) -> AppComponents {
        AppComponents {
            orchestrator: self.orchestrator.clone(),
            tokens: self.tokens.clone(),
            storage: self.storage.clone(),
            capabilities: Arc::new(AllowListCapabilities::new(
                generators.iter().map(|g| g.to_string()),
            )),
        }
    }
}
