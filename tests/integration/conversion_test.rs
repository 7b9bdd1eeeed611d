// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use pagepress::application::use_cases::convert_use_case::ConversionError;
use pagepress::domain::models::conversion_request::ConversionRequest;
use pagepress::domain::repositories::storage_repository::StorageRepository;
use std::time::Duration;

use super::helpers::{page_texts, Harness, Script, INSTANCE_ID, PUBLIC_URL};

fn requests(urls: &[&str]) -> Vec<ConversionRequest> {
    urls.iter().map(|url| ConversionRequest::new(*url)).collect()
}

fn temp_dir_is_empty(dir: &std::path::Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

/// 单页转换：令牌被兑换一次、文档被保存、会话被终止
#[tokio::test]
async fn single_conversion_persists_document_and_ends_session() {
    let harness = Harness::new(vec![Script::Pages(2)]);
    let request = ConversionRequest::new("https://lms.example.com/mod/page/view.php?id=7");

    let document = harness
        .orchestrator
        .convert_single("42", &request)
        .await
        .unwrap();

    assert_eq!(document.filename, "view.pdf");
    assert_eq!(page_texts(&document.content).len(), 2);

    let jobs = harness.renderer.jobs.lock().unwrap().clone();
    assert_eq!(jobs.len(), 1);
    assert!(jobs[0]
        .proxy_url
        .starts_with(&format!("{}/convert-proxy?", PUBLIC_URL)));
    assert!(jobs[0].proxy_url.contains(&format!("instance={}", INSTANCE_ID)));

    let redemptions = harness.renderer.redemptions.lock().unwrap().clone();
    assert_eq!(redemptions.len(), 1);
    assert_eq!(redemptions[0].user_id, "42");
    assert_eq!(
        redemptions[0].target_url,
        "https://lms.example.com/mod/page/view.php?id=7"
    );

    let stored = harness.storage.fetch("view.pdf", "42").await.unwrap().unwrap();
    assert_eq!(harness.storage.read(&stored).await.unwrap(), document.content);

    assert!(harness.sessions.is_empty());
    assert_eq!(harness.tokens.live_count(), 0);
}

/// 渲染中途被取消：令牌作废，会话在后台终止
#[tokio::test]
async fn cancelled_conversion_still_ends_session() {
    let harness = Harness::new(vec![Script::Hang]);
    let request = ConversionRequest::new("https://example.com/slow");

    let result = tokio::time::timeout(
        Duration::from_millis(100),
        harness.orchestrator.convert_single("42", &request),
    )
    .await;
    assert!(result.is_err());
    assert_eq!(harness.renderer.redemptions.lock().unwrap().len(), 1);

    for _ in 0..10 {
        if harness.sessions.is_empty() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(harness.sessions.is_empty());
    assert_eq!(harness.tokens.live_count(), 0);
    assert!(harness.storage.is_empty().await);
}

#[tokio::test]
async fn keep_session_leaves_session_open() {
    let harness = Harness::new(vec![]);
    let request = ConversionRequest::new("https://example.com/a").with_keep_session(true);

    harness
        .orchestrator
        .convert_single("42", &request)
        .await
        .unwrap();

    assert_eq!(harness.sessions.len(), 1);
}

/// 同名文档重复保存时只保留最新的一份
#[tokio::test]
async fn repeated_conversion_replaces_stored_document() {
    let harness = Harness::new(vec![Script::Pages(1), Script::Pages(3)]);
    let request = ConversionRequest::new("https://example.com/report.html");

    harness
        .orchestrator
        .convert_single("42", &request)
        .await
        .unwrap();
    let second = harness
        .orchestrator
        .convert_single("42", &request)
        .await
        .unwrap();

    assert_eq!(harness.storage.len().await, 1);
    let stored = harness.storage.fetch("report.pdf", "42").await.unwrap().unwrap();
    let content = harness.storage.read(&stored).await.unwrap();
    assert_eq!(content, second.content);
    assert_eq!(page_texts(&content).len(), 3);
}

#[tokio::test]
async fn single_conversion_failure_is_wrapped() {
    let harness = Harness::new(vec![Script::Fail]);
    let request = ConversionRequest::new("https://example.com/slow");

    let err = harness
        .orchestrator
        .convert_single("42", &request)
        .await
        .unwrap_err();

    match err {
        ConversionError::ConversionFailed { cause } => {
            assert!(cause.contains("PDF render timed out after 1000ms"), "{}", cause)
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(harness.storage.is_empty().await);
    // The token was redeemed before the failure; its session is still closed.
    assert!(harness.sessions.is_empty());
    assert_eq!(harness.tokens.live_count(), 0);
}

/// 三个页面合并：页码跨文档连续，临时文件全部删除
#[tokio::test]
async fn merged_conversion_numbers_pages_across_sources() {
    let temp = tempfile::tempdir().unwrap();
    let harness = Harness::new(vec![Script::Pages(1), Script::Pages(2), Script::Pages(1)])
        .with_temp_dir(temp.path());
    let requests = requests(&[
        "https://example.com/week/1",
        "https://example.com/week/2",
        "https://example.com/week/3",
    ]);

    let document = harness
        .orchestrator
        .convert_multiple("42", &requests, "Course notes", true)
        .await
        .unwrap();

    assert_eq!(document.filename, "Course_notes.pdf");
    let texts = page_texts(&document.content);
    assert_eq!(texts.len(), 4);

    let labels = ["call1-1", "call2-1", "call2-2", "call3-1"];
    for (index, text) in texts.iter().enumerate() {
        assert!(text.contains(labels[index]), "page {} is out of order", index + 1);
        assert!(
            text.contains(&format!("(Page {} of 4)", index + 1)),
            "page {} footer missing",
            index + 1
        );
    }

    assert!(temp_dir_is_empty(temp.path()));
    assert_eq!(harness.storage.len().await, 1);
    assert!(harness
        .storage
        .fetch("Course_notes.pdf", "42")
        .await
        .unwrap()
        .is_some());
    assert_eq!(harness.renderer.redemptions.lock().unwrap().len(), 3);
    assert!(harness.sessions.is_empty());
}

#[tokio::test]
async fn merged_conversion_without_stamping_keeps_pages_plain() {
    let temp = tempfile::tempdir().unwrap();
    let harness = Harness::new(vec![Script::Pages(1), Script::Pages(1)]).with_temp_dir(temp.path());

    let document = harness
        .orchestrator
        .convert_multiple(
            "42",
            &requests(&["https://example.com/a", "https://example.com/b"]),
            "plain",
            false,
        )
        .await
        .unwrap();

    let texts = page_texts(&document.content);
    assert_eq!(texts.len(), 2);
    assert!(texts.iter().all(|text| !text.contains("Page ")));
    assert!(temp_dir_is_empty(temp.path()));
}

/// 中途渲染失败：不保存任何结果，已生成的临时文件被删除
#[tokio::test]
async fn merged_conversion_cleans_up_after_render_failure() {
    let temp = tempfile::tempdir().unwrap();
    let harness = Harness::new(vec![Script::Pages(1), Script::Fail, Script::Pages(1)])
        .with_temp_dir(temp.path());

    let err = harness
        .orchestrator
        .convert_multiple(
            "42",
            &requests(&[
                "https://example.com/1",
                "https://example.com/2",
                "https://example.com/3",
            ]),
            "course",
            true,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ConversionError::ConversionFailed { .. }));
    assert_eq!(harness.renderer.calls(), 2);
    assert!(temp_dir_is_empty(temp.path()));
    assert!(harness.storage.is_empty().await);
    assert!(harness.sessions.is_empty());
    assert_eq!(harness.tokens.live_count(), 0);
}

#[tokio::test]
async fn merged_conversion_fails_on_unreadable_source() {
    let temp = tempfile::tempdir().unwrap();
    let harness =
        Harness::new(vec![Script::Pages(1), Script::Garbage]).with_temp_dir(temp.path());

    let err = harness
        .orchestrator
        .convert_multiple(
            "42",
            &requests(&["https://example.com/1", "https://example.com/2"]),
            "course",
            false,
        )
        .await
        .unwrap_err();

    match err {
        ConversionError::ConversionFailed { cause } => {
            assert!(cause.contains("Cannot read source document"), "{}", cause)
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(temp_dir_is_empty(temp.path()));
    assert!(harness.storage.is_empty().await);
}

#[tokio::test]
async fn merged_conversion_rejects_malformed_urls_up_front() {
    let harness = Harness::new(vec![]);

    let err = harness
        .orchestrator
        .convert_multiple(
            "42",
            &requests(&["https://example.com/1", "example.com/2"]),
            "course",
            true,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ConversionError::InvalidInput(_)));
    assert_eq!(harness.renderer.calls(), 0);
}
