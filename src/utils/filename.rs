// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

const DEFAULT_STEM: &str = "document";
const MAX_STEM_LEN: usize = 120;

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("Failed to compile filename regex"));

/// 解析输出文件名
///
/// 优先使用调用方给出的文件名，否则取目标URL路径的最后一段并去掉扩展名。
/// 结果只包含安全字符，并总是以 `.pdf` 结尾。
pub fn resolve_filename(explicit: Option<&str>, target_url: &str) -> String {
    let stem = match explicit.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => strip_pdf_extension(name).to_string(),
        None => last_segment(target_url)
            .map(|segment| strip_extension(&segment).to_string())
            .unwrap_or_default(),
    };
    format!("{}.pdf", sanitize_stem(&stem))
}

/// 把文件名清理为可直接用作存储键的形式
pub fn sanitize_stem(stem: &str) -> String {
    let cleaned = UNSAFE_CHARS.replace_all(stem, "_");
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_' || c == '-');
    if cleaned.is_empty() {
        return DEFAULT_STEM.to_string();
    }
    cleaned.chars().take(MAX_STEM_LEN).collect()
}

fn last_segment(target_url: &str) -> Option<String> {
    let url = Url::parse(target_url).ok()?;
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(str::to_string)
}

fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

fn strip_pdf_extension(name: &str) -> &str {
    let len = name.len();
    if len > 4 && name.is_char_boundary(len - 4) && name[len - 4..].eq_ignore_ascii_case(".pdf") {
        &name[..len - 4]
    } else {
        name
    }
}
