// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::models::merge_job::MergeJob;

/// Attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];
const MAX_TREE_DEPTH: usize = 32;
const US_LETTER: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

const FOOTER_FONT: &str = "PagepressFooter";
const FOOTER_FONT_SIZE: f32 = 9.0;
/// 页脚距页面右边和下边的距离（pt）
const FOOTER_MARGIN: f32 = 28.0;

/// 合并错误类型
#[derive(Error, Debug)]
pub enum AssembleError {
    /// 源文件无法作为 PDF 打开
    #[error("Cannot read source document {path}: {reason}")]
    SourceUnreadable { path: PathBuf, reason: String },
    /// 没有任何源文件
    #[error("No source documents to merge")]
    NoSources,
    /// PDF 结构错误
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 合并结果统计
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeSummary {
    pub sources: usize,
    pub pages: usize,
}

/// 文档合并器
///
/// 按顺序导入每个源 PDF 的全部页面，页面保留各自的尺寸和方向，
/// 可选地在每页添加跨整个文档连续计数的 "Page X of Y" 页脚。
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentAssembler;

impl DocumentAssembler {
    pub fn new() -> Self {
        Self
    }

    /// 执行合并并写入 `job.destination`
    ///
    /// 任一源文件无法读取时整体失败，不写出任何结果。
    pub fn merge(&self, job: &MergeJob) -> Result<MergeSummary, AssembleError> {
        if job.sources.is_empty() {
            return Err(AssembleError::NoSources);
        }

        let mut output = Document::with_version("1.7");
        let pages_id = output.new_object_id();
        let mut kids: Vec<ObjectId> = Vec::new();

        for path in &job.sources {
            let imported = import_source(&mut output, path, pages_id)?;
            debug!("Imported {} pages from {}", imported.len(), path.display());
            kids.extend(imported);
        }

        if job.stamp_page_numbers {
            let font_id = output.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => "WinAnsiEncoding",
            });
            let total = kids.len();
            for (index, page_id) in kids.iter().enumerate() {
                stamp_page_number(&mut output, *page_id, index + 1, total, font_id)?;
            }
        }

        let page_count = kids.len();
        output.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids.into_iter().map(Object::Reference).collect::<Vec<_>>(),
                "Count" => page_count as i64,
            }),
        );
        let catalog_id = output.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        output.trailer.set("Root", catalog_id);

        if let Err(e) = output.save(&job.destination) {
            discard_partial(&job.destination);
            return Err(e.into());
        }

        info!(
            "Merged {} documents ({} pages) into {}",
            job.sources.len(),
            page_count,
            job.destination.display()
        );
        Ok(MergeSummary {
            sources: job.sources.len(),
            pages: page_count,
        })
    }
}

/// Copies every object of one source into `output` and returns its page ids in page order.
fn import_source(
    output: &mut Document,
    path: &Path,
    pages_id: ObjectId,
) -> Result<Vec<ObjectId>, AssembleError> {
    let unreadable = |reason: String| AssembleError::SourceUnreadable {
        path: path.to_path_buf(),
        reason,
    };

    let mut source = Document::load(path).map_err(|e| unreadable(e.to_string()))?;
    if source.is_encrypted() {
        return Err(unreadable("document is encrypted".to_string()));
    }

    source.renumber_objects_with(output.max_id + 1);
    let page_ids: Vec<ObjectId> = source.get_pages().values().copied().collect();
    if page_ids.is_empty() {
        return Err(unreadable("document has no pages".to_string()));
    }

    // Flatten inherited attributes before the original page tree is dropped.
    let mut pages = Vec::with_capacity(page_ids.len());
    for page_id in &page_ids {
        let mut page = source
            .get_dictionary(*page_id)
            .map_err(|e| unreadable(e.to_string()))?
            .clone();
        for key in INHERITABLE {
            if !page.has(key) {
                if let Some(value) = inherited_attribute(&source, &page, key) {
                    page.set(key, value);
                }
            }
        }
        page.set("Parent", pages_id);
        pages.push((*page_id, page));
    }

    if source.max_id > output.max_id {
        output.max_id = source.max_id;
    }
    for (object_id, object) in source.objects {
        match type_of(&object) {
            Some(b"Catalog") | Some(b"Pages") | Some(b"Page") | Some(b"Outlines")
            | Some(b"Outline") => {}
            _ => {
                output.objects.insert(object_id, object);
            }
        }
    }
    for (page_id, page) in pages {
        output.objects.insert(page_id, Object::Dictionary(page));
    }

    Ok(page_ids)
}

fn type_of(object: &Object) -> Option<&[u8]> {
    match object {
        Object::Dictionary(dict) => match dict.get(b"Type") {
            Ok(Object::Name(name)) => Some(name.as_slice()),
            _ => None,
        },
        _ => None,
    }
}

fn inherited_attribute(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;
    while let Some(node_id) = parent {
        if depth >= MAX_TREE_DEPTH {
            break;
        }
        let node = doc.get_dictionary(node_id).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }
    None
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value),
        _ => None,
    }
}

/// Normalised `[llx, lly, urx, ury]` of a page rectangle such as `MediaBox`.
fn page_box(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<[f32; 4]> {
    let Some(Object::Array(values)) = page.get(key).ok().and_then(|o| resolve(doc, o)) else {
        return None;
    };
    let numbers: Vec<f32> = values.iter().filter_map(number).collect();
    if numbers.len() != 4 {
        return None;
    }
    Some([
        numbers[0].min(numbers[2]),
        numbers[1].min(numbers[3]),
        numbers[0].max(numbers[2]),
        numbers[1].max(numbers[3]),
    ])
}

fn media_box(doc: &Document, page: &Dictionary) -> [f32; 4] {
    page_box(doc, page, b"MediaBox").unwrap_or(US_LETTER)
}

/// The part of the page a viewer shows: the CropBox clipped to the MediaBox.
fn visible_box(doc: &Document, page: &Dictionary) -> [f32; 4] {
    let media = media_box(doc, page);
    let Some(crop) = page_box(doc, page, b"CropBox") else {
        return media;
    };
    let clipped = [
        crop[0].max(media[0]),
        crop[1].max(media[1]),
        crop[2].min(media[2]),
        crop[3].min(media[3]),
    ];
    if clipped[0] < clipped[2] && clipped[1] < clipped[3] {
        clipped
    } else {
        media
    }
}

/// Clockwise display rotation in degrees; anything but a multiple of 90 counts as 0.
fn rotation(doc: &Document, page: &Dictionary) -> i64 {
    match page.get(b"Rotate").ok().and_then(|o| resolve(doc, o)) {
        Some(Object::Integer(degrees)) if degrees % 90 == 0 => degrees.rem_euclid(360),
        _ => 0,
    }
}

/// Text matrix that puts a label of `width` points at the bottom-right corner
/// of the page as displayed, reading left to right.
fn footer_matrix(visible: [f32; 4], rotate: i64, width: f32) -> [f32; 6] {
    let [x0, y0, x1, y1] = visible;
    let (view_width, _) = match rotate {
        90 | 270 => (y1 - y0, x1 - x0),
        _ => (x1 - x0, y1 - y0),
    };
    let u = view_width - FOOTER_MARGIN - width;
    let v = FOOTER_MARGIN;
    match rotate {
        90 => [0.0, 1.0, -1.0, 0.0, x1 - v, y0 + u],
        180 => [-1.0, 0.0, 0.0, -1.0, x1 - u, y1 - v],
        270 => [0.0, -1.0, 1.0, 0.0, x0 + v, y1 - u],
        _ => [1.0, 0.0, 0.0, 1.0, x0 + u, y0 + v],
    }
}

/// Resolves a possibly indirect dictionary into an owned copy.
fn owned_dictionary(doc: &Document, object: Option<&Object>) -> Dictionary {
    match object.and_then(|o| resolve(doc, o)) {
        Some(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    }
}

fn stamp_page_number(
    doc: &mut Document,
    page_id: ObjectId,
    number: usize,
    total: usize,
    font_id: ObjectId,
) -> Result<(), AssembleError> {
    let page = doc.get_dictionary(page_id)?.clone();
    let label = format!("Page {} of {}", number, total);
    let matrix = footer_matrix(
        visible_box(doc, &page),
        rotation(doc, &page),
        helvetica_width(&label, FOOTER_FONT_SIZE),
    );

    let footer = Content {
        operations: vec![
            Operation::new("Q", vec![]),
            Operation::new("q", vec![]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![FOOTER_FONT.into(), FOOTER_FONT_SIZE.into()]),
            Operation::new("Tm", matrix.iter().map(|v| Object::Real(*v)).collect()),
            Operation::new("Tj", vec![Object::string_literal(label)]),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ],
    };
    // The page's own content runs inside q ... Q so the footer starts from a clean state.
    let save_id = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
    let footer_id = doc.add_object(Stream::new(dictionary! {}, footer.encode()?));

    let mut contents = vec![Object::Reference(save_id)];
    match page.get(b"Contents") {
        Ok(Object::Array(existing)) => contents.extend(existing.iter().cloned()),
        Ok(existing @ Object::Reference(_)) => contents.push(existing.clone()),
        _ => {}
    }
    contents.push(Object::Reference(footer_id));

    let mut resources = owned_dictionary(doc, page.get(b"Resources").ok());
    let mut fonts = owned_dictionary(doc, resources.get(b"Font").ok());
    fonts.set(FOOTER_FONT, font_id);
    resources.set("Font", fonts);

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page.set("Contents", contents);
    page.set("Resources", resources);
    Ok(())
}

/// Text width in points using the standard Helvetica metrics.
fn helvetica_width(text: &str, size: f32) -> f32 {
    let units: u32 = text
        .chars()
        .map(|c| match c {
            ' ' | 'f' | 'i' | 'j' | 'l' | 't' => 278,
            'r' => 333,
            'P' => 667,
            'O' => 778,
            _ => 556,
        })
        .sum();
    units as f32 * size / 1000.0
}

fn discard_partial(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove partial merge output {}: {}", path.display(), e);
        }
    }
}
