//! PDF: an A4 text document built with `lopdf`, validated by loading it back.
//!
//! The writer lays text out on A4 pages in Helvetica (one of the 14 standard
//! fonts, so nothing is embedded). Line breaking goes through the layout
//! engine with average-advance Helvetica metrics; lines that do not fit on a
//! page continue on the next one. The document title (explicit or the first
//! content line) is drawn at the top of page one and recorded in the info
//! dictionary together with the author.
//!
//! Validation keeps two cheap byte-level checks (header, `%%EOF` near the
//! end) and then parses the whole document. Cross-reference streams and
//! compressed object streams are handled by the parser, so PDF 1.5+ files
//! from other producers validate the same way ours do.

use crate::layout::{FontMetrics, measure};
use crate::options::Options;
use crate::registry::{EncodeError, Generator, Validator, ValidatorError};
use crate::validate::ValidationResult;
use chrono::Local;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use std::fs;
use std::path::{Path, PathBuf};

const PDF_VERSION: &str = "1.5";
const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 72.0;
const FONT_SIZE: f32 = 12.0;
const LEADING: f32 = 14.0;
const TITLE_SIZE: f32 = 16.0;
/// Body lines the title displaces on the first page.
const TITLE_LINES: usize = 2;

struct Helvetica {
    size: f32,
}

impl FontMetrics for Helvetica {
    fn text_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.size * 0.5
    }

    fn line_height(&self) -> f32 {
        self.size
    }
}

/// Split `content` into per-page line lists. Always at least one page.
pub fn paginate(content: &str) -> Vec<Vec<String>> {
    let layout = measure(
        content,
        &Helvetica { size: FONT_SIZE },
        Some(PAGE_WIDTH - 2.0 * MARGIN),
        LEADING - FONT_SIZE,
    );
    let per_page = ((PAGE_HEIGHT - 2.0 * MARGIN) / LEADING).floor() as usize;

    let mut pages: Vec<Vec<String>> = vec![Vec::new()];
    let mut capacity = per_page - TITLE_LINES;
    for line in layout.lines {
        if pages.last().is_some_and(|page| page.len() >= capacity) {
            pages.push(Vec::new());
            capacity = per_page;
        }
        if let Some(page) = pages.last_mut() {
            page.push(line.text);
        }
    }
    pages
}

/// Text shown with the WinAnsi-encoded base font. Non-ASCII becomes `?`.
fn shown_text(text: &str) -> Object {
    let ascii: String = text
        .chars()
        .map(|c| match c {
            ' '..='~' => c,
            '\t' => ' ',
            _ => '?',
        })
        .collect();
    Object::string_literal(ascii)
}

/// Info-dictionary text string: literal when ASCII, UTF-16BE with a BOM otherwise.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn decode_text_string(object: &Object) -> Option<String> {
    let Object::String(bytes, _) = object else {
        return None;
    };
    match bytes.strip_prefix(&[0xFE, 0xFF]) {
        Some(utf16) => {
            let units: Vec<u16> = utf16
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            Some(String::from_utf16_lossy(&units))
        }
        None => Some(String::from_utf8_lossy(bytes).into_owned()),
    }
}

fn page_operations(lines: &[String], title: Option<&str>) -> Vec<Operation> {
    let mut ops = Vec::new();
    let mut top = PAGE_HEIGHT - MARGIN;
    if let Some(title) = title {
        ops.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), TITLE_SIZE.into()]),
            Operation::new("Td", vec![MARGIN.into(), top.into()]),
            Operation::new("Tj", vec![shown_text(title)]),
            Operation::new("ET", vec![]),
        ]);
        top -= TITLE_LINES as f32 * LEADING;
    }
    if !lines.is_empty() {
        ops.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
            Operation::new("TL", vec![LEADING.into()]),
            Operation::new("Td", vec![MARGIN.into(), top.into()]),
        ]);
        for line in lines {
            ops.push(Operation::new("Tj", vec![shown_text(line)]));
            ops.push(Operation::new("T*", vec![]));
        }
        ops.push(Operation::new("ET", vec![]));
    }
    ops
}

/// Build `content` as a complete PDF document.
pub fn build_document(content: &str, options: &Options) -> Result<Document, EncodeError> {
    let pages = paginate(content);
    let title = options.title_for(content);

    let mut doc = Document::with_version(PDF_VERSION);
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for (i, lines) in pages.iter().enumerate() {
        let content = Content {
            operations: page_operations(lines, (i == 0).then_some(title.as_str())),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![Object::Integer(0), Object::Integer(0), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(info_dictionary(&title, options.author.as_deref()));
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();
    Ok(doc)
}

fn info_dictionary(title: &str, author: Option<&str>) -> Dictionary {
    let mut info = dictionary! {
        "Title" => text_string(title),
        "Producer" => Object::string_literal("fixgen"),
        "CreationDate" => Object::string_literal(format!("D:{}", Local::now().format("%Y%m%d%H%M%S"))),
    };
    if let Some(author) = author {
        info.set("Author", text_string(author));
    }
    info
}

pub struct PdfGenerator;

impl Generator for PdfGenerator {
    fn encode(&self, content: &str, dest: &Path, options: &Options) -> Result<PathBuf, EncodeError> {
        let mut doc = build_document(content, options)?;
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        fs::write(dest, bytes)?;
        Ok(dest.to_path_buf())
    }
}

// =========================================================================
// Validator
// =========================================================================

/// Media box of `page_id`, following `/Parent` links for inherited boxes.
fn media_box(doc: &Document, page_id: ObjectId) -> Option<(f32, f32)> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    // Bounded walk; a cyclic page tree must not hang validation.
    for _ in 0..32 {
        if let Ok(rect) = node.get(b"MediaBox").and_then(Object::as_array) {
            let coords: Vec<f32> = rect.iter().filter_map(|v| v.as_float().ok()).collect();
            if let [x0, y0, x1, y1] = coords[..] {
                return Some(((x1 - x0).abs(), (y1 - y0).abs()));
            }
            return None;
        }
        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn info_entry(doc: &Document, key: &[u8]) -> Option<String> {
    let info_id = doc.trailer.get(b"Info").and_then(Object::as_reference).ok()?;
    let info = doc.get_dictionary(info_id).ok()?;
    decode_text_string(info.get(key).ok()?)
}

/// Byte-level header and trailer checks, then a full parse and page count.
pub struct PdfValidator;

impl Validator for PdfValidator {
    fn check(&self, path: &Path) -> Result<ValidationResult, ValidatorError> {
        let bytes = fs::read(path)?;
        if !bytes.starts_with(b"%PDF-") {
            return Ok(ValidationResult::invalid(
                "File does not appear to be a valid PDF (missing PDF header)",
            ));
        }
        let tail = &bytes[bytes.len().saturating_sub(1024)..];
        if !tail.windows(5).any(|w| w == b"%%EOF") {
            return Ok(ValidationResult::invalid("PDF is missing EOF marker (may be corrupted)"));
        }

        let doc = match Document::load_mem(&bytes) {
            Ok(doc) => doc,
            Err(e) => return Ok(ValidationResult::invalid(format!("Invalid PDF file: {e}"))),
        };
        let pages = doc.get_pages();
        let Some(&first_page) = pages.values().next() else {
            return Ok(ValidationResult::invalid("PDF contains no pages"));
        };

        let mut message = format!("Valid PDF with {} pages", pages.len());
        let mut result = ValidationResult::valid("")
            .with_detail("version", doc.version.clone())
            .with_detail("page_count", pages.len())
            .with_detail("is_encrypted", doc.trailer.get(b"Encrypt").is_ok())
            .with_detail("size", bytes.len())
            .with_detail("validated_with", "lopdf");
        if let Some((width, height)) = media_box(&doc, first_page) {
            message.push_str(&format!(" ({width:.1}x{height:.1} points)"));
            result = result
                .with_detail("page_width", width)
                .with_detail("page_height", height);
        }
        for (key, name) in [("Title", "title"), ("Author", "author"), ("Producer", "producer")] {
            if let Some(value) = info_entry(&doc, key.as_bytes()) {
                result = result.with_detail(name, value);
            }
        }
        result.message = message;
        Ok(result)
    }
}
