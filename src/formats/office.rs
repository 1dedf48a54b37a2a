//! Office documents: docx, xlsx, odt (generated) and pptx, ods, odp
//! (validated only).
//!
//! All of these are zip containers of XML parts. Generation writes the
//! smallest part set each application opens without repair; validation
//! checks zip integrity and then the mandatory entries:
//!
//! | Format | Required entries |
//! |---|---|
//! | docx | `[Content_Types].xml`, `word/document.xml` |
//! | xlsx | `[Content_Types].xml`, `xl/workbook.xml` |
//! | pptx | `[Content_Types].xml`, `ppt/presentation.xml` |
//! | odt, ods, odp | `mimetype` (matching the format), `content.xml` |

use crate::formats::archive::{ZipMember, inspect_zip, write_zip};
use crate::options::Options;
use crate::registry::{EncodeError, Generator, Validator, ValidatorError};
use crate::validate::{Checked, ValidationResult};
use chrono::Utc;
use quick_xml::escape::escape;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

fn xml_text(text: &str) -> String {
    escape(text).into_owned()
}

fn paragraphs(content: &str) -> Vec<&str> {
    content.lines().collect()
}

// =========================================================================
// docx
// =========================================================================

pub struct DocxGenerator;

impl Generator for DocxGenerator {
    fn encode(&self, content: &str, dest: &Path, options: &Options) -> Result<PathBuf, EncodeError> {
        let content_types = format!(
            r#"{XML_DECL}
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
</Types>"#
        );
        let rels = format!(
            r#"{XML_DECL}
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
</Relationships>"#
        );

        let mut body = String::new();
        if let Some(title) = &options.title {
            body.push_str(&format!(
                r#"<w:p><w:pPr><w:pStyle w:val="Title"/></w:pPr><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
                xml_text(title)
            ));
        }
        for line in paragraphs(content) {
            body.push_str(&format!(
                r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
                xml_text(line)
            ));
        }
        let document = format!(
            r#"{XML_DECL}
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );

        let core = core_properties(&options.title_for(content), options.author.as_deref());
        write_zip(
            dest,
            &[
                member("[Content_Types].xml", &content_types),
                member("_rels/.rels", &rels),
                member("word/document.xml", &document),
                member("docProps/core.xml", &core),
            ],
        )?;
        Ok(dest.to_path_buf())
    }
}

fn member<'a>(name: &'a str, body: &'a str) -> ZipMember<'a> {
    ZipMember {
        name,
        body: body.as_bytes(),
        stored: false,
    }
}

fn core_properties(title: &str, author: Option<&str>) -> String {
    let now = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    let creator = author
        .map(|a| format!("<dc:creator>{}</dc:creator>", xml_text(a)))
        .unwrap_or_default();
    format!(
        r#"{XML_DECL}
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>{}</dc:title>{creator}<dcterms:created xsi:type="dcterms:W3CDTF">{now}</dcterms:created></cp:coreProperties>"#,
        xml_text(title)
    )
}

// =========================================================================
// xlsx
// =========================================================================

/// Column reference for a 1-based index: 1 → `A`, 27 → `AA`.
pub fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    while index > 0 {
        let rem = (index - 1) % 26;
        name.push(b'A' + rem as u8);
        index = (index - 1) / 26;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

/// Excel sheet names: at most 31 characters, none of `[]:*?/\`.
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if "[]:*?/\\".contains(c) { '_' } else { c })
        .take(31)
        .collect();
    if cleaned.trim().is_empty() {
        "Sheet1".to_string()
    } else {
        cleaned
    }
}

/// Tab-separated rows of the content, blank lines skipped.
fn table(content: &str) -> Vec<Vec<&str>> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.split('\t').collect())
        .collect()
}

pub struct XlsxGenerator;

impl Generator for XlsxGenerator {
    fn encode(&self, content: &str, dest: &Path, options: &Options) -> Result<PathBuf, EncodeError> {
        let rows = table(content);
        let sheet_name = sanitize_sheet_name(&options.sheet_name);

        let content_types = format!(
            r#"{XML_DECL}
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#
        );
        let rels = format!(
            r#"{XML_DECL}
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#
        );
        let workbook = format!(
            r#"{XML_DECL}
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
            xml_text(&sheet_name)
        );
        let workbook_rels = format!(
            r#"{XML_DECL}
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#
        );
        let sheet = worksheet(&rows, options.auto_adjust_columns);

        write_zip(
            dest,
            &[
                member("[Content_Types].xml", &content_types),
                member("_rels/.rels", &rels),
                member("xl/workbook.xml", &workbook),
                member("xl/_rels/workbook.xml.rels", &workbook_rels),
                member("xl/worksheets/sheet1.xml", &sheet),
            ],
        )?;
        Ok(dest.to_path_buf())
    }
}

fn worksheet(rows: &[Vec<&str>], auto_adjust_columns: bool) -> String {
    let mut xml = format!(
        r#"{XML_DECL}
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#
    );

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if auto_adjust_columns && columns > 0 {
        xml.push_str("<cols>");
        for col in 0..columns {
            let longest = rows
                .iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0);
            let width = (longest + 2).min(50);
            xml.push_str(&format!(
                r#"<col min="{n}" max="{n}" width="{width}" customWidth="1"/>"#,
                n = col + 1
            ));
        }
        xml.push_str("</cols>");
    }

    xml.push_str("<sheetData>");
    for (r, row) in rows.iter().enumerate() {
        xml.push_str(&format!(r#"<row r="{}">"#, r + 1));
        for (c, cell) in row.iter().enumerate() {
            xml.push_str(&format!(
                r#"<c r="{}{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                column_name(c + 1),
                r + 1,
                xml_text(cell)
            ));
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

// =========================================================================
// odt
// =========================================================================

const ODT_MIMETYPE: &str = "application/vnd.oasis.opendocument.text";

pub struct OdtGenerator;

impl Generator for OdtGenerator {
    fn encode(&self, content: &str, dest: &Path, options: &Options) -> Result<PathBuf, EncodeError> {
        let manifest = format!(
            r#"{XML_DECL}
<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0" manifest:version="1.2">
<manifest:file-entry manifest:full-path="/" manifest:media-type="{ODT_MIMETYPE}"/>
<manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/>
<manifest:file-entry manifest:full-path="meta.xml" manifest:media-type="text/xml"/>
</manifest:manifest>"#
        );

        let body: String = paragraphs(content)
            .into_iter()
            .map(|line| format!("<text:p>{}</text:p>", xml_text(line)))
            .collect();
        let content_xml = format!(
            r#"{XML_DECL}
<office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" office:version="1.2"><office:body><office:text>{body}</office:text></office:body></office:document-content>"#
        );

        let title = options.title_for(content);
        let creator = options
            .author
            .as_deref()
            .map(|a| format!("<dc:creator>{}</dc:creator>", xml_text(a)))
            .unwrap_or_default();
        let meta = format!(
            r#"{XML_DECL}
<office:document-meta xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:meta="urn:oasis:names:tc:opendocument:xmlns:meta:1.0" office:version="1.2"><office:meta><dc:title>{}</dc:title>{creator}<meta:generator>fixgen</meta:generator></office:meta></office:document-meta>"#,
            xml_text(&title)
        );

        write_zip(
            dest,
            &[
                ZipMember {
                    name: "mimetype",
                    body: ODT_MIMETYPE.as_bytes(),
                    stored: true,
                },
                member("META-INF/manifest.xml", &manifest),
                member("content.xml", &content_xml),
                member("meta.xml", &meta),
            ],
        )?;
        Ok(dest.to_path_buf())
    }
}

// =========================================================================
// Validator
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfficeKind {
    Docx,
    Xlsx,
    Pptx,
    Odt,
    Ods,
    Odp,
}

impl OfficeKind {
    fn label(self) -> &'static str {
        match self {
            OfficeKind::Docx => "DOCX",
            OfficeKind::Xlsx => "XLSX",
            OfficeKind::Pptx => "PPTX",
            OfficeKind::Odt => "ODT",
            OfficeKind::Ods => "ODS",
            OfficeKind::Odp => "ODP",
        }
    }

    fn required_entries(self) -> &'static [&'static str] {
        match self {
            OfficeKind::Docx => &["[Content_Types].xml", "word/document.xml"],
            OfficeKind::Xlsx => &["[Content_Types].xml", "xl/workbook.xml"],
            OfficeKind::Pptx => &["[Content_Types].xml", "ppt/presentation.xml"],
            OfficeKind::Odt | OfficeKind::Ods | OfficeKind::Odp => &["mimetype", "content.xml"],
        }
    }

    /// Expected `mimetype` entry for OpenDocument formats.
    fn odf_mimetype(self) -> Option<&'static str> {
        match self {
            OfficeKind::Odt => Some(ODT_MIMETYPE),
            OfficeKind::Ods => Some("application/vnd.oasis.opendocument.spreadsheet"),
            OfficeKind::Odp => Some("application/vnd.oasis.opendocument.presentation"),
            _ => None,
        }
    }
}

pub struct OfficeValidator {
    kind: OfficeKind,
}

impl OfficeValidator {
    pub fn new(kind: OfficeKind) -> Self {
        Self { kind }
    }
}

impl Validator for OfficeValidator {
    fn check(&self, path: &Path) -> Result<ValidationResult, ValidatorError> {
        let label = self.kind.label();
        let members = match inspect_zip(path)? {
            Checked::Passed(members) => members,
            Checked::Failed(result) => {
                return Ok(ValidationResult::invalid(format!(
                    "Invalid {label} file: {}",
                    result.message
                )));
            }
        };

        for required in self.kind.required_entries() {
            if !members.iter().any(|m| m.name.eq_ignore_ascii_case(required)) {
                return Ok(ValidationResult::invalid(format!(
                    "Missing required file in {label} archive: {required}"
                ))
                .with_detail("missing", *required));
            }
        }

        if let Some(expected) = self.kind.odf_mimetype() {
            let found = read_member(path, "mimetype")?;
            if found.trim() != expected {
                return Ok(ValidationResult::invalid(format!(
                    "Unexpected mimetype in {label} archive: {}",
                    found.trim()
                )));
            }
        }

        Ok(ValidationResult::valid(format!("Valid {label} document"))
            .with_detail("entries", members.len()))
    }
}

fn read_member(path: &Path, name: &str) -> Result<String, ValidatorError> {
    let mut archive = ZipArchive::new(BufReader::new(File::open(path)?))
        .map_err(|e| ValidatorError::Parse(e.to_string()))?;
    let mut entry = archive
        .by_name(name)
        .map_err(|e| ValidatorError::Parse(e.to_string()))?;
    let mut text = String::new();
    entry.read_to_string(&mut text)?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::text::scan_xml;
    use crate::test_helpers::write_file;
    use tempfile::TempDir;

    const CONTENT: &str = "Quarterly report\nname\tvalue\nwidgets & gadgets\t<42>";

    fn generate(generator: &dyn Generator, name: &str, options: &Options) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let path = generator
            .encode(CONTENT, &tmp.path().join(name), options)
            .unwrap();
        (tmp, path)
    }

    #[test]
    fn column_names() {
        assert_eq!(column_name(1), "A");
        assert_eq!(column_name(26), "Z");
        assert_eq!(column_name(27), "AA");
        assert_eq!(column_name(703), "AAA");
    }

    #[test]
    fn sheet_names_are_sanitized() {
        assert_eq!(sanitize_sheet_name("Q1/Q2 [draft]"), "Q1_Q2 _draft_");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40)).len(), 31);
        assert_eq!(sanitize_sheet_name("  "), "Sheet1");
    }

    #[test]
    fn docx_round_trip() {
        let (_tmp, path) = generate(&DocxGenerator, "a.docx", &Options::default());
        let result = OfficeValidator::new(OfficeKind::Docx).check(&path).unwrap();
        assert!(result.is_valid, "{}", result.message);

        let document = read_member(&path, "word/document.xml").unwrap();
        assert!(scan_xml(&document).is_ok());
        assert!(document.contains("widgets &amp; gadgets"));
    }

    #[test]
    fn xlsx_round_trip_with_sheet_name_and_widths() {
        let options = Options {
            sheet_name: "Data".into(),
            ..Options::default()
        };
        let (_tmp, path) = generate(&XlsxGenerator, "a.xlsx", &options);
        let result = OfficeValidator::new(OfficeKind::Xlsx).check(&path).unwrap();
        assert!(result.is_valid, "{}", result.message);

        let workbook = read_member(&path, "xl/workbook.xml").unwrap();
        assert!(workbook.contains(r#"name="Data""#));
        let sheet = read_member(&path, "xl/worksheets/sheet1.xml").unwrap();
        assert!(scan_xml(&sheet).is_ok());
        assert!(sheet.contains(r#"<c r="B3" t="inlineStr">"#));
        assert!(sheet.contains("<cols>"));
    }

    #[test]
    fn xlsx_without_column_adjustment() {
        let options = Options {
            auto_adjust_columns: false,
            ..Options::default()
        };
        let (_tmp, path) = generate(&XlsxGenerator, "a.xlsx", &options);
        let sheet = read_member(&path, "xl/worksheets/sheet1.xml").unwrap();
        assert!(!sheet.contains("<cols>"));
    }

    #[test]
    fn odt_round_trip_stores_mimetype_first() {
        let (_tmp, path) = generate(&OdtGenerator, "a.odt", &Options::default());
        let result = OfficeValidator::new(OfficeKind::Odt).check(&path).unwrap();
        assert!(result.is_valid, "{}", result.message);

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[30..38], b"mimetype");
    }

    #[test]
    fn docx_validator_rejects_plain_zip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.docx");
        write_zip(&path, &[member("readme.txt", "hi")]).unwrap();
        let result = OfficeValidator::new(OfficeKind::Docx).check(&path).unwrap();
        assert!(!result.is_valid);
        assert_eq!(
            result.message,
            "Missing required file in DOCX archive: [Content_Types].xml"
        );
    }

    #[test]
    fn odt_validated_as_ods_has_wrong_mimetype() {
        let (_tmp, path) = generate(&OdtGenerator, "a.odt", &Options::default());
        let result = OfficeValidator::new(OfficeKind::Ods).check(&path).unwrap();
        assert!(!result.is_valid);
        assert!(result.message.starts_with("Unexpected mimetype"));
    }

    #[test]
    fn not_a_zip_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(tmp.path(), "a.pptx", b"plain text");
        let result = OfficeValidator::new(OfficeKind::Pptx).check(&path).unwrap();
        assert!(!result.is_valid);
        assert!(result.message.starts_with("Invalid PPTX file: "));
    }
}
