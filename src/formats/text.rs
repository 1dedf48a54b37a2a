//! Plain-text family: txt, md, html, css, js, py, json, csv, xml, yaml, sh.
//!
//! Generation writes the content verbatim except for a few formats where a
//! verbatim copy would be structurally wrong or unhelpful:
//!
//! | Format | Generation |
//! |---|---|
//! | `json` | pretty-printed when the content parses, otherwise verbatim |
//! | `csv` | lines split on `,`, blank lines dropped, RFC 4180 quoting |
//! | `html` | wrapped in a minimal document unless it already starts with `<` |
//! | `sh` | `#!/bin/sh` prepended when missing, executable bit set on Unix |
//!
//! Every validator first checks the file is UTF-8 without stray control
//! characters, then applies the format's parser. Python and shell sources
//! are additionally run through `python3` and `shellcheck` when those tools
//! are installed; without them only the text checks apply.

use crate::registry::{EncodeError, Generator, Validator, ValidatorError};
use crate::options::Options;
use crate::validate::{Checked, ValidationResult};
use maud::{DOCTYPE, html};
use pulldown_cmark::{Event, Parser, Tag};
use quick_xml::Reader;
use quick_xml::events::Event as XmlEvent;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::warn;

/// Writes text content, shaping it for the destination's extension.
pub struct TextGenerator;

impl Generator for TextGenerator {
    fn encode(&self, content: &str, dest: &Path, options: &Options) -> Result<PathBuf, EncodeError> {
        let ext = dest
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        let body = match ext.as_str() {
            "json" => pretty_json(content),
            "csv" => to_csv(content),
            "html" | "htm" => to_html(content, options),
            "sh" => with_shebang(content),
            _ => content.to_string(),
        };
        fs::write(dest, body)?;

        if ext == "sh" {
            make_executable(dest)?;
        }
        Ok(dest.to_path_buf())
    }
}

fn pretty_json(content: &str) -> String {
    serde_json::from_str::<serde_json::Value>(content)
        .and_then(|value| serde_json::to_string_pretty(&value))
        .map(|mut s| {
            s.push('\n');
            s
        })
        .unwrap_or_else(|_| content.to_string())
}

fn to_csv(content: &str) -> String {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            line.split(',')
                .map(|cell| quote_csv_cell(cell.trim()))
                .collect::<Vec<_>>()
                .join(",")
                + "\r\n"
        })
        .collect()
}

fn quote_csv_cell(cell: &str) -> String {
    if cell.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

fn to_html(content: &str, options: &Options) -> String {
    if content.trim_start().starts_with('<') {
        return content.to_string();
    }
    let title = options.title_for(content);
    let paragraphs: Vec<&str> = content
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (title) }
            }
            body {
                @for paragraph in &paragraphs {
                    p { (paragraph) }
                }
            }
        }
    }
    .into_string()
}

fn with_shebang(content: &str) -> String {
    if content.starts_with("#!") {
        content.to_string()
    } else {
        format!("#!/bin/sh\n{content}")
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o755);
    fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

// =========================================================================
// Shared text checks
// =========================================================================

/// Read `path` as UTF-8 text with no control characters other than
/// newline, carriage return, and tab.
pub(crate) fn checked_text(path: &Path) -> Result<Checked<String>, ValidatorError> {
    let bytes = fs::read(path)?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            return Ok(Checked::Failed(
                ValidationResult::invalid("File is not valid UTF-8 text")
                    .with_detail("offset", e.utf8_error().valid_up_to()),
            ));
        }
    };
    if let Some((position, c)) = text
        .chars()
        .enumerate()
        .find(|&(_, c)| (c as u32) < 0x20 && !matches!(c, '\n' | '\r' | '\t'))
    {
        return Ok(Checked::Failed(
            ValidationResult::invalid(format!(
                "File contains non-printable character at position {position}"
            ))
            .with_detail("position", position)
            .with_detail("character", format!("{c:?}")),
        ));
    }
    Ok(Checked::Passed(text))
}

macro_rules! text_or_return {
    ($path:expr) => {
        match $crate::formats::text::checked_text($path)? {
            $crate::validate::Checked::Passed(text) => text,
            $crate::validate::Checked::Failed(result) => return Ok(result),
        }
    };
}
pub(crate) use text_or_return;

// =========================================================================
// Validators
// =========================================================================

pub struct PlainTextValidator;

impl Validator for PlainTextValidator {
    fn check(&self, path: &Path) -> Result<ValidationResult, ValidatorError> {
        let text = text_or_return!(path);
        Ok(ValidationResult::valid("File is a valid text file")
            .with_detail("lines", text.lines().count())
            .with_detail("characters", text.chars().count()))
    }
}

pub struct JsonValidator;

impl Validator for JsonValidator {
    fn check(&self, path: &Path) -> Result<ValidationResult, ValidatorError> {
        let text = text_or_return!(path);
        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(value) => {
                let kind = match value {
                    serde_json::Value::Object(_) => "object",
                    serde_json::Value::Array(_) => "array",
                    serde_json::Value::String(_) => "string",
                    serde_json::Value::Number(_) => "number",
                    serde_json::Value::Bool(_) => "boolean",
                    serde_json::Value::Null => "null",
                };
                Ok(ValidationResult::valid("File is valid JSON").with_detail("type", kind))
            }
            Err(e) => Ok(ValidationResult::invalid(format!("Invalid JSON: {e}"))
                .with_detail("line", e.line())
                .with_detail("column", e.column())),
        }
    }
}

pub struct CsvValidator;

impl Validator for CsvValidator {
    fn check(&self, path: &Path) -> Result<ValidationResult, ValidatorError> {
        let text = text_or_return!(path);
        let rows = match parse_csv(&text) {
            Ok(rows) => rows,
            Err(e) => return Ok(ValidationResult::invalid(format!("Invalid CSV: {e}"))),
        };
        let Some(first) = rows.first() else {
            return Ok(ValidationResult::valid("File is a valid (empty) CSV").with_detail("rows", 0));
        };
        let columns = first.len();
        if let Some(row) = rows.iter().position(|r| r.len() != columns) {
            return Ok(ValidationResult::invalid(format!(
                "Inconsistent number of columns in row {}: expected {columns}, found {}",
                row + 1,
                rows[row].len()
            ))
            .with_detail("row", row + 1));
        }
        Ok(ValidationResult::valid(format!(
            "File is a valid CSV with {} rows and {columns} columns",
            rows.len()
        ))
        .with_detail("rows", rows.len())
        .with_detail("columns", columns))
    }
}

/// Quote-aware CSV parse. Blank lines are skipped.
pub(crate) fn parse_csv(text: &str) -> Result<Vec<Vec<String>>, String> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    cell.push('"');
                }
                '"' => in_quotes = false,
                _ => cell.push(c),
            }
            continue;
        }
        match c {
            '"' if cell.is_empty() => in_quotes = true,
            ',' => row.push(std::mem::take(&mut cell)),
            '\r' => {}
            '\n' => {
                row.push(std::mem::take(&mut cell));
                if !(row.len() == 1 && row[0].trim().is_empty()) {
                    rows.push(std::mem::take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => cell.push(c),
        }
    }
    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    if !cell.is_empty() || !row.is_empty() {
        row.push(cell);
        rows.push(row);
    }
    Ok(rows)
}

/// Summary of a well-formed XML document.
pub(crate) struct XmlSummary {
    pub root: String,
    pub elements: usize,
}

/// Check XML well-formedness: balanced tags and exactly one root element.
pub(crate) fn scan_xml(text: &str) -> Result<XmlSummary, String> {
    let mut reader = Reader::from_str(text);
    let mut depth = 0usize;
    let mut root: Option<String> = None;
    let mut elements = 0usize;

    loop {
        match reader.read_event() {
            Ok(XmlEvent::Start(e)) => {
                if depth == 0 {
                    if root.is_some() {
                        return Err("multiple root elements".to_string());
                    }
                    root = Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                }
                depth += 1;
                elements += 1;
            }
            Ok(XmlEvent::Empty(e)) => {
                if depth == 0 {
                    if root.is_some() {
                        return Err("multiple root elements".to_string());
                    }
                    root = Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                }
                elements += 1;
            }
            Ok(XmlEvent::End(_)) => depth = depth.saturating_sub(1),
            Ok(XmlEvent::Text(t)) if depth == 0 => {
                if !t.iter().all(u8::is_ascii_whitespace) {
                    return Err("text outside the root element".to_string());
                }
            }
            Ok(XmlEvent::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(format!("{e} at position {}", reader.buffer_position()));
            }
        }
    }

    if depth != 0 {
        return Err("unclosed element at end of document".to_string());
    }
    match root {
        Some(root) => Ok(XmlSummary { root, elements }),
        None => Err("no root element".to_string()),
    }
}

pub struct XmlValidator;

impl Validator for XmlValidator {
    fn check(&self, path: &Path) -> Result<ValidationResult, ValidatorError> {
        let text = text_or_return!(path);
        match scan_xml(&text) {
            Ok(summary) => Ok(ValidationResult::valid("File is valid XML")
                .with_detail("root", summary.root)
                .with_detail("elements", summary.elements)),
            Err(e) => Ok(ValidationResult::invalid(format!("Invalid XML: {e}"))),
        }
    }
}

pub struct YamlValidator;

impl Validator for YamlValidator {
    fn check(&self, path: &Path) -> Result<ValidationResult, ValidatorError> {
        let text = text_or_return!(path);
        match serde_yaml::from_str::<serde_yaml::Value>(&text) {
            Ok(_) => Ok(ValidationResult::valid("File is valid YAML")),
            Err(e) => Ok(ValidationResult::invalid(format!("Invalid YAML: {e}"))),
        }
    }
}

pub struct MarkdownValidator;

impl Validator for MarkdownValidator {
    fn check(&self, path: &Path) -> Result<ValidationResult, ValidatorError> {
        let text = text_or_return!(path);
        let (mut headings, mut links, mut code_blocks) = (0usize, 0usize, 0usize);
        for event in Parser::new(&text) {
            match event {
                Event::Start(Tag::Heading { .. }) => headings += 1,
                Event::Start(Tag::Link { .. }) => links += 1,
                Event::Start(Tag::CodeBlock(_)) => code_blocks += 1,
                _ => {}
            }
        }
        Ok(ValidationResult::valid(format!("Valid Markdown with {headings} headings"))
            .with_detail("headings", headings)
            .with_detail("links", links)
            .with_detail("code_blocks", code_blocks))
    }
}

pub struct HtmlValidator;

impl Validator for HtmlValidator {
    fn check(&self, path: &Path) -> Result<ValidationResult, ValidatorError> {
        let text = text_or_return!(path);
        let has_element = text
            .as_bytes()
            .windows(2)
            .any(|w| w[0] == b'<' && w[1].is_ascii_alphabetic());
        if !has_element {
            return Ok(ValidationResult::invalid("No HTML elements found"));
        }
        let lower = text.to_ascii_lowercase();
        let mut result = ValidationResult::valid("File is valid HTML")
            .with_detail("has_doctype", lower.trim_start().starts_with("<!doctype html"));
        if let Some(title) = extract_title(&text, &lower) {
            result = result.with_detail("title", title);
        }
        Ok(result)
    }
}

fn extract_title(text: &str, lower: &str) -> Option<String> {
    let open = lower.find("<title")?;
    let start = open + lower[open..].find('>')? + 1;
    let end = start + lower[start..].find("</title>")?;
    Some(text[start..end].trim().to_string())
}

/// Shell scripts: shebang and executable bit, plus `shellcheck` when it is
/// installed. Only error-severity findings make a script invalid.
pub struct ShellValidator;

impl Validator for ShellValidator {
    fn check(&self, path: &Path) -> Result<ValidationResult, ValidatorError> {
        let text = text_or_return!(path);
        let has_shebang = text.starts_with("#!");
        let executable = is_executable(path)?;

        let findings = match which::which("shellcheck") {
            Ok(shellcheck) => shellcheck_errors(&shellcheck, path)?,
            Err(_) => None,
        };
        if let Some(findings) = findings.as_ref().filter(|f| !f.is_empty()) {
            return Ok(ValidationResult::invalid(format!(
                "Shell script failed shellcheck: {}",
                findings[0]
            ))
            .with_detail("has_shebang", has_shebang)
            .with_detail("executable", executable)
            .with_detail("shellcheck", findings.clone()));
        }

        let message = if executable {
            "Valid shell script (executable)"
        } else {
            "Valid shell script (not executable)"
        };
        Ok(ValidationResult::valid(message)
            .with_detail("has_shebang", has_shebang)
            .with_detail("executable", executable)
            .with_detail("shellcheck_ran", findings.is_some()))
    }
}

/// Error-severity `shellcheck` findings as `line:column: message` strings.
/// `None` when shellcheck itself could not check the file.
fn shellcheck_errors(shellcheck: &Path, path: &Path) -> Result<Option<Vec<String>>, ValidatorError> {
    let output = Command::new(shellcheck)
        .args(["--severity=error", "--format=gcc"])
        .arg(path)
        .stdin(Stdio::null())
        .output()?;
    match output.status.code() {
        Some(0) => Ok(Some(Vec::new())),
        Some(1) => {
            let prefix = format!("{}:", path.display());
            let findings = String::from_utf8_lossy(&output.stdout)
                .lines()
                .map(|line| line.strip_prefix(&prefix).unwrap_or(line).to_string())
                .collect();
            Ok(Some(findings))
        }
        _ => {
            warn!(
                path = %path.display(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "shellcheck could not check file"
            );
            Ok(None)
        }
    }
}

/// Compiles the file without writing bytecode. A syntax error prints
/// `line<TAB>column<TAB>message` and exits 1.
const PYTHON_SYNTAX_CHECK: &str = r#"import sys
try:
    with open(sys.argv[1], "rb") as f:
        compile(f.read(), sys.argv[1], "exec", dont_inherit=True)
except SyntaxError as e:
    print(e.lineno or 0, e.offset or 0, e.msg, sep="\t")
    sys.exit(1)
"#;

/// Python sources: text checks, then a syntax check with `python3` when it
/// is on the PATH.
pub struct PythonValidator;

impl Validator for PythonValidator {
    fn check(&self, path: &Path) -> Result<ValidationResult, ValidatorError> {
        let text = text_or_return!(path);
        let lines = text.lines().count();
        let Ok(python) = which::which("python3") else {
            return Ok(ValidationResult::valid("Valid Python file")
                .with_detail("lines", lines)
                .with_detail("syntax_checked", false));
        };

        let output = Command::new(python)
            .args(["-I", "-c", PYTHON_SYNTAX_CHECK])
            .arg(path)
            .stdin(Stdio::null())
            .output()?;
        if output.status.success() {
            return Ok(ValidationResult::valid("Valid Python file")
                .with_detail("lines", lines)
                .with_detail("syntax_checked", true));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut fields = stdout.trim_end().splitn(3, '\t');
        match (fields.next(), fields.next(), fields.next()) {
            (Some(line), Some(column), Some(message)) if output.status.code() == Some(1) => {
                Ok(ValidationResult::invalid(format!("Invalid Python syntax: {message}"))
                    .with_detail("line", line.parse::<u64>().unwrap_or(0))
                    .with_detail("column", column.parse::<u64>().unwrap_or(0))
                    .with_detail("message", message))
            }
            _ => {
                warn!(
                    path = %path.display(),
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "python3 could not check file"
                );
                Ok(ValidationResult::valid("Valid Python file")
                    .with_detail("lines", lines)
                    .with_detail("syntax_checked", false))
            }
        }
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> std::io::Result<bool> {
    use std::os::unix::fs::PermissionsExt;
    Ok(fs::metadata(path)?.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> std::io::Result<bool> {
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write_file;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn encode(content: &str, name: &str) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join(name);
        let path = TextGenerator.encode(content, &dest, &Options::default()).unwrap();
        (tmp, path)
    }

    #[test]
    fn txt_is_written_verbatim() {
        let (_tmp, path) = encode("Hello", "a.txt");
        assert_eq!(fs::read_to_string(path).unwrap(), "Hello");
    }

    #[test]
    fn json_is_pretty_printed_when_valid() {
        let (_tmp, path) = encode(r#"{"a":1,"b":[true]}"#, "a.json");
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            "{\n  \"a\": 1,\n  \"b\": [\n    true\n  ]\n}\n"
        );
    }

    #[test]
    fn json_falls_back_to_raw_text() {
        let (_tmp, path) = encode("not json", "a.json");
        assert_eq!(fs::read_to_string(path).unwrap(), "not json");
    }

    #[test]
    fn csv_rows_are_requoted_and_blank_lines_dropped() {
        let (_tmp, path) = encode("name, value\n\nsay \"hi\",2\n", "a.csv");
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            "name,value\r\n\"say \"\"hi\"\"\",2\r\n"
        );
    }

    #[test]
    fn html_wraps_plain_text() {
        let (_tmp, path) = encode("Title line\n\nSecond <para>", "a.html");
        let html = fs::read_to_string(path).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Title line</title>"));
        assert!(html.contains("<p>Second &lt;para&gt;</p>"));
    }

    #[test]
    fn html_passthrough_when_already_markup() {
        let (_tmp, path) = encode("<p>hi</p>", "a.html");
        assert_eq!(fs::read_to_string(path).unwrap(), "<p>hi</p>");
    }

    #[test]
    fn shell_gets_shebang() {
        let (_tmp, path) = encode("echo hi", "a.sh");
        assert_eq!(fs::read_to_string(&path).unwrap(), "#!/bin/sh\necho hi");
        #[cfg(unix)]
        assert!(is_executable(&path).unwrap());
    }

    #[test]
    fn shell_keeps_existing_shebang() {
        let (_tmp, path) = encode("#!/bin/bash\necho hi", "a.sh");
        assert_eq!(fs::read_to_string(path).unwrap(), "#!/bin/bash\necho hi");
    }

    #[test]
    fn python_syntax_is_checked_when_interpreter_is_available() {
        let tmp = TempDir::new().unwrap();
        let good = write_file(tmp.path(), "ok.py", b"def f(x):\n    return x + 1\n");
        let bad = write_file(tmp.path(), "bad.py", b"def f(:\n    pass\n");

        let result = PythonValidator.check(&good).unwrap();
        assert!(result.is_valid, "{}", result.message);
        assert_eq!(result.message, "Valid Python file");
        assert_eq!(result.details["lines"], 2);

        let result = PythonValidator.check(&bad).unwrap();
        if which::which("python3").is_ok() {
            assert!(!result.is_valid);
            assert!(result.message.starts_with("Invalid Python syntax: "), "{}", result.message);
            assert_eq!(result.details["line"], 1);
        } else {
            assert!(result.is_valid);
            assert_eq!(result.details["syntax_checked"], false);
        }
        assert!(!tmp.path().join("__pycache__").exists());
    }

    #[test]
    fn python_validator_applies_text_checks_first() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(tmp.path(), "a.py", &[b'x', 0xff]);
        assert!(!PythonValidator.check(&path).unwrap().is_valid);
    }

    #[test]
    fn shell_syntax_errors_fail_when_shellcheck_is_available() {
        let tmp = TempDir::new().unwrap();
        let good = write_file(tmp.path(), "ok.sh", b"#!/bin/sh\necho \"hi\"\n");
        let bad = write_file(tmp.path(), "bad.sh", b"#!/bin/sh\nif true; then\n  echo hi\n");

        assert!(ShellValidator.check(&good).unwrap().is_valid);
        let result = ShellValidator.check(&bad).unwrap();
        if which::which("shellcheck").is_ok() {
            assert!(!result.is_valid);
            assert!(result.message.starts_with("Shell script failed shellcheck: "));
            assert!(result.details["shellcheck"].as_array().is_some_and(|f| !f.is_empty()));
        } else {
            assert!(result.is_valid);
            assert_eq!(result.details["shellcheck_ran"], false);
        }
    }

    #[test]
    fn plain_text_rejects_invalid_utf8() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(tmp.path(), "a.txt", &[b'o', b'k', 0xff, 0xfe]);
        let result = PlainTextValidator.check(&path).unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.details["offset"], 2);
    }

    #[test]
    fn plain_text_rejects_control_characters() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(tmp.path(), "a.txt", b"ab\x07c");
        let result = PlainTextValidator.check(&path).unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.message, "File contains non-printable character at position 2");
    }

    #[test]
    fn plain_text_allows_tabs_and_crlf() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(tmp.path(), "a.txt", b"a\tb\r\nc");
        assert!(PlainTextValidator.check(&path).unwrap().is_valid);
    }

    #[test]
    fn json_validator_reports_position() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(tmp.path(), "a.json", b"{\n  \"a\": }");
        let result = JsonValidator.check(&path).unwrap();
        assert!(!result.is_valid);
        assert!(result.message.starts_with("Invalid JSON: "));
        assert_eq!(result.details["line"], 2);
    }

    #[test]
    fn csv_validator_accepts_quoted_commas() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(tmp.path(), "a.csv", b"a,b\n\"x,y\",z\n");
        let result = CsvValidator.check(&path).unwrap();
        assert!(result.is_valid, "{}", result.message);
        assert_eq!(result.details["columns"], 2);
        assert_eq!(result.details["rows"], 2);
    }

    #[test]
    fn csv_validator_rejects_ragged_rows() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(tmp.path(), "a.csv", b"a,b\n1,2,3\n");
        let result = CsvValidator.check(&path).unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.details["row"], 2);
    }

    #[test]
    fn csv_validator_rejects_unterminated_quote() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(tmp.path(), "a.csv", b"a,\"b\n");
        assert!(!CsvValidator.check(&path).unwrap().is_valid);
    }

    #[test]
    fn xml_validator_checks_balance_and_root() {
        let tmp = TempDir::new().unwrap();
        let ok = write_file(tmp.path(), "ok.xml", b"<?xml version=\"1.0\"?><root><a/><b>t</b></root>");
        let unclosed = write_file(tmp.path(), "u.xml", b"<root><a></root>");
        let two_roots = write_file(tmp.path(), "t.xml", b"<a/><b/>");
        let no_root = write_file(tmp.path(), "n.xml", b"just text");

        let result = XmlValidator.check(&ok).unwrap();
        assert!(result.is_valid, "{}", result.message);
        assert_eq!(result.details["root"], "root");
        assert_eq!(result.details["elements"], 3);

        assert!(!XmlValidator.check(&unclosed).unwrap().is_valid);
        assert!(!XmlValidator.check(&two_roots).unwrap().is_valid);
        assert!(!XmlValidator.check(&no_root).unwrap().is_valid);
    }

    #[test]
    fn yaml_validator() {
        let tmp = TempDir::new().unwrap();
        let ok = write_file(tmp.path(), "ok.yaml", b"a: 1\nb: [x, y]\n");
        let bad = write_file(tmp.path(), "bad.yaml", b"a: [1, 2\n");
        assert!(YamlValidator.check(&ok).unwrap().is_valid);
        assert!(!YamlValidator.check(&bad).unwrap().is_valid);
    }

    #[test]
    fn markdown_validator_counts_structure() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(
            tmp.path(),
            "a.md",
            b"# One\n\n## Two\n\n[link](http://x)\n\n```\ncode\n```\n",
        );
        let result = MarkdownValidator.check(&path).unwrap();
        assert!(result.is_valid);
        assert_eq!(result.details["headings"], 2);
        assert_eq!(result.details["links"], 1);
        assert_eq!(result.details["code_blocks"], 1);
    }

    #[test]
    fn html_validator_requires_an_element() {
        let tmp = TempDir::new().unwrap();
        let ok = write_file(tmp.path(), "a.html", b"<!DOCTYPE html><html><title> T </title></html>");
        let bad = write_file(tmp.path(), "b.html", b"1 < 2 and 3 > 2");

        let result = HtmlValidator.check(&ok).unwrap();
        assert!(result.is_valid);
        assert_eq!(result.details["title"], "T");
        assert_eq!(result.details["has_doctype"], true);
        assert!(!HtmlValidator.check(&bad).unwrap().is_valid);
    }

    #[test]
    fn generated_html_validates() {
        let (_tmp, path) = encode("Just words", "a.html");
        assert!(HtmlValidator.check(&path).unwrap().is_valid);
    }
}
