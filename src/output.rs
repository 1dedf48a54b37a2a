//! CLI output formatting for every command.
//!
//! # Output Format
//!
//! ## Generate
//!
//! ```text
//! Generated: out/generated_20240131_142501.txt
//! Error generating mp4 file: Failed to generate mp4 file: Required tool not found on PATH: ffmpeg
//!
//! Successfully generated files:
//! - out/generated_20240131_142501.txt
//! ```
//!
//! ## Validate
//!
//! ```text
//! fixtures/a.png: ✅ Valid PNG image: 400x200 pixels
//! fixtures/b.json: ❌ Invalid JSON: expected value at line 1 column 1
//! ```
//!
//! With `--verbose`, each result is followed by its details as indented
//! JSON. With `--json`, the whole map is printed as one JSON object instead.
//!
//! ## Cleanup
//!
//! ```text
//! The following invalid files were deleted:
//! - fixtures/b.json: ❌ Invalid JSON: ... (deleted)
//!
//! Summary:
//!   Total files: 2
//!   Valid: 1
//!   Invalid: 1
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O and no side effects.

use crate::cleanup::{CleanupAction, CleanupReport};
use crate::generate::GenerateError;
use crate::image_set::ImageSetReport;
use crate::registry::Registry;
use crate::validate::ValidationResult;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn status_icon(result: &ValidationResult) -> &'static str {
    if result.is_valid { "✅" } else { "❌" }
}

/// Pretty JSON of the details, one line per entry, indented under the result.
fn detail_lines(result: &ValidationResult, depth: usize) -> Vec<String> {
    if result.details.is_empty() {
        return Vec::new();
    }
    let json = serde_json::to_string_pretty(&result.details).unwrap_or_default();
    json.lines()
        .map(|line| format!("{}{line}", indent(depth)))
        .collect()
}

// ============================================================================
// Generate
// ============================================================================

pub fn format_generate_output(results: &[(String, Result<PathBuf, GenerateError>)]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut generated = Vec::new();

    for (ext, result) in results {
        match result {
            Ok(path) => {
                lines.push(format!("Generated: {}", path.display()));
                generated.push(path);
            }
            Err(e) => lines.push(format!("Error generating {ext} file: {e}")),
        }
    }

    if generated.is_empty() {
        lines.push("No files were generated.".to_string());
    } else {
        lines.push(String::new());
        lines.push("Successfully generated files:".to_string());
        lines.extend(generated.iter().map(|p| format!("- {}", p.display())));
    }
    lines
}

pub fn print_generate_output(results: &[(String, Result<PathBuf, GenerateError>)]) {
    for line in format_generate_output(results) {
        println!("{}", line);
    }
}

// ============================================================================
// Validate
// ============================================================================

/// One result: status icon and message, then details when `verbose`.
pub fn format_validation_result(result: &ValidationResult, verbose: bool) -> Vec<String> {
    let mut lines = vec![format!("{} {}", status_icon(result), result.message)];
    if verbose {
        lines.extend(detail_lines(result, 1));
    }
    lines
}

fn labelled_result(prefix: &str, path: &Path, result: &ValidationResult, verbose: bool) -> Vec<String> {
    let mut lines = format_validation_result(result, verbose);
    if let Some(first) = lines.first_mut() {
        *first = format!("{prefix}{}: {first}", path.display());
    }
    lines
}

pub fn format_validate_output(
    results: &BTreeMap<PathBuf, ValidationResult>,
    verbose: bool,
) -> Vec<String> {
    if results.is_empty() {
        return vec!["No files found to validate.".to_string()];
    }
    results
        .iter()
        .flat_map(|(path, result)| labelled_result("", path, result, verbose))
        .collect()
}

pub fn print_validate_output(results: &BTreeMap<PathBuf, ValidationResult>, verbose: bool) {
    for line in format_validate_output(results, verbose) {
        println!("{}", line);
    }
}

/// The whole result map as a pretty JSON object keyed by path.
pub fn validate_json(results: &BTreeMap<PathBuf, ValidationResult>) -> Result<String, serde_json::Error> {
    let keyed: BTreeMap<String, &ValidationResult> = results
        .iter()
        .map(|(path, result)| (path.display().to_string(), result))
        .collect();
    serde_json::to_string_pretty(&keyed)
}

// ============================================================================
// Cleanup
// ============================================================================

pub fn format_cleanup_output(report: &CleanupReport, dry_run: bool, verbose: bool) -> Vec<String> {
    let mut lines = Vec::new();
    if dry_run {
        lines.push("Dry run mode - no files will be deleted".to_string());
        lines.push(String::new());
    }
    if report.entries.is_empty() {
        lines.push("No files found to validate.".to_string());
        return lines;
    }

    let (valid, invalid): (Vec<_>, Vec<_>) =
        report.entries.iter().partition(|(_, e)| e.result.is_valid);

    if invalid.is_empty() {
        lines.push("No invalid files found.".to_string());
    } else {
        lines.push(if dry_run {
            "The following files are invalid and would be deleted:".to_string()
        } else {
            "The following invalid files were deleted:".to_string()
        });
        for (path, entry) in &invalid {
            lines.extend(labelled_result("- ", path, &entry.result, verbose));
        }
    }

    if verbose && !valid.is_empty() {
        lines.push(String::new());
        lines.push("The following files are valid:".to_string());
        for (path, entry) in &valid {
            lines.extend(labelled_result("- ", path, &entry.result, verbose));
        }
    }

    lines.push(String::new());
    lines.push("Summary:".to_string());
    lines.push(format!("  Total files: {}", report.total()));
    lines.push(format!("  Valid: {}", report.valid()));
    lines.push(format!("  Invalid: {}", report.invalid()));

    if dry_run {
        lines.push(String::new());
        lines.push("Run without --dry-run to actually delete invalid files.".to_string());
    } else {
        if report.deleted() > 0 {
            lines.push(String::new());
            lines.push(format!("Successfully removed {} invalid files.", report.deleted()));
        }
        if report.failed() > 0 {
            lines.push(format!("Failed to remove {} files:", report.failed()));
            for (path, entry) in &invalid {
                if let CleanupAction::DeleteFailed(reason) = &entry.action {
                    lines.push(format!("{}{}: {reason}", indent(1), path.display()));
                }
            }
        }
    }
    lines
}

pub fn print_cleanup_output(report: &CleanupReport, dry_run: bool, verbose: bool) {
    for line in format_cleanup_output(report, dry_run, verbose) {
        println!("{}", line);
    }
}

// ============================================================================
// Image set
// ============================================================================

pub fn format_image_set_output(report: &ImageSetReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .generated
        .iter()
        .map(|p| format!("Generated: {}", p.display()))
        .collect();
    for (src, e) in &report.failures {
        lines.push(format!("Error generating {src}: {e}"));
    }
    lines.push(format!(
        "Generated {} images, {} failed",
        report.generated.len(),
        report.failures.len()
    ));
    lines
}

pub fn print_image_set_output(report: &ImageSetReport) {
    for line in format_image_set_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// List
// ============================================================================

pub fn format_extension_list(registry: &Registry) -> Vec<String> {
    let generated = registry.supported_extensions();
    let validate_only: Vec<_> = registry
        .validated_extensions()
        .into_iter()
        .filter(|id| !registry.is_supported(id.as_str()))
        .collect();

    let mut lines = vec!["Generate:".to_string()];
    lines.extend(generated.iter().map(|id| format!("{}{id}", indent(1))));
    if !validate_only.is_empty() {
        lines.push(String::new());
        lines.push("Validate only:".to_string());
        lines.extend(validate_only.iter().map(|id| format!("{}{id}", indent(1))));
    }
    lines
}

pub fn print_extension_list(registry: &Registry) {
    for line in format_extension_list(registry) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanup::CleanupEntry;
    use crate::image_set::ImageSetError;
    use crate::registry::{EncodeError, FormatId, Registration};
    use crate::test_helpers::{always_valid, registry_of, write_verbatim};
    use pretty_assertions::assert_eq;

    fn entry(valid: bool, message: &str, action: CleanupAction) -> CleanupEntry {
        let result = if valid {
            ValidationResult::valid(message)
        } else {
            ValidationResult::invalid(message)
        };
        CleanupEntry { result, action }
    }

    #[test]
    fn generate_output_lists_successes_and_failures() {
        let results = vec![
            ("txt".to_string(), Ok(PathBuf::from("out/a.txt"))),
            (
                "zzz".to_string(),
                Err(GenerateError::UnsupportedFormat("zzz".into())),
            ),
        ];
        assert_eq!(
            format_generate_output(&results),
            vec![
                "Generated: out/a.txt",
                "Error generating zzz file: Unsupported file format: zzz",
                "",
                "Successfully generated files:",
                "- out/a.txt",
            ]
        );
    }

    #[test]
    fn generate_output_with_nothing_generated() {
        let results = vec![(
            "pdf".to_string(),
            Err(GenerateError::Generation {
                format: FormatId::new("pdf"),
                source: EncodeError::Encoder("boom".into()),
            }),
        )];
        let lines = format_generate_output(&results);
        assert_eq!(lines.last().map(String::as_str), Some("No files were generated."));
    }

    #[test]
    fn validation_result_details_only_when_verbose() {
        let result = ValidationResult::valid("Valid PNG image: 4x4 pixels").with_detail("width", 4);
        assert_eq!(
            format_validation_result(&result, false),
            vec!["✅ Valid PNG image: 4x4 pixels"]
        );
        assert_eq!(
            format_validation_result(&result, true),
            vec!["✅ Valid PNG image: 4x4 pixels", "    {", "      \"width\": 4", "    }"]
        );
    }

    #[test]
    fn validate_output_prefixes_paths() {
        let mut results = BTreeMap::new();
        results.insert(PathBuf::from("b.json"), ValidationResult::invalid("Invalid JSON"));
        results.insert(PathBuf::from("a.txt"), ValidationResult::valid("ok"));
        assert_eq!(
            format_validate_output(&results, false),
            vec!["a.txt: ✅ ok", "b.json: ❌ Invalid JSON"]
        );
        assert_eq!(
            format_validate_output(&BTreeMap::new(), false),
            vec!["No files found to validate."]
        );
    }

    #[test]
    fn validate_json_is_keyed_by_path() {
        let mut results = BTreeMap::new();
        results.insert(PathBuf::from("a.txt"), ValidationResult::valid("ok"));
        let value: serde_json::Value = serde_json::from_str(&validate_json(&results).unwrap()).unwrap();
        assert_eq!(value["a.txt"]["is_valid"], true);
        assert_eq!(value["a.txt"]["message"], "ok");
        assert!(value["a.txt"]["details"].is_object());
    }

    #[test]
    fn cleanup_output_summarizes() {
        let mut report = CleanupReport::default();
        report
            .entries
            .insert(PathBuf::from("good.txt"), entry(true, "ok", CleanupAction::Kept));
        report.entries.insert(
            PathBuf::from("bad.json"),
            entry(false, "Invalid JSON (deleted)", CleanupAction::Deleted),
        );
        assert_eq!(
            format_cleanup_output(&report, false, false),
            vec![
                "The following invalid files were deleted:",
                "- bad.json: ❌ Invalid JSON (deleted)",
                "",
                "Summary:",
                "  Total files: 2",
                "  Valid: 1",
                "  Invalid: 1",
                "",
                "Successfully removed 1 invalid files.",
            ]
        );
    }

    #[test]
    fn cleanup_output_dry_run_and_verbose() {
        let mut report = CleanupReport::default();
        report
            .entries
            .insert(PathBuf::from("good.txt"), entry(true, "ok", CleanupAction::Kept));
        let lines = format_cleanup_output(&report, true, true);
        assert_eq!(lines[0], "Dry run mode - no files will be deleted");
        assert!(lines.contains(&"No invalid files found.".to_string()));
        assert!(lines.contains(&"- good.txt: ✅ ok".to_string()));
        assert_eq!(
            lines.last().map(String::as_str),
            Some("Run without --dry-run to actually delete invalid files.")
        );
    }

    #[test]
    fn cleanup_output_reports_failed_deletions() {
        let mut report = CleanupReport::default();
        report.entries.insert(
            PathBuf::from("locked.bin"),
            entry(
                false,
                "File is empty (failed to delete: denied)",
                CleanupAction::DeleteFailed("denied".into()),
            ),
        );
        let lines = format_cleanup_output(&report, false, false);
        assert!(lines.contains(&"Failed to remove 1 files:".to_string()));
        assert!(lines.contains(&"    locked.bin: denied".to_string()));
    }

    #[test]
    fn image_set_output_counts() {
        let report = ImageSetReport {
            generated: vec![PathBuf::from("icons/a.png")],
            failures: vec![("b.png".into(), ImageSetError::InvalidSize("big".into()))],
        };
        assert_eq!(
            format_image_set_output(&report),
            vec![
                "Generated: icons/a.png",
                "Error generating b.png: Invalid size 'big', expected WxH with sides 1-8192",
                "Generated 1 images, 1 failed",
            ]
        );
    }

    #[test]
    fn extension_list_separates_validate_only() {
        let registry = registry_of([
            Registration::new(&["txt"], write_verbatim),
            Registration::validator_only(&["pptx"], always_valid),
        ]);
        assert_eq!(
            format_extension_list(&registry),
            vec!["Generate:", "    txt", "", "Validate only:", "    pptx"]
        );
    }
}
