//! Archives: zip, tar, tar.gz/tgz.
//!
//! Every generated archive holds the same three members derived from the
//! content:
//!
//! - `sample.txt`: the content itself
//! - `data.csv`: `name,value` header, then the first five lines as `line,index`
//! - `data.json`: `{title, content, items}` with the first line and the first
//!   three lines as items
//!
//! Validators read every member to the end before listing, so a CRC or
//! length error anywhere in the archive fails the check.

use crate::options::Options;
use crate::registry::{EncodeError, Generator, Validator, ValidatorError};
use crate::validate::{Checked, ValidationResult};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde_json::json;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Members of every generated archive, in write order.
pub fn sample_members(content: &str) -> Vec<(&'static str, String)> {
    let lines: Vec<&str> = content.lines().collect();

    let mut csv = String::from("name,value\n");
    for (i, line) in lines.iter().take(5).enumerate() {
        csv.push_str(&format!("{},{}\n", line.trim(), i));
    }

    let items: Vec<_> = lines
        .iter()
        .take(3)
        .enumerate()
        .map(|(i, line)| json!({"id": i, "text": line.trim()}))
        .collect();
    let data = json!({
        "title": "Sample Data",
        "content": lines.first().map(|l| l.trim()).unwrap_or(""),
        "items": items,
    });
    let json = serde_json::to_string_pretty(&data).unwrap_or_else(|_| "{}".to_string());

    vec![
        ("sample.txt", content.to_string()),
        ("data.csv", csv),
        ("data.json", json),
    ]
}

/// One member of a zip container.
pub(crate) struct ZipMember<'a> {
    pub name: &'a str,
    pub body: &'a [u8],
    pub stored: bool,
}

/// Write members in order into a new zip file at `dest`.
pub(crate) fn write_zip(dest: &Path, members: &[ZipMember<'_>]) -> Result<(), EncodeError> {
    let mut zip = ZipWriter::new(File::create(dest)?);
    for member in members {
        let method = if member.stored {
            CompressionMethod::Stored
        } else {
            CompressionMethod::Deflated
        };
        zip.start_file(member.name, SimpleFileOptions::default().compression_method(method))?;
        zip.write_all(member.body)?;
    }
    zip.finish()?;
    Ok(())
}

pub struct ZipGenerator;

impl Generator for ZipGenerator {
    fn encode(&self, content: &str, dest: &Path, _options: &Options) -> Result<PathBuf, EncodeError> {
        let members = sample_members(content);
        let entries: Vec<ZipMember<'_>> = members
            .iter()
            .map(|(name, body)| ZipMember {
                name: *name,
                body: body.as_bytes(),
                stored: false,
            })
            .collect();
        write_zip(dest, &entries)?;
        Ok(dest.to_path_buf())
    }
}

/// Writes `tar`, or gzip-compressed tar when the destination ends in
/// `.tar.gz` or `.tgz`.
pub struct TarGenerator;

impl Generator for TarGenerator {
    fn encode(&self, content: &str, dest: &Path, _options: &Options) -> Result<PathBuf, EncodeError> {
        let file = File::create(dest)?;
        if is_gzip_name(dest) {
            let gz = write_tar(GzEncoder::new(file, Compression::default()), content)?;
            gz.finish()?;
        } else {
            write_tar(file, content)?.flush()?;
        }
        Ok(dest.to_path_buf())
    }
}

fn write_tar<W: Write>(writer: W, content: &str) -> io::Result<W> {
    let mtime = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let mut builder = tar::Builder::new(writer);
    for (name, body) in sample_members(content) {
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(mtime);
        header.set_cksum();
        builder.append_data(&mut header, name, body.as_bytes())?;
    }
    builder.into_inner()
}

fn is_gzip_name(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    name.ends_with(".tar.gz") || name.ends_with(".tgz")
}

// =========================================================================
// Validators
// =========================================================================

#[derive(Debug, Clone)]
pub(crate) struct MemberInfo {
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
}

/// Open a zip archive and read every member to the end.
pub(crate) fn inspect_zip(path: &Path) -> Result<Checked<Vec<MemberInfo>>, ValidatorError> {
    let file = BufReader::new(File::open(path)?);
    let mut archive = match ZipArchive::new(file) {
        Ok(archive) => archive,
        Err(e) => {
            return Ok(Checked::Failed(ValidationResult::invalid(format!(
                "Invalid ZIP file: {e}"
            ))));
        }
    };
    inspect_zip_archive(&mut archive)
}

fn inspect_zip_archive<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> Result<Checked<Vec<MemberInfo>>, ValidatorError> {
    let mut members = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = match archive.by_index(i) {
            Ok(entry) => entry,
            Err(e) => {
                return Ok(Checked::Failed(ValidationResult::invalid(format!(
                    "Corrupt entry #{i} in ZIP archive: {e}"
                ))));
            }
        };
        let name = entry.name().to_string();
        if io::copy(&mut entry, &mut io::sink()).is_err() {
            return Ok(Checked::Failed(
                ValidationResult::invalid(format!("Corrupt file in ZIP archive: {name}"))
                    .with_detail("corrupt_file", name),
            ));
        }
        members.push(MemberInfo {
            size: entry.size(),
            is_dir: entry.is_dir(),
            name,
        });
    }
    Ok(Checked::Passed(members))
}

fn listing(members: &[MemberInfo]) -> serde_json::Value {
    members
        .iter()
        .map(|m| json!({"filename": m.name, "size": m.size, "is_dir": m.is_dir}))
        .collect()
}

pub struct ZipValidator;

impl Validator for ZipValidator {
    fn check(&self, path: &Path) -> Result<ValidationResult, ValidatorError> {
        let members = match inspect_zip(path)? {
            Checked::Passed(members) => members,
            Checked::Failed(result) => return Ok(result),
        };
        let total: u64 = members.iter().map(|m| m.size).sum();
        Ok(ValidationResult::valid(format!("Valid ZIP archive with {} files", members.len()))
            .with_detail("file_count", members.len())
            .with_detail("total_size", total)
            .with_detail("files", listing(&members)))
    }
}

/// Tar validator; gzip-compressed names are decompressed first.
pub struct TarValidator;

impl Validator for TarValidator {
    fn check(&self, path: &Path) -> Result<ValidationResult, ValidatorError> {
        let gzip = is_gzip_name(path);
        let file = BufReader::new(File::open(path)?);

        let members = if gzip {
            let mut magic = [0u8; 2];
            let read = File::open(path)?.read(&mut magic)?;
            if read < 2 || magic != [0x1f, 0x8b] {
                return Ok(ValidationResult::invalid("Invalid gzip file: missing gzip header"));
            }
            inspect_tar(GzDecoder::new(file))
        } else {
            inspect_tar(file)
        };

        let members = match members {
            Checked::Passed(members) => members,
            Checked::Failed(result) => return Ok(result),
        };
        let kind = if gzip { "TAR.GZ" } else { "TAR" };
        let total: u64 = members.iter().map(|m| m.size).sum();
        Ok(
            ValidationResult::valid(format!("Valid {kind} archive with {} files", members.len()))
                .with_detail("file_count", members.len())
                .with_detail("total_size", total)
                .with_detail("compressed", gzip)
                .with_detail("files", listing(&members))
                .with_detail("size", fs::metadata(path)?.len()),
        )
    }
}

fn inspect_tar<R: Read>(reader: R) -> Checked<Vec<MemberInfo>> {
    let mut archive = tar::Archive::new(reader);
    let entries = match archive.entries() {
        Ok(entries) => entries,
        Err(e) => return Checked::Failed(ValidationResult::invalid(format!("Invalid TAR file: {e}"))),
    };

    let mut members = Vec::new();
    for entry in entries {
        let mut entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                return Checked::Failed(ValidationResult::invalid(format!("Invalid TAR file: {e}")));
            }
        };
        let name = entry
            .path()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let is_dir = entry.header().entry_type().is_dir();
        let size = entry.size();
        if let Err(e) = io::copy(&mut entry, &mut io::sink()) {
            return Checked::Failed(
                ValidationResult::invalid(format!("Corrupt file in TAR archive: {name} ({e})"))
                    .with_detail("corrupt_file", name),
            );
        }
        members.push(MemberInfo { name, size, is_dir });
    }

    if members.is_empty() {
        return Checked::Failed(ValidationResult::invalid("TAR archive contains no entries"));
    }
    Checked::Passed(members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write_file;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const CONTENT: &str = "alpha\nbeta\ngamma\ndelta\nepsilon\nzeta";

    #[test]
    fn sample_members_derive_from_content() {
        let members = sample_members(CONTENT);
        let names: Vec<&str> = members.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["sample.txt", "data.csv", "data.json"]);
        assert_eq!(members[0].1, CONTENT);
        assert_eq!(
            members[1].1,
            "name,value\nalpha,0\nbeta,1\ngamma,2\ndelta,3\nepsilon,4\n"
        );

        let json: serde_json::Value = serde_json::from_str(&members[2].1).unwrap();
        assert_eq!(json["title"], "Sample Data");
        assert_eq!(json["content"], "alpha");
        assert_eq!(json["items"].as_array().unwrap().len(), 3);
        assert_eq!(json["items"][2]["text"], "gamma");
    }

    #[test]
    fn zip_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = ZipGenerator
            .encode(CONTENT, &tmp.path().join("a.zip"), &Options::default())
            .unwrap();
        let result = ZipValidator.check(&path).unwrap();
        assert!(result.is_valid, "{}", result.message);
        assert_eq!(result.message, "Valid ZIP archive with 3 files");
        assert_eq!(result.details["files"][0]["filename"], "sample.txt");
    }

    #[test]
    fn tar_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = TarGenerator
            .encode(CONTENT, &tmp.path().join("a.tar"), &Options::default())
            .unwrap();
        let result = TarValidator.check(&path).unwrap();
        assert!(result.is_valid, "{}", result.message);
        assert_eq!(result.details["compressed"], false);
        assert_eq!(result.details["file_count"], 3);
    }

    #[test]
    fn tar_gz_and_tgz_round_trip() {
        let tmp = TempDir::new().unwrap();
        for name in ["a.tar.gz", "b.tgz"] {
            let path = TarGenerator
                .encode(CONTENT, &tmp.path().join(name), &Options::default())
                .unwrap();
            let bytes = fs::read(&path).unwrap();
            assert_eq!(&bytes[..2], &[0x1f, 0x8b], "{name} should be gzip");

            let result = TarValidator.check(&path).unwrap();
            assert!(result.is_valid, "{name}: {}", result.message);
            assert_eq!(result.message, "Valid TAR.GZ archive with 3 files");
        }
    }

    #[test]
    fn zip_validator_rejects_garbage() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(tmp.path(), "a.zip", b"PK but not really a zip");
        let result = ZipValidator.check(&path).unwrap();
        assert!(!result.is_valid);
        assert!(result.message.starts_with("Invalid ZIP file: "));
    }

    #[test]
    fn zip_validator_detects_corrupted_member() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.zip");
        write_zip(
            &path,
            &[ZipMember {
                name: "stored.txt",
                body: b"hello hello hello hello",
                stored: true,
            }],
        )
        .unwrap();

        // Flip a byte inside the stored payload; the CRC no longer matches.
        let mut bytes = fs::read(&path).unwrap();
        let at = bytes.windows(5).position(|w| w == b"hello").unwrap();
        bytes[at] = b'j';
        fs::write(&path, &bytes).unwrap();

        let result = ZipValidator.check(&path).unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.details["corrupt_file"], "stored.txt");
    }

    #[test]
    fn tar_gz_validator_rejects_plain_tar() {
        let tmp = TempDir::new().unwrap();
        let tar = TarGenerator
            .encode(CONTENT, &tmp.path().join("a.tar"), &Options::default())
            .unwrap();
        let renamed = tmp.path().join("a.tar.gz");
        fs::rename(tar, &renamed).unwrap();

        let result = TarValidator.check(&renamed).unwrap();
        assert!(!result.is_valid);
        assert!(result.message.starts_with("Invalid gzip file"));
    }

    #[test]
    fn tar_validator_rejects_text() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(tmp.path(), "a.tar", b"plain text is not a tarball");
        assert!(!TarValidator.check(&path).unwrap().is_valid);
    }
}
