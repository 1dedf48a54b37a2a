//! # fixgen
//!
//! Generate and validate test fixture files. Give it a line of text and a list of
//! extensions and it writes one well-formed file per format: text, data,
//! markup, images, archives, documents, video. Point it at a directory and it
//! checks every file's structure, optionally deleting the broken ones.
//!
//! # Architecture
//!
//! ```text
//! generate   content + ext  →  Registry → Generator  →  file
//! validate   path           →  Registry → Validator  →  ValidationResult
//! cleanup    dir            →  validate each file    →  delete invalid
//! ```
//!
//! Formats are plugged in through a [`registry::Registry`] built once from an
//! explicit registration list ([`formats::builtin_registry`]) and passed by
//! reference. There is no global state; tests build their own registries with
//! mock codecs.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`registry`] | `FormatId`, the `Generator`/`Validator` traits, registry construction and lookup |
//! | [`formats`] | Built-in codecs, one submodule per format family |
//! | [`generate`] | Generation pipeline: name the output, encode, remove partial files on failure |
//! | [`validate`] | Validation pipeline: resolve by extension, never fail, walk directories |
//! | [`cleanup`] | Validate a directory and delete (or report) invalid files |
//! | [`image_set`] | Batch image generation from a JSON icon manifest |
//! | [`layout`] | Text measurement, wrapping, placement, and a built-in bitmap font |
//! | [`options`] | The typed generation options record and color parsing |
//! | [`naming`] | Output file names and extension candidates |
//! | [`config`] | `fixgen.toml` loading, validation, and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Validation Never Fails
//!
//! [`validate::validate_file`] always returns a [`validate::ValidationResult`].
//! Missing files, unreadable files, validator errors and even validator panics
//! become negative results with a message. Batch commands therefore always
//! finish and summarize.
//!
//! ## No Partial Output
//!
//! When a generator fails, whatever it wrote at the destination is removed
//! before the error is returned. A fixture directory only ever contains files
//! a generator finished.
//!
//! ## Small Dependency Surface for Containers
//!
//! PDF, DOCX, XLSX and ODT are written directly as the minimal set of objects
//! or XML parts their readers require, on top of `zip` and `quick-xml`. Video
//! is the one format delegated to an external program (`ffmpeg`), and its
//! absence is reported as a distinct error.

pub mod cleanup;
pub mod config;
pub mod formats;
pub mod generate;
pub mod image_set;
pub mod layout;
pub mod naming;
pub mod options;
pub mod output;
pub mod registry;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;
