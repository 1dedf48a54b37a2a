//! Generation pipeline.
//!
//! Turns `(content, format)` into a file on disk through the registry:
//!
//! 1. normalize the format and resolve its generator (unsupported formats
//!    fail before anything touches the filesystem)
//! 2. create the output directory
//! 3. pick a free `{prefix}_{YYYYmmdd_HHMMSS}.{format}` path
//! 4. invoke the generator
//! 5. on failure, remove whatever the generator left at the destination
//!
//! Step 5 makes generation atomic from the caller's point of view: either a
//! complete file exists and its path is returned, or nothing exists and the
//! error carries the encoder's cause. A generator that panics is treated the
//! same as one that returns an error.

use crate::naming;
use crate::options::Options;
use crate::registry::{EncodeError, FormatId, Generator, Registry};
use crate::validate::panic_cause;
use chrono::Local;
use std::fs;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("Failed to generate {format} file: {source}")]
    Generation {
        format: FormatId,
        #[source]
        source: EncodeError,
    },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to remove partial output {path} ({source}) after: {generation}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
        generation: Box<EncodeError>,
    },
}

/// Generate one file of `format` in `out_dir`.
pub fn generate_file(
    registry: &Registry,
    content: &str,
    format: &str,
    out_dir: &Path,
    prefix: &str,
    options: &Options,
) -> Result<PathBuf, GenerateError> {
    let id = FormatId::new(format);
    let generator = registry
        .lookup_generator(id.as_str())
        .ok_or_else(|| GenerateError::UnsupportedFormat(format.trim().to_string()))?;

    fs::create_dir_all(out_dir)?;
    let stamp = naming::timestamp(&Local::now());
    let dest = naming::unique_output_path(out_dir, prefix, &stamp, id.as_str());

    generate_with(generator, &id, content, &dest, options)
}

/// Run `generator` against an explicit destination with cleanup on failure.
///
/// The image-set generator uses this directly because its file names come
/// from the config rather than from a prefix and timestamp.
pub fn generate_with(
    generator: &dyn Generator,
    format: &FormatId,
    content: &str,
    dest: &Path,
    options: &Options,
) -> Result<PathBuf, GenerateError> {
    debug!(%format, dest = %dest.display(), "generating");
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| generator.encode(content, dest, options)))
        .unwrap_or_else(|payload| {
            let cause = panic_cause(payload.as_ref(), "generator panicked");
            warn!(%format, %cause, "generator panicked");
            Err(EncodeError::Encoder(cause))
        });
    match outcome {
        Ok(path) => Ok(path),
        Err(source) => {
            if let Err(e) = remove_partial(dest) {
                warn!(path = %dest.display(), error = %e, "could not remove partial output");
                return Err(GenerateError::Cleanup {
                    path: dest.to_path_buf(),
                    source: e,
                    generation: Box::new(source),
                });
            }
            Err(GenerateError::Generation {
                format: format.clone(),
                source,
            })
        }
    }
}

fn remove_partial(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed partial output");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Run the pipeline once per format, in order, without stopping on failure.
pub fn generate_many(
    registry: &Registry,
    content: &str,
    formats: &[String],
    out_dir: &Path,
    prefix: &str,
    options: &Options,
) -> Vec<(String, Result<PathBuf, GenerateError>)> {
    formats
        .iter()
        .map(|format| {
            let result = generate_file(registry, content, format, out_dir, prefix, options);
            (format.clone(), result)
        })
        .collect()
}
