//! Codec registry: format identifiers mapped to generators and validators.
//!
//! The registry is the single lookup table shared by the generation,
//! validation, and cleanup pipelines. It is built exactly once from an
//! explicit, ordered list of [`Registration`]s and is immutable afterwards:
//! there is no way to add or remove an entry from a built [`Registry`], so it
//! can be shared by reference (or across threads) without locking.
//!
//! ## Normalization
//!
//! Every identifier passes through [`FormatId::new`] on both sides of a
//! lookup: surrounding whitespace and leading dots are stripped and the rest
//! is lower-cased. `".TXT"`, `"txt"`, and `" Txt"` all name the same entry.
//!
//! ## Duplicates
//!
//! Registering the same identifier twice in one map is a build error under
//! [`DuplicatePolicy::Reject`] (the default). [`DuplicatePolicy::Override`]
//! lets the later registration win and logs a warning naming the identifier.
//!
//! ## Path resolution
//!
//! [`Registry::validator_for_path`] tries every dotted suffix of the file name
//! from longest to shortest, so `fixture.tar.gz` resolves to `tar.gz` before
//! `gz`.

use crate::naming;
use crate::options::Options;
use crate::validate::ValidationResult;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Format identifier registered twice: {0}")]
    Duplicate(FormatId),
    #[error("Empty format identifier in registration")]
    EmptyId,
    #[error("Registration for {0} has neither a generator nor a validator")]
    Empty(String),
}

/// Failure raised by a [`Generator`] while encoding.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("ZIP encoding failed: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("PDF encoding failed: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("{0}")]
    Encoder(String),
    #[error("Required tool not found on PATH: {0}")]
    MissingTool(String),
}

/// Exceptional failure raised by a [`Validator`].
///
/// Structural defects are *not* errors; validators report those as an
/// invalid [`ValidationResult`]. This type covers the cases where the check
/// itself could not run (unreadable file, parser failure).
#[derive(Error, Debug)]
pub enum ValidatorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Parse(String),
}

/// A normalized format identifier such as `png` or `tar.gz`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct FormatId(String);

impl FormatId {
    /// Normalize a raw identifier: trim, strip leading dots, lower-case.
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().trim_start_matches('.').to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FormatId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Encodes text content into a file of one format.
///
/// Implementations are stateless: every call produces an independent file.
/// The returned path is the file actually written, which may differ from
/// `dest` when the encoder picks its own suffix.
pub trait Generator: Send + Sync {
    fn encode(&self, content: &str, dest: &Path, options: &Options) -> Result<PathBuf, EncodeError>;
}

/// Inspects a file and reports whether it conforms to its format.
pub trait Validator: Send + Sync {
    fn check(&self, path: &Path) -> Result<ValidationResult, ValidatorError>;
}

impl<F> Generator for F
where
    F: Fn(&str, &Path, &Options) -> Result<PathBuf, EncodeError> + Send + Sync,
{
    fn encode(&self, content: &str, dest: &Path, options: &Options) -> Result<PathBuf, EncodeError> {
        self(content, dest, options)
    }
}

impl<F> Validator for F
where
    F: Fn(&Path) -> Result<ValidationResult, ValidatorError> + Send + Sync,
{
    fn check(&self, path: &Path) -> Result<ValidationResult, ValidatorError> {
        self(path)
    }
}

/// One entry of the ordered registration list passed to [`Registry::build`].
pub struct Registration {
    ids: Vec<String>,
    generator: Option<Arc<dyn Generator>>,
    validator: Option<Arc<dyn Validator>>,
}

impl Registration {
    /// Register `generator` under every identifier in `ids`.
    pub fn new(ids: &[&str], generator: impl Generator + 'static) -> Self {
        Self {
            ids: ids.iter().map(|s| s.to_string()).collect(),
            generator: Some(Arc::new(generator)),
            validator: None,
        }
    }

    /// Register a validator for formats this crate can check but not produce.
    pub fn validator_only(ids: &[&str], validator: impl Validator + 'static) -> Self {
        Self {
            ids: ids.iter().map(|s| s.to_string()).collect(),
            generator: None,
            validator: Some(Arc::new(validator)),
        }
    }

    /// Attach a validator to the same identifiers.
    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }
}

/// What to do when an identifier is registered twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    #[default]
    Reject,
    Override,
}

/// Immutable lookup table from [`FormatId`] to generator and validator.
#[derive(Default, Clone)]
pub struct Registry {
    generators: BTreeMap<FormatId, Arc<dyn Generator>>,
    validators: BTreeMap<FormatId, Arc<dyn Validator>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("generators", &self.generators.keys().collect::<Vec<_>>())
            .field("validators", &self.validators.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    /// Build a registry from an ordered registration list, rejecting duplicates.
    pub fn build(
        registrations: impl IntoIterator<Item = Registration>,
    ) -> Result<Self, RegistryError> {
        Self::build_with_policy(registrations, DuplicatePolicy::Reject)
    }

    pub fn build_with_policy(
        registrations: impl IntoIterator<Item = Registration>,
        policy: DuplicatePolicy,
    ) -> Result<Self, RegistryError> {
        let mut registry = Registry::default();

        for registration in registrations {
            if registration.generator.is_none() && registration.validator.is_none() {
                return Err(RegistryError::Empty(registration.ids.join(", ")));
            }
            for raw in &registration.ids {
                let id = FormatId::new(raw);
                if id.is_empty() {
                    return Err(RegistryError::EmptyId);
                }
                if let Some(generator) = &registration.generator {
                    insert(&mut registry.generators, &id, generator.clone(), policy, "generator")?;
                }
                if let Some(validator) = &registration.validator {
                    insert(&mut registry.validators, &id, validator.clone(), policy, "validator")?;
                }
            }
        }

        debug!(
            generators = registry.generators.len(),
            validators = registry.validators.len(),
            "codec registry built"
        );
        Ok(registry)
    }

    pub fn lookup_generator(&self, id: &str) -> Option<&dyn Generator> {
        self.generators.get(&FormatId::new(id)).map(|g| g.as_ref())
    }

    pub fn lookup_validator(&self, id: &str) -> Option<&dyn Validator> {
        self.validators.get(&FormatId::new(id)).map(|v| v.as_ref())
    }

    /// Resolve the validator for a file by its (possibly multi-part) extension.
    pub fn validator_for_path(&self, path: &Path) -> Option<(FormatId, &dyn Validator)> {
        let name = path.file_name()?.to_string_lossy();
        naming::extension_candidates(&name)
            .into_iter()
            .map(|ext| FormatId::new(&ext))
            .find_map(|id| {
                let validator = self.validators.get(&id)?;
                Some((id, validator.as_ref()))
            })
    }

    /// Snapshot of every identifier with a generator, sorted.
    pub fn supported_extensions(&self) -> Vec<FormatId> {
        self.generators.keys().cloned().collect()
    }

    /// Snapshot of every identifier with a validator, sorted.
    pub fn validated_extensions(&self) -> Vec<FormatId> {
        self.validators.keys().cloned().collect()
    }

    pub fn is_supported(&self, id: &str) -> bool {
        self.generators.contains_key(&FormatId::new(id))
    }
}

fn insert<T: ?Sized>(
    map: &mut BTreeMap<FormatId, Arc<T>>,
    id: &FormatId,
    entry: Arc<T>,
    policy: DuplicatePolicy,
    kind: &str,
) -> Result<(), RegistryError> {
    if map.contains_key(id) {
        match policy {
            DuplicatePolicy::Reject => return Err(RegistryError::Duplicate(id.clone())),
            DuplicatePolicy::Override => warn!(format = %id, kind, "overriding registered codec"),
        }
    }
    map.insert(id.clone(), entry);
    Ok(())
}
