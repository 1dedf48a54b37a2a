//! Built-in codecs.
//!
//! Each submodule owns one family of formats and exposes its generator and
//! validator types. [`builtin_registrations`] lists them in a fixed order;
//! [`builtin_registry`] builds the default [`Registry`] from that list.
//!
//! | Module | Generated | Validated only |
//! |---|---|---|
//! | `text` | txt md html css js py json csv xml yaml yml sh | |
//! | `svg` | svg | |
//! | `raster` | png jpg jpeg bmp gif tiff webp | |
//! | `archive` | zip tar tar.gz tgz | |
//! | `pdf` | pdf | |
//! | `office` | docx xlsx odt | pptx ods odp |
//! | `video` | mp4 | mov m4v |

pub mod archive;
pub mod office;
pub mod pdf;
pub mod raster;
pub mod svg;
pub mod text;
pub mod video;

use crate::registry::{Registration, Registry, RegistryError};
use archive::{TarGenerator, TarValidator, ZipGenerator, ZipValidator};
use office::{DocxGenerator, OdtGenerator, OfficeKind, OfficeValidator, XlsxGenerator};
use pdf::{PdfGenerator, PdfValidator};
use raster::{RasterGenerator, RasterValidator};
use svg::{SvgGenerator, SvgValidator};
use text::{
    CsvValidator, HtmlValidator, JsonValidator, MarkdownValidator, PlainTextValidator,
    PythonValidator, ShellValidator, TextGenerator, XmlValidator, YamlValidator,
};
use video::{IsoMediaValidator, Mp4Generator};

/// Every built-in codec, in registration order.
pub fn builtin_registrations() -> Vec<Registration> {
    vec![
        Registration::new(&["txt", "css", "js"], TextGenerator)
            .with_validator(PlainTextValidator),
        Registration::new(&["py"], TextGenerator).with_validator(PythonValidator),
        Registration::new(&["md"], TextGenerator).with_validator(MarkdownValidator),
        Registration::new(&["html", "htm"], TextGenerator).with_validator(HtmlValidator),
        Registration::new(&["json"], TextGenerator).with_validator(JsonValidator),
        Registration::new(&["csv"], TextGenerator).with_validator(CsvValidator),
        Registration::new(&["xml"], TextGenerator).with_validator(XmlValidator),
        Registration::new(&["yaml", "yml"], TextGenerator).with_validator(YamlValidator),
        Registration::new(&["sh"], TextGenerator).with_validator(ShellValidator),
        Registration::new(&["svg"], SvgGenerator).with_validator(SvgValidator),
        Registration::new(
            &["png", "jpg", "jpeg", "bmp", "gif", "tiff", "webp"],
            RasterGenerator,
        )
        .with_validator(RasterValidator),
        Registration::new(&["zip"], ZipGenerator).with_validator(ZipValidator),
        Registration::new(&["tar", "tar.gz", "tgz"], TarGenerator).with_validator(TarValidator),
        Registration::new(&["pdf"], PdfGenerator).with_validator(PdfValidator),
        Registration::new(&["docx"], DocxGenerator)
            .with_validator(OfficeValidator::new(OfficeKind::Docx)),
        Registration::new(&["xlsx"], XlsxGenerator)
            .with_validator(OfficeValidator::new(OfficeKind::Xlsx)),
        Registration::new(&["odt"], OdtGenerator)
            .with_validator(OfficeValidator::new(OfficeKind::Odt)),
        Registration::validator_only(&["pptx"], OfficeValidator::new(OfficeKind::Pptx)),
        Registration::validator_only(&["ods"], OfficeValidator::new(OfficeKind::Ods)),
        Registration::validator_only(&["odp"], OfficeValidator::new(OfficeKind::Odp)),
        Registration::new(&["mp4"], Mp4Generator).with_validator(IsoMediaValidator::mp4()),
        Registration::validator_only(&["m4v"], IsoMediaValidator::m4v()),
        Registration::validator_only(&["mov"], IsoMediaValidator::mov()),
    ]
}

/// The default registry with every built-in codec.
pub fn builtin_registry() -> Result<Registry, RegistryError> {
    Registry::build(builtin_registrations())
}
