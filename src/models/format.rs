use serde::{Deserialize, Serialize};
use std::fmt;

/// Extensions accepted as bitmap (raster) sources.
pub const BITMAP_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tiff", "bmp", "gif"];

/// Extensions accepted as vector sources.
pub const VECTOR_EXTENSIONS: &[&str] = &["svg", "pdf", "eps", "ps", "emf"];

/// Whether a format is raster (DPI meaningful) or resolution independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatKind {
    Bitmap,
    Vector,
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bitmap => write!(f, "bitmap"),
            Self::Vector => write!(f, "vector"),
        }
    }
}

/// Output formats the converter can be asked to produce.
///
/// The set is fixed at compile time. Extensions are unique per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OutputFormat {
    Png,
    Svg,
    Pdf,
    Eps,
    Emf,
}

impl OutputFormat {
    /// Every output format in display order.
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Png,
        OutputFormat::Svg,
        OutputFormat::Pdf,
        OutputFormat::Eps,
        OutputFormat::Emf,
    ];

    /// Logical format name as shown to the user ("PNG", "PDF", ...)
    pub fn name(&self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Svg => "SVG",
            Self::Pdf => "PDF",
            Self::Eps => "EPS",
            Self::Emf => "EMF",
        }
    }

    /// File extension without the leading dot, lower-case
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
            Self::Pdf => "pdf",
            Self::Eps => "eps",
            Self::Emf => "emf",
        }
    }

    pub fn kind(&self) -> FormatKind {
        match self {
            Self::Png => FormatKind::Bitmap,
            Self::Svg | Self::Pdf | Self::Eps | Self::Emf => FormatKind::Vector,
        }
    }

    pub fn is_bitmap(&self) -> bool {
        self.kind() == FormatKind::Bitmap
    }

    /// Look up a format by its logical name or extension, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().trim_start_matches('.');
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name) || f.extension().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Classify a file extension as bitmap or vector.
///
/// Matching ignores case and an optional leading dot. Extensions outside the
/// accepted tables return `None`; callers reject those inputs before they
/// reach the worklist.
pub fn classify(extension: &str) -> Option<FormatKind> {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();

    if BITMAP_EXTENSIONS.contains(&ext.as_str()) {
        Some(FormatKind::Bitmap)
    } else if VECTOR_EXTENSIONS.contains(&ext.as_str()) {
        Some(FormatKind::Vector)
    } else {
        None
    }
}

/// Extension for a logical format name, e.g. `"PDF"` -> `"pdf"`.
pub fn extension_for(format_name: &str) -> Option<&'static str> {
    OutputFormat::from_name(format_name).map(|f| f.extension())
}
