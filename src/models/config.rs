use crate::models::format::OutputFormat;
use serde::{Deserialize, Serialize};

/// Lowest DPI accepted for bitmap exports
pub const MIN_DPI: u32 = 72;

/// Highest DPI accepted for bitmap exports
pub const MAX_DPI: u32 = 600;

pub const DEFAULT_DPI: u32 = 300;

/// Clamp a requested DPI into the supported range.
pub fn clamp_dpi(dpi: u32) -> u32 {
    dpi.clamp(MIN_DPI, MAX_DPI)
}

/// User configuration from figconv.yaml
///
/// Every field may also be set through a `FIGCONV_<FIELD>` environment
/// variable, which takes precedence over the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Converter executable; empty means "discover automatically"
    #[serde(default)]
    pub converter_exe: String,

    #[serde(default = "default_dpi")]
    pub dpi: u32,

    /// Formats selected when a session starts, by name ("PNG", "pdf", ...)
    #[serde(default)]
    pub default_formats: Vec<String>,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default)]
    pub debug_mode: bool,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            converter_exe: String::new(),
            dpi: DEFAULT_DPI,
            default_formats: Vec::new(),
            log_dir: default_log_dir(),
            debug_mode: false,
        }
    }
}

fn default_dpi() -> u32 {
    DEFAULT_DPI
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl UserConfig {
    /// Default formats that name a known output format; unknown names are logged and dropped.
    pub fn default_output_formats(&self) -> Vec<OutputFormat> {
        self.default_formats
            .iter()
            .filter_map(|name| {
                let format = OutputFormat::from_name(name);
                if format.is_none() {
                    tracing::warn!("Ignoring unknown default format in config: {}", name);
                }
                format
            })
            .collect()
    }
}
