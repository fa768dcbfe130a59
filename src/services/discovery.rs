//! Locating the converter executable.
//!
//! Search order:
//! 1. A path configured by the user (config file or command line)
//! 2. Every directory on `PATH`
//! 3. Well-known install locations for the current platform
//!
//! When all of these fail the caller may fall back to
//! [`pick_converter_interactively`], a native file dialog.

use camino::{Utf8Path, Utf8PathBuf};
use std::env;

/// File system access needed by discovery
#[cfg_attr(test, mockall::automock)]
pub trait ExecutableLocator {
    /// Whether `path` names an existing regular file
    fn is_file(&self, path: &Utf8Path) -> bool;

    /// Candidates for `program` in the directories listed in `PATH`, in order
    fn search_path(&self, program: &str) -> Vec<Utf8PathBuf>;
}

/// Locator backed by the real file system and environment
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLocator;

impl ExecutableLocator for SystemLocator {
    fn is_file(&self, path: &Utf8Path) -> bool {
        path.is_file()
    }

    fn search_path(&self, program: &str) -> Vec<Utf8PathBuf> {
        let Some(path_var) = env::var_os("PATH") else {
            tracing::warn!("PATH is not set");
            return Vec::new();
        };

        env::split_paths(&path_var)
            .map(|dir| dir.join(program))
            .filter(|candidate| candidate.is_file())
            .filter_map(|candidate| Utf8PathBuf::from_path_buf(candidate).ok())
            .collect()
    }
}

/// Executable name of the converter on this platform
pub fn converter_program_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "inkscape.exe"
    } else {
        "inkscape"
    }
}

/// Install locations checked after `PATH`
pub fn common_install_paths() -> Vec<Utf8PathBuf> {
    let paths: &[&str] = if cfg!(target_os = "windows") {
        &[
            r"C:\Program Files\Inkscape\bin\inkscape.exe",
            r"C:\Program Files (x86)\Inkscape\bin\inkscape.exe",
            r"C:\Program Files\Inkscape\inkscape.exe",
            r"C:\Program Files (x86)\Inkscape\inkscape.exe",
        ]
    } else if cfg!(target_os = "macos") {
        &[
            "/Applications/Inkscape.app/Contents/MacOS/inkscape",
            "/opt/homebrew/bin/inkscape",
            "/usr/local/bin/inkscape",
        ]
    } else {
        &["/usr/bin/inkscape", "/usr/local/bin/inkscape", "/snap/bin/inkscape"]
    };

    paths.iter().map(Utf8PathBuf::from).collect()
}

/// Find the converter executable, logging every attempt.
pub fn discover_converter(
    configured: Option<&Utf8Path>,
    locator: &impl ExecutableLocator,
) -> Option<Utf8PathBuf> {
    tracing::info!("Looking for converter executable");

    if let Some(path) = configured {
        if locator.is_file(path) {
            tracing::info!("Using configured converter: {}", path);
            return Some(path.to_path_buf());
        }
        tracing::warn!("Configured converter does not exist: {}", path);
    }

    let program = converter_program_name();
    if let Some(path) = locator.search_path(program).into_iter().next() {
        tracing::info!("Found converter on PATH: {}", path);
        return Some(path);
    }
    tracing::warn!("{} not found on PATH", program);

    for candidate in common_install_paths() {
        if locator.is_file(&candidate) {
            tracing::info!("Found converter: {}", candidate);
            return Some(candidate);
        }
        tracing::debug!("Not found: {}", candidate);
    }

    tracing::error!("Converter executable not found; install Inkscape or select it manually");
    None
}

/// Ask the user to select the converter with a native file dialog.
///
/// Returns `None` when the dialog is cancelled or the path is not UTF-8.
pub fn pick_converter_interactively() -> Option<Utf8PathBuf> {
    use rfd::FileDialog;

    tracing::info!("Requesting manual converter selection");

    let mut dialog = FileDialog::new().set_title("Select Inkscape Executable");
    if cfg!(target_os = "windows") {
        dialog = dialog.add_filter("Inkscape executable", &["exe"]);
    }

    let picked = dialog.pick_file().and_then(|path| {
        Utf8PathBuf::try_from(path)
            .map_err(|e| {
                tracing::error!("Failed to convert path to UTF-8: {}", e);
                e
            })
            .ok()
    });

    match &picked {
        Some(path) => tracing::info!("Manually selected converter: {}", path),
        None => tracing::warn!("Converter selection cancelled"),
    }

    picked
}
