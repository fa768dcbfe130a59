use crate::models::format::{FormatKind, OutputFormat};
use indexmap::IndexMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("{0} output is unavailable while bitmap inputs are in the batch")]
    Unavailable(OutputFormat),
}

/// Selection and availability flags of a single output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatFlags {
    pub selected: bool,
    pub available: bool,
}

impl Default for FormatFlags {
    fn default() -> Self {
        Self {
            selected: false,
            available: true,
        }
    }
}

/// Canonical per-format selection state.
///
/// Bitmap inputs make every vector output unavailable. The restriction is
/// monotonic: it is lifted only by [`reset_availability`](Self::reset_availability),
/// never by removing files from the worklist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSelection {
    flags: IndexMap<OutputFormat, FormatFlags>,
}

impl Default for FormatSelection {
    fn default() -> Self {
        Self {
            flags: OutputFormat::ALL
                .into_iter()
                .map(|f| (f, FormatFlags::default()))
                .collect(),
        }
    }
}

impl FormatSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flags(&self, format: OutputFormat) -> FormatFlags {
        self.flags.get(&format).copied().unwrap_or_default()
    }

    pub fn is_selected(&self, format: OutputFormat) -> bool {
        self.flags(format).selected
    }

    pub fn is_available(&self, format: OutputFormat) -> bool {
        self.flags(format).available
    }

    /// Select or deselect a format. Selecting an unavailable format fails.
    pub fn set_selected(&mut self, format: OutputFormat, selected: bool) -> Result<(), SelectionError> {
        let flags = self.flags.entry(format).or_default();
        if selected && !flags.available {
            return Err(SelectionError::Unavailable(format));
        }
        flags.selected = selected;
        Ok(())
    }

    /// Flip the selection of a format, returning the new value.
    pub fn toggle(&mut self, format: OutputFormat) -> Result<bool, SelectionError> {
        let next = !self.is_selected(format);
        self.set_selected(format, next)?;
        Ok(next)
    }

    /// Apply the compatibility rules for a newly added input.
    ///
    /// Returns the formats that became unavailable because of this input.
    pub fn apply_input(&mut self, kind: FormatKind) -> Vec<OutputFormat> {
        if kind != FormatKind::Bitmap {
            return Vec::new();
        }

        let mut restricted = Vec::new();
        for (format, flags) in self.flags.iter_mut() {
            if format.kind() == FormatKind::Vector && flags.available {
                flags.available = false;
                flags.selected = false;
                restricted.push(*format);
            }
        }

        if !restricted.is_empty() {
            tracing::info!(
                "Bitmap input added - disabled vector outputs: {}",
                restricted
                    .iter()
                    .map(|f| f.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        restricted
    }

    /// Re-enable every format and clear every selection.
    pub fn reset_availability(&mut self) {
        for flags in self.flags.values_mut() {
            *flags = FormatFlags::default();
        }
    }

    /// Selected formats in registry order
    pub fn selected(&self) -> Vec<OutputFormat> {
        self.flags
            .iter()
            .filter(|(_, flags)| flags.selected)
            .map(|(format, _)| *format)
            .collect()
    }

    pub fn has_selection(&self) -> bool {
        self.flags.values().any(|flags| flags.selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_all_available_none_selected() {
        let selection = FormatSelection::new();
        for format in OutputFormat::ALL {
            assert!(selection.is_available(format));
            assert!(!selection.is_selected(format));
        }
        assert!(!selection.has_selection());
    }

    #[test]
    fn test_bitmap_input_clears_vector_selection() {
        let mut selection = FormatSelection::new();
        selection.set_selected(OutputFormat::Eps, true).unwrap();
        selection.set_selected(OutputFormat::Png, true).unwrap();

        let restricted = selection.apply_input(FormatKind::Bitmap);

        assert_eq!(
            restricted,
            vec![OutputFormat::Svg, OutputFormat::Pdf, OutputFormat::Eps, OutputFormat::Emf]
        );
        assert!(!selection.is_selected(OutputFormat::Eps));
        assert!(!selection.is_available(OutputFormat::Eps));
        assert!(selection.is_selected(OutputFormat::Png));
        assert_eq!(
            selection.set_selected(OutputFormat::Eps, true),
            Err(SelectionError::Unavailable(OutputFormat::Eps))
        );
    }

    #[test]
    fn test_vector_input_changes_nothing() {
        let mut selection = FormatSelection::new();
        selection.set_selected(OutputFormat::Pdf, true).unwrap();

        assert!(selection.apply_input(FormatKind::Vector).is_empty());
        assert!(selection.is_selected(OutputFormat::Pdf));
    }

    #[test]
    fn test_second_bitmap_reports_nothing_new() {
        let mut selection = FormatSelection::new();
        selection.apply_input(FormatKind::Bitmap);
        assert!(selection.apply_input(FormatKind::Bitmap).is_empty());
    }

    #[test]
    fn test_deselect_unavailable_is_allowed() {
        let mut selection = FormatSelection::new();
        selection.apply_input(FormatKind::Bitmap);
        assert!(selection.set_selected(OutputFormat::Pdf, false).is_ok());
    }

    #[test]
    fn test_reset_availability() {
        let mut selection = FormatSelection::new();
        selection.set_selected(OutputFormat::Png, true).unwrap();
        selection.apply_input(FormatKind::Bitmap);

        selection.reset_availability();

        assert!(selection.is_available(OutputFormat::Pdf));
        assert!(!selection.has_selection());
        assert!(selection.set_selected(OutputFormat::Pdf, true).is_ok());
    }

    #[test]
    fn test_toggle_and_order() {
        let mut selection = FormatSelection::new();
        assert_eq!(selection.toggle(OutputFormat::Emf), Ok(true));
        assert_eq!(selection.toggle(OutputFormat::Png), Ok(true));
        assert_eq!(selection.selected(), vec![OutputFormat::Png, OutputFormat::Emf]);
        assert_eq!(selection.toggle(OutputFormat::Emf), Ok(false));
        assert_eq!(selection.selected(), vec![OutputFormat::Png]);
    }
}
