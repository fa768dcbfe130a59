use crate::models::{InputFile, OutputFormat};
use camino::Utf8PathBuf;

/// One (input file, output format) conversion unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionTask {
    pub input: InputFile,
    pub target: OutputFormat,
    pub output_path: Utf8PathBuf,
    /// Export DPI; only `Some` for bitmap targets
    pub dpi: Option<u32>,
}

impl ConversionTask {
    pub fn new(input: InputFile, target: OutputFormat, dpi: u32) -> Self {
        let output_path = output_path_for(&input, target);
        Self {
            dpi: target.is_bitmap().then_some(dpi),
            input,
            target,
            output_path,
        }
    }

    /// Same task with the DPI refreshed from the live setting.
    pub fn with_current_dpi(mut self, dpi: u32) -> Self {
        if self.target.is_bitmap() {
            self.dpi = Some(dpi);
        }
        self
    }

    /// Short label for logs and status lines, e.g. `a.svg -> PNG`
    pub fn label(&self) -> String {
        format!("{} -> {}", self.input.display_name(), self.target)
    }
}

/// A pair that was not planned because the input already has the target format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPair {
    pub input: InputFile,
    pub target: OutputFormat,
}

/// The task list for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobPlan {
    pub tasks: Vec<ConversionTask>,
    pub skipped: Vec<SkippedPair>,
}

impl JobPlan {
    /// True when nothing needs converting
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn total_tasks(&self) -> usize {
        self.tasks.len()
    }
}

/// Output path: the input's directory and stem with the target extension.
pub fn output_path_for(input: &InputFile, target: OutputFormat) -> Utf8PathBuf {
    input.path.with_extension(target.extension())
}

/// Enumerate conversion tasks, file-major and format-minor.
///
/// A pair is skipped when the input's extension equals the target extension,
/// ignoring case. The result depends only on the arguments.
pub fn plan(files: &[InputFile], formats: &[OutputFormat], dpi: u32) -> JobPlan {
    let mut job_plan = JobPlan::default();

    for input in files {
        for &target in formats {
            if input.extension.eq_ignore_ascii_case(target.extension()) {
                tracing::debug!(
                    "Skipping same-format conversion: {} is already {}",
                    input.display_name(),
                    target
                );
                job_plan.skipped.push(SkippedPair {
                    input: input.clone(),
                    target,
                });
            } else {
                job_plan
                    .tasks
                    .push(ConversionTask::new(input.clone(), target, dpi));
            }
        }
    }

    if !job_plan.skipped.is_empty() {
        tracing::info!("Skipping {} same-format conversions", job_plan.skipped.len());
    }
    tracing::info!(
        "Planned {} tasks for {} files and {} formats",
        job_plan.tasks.len(),
        files.len(),
        formats.len()
    );

    job_plan
}
