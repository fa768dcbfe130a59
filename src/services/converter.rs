use crate::services::planner::ConversionTask;
use camino::{Utf8Path, Utf8PathBuf};
use std::future::Future;
use std::io;
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;

/// Errors launching the converter process
#[derive(Error, Debug)]
pub enum ConverterError {
    #[error("Converter executable not found: {0}")]
    NotFound(Utf8PathBuf),

    #[error("Permission denied running converter: {0}")]
    PermissionDenied(Utf8PathBuf),

    #[error("Process error: {0}")]
    ProcessError(#[from] io::Error),
}

/// A fully built converter invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterCommand {
    pub program: Utf8PathBuf,
    pub args: Vec<String>,
}

impl ConverterCommand {
    /// Command line for logging, with arguments containing spaces quoted
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(|part| {
                if part.contains(' ') {
                    format!("\"{}\"", part)
                } else {
                    part.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Exit status and captured diagnostics of one converter run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stderr: Vec<u8>,
    pub duration: Duration,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Standard error decoded as UTF-8, invalid sequences replaced.
    pub fn diagnostic(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Build the converter invocation for a task.
///
/// The DPI flag is only passed for bitmap targets.
pub fn build_command(converter_exe: &Utf8Path, task: &ConversionTask) -> ConverterCommand {
    let mut args = vec![
        task.input.path.to_string(),
        format!("--export-type={}", task.target.extension()),
        format!("--export-filename={}", task.output_path),
    ];

    if task.target.is_bitmap() {
        if let Some(dpi) = task.dpi {
            args.push(format!("--export-dpi={}", dpi));
        }
    }

    ConverterCommand {
        program: converter_exe.to_path_buf(),
        args,
    }
}

/// Seam to the external converter.
///
/// [`ProcessConverter`] spawns the real executable; tests substitute a
/// scripted implementation.
pub trait Converter: Send + Sync {
    fn convert(
        &self,
        command: &ConverterCommand,
    ) -> impl Future<Output = Result<ProcessOutput, ConverterError>> + Send;
}

/// Runs the converter as a child process and waits for it.
///
/// There is no timeout: a converter that never exits stalls the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessConverter;

impl Converter for ProcessConverter {
    async fn convert(&self, command: &ConverterCommand) -> Result<ProcessOutput, ConverterError> {
        tracing::debug!("Executing: {}", command.display());

        let start = Instant::now();

        let output = Command::new(command.program.as_std_path())
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => ConverterError::NotFound(command.program.clone()),
                io::ErrorKind::PermissionDenied => {
                    ConverterError::PermissionDenied(command.program.clone())
                }
                _ => ConverterError::ProcessError(e),
            })?;

        let duration = start.elapsed();
        let exit_code = output.status.code();

        tracing::debug!(
            "Converter finished in {:.2}s with exit code {:?}",
            duration.as_secs_f32(),
            exit_code
        );

        Ok(ProcessOutput {
            exit_code,
            stderr: output.stderr,
            duration,
        })
    }
}
