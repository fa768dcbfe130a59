//! Command line definitions.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use figconv::OutputFormat;
use figconv::models::{MAX_DPI, MIN_DPI};
use figconv::ui::Verbosity;

/// figconv - convert figures between SVG, PNG, PDF, EPS and EMF using Inkscape
#[derive(Debug, Parser)]
#[command(name = "figconv", version, about, long_about = None)]
pub struct Cli {
    /// Directory containing figconv.yaml
    #[arg(short, long = "config", value_name = "DIR", default_value = ".", global = true)]
    pub config_dir: Utf8PathBuf,

    /// Debug logging, mirrored to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Convert files into the selected formats
    Convert(ConvertArgs),
    /// List supported output formats
    Formats,
    /// Configuration management
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Input files (svg, pdf, eps, ps, emf, png, jpg, jpeg, tiff, bmp, gif)
    #[arg(required = true, value_name = "FILES")]
    pub files: Vec<Utf8PathBuf>,

    /// Output format; repeat for several. Defaults to the configured formats
    #[arg(short = 'f', long = "format", value_name = "FORMAT", value_parser = parse_format)]
    pub formats: Vec<OutputFormat>,

    /// Resolution for bitmap outputs
    #[arg(long, value_parser = clap::value_parser!(u32).range(MIN_DPI as i64..=MAX_DPI as i64))]
    pub dpi: Option<u32>,

    /// Converter executable, overriding the configured one
    #[arg(long, value_name = "PATH")]
    pub converter: Option<Utf8PathBuf>,

    /// Select the converter in a file dialog if it cannot be found
    #[arg(long)]
    pub pick_converter: bool,

    /// Only print failures and the summary
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print every state change
    #[arg(short, long)]
    pub verbose: bool,
}

impl ConvertArgs {
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration (file plus FIGCONV_* overrides)
    Show,
    /// Write a default figconv.yaml if none exists
    Init,
}

fn parse_format(name: &str) -> Result<OutputFormat, String> {
    OutputFormat::from_name(name).ok_or_else(|| {
        let known = OutputFormat::ALL
            .iter()
            .map(|f| f.extension())
            .collect::<Vec<_>>()
            .join(", ");
        format!("unknown format '{}' (expected one of: {})", name, known)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_convert() {
        let cli = Cli::parse_from([
            "figconv", "convert", "a.svg", "b.png", "-f", "png", "--format", "PDF", "--dpi",
            "150",
        ]);

        let Commands::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(args.files.len(), 2);
        assert_eq!(args.formats, vec![OutputFormat::Png, OutputFormat::Pdf]);
        assert_eq!(args.dpi, Some(150));
        assert_eq!(args.verbosity(), Verbosity::Normal);
        assert_eq!(cli.config_dir, Utf8PathBuf::from("."));
    }

    #[test]
    fn test_rejects_unknown_format() {
        let result = Cli::try_parse_from(["figconv", "convert", "a.svg", "-f", "webp"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_dpi_out_of_range() {
        let result = Cli::try_parse_from(["figconv", "convert", "a.svg", "--dpi", "1200"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["figconv", "convert", "a.svg", "-q", "-v"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_config_dir() {
        let cli = Cli::parse_from(["figconv", "config", "show", "--config", "/etc/figconv"]);
        assert_eq!(cli.config_dir, Utf8PathBuf::from("/etc/figconv"));
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigArgs {
                command: ConfigCommand::Show
            })
        ));
    }
}
