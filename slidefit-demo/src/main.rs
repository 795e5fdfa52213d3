//! slidefit — fit slide text to its box from the command line.
//!
//! Shapes each string with `cosmic-text` through the full
//! `slidefit-core` → `slidefit-text` → `slidefit-shell` pipeline and
//! prints the largest font size that fits.

mod fit;

use clap::Parser;
use log::info;
use std::path::PathBuf;

use fit::{FitReport, Template};
use slidefit_core::FitConfig;

/// Find the largest font size at which each text fits its box.
#[derive(Parser, Debug)]
#[command(name = "slidefit")]
#[command(version)]
#[command(about = "Auto-fit text sizing for slide text boxes")]
pub struct Args {
    /// Texts to fit
    #[arg(required = true)]
    pub texts: Vec<String>,

    /// Largest font size to try, in pixels
    #[arg(long, default_value_t = 100.0)]
    pub max: f32,

    /// Smallest acceptable font size, in pixels
    #[arg(long, default_value_t = 8.0)]
    pub min: f32,

    /// Line height as a multiple of the font size
    #[arg(long, default_value_t = 1.2)]
    pub line_height: f32,

    /// Maximum number of lines
    #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub lines: u32,

    /// Box width in pixels (config default if omitted)
    #[arg(short, long)]
    pub width: Option<f32>,

    /// CSS font family chain
    #[arg(short, long, default_value = "sans-serif")]
    pub family: String,

    /// Font files to load after the first fit; matching texts are refitted
    #[arg(long = "font")]
    pub fonts: Vec<PathBuf>,

    /// Path to a JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Milliseconds between convergence steps (overrides config)
    #[arg(long)]
    pub frame_ms: Option<u64>,

    /// Skip the advance-based estimate and search the full range
    #[arg(long)]
    pub no_estimate: bool,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

impl Args {
    fn template(&self) -> Template {
        Template {
            max_font_size: self.max,
            min_font_size: self.min,
            line_height: self.line_height,
            max_lines: self.lines,
            font_family: self.family.clone(),
            width: self.width,
        }
    }

    /// Defaults → config file → command-line overrides.
    fn resolve_config(&self) -> Result<FitConfig, slidefit_core::ConfigError> {
        let mut config = match &self.config {
            Some(path) => FitConfig::from_path(path)?,
            None => FitConfig::default(),
        };
        if let Some(ms) = self.frame_ms {
            config.frame_interval_ms = ms;
        }
        Ok(config)
    }
}

fn print_reports(reports: &[FitReport], json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(reports)?);
        return Ok(());
    }
    for report in reports {
        let source = if report.cached { "cache" } else { "fit" };
        match report.refit_size {
            Some(refit) => println!(
                "{:>6.1}px -> {:>6.1}px  ({source}, {} calls)  {}",
                report.font_size, refit, report.oracle_calls, report.text
            ),
            None => println!(
                "{:>6.1}px  ({source}, {} calls)  {}",
                report.font_size, report.oracle_calls, report.text
            ),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let config = args.resolve_config()?;
    info!("Starting slidefit with {config:?}");

    let reports = fit::fit_all(
        &args.texts,
        &args.template(),
        config,
        !args.no_estimate,
        &args.fonts,
    )
    .await?;
    print_reports(&reports, args.json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_does_not_error() {
        let err = Args::try_parse_from(["slidefit", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_text_is_required() {
        let err = Args::try_parse_from(["slidefit"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["slidefit", "Hello World"]);
        assert_eq!(args.texts, vec!["Hello World".to_string()]);
        assert_eq!(args.max, 100.0);
        assert_eq!(args.min, 8.0);
        assert_eq!(args.line_height, 1.2);
        assert_eq!(args.lines, 1);
        assert_eq!(args.width, None);
        assert_eq!(args.family, "sans-serif");
        assert!(args.fonts.is_empty());
        assert!(!args.no_estimate);
    }

    #[test]
    fn test_zero_lines_rejected() {
        assert!(Args::try_parse_from(["slidefit", "-l", "0", "x"]).is_err());
    }

    #[test]
    fn test_repeated_fonts_and_texts() {
        let args = Args::parse_from([
            "slidefit", "--font", "a.ttf", "--font", "b.otf", "one", "two",
        ]);
        assert_eq!(args.fonts, vec![PathBuf::from("a.ttf"), PathBuf::from("b.otf")]);
        assert_eq!(args.texts.len(), 2);
    }

    #[test]
    fn test_frame_override_applies() {
        let args = Args::parse_from(["slidefit", "--frame-ms", "0", "x"]);
        let config = args.resolve_config().unwrap();
        assert_eq!(config.frame_interval_ms, 0);
        assert_eq!(config.retry_ceiling, FitConfig::default().retry_ceiling);
    }

    #[test]
    fn test_template_carries_args() {
        let args = Args::parse_from(["slidefit", "-w", "640", "-f", "Inter, serif", "x"]);
        let template = args.template();
        assert_eq!(template.width, Some(640.0));
        assert_eq!(template.font_family, "Inter, serif");
    }
}
