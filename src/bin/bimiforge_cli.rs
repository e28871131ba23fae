//! BIMI Forge CLI - Bridge interface
//!
//! Commands: convert, validate, request
//! Outputs JSON to stdout, logs to stderr
//! Exit codes: 0 compliant, 2 non-compliant, 1 input or usage error

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use bimiforge_core::{
    BackgroundShape, ConversionPipeline, ConvertOptions, ConvertRequest, ConvertedLogo,
    PipelineConfig, PipelineError, TraceSettings,
};

#[derive(Parser)]
#[command(name = "bimiforge-cli")]
#[command(about = "BIMI Forge CLI - BIMI-ready SVG logo converter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a PNG, JPEG or SVG logo to a BIMI SVG
    Convert {
        /// Source logo file
        #[arg(short, long)]
        input: PathBuf,

        /// JSON file with conversion options
        #[arg(long)]
        options: Option<PathBuf>,

        /// Background fill colour
        #[arg(long)]
        background_color: Option<String>,

        /// Background shape: circle or rounded-square
        #[arg(long, value_parser = parse_shape)]
        shape: Option<BackgroundShape>,

        /// Safe margin percent (5-25)
        #[arg(long)]
        padding: Option<f64>,

        /// Document title
        #[arg(long)]
        title: Option<String>,

        /// Alpha above which a pixel counts as opaque
        #[arg(long)]
        alpha_threshold: Option<u8>,

        /// Outline simplification tolerance in pixels
        #[arg(long)]
        tolerance: Option<f64>,

        /// Write the SVG here as well
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate an existing SVG for BIMI compliance
    Validate {
        /// SVG file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Convert a JSON ConvertRequest with base64 source data
    Request {
        /// JSON payload (ConvertRequest)
        #[arg(short, long)]
        payload: String,
    },
}

fn parse_shape(raw: &str) -> Result<BackgroundShape, String> {
    match raw {
        "circle" => Ok(BackgroundShape::Circle),
        "rounded-square" => Ok(BackgroundShape::RoundedSquare),
        other => Err(format!("unknown shape '{}', expected circle or rounded-square", other)),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            input,
            options,
            background_color,
            shape,
            padding,
            title,
            alpha_threshold,
            tolerance,
            output,
        } => {
            let mut opts = match options {
                Some(path) => match ConvertOptions::from_json_file(&path) {
                    Ok(o) => o,
                    Err(e) => return fail(e.to_string()),
                },
                None => ConvertOptions::default(),
            };
            if let Some(color) = background_color {
                opts.background_color = color;
            }
            if let Some(shape) = shape {
                opts.shape = shape;
            }
            if let Some(padding) = padding {
                opts.padding_percent = padding;
            }
            if let Some(title) = title {
                opts.title = title;
            }

            let mut trace = TraceSettings::default();
            if let Some(threshold) = alpha_threshold {
                trace.alpha_threshold = threshold;
            }
            if let Some(tolerance) = tolerance {
                trace.tolerance = tolerance;
            }

            let bytes = match fs::read(&input) {
                Ok(b) => b,
                Err(e) => return fail(format!("Failed to read {}: {}", input.display(), e)),
            };

            let pipeline = ConversionPipeline::new(PipelineConfig { trace });
            let filename = input.to_string_lossy();
            let result = pipeline.convert_bytes(&filename, None, &bytes, &opts);
            finish_conversion(result, output.as_deref())
        }

        Commands::Validate { input } => {
            let text = match fs::read_to_string(&input) {
                Ok(t) => t,
                Err(e) => return fail(format!("Failed to read {}: {}", input.display(), e)),
            };

            let report = ConversionPipeline::default().validate_svg_text(&text);
            let valid = report.valid;
            match print_json(&report) {
                Ok(()) if valid => ExitCode::SUCCESS,
                Ok(()) => ExitCode::from(2),  // Validation failure
                Err(e) => fail(e.to_string()),
            }
        }

        Commands::Request { payload } => {
            let request: ConvertRequest = match serde_json::from_str(&payload) {
                Ok(r) => r,
                Err(e) => return fail(format!("Invalid payload: {}", e)),
            };

            let result = ConversionPipeline::default().convert_request(&request);
            finish_conversion(result, None)
        }
    }
}

fn finish_conversion(result: Result<ConvertedLogo, PipelineError>, output: Option<&Path>) -> ExitCode {
    let logo = match result {
        Ok(logo) => logo,
        Err(e) => return fail(e.to_string()),
    };

    if let Some(path) = output {
        if let Err(e) = fs::write(path, &logo.svg) {
            return fail(format!("Failed to write {}: {}", path.display(), e));
        }
    }

    let valid = logo.report.valid;
    let out = serde_json::json!({
        "success": true,
        "logo": logo,
    });
    match print_json(&out) {
        Ok(()) if valid => ExitCode::SUCCESS,
        Ok(()) => ExitCode::from(2),  // Converted, but not compliant
        Err(e) => fail(e.to_string()),
    }
}

fn print_json(value: &impl Serialize) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn fail(message: String) -> ExitCode {
    let output = serde_json::json!({
        "success": false,
        "error": message,
    });
    println!("{}", output);
    ExitCode::FAILURE
}
