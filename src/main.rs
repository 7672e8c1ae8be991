// SPDX-License-Identifier: GPL-3.0-only

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use velvet::{Config, SourceSpec};

mod cli;

#[derive(Parser)]
#[command(name = "velvet")]
#[command(about = "Real-time per-pixel processing of live camera video")]
#[command(version = velvet::constants::app_info::version())]
struct Cli {
    /// Config file (default: ~/.config/velvet/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a live stream (renders to the terminal)
    Run {
        #[command(flatten)]
        source: SourceArgs,

        /// Processor to enable, in order (default: grayscale)
        #[arg(short = 'p', long = "processor")]
        processors: Vec<String>,

        /// Stop after this many frames
        #[arg(long, requires = "headless", value_parser = clap::value_parser!(u64).range(1..))]
        frames: Option<u64>,

        /// Run without a terminal display
        #[arg(long)]
        headless: bool,

        /// Write the last rendered frame to this file (headless only)
        #[arg(short, long, requires = "headless")]
        output: Option<PathBuf>,
    },

    /// Run the processors once over an image file
    Process {
        /// Input image
        #[arg(short, long)]
        input: PathBuf,

        /// Output image, format taken from the extension
        #[arg(short, long)]
        output: PathBuf,

        /// Processor to enable, in order (default: grayscale)
        #[arg(short = 'p', long = "processor")]
        processors: Vec<String>,
    },

    /// List registered processors
    Processors,

    /// List capture devices
    Devices,

    /// Show the resolved configuration
    Config {
        /// Write a default config file instead
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args)]
#[group(multiple = false)]
struct SourceArgs {
    /// V4L2 capture device (default: from config, /dev/video0)
    #[arg(long)]
    device: Option<PathBuf>,

    /// Play a still image as the stream
    #[arg(long)]
    image: Option<PathBuf>,

    /// Use a generated test pattern
    #[arg(long)]
    pattern: bool,
}

impl SourceArgs {
    fn into_spec(self, config: &Config) -> SourceSpec {
        if let Some(path) = self.image {
            SourceSpec::Image(path)
        } else if self.pattern {
            SourceSpec::Pattern
        } else {
            SourceSpec::Device(self.device.unwrap_or_else(|| config.capture.device_path()))
        }
    }
}

fn init_logging(config: &Config) {
    // RUST_LOG wins, then the configured filter, then "warn"
    // Examples: RUST_LOG=debug, RUST_LOG=velvet=trace
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| {
            tracing_subscriber::EnvFilter::try_new(config.log_filter.as_deref().unwrap_or("warn"))
        })
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::resolve(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("velvet: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config);

    let result = match cli.command {
        Commands::Run {
            source,
            processors,
            frames,
            headless,
            output,
        } => {
            let spec = source.into_spec(&config);
            cli::run(
                &config,
                &spec,
                &processors,
                cli::RunMode::from_flags(headless, frames, output),
            )
        }
        Commands::Process {
            input,
            output,
            processors,
        } => cli::process_image(&config, &input, &output, &processors),
        Commands::Processors => cli::list_processors(),
        Commands::Devices => cli::list_devices(),
        Commands::Config { init } => cli::show_config(&config, cli.config.as_deref(), init),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("velvet: {}", e);
            ExitCode::FAILURE
        }
    }
}
