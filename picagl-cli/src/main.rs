// CLI application
use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use picagl_core::texture::TexelFormat;
use picagl_runtime::ContextConfig;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "picagl")]
#[command(about = "Texture tiling and GPU queue tools for picagl")]
#[command(version)]
struct Cli {
    /// JSON context configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Convert a raw pixel file between row-major and tiled order
    Tile {
        /// Raw input pixels
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the converted pixels
        #[arg(short, long)]
        output: PathBuf,

        /// Width in pixels (multiple of 8)
        #[arg(long)]
        width: u32,

        /// Height in pixels (multiple of 8)
        #[arg(long)]
        height: u32,

        /// Texel format: rgba8, rgb8, rgba5551, rgb565, rgba4, la8, l8, a8
        #[arg(short, long)]
        format: TexelFormat,

        /// Convert tiled input back to row-major
        #[arg(long)]
        untile: bool,
    },
    /// Push asynchronous commands through the simulated GPU and check
    /// their completion order
    Soak {
        /// Number of commands to submit
        #[arg(short = 'n', long, default_value_t = 1000)]
        commands: u32,

        /// Simulated per-command latency, overrides the config file
        #[arg(long)]
        latency_us: Option<u64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match &cli.config {
        Some(path) => ContextConfig::load(path)?,
        None => ContextConfig::default(),
    };

    match cli.command {
        Commands::Tile {
            input,
            output,
            width,
            height,
            format,
            untile,
        } => {
            let pb = create_spinner(if untile { "Untiling..." } else { "Tiling..." });
            commands::tile_file(&input, &output, width, height, format, untile)?;
            pb.finish_with_message(format!("Wrote {}", output.display()));
        }
        Commands::Soak {
            commands,
            latency_us,
            json,
        } => {
            let mut config = config;
            if let Some(latency) = latency_us {
                config.gpu_latency_us = latency;
            }
            let pb = create_progress_bar(u64::from(commands));
            let report = commands::soak(&config, commands, |done| pb.set_position(done))?;
            pb.finish_and_clear();
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                report.print();
            }
        }
    }

    Ok(())
}

fn create_spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    pb.set_message(message);
    pb
}

fn create_progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{bar:40.cyan/blue} {pos}/{len} commands ({per_sec})")
    {
        pb.set_style(style);
    }
    pb
}
