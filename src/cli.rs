use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "clipforged")]
#[command(author, version, about = "Media operations on top of ffmpeg and ffprobe")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print operation results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Tool {
    Ffmpeg,
    Ffprobe,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run an ffmpeg/ffprobe command line in the working directory
    Run {
        /// Full command line, e.g. "ffmpeg -i in.mp4 out.webm"
        #[arg(required = true)]
        command: String,
    },

    /// Run ffmpeg or ffprobe with explicit arguments (no shell)
    Exec {
        #[arg(value_enum)]
        tool: Tool,

        /// File the invocation is expected to produce in the working directory
        #[arg(short, long)]
        output: Option<String>,

        /// Arguments passed to the tool as-is
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Probe a media file and display its format and streams
    Probe {
        /// File name in the working directory, or a path
        #[arg(required = true)]
        file: String,
    },

    /// Record with ffmpeg in the background until Ctrl-C
    Capture {
        /// ffmpeg command line performing the capture
        #[arg(required = true)]
        command: String,

        /// File the capture writes to
        #[arg(short, long, required = true)]
        output: String,
    },

    /// Run an ffmpeg argument template once per input file
    Batch {
        /// Input files or directories
        #[arg(short, long = "input", required = true, num_args = 1..)]
        inputs: Vec<String>,

        /// Output name pattern, available to the arguments as {output}
        #[arg(short, long)]
        output: Option<String>,

        /// ffmpeg arguments; {input}, {filename}, {filestem}, {extension} and {output} are substituted
        #[arg(last = true, required = true)]
        args: Vec<String>,
    },

    /// Copy a file into the working directory under a sanitized name
    Upload {
        #[arg(required = true)]
        file: PathBuf,
    },

    /// Print the sanitized form of a file name
    Sanitize {
        #[arg(required = true)]
        name: String,
    },

    /// Check that ffmpeg and ffprobe are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },
}
