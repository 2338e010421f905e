use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ytdataset",
    about = "ytdataset - Build speech datasets from YouTube videos and their subtitles",
    version,
    long_about = "A CLI tool that downloads YouTube videos with their subtitles, cuts them into short clips on subtitle boundaries, extracts mono 16-bit 22.05kHz WAV audio for every clip and records the clips in a CSV manifest."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to ./config.yaml or the user config directory)
    #[arg(long, global = true, value_name = "FILE", env = "YTDATASET_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build dataset clips from a single video
    Create {
        /// YouTube video URL
        #[arg(value_name = "URL")]
        url: String,

        /// Dataset directory (defaults to the configured output directory)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Discard the run if fewer clips than this are produced
        #[arg(long, value_name = "COUNT")]
        min_clips: Option<usize>,
    },

    /// Build dataset clips from every URL listed in a JSON file
    Batch {
        /// JSON file containing an array of video URLs
        #[arg(value_name = "JSON_FILE")]
        urls_file: PathBuf,

        /// Dataset directory (defaults to the configured output directory)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Discard a video's run if fewer clips than this are produced
        #[arg(long, value_name = "COUNT")]
        min_clips: Option<usize>,
    },

    /// List the video URLs of a playlist
    Playlist {
        /// Playlist page URL
        #[arg(value_name = "URL")]
        url: String,

        /// Save the URLs as a JSON array (usable with `batch`) instead of printing them
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },

    /// Check that yt-dlp, ffmpeg and ffprobe are installed
    Check,
}
