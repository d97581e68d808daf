//! Command-line parsing, producing a validated `wavmp3_core::Configuration`.

use clap::Parser;
use std::path::PathBuf;
use wavmp3_core::Configuration;

/// Batch-converts WAV files under a directory into MP3.
#[derive(Parser)]
#[command(name = "wavmp3", version, about, disable_version_flag = true)]
pub struct Args {
    /// Root directory to search for WAV files.
    pub directory: PathBuf,

    /// Descend into sub-directories.
    #[arg(short, long)]
    pub recursive: bool,

    /// Replace an existing `.mp3` target instead of picking a new name.
    #[arg(short, long)]
    pub overwrite: bool,

    /// MP3 encoding quality, 0 (best/slowest) to 9 (worst/fastest).
    #[arg(short, long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(0..=9))]
    pub quality: u8,

    /// Process every file regardless of its extension, not just `.wav`.
    #[arg(short, long)]
    pub all: bool,

    /// Worker thread count, clamped to the available hardware concurrency.
    #[arg(short, long, default_value_t = num_cpus::get())]
    pub threads: usize,

    /// Print version information and exit.
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: (),

    /// Increases logging verbosity; repeat for more detail.
    #[arg(long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

impl From<Args> for Configuration {
    fn from(args: Args) -> Self {
        Configuration {
            directory_path: args.directory,
            recurse_directories: args.recursive,
            encoding_quality: args.quality,
            overwrite_existing_mp3: args.overwrite,
            convert_all_files: args.all,
            number_of_threads: args.threads,
        }
    }
}
