#![deny(
    absolute_paths_not_starting_with_crate,
    elided_lifetimes_in_paths,
    explicit_outlives_requirements,
    single_use_lifetimes,
    trivial_casts,
    trivial_numeric_casts,
    unconditional_recursion,
    unreachable_patterns,
    unreachable_pub,
    unused_import_braces,
    unused_lifetimes,
    unused_must_use,
    unused_qualifications,
    variant_size_differences
)]

pub mod config;
pub mod driver;
pub mod encode;
pub mod error;
pub mod exit_code;
pub mod fourcc;
pub mod guid;
pub mod id3;
pub mod output_path;
pub mod pool;
pub mod riff;
pub mod sample;
pub mod sink;
pub mod tags;
pub mod wave;

pub use config::Configuration;
pub use error::{Error, Result};
pub use exit_code::{ExitSeverity, ReturnCode};
pub use pool::WorkerPool;
pub use sink::OutputSink;
