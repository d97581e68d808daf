//! MP3 encoding: a thin, narrow wrapper around `mp3lame-encoder` plus the sample-normalization
//! helpers the driver's batch loop needs.

mod session;

pub use session::{
    is_integer_format, normalize_int_sample, read_float_sample, EncoderSession,
};
