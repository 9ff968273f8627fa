//! Error types for vocalysis.
//!
//! Decode failures propagate to the caller untouched; statistically
//! undefined measurements are `None` values in the result structs, never
//! errors. Source selection is expressed through per-measurement enums,
//! so the only argument errors left at runtime are parameter validation.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading audio or running an analysis.
#[derive(Error, Debug)]
pub enum Error {
    /// The audio file could not be read or is not valid WAV data.
    #[error("failed to read audio file: {0}")]
    AudioRead(#[from] hound::Error),

    /// General I/O failure outside of WAV parsing.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The file has more than one channel and no channel was selected.
    ///
    /// Use [`crate::Sound::from_file_channel`] to pick one explicitly.
    #[error("audio must be mono (single channel), got {0} channels")]
    NotMono(u16),

    /// An analysis parameter is outside its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The analysis could not produce a result structure at all.
    ///
    /// Undefined statistics on degenerate-but-analyzable input are not
    /// reported through this variant; they come back as `None` fields.
    #[error("analysis failed: {0}")]
    AnalysisFailed(String),
}
