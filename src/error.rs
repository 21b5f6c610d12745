use std::path::PathBuf;

use thiserror::Error;

/// Everything a conversion request can fail with.
///
/// The two variants are reported differently: validation problems are
/// warnings the user fixes in the form, conversion problems are errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Convert(#[from] ConvertError),
}

/// Missing or unusable form input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select an input file.")]
    MissingInput,

    #[error("Please select an output file.")]
    MissingOutput,

    #[error("Please select at least one icon size.")]
    NoSizeSelected,

    #[error("icon size {0} is outside the supported range 1..=256")]
    SizeOutOfRange(u32),
}

/// Failure while reading, encoding or writing an image.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("ICO encode failed: {0}")]
    Encode(#[source] image::ImageError),

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}
