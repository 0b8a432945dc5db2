use thiserror::Error;

use crate::exposure::{Bank, ChannelId};

#[derive(Error, Debug)]
pub enum AirglowError {
    #[error("channel index {0} out of range (valid: 1..=24)")]
    InvalidChannelIndex(u8),

    #[error("exposure {exposure}: no blank-sky reference channel with data (\"S1\"/\"S3\")")]
    InsufficientSkyData { exposure: String },

    #[error(
        "exposure {exposure}: sky cube shape mismatch on {channel} ({bank}): \
         expected {expected:?}, got {actual:?}"
    )]
    ShapeMismatch {
        exposure: String,
        channel: ChannelId,
        bank: Bank,
        expected: [usize; 3],
        actual: [usize; 3],
    },

    #[error("sky spectrum length {spectrum} does not match cube wavelength axis (length {cube})")]
    SpectrumLength { spectrum: usize, cube: usize },
}

pub type Result<T> = std::result::Result<T, AirglowError>;
