//! Color model error types

use thiserror::Error;

/// Errors produced while parsing or constructing a [`Color`](crate::Color)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ColorError {
    /// The token is not a recognised color literal
    #[error("malformed color '{0}'")]
    Malformed(String),

    /// A channel fell outside [0, 1] after normalization
    #[error("color channel {channel} out of range: {value}")]
    ChannelOutOfRange {
        /// Channel name (`r`, `g`, `b` or `a`)
        channel: &'static str,
        /// Normalized value that was rejected
        value: f32,
    },
}
