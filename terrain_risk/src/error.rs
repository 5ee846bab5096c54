// THEORY:
// The engine has exactly one way to fail: the image it was handed is not
// something we can classify. Every reason for that (no pixels, a raw buffer
// whose layout we cannot coerce to RGB, bytes that do not decode) is folded into
// a single typed error so callers only ever match on one thing. The core is
// deterministic, so nothing here is retryable.

use thiserror::Error;

/// The single failure type reported by the classification core.
#[derive(Debug, Error)]
pub enum InvalidImageError {
    /// The image has no pixels, so no percentage can be computed.
    #[error("invalid image: {width}x{height} has no pixels")]
    Empty { width: u32, height: u32 },

    /// A raw buffer declared a channel count that cannot be coerced to RGB.
    #[error("invalid image: cannot coerce {channels}-channel data to RGB")]
    UnsupportedLayout { channels: usize },

    /// A raw buffer does not hold exactly width * height * channels bytes.
    #[error("invalid image: expected {expected} bytes, got {actual}")]
    BufferLength { expected: usize, actual: usize },

    /// The encoded bytes could not be decoded.
    #[error("invalid image: {0}")]
    Decode(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, InvalidImageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_reason() {
        let empty = InvalidImageError::Empty { width: 0, height: 7 };
        assert_eq!(empty.to_string(), "invalid image: 0x7 has no pixels");

        let layout = InvalidImageError::UnsupportedLayout { channels: 5 };
        assert!(layout.to_string().contains("5-channel"));

        let length = InvalidImageError::BufferLength { expected: 12, actual: 11 };
        assert!(length.to_string().contains("expected 12 bytes, got 11"));
    }
}
