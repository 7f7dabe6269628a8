//! Error types for the lumasort core.

use thiserror::Error;

/// Errors produced by core operations.
///
/// Every variant is locally recoverable: the failing operation becomes a
/// no-op and the caller decides whether to surface the message.
#[derive(Debug, Error)]
pub enum LumaError {
    /// Width or height was zero when creating a grid, canvas or image.
    #[error("invalid dimensions: width and height must be non-zero")]
    InvalidDimensions,

    /// An image handed to the core had no pixels.
    #[error("empty image: {0}")]
    EmptyImage(String),

    /// A transform was requested before any target image was loaded.
    #[error("no target image loaded")]
    MissingTarget,

    /// A transform was requested before any source frame was observed.
    #[error("no source frame available")]
    MissingSource,

    /// Reading or writing an image failed.
    #[error("i/o error: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_dimensions_displays_readable_message() {
        let msg = LumaError::InvalidDimensions.to_string();
        assert!(
            msg.contains("width") && msg.contains("height"),
            "expected message mentioning width and height, got: {msg}"
        );
    }

    #[test]
    fn empty_image_includes_context() {
        let msg = LumaError::EmptyImage("target".into()).to_string();
        assert!(msg.contains("target"), "missing context in: {msg}");
    }

    #[test]
    fn missing_inputs_have_distinct_messages() {
        let target = LumaError::MissingTarget.to_string();
        let source = LumaError::MissingSource.to_string();
        assert_ne!(target, source);
        assert!(target.contains("target"));
        assert!(source.contains("source"));
    }

    #[test]
    fn io_includes_message() {
        let msg = LumaError::Io("disk full".into()).to_string();
        assert!(msg.contains("disk full"), "missing message in: {msg}");
    }

    #[test]
    fn luma_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LumaError>();
    }

    #[test]
    fn luma_error_implements_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<LumaError>();
    }
}
