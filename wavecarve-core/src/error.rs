use std::fmt;

/// Top-level error type for the wavecarve-core public API.
#[derive(Debug)]
pub enum WavecarveError {
    /// File open/create/read/write failure.
    Io {
        /// What was being attempted, e.g. `"open input.wav"`.
        op: String,
        source: std::io::Error,
    },
    /// Malformed input: odd-length sample buffer, frame size mismatch,
    /// image dimension mismatch, unsupported container layout.
    Format(String),
    /// The width resizer failed or broke its contract.
    Transform(String),
}

impl WavecarveError {
    pub(crate) fn io(op: impl Into<String>, source: std::io::Error) -> Self {
        WavecarveError::Io {
            op: op.into(),
            source,
        }
    }

    pub(crate) fn image(op: impl Into<String>, source: image::ImageError) -> Self {
        match source {
            image::ImageError::IoError(e) => WavecarveError::io(op, e),
            other => WavecarveError::Format(format!("{}: {}", op.into(), other)),
        }
    }
}

impl fmt::Display for WavecarveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WavecarveError::Io { op, source } => write!(f, "I/O error ({}): {}", op, source),
            WavecarveError::Format(msg) => write!(f, "format error: {}", msg),
            WavecarveError::Transform(msg) => write!(f, "transform error: {}", msg),
        }
    }
}

impl std::error::Error for WavecarveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WavecarveError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience alias so callers can write `Result<T>` instead of `Result<T, WavecarveError>`.
pub type Result<T> = std::result::Result<T, WavecarveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_keeps_operation_and_source() {
        let err = WavecarveError::io(
            "open missing.wav",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        assert_eq!(
            err.to_string(),
            "I/O error (open missing.wav): no such file"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn image_decode_failure_is_a_format_error() {
        let source = image::ImageError::Unsupported(
            image::error::UnsupportedError::from_format_and_kind(
                image::error::ImageFormatHint::Unknown,
                image::error::UnsupportedErrorKind::Format(
                    image::error::ImageFormatHint::Unknown,
                ),
            ),
        );
        let err = WavecarveError::image("decode spectrogram.png", source);
        assert!(matches!(err, WavecarveError::Format(_)));
    }
}
