//! Errors surfaced to callers

use thiserror::Error;

/// Inputs the pipeline cannot work with at all.
///
/// Degenerate regions, out-of-order ranges and timeouts are not errors; they
/// are absorbed or reported structurally by the stage that meets them.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputError {
    #[error("image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("template is empty ({width}x{height})")]
    EmptyTemplate { width: u32, height: u32 },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl InputError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        InputError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Rejects zero-sized images
pub fn ensure_image(width: u32, height: u32) -> Result<(), InputError> {
    if width == 0 || height == 0 {
        return Err(InputError::EmptyImage { width, height });
    }
    Ok(())
}

/// Rejects NaN or infinite tuning values
pub fn ensure_finite(name: &'static str, value: f64) -> Result<(), InputError> {
    if !value.is_finite() {
        return Err(InputError::invalid(name, format!("expected a finite number, got {}", value)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ensure_image(0, 10).unwrap_err();
        assert_eq!(err.to_string(), "image is empty (0x10)");

        let err = ensure_finite("threshold", f64::NAN).unwrap_err();
        assert!(err.to_string().starts_with("invalid parameter `threshold`"));
        assert!(ensure_finite("threshold", 0.5).is_ok());
    }
}
