//! Backend error types.

use thiserror::Error;

use crate::types::TextureFormat;

/// Errors that can occur in backend operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Failed to create an attachment texture.
    #[error("attachment creation failed: {0}")]
    AttachmentCreationFailed(String),
    /// The device cannot render to this format.
    #[error("unsupported attachment format: {0:?}")]
    UnsupportedFormat(TextureFormat),
    /// The attachment pool reached its configured limit.
    #[error("attachment pool exhausted (limit: {limit})")]
    OutOfAttachments { limit: usize },
    /// The per-frame upload pool has no room left.
    #[error("upload pool exhausted ({capacity} bytes)")]
    UploadPoolExhausted { capacity: u64 },
    /// The device was lost.
    #[error("GPU device lost")]
    DeviceLost,
    /// Internal backend error.
    #[error("internal backend error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(BackendError::DeviceLost.to_string(), "GPU device lost");
        assert_eq!(
            BackendError::OutOfAttachments { limit: 4 }.to_string(),
            "attachment pool exhausted (limit: 4)"
        );
    }
}
